/// Transient error notification surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
}

impl Toast {
    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
