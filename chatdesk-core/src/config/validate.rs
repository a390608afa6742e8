//! Configuration validation rules.

use super::schema::Config;

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    let base_url = config.server.base_url.trim();
    if base_url.is_empty() {
        errors.push("server.base_url must not be empty".to_string());
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push("server.base_url must start with http:// or https://".to_string());
    }
    if !config.server.login_path.starts_with('/') {
        errors.push("server.login_path must be an absolute path".to_string());
    }

    if config.auth.token.trim().is_empty() && config.auth.token_file.trim().is_empty() {
        errors.push("auth.token_file must not be empty when auth.token is unset".to_string());
    }

    match config.logging.format.to_ascii_lowercase().as_str() {
        "text" | "json" => {}
        other => errors.push(format!("logging.format must be text or json, got {}", other)),
    }
    if config.logging.dir.trim().is_empty() {
        errors.push("logging.dir must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}
