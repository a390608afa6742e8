//! Markdown to sanitized HTML
//!
//! The source is HTML-escaped before any markup is produced, so the only
//! tags in the output are the ones generated here. Code spans and fenced
//! blocks are lifted out first and restored last so their contents are
//! never formatted.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CODE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```([\w+-]*)[^\S\n]*\n?([\s\S]*?)```").expect("valid regex"));
static INLINE_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));
static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x00(CB|IC)(\d+)\x00").expect("valid regex"));
static BLOCK_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\x00CB\d+\x00$").expect("valid regex"));
static LINK_PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x00LK(\d+)\x00").expect("valid regex"));

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid regex"));
static BULLET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*+]\s+(.+)$").expect("valid regex"));
static ORDERED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s+(.+)$").expect("valid regex"));
// Runs after escaping, so `>` is already `&gt;`
static QUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^&gt;\s?(.*)$").expect("valid regex"));

static LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid regex"));
static BOLD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
static BOLD_UNDERSCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__(.+?)__").expect("valid regex"));
static ITALIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\s][^*]*)\*").expect("valid regex"));
static ITALIC_UNDERSCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w])_([^_]+)_([^\w]|$)").expect("valid regex"));
static STRIKE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"~~(.+?)~~").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

enum Block {
    Paragraph(Vec<String>),
    List(ListKind, Vec<String>),
    Quote(Vec<String>),
}

/// Render markdown `text` to an HTML fragment
pub fn render_markdown(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    // NUL is reserved for placeholders
    let mut source = text.replace('\0', "");

    let mut code_blocks: Vec<(String, String)> = Vec::new();
    source = CODE_BLOCK_RE
        .replace_all(&source, |caps: &Captures| {
            let idx = code_blocks.len();
            code_blocks.push((caps[1].to_string(), caps[2].to_string()));
            format!("\x00CB{idx}\x00")
        })
        .to_string();

    let mut inline_codes: Vec<String> = Vec::new();
    source = INLINE_CODE_RE
        .replace_all(&source, |caps: &Captures| {
            let idx = inline_codes.len();
            inline_codes.push(caps[1].to_string());
            format!("\x00IC{idx}\x00")
        })
        .to_string();

    let escaped = html_escape::encode_quoted_attribute(&source).to_string();
    let body = render_blocks(&escaped);

    PLACEHOLDER_RE
        .replace_all(&body, |caps: &Captures| {
            let idx: usize = caps[2].parse().unwrap_or(usize::MAX);
            match &caps[1] {
                "CB" => code_blocks
                    .get(idx)
                    .map(|(lang, code)| code_block_html(lang, code))
                    .unwrap_or_default(),
                _ => inline_codes
                    .get(idx)
                    .map(|code| format!("<code>{}</code>", html_escape::encode_text(code)))
                    .unwrap_or_default(),
            }
        })
        .to_string()
}

fn code_block_html(lang: &str, code: &str) -> String {
    let code = html_escape::encode_text(code);
    if lang.is_empty() {
        format!("<pre><code>{code}</code></pre>")
    } else {
        format!("<pre><code class=\"language-{lang}\">{code}</code></pre>")
    }
}

fn render_blocks(escaped: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut current: Option<Block> = None;

    for line in escaped.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush(&mut current, &mut out);
            continue;
        }
        if BLOCK_PLACEHOLDER_RE.is_match(trimmed) {
            flush(&mut current, &mut out);
            out.push(trimmed.to_string());
            continue;
        }
        if let Some(caps) = HEADING_RE.captures(trimmed) {
            flush(&mut current, &mut out);
            let level = caps[1].len();
            let title = caps[2].trim_end_matches('#').trim_end();
            out.push(format!("<h{level}>{}</h{level}>", render_inline(title)));
            continue;
        }
        if let Some(caps) = BULLET_RE.captures(line) {
            push_item(&mut current, &mut out, ListKind::Unordered, &caps[1]);
            continue;
        }
        if let Some(caps) = ORDERED_RE.captures(line) {
            push_item(&mut current, &mut out, ListKind::Ordered, &caps[1]);
            continue;
        }
        if let Some(caps) = QUOTE_RE.captures(trimmed) {
            match &mut current {
                Some(Block::Quote(lines)) => lines.push(caps[1].to_string()),
                _ => {
                    flush(&mut current, &mut out);
                    current = Some(Block::Quote(vec![caps[1].to_string()]));
                }
            }
            continue;
        }
        match &mut current {
            Some(Block::Paragraph(lines)) => lines.push(trimmed.to_string()),
            _ => {
                flush(&mut current, &mut out);
                current = Some(Block::Paragraph(vec![trimmed.to_string()]));
            }
        }
    }
    flush(&mut current, &mut out);

    out.join("\n")
}

fn push_item(current: &mut Option<Block>, out: &mut Vec<String>, kind: ListKind, item: &str) {
    if let Some(Block::List(existing, items)) = current {
        if *existing == kind {
            items.push(item.to_string());
            return;
        }
    }
    flush(current, out);
    *current = Some(Block::List(kind, vec![item.to_string()]));
}

fn flush(current: &mut Option<Block>, out: &mut Vec<String>) {
    let Some(block) = current.take() else {
        return;
    };
    let html = match block {
        Block::Paragraph(lines) => format!("<p>{}</p>", render_inline(&lines.join("\n"))),
        Block::Quote(lines) => format!(
            "<blockquote><p>{}</p></blockquote>",
            render_inline(&lines.join("\n"))
        ),
        Block::List(kind, items) => {
            let tag = match kind {
                ListKind::Unordered => "ul",
                ListKind::Ordered => "ol",
            };
            let items: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", render_inline(item)))
                .collect();
            format!("<{tag}>{items}</{tag}>")
        }
    };
    out.push(html);
}

/// Inline formatting over already-escaped text
fn render_inline(text: &str) -> String {
    let mut links: Vec<String> = Vec::new();
    let mut result = LINK_RE
        .replace_all(text, |caps: &Captures| {
            let label = &caps[1];
            let target = &caps[2];
            let idx = links.len();
            if is_safe_href(target) {
                links.push(format!("<a href=\"{target}\">{label}</a>"));
            } else {
                links.push(label.to_string());
            }
            format!("\x00LK{idx}\x00")
        })
        .to_string();

    result = BOLD_RE.replace_all(&result, "<strong>$1</strong>").to_string();
    result = BOLD_UNDERSCORE_RE
        .replace_all(&result, "<strong>$1</strong>")
        .to_string();
    result = ITALIC_RE.replace_all(&result, "<em>$1</em>").to_string();
    result = ITALIC_UNDERSCORE_RE
        .replace_all(&result, "${1}<em>${2}</em>${3}")
        .to_string();
    result = STRIKE_RE.replace_all(&result, "<del>$1</del>").to_string();

    LINK_PLACEHOLDER_RE
        .replace_all(&result, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|idx| links.get(idx).cloned())
                .unwrap_or_default()
        })
        .to_string()
}

/// Allow web, mail and relative targets; reject every other scheme
pub(crate) fn is_safe_href(target: &str) -> bool {
    let lower = target.trim().to_ascii_lowercase();
    if ["http://", "https://", "mailto:"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
    {
        return true;
    }
    match lower.find(':') {
        None => true,
        Some(colon) => lower[..colon].contains(['/', '?', '#']),
    }
}
