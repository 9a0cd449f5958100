/// Markdown escaping for text and links placed in chat replies.

const MARKDOWN_SPECIALS: &[char] = &['*', '_', '`', '~', '\\'];

/// Escape `*`, `_`, `` ` ``, `~` and `\` so names render literally.
///
/// Characters the author already escaped are unescaped first, so the
/// result never ends up double-escaped.
pub fn escape_markdown(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if MARKDOWN_SPECIALS.contains(&next) {
                    unescaped.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        unescaped.push(c);
    }

    let mut escaped = String::with_capacity(unescaped.len() + 8);
    for c in unescaped.chars() {
        if MARKDOWN_SPECIALS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Percent-encode parentheses so a URL can sit inside `[text](url)`.
pub fn escape_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            _ => out.push(c),
        }
    }
    out
}

/// A `[label](url)` link with the URL escaped.
pub fn link(label: &str, url: &str) -> String {
    format!("[{}]({})", label, escape_url(url))
}
