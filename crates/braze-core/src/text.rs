//! Message text escaping and display rendering.
//!
//! Message payloads travel in an "unrendered" form: literal `&`, `[`, `]`
//! and `,` are entity-escaped, and rich content (faces, images, mentions) is
//! embedded as bracketed directives such as `[rich:face,id=14]`. The publish
//! protocol exposes both forms — `raw_message` carries the unrendered text
//! verbatim, `message` carries the display rendering produced here.

/// Escapes a literal string for embedding in an unrendered message.
pub fn escape(text: &str) -> String {
    // `&` first so already-escaped entities are not double-expanded.
    text.replace('&', "&amp;")
        .replace('[', "&#91;")
        .replace(']', "&#93;")
        .replace(',', "&#44;")
}

/// Reverses [`escape`].
pub fn unescape(text: &str) -> String {
    text.replace("&#44;", ",")
        .replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&amp;", "&")
}

/// Renders the display form of an unrendered message.
///
/// Bracketed rich directives are stripped and entities are expanded. In the
/// unrendered form literal brackets are always escaped, so every bare `[`
/// opens a directive.
pub fn display_text(raw: &str) -> String {
    let mut plain = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(open) = rest.find('[') {
        plain.push_str(&rest[..open]);
        match rest[open..].find(']') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                // Unterminated directive: keep the tail as-is.
                plain.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    plain.push_str(rest);
    unescape(&plain)
}
