use rand::Rng;

/// Literal placeholder replaced by the contact's display name.
pub const NAME_PLACEHOLDER: &str = "{nome}";

/// Resolve a message template for one contact.
///
/// The name placeholder is substituted before variant resolution so a name
/// can never be mistaken for a variant delimiter. Malformed templates never
/// error; they degrade to literal text.
pub fn resolve_template(template: &str, name: &str) -> String {
    resolve_template_with(template, name, &mut rand::thread_rng())
}

/// Same as [`resolve_template`] but with a caller-supplied RNG, so tests can
/// pin the variant choice.
pub fn resolve_template_with<R: Rng + ?Sized>(template: &str, name: &str, rng: &mut R) -> String {
    let with_name = template.replace(NAME_PLACEHOLDER, name);
    resolve_variants(&with_name, rng)
}

enum Span {
    /// Closing brace found; byte offset relative to the opening brace.
    Closed(usize),
    /// Another opening brace found first; its offset relative to the opener.
    Reopened(usize),
    /// Rest of the input has no closing brace.
    Unterminated,
}

/// Resolve every innermost `{...}` span to one of its options.
///
/// Nested braces are unsupported: only a completed innermost span counts as
/// a variant group, surrounding braces pass through literally.
fn resolve_variants<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        match scan_span(&rest[open..]) {
            Span::Closed(close) => {
                let content = &rest[open + 1..open + close];
                if content.is_empty() {
                    // `{}` carries no options; keep it literal.
                    out.push_str("{}");
                } else {
                    out.push_str(pick_option(content, rng));
                }
                rest = &rest[open + close + 1..];
            }
            Span::Reopened(inner) => {
                out.push_str(&rest[open..open + inner]);
                rest = &rest[open + inner..];
            }
            Span::Unterminated => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn scan_span(from_open: &str) -> Span {
    for (offset, byte) in from_open.bytes().enumerate().skip(1) {
        match byte {
            b'}' => return Span::Closed(offset),
            b'{' => return Span::Reopened(offset),
            _ => {}
        }
    }
    Span::Unterminated
}

/// Split on `|` when present, otherwise `/`, otherwise treat the whole span
/// as a single literal; pick uniformly and trim the winner.
fn pick_option<'a, R: Rng + ?Sized>(content: &'a str, rng: &mut R) -> &'a str {
    let options: Vec<&str> = if content.contains('|') {
        content.split('|').collect()
    } else if content.contains('/') {
        content.split('/').collect()
    } else {
        vec![content]
    };
    options[rng.gen_range(0..options.len())].trim()
}
