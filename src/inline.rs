/// Inline markup transformation for leaf text
///
/// Passes run in a fixed order: emphasis (`/`, `*`, `_`), timestamps, links,
/// then backslash-escape removal. Each pass only produces markup the later
/// passes cannot match.
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `<2024-03-01 Fri 09:30>`
static DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(\d{4}-\d{2}-\d{2} [[:alpha:]]{3} \d{2}:\d{2})>").unwrap()
});

/// `<2024-03-01 Fri>`
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\d{4}-\d{2}-\d{2} [[:alpha:]]{3})>").unwrap());

/// `[[https://example.com][label]]`, label optional
static EXTERNAL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([A-Za-z][A-Za-z0-9+.-]*://[^\]]+)\](?:\[([^\]]+)\])?\]").unwrap()
});

/// `[[target][label]]`, label optional
static INTERNAL_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\](?:\[([^\]]+)\])?\]").unwrap());

/// Characters a backslash can escape
const ESCAPABLE: [char; 4] = ['/', '*', '_', '\\'];

/// Transform the inline markup of one leaf payload into HTML.
pub fn transform(text: &str) -> String {
    let text = wrap_delimited(text, '/', "i");
    let text = wrap_delimited(&text, '*', "b");
    let text = wrap_delimited(&text, '_', "u");
    let text = DATETIME_RE.replace_all(&text, r#"<span class="timestamp">$1</span>"#);
    let text = DATE_RE.replace_all(&text, r#"<span class="date">$1</span>"#);
    let text = EXTERNAL_LINK_RE.replace_all(&text, |caps: &Captures| {
        anchor(&caps[1], caps.get(2).map_or(&caps[1], |m| m.as_str()))
    });
    let text = INTERNAL_LINK_RE.replace_all(&text, |caps: &Captures| {
        anchor(
            &format!("#{}", &caps[1]),
            caps.get(2).map_or(&caps[1], |m| m.as_str()),
        )
    });
    remove_escapes(&text)
}

fn anchor(href: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        html_escape::encode_double_quoted_attribute(href),
        label
    )
}

/// Wrap every live `delim…delim` span in `<tag>…</tag>`.
///
/// An opener must follow start of text, whitespace or opening punctuation and
/// be followed by a non-space; a closer must follow a non-space and precede
/// end of text, whitespace or closing punctuation. Escaped delimiters are
/// never live, and a span containing another live delimiter does not match.
fn wrap_delimited(text: &str, delim: char, tag: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        // Keep escape pairs intact for the final pass
        if ch == '\\' && i + 1 < chars.len() {
            result.push(ch);
            result.push(chars[i + 1]);
            i += 2;
            continue;
        }

        // Link targets are copied verbatim
        if ch == '[' && chars.get(i + 1) == Some(&'[') {
            let end = chars[i..]
                .iter()
                .position(|&c| c == ']')
                .map_or(chars.len(), |p| i + p);
            result.extend(&chars[i..end]);
            i = end;
            continue;
        }

        if ch == delim
            && can_open(&chars, i, delim)
            && let Some(close) = find_closer(&chars, i, delim)
        {
            result.push_str(&format!("<{tag}>"));
            result.extend(&chars[i + 1..close]);
            result.push_str(&format!("</{tag}>"));
            i = close + 1;
            continue;
        }

        result.push(ch);
        i += 1;
    }

    result
}

fn can_open(chars: &[char], pos: usize, delim: char) -> bool {
    let before_ok = pos == 0 || {
        let prev = chars[pos - 1];
        prev != delim && (prev.is_whitespace() || "-('\"{[*/_".contains(prev))
    };
    let after_ok = chars
        .get(pos + 1)
        .is_some_and(|&c| !c.is_whitespace() && c != delim);
    before_ok && after_ok
}

/// Position of the matching closer, if the span is well formed.
fn find_closer(chars: &[char], open: usize, delim: char) -> Option<usize> {
    let mut k = open + 1;
    while k < chars.len() {
        let ch = chars[k];
        if ch == '\\' {
            k += 2;
            continue;
        }
        if ch == delim {
            let prev = chars[k - 1];
            let after_ok = chars
                .get(k + 1)
                .is_none_or(|&c| c.is_whitespace() || "-.,;:!?'\")}]*/_<".contains(c));
            // An interior delimiter that cannot close ends the attempt
            return (k > open + 1 && !prev.is_whitespace() && after_ok).then_some(k);
        }
        k += 1;
    }
    None
}

/// Drop the backslash in front of an escapable character.
fn remove_escapes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\'
            && let Some(&next) = chars.peek()
            && ESCAPABLE.contains(&next)
        {
            result.push(next);
            chars.next();
            continue;
        }
        result.push(ch);
    }
    result
}
