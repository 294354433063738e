/// Line classification for org documents
///
/// Every line maps to exactly one [`Line`] variant. Patterns are tried in a
/// fixed order and the first match wins; anything unmatched is plain text.
use regex::Regex;
use std::sync::LazyLock;

/// `#+KEY: value` with an uppercase/underscore key.
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\+([A-Z_]+):(.*)$").unwrap());

/// One or more stars, one whitespace, then the title.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\*+)\s(.*)$").unwrap());

/// Dashes only; any surrounding whitespace makes the line text.
static RULE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{5,}$").unwrap());

static ORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d+[.)])\s(.*)$").unwrap());

static UNORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([-+*])\s(.*)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Document option; `text` is the line without its leading `#`.
    Option {
        key: &'a str,
        value: &'a str,
        text: &'a str,
    },
    Comment {
        text: &'a str,
    },
    Heading {
        level: usize,
        text: &'a str,
    },
    HorizontalRule,
    OrderedItem {
        indent: usize,
        marker: &'a str,
        text: &'a str,
    },
    UnorderedItem {
        indent: usize,
        marker: &'a str,
        text: &'a str,
    },
    Blank,
    /// Fallback; `text` is the full line, indentation included.
    Text {
        indent: usize,
        text: &'a str,
    },
}

impl Line<'_> {
    /// Short name for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Line::Option { .. } => "option",
            Line::Comment { .. } => "comment",
            Line::Heading { .. } => "heading",
            Line::HorizontalRule => "rule",
            Line::OrderedItem { .. } => "ordered-item",
            Line::UnorderedItem { .. } => "unordered-item",
            Line::Blank => "blank",
            Line::Text { .. } => "text",
        }
    }
}

/// Classify a single line (without its line terminator).
pub fn classify(line: &str) -> Line<'_> {
    if let Some(caps) = OPTION_RE.captures(line) {
        let (_, [key, value]) = caps.extract();
        return Line::Option {
            key,
            value: value.trim(),
            text: &line[1..],
        };
    }

    // '#' is one byte, so slicing after it is always on a char boundary
    if let Some(text) = line.strip_prefix('#') {
        return Line::Comment { text };
    }

    if let Some(caps) = HEADING_RE.captures(line) {
        let (_, [stars, text]) = caps.extract();
        return Line::Heading {
            level: stars.len(),
            text,
        };
    }

    if RULE_RE.is_match(line) {
        return Line::HorizontalRule;
    }

    if let Some(caps) = ORDERED_RE.captures(line) {
        let (_, [lead, marker, text]) = caps.extract();
        return Line::OrderedItem {
            indent: count_leading_spaces(lead),
            marker,
            text,
        };
    }

    if let Some(caps) = UNORDERED_RE.captures(line) {
        let (_, [lead, marker, text]) = caps.extract();
        return Line::UnorderedItem {
            indent: count_leading_spaces(lead),
            marker,
            text,
        };
    }

    if line.trim().is_empty() {
        return Line::Blank;
    }

    Line::Text {
        indent: count_leading_spaces(line),
        text: line,
    }
}

/// Count leading whitespace columns (tabs advance to the next multiple of 4)
pub fn count_leading_spaces(line: &str) -> usize {
    let mut count = 0;
    for ch in line.chars() {
        match ch {
            ' ' => count += 1,
            '\t' => count += 4 - (count % 4),
            c if c.is_whitespace() => count += 1,
            _ => break,
        }
    }
    count
}
