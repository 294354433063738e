/// HTML renderer for org document trees
use crate::ast::{Document, Event, NodeKind};
use crate::error::Result;
use crate::inline::transform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Highest heading tag HTML defines.
const MAX_HEADING_LEVEL: i64 = 6;

/// Render-time settings, independent of how the document was parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Skip `<p>` elements whose content is only whitespace.
    pub suppress_empty_paragraphs: bool,
    /// Added to every heading level; the result is clamped to `1..=6`.
    pub heading_level_offset: i32,
}

impl RenderOptions {
    /// Parse options from TOML.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load options from a TOML file, or return defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct HtmlRenderer {
    options: RenderOptions,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default())
    }

    pub fn with_options(options: RenderOptions) -> Self {
        HtmlRenderer { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(&self, doc: &Document) -> String {
        let mut out = String::new();
        for event in doc.events() {
            match event {
                Event::Enter(id) => self.enter(doc.kind(id), &mut out),
                Event::Leave(id) => self.leave(doc.kind(id), &mut out),
            }
        }
        tracing::debug!(bytes = out.len(), "rendered document");
        out
    }

    fn enter(&self, kind: &NodeKind, out: &mut String) {
        match kind {
            NodeKind::Root | NodeKind::Comment { .. } => {}
            NodeKind::Heading { level, text } => {
                let level = self.heading_level(*level);
                out.push_str(&format!("<h{level}>{}</h{level}>", transform(text)));
            }
            NodeKind::TextBlock { lines } => {
                let content = transform(&lines.join("\n"));
                if !(self.options.suppress_empty_paragraphs && content.trim().is_empty()) {
                    out.push_str(&format!("<p>{content}</p>"));
                }
            }
            NodeKind::List { ordered, .. } => {
                out.push_str(if *ordered { "<ol>" } else { "<ul>" });
            }
            NodeKind::ListItem { text } => {
                out.push_str("<li>");
                out.push_str(&transform(text));
            }
            NodeKind::HorizontalRule => out.push_str("<hr/>"),
        }
    }

    fn leave(&self, kind: &NodeKind, out: &mut String) {
        match kind {
            NodeKind::List { ordered, .. } => {
                out.push_str(if *ordered { "</ol>" } else { "</ul>" });
            }
            NodeKind::ListItem { .. } => out.push_str("</li>"),
            NodeKind::Root
            | NodeKind::Heading { .. }
            | NodeKind::TextBlock { .. }
            | NodeKind::Comment { .. }
            | NodeKind::HorizontalRule => {}
        }
    }

    fn heading_level(&self, level: usize) -> i64 {
        let level = i64::try_from(level).unwrap_or(MAX_HEADING_LEVEL);
        (level + i64::from(self.options.heading_level_offset)).clamp(1, MAX_HEADING_LEVEL)
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}
