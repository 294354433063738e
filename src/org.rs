/// Org text writer: prints a document tree back as org markup
use crate::ast::{Document, Event, NodeId, NodeKind};
use std::fmt;

/// Marker line written for horizontal rules.
const RULE: &str = "-----";

impl Document {
    /// Re-emit the document as org text, one line per source construct.
    pub fn to_org(&self) -> String {
        self.to_string()
    }

    fn org_lines(&self, id: NodeId, lines: &mut Vec<String>) {
        match self.kind(id) {
            NodeKind::Root => {}
            NodeKind::Heading { level, text } => {
                lines.push(format!("{} {text}", "*".repeat(*level)));
            }
            NodeKind::List { .. } => {}
            NodeKind::ListItem { text } => {
                let (list, indent, marker, ordered) = match self.parent(id) {
                    Some(list) => match self.kind(list) {
                        NodeKind::List {
                            indent,
                            marker,
                            ordered,
                        } => (list, *indent, marker.as_str(), *ordered),
                        _ => unreachable!("list item {id:?} outside a list"),
                    },
                    None => unreachable!("list item {id:?} has no parent"),
                };
                let marker = if ordered {
                    let position = self.children(list).iter().position(|&c| c == id);
                    item_number(marker, position.unwrap_or_default())
                } else {
                    marker.to_string()
                };
                let mut text_lines = text.split('\n');
                let first = text_lines.next().unwrap_or_default();
                lines.push(format!("{}{marker} {first}", " ".repeat(indent)));
                // Continuation lines line up after the marker
                let hang = " ".repeat(indent + marker.len() + 1);
                lines.extend(text_lines.map(|line| format!("{hang}{line}")));
            }
            NodeKind::TextBlock { lines: block } if block.is_empty() => {
                lines.push(String::new());
            }
            NodeKind::TextBlock { lines: block } => lines.extend(block.iter().cloned()),
            NodeKind::Comment { text } => lines.push(format!("#{text}")),
            NodeKind::HorizontalRule => lines.push(RULE.to_string()),
        }
    }
}

/// Number the item at `position` of an ordered list that starts with `marker`.
/// Falls back to the list's own marker when the number cannot be computed.
fn item_number(marker: &str, position: usize) -> String {
    let digits = marker.trim_end_matches(['.', ')']);
    let delimiter = &marker[digits.len()..];
    match digits
        .parse::<usize>()
        .ok()
        .and_then(|start| start.checked_add(position))
    {
        Some(number) => format!("{number}{delimiter}"),
        None => marker.to_string(),
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        for event in self.events() {
            if let Event::Enter(id) = event {
                self.org_lines(id, &mut lines);
            }
        }
        f.write_str(&lines.join("\n"))
    }
}
