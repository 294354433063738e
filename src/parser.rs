/// Tree builder for org documents
///
/// Lines are consumed one at a time. All context carried between lines lives
/// in [`ParserState`]; [`step`] applies one classified line to the document
/// and returns the next state.
use crate::ast::{Document, NodeId, NodeKind};
use crate::classify::{Line, classify};

/// Parsing context carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserState {
    /// Nearest enclosing heading (root at the start).
    pub current_heading: NodeId,
    /// Where new lists and paragraphs attach: a heading or the last list item.
    pub active_parent: NodeId,
    /// Innermost list still accepting items.
    pub open_list: Option<NodeId>,
    /// Paragraph still accepting continuation lines.
    pub open_text: Option<NodeId>,
    /// Consecutive blank lines since the last non-blank line.
    pub blank_run: usize,
}

impl ParserState {
    pub fn new() -> Self {
        ParserState {
            current_heading: NodeId::ROOT,
            active_parent: NodeId::ROOT,
            open_list: None,
            open_text: None,
            blank_run: 0,
        }
    }
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply one classified line to `doc`.
pub fn step(doc: &mut Document, state: ParserState, line: Line<'_>) -> ParserState {
    match line {
        Line::Option { key, value, text } => {
            doc.options_mut().insert(key.to_string(), value.to_string());
            // Keep the literal line in the tree as well
            doc.append(
                NodeId::ROOT,
                NodeKind::Comment {
                    text: text.to_string(),
                },
            );
            ParserState {
                active_parent: state.current_heading,
                open_list: None,
                open_text: None,
                ..state
            }
        }
        Line::Comment { text } => {
            doc.append(
                NodeId::ROOT,
                NodeKind::Comment {
                    text: text.to_string(),
                },
            );
            state
        }
        Line::Heading { level, text } => {
            let parent = heading_parent(doc, state.current_heading, level);
            let heading = doc.append(
                parent,
                NodeKind::Heading {
                    level,
                    text: text.to_string(),
                },
            );
            ParserState {
                current_heading: heading,
                active_parent: heading,
                open_list: None,
                open_text: None,
                blank_run: 0,
            }
        }
        Line::HorizontalRule => {
            doc.append(NodeId::ROOT, NodeKind::HorizontalRule);
            ParserState::new()
        }
        Line::OrderedItem {
            indent,
            marker,
            text,
        }
        | Line::UnorderedItem {
            indent,
            marker,
            text,
        } => list_item(doc, state, indent, marker, text),
        Line::Blank => blank_line(doc, state),
        Line::Text { indent, text } => text_line(doc, state, indent, text),
    }
}

/// Ascend from `from` to the first heading whose level is below `level`.
fn heading_parent(doc: &Document, from: NodeId, level: usize) -> NodeId {
    let mut node = from;
    loop {
        match doc.kind(node).heading_level() {
            Some(current) if current < level => return node,
            Some(_) => node = parent_of(doc, node),
            None => unreachable!("current heading {node:?} is not a heading"),
        }
    }
}

fn list_item(
    doc: &mut Document,
    state: ParserState,
    indent: usize,
    marker: &str,
    text: &str,
) -> ParserState {
    let list = match state.open_list {
        None => new_list(doc, state.active_parent, indent, marker),
        Some(open) => resolve_list(doc, open, indent, marker),
    };
    let item = doc.append(
        list,
        NodeKind::ListItem {
            text: text.to_string(),
        },
    );
    ParserState {
        active_parent: item,
        open_list: Some(list),
        open_text: None,
        blank_run: 0,
        ..state
    }
}

/// Find (or create) the list that receives an item at `indent`, starting from
/// the innermost open list.
fn resolve_list(doc: &mut Document, open: NodeId, indent: usize, marker: &str) -> NodeId {
    let mut list = open;
    loop {
        let list_indent = indent_of(doc, list);
        if indent == list_indent {
            return list;
        }
        if indent > list_indent {
            // Deeper: nest under the last item
            let item = last_item(doc, list);
            return new_list(doc, item, indent, marker);
        }
        // Shallower: climb out of this list
        let parent = parent_of(doc, list);
        match doc.kind(parent) {
            NodeKind::ListItem { .. } => list = parent_of(doc, parent),
            _ => return new_list(doc, parent, indent, marker),
        }
    }
}

fn new_list(doc: &mut Document, parent: NodeId, indent: usize, marker: &str) -> NodeId {
    let ordered = marker.starts_with(|c: char| c.is_ascii_digit());
    doc.append(
        parent,
        NodeKind::List {
            marker: marker.to_string(),
            indent,
            ordered,
        },
    )
}

fn blank_line(doc: &mut Document, state: ParserState) -> ParserState {
    let blank_run = state.blank_run + 1;
    let mut next = ParserState {
        open_text: None,
        blank_run,
        ..state
    };
    // A second blank line ends every open list
    if blank_run >= 2 {
        next.open_list = None;
        next.active_parent = state.current_heading;
    }

    // Spacing inside an open list belongs to the list's enclosing context
    let parent = match next.open_list {
        Some(list) => parent_of(doc, list),
        None => next.active_parent,
    };
    let reuse = doc.last_child(parent).is_some_and(|last| {
        matches!(doc.kind(last), NodeKind::TextBlock { lines } if lines.is_empty())
    });
    if !reuse {
        doc.append(parent, NodeKind::TextBlock { lines: Vec::new() });
    }
    next
}

fn text_line(doc: &mut Document, state: ParserState, indent: usize, line: &str) -> ParserState {
    let mut next = ParserState {
        blank_run: 0,
        ..state
    };

    if let Some(block) = state.open_text {
        if let NodeKind::TextBlock { lines } = doc.kind_mut(block) {
            lines.push(line.to_string());
        }
        return next;
    }

    let parent = match state.open_list {
        Some(list) => {
            let item = last_item(doc, list);
            if indent <= indent_of(doc, list) {
                let (parent, outer) = close_lists(doc, list, indent);
                next.open_list = outer;
                next.active_parent = parent;
                parent
            } else if state.blank_run == 0 {
                if let NodeKind::ListItem { text } = doc.kind_mut(item) {
                    text.push('\n');
                    text.push_str(line.trim_start());
                }
                return next;
            } else {
                item
            }
        }
        None => state.active_parent,
    };

    let block = doc.append(
        parent,
        NodeKind::TextBlock {
            lines: vec![line.to_string()],
        },
    );
    next.open_text = Some(block);
    next
}

/// Walk out of `list` until reaching a heading, or an enclosing list whose
/// indent is below `indent`. Returns the node that receives the text and the
/// list that stays open, if any.
fn close_lists(doc: &Document, list: NodeId, indent: usize) -> (NodeId, Option<NodeId>) {
    let mut list = list;
    loop {
        let parent = parent_of(doc, list);
        match doc.kind(parent) {
            NodeKind::ListItem { .. } => {
                let outer = parent_of(doc, parent);
                if indent_of(doc, outer) < indent {
                    return (parent, Some(outer));
                }
                list = outer;
            }
            _ => return (parent, None),
        }
    }
}

fn parent_of(doc: &Document, id: NodeId) -> NodeId {
    match doc.parent(id) {
        Some(parent) => parent,
        None => unreachable!("node {id:?} has no parent"),
    }
}

fn indent_of(doc: &Document, list: NodeId) -> usize {
    match doc.kind(list) {
        NodeKind::List { indent, .. } => *indent,
        other => unreachable!("expected a list, found {other:?}"),
    }
}

fn last_item(doc: &Document, list: NodeId) -> NodeId {
    match doc.last_child(list) {
        Some(item) => item,
        None => unreachable!("open list {list:?} has no items"),
    }
}

/// Line-by-line driver around [`step`].
pub struct Parser {
    document: Document,
    state: ParserState,
    line_number: usize,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            document: Document::new(),
            state: ParserState::new(),
            line_number: 0,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Consume one line. A trailing line terminator is ignored.
    pub fn feed(&mut self, line: &str) {
        self.line_number += 1;
        let line = classify(line.trim_end_matches(['\n', '\r']));
        tracing::trace!(line = self.line_number, kind = line.kind_name(), "parser step");
        self.state = step(&mut self.document, self.state, line);
    }

    pub fn finish(self) -> Document {
        tracing::debug!(
            lines = self.line_number,
            nodes = self.document.node_count(),
            options = self.document.options().len(),
            "parsed document"
        );
        self.document
    }

    pub fn parse(mut self, input: &str) -> Document {
        for line in input.lines() {
            self.feed(line);
        }
        self.finish()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Event;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Document {
        Parser::new().parse(input)
    }

    /// One line per node, indented by depth
    fn outline(doc: &Document) -> String {
        let mut out = String::new();
        let mut depth = 0usize;
        for event in doc.events() {
            match event {
                Event::Enter(id) if id == NodeId::ROOT => {}
                Event::Leave(id) if id == NodeId::ROOT => {}
                Event::Enter(id) => {
                    let label = match doc.kind(id) {
                        NodeKind::Root => unreachable!(),
                        NodeKind::Heading { level, text } => format!("h{level} {text}"),
                        NodeKind::List {
                            marker, indent, ..
                        } => format!("list {marker} @{indent}"),
                        NodeKind::ListItem { text } => format!("item {text:?}"),
                        NodeKind::TextBlock { lines } => format!("text {lines:?}"),
                        NodeKind::Comment { text } => format!("comment {text:?}"),
                        NodeKind::HorizontalRule => "rule".to_string(),
                    };
                    out.push_str(&"  ".repeat(depth));
                    out.push_str(&label);
                    out.push('\n');
                    depth += 1;
                }
                Event::Leave(_) => depth -= 1,
            }
        }
        out
    }

    #[test]
    fn test_empty_document() {
        let doc = parse("");
        assert!(doc.is_empty());
        assert_eq!(doc.children(doc.root()).len(), 0);
    }

    #[test]
    fn test_single_line_text() {
        let doc = parse("This is a line of text");
        assert_eq!(outline(&doc), "text [\"This is a line of text\"]\n");
    }

    #[test]
    fn test_headline_levels() {
        for level in 1..6 {
            let doc = parse(&format!("{} Example headline", "*".repeat(level)));
            let first = doc.children(doc.root())[0];
            assert_eq!(
                doc.kind(first),
                &NodeKind::Heading {
                    level,
                    text: "Example headline".to_string()
                }
            );
        }
    }

    #[test]
    fn test_heading_nesting_by_level() {
        let doc = parse("* A\n** B\n** C\n*** D");
        assert_eq!(outline(&doc), "h1 A\n  h2 B\n  h2 C\n    h3 D\n");
    }

    #[test]
    fn test_heading_climbs_back_to_shallower_parent() {
        let doc = parse("* A\n*** deep\n** B\n* C");
        assert_eq!(outline(&doc), "h1 A\n  h3 deep\n  h2 B\nh1 C\n");
    }

    #[test]
    fn test_list_nesting_by_indent() {
        let doc = parse("- A\n  - B\n  - C");
        assert_eq!(
            outline(&doc),
            "list - @0\n  item \"A\"\n    list - @2\n      item \"B\"\n      item \"C\"\n"
        );
    }

    #[test]
    fn test_ordered_list_under_unordered_item() {
        let doc = parse("- A\n 1. B\n 2. C");
        let outer = doc.children(doc.root())[0];
        let item = doc.children(outer)[0];
        let inner = doc.children(item)[0];
        assert_eq!(
            doc.kind(inner),
            &NodeKind::List {
                marker: "1.".to_string(),
                indent: 1,
                ordered: true
            }
        );
        assert_eq!(doc.children(inner).len(), 2);
    }

    #[test]
    fn test_list_between_indents_opens_sibling_list() {
        let doc = parse("- A\n   - B\n  - C");
        assert_eq!(
            outline(&doc),
            "list - @0\n  item \"A\"\n    list - @3\n      item \"B\"\n    list - @2\n      item \"C\"\n"
        );
    }

    #[test]
    fn test_list_returns_to_outer_level() {
        let doc = parse("- A\n  - B\n- C");
        assert_eq!(
            outline(&doc),
            "list - @0\n  item \"A\"\n    list - @2\n      item \"B\"\n  item \"C\"\n"
        );
    }

    #[test]
    fn test_list_under_heading() {
        let doc = parse("* H\n- a\n- b\n* I");
        assert_eq!(
            outline(&doc),
            "h1 H\n  list - @0\n    item \"a\"\n    item \"b\"\nh1 I\n"
        );
    }

    #[test]
    fn test_text_at_list_indent_terminates_list() {
        let doc = parse("- item\ntext");
        assert_eq!(
            outline(&doc),
            "list - @0\n  item \"item\"\ntext [\"text\"]\n"
        );
    }

    #[test]
    fn test_deeper_text_continues_item() {
        let doc = parse("- item\n text");
        assert_eq!(outline(&doc), "list - @0\n  item \"item\\ntext\"\n");
    }

    #[test]
    fn test_deeper_text_after_blank_is_paragraph_in_item() {
        let doc = parse("- item\n\n  para\n- next");
        assert_eq!(
            outline(&doc),
            "list - @0\n  item \"item\"\n    text [\"  para\"]\n  item \"next\"\ntext []\n"
        );
    }

    #[test]
    fn test_text_closes_only_inner_list() {
        let doc = parse("- A\n  - B\n  text\n- C");
        assert_eq!(
            outline(&doc),
            "list - @0\n  item \"A\"\n    list - @2\n      item \"B\"\n    text [\"  text\"]\n  item \"C\"\n"
        );
    }

    #[test]
    fn test_double_blank_closes_list() {
        let doc = parse("- A\n- B\n\n\ntext after");
        let top = doc.children(doc.root());
        assert_eq!(top.len(), 3);
        assert!(matches!(doc.kind(top[0]), NodeKind::List { .. }));
        assert_eq!(doc.children(top[0]).len(), 2);
        for &item in doc.children(top[0]) {
            assert!(doc.children(item).is_empty());
        }
        assert_eq!(doc.kind(top[1]), &NodeKind::TextBlock { lines: vec![] });
        assert_eq!(
            doc.kind(top[2]),
            &NodeKind::TextBlock {
                lines: vec!["text after".to_string()]
            }
        );
    }

    #[test]
    fn test_single_blank_keeps_list_open() {
        let doc = parse("- A\n\n- B");
        assert_eq!(
            outline(&doc),
            "list - @0\n  item \"A\"\n  item \"B\"\ntext []\n"
        );
    }

    #[test]
    fn test_blank_in_nested_list_goes_to_outer_item() {
        let doc = parse("- A\n  - B\n\n  - C");
        assert_eq!(
            outline(&doc),
            "list - @0\n  item \"A\"\n    list - @2\n      item \"B\"\n      item \"C\"\n    text []\n"
        );
    }

    #[test]
    fn test_text_blocks_split_by_blank_line() {
        let doc = parse("Text line 1\nText line 2\n\nText2");
        assert_eq!(
            outline(&doc),
            "text [\"Text line 1\", \"Text line 2\"]\ntext []\ntext [\"Text2\"]\n"
        );
    }

    #[test]
    fn test_consecutive_blanks_share_one_block() {
        let doc = parse("a\n\n\n\nb");
        assert_eq!(outline(&doc), "text [\"a\"]\ntext []\ntext [\"b\"]\n");
    }

    #[test]
    fn test_heading_closes_paragraph() {
        let doc = parse("intro\n* H\nbody");
        assert_eq!(outline(&doc), "text [\"intro\"]\nh1 H\n  text [\"body\"]\n");
    }

    #[test]
    fn test_option_recorded_and_kept_as_comment() {
        let doc = parse("#+TITLE: The Title");
        assert_eq!(doc.options().get("TITLE"), Some("The Title"));
        assert_eq!(outline(&doc), "comment \"+TITLE: The Title\"\n");
    }

    #[test]
    fn test_duplicate_option_last_wins() {
        let doc = parse("#+AUTHOR: a\n#+AUTHOR: b");
        assert_eq!(doc.options().get("AUTHOR"), Some("b"));
        assert_eq!(doc.options().len(), 1);
    }

    #[test]
    fn test_option_closes_paragraph() {
        let doc = parse("one\n#+KEY: v\ntwo");
        assert_eq!(
            outline(&doc),
            "text [\"one\"]\ncomment \"+KEY: v\"\ntext [\"two\"]\n"
        );
    }

    #[test]
    fn test_comment_does_not_interrupt_paragraph() {
        let doc = parse("one\n# note\ntwo");
        assert_eq!(outline(&doc), "text [\"one\", \"two\"]\ncomment \" note\"\n");
    }

    #[test]
    fn test_comments_always_attach_to_root() {
        let doc = parse("* H\n** I\n# note");
        let top = doc.children(doc.root());
        assert_eq!(top.len(), 2);
        assert_eq!(
            doc.kind(top[1]),
            &NodeKind::Comment {
                text: " note".to_string()
            }
        );
    }

    #[test]
    fn test_rule_attaches_to_root_and_resets_context() {
        let doc = parse("* H\n- a\n-----\n- b");
        assert_eq!(
            outline(&doc),
            "h1 H\n  list - @0\n    item \"a\"\nrule\nlist - @0\n  item \"b\"\n"
        );
    }

    #[test]
    fn test_indented_dashes_continue_list_item() {
        let doc = parse("- A\n  -----");
        let list = doc.children(doc.root())[0];
        let item = doc.children(list)[0];
        assert_eq!(
            doc.kind(item),
            &NodeKind::ListItem {
                text: "A\n-----".to_string()
            }
        );
        assert_eq!(doc.children(doc.root()).len(), 1);
    }

    #[test]
    fn test_step_heading_transition() {
        let mut doc = Document::new();
        let state = step(
            &mut doc,
            ParserState::new(),
            Line::Heading {
                level: 2,
                text: "T",
            },
        );
        let heading = doc.children(NodeId::ROOT)[0];
        assert_eq!(state.current_heading, heading);
        assert_eq!(state.active_parent, heading);
        assert_eq!(state.open_list, None);
        assert_eq!(state.blank_run, 0);
    }

    #[test]
    fn test_step_blank_counts_and_closes_list() {
        let mut doc = Document::new();
        let mut state = step(
            &mut doc,
            ParserState::new(),
            Line::UnorderedItem {
                indent: 0,
                marker: "-",
                text: "x",
            },
        );
        assert!(state.open_list.is_some());
        state = step(&mut doc, state, Line::Blank);
        assert_eq!(state.blank_run, 1);
        assert!(state.open_list.is_some());
        state = step(&mut doc, state, Line::Blank);
        assert_eq!(state.blank_run, 2);
        assert_eq!(state.open_list, None);
        assert_eq!(state.active_parent, NodeId::ROOT);
    }

    #[test]
    fn test_step_text_resets_blank_run() {
        let mut doc = Document::new();
        let state = ParserState {
            blank_run: 3,
            ..ParserState::new()
        };
        let state = step(
            &mut doc,
            state,
            Line::Text {
                indent: 0,
                text: "t",
            },
        );
        assert_eq!(state.blank_run, 0);
        assert!(state.open_text.is_some());
    }

    #[test]
    fn test_feed_ignores_line_terminator() {
        let mut parser = Parser::new();
        parser.feed("* H\r\n");
        let doc = parser.finish();
        let heading = doc.children(doc.root())[0];
        assert_eq!(
            doc.kind(heading),
            &NodeKind::Heading {
                level: 1,
                text: "H".to_string()
            }
        );
    }
}
