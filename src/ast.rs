/// Document tree for org documents
///
/// Nodes live in a flat arena owned by [`Document`] and refer to each other
/// through [`NodeId`] indices. A node's children are an ordered list of ids;
/// the parent link is a plain index used for upward walks while parsing.
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeMap;
use unicode_casefold::UnicodeCaseFold;

/// Index of a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// The synthetic root is always the first node of the arena.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Synthetic level-0 heading holding the whole document. Never rendered.
    Root,
    Heading {
        level: usize,
        text: String,
    },
    List {
        marker: String, // Literal bullet as written: "-", "+", "1.", "3)"
        indent: usize,  // Column of the marker, fixed at creation
        ordered: bool,
    },
    ListItem {
        text: String, // Continuation lines are appended after a '\n'
    },
    TextBlock {
        lines: Vec<String>, // Raw lines; empty for a blank-line block
    },
    Comment {
        text: String, // Line without the leading '#'
    },
    HorizontalRule,
}

impl NodeKind {
    /// Heading level used when resolving heading parents (root counts as 0).
    pub fn heading_level(&self) -> Option<usize> {
        match self {
            NodeKind::Root => Some(0),
            NodeKind::Heading { level, .. } => Some(*level),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            parent,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A parsed document: the node arena plus the options collected from
/// `#+KEY: value` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    options: Options,
}

impl Document {
    pub fn new() -> Self {
        Document {
            nodes: vec![Node::new(NodeKind::Root, None)],
            options: Options::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.last().copied()
    }

    /// Number of nodes in the arena, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub(crate) fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Create a node and append it as the last child of `parent`.
    pub(crate) fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    /// Pre-order enter/leave events over the whole tree, starting at the root.
    pub fn events(&self) -> Events<'_> {
        Events {
            doc: self,
            stack: vec![Event::Enter(NodeId::ROOT)],
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Traversal event emitted by [`Document::events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Enter(NodeId),
    Leave(NodeId),
}

/// Depth-first, left-to-right traversal driven by an explicit stack.
pub struct Events<'a> {
    doc: &'a Document,
    stack: Vec<Event>,
}

impl Iterator for Events<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        let event = self.stack.pop()?;
        if let Event::Enter(id) = event {
            self.stack.push(Event::Leave(id));
            // Reverse so the first child is popped first
            self.stack
                .extend(self.doc.children(id).iter().rev().map(|&c| Event::Enter(c)));
        }
        Some(event)
    }
}

/// Document-level metadata from option lines. Last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Options {
    entries: BTreeMap<String, String>,
}

impl Options {
    /// Look up an option. Keys match case-insensitively, so `get("title")`
    /// finds `#+TITLE:`.
    pub fn get(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.entries.get(key) {
            return Some(value);
        }
        let folded = fold_key(key);
        self.entries
            .iter()
            .find(|(k, _)| fold_key(k) == folded)
            .map(|(_, v)| v.as_str())
    }

    pub fn title(&self) -> Option<&str> {
        self.get("TITLE")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn insert(&mut self, key: String, value: String) -> Option<String> {
        self.entries.insert(key, value)
    }
}

fn fold_key(key: &str) -> String {
    key.chars().case_fold().collect()
}

/// Nested view of a subtree, used for serialization.
#[derive(serde::Serialize)]
struct Subtree<'a> {
    #[serde(flatten)]
    kind: &'a NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<Subtree<'a>>,
}

impl<'a> Subtree<'a> {
    fn new(doc: &'a Document, id: NodeId) -> Self {
        Subtree {
            kind: doc.kind(id),
            children: doc
                .children(id)
                .iter()
                .map(|&child| Subtree::new(doc, child))
                .collect(),
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Document", 2)?;
        state.serialize_field("options", &self.options)?;
        state.serialize_field("tree", &Subtree::new(self, self.root()))?;
        state.end()
    }
}
