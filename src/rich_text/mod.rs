//! Structured rich-text documents as delivered by the content API.
//!
//! The wire form is a tree of `{ "nodeType", "content", "value", "marks", "data" }`
//! objects. It is decoded into [`Node`], a closed set of the node kinds the site
//! knows how to render, with [`Node::Unknown`] catching everything else.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

mod render;

pub use render::{plain_text, render};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    pub fn from_node_type(node_type: &str) -> Option<Self> {
        match node_type {
            "heading-1" => Some(Self::H1),
            "heading-2" => Some(Self::H2),
            "heading-3" => Some(Self::H3),
            "heading-4" => Some(Self::H4),
            "heading-5" => Some(Self::H5),
            "heading-6" => Some(Self::H6),
            _ => None,
        }
    }

    pub fn tag_name(self) -> &'static str {
        match self {
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
        }
    }
}

impl From<HeadingLevel> for u8 {
    fn from(value: HeadingLevel) -> Self {
        match value {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
            HeadingLevel::H5 => 5,
            HeadingLevel::H6 => 6,
        }
    }
}

/// Text decoration. The declaration order is the nesting order of the
/// rendered tags, outermost first: `<b><i><u><code>text</code></u></i></b>`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Code,
}

impl Mark {
    fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "underline" => Some(Self::Underline),
            "code" => Some(Self::Code),
            _ => None,
        }
    }

    pub(crate) fn tag_name(self) -> &'static str {
        match self {
            Self::Bold => "b",
            Self::Italic => "i",
            Self::Underline => "u",
            Self::Code => "code",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    pub value: String,
    pub marks: BTreeSet<Mark>,
}

impl TextRun {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            marks: BTreeSet::new(),
        }
    }

    pub fn marked(mut self, mark: Mark) -> Self {
        self.marks.insert(mark);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Paragraph(Vec<Node>),
    Heading {
        level: HeadingLevel,
        children: Vec<Node>,
    },
    UnorderedList(Vec<Node>),
    OrderedList(Vec<Node>),
    ListItem(Vec<Node>),
    Blockquote(Vec<Node>),
    HorizontalRule,
    Text(TextRun),
    Hyperlink {
        uri: String,
        children: Vec<TextRun>,
    },
    /// Any node kind without a dedicated rendering, including malformed
    /// hyperlinks and nodes without a `nodeType`. Only its children are
    /// rendered.
    Unknown {
        node_type: String,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(TextRun::new(value))
    }

    pub fn hyperlink(uri: impl Into<String>, children: Vec<TextRun>) -> Self {
        Self::Hyperlink {
            uri: uri.into(),
            children,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub content: Vec<Node>,
}

impl Document {
    pub fn new(content: Vec<Node>) -> Self {
        Self { content }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

fn children(value: &Value) -> Vec<Node> {
    value["content"]
        .as_array()
        .map(|nodes| nodes.iter().map(Node::from_value).collect())
        .unwrap_or_default()
}

/// Text runs of a hyperlink. Anchors only hold inline text, so text nested in
/// other node kinds is flattened into runs of its own.
fn text_runs(value: &Value, runs: &mut Vec<TextRun>) {
    if value["nodeType"] == "text" {
        runs.push(TextRun::from_value(value));
        return;
    }
    for child in value["content"].as_array().into_iter().flatten() {
        text_runs(child, runs);
    }
}

impl TextRun {
    /// Marks without a known `type` are dropped.
    fn from_value(value: &Value) -> Self {
        TextRun {
            value: value["value"].as_str().unwrap_or_default().to_owned(),
            marks: value["marks"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|mark| mark["type"].as_str().and_then(Mark::from_type))
                .collect(),
        }
    }
}

impl Node {
    /// Decodes one node. Malformed nodes degrade to [`Node::Unknown`] and never
    /// affect their siblings.
    pub fn from_value(value: &Value) -> Self {
        let Some(node_type) = value["nodeType"].as_str() else {
            return Node::Unknown {
                node_type: String::new(),
                children: children(value),
            };
        };
        if let Some(level) = HeadingLevel::from_node_type(node_type) {
            return Node::Heading {
                level,
                children: children(value),
            };
        }
        match node_type {
            "text" => Node::Text(TextRun::from_value(value)),
            "paragraph" => Node::Paragraph(children(value)),
            "unordered-list" => Node::UnorderedList(children(value)),
            "ordered-list" => Node::OrderedList(children(value)),
            "list-item" => Node::ListItem(children(value)),
            "blockquote" => Node::Blockquote(children(value)),
            "hr" => Node::HorizontalRule,
            "hyperlink" if value["data"]["uri"].is_string() => {
                let mut runs = Vec::new();
                for child in value["content"].as_array().into_iter().flatten() {
                    text_runs(child, &mut runs);
                }
                Node::Hyperlink {
                    uri: value["data"]["uri"].as_str().unwrap_or_default().to_owned(),
                    children: runs,
                }
            }
            _ => Node::Unknown {
                node_type: node_type.to_owned(),
                children: children(value),
            },
        }
    }
}

impl Document {
    /// Accepts a `document` root, a bare array of nodes, or a single node.
    pub fn from_value(value: &Value) -> Option<Self> {
        let content = match value {
            Value::Array(nodes) => nodes.iter().map(Node::from_value).collect(),
            Value::Object(_) if value["nodeType"] == "document" => children(value),
            Value::Object(_) => vec![Node::from_value(value)],
            _ => return None,
        };
        Some(Document { content })
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Document::from_value(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a rich-text node or node list"))
    }
}
