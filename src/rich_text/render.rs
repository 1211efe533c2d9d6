use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{Document, Node, TextRun};

/// Renders a document to HTML. An absent document renders to an empty string.
pub fn render(document: Option<&Document>) -> String {
    let mut out = String::new();
    if let Some(document) = document {
        document
            .content
            .iter()
            .for_each(|node| render_node(&mut out, node));
    }
    out
}

fn render_container(out: &mut String, tag: &str, children: &[Node]) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    children.iter().for_each(|node| render_node(out, node));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn render_text(out: &mut String, run: &TextRun) {
    for mark in &run.marks {
        out.push('<');
        out.push_str(mark.tag_name());
        out.push('>');
    }
    out.push_str(&encode_text(&run.value));
    for mark in run.marks.iter().rev() {
        out.push_str("</");
        out.push_str(mark.tag_name());
        out.push('>');
    }
}

fn render_node(out: &mut String, node: &Node) {
    match node {
        Node::Text(run) => render_text(out, run),
        Node::Hyperlink { uri, children } => {
            out.push_str("<a href=\"");
            out.push_str(&encode_double_quoted_attribute(uri));
            out.push_str("\">");
            children.iter().for_each(|run| render_text(out, run));
            out.push_str("</a>");
        }
        Node::HorizontalRule => out.push_str("<hr/>"),
        Node::Paragraph(children) => render_container(out, "p", children),
        Node::Heading { level, children } => render_container(out, level.tag_name(), children),
        Node::UnorderedList(children) => render_container(out, "ul", children),
        Node::OrderedList(children) => render_container(out, "ol", children),
        Node::ListItem(children) => render_container(out, "li", children),
        Node::Blockquote(children) => render_container(out, "blockquote", children),
        Node::Unknown { children, .. } => children.iter().for_each(|node| render_node(out, node)),
    }
}

fn text_content(out: &mut String, nodes: &[Node]) {
    for node in nodes {
        match node {
            Node::Text(run) => out.push_str(&run.value),
            Node::Hyperlink { children, .. } => {
                children.iter().for_each(|run| out.push_str(&run.value))
            }
            Node::HorizontalRule => {}
            Node::Paragraph(children)
            | Node::Heading { children, .. }
            | Node::UnorderedList(children)
            | Node::OrderedList(children)
            | Node::ListItem(children)
            | Node::Blockquote(children) => {
                if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
                text_content(out, children);
            }
            Node::Unknown { children, .. } => text_content(out, children),
        }
    }
}

/// Concatenated text of a document with block boundaries collapsed to a
/// single space. Used for excerpts and search.
pub fn plain_text(document: Option<&Document>) -> String {
    let mut out = String::new();
    if let Some(document) = document {
        text_content(&mut out, &document.content);
    }
    out.trim().to_owned()
}
