//! Mutable in-memory HTML tree the editor works on.
//!
//! Parsing goes through html5ever (via `scraper`) so the tree matches what a
//! browser would build; serialization follows the HTML fragment
//! serialization rules so `serialize()` reads like `outerHTML`.

use scraper::{Html, Node as ParsedNode};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype { name: String },
    Element { name: String, attrs: Vec<(String, String)> },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An HTML document plus the editing flag a browser keeps on it.
///
/// A [`NodeId`] that doesn't belong to this document (one kept across a
/// reload, say) reads as nothing and mutates nothing.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    nodes: Vec<Node>,
    design_mode: bool,
}

impl Default for HtmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlDocument {
    const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
            design_mode: false,
        }
    }

    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut document = Self::new();

        // pairs of (parsed node, our already-created counterpart)
        let mut pending = vec![(parsed.tree.root(), Self::ROOT)];
        while let Some((source, parent)) = pending.pop() {
            for child in source.children() {
                let data = match child.value() {
                    ParsedNode::Doctype(doctype) => NodeData::Doctype {
                        name: doctype.name().to_string(),
                    },
                    ParsedNode::Element(element) => NodeData::Element {
                        name: element.name().to_string(),
                        attrs: element
                            .attrs
                            .iter()
                            .map(|(name, value)| {
                                let value: &str = value;
                                (
                                    serialized_attr_name(&name.ns, &name.local),
                                    value.to_string(),
                                )
                            })
                            .collect(),
                    },
                    ParsedNode::Text(text) => {
                        let text: &str = text;
                        NodeData::Text(text.to_string())
                    }
                    ParsedNode::Comment(comment) => {
                        let comment: &str = comment;
                        NodeData::Comment(comment.to_string())
                    }
                    _ => continue,
                };

                let id = document.push(data);
                document.append_child(parent, id);
                pending.push((child, id));
            }
        }

        document
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|n| &n.data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn design_mode(&self) -> bool {
        self.design_mode
    }

    pub fn set_design_mode(&mut self, on: bool) {
        self.design_mode = on;
    }

    /// Lower-case tag name, or `None` for non-element nodes.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id)
            .map(|name| name.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(Self::ROOT)
            .iter()
            .copied()
            .find(|c| self.tag_name(*c).is_some())
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .copied()
            .find(|c| self.is_element(*c, "body"))
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    /// Moves `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Takes `id` (and its subtree) out of the tree. The node stays valid and
    /// can be re-inserted.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|c| *c != id);
        }
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == Self::ROOT {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Every node below `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Attached elements in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(Self::ROOT)
            .into_iter()
            .filter(|id| self.tag_name(*id).is_some())
            .collect()
    }

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|id| self.attribute(*id, "id") == Some(element_id))
    }

    /// `id` itself or its nearest ancestor with the given tag.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_element(node, tag) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.node_mut(id).map(|n| &mut n.data) {
            match attrs.iter().position(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some(idx) => attrs[idx].1 = value.to_string(),
                None => attrs.push((name.to_ascii_lowercase(), value.to_string())),
            }
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(NodeData::Element { attrs, .. }) = self.node_mut(id).map(|n| &mut n.data) {
            attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
    }

    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        let style = self.attribute(id, "style")?;
        let property = property.to_ascii_lowercase();
        parse_style(style)
            .into_iter()
            .find(|(k, _)| *k == property)
            .map(|(_, v)| v)
    }

    /// Sets one inline style declaration; an empty value removes it, and
    /// the `style` attribute goes away with its last declaration. When
    /// nothing changes the attribute text is left exactly as written.
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        let original = self
            .attribute(id, "style")
            .map(parse_style)
            .unwrap_or_default();
        let mut declarations = original.clone();

        let value = value.trim();
        match declarations.iter().position(|(k, _)| *k == property) {
            Some(idx) if value.is_empty() => {
                declarations.remove(idx);
            }
            Some(idx) => declarations[idx].1 = value.to_string(),
            None if value.is_empty() => {}
            None => declarations.push((property, value.to_string())),
        }

        if declarations == original {
            return;
        }

        if declarations.is_empty() {
            self.remove_attribute(id, "style");
        } else {
            self.set_attribute(id, "style", &format_style(&declarations));
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(NodeData::Text(text)) = self.data(id) {
            return text.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| match self.data(d) {
                Some(NodeData::Text(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replaces every child of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if let NodeData::Text(existing) = &mut node.data {
            *existing = text.to_string();
            return;
        }

        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }

        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(id, text_node);
        }
    }

    /// `<!doctype html>` followed by the outer HTML of the root element.
    pub fn serialize(&self) -> String {
        let mut out = String::from("<!doctype html>\n");
        if let Some(html) = self.document_element() {
            self.write_node(html, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.data(id) else {
            return;
        };
        match data {
            NodeData::Document => {
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
            }
            NodeData::Doctype { name } => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|p| self.tag_name(p))
                    .map(|tag| RAW_TEXT_ELEMENTS.contains(&tag))
                    .unwrap_or(false);
                if raw {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            NodeData::Element { name, attrs } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&name.as_str()) {
                    return;
                }

                for child in self.children(id) {
                    self.write_node(*child, out);
                }

                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}

fn escape_into(raw: &str, attribute: bool, out: &mut String) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

// attribute names as the html serializer writes them: foreign attributes keep their prefix
fn serialized_attr_name(ns: &str, local: &str) -> String {
    match ns {
        XML_NS => format!("xml:{}", local),
        XMLNS_NS if local == "xmlns" => local.to_string(),
        XMLNS_NS => format!("xmlns:{}", local),
        XLINK_NS => format!("xlink:{}", local),
        _ => local.to_string(),
    }
}

// splits on `;` outside quotes and parentheses, so `url("data:image/png;base64,..")` stays whole
fn split_declarations(style: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in style.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&style[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&style[start..]);
    parts
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    split_declarations(style)
        .into_iter()
        .filter_map(|declaration| {
            let (key, value) = declaration.split_once(':')?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key, value.to_string()))
            }
        })
        .collect()
}

fn format_style(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(k, v)| format!("{}: {};", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}
