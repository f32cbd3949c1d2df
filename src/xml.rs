//! Owned, mutable element tree.
//!
//! Documents are read with `roxmltree` (which is read-only) and copied into
//! an arena of nodes addressed by [`NodeId`].  Ids stay valid for the life
//! of the tree: removing a node only detaches it from its parent.
//!
//! Besides elements and attributes the tree keeps what a hand-edited file
//! carries along: the XML declaration, comments, processing instructions,
//! non-blank text, namespace declarations and prefixed names.  Whitespace
//! between elements is not kept; [`XmlTree::to_xml`] re-indents.

use crate::error::ParseError;

/// Index of a node inside an [`XmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    Element,
    Comment(String),
    Instruction { target: String, value: Option<String> },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    kind: Kind,
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    fn new(kind: Kind, name: &str, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent,
        }
    }

    fn is_element_named(&self, name: &str) -> bool {
        self.kind == Kind::Element && self.name == name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTree {
    nodes: Vec<Node>,
    root: NodeId,
    declaration: Option<String>,
    before_root: Vec<NodeId>,
    after_root: Vec<NodeId>,
}

impl XmlTree {
    /// A tree holding a single empty root element.
    pub fn new(root_name: &str) -> Self {
        Self {
            nodes: vec![Node::new(Kind::Element, root_name, None)],
            root: NodeId(0),
            declaration: None,
            before_root: Vec::new(),
            after_root: Vec::new(),
        }
    }

    /// Parse XML text into an owned tree.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();

        let mut tree = Self::new(qualified_name(text, &root));
        tree.declaration = xml_declaration(text).map(str::to_string);
        tree.copy_from(text, &root, tree.root);

        let mut seen_root = false;
        for node in doc.root().children() {
            if node == root {
                seen_root = true;
                continue;
            }
            if let Some(id) = tree.detached_from(&node) {
                if seen_root {
                    tree.after_root.push(id);
                } else {
                    tree.before_root.push(id);
                }
            }
        }
        Ok(tree)
    }

    fn copy_from(&mut self, text: &str, source: &roxmltree::Node, target: NodeId) {
        let mut attributes = declared_namespaces(source);
        attributes.extend(
            source
                .attributes()
                .map(|a| (text[a.range_qname()].to_string(), a.value().to_string())),
        );
        self.nodes[target.0].attributes = attributes;

        for child in source.children() {
            if child.is_element() {
                let id = self.append_element(target, qualified_name(text, &child));
                self.copy_from(text, &child, id);
            } else if let Some(id) = self.detached_from(&child) {
                self.nodes[id.0].parent = Some(target);
                self.nodes[target.0].children.push(id);
            }
        }
    }

    /// A parentless copy of a comment, processing instruction or non-blank
    /// text node.
    fn detached_from(&mut self, source: &roxmltree::Node) -> Option<NodeId> {
        let kind = if source.is_comment() {
            Kind::Comment(source.text().unwrap_or_default().to_string())
        } else if let Some(pi) = source.pi() {
            Kind::Instruction {
                target: pi.target.to_string(),
                value: pi.value.map(str::to_string),
            }
        } else {
            match source.text() {
                Some(text) if source.is_text() && !text.trim().is_empty() => Kind::Text(text.to_string()),
                _ => return None,
            }
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind, "", None));
        Some(id)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The `<?xml ...?>` declaration the document was loaded with, if any.
    pub fn declaration(&self) -> Option<&str> {
        self.declaration.as_deref()
    }

    // ─── Attributes ──────────────────────────────────────────────────────

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.nodes[id.0]
            .attributes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let attributes = &mut self.nodes[id.0].attributes;
        match attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// Remove an attribute.  Returns whether it was present.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> bool {
        let attributes = &mut self.nodes[id.0].attributes;
        let before = attributes.len();
        attributes.retain(|(n, _)| n != name);
        attributes.len() != before
    }

    // ─── Children ────────────────────────────────────────────────────────

    /// Child elements with the given tag name, in document order.
    pub fn children_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |c| self.nodes[c.0].is_element_named(name))
    }

    pub fn child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children_named(id, name).next()
    }

    /// Append a new empty element as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(Kind::Element, name, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Insert a new empty element as the first child of `parent`.
    pub fn prepend_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(Kind::Element, name, Some(parent)));
        self.nodes[parent.0].children.insert(0, id);
        id
    }

    /// Insert a new element so that it becomes the `index`-th child named
    /// `name`.  An `index` past the last such child appends after it (or
    /// at the end when there is none).
    pub fn insert_element(&mut self, parent: NodeId, name: &str, index: usize) -> NodeId {
        let siblings: Vec<usize> = self.nodes[parent.0]
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| self.nodes[c.0].is_element_named(name))
            .map(|(position, _)| position)
            .collect();

        let position = match siblings.get(index) {
            Some(&p) => p,
            None => siblings
                .last()
                .map(|&p| p + 1)
                .unwrap_or(self.nodes[parent.0].children.len()),
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(Kind::Element, name, Some(parent)));
        self.nodes[parent.0].children.insert(position, id);
        id
    }

    /// Detach a node from its parent.  The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Append a deep copy of `source` (attributes and descendants) under
    /// `parent`, returning the copy.
    pub fn copy_element(&mut self, source: NodeId, parent: NodeId) -> NodeId {
        let mut node = self.nodes[source.0].clone();
        let children = std::mem::take(&mut node.children);
        node.parent = Some(parent);

        let copy = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(copy);

        for child in children {
            self.copy_element(child, copy);
        }
        copy
    }

    // ─── Serialization ───────────────────────────────────────────────────

    /// Serialize the tree with two-space indentation.  Elements holding
    /// text are written on one line so the text comes back unchanged.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(declaration) = &self.declaration {
            out.push_str(declaration);
            out.push('\n');
        }
        for &id in &self.before_root {
            self.write_node(id, 0, false, &mut out);
            out.push('\n');
        }
        self.write_node(self.root, 0, false, &mut out);
        for &id in &self.after_root {
            out.push('\n');
            self.write_node(id, 0, false, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, depth: usize, inline: bool, out: &mut String) {
        let node = &self.nodes[id.0];
        if !inline {
            out.push_str(&"  ".repeat(depth));
        }

        match &node.kind {
            Kind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            Kind::Instruction { target, value } => {
                out.push_str("<?");
                out.push_str(target);
                if let Some(value) = value {
                    out.push(' ');
                    out.push_str(value);
                }
                out.push_str("?>");
            }
            Kind::Text(text) => escape_text(text, out),
            Kind::Element => self.write_element(node, depth, inline, out),
        }
    }

    fn write_element(&self, element: &Node, depth: usize, inline: bool, out: &mut String) {
        out.push('<');
        out.push_str(&element.name);
        for (name, value) in &element.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        }

        if element.children.is_empty() {
            out.push_str(" />");
            return;
        }

        out.push('>');
        let inline = inline
            || element
                .children
                .iter()
                .any(|c| matches!(self.nodes[c.0].kind, Kind::Text(_)));
        for &child in &element.children {
            if !inline {
                out.push('\n');
            }
            self.write_node(child, depth + 1, inline, out);
        }
        if !inline {
            out.push('\n');
            out.push_str(&"  ".repeat(depth));
        }
        out.push_str("</");
        out.push_str(&element.name);
        out.push('>');
    }
}

/// The element's name as written in the source, prefix included.
fn qualified_name<'a>(text: &'a str, node: &roxmltree::Node) -> &'a str {
    let tag = &text[node.range().start + 1..];
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(tag.len());
    &tag[..end]
}

/// `xmlns` attributes introduced on this element rather than inherited.
fn declared_namespaces(node: &roxmltree::Node) -> Vec<(String, String)> {
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();

    node.namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| {
            let name = match ns.name() {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            (name, ns.uri().to_string())
        })
        .collect()
}

fn xml_declaration(text: &str) -> Option<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text.strip_prefix("<?xml")?;
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    let end = text.find("?>")?;
    Some(&text[..end + 2])
}

fn escape_text(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
