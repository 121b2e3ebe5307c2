//! Tolerant HTML parser into an arena DOM, and its serializer.
//!
//! Text and attribute values are kept exactly as written in the source so that
//! untouched markup serializes back unchanged. Values set through the API are
//! escaped on the way in.

/// Index of a node in the document arena.
pub type NodeId = usize;

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose content is not parsed as markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements closed implicitly by an opening sibling of the same kind.
const SELF_NESTING_CLOSED: &[&str] = &["li", "p", "option", "tr", "td", "th", "dt", "dd"];

/// Start tags that close an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dialog", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre", "section", "summary", "table", "ul",
];

/// Elements that stop the search for an open `<p>`.
const PARAGRAPH_SCOPE: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "template", "th",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<Attribute>,
    pub self_closing: bool,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            self_closing: false,
        }
    }

    /// Decoded value of an attribute; `Some("")` for a bare attribute.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| unescape_text(a.value.as_deref().unwrap_or("")))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set an attribute to an unescaped value.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let escaped = escape_attr(value);
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = Some(escaped),
            None => self.attrs.push(Attribute {
                name: name.to_string(),
                value: Some(escaped),
            }),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    /// `<!...>` or `<?...>` declaration, without the angle brackets
    Doctype(String),
    Comment(String),
    /// Text as written in the markup (entities not decoded)
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Parsed HTML document. Node 0 is the document root.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub const ROOT: NodeId = 0;

    pub fn parse(html: &str) -> Self {
        Parser::new(html).run()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id].data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)
            .parent
            .filter(|&p| self.element(p).is_some())
    }

    /// All element ids in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            if self.element(id).is_some() {
                out.push(id);
            }
            stack.extend(self.nodes[id].children.iter().rev());
        }
        out
    }

    /// First element with the given tag name.
    pub fn find_element(&self, name: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|&id| self.element(id).map(|el| el.name == name).unwrap_or(false))
    }

    pub fn has_element_children(&self, id: NodeId) -> bool {
        self.nodes[id]
            .children
            .iter()
            .any(|&c| self.element(c).is_some())
    }

    /// Decoded text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        unescape_text(&out)
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for &child in &self.nodes[id].children {
            match &self.nodes[child].data {
                NodeData::Text(text) => out.push_str(text),
                NodeData::Element(_) => self.collect_text(child, out),
                _ => {}
            }
        }
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        for child in std::mem::take(&mut self.nodes[id].children) {
            self.nodes[child].parent = None;
        }
        let text_id = self.push(NodeData::Text(escape_text(text)), Some(id));
        self.nodes[id].children.push(text_id);
    }

    /// Replace the first direct text child of `id`. Returns false if there is none.
    pub fn set_first_text_child(&mut self, id: NodeId, text: &str) -> bool {
        let first = self.nodes[id]
            .children
            .iter()
            .copied()
            .find(|&c| matches!(self.nodes[c].data, NodeData::Text(_)));
        match first {
            Some(child) => {
                self.nodes[child].data = NodeData::Text(escape_text(text));
                true
            }
            None => false,
        }
    }

    /// Insert a new element as the first child of `parent`.
    pub fn prepend_element(&mut self, parent: NodeId, element: Element) -> NodeId {
        let id = self.push(NodeData::Element(element), Some(parent));
        self.nodes[parent].children.insert(0, id);
        id
    }

    fn push(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_node(Self::ROOT, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id];
        match &node.data {
            NodeData::Document => self.write_children(id, out),
            NodeData::Doctype(content) => {
                out.push('<');
                out.push_str(content);
                out.push('>');
            }
            NodeData::Comment(content) => {
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
            }
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for attr in &el.attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if let Some(value) = &attr.value {
                        out.push_str("=\"");
                        out.push_str(&value.replace('"', "&quot;"));
                        out.push('"');
                    }
                }
                if el.is_void() {
                    out.push('>');
                    return;
                }
                if el.self_closing && node.children.is_empty() {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                self.write_children(id, out);
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }

    fn write_children(&self, id: NodeId, out: &mut String) {
        for &child in &self.nodes[id].children {
            self.write_node(child, out);
        }
    }
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Decode the handful of entities the serializer produces.
pub fn unescape_text(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    doc: Document,
    stack: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            doc: Document {
                nodes: vec![Node {
                    data: NodeData::Document,
                    parent: None,
                    children: Vec::new(),
                }],
            },
            stack: vec![Document::ROOT],
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(Document::ROOT)
    }

    fn append(&mut self, data: NodeData) -> NodeId {
        let parent = self.current();
        let id = self.doc.push(data, Some(parent));
        self.doc.nodes[parent].children.push(id);
        id
    }

    fn run(mut self) -> Document {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.comment();
            } else if rest.starts_with("</") {
                self.end_tag();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.declaration();
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic())
            {
                self.start_tag();
            } else {
                self.text();
            }
        }
        self.doc
    }

    fn text(&mut self) {
        // Always consume the first char so a stray '<' becomes text.
        let rest = self.rest();
        let first = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        let end = rest[first..]
            .find('<')
            .map(|i| self.pos + first + i)
            .unwrap_or(self.input.len());
        let text = self.input[self.pos..end].to_string();
        self.pos = end;
        self.append_text(text);
    }

    fn append_text(&mut self, text: String) {
        let parent = self.current();
        if let Some(&last) = self.doc.nodes[parent].children.last() {
            if let NodeData::Text(existing) = &mut self.doc.nodes[last].data {
                existing.push_str(&text);
                return;
            }
        }
        self.append(NodeData::Text(text));
    }

    fn comment(&mut self) {
        let body_start = self.pos + 4;
        let (content, next) = match self.input[body_start..].find("-->") {
            Some(i) => (&self.input[body_start..body_start + i], body_start + i + 3),
            None => (&self.input[body_start..], self.input.len()),
        };
        self.pos = next;
        self.append(NodeData::Comment(content.to_string()));
    }

    fn declaration(&mut self) {
        let body_start = self.pos + 1;
        let (content, next) = match self.input[body_start..].find('>') {
            Some(i) => (&self.input[body_start..body_start + i], body_start + i + 1),
            None => (&self.input[body_start..], self.input.len()),
        };
        self.pos = next;
        self.append(NodeData::Doctype(content.to_string()));
    }

    fn end_tag(&mut self) {
        let body_start = self.pos + 2;
        let close = self.input[body_start..]
            .find('>')
            .map(|i| body_start + i)
            .unwrap_or(self.input.len());
        let name = self.input[body_start..close]
            .trim()
            .to_ascii_lowercase();
        self.pos = (close + 1).min(self.input.len());

        if let Some(depth) = self.stack.iter().rposition(|&id| {
            id != Document::ROOT
                && self
                    .doc
                    .element(id)
                    .map(|el| el.name == name)
                    .unwrap_or(false)
        }) {
            self.stack.truncate(depth);
        }
    }

    fn start_tag(&mut self) {
        self.pos += 1;
        let name = self.take_while(|c| !c.is_ascii_whitespace() && c != '/' && c != '>');
        let mut element = Element::new(name);

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                element.self_closing = true;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            let attr_name = self
                .take_while(|c| !c.is_ascii_whitespace() && c != '=' && c != '>' && c != '/')
                .to_ascii_lowercase();
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                Some(self.attr_value())
            } else {
                None
            };
            element.attrs.push(Attribute {
                name: attr_name,
                value,
            });
        }

        let top_is_same = self
            .doc
            .element(self.current())
            .map(|el| el.name == element.name)
            .unwrap_or(false);
        if CLOSES_PARAGRAPH.contains(&element.name.as_str()) {
            self.close_paragraph();
        } else if top_is_same && SELF_NESTING_CLOSED.contains(&element.name.as_str()) {
            self.stack.pop();
        }

        let is_void = element.is_void();
        let self_closing = element.self_closing;
        let raw_text = RAW_TEXT_ELEMENTS.contains(&element.name.as_str());
        let name = element.name.clone();
        let id = self.append(NodeData::Element(element));

        if is_void || self_closing {
            return;
        }
        self.stack.push(id);

        if raw_text {
            let closing = format!("</{}", name);
            let end = self
                .rest()
                .to_ascii_lowercase()
                .find(&closing)
                .map(|i| self.pos + i)
                .unwrap_or(self.input.len());
            if end > self.pos {
                let text = self.input[self.pos..end].to_string();
                self.append(NodeData::Text(text));
            }
            self.pos = end;
        }
    }

    /// Pop up to and including the innermost open `<p>` in scope.
    fn close_paragraph(&mut self) {
        for depth in (1..self.stack.len()).rev() {
            let Some(el) = self.doc.element(self.stack[depth]) else {
                continue;
            };
            if el.name == "p" {
                self.stack.truncate(depth);
                return;
            }
            if PARAGRAPH_SCOPE.contains(&el.name.as_str()) {
                return;
            }
        }
    }

    fn attr_value(&mut self) -> String {
        let rest = self.rest();
        if let Some(quote) = rest.chars().next().filter(|&c| c == '"' || c == '\'') {
            let body = &rest[1..];
            let (value, consumed) = match body.find(quote) {
                Some(i) => (&body[..i], i + 2),
                None => (body, rest.len()),
            };
            self.pos += consumed;
            value.to_string()
        } else {
            self.take_while(|c| !c.is_ascii_whitespace() && c != '>')
                .to_string()
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(|c| c.is_ascii_whitespace());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_markup() {
        let html = "<!DOCTYPE html><html><head><title>Demo &amp; co</title></head>\
                    <body class=\"main\"><!-- hero --><h1 id=\"hero\">Hi <b>there</b></h1>\
                    <img src=\"/logo.png\" alt=\"\"><input disabled></body></html>";
        assert_eq!(Document::parse(html).to_html(), html);
    }

    #[test]
    fn test_single_quoted_attribute_is_normalized() {
        let doc = Document::parse("<a title='say \"hi\"'>x</a>");
        assert_eq!(doc.to_html(), "<a title=\"say &quot;hi&quot;\">x</a>");
    }

    #[test]
    fn test_script_content_is_raw() {
        let html = "<script>if (a < b && c > d) { x = '</div>'; }</script><p>after</p>";
        let doc = Document::parse(html);
        let script = doc.find_element("script").unwrap();
        assert!(!doc.has_element_children(script));
        assert!(doc.find_element("p").is_some());
    }

    #[test]
    fn test_unclosed_list_items_are_siblings() {
        let doc = Document::parse("<ul><li>one<li>two</ul>");
        let ul = doc.find_element("ul").unwrap();
        assert_eq!(doc.node(ul).children.len(), 2);
        assert_eq!(doc.to_html(), "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn test_block_start_tag_closes_open_paragraph() {
        let doc = Document::parse("<p>a<div>b</div><p>c<ul><li>d</li></ul>");
        let div = doc.find_element("div").unwrap();
        assert_eq!(doc.parent_element(div), None);
        assert_eq!(doc.to_html(), "<p>a</p><div>b</div><p>c</p><ul><li>d</li></ul>");
    }

    #[test]
    fn test_paragraph_in_button_stays_open_outside() {
        let doc = Document::parse("<p><button><div>x</div></button></p>");
        let div = doc.find_element("div").unwrap();
        let button = doc.parent_element(div).unwrap();
        assert_eq!(doc.element(button).unwrap().name, "button");
        assert_eq!(doc.to_html(), "<p><button><div>x</div></button></p>");
    }

    #[test]
    fn test_attribute_values_are_decoded() {
        let doc = Document::parse("<a data-element-id=\"a&amp;b\" title=\"&quot;q&quot;\">x</a>");
        let a = doc.find_element("a").unwrap();
        let el = doc.element(a).unwrap();
        assert_eq!(el.attr("data-element-id").as_deref(), Some("a&b"));
        assert_eq!(el.attr("title").as_deref(), Some("\"q\""));
    }

    #[test]
    fn test_stray_end_tag_is_ignored() {
        let doc = Document::parse("<div>a</span>b</div>");
        assert_eq!(doc.to_html(), "<div>ab</div>");
    }

    #[test]
    fn test_stray_less_than_is_text() {
        let doc = Document::parse("<p>1 < 2</p>");
        let p = doc.find_element("p").unwrap();
        assert_eq!(doc.text_content(p), "1 < 2");
    }

    #[test]
    fn test_self_closing_svg_child() {
        let html = "<svg><path d=\"M0 0\" /></svg>";
        assert_eq!(Document::parse(html).to_html(), html);
    }

    #[test]
    fn test_set_text_escapes() {
        let mut doc = Document::parse("<h1>Old</h1>");
        let h1 = doc.find_element("h1").unwrap();
        doc.set_text(h1, "<New & Improved>");
        assert_eq!(doc.to_html(), "<h1>&lt;New &amp; Improved&gt;</h1>");
        assert_eq!(doc.text_content(h1), "<New & Improved>");
    }
}
