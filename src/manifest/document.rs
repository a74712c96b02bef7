//! Lossless XML document tree
//!
//! Manifests are parsed into a tree that keeps every raw event quick-xml hands
//! us (declaration, comments, whitespace, attribute quoting, self-closing form)
//! so that serializing an untouched document reproduces its bytes exactly.
//! Only nodes that are edited or created are re-rendered.

use crate::core::error::ManifestError;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::{escape, partial_escape, unescape};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const DEFAULT_INDENT_UNIT: &str = "  ";

/// A node in the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
  Element(Element),
  /// Character data, stored escaped exactly as read
  Text(BytesText<'static>),
  /// Comments, CDATA, declarations, processing instructions, doctype
  Other(Event<'static>),
}

impl Node {
  fn as_element(&self) -> Option<&Element> {
    match self {
      Node::Element(el) => Some(el),
      _ => None,
    }
  }

  fn whitespace(&self) -> Option<&str> {
    match self {
      Node::Text(text) => std::str::from_utf8(text)
        .ok()
        .filter(|s| s.chars().all(char::is_whitespace)),
      _ => None,
    }
  }
}

/// An element with its raw start tag and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
  name: String,
  start: BytesStart<'static>,
  end: Option<BytesEnd<'static>>,
  children: Vec<Node>,
  self_closing: bool,
}

/// Whitespace conventions of a document, used when inserting elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentStyle {
  pub newline: &'static str,
  pub unit: String,
}

impl IndentStyle {
  fn at_depth(&self, depth: usize) -> String {
    format!("{}{}", self.newline, self.unit.repeat(depth))
  }
}

impl Default for IndentStyle {
  fn default() -> Self {
    Self {
      newline: "\n",
      unit: DEFAULT_INDENT_UNIT.to_string(),
    }
  }
}

impl Element {
  /// A new element holding only text
  pub fn with_text(name: &str, value: &str) -> Self {
    let mut el = Self::open(name);
    el.children.push(text_node(value));
    el
  }

  /// A new element rendered as `<name></name>` until children are added
  pub fn open(name: &str) -> Self {
    Self {
      name: name.to_string(),
      start: BytesStart::new(name.to_string()),
      end: None,
      children: Vec::new(),
      self_closing: false,
    }
  }

  /// A new self-closing element, written MSBuild style as `<name a="b" />`
  pub fn empty_with_attributes(name: &str, attributes: &[(&str, &str)]) -> Self {
    let mut content = name.to_string();
    for (key, value) in attributes {
      content.push_str(&format!(" {}=\"{}\"", key, escape(*value)));
    }
    content.push(' ');
    Self {
      name: name.to_string(),
      start: BytesStart::from_content(content, name.len()),
      end: None,
      children: Vec::new(),
      self_closing: true,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
    self.children.iter().filter_map(Node::as_element)
  }

  /// Node indices of the child elements named `name`, in document order
  pub fn positions_of(&self, name: &str) -> Vec<usize> {
    self
      .children
      .iter()
      .enumerate()
      .filter(|(_, node)| node.as_element().is_some_and(|el| el.name == name))
      .map(|(index, _)| index)
      .collect()
  }

  pub fn find_child(&self, name: &str) -> Option<&Element> {
    self.child_elements().find(|el| el.name == name)
  }

  pub fn find_child_mut(&mut self, name: &str) -> Option<&mut Element> {
    self.children.iter_mut().find_map(|node| match node {
      Node::Element(el) if el.name == name => Some(el),
      _ => None,
    })
  }

  /// Child element at a node index returned by [`Element::positions_of`] or
  /// [`Element::append_child`]
  pub fn element_at(&self, index: usize) -> Option<&Element> {
    self.children.get(index).and_then(Node::as_element)
  }

  pub fn element_at_mut(&mut self, index: usize) -> Option<&mut Element> {
    match self.children.get_mut(index) {
      Some(Node::Element(el)) => Some(el),
      _ => None,
    }
  }

  /// Unescaped attribute value
  pub fn attribute(&self, key: &str) -> Option<String> {
    self
      .start
      .attributes()
      .flatten()
      .find(|attr| attr.key.as_ref() == key.as_bytes())
      .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
  }

  /// Concatenated, unescaped character data of the direct children
  pub fn text(&self) -> Result<String, ManifestError> {
    let mut out = String::new();
    for node in &self.children {
      match node {
        Node::Text(text) => {
          let raw = std::str::from_utf8(text).map_err(|e| unparseable(e.to_string()))?;
          out.push_str(&unescape(raw).map_err(|e| unparseable(e.to_string()))?);
        }
        Node::Other(Event::CData(data)) => out.push_str(&String::from_utf8_lossy(data)),
        _ => {}
      }
    }
    Ok(out)
  }

  /// Replace the children with a single text node
  ///
  /// Leaves the element untouched when it already holds exactly `value`, so
  /// re-applying an edit never changes bytes.
  pub fn set_text(&mut self, value: &str) -> Result<(), ManifestError> {
    let only_text = self
      .children
      .iter()
      .all(|n| matches!(n, Node::Text(_) | Node::Other(Event::CData(_))));
    if only_text && !self.children.is_empty() && self.text()? == value {
      return Ok(());
    }
    self.open_up();
    self.children = vec![text_node(value)];
    Ok(())
  }

  /// Append a child element, indented like its siblings
  ///
  /// `depth` is this element's nesting level (the root is 0). Returns the node
  /// index of the new child.
  pub fn append_child(&mut self, child: Element, depth: usize, style: &IndentStyle) -> usize {
    let indent = self.child_indent(style).unwrap_or_else(|| style.at_depth(depth + 1));
    self.open_up();

    let trailing_ws = self.children.last().and_then(Node::whitespace).is_some();
    let has_elements = self.children.iter().any(|n| n.as_element().is_some());
    if trailing_ws && has_elements {
      let at = self.children.len() - 1;
      self.children.insert(at, Node::Text(owned_text(indent)));
      self.children.insert(at + 1, Node::Element(child));
      at + 1
    } else {
      if trailing_ws {
        self.children.pop();
      }
      self.children.push(Node::Text(owned_text(indent)));
      self.children.push(Node::Element(child));
      let at = self.children.len() - 1;
      self.children.push(Node::Text(owned_text(style.at_depth(depth))));
      at
    }
  }

  /// Turn `<name />` into `<name>` so children can follow
  fn open_up(&mut self) {
    if self.self_closing {
      let raw = String::from_utf8_lossy(&self.start).trim_end().to_string();
      self.start = BytesStart::from_content(raw, self.name.len());
      self.self_closing = false;
    }
  }

  /// Whitespace that precedes the last indented child element
  fn child_indent(&self, style: &IndentStyle) -> Option<String> {
    self.children.windows(2).rev().find_map(|pair| match pair {
      [ws, Node::Element(_)] => ws.whitespace().and_then(|s| normalize_indent(s, style)),
      _ => None,
    })
  }

  fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), ManifestError> {
    if self.self_closing && self.children.is_empty() {
      return write_event(writer, Event::Empty(self.start.clone()));
    }
    write_event(writer, Event::Start(self.start.clone()))?;
    for child in &self.children {
      write_node(writer, child)?;
    }
    let end = self.end.clone().unwrap_or_else(|| BytesEnd::new(self.name.clone()));
    write_event(writer, Event::End(end))
  }
}

/// A parsed XML document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
  bom: bool,
  newline: &'static str,
  nodes: Vec<Node>,
}

impl Document {
  /// Parse raw manifest bytes
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, ManifestError> {
    let text = std::str::from_utf8(bytes).map_err(|e| unparseable(format!("not valid UTF-8: {}", e)))?;
    Self::parse(text)
  }

  pub fn parse(source: &str) -> Result<Self, ManifestError> {
    let (bom, body) = match source.strip_prefix('\u{feff}') {
      Some(rest) => (true, rest),
      None => (false, source),
    };

    let mut reader = Reader::from_str(body);
    let mut top: Vec<Node> = Vec::new();
    let mut stack: Vec<Element> = Vec::new();

    loop {
      let event = reader
        .read_event()
        .map_err(|e| unparseable(format!("{} (near byte {})", e, reader.buffer_position())))?;

      let node = match event {
        Event::Eof => break,
        Event::Start(start) => {
          stack.push(Element {
            name: element_name(&start)?,
            start: start.into_owned(),
            end: None,
            children: Vec::new(),
            self_closing: false,
          });
          continue;
        }
        Event::End(end) => {
          let Some(mut el) = stack.pop() else {
            return Err(unparseable(format!(
              "unexpected closing tag near byte {}",
              reader.buffer_position()
            )));
          };
          el.end = Some(end.into_owned());
          Node::Element(el)
        }
        Event::Empty(start) => Node::Element(Element {
          name: element_name(&start)?,
          start: start.into_owned(),
          end: None,
          children: Vec::new(),
          self_closing: true,
        }),
        Event::Text(text) => Node::Text(text.into_owned()),
        other => Node::Other(other.into_owned()),
      };

      match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
      }
    }

    if let Some(open) = stack.last() {
      return Err(unparseable(format!("element <{}> is never closed", open.name)));
    }
    if !top.iter().any(|n| n.as_element().is_some()) {
      return Err(unparseable("document has no root element".to_string()));
    }

    let newline = if body.contains("\r\n") { "\r\n" } else { "\n" };
    Ok(Self {
      bom,
      newline,
      nodes: top,
    })
  }

  pub fn root(&self) -> Option<&Element> {
    self.nodes.iter().find_map(Node::as_element)
  }

  pub fn root_mut(&mut self) -> Option<&mut Element> {
    self.nodes.iter_mut().find_map(|node| match node {
      Node::Element(el) => Some(el),
      _ => None,
    })
  }

  /// Newline style and indentation unit used by the root's children
  pub fn indent_style(&self) -> IndentStyle {
    let unit = self
      .root()
      .and_then(|root| root.child_indent(&IndentStyle::default()))
      .map(|indent| indent.trim_start_matches(['\r', '\n']).to_string())
      .filter(|unit| !unit.is_empty())
      .unwrap_or_else(|| DEFAULT_INDENT_UNIT.to_string());
    IndentStyle {
      newline: self.newline,
      unit,
    }
  }

  pub fn to_bytes(&self) -> Result<Vec<u8>, ManifestError> {
    let mut out = Vec::new();
    if self.bom {
      out.extend_from_slice(UTF8_BOM);
    }
    let mut writer = Writer::new(out);
    for node in &self.nodes {
      write_node(&mut writer, node)?;
    }
    Ok(writer.into_inner())
  }
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &Node) -> Result<(), ManifestError> {
  match node {
    Node::Element(el) => el.write(writer),
    Node::Text(text) => write_event(writer, Event::Text(text.clone())),
    Node::Other(event) => write_event(writer, event.clone()),
  }
}

fn write_event<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), ManifestError> {
  writer
    .write_event(event)
    .map_err(|e| ManifestError::Serialize { reason: e.to_string() })
}

fn element_name(start: &BytesStart<'_>) -> Result<String, ManifestError> {
  std::str::from_utf8(start.name().as_ref())
    .map(str::to_string)
    .map_err(|e| unparseable(e.to_string()))
}

fn text_node(value: &str) -> Node {
  Node::Text(owned_text(partial_escape(value).into_owned()))
}

fn owned_text(escaped: String) -> BytesText<'static> {
  BytesText::from_escaped(escaped)
}

/// Keep only the last line break plus the indentation after it
fn normalize_indent(ws: &str, style: &IndentStyle) -> Option<String> {
  let last_break = ws.rfind('\n')?;
  Some(format!("{}{}", style.newline, &ws[last_break + 1..]))
}

fn unparseable(reason: String) -> ManifestError {
  ManifestError::Unparseable { path: None, reason }
}
