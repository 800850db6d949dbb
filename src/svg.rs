//! Minimal SVG document tree.
//!
//! Markup is parsed into [`Element`]s with `quick-xml`, rewritten as a tree and serialized
//! back. Paired (`<rect ...></rect>`) and self-closing (`<rect .../>`) forms parse to the same
//! node, so rewrites never have to care which one the producer chose.

use std::fmt::Write as _;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{EncodingError, EncodingResult};

#[derive(Debug, PartialEq, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), attrs: Vec::new(), children: Vec::new() }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Numeric attribute; `None` when absent or not a plain number.
    pub fn num_attr(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(|v| v.trim().trim_end_matches("px").parse().ok())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Depth-first visit of every descendant element, self excluded.
    pub fn for_each_descendant<'a>(&'a self, f: &mut impl FnMut(&'a Element)) {
        for child in self.elements() {
            f(child);
            child.for_each_descendant(f);
        }
    }

    /// Depth-first rewrite of every descendant element, self excluded. The callback may
    /// replace an element wholesale.
    pub fn map_descendants(&mut self, f: &mut impl FnMut(&mut Element)) {
        for child in self.children.iter_mut() {
            if let Node::Element(e) = child {
                f(e);
                e.map_descendants(f);
            }
        }
    }

    pub fn count(&self, pred: impl Fn(&Element) -> bool) -> usize {
        let mut n = 0;
        self.for_each_descendant(&mut |e| {
            if pred(e) {
                n += 1;
            }
        });
        n
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }
}

// Document
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Clone)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn parse(markup: &str) -> EncodingResult<Self> {
        let err = |e: &dyn std::fmt::Display| EncodingError::Markup(e.to_string());

        let mut reader = Reader::from_str(markup);
        reader.config_mut().trim_text(true);

        // Open elements; the bottom entry collects top-level nodes
        let mut stack: Vec<Element> = vec![Element::new("")];
        loop {
            match reader.read_event().map_err(|e| err(&e))? {
                Event::Start(start) => stack.push(Self::element_from(&start)?),
                Event::Empty(start) => {
                    let el = Self::element_from(&start)?;
                    Self::top(&mut stack).push(el);
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    if stack.len() < 2 {
                        return Err(EncodingError::Markup(format!("unexpected </{name}>")));
                    }
                    let el = stack.pop().ok_or_else(|| err(&"empty stack"))?;
                    if el.name != name {
                        return Err(EncodingError::Markup(format!(
                            "</{name}> closes <{}>",
                            el.name
                        )));
                    }
                    Self::top(&mut stack).push(el);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| err(&e))?.into_owned();
                    if !text.is_empty() {
                        Self::top(&mut stack).children.push(Node::Text(text));
                    }
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data).into_owned();
                    Self::top(&mut stack).children.push(Node::Text(text));
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and doctypes are dropped
                _ => {}
            }
        }

        if stack.len() != 1 {
            let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
            return Err(EncodingError::Markup(format!("unclosed <{open}>")));
        }
        let mut top = stack.pop().ok_or_else(|| err(&"empty stack"))?;
        let mut roots = std::mem::take(&mut top.children).into_iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        });
        let root = roots.next().ok_or_else(|| err(&"no root element"))?;
        if roots.next().is_some() {
            return Err(EncodingError::Markup("more than one root element".to_string()));
        }
        Ok(Self { root })
    }

    fn top(stack: &mut [Element]) -> &mut Element {
        // The sentinel at the bottom keeps the stack non-empty
        let last = stack.len() - 1;
        &mut stack[last]
    }

    fn element_from(start: &BytesStart) -> EncodingResult<Element> {
        let mut el = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
        for attr in start.attributes() {
            let attr = attr.map_err(|e| EncodingError::Markup(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| EncodingError::Markup(e.to_string()))?
                .into_owned();
            el.attrs.push((key, value));
        }
        Ok(el)
    }

    pub fn to_markup(&self) -> EncodingResult<String> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| EncodingError::Markup(e.to_string()))?;
        Self::write_element(&mut writer, &self.root)?;
        String::from_utf8(writer.into_inner()).map_err(|e| EncodingError::Markup(e.to_string()))
    }

    fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> EncodingResult<()> {
        let err = |e: &dyn std::fmt::Display| EncodingError::Markup(e.to_string());

        let mut start = BytesStart::new(el.name.as_str());
        for (k, v) in &el.attrs {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if el.children.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(|e| err(&e));
        }

        writer.write_event(Event::Start(start)).map_err(|e| err(&e))?;
        for child in &el.children {
            match child {
                Node::Element(e) => Self::write_element(writer, e)?,
                Node::Text(t) => {
                    writer.write_event(Event::Text(BytesText::new(t))).map_err(|e| err(&e))?
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new(el.name.as_str()))).map_err(|e| err(&e))
    }
}

/// Formats a coordinate without trailing zeros: `3`, `2.5`, `0.125`.
pub fn fmt_num(v: f64) -> String {
    let mut s = String::new();
    let _ = write!(s, "{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod svg_tests {
    use super::{fmt_num, Document, Element, Node};
    use crate::error::EncodingError;

    const MIXED: &str = r##"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10">
  <!-- modules -->
  <rect x="0" y="0" width="1" height="1" fill="#000"/>
  <rect x="1" y="0" width="1" height="1" fill="#000"></rect>
  <g><rect x="2" y="0" width="1" height="1" fill="#000" /></g>
  <text>a &amp; b</text>
</svg>"##;

    #[test]
    fn test_paired_and_self_closing_parse_alike() {
        let doc = Document::parse(MIXED).unwrap();
        assert_eq!(doc.root.name, "svg");
        assert_eq!(doc.root.count(|e| e.name == "rect"), 3);
        let rects: Vec<&Element> = doc.root.elements().filter(|e| e.name == "rect").collect();
        assert_eq!(*rects[0], rects[1].clone().with_attr("x", "0"));
    }

    #[test]
    fn test_text_is_unescaped_and_reescaped() {
        let doc = Document::parse(MIXED).unwrap();
        let text = doc.root.elements().find(|e| e.name == "text").unwrap();
        assert_eq!(text.children, vec![Node::Text("a & b".to_string())]);
        let out = doc.to_markup().unwrap();
        assert!(out.contains("a &amp; b"));
    }

    #[test]
    fn test_serialize_reparses_to_same_tree() {
        let doc = Document::parse(MIXED).unwrap();
        let out = doc.to_markup().unwrap();
        assert!(out.starts_with("<?xml"));
        assert_eq!(Document::parse(&out).unwrap(), doc);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(Document::parse("<svg><rect></svg>"), Err(EncodingError::Markup(_))));
        assert!(matches!(Document::parse("<svg>"), Err(EncodingError::Markup(_))));
        assert!(matches!(Document::parse(""), Err(EncodingError::Markup(_))));
        assert!(matches!(Document::parse("<a/><b/>"), Err(EncodingError::Markup(_))));
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut el = Element::new("rect").with_attr("x", "1").with_attr("y", "2");
        el.set_attr("x", "3");
        assert_eq!(el.attrs, vec![("x".into(), "3".into()), ("y".into(), "2".into())]);
        assert_eq!(el.num_attr("x"), Some(3.0));
        assert_eq!(el.num_attr("z"), None);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(2.5), "2.5");
        assert_eq!(fmt_num(102.4), "102.4");
        assert_eq!(fmt_num(1.0 / 3.0), "0.333");
        assert_eq!(fmt_num(-0.0001), "0");
    }
}
