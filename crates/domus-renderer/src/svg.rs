//! Owned, mutable SVG element tree.
//!
//! Artifacts are parsed once with `roxmltree` and converted into plain
//! [`Element`] values so the fitter can rewrite attributes and the surface can
//! serialize the result back to text.

use std::fmt::Write as _;

use thiserror::Error;

const SVG_TAG: &str = "svg";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("drawing is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("malformed drawing: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("expected an <svg> root element, found <{found}>")]
    NotSvg { found: String },
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An SVG element with its attributes in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Qualified tag name as written in the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag name without namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(idx).1)
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Builder-style attribute.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Direct element children, skipping text.
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    // ── Inline style ─────────────────────────────────────────────────

    fn style_declarations(&self) -> Vec<(String, String)> {
        self.attr("style")
            .unwrap_or_default()
            .split(';')
            .filter_map(|decl| {
                let (prop, value) = decl.split_once(':')?;
                let prop = prop.trim();
                if prop.is_empty() {
                    return None;
                }
                Some((prop.to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect()
    }

    pub fn style_property(&self, property: &str) -> Option<String> {
        self.style_declarations()
            .into_iter()
            .rev()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v)
    }

    /// Set one inline style property, keeping the others.
    pub fn set_style_property(&mut self, property: &str, value: &str) {
        let mut decls = self.style_declarations();
        decls.retain(|(p, _)| p != property);
        decls.push((property.to_string(), value.to_string()));
        let style = decls
            .iter()
            .map(|(p, v)| format!("{p}: {v};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr("style", style);
    }

    /// False when the element is removed from rendering with `display: none`.
    pub fn is_displayed(&self) -> bool {
        let hidden = |v: &str| v.trim().eq_ignore_ascii_case("none");
        !(self.attr("display").is_some_and(hidden)
            || self.style_property("display").is_some_and(|v| hidden(&v)))
    }

    fn write_to(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.name);
        for (k, v) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", k, escape_attr(v));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_to(out),
                Node::Text(t) => out.push_str(&escape_text(t)),
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Element(e) => collect_text(e, out),
            Node::Text(t) => out.push_str(t),
        }
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

/// A parsed vector drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    root: Element,
}

impl Drawing {
    /// Wrap an already-built `<svg>` element.
    pub fn from_root(root: Element) -> Result<Self, RenderError> {
        if root.local_name() != SVG_TAG {
            return Err(RenderError::NotSvg {
                found: root.name().to_string(),
            });
        }
        Ok(Self { root })
    }

    pub fn parse(text: &str) -> Result<Self, RenderError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)?;
        let root = convert(doc.root_element(), None);
        Self::from_root(root)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RenderError> {
        Self::parse(std::str::from_utf8(bytes)?)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn view_box(&self) -> Option<&str> {
        self.root.attr("viewBox")
    }

    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        self.root.write_to(&mut out);
        out
    }
}

/// Qualified name for a namespaced tag or attribute.
fn qualified(node: roxmltree::Node<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(XML_NAMESPACE) => format!("xml:{local}"),
        Some(uri) => match node.lookup_prefix(uri) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
            _ => local.to_string(),
        },
        None => local.to_string(),
    }
}

fn convert(node: roxmltree::Node<'_, '_>, parent: Option<roxmltree::Node<'_, '_>>) -> Element {
    let tag = node.tag_name();
    let mut element = Element::new(&qualified(node, tag.namespace(), tag.name()));

    // Declare only the namespaces this element introduces.
    for ns in node.namespaces() {
        if ns.uri() == XML_NAMESPACE {
            continue;
        }
        let inherited = parent.is_some_and(|p| {
            p.namespaces()
                .any(|pns| pns.name() == ns.name() && pns.uri() == ns.uri())
        });
        if inherited {
            continue;
        }
        let key = match ns.name() {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        element.attributes.push((key, ns.uri().to_string()));
    }

    for attr in node.attributes() {
        let key = qualified(node, attr.namespace(), attr.name());
        element.attributes.push((key, attr.value().to_string()));
    }

    for child in node.children() {
        if child.is_element() {
            element.children.push(Node::Element(convert(child, Some(node))));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(Node::Text(text.to_string()));
            }
        }
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let text = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><rect x="1" y="2" width="3" height="4"/><text x="0" y="10">a &amp; b</text></svg>"#;
        let drawing = Drawing::parse(text).unwrap();
        assert_eq!(drawing.root().attr("width"), Some("100"));
        assert_eq!(drawing.root().element_children().count(), 2);
        assert_eq!(drawing.to_svg_string(), text);
    }

    #[test]
    fn test_xlink_prefix_preserved() {
        let text = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><use xlink:href="#a"/></svg>"##;
        let drawing = Drawing::parse(text).unwrap();
        let use_el = drawing.root().element_children().next().unwrap();
        assert_eq!(use_el.attr("xlink:href"), Some("#a"));

        let output = drawing.to_svg_string();
        assert!(output.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
        let reparsed = Drawing::parse(&output).unwrap();
        let use_again = reparsed.root().element_children().next().unwrap();
        assert_eq!(use_again.attr("xlink:href"), Some("#a"));
    }

    #[test]
    fn test_rejects_non_svg_root() {
        let err = Drawing::parse("<html><body/></html>").unwrap_err();
        assert!(matches!(err, RenderError::NotSvg { ref found } if found == "html"));
    }

    #[test]
    fn test_rejects_malformed_xml() {
        assert!(matches!(Drawing::parse("<svg><rect></svg>"), Err(RenderError::Xml(_))));
        assert!(matches!(Drawing::from_bytes(&[0xff, 0xfe]), Err(RenderError::Encoding(_))));
    }

    #[test]
    fn test_accepts_doctype() {
        let text = r#"<?xml version="1.0"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg"><rect width="1" height="1"/></svg>"#;
        assert!(Drawing::parse(text).is_ok());
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut e = Element::new("svg").with_attr("width", "10").with_attr("height", "5");
        e.set_attr("width", "20");
        assert_eq!(e.attributes()[0], ("width".to_string(), "20".to_string()));
        assert_eq!(e.remove_attr("height"), Some("5".to_string()));
        assert_eq!(e.attr("height"), None);
    }

    #[test]
    fn test_style_properties() {
        let mut e = Element::new("svg").with_attr("style", "border: 1px solid; WIDTH: 10px");
        assert_eq!(e.style_property("width"), Some("10px".to_string()));
        e.set_style_property("width", "90%");
        e.set_style_property("height", "90%");
        assert_eq!(e.attr("style"), Some("border: 1px solid; width: 90%; height: 90%;"));
    }

    #[test]
    fn test_display_none() {
        assert!(Element::new("rect").is_displayed());
        assert!(!Element::new("rect").with_attr("display", "none").is_displayed());
        assert!(!Element::new("rect").with_attr("style", "display:none").is_displayed());
    }

    #[test]
    fn test_escaping_round_trip() {
        let mut drawing = Drawing::from_root(Element::new("svg")).unwrap();
        drawing.root_mut().set_attr("data-label", "a \"quoted\" <b>");
        assert_eq!(
            drawing.to_svg_string(),
            r#"<svg data-label="a &quot;quoted&quot; &lt;b&gt;"/>"#
        );
    }
}
