//! Abstract markup tree for the output document.
//!
//! The consuming engine resolves references top-down and is sensitive to
//! attribute and child ordering, so the tree keeps attributes as an
//! ordered list rather than a map. Escaping is delegated to quick-xml;
//! the layout (indentation, self-closing empties) is fixed here so the
//! same tree always prints to the same bytes.

use quick_xml::escape::escape;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: vec![],
            text: None,
            children: vec![],
        }
    }

    /// A `property` child node, the key/value convention the engine uses
    /// for everything that is not positional.
    pub fn property(name: &str, value: impl Into<String>) -> Self {
        Element::new("property").attr("name", name).with_text(value)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replace an attribute in place (keeping its position), or append it.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.into(),
            None => self.attrs.push((name.to_string(), value.into())),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Text of the `property` child carrying `name`.
    pub fn property_text(&self, name: &str) -> Option<&str> {
        self.find_all("property")
            .find(|p| p.get_attr("name") == Some(name))
            .and_then(|p| p.text())
    }

    /// Rewrite the text of the `property` child carrying `name`. Returns
    /// false when no such property exists.
    pub fn set_property_text(&mut self, name: &str, value: impl Into<String>) -> bool {
        for child in &mut self.children {
            if child.tag == "property" && child.get_attr("name") == Some(name) {
                child.text = Some(value.into());
                return true;
            }
        }
        false
    }

    /// Render the tree with a declaration header and 4-space indentation.
    pub fn to_pretty_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        self.write_into(&mut out, 0);
        out
    }

    fn write_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("    ");
        }
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            out.push_str("/>\n");
            return;
        }

        if self.children.is_empty() {
            if let Some(text) = &self.text {
                let _ = write!(out, ">{}</{}>\n", escape(text.as_str()), self.tag);
                return;
            }
        }

        out.push_str(">\n");
        if let Some(text) = &self.text {
            for _ in 0..=depth {
                out.push_str("    ");
            }
            let _ = write!(out, "{}\n", escape(text.as_str()));
        }
        for child in &self.children {
            child.write_into(out, depth + 1);
        }
        for _ in 0..depth {
            out.push_str("    ");
        }
        let _ = write!(out, "</{}>\n", self.tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_ordering_is_preserved() {
        let e = Element::new("entry")
            .attr("producer", "a")
            .attr("in", "0")
            .attr("out", "9");
        assert_eq!(e.get_attr("producer"), Some("a"));
        assert_eq!(
            e.to_pretty_xml(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <entry producer=\"a\" in=\"0\" out=\"9\"/>\n"
        );
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut e = Element::new("entry").attr("producer", "a").attr("in", "0");
        e.set_attr("producer", "b");
        assert_eq!(e.get_attr("producer"), Some("b"));
        assert!(e.to_pretty_xml().contains("producer=\"b\" in=\"0\""));
    }

    #[test]
    fn nested_layout() {
        let mut producer = Element::new("producer").attr("id", "clip");
        producer.push(Element::property("resource", "/media/a.mov"));
        let mut root = Element::new("mlt");
        root.push(producer);
        root.push(Element::new("blank").attr("length", "5"));

        assert_eq!(
            root.to_pretty_xml(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <mlt>\n\
             \x20   <producer id=\"clip\">\n\
             \x20       <property name=\"resource\">/media/a.mov</property>\n\
             \x20   </producer>\n\
             \x20   <blank length=\"5\"/>\n\
             </mlt>\n"
        );
    }

    #[test]
    fn text_and_attrs_are_escaped() {
        let e = Element::property("resource", "a & b <c>").attr("note", "\"q\"");
        let xml = e.to_pretty_xml();
        assert!(xml.contains("a &amp; b &lt;c&gt;"));
        assert!(xml.contains("note=\"&quot;q&quot;\""));
    }

    #[test]
    fn property_text_lookup_and_rewrite() {
        let mut producer = Element::new("producer").attr("id", "clip");
        producer.push(Element::property("resource", "/media/a.mov"));
        producer.push(Element::property("mlt_service", "qimage"));

        assert_eq!(producer.property_text("resource"), Some("/media/a.mov"));
        assert!(producer.set_property_text("resource", "0.5:/media/a.mov"));
        assert_eq!(producer.property_text("resource"), Some("0.5:/media/a.mov"));
        assert!(!producer.set_property_text("length", "10"));
    }
}
