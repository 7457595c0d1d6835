//! A small mutable XML element tree and its quick-xml serializer.
//!
//! Feed and entry trees are built as [`Element`]s so extensions can inspect
//! and modify them before serialization. Element names are namespace URI +
//! local name; prefixes are only assigned when the tree is written.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::BTreeMap;
use std::io::Cursor;
use thiserror::Error;

use crate::util::strip_invalid_xml_chars;

/// Prefix -> namespace URI.
pub type Namespaces = BTreeMap<String, String>;

/// Errors raised while serializing a tree.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("XML write error: {0}")]
    Xml(String),

    #[error("No prefix declared for namespace '{0}'")]
    UndeclaredNamespace(String),

    #[error("Generated feed contains invalid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// `None` means the document's default namespace (or no namespace).
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(namespace: &str, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Appends `child` and returns a handle to it.
    pub fn push(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Whether this element has the given namespace and local name.
    pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.name == name
    }

    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First child in the default namespace called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(None, name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find(|c| c.is(None, name))
    }

    /// Children with the given namespace and local name.
    pub fn children_named<'a>(
        &'a self,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }
}

/// Serializes `root` as a standalone XML document.
///
/// `default_namespace` is declared with a bare `xmlns`; every other namespace
/// used in the tree must appear in `namespaces`.
pub fn write_document(
    root: &Element,
    default_namespace: Option<&str>,
    namespaces: &Namespaces,
) -> Result<String, RenderError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| RenderError::Xml(e.to_string()))?;

    let mut declarations = Vec::with_capacity(namespaces.len() + 1);
    if let Some(uri) = default_namespace {
        declarations.push(("xmlns".to_string(), uri.to_string()));
    }
    for (prefix, uri) in namespaces {
        declarations.push((format!("xmlns:{prefix}"), uri.clone()));
    }

    let context = WriteContext {
        default_namespace,
        namespaces,
    };
    context.write_element(&mut writer, root, &declarations)?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

struct WriteContext<'a> {
    default_namespace: Option<&'a str>,
    namespaces: &'a Namespaces,
}

impl WriteContext<'_> {
    fn qualified_name(&self, element: &Element) -> Result<String, RenderError> {
        match element.namespace.as_deref() {
            None => Ok(element.name.clone()),
            Some(uri) if Some(uri) == self.default_namespace => Ok(element.name.clone()),
            Some(uri) => self
                .namespaces
                .iter()
                .find(|(_, declared)| declared.as_str() == uri)
                .map(|(prefix, _)| format!("{prefix}:{}", element.name))
                .ok_or_else(|| RenderError::UndeclaredNamespace(uri.to_string())),
        }
    }

    fn write_element(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        element: &Element,
        extra_attributes: &[(String, String)],
    ) -> Result<(), RenderError> {
        let name = self.qualified_name(element)?;

        let mut start = BytesStart::new(name.as_str());
        for (key, value) in element.attributes.iter().chain(extra_attributes.iter()) {
            start.push_attribute((key.as_str(), strip_invalid_xml_chars(value).as_ref()));
        }

        if element.text.is_none() && element.children.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| RenderError::Xml(e.to_string()));
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| RenderError::Xml(e.to_string()))?;

        if let Some(text) = &element.text {
            let text = strip_invalid_xml_chars(text);
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(|e| RenderError::Xml(e.to_string()))?;
        }

        for child in &element.children {
            self.write_element(writer, child, &[])?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(name.as_str())))
            .map_err(|e| RenderError::Xml(e.to_string()))
    }
}
