//! Generic Atom 1.0 / RSS 2.0 feed builder with extension hooks.
//!
//! The builder owns the generic feed and entry fields (ids, titles, links,
//! dates). Domain-specific data is contributed by extensions: a
//! [`FeedExtension`] declares namespaces and may adjust the root element, and
//! each entry may carry [`EntryExtension`]s that mutate the entry element after
//! the generic fields have been written.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use super::tree::{write_document, Element, Namespaces, RenderError};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Output syndication format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeedFormat {
    #[default]
    Atom,
    Rss,
}

impl FeedFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedFormat::Atom => "atom",
            FeedFormat::Rss => "rss",
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atom" => Ok(FeedFormat::Atom),
            "rss" => Ok(FeedFormat::Rss),
            other => Err(format!("unknown feed format '{other}' (expected atom or rss)")),
        }
    }
}

/// Which output formats an extension takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionScope {
    Both,
    AtomOnly,
    RssOnly,
}

impl ExtensionScope {
    pub fn applies_to(&self, format: FeedFormat) -> bool {
        match self {
            ExtensionScope::Both => true,
            ExtensionScope::AtomOnly => format == FeedFormat::Atom,
            ExtensionScope::RssOnly => format == FeedFormat::Rss,
        }
    }
}

/// Feed-level extension.
pub trait FeedExtension: Send {
    /// Namespaces declared on the root element.
    fn namespaces(&self) -> Namespaces;

    /// Adjusts the `<feed>` element after all entries were added.
    fn extend_atom(&self, _feed: &mut Element) {}

    /// Adjusts the `<channel>` element after all items were added.
    fn extend_rss(&self, _channel: &mut Element) {}
}

/// Entry-level extension, invoked once per serialization of its entry.
pub trait EntryExtension: Send {
    /// Namespaces this extension's elements use.
    fn namespaces(&self) -> Namespaces {
        Namespaces::new()
    }

    fn extend_atom(&self, _entry: &mut Element) {}

    fn extend_rss(&self, _item: &mut Element) {}
}

/// Generic fields of one feed entry.
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub link: String,
    /// Atom `<summary>`, RSS `<description>`.
    pub summary: Option<String>,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: DateTime<Utc>,
    extensions: Vec<(Box<dyn EntryExtension>, ExtensionScope)>,
}

impl FeedEntry {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        updated: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            link: link.into(),
            summary: None,
            authors: Vec::new(),
            categories: Vec::new(),
            published: None,
            updated,
            extensions: Vec::new(),
        }
    }

    /// Attaches an extension; it is moved into the entry and never shared.
    pub fn register_extension(
        &mut self,
        extension: impl EntryExtension + 'static,
        scope: ExtensionScope,
    ) {
        self.extensions.push((Box::new(extension), scope));
    }

    fn extensions_for(&self, format: FeedFormat) -> impl Iterator<Item = &dyn EntryExtension> {
        self.extensions
            .iter()
            .filter(move |(_, scope)| scope.applies_to(format))
            .map(|(ext, _)| &**ext)
    }

    fn to_atom(&self) -> Element {
        let mut entry = Element::new("entry");
        entry.push(Element::new("id").text(&self.id));
        entry.push(Element::new("title").text(&self.title));
        entry.push(Element::new("updated").text(self.updated.to_rfc3339()));
        entry.push(
            Element::new("link")
                .attribute("href", &self.link)
                .attribute("rel", "alternate")
                .attribute("type", "text/html"),
        );
        if let Some(summary) = &self.summary {
            entry.push(Element::new("summary").attribute("type", "text").text(summary));
        }
        for author in &self.authors {
            entry
                .push(Element::new("author"))
                .push(Element::new("name").text(author));
        }
        for category in &self.categories {
            entry.push(Element::new("category").attribute("term", category));
        }
        if let Some(published) = &self.published {
            entry.push(Element::new("published").text(published.to_rfc3339()));
        }

        for extension in self.extensions_for(FeedFormat::Atom) {
            extension.extend_atom(&mut entry);
        }
        entry
    }

    fn to_rss(&self) -> Element {
        let mut item = Element::new("item");
        item.push(Element::new("title").text(&self.title));
        item.push(Element::new("link").text(&self.link));
        item.push(Element::new("description").text(self.summary.clone().unwrap_or_default()));
        item.push(
            Element::new("guid")
                .attribute("isPermaLink", "false")
                .text(&self.id),
        );
        for category in &self.categories {
            item.push(Element::new("category").text(category));
        }
        if let Some(published) = &self.published {
            item.push(Element::new("pubDate").text(published.to_rfc2822()));
        }

        for extension in self.extensions_for(FeedFormat::Rss) {
            extension.extend_rss(&mut item);
        }
        item
    }
}

/// Feed-level fields plus the entries, in insertion order.
pub struct FeedBuilder {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub updated: DateTime<Utc>,
    pub language: Option<String>,
    entries: Vec<FeedEntry>,
    extensions: Vec<(Box<dyn FeedExtension>, ExtensionScope)>,
}

impl FeedBuilder {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        updated: DateTime<Utc>,
    ) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            description: title.clone(),
            title,
            link: link.into(),
            updated,
            language: None,
            entries: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn register_extension(
        &mut self,
        extension: impl FeedExtension + 'static,
        scope: ExtensionScope,
    ) {
        self.extensions.push((Box::new(extension), scope));
    }

    pub fn add_entry(&mut self, entry: FeedEntry) {
        self.entries.push(entry);
    }

    /// Namespaces declared on the root for `format`.
    fn namespaces(&self, format: FeedFormat) -> Namespaces {
        let mut namespaces = Namespaces::new();
        for (extension, scope) in &self.extensions {
            if scope.applies_to(format) {
                namespaces.extend(extension.namespaces());
            }
        }
        for entry in &self.entries {
            for extension in entry.extensions_for(format) {
                namespaces.extend(extension.namespaces());
            }
        }
        namespaces
    }

    /// Builds the `<feed>` tree, running all Atom extension hooks.
    pub fn atom_tree(&self) -> Element {
        let mut feed = Element::with_namespace(ATOM_NS, "feed");
        feed.push(Element::new("id").text(&self.id));
        feed.push(Element::new("title").text(&self.title));
        feed.push(Element::new("updated").text(self.updated.to_rfc3339()));
        feed.push(
            Element::new("link")
                .attribute("href", &self.link)
                .attribute("rel", "alternate"),
        );
        feed.push(Element::new("subtitle").text(&self.description));
        for entry in &self.entries {
            feed.push(entry.to_atom());
        }

        for (extension, scope) in &self.extensions {
            if scope.applies_to(FeedFormat::Atom) {
                extension.extend_atom(&mut feed);
            }
        }
        feed
    }

    /// Builds the `<rss>` tree, running all RSS extension hooks.
    pub fn rss_tree(&self) -> Element {
        let mut channel = Element::new("channel");
        channel.push(Element::new("title").text(&self.title));
        channel.push(Element::new("link").text(&self.link));
        channel.push(Element::new("description").text(&self.description));
        if let Some(language) = &self.language {
            channel.push(Element::new("language").text(language));
        }
        channel.push(Element::new("lastBuildDate").text(self.updated.to_rfc2822()));
        for entry in &self.entries {
            channel.push(entry.to_rss());
        }

        for (extension, scope) in &self.extensions {
            if scope.applies_to(FeedFormat::Rss) {
                extension.extend_rss(&mut channel);
            }
        }

        let mut rss = Element::new("rss").attribute("version", "2.0");
        rss.push(channel);
        rss
    }

    pub fn atom_str(&self) -> Result<String, RenderError> {
        let mut tree = self.atom_tree();
        if let Some(language) = &self.language {
            tree.attributes.push(("xml:lang".to_string(), language.clone()));
        }
        write_document(&tree, Some(ATOM_NS), &self.namespaces(FeedFormat::Atom))
    }

    pub fn rss_str(&self) -> Result<String, RenderError> {
        write_document(&self.rss_tree(), None, &self.namespaces(FeedFormat::Rss))
    }

    pub fn render(&self, format: FeedFormat) -> Result<String, RenderError> {
        match format {
            FeedFormat::Atom => self.atom_str(),
            FeedFormat::Rss => self.rss_str(),
        }
    }
}
