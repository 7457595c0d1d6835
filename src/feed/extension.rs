//! arXiv extensions for the generic feed builder.
//!
//! [`ArxivEntryExtension`] accumulates the arXiv-specific fields of a single
//! entry while the feed is being populated, then writes them into the entry
//! element when the feed is serialized.

use std::collections::{BTreeMap, HashMap};

use super::builder::{EntryExtension, FeedExtension};
use super::tree::{Element, Namespaces};
use crate::domain::{Author, Category, Media};

pub const ARXIV_NS: &str = "http://arxiv.org/schemas/atom";
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
pub const TAXO_NS: &str = "http://purl.org/rss/1.0/modules/taxonomy/";
pub const SYN_NS: &str = "http://purl.org/rss/1.0/modules/syndication/";
pub const ADMIN_NS: &str = "http://webns.net/mvcb/";
pub const MEDIA_NS: &str = "http://search.yahoo.com/mrss";

fn namespaces(pairs: &[(&str, &str)]) -> Namespaces {
    pairs
        .iter()
        .map(|(prefix, uri)| (prefix.to_string(), uri.to_string()))
        .collect()
}

/// Feed-level extension declaring every namespace arXiv entries may use.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArxivExtension;

impl FeedExtension for ArxivExtension {
    fn namespaces(&self) -> Namespaces {
        namespaces(&[
            ("arxiv", ARXIV_NS),
            ("content", CONTENT_NS),
            ("taxo", TAXO_NS),
            ("syn", SYN_NS),
            ("admin", ADMIN_NS),
            ("media", MEDIA_NS),
        ])
    }
}

/// Atom-only entry extension; it contributes the `arxiv` namespace and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArxivAtomExtension;

impl EntryExtension for ArxivAtomExtension {
    fn namespaces(&self) -> Namespaces {
        namespaces(&[("arxiv", ARXIV_NS)])
    }
}

/// Per-entry accumulator of arXiv fields.
///
/// Setters are called while the feed is populated; the render methods only
/// read the state. One instance belongs to exactly one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArxivEntryExtension {
    base_server: String,
    authors: Vec<Author>,
    media: Vec<Media>,
    comment: Option<String>,
    primary_category: Option<Category>,
    /// DOI -> resolver URL
    doi: Option<BTreeMap<String, String>>,
    journal_ref: Option<String>,
    affiliations: HashMap<String, Vec<String>>,
}

impl ArxivEntryExtension {
    /// `base_server` is the bare host used for author search links.
    pub fn new(base_server: impl Into<String>) -> Self {
        Self {
            base_server: base_server.into(),
            ..Self::default()
        }
    }

    pub fn add_author(&mut self, author: Author) {
        self.authors.push(author);
    }

    pub fn add_media(&mut self, media: Media) {
        self.media.push(media);
    }

    pub fn set_comment(&mut self, text: impl Into<String>) {
        self.comment = Some(text.into());
    }

    pub fn set_primary_category(&mut self, category: Category) {
        self.primary_category = Some(category);
    }

    pub fn set_journal_ref(&mut self, text: impl Into<String>) {
        self.journal_ref = Some(text.into());
    }

    /// Replaces the DOI assignments (DOI -> resolver URL).
    pub fn set_doi(&mut self, dois: BTreeMap<String, String>) {
        self.doi = Some(dois);
    }

    /// Affiliations for the author whose Atom `<name>` equals `full_name`.
    pub fn set_affiliation(&mut self, full_name: impl Into<String>, affiliations: Vec<String>) {
        self.affiliations.insert(full_name.into(), affiliations);
    }

    fn add_media_groups(&self, entry: &mut Element) {
        for media in &self.media {
            let group = entry.push(Element::with_namespace(MEDIA_NS, "group"));
            group.push(Element::with_namespace(MEDIA_NS, "title").text(&media.title));
            group.push(
                Element::with_namespace(MEDIA_NS, "content")
                    .attribute("url", &media.url)
                    .attribute("type", media.media_type()),
            );
        }
    }

    /// Writes the arXiv fields into an Atom `<entry>`.
    ///
    /// Order: comment, primary category, journal ref, DOIs, author
    /// affiliations, media groups. Absent fields are skipped.
    pub fn render_atom(&self, entry: &mut Element) {
        if let Some(comment) = &self.comment {
            entry.push(Element::with_namespace(ARXIV_NS, "comment").text(comment));
        }

        if let Some(category) = &self.primary_category {
            entry.push(
                Element::with_namespace(ARXIV_NS, "primary_category")
                    .attribute("term", &category.id)
                    .attribute("scheme", ARXIV_NS),
            );
        }

        if let Some(journal_ref) = &self.journal_ref {
            entry.push(Element::with_namespace(ARXIV_NS, "journal_ref").text(journal_ref));
        }

        if let Some(dois) = &self.doi {
            for (doi, url) in dois {
                entry.push(Element::with_namespace(ARXIV_NS, "doi").text(doi));
                entry.push(
                    Element::new("link")
                        .attribute("title", "doi")
                        .attribute("href", url)
                        .attribute("rel", "related"),
                );
            }
        }

        for author in entry.children.iter_mut().filter(|c| c.is(None, "author")) {
            let Some(affiliations) = author
                .child("name")
                .and_then(|name| name.text.as_deref())
                .and_then(|name| self.affiliations.get(name))
            else {
                continue;
            };
            for affiliation in affiliations {
                author.push(Element::with_namespace(ARXIV_NS, "affiliation").text(affiliation));
            }
        }

        self.add_media_groups(entry);
    }

    /// Rewrites an RSS `<item>` description as HTML with linked author names
    /// ahead of the original text, then appends media groups.
    pub fn render_rss(&self, item: &mut Element) {
        if let Some(description) = item.child_mut("description") {
            let links = self
                .authors
                .iter()
                .map(|author| {
                    let query = format!(
                        "{},+{}",
                        author.last_name,
                        author.initials.replace(' ', "+")
                    );
                    format!(
                        "<a href=\"http://{}/search/?query={}&searchtype=author\">{}</a>",
                        self.base_server, query, author.full_name
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            let original = description.text.take().unwrap_or_default();
            description.text = Some(format!("<p>Authors: {links}</p><p>{original}</p>"));
        }

        self.add_media_groups(item);
    }
}

impl EntryExtension for ArxivEntryExtension {
    fn namespaces(&self) -> Namespaces {
        namespaces(&[("arxiv", ARXIV_NS), ("media", MEDIA_NS)])
    }

    fn extend_atom(&self, entry: &mut Element) {
        self.render_atom(entry);
    }

    fn extend_rss(&self, item: &mut Element) {
        self.render_rss(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Format;
    use pretty_assertions::assert_eq;

    fn author(full_name: &str, last_name: &str, initials: &str) -> Author {
        Author {
            last_name: last_name.to_string(),
            full_name: full_name.to_string(),
            initials: initials.to_string(),
            affiliations: Vec::new(),
        }
    }

    fn atom_entry(authors: &[&str]) -> Element {
        let mut entry = Element::new("entry");
        entry.push(Element::new("id").text("oai:arXiv.org:2310.00001v1"));
        for name in authors {
            entry
                .push(Element::new("author"))
                .push(Element::new("name").text(*name));
        }
        entry
    }

    fn rss_item(description: &str) -> Element {
        let mut item = Element::new("item");
        item.push(Element::new("title").text("Title"));
        item.push(Element::new("description").text(description));
        item
    }

    fn pdf() -> Media {
        Media {
            title: "PDF".to_string(),
            url: "https://arxiv.org/pdf/2310.00001".to_string(),
            format: Format::Pdf,
        }
    }

    fn arxiv_names(entry: &Element) -> Vec<&str> {
        entry
            .children
            .iter()
            .filter(|c| c.namespace.as_deref() == Some(ARXIV_NS))
            .map(|c| c.name.as_str())
            .collect()
    }

    #[test]
    fn test_feed_extension_namespaces() {
        let ns = ArxivExtension.namespaces();
        let prefixes: Vec<&str> = ns.keys().map(String::as_str).collect();
        assert_eq!(
            prefixes,
            vec!["admin", "arxiv", "content", "media", "syn", "taxo"]
        );
        assert_eq!(ns["media"], MEDIA_NS);

        let atom_only = EntryExtension::namespaces(&ArxivAtomExtension);
        assert_eq!(atom_only.len(), 1);
        assert_eq!(atom_only["arxiv"], ARXIV_NS);
    }

    #[test]
    fn test_empty_extension_renders_nothing() {
        let ext = ArxivEntryExtension::new("arxiv.org");
        let mut entry = atom_entry(&["A. Author"]);
        let before = entry.clone();
        ext.render_atom(&mut entry);
        assert_eq!(entry, before);
    }

    #[test]
    fn test_atom_field_order() {
        let mut ext = ArxivEntryExtension::new("arxiv.org");
        ext.add_media(pdf());
        ext.set_doi(BTreeMap::from([(
            "10.1000/abc".to_string(),
            "https://doi.org/10.1000/abc".to_string(),
        )]));
        ext.set_journal_ref("J. Test 1 (2023) 1");
        ext.set_primary_category(Category {
            id: "cs.AI".to_string(),
            name: "Artificial Intelligence".to_string(),
        });
        ext.set_comment("10 pages");

        let mut entry = atom_entry(&[]);
        ext.render_atom(&mut entry);

        assert_eq!(
            arxiv_names(&entry),
            vec!["comment", "primary_category", "journal_ref", "doi"]
        );
        let primary = entry
            .children_named(Some(ARXIV_NS), "primary_category")
            .next()
            .unwrap();
        assert_eq!(primary.get_attribute("term"), Some("cs.AI"));
        assert_eq!(primary.get_attribute("scheme"), Some(ARXIV_NS));
        assert!(primary.text.is_none());

        let doi_link = entry.child("link").unwrap();
        assert_eq!(doi_link.get_attribute("href"), Some("https://doi.org/10.1000/abc"));

        let group = entry.children.last().unwrap();
        assert!(group.is(Some(MEDIA_NS), "group"));
        let content = group.children_named(Some(MEDIA_NS), "content").next().unwrap();
        assert_eq!(
            content.get_attribute("url"),
            Some("https://arxiv.org/pdf/2310.00001")
        );
        assert_eq!(content.get_attribute("type"), Some("application/pdf"));
    }

    #[test]
    fn test_one_doi_element_per_entry() {
        let mut ext = ArxivEntryExtension::new("arxiv.org");
        ext.set_doi(BTreeMap::from([
            ("10.1/a".to_string(), "https://doi.org/10.1/a".to_string()),
            ("10.1/b".to_string(), "https://doi.org/10.1/b".to_string()),
        ]));
        let mut entry = atom_entry(&[]);
        ext.render_atom(&mut entry);
        let dois: Vec<_> = entry
            .children_named(Some(ARXIV_NS), "doi")
            .filter_map(|d| d.text.as_deref())
            .collect();
        assert_eq!(dois, vec!["10.1/a", "10.1/b"]);
    }

    #[test]
    fn test_affiliations_attach_to_matching_authors() {
        let mut ext = ArxivEntryExtension::new("arxiv.org");
        ext.set_affiliation(
            "Very Real Sr.",
            vec!["Cornell University".to_string(), "IAS".to_string()],
        );
        ext.set_affiliation("Nobody Here", vec!["Nowhere".to_string()]);

        let mut entry = atom_entry(&["Very Real Sr.", "L Emeno"]);
        ext.render_atom(&mut entry);

        let authors: Vec<&Element> = entry.children_named(None, "author").collect();
        let affiliations = |author: &Element| -> Vec<String> {
            author
                .children_named(Some(ARXIV_NS), "affiliation")
                .filter_map(|a| a.text.clone())
                .collect()
        };
        assert_eq!(affiliations(authors[0]), vec!["Cornell University", "IAS"]);
        assert!(affiliations(authors[1]).is_empty());
        assert!(!format!("{entry:?}").contains("Nowhere"));
    }

    #[test]
    fn test_rss_description_lists_authors() {
        let mut ext = ArxivEntryExtension::new("arxiv.org");
        ext.add_author(author("Very Real Sr.", "Real", "V."));
        ext.add_author(author("Jean-Paul Sartre", "Sartre", "J.-P. C."));

        let mut item = rss_item("We study things.");
        ext.render_rss(&mut item);

        let text = item.child("description").unwrap().text.clone().unwrap();
        assert_eq!(
            text,
            "<p>Authors: \
             <a href=\"http://arxiv.org/search/?query=Real,+V.&searchtype=author\">Very Real Sr.</a>, \
             <a href=\"http://arxiv.org/search/?query=Sartre,+J.-P.+C.&searchtype=author\">Jean-Paul Sartre</a>\
             </p><p>We study things.</p>"
        );
    }

    #[test]
    fn test_rss_without_authors_or_description() {
        let ext = ArxivEntryExtension::new("arxiv.org");
        let mut item = Element::new("item");
        ext.render_rss(&mut item);
        assert!(item.children.is_empty());

        let mut item = rss_item("");
        ext.render_rss(&mut item);
        assert_eq!(
            item.child("description").unwrap().text.as_deref(),
            Some("<p>Authors: </p><p></p>")
        );
    }

    #[test]
    fn test_rss_appends_media() {
        let mut ext = ArxivEntryExtension::new("arxiv.org");
        ext.add_media(pdf());
        let mut item = rss_item("x");
        ext.render_rss(&mut item);
        assert_eq!(item.children_named(Some(MEDIA_NS), "group").count(), 1);
    }
}
