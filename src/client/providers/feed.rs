//! Structural parsing of Atom and RSS feeds.
//!
//! Elements are matched on their local name, so namespaced children such as
//! `media:description`, `dc:creator` or `arxiv:primary_category` are found
//! without binding their namespace URIs.

use super::traits::ProviderError;
use roxmltree::{Document, Node};

/// One `<entry>` of an Atom feed (YouTube channel feeds, arXiv API)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    /// `rel="alternate"` link, or the first link without a `rel`
    pub link: Option<String>,
    pub published: Option<String>,
    /// `<summary>` or, for media feeds, `<media:description>`
    pub summary: Option<String>,
    /// First author name
    pub author: Option<String>,
    /// Primary category term, else the first category term
    pub category: Option<String>,
}

/// One `<item>` of an RSS 2.0 feed (Medium)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub pub_date: Option<String>,
    /// `<description>`, else `<content:encoded>`; may contain markup
    pub description: Option<String>,
    /// `<dc:creator>`, else `<author>`
    pub creator: Option<String>,
}

fn parse_document(xml: &str) -> Result<Document<'_>, ProviderError> {
    Document::parse(xml).map_err(|e| ProviderError::Parse(format!("Failed to parse XML: {e}")))
}

/// All text below `node`, or `None` when blank
fn text_of(node: Node<'_, '_>) -> Option<String> {
    let text: String = node
        .descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Text of the first child element with local name `name`
fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().name() == name)
        .find_map(text_of)
}

fn descendant_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == name)
        .find_map(text_of)
}

fn alternate_link(entry: Node<'_, '_>) -> Option<String> {
    let links: Vec<Node<'_, '_>> = entry
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "link")
        .collect();

    links
        .iter()
        .find(|n| n.attribute("rel") == Some("alternate"))
        .or_else(|| links.iter().find(|n| n.attribute("rel").is_none()))
        .and_then(|n| n.attribute("href"))
        .map(str::to_string)
}

fn category_term(entry: Node<'_, '_>) -> Option<String> {
    let term_of = |name: &str| {
        entry
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == name)
            .find_map(|n| n.attribute("term"))
            .map(str::to_string)
    };
    term_of("primary_category").or_else(|| term_of("category"))
}

/// Parse the entries of an Atom feed, in document order
pub fn parse_atom(xml: &str) -> Result<Vec<AtomEntry>, ProviderError> {
    let doc = parse_document(xml)?;

    let entries = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "entry")
        .map(|entry| AtomEntry {
            id: child_text(entry, "id"),
            title: child_text(entry, "title"),
            link: alternate_link(entry),
            published: child_text(entry, "published").or_else(|| child_text(entry, "updated")),
            summary: child_text(entry, "summary")
                .or_else(|| descendant_text(entry, "description")),
            author: entry
                .children()
                .filter(|n| n.is_element() && n.tag_name().name() == "author")
                .find_map(|author| child_text(author, "name")),
            category: category_term(entry),
        })
        .collect();

    Ok(entries)
}

/// Parse the items of an RSS feed, in document order
pub fn parse_rss(xml: &str) -> Result<Vec<RssItem>, ProviderError> {
    let doc = parse_document(xml)?;

    let items = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "item")
        .map(|item| RssItem {
            title: child_text(item, "title"),
            link: child_text(item, "link"),
            pub_date: child_text(item, "pubDate"),
            description: child_text(item, "description")
                .or_else(|| child_text(item, "encoded")),
            creator: child_text(item, "creator").or_else(|| child_text(item, "author")),
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YOUTUBE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
  <title>Calm Channel</title>
  <entry>
    <id>yt:video:abc123</id>
    <yt:videoId>abc123</yt:videoId>
    <title>Binaural Beats for Deep Focus</title>
    <link rel="alternate" href="https://www.youtube.com/watch?v=abc123"/>
    <author><name>Calm Channel</name></author>
    <published>2024-03-01T10:00:00+00:00</published>
    <media:group>
      <media:title>Binaural Beats for Deep Focus</media:title>
      <media:description>Two hours of 40Hz gamma beats.</media:description>
    </media:group>
  </entry>
</feed>"#;

    const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <published>2024-01-01T00:00:00Z</published>
    <title>Auditory Beat Stimulation
      and Cognition</title>
    <summary>  We study beats.  </summary>
    <author><name>Ada Lovelace</name></author>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="q-bio.NC" scheme="http://arxiv.org/schemas/atom"/>
    <category term="q-bio.NC" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    const MEDIUM_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:content="http://purl.org/rss/1.0/modules/content/" version="2.0">
  <channel>
    <title>Meditation on Medium</title>
    <item>
      <title><![CDATA[Binaural Beats for Sleep]]></title>
      <link>https://medium.com/@writer/binaural-beats-for-sleep-1</link>
      <dc:creator><![CDATA[Jane Writer]]></dc:creator>
      <pubDate>Mon, 04 Mar 2024 12:00:00 GMT</pubDate>
      <content:encoded><![CDATA[<p>How I fell asleep <b>faster</b>.</p>]]></content:encoded>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_youtube_entry() {
        let entries = parse_atom(YOUTUBE_FEED).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.title.as_deref(), Some("Binaural Beats for Deep Focus"));
        assert_eq!(
            entry.link.as_deref(),
            Some("https://www.youtube.com/watch?v=abc123")
        );
        assert_eq!(entry.author.as_deref(), Some("Calm Channel"));
        assert_eq!(
            entry.summary.as_deref(),
            Some("Two hours of 40Hz gamma beats.")
        );
    }

    #[test]
    fn test_parse_arxiv_entry() {
        let entries = parse_atom(ARXIV_FEED).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.link.as_deref(), Some("http://arxiv.org/abs/2401.00001v1"));
        assert_eq!(entry.category.as_deref(), Some("q-bio.NC"));
        assert_eq!(entry.summary.as_deref(), Some("We study beats."));
        assert_eq!(entry.published.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_parse_rss_item_with_cdata() {
        let items = parse_rss(MEDIUM_FEED).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title.as_deref(), Some("Binaural Beats for Sleep"));
        assert_eq!(item.creator.as_deref(), Some("Jane Writer"));
        assert_eq!(
            item.description.as_deref(),
            Some("<p>How I fell asleep <b>faster</b>.</p>")
        );
    }

    #[test]
    fn test_malformed_xml_is_a_parse_error() {
        assert!(matches!(
            parse_rss("<rss><channel>"),
            Err(ProviderError::Parse(_))
        ));
    }
}
