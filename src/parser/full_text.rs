use super::{Extraction, Extractor, Hit};
use crate::constants::FULL_TEXT_TIMES_PLACEHOLDER;
use crate::types::Query;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Elements whose content is never part of the readable page text
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "nav", "form", "iframe", "svg", "button",
    "select", "head",
];

/// Page chrome when outside a content region; part of the entry inside one.
const CHROME_TAGS: &[&str] = &["header", "footer", "aside"];

const CONTENT_TAGS: &[&str] = &["main", "article", "section"];

/// Substring search over the readable text of a page.
///
/// Used for sites without a stable showtime selector. A page either
/// matches once or not at all, and the showtime is a fixed pointer back to
/// the source site.
#[derive(Debug, Default)]
pub struct FullTextExtractor;

impl FullTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for FullTextExtractor {
    fn name(&self) -> &'static str {
        "full_text"
    }

    fn extract(&self, document: &Html, query: &Query) -> Extraction {
        let text = readable_text(document);
        if text.is_empty() {
            return Extraction::default();
        }

        let hits = if query.matches(&text) {
            vec![Hit {
                times: Some(FULL_TEXT_TIMES_PLACEHOLDER.to_string()),
            }]
        } else {
            Vec::new()
        };

        Extraction { listings: 1, hits }
    }
}

/// Plain text of the document body with navigation and other
/// boilerplate removed and whitespace collapsed.
pub fn readable_text(document: &Html) -> String {
    let root = document.root_element();
    let body = root
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "body")
        .unwrap_or(root);

    let mut raw = String::new();
    collect_text(body, false, &mut raw);
    WHITESPACE.replace_all(&raw, " ").trim().to_string()
}

fn collect_text(element: ElementRef<'_>, in_content: bool, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let el = child_el.value();
            let name = el.name();
            if el.attr("role") == Some("navigation") || BOILERPLATE_TAGS.contains(&name) {
                continue;
            }
            if !in_content && CHROME_TAGS.contains(&name) {
                continue;
            }
            collect_text(child_el, in_content || CONTENT_TAGS.contains(&name), out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, movie: &str) -> Extraction {
        FullTextExtractor::new().extract(&Html::parse_document(html), &Query::new(movie).unwrap())
    }

    #[test]
    fn test_single_hit_regardless_of_occurrences() {
        let html = r#"<html><body>
            <h1>Pathaan</h1><p>PATHAAN in Hindi mit Untertiteln. pathaan!</p>
            <p>PathAan Vorverkauf läuft</p></body></html>"#;
        let extraction = extract(html, "Pathaan");
        assert_eq!(extraction.listings, 1);
        assert_eq!(
            extraction.hits,
            vec![Hit { times: Some(FULL_TEXT_TIMES_PLACEHOLDER.to_string()) }]
        );
    }

    #[test]
    fn test_no_occurrence_means_no_hit() {
        let extraction = extract("<html><body><p>Barbie, Oppenheimer</p></body></html>", "dune");
        assert_eq!(extraction.listings, 1);
        assert!(extraction.hits.is_empty());
    }

    #[test]
    fn test_boilerplate_is_ignored() {
        let html = r#"<html><head><title>Dune Kino</title></head><body>
            <nav><a href="/dune">Dune</a></nav>
            <div role="navigation">Dune</div>
            <script>var movie = "Dune";</script>
            <main><p>Heute: Barbie</p></main>
            <footer>Dune tickets</footer></body></html>"#;
        let extraction = extract(html, "dune");
        assert!(extraction.hits.is_empty());
    }

    #[test]
    fn test_article_header_is_content() {
        let html = r#"<html><body>
            <header><a href="/">Kino Start</a></header>
            <main><article><header><h2>Dune: Part Two</h2></header>
            <p>Tickets ab 9 Euro</p><footer>OmU</footer></article></main>
            <footer>Impressum</footer></body></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(readable_text(&document), "Dune: Part Two Tickets ab 9 Euro OmU");
        assert_eq!(extract(html, "dune").hits.len(), 1);
        assert!(extract(html, "impressum").hits.is_empty());
    }

    #[test]
    fn test_empty_page_has_no_listings() {
        let extraction = extract("<html><body><script>x()</script></body></html>", "dune");
        assert_eq!(extraction, Extraction::default());
    }

    #[test]
    fn test_readable_text_collapses_whitespace() {
        let document = Html::parse_document("<body><p>Dune:\n   Part</p>\t<p>Two</p></body>");
        assert_eq!(readable_text(&document), "Dune: Part Two");
    }
}
