use scraper::{Html, Selector};

use crate::error::{Error, Result};

/// Anchors on a results page that point at a match.
pub const MATCH_LINKS: &str = r#"a[href*="/matches/"]"#;
/// Anchors on a match page that point at its demo archive.
pub const DEMO_LINKS: &str = r#"a[href*="/download/demo"]"#;
/// Element on a match page carrying the match start as a millisecond timestamp.
pub const MATCH_DATE: &str = "div.date";
pub const HREF: &str = "href";
pub const DATA_UNIX: &str = "data-unix";

/// Pulls attribute values out of a page.
pub trait MarkupQuery: Send + Sync {
    /// Values of `attribute` on every element matching `selector`, in document order. Elements
    /// without the attribute are left out.
    fn attribute_values(&self, markup: &str, selector: &str, attribute: &str) -> Result<Vec<String>>;
}

/// [`MarkupQuery`] on top of the `scraper` html5ever parser with CSS selectors.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlQuery;

impl MarkupQuery for HtmlQuery {
    fn attribute_values(&self, markup: &str, selector: &str, attribute: &str) -> Result<Vec<String>> {
        let parsed = Selector::parse(selector)
            .map_err(|e| Error::Parse(format!("Invalid selector `{selector}`: {e}")))?;
        let document = Html::parse_document(markup);

        Ok(document
            .select(&parsed)
            .filter_map(|element| element.value().attr(attribute))
            .map(str::to_string)
            .collect())
    }
}
