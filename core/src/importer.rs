use anyhow::Result;
use scraper::{Html, Selector};

use crate::models::Recipe;

/// Fetches the body of a web page.
///
/// The CLI implements this with reqwest; tests use canned pages.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Best-effort metadata scraped from a recipe page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// A title was found on the page.
    Imported,
    /// The page was fetched but carried no usable title.
    Degraded,
    /// The page could not be fetched.
    Failed { reason: String },
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub recipe: Recipe,
    pub outcome: ImportOutcome,
}

/// Extract the title and cover image of an HTML document.
///
/// Title prefers `og:title`, then `<title>`. Cover comes from `og:image`.
/// Blank values are treated as absent.
#[must_use]
pub fn extract_page_meta(html: &str) -> PageMeta {
    let doc = Html::parse_document(html);

    let title = meta_property(&doc, "og:title").or_else(|| document_title(&doc));
    let cover = meta_property(&doc, "og:image");

    PageMeta { title, cover }
}

fn meta_property(doc: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn document_title(doc: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let el = doc.select(&selector).next()?;
    let text = el.text().collect::<String>();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed).filter(|t| !t.is_empty())
}

/// Turn `url` into a recipe record. Never fails: when the page cannot be
/// fetched or has no title, the URL itself becomes the title.
pub async fn import_from<F: PageFetcher>(fetcher: &F, url: &str) -> ImportReport {
    let (meta, outcome) = match fetcher.fetch_page(url).await {
        Ok(body) => {
            let meta = extract_page_meta(&body);
            let outcome = if meta.title.is_some() {
                ImportOutcome::Imported
            } else {
                ImportOutcome::Degraded
            };
            (meta, outcome)
        }
        Err(e) => {
            let reason = format!("{e:#}");
            tracing::warn!(%url, %reason, "fetch meta failed");
            (PageMeta::default(), ImportOutcome::Failed { reason })
        }
    };

    let recipe = Recipe::new(
        meta.title.unwrap_or_else(|| url.to_string()),
        meta.cover.unwrap_or_default(),
        url.to_string(),
    );

    ImportReport { recipe, outcome }
}
