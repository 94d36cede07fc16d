//! Stage 2: the Bookswagon product page, scraped from HTML.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};

use super::Resolution;

const BASE_URL: &str = "https://www.bookswagon.com";

pub(crate) async fn apply(http: &Client, isbn13: &str, res: &mut Resolution) -> Result<()> {
    let url = format!("{BASE_URL}/book/c/{isbn13}");
    let body = http
        .get(&url)
        .send()
        .await
        .context("product page request failed")?
        .text()
        .await
        .context("product page body unreadable")?;

    let (summary, keywords) = extract(&body)?;
    if let Some(summary) = summary {
        res.offer_summary(&summary);
    }
    if !keywords.is_empty() {
        res.offer_keywords(keywords);
    }
    Ok(())
}

/// Pull the about-paragraph and the category list out of a product page.
/// Parsing is synchronous so it stays testable on canned bodies (and the
/// parsed DOM is not Send, so it must not live across an await).
fn extract(body: &str) -> Result<(Option<String>, Vec<String>)> {
    let document = Html::parse_document(body);
    let about = selector("div#aboutbook")?;
    let paragraph = selector("p")?;
    let category_links = selector("ul.blacklistreview a")?;

    let summary = document
        .select(&about)
        .next()
        .and_then(|div| div.select(&paragraph).next())
        .map(|p| p.text().collect::<String>());

    let keywords = document
        .select(&category_links)
        .map(|a| a.text().collect::<String>().trim().to_string())
        .collect();

    Ok((summary, keywords))
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("bad selector {css}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="aboutbook">
            <p>About the
            book, with a line break.</p>
            <p>Second paragraph is ignored.</p>
          </div>
          <ul class="blacklistreview">
            <li><a href="/c/fiction">Fiction</a></li>
            <li><a href="/c/fiction">Fiction</a></li>
            <li><a href="/c/fantasy"> Fantasy </a></li>
          </ul>
        </body></html>"#;

    #[test]
    fn extracts_first_about_paragraph() {
        let (summary, _) = extract(PAGE).unwrap();
        let summary = summary.unwrap();
        assert!(summary.contains("About the"));
        assert!(!summary.contains("Second paragraph"));
    }

    #[test]
    fn category_links_feed_keywords_with_dedupe() {
        let (_, keywords) = extract(PAGE).unwrap();
        let mut res = Resolution::default();
        res.offer_keywords(keywords);
        assert_eq!(res.keywords, vec!["Fiction", "Fantasy"]);
    }

    #[test]
    fn missing_container_yields_nothing() {
        let (summary, keywords) = extract("<html><body><p>stray</p></body></html>").unwrap();
        assert!(summary.is_none());
        assert!(keywords.is_empty());
    }

    #[test]
    fn scraped_summary_is_cleaned_on_offer() {
        let (summary, _) = extract(PAGE).unwrap();
        let mut res = Resolution::default();
        res.offer_summary(&summary.unwrap());
        assert_eq!(res.summary, "About the book, with a line break.");
    }
}
