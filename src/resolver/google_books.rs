//! Stage 3: the Google Books volumes API.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::Resolution;

const VOLUMES_URL: &str = "https://www.googleapis.com/books/v1/volumes";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    total_items: i64,
    #[serde(default)]
    items: Vec<VolumeItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeItem {
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    description: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
}

pub(crate) async fn apply(http: &Client, isbn13: &str, res: &mut Resolution) -> Result<()> {
    let response: VolumesResponse = http
        .get(VOLUMES_URL)
        .query(&[("q", format!("isbn:{isbn13}"))])
        .send()
        .await
        .context("volumes request failed")?
        .json()
        .await
        .context("volumes body was not JSON")?;

    if response.total_items == 0 {
        return Ok(());
    }
    let first = match response.items.into_iter().next() {
        Some(item) => item,
        None => return Ok(()),
    };
    if let Some(description) = first.volume_info.description {
        res.offer_summary(&description);
    }
    if !first.volume_info.categories.is_empty() {
        res.offer_keywords(first.volume_info.categories);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_payload_parses_with_missing_fields() {
        let raw = r#"{
            "kind": "books#volumes",
            "totalItems": 1,
            "items": [{"volumeInfo": {"title": "X", "categories": ["Computers"]}}]
        }"#;
        let parsed: VolumesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.total_items, 1);
        assert_eq!(parsed.items[0].volume_info.categories, vec!["Computers"]);
        assert!(parsed.items[0].volume_info.description.is_none());
    }

    #[test]
    fn zero_total_items_parses_to_empty() {
        let parsed: VolumesResponse = serde_json::from_str(r#"{"totalItems": 0}"#).unwrap();
        assert_eq!(parsed.total_items, 0);
        assert!(parsed.items.is_empty());
    }
}
