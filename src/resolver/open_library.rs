//! Stage 1: Open Library edition records, with a parent-work follow-up.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;

use super::Resolution;

const BASE_URL: &str = "https://www.openlibrary.org";

/// Fetch the edition record for a padded 10-character identifier and fold
/// its fields into `res`. When the edition points at a parent work, that
/// record is fetched too and its subjects/description win only when more
/// numerous/longer.
pub(crate) async fn apply(http: &Client, isbn10: &str, res: &mut Resolution) -> Result<()> {
    let url = format!("{BASE_URL}/isbn/{isbn10}.json");
    let edition: Value = http
        .get(&url)
        .send()
        .await
        .context("edition request failed")?
        .json()
        .await
        .context("edition body was not JSON")?;

    apply_edition(&edition, res);

    if let Some(key) = work_key(&edition) {
        let work_url = format!("{BASE_URL}{key}.json");
        let work: Value = http
            .get(&work_url)
            .send()
            .await
            .context("work request failed")?
            .json()
            .await
            .context("work body was not JSON")?;
        apply_work(&work, res);
    }
    Ok(())
}

fn apply_edition(edition: &Value, res: &mut Resolution) {
    if let Some(subjects) = edition.get("subjects") {
        res.offer_keywords(string_list(subjects));
    }
    if let Some(text) = edition.get("description").and_then(text_field) {
        res.offer_summary(&text);
    }
    // `first_sentence` is a fallback, never a replacement.
    if res.summary.is_empty() {
        if let Some(text) = edition.get("first_sentence").and_then(text_field) {
            res.offer_summary(&text);
        }
    }
}

fn apply_work(work: &Value, res: &mut Resolution) {
    if let Some(subjects) = work.get("subjects") {
        res.offer_keywords(string_list(subjects));
    }
    if let Some(text) = work.get("description").and_then(text_field) {
        res.offer_summary(&text);
    }
}

/// `description`/`first_sentence` are either a plain string or an object
/// holding the string under `value`.
fn text_field(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("value").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn string_list(v: &Value) -> Vec<String> {
    v.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn work_key(edition: &Value) -> Option<&str> {
    edition
        .get("works")?
        .as_array()?
        .first()?
        .get("key")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edition_fields_can_be_plain_strings() {
        let edition = json!({
            "subjects": ["Programming", "Java"],
            "description": "A book about <i>Java</i>.",
        });
        let mut res = Resolution::default();
        apply_edition(&edition, &mut res);
        assert_eq!(res.keywords, vec!["Programming", "Java"]);
        assert_eq!(res.summary, "A book about Java.");
    }

    #[test]
    fn description_object_value_is_extracted() {
        let edition = json!({"description": {"type": "/type/text", "value": "Long form text."}});
        let mut res = Resolution::default();
        apply_edition(&edition, &mut res);
        assert_eq!(res.summary, "Long form text.");
    }

    #[test]
    fn first_sentence_is_only_a_fallback() {
        let with_description = json!({
            "description": "The real description.",
            "first_sentence": {"value": "An opening line that happens to be longer."},
        });
        let mut res = Resolution::default();
        apply_edition(&with_description, &mut res);
        assert_eq!(res.summary, "The real description.");

        let without = json!({"first_sentence": "It begins."});
        let mut res = Resolution::default();
        apply_edition(&without, &mut res);
        assert_eq!(res.summary, "It begins.");
    }

    #[test]
    fn work_fields_win_only_when_bigger() {
        let mut res = Resolution::default();
        apply_edition(
            &json!({"subjects": ["One", "Two"], "description": "Short."}),
            &mut res,
        );
        apply_work(
            &json!({"subjects": ["Only"], "description": "A longer description from the work."}),
            &mut res,
        );
        assert_eq!(res.keywords, vec!["One", "Two"]);
        assert_eq!(res.summary, "A longer description from the work.");
    }

    #[test]
    fn non_string_subject_entries_are_skipped() {
        let mut res = Resolution::default();
        apply_edition(&json!({"subjects": ["Real", 7, {"name": "obj"}]}), &mut res);
        assert_eq!(res.keywords, vec!["Real"]);
    }

    #[test]
    fn work_key_walks_the_reference() {
        let edition = json!({"works": [{"key": "/works/OL82563W"}]});
        assert_eq!(work_key(&edition), Some("/works/OL82563W"));
        assert_eq!(work_key(&json!({})), None);
        assert_eq!(work_key(&json!({"works": []})), None);
    }
}
