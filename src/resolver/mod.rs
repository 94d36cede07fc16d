//! Metadata resolution waterfall.
//!
//! One identifier in, one [`Resolution`] out — never an error. Three remote
//! sources are consulted in fixed order, each only when the previous ones
//! left no usable summary/keyword pair. Failures inside a stage are absorbed
//! and recorded as that stage's [`StageOutcome`]; whatever partial fields a
//! stage managed to accumulate are kept.

pub mod bookswagon;
pub mod google_books;
pub mod open_library;

use anyhow::Result;
use reqwest::Client;
use std::collections::HashSet;
use std::fmt;

use crate::normalization::isbn::{convert_10_to_13, pad_to_10};

/// Static browser User-Agent sent on every outbound request; at least one
/// of the sources serves an empty shell to obvious bots.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:143.0) Gecko/20100101 Firefox/143.0";

/// The remote sources, in waterfall order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    OpenLibrary,
    Bookswagon,
    GoogleBooks,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Source::OpenLibrary => "open_library",
            Source::Bookswagon => "bookswagon",
            Source::GoogleBooks => "google_books",
        };
        f.write_str(name)
    }
}

/// How a single source lookup concluded. `Empty` and `Error` steer the
/// waterfall identically; keeping them apart lets callers tell "nothing
/// known about this identifier" from "could not ask".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// The source contributed at least one field.
    Found,
    /// The source answered but had nothing usable for this identifier.
    Empty,
    /// The lookup itself failed (network, decode, unexpected shape).
    Error(String),
}

/// Accumulated result of one waterfall run.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The identifier as last used against a source: 13-digit once
    /// conversion has happened, the padded 10-character form otherwise.
    pub identifier: String,
    pub keywords: Vec<String>,
    pub summary: String,
    /// Outcome per consulted source, in consultation order. Sources the
    /// waterfall never reached are absent.
    pub stages: Vec<(Source, StageOutcome)>,
}

impl Resolution {
    /// Both fields populated — nothing further to ask.
    pub fn is_complete(&self) -> bool {
        !self.summary.is_empty() && !self.keywords.is_empty()
    }

    /// Neither field populated — a total miss.
    pub fn is_miss(&self) -> bool {
        self.summary.is_empty() && self.keywords.is_empty()
    }

    /// Comma-joined keyword form used by the spreadsheet outputs.
    pub fn keywords_joined(&self) -> String {
        self.keywords.join(", ")
    }

    /// Replace the summary only when the cleaned candidate is strictly
    /// longer than what is already held.
    pub(crate) fn offer_summary(&mut self, candidate: &str) -> bool {
        let cleaned = clean_text(candidate);
        if cleaned.len() > self.summary.len() {
            self.summary = cleaned;
            true
        } else {
            false
        }
    }

    /// Replace the keyword set only when the deduplicated candidate set is
    /// strictly larger than what is already held.
    pub(crate) fn offer_keywords(&mut self, candidate: Vec<String>) -> bool {
        let deduped = dedupe_keywords(candidate);
        if deduped.len() > self.keywords.len() {
            self.keywords = deduped;
            true
        } else {
            false
        }
    }

    fn field_sizes(&self) -> (usize, usize) {
        (self.summary.len(), self.keywords.len())
    }
}

pub struct Resolver {
    http: Client,
}

impl Resolver {
    /// Build the shared HTTP client. No timeout override: a hung call
    /// stalls only its own batch, and the worker pool bounds the fallout.
    pub fn new() -> Result<Self> {
        let http = Client::builder().user_agent(BROWSER_USER_AGENT).build()?;
        Ok(Self { http })
    }

    /// Run the waterfall for one raw identifier.
    pub async fn resolve(&self, raw: &str) -> Resolution {
        let mut res = Resolution {
            identifier: pad_to_10(raw),
            ..Resolution::default()
        };

        let isbn10 = res.identifier.clone();
        let outcome = open_library::apply(&self.http, &isbn10, &mut res).await;
        record_stage(&mut res, Source::OpenLibrary, (0, 0), outcome);
        if res.is_complete() {
            return res;
        }

        if res.identifier.chars().count() == 10 {
            match convert_10_to_13(&res.identifier) {
                Ok(thirteen) => res.identifier = thirteen,
                Err(e) => {
                    // Not an ISBN at all; the remaining sources key on the
                    // 13-digit form, so stop with whatever stage 1 found.
                    tracing::debug!(
                        identifier = %res.identifier,
                        error = %e,
                        "identifier not convertible; skipping remaining sources"
                    );
                    return res;
                }
            }
        }

        let sizes = res.field_sizes();
        let isbn13 = res.identifier.clone();
        let outcome = bookswagon::apply(&self.http, &isbn13, &mut res).await;
        record_stage(&mut res, Source::Bookswagon, sizes, outcome);
        if res.is_complete() {
            return res;
        }

        let sizes = res.field_sizes();
        let outcome = google_books::apply(&self.http, &isbn13, &mut res).await;
        record_stage(&mut res, Source::GoogleBooks, sizes, outcome);
        res
    }
}

fn record_stage(res: &mut Resolution, source: Source, before: (usize, usize), result: Result<()>) {
    let outcome = match result {
        Err(e) => {
            tracing::warn!(
                source = %source,
                identifier = %res.identifier,
                error = %e,
                "source lookup failed"
            );
            StageOutcome::Error(e.to_string())
        }
        Ok(()) if res.field_sizes() != before => StageOutcome::Found,
        Ok(()) => {
            tracing::debug!(source = %source, identifier = %res.identifier, "source had nothing");
            StageOutcome::Empty
        }
    };
    res.stages.push((source, outcome));
}

/// Strip HTML tags and collapse whitespace runs (newlines included) to
/// single spaces. Summary text arrives as a mix of markup-bearing JSON
/// fields and scraped element text; all comparisons happen on this form.
pub(crate) fn clean_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    let mut last_space = false;
    for ch in input.chars() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
            }
            continue;
        }
        if ch == '<' {
            in_tag = true;
        } else if ch.is_whitespace() {
            if !last_space && !out.is_empty() {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out.trim_end().to_string()
}

/// Drop empty and repeated keywords, keeping first-seen order.
pub(crate) fn dedupe_keywords(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for keyword in raw {
        let keyword = keyword.trim().to_string();
        if keyword.is_empty() {
            continue;
        }
        if seen.insert(keyword.clone()) {
            out.push(keyword);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_markup_and_collapses_whitespace() {
        assert_eq!(clean_text("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(clean_text("line one\n\nline  two"), "line one line two");
        assert_eq!(clean_text("  padded  "), "padded");
    }

    #[test]
    fn summary_only_grows() {
        let mut res = Resolution::default();
        assert!(res.offer_summary("short text"));
        assert!(!res.offer_summary("tiny"));
        assert!(res.offer_summary("a noticeably longer replacement text"));
        assert_eq!(res.summary, "a noticeably longer replacement text");
    }

    #[test]
    fn keyword_set_only_grows_and_dedupes() {
        let mut res = Resolution::default();
        assert!(res.offer_keywords(vec![
            "Fiction".into(),
            "Fiction".into(),
            "Magic".into()
        ]));
        assert_eq!(res.keywords, vec!["Fiction", "Magic"]);
        assert!(!res.offer_keywords(vec!["History".into()]));
        assert_eq!(res.keywords, vec!["Fiction", "Magic"]);
    }

    #[test]
    fn completion_requires_both_fields() {
        let mut res = Resolution::default();
        assert!(!res.is_complete());
        assert!(res.is_miss());
        res.offer_summary("something");
        assert!(!res.is_complete());
        assert!(!res.is_miss());
        res.offer_keywords(vec!["kw".into()]);
        assert!(res.is_complete());
    }

    #[test]
    fn stage_outcomes_distinguish_error_from_empty() {
        let mut res = Resolution::default();
        record_stage(&mut res, Source::OpenLibrary, (0, 0), Ok(()));
        record_stage(
            &mut res,
            Source::Bookswagon,
            (0, 0),
            Err(anyhow::anyhow!("connection refused")),
        );
        res.offer_keywords(vec!["kw".into()]);
        record_stage(&mut res, Source::GoogleBooks, (0, 0), Ok(()));

        assert_eq!(res.stages[0].1, StageOutcome::Empty);
        assert!(matches!(res.stages[1].1, StageOutcome::Error(_)));
        assert_eq!(res.stages[2].1, StageOutcome::Found);
    }
}
