// API request/response models (DTOs)

use crate::db::BookRow;
use serde::{Deserialize, Serialize};

/// Liveness answer for `GET /`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
}

impl StatusResponse {
    pub fn up() -> Self {
        Self {
            message: "Book API is up".to_string(),
        }
    }
}

/// Envelope for `GET /books`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookListResponse {
    pub code: u16,
    pub count: usize,
    pub data: Vec<BookRow>,
}

impl BookListResponse {
    pub fn new(data: Vec<BookRow>) -> Self {
        Self {
            code: 200,
            count: data.len(),
            data,
        }
    }
}

/// Error body for 4xx answers.
#[derive(Debug, Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}

impl Detail {
    pub fn book_not_found() -> Self {
        Self {
            detail: "Book not found".to_string(),
        }
    }

    pub fn bad_limit(count: i64) -> Self {
        Self {
            detail: format!("limit must be between 1 and {count}"),
        }
    }
}

/// Query parameters for `GET /books`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    /// Raw `sort` value; unrecognized names select the default listing
    /// instead of failing extraction.
    pub sort: Option<String>,
}

impl ListQuery {
    pub fn sort_order(&self) -> Option<SortOrder> {
        self.sort.as_deref().and_then(SortOrder::parse)
    }
}

/// Recognized orderings for the list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Accession,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "accession" => Some(Self::Accession),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_envelope_reports_its_own_length() {
        let body = BookListResponse::new(vec![BookRow::new(), BookRow::new()]);
        assert_eq!(body.code, 200);
        assert_eq!(body.count, 2);
    }

    #[test]
    fn only_accession_names_a_sort_order() {
        assert_eq!(SortOrder::parse("accession"), Some(SortOrder::Accession));
        assert_eq!(SortOrder::parse("title"), None);

        let query = ListQuery {
            limit: None,
            sort: Some("title".into()),
        };
        assert_eq!(query.sort_order(), None);
    }
}
