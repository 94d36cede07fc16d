// HTTP request handlers for API endpoints

use crate::api::models::{BookListResponse, Detail, ListQuery, SortOrder, StatusResponse};
use crate::db::Db;
use actix_web::{error, web, HttpResponse, Result};

/// Liveness endpoint
pub async fn status() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(StatusResponse::up()))
}

/// List books: described rows newest-first by default, every row in
/// accession order with `sort=accession`; unrecognized sort values select
/// the default. An explicit limit must fall inside `1..=row count`.
pub async fn list_books(query: web::Query<ListQuery>, db: web::Data<Db>) -> Result<HttpResponse> {
    let count = db
        .count_books()
        .await
        .map_err(error::ErrorInternalServerError)?;

    if let Some(limit) = query.limit {
        if limit < 1 || limit > count {
            return Ok(HttpResponse::UnprocessableEntity().json(Detail::bad_limit(count)));
        }
    }
    let limit = query.limit.unwrap_or(count);

    let rows = match query.sort_order() {
        Some(SortOrder::Accession) => db.list_by_accession(limit).await,
        None => db.list_described(limit).await,
    }
    .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(BookListResponse::new(rows)))
}

/// Point lookup by ISBN-10, ISBN-13, accession number, or classification
/// code.
pub async fn get_book(path: web::Path<String>, db: web::Data<Db>) -> Result<HttpResponse> {
    let id = canonical_id(&path.into_inner());

    match db
        .find_book(&id)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        Some(row) => Ok(HttpResponse::Ok().json(row)),
        None => Ok(HttpResponse::NotFound().json(Detail::book_not_found())),
    }
}

// Identifiers arrive hyphenated as often as not; the table stores them bare.
fn canonical_id(raw: &str) -> String {
    raw.trim().replace('-', "")
}
