// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::status))
        .route("/books", web::get().to(handlers::list_books))
        .route("/books/{id}", web::get().to(handlers::get_book));
}
