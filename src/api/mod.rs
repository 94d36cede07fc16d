// HTTP serving layer for the book catalog

pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
