pub mod api;
pub mod db;
pub mod normalization;
pub mod pipeline;
pub mod resolver;

pub mod util {
    pub mod env;
}
