pub mod analytics;
pub mod models;
