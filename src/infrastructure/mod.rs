pub mod api_client;
pub mod config;
pub mod credential_store;
pub mod error;
pub mod mood_source;
pub mod recommendation_client;
pub mod track_source;
