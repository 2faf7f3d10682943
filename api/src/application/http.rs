pub mod health;
pub mod listing;
pub mod query_extractor;
pub mod query_params;
pub mod server;
