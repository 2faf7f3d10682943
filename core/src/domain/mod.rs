pub mod common;
pub mod listing;
