pub mod aggregate;
pub mod engine;
pub mod entities;
pub mod export;
pub mod helpers;
pub mod normalizer;
pub mod ports;
pub mod predicate;
pub mod schema;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use ports::*;
pub use schema::ListingKind;
pub use value_objects::*;
