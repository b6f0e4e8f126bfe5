//! Persistence layer for extracted entities.

pub mod postgres;
pub mod store;

pub use postgres::PgEntityStore;
pub use store::EntityStore;
