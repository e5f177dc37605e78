//! PostgreSQL Store Implementations
//!
//! Concrete implementations of the domain store traits.

mod message_repository;
mod user_repository;

pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
