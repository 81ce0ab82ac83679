//! PostgreSQL repository implementations.

pub mod share;

pub use share::ShareRepository;
