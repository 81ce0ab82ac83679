//! Core type definitions used across the SealShare workspace.

pub mod id;

pub use id::*;
