//! # sealshare-entity
//!
//! Domain models for share links. Everything here is plain data plus the
//! pure rules that operate on it; storage and orchestration live in
//! `sealshare-database` and `sealshare-service`.

pub mod share;
