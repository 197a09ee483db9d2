//! # Domain Layer
//!
//! Pure verification logic: splitting, hashing, trust lookup and the
//! recommendation decision. Only the trust store touches the filesystem.

pub mod algorithm;
pub mod checksum;
pub mod document;
pub mod entities;
pub mod errors;
pub mod recommendation;
pub mod trust;
