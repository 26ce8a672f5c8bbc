//! Core types and errors for debrelease
//!
//! This crate holds the resolved package metadata, the supported
//! distribution table and the version scheme shared by every other
//! debrelease crate.

pub mod distribution;
pub mod error;
pub mod metadata;
pub mod version;

pub use distribution::Distribution;
pub use error::{Error, Result};
pub use metadata::{Copyright, License, PackageMetadata};
pub use version::BuildVersion;
