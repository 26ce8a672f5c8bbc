//! Debian packaging support for debrelease
//!
//! This crate turns a freshly generated `dh_make` skeleton into a populated
//! `debian/` directory and retargets it at one distribution at a time.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! # fn example(metadata: &debrelease_core::PackageMetadata) -> debrelease_debian::Result<()> {
//! use debrelease_core::{BuildVersion, Distribution};
//! use debrelease_debian::{ControlFileTemplater, DebhelperCompatResolver, TemplateOptions};
//!
//! let templater = ControlFileTemplater::new(Path::new("/src/foo-1.0"));
//! templater.apply_metadata(metadata, &TemplateOptions::default())?;
//!
//! let version = BuildVersion::assign(metadata, Distribution::Focal, 1);
//! templater.rewrite_changelog(metadata, &version, "medium")?;
//! templater.apply_compat(&DebhelperCompatResolver::new().resolve(Distribution::Focal))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`changelog`]: changelog header parsing and rewriting
//! - [`compat`]: debhelper compatibility per distribution
//! - [`edit`]: anchored text edits that fail loudly
//! - [`templater`]: the skeleton edits themselves

pub mod changelog;
pub mod compat;
pub mod edit;
pub mod error;
pub mod templater;

pub use changelog::ChangelogHeader;
pub use compat::{CompatibilityDescriptor, DebhelperCompatResolver, LEGACY_COMPAT_THRESHOLD};
pub use edit::{Anchor, AnchoredText};
pub use error::{DebianError, Result};
pub use templater::{ControlFileTemplater, TemplateOptions};
