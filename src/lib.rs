//! # exif-date-fix
//!
//! Restore missing EXIF capture dates on JPEG files by reading the date out of the
//! filename (`IMG-20230615-0001.jpg`, `2019-05-09 15-47-33.jpg`, ...) and writing
//! it into `DateTimeOriginal` and `DateTimeDigitized`.
//!
//! ## Quick Start
//!
//! The pipeline module triages a whole directory into output buckets:
//!
//! ```rust,no_run
//! use exif_date_fix::config::Config;
//! use exif_date_fix::pipeline::{self, Bucket};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::resolve(Some("./photos".into()))?;
//!     let report = pipeline::run(&config)?;
//!     println!("fixed {} file(s)", report.count(Bucket::Fixed));
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! The inference engine and the EXIF reader/writer work on plain strings and bytes:
//!
//! ```rust,no_run
//! use exif_date_fix::{date, exif};
//!
//! fn main() -> anyhow::Result<()> {
//!     let bytes = std::fs::read("IMG-20230615-0001.jpg")?;
//!
//!     if exif::inspect(&bytes)?.is_missing() {
//!         if let Some(inferred) = date::infer("IMG-20230615-0001.jpg") {
//!             let patched = exif::apply_date_to_bytes(&bytes, &inferred)?;
//!             std::fs::write("fixed.jpg", patched)?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Output Buckets
//!
//! | Bucket | Contents |
//! |--------|----------|
//! | `_fixed` | JPEGs with the inferred date written |
//! | `_untouched` | JPEGs that already had both dates |
//! | `_corrupted` | JPEGs whose EXIF could not be parsed |
//! | `_not_fixed` | JPEGs missing a date with no date in the name |
//! | `_remain` | everything that is not a JPEG |
//!
//! ## Modules
//!
//! - [`date`]: filename date inference
//! - [`exif`]: EXIF container codec, date inspection and writing
//! - [`pipeline`]: directory triage into buckets
//! - [`config`]: run configuration
//! - [`error`]: error types

pub mod config;
pub mod date;
pub mod error;
pub mod exif;
pub mod pipeline;

pub use error::{Error, Result};
