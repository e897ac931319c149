#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/profitpulse/profitpulse/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod loader;
pub mod record;
pub mod schema;

pub use error::{DataError, Result};
pub use loader::PanelLoader;
pub use record::{FirmYear, Panel, RawRecord};
pub use schema::{RawField, ResolvedSchema, SchemaMapping};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
