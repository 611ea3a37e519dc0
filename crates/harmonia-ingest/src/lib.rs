//! Campaign ingestion.
//!
//! - **Configuration**: the campaign JSON file listing modes and scripts
//! - **Metadata**: JSON descriptors of groups and variables, one per mode
//! - **Answers**: raw CSV answers shaped into unimodal bindings
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use harmonia_ingest::{build_bindings, load_campaign};
//!
//! let config = load_campaign(Path::new("campaigns/SAMPLETEST/campaign.json"))?;
//! let context = build_bindings(&config)?;
//! ```

mod answers;
mod campaign;
mod config;
mod error;
mod metadata;

// === Error Types ===
pub use error::{IngestError, Result};

// === Configuration ===
pub use config::{CampaignConfig, ModeConfig, load_campaign};

// === Metadata ===
pub use metadata::{JsonMetadataSource, MetadataDescriptor, load_metadata, load_metadata_descriptor};

// === Answers ===
pub use answers::{prepare_answers, read_answers};
pub use campaign::build_bindings;
