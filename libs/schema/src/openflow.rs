//! Bundled OpenFlow 1.0 - 1.3 schema
//!
//! The document is embedded at compile time and parsed on first use. Every
//! caller shares the same `Arc<Schema>` for the life of the process.

use crate::document::SchemaDocument;
use crate::error::{SchemaError, SchemaResult};
use crate::model::Schema;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Source text of the bundled schema document
pub const OPENFLOW_SCHEMA: &str = include_str!("../schemas/openflow.toml");

static OPENFLOW: OnceCell<Arc<Schema>> = OnceCell::new();

/// Shared handle to the bundled OpenFlow schema
pub fn openflow() -> SchemaResult<Arc<Schema>> {
    OPENFLOW
        .get_or_try_init(|| {
            let schema = SchemaDocument::from_toml_str(OPENFLOW_SCHEMA)?.build()?;
            Ok::<_, SchemaError>(Arc::new(schema))
        })
        .cloned()
}
