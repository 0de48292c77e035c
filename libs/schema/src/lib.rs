//! # OpenFlow Schema Model
//!
//! ## Purpose
//!
//! Class, member and version metadata for a versioned TLV protocol, as
//! produced by the schema compiler. The validator generator in `codec`
//! consumes this model; nothing here reads wire bytes.
//!
//! ## Architecture Role
//!
//! ```text
//! schema document → [SchemaBuilder] → Arc<Schema> → codec generator
//!   TOML / JSON        name resolution     immutable      per (class, version)
//!                      consistency checks  arena          validation plans
//! ```
//!
//! ## What This Crate Contains
//! - [`ProtocolVersion`]: the known wire versions
//! - [`ClassDescriptor`] / [`ClassLayout`] / [`MemberDescriptor`]: per-version shapes
//! - [`Schema`]: immutable arena with per-version queries
//! - [`SchemaBuilder`] / [`SchemaDocument`]: loading and validation of schema documents
//! - [`openflow()`]: the bundled OpenFlow 1.0 - 1.3 schema

pub mod builder;
pub mod class;
pub mod document;
pub mod error;
pub mod model;
pub mod openflow;
pub mod version;

pub use builder::SchemaBuilder;
pub use class::{
    ClassDescriptor, ClassId, ClassLayout, Discriminator, ElementEncoding, MemberDescriptor,
    MemberType,
};
pub use document::{ClassSpec, LayoutSpec, MemberSpec, SchemaDocument};
pub use error::{SchemaError, SchemaResult};
pub use model::Schema;
pub use openflow::{openflow, OPENFLOW_SCHEMA};
pub use version::ProtocolVersion;
