//! # OpenFlow Structural Validator Engine
//!
//! ## Purpose
//!
//! Generates, from schema metadata, one validation plan per
//! `(class, protocol version)` and runs those plans over raw message bytes.
//! A validator decides, without decoding field values, whether every
//! internal length and offset of a message is self-consistent and in bounds
//! before any decoder is allowed to touch it.
//!
//! ## Architecture Role
//!
//! ```text
//! libs/schema → [codec generator] → plan table → [codec validation] → accept / reject
//!     ↑               ↓                  ↓                 ↓
//! Class/member   object + list      immutable per     frame length, version,
//! metadata       plans, overrides   version, shared   type dispatch, recursion
//! ```
//!
//! ## What This Crate Contains
//! - [`generator`]: single-object and list plan generation, member overrides
//! - [`validation`]: per-version assembly, message dispatch, executor,
//!   [`ValidatorSet`] entry point and [`ValidatorConfig`]
//! - [`wire`]: bounds-checked big-endian reads and the common header
//! - [`error`]: validation, generation and configuration errors
//! - plan listings via `Display`
//!
//! ## What This Crate Does NOT Contain
//! - Field decoding or object construction
//! - Semantic checks on field values (port numbers, flags)
//! - Socket or buffer lifecycle management
//!
//! ## Example
//!
//! ```
//! use codec::ValidatorSet;
//!
//! let validators = ValidatorSet::openflow().expect("bundled schema");
//! // OpenFlow 1.3 hello, header only
//! let hello = [0x04, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x01];
//! assert!(validators.validate_message(&hello, hello.len()).is_ok());
//! assert!(validators.validate_message(&hello[..7], 7).is_err());
//! ```

pub mod error;
pub mod generator;
mod listing;
pub mod validation;
pub mod wire;

pub use error::{ConfigError, ErrorKind, GenerateError, ValidationError, ValidationResult};
pub use generator::{
    ListPlan, ListStrategy, MemberCheck, MemberExtent, ObjectPlan, Plan, TlvArm, Unverified,
};
pub use validation::{DispatchTable, ValidatorConfig, ValidatorSet, VersionValidators};
pub use wire::{OfHeader, OF_MESSAGE_MIN_LENGTH};

pub use schema::{ClassId, ProtocolVersion, Schema};
