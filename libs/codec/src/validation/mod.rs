//! # Structural Message Validation
//!
//! ## Purpose
//!
//! Runtime side of the validator engine: per-version assembly of generated
//! plans, message type dispatch, plan execution and the top-level entry point.
//!
//! ## Architecture
//!
//! ```text
//! (msg, len) → ValidatorSet → VersionValidators → DispatchTable → Plan executor
//!                  ↓                ↓                   ↓               ↓
//!            frame length     version byte        type fields    base length,
//!            check            selects version     → message      members, lists
//! ```
//!
//! Validation is a pure function of the input slice: validators hold no
//! mutable state and can be shared across threads freely.

pub mod assembler;
pub mod config;
pub mod dispatch;
mod executor;
pub mod validator;

pub use assembler::VersionValidators;
pub use config::ValidatorConfig;
pub use dispatch::DispatchTable;
pub use validator::ValidatorSet;
