//! Validation, generation and configuration errors
//!
//! Validation failures are plain values: the first failure at any level is
//! returned to the caller and nothing is retried. Every variant names the
//! class, member or list that failed so a single log line identifies the
//! offending structure.

use schema::{ProtocolVersion, SchemaError};
use std::sync::Arc;
use thiserror::Error;

/// Structural validation failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Outer length disagrees with the header or is below the protocol minimum
    #[error("Bad frame length: asserted {len} bytes (buffer {available}, header {declared:?}, minimum {minimum})")]
    BadFrameLength {
        len: usize,
        available: usize,
        declared: Option<u16>,
        minimum: usize,
    },

    /// Header version byte has no assembled validators
    #[error("Bad version {version:#04x}: no validators for this wire version")]
    BadVersion { version: u8 },

    /// Type fields do not resolve to a known message class
    #[error("Unknown message type {msg_type} for {version}: could not map to a message class")]
    UnknownMessageType {
        version: ProtocolVersion,
        msg_type: u8,
    },

    /// Buffer shorter than the class's fixed base length
    #[error("Class {class}: length {got} too small, need at least {need}")]
    TooShort {
        class: Arc<str>,
        need: usize,
        got: usize,
    },

    /// A length or offset field points past the end of the buffer
    #[error("Class {class}, member {member}: length {length} at offset {offset} overflows {available} bytes")]
    LengthOverflow {
        class: Arc<str>,
        member: Arc<str>,
        offset: usize,
        length: usize,
        available: usize,
    },

    /// TLV16 element tag not assigned to any subtype at this version
    #[error("List {list}: unknown element type {tag} at offset {offset} for {version}")]
    UnknownElementType {
        list: Arc<str>,
        version: ProtocolVersion,
        tag: u16,
        offset: usize,
    },

    /// TLV16 list left bytes that do not form a complete element header
    #[error("List {list}: {remaining} trailing bytes after last element")]
    TrailingBytes { list: Arc<str>, remaining: usize },

    /// Fixed-size list length is not a multiple of the element size
    #[error("List {list}: length {len} is not a multiple of element size {element_size}")]
    Misaligned {
        list: Arc<str>,
        element_size: usize,
        len: usize,
    },

    /// A nested member or list element failed; `source` holds the cause
    #[error("Class {class}, member {member} invalid")]
    MemberInvalid {
        class: Arc<str>,
        member: Arc<str>,
        #[source]
        source: Box<ValidationError>,
    },

    /// No plan was generated for a referenced class (generation invariant broken)
    #[error("No validator for class {class} at {version}")]
    MissingValidator {
        class: Arc<str>,
        version: ProtocolVersion,
    },
}

/// Failure category, independent of context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadFrameLength,
    BadVersion,
    UnknownMessageType,
    TooShort,
    LengthOverflow,
    UnknownElementType,
    TrailingBytes,
    Misaligned,
    MemberInvalid,
    MissingValidator,
}

impl ErrorKind {
    /// Negative status code; `0` is reserved for success
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::BadFrameLength => -1,
            ErrorKind::BadVersion => -2,
            ErrorKind::UnknownMessageType => -3,
            ErrorKind::TooShort => -4,
            ErrorKind::LengthOverflow => -5,
            ErrorKind::UnknownElementType => -6,
            ErrorKind::TrailingBytes => -7,
            ErrorKind::Misaligned => -8,
            ErrorKind::MemberInvalid => -9,
            ErrorKind::MissingValidator => -10,
        }
    }
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::BadFrameLength { .. } => ErrorKind::BadFrameLength,
            ValidationError::BadVersion { .. } => ErrorKind::BadVersion,
            ValidationError::UnknownMessageType { .. } => ErrorKind::UnknownMessageType,
            ValidationError::TooShort { .. } => ErrorKind::TooShort,
            ValidationError::LengthOverflow { .. } => ErrorKind::LengthOverflow,
            ValidationError::UnknownElementType { .. } => ErrorKind::UnknownElementType,
            ValidationError::TrailingBytes { .. } => ErrorKind::TrailingBytes,
            ValidationError::Misaligned { .. } => ErrorKind::Misaligned,
            ValidationError::MemberInvalid { .. } => ErrorKind::MemberInvalid,
            ValidationError::MissingValidator { .. } => ErrorKind::MissingValidator,
        }
    }

    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    /// Innermost failure below any `MemberInvalid` wrappers
    pub fn root_cause(&self) -> &ValidationError {
        let mut current = self;
        while let ValidationError::MemberInvalid { source, .. } = current {
            current = source;
        }
        current
    }

    /// Member path from the outermost class down to the root cause
    pub fn member_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let ValidationError::MemberInvalid { member, source, .. } = current {
            path.push(&**member);
            current = source;
        }
        path
    }

    pub(crate) fn member_invalid(class: &Arc<str>, member: &Arc<str>, source: ValidationError) -> Self {
        ValidationError::MemberInvalid {
            class: class.clone(),
            member: member.clone(),
            source: Box::new(source),
        }
    }
}

/// Result type for validation
pub type ValidationResult = std::result::Result<(), ValidationError>;

/// Generation-time assumption violated by the schema
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Class {class} is abstract and has no validator")]
    AbstractClass { class: String },

    #[error("Class {class} is not defined at {version}")]
    NotInVersion {
        class: String,
        version: ProtocolVersion,
    },

    #[error("Class {class} is not a list")]
    NotAList { class: String },

    #[error("TLV16 element {element} at {version}: header length {header_length} cannot hold type and length")]
    TlvHeaderTooShort {
        element: String,
        version: ProtocolVersion,
        header_length: usize,
    },

    #[error("TLV16 subtype {subtype} of {element} at {version}: base length {base_length} below header length {header_length}")]
    SubtypeShorterThanHeader {
        element: String,
        subtype: String,
        version: ProtocolVersion,
        base_length: usize,
        header_length: usize,
    },

    #[error("Class {class} at {version}: wire id {wire_id} assigned twice")]
    DuplicateWireId {
        class: String,
        version: ProtocolVersion,
        wire_id: u32,
    },

    #[error("Class {class}: wire id {wire_id} does not fit a {width}-byte field")]
    WireIdOverflow {
        class: String,
        wire_id: u32,
        width: u8,
    },

    #[error("List {list} at {version}: fixed element {element} has zero size")]
    ZeroElementSize {
        list: String,
        element: String,
        version: ProtocolVersion,
    },

    #[error("Class {class}, member {member} at {version}: field at {field_offset} lies outside base length {base_length}")]
    FieldOutsideBase {
        class: String,
        member: String,
        version: ProtocolVersion,
        field_offset: usize,
        base_length: usize,
    },

    #[error("Class {class} at {version}: no {member} member to locate instructions after")]
    MissingMatchMember {
        class: String,
        member: String,
        version: ProtocolVersion,
    },

    #[error("Abstract class {class} at {version} has no discriminator")]
    MissingDiscriminator {
        class: String,
        version: ProtocolVersion,
    },

    #[error("Class {class} at {version} references {dependency}, which has no validator")]
    MissingDependency {
        class: String,
        dependency: String,
        version: ProtocolVersion,
    },

    #[error("Validator dependency cycle at {version}: {path}")]
    DependencyCycle {
        version: ProtocolVersion,
        path: String,
    },
}

/// Configuration loading failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}
