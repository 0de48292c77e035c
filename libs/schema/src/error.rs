//! Schema loading and consistency errors

use thiserror::Error;

/// Errors raised while loading or assembling a schema
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to read schema {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML schema: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported schema format for {path} (expected .toml or .json)")]
    UnknownFormat { path: String },

    #[error("Class {name} declared more than once")]
    DuplicateClass { name: String },

    #[error("Unknown class {name} referenced by {referenced_by}")]
    UnknownClass { name: String, referenced_by: String },

    #[error("Unknown protocol version {version} in class {class}")]
    UnknownVersion { version: u8, class: String },

    #[error("Class {class} declares version {version} twice")]
    DuplicateLayout { class: String, version: u8 },

    #[error("Class {class} inherits layout for version {version} but parent {parent} has none")]
    MissingParentLayout {
        class: String,
        parent: String,
        version: u8,
    },

    #[error("Class {class} inherits its layout but has no parent")]
    InheritWithoutParent { class: String },

    #[error("Class {class} at version {version}: discriminator width {width} is not 1, 2 or 4")]
    InvalidDiscriminator { class: String, version: u8, width: u8 },

    #[error("Class {class} at version {version}: discriminator at offset {offset} does not fit base length {base_length}")]
    DiscriminatorOutOfBounds {
        class: String,
        version: u8,
        offset: usize,
        base_length: usize,
    },

    #[error("Class {class} at version {version}: member {member} ends at {end:?}, past base length {base_length}")]
    MemberOutOfBounds {
        class: String,
        member: String,
        version: u8,
        /// `None` when offset plus width overflows
        end: Option<usize>,
        base_length: usize,
    },

    #[error("Class {class} at version {version}: {target} is not defined at that version")]
    MissingTarget {
        class: String,
        target: String,
        version: u8,
    },

    #[error("List {class} has no layout at version {version} for its element {element}")]
    MissingElement {
        class: String,
        element: String,
        version: u8,
    },

    #[error("Class {class} at version {version}: fixed-length class holds variable-length member {member}")]
    FixedClassWithVariableMember {
        class: String,
        member: String,
        version: u8,
    },

    #[error("Class nesting cycle: {path}")]
    Cycle { path: String },

    #[error("Message root {name} is not an abstract class")]
    InvalidMessageRoot { name: String },
}

/// Result type for schema operations
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
