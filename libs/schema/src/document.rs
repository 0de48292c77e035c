//! Serialized schema documents
//!
//! The schema compiler emits one document per protocol description. Documents
//! are plain serde structures so they can be written as TOML or JSON.
//!
//! ```toml
//! message_root = "of_header"
//!
//! [[class]]
//! name = "of_hello"
//! parent = "of_header"
//! wire_id = 0
//!
//! [[class.layout]]
//! versions = [1, 2, 3, 4]
//! base_length = 8
//! members = [{ name = "xid", offset = 4, type = "u32" }]
//! ```

use crate::builder::SchemaBuilder;
use crate::class::{Discriminator, ElementEncoding};
use crate::error::{SchemaError, SchemaResult};
use crate::model::Schema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level schema document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Abstract class at the top of the message hierarchy
    pub message_root: String,
    #[serde(rename = "class", default)]
    pub classes: Vec<ClassSpec>,
}

/// One class across all versions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassSpec {
    pub name: String,
    pub parent: Option<String>,
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    /// Copy the parent's layout for every version the parent defines
    pub inherit: bool,
    /// Wire id shared by all versions unless a layout overrides it
    pub wire_id: Option<u32>,
    /// Versions for inherited layouts and list classes
    pub versions: Option<Vec<u8>>,
    pub list_of: Option<String>,
    pub encoding: Option<ElementEncoding>,
    #[serde(rename = "layout")]
    pub layouts: Vec<LayoutSpec>,
}

/// Layout shared by one or more versions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutSpec {
    pub versions: Vec<u8>,
    pub base_length: usize,
    pub variable_length: bool,
    pub wire_id: Option<u32>,
    pub discriminator: Option<Discriminator>,
    pub members: Vec<MemberSpec>,
}

/// A member entry; `type` is a primitive name or a class name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberSpec {
    pub name: String,
    pub offset: usize,
    #[serde(rename = "type")]
    pub ty: String,
    /// Byte count for `pad` members
    #[serde(default)]
    pub len: Option<usize>,
}

impl MemberSpec {
    pub fn new(name: impl Into<String>, offset: usize, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offset,
            ty: ty.into(),
            len: None,
        }
    }
}

impl SchemaDocument {
    pub fn from_toml_str(text: &str) -> SchemaResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a document, choosing the format from the file extension
    pub fn load(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            _ => Err(SchemaError::UnknownFormat {
                path: path.display().to_string(),
            }),
        }
    }

    pub fn build(self) -> SchemaResult<Schema> {
        SchemaBuilder::from_document(self).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
message_root = "hdr"

[[class]]
name = "hdr"
abstract = true

[[class.layout]]
versions = [1]
base_length = 4
discriminator = { offset = 1, width = 1 }

[[class]]
name = "ping"
parent = "hdr"
inherit = true
wire_id = 7
"#;

    #[test]
    fn test_toml_document_parses() {
        let doc = SchemaDocument::from_toml_str(SMALL).unwrap();
        assert_eq!(doc.message_root, "hdr");
        assert_eq!(doc.classes.len(), 2);
        assert!(doc.classes[0].is_abstract);
        assert_eq!(doc.classes[0].layouts[0].discriminator.unwrap().width, 1);
        assert!(doc.classes[1].inherit);
        assert_eq!(doc.classes[1].wire_id, Some(7));
    }

    #[test]
    fn test_json_document_parses() {
        let json = r#"{
            "message_root": "hdr",
            "class": [
                {"name": "hdr", "abstract": true,
                 "layout": [{"versions": [4], "base_length": 8,
                             "discriminator": {"offset": 1, "width": 1}}]},
                {"name": "tlv", "abstract": true, "encoding": "tlv16",
                 "layout": [{"versions": [4], "base_length": 4, "variable_length": true}]}
            ]
        }"#;
        let doc = SchemaDocument::from_json_str(json).unwrap();
        assert_eq!(doc.classes[1].encoding, Some(ElementEncoding::Tlv16));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let bad = "message_root = \"x\"\n[[class]]\nname = \"x\"\nbogus = 1\n";
        assert!(matches!(
            SchemaDocument::from_toml_str(bad),
            Err(SchemaError::Toml(_))
        ));
    }

    #[test]
    fn test_load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("schema.toml");
        std::fs::write(&toml_path, SMALL).unwrap();
        assert!(SchemaDocument::load(&toml_path).is_ok());

        let other = dir.path().join("schema.yaml");
        std::fs::write(&other, SMALL).unwrap();
        assert!(matches!(
            SchemaDocument::load(&other),
            Err(SchemaError::UnknownFormat { .. })
        ));

        assert!(matches!(
            SchemaDocument::load(dir.path().join("missing.toml")),
            Err(SchemaError::Io { .. })
        ));
    }
}
