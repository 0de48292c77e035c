//! Class and member descriptors
//!
//! Descriptors are produced once by [`crate::SchemaBuilder`] and never mutated.
//! Validator generators only traverse them.

use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Arena index of a class inside its [`crate::Schema`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Encoding family of a list element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementEncoding {
    /// 16-bit type tag at offset 0, 16-bit element length at offset 2
    Tlv16,
    /// 16-bit length prefix, no subtype tag
    U16Len,
    /// Extensible match (OXM) entries
    Oxm,
}

/// Location of the field that selects a concrete subtype on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Discriminator {
    pub offset: usize,
    /// Field width in bytes: 1, 2 or 4
    pub width: u8,
}

impl Discriminator {
    /// One past the last byte of the field; `None` if the offset overflows
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.width as usize)
    }
}

/// Declared type of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberType {
    /// Fixed-width primitive (integers, addresses)
    Scalar { width: usize },
    /// Padding bytes
    Pad { len: usize },
    /// Opaque trailing bytes, never inspected
    Opaque,
    /// Nested object or list
    Object(ClassId),
}

/// A member of a class at one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDescriptor {
    pub name: Arc<str>,
    pub ty: MemberType,
    pub offset: usize,
    /// Target class is variable length at this version
    pub variable_length: bool,
}

impl MemberDescriptor {
    /// Target class when the member is a nested object
    pub fn object(&self) -> Option<ClassId> {
        match self.ty {
            MemberType::Object(id) => Some(id),
            _ => None,
        }
    }
}

/// Per-version shape of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLayout {
    /// Fixed-size portion, excluding trailing variable-length members
    pub base_length: usize,
    pub variable_length: bool,
    /// Type tag under the parent class at this version; `None` when unassigned
    pub wire_id: Option<u32>,
    /// Set on abstract classes whose subtypes are selected by a wire field
    pub discriminator: Option<Discriminator>,
    pub members: Vec<MemberDescriptor>,
}

impl ClassLayout {
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| &*m.name == name)
    }
}

/// A message or sub-object type across all versions
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    pub id: ClassId,
    pub name: Arc<str>,
    pub parent: Option<ClassId>,
    /// Inheritance root with no validator of its own
    pub is_abstract: bool,
    /// Element type when this class is a list
    pub list_element: Option<ClassId>,
    pub encoding: Option<ElementEncoding>,
    pub(crate) layouts: BTreeMap<ProtocolVersion, ClassLayout>,
    pub(crate) subtypes: Vec<ClassId>,
}

impl ClassDescriptor {
    pub fn layout(&self, version: ProtocolVersion) -> Option<&ClassLayout> {
        self.layouts.get(&version)
    }

    pub fn in_version(&self, version: ProtocolVersion) -> bool {
        self.layouts.contains_key(&version)
    }

    pub fn versions(&self) -> impl Iterator<Item = ProtocolVersion> + '_ {
        self.layouts.keys().copied()
    }

    pub fn is_list(&self) -> bool {
        self.list_element.is_some()
    }

    /// Direct subtypes, in declaration order
    pub fn subtypes(&self) -> &[ClassId] {
        &self.subtypes
    }

    pub fn base_length(&self, version: ProtocolVersion) -> Option<usize> {
        self.layout(version).map(|l| l.base_length)
    }
}
