//! List plans
//!
//! The element strategy is chosen once per (list, version) from the element
//! class's encoding family. Only TLV16 lists carry both a tag and a length
//! per element, so only they get a decode-dispatch-recurse loop. The
//! length-prefixed and OXM families stay unverified.

use crate::error::GenerateError;
use schema::{ClassId, ClassLayout, ElementEncoding, ProtocolVersion, Schema};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a list's elements are accepted without inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unverified {
    /// 16-bit length-prefixed elements
    U16Len,
    /// Extensible match entries
    Oxm,
    /// Variable-length element with no known encoding family
    UnknownFormat,
}

impl fmt::Display for Unverified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unverified::U16Len => write!(f, "u16 length-prefixed"),
            Unverified::Oxm => write!(f, "oxm"),
            Unverified::UnknownFormat => write!(f, "unknown element format"),
        }
    }
}

/// Dispatch arm of a TLV16 list: wire tag to concrete subtype
#[derive(Debug, Clone)]
pub struct TlvArm {
    pub tag: u16,
    pub class: ClassId,
    pub name: Arc<str>,
}

#[derive(Debug, Clone)]
pub enum ListStrategy {
    Tlv16 {
        /// Element base length; the loop runs while at least this much remains
        header_length: usize,
        /// Sorted by tag
        arms: Vec<TlvArm>,
    },
    Fixed {
        element_size: usize,
    },
    Unverified(Unverified),
}

#[derive(Debug, Clone)]
pub struct ListPlan {
    pub class: ClassId,
    pub name: Arc<str>,
    pub version: ProtocolVersion,
    pub element: ClassId,
    pub element_name: Arc<str>,
    pub strategy: ListStrategy,
}

impl ListPlan {
    /// Arm for a TLV16 tag
    pub fn arm(&self, tag: u16) -> Option<&TlvArm> {
        match &self.strategy {
            ListStrategy::Tlv16 { arms, .. } => arms
                .binary_search_by_key(&tag, |arm| arm.tag)
                .ok()
                .map(|i| &arms[i]),
            _ => None,
        }
    }
}

pub(crate) fn generate(
    schema: &Schema,
    class: ClassId,
    version: ProtocolVersion,
) -> Result<ListPlan, GenerateError> {
    let desc = schema.class(class);
    let element = desc.list_element.ok_or_else(|| GenerateError::NotAList {
        class: desc.name.to_string(),
    })?;
    let element_desc = schema.class(element);
    let element_layout =
        element_desc
            .layout(version)
            .ok_or_else(|| GenerateError::NotInVersion {
                class: element_desc.name.to_string(),
                version,
            })?;

    let strategy = match element_desc.encoding {
        Some(ElementEncoding::Tlv16) => tlv16(schema, element, element_layout, version)?,
        Some(ElementEncoding::U16Len) => ListStrategy::Unverified(Unverified::U16Len),
        Some(ElementEncoding::Oxm) => ListStrategy::Unverified(Unverified::Oxm),
        None if !element_layout.variable_length => {
            if element_layout.base_length == 0 {
                return Err(GenerateError::ZeroElementSize {
                    list: desc.name.to_string(),
                    element: element_desc.name.to_string(),
                    version,
                });
            }
            ListStrategy::Fixed {
                element_size: element_layout.base_length,
            }
        }
        None => {
            warn!(list = %desc.name, element = %element_desc.name, %version, "unknown element format, elements not verified");
            ListStrategy::Unverified(Unverified::UnknownFormat)
        }
    };

    Ok(ListPlan {
        class,
        name: desc.name.clone(),
        version,
        element,
        element_name: element_desc.name.clone(),
        strategy,
    })
}

fn tlv16(
    schema: &Schema,
    element: ClassId,
    layout: &ClassLayout,
    version: ProtocolVersion,
) -> Result<ListStrategy, GenerateError> {
    let element_name = schema.name(element);
    let header_length = layout.base_length;
    if header_length < 4 {
        return Err(GenerateError::TlvHeaderTooShort {
            element: element_name.to_string(),
            version,
            header_length,
        });
    }

    let mut arms: Vec<TlvArm> = Vec::new();
    for (subtype, wire_id) in schema.subtypes_at(element, version) {
        let sub = schema.class(subtype);
        if sub.is_abstract {
            debug!(element = %element_name, subtype = %sub.name, %version, "abstract subtype left out of arm table");
            continue;
        }
        let Some(wire_id) = wire_id else {
            debug!(element = %element_name, subtype = %sub.name, %version, "no wire id, excluded");
            continue;
        };
        let tag = u16::try_from(wire_id).map_err(|_| GenerateError::WireIdOverflow {
            class: sub.name.to_string(),
            wire_id,
            width: 2,
        })?;
        let base_length = sub.base_length(version).unwrap_or(0);
        if base_length < header_length {
            return Err(GenerateError::SubtypeShorterThanHeader {
                element: element_name.to_string(),
                subtype: sub.name.to_string(),
                version,
                base_length,
                header_length,
            });
        }
        arms.push(TlvArm {
            tag,
            class: subtype,
            name: sub.name.clone(),
        });
    }

    arms.sort_by_key(|arm| arm.tag);
    if let Some(pair) = arms.windows(2).find(|pair| pair[0].tag == pair[1].tag) {
        return Err(GenerateError::DuplicateWireId {
            class: element_name.to_string(),
            version,
            wire_id: u32::from(pair[1].tag),
        });
    }

    Ok(ListStrategy::Tlv16 {
        header_length,
        arms,
    })
}
