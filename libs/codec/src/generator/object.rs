//! Single-object plans
//!
//! An object plan is a base-length check followed by one recursive check per
//! variable-length object member, in declaration order.

use super::overrides::{self, OverrideRule};
use crate::error::GenerateError;
use schema::{ClassId, ProtocolVersion, Schema};
use std::sync::Arc;
use tracing::debug;

/// Where a variable-length member starts and how many bytes it spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberExtent {
    /// From `offset` to the end of the enclosing buffer
    Tail { offset: usize },
    /// `length` bytes at `offset`, where `length` is the u16 at `length_offset`
    LengthField { offset: usize, length_offset: usize },
    /// From the end of the padded match at `match_offset` to the end of the buffer
    AfterMatch { match_offset: usize },
}

/// One recursive member check
#[derive(Debug, Clone)]
pub struct MemberCheck {
    pub name: Arc<str>,
    pub target: ClassId,
    pub target_name: Arc<str>,
    pub extent: MemberExtent,
}

#[derive(Debug, Clone)]
pub struct ObjectPlan {
    pub class: ClassId,
    pub name: Arc<str>,
    pub version: ProtocolVersion,
    pub base_length: usize,
    pub members: Vec<MemberCheck>,
}

pub(crate) fn generate(
    schema: &Schema,
    class: ClassId,
    version: ProtocolVersion,
) -> Result<ObjectPlan, GenerateError> {
    let desc = schema.class(class);
    let layout = desc.layout(version).ok_or_else(|| GenerateError::NotInVersion {
        class: desc.name.to_string(),
        version,
    })?;
    let base_length = layout.base_length;

    let outside = |member: &str, field_offset: usize| GenerateError::FieldOutsideBase {
        class: desc.name.to_string(),
        member: member.to_string(),
        version,
        field_offset,
        base_length,
    };

    let mut members = Vec::new();
    for member in &layout.members {
        if overrides::is_padding(&member.name) {
            continue;
        }
        let Some(target) = member.object() else {
            continue;
        };
        if !member.variable_length {
            continue;
        }

        let extent = match overrides::lookup(schema, class, &member.name, version) {
            Some(OverrideRule::Exclude) => {
                debug!(class = %desc.name, member = %member.name, %version, "member excluded from validation");
                continue;
            }
            Some(OverrideRule::LengthField { back }) => {
                let length_offset = member
                    .offset
                    .checked_sub(back)
                    .ok_or_else(|| outside(&member.name, 0))?;
                if !length_offset
                    .checked_add(2)
                    .is_some_and(|end| end <= base_length)
                {
                    return Err(outside(&member.name, length_offset));
                }
                MemberExtent::LengthField {
                    offset: member.offset,
                    length_offset,
                }
            }
            Some(OverrideRule::AfterMatch { match_member }) => {
                let matched = layout.member(match_member).ok_or_else(|| {
                    GenerateError::MissingMatchMember {
                        class: desc.name.to_string(),
                        member: match_member.to_string(),
                        version,
                    }
                })?;
                // The match length field sits 2 bytes into the match
                if !matched
                    .offset
                    .checked_add(4)
                    .is_some_and(|end| end <= base_length)
                {
                    return Err(outside(match_member, matched.offset.saturating_add(2)));
                }
                MemberExtent::AfterMatch {
                    match_offset: matched.offset,
                }
            }
            None => {
                if member.offset > base_length {
                    return Err(outside(&member.name, member.offset));
                }
                MemberExtent::Tail {
                    offset: member.offset,
                }
            }
        };

        members.push(MemberCheck {
            name: member.name.clone(),
            target,
            target_name: schema.name(target).clone(),
            extent,
        });
    }

    Ok(ObjectPlan {
        class,
        name: desc.name.clone(),
        version,
        base_length,
        members,
    })
}
