//! Plan execution
//!
//! Walks generated plans over a byte slice. Every offset comes from a plan
//! and every read is bounds checked, so arbitrary input can only produce a
//! [`ValidationError`]. Nothing is allocated unless validation fails.

use super::assembler::VersionValidators;
use crate::error::{ValidationError, ValidationResult};
use crate::generator::{ListPlan, ListStrategy, MemberExtent, ObjectPlan, Plan};
use crate::wire;
use schema::ClassId;

impl VersionValidators {
    /// Validate `buf` as an instance of `class` at this version
    ///
    /// `class` must come from this validator's schema. An id the schema never
    /// issued fails with [`ValidationError::MissingValidator`].
    pub fn validate_class(&self, class: ClassId, buf: &[u8]) -> ValidationResult {
        match self.plan(class) {
            Some(Plan::Object(plan)) => self.validate_object(plan, buf),
            Some(Plan::List(plan)) => self.validate_list(plan, buf),
            None => Err(ValidationError::MissingValidator {
                class: self
                    .schema
                    .get(class)
                    .map(|desc| desc.name.clone())
                    .unwrap_or_else(|| format!("#{}", class.index()).into()),
                version: self.version,
            }),
        }
    }

    /// Resolve the message class from its type fields, then validate it
    pub fn validate_message(&self, msg: &[u8]) -> ValidationResult {
        match self.dispatch.resolve(msg) {
            Some(class) => self.validate_class(class, msg),
            None => Err(ValidationError::UnknownMessageType {
                version: self.version,
                msg_type: msg.get(1).copied().unwrap_or_default(),
            }),
        }
    }

    fn validate_object(&self, plan: &ObjectPlan, buf: &[u8]) -> ValidationResult {
        if buf.len() < plan.base_length {
            return Err(ValidationError::TooShort {
                class: plan.name.clone(),
                need: plan.base_length,
                got: buf.len(),
            });
        }

        for member in &plan.members {
            let (offset, length) = match member.extent {
                MemberExtent::Tail { offset } => (offset, buf.len().saturating_sub(offset)),
                MemberExtent::LengthField {
                    offset,
                    length_offset,
                } => {
                    let length = wire::read_u16(buf, length_offset).unwrap_or_default() as usize;
                    (offset, length)
                }
                MemberExtent::AfterMatch { match_offset } => {
                    let match_length = wire::read_u16(buf, match_offset + 2).unwrap_or_default();
                    let offset = match_offset.saturating_add(wire::match_bytes(match_length));
                    (offset, buf.len().saturating_sub(offset))
                }
            };

            let Some(slice) = offset
                .checked_add(length)
                .and_then(|end| buf.get(offset..end))
            else {
                return Err(ValidationError::LengthOverflow {
                    class: plan.name.clone(),
                    member: member.name.clone(),
                    offset,
                    length,
                    available: buf.len(),
                });
            };

            self.validate_class(member.target, slice)
                .map_err(|err| ValidationError::member_invalid(&plan.name, &member.name, err))?;
        }

        Ok(())
    }

    fn validate_list(&self, plan: &ListPlan, buf: &[u8]) -> ValidationResult {
        match &plan.strategy {
            ListStrategy::Tlv16 { header_length, .. } => {
                let mut rest = buf;
                let mut offset = 0;
                while rest.len() >= *header_length {
                    // header_length >= 4, so both fields are present
                    let tag = wire::read_u16(rest, 0).unwrap_or_default();
                    let length = wire::read_u16(rest, 2).unwrap_or_default() as usize;

                    let arm = plan
                        .arm(tag)
                        .ok_or_else(|| ValidationError::UnknownElementType {
                            list: plan.name.clone(),
                            version: self.version,
                            tag,
                            offset,
                        })?;

                    if length > rest.len() {
                        return Err(ValidationError::LengthOverflow {
                            class: plan.name.clone(),
                            member: arm.name.clone(),
                            offset,
                            length,
                            available: rest.len(),
                        });
                    }

                    self.validate_class(arm.class, &rest[..length])
                        .map_err(|err| ValidationError::member_invalid(&plan.name, &arm.name, err))?;

                    rest = &rest[length..];
                    offset += length;
                }

                if !rest.is_empty() {
                    return Err(ValidationError::TrailingBytes {
                        list: plan.name.clone(),
                        remaining: rest.len(),
                    });
                }
                Ok(())
            }
            ListStrategy::Fixed { element_size } => {
                if buf.len() % element_size != 0 {
                    return Err(ValidationError::Misaligned {
                        list: plan.name.clone(),
                        element_size: *element_size,
                        len: buf.len(),
                    });
                }
                Ok(())
            }
            ListStrategy::Unverified(_) => Ok(()),
        }
    }
}
