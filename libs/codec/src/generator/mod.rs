//! Validation plan generation
//!
//! Turns schema metadata for one `(class, version)` into a [`Plan`]: the
//! literal offsets, lengths and tag tables a validator needs, with every
//! schema lookup already resolved. Plans are interpreted by the executor in
//! [`crate::validation`]; nothing here touches wire bytes.

pub mod list;
pub mod object;
pub(crate) mod overrides;

pub use list::{ListPlan, ListStrategy, TlvArm, Unverified};
pub use object::{MemberCheck, MemberExtent, ObjectPlan};

use crate::error::GenerateError;
use schema::{ClassId, ProtocolVersion, Schema};
use std::sync::Arc;

/// Generated validator for one concrete class at one version
#[derive(Debug, Clone)]
pub enum Plan {
    Object(ObjectPlan),
    List(ListPlan),
}

impl Plan {
    pub fn class(&self) -> ClassId {
        match self {
            Plan::Object(plan) => plan.class,
            Plan::List(plan) => plan.class,
        }
    }

    pub fn name(&self) -> &Arc<str> {
        match self {
            Plan::Object(plan) => &plan.name,
            Plan::List(plan) => &plan.name,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        match self {
            Plan::Object(plan) => plan.version,
            Plan::List(plan) => plan.version,
        }
    }

    /// Classes whose validators this plan calls into
    pub fn dependencies(&self) -> Vec<ClassId> {
        match self {
            Plan::Object(plan) => plan.members.iter().map(|m| m.target).collect(),
            Plan::List(ListPlan {
                strategy: ListStrategy::Tlv16 { arms, .. },
                ..
            }) => arms.iter().map(|arm| arm.class).collect(),
            Plan::List(_) => Vec::new(),
        }
    }
}

/// Generate the plan for a concrete class at `version`
pub fn generate(
    schema: &Schema,
    class: ClassId,
    version: ProtocolVersion,
) -> Result<Plan, GenerateError> {
    let desc = schema.class(class);
    if desc.is_abstract {
        return Err(GenerateError::AbstractClass {
            class: desc.name.to_string(),
        });
    }
    if desc.is_list() {
        list::generate(schema, class, version).map(Plan::List)
    } else {
        object::generate(schema, class, version).map(Plan::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abstract_class_has_no_plan() {
        let schema = schema::openflow().unwrap();
        let action = schema.lookup("of_action").unwrap();
        assert!(matches!(
            generate(&schema, action, ProtocolVersion::Of13),
            Err(GenerateError::AbstractClass { .. })
        ));
    }

    #[test]
    fn test_class_outside_version() {
        let schema = schema::openflow().unwrap();
        let pop_vlan = schema.lookup("of_action_pop_vlan").unwrap();
        assert!(matches!(
            generate(&schema, pop_vlan, ProtocolVersion::Of10),
            Err(GenerateError::NotInVersion { .. })
        ));
    }

    #[test]
    fn test_dependencies() {
        let schema = schema::openflow().unwrap();
        let flow_add = schema.lookup("of_flow_add").unwrap();
        let plan = generate(&schema, flow_add, ProtocolVersion::Of13).unwrap();
        let deps: Vec<&str> = plan
            .dependencies()
            .into_iter()
            .map(|id| &**schema.name(id))
            .collect();
        assert_eq!(deps, ["of_match_v3", "of_list_instruction"]);
    }
}
