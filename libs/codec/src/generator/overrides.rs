//! Per-member special cases
//!
//! A handful of members cannot be bounded by "everything from my offset to
//! the end of the buffer". Each entry here names the class (or class family)
//! and member, and how the member's extent is located instead.

use schema::{ClassId, ProtocolVersion, Schema};

/// How an overridden member is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OverrideRule {
    /// Not validated at all
    Exclude,
    /// Extent given by a u16 length field `back` bytes before the member
    LengthField { back: usize },
    /// Starts right after the padded variable-length match in `match_member`
    AfterMatch { match_member: &'static str },
}

#[derive(Debug)]
pub(crate) struct MemberOverride {
    pub class: &'static str,
    pub member: &'static str,
    /// Also applies to every class descending from `class`
    pub include_subtypes: bool,
    /// First version the override applies to
    pub since: Option<ProtocolVersion>,
    pub rule: OverrideRule,
}

impl MemberOverride {
    fn applies(&self, schema: &Schema, class: ClassId, version: ProtocolVersion) -> bool {
        if self.since.is_some_and(|since| version < since) {
            return false;
        }
        if self.include_subtypes {
            schema
                .lookup(self.class)
                .is_some_and(|family| schema.descends_from(class, family))
        } else {
            &**schema.name(class) == self.class
        }
    }
}

pub(crate) static MEMBER_OVERRIDES: &[MemberOverride] = &[
    MemberOverride {
        class: "of_packet_out",
        member: "actions",
        include_subtypes: false,
        since: None,
        rule: OverrideRule::LengthField { back: 2 },
    },
    MemberOverride {
        class: "of_flow_mod",
        member: "instructions",
        include_subtypes: true,
        since: Some(ProtocolVersion::Of12),
        rule: OverrideRule::AfterMatch { match_member: "match" },
    },
    MemberOverride {
        class: "of_bsn_gentable_entry_add",
        member: "value",
        include_subtypes: false,
        since: None,
        rule: OverrideRule::Exclude,
    },
    MemberOverride {
        class: "of_bsn_gentable_entry_desc_stats_entry",
        member: "value",
        include_subtypes: false,
        since: None,
        rule: OverrideRule::Exclude,
    },
    MemberOverride {
        class: "of_bsn_gentable_entry_stats_entry",
        member: "stats",
        include_subtypes: false,
        since: None,
        rule: OverrideRule::Exclude,
    },
];

/// Rule for `member` of `class` at `version`, if any
pub(crate) fn lookup(
    schema: &Schema,
    class: ClassId,
    member: &str,
    version: ProtocolVersion,
) -> Option<OverrideRule> {
    MEMBER_OVERRIDES
        .iter()
        .find(|o| o.member == member && o.applies(schema, class, version))
        .map(|o| o.rule)
}

/// Padding members are never validated
pub(crate) fn is_padding(member: &str) -> bool {
    member.starts_with("pad")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_mod_family_since_of12() {
        let schema = schema::openflow().unwrap();
        let flow_add = schema.lookup("of_flow_add").unwrap();

        assert_eq!(
            lookup(&schema, flow_add, "instructions", ProtocolVersion::Of13),
            Some(OverrideRule::AfterMatch { match_member: "match" })
        );
        assert_eq!(
            lookup(&schema, flow_add, "instructions", ProtocolVersion::Of12),
            Some(OverrideRule::AfterMatch { match_member: "match" })
        );
        assert_eq!(
            lookup(&schema, flow_add, "instructions", ProtocolVersion::Of11),
            None
        );
        assert_eq!(lookup(&schema, flow_add, "actions", ProtocolVersion::Of10), None);
    }

    #[test]
    fn test_exact_class_match() {
        let schema = schema::openflow().unwrap();
        let packet_out = schema.lookup("of_packet_out").unwrap();
        let entry_add = schema.lookup("of_bsn_gentable_entry_add").unwrap();

        assert_eq!(
            lookup(&schema, packet_out, "actions", ProtocolVersion::Of10),
            Some(OverrideRule::LengthField { back: 2 })
        );
        assert_eq!(
            lookup(&schema, entry_add, "value", ProtocolVersion::Of13),
            Some(OverrideRule::Exclude)
        );
        assert_eq!(lookup(&schema, entry_add, "key", ProtocolVersion::Of13), None);
    }

    #[test]
    fn test_padding_names() {
        assert!(is_padding("pad"));
        assert!(is_padding("pad2"));
        assert!(!is_padding("actions"));
        assert!(!is_padding("xpad"));
    }
}
