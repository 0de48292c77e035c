//! Human-readable rendering of generated plans
//!
//! Each plan prints as the procedure it stands for: the base-length check,
//! then one line per member or list rule.

use crate::generator::{ListPlan, ListStrategy, MemberExtent, ObjectPlan, Plan};
use crate::validation::VersionValidators;
use std::fmt::{self, Write};

impl fmt::Display for MemberExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberExtent::Tail { offset } => write!(f, "[{offset}, len)"),
            MemberExtent::LengthField {
                offset,
                length_offset,
            } => write!(f, "[{offset}, {offset} + u16@{length_offset})"),
            MemberExtent::AfterMatch { match_offset } => write!(
                f,
                "[{match_offset} + match_bytes(u16@{}), len)",
                match_offset + 2
            ),
        }
    }
}

impl fmt::Display for ObjectPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}):", self.name, self.version)?;
        writeln!(f, "    require len >= {}", self.base_length)?;
        for member in &self.members {
            writeln!(
                f,
                "    {} over {} as {}",
                member.name, member.extent, member.target_name
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ListPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}):", self.name, self.version)?;
        match &self.strategy {
            ListStrategy::Tlv16 {
                header_length,
                arms,
            } => {
                writeln!(
                    f,
                    "    while remaining >= {header_length}: tlv16 {}",
                    self.element_name
                )?;
                for arm in arms {
                    writeln!(f, "        type {} -> {}", arm.tag, arm.name)?;
                }
                writeln!(f, "        otherwise reject")?;
                writeln!(f, "    require no trailing bytes")
            }
            ListStrategy::Fixed { element_size } => writeln!(
                f,
                "    require len % {element_size} == 0 ({})",
                self.element_name
            ),
            ListStrategy::Unverified(reason) => writeln!(
                f,
                "    {} elements not verified ({reason})",
                self.element_name
            ),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Object(plan) => fmt::Display::fmt(plan, f),
            Plan::List(plan) => fmt::Display::fmt(plan, f),
        }
    }
}

impl VersionValidators {
    /// Every plan of this version in dependency order, then the message dispatch
    pub fn listing(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_listing(&mut out);
        out
    }

    fn write_listing(&self, out: &mut String) -> fmt::Result {
        let schema = self.schema();
        writeln!(out, "# {} validators", self.version())?;
        for plan in self.plans() {
            writeln!(out, "declare {}", plan.name())?;
        }
        for plan in self.plans() {
            writeln!(out)?;
            write!(out, "{plan}")?;
        }

        writeln!(out)?;
        writeln!(out, "dispatch ({}):", self.version())?;
        let mut pending = vec![(self.dispatch().root(), 1usize)];
        while let Some((class, depth)) = pending.pop() {
            let Some((discriminator, arms)) = self.dispatch().arms(class) else {
                continue;
            };
            let indent = "    ".repeat(depth);
            writeln!(
                out,
                "{indent}{}: u{}@{}",
                schema.name(class),
                discriminator.width as usize * 8,
                discriminator.offset
            )?;
            for &(wire_id, subtype) in arms {
                writeln!(out, "{indent}    {wire_id} -> {}", schema.name(subtype))?;
            }
            pending.extend(arms.iter().rev().map(|&(_, sub)| (sub, depth + 1)));
        }
        Ok(())
    }
}
