//! Message type resolution
//!
//! Starting at the schema's message root, each abstract class reads its
//! discriminator field and selects the subtype with the matching wire id at
//! this version, until a concrete message class is reached. Experimenter
//! messages simply nest further (type, then experimenter id, then subtype).

use crate::error::GenerateError;
use crate::wire;
use schema::{ClassId, Discriminator, ProtocolVersion, Schema};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
enum DispatchNode {
    Branch {
        discriminator: Discriminator,
        /// Sorted by wire id
        arms: Vec<(u32, ClassId)>,
    },
    Message,
}

/// Per-version map from wire type fields to a concrete message class
#[derive(Debug, Clone)]
pub struct DispatchTable {
    version: ProtocolVersion,
    root: ClassId,
    nodes: HashMap<ClassId, DispatchNode>,
}

impl DispatchTable {
    pub fn build(schema: &Schema, version: ProtocolVersion) -> Result<Self, GenerateError> {
        let root = schema.message_root();
        let mut table = Self {
            version,
            root,
            nodes: HashMap::new(),
        };
        if !schema.class_in_version(root, version) {
            return Err(GenerateError::NotInVersion {
                class: schema.name(root).to_string(),
                version,
            });
        }
        table.add(schema, root)?;
        Ok(table)
    }

    fn add(&mut self, schema: &Schema, class: ClassId) -> Result<(), GenerateError> {
        let desc = schema.class(class);
        if !desc.is_abstract {
            self.nodes.insert(class, DispatchNode::Message);
            return Ok(());
        }

        let discriminator = desc
            .layout(self.version)
            .and_then(|layout| layout.discriminator)
            .ok_or_else(|| GenerateError::MissingDiscriminator {
                class: desc.name.to_string(),
                version: self.version,
            })?;

        let mut arms = Vec::new();
        for (subtype, wire_id) in schema.subtypes_at(class, self.version) {
            let Some(wire_id) = wire_id else {
                debug!(parent = %desc.name, subtype = %schema.name(subtype), version = %self.version, "no wire id, excluded from dispatch");
                continue;
            };
            if wire_id > wire::max_for_width(discriminator.width) {
                return Err(GenerateError::WireIdOverflow {
                    class: schema.name(subtype).to_string(),
                    wire_id,
                    width: discriminator.width,
                });
            }
            debug!(parent = %desc.name, subtype = %schema.name(subtype), wire_id, version = %self.version, "dispatch arm");
            arms.push((wire_id, subtype));
            self.add(schema, subtype)?;
        }

        arms.sort_by_key(|&(wire_id, _)| wire_id);
        if let Some(pair) = arms.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(GenerateError::DuplicateWireId {
                class: desc.name.to_string(),
                version: self.version,
                wire_id: pair[1].0,
            });
        }

        self.nodes.insert(
            class,
            DispatchNode::Branch {
                discriminator,
                arms,
            },
        );
        Ok(())
    }

    /// Concrete message class for `msg`, if its type fields map to one
    pub fn resolve(&self, msg: &[u8]) -> Option<ClassId> {
        let mut class = self.root;
        loop {
            match self.nodes.get(&class)? {
                DispatchNode::Message => return Some(class),
                DispatchNode::Branch {
                    discriminator,
                    arms,
                } => {
                    let value = wire::read_uint(msg, discriminator.offset, discriminator.width)?;
                    let i = arms.binary_search_by_key(&value, |&(wire_id, _)| wire_id).ok()?;
                    class = arms[i].1;
                }
            }
        }
    }

    /// Concrete message classes reachable by dispatch, in id order
    pub fn messages(&self) -> Vec<ClassId> {
        let mut messages: Vec<ClassId> = self
            .nodes
            .iter()
            .filter(|(_, node)| matches!(node, DispatchNode::Message))
            .map(|(&class, _)| class)
            .collect();
        messages.sort();
        messages
    }

    /// Wire-id arms below `class`, when it is a dispatching abstract class
    pub fn arms(&self, class: ClassId) -> Option<(&Discriminator, &[(u32, ClassId)])> {
        match self.nodes.get(&class)? {
            DispatchNode::Branch {
                discriminator,
                arms,
            } => Some((discriminator, arms)),
            DispatchNode::Message => None,
        }
    }

    pub fn root(&self) -> ClassId {
        self.root
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::OfHeader;
    use zerocopy::AsBytes;

    fn message(version: u8, msg_type: u8, body: &[u8]) -> Vec<u8> {
        let len = (OfHeader::SIZE + body.len()) as u16;
        let mut buf = OfHeader::new(version, msg_type, len, 1).as_bytes().to_vec();
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn test_resolve_by_version() {
        let schema = schema::openflow().unwrap();
        let v1 = DispatchTable::build(&schema, ProtocolVersion::Of10).unwrap();
        let v4 = DispatchTable::build(&schema, ProtocolVersion::Of13).unwrap();

        let barrier_v1 = message(1, 18, &[]);
        let barrier_v4 = message(4, 20, &[]);
        let request = schema.lookup("of_barrier_request");
        assert_eq!(v1.resolve(&barrier_v1), request);
        assert_eq!(v4.resolve(&barrier_v4), request);
        // Type 18 is not a barrier request in 1.3
        assert_ne!(v4.resolve(&message(4, 18, &[])), request);
    }

    #[test]
    fn test_nested_discriminators() {
        let schema = schema::openflow().unwrap();
        let v1 = DispatchTable::build(&schema, ProtocolVersion::Of10).unwrap();
        let v4 = DispatchTable::build(&schema, ProtocolVersion::Of13).unwrap();

        // flow_mod 1.0: command u16 at 56
        let mut body = vec![0u8; 64];
        body[48..50].copy_from_slice(&3u16.to_be_bytes());
        assert_eq!(
            v1.resolve(&message(1, 14, &body)),
            schema.lookup("of_flow_delete")
        );

        // experimenter -> bsn -> gentable_entry_add
        let mut body = vec![0u8; 28];
        body[0..4].copy_from_slice(&0x005c_16c7u32.to_be_bytes());
        body[4..8].copy_from_slice(&46u32.to_be_bytes());
        assert_eq!(
            v4.resolve(&message(4, 4, &body)),
            schema.lookup("of_bsn_gentable_entry_add")
        );

        // Unknown experimenter id
        body[0..4].copy_from_slice(&0x2320u32.to_be_bytes());
        assert_eq!(v4.resolve(&message(4, 4, &body)), None);
    }

    #[test]
    fn test_short_discriminator_does_not_resolve() {
        let schema = schema::openflow().unwrap();
        let v4 = DispatchTable::build(&schema, ProtocolVersion::Of13).unwrap();
        // stats reply with no room for stats_type
        assert_eq!(v4.resolve(&message(4, 19, &[])), None);
        assert_eq!(v4.resolve(&[]), None);
    }

    #[test]
    fn test_messages_are_concrete() {
        let schema = schema::openflow().unwrap();
        let v4 = DispatchTable::build(&schema, ProtocolVersion::Of13).unwrap();
        let messages = v4.messages();
        assert!(!messages.is_empty());
        for class in messages {
            assert!(schema.is_message(class));
            assert!(schema.class_in_version(class, ProtocolVersion::Of13));
        }
    }
}
