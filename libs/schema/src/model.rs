//! Immutable schema model
//!
//! A [`Schema`] is an arena of [`ClassDescriptor`]s addressed by [`ClassId`].
//! It is built once, wrapped in an `Arc`, and borrowed read-only by every
//! validator generator and by the generated validators themselves.

use crate::class::{ClassDescriptor, ClassId, ClassLayout};
use crate::version::ProtocolVersion;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Class metadata for every supported protocol version
#[derive(Debug)]
pub struct Schema {
    pub(crate) classes: Vec<ClassDescriptor>,
    pub(crate) by_name: HashMap<Arc<str>, ClassId>,
    pub(crate) message_root: ClassId,
}

impl Schema {
    /// Descriptor for `id`; ids are only valid for the schema that issued them
    pub fn class(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.index()]
    }

    /// Checked form of [`Schema::class`]
    pub fn get(&self, id: ClassId) -> Option<&ClassDescriptor> {
        self.classes.get(id.index())
    }

    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: ClassId) -> &Arc<str> {
        &self.class(id).name
    }

    /// All classes in declaration order
    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> + '_ {
        self.classes.iter()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Abstract class every message descends from
    pub fn message_root(&self) -> ClassId {
        self.message_root
    }

    /// Versions defined by at least one class
    pub fn versions(&self) -> BTreeSet<ProtocolVersion> {
        self.classes.iter().flat_map(|c| c.versions()).collect()
    }

    pub fn layout(&self, id: ClassId, version: ProtocolVersion) -> Option<&ClassLayout> {
        self.class(id).layout(version)
    }

    pub fn class_in_version(&self, id: ClassId, version: ProtocolVersion) -> bool {
        self.class(id).in_version(version)
    }

    pub fn base_length(&self, id: ClassId, version: ProtocolVersion) -> Option<usize> {
        self.class(id).base_length(version)
    }

    /// Whether the encoded size of `id` varies at `version`
    pub fn is_var_len(&self, id: ClassId, version: ProtocolVersion) -> bool {
        self.layout(id, version)
            .map(|l| l.variable_length)
            .unwrap_or(false)
    }

    /// True when `ancestor` is `id` or one of its parents
    pub fn descends_from(&self, id: ClassId, ancestor: ClassId) -> bool {
        let mut current = Some(id);
        while let Some(cls) = current {
            if cls == ancestor {
                return true;
            }
            current = self.class(cls).parent;
        }
        false
    }

    /// Concrete classes below the message root
    pub fn is_message(&self, id: ClassId) -> bool {
        !self.class(id).is_abstract && self.descends_from(id, self.message_root)
    }

    /// Non-abstract classes present at `version`, in declaration order
    pub fn concrete_classes(
        &self,
        version: ProtocolVersion,
    ) -> impl Iterator<Item = &ClassDescriptor> + '_ {
        self.classes
            .iter()
            .filter(move |c| !c.is_abstract && c.in_version(version))
    }

    /// Direct subtypes of `id` present at `version`, with their wire id
    pub fn subtypes_at(
        &self,
        id: ClassId,
        version: ProtocolVersion,
    ) -> impl Iterator<Item = (ClassId, Option<u32>)> + '_ {
        self.class(id).subtypes().iter().filter_map(move |&sub| {
            self.layout(sub, version).map(|layout| (sub, layout.wire_id))
        })
    }
}
