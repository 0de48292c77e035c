//! Schema assembly and consistency checks
//!
//! Turns [`ClassSpec`]s into an immutable [`Schema`]: resolves class names to
//! arena ids, expands inherited layouts, derives member variable-length flags
//! and subtype lists, and rejects documents the validator generator cannot
//! work with (dangling names, out-of-bounds members, nesting cycles).

use crate::class::{ClassDescriptor, ClassId, ClassLayout, MemberDescriptor, MemberType};
use crate::document::{ClassSpec, LayoutSpec, MemberSpec, SchemaDocument};
use crate::error::{SchemaError, SchemaResult};
use crate::model::Schema;
use crate::version::ProtocolVersion;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

type Layouts = BTreeMap<ProtocolVersion, ClassLayout>;

/// Incremental schema construction
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    message_root: String,
    classes: Vec<ClassSpec>,
}

impl SchemaBuilder {
    pub fn new(message_root: impl Into<String>) -> Self {
        Self {
            message_root: message_root.into(),
            classes: Vec::new(),
        }
    }

    pub fn from_document(doc: SchemaDocument) -> Self {
        Self {
            message_root: doc.message_root,
            classes: doc.classes,
        }
    }

    pub fn class(mut self, spec: ClassSpec) -> Self {
        self.classes.push(spec);
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        let mut by_name: HashMap<Arc<str>, ClassId> = HashMap::with_capacity(self.classes.len());
        let mut names: Vec<Arc<str>> = Vec::with_capacity(self.classes.len());
        for (idx, spec) in self.classes.iter().enumerate() {
            let name: Arc<str> = Arc::from(spec.name.as_str());
            if by_name.insert(name.clone(), ClassId(idx as u32)).is_some() {
                return Err(SchemaError::DuplicateClass {
                    name: spec.name.clone(),
                });
            }
            names.push(name);
        }

        let resolver = Resolver {
            specs: &self.classes,
            by_name: &by_name,
        };

        let mut parents = Vec::with_capacity(self.classes.len());
        let mut elements = Vec::with_capacity(self.classes.len());
        for spec in &self.classes {
            parents.push(match &spec.parent {
                Some(p) => Some(resolver.resolve(p, &spec.name)?),
                None => None,
            });
            elements.push(match &spec.list_of {
                Some(e) => Some(resolver.resolve(e, &spec.name)?),
                None => None,
            });
        }

        let mut cache: Vec<Option<Layouts>> = vec![None; self.classes.len()];
        let mut visiting = Vec::new();
        for idx in 0..self.classes.len() {
            resolver.layouts_for(idx, &parents, &elements, &mut cache, &mut visiting)?;
        }
        let mut layouts: Vec<Layouts> = cache.into_iter().map(Option::unwrap_or_default).collect();

        derive_member_flags(&self.classes, &mut layouts)?;
        check_layouts(&self.classes, &layouts, &elements)?;
        check_acyclic(&names, &layouts, &elements, &parents)?;

        let mut subtypes: Vec<Vec<ClassId>> = vec![Vec::new(); self.classes.len()];
        for (idx, parent) in parents.iter().enumerate() {
            if let Some(p) = parent {
                subtypes[p.index()].push(ClassId(idx as u32));
            }
        }

        let message_root = resolver.resolve(&self.message_root, "message_root")?;
        if !self.classes[message_root.index()].is_abstract {
            return Err(SchemaError::InvalidMessageRoot {
                name: self.message_root,
            });
        }

        let classes: Vec<ClassDescriptor> = self
            .classes
            .iter()
            .zip(layouts)
            .zip(subtypes)
            .enumerate()
            .map(|(idx, ((spec, layouts), subtypes))| ClassDescriptor {
                id: ClassId(idx as u32),
                name: names[idx].clone(),
                parent: parents[idx],
                is_abstract: spec.is_abstract,
                list_element: elements[idx],
                encoding: spec.encoding,
                layouts,
                subtypes,
            })
            .collect();

        debug!(classes = classes.len(), root = %self.message_root, "schema built");

        Ok(Schema {
            classes,
            by_name,
            message_root,
        })
    }
}

struct Resolver<'a> {
    specs: &'a [ClassSpec],
    by_name: &'a HashMap<Arc<str>, ClassId>,
}

impl Resolver<'_> {
    fn resolve(&self, name: &str, referenced_by: &str) -> SchemaResult<ClassId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownClass {
                name: name.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    }

    /// Fill `cache[idx]`, expanding parents and list elements first
    fn layouts_for(
        &self,
        idx: usize,
        parents: &[Option<ClassId>],
        elements: &[Option<ClassId>],
        cache: &mut [Option<Layouts>],
        visiting: &mut Vec<usize>,
    ) -> SchemaResult<()> {
        if cache[idx].is_some() {
            return Ok(());
        }
        if let Some(pos) = visiting.iter().position(|&v| v == idx) {
            let mut path: Vec<&str> = visiting[pos..]
                .iter()
                .map(|&v| self.specs[v].name.as_str())
                .collect();
            path.push(&self.specs[idx].name);
            return Err(SchemaError::Cycle {
                path: path.join(" -> "),
            });
        }
        visiting.push(idx);

        let spec = &self.specs[idx];
        let mut layouts = Layouts::new();
        for layout in &spec.layouts {
            for &byte in &layout.versions {
                let version = parse_version(byte, &spec.name)?;
                let built = self.declared_layout(spec, layout)?;
                if layouts.insert(version, built).is_some() {
                    return Err(SchemaError::DuplicateLayout {
                        class: spec.name.clone(),
                        version: byte,
                    });
                }
            }
        }

        if spec.inherit {
            let parent = parents[idx].ok_or_else(|| SchemaError::InheritWithoutParent {
                class: spec.name.clone(),
            })?;
            self.layouts_for(parent.index(), parents, elements, cache, visiting)?;
            let parent_layouts = cache[parent.index()].clone().unwrap_or_default();
            let versions = match &spec.versions {
                Some(bytes) => bytes
                    .iter()
                    .map(|&b| parse_version(b, &spec.name))
                    .collect::<SchemaResult<Vec<_>>>()?,
                None => parent_layouts.keys().copied().collect(),
            };
            for version in versions {
                if layouts.contains_key(&version) {
                    continue;
                }
                let inherited = parent_layouts.get(&version).ok_or_else(|| {
                    SchemaError::MissingParentLayout {
                        class: spec.name.clone(),
                        parent: self.specs[parent.index()].name.clone(),
                        version: version.wire(),
                    }
                })?;
                layouts.insert(
                    version,
                    ClassLayout {
                        wire_id: spec.wire_id,
                        discriminator: None,
                        ..inherited.clone()
                    },
                );
            }
        }

        if let Some(element) = elements[idx] {
            let versions = match &spec.versions {
                Some(bytes) => bytes
                    .iter()
                    .map(|&b| parse_version(b, &spec.name))
                    .collect::<SchemaResult<Vec<_>>>()?,
                None => {
                    self.layouts_for(element.index(), parents, elements, cache, visiting)?;
                    cache[element.index()]
                        .as_ref()
                        .map(|l| l.keys().copied().collect())
                        .unwrap_or_default()
                }
            };
            for version in versions {
                layouts.entry(version).or_insert_with(|| ClassLayout {
                    base_length: 0,
                    variable_length: true,
                    wire_id: None,
                    discriminator: None,
                    members: Vec::new(),
                });
            }
            for layout in layouts.values_mut() {
                layout.variable_length = true;
            }
        }

        visiting.pop();
        cache[idx] = Some(layouts);
        Ok(())
    }

    fn declared_layout(&self, spec: &ClassSpec, layout: &LayoutSpec) -> SchemaResult<ClassLayout> {
        let members = layout
            .members
            .iter()
            .map(|m| {
                Ok(MemberDescriptor {
                    name: Arc::from(m.name.as_str()),
                    ty: self.member_type(m, &spec.name)?,
                    offset: m.offset,
                    variable_length: false,
                })
            })
            .collect::<SchemaResult<Vec<_>>>()?;

        Ok(ClassLayout {
            base_length: layout.base_length,
            variable_length: layout.variable_length,
            wire_id: layout.wire_id.or(spec.wire_id),
            discriminator: layout.discriminator,
            members,
        })
    }

    fn member_type(&self, member: &MemberSpec, class: &str) -> SchemaResult<MemberType> {
        let ty = match member.ty.as_str() {
            "u8" => MemberType::Scalar { width: 1 },
            "u16" => MemberType::Scalar { width: 2 },
            "u32" | "ipv4" => MemberType::Scalar { width: 4 },
            "u64" => MemberType::Scalar { width: 8 },
            "u128" | "ipv6" => MemberType::Scalar { width: 16 },
            "mac" => MemberType::Scalar { width: 6 },
            "pad" => MemberType::Pad {
                len: member.len.unwrap_or(1),
            },
            "octets" => MemberType::Opaque,
            other => MemberType::Object(self.resolve(other, &format!("{class}.{}", member.name))?),
        };
        Ok(ty)
    }
}

fn parse_version(byte: u8, class: &str) -> SchemaResult<ProtocolVersion> {
    ProtocolVersion::try_from(byte).map_err(|_| SchemaError::UnknownVersion {
        version: byte,
        class: class.to_string(),
    })
}

/// Set `variable_length` on object members from their target's layout
fn derive_member_flags(specs: &[ClassSpec], layouts: &mut [Layouts]) -> SchemaResult<()> {
    let shape: HashMap<(usize, ProtocolVersion), bool> = layouts
        .iter()
        .enumerate()
        .flat_map(|(idx, l)| l.iter().map(move |(v, layout)| ((idx, *v), layout.variable_length)))
        .collect();

    for (idx, class_layouts) in layouts.iter_mut().enumerate() {
        for (&version, layout) in class_layouts.iter_mut() {
            let fixed_owner = !layout.variable_length;
            for member in &mut layout.members {
                let MemberType::Object(target) = member.ty else {
                    continue;
                };
                let variable = shape.get(&(target.index(), version)).copied().ok_or_else(|| {
                    SchemaError::MissingTarget {
                        class: specs[idx].name.clone(),
                        target: specs[target.index()].name.clone(),
                        version: version.wire(),
                    }
                })?;
                if variable && fixed_owner {
                    return Err(SchemaError::FixedClassWithVariableMember {
                        class: specs[idx].name.clone(),
                        member: member.name.to_string(),
                        version: version.wire(),
                    });
                }
                member.variable_length = variable;
            }
        }
    }
    Ok(())
}

fn check_layouts(
    specs: &[ClassSpec],
    layouts: &[Layouts],
    elements: &[Option<ClassId>],
) -> SchemaResult<()> {
    for (idx, class_layouts) in layouts.iter().enumerate() {
        let class = &specs[idx].name;
        for (&version, layout) in class_layouts {
            if let Some(d) = layout.discriminator {
                if !matches!(d.width, 1 | 2 | 4) {
                    return Err(SchemaError::InvalidDiscriminator {
                        class: class.clone(),
                        version: version.wire(),
                        width: d.width,
                    });
                }
                if !d.end().is_some_and(|end| end <= layout.base_length) {
                    return Err(SchemaError::DiscriminatorOutOfBounds {
                        class: class.clone(),
                        version: version.wire(),
                        offset: d.offset,
                        base_length: layout.base_length,
                    });
                }
            }

            for member in &layout.members {
                let footprint = match member.ty {
                    MemberType::Scalar { width } => width,
                    MemberType::Pad { len } => len,
                    MemberType::Opaque => 0,
                    MemberType::Object(_) if member.variable_length => 0,
                    MemberType::Object(target) => layouts[target.index()]
                        .get(&version)
                        .map(|l| l.base_length)
                        .unwrap_or(0),
                };
                let end = member.offset.checked_add(footprint);
                if !end.is_some_and(|end| end <= layout.base_length) {
                    return Err(SchemaError::MemberOutOfBounds {
                        class: class.clone(),
                        member: member.name.to_string(),
                        version: version.wire(),
                        end,
                        base_length: layout.base_length,
                    });
                }
            }

            if let Some(element) = elements[idx] {
                if !layouts[element.index()].contains_key(&version) {
                    return Err(SchemaError::MissingElement {
                        class: class.clone(),
                        element: specs[element.index()].name.clone(),
                        version: version.wire(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Nesting must terminate: members, list elements and subtypes form a DAG
fn check_acyclic(
    names: &[Arc<str>],
    layouts: &[Layouts],
    elements: &[Option<ClassId>],
    parents: &[Option<ClassId>],
) -> SchemaResult<()> {
    let n = names.len();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    for idx in 0..n {
        for layout in layouts[idx].values() {
            edges[idx].extend(layout.members.iter().filter_map(|m| m.object()).map(ClassId::index));
        }
        if let Some(element) = elements[idx] {
            edges[idx].push(element.index());
        }
        if let Some(parent) = parents[idx] {
            edges[parent.index()].push(idx);
        }
    }
    for list in &mut edges {
        list.sort_unstable();
        list.dedup();
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }

    let mut marks = vec![Mark::New; n];
    for start in 0..n {
        if marks[start] != Mark::New {
            continue;
        }
        // (node, next edge index)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::Active;
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&child) = edges[node].get(top.1) {
                top.1 += 1;
                match marks[child] {
                    Mark::New => {
                        marks[child] = Mark::Active;
                        stack.push((child, 0));
                    }
                    Mark::Active => {
                        let pos = stack.iter().position(|&(v, _)| v == child).unwrap_or(0);
                        let mut path: Vec<&str> =
                            stack[pos..].iter().map(|&(v, _)| &*names[v]).collect();
                        path.push(&names[child]);
                        return Err(SchemaError::Cycle {
                            path: path.join(" -> "),
                        });
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{Discriminator, ElementEncoding};

    fn layout(versions: &[u8], base_length: usize, members: Vec<MemberSpec>) -> LayoutSpec {
        LayoutSpec {
            versions: versions.to_vec(),
            base_length,
            members,
            ..Default::default()
        }
    }

    fn root() -> ClassSpec {
        ClassSpec {
            name: "hdr".into(),
            is_abstract: true,
            layouts: vec![LayoutSpec {
                discriminator: Some(Discriminator { offset: 1, width: 1 }),
                ..layout(&[1, 4], 8, vec![MemberSpec::new("length", 2, "u16")])
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_inherited_layouts_take_child_wire_id() {
        let schema = SchemaBuilder::new("hdr")
            .class(root())
            .class(ClassSpec {
                name: "ping".into(),
                parent: Some("hdr".into()),
                inherit: true,
                wire_id: Some(2),
                ..Default::default()
            })
            .build()
            .unwrap();

        let ping = schema.lookup("ping").unwrap();
        let layout = schema.layout(ping, ProtocolVersion::Of13).unwrap();
        assert_eq!(layout.base_length, 8);
        assert_eq!(layout.wire_id, Some(2));
        assert!(layout.discriminator.is_none());
        assert!(schema.is_message(ping));
        assert!(!schema.is_message(schema.message_root()));
        assert_eq!(schema.class(schema.message_root()).subtypes(), &[ping]);
    }

    #[test]
    fn test_list_takes_element_versions_and_member_flags() {
        let schema = SchemaBuilder::new("hdr")
            .class(root())
            .class(ClassSpec {
                name: "tlv".into(),
                is_abstract: true,
                encoding: Some(ElementEncoding::Tlv16),
                layouts: vec![LayoutSpec {
                    variable_length: true,
                    ..layout(&[4], 4, vec![])
                }],
                ..Default::default()
            })
            .class(ClassSpec {
                name: "list_tlv".into(),
                list_of: Some("tlv".into()),
                ..Default::default()
            })
            .class(ClassSpec {
                name: "carrier".into(),
                parent: Some("hdr".into()),
                wire_id: Some(9),
                layouts: vec![LayoutSpec {
                    variable_length: true,
                    ..layout(&[4], 8, vec![MemberSpec::new("items", 8, "list_tlv")])
                }],
                ..Default::default()
            })
            .build()
            .unwrap();

        let list = schema.lookup("list_tlv").unwrap();
        assert!(schema.class(list).is_list());
        assert!(schema.class_in_version(list, ProtocolVersion::Of13));
        assert!(!schema.class_in_version(list, ProtocolVersion::Of10));
        assert!(schema.is_var_len(list, ProtocolVersion::Of13));

        let carrier = schema.lookup("carrier").unwrap();
        let member = &schema.layout(carrier, ProtocolVersion::Of13).unwrap().members[0];
        assert!(member.variable_length);
        assert_eq!(member.object(), Some(list));
    }

    #[test]
    fn test_rejects_dangling_and_duplicate_names() {
        let err = SchemaBuilder::new("hdr")
            .class(root())
            .class(ClassSpec {
                name: "x".into(),
                layouts: vec![layout(&[1], 4, vec![MemberSpec::new("m", 0, "nope")])],
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownClass { ref name, .. } if name == "nope"));

        let err = SchemaBuilder::new("hdr")
            .class(root())
            .class(root())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateClass { .. }));
    }

    #[test]
    fn test_rejects_member_past_base_length() {
        let err = SchemaBuilder::new("hdr")
            .class(root())
            .class(ClassSpec {
                name: "x".into(),
                layouts: vec![layout(&[1], 4, vec![MemberSpec::new("v", 2, "u32")])],
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::MemberOutOfBounds { end: Some(6), base_length: 4, .. }));
    }

    #[test]
    fn test_rejects_bad_discriminator_and_version() {
        let mut bad = root();
        bad.layouts[0].discriminator = Some(Discriminator { offset: 1, width: 3 });
        let err = SchemaBuilder::new("hdr").class(bad).build().unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDiscriminator { width: 3, .. }));

        let mut bad = root();
        bad.layouts[0].discriminator = Some(Discriminator { offset: 7, width: 2 });
        let err = SchemaBuilder::new("hdr").class(bad).build().unwrap_err();
        assert!(matches!(err, SchemaError::DiscriminatorOutOfBounds { offset: 7, .. }));

        let mut bad = root();
        bad.layouts[0].versions = vec![7];
        let err = SchemaBuilder::new("hdr").class(bad).build().unwrap_err();
        assert!(matches!(err, SchemaError::UnknownVersion { version: 7, .. }));
    }

    #[test]
    fn test_rejects_target_missing_at_version() {
        let err = SchemaBuilder::new("hdr")
            .class(root())
            .class(ClassSpec {
                name: "inner".into(),
                layouts: vec![layout(&[4], 4, vec![])],
                ..Default::default()
            })
            .class(ClassSpec {
                name: "outer".into(),
                layouts: vec![layout(&[1, 4], 4, vec![MemberSpec::new("i", 0, "inner")])],
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingTarget { version: 1, .. }));
    }

    #[test]
    fn test_rejects_nesting_cycle() {
        let err = SchemaBuilder::new("hdr")
            .class(root())
            .class(ClassSpec {
                name: "a".into(),
                layouts: vec![LayoutSpec {
                    variable_length: true,
                    ..layout(&[4], 4, vec![MemberSpec::new("b", 4, "list_a")])
                }],
                ..Default::default()
            })
            .class(ClassSpec {
                name: "list_a".into(),
                list_of: Some("a".into()),
                ..Default::default()
            })
            .build()
            .unwrap_err();
        match err {
            SchemaError::Cycle { path } => {
                assert!(path.contains("a -> list_a -> a") || path.contains("list_a -> a -> list_a"))
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_message_root_must_be_abstract() {
        let mut concrete = root();
        concrete.is_abstract = false;
        let err = SchemaBuilder::new("hdr").class(concrete).build().unwrap_err();
        assert!(matches!(err, SchemaError::InvalidMessageRoot { .. }));
    }
}
