//! Per-version assembly
//!
//! Generates a plan for every concrete class present at a version, orders
//! them so each plan comes after everything it calls into, and builds the
//! version's message dispatch table.

use super::dispatch::DispatchTable;
use crate::error::GenerateError;
use crate::generator::{self, Plan};
use schema::{ClassId, ProtocolVersion, Schema};
use std::sync::Arc;
use tracing::{debug, info};

/// All validators for one protocol version
#[derive(Debug)]
pub struct VersionValidators {
    pub(crate) version: ProtocolVersion,
    pub(crate) schema: Arc<Schema>,
    /// Indexed by `ClassId`; `None` for abstract classes and classes absent at this version
    pub(crate) plans: Vec<Option<Plan>>,
    pub(crate) order: Vec<ClassId>,
    pub(crate) dispatch: DispatchTable,
}

impl VersionValidators {
    pub fn assemble(schema: Arc<Schema>, version: ProtocolVersion) -> Result<Self, GenerateError> {
        let mut plans: Vec<Option<Plan>> = vec![None; schema.len()];
        for class in schema.concrete_classes(version) {
            let plan = generator::generate(&schema, class.id, version)?;
            debug!(class = %class.name, %version, "generated validator");
            plans[class.id.index()] = Some(plan);
        }

        let order = dependency_order(&schema, &plans, version)?;
        let dispatch = DispatchTable::build(&schema, version)?;

        info!(
            %version,
            validators = order.len(),
            messages = dispatch.messages().len(),
            "assembled validators"
        );

        Ok(Self {
            version,
            schema,
            plans,
            order,
            dispatch,
        })
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn plan(&self, class: ClassId) -> Option<&Plan> {
        self.plans.get(class.index()).and_then(Option::as_ref)
    }

    /// Plan for a class by name
    pub fn plan_named(&self, name: &str) -> Option<&Plan> {
        self.schema.lookup(name).and_then(|class| self.plan(class))
    }

    /// Plans in dependency order: every plan follows the plans it calls
    pub fn plans(&self) -> impl Iterator<Item = &Plan> + '_ {
        self.order.iter().filter_map(|&class| self.plan(class))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Post-order walk over plan dependencies, roots taken in declaration order
fn dependency_order(
    schema: &Schema,
    plans: &[Option<Plan>],
    version: ProtocolVersion,
) -> Result<Vec<ClassId>, GenerateError> {
    let mut marks = vec![Mark::Unvisited; plans.len()];
    let mut order = Vec::new();
    let mut path = Vec::new();

    for plan in plans.iter().flatten() {
        visit(schema, plans, version, plan.class(), &mut marks, &mut path, &mut order)?;
    }
    Ok(order)
}

fn visit(
    schema: &Schema,
    plans: &[Option<Plan>],
    version: ProtocolVersion,
    class: ClassId,
    marks: &mut [Mark],
    path: &mut Vec<ClassId>,
    order: &mut Vec<ClassId>,
) -> Result<(), GenerateError> {
    match marks[class.index()] {
        Mark::Done => return Ok(()),
        Mark::InProgress => {
            let start = path.iter().position(|&c| c == class).unwrap_or(0);
            let names: Vec<&str> = path[start..]
                .iter()
                .chain(std::iter::once(&class))
                .map(|&c| &**schema.name(c))
                .collect();
            return Err(GenerateError::DependencyCycle {
                version,
                path: names.join(" -> "),
            });
        }
        Mark::Unvisited => {}
    }

    let Some(plan) = &plans[class.index()] else {
        let parent = path.last().map(|&c| schema.name(c).to_string()).unwrap_or_default();
        return Err(GenerateError::MissingDependency {
            class: parent,
            dependency: schema.name(class).to_string(),
            version,
        });
    };

    marks[class.index()] = Mark::InProgress;
    path.push(class);
    for dependency in plan.dependencies() {
        visit(schema, plans, version, dependency, marks, path, order)?;
    }
    path.pop();
    marks[class.index()] = Mark::Done;
    order.push(class);
    Ok(())
}
