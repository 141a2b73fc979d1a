//! Hierarchical composition
//!
//! A component is composite when its type names a definition in the
//! [`Domain`] or when it carries inline children. Composite components are
//! built first, bottom-up, from the primitive candidates not yet claimed by
//! an earlier sibling. Each result is converted into an ordinary
//! [`Candidate`] and joins the pool the enclosing definition is built from.
//!
//! Every composite slot is built exactly once: the candidates it claims are
//! removed from what later siblings see, so no two slots are offered the
//! same primitives.

use std::borrow::Cow;
use std::collections::HashSet;

use crate::error::{BuildError, DefinitionError, FailureReason, ShapeBuildFailure};
use crate::model::{BuiltShape, Candidate, CandidateId, ComponentDefinition, Domain, ShapeDefinition};

use super::budget::Deadline;
use super::ShapeBuilder;

pub(crate) struct Composer<'a> {
    builder: &'a ShapeBuilder,
    domain: &'a Domain,
    deadline: Deadline,
    /// Definitions currently being composed, outermost first
    resolving: Vec<String>,
}

impl<'a> Composer<'a> {
    pub fn new(builder: &'a ShapeBuilder, domain: &'a Domain, deadline: Deadline) -> Self {
        Self {
            builder,
            domain,
            deadline,
            resolving: Vec::new(),
        }
    }

    pub fn build(mut self, pool: &[Candidate], definition: &ShapeDefinition) -> Result<BuiltShape, BuildError> {
        self.compose(definition, pool, "")
    }

    fn compose(
        &mut self,
        definition: &ShapeDefinition,
        pool: &[Candidate],
        path: &str,
    ) -> Result<BuiltShape, BuildError> {
        if self
            .resolving
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&definition.name))
        {
            let mut cycle = self.resolving.clone();
            cycle.push(definition.name.clone());
            return Err(DefinitionError::circular(cycle).into());
        }

        self.resolving.push(definition.name.clone());
        let result = self.compose_level(definition, pool, path);
        self.resolving.pop();
        result
    }

    fn compose_level(
        &mut self,
        definition: &ShapeDefinition,
        pool: &[Candidate],
        path: &str,
    ) -> Result<BuiltShape, BuildError> {
        let mut claimed: HashSet<CandidateId> = HashSet::new();
        let mut built = Vec::new();

        for component in &definition.components {
            let Some(sub_definition) = self.sub_definition(component) else {
                continue;
            };
            let key = if path.is_empty() {
                component.name.clone()
            } else {
                format!("{}.{}", path, component.name)
            };

            self.deadline.check(&definition.name)?;
            let primitives: Vec<Candidate> = pool
                .iter()
                .filter(|c| !claimed.contains(&c.id) && !self.domain.contains(&c.label))
                .cloned()
                .collect();

            match self.compose(&sub_definition, &primitives, &key) {
                Ok(shape) => {
                    claimed.extend(shape.sub_shapes.iter().map(|c| c.id));
                    let candidate = shape.into_candidate();
                    log::debug!("built sub-component {} as {}", key, candidate);
                    built.push(candidate);
                }
                Err(err) if err.is_timeout() => return Err(err),
                Err(BuildError::Failed(inner)) => {
                    let match_tags = self.builder.config().match_type_tags;
                    if pool.iter().any(|c| c.has_type(&component.shape_type, match_tags)) {
                        log::debug!(
                            "could not build {} ({}), using a prebuilt {} from the pool",
                            key,
                            inner.reason,
                            component.shape_type
                        );
                        continue;
                    }
                    let failure = ShapeBuildFailure::new(
                        &definition.name,
                        FailureReason::MissingComponent,
                        format!("could not build '{}': {}", component.name, inner.message),
                    )
                    .with_component(&component.name);
                    return Err(failure.into());
                }
                Err(other) => return Err(other),
            }
        }

        let level_pool: Vec<Candidate> = pool
            .iter()
            .filter(|c| !claimed.contains(&c.id))
            .cloned()
            .chain(built)
            .collect();
        self.builder.build_with_deadline(&level_pool, definition, self.deadline)
    }

    /// The definition a composite component is built from
    fn sub_definition(&self, component: &ComponentDefinition) -> Option<Cow<'a, ShapeDefinition>> {
        if !component.children.is_empty() {
            let inline = component
                .children
                .iter()
                .cloned()
                .fold(ShapeDefinition::new(&component.shape_type), |def, child| {
                    def.with_component(child)
                });
            return Some(Cow::Owned(inline));
        }
        let domain: &'a Domain = self.domain;
        domain.get(&component.shape_type).map(Cow::Borrowed)
    }
}
