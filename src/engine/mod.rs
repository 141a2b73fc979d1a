//! Shape assembly engine
//!
//! A build attempt runs in four steps:
//!
//! 1. **Preconditions**: validate the definition, instantiate its
//!    constraints, check the pool size and the per-type counts
//! 2. **Assignment**: either [`Strategy::Greedy`], which works from the
//!    confidence graph, or [`Strategy::Exhaustive`], which scores complete
//!    permutations
//! 3. **Aggregation**: turn per-component confidences into one shape
//!    confidence
//! 4. **Result**: a [`BuiltShape`] carrying the definition's attributes
//!
//! All per-attempt state lives in a [`BuildAttempt`] created for that attempt,
//! so one [`ShapeBuilder`] can serve any number of sequential or concurrent
//! builds.

pub mod aggregate;
pub mod budget;
pub mod compose;
pub mod exhaustive;
pub mod graph;
pub mod greedy;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::config::BuilderConfig;
use crate::constrainable::adapt_part;
use crate::constraint::{evaluate, Constraint, ConstraintRegistry};
use crate::debug::DebugShapeSet;
use crate::error::{AdapterError, BuildError, DefinitionError, ShapeBuildFailure};
use crate::model::{BuiltShape, Candidate, ComponentDefinition, Domain, ShapeDefinition};

use budget::{Deadline, SearchBudget};
use graph::{ComponentScores, ConfidenceGraph};

/// Assignment search strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Best unclaimed candidate per component, no backtracking
    Greedy,
    /// Complete search over type-compatible permutations
    #[default]
    Exhaustive,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Greedy => f.write_str("greedy"),
            Strategy::Exhaustive => f.write_str("exhaustive"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greedy" => Ok(Strategy::Greedy),
            "exhaustive" => Ok(Strategy::Exhaustive),
            other => Err(format!("unknown strategy '{}' (expected greedy or exhaustive)", other)),
        }
    }
}

/// Pool indices chosen per component, with each component's confidence
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Assignment {
    pub candidates: Vec<usize>,
    pub confidences: Vec<f64>,
}

impl Assignment {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(n),
            confidences: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, candidate: usize, confidence: f64) {
        self.candidates.push(candidate);
        self.confidences.push(confidence);
    }
}

/// State scoped to a single build attempt
pub(crate) struct BuildAttempt<'a> {
    pub definition: &'a ShapeDefinition,
    pub pool: &'a [Candidate],
    pub config: &'a BuilderConfig,
    pub deadline: Deadline,
    /// Verbose logging requested for this definition
    pub debug: bool,
    /// Evaluators, parallel to `definition.constraints`
    constraints: Vec<Box<dyn Constraint>>,
    /// Component index of every constraint parameter
    slots: Vec<Vec<usize>>,
}

impl<'a> BuildAttempt<'a> {
    fn new(
        builder: &'a ShapeBuilder,
        pool: &'a [Candidate],
        definition: &'a ShapeDefinition,
        deadline: Deadline,
    ) -> Result<Self, BuildError> {
        definition.validate()?;

        let mut constraints = Vec::with_capacity(definition.constraints.len());
        let mut slots = Vec::with_capacity(definition.constraints.len());
        for constraint in &definition.constraints {
            constraints.push(builder.registry.create(constraint)?);
            let indices = constraint
                .parameters
                .iter()
                .map(|p| {
                    definition.component_index(&p.component).ok_or_else(|| {
                        DefinitionError::unknown_component(
                            &definition.name,
                            &constraint.name,
                            &p.component,
                            Vec::new(),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            slots.push(indices);
        }

        Ok(Self {
            definition,
            pool,
            config: &builder.config,
            deadline,
            debug: builder.debug_shapes.contains(&definition.name),
            constraints,
            slots,
        })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn check_time(&self) -> Result<(), ShapeBuildFailure> {
        self.deadline.check(self.name())
    }

    /// Component indices referenced by constraint `j`, in parameter order
    pub fn parameter_slots(&self, j: usize) -> &[usize] {
        &self.slots[j]
    }

    /// The component playing parameter `p` of constraint `j`
    pub fn component_of(&self, j: usize, p: usize) -> &'a ComponentDefinition {
        &self.definition.components[self.slots[j][p]]
    }

    /// Whether a candidate may fill a component
    pub fn slot_matches(&self, candidate: &Candidate, component: &ComponentDefinition) -> bool {
        candidate.has_type(&component.shape_type, self.config.match_type_tags)
    }

    /// Confidence of constraint `j` with `args` in parameter order
    ///
    /// A unary result the constraint flags as clearly false counts as zero.
    pub fn confidence(&self, j: usize, args: &[&Candidate]) -> Result<f64, AdapterError> {
        let parameters = &self.definition.constraints[j].parameters;
        let adapted = args
            .iter()
            .zip(parameters)
            .map(|(candidate, param)| adapt_part(candidate, param.sub_part))
            .collect::<Result<Vec<_>, _>>()?;

        let constraint = self.constraints[j].as_ref();
        let value = evaluate(constraint, &adapted);
        if adapted.len() == 1 && constraint.is_clearly_false(value) {
            return Ok(0.0);
        }
        Ok(value)
    }

    pub fn trace_pairing(&self, j: usize, args: &[&Candidate], value: f64) {
        if !self.debug && !log::log_enabled!(log::Level::Trace) {
            return;
        }
        let names: Vec<String> = args.iter().map(|c| c.to_string()).collect();
        if self.debug {
            log::debug!(
                "[{}] {} on {} = {:.3}",
                self.name(),
                self.definition.constraints[j],
                names.join(", "),
                value
            );
        } else {
            log::trace!("{} on {} = {:.3}", self.definition.constraints[j], names.join(", "), value);
        }
    }

    /// Pool-level preconditions shared by both strategies
    fn check_pool(&self) -> Result<(), ShapeBuildFailure> {
        let need = self.definition.num_components();
        if self.pool.len() < need {
            return Err(ShapeBuildFailure::not_enough_components(
                self.name(),
                self.pool.len(),
                need,
            ));
        }

        for (shape_type, required) in self.definition.type_counts() {
            let have = self
                .pool
                .iter()
                .filter(|c| c.has_type(&shape_type, self.config.match_type_tags))
                .count();
            if have < required {
                return Err(ShapeBuildFailure::missing_type(self.name(), &shape_type, have, required));
            }
        }
        Ok(())
    }

    /// Log a failure report for debug shapes
    pub fn report_failure(&self, failure: &ShapeBuildFailure) {
        if !self.debug {
            return;
        }
        log::debug!("***** report on building shape {} *****", self.name());
        log::debug!("reason: {}", failure.reason);
        if let Some(component) = &failure.component {
            log::debug!("failing component: {}", component);
        }
        if let Some(constraint) = &failure.constraint {
            log::debug!("failing constraint: {}", constraint);
        }
        log::debug!("{}", failure.message);
    }

    fn log_pool(&self) {
        if !self.debug {
            return;
        }
        let entries: Vec<String> = self.pool.iter().map(|c| c.to_string()).collect();
        log::debug!(
            "[{}] pool ({}): {}",
            self.name(),
            self.pool.len(),
            entries.join(", ")
        );
    }

    /// Assemble the result from an assignment
    fn finish(&self, assignment: &Assignment) -> BuiltShape {
        let breakdown = aggregate::aggregate(
            &assignment.confidences,
            assignment.candidates.len(),
            self.pool.len(),
            self.config,
        );
        if self.debug {
            log::debug!("[{}] confidence {:?}", self.name(), breakdown);
        }

        let mut attributes = self.definition.attributes.clone();
        for tag in &self.definition.is_a {
            attributes.insert(tag.clone(), "true".to_string());
        }

        let sub_shapes: Vec<Candidate> = assignment
            .candidates
            .iter()
            .map(|&i| self.pool[i].clone())
            .collect();
        let component_map = self
            .definition
            .components
            .iter()
            .zip(&sub_shapes)
            .map(|(component, candidate)| (component.name.clone(), candidate.id))
            .collect();

        BuiltShape {
            label: self.definition.name.clone(),
            description: self.definition.description.clone(),
            component_map,
            sub_shapes,
            confidence: breakdown.confidence,
            attributes,
        }
    }
}

/// Assembles shapes from candidate pools
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    registry: ConstraintRegistry,
    config: BuilderConfig,
    debug_shapes: DebugShapeSet,
}

impl ShapeBuilder {
    pub fn new(registry: ConstraintRegistry, config: BuilderConfig) -> Self {
        let debug_shapes = DebugShapeSet::from_names(&config.debug_shapes);
        Self {
            registry,
            config,
            debug_shapes,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn with_debug_shapes(mut self, debug_shapes: DebugShapeSet) -> Self {
        self.debug_shapes = debug_shapes;
        self
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    /// Build a shape with no time limit
    pub fn build_shape(&self, pool: &[Candidate], definition: &ShapeDefinition) -> Result<BuiltShape, BuildError> {
        self.build_with_deadline(pool, definition, Deadline::unbounded())
    }

    /// Build a shape within `max_millis`; a negative budget is unbounded
    ///
    /// Running out of time yields a failure with reason `BuildTimeout`.
    pub fn build_shape_timed(
        &self,
        pool: &[Candidate],
        definition: &ShapeDefinition,
        max_millis: i64,
    ) -> Result<BuiltShape, BuildError> {
        self.build_with_deadline(pool, definition, Deadline::from_millis(max_millis))
    }

    /// Build a shape whose components may themselves be composite
    ///
    /// Component types naming a definition in `domain`, or components with
    /// inline children, are assembled first from the pool's primitives.
    pub fn build_hierarchical(
        &self,
        pool: &[Candidate],
        definition: &ShapeDefinition,
        domain: &Domain,
        max_millis: i64,
    ) -> Result<BuiltShape, BuildError> {
        compose::Composer::new(self, domain, Deadline::from_millis(max_millis)).build(pool, definition)
    }

    /// Compute the confidence graph a build of `definition` would use
    pub fn confidence_graph(
        &self,
        pool: &[Candidate],
        definition: &ShapeDefinition,
    ) -> Result<ConfidenceGraph, BuildError> {
        let attempt = BuildAttempt::new(self, pool, definition, Deadline::unbounded())?;
        ConfidenceGraph::compute(&attempt)
    }

    pub(crate) fn build_with_deadline(
        &self,
        pool: &[Candidate],
        definition: &ShapeDefinition,
        deadline: Deadline,
    ) -> Result<BuiltShape, BuildError> {
        let attempt = BuildAttempt::new(self, pool, definition, deadline)?;
        attempt.check_time()?;
        attempt.log_pool();

        if let Err(failure) = attempt.check_pool() {
            attempt.report_failure(&failure);
            log::debug!("{}", failure);
            return Err(failure.into());
        }

        let result = match self.config.strategy {
            Strategy::Greedy => {
                let graph = ConfidenceGraph::compute(&attempt)?;
                let scores = ComponentScores::compute(&graph, &attempt);
                greedy::assign(&attempt, &graph, &scores)
            }
            Strategy::Exhaustive => {
                let mut budget = SearchBudget::new(self.config.cutoff_for(&definition.name));
                exhaustive::assign(&attempt, &mut budget)
            }
        };

        match result {
            Ok(assignment) => {
                let shape = attempt.finish(&assignment);
                log::debug!("built {}", shape);
                Ok(shape)
            }
            Err(err) => {
                log::debug!("{}", err);
                Err(err)
            }
        }
    }
}
