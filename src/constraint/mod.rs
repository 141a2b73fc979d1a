//! Constraint capability and factory
//!
//! The engine treats geometric predicates as opaque: a [`Constraint`] takes
//! one or two [`Constrainable`] arguments and answers with a confidence in
//! `[0, 1]`. Constraints are instantiated per definition through a
//! [`ConstraintRegistry`], keyed by name (case-insensitive).

pub mod reference;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::constrainable::Constrainable;
use crate::error::DefinitionError;
use crate::model::find_similar;
use crate::model::ConstraintDefinition;

/// A geometric predicate over one or two arguments
pub trait Constraint: Send + Sync {
    fn name(&self) -> &str;

    /// Number of arguments `solve` expects; 1 or 2
    fn arity(&self) -> usize;

    /// Confidence that the predicate holds for `args`
    ///
    /// Must be a pure function of its arguments.
    fn solve(&self, args: &[Constrainable]) -> f64;

    /// Whether a raw confidence is unusable regardless of its magnitude
    fn is_clearly_false(&self, _confidence: f64) -> bool {
        false
    }
}

/// Solve a constraint and clamp the answer into `[0, 1]`
///
/// NaN counts as zero confidence.
pub fn evaluate(constraint: &dyn Constraint, args: &[Constrainable]) -> f64 {
    let value = constraint.solve(args);
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Constructor stored in the registry
pub type ConstraintConstructor =
    Arc<dyn Fn(&ConstraintDefinition) -> Box<dyn Constraint> + Send + Sync>;

#[derive(Clone)]
struct Registration {
    name: String,
    arity: usize,
    constructor: ConstraintConstructor,
}

/// Factory turning constraint definitions into evaluators
#[derive(Clone, Default)]
pub struct ConstraintRegistry {
    /// Lowercase name -> registration
    constraints: HashMap<String, Registration>,
}

impl ConstraintRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the constraints in [`reference`]
    pub fn with_reference_constraints() -> Self {
        let mut registry = Self::new();
        reference::register_all(&mut registry);
        registry
    }

    /// Register a constraint constructor under `name`
    pub fn register<F>(&mut self, name: &str, arity: usize, constructor: F) -> Result<(), DefinitionError>
    where
        F: Fn(&ConstraintDefinition) -> Box<dyn Constraint> + Send + Sync + 'static,
    {
        let key = name.to_lowercase();
        if self.constraints.contains_key(&key) {
            return Err(DefinitionError::DuplicateConstraint {
                name: name.to_string(),
            });
        }
        self.constraints.insert(
            key,
            Registration {
                name: name.to_string(),
                arity,
                constructor: Arc::new(constructor),
            },
        );
        Ok(())
    }

    /// Check if a constraint is registered
    pub fn contains(&self, name: &str) -> bool {
        self.constraints.contains_key(&name.to_lowercase())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constraints.values().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate the evaluator for a definition
    pub fn create(&self, definition: &ConstraintDefinition) -> Result<Box<dyn Constraint>, DefinitionError> {
        let registration = self
            .constraints
            .get(&definition.name.to_lowercase())
            .ok_or_else(|| DefinitionError::UnknownConstraint {
                name: definition.name.clone(),
                suggestions: find_similar(self.names(), &definition.name, 2),
            })?;

        if registration.arity != definition.arity() {
            return Err(DefinitionError::ArityMismatch {
                name: definition.name.clone(),
                expected: registration.arity,
                given: definition.arity(),
            });
        }

        Ok((registration.constructor)(definition))
    }
}

impl fmt::Debug for ConstraintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintRegistry")
            .field("constraints", &self.names())
            .finish()
    }
}

/// How constraint confidences of one complete assignment are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AndCombination {
    /// The weakest constraint decides
    #[default]
    Minimum,
    /// Confidences multiply like independent probabilities
    Product,
}

impl AndCombination {
    /// Combine confidences; an empty set is trivially satisfied
    pub fn combine(&self, values: impl IntoIterator<Item = f64>) -> f64 {
        match self {
            AndCombination::Minimum => values.into_iter().fold(1.0, f64::min),
            AndCombination::Product => values.into_iter().product(),
        }
    }
}
