//! Error types for shape assembly
//!
//! Build failures are ordinary values: a failed assembly is an expected
//! outcome of recognition, so it carries the shape name, a reason from a
//! fixed taxonomy and, where known, the offending component or constraint.
//! Malformed definition data is reported separately through
//! [`DefinitionError`] so callers can tell "this drawing is not an arrow"
//! apart from "the arrow definition is broken".

use std::fmt;

use thiserror::Error;

use crate::model::SubPart;

/// Why a build attempt did not produce a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    /// The pool holds fewer shapes than the definition has components
    NotEnoughComponents,
    /// A required shape type is missing, or a slot ran out of candidates
    MissingComponent,
    /// Types and counts fit but no assignment clears the constraints
    UnsatisfiedConstraint,
    /// The time budget ran out
    BuildTimeout,
    /// No classification was given; seeing this outside tests is a bug
    ReasonNotGiven,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureReason::NotEnoughComponents => "NotEnoughComponents",
            FailureReason::MissingComponent => "MissingComponent",
            FailureReason::UnsatisfiedConstraint => "UnsatisfiedConstraint",
            FailureReason::BuildTimeout => "BuildTimeout",
            FailureReason::ReasonNotGiven => "ReasonNotGiven",
        };
        f.write_str(name)
    }
}

/// A build attempt that ended without a shape
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}, shape: {shape}, reason: {reason}")]
pub struct ShapeBuildFailure {
    pub shape: String,
    pub reason: FailureReason,
    pub message: String,
    pub component: Option<String>,
    pub constraint: Option<String>,
}

impl ShapeBuildFailure {
    pub const DEFAULT_MESSAGE: &'static str = "building the shape failed";

    pub fn new(shape: impl Into<String>, reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            reason,
            message: message.into(),
            component: None,
            constraint: None,
        }
    }

    /// A failure with no classification
    pub fn unexplained(shape: impl Into<String>) -> Self {
        Self::new(shape, FailureReason::ReasonNotGiven, Self::DEFAULT_MESSAGE)
    }

    /// Create a pool-too-small failure
    pub fn not_enough_components(shape: impl Into<String>, have: usize, need: usize) -> Self {
        Self::new(
            shape,
            FailureReason::NotEnoughComponents,
            format!("not enough shapes in the pool (have {}, require {})", have, need),
        )
    }

    /// Create a missing-type failure
    pub fn missing_type(shape: impl Into<String>, shape_type: &str, have: usize, need: usize) -> Self {
        Self::new(
            shape,
            FailureReason::MissingComponent,
            format!("not enough {} (need {} but have {})", shape_type, need, have),
        )
    }

    /// Create a failure for a slot that could not be filled
    pub fn missing_component(shape: impl Into<String>, component: impl Into<String>) -> Self {
        let component = component.into();
        Self::new(
            shape,
            FailureReason::MissingComponent,
            format!("no unclaimed candidate of the right type for '{}'", component),
        )
        .with_component(component)
    }

    /// Create an unsatisfied-constraint failure
    pub fn unsatisfied(shape: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(shape, FailureReason::UnsatisfiedConstraint, message)
    }

    /// Create a timeout failure
    pub fn timeout(shape: impl Into<String>, elapsed_ms: u128, budget_ms: u128) -> Self {
        Self::new(
            shape,
            FailureReason::BuildTimeout,
            format!("ran out of time after {} ms (budget {} ms)", elapsed_ms, budget_ms),
        )
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.reason == FailureReason::BuildTimeout
    }
}

/// Malformed shape-definition data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    /// A constraint parameter names a component the definition lacks
    #[error("constraint '{constraint}' in '{shape}' references unknown component '{component}'")]
    UnknownComponent {
        shape: String,
        constraint: String,
        component: String,
        suggestions: Vec<String>,
    },

    /// Constraints take exactly one or two parameters
    #[error("constraint '{constraint}' in '{shape}' has {arity} parameters (expected 1 or 2)")]
    UnsupportedArity {
        shape: String,
        constraint: String,
        arity: usize,
    },

    #[error("duplicate component '{component}' in '{shape}'")]
    DuplicateComponent { shape: String, component: String },

    #[error("component names in '{shape}' cannot be empty")]
    EmptyComponentName { shape: String },

    /// No constraint is registered under this name
    #[error("unknown constraint '{name}'")]
    UnknownConstraint { name: String, suggestions: Vec<String> },

    /// A constraint was registered twice
    #[error("duplicate constraint registration: {name}")]
    DuplicateConstraint { name: String },

    /// A registered constraint declares a different arity than its definition
    #[error("constraint '{name}' takes {expected} parameters but the definition gives {given}")]
    ArityMismatch {
        name: String,
        expected: usize,
        given: usize,
    },

    #[error("unknown sub-part '{value}'")]
    UnknownSubPart { value: String },

    /// Composite definitions that contain themselves
    #[error("circular shape definition: {}", .cycle.join(" -> "))]
    CircularDefinition { cycle: Vec<String> },

    #[error("duplicate shape definition: {name}")]
    DuplicateDefinition { name: String },

    #[error("shape definition not found: {name}")]
    UnknownDefinition { name: String },
}

impl DefinitionError {
    /// Create an unknown component error with suggestions
    pub fn unknown_component(
        shape: impl Into<String>,
        constraint: impl Into<String>,
        component: impl Into<String>,
        suggestions: Vec<String>,
    ) -> Self {
        Self::UnknownComponent {
            shape: shape.into(),
            constraint: constraint.into(),
            component: component.into(),
            suggestions,
        }
    }

    /// Create a circular definition error
    pub fn circular(cycle: Vec<String>) -> Self {
        Self::CircularDefinition { cycle }
    }

    /// Get suggestions if available
    pub fn suggestions(&self) -> Option<&[String]> {
        match self {
            Self::UnknownComponent { suggestions, .. } => Some(suggestions),
            Self::UnknownConstraint { suggestions, .. } => Some(suggestions),
            _ => None,
        }
    }
}

/// Errors raised while turning a candidate into a constraint argument
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// The adapter kind has no such sub-part
    #[error("a constrainable {kind} doesn't have a {sub_part}")]
    InvalidSelector { kind: &'static str, sub_part: SubPart },

    /// The candidate lacks the strokes the adapter needs
    #[error("candidate {candidate} has no stroke geometry")]
    MissingGeometry { candidate: String },
}

impl AdapterError {
    pub fn invalid_selector(kind: &'static str, sub_part: SubPart) -> Self {
        Self::InvalidSelector { kind, sub_part }
    }

    pub fn missing_geometry(candidate: impl fmt::Display) -> Self {
        Self::MissingGeometry {
            candidate: candidate.to_string(),
        }
    }
}

/// Errors returned by the public build entry points
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// The attempt ran and did not produce a shape
    #[error(transparent)]
    Failed(#[from] ShapeBuildFailure),

    /// The definition data is malformed
    #[error("invalid shape definition: {0}")]
    Definition(#[from] DefinitionError),

    /// A sub-part selector does not fit the candidate's adapter
    #[error("invalid constraint argument: {0}")]
    Adapter(#[from] AdapterError),
}

impl BuildError {
    /// The failure classification, if this is a build failure
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            BuildError::Failed(f) => Some(f.reason),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ShapeBuildFailure> {
        match self {
            BuildError::Failed(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.reason() == Some(FailureReason::BuildTimeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let err = ShapeBuildFailure::not_enough_components("Arrow", 1, 2);
        insta::assert_snapshot!(
            err.to_string(),
            @"not enough shapes in the pool (have 1, require 2), shape: Arrow, reason: NotEnoughComponents"
        );
    }

    #[test]
    fn test_unexplained_failure_defaults() {
        let err = ShapeBuildFailure::unexplained("Arrow");
        assert_eq!(err.reason, FailureReason::ReasonNotGiven);
        assert!(err.to_string().starts_with("building the shape failed"));
    }

    #[test]
    fn test_missing_component_names_slot() {
        let err = ShapeBuildFailure::missing_component("Arrow", "head");
        assert_eq!(err.component.as_deref(), Some("head"));
        assert_eq!(err.reason, FailureReason::MissingComponent);
    }

    #[test]
    fn test_circular_definition_display() {
        let err = DefinitionError::circular(vec!["a".to_string(), "b".to_string(), "a".to_string()]);
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_build_error_reason() {
        let err: BuildError = ShapeBuildFailure::timeout("Arrow", 12, 10).into();
        assert!(err.is_timeout());
        assert_eq!(err.reason(), Some(FailureReason::BuildTimeout));

        let err: BuildError = DefinitionError::UnknownDefinition {
            name: "Arrow".to_string(),
        }
        .into();
        assert_eq!(err.reason(), None);
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_invalid_selector_display() {
        let err = AdapterError::invalid_selector("point", SubPart::End1);
        assert_eq!(err.to_string(), "a constrainable point doesn't have a End1");
    }
}
