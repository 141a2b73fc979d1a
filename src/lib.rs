//! Sketch Assembly - builds composite shapes from recognized sketch primitives
//!
//! Given a pool of already-classified candidate shapes and a declarative
//! [`ShapeDefinition`] (named component slots plus geometric constraints
//! between them), the engine finds a legal one-to-one assignment of
//! candidates to slots, scores it, and reports a typed failure when no
//! assignment exists or the time budget runs out.
//!
//! # Example
//!
//! ```rust
//! use sketch_assembly::{build_shape, Candidate, ComponentDefinition, ConstraintDefinition, ShapeDefinition};
//!
//! let corner = ShapeDefinition::new("Corner")
//!     .with_component(ComponentDefinition::new("a", "Line"))
//!     .with_component(ComponentDefinition::new("b", "Line"))
//!     .with_constraint(ConstraintDefinition::parse("Coincident", &["a.End2", "b.End1"]).unwrap());
//!
//! let pool = vec![
//!     Candidate::line(1, (0.0, 0.0), (10.0, 0.0)),
//!     Candidate::line(2, (10.0, 0.0), (10.0, 10.0)),
//! ];
//!
//! let shape = build_shape(&pool, &corner).unwrap();
//! assert_eq!(shape.component("a").map(|c| c.id.0), Some(1));
//! ```

pub mod config;
pub mod constrainable;
pub mod constraint;
pub mod debug;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod model;
pub mod scene;

pub use config::{BuilderConfig, ConfigError};
pub use constrainable::{adapt, select, Constrainable};
pub use constraint::{AndCombination, Constraint, ConstraintRegistry};
pub use debug::DebugShapeSet;
pub use engine::{ShapeBuilder, Strategy};
pub use error::{AdapterError, BuildError, DefinitionError, FailureReason, ShapeBuildFailure};
pub use model::{
    BuiltShape, Candidate, CandidateId, ComponentDefinition, ConstraintDefinition,
    ConstraintParameter, Domain, ShapeDefinition, SubPart,
};
pub use scene::{Scene, SceneError};

/// Options for assembling a scene
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub builder: BuilderConfig,
    /// Build composite components bottom-up first
    pub hierarchical: bool,
    /// Time budget in milliseconds; negative means unbounded
    pub timeout_ms: i64,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            builder: BuilderConfig::default(),
            hierarchical: false,
            timeout_ms: -1,
        }
    }
}

impl AssembleOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the builder configuration
    pub fn with_builder(mut self, config: BuilderConfig) -> Self {
        self.builder = config;
        self
    }

    pub fn with_hierarchical(mut self, hierarchical: bool) -> Self {
        self.hierarchical = hierarchical;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Build a shape with the default configuration and the reference constraints
pub fn build_shape(pool: &[Candidate], definition: &ShapeDefinition) -> Result<BuiltShape, BuildError> {
    ShapeBuilder::new(
        ConstraintRegistry::with_reference_constraints(),
        BuilderConfig::default(),
    )
    .build_shape(pool, definition)
}

/// Build a scene's target with the default options
pub fn assemble(scene: &Scene) -> Result<BuiltShape, BuildError> {
    assemble_with_options(scene, AssembleOptions::default())
}

/// Build a scene's target from its candidate pool
///
/// # Example
///
/// ```rust
/// use sketch_assembly::{assemble_with_options, AssembleOptions, BuilderConfig, Scene, Strategy};
///
/// let scene = Scene::from_str(r#"
/// target = "Corner"
///
/// [[definitions]]
/// name = "Corner"
/// components = [{ name = "a", type = "Line" }, { name = "b", type = "Line" }]
/// constraints = ["Coincident a.End2 b.End1"]
///
/// [[candidates]]
/// label = "Line"
/// strokes = [[[0.0, 0.0], [10.0, 0.0]]]
///
/// [[candidates]]
/// label = "Line"
/// strokes = [[[10.0, 0.0], [10.0, 10.0]]]
/// "#).unwrap();
///
/// let options = AssembleOptions::new()
///     .with_builder(BuilderConfig::default().with_strategy(Strategy::Greedy))
///     .with_timeout_ms(1_000);
/// let shape = assemble_with_options(&scene, options).unwrap();
/// assert_eq!(shape.label, "Corner");
/// ```
pub fn assemble_with_options(scene: &Scene, options: AssembleOptions) -> Result<BuiltShape, BuildError> {
    let definition = scene.target_definition()?;
    let builder = ShapeBuilder::new(ConstraintRegistry::with_reference_constraints(), options.builder);

    if options.hierarchical {
        builder.build_hierarchical(&scene.candidates, definition, &scene.domain, options.timeout_ms)
    } else {
        builder.build_shape_timed(&scene.candidates, definition, options.timeout_ms)
    }
}
