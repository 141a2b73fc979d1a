//! Integration tests for bottom-up composition of nested definitions.
//!
//! These use the reference constraints and real stroke geometry:
//! an arrow whose head is itself a definition made of two lines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sketch_assembly::geometry::BoundingBox;
use sketch_assembly::{
    BuildError, BuilderConfig, Candidate, ComponentDefinition, Constrainable, Constraint,
    ConstraintDefinition, ConstraintRegistry, DefinitionError, Domain, FailureReason,
    ShapeBuilder, ShapeDefinition, Strategy,
};

fn builder(strategy: Strategy) -> ShapeBuilder {
    ShapeBuilder::new(
        ConstraintRegistry::with_reference_constraints(),
        BuilderConfig::default().with_strategy(strategy),
    )
}

/// Two strokes meeting at their first points
fn head() -> ShapeDefinition {
    ShapeDefinition::new("Head")
        .with_component(ComponentDefinition::new("h1", "Line"))
        .with_component(ComponentDefinition::new("h2", "Line"))
        .with_constraint(ConstraintDefinition::parse("Coincident", &["h1.End1", "h2.End1"]).unwrap())
}

/// A shaft ending at the right edge of a head
fn arrow() -> ShapeDefinition {
    ShapeDefinition::new("Arrow")
        .with_component(ComponentDefinition::new("shaft", "Line"))
        .with_component(ComponentDefinition::new("head", "Head"))
        .with_constraint(ConstraintDefinition::parse("Coincident", &["shaft.End2", "head.CenterRight"]).unwrap())
}

fn domain() -> Domain {
    Domain::new("arrows")
        .with_definition(head())
        .and_then(|d| d.with_definition(arrow()))
        .unwrap()
}

fn arrow_strokes() -> Vec<Candidate> {
    vec![
        Candidate::line(1, (0.0, 0.0), (50.0, 0.0)),
        Candidate::line(2, (50.0, 0.0), (40.0, -8.0)),
        Candidate::line(3, (50.0, 0.0), (40.0, 8.0)),
    ]
}

#[test]
fn test_builds_nested_definition() {
    let domain = domain();
    let arrow = domain.get("Arrow").unwrap();

    for strategy in [Strategy::Exhaustive, Strategy::Greedy] {
        let shape = builder(strategy)
            .build_hierarchical(&arrow_strokes(), arrow, &domain, -1)
            .unwrap();

        assert_eq!(shape.label, "Arrow");
        assert_eq!(shape.component("shaft").map(|c| c.id.0), Some(1));

        let head = shape.component("head").unwrap();
        assert_eq!(head.label, "Head");
        let mut parts: Vec<u64> = head.sub_shapes.iter().map(|c| c.id.0).collect();
        parts.sort_unstable();
        assert_eq!(parts, vec![2, 3], "{strategy}");
        assert_eq!(
            head.bounding_box(),
            Some(BoundingBox::new(40.0, -8.0, 10.0, 16.0))
        );
        assert!((shape.confidence - 1.0).abs() < 1e-9, "{strategy}: {}", shape.confidence);
    }
}

#[test]
fn test_flat_build_cannot_see_composites() {
    let domain = domain();
    let err = builder(Strategy::Exhaustive)
        .build_shape(&arrow_strokes(), domain.get("Arrow").unwrap())
        .unwrap_err();
    assert_eq!(err.reason(), Some(FailureReason::MissingComponent));
}

#[test]
fn test_circular_definitions() {
    let mut domain = Domain::new("loops");
    domain
        .add(ShapeDefinition::new("Ying").with_component(ComponentDefinition::new("other", "Yang")))
        .unwrap();
    domain
        .add(ShapeDefinition::new("Yang").with_component(ComponentDefinition::new("other", "Ying")))
        .unwrap();

    let err = builder(Strategy::Exhaustive)
        .build_hierarchical(&arrow_strokes(), domain.get("Ying").unwrap(), &domain, -1)
        .unwrap_err();
    match err {
        BuildError::Definition(DefinitionError::CircularDefinition { cycle }) => {
            assert_eq!(cycle, vec!["Ying", "Yang", "Ying"]);
        }
        other => panic!("expected a circular definition, got {other:?}"),
    }
}

#[test]
fn test_failed_sub_build_names_the_component() {
    let domain = domain();
    let pool = vec![
        Candidate::line(1, (0.0, 0.0), (50.0, 0.0)),
        Candidate::new(2, "Ellipse").with_bounds(BoundingBox::new(60.0, 0.0, 5.0, 5.0)),
    ];

    let err = builder(Strategy::Exhaustive)
        .build_hierarchical(&pool, domain.get("Arrow").unwrap(), &domain, -1)
        .unwrap_err();
    assert_eq!(err.reason(), Some(FailureReason::MissingComponent));

    let failure = err.failure().unwrap();
    assert_eq!(failure.shape, "Arrow");
    assert_eq!(failure.component.as_deref(), Some("head"));
    assert!(failure.message.starts_with("could not build 'head'"), "{}", failure.message);
}

#[test]
fn test_prebuilt_composite_in_pool_is_used() {
    let domain = domain();
    let prebuilt = Candidate::new(40, "Head").with_bounds(BoundingBox::new(40.0, -8.0, 10.0, 16.0));
    let pool = vec![Candidate::line(1, (0.0, 0.0), (50.0, 0.0)), prebuilt];

    let shape = builder(Strategy::Exhaustive)
        .build_hierarchical(&pool, domain.get("Arrow").unwrap(), &domain, -1)
        .unwrap();
    assert_eq!(shape.component("head").map(|c| c.id.0), Some(40));
}

#[test]
fn test_inline_children_do_not_share_candidates() {
    let flag = ShapeDefinition::new("Flag")
        .with_component(
            ComponentDefinition::new("cloth", "Cloth")
                .with_child(ComponentDefinition::new("top", "Line"))
                .with_child(ComponentDefinition::new("bottom", "Line")),
        )
        .with_component(ComponentDefinition::new("pole", "Line"));
    let domain = Domain::new("flags").with_definition(flag.clone()).unwrap();

    let shape = builder(Strategy::Exhaustive)
        .build_hierarchical(&arrow_strokes(), &flag, &domain, -1)
        .unwrap();

    let cloth = shape.component("cloth").unwrap();
    assert_eq!(cloth.label, "Cloth");
    assert_eq!(cloth.sub_shapes.len(), 2);

    let pole = shape.component("pole").map(|c| c.id).unwrap();
    assert!(cloth.sub_shapes.iter().all(|c| c.id != pole));
}

#[test]
fn test_zero_budget_times_out() {
    let domain = domain();
    let err = builder(Strategy::Exhaustive)
        .build_hierarchical(&arrow_strokes(), domain.get("Arrow").unwrap(), &domain, 0)
        .unwrap_err();
    assert_eq!(err.reason(), Some(FailureReason::BuildTimeout));
}

/// Unary stub that accepts anything and counts how often it is asked
#[derive(Clone)]
struct Tally(Arc<AtomicUsize>);

impl Constraint for Tally {
    fn name(&self) -> &str {
        "tally"
    }

    fn arity(&self) -> usize {
        1
    }

    fn solve(&self, _args: &[Constrainable]) -> f64 {
        self.0.fetch_add(1, Ordering::SeqCst);
        1.0
    }
}

#[test]
fn test_each_composite_slot_is_built_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = ConstraintRegistry::new();
    let tally = Tally(calls.clone());
    registry.register("tally", 1, move |_| Box::new(tally.clone())).unwrap();
    let builder = ShapeBuilder::new(registry, BuilderConfig::default().with_strategy(Strategy::Greedy));

    let barb = ShapeDefinition::new("Barb")
        .with_component(ComponentDefinition::new("h1", "Line"))
        .with_component(ComponentDefinition::new("h2", "Line"))
        .with_constraint(ConstraintDefinition::parse("tally", &["h1"]).unwrap());
    let double = ShapeDefinition::new("DoubleBarb")
        .with_component(ComponentDefinition::new("front", "Barb"))
        .with_component(ComponentDefinition::new("back", "Barb"));
    let domain = Domain::new("barbs")
        .with_definition(barb)
        .and_then(|d| d.with_definition(double))
        .unwrap();

    let pool: Vec<Candidate> = (1..=4)
        .map(|id| {
            let x = id as f64 * 10.0;
            Candidate::line(id, (x, 0.0), (x + 5.0, 5.0))
        })
        .collect();
    let shape = builder
        .build_hierarchical(&pool, domain.get("DoubleBarb").unwrap(), &domain, -1)
        .unwrap();

    // front sees all four lines, back only the two front left over
    assert_eq!(calls.load(Ordering::SeqCst), 6);

    let front = shape.component("front").unwrap();
    let back = shape.component("back").unwrap();
    let mut parts: Vec<u64> = front
        .sub_shapes
        .iter()
        .chain(&back.sub_shapes)
        .map(|c| c.id.0)
        .collect();
    parts.sort_unstable();
    assert_eq!(parts, vec![1, 2, 3, 4]);
}

#[test]
fn test_prebuilt_composite_matches_by_tag() {
    let domain = domain();
    let prebuilt = Candidate::new(40, "Glyph")
        .with_attribute("Head", "true")
        .with_bounds(BoundingBox::new(40.0, -8.0, 10.0, 16.0));
    let pool = vec![Candidate::line(1, (0.0, 0.0), (50.0, 0.0)), prebuilt];

    let tagged = ShapeBuilder::new(
        ConstraintRegistry::with_reference_constraints(),
        BuilderConfig::default().with_type_tags(true),
    );
    let shape = tagged
        .build_hierarchical(&pool, domain.get("Arrow").unwrap(), &domain, -1)
        .unwrap();
    assert_eq!(shape.component("head").map(|c| c.id.0), Some(40));

    let err = builder(Strategy::Exhaustive)
        .build_hierarchical(&pool, domain.get("Arrow").unwrap(), &domain, -1)
        .unwrap_err();
    assert_eq!(err.failure().and_then(|f| f.component.as_deref()), Some("head"));
}
