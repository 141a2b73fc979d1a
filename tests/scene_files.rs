//! End-to-end tests: TOML scene and configuration in, assembled shape out.

use pretty_assertions::assert_eq;
use sketch_assembly::{
    assemble, assemble_with_options, AndCombination, AssembleOptions, BuilderConfig,
    FailureReason, Scene, Strategy,
};

const ARROW_SCENE: &str = r#"
target = "Arrow"
domain = "arrows"

[[definitions]]
name = "Head"
components = [{ name = "h1", type = "Line" }, { name = "h2", type = "Line" }]
constraints = ["Coincident h1.End1 h2.End1"]

[[definitions]]
name = "Arrow"
description = "a shaft with a head"
is_a = ["Directed"]
components = [{ name = "shaft", type = "Line" }, { name = "head", type = "Head" }]
constraints = [
    "Coincident shaft.End2 head.CenterRight",
    { name = "Horizontal", params = ["shaft"], threshold_multiplier = 1.5 },
]

[[candidates]]
id = 10
label = "Line"
strokes = [[[0.0, 0.0], [50.0, 2.0]]]

[[candidates]]
id = 11
label = "Line"
strokes = [[[50.0, 0.0], [40.0, -8.0]]]

[[candidates]]
id = 12
label = "Line"
strokes = [[[50.0, 0.0], [40.0, 8.0]]]
"#;

const CONFIG: &str = r#"
[builder]
strategy = "greedy"
satisfaction_threshold = 0.3
and_combination = "product"
expensive_shapes = ["Arrow"]
debug_shapes = ["Arrow"]
"#;

#[test]
fn test_scene_builds_hierarchically() {
    let scene = Scene::from_str(ARROW_SCENE).unwrap();
    let options = AssembleOptions::new().with_hierarchical(true).with_timeout_ms(5_000);
    let shape = assemble_with_options(&scene, options).unwrap();

    assert_eq!(shape.label, "Arrow");
    assert_eq!(shape.description, "a shaft with a head");
    assert_eq!(shape.component("shaft").map(|c| c.id.0), Some(10));
    assert_eq!(shape.component("head").map(|c| c.sub_shapes.len()), Some(2));
    assert_eq!(shape.attributes.get("Directed").map(String::as_str), Some("true"));
    assert!(shape.confidence > 0.35 && shape.confidence <= 1.0);
}

#[test]
fn test_scene_without_composition_lacks_the_head() {
    let scene = Scene::from_str(ARROW_SCENE).unwrap();
    let err = assemble(&scene).unwrap_err();
    assert_eq!(err.reason(), Some(FailureReason::MissingComponent));
    insta::assert_snapshot!(
        err.to_string(),
        @"not enough head (need 1 but have 0), shape: Arrow, reason: MissingComponent"
    );
}

#[test]
fn test_config_file_drives_the_build() {
    let config = BuilderConfig::from_str(CONFIG).unwrap();
    assert_eq!(config.strategy, Strategy::Greedy);
    assert_eq!(config.and_combination, AndCombination::Product);
    assert_eq!(config.cutoff_for("arrow"), config.expensive_cutoff);
    assert_eq!(config.pairing_threshold, 0.35);

    let scene = Scene::from_str(ARROW_SCENE).unwrap();
    let options = AssembleOptions::new()
        .with_builder(config)
        .with_hierarchical(true);
    let shape = assemble_with_options(&scene, options).unwrap();
    assert_eq!(shape.component("shaft").map(|c| c.id.0), Some(10));
}

#[test]
fn test_unknown_config_key_is_rejected() {
    assert!(BuilderConfig::from_str("[builder]\nthreshhold = 0.5\n").is_err());
}
