//! TOML scene files
//!
//! A scene bundles shape definitions, a candidate pool and the name of the
//! definition to build:
//!
//! ```toml
//! target = "Arrow"
//!
//! [[definitions]]
//! name = "Arrow"
//! components = [
//!     { name = "shaft", type = "Line" },
//!     { name = "head1", type = "Line" },
//! ]
//! constraints = [
//!     "Coincident shaft.End2 head1.End1",
//!     { name = "Horizontal", params = ["shaft"], threshold_multiplier = 1.5 },
//! ]
//!
//! [[candidates]]
//! id = 1
//! label = "Line"
//! strokes = [[[0.0, 0.0], [50.0, 0.0]]]
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::error::DefinitionError;
use crate::geometry::{BoundingBox, Stroke};
use crate::model::{Candidate, ComponentDefinition, ConstraintDefinition, Domain, ShapeDefinition};

/// Errors that can occur when loading a scene
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scene TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid definition: {0}")]
    Definition(#[from] DefinitionError),
    #[error("constraint '{text}' needs a name and one or two parameters")]
    MalformedConstraint { text: String },
    #[error("duplicate candidate id {id}")]
    DuplicateCandidate { id: u64 },
}

/// A loaded scene
#[derive(Debug, Clone)]
pub struct Scene {
    pub target: String,
    pub domain: Domain,
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlScene {
    target: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    definitions: Vec<TomlDefinition>,
    #[serde(default)]
    candidates: Vec<TomlCandidate>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlDefinition {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    components: Vec<TomlComponent>,
    #[serde(default)]
    constraints: Vec<TomlConstraint>,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
    #[serde(default)]
    is_a: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlComponent {
    name: String,
    #[serde(rename = "type")]
    shape_type: String,
    #[serde(default)]
    children: Vec<TomlComponent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TomlConstraint {
    Text(String),
    Table {
        name: String,
        params: Vec<String>,
        #[serde(default = "default_multiplier")]
        threshold_multiplier: f64,
    },
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlCandidate {
    id: Option<u64>,
    label: String,
    #[serde(default)]
    strokes: Vec<Vec<[f64; 2]>>,
    /// `[x, y, width, height]`
    bounds: Option<[f64; 4]>,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl Scene {
    /// Load a scene from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a scene from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, SceneError> {
        let parsed: TomlScene = toml::from_str(content)?;

        let mut domain = Domain::new(parsed.domain.unwrap_or_default());
        for definition in parsed.definitions {
            domain.add(convert_definition(definition)?)?;
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::with_capacity(parsed.candidates.len());
        for (index, raw) in parsed.candidates.into_iter().enumerate() {
            let candidate = convert_candidate(index, raw);
            if !seen.insert(candidate.id) {
                return Err(SceneError::DuplicateCandidate { id: candidate.id.0 });
            }
            candidates.push(candidate);
        }

        Ok(Scene {
            target: parsed.target,
            domain,
            candidates,
        })
    }

    /// The definition named by `target`
    pub fn target_definition(&self) -> Result<&ShapeDefinition, DefinitionError> {
        self.domain
            .get(&self.target)
            .ok_or_else(|| DefinitionError::UnknownDefinition {
                name: self.target.clone(),
            })
    }
}

fn convert_definition(raw: TomlDefinition) -> Result<ShapeDefinition, SceneError> {
    let mut definition = ShapeDefinition::new(raw.name).with_description(raw.description);
    for component in raw.components {
        definition = definition.with_component(convert_component(component));
    }
    for constraint in raw.constraints {
        definition = definition.with_constraint(convert_constraint(constraint)?);
    }
    for (key, value) in raw.attributes {
        definition = definition.with_attribute(key, value);
    }
    for tag in raw.is_a {
        definition = definition.with_is_a(tag);
    }
    Ok(definition)
}

fn convert_component(raw: TomlComponent) -> ComponentDefinition {
    raw.children
        .into_iter()
        .fold(ComponentDefinition::new(raw.name, raw.shape_type), |component, child| {
            component.with_child(convert_component(child))
        })
}

/// Parse `"Name a.End1 b"` or a table form
fn convert_constraint(raw: TomlConstraint) -> Result<ConstraintDefinition, SceneError> {
    match raw {
        TomlConstraint::Text(text) => {
            let mut words = text.split_whitespace();
            let name = words.next();
            let params: Vec<&str> = words.collect();
            match name {
                Some(name) if (1..=2).contains(&params.len()) => {
                    Ok(ConstraintDefinition::parse(name, &params)?)
                }
                _ => Err(SceneError::MalformedConstraint { text }),
            }
        }
        TomlConstraint::Table {
            name,
            params,
            threshold_multiplier,
        } => {
            let params: Vec<&str> = params.iter().map(String::as_str).collect();
            Ok(ConstraintDefinition::parse(name, &params)?.with_threshold_multiplier(threshold_multiplier))
        }
    }
}

fn convert_candidate(index: usize, raw: TomlCandidate) -> Candidate {
    let id = raw.id.unwrap_or(index as u64 + 1);
    let mut candidate = Candidate::new(id, raw.label);
    for stroke in raw.strokes {
        let coords: Vec<(f64, f64)> = stroke.iter().map(|&[x, y]| (x, y)).collect();
        candidate = candidate.with_stroke(Stroke::from_coords(&coords));
    }
    if let Some([x, y, width, height]) = raw.bounds {
        candidate = candidate.with_bounds(BoundingBox::new(x, y, width, height));
    }
    candidate.attributes = raw.attributes;
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SubPart;
    use pretty_assertions::assert_eq;

    const SCENE: &str = r#"
target = "arrow"

[[definitions]]
name = "Arrow"
is_a = ["Directed"]
components = [
    { name = "shaft", type = "Line" },
    { name = "head", type = "Line" },
]
constraints = [
    "Coincident shaft.End2 head.End1",
    { name = "Horizontal", params = ["shaft"], threshold_multiplier = 2.0 },
]

[[candidates]]
label = "Line"
strokes = [[[0.0, 0.0], [50.0, 0.0]]]

[[candidates]]
id = 7
label = "Line"
strokes = [[[50.0, 0.0], [40.0, 8.0]]]
"#;

    #[test]
    fn test_load_scene() {
        let scene = Scene::from_str(SCENE).unwrap();
        let arrow = scene.target_definition().unwrap();
        assert_eq!(arrow.name, "Arrow");
        assert_eq!(arrow.num_components(), 2);
        assert_eq!(arrow.constraints[0].parameters[0].sub_part, SubPart::End2);
        assert_eq!(arrow.constraints[1].threshold_multiplier, 2.0);
        assert!(arrow.is_a("directed"));

        let ids: Vec<u64> = scene.candidates.iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 7]);
    }

    #[test]
    fn test_malformed_constraint() {
        let err = Scene::from_str(
            r#"
target = "A"
[[definitions]]
name = "A"
constraints = ["Coincident"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::MalformedConstraint { .. }));
    }

    #[test]
    fn test_duplicate_candidate_id() {
        let err = Scene::from_str(
            r#"
target = "A"
[[candidates]]
id = 1
label = "Line"
[[candidates]]
id = 1
label = "Line"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::DuplicateCandidate { id: 1 }));
    }

    #[test]
    fn test_unknown_target() {
        let scene = Scene::from_str("target = \"Nothing\"\n").unwrap();
        assert!(matches!(
            scene.target_definition(),
            Err(DefinitionError::UnknownDefinition { .. })
        ));
    }

    #[test]
    fn test_nested_children() {
        let scene = Scene::from_str(
            r#"
target = "Flag"
[[definitions]]
name = "Flag"
components = [
    { name = "pole", type = "Line" },
    { name = "cloth", type = "Cloth", children = [
        { name = "top", type = "Line" },
        { name = "bottom", type = "Line" },
    ] },
]
"#,
        )
        .unwrap();
        let flag = scene.target_definition().unwrap();
        assert_eq!(flag.component("cloth").map(|c| c.children.len()), Some(2));
    }
}
