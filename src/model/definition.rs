//! Declarative shape definitions
//!
//! A [`ShapeDefinition`] names the slots a shape is assembled from and the
//! geometric constraints that must hold between them. Definitions are read
//! only during a build; [`ShapeDefinition::validate`] checks the invariants
//! the engine relies on before any search starts.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::DefinitionError;

use super::find_similar;

/// A point-like part of a shape that a constraint can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubPart {
    /// The whole shape
    None,
    /// First literal endpoint
    End1,
    /// Second literal endpoint
    End2,
    TopMostEnd,
    BottomMostEnd,
    LeftMostEnd,
    RightMostEnd,
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl SubPart {
    pub const ALL: [SubPart; 16] = [
        SubPart::None,
        SubPart::End1,
        SubPart::End2,
        SubPart::TopMostEnd,
        SubPart::BottomMostEnd,
        SubPart::LeftMostEnd,
        SubPart::RightMostEnd,
        SubPart::TopLeft,
        SubPart::TopCenter,
        SubPart::TopRight,
        SubPart::CenterLeft,
        SubPart::Center,
        SubPart::CenterRight,
        SubPart::BottomLeft,
        SubPart::BottomCenter,
        SubPart::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubPart::None => "None",
            SubPart::End1 => "End1",
            SubPart::End2 => "End2",
            SubPart::TopMostEnd => "TopMostEnd",
            SubPart::BottomMostEnd => "BottomMostEnd",
            SubPart::LeftMostEnd => "LeftMostEnd",
            SubPart::RightMostEnd => "RightMostEnd",
            SubPart::TopLeft => "TopLeft",
            SubPart::TopCenter => "TopCenter",
            SubPart::TopRight => "TopRight",
            SubPart::CenterLeft => "CenterLeft",
            SubPart::Center => "Center",
            SubPart::CenterRight => "CenterRight",
            SubPart::BottomLeft => "BottomLeft",
            SubPart::BottomCenter => "BottomCenter",
            SubPart::BottomRight => "BottomRight",
        }
    }
}

impl fmt::Display for SubPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubPart {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(SubPart::None);
        }
        SubPart::ALL
            .iter()
            .find(|part| part.as_str().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| DefinitionError::UnknownSubPart {
                value: trimmed.to_string(),
            })
    }
}

/// One argument of a constraint: a component, optionally narrowed to a sub-part
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstraintParameter {
    pub component: String,
    pub sub_part: SubPart,
}

impl ConstraintParameter {
    pub const SEPARATOR: char = '.';

    pub fn new(component: impl Into<String>, sub_part: SubPart) -> Self {
        Self {
            component: component.into(),
            sub_part,
        }
    }

    /// Refer to the whole component
    pub fn whole(component: impl Into<String>) -> Self {
        Self::new(component, SubPart::None)
    }

    pub fn has_sub_part(&self) -> bool {
        self.sub_part != SubPart::None
    }
}

impl fmt::Display for ConstraintParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_sub_part() {
            write!(f, "{}{}{}", self.component, Self::SEPARATOR, self.sub_part)
        } else {
            f.write_str(&self.component)
        }
    }
}

/// Parses `component` or `component.SubPart`, splitting on the first `.`
impl FromStr for ConstraintParameter {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(Self::SEPARATOR) {
            Some((component, sub_part)) => Ok(Self::new(component.trim(), sub_part.parse()?)),
            None => Ok(Self::whole(s.trim())),
        }
    }
}

/// A named constraint applied to one or two component parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDefinition {
    pub name: String,
    pub parameters: Vec<ConstraintParameter>,
    /// Scales the constraint's own tolerance; 1.0 leaves it unchanged
    pub threshold_multiplier: f64,
}

impl ConstraintDefinition {
    pub fn new(name: impl Into<String>, parameters: Vec<ConstraintParameter>) -> Self {
        Self {
            name: name.into(),
            parameters,
            threshold_multiplier: 1.0,
        }
    }

    pub fn unary(name: impl Into<String>, param: ConstraintParameter) -> Self {
        Self::new(name, vec![param])
    }

    pub fn binary(
        name: impl Into<String>,
        first: ConstraintParameter,
        second: ConstraintParameter,
    ) -> Self {
        Self::new(name, vec![first, second])
    }

    /// Build from textual parameters such as `"shaft.End2"`
    pub fn parse(name: impl Into<String>, params: &[&str]) -> Result<Self, DefinitionError> {
        let parameters = params
            .iter()
            .map(|p| p.parse::<ConstraintParameter>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(name, parameters))
    }

    pub fn with_threshold_multiplier(mut self, multiplier: f64) -> Self {
        self.threshold_multiplier = multiplier;
        self
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_unary(&self) -> bool {
        self.parameters.len() == 1
    }

    /// Whether any parameter refers to the given component
    pub fn touches(&self, component: &str) -> bool {
        self.parameters.iter().any(|p| p.component == component)
    }
}

impl fmt::Display for ConstraintDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters.iter().map(|p| p.to_string()).collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

/// A named slot that must be filled by a shape of `shape_type`
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDefinition {
    pub name: String,
    pub shape_type: String,
    /// Inline sub-components; non-empty only for composite slots
    pub children: Vec<ComponentDefinition>,
}

impl ComponentDefinition {
    pub fn new(name: impl Into<String>, shape_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape_type: shape_type.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: ComponentDefinition) -> Self {
        self.children.push(child);
        self
    }

    /// Case-insensitive type comparison
    pub fn accepts_type(&self, label: &str) -> bool {
        self.shape_type.eq_ignore_ascii_case(label)
    }
}

/// Complete description of a composite shape
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeDefinition {
    pub name: String,
    pub description: String,
    pub components: Vec<ComponentDefinition>,
    pub constraints: Vec<ConstraintDefinition>,
    pub attributes: BTreeMap<String, String>,
    pub is_a: BTreeSet<String>,
}

impl ShapeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_component(mut self, component: ComponentDefinition) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_constraint(mut self, constraint: ConstraintDefinition) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_is_a(mut self, tag: impl Into<String>) -> Self {
        self.is_a.insert(tag.into());
        self
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Get a component by name
    pub fn component(&self, name: &str) -> Option<&ComponentDefinition> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Position of a component in definition order
    pub fn component_index(&self, name: &str) -> Option<usize> {
        self.components.iter().position(|c| c.name == name)
    }

    /// All components requiring the given type (case-insensitive)
    pub fn components_of_type(&self, shape_type: &str) -> Vec<&ComponentDefinition> {
        self.components
            .iter()
            .filter(|c| c.accepts_type(shape_type))
            .collect()
    }

    /// Required count per shape type, keyed by lowercase type name
    pub fn type_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for component in &self.components {
            *counts.entry(component.shape_type.to_lowercase()).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct required types, lowercased
    pub fn shape_types(&self) -> BTreeSet<String> {
        self.components
            .iter()
            .map(|c| c.shape_type.to_lowercase())
            .collect()
    }

    /// Indices of the constraints that reference a component
    pub fn constraints_for_component(&self, name: &str) -> Vec<usize> {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| c.touches(name))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn is_a(&self, tag: &str) -> bool {
        self.is_a.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Check the invariants the engine relies on
    ///
    /// Component names must be non-empty and unique, every constraint must
    /// have exactly one or two parameters, and every parameter must name a
    /// component of this definition.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for component in &self.components {
            if component.name.trim().is_empty() {
                return Err(DefinitionError::EmptyComponentName {
                    shape: self.name.clone(),
                });
            }
            if !seen.insert(component.name.as_str()) {
                return Err(DefinitionError::DuplicateComponent {
                    shape: self.name.clone(),
                    component: component.name.clone(),
                });
            }
        }

        for constraint in &self.constraints {
            let arity = constraint.arity();
            if arity != 1 && arity != 2 {
                return Err(DefinitionError::UnsupportedArity {
                    shape: self.name.clone(),
                    constraint: constraint.name.clone(),
                    arity,
                });
            }
            for param in &constraint.parameters {
                if !seen.contains(param.component.as_str()) {
                    return Err(DefinitionError::unknown_component(
                        &self.name,
                        &constraint.name,
                        &param.component,
                        find_similar(seen.iter().copied(), &param.component, 2),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ShapeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} components, {} constraints)",
            self.name,
            self.components.len(),
            self.constraints.len()
        )
    }
}

/// A named collection of shape definitions
///
/// The hierarchical composer consults the domain to tell composite slot
/// types (those naming a definition here) from primitive ones.
#[derive(Debug, Clone, Default)]
pub struct Domain {
    pub name: String,
    definitions: Vec<ShapeDefinition>,
    /// Lowercase name -> index into `definitions`
    index: HashMap<String, usize>,
}

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Register a definition; names are unique case-insensitively
    pub fn add(&mut self, definition: ShapeDefinition) -> Result<(), DefinitionError> {
        let key = definition.name.to_lowercase();
        if self.index.contains_key(&key) {
            return Err(DefinitionError::DuplicateDefinition {
                name: definition.name,
            });
        }
        self.index.insert(key, self.definitions.len());
        self.definitions.push(definition);
        Ok(())
    }

    pub fn with_definition(mut self, definition: ShapeDefinition) -> Result<Self, DefinitionError> {
        self.add(definition)?;
        Ok(self)
    }

    /// Get a definition by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&ShapeDefinition> {
        self.index
            .get(&name.to_lowercase())
            .map(|&i| &self.definitions[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_lowercase())
    }

    pub fn definitions(&self) -> &[ShapeDefinition] {
        &self.definitions
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }
}
