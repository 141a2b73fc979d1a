//! Candidate shapes and assembled results

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::{BoundingBox, Point, Stroke};

/// Fresh identifiers for assembled shapes start well above hand-assigned ones
static NEXT_FRESH_ID: AtomicU64 = AtomicU64::new(1 << 40);

/// Identity of a candidate within a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateId(pub u64);

impl CandidateId {
    /// Allocate an identifier no caller-assigned id is expected to use
    pub fn fresh() -> Self {
        CandidateId(NEXT_FRESH_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An already-classified shape eligible to fill a component slot
///
/// Primitive recognizer output and previously assembled shapes share this
/// type, so composites can be fed back into a pool unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: CandidateId,
    pub label: String,
    pub strokes: Vec<Stroke>,
    /// Explicit extent; derived from the strokes when absent
    pub bounds: Option<BoundingBox>,
    pub attributes: BTreeMap<String, String>,
    pub sub_shapes: Vec<Candidate>,
}

impl Candidate {
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id: CandidateId(id),
            label: label.into(),
            strokes: Vec::new(),
            bounds: None,
            attributes: BTreeMap::new(),
            sub_shapes: Vec::new(),
        }
    }

    /// A single-stroke line from `from` to `to`
    pub fn line(id: u64, from: (f64, f64), to: (f64, f64)) -> Self {
        Self::new(id, "Line").with_stroke(Stroke::from_coords(&[from, to]))
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.strokes.push(stroke);
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }

    /// Whether an attribute key equals the tag, ignoring case
    pub fn has_tag(&self, tag: &str) -> bool {
        self.attributes.keys().any(|k| k.eq_ignore_ascii_case(tag))
    }

    /// Whether this candidate may fill a slot of `shape_type`
    ///
    /// The label always counts; is-a tags count only when `match_tags` is set.
    pub fn has_type(&self, shape_type: &str, match_tags: bool) -> bool {
        self.label.eq_ignore_ascii_case(shape_type) || (match_tags && self.has_tag(shape_type))
    }

    pub fn is_line(&self) -> bool {
        self.label.eq_ignore_ascii_case("Line")
    }

    /// Extent of the candidate, if it has any geometry
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if self.bounds.is_some() {
            return self.bounds;
        }
        self.strokes
            .iter()
            .filter_map(|s| s.bounding_box())
            .reduce(|a, b| a.union(&b))
    }

    /// First point of the first non-empty stroke
    pub fn first_point(&self) -> Option<Point> {
        self.strokes.iter().find_map(|s| s.first_point())
    }

    /// Last point of the last non-empty stroke
    pub fn last_point(&self) -> Option<Point> {
        self.strokes.iter().rev().find_map(|s| s.last_point())
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.label, self.id)
    }
}

/// The result of a successful build
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltShape {
    pub label: String,
    pub description: String,
    /// Component name -> assigned candidate id; no id appears twice
    pub component_map: BTreeMap<String, CandidateId>,
    /// Assigned candidates in definition order
    pub sub_shapes: Vec<Candidate>,
    pub confidence: f64,
    pub attributes: BTreeMap<String, String>,
}

impl BuiltShape {
    /// Get the candidate assigned to a component
    pub fn component(&self, name: &str) -> Option<&Candidate> {
        let id = self.component_map.get(name)?;
        self.sub_shapes.iter().find(|c| c.id == *id)
    }

    /// Names of the filled components
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.component_map.keys().map(|s| s.as_str())
    }

    /// Turn the assembled shape into a candidate for a larger build
    ///
    /// The new candidate gets a fresh id, the definition name as its label
    /// and the union of its parts' strokes as geometry.
    pub fn into_candidate(self) -> Candidate {
        let strokes = self
            .sub_shapes
            .iter()
            .flat_map(|s| s.strokes.iter().cloned())
            .collect();
        let bounds = self
            .sub_shapes
            .iter()
            .filter_map(|s| s.bounding_box())
            .reduce(|a, b| a.union(&b));
        Candidate {
            id: CandidateId::fresh(),
            label: self.label,
            strokes,
            bounds,
            attributes: self.attributes,
            sub_shapes: self.sub_shapes,
        }
    }
}

impl fmt::Display for BuiltShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .component_map
            .iter()
            .map(|(name, id)| format!("{}={}", name, id))
            .collect();
        write!(
            f,
            "{} [{}] confidence {:.3}",
            self.label,
            parts.join(", "),
            self.confidence
        )
    }
}
