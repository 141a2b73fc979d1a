//! A small set of concrete constraints for the CLI and demos
//!
//! Each constraint measures an error (a distance or an angle) and maps it
//! linearly onto a confidence: 1 at zero error, 0 at the tolerance. The
//! tolerance is scaled by the definition's threshold multiplier.

use crate::constrainable::Constrainable;
use crate::model::ConstraintDefinition;

use super::{Constraint, ConstraintRegistry};

/// Distance in sketch units at which two points stop being coincident
pub const COINCIDENT_TOLERANCE: f64 = 15.0;

/// Angular tolerance in degrees for orientation constraints
pub const ANGLE_TOLERANCE: f64 = 20.0;

/// Vertical overlap in sketch units tolerated by `Above`
pub const ABOVE_TOLERANCE: f64 = 10.0;

/// Below this, an orientation result only reflects a stroke at the edge of the tolerance
pub const ORIENTATION_CLEARLY_FALSE: f64 = 0.2;

/// Register every reference constraint
pub(crate) fn register_all(registry: &mut ConstraintRegistry) {
    type Constructor = fn(&ConstraintDefinition) -> Box<dyn Constraint>;

    fn coincident(d: &ConstraintDefinition) -> Box<dyn Constraint> {
        Box::new(Coincident::new(d.threshold_multiplier))
    }
    fn horizontal(d: &ConstraintDefinition) -> Box<dyn Constraint> {
        Box::new(Orientation::new("Horizontal", 0.0, d.threshold_multiplier))
    }
    fn vertical(d: &ConstraintDefinition) -> Box<dyn Constraint> {
        Box::new(Orientation::new("Vertical", 90.0, d.threshold_multiplier))
    }
    fn parallel(d: &ConstraintDefinition) -> Box<dyn Constraint> {
        Box::new(Parallel::new(d.threshold_multiplier))
    }
    fn above(d: &ConstraintDefinition) -> Box<dyn Constraint> {
        Box::new(Above::new(d.threshold_multiplier))
    }

    let entries: [(&str, usize, Constructor); 5] = [
        ("Coincident", 2, coincident),
        ("Horizontal", 1, horizontal),
        ("Vertical", 1, vertical),
        ("Parallel", 2, parallel),
        ("Above", 2, above),
    ];
    for (name, arity, constructor) in entries {
        if registry.register(name, arity, constructor).is_err() {
            log::warn!("constraint {} is already registered, keeping the existing one", name);
        }
    }
}

/// Confidence for an error measured against a tolerance
pub fn linear_falloff(error: f64, tolerance: f64) -> f64 {
    if tolerance <= 0.0 {
        return if error <= 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - error.abs() / tolerance).clamp(0.0, 1.0)
}

/// Smallest difference between two undirected angles, in `[0, 90]`
fn angle_between(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(180.0);
    diff.min(180.0 - diff)
}

/// Two arguments share a location
#[derive(Debug, Clone)]
pub struct Coincident {
    tolerance: f64,
}

impl Coincident {
    pub fn new(multiplier: f64) -> Self {
        Self {
            tolerance: COINCIDENT_TOLERANCE * multiplier,
        }
    }
}

impl Constraint for Coincident {
    fn name(&self) -> &str {
        "Coincident"
    }

    fn arity(&self) -> usize {
        2
    }

    fn solve(&self, args: &[Constrainable]) -> f64 {
        match args {
            [a, b] => linear_falloff(a.reference_point().distance(&b.reference_point()), self.tolerance),
            _ => 0.0,
        }
    }
}

/// A line lies at a fixed angle
#[derive(Debug, Clone)]
pub struct Orientation {
    name: &'static str,
    target_degrees: f64,
    tolerance: f64,
}

impl Orientation {
    pub fn new(name: &'static str, target_degrees: f64, multiplier: f64) -> Self {
        Self {
            name,
            target_degrees,
            tolerance: ANGLE_TOLERANCE * multiplier,
        }
    }
}

impl Constraint for Orientation {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        1
    }

    fn solve(&self, args: &[Constrainable]) -> f64 {
        match args {
            [arg] => match arg.as_line() {
                Some(line) => linear_falloff(
                    angle_between(line.angle_degrees(), self.target_degrees),
                    self.tolerance,
                ),
                None => 0.0,
            },
            _ => 0.0,
        }
    }

    fn is_clearly_false(&self, confidence: f64) -> bool {
        confidence < ORIENTATION_CLEARLY_FALSE
    }
}

/// Two lines share a direction
#[derive(Debug, Clone)]
pub struct Parallel {
    tolerance: f64,
}

impl Parallel {
    pub fn new(multiplier: f64) -> Self {
        Self {
            tolerance: ANGLE_TOLERANCE * multiplier,
        }
    }
}

impl Constraint for Parallel {
    fn name(&self) -> &str {
        "Parallel"
    }

    fn arity(&self) -> usize {
        2
    }

    fn solve(&self, args: &[Constrainable]) -> f64 {
        match args {
            [a, b] => match (a.as_line(), b.as_line()) {
                (Some(a), Some(b)) => {
                    linear_falloff(angle_between(a.angle_degrees(), b.angle_degrees()), self.tolerance)
                }
                _ => 0.0,
            },
            _ => 0.0,
        }
    }
}

/// The first argument sits above the second (smaller y)
#[derive(Debug, Clone)]
pub struct Above {
    tolerance: f64,
}

impl Above {
    pub fn new(multiplier: f64) -> Self {
        Self {
            tolerance: ABOVE_TOLERANCE * multiplier,
        }
    }
}

impl Constraint for Above {
    fn name(&self) -> &str {
        "Above"
    }

    fn arity(&self) -> usize {
        2
    }

    fn solve(&self, args: &[Constrainable]) -> f64 {
        match args {
            [a, b] => {
                let overlap = a.bounding_box().bottom() - b.bounding_box().y;
                linear_falloff(overlap.max(0.0), self.tolerance)
            }
            _ => 0.0,
        }
    }
}
