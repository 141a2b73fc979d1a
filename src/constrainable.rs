//! Constraint arguments
//!
//! Constraints never see candidates directly. A candidate is first adapted
//! into a [`Constrainable`] (a line when its label is `Line`, a generic shape
//! otherwise) and then optionally narrowed to a point with [`select`].
//!
//! Each adapter kind supports its own set of sub-parts:
//!
//! - lines: every [`SubPart`]; `End1`/`End2` are the literal stroke ends and
//!   the extremal ends pick between them
//! - shapes: every [`SubPart`]; ends resolve to bounding-box corners
//! - points: only `None` and `Center`, both of which return the point itself

use crate::error::AdapterError;
use crate::geometry::{BoundingBox, Point};
use crate::model::{Candidate, CandidateId, SubPart};

/// A straight segment between two endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct ConstrainableLine {
    pub source: CandidateId,
    pub end1: Point,
    pub end2: Point,
}

impl ConstrainableLine {
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points([self.end1, self.end2]).unwrap_or_else(BoundingBox::zero)
    }

    pub fn length(&self) -> f64 {
        self.end1.distance(&self.end2)
    }

    /// Direction of the line in degrees, normalized to `[0, 180)`
    pub fn angle_degrees(&self) -> f64 {
        let dy = self.end2.y - self.end1.y;
        let dx = self.end2.x - self.end1.x;
        let angle = dy.atan2(dx).to_degrees().rem_euclid(180.0);
        if angle >= 180.0 {
            0.0
        } else {
            angle
        }
    }

    fn top_most_end(&self) -> Point {
        if self.end1.y <= self.end2.y {
            self.end1
        } else {
            self.end2
        }
    }

    fn bottom_most_end(&self) -> Point {
        if self.end1.y > self.end2.y {
            self.end1
        } else {
            self.end2
        }
    }

    fn left_most_end(&self) -> Point {
        if self.end1.x <= self.end2.x {
            self.end1
        } else {
            self.end2
        }
    }

    fn right_most_end(&self) -> Point {
        if self.end1.x > self.end2.x {
            self.end1
        } else {
            self.end2
        }
    }
}

/// Any non-line shape, described by its extent
#[derive(Debug, Clone, PartialEq)]
pub struct ConstrainableShape {
    pub source: CandidateId,
    pub label: String,
    pub bounds: BoundingBox,
}

/// A single location taken from a line or shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstrainablePoint {
    pub source: CandidateId,
    pub point: Point,
}

/// The argument type every constraint consumes
#[derive(Debug, Clone, PartialEq)]
pub enum Constrainable {
    Line(ConstrainableLine),
    Shape(ConstrainableShape),
    Point(ConstrainablePoint),
}

impl Constrainable {
    pub fn kind(&self) -> &'static str {
        match self {
            Constrainable::Line(_) => "line",
            Constrainable::Shape(_) => "shape",
            Constrainable::Point(_) => "point",
        }
    }

    /// The candidate this argument was derived from
    pub fn source(&self) -> CandidateId {
        match self {
            Constrainable::Line(l) => l.source,
            Constrainable::Shape(s) => s.source,
            Constrainable::Point(p) => p.source,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Constrainable::Line(l) => l.bounding_box(),
            Constrainable::Shape(s) => s.bounds,
            Constrainable::Point(p) => BoundingBox::new(p.point.x, p.point.y, 0.0, 0.0),
        }
    }

    /// The point itself, or the center of a line or shape
    pub fn reference_point(&self) -> Point {
        match self {
            Constrainable::Point(p) => p.point,
            other => other.bounding_box().center(),
        }
    }

    pub fn as_line(&self) -> Option<&ConstrainableLine> {
        match self {
            Constrainable::Line(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Constrainable::Point(p) => Some(p.point),
            _ => None,
        }
    }

    /// Whether this adapter kind has the given sub-part
    ///
    /// Lines and shapes answer every [`SubPart`]. A line's ends are its
    /// stroke endpoints and a shape's ends map to bounding-box corners; every
    /// other selector is a point on the bounding box. A point only has
    /// itself, so it accepts `None` and `Center` alone.
    pub fn supports(&self, sub_part: SubPart) -> bool {
        match self {
            Constrainable::Line(_) | Constrainable::Shape(_) => true,
            Constrainable::Point(_) => matches!(sub_part, SubPart::None | SubPart::Center),
        }
    }
}

/// Wrap a candidate as a line or generic shape depending on its label
pub fn adapt(candidate: &Candidate) -> Result<Constrainable, AdapterError> {
    if candidate.is_line() {
        let (end1, end2) = candidate
            .first_point()
            .zip(candidate.last_point())
            .ok_or_else(|| AdapterError::missing_geometry(candidate))?;
        Ok(Constrainable::Line(ConstrainableLine {
            source: candidate.id,
            end1,
            end2,
        }))
    } else {
        let bounds = candidate
            .bounding_box()
            .ok_or_else(|| AdapterError::missing_geometry(candidate))?;
        Ok(Constrainable::Shape(ConstrainableShape {
            source: candidate.id,
            label: candidate.label.clone(),
            bounds,
        }))
    }
}

/// Narrow an argument to one of its sub-parts
///
/// `SubPart::None` returns the input unchanged. A sub-part the adapter kind
/// does not have is an [`AdapterError::InvalidSelector`].
pub fn select(constrainable: &Constrainable, sub_part: SubPart) -> Result<Constrainable, AdapterError> {
    if !constrainable.supports(sub_part) {
        return Err(AdapterError::invalid_selector(constrainable.kind(), sub_part));
    }
    if sub_part == SubPart::None {
        return Ok(constrainable.clone());
    }

    let point = match constrainable {
        Constrainable::Point(_) => return Ok(constrainable.clone()),
        Constrainable::Line(line) => match sub_part {
            SubPart::End1 => line.end1,
            SubPart::End2 => line.end2,
            SubPart::TopMostEnd => line.top_most_end(),
            SubPart::BottomMostEnd => line.bottom_most_end(),
            SubPart::LeftMostEnd => line.left_most_end(),
            SubPart::RightMostEnd => line.right_most_end(),
            other => box_point(&line.bounding_box(), other)
                .ok_or_else(|| AdapterError::invalid_selector("line", other))?,
        },
        Constrainable::Shape(shape) => {
            let bb = &shape.bounds;
            match sub_part {
                SubPart::End1 | SubPart::BottomMostEnd | SubPart::LeftMostEnd => bb.bottom_left(),
                SubPart::End2 => bb.bottom_right(),
                SubPart::TopMostEnd | SubPart::RightMostEnd => bb.top_right(),
                other => box_point(bb, other)
                    .ok_or_else(|| AdapterError::invalid_selector("shape", other))?,
            }
        }
    };

    Ok(Constrainable::Point(ConstrainablePoint {
        source: constrainable.source(),
        point,
    }))
}

/// Adapt a candidate and select a sub-part in one step
pub fn adapt_part(candidate: &Candidate, sub_part: SubPart) -> Result<Constrainable, AdapterError> {
    select(&adapt(candidate)?, sub_part)
}

fn box_point(bb: &BoundingBox, sub_part: SubPart) -> Option<Point> {
    let point = match sub_part {
        SubPart::TopLeft => bb.top_left(),
        SubPart::TopCenter => bb.top_center(),
        SubPart::TopRight => bb.top_right(),
        SubPart::CenterLeft => bb.center_left(),
        SubPart::Center => bb.center(),
        SubPart::CenterRight => bb.center_right(),
        SubPart::BottomLeft => bb.bottom_left(),
        SubPart::BottomCenter => bb.bottom_center(),
        SubPart::BottomRight => bb.bottom_right(),
        _ => return None,
    };
    Some(point)
}
