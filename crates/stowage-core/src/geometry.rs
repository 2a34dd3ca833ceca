//! Axis-aligned box geometry
//!
//! Every container is a box anchored at the origin. Axes are named after the
//! container faces they run along:
//! - `width`: left to right
//! - `depth`: from the open face (depth = 0) towards the back wall
//! - `height`: floor to ceiling
//!
//! Boxes are compared with a small tolerance so that values coming from
//! floating-point arithmetic (free-space splitting, CSV round-trips) do not
//! produce phantom overlaps.

use serde::{Deserialize, Serialize};

/// Tolerance used by every geometric comparison
pub const EPSILON: f64 = 1e-9;

/// Extent of an item or container along the three axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Dimensions {
    /// Create new dimensions
    pub fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// Volume of a box with these dimensions
    pub fn volume(&self) -> f64 {
        self.width * self.depth * self.height
    }

    /// All three extents are finite and strictly positive
    pub fn is_valid(&self) -> bool {
        [self.width, self.depth, self.height]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }

    /// Check whether a box of these dimensions fits inside `other`
    pub fn fits_within(&self, other: &Dimensions) -> bool {
        self.width <= other.width + EPSILON
            && self.depth <= other.depth + EPSILON
            && self.height <= other.height + EPSILON
    }

    /// The distinct orientations permitted by `policy`, original first
    pub fn orientations(&self, policy: OrientationPolicy) -> Vec<Dimensions> {
        let (w, d, h) = (self.width, self.depth, self.height);
        let candidates = match policy {
            OrientationPolicy::AxisLocked => vec![*self],
            OrientationPolicy::AnyRotation => vec![
                Dimensions::new(w, d, h),
                Dimensions::new(w, h, d),
                Dimensions::new(d, w, h),
                Dimensions::new(d, h, w),
                Dimensions::new(h, w, d),
                Dimensions::new(h, d, w),
            ],
        };

        let mut distinct: Vec<Dimensions> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !distinct.iter().any(|seen| seen.approx_eq(&candidate)) {
                distinct.push(candidate);
            }
        }
        distinct
    }

    /// Check whether `other` is one of the axis permutations of `self`
    pub fn is_rotation_of(&self, other: &Dimensions) -> bool {
        self.orientations(OrientationPolicy::AnyRotation)
            .iter()
            .any(|o| o.approx_eq(other))
    }

    fn approx_eq(&self, other: &Dimensions) -> bool {
        (self.width - other.width).abs() <= EPSILON
            && (self.depth - other.depth).abs() <= EPSILON
            && (self.height - other.height).abs() <= EPSILON
    }
}

/// Which axis permutations the planner may try for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrientationPolicy {
    /// The item keeps its declared width/depth/height
    AxisLocked,
    /// Any of the 6 axis-aligned permutations
    #[default]
    AnyRotation,
}

/// A point inside a container
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Coordinates {
    /// Create a new point
    pub fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }

    /// The container origin
    pub fn origin() -> Self {
        Self::default()
    }

    /// Translate this point by `dims`
    pub fn offset(&self, dims: &Dimensions) -> Coordinates {
        Coordinates::new(
            self.width + dims.width,
            self.depth + dims.depth,
            self.height + dims.height,
        )
    }
}

/// An axis-aligned box given by its start (minimum) and end (maximum) corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    #[serde(rename = "startCoordinates")]
    pub start: Coordinates,
    #[serde(rename = "endCoordinates")]
    pub end: Coordinates,
}

impl Cuboid {
    /// Create a box from its two corners
    pub fn new(start: Coordinates, end: Coordinates) -> Self {
        Self { start, end }
    }

    /// Create a box of `dims` anchored at `start`
    pub fn at(start: Coordinates, dims: &Dimensions) -> Self {
        Self {
            start,
            end: start.offset(dims),
        }
    }

    /// The box covering a whole container of the given dimensions
    pub fn bounds(dims: &Dimensions) -> Self {
        Self::at(Coordinates::origin(), dims)
    }

    /// Extent along each axis
    pub fn extent(&self) -> Dimensions {
        Dimensions::new(
            self.end.width - self.start.width,
            self.end.depth - self.start.depth,
            self.end.height - self.start.height,
        )
    }

    pub fn volume(&self) -> f64 {
        self.extent().volume()
    }

    /// End is at or beyond start on every axis and all values are finite
    pub fn is_well_formed(&self) -> bool {
        let values = [
            self.start.width,
            self.start.depth,
            self.start.height,
            self.end.width,
            self.end.depth,
            self.end.height,
        ];
        values.iter().all(|v| v.is_finite())
            && self.end.width >= self.start.width
            && self.end.depth >= self.start.depth
            && self.end.height >= self.start.height
    }

    /// Has no interior on at least one axis
    pub fn is_degenerate(&self) -> bool {
        let e = self.extent();
        e.width <= EPSILON || e.depth <= EPSILON || e.height <= EPSILON
    }

    /// Open-interval overlap on all three axes
    ///
    /// Boxes that only share a face, edge or corner do not overlap.
    pub fn overlaps(&self, other: &Cuboid) -> bool {
        open_overlap(self.start.width, self.end.width, other.start.width, other.end.width)
            && open_overlap(self.start.depth, self.end.depth, other.start.depth, other.end.depth)
            && open_overlap(
                self.start.height,
                self.end.height,
                other.start.height,
                other.end.height,
            )
    }

    /// Check whether `other` lies entirely inside this box
    pub fn contains(&self, other: &Cuboid) -> bool {
        other.start.width >= self.start.width - EPSILON
            && other.start.depth >= self.start.depth - EPSILON
            && other.start.height >= self.start.height - EPSILON
            && other.end.width <= self.end.width + EPSILON
            && other.end.depth <= self.end.depth + EPSILON
            && other.end.height <= self.end.height + EPSILON
    }

    /// Overlap of the width x height projections (depth ignored)
    pub fn footprint_overlaps(&self, other: &Cuboid) -> bool {
        open_overlap(self.start.width, self.end.width, other.start.width, other.end.width)
            && open_overlap(
                self.start.height,
                self.end.height,
                other.start.height,
                other.end.height,
            )
    }

    /// This box ends at or before `other` starts along the depth axis,
    /// i.e. it sits between the open face and `other`
    pub fn is_in_front_of(&self, other: &Cuboid) -> bool {
        self.end.depth <= other.start.depth + EPSILON
    }

    /// The common part of two boxes, if they overlap
    pub fn intersection(&self, other: &Cuboid) -> Option<Cuboid> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Cuboid::new(
            Coordinates::new(
                self.start.width.max(other.start.width),
                self.start.depth.max(other.start.depth),
                self.start.height.max(other.start.height),
            ),
            Coordinates::new(
                self.end.width.min(other.end.width),
                self.end.depth.min(other.end.depth),
                self.end.height.min(other.end.height),
            ),
        ))
    }

    /// Guillotine split of `self` minus `other`
    ///
    /// The remainder is cut along width first, then depth inside the
    /// middle width slab, then height inside the middle width/depth column.
    /// The returned pieces are pairwise disjoint and never degenerate.
    pub fn subtract(&self, other: &Cuboid) -> Vec<Cuboid> {
        let cut = match self.intersection(other) {
            Some(cut) => cut,
            None => return vec![*self],
        };

        let (s, e) = (self.start, self.end);
        let mut pieces = Vec::with_capacity(6);

        // width: left and right slabs span the full depth and height
        pieces.push(Cuboid::new(s, Coordinates::new(cut.start.width, e.depth, e.height)));
        pieces.push(Cuboid::new(Coordinates::new(cut.end.width, s.depth, s.height), e));

        // depth: front and back slabs inside the middle width band
        pieces.push(Cuboid::new(
            Coordinates::new(cut.start.width, s.depth, s.height),
            Coordinates::new(cut.end.width, cut.start.depth, e.height),
        ));
        pieces.push(Cuboid::new(
            Coordinates::new(cut.start.width, cut.end.depth, s.height),
            Coordinates::new(cut.end.width, e.depth, e.height),
        ));

        // height: below and above inside the middle width/depth column
        pieces.push(Cuboid::new(
            Coordinates::new(cut.start.width, cut.start.depth, s.height),
            Coordinates::new(cut.end.width, cut.end.depth, cut.start.height),
        ));
        pieces.push(Cuboid::new(
            Coordinates::new(cut.start.width, cut.start.depth, cut.end.height),
            Coordinates::new(cut.end.width, cut.end.depth, e.height),
        ));

        pieces.retain(|piece| !piece.is_degenerate());
        pieces
    }
}

fn open_overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
    a_start < b_end - EPSILON && b_start < a_end - EPSILON
}
