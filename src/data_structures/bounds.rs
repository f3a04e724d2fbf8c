//! Axis-aligned bounding boxes and the framing transform derived from them.

use cgmath::{Matrix4, Vector3};

/// Component-wise min/max box.
///
/// [`Aabb::EMPTY`] uses `+inf`/`-inf` corners. It is the identity of [`Aabb::union`],
/// so a model without positions never changes an aggregate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vector3 {
            x: f32::INFINITY,
            y: f32::INFINITY,
            z: f32::INFINITY,
        },
        max: Vector3 {
            x: f32::NEG_INFINITY,
            y: f32::NEG_INFINITY,
            z: f32::NEG_INFINITY,
        },
    };

    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.extend(p);
        }
        aabb
    }

    pub fn extend(&mut self, p: &[f32; 3]) {
        self.min = Vector3::new(self.min.x.min(p[0]), self.min.y.min(p[1]), self.min.z.min(p[2]));
        self.max = Vector3::new(self.max.x.max(p[0]), self.max.y.max(p[1]), self.max.z.max(p[2]));
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: Vector3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Vector3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// `false` when min exceeds max on any axis, i.e. nothing contributed.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Vector3<f32> {
        self.min + self.extent() / 2.0
    }

    /// Uniform scale and translation that center the box at the origin with its
    /// largest side at unit length. `None` for an invalid box.
    ///
    /// A box that collapses to a point is only translated.
    pub fn framing_transform(&self) -> Option<Matrix4<f32>> {
        if !self.is_valid() {
            return None;
        }
        let extent = self.extent();
        let max_comp = extent.x.max(extent.y).max(extent.z);
        let scale = if max_comp > 0.0 { 1.0 / max_comp } else { 1.0 };
        Some(Matrix4::from_scale(scale) * Matrix4::from_translation(-self.center()))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Fold any number of boxes into one.
pub fn reduce<'a>(boxes: impl IntoIterator<Item = &'a Aabb>) -> Aabb {
    boxes.into_iter().fold(Aabb::EMPTY, |acc, b| acc.union(b))
}
