use glam::{Mat4, Vec3};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box. A freshly created box is empty and absorbs the
/// first point or box grown into it.
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    pub fn new() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        let mut bb = Self::new();
        bb.grow(min);
        bb.grow(max);
        bb
    }

    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut bb = Self::new();
        points.into_iter().for_each(|p| bb.grow(p));
        bb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn grow_bb(&mut self, other: &BoundingBox) {
        if other.is_empty() {
            return;
        }

        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn union(mut self, other: &BoundingBox) -> Self {
        self.grow_bb(other);
        self
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Transforms all eight corners and returns the box enclosing them.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }

        Self::from_points(self.corners().iter().map(|c| matrix.transform_point3(*c)))
    }

    pub fn lengths(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn width(&self) -> f32 {
        self.lengths().x
    }

    pub fn height(&self) -> f32 {
        self.lengths().y
    }

    pub fn depth(&self) -> f32 {
        self.lengths().z
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.min + (self.max - self.min) * 0.5
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        !self.is_empty() && point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// An empty box is contained by every box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.is_empty() || (self.contains_point(other.min) && self.contains_point(other.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_absorbs_first_point() {
        let mut bb = BoundingBox::new();
        assert!(bb.is_empty());
        assert_eq!(bb.lengths(), Vec3::ZERO);

        bb.grow(Vec3::new(1.0, 2.0, 3.0));
        assert!(!bb.is_empty());
        assert_eq!(bb.min(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bb.max(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn union_ignores_empty() {
        let a = BoundingBox::from_min_max(Vec3::ZERO, Vec3::ONE);
        let b = a.union(&BoundingBox::new());
        assert_eq!(a, b);

        let c = a.union(&BoundingBox::from_min_max(Vec3::splat(-1.0), Vec3::splat(0.5)));
        assert_eq!(c.min(), Vec3::splat(-1.0));
        assert_eq!(c.max(), Vec3::ONE);
        assert!(c.contains(&a));
        assert!(!a.contains(&c));
    }

    #[test]
    fn transformed_encloses_rotated_corners() {
        let bb = BoundingBox::from_min_max(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let m = Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0))
            * Mat4::from_rotation_z(90f32.to_radians());
        let t = bb.transformed(&m);

        assert!((t.min() - Vec3::new(9.0, 0.0, 0.0)).abs().max_element() < 1e-4);
        assert!((t.max() - Vec3::new(10.0, 2.0, 1.0)).abs().max_element() < 1e-4);
        assert!((t.center() - Vec3::new(9.5, 1.0, 0.5)).abs().max_element() < 1e-4);
    }
}
