pub use glam::*;

mod bounds;

pub use bounds::*;

/// Post-multiplying transform builders, applied in the order they are called.
///
/// `m.translated(t).rotated(a, axis).scaled(s)` yields `m * T * R * S`, so the
/// last call is the first transform applied to a point.
pub trait TransformExt: Sized {
    fn translated(self, offset: Vec3) -> Self;

    /// Rotates by `degrees` around `axis`. A zero angle or a degenerate axis is a no-op.
    fn rotated(self, degrees: f32, axis: Vec3) -> Self;

    fn scaled(self, scale: Vec3) -> Self;

    fn get_position(&self) -> Vec3;

    /// Rotates by an axis-angle orientation stored as `(x, y, z, degrees)`.
    fn oriented(self, orientation: Vec4) -> Self {
        self.rotated(orientation.w, orientation.truncate())
    }

    /// Rotates around X, then Y, then Z by the given Euler angles in degrees.
    fn rotated_euler(self, degrees: Vec3) -> Self {
        self.rotated(degrees.x, Vec3::X)
            .rotated(degrees.y, Vec3::Y)
            .rotated(degrees.z, Vec3::Z)
    }
}

impl TransformExt for Mat4 {
    fn translated(self, offset: Vec3) -> Self {
        self * Mat4::from_translation(offset)
    }

    fn rotated(self, degrees: f32, axis: Vec3) -> Self {
        if degrees == 0.0 {
            return self;
        }

        match axis.try_normalize() {
            Some(axis) => self * Mat4::from_axis_angle(axis, degrees.to_radians()),
            None => self,
        }
    }

    fn scaled(self, scale: Vec3) -> Self {
        self * Mat4::from_scale(scale)
    }

    fn get_position(&self) -> Vec3 {
        self.w_axis.truncate()
    }
}
