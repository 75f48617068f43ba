use aurora_math::*;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PositionKeyFrame {
    pub time: f32,
    pub position: Vec3,
}

impl PositionKeyFrame {
    pub fn new(time: f32, position: Vec3) -> Self {
        Self { time, position }
    }
}

/// Orientation keyframe: rotation axis plus the scalar part `q` of the
/// rotation quaternion.
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuaternionKeyFrame {
    pub time: f32,
    pub axis: Vec3,
    pub q: f32,
}

impl QuaternionKeyFrame {
    pub fn new(time: f32, axis: Vec3, q: f32) -> Self {
        Self { time, axis, q }
    }

    /// Rotation angle in degrees encoded by `q`.
    pub fn angle(&self) -> f32 {
        quaternion_angle(self.q)
    }

    pub fn orientation(&self) -> Vec4 {
        self.axis.extend(self.angle())
    }
}

fn quaternion_angle(q: f32) -> f32 {
    (2.0 * q.clamp(-1.0, 1.0).acos()).to_degrees()
}

/// Local transform of a node.
///
/// `orientation` is an axis-angle rotation packed as `(x, y, z, degrees)`,
/// `rotation` an additional Euler rotation in degrees applied after it.
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    pub position: Vec3,
    pub rotation: Vec3,
    pub orientation: Vec4,
    pub scale: Vec3,
    pub position_frames: Vec<PositionKeyFrame>,
    pub orientation_frames: Vec<QuaternionKeyFrame>,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            orientation: Vec4::ZERO,
            scale: Vec3::ONE,
            position_frames: Vec::new(),
            orientation_frames: Vec::new(),
        }
    }
}

enum Keyframe {
    Exact(usize),
    Between(usize, f32),
}

fn locate<K>(frames: &[K], time: f32, time_of: impl Fn(&K) -> f32) -> Option<Keyframe> {
    if frames.len() < 2 {
        return frames.first().map(|_| Keyframe::Exact(0));
    }

    let mut last = 0;
    for (i, frame) in frames.iter().enumerate() {
        if time_of(frame) > time {
            break;
        }
        last = i;
    }

    let t0 = time_of(&frames[last]);
    match frames.get(last + 1) {
        Some(next) if t0 != time => {
            let t1 = time_of(next);
            Some(Keyframe::Between(last, (time - t0) / (t1 - t0)))
        }
        _ => Some(Keyframe::Exact(last)),
    }
}

fn sort_by_time<K>(frames: &mut [K], time_of: impl Fn(&K) -> f32) {
    frames.sort_by(|a, b| {
        time_of(a)
            .partial_cmp(&time_of(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

impl TransformState {
    pub fn new(position: Vec3, orientation: Vec4, scale: Vec3) -> Self {
        Self {
            position,
            orientation,
            scale,
            ..Self::default()
        }
    }

    /// `T(position) * R(orientation) * Rx * Ry * Rz * S(scale)`.
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::IDENTITY
            .translated(self.position)
            .oriented(self.orientation)
            .rotated_euler(self.rotation)
            .scaled(self.scale)
    }

    /// Replaces the position track. Frames are kept ordered by time.
    pub fn set_position_frames(&mut self, mut frames: Vec<PositionKeyFrame>) {
        sort_by_time(&mut frames, |f| f.time);
        self.position_frames = frames;
    }

    /// Replaces the orientation track. Frames are kept ordered by time.
    pub fn set_orientation_frames(&mut self, mut frames: Vec<QuaternionKeyFrame>) {
        sort_by_time(&mut frames, |f| f.time);
        self.orientation_frames = frames;
    }

    /// Position at `time`, or `None` without a position track. Times before
    /// the first keyframe extrapolate along the first segment.
    pub fn interpolate_position(&self, time: f32) -> Option<Vec3> {
        let frames = &self.position_frames;
        match locate(frames, time, |f| f.time)? {
            Keyframe::Exact(i) => Some(frames[i].position),
            Keyframe::Between(i, f) => {
                Some(frames[i + 1].position * f + frames[i].position * (1.0 - f))
            }
        }
    }

    /// Orientation at `time` as `(x, y, z, degrees)`, or `None` without an
    /// orientation track.
    ///
    /// The axis and `q` are blended linearly and the angle is derived from the
    /// blended `q`, which only approximates a proper slerp.
    pub fn interpolate_orientation(&self, time: f32) -> Option<Vec4> {
        let frames = &self.orientation_frames;
        match locate(frames, time, |f| f.time)? {
            Keyframe::Exact(i) => Some(frames[i].orientation()),
            Keyframe::Between(i, f) => {
                let (last, next) = (&frames[i], &frames[i + 1]);
                let axis = next.axis * f + last.axis * (1.0 - f);
                let q = next.q * f + last.q * (1.0 - f);
                Some(axis.extend(quaternion_angle(q)))
            }
        }
    }
}
