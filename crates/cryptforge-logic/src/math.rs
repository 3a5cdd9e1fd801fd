//! Vectors, boxes and yaw-only rigid transforms.
//!
//! Coordinates are left-handed with +Y up and +Z forward. Module poses only
//! ever rotate about the vertical axis, so a rotation is stored as a single
//! yaw angle rather than a quaternion.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Flattened vectors shorter than this have no usable heading.
pub const HEADING_EPSILON: f32 = 1e-5;

/// 3D vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
    pub const ONE: Self = Self { x: 1.0, y: 1.0, z: 1.0 };
    pub const UP: Self = Self { x: 0.0, y: 1.0, z: 0.0 };
    pub const FORWARD: Self = Self { x: 0.0, y: 0.0, z: 1.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Unit vector in the same direction, or zero for a zero-length input.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self {
                x: self.x / len,
                y: self.y / len,
                z: self.z / len,
            }
        } else {
            Self::ZERO
        }
    }

    /// Projection onto the horizontal plane (vertical component zeroed).
    pub fn flatten(&self) -> Self {
        Self {
            x: self.x,
            y: 0.0,
            z: self.z,
        }
    }

    pub fn min(&self, other: &Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn max(&self, other: &Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl std::ops::AddAssign for Vec3 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl std::ops::Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
            z: self.z * scalar,
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(&max),
            max: min.max(&max),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half of the size along each axis.
    pub fn extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// True when any axis has zero or negative size.
    pub fn is_degenerate(&self) -> bool {
        let s = self.size();
        s.x <= 0.0 || s.y <= 0.0 || s.z <= 0.0
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Grow the size by `amount` along every axis, keeping the center.
    ///
    /// Each face moves outward by `amount / 2`.
    pub fn expanded(&self, amount: f32) -> Self {
        Self::from_center_size(self.center(), self.size() + Vec3::splat(amount))
    }

    /// Scale the size by `factor` around the center.
    pub fn scaled(&self, factor: f32) -> Self {
        Self::from_center_size(self.center(), self.size() * factor)
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Inclusive overlap test: boxes sharing only a face count as intersecting.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains(&self, point: &Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
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

    /// World-space box enclosing this local box after `pose` is applied.
    pub fn transformed(&self, pose: &Pose) -> Self {
        let corners = self.corners();
        let first = pose.transform_point(corners[0]);
        let mut out = Self {
            min: first,
            max: first,
        };
        for c in &corners[1..] {
            let p = pose.transform_point(*c);
            out.min = out.min.min(&p);
            out.max = out.max.max(&p);
        }
        out
    }
}

/// Rotation about the vertical axis, in radians.
///
/// A yaw of `θ` maps +Z onto `(sin θ, 0, cos θ)`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Yaw(pub f32);

impl Yaw {
    pub const IDENTITY: Self = Self(0.0);

    /// Heading of `direction` projected onto the horizontal plane.
    ///
    /// Returns `None` for purely vertical (or zero) directions.
    pub fn from_direction(direction: Vec3) -> Option<Self> {
        let flat = direction.flatten();
        if flat.length() < HEADING_EPSILON {
            return None;
        }
        let flat = flat.normalize();
        Some(Self(flat.x.atan2(flat.z)))
    }

    pub fn from_degrees(degrees: f32) -> Self {
        Self(degrees.to_radians()).wrapped()
    }

    pub fn radians(&self) -> f32 {
        self.0
    }

    pub fn degrees(&self) -> f32 {
        self.0.to_degrees()
    }

    /// Same rotation expressed in `(-π, π]`.
    pub fn wrapped(self) -> Self {
        let mut a = self.0 % (2.0 * PI);
        if a <= -PI {
            a += 2.0 * PI;
        } else if a > PI {
            a -= 2.0 * PI;
        }
        Self(a)
    }

    /// `self` applied after `other`.
    pub fn then_after(self, other: Self) -> Self {
        Self(self.0 + other.0).wrapped()
    }

    pub fn inverse(self) -> Self {
        Self(-self.0)
    }

    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let (s, c) = self.0.sin_cos();
        Vec3 {
            x: v.x * c + v.z * s,
            y: v.y,
            z: -v.x * s + v.z * c,
        }
    }
}

/// Position and heading of a placed module.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Yaw,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Yaw::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Yaw) -> Self {
        Self { position, rotation }
    }

    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation.rotate(local)
    }

    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation.rotate(local)
    }
}

/// Up vector of a frame looking along `forward`, with world up as the hint.
///
/// Falls back to world up when `forward` is vertical.
pub fn look_up_vector(forward: Vec3) -> Vec3 {
    let f = forward.normalize();
    let right = Vec3::UP.cross(&f);
    if right.length() < HEADING_EPSILON {
        return Vec3::UP;
    }
    f.cross(&right.normalize()).normalize()
}
