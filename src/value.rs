use glam::{Quat, Vec3};
use interpolation::Lerp;
use std::fmt;

/// Default tolerance used by [`crate::CompletionPolicy::TimeOrDistance`].
///
/// Same unit as the tweened value: world units for vectors, radians for rotations.
pub const DEFAULT_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar,
    Vector3,
    Rotation,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Vector3 => "vector3",
            ValueKind::Rotation => "rotation",
        };
        f.write_str(name)
    }
}

/// A value that can be tweened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenValue {
    Scalar(f32),
    Vector3(Vec3),
    Rotation(Quat),
}

impl TweenValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TweenValue::Scalar(_) => ValueKind::Scalar,
            TweenValue::Vector3(_) => ValueKind::Vector3,
            TweenValue::Rotation(_) => ValueKind::Rotation,
        }
    }

    pub fn as_scalar(&self) -> Option<f32> {
        match *self {
            TweenValue::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match *self {
            TweenValue::Vector3(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_quat(&self) -> Option<Quat> {
        match *self {
            TweenValue::Rotation(v) => Some(v),
            _ => None,
        }
    }

    /// Interpolates between `self` and `end` by `alpha`.
    ///
    /// Scalars and vectors are blended linearly. Rotations use a spherical
    /// interpolation along the shortest arc: `q` and `-q` describe the same
    /// orientation, so the end is flipped into the start's hemisphere first.
    /// Returns `None` when the two values are of different kinds.
    pub fn interpolate(&self, end: &TweenValue, alpha: f32) -> Option<TweenValue> {
        match (*self, *end) {
            (TweenValue::Scalar(a), TweenValue::Scalar(b)) => {
                Some(TweenValue::Scalar(Lerp::lerp(&a, &b, &alpha)))
            }
            (TweenValue::Vector3(a), TweenValue::Vector3(b)) => {
                Some(TweenValue::Vector3(a.lerp(b, alpha)))
            }
            (TweenValue::Rotation(a), TweenValue::Rotation(b)) => {
                Some(TweenValue::Rotation(slerp_shortest(a, b, alpha)))
            }
            _ => None,
        }
    }

    /// Distance between two values of the same kind.
    ///
    /// For rotations this is the angle (radians) of the rotation taking one to the other.
    pub fn distance(&self, other: &TweenValue) -> Option<f32> {
        match (*self, *other) {
            (TweenValue::Scalar(a), TweenValue::Scalar(b)) => Some((b - a).abs()),
            (TweenValue::Vector3(a), TweenValue::Vector3(b)) => Some(a.distance(b)),
            (TweenValue::Rotation(a), TweenValue::Rotation(b)) => {
                let delta = (a.normalize().inverse() * b.normalize()).normalize();
                Some(2.0 * delta.xyz().length().atan2(delta.w.abs()))
            }
            _ => None,
        }
    }
}

fn slerp_shortest(start: Quat, end: Quat, alpha: f32) -> Quat {
    let start = start.normalize();
    let mut end = end.normalize();
    if start.dot(end) < 0.0 {
        end = -end;
    }
    start.slerp(end, alpha)
}

impl From<f32> for TweenValue {
    fn from(value: f32) -> Self {
        TweenValue::Scalar(value)
    }
}

impl From<Vec3> for TweenValue {
    fn from(value: Vec3) -> Self {
        TweenValue::Vector3(value)
    }
}

impl From<Quat> for TweenValue {
    fn from(value: Quat) -> Self {
        TweenValue::Rotation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn scalar_and_vector_are_linear() {
        let a = TweenValue::Scalar(2.0);
        let b = TweenValue::Scalar(6.0);
        assert_eq!(a.interpolate(&b, 0.25), Some(TweenValue::Scalar(3.0)));

        let a = TweenValue::Vector3(Vec3::ZERO);
        let b = TweenValue::Vector3(Vec3::new(10.0, -4.0, 2.0));
        assert_eq!(
            a.interpolate(&b, 0.5),
            Some(TweenValue::Vector3(Vec3::new(5.0, -2.0, 1.0)))
        );
    }

    #[test]
    fn mixed_kinds_do_not_interpolate() {
        let a = TweenValue::Scalar(1.0);
        let b = TweenValue::Vector3(Vec3::ONE);
        assert_eq!(a.interpolate(&b, 0.5), None);
        assert_eq!(a.distance(&b), None);
    }

    #[test]
    fn rotation_takes_the_short_arc() {
        // 350° -> 10° around Z is a 20° turn through 0°, not 340° through 180°.
        let start = TweenValue::Rotation(Quat::from_rotation_z(350.0_f32.to_radians()));
        let end = TweenValue::Rotation(Quat::from_rotation_z(10.0_f32.to_radians()));

        let half = start.interpolate(&end, 0.5).unwrap().as_quat().unwrap();

        assert!(half.angle_between(Quat::IDENTITY) < 1e-2);
        assert!((half * Vec3::X).abs_diff_eq(Vec3::X, 1e-4));
    }

    #[test]
    fn rotation_quarter_steps_stay_on_the_arc() {
        let start = TweenValue::Rotation(Quat::from_rotation_z(350.0_f32.to_radians()));
        let end = TweenValue::Rotation(Quat::from_rotation_z(10.0_f32.to_radians()));

        let quarter = start.interpolate(&end, 0.25).unwrap();

        let expected = TweenValue::Rotation(Quat::from_rotation_z(355.0_f32.to_radians()));
        assert!(quarter.distance(&expected).unwrap() < 1e-2);
    }

    #[test]
    fn distances() {
        assert_eq!(
            TweenValue::Scalar(3.0).distance(&TweenValue::Scalar(-1.0)),
            Some(4.0)
        );
        assert_eq!(
            TweenValue::Vector3(Vec3::ZERO).distance(&TweenValue::Vector3(Vec3::new(3.0, 4.0, 0.0))),
            Some(5.0)
        );
        let angle = TweenValue::Rotation(Quat::IDENTITY)
            .distance(&TweenValue::Rotation(Quat::from_rotation_y(PI / 2.0)))
            .unwrap();
        assert!((angle - PI / 2.0).abs() < 1e-2);
    }

    #[test]
    fn small_rotation_distances_are_not_lost() {
        let a = TweenValue::Rotation(Quat::from_rotation_z(1.0));
        let b = TweenValue::Rotation(Quat::from_rotation_z(1.0 - 3e-4));

        let angle = a.distance(&b).unwrap();

        assert!(angle > DEFAULT_EPSILON);
        assert!((angle - 3e-4).abs() < 2e-5);
        assert!(a.distance(&a).unwrap() < 1e-6);
    }

    #[test]
    fn rotation_distance_ignores_quaternion_sign() {
        let q = Quat::from_rotation_x(0.5);
        let angle = TweenValue::Rotation(q)
            .distance(&TweenValue::Rotation(-q))
            .unwrap();
        assert!(angle < 1e-5);
    }
}
