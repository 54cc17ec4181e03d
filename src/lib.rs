//! Be-Lerp
//!
//! Tweens positions, rotations and scalars towards a target over time, without
//! depending on a particular engine. Whatever receives the values is reached
//! through a [`TweenTarget`], ticked by a [`TweenRegistry`] once per frame.
//!
//! ```
//! use be_lerp::*;
//! use glam::Vec3;
//!
//! struct Scene {
//!     positions: Vec<Vec3>,
//! }
//!
//! // Refers to an object by index, the scene owns it.
//! #[derive(Clone)]
//! struct Position(usize);
//!
//! impl TweenTarget<Scene> for Position {
//!     fn apply(&mut self, scene: &mut Scene, value: TweenValue) {
//!         if let Some(position) = value.as_vec3() {
//!             scene.positions[self.0] = position;
//!         }
//!     }
//!
//!     fn is_valid(&self, scene: &Scene) -> bool {
//!         self.0 < scene.positions.len()
//!     }
//! }
//!
//! let mut scene = Scene {
//!     positions: vec![Vec3::ZERO],
//! };
//! let mut tweens = TweenRegistry::new();
//! tweens
//!     .create(Position(0).tween(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 1.0))
//!     .unwrap();
//!
//! tweens.update(&mut scene, 0.5);
//! assert_eq!(scene.positions[0], Vec3::new(5.0, 0.0, 0.0));
//!
//! tweens.update(&mut scene, 0.5);
//! assert_eq!(scene.positions[0], Vec3::new(10.0, 0.0, 0.0));
//! assert!(tweens.is_empty());
//! ```
//!
//! Rotations are interpolated along the shortest arc, easing comes from the
//! `interpolation` crate:
//! ```
//! # use be_lerp::*;
//! # use glam::Quat;
//! # #[derive(Clone)]
//! # struct Turret;
//! # impl TweenTarget<()> for Turret {
//! #     fn apply(&mut self, _: &mut (), _: TweenValue) {}
//! #     fn is_valid(&self, _: &()) -> bool { true }
//! # }
//! let spec = TweenSpec::new(
//!     Quat::from_rotation_z(350.0_f32.to_radians()),
//!     Quat::from_rotation_z(10.0_f32.to_radians()),
//!     0.5,
//! )
//! .target(Turret)
//! .easing(EaseFunction::QuadraticInOut)
//! .completion(CompletionPolicy::converge());
//!
//! let mut tweens = TweenRegistry::new();
//! let id = tweens.create(spec).unwrap();
//! tweens.update(&mut (), 0.1);
//! assert_eq!(tweens.get(id).unwrap().state(), TweenState::Running);
//! ```

mod error;
#[cfg(feature = "bevy")]
mod plugin;
mod registry;
mod target;
mod tween;
mod value;

pub use error::*;
pub use interpolation::EaseFunction;
#[cfg(feature = "bevy")]
pub use plugin::*;
pub use registry::*;
pub use target::*;
pub use tween::*;
pub use value::*;
