use crate::value::ValueKind;
use thiserror::Error;

/// Reasons a tween is refused by [`crate::TweenRegistry::create`].
///
/// A target that disappears while a tween is running is not an error: the tween
/// is dropped and reported as [`crate::TweenOutcome::Aborted`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TweenError {
    #[error("tween duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f32),
    #[error("tween has no target to apply values to")]
    NullAdapter,
    #[error("cannot tween from a {start} value to a {end} value")]
    KindMismatch { start: ValueKind, end: ValueKind },
}
