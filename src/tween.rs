use crate::error::TweenError;
use crate::target::{EndResolver, TargetKey, TweenTarget};
use crate::value::{TweenValue, ValueKind, DEFAULT_EPSILON};
use dyn_clone::DynClone;
use interpolation::{Ease, EaseFunction};
use tracing::warn;

/// Shapes the normalized progress of a tween before values are interpolated.
pub trait Easing: Send + Sync + 'static + DynClone {
    fn ease(&self, alpha: f32) -> f32;
}

dyn_clone::clone_trait_object!(Easing);

#[derive(Debug, Copy, Clone, Default)]
pub struct Linear;

impl Easing for Linear {
    fn ease(&self, alpha: f32) -> f32 {
        alpha
    }
}

impl Easing for EaseFunction {
    fn ease(&self, alpha: f32) -> f32 {
        Ease::calc(alpha, *self)
    }
}

/// When a running tween is considered done.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompletionPolicy {
    /// Done once the full duration has elapsed.
    #[default]
    TimeOnly,
    /// Done once the duration has elapsed or the applied value is within the
    /// given distance of the end value.
    TimeOrDistance(f32),
}

impl CompletionPolicy {
    /// [`CompletionPolicy::TimeOrDistance`] with [`DEFAULT_EPSILON`].
    pub fn converge() -> Self {
        Self::TimeOrDistance(DEFAULT_EPSILON)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenState {
    /// Waiting for the first tick to sample its start value.
    Created,
    Running,
    Completed,
    /// The target went away (or could not be read) before completion.
    Aborted,
}

impl TweenState {
    pub fn is_finished(self) -> bool {
        matches!(self, TweenState::Completed | TweenState::Aborted)
    }
}

/// Where a tween takes its start value from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Origin {
    Fixed(TweenValue),
    /// Sampled from the target on the first tick.
    Current,
    /// Sampled from the target on every tick, so each step blends the live value
    /// towards the end.
    Chase,
}

/// Everything needed to start a [`Tween`].
pub struct TweenSpec<C> {
    pub(crate) origin: Origin,
    pub(crate) end: TweenValue,
    pub(crate) duration: f32,
    pub(crate) easing: Box<dyn Easing>,
    pub(crate) target: Option<Box<dyn TweenTarget<C>>>,
    pub(crate) resolver: Option<Box<dyn EndResolver<C>>>,
    pub(crate) completion: Option<CompletionPolicy>,
}

impl<C> Clone for TweenSpec<C> {
    fn clone(&self) -> Self {
        Self {
            origin: self.origin,
            end: self.end,
            duration: self.duration,
            easing: self.easing.clone(),
            target: self.target.clone(),
            resolver: self.resolver.clone(),
            completion: self.completion,
        }
    }
}

impl<C> TweenSpec<C> {
    fn with_origin(origin: Origin, end: TweenValue, duration: f32) -> Self {
        Self {
            origin,
            end,
            duration,
            easing: Box::new(Linear),
            target: None,
            resolver: None,
            completion: None,
        }
    }

    /// Tween from `start` to `end` over `duration` seconds.
    pub fn new(start: impl Into<TweenValue>, end: impl Into<TweenValue>, duration: f32) -> Self {
        Self::with_origin(Origin::Fixed(start.into()), end.into(), duration)
    }

    /// Tween from whatever the target holds when the tween first ticks.
    pub fn to(end: impl Into<TweenValue>, duration: f32) -> Self {
        Self::with_origin(Origin::Current, end.into(), duration)
    }

    /// Re-reads the target every tick and moves it `alpha` of the remaining way.
    pub fn chase(end: impl Into<TweenValue>, duration: f32) -> Self {
        Self::with_origin(Origin::Chase, end.into(), duration)
    }

    pub fn target(self, target: impl TweenTarget<C> + 'static) -> Self {
        Self {
            target: Some(Box::new(target)),
            ..self
        }
    }

    pub fn easing(self, easing: impl Easing) -> Self {
        Self {
            easing: Box::new(easing),
            ..self
        }
    }

    /// Re-resolve the end value every tick.
    pub fn follow(self, resolver: impl EndResolver<C> + 'static) -> Self {
        Self {
            resolver: Some(Box::new(resolver)),
            ..self
        }
    }

    pub fn completion(self, completion: CompletionPolicy) -> Self {
        Self {
            completion: Some(completion),
            ..self
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.end.kind()
    }

    pub fn key(&self) -> Option<TargetKey> {
        self.target.as_ref().and_then(|target| target.key())
    }

    /// Validates the spec and turns it into a tween ready to be ticked.
    pub fn build(self) -> Result<Tween<C>, TweenError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(TweenError::InvalidDuration(self.duration));
        }
        let Some(target) = self.target else {
            return Err(TweenError::NullAdapter);
        };
        let (state, start) = match self.origin {
            Origin::Fixed(start) => {
                if start.kind() != self.end.kind() {
                    return Err(TweenError::KindMismatch {
                        start: start.kind(),
                        end: self.end.kind(),
                    });
                }
                (TweenState::Running, Some(start))
            }
            Origin::Current => (TweenState::Created, None),
            Origin::Chase => (TweenState::Running, None),
        };
        Ok(Tween {
            state,
            origin: self.origin,
            start,
            end: self.end,
            elapsed: 0.0,
            duration: self.duration,
            easing: self.easing,
            target,
            resolver: self.resolver,
            completion: self.completion.unwrap_or_default(),
        })
    }
}

/// Turns a target into a [`TweenSpec`] writing to it.
pub trait ToTween<C>: TweenTarget<C> + Sized + 'static {
    fn tween(
        self,
        start: impl Into<TweenValue>,
        end: impl Into<TweenValue>,
        duration: f32,
    ) -> TweenSpec<C> {
        TweenSpec::new(start, end, duration).target(self)
    }

    /// Tween from the target's current value.
    fn tween_to(self, end: impl Into<TweenValue>, duration: f32) -> TweenSpec<C> {
        TweenSpec::to(end, duration).target(self)
    }
}

impl<C, T: TweenTarget<C> + 'static> ToTween<C> for T {}

/// A single running interpolation.
pub struct Tween<C> {
    state: TweenState,
    origin: Origin,
    start: Option<TweenValue>,
    end: TweenValue,
    elapsed: f32,
    duration: f32,
    easing: Box<dyn Easing>,
    target: Box<dyn TweenTarget<C>>,
    resolver: Option<Box<dyn EndResolver<C>>>,
    completion: CompletionPolicy,
}

impl<C> Tween<C> {
    pub fn state(&self) -> TweenState {
        self.state
    }

    /// Normalized progress, `elapsed / duration` clamped to `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn kind(&self) -> ValueKind {
        self.end.kind()
    }

    /// `None` until a tween starting from its target's current value has ticked.
    pub fn start(&self) -> Option<TweenValue> {
        self.start
    }

    pub fn end(&self) -> TweenValue {
        self.end
    }

    pub fn completion(&self) -> CompletionPolicy {
        self.completion
    }

    pub fn key(&self) -> Option<TargetKey> {
        self.target.key()
    }

    /// Advances the tween by `delta` seconds and applies the new value to its target.
    ///
    /// Finished tweens are left untouched. Negative or non finite deltas do not
    /// move time but still apply the current value.
    pub fn tick(&mut self, ctx: &mut C, delta: f32) -> TweenState {
        if self.state.is_finished() {
            return self.state;
        }
        if !self.target.is_valid(ctx) {
            self.state = TweenState::Aborted;
            return self.state;
        }
        let Some(start) = self.sample_start(ctx) else {
            self.state = TweenState::Aborted;
            return self.state;
        };
        self.state = TweenState::Running;

        if delta.is_finite() && delta > 0.0 {
            self.elapsed += delta;
        }
        if let Some(resolver) = self.resolver.as_mut() {
            match resolver.resolve(ctx) {
                Some(end) if end.kind() == self.end.kind() => self.end = end,
                Some(end) => warn!(
                    "Ignoring resolved {} end value for a {} tween",
                    end.kind(),
                    self.end.kind()
                ),
                None => {}
            }
        }

        let alpha = self.alpha();
        let value = if alpha >= 1.0 {
            self.end
        } else {
            start
                .interpolate(&self.end, self.easing.ease(alpha))
                .unwrap_or(self.end)
        };
        self.target.apply(ctx, value);

        let converged = match self.completion {
            CompletionPolicy::TimeOnly => false,
            CompletionPolicy::TimeOrDistance(threshold) => value
                .distance(&self.end)
                .is_some_and(|distance| distance <= threshold),
        };
        if alpha >= 1.0 || converged {
            self.state = TweenState::Completed;
        }
        self.state
    }

    fn sample_start(&mut self, ctx: &C) -> Option<TweenValue> {
        let sampled = match (self.origin, self.start) {
            (Origin::Fixed(start), _) | (Origin::Current, Some(start)) => return Some(start),
            (Origin::Current, None) | (Origin::Chase, _) => self.target.current(ctx),
        };
        match sampled {
            Some(start) if start.kind() == self.end.kind() => {
                self.start = Some(start);
                Some(start)
            }
            Some(start) => {
                warn!(
                    "Tween target reported a {} value for a {} tween",
                    start.kind(),
                    self.end.kind()
                );
                None
            }
            None => {
                warn!("Tween target cannot report its current value");
                None
            }
        }
    }
}
