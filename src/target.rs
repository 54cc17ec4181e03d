use crate::value::TweenValue;
use dyn_clone::DynClone;

/// Applies tweened values to something living outside the registry.
///
/// `C` is the context handed to [`crate::TweenRegistry::update`], e.g. a scene
/// or an ECS `World`. Targets keep a handle into it (an index, an entity), never
/// the object itself, so a target that has been destroyed is detected through
/// [`TweenTarget::is_valid`] instead of being dereferenced.
pub trait TweenTarget<C>: Send + Sync + DynClone {
    fn apply(&mut self, ctx: &mut C, value: TweenValue);

    fn is_valid(&self, ctx: &C) -> bool;

    /// Current value of the property, used by tweens that start from (or chase)
    /// whatever the target holds right now.
    fn current(&self, _ctx: &C) -> Option<TweenValue> {
        None
    }

    /// Identifies the property written by this target. Tweens with equal keys
    /// replace each other under [`crate::OverlapPolicy::CancelPrevious`].
    fn key(&self) -> Option<TargetKey> {
        None
    }
}

/// Re-reads the end value of a tween every tick, e.g. to follow a moving socket.
pub trait EndResolver<C>: Send + Sync + DynClone {
    /// `None` keeps the previously resolved end value.
    fn resolve(&mut self, ctx: &C) -> Option<TweenValue>;
}

dyn_clone::clone_trait_object!(<C> TweenTarget<C>);
dyn_clone::clone_trait_object!(<C> EndResolver<C>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetKey {
    pub object: u64,
    pub channel: &'static str,
}

impl TargetKey {
    pub fn new(object: u64, channel: &'static str) -> Self {
        Self { object, channel }
    }
}

/// Wraps a closure as an [`EndResolver`].
#[derive(Clone)]
pub struct ResolveWith<F>(pub F);

impl<C, F> EndResolver<C> for ResolveWith<F>
where
    F: FnMut(&C) -> Option<TweenValue> + Clone + Send + Sync,
{
    fn resolve(&mut self, ctx: &C) -> Option<TweenValue> {
        (self.0)(ctx)
    }
}
