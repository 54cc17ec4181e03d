use crate::registry::{RegistryConfig, TweenEvent, TweenId, TweenOutcome, TweenRegistry};
use crate::target::{EndResolver, TargetKey, TweenTarget};
use crate::value::TweenValue;
use bevy_app::{App, Plugin, Update};
use bevy_ecs::component::Mutable;
use bevy_ecs::prelude::*;
use bevy_time::{Real, Time};
use bevy_transform::components::{GlobalTransform, Transform};
use glam::Affine3A;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use tracing::error;

/// The registry driven by [`TweenPlugin`]. Targets apply their values to the [`World`].
#[derive(Resource, Default)]
pub struct Tweens(pub TweenRegistry<World>);

impl Deref for Tweens {
    type Target = TweenRegistry<World>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Tweens {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Sent for every tween removed from [`Tweens`].
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweenFinished {
    pub id: TweenId,
    pub outcome: TweenOutcome,
}

impl From<TweenEvent> for TweenFinished {
    fn from(event: TweenEvent) -> Self {
        Self {
            id: event.id,
            outcome: event.outcome,
        }
    }
}

/// Advances [`Tweens`] every [`Update`] using `Time<T>`.
///
/// ```no_run
/// use be_lerp::*;
/// use bevy_app::{App, Startup};
/// use bevy_ecs::prelude::*;
/// use bevy_transform::components::Transform;
/// use glam::Vec3;
///
/// fn setup(mut commands: Commands, mut tweens: ResMut<Tweens>) {
///     let entity = commands.spawn(Transform::default()).id();
///     // Slide from wherever the entity is to x = 1 within a second.
///     tweens.create(Translation(entity).tween_to(Vec3::X, 1.0)).unwrap();
/// }
///
/// App::new()
///     .add_plugins(TweenPlugin::new())
///     .add_systems(Startup, setup)
///     .run();
/// ```
pub struct TweenPlugin<T = ()> {
    config: RegistryConfig,
    _time: PhantomData<T>,
}

impl Default for TweenPlugin<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl TweenPlugin<()> {
    pub fn new() -> Self {
        Self {
            config: RegistryConfig::default(),
            _time: PhantomData,
        }
    }
}

impl TweenPlugin<Real> {
    /// Keep tweening while virtual time is paused or scaled.
    pub fn real_time() -> Self {
        Self {
            config: RegistryConfig::default(),
            _time: PhantomData,
        }
    }
}

impl<T> TweenPlugin<T> {
    pub fn with_config(self, config: RegistryConfig) -> Self {
        Self { config, ..self }
    }
}

impl<T: Default + Send + Sync + 'static> Plugin for TweenPlugin<T> {
    fn build(&self, app: &mut App) {
        app.insert_resource(Tweens(TweenRegistry::with_config(self.config)))
            .add_event::<TweenFinished>()
            .add_systems(Update, advance_tweens::<T>);
    }
}

pub fn advance_tweens<T: Default + Send + Sync + 'static>(world: &mut World) {
    let delta = world
        .get_resource::<Time<T>>()
        .map(|time| time.delta_secs())
        .unwrap_or_default();
    let Some(finished) = world.try_resource_scope(|world, mut tweens: Mut<Tweens>| {
        tweens.update(world, delta).to_vec()
    }) else {
        error!("Tweens resource missing, was the TweenPlugin added?");
        return;
    };
    for event in finished {
        world.send_event(TweenFinished::from(event));
    }
}

/// [`Transform::translation`] of an entity.
#[derive(Debug, Clone, Copy)]
pub struct Translation(pub Entity);

impl TweenTarget<World> for Translation {
    fn apply(&mut self, world: &mut World, value: TweenValue) {
        if let (Some(mut transform), Some(translation)) =
            (world.get_mut::<Transform>(self.0), value.as_vec3())
        {
            transform.translation = translation;
        }
    }

    fn is_valid(&self, world: &World) -> bool {
        world.get::<Transform>(self.0).is_some()
    }

    fn current(&self, world: &World) -> Option<TweenValue> {
        world
            .get::<Transform>(self.0)
            .map(|transform| transform.translation.into())
    }

    fn key(&self) -> Option<TargetKey> {
        Some(TargetKey::new(self.0.to_bits(), "translation"))
    }
}

/// World position of an entity, written into its [`Transform`] relative to its parent.
///
/// Pair with [`FollowTranslation`] to move a child entity onto a socket elsewhere in
/// the hierarchy. Without a parent this is the same as [`Translation`].
#[derive(Debug, Clone, Copy)]
pub struct WorldTranslation(pub Entity);

impl WorldTranslation {
    fn parent_affine(&self, world: &World) -> Option<Affine3A> {
        let parent = world.get::<ChildOf>(self.0)?.parent();
        world.get::<GlobalTransform>(parent).map(|global| global.affine())
    }
}

impl TweenTarget<World> for WorldTranslation {
    fn apply(&mut self, world: &mut World, value: TweenValue) {
        let Some(position) = value.as_vec3() else {
            return;
        };
        let local = match self.parent_affine(world) {
            Some(parent) => parent.inverse().transform_point3(position),
            None => position,
        };
        if let Some(mut transform) = world.get_mut::<Transform>(self.0) {
            transform.translation = local;
        }
    }

    fn is_valid(&self, world: &World) -> bool {
        world.get::<Transform>(self.0).is_some()
    }

    fn current(&self, world: &World) -> Option<TweenValue> {
        let local = world.get::<Transform>(self.0)?.translation;
        let position = match self.parent_affine(world) {
            Some(parent) => parent.transform_point3(local),
            None => local,
        };
        Some(position.into())
    }

    fn key(&self) -> Option<TargetKey> {
        Some(TargetKey::new(self.0.to_bits(), "translation"))
    }
}

/// [`Transform::rotation`] of an entity, interpolated along the shortest arc.
#[derive(Debug, Clone, Copy)]
pub struct Rotation(pub Entity);

impl TweenTarget<World> for Rotation {
    fn apply(&mut self, world: &mut World, value: TweenValue) {
        if let (Some(mut transform), Some(rotation)) =
            (world.get_mut::<Transform>(self.0), value.as_quat())
        {
            transform.rotation = rotation;
        }
    }

    fn is_valid(&self, world: &World) -> bool {
        world.get::<Transform>(self.0).is_some()
    }

    fn current(&self, world: &World) -> Option<TweenValue> {
        world
            .get::<Transform>(self.0)
            .map(|transform| transform.rotation.into())
    }

    fn key(&self) -> Option<TargetKey> {
        Some(TargetKey::new(self.0.to_bits(), "rotation"))
    }
}

/// [`Transform::scale`] of an entity.
#[derive(Debug, Clone, Copy)]
pub struct Scale(pub Entity);

impl TweenTarget<World> for Scale {
    fn apply(&mut self, world: &mut World, value: TweenValue) {
        if let (Some(mut transform), Some(scale)) =
            (world.get_mut::<Transform>(self.0), value.as_vec3())
        {
            transform.scale = scale;
        }
    }

    fn is_valid(&self, world: &World) -> bool {
        world.get::<Transform>(self.0).is_some()
    }

    fn current(&self, world: &World) -> Option<TweenValue> {
        world
            .get::<Transform>(self.0)
            .map(|transform| transform.scale.into())
    }

    fn key(&self) -> Option<TargetKey> {
        Some(TargetKey::new(self.0.to_bits(), "scale"))
    }
}

/// A scalar field of any component, e.g. the field of view of a camera lens:
///
/// ```
/// use be_lerp::*;
/// use bevy_ecs::prelude::*;
///
/// #[derive(Component)]
/// struct Lens {
///     fov: f32,
/// }
///
/// let mut world = World::new();
/// let camera = world.spawn(Lens { fov: 90.0 }).id();
/// let fov = ComponentField::new(
///     camera,
///     "fov",
///     |lens: &Lens| lens.fov,
///     |lens: &mut Lens, fov| lens.fov = fov,
/// );
///
/// let mut tweens = TweenRegistry::new();
/// tweens.create(fov.tween_to(60.0, 1.0)).unwrap();
/// tweens.update(&mut world, 0.5);
/// assert_eq!(world.get::<Lens>(camera).unwrap().fov, 75.0);
/// ```
pub struct ComponentField<T> {
    pub entity: Entity,
    pub channel: &'static str,
    get: fn(&T) -> f32,
    set: fn(&mut T, f32),
}

impl<T> Clone for ComponentField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentField<T> {}

impl<T> ComponentField<T> {
    pub fn new(
        entity: Entity,
        channel: &'static str,
        get: fn(&T) -> f32,
        set: fn(&mut T, f32),
    ) -> Self {
        Self {
            entity,
            channel,
            get,
            set,
        }
    }
}

impl<T: Component<Mutability = Mutable>> TweenTarget<World> for ComponentField<T> {
    fn apply(&mut self, world: &mut World, value: TweenValue) {
        if let (Some(mut component), Some(value)) =
            (world.get_mut::<T>(self.entity), value.as_scalar())
        {
            (self.set)(&mut *component, value);
        }
    }

    fn is_valid(&self, world: &World) -> bool {
        world.get::<T>(self.entity).is_some()
    }

    fn current(&self, world: &World) -> Option<TweenValue> {
        world
            .get::<T>(self.entity)
            .map(|component| TweenValue::Scalar((self.get)(component)))
    }

    fn key(&self) -> Option<TargetKey> {
        Some(TargetKey::new(self.entity.to_bits(), self.channel))
    }
}

/// Ends at the world position of another entity, e.g. a socket on a moving parent.
///
/// The resolved value is in world space, so a tweened entity that has a parent should
/// be driven through [`WorldTranslation`].
#[derive(Debug, Clone, Copy)]
pub struct FollowTranslation(pub Entity);

impl EndResolver<World> for FollowTranslation {
    fn resolve(&mut self, world: &World) -> Option<TweenValue> {
        world
            .get::<GlobalTransform>(self.0)
            .map(|transform| transform.translation().into())
    }
}

/// Ends at the world rotation of another entity.
#[derive(Debug, Clone, Copy)]
pub struct FollowRotation(pub Entity);

impl EndResolver<World> for FollowRotation {
    fn resolve(&mut self, world: &World) -> Option<TweenValue> {
        world
            .get::<GlobalTransform>(self.0)
            .map(|transform| transform.compute_transform().rotation.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::OverlapPolicy;
    use crate::tween::{CompletionPolicy, ToTween, TweenSpec};
    use glam::{Quat, Vec3};
    use std::time::Duration;

    #[derive(Component)]
    struct Lens {
        fov: f32,
    }

    fn world_with_time(delta: Duration) -> World {
        let mut world = World::new();
        let mut time = Time::<()>::default();
        time.advance_by(delta);
        world.insert_resource(time);
        world.insert_resource(Tweens::default());
        world.init_resource::<Events<TweenFinished>>();
        world
    }

    fn finished_events(world: &World) -> Vec<TweenFinished> {
        world
            .resource::<Events<TweenFinished>>()
            .iter_current_update_events()
            .copied()
            .collect()
    }

    #[test]
    fn test_transform_tween() {
        // GIVEN
        let mut world = world_with_time(Duration::from_secs(1));
        let entity = world.spawn(Transform::default()).id();
        world
            .resource_mut::<Tweens>()
            .create(Translation(entity).tween(Vec3::ZERO, Vec3::X, 2.0))
            .unwrap();

        // WHEN
        advance_tweens::<()>(&mut world);

        // THEN
        let transform = world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.translation, Vec3::X * 0.5);
        assert_eq!(world.resource::<Tweens>().len(), 1);
        assert!(finished_events(&world).is_empty());
    }

    #[test]
    fn test_finished_tween_sends_event() {
        // GIVEN
        let mut world = world_with_time(Duration::from_secs(1));
        let entity = world.spawn(Transform::default()).id();
        let id = world
            .resource_mut::<Tweens>()
            .create(Scale(entity).tween(Vec3::ONE, Vec3::splat(3.0), 1.0))
            .unwrap();

        // WHEN
        advance_tweens::<()>(&mut world);

        // THEN
        assert_eq!(world.get::<Transform>(entity).unwrap().scale, Vec3::splat(3.0));
        assert!(world.resource::<Tweens>().is_empty());
        assert_eq!(
            finished_events(&world),
            vec![TweenFinished {
                id,
                outcome: TweenOutcome::Completed
            }]
        );
    }

    #[test]
    fn test_despawned_entity_aborts() {
        // GIVEN
        let mut world = world_with_time(Duration::from_millis(100));
        let entity = world.spawn(Transform::default()).id();
        let id = world
            .resource_mut::<Tweens>()
            .create(Rotation(entity).tween(Quat::IDENTITY, Quat::from_rotation_y(1.0), 1.0))
            .unwrap();
        world.despawn(entity);

        // WHEN
        advance_tweens::<()>(&mut world);

        // THEN
        assert_eq!(
            finished_events(&world),
            vec![TweenFinished {
                id,
                outcome: TweenOutcome::Aborted
            }]
        );
    }

    #[test]
    fn test_real_time() {
        // GIVEN
        let mut world = World::new();
        let mut time = Time::<Real>::default();
        time.advance_by(Duration::from_secs(1));
        world.insert_resource(time);
        world.insert_resource(Time::<()>::default());
        world.insert_resource(Tweens::default());
        world.init_resource::<Events<TweenFinished>>();
        let entity = world.spawn(Transform::default()).id();
        world
            .resource_mut::<Tweens>()
            .create(Translation(entity).tween(Vec3::ZERO, Vec3::Y, 4.0))
            .unwrap();

        // WHEN
        advance_tweens::<()>(&mut world);
        advance_tweens::<Real>(&mut world);

        // THEN
        let transform = world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.translation, Vec3::Y * 0.25);
    }

    #[test]
    fn test_follow_socket() {
        // GIVEN
        let mut world = world_with_time(Duration::from_secs(1));
        let socket = world
            .spawn(GlobalTransform::from_translation(Vec3::new(0.0, 4.0, 0.0)))
            .id();
        let entity = world.spawn(Transform::default()).id();
        world
            .resource_mut::<Tweens>()
            .create(
                Translation(entity)
                    .tween(Vec3::ZERO, Vec3::ZERO, 2.0)
                    .follow(FollowTranslation(socket)),
            )
            .unwrap();

        // WHEN
        advance_tweens::<()>(&mut world);

        // THEN
        let transform = world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.translation, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_follow_socket_from_a_parented_entity() {
        // GIVEN
        let mut world = world_with_time(Duration::from_secs(1));
        let socket = world
            .spawn(GlobalTransform::from_translation(Vec3::new(0.0, 4.0, 0.0)))
            .id();
        let parent = world
            .spawn((
                Transform::from_xyz(10.0, 0.0, 0.0),
                GlobalTransform::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            ))
            .id();
        let entity = world.spawn((Transform::default(), ChildOf(parent))).id();
        world
            .resource_mut::<Tweens>()
            .create(
                WorldTranslation(entity)
                    .tween_to(Vec3::ZERO, 2.0)
                    .follow(FollowTranslation(socket)),
            )
            .unwrap();

        // WHEN
        advance_tweens::<()>(&mut world);

        // THEN
        let local = world.get::<Transform>(entity).unwrap().translation;
        assert!(local.abs_diff_eq(Vec3::new(-5.0, 2.0, 0.0), 1e-5));

        // WHEN
        advance_tweens::<()>(&mut world);

        // THEN
        let local = world.get::<Transform>(entity).unwrap().translation;
        assert!(local.abs_diff_eq(Vec3::new(-10.0, 4.0, 0.0), 1e-5));
        assert!(world.resource::<Tweens>().is_empty());
    }

    #[test]
    fn test_component_field() {
        // GIVEN
        let mut world = world_with_time(Duration::from_millis(500));
        let camera = world.spawn(Lens { fov: 90.0 }).id();
        let fov = ComponentField::new(
            camera,
            "fov",
            |lens: &Lens| lens.fov,
            |lens: &mut Lens, fov| lens.fov = fov,
        );
        world
            .resource_mut::<Tweens>()
            .create(fov.tween_to(60.0, 1.0).completion(CompletionPolicy::converge()))
            .unwrap();

        // WHEN
        advance_tweens::<()>(&mut world);

        // THEN
        assert_eq!(world.get::<Lens>(camera).unwrap().fov, 75.0);
    }

    #[test]
    fn test_plugin_registers_resources() {
        let mut app = App::new();
        let config = RegistryConfig::default().overlap(OverlapPolicy::CancelPrevious);
        app.add_plugins(TweenPlugin::new().with_config(config));

        let world = app.world();
        assert_eq!(
            world.resource::<Tweens>().config().overlap,
            OverlapPolicy::CancelPrevious
        );
        assert!(world.contains_resource::<Events<TweenFinished>>());
    }

    #[test]
    fn test_spec_without_target_is_rejected() {
        let mut world = world_with_time(Duration::from_secs(1));
        let result = world
            .resource_mut::<Tweens>()
            .create(TweenSpec::new(0.0, 1.0, 1.0));
        assert!(result.is_err());
    }
}
