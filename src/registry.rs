use crate::error::TweenError;
use crate::tween::{CompletionPolicy, Tween, TweenSpec, TweenState};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Handle to a tween owned by a [`TweenRegistry`].
///
/// Ids are handed out in increasing order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweenId(u64);

impl fmt::Display for TweenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tween#{}", self.0)
    }
}

/// What happens when several tweens write the same property of the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverlapPolicy {
    /// All of them keep running, the one ticked last in a frame wins.
    #[default]
    LastWriteWins,
    /// A new tween replaces running tweens with the same [`crate::TargetKey`].
    ///
    /// Newer means a higher [`TweenId`], so a spawned tween that only goes live at the
    /// next update is dropped if a later one already runs on its key.
    CancelPrevious,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RegistryConfig {
    pub overlap: OverlapPolicy,
    /// Used by tweens that do not set a [`CompletionPolicy`] themselves.
    pub default_completion: CompletionPolicy,
}

impl RegistryConfig {
    pub fn overlap(self, overlap: OverlapPolicy) -> Self {
        Self { overlap, ..self }
    }

    pub fn default_completion(self, default_completion: CompletionPolicy) -> Self {
        Self {
            default_completion,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenOutcome {
    Completed,
    Aborted,
}

/// Reported by [`TweenRegistry::update`] for every tween it removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweenEvent {
    pub id: TweenId,
    pub outcome: TweenOutcome,
}

struct Shared<C> {
    config: RegistryConfig,
    next_id: AtomicU64,
    queue: Mutex<Vec<(TweenId, Tween<C>)>>,
}

/// Schedules tweens on a registry without borrowing it.
///
/// Tweens created through a spawner start with the registry's next
/// [`TweenRegistry::update`], so a target may spawn follow-up tweens from inside
/// `apply` without them being ticked in the same pass.
pub struct TweenSpawner<C> {
    shared: Arc<Shared<C>>,
}

impl<C> Clone for TweenSpawner<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C> TweenSpawner<C> {
    pub fn create(&self, spec: TweenSpec<C>) -> Result<TweenId, TweenError> {
        let (id, tween) = self.prepare(spec)?;
        self.queue().push((id, tween));
        debug!("Queued {id}");
        Ok(id)
    }

    fn prepare(&self, mut spec: TweenSpec<C>) -> Result<(TweenId, Tween<C>), TweenError> {
        spec.completion.get_or_insert(self.shared.config.default_completion);
        let tween = spec.build().inspect_err(|err| debug!("Rejected tween: {err}"))?;
        let id = TweenId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        Ok((id, tween))
    }

    fn queue(&self) -> MutexGuard<'_, Vec<(TweenId, Tween<C>)>> {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns all live tweens and advances them once per [`TweenRegistry::update`].
///
/// `C` is the context targets apply their values to.
pub struct TweenRegistry<C> {
    tweens: BTreeMap<TweenId, Tween<C>>,
    spawner: TweenSpawner<C>,
    finished: Vec<TweenEvent>,
}

impl<C> Default for TweenRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TweenRegistry<C> {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            tweens: BTreeMap::new(),
            spawner: TweenSpawner {
                shared: Arc::new(Shared {
                    config,
                    next_id: AtomicU64::new(0),
                    queue: Mutex::new(Vec::new()),
                }),
            },
            finished: Vec::new(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.spawner.shared.config
    }

    pub fn spawner(&self) -> TweenSpawner<C> {
        self.spawner.clone()
    }

    /// Starts a tween. It is ticked for the first time by the next [`Self::update`].
    pub fn create(&mut self, spec: TweenSpec<C>) -> Result<TweenId, TweenError> {
        let (id, tween) = self.spawner.prepare(spec)?;
        self.insert(id, tween);
        Ok(id)
    }

    fn insert(&mut self, id: TweenId, tween: Tween<C>) {
        if self.config().overlap == OverlapPolicy::CancelPrevious {
            if let Some(key) = tween.key() {
                if let Some((newer, _)) = self
                    .tweens
                    .range(id..)
                    .find(|(_, running)| running.key() == Some(key))
                {
                    debug!("{id} superseded by {newer} before starting");
                    return;
                }
                self.tweens.retain(|other, running| {
                    let keep = running.key() != Some(key);
                    if !keep {
                        debug!("{id} supersedes {other} on {}#{}", key.channel, key.object);
                    }
                    keep
                });
            }
        }
        debug!("Starting {id}: {} over {}s", tween.kind(), tween.duration());
        self.tweens.insert(id, tween);
    }

    /// Ticks every live tween once, in creation order, then drops the finished ones.
    ///
    /// Returns what was removed during this pass.
    pub fn update(&mut self, ctx: &mut C, delta: f32) -> &[TweenEvent] {
        self.finished.clear();
        let mut queued = std::mem::take(&mut *self.spawner.queue());
        queued.sort_by_key(|(id, _)| *id);
        for (id, tween) in queued {
            self.insert(id, tween);
        }

        // Anything spawned from here on waits in the queue for the next update.
        for tween in self.tweens.values_mut() {
            tween.tick(ctx, delta);
        }

        let finished = &mut self.finished;
        self.tweens.retain(|&id, tween| {
            let outcome = match tween.state() {
                TweenState::Completed => TweenOutcome::Completed,
                TweenState::Aborted => TweenOutcome::Aborted,
                TweenState::Created | TweenState::Running => return true,
            };
            debug!("Finished {id}: {outcome:?}");
            finished.push(TweenEvent { id, outcome });
            false
        });
        &self.finished
    }

    /// Removes a live or queued tween. Returns `false` if it was already gone.
    pub fn cancel(&mut self, id: TweenId) -> bool {
        let removed = self.tweens.remove(&id).is_some() || {
            let mut queue = self.spawner.queue();
            let before = queue.len();
            queue.retain(|(queued, _)| *queued != id);
            queue.len() != before
        };
        if removed {
            debug!("Cancelled {id}");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
        self.spawner.queue().clear();
    }

    pub fn get(&self, id: TweenId) -> Option<&Tween<C>> {
        self.tweens.get(&id)
    }

    pub fn contains(&self, id: TweenId) -> bool {
        self.tweens.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TweenId, &Tween<C>)> {
        self.tweens.iter().map(|(&id, tween)| (id, tween))
    }

    /// Number of live tweens, not counting ones still queued by a [`TweenSpawner`].
    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    pub fn pending_len(&self) -> usize {
        self.spawner.queue().len()
    }
}
