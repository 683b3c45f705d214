use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const ANIMATION_DURATION: Duration = Duration::from_millis(2000);
pub const ANIMATION_TICK: Duration = Duration::from_millis(16);
pub const ANIMATION_START_DELAY: Duration = Duration::from_millis(100);

/// Linear count-up from 0 to `target`, one value per tick.
///
/// Values are computed from the tick index rather than accumulated, so the
/// last tick is exactly `target` and no tick overshoots it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterPlan {
    target: u8,
    steps: u32,
}

impl CounterPlan {
    pub fn new(target: u8, duration: Duration, tick: Duration) -> Self {
        let tick_ms = tick.as_millis().max(1);
        let steps = (duration.as_millis() / tick_ms).max(1);
        Self {
            target,
            steps: u32::try_from(steps).unwrap_or(u32::MAX),
        }
    }

    pub fn standard(target: u8) -> Self {
        Self::new(target, ANIMATION_DURATION, ANIMATION_TICK)
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn value_at(&self, tick: u32) -> u8 {
        if tick >= self.steps {
            return self.target;
        }
        let value = u64::from(self.target) * u64::from(tick) / u64::from(self.steps);
        value as u8
    }

    /// Displayed values for ticks `1..=steps`.
    pub fn frames(&self) -> impl Iterator<Item = u8> + '_ {
        (1..=self.steps).map(move |tick| self.value_at(tick))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoreAnimator {
    pub duration: Duration,
    pub tick: Duration,
    pub start_delay: Duration,
}

impl Default for ScoreAnimator {
    fn default() -> Self {
        Self {
            duration: ANIMATION_DURATION,
            tick: ANIMATION_TICK,
            start_delay: ANIMATION_START_DELAY,
        }
    }
}

impl ScoreAnimator {
    /// Spawns the periodic counter. Must be called inside a tokio runtime.
    pub fn start(&self, target: u8) -> AnimationHandle {
        let plan = CounterPlan::new(target, self.duration, self.tick);
        let token = CancellationToken::new();
        let (tx, rx) = watch::channel(0u8);
        let tick = self.tick;
        let start_delay = self.start_delay;
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => return,
                _ = tokio::time::sleep(start_delay) => {}
            }

            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;

            for step in 1..=plan.steps() {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!(score = plan.target(), step, "score animation cancelled");
                        return;
                    }
                    _ = interval.tick() => {}
                }
                tx.send_replace(plan.value_at(step));
            }
        });

        AnimationHandle {
            token,
            receiver: rx,
            task,
        }
    }
}

/// Running counter. Dropping the handle cancels the timer.
pub struct AnimationHandle {
    token: CancellationToken,
    receiver: watch::Receiver<u8>,
    task: JoinHandle<()>,
}

impl AnimationHandle {
    pub fn displayed(&self) -> u8 {
        *self.receiver.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.receiver.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Owns at most one running animation; a new trigger replaces the old one.
#[derive(Default)]
pub struct ScoreCounter {
    animator: ScoreAnimator,
    current: Option<AnimationHandle>,
}

impl ScoreCounter {
    pub fn new(animator: ScoreAnimator) -> Self {
        Self {
            animator,
            current: None,
        }
    }

    pub fn trigger(&mut self, target: u8) -> watch::Receiver<u8> {
        self.cancel();
        let handle = self.animator.start(target);
        let receiver = handle.subscribe();
        self.current = Some(handle);
        receiver
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }

    pub fn displayed(&self) -> u8 {
        self.current.as_ref().map(|h| h.displayed()).unwrap_or(0)
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|h| !h.is_finished())
    }
}
