use log::{debug, info, trace};

use crate::config::{
    INITIAL_CIRCLES, LEFT_PCT, PALETTE, RISE_MS, SIZE_PX, SPAWN_DELAY_MS, SPLATTER_GRACE_MS,
    SPLATTER_LIFETIME_MS,
};
use crate::effects::SplatterLayout;
use crate::model::{
    FlashState, IdSequence, Millis, Point, RisingCircle, SceneStats, SplatterEffect,
};
use crate::random::RandomSource;
use crate::timers::{CancelToken, TimerQueue};

enum SceneTimer {
    Spawn(CancelToken),
    RemoveSplatter(u64),
}

/// Owns every live circle and effect. All mutation goes through here.
pub(crate) struct SceneController<R> {
    rng: R,
    circles: Vec<RisingCircle>,
    flash: FlashState,
    splatters: Vec<SplatterEffect>,
    circle_ids: IdSequence,
    splatter_ids: IdSequence,
    timers: TimerQueue<SceneTimer>,
    spawner: CancelToken,
    stats: SceneStats,
}

impl<R: RandomSource> SceneController<R> {
    pub(crate) fn new(rng: R) -> Self {
        Self {
            rng,
            circles: Vec::new(),
            flash: FlashState::default(),
            splatters: Vec::new(),
            circle_ids: IdSequence::default(),
            splatter_ids: IdSequence::default(),
            timers: TimerQueue::default(),
            spawner: CancelToken::default(),
            stats: SceneStats::default(),
        }
    }

    pub(crate) fn circles(&self) -> &[RisingCircle] {
        &self.circles
    }

    pub(crate) fn flash(&self) -> &FlashState {
        &self.flash
    }

    pub(crate) fn splatters(&self) -> &[SplatterEffect] {
        &self.splatters
    }

    pub(crate) fn stats(&self) -> SceneStats {
        self.stats
    }

    /// Seeds the scene and starts the spawn task. Calling it again cancels
    /// the previous task.
    pub(crate) fn initialize(&mut self, now: Millis) {
        self.spawner.cancel();
        self.spawner = CancelToken::default();

        self.circles = (0..INITIAL_CIRCLES).map(|_| self.make_circle(now)).collect();
        self.schedule_spawn(now);
        info!("scene initialized with {} circles", self.circles.len());
    }

    pub(crate) fn teardown(&mut self) {
        self.spawner.cancel();
        let s = self.stats;
        info!(
            "scene torn down: spawned={} popped={} escaped={} pending_timers={}",
            s.spawned,
            s.popped,
            s.escaped,
            self.timers.len()
        );
    }

    /// Runs every timer due at or before `now`, each stamped with its own due time.
    pub(crate) fn advance(&mut self, now: Millis) {
        while let Some((due, timer)) = self.timers.pop_due(now) {
            match timer {
                SceneTimer::Spawn(token) => {
                    if token.is_cancelled() {
                        continue;
                    }
                    let c = self.make_circle(due);
                    trace!("spawn circle {} at {}ms", c.id, due);
                    self.circles.push(c);
                    if !token.is_cancelled() {
                        self.schedule_spawn(due);
                    }
                }
                SceneTimer::RemoveSplatter(id) => {
                    self.splatters.retain(|s| s.id != id);
                    trace!("splatter {} removed at {}ms", id, due);
                }
            }
        }
    }

    pub(crate) fn pop(&mut self, circle: &RisingCircle, at: Point, now: Millis) {
        if self.remove_circle(circle.id) {
            self.stats.popped += 1;
        }

        self.flash = FlashState {
            color: Some(circle.color),
            center: Some(at),
            active: true,
            started_at: now,
        };

        let lifetime_ms = self.rng.between_rounded(SPLATTER_LIFETIME_MS) as u64;
        let splatter = SplatterEffect {
            id: self.splatter_ids.next_id(),
            origin: at,
            color: circle.color,
            lifetime_ms,
            created_at: now,
            layout: SplatterLayout::compose(&mut self.rng, lifetime_ms),
        };
        self.timers.schedule(
            now + lifetime_ms + SPLATTER_GRACE_MS,
            SceneTimer::RemoveSplatter(splatter.id),
        );
        debug!(
            "pop circle {} at ({:.0},{:.0}) color {} splatter {} for {}ms",
            circle.id, at.x, at.y, circle.color, splatter.id, lifetime_ms
        );
        self.splatters.push(splatter);
    }

    /// The circle reached the top. Returns false if it was already gone.
    pub(crate) fn on_circle_animation_complete(&mut self, id: u64) -> bool {
        let removed = self.remove_circle(id);
        if removed {
            self.stats.escaped += 1;
        }
        removed
    }

    pub(crate) fn on_flash_animation_end(&mut self) {
        self.flash.active = false;
    }

    fn remove_circle(&mut self, id: u64) -> bool {
        let before = self.circles.len();
        self.circles.retain(|c| c.id != id);
        self.circles.len() != before
    }

    fn make_circle(&mut self, now: Millis) -> RisingCircle {
        self.stats.spawned += 1;
        RisingCircle {
            id: self.circle_ids.next_id(),
            left: self.rng.between(LEFT_PCT.0, LEFT_PCT.1) as f32,
            size: self.rng.between_rounded(SIZE_PX) as u32,
            duration_ms: self.rng.between_rounded(RISE_MS) as u64,
            color: *self.rng.choose(&PALETTE),
            spawned_at: now,
        }
    }

    fn schedule_spawn(&mut self, from: Millis) {
        let delay = self.rng.between_rounded(SPAWN_DELAY_MS) as u64;
        self.timers
            .schedule(from + delay, SceneTimer::Spawn(self.spawner.clone()));
    }
}
