//! Presentational state: where things are and how opaque they are at a
//! given scene time. Nothing here mutates the scene; completion is only
//! reported back to the caller.

use crate::config::FLASH_MS;
use crate::model::{FlashState, Hsl, Millis, Point, RisingCircle, SplatterEffect};
use crate::random::RandomSource;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) w: f32,
    pub(crate) h: f32,
}

fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

fn elapsed(since: Millis, now: Millis) -> f32 {
    now.saturating_sub(since) as f32
}

/* -----------------------------
   Rising circles
------------------------------ */

pub(crate) fn circle_progress(c: &RisingCircle, now: Millis) -> f32 {
    (elapsed(c.spawned_at, now) / c.duration_ms.max(1) as f32).clamp(0.0, 1.0)
}

pub(crate) fn circle_finished(c: &RisingCircle, now: Millis) -> bool {
    now.saturating_sub(c.spawned_at) >= c.duration_ms
}

/// Top edge starts at 110% of the viewport and ends fully above it.
pub(crate) fn circle_center(c: &RisingCircle, vp: Viewport, now: Millis) -> Point {
    let size = c.size as f32;
    let p = circle_progress(c, now);
    let start = vp.h * 1.1;
    let end = -size;
    let top = start * (1.0 - p) + end * p;
    Point::new(c.left / 100.0 * vp.w, top + size / 2.0)
}

/// Opacity of the circle's radial gradient at `at`, 0 outside the disc.
pub(crate) fn circle_alpha(c: &RisingCircle, center: Point, at: Point) -> f32 {
    let size = c.size as f32;
    if center.dist(at) > size / 2.0 {
        return 0.0;
    }
    // highlight sits at 35%/35% of the bounding box
    let hl = Point::new(center.x - 0.15 * size, center.y - 0.15 * size);
    let reach = 0.65 * size * std::f32::consts::SQRT_2;
    let t = (hl.dist(at) / reach).clamp(0.0, 1.0);
    if t <= 0.6 {
        0.9 - 0.3 * (t / 0.6)
    } else {
        0.6 - 0.4 * ((t - 0.6) / 0.4)
    }
}

/// Top-most circle (latest spawned) whose disc contains `at`.
pub(crate) fn hit_test(
    circles: &[RisingCircle],
    at: Point,
    vp: Viewport,
    now: Millis,
) -> Option<RisingCircle> {
    circles
        .iter()
        .rev()
        .find(|c| circle_center(c, vp, now).dist(at) <= c.size as f32 / 2.0)
        .copied()
}

/* -----------------------------
   Flash overlay
------------------------------ */

fn flash_envelope(f: &FlashState, now: Millis) -> f32 {
    let t = elapsed(f.started_at, now) / FLASH_MS as f32;
    if t >= 1.0 {
        0.0
    } else if t < 0.15 {
        t / 0.15
    } else {
        1.0 - ease_out((t - 0.15) / 0.85)
    }
}

pub(crate) fn flash_finished(f: &FlashState, now: Millis) -> bool {
    f.active && now.saturating_sub(f.started_at) >= FLASH_MS
}

/// Color and opacity of the flash at `at`, or `None` when nothing is shown.
pub(crate) fn flash_paint(
    f: &FlashState,
    vp: Viewport,
    at: Point,
    now: Millis,
) -> Option<(Hsl, f32)> {
    if !f.active {
        return None;
    }
    let color = f.color?;
    let center = f
        .center
        .unwrap_or(Point::new(vp.w * 0.5, vp.h * 0.4));

    let corners = [
        Point::new(0.0, 0.0),
        Point::new(vp.w, 0.0),
        Point::new(0.0, vp.h),
        Point::new(vp.w, vp.h),
    ];
    let reach = corners
        .iter()
        .map(|c| c.dist(center))
        .fold(1.0f32, f32::max);
    let radial = (0.55 * (1.0 - center.dist(at) / (0.6 * reach))).max(0.0);

    // 135deg: top-left to bottom-right
    let t = ((at.x + at.y) / (vp.w + vp.h).max(1.0)).clamp(0.0, 1.0);
    let linear = 0.25 - 0.20 * t;

    let a = radial + linear * (1.0 - radial);
    Some((color, a * flash_envelope(f, now)))
}

/* -----------------------------
   Splatter
------------------------------ */

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Drip {
    /// Offset of the drip's top-left corner from the splatter origin, px.
    pub(crate) left: i32,
    pub(crate) top: i32,
    pub(crate) size: u32,
    pub(crate) duration_ms: u64,
    pub(crate) delay_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SplatterLayout {
    pub(crate) main_size: u32,
    pub(crate) drips: Vec<Drip>,
}

impl SplatterLayout {
    pub(crate) fn compose<R: RandomSource + ?Sized>(rng: &mut R, lifetime_ms: u64) -> Self {
        let main_size = (28.0 + rng.unit() * 20.0).round() as u32;
        let count = 3 + (rng.unit() * 2.0) as usize;
        let drips = (0..count)
            .map(|i| Drip {
                left: (-14.0 + rng.unit() * 28.0).round() as i32,
                top: (12.0 + rng.unit() * 44.0).round() as i32,
                size: (6.0 + rng.unit() * 8.0).round() as u32,
                duration_ms: lifetime_ms + (rng.unit() * 400.0).round() as u64,
                delay_ms: i as u64 * 80,
            })
            .collect();
        Self { main_size, drips }
    }
}

pub(crate) fn blot_alpha(s: &SplatterEffect, now: Millis) -> f32 {
    let t = elapsed(s.created_at, now) / s.lifetime_ms.max(1) as f32;
    1.0 - ease_out(t)
}

pub(crate) fn drip_alpha(s: &SplatterEffect, d: &Drip, now: Millis) -> f32 {
    let e = elapsed(s.created_at, now);
    let delay = d.delay_ms as f32;
    if e < delay {
        return 1.0;
    }
    1.0 - ease_out((e - delay) / d.duration_ms.max(1) as f32)
}

pub(crate) fn drip_center(s: &SplatterEffect, d: &Drip) -> Point {
    let half = d.size as f32 / 2.0;
    Point::new(
        s.origin.x + d.left as f32 + half,
        s.origin.y + d.top as f32 + half,
    )
}
