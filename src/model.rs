use std::fmt;

use crate::effects::SplatterLayout;

/// Scene time in milliseconds since the app started.
pub(crate) type Millis = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Hsl {
    pub(crate) h: u16,
    pub(crate) s: u8,
    pub(crate) l: u8,
}

impl Hsl {
    pub(crate) const fn new(h: u16, s: u8, l: u8) -> Self {
        Self { h, s, l }
    }

    pub(crate) fn to_rgb(self) -> Rgb {
        let h = (self.h % 360) as f32;
        let s = self.s.min(100) as f32 / 100.0;
        let l = self.l.min(100) as f32 / 100.0;

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = h / 60.0;
        let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let to8 = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgb {
            r: to8(r),
            g: to8(g),
            b: to8(b),
        }
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}% {}%", self.h, self.s, self.l)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) fn scale(self, k: f32) -> Rgb {
        let k = k.clamp(0.0, 1.0);
        Rgb {
            r: (self.r as f32 * k + 0.5) as u8,
            g: (self.g as f32 * k + 0.5) as u8,
            b: (self.b as f32 * k + 0.5) as u8,
        }
    }
}

/// Viewport coordinates in pixels, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Point {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl Point {
    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub(crate) fn dist(self, o: Point) -> f32 {
        let dx = self.x - o.x;
        let dy = self.y - o.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RisingCircle {
    pub(crate) id: u64,
    /// Horizontal center as a percentage of viewport width.
    pub(crate) left: f32,
    pub(crate) size: u32,
    pub(crate) duration_ms: u64,
    pub(crate) color: Hsl,
    pub(crate) spawned_at: Millis,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct FlashState {
    pub(crate) color: Option<Hsl>,
    pub(crate) center: Option<Point>,
    pub(crate) active: bool,
    pub(crate) started_at: Millis,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SplatterEffect {
    pub(crate) id: u64,
    pub(crate) origin: Point,
    pub(crate) color: Hsl,
    pub(crate) lifetime_ms: u64,
    pub(crate) created_at: Millis,
    pub(crate) layout: SplatterLayout,
}

/// Monotonic id counter owned by a single scene. First id is 1.
#[derive(Clone, Debug, Default)]
pub(crate) struct IdSequence {
    last: u64,
}

impl IdSequence {
    pub(crate) fn next_id(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SceneStats {
    pub(crate) spawned: u64,
    pub(crate) popped: u64,
    pub(crate) escaped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_displays_like_css_token() {
        assert_eq!(Hsl::new(200, 100, 60).to_string(), "200 100% 60%");
        assert_eq!(Hsl::new(330, 95, 60).to_string(), "330 95% 60%");
    }

    #[test]
    fn hsl_to_rgb_primaries() {
        assert_eq!(Hsl::new(0, 100, 50).to_rgb(), Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(Hsl::new(240, 100, 50).to_rgb(), Rgb { r: 0, g: 0, b: 255 });
        assert_eq!(Hsl::new(0, 0, 100).to_rgb(), Rgb { r: 255, g: 255, b: 255 });
        assert_eq!(Hsl::new(0, 0, 0).to_rgb(), Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn hsl_to_rgb_cyan_preset() {
        assert_eq!(Hsl::new(200, 100, 60).to_rgb(), Rgb { r: 51, g: 187, b: 255 });
    }

    #[test]
    fn id_sequence_is_monotonic() {
        let mut ids = IdSequence::default();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.next_id(), 3);
    }

    #[test]
    fn rgb_scale_clamps() {
        let c = Rgb { r: 200, g: 100, b: 0 };
        assert_eq!(c.scale(0.0), Rgb::default());
        assert_eq!(c.scale(2.0), c);
    }
}
