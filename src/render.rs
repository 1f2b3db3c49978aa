use crate::config::PX_PER_DOT;
use crate::effects::{
    blot_alpha, circle_alpha, circle_center, drip_alpha, drip_center, flash_paint, Viewport,
};
use crate::model::{FlashState, Millis, Point, Rgb, RisingCircle, SceneStats, SplatterEffect};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use std::io::{self, Write};

const BG: Color = Color::Black;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: BG,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    fn from_rgb(c: Rgb, alpha: f32) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: (alpha.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        }
    }
}

/// Braille sub-pixel canvas, 2×4 dots per terminal cell.
pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn clear(&mut self) {
        self.px.fill(Pixel::default());
    }
    pub(crate) fn viewport(&self) -> Viewport {
        Viewport {
            w: self.w as f32 * PX_PER_DOT,
            h: self.h as f32 * PX_PER_DOT,
        }
    }

    fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }

    /// Paints every dot within `radius_px` of `center`, shaded by `alpha_at`.
    fn stamp<F>(&mut self, center: Point, radius_px: f32, color: Rgb, alpha_at: F)
    where
        F: Fn(Point) -> f32,
    {
        let x0 = ((center.x - radius_px) / PX_PER_DOT).floor() as i32;
        let x1 = ((center.x + radius_px) / PX_PER_DOT).ceil() as i32;
        let y0 = ((center.y - radius_px) / PX_PER_DOT).floor() as i32;
        let y1 = ((center.y + radius_px) / PX_PER_DOT).ceil() as i32;

        for y in y0.max(0)..=y1.min(self.h as i32 - 1) {
            for x in x0.max(0)..=x1.min(self.w as i32 - 1) {
                let at = dot_center(x, y);
                if at.dist(center) > radius_px {
                    continue;
                }
                let a = alpha_at(at);
                if a > 0.0 {
                    self.blend_over(x, y, Pixel::from_rgb(color, a));
                }
            }
        }
    }
}

fn dot_center(x: i32, y: i32) -> Point {
    Point::new(
        (x as f32 + 0.5) * PX_PER_DOT,
        (y as f32 + 0.5) * PX_PER_DOT,
    )
}

/// Viewport pixel under the middle of a terminal cell.
pub(crate) fn cell_center(col: u16, row: u16) -> Point {
    Point::new(
        (col as f32 + 0.5) * 2.0 * PX_PER_DOT,
        (row as f32 + 0.5) * 4.0 * PX_PER_DOT,
    )
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            SetTitle("Color Popper"),
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as u32 * 2, rows as u32 * 4),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            DisableMouseCapture,
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize(&mut self, c: u16, r: u16) -> anyhow::Result<()> {
        if c == self.cols && r == self.rows {
            return Ok(());
        }
        execute!(self.out, Clear(ClearType::All))?;
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        // force a full repaint on the next present
        self.prev.cells.fill(Cell {
            ch: '\0',
            ..Cell::default()
        });
        Ok(())
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// Folds the canvas into braille glyphs. Cell backgrounds are left as they are.
pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, enable_color: bool) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut sum_a: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let x = cx * 2 + dx;
                    let y = cy * 4 + dy;
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    // faint dots drop out, which is how fades end
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        sum_a += p.a as u32;
                        ink_count += 1;
                    }
                }
            }

            if mask == 0 {
                continue;
            }
            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');

            let fg = if enable_color {
                let avg = Rgb {
                    r: (sum_r / ink_count) as u8,
                    g: (sum_g / ink_count) as u8,
                    b: (sum_b / ink_count) as u8,
                };
                let lit = avg.scale((sum_a / ink_count) as f32 / 255.0);
                Color::Rgb {
                    r: lit.r,
                    g: lit.g,
                    b: lit.b,
                }
            } else {
                Color::White
            };

            let i = out.idx(cx as u16, cy as u16);
            out.cells[i].ch = ch;
            out.cells[i].fg = fg;
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

/* -----------------------------
   Scene layers
------------------------------ */

pub(crate) struct SceneView<'a> {
    pub(crate) circles: &'a [RisingCircle],
    pub(crate) splatters: &'a [SplatterEffect],
    pub(crate) flash: &'a FlashState,
    pub(crate) stats: SceneStats,
    pub(crate) now: Millis,
}

pub(crate) struct Renderer;

impl Renderer {
    pub(crate) fn draw_circles(canvas: &mut PixelCanvas, view: &SceneView<'_>) {
        let vp = canvas.viewport();
        for c in view.circles {
            let center = circle_center(c, vp, view.now);
            let rgb = c.color.to_rgb();
            canvas.stamp(center, c.size as f32 / 2.0, rgb, |at| {
                circle_alpha(c, center, at)
            });
        }
    }

    pub(crate) fn draw_splatters(canvas: &mut PixelCanvas, view: &SceneView<'_>) {
        // a dot is never further than half a diagonal from its nearest center
        let min_r = PX_PER_DOT * 0.75;
        for s in view.splatters {
            let rgb = s.color.to_rgb();

            let blot = blot_alpha(s, view.now) * 0.9;
            let r = (s.layout.main_size as f32 / 2.0).max(min_r);
            canvas.stamp(s.origin, r, rgb, |at| {
                let t = (at.dist(s.origin) / r).clamp(0.0, 1.0);
                blot * (1.0 - 0.7 * t)
            });

            for d in &s.layout.drips {
                let a = drip_alpha(s, d, view.now) * 0.7;
                let r = (d.size as f32 / 2.0).max(min_r);
                canvas.stamp(drip_center(s, d), r, rgb, |_| a);
            }
        }
    }

    /// Tints cell backgrounds with the flash overlay.
    pub(crate) fn tint_flash(buf: &mut CellBuffer, vp: Viewport, view: &SceneView<'_>) {
        for y in 0..buf.h {
            for x in 0..buf.w {
                let Some((hsl, a)) = flash_paint(view.flash, vp, cell_center(x, y), view.now)
                else {
                    return;
                };
                let c = hsl.to_rgb().scale(a);
                let i = buf.idx(x, y);
                buf.cells[i].bg = Color::Rgb {
                    r: c.r,
                    g: c.g,
                    b: c.b,
                };
            }
        }
    }

    pub(crate) fn overlay_hud(buf: &mut CellBuffer, view: &SceneView<'_>) {
        let fg = Color::Rgb {
            r: 210,
            g: 210,
            b: 210,
        };
        let dim = Color::Rgb {
            r: 140,
            g: 140,
            b: 150,
        };
        let line1 = format!(
            "colorpop  | circles {}  | splatters {}  | popped {}  | escaped {}",
            view.circles.len(),
            view.splatters.len(),
            view.stats.popped,
            view.stats.escaped
        );
        draw_text(buf, 0, 0, &line1, fg, BG);
        draw_text(buf, 0, 1, "Click pop  H hud  R restart  Q quit", dim, BG);
    }

    pub(crate) fn overlay_helper(buf: &mut CellBuffer) {
        let text = " Tap circles to pop and flash ";
        let w = text.chars().count() as u16;
        if buf.h < 3 || buf.w < w {
            return;
        }
        let x = (buf.w - w) / 2;
        let y = buf.h - 2;
        let fg = Color::Rgb {
            r: 150,
            g: 150,
            b: 165,
        };
        let bg = Color::Rgb {
            r: 28,
            g: 28,
            b: 36,
        };
        draw_text(buf, x, y, text, fg, bg);
    }
}

/// Builds one full frame into the terminal's back buffer.
pub(crate) fn compose_frame(
    term: &mut Terminal,
    view: &SceneView<'_>,
    enable_color: bool,
    show_hud: bool,
) {
    term.cur.clear(BG);
    term.canvas.clear();

    let vp = term.canvas.viewport();
    if enable_color {
        Renderer::tint_flash(&mut term.cur, vp, view);
    }

    Renderer::draw_circles(&mut term.canvas, view);
    Renderer::draw_splatters(&mut term.canvas, view);
    canvas_to_cells(&term.canvas, &mut term.cur, enable_color);

    Renderer::overlay_helper(&mut term.cur);
    if show_hud {
        Renderer::overlay_hud(&mut term.cur, view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::SplatterLayout;
    use crate::model::Hsl;
    use crate::random::Scripted;

    fn view<'a>(
        circles: &'a [RisingCircle],
        splatters: &'a [SplatterEffect],
        flash: &'a FlashState,
        now: Millis,
    ) -> SceneView<'a> {
        SceneView {
            circles,
            splatters,
            flash,
            stats: SceneStats::default(),
            now,
        }
    }

    #[test]
    fn braille_bits_cover_all_dots() {
        let mut all = 0u8;
        for dy in 0..4 {
            for dx in 0..2 {
                all |= braille_bit(dx, dy);
            }
        }
        assert_eq!(all, 0xFF);
    }

    #[test]
    fn full_cell_becomes_full_braille() {
        let mut canvas = PixelCanvas::new(2, 4);
        for y in 0..4 {
            for x in 0..2 {
                canvas.blend_over(x, y, Pixel { r: 255, g: 0, b: 0, a: 255 });
            }
        }
        let mut buf = CellBuffer::new(1, 1);
        canvas_to_cells(&canvas, &mut buf, true);
        assert_eq!(buf.cells[0].ch, '\u{28FF}');
        assert_eq!(buf.cells[0].fg, Color::Rgb { r: 255, g: 0, b: 0 });
    }

    #[test]
    fn faint_dots_are_dropped() {
        let mut canvas = PixelCanvas::new(2, 4);
        canvas.blend_over(0, 0, Pixel { r: 255, g: 255, b: 255, a: 10 });
        let mut buf = CellBuffer::new(1, 1);
        canvas_to_cells(&canvas, &mut buf, true);
        assert_eq!(buf.cells[0], Cell::default());
    }

    #[test]
    fn blend_ignores_out_of_bounds() {
        let mut canvas = PixelCanvas::new(2, 2);
        canvas.blend_over(-1, 0, Pixel { r: 1, g: 1, b: 1, a: 255 });
        canvas.blend_over(0, 5, Pixel { r: 1, g: 1, b: 1, a: 255 });
        assert!(canvas.px.iter().all(|p| *p == Pixel::default()));
    }

    #[test]
    fn cell_center_maps_to_viewport_pixels() {
        assert_eq!(cell_center(0, 0), Point::new(4.0, 8.0));
        assert_eq!(cell_center(10, 2), Point::new(84.0, 40.0));
    }

    #[test]
    fn circle_lands_on_canvas() {
        let mut canvas = PixelCanvas::new(80, 80);
        let vp = canvas.viewport();
        let c = RisingCircle {
            id: 1,
            left: 50.0,
            size: 60,
            duration_ms: 10_000,
            color: Hsl::new(140, 100, 45),
            spawned_at: 0,
        };
        let flash = FlashState::default();
        let circles = [c];
        let v = view(&circles, &[], &flash, 5_000);
        Renderer::draw_circles(&mut canvas, &v);

        let center = circle_center(&c, vp, 5_000);
        let (x, y) = (
            (center.x / PX_PER_DOT) as u32,
            (center.y / PX_PER_DOT) as u32,
        );
        assert!(canvas.px[canvas.idx(x, y)].a > 32);
    }

    #[test]
    fn splatter_disappears_after_lifetime() {
        let mut rng = Scripted::new(&[0.5]);
        let s = SplatterEffect {
            id: 1,
            origin: Point::new(100.0, 100.0),
            color: Hsl::new(0, 100, 60),
            lifetime_ms: 1_000,
            created_at: 0,
            layout: SplatterLayout::compose(&mut rng, 1_000),
        };
        let flash = FlashState::default();
        let splatters = [s];

        let mut canvas = PixelCanvas::new(80, 80);
        Renderer::draw_splatters(&mut canvas, &view(&[], &splatters, &flash, 10));
        assert!(canvas.px.iter().any(|p| p.a >= 32));

        let mut canvas = PixelCanvas::new(80, 80);
        Renderer::draw_splatters(&mut canvas, &view(&[], &splatters, &flash, 5_000));
        assert!(canvas.px.iter().all(|p| p.a < 32));
    }

    #[test]
    fn flash_tints_backgrounds_only_when_active() {
        let mut buf = CellBuffer::new(20, 10);
        let vp = Viewport { w: 160.0, h: 160.0 };
        let mut flash = FlashState {
            color: Some(Hsl::new(0, 100, 60)),
            center: Some(Point::new(80.0, 80.0)),
            active: false,
            started_at: 0,
        };
        Renderer::tint_flash(&mut buf, vp, &view(&[], &[], &flash, 100));
        assert!(buf.cells.iter().all(|c| c.bg == BG));

        flash.active = true;
        Renderer::tint_flash(&mut buf, vp, &view(&[], &[], &flash, 100));
        assert!(buf.cells.iter().any(|c| matches!(c.bg, Color::Rgb { r, .. } if r > 0)));
    }

    #[test]
    fn helper_text_is_centered_near_bottom() {
        let mut buf = CellBuffer::new(60, 10);
        Renderer::overlay_helper(&mut buf);
        let row: String = (0..60).map(|x| buf.cells[buf.idx(x, 8)].ch).collect();
        assert!(row.contains("Tap circles to pop and flash"));
    }
}
