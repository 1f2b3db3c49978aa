use crate::config::Args;
use crate::effects::{circle_finished, flash_finished, hit_test};
use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::model::Millis;
use crate::render::{cell_center, compose_frame, SceneView, Terminal};
use crate::scene::SceneController;
use anyhow::Context;
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use std::time::{Duration, Instant};

pub(crate) struct App {
    args: Args,
    scene: SceneController<StdRng>,
    term: Terminal,
    started: Instant,
    show_hud: bool,
    should_quit: bool,
}

impl App {
    fn init(args: Args, term: Terminal) -> Self {
        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        info!(
            "starting: {}x{} cells, fps {}, seed {:?}",
            term.cols,
            term.rows,
            args.frame_cap(),
            args.seed
        );

        let mut scene = SceneController::new(rng);
        scene.initialize(0);

        Self {
            show_hud: !args.no_hud,
            args,
            scene,
            term,
            started: Instant::now(),
            should_quit: false,
        }
    }

    fn now(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.args.frame_cap() as f32);

        while !self.should_quit {
            // input
            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(ev) {
                    self.apply(action)?;
                }
                if self.should_quit {
                    break;
                }
            }

            // timers, then animation-end signals
            let now = self.now();
            self.scene.advance(now);
            self.dispatch_completions(now);

            // render
            let view = SceneView {
                circles: self.scene.circles(),
                splatters: self.scene.splatters(),
                flash: self.scene.flash(),
                stats: self.scene.stats(),
                now,
            };
            compose_frame(&mut self.term, &view, !self.args.no_color, self.show_hud);
            self.term.present().context("drawing frame")?;

            // frame cap
            spin_sleep(frame_dt, Instant::now());
        }

        self.scene.teardown();
        Ok(())
    }

    fn apply(&mut self, action: Action) -> anyhow::Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleHud => self.show_hud = !self.show_hud,
            Action::Restart => {
                let now = self.now();
                self.scene.teardown();
                self.scene.initialize(now);
            }
            Action::Resize { cols, rows } => {
                debug!("resize to {cols}x{rows}");
                self.term.resize(cols, rows)?;
            }
            Action::Pop { col, row } => {
                let now = self.now();
                let at = cell_center(col, row);
                let vp = self.term.canvas.viewport();
                if let Some(circle) = hit_test(self.scene.circles(), at, vp, now) {
                    self.scene.pop(&circle, at, now);
                }
            }
        }
        Ok(())
    }

    fn dispatch_completions(&mut self, now: Millis) {
        let finished: Vec<u64> = self
            .scene
            .circles()
            .iter()
            .filter(|c| circle_finished(c, now))
            .map(|c| c.id)
            .collect();
        for id in finished {
            self.scene.on_circle_animation_complete(id);
        }

        if flash_finished(self.scene.flash(), now) {
            self.scene.on_flash_animation_end();
        }
    }
}

pub(crate) fn run(args: Args) -> anyhow::Result<()> {
    let term = Terminal::begin().context("entering terminal mode")?;
    let mut app = App::init(args, term);
    let res = app.run();

    // Always restore the terminal, even when the loop failed
    let end = app.term.end();
    res.and(end)
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
