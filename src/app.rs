use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::storage::{self, Paths};
use crate::term::{dot_size_for, Terminal};
use crate::Args;
use anyhow::Context;
use sandpit::{Material, SimConfig, Simulation};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

const BRUSH_MIN: i32 = 1;
const BRUSH_MAX: i32 = 10;
const MESSAGE_TTL: Duration = Duration::from_secs(3);

pub(crate) struct App {
    sim: Simulation,
    term: Terminal,
    scene_path: PathBuf,
    fps_cap: u32,
    running: bool,
    material: Material,
    brush: i32,
    eraser: bool,
    show_help: bool,
    cursor: (u16, u16),
    stroke: Option<(f32, f32)>,
    frame_times: VecDeque<Duration>,
    message: Option<(String, Instant)>,
    dirty: bool,
    should_quit: bool,
}

impl App {
    fn init(args: &Args, paths: &Paths) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(p) => storage::load_config(p),
            None => storage::load_config(&paths.config_path),
        };
        apply_overrides(&mut config, args);

        if args.fit {
            let (cols, rows) = crossterm::terminal::size().context("querying terminal size")?;
            let (w, h) = dot_size_for(cols, rows);
            config.width = w;
            config.height = h;
        }

        let mut sim = Simulation::new(config).context("building simulation")?;
        info!(
            width = sim.width(),
            height = sim.height(),
            capacity = sim.config().max_particles,
            "simulation ready"
        );

        let scene_path = args.scene.clone().unwrap_or_else(|| paths.scene_path.clone());
        let mut message = None;
        if args.scene.is_some() {
            message = Some((load_scene(&mut sim, &scene_path), Instant::now()));
        }

        let term = Terminal::begin().context("terminal setup")?;
        let cursor = (term.cols / 2, term.field_rows() / 2);
        Ok(Self {
            sim,
            term,
            scene_path,
            fps_cap: args.fps.clamp(10, 240),
            running: !args.paused,
            material: Material::Sand,
            brush: 3,
            eraser: false,
            show_help: false,
            cursor,
            stroke: None,
            frame_times: VecDeque::with_capacity(60),
            message,
            dirty: true,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.fps_cap as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(ev) {
                    self.apply(action);
                }
            }

            if self.running {
                self.sim.step();
                self.dirty = true;
            }
            if self.dirty {
                self.sim.render();
                self.dirty = false;
            }
            self.draw()?;

            let now = Instant::now();
            if self.frame_times.len() == 60 {
                self.frame_times.pop_front();
            }
            self.frame_times.push_back(now.saturating_duration_since(last_frame));
            last_frame = now;

            spin_sleep(frame_dt, now);
        }

        self.term.end()?;
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::TogglePause => self.running = !self.running,
            Action::StepOnce => {
                if !self.running {
                    self.sim.step();
                    self.dirty = true;
                }
            }
            Action::Select(m) => {
                self.material = m;
                self.eraser = false;
            }
            Action::Brush(d) => self.brush = (self.brush + d).clamp(BRUSH_MIN, BRUSH_MAX),
            Action::Clear => {
                self.sim.clear();
                self.dirty = true;
            }
            Action::Save => {
                let msg = save_scene(&self.sim, &self.scene_path);
                self.notify(msg);
            }
            Action::Load => {
                let msg = load_scene(&mut self.sim, &self.scene_path);
                self.dirty = true;
                self.notify(msg);
            }
            Action::ToggleEraser => self.eraser = !self.eraser,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::MoveCursor(dx, dy) => {
                let cols = self.term.cols.max(1) as i32;
                let rows = self.term.field_rows() as i32;
                let x = (self.cursor.0 as i32 + dx).clamp(0, cols - 1);
                let y = (self.cursor.1 as i32 + dy).clamp(0, rows - 1);
                self.cursor = (x as u16, y as u16);
            }
            Action::StampAtCursor => {
                let (x, y) = self.cell_to_field(self.cursor.0, self.cursor.1);
                self.paint(x, y, self.eraser);
            }
            Action::Paint { col, row, erase, drag } => {
                if row >= self.term.field_rows() {
                    return;
                }
                let (x, y) = self.cell_to_field(col, row);
                let erase = erase || self.eraser;
                match self.stroke.filter(|_| drag) {
                    Some(from) => self.paint_stroke(from, (x, y), erase),
                    None => self.paint(x, y, erase),
                }
                self.stroke = Some((x, y));
                self.cursor = (col, row);
            }
            Action::EndStroke => self.stroke = None,
            Action::Resize(w, h) => self.term.resize(w, h),
        }
    }

    /// Centre of a terminal cell in field coordinates.
    fn cell_to_field(&self, col: u16, row: u16) -> (f32, f32) {
        let sx = self.sim.width() as f32 / self.term.cols.max(1) as f32;
        let sy = self.sim.height() as f32 / self.term.field_rows() as f32;
        ((col as f32 + 0.5) * sx, (row as f32 + 0.5) * sy)
    }

    /// Brush radius in field units, so it looks the same at any scale.
    fn brush_radius(&self) -> f32 {
        let (dot_w, _) = self.term.dot_size();
        let per_dot = (self.sim.width() as f32 / dot_w.max(1) as f32).max(1.0);
        self.brush as f32 * per_dot
    }

    fn paint(&mut self, x: f32, y: f32, erase: bool) {
        let r = self.brush_radius();
        if erase {
            self.sim.remove_particles(x, y, r);
        } else {
            self.sim.add_particles(x, y, self.material, r);
        }
        self.dirty = true;
    }

    /// Interpolate a drag so fast strokes leave no gaps.
    fn paint_stroke(&mut self, from: (f32, f32), to: (f32, f32), erase: bool) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let spacing = self.brush_radius().max(2.0);
        let steps = ((dx * dx + dy * dy).sqrt() / spacing).ceil().max(1.0) as usize;
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            self.paint(from.0 + dx * t, from.1 + dy * t, erase);
        }
    }

    fn notify(&mut self, msg: String) {
        self.message = Some((msg, Instant::now()));
    }

    fn fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        let total: Duration = self.frame_times.iter().sum();
        let avg = total.as_secs_f32() / self.frame_times.len() as f32;
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    fn draw(&mut self) -> anyhow::Result<()> {
        let stats = self.sim.stats();
        let tool = if self.eraser {
            "Eraser".to_string()
        } else {
            self.material.to_string()
        };
        let mut status = format!(
            " {} r{} | {} | {}/{} | {:.0} fps | step {:.2}ms render {:.2}ms",
            tool,
            self.brush,
            if self.running { "running" } else { "paused" },
            stats.particles,
            self.sim.config().max_particles,
            self.fps(),
            stats.step_ms,
            stats.render_ms,
        );
        match &self.message {
            Some((m, at)) if at.elapsed() < MESSAGE_TTL => {
                status.push_str(" | ");
                status.push_str(m);
            }
            _ => status.push_str(" | h help"),
        }

        let help = self.show_help.then(help_lines);
        self.term.draw(
            self.sim.pixels(),
            &status,
            Some(self.cursor),
            help.as_deref(),
        )?;
        Ok(())
    }
}

fn apply_overrides(config: &mut SimConfig, args: &Args) {
    if let Some(w) = args.width {
        config.width = w;
    }
    if let Some(h) = args.height {
        config.height = h;
    }
    if let Some(n) = args.max_particles {
        config.max_particles = n;
    }
    if let Some(s) = args.seed {
        config.seed = s;
    }
}

fn save_scene(sim: &Simulation, path: &std::path::Path) -> String {
    let result = sim
        .export_scene()
        .map_err(anyhow::Error::from)
        .and_then(|text| storage::write_scene_atomic(path, &text));
    match result {
        Ok(()) => format!("saved {} particles", sim.particle_count()),
        Err(e) => {
            let detail = format!("{e:#}");
            error!(error = %detail, "scene save failed");
            format!("save failed: {e}")
        }
    }
}

fn load_scene(sim: &mut Simulation, path: &std::path::Path) -> String {
    let text = match storage::read_scene(path) {
        Ok(t) => t,
        Err(e) => {
            let detail = format!("{e:#}");
            error!(error = %detail, "scene load failed");
            return format!("load failed: {e}");
        }
    };
    match sim.import_scene(&text) {
        Ok(r) if r.skipped + r.dropped > 0 => format!(
            "loaded {} ({} skipped, {} over capacity)",
            r.imported, r.skipped, r.dropped
        ),
        Ok(r) => format!("loaded {} particles", r.imported),
        Err(e) => format!("load failed: {e}"),
    }
}

fn help_lines() -> Vec<String> {
    let mut lines = vec!["Sandpit".to_string(), String::new()];
    for (i, m) in Material::ALL.iter().enumerate() {
        lines.push(format!("{}  {}", i + 1, m));
    }
    lines.extend(
        [
            "",
            "mouse   left paint, right erase",
            "arrows  move cursor, Enter stamp",
            "+/-     brush size   e  eraser",
            "space   pause        .  single step",
            "c clear  s save  l load  q quit",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    lines
}

pub(crate) fn run(args: Args) -> anyhow::Result<()> {
    let paths = storage::project_paths()?;
    storage::init_logging(&paths.log_path)?;
    let mut app = App::init(&args, &paths)?;
    let result = app.run();
    if result.is_err() {
        // leave the terminal usable before reporting
        let _ = app.term.end();
    }
    result
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
