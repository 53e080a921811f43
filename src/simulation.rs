//! Top-level owner of pool, grid, stepper and pixel buffer.
//!
//! The engine never schedules itself. A driver calls [`Simulation::step`]
//! then [`Simulation::render`] once per frame while running, and simply
//! stops calling them to pause.

use crate::config::SimConfig;
use crate::error::Result;
use crate::grid::SpatialGrid;
use crate::material::Material;
use crate::physics::Stepper;
use crate::pool::{Particle, ParticleId, ParticlePool, Slot};
use crate::render::{rasterize, PixelBuffer};
use crate::scene::{self, ImportReport};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Jitter given to brush-stamped particles, per axis.
const SPAWN_JITTER: f32 = 0.5;

/// Offsets along one axis that a brush of radius `r` at `centre` can reach
/// without leaving `[0, extent)`.
fn brush_span(centre: f32, r: f32, extent: u32) -> RangeInclusive<i64> {
    let reach = r.ceil() as i64;
    let lo = (-centre).ceil() as i64;
    let hi = ((extent as f32 - centre).ceil() - 1.0) as i64;
    lo.max(-reach)..=hi.min(reach)
}

/// Timings of the most recent step and render, for telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub particles: usize,
    pub step_ms: f64,
    pub render_ms: f64,
}

pub struct Simulation<R = StdRng> {
    config: SimConfig,
    pool: ParticlePool,
    grid: SpatialGrid,
    stepper: Stepper,
    buffer: PixelBuffer,
    rng: R,
    stats: FrameStats,
}

impl Simulation<StdRng> {
    /// Build a simulation whose randomness is seeded from `config.seed`.
    pub fn new(config: SimConfig) -> Result<Self> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> Simulation<R> {
    pub fn with_rng(config: SimConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool: ParticlePool::new(config.max_particles),
            grid: SpatialGrid::new(config.width, config.height, config.cell_size),
            stepper: Stepper::new(config.width, config.height),
            buffer: PixelBuffer::new(config.width, config.height),
            rng,
            stats: FrameStats::default(),
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.config.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.config.height
    }

    #[inline]
    fn in_field(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.config.width as f32 && y < self.config.height as f32
    }

    /// Stamp particles on every integer offset strictly inside a disc of
    /// `brush_radius` (at least 1) around (x, y). Offsets outside the field
    /// are clipped; once the pool is full the rest are dropped. Returns how
    /// many were placed.
    pub fn add_particles(
        &mut self,
        x: f32,
        y: f32,
        material: Material,
        brush_radius: f32,
    ) -> usize {
        let r = if brush_radius.is_finite() {
            brush_radius.max(1.0)
        } else {
            1.0
        };
        let r2 = f64::from(r) * f64::from(r);
        let (xs, ys) = (
            brush_span(x, r, self.config.width),
            brush_span(y, r, self.config.height),
        );
        let mut placed = 0usize;

        for dy in ys {
            for dx in xs.clone() {
                let (fx, fy) = (dx as f64, dy as f64);
                if fx * fx + fy * fy >= r2 {
                    continue;
                }
                let px = x + dx as f32;
                let py = y + dy as f32;
                if !self.in_field(px, py) {
                    continue;
                }
                let vx = (self.rng.gen::<f32>() - 0.5) * SPAWN_JITTER;
                let vy = (self.rng.gen::<f32>() - 0.5) * SPAWN_JITTER;
                let life = if material == Material::Fire {
                    self.rng.gen_range(0.5..1.0)
                } else {
                    1.0
                };
                if self.place(px, py, vx, vy, material, life).is_none() {
                    debug!(
                        placed,
                        capacity = self.pool.capacity(),
                        "pool exhausted, brush truncated"
                    );
                    return placed;
                }
                placed += 1;
            }
        }
        placed
    }

    /// Place exactly one particle at rest with its material's base
    /// temperature. `None` if outside the field or the pool is full.
    pub fn spawn(&mut self, x: f32, y: f32, material: Material) -> Option<ParticleId> {
        if !self.in_field(x, y) {
            return None;
        }
        let slot = self.place(x, y, 0.0, 0.0, material, 1.0)?;
        self.pool.get(slot).map(|p| p.id)
    }

    fn place(
        &mut self,
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        material: Material,
        life: f32,
    ) -> Option<Slot> {
        let slot = self.pool.acquire()?;
        let p = self.pool.get_mut(slot)?;
        p.x = x;
        p.y = y;
        p.vx = vx;
        p.vy = vy;
        p.material = material;
        p.temperature = material.descriptor().temperature;
        p.life = life;
        self.grid.insert(slot, x, y);
        Some(slot)
    }

    fn release(&mut self, slot: Slot) -> bool {
        let Some(p) = self.pool.get(slot) else {
            return false;
        };
        let (x, y) = (p.x, p.y);
        self.grid.remove(slot, x, y);
        self.pool.release(slot)
    }

    /// Eraser: remove every particle within `radius` of (x, y).
    pub fn remove_particles(&mut self, x: f32, y: f32, radius: f32) -> usize {
        let r2 = radius.max(0.0) * radius.max(0.0);
        let doomed: Vec<Slot> = self
            .pool
            .iter()
            .filter(|(_, p)| {
                let (dx, dy) = (p.x - x, p.y - y);
                dx * dx + dy * dy <= r2
            })
            .map(|(slot, _)| slot)
            .collect();
        doomed.into_iter().filter(|&s| self.release(s)).count()
    }

    pub fn remove_particle(&mut self, id: ParticleId) -> bool {
        match self.pool.find(id) {
            Some(slot) => self.release(slot),
            None => false,
        }
    }

    /// Return every particle to the pool and empty the grid.
    pub fn clear(&mut self) {
        let n = self.pool.len();
        self.pool.reset();
        self.grid.clear();
        self.stats.particles = 0;
        info!(removed = n, "cleared simulation");
    }

    /// Advance one tick. Returns wall-clock milliseconds spent.
    pub fn step(&mut self) -> f64 {
        let start = Instant::now();
        self.stepper.step(&mut self.pool, &mut self.grid, &mut self.rng);
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        self.stats.step_ms = ms;
        self.stats.particles = self.pool.len();
        ms
    }

    /// Redraw the pixel buffer. Returns wall-clock milliseconds spent.
    pub fn render(&mut self) -> f64 {
        let start = Instant::now();
        rasterize(&self.pool, &mut self.buffer);
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        self.stats.render_ms = ms;
        ms
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn particle_count(&self) -> usize {
        self.pool.len()
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            particles: self.pool.len(),
            ..self.stats
        }
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.pool.iter().map(|(_, p)| p)
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn export_scene(&self) -> Result<String> {
        let text = scene::encode(&self.pool)?;
        info!(particles = self.pool.len(), bytes = text.len(), "exported scene");
        Ok(text)
    }

    /// Replace the current scene with a snapshot.
    ///
    /// The document is parsed and version-checked before anything is
    /// touched, so a malformed snapshot leaves the scene as it was. Bad
    /// records are skipped one by one after the clear.
    pub fn import_scene(&mut self, data: &str) -> Result<ImportReport> {
        let records = match scene::decode(data, self.config.width, self.config.height) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "rejected scene snapshot, keeping current scene");
                return Err(e);
            }
        };

        self.clear();
        let mut report = ImportReport::default();
        for (index, rec) in records.into_iter().enumerate() {
            let r = match rec {
                Ok(r) => r,
                Err(e) => {
                    warn!(index, error = %e, "skipping snapshot record");
                    report.skipped += 1;
                    continue;
                }
            };
            match self.place(r.x, r.y, r.vx, r.vy, r.material, r.life) {
                Some(slot) => {
                    if let Some(p) = self.pool.get_mut(slot) {
                        p.temperature = r.temperature;
                    }
                    report.imported += 1;
                }
                None => report.dropped += 1,
            }
        }
        self.stats.particles = self.pool.len();
        info!(
            imported = report.imported,
            skipped = report.skipped,
            dropped = report.dropped,
            "imported scene"
        );
        Ok(report)
    }
}
