//! Per-tick particle stepper.
//!
//! Each tick the grid is rebuilt from current positions, then every active
//! slot is advanced in slot order: forces, state transitions, contacts,
//! integration, boundary bounce. Pairwise outcomes depend on that order.

use crate::grid::SpatialGrid;
use crate::interaction::interact;
use crate::material::{
    Material, BOILING_POINT, CONDENSATION_TEMPERATURE, FIRE_DECAY, GAS_LIFT, GRAVITY,
    SMOKE_DECAY,
};
use crate::pool::{Particle, ParticlePool, Slot};
use rand::Rng;

/// Particles closer than this are in contact.
pub const CONTACT_DISTANCE: f32 = 2.0;
/// Velocity kept (and reversed) when hitting the field edge.
pub const BOUNCE: f32 = 0.5;
/// Viscosity to per-tick damping scale.
pub const VISCOSITY_DAMPING: f32 = 0.1;

pub struct Stepper {
    width: f32,
    height: f32,
    neighbors: Vec<Slot>,
}

impl Stepper {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            neighbors: Vec::with_capacity(64),
        }
    }

    pub fn step<R: Rng + ?Sized>(
        &mut self,
        pool: &mut ParticlePool,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) {
        grid.clear();
        for (slot, p) in pool.iter() {
            grid.insert(slot, p.x, p.y);
        }

        for slot in 0..pool.capacity() {
            // released earlier this tick, or never active
            if pool.is_active(slot) {
                self.advance(slot, pool, grid, rng);
            }
        }
    }

    fn advance<R: Rng + ?Sized>(
        &mut self,
        slot: Slot,
        pool: &mut ParticlePool,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) {
        let Some(p) = pool.get_mut(slot) else {
            return;
        };
        let origin = (p.x, p.y);

        apply_forces(p);
        if !apply_transitions(p) {
            grid.remove(slot, origin.0, origin.1);
            pool.release(slot);
            return;
        }

        if !self.resolve_contacts(slot, origin, pool, grid, rng) {
            return;
        }

        let Some(p) = pool.get_mut(slot) else {
            return;
        };
        p.x += p.vx;
        p.y += p.vy;
        confine(p, self.width, self.height);
        grid.relocate(slot, origin, (p.x, p.y));
    }

    /// Returns false when `slot` itself was dissolved.
    fn resolve_contacts<R: Rng + ?Sized>(
        &mut self,
        slot: Slot,
        origin: (f32, f32),
        pool: &mut ParticlePool,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> bool {
        grid.neighbors(slot, origin.0, origin.1, &mut self.neighbors);

        for i in 0..self.neighbors.len() {
            let other = self.neighbors[i];
            let Some((p, q)) = pool.pair_mut(slot, other) else {
                continue;
            };

            let dx = p.x - q.x;
            let dy = p.y - q.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if !(dist > 0.0 && dist < CONTACT_DISTANCE) {
                continue;
            }

            let contact = interact(p, q, rng);
            if contact.any_dissolved() {
                let (qx, qy) = (q.x, q.y);
                if contact.second_dissolved {
                    grid.remove(other, qx, qy);
                    pool.release(other);
                }
                if contact.first_dissolved {
                    grid.remove(slot, origin.0, origin.1);
                    pool.release(slot);
                    return false;
                }
                continue;
            }

            let q_before = (q.x, q.y);
            let nx = dx / dist;
            let ny = dy / dist;
            separate(p, q, nx, ny, CONTACT_DISTANCE - dist);
            exchange_impulse(p, q, nx, ny);
            confine(q, self.width, self.height);
            let q_after = (q.x, q.y);
            grid.relocate(other, q_before, q_after);
        }
        true
    }
}

fn apply_forces(p: &mut Particle) {
    let d = p.material.descriptor();
    if d.gaseous {
        p.vy -= GRAVITY * GAS_LIFT;
    } else {
        p.vy += GRAVITY;
    }
    let damping = 1.0 - d.viscosity * VISCOSITY_DAMPING;
    p.vx *= damping;
    p.vy *= damping;
}

/// Temperature and lifetime transitions. Returns false when the particle
/// has burnt out and must be removed.
fn apply_transitions(p: &mut Particle) -> bool {
    match p.material {
        Material::Water if p.temperature > BOILING_POINT => p.transmute(Material::Steam),
        Material::Steam if p.temperature < CONDENSATION_TEMPERATURE => {
            p.transmute(Material::Water)
        }
        Material::Fire => {
            p.life -= FIRE_DECAY;
            if p.life <= 0.0 {
                p.transmute(Material::Smoke);
                p.life = 1.0;
            }
        }
        Material::Smoke => {
            p.life -= SMOKE_DECAY;
            if p.life <= 0.0 {
                return false;
            }
        }
        _ => {}
    }
    true
}

/// Push the pair apart along the normal, half the overlap each.
fn separate(p: &mut Particle, q: &mut Particle, nx: f32, ny: f32, overlap: f32) {
    let half = overlap * 0.5;
    p.x += nx * half;
    p.y += ny * half;
    q.x -= nx * half;
    q.y -= ny * half;
}

/// Density-weighted impulse along the normal, only while closing.
/// The normal points from `q` to `p`.
fn exchange_impulse(p: &mut Particle, q: &mut Particle, nx: f32, ny: f32) {
    let closing = (q.vx - p.vx) * nx + (q.vy - p.vy) * ny;
    if closing <= 0.0 {
        return;
    }
    let (dp, dq) = (p.density(), q.density());
    let j = 2.0 * closing / (dp + dq);
    p.vx += j * dq * nx;
    p.vy += j * dq * ny;
    q.vx -= j * dp * nx;
    q.vy -= j * dp * ny;
}

/// Clamp into `[0, width) x [0, height)`, reversing and halving the
/// velocity component that hit the edge.
pub fn confine(p: &mut Particle, width: f32, height: f32) {
    if p.x < 0.0 {
        p.x = 0.0;
        p.vx = -p.vx * BOUNCE;
    } else if p.x >= width {
        p.x = width - 1.0;
        p.vx = -p.vx * BOUNCE;
    }
    if p.y < 0.0 {
        p.y = 0.0;
        p.vy = -p.vy * BOUNCE;
    } else if p.y >= height {
        p.y = height - 1.0;
        p.vy = -p.vy * BOUNCE;
    }
}
