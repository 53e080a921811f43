//! Fixed-capacity particle arena.
//!
//! Every particle lives in a pre-allocated slot. A slot is either active
//! (part of the live set) or on the free list; there is no second list of
//! live particles to keep in sync. Grid cells refer to particles by slot.

use crate::material::{Material, Rgb};
use std::fmt;

/// Index of a pool slot.
pub type Slot = usize;

/// Identity handed out on activation, unique among active particles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub u64);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub id: ParticleId,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub material: Material,
    pub temperature: f32,
    /// Remaining lifetime in [0, 1]; only fire and smoke burn it down.
    pub life: f32,
    pub active: bool,
}

impl Particle {
    fn vacant() -> Self {
        Self {
            id: ParticleId(0),
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            material: Material::Sand,
            temperature: 20.0,
            life: 1.0,
            active: false,
        }
    }

    #[inline]
    pub fn color(&self) -> Rgb {
        self.material.color()
    }

    #[inline]
    pub fn density(&self) -> f32 {
        self.material.density()
    }

    /// Switch material, keeping position, velocity and temperature.
    pub fn transmute(&mut self, material: Material) {
        self.material = material;
    }
}

pub struct ParticlePool {
    slots: Vec<Particle>,
    // stack: the next slot to hand out is at the end
    free: Vec<Slot>,
    next_id: u64,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Particle::vacant(); capacity],
            free: (0..capacity).rev().collect(),
            next_id: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of active particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Activate a free slot with a fresh id. `None` means the pool is
    /// exhausted; callers drop the particle.
    pub fn acquire(&mut self) -> Option<Slot> {
        let slot = self.free.pop()?;
        let p = &mut self.slots[slot];
        *p = Particle::vacant();
        p.id = ParticleId(self.next_id);
        p.active = true;
        self.next_id = self.next_id.wrapping_add(1);
        Some(slot)
    }

    /// Return a slot to the free list. Releasing an inactive or
    /// out-of-range slot is a no-op and returns false.
    pub fn release(&mut self, slot: Slot) -> bool {
        match self.slots.get_mut(slot) {
            Some(p) if p.active => {
                p.active = false;
                self.free.push(slot);
                true
            }
            _ => false,
        }
    }

    /// Deactivate everything. Slots are handed out in ascending order again
    /// afterwards. Ids keep counting up.
    pub fn reset(&mut self) {
        for p in &mut self.slots {
            p.active = false;
        }
        self.free.clear();
        self.free.extend((0..self.slots.len()).rev());
    }

    #[inline]
    pub fn get(&self, slot: Slot) -> Option<&Particle> {
        self.slots.get(slot).filter(|p| p.active)
    }

    #[inline]
    pub fn get_mut(&mut self, slot: Slot) -> Option<&mut Particle> {
        self.slots.get_mut(slot).filter(|p| p.active)
    }

    #[inline]
    pub fn is_active(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    /// Two distinct active particles at once.
    pub fn pair_mut(&mut self, a: Slot, b: Slot) -> Option<(&mut Particle, &mut Particle)> {
        if a == b || a >= self.slots.len() || b >= self.slots.len() {
            return None;
        }
        let (pa, pb) = if a < b {
            let (lo, hi) = self.slots.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.slots.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        };
        if pa.active && pb.active {
            Some((pa, pb))
        } else {
            None
        }
    }

    /// Active particles in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &Particle)> + '_ {
        self.slots.iter().enumerate().filter(|(_, p)| p.active)
    }

    pub fn find(&self, id: ParticleId) -> Option<Slot> {
        self.iter().find(|(_, p)| p.id == id).map(|(slot, _)| slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn acquire_until_exhausted() {
        let mut pool = ParticlePool::new(3);
        let slots: Vec<_> = (0..3).map(|_| pool.acquire().unwrap()).collect();
        assert_eq!(slots, vec![0, 1, 2]);
        assert!(pool.is_full());
        assert_eq!(pool.acquire(), None);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn ids_are_unique_among_active() {
        let mut pool = ParticlePool::new(16);
        for _ in 0..16 {
            pool.acquire();
        }
        for s in [3, 7, 11] {
            assert!(pool.release(s));
        }
        for _ in 0..3 {
            pool.acquire();
        }
        let ids: HashSet<_> = pool.iter().map(|(_, p)| p.id).collect();
        assert_eq!(ids.len(), pool.len());
    }

    #[test]
    fn released_slot_is_reused() {
        let mut pool = ParticlePool::new(2);
        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        let old_id = pool.get(a).unwrap().id;
        assert!(pool.release(a));
        assert!(!pool.release(a));
        assert!(pool.get(a).is_none());
        let again = pool.acquire().unwrap();
        assert_eq!(again, a);
        assert_ne!(pool.get(again).unwrap().id, old_id);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn reset_restores_ascending_order() {
        let mut pool = ParticlePool::new(4);
        for _ in 0..4 {
            pool.acquire();
        }
        pool.release(1);
        pool.release(0);
        pool.reset();
        assert!(pool.is_empty());
        assert_eq!(pool.acquire(), Some(0));
        assert_eq!(pool.acquire(), Some(1));
    }

    #[test]
    fn pair_mut_requires_two_active_slots() {
        let mut pool = ParticlePool::new(3);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert!(pool.pair_mut(a, a).is_none());
        assert!(pool.pair_mut(a, 2).is_none());
        let (pa, pb) = pool.pair_mut(b, a).unwrap();
        pa.x = 5.0;
        pb.x = 7.0;
        assert_eq!(pool.get(b).unwrap().x, 5.0);
        assert_eq!(pool.get(a).unwrap().x, 7.0);
    }
}
