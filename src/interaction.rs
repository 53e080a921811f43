//! Pairwise material rules applied when two particles touch.

use crate::material::{Material, IGNITION_TEMPERATURE, TEMPERATURE_DIFFUSION};
use crate::pool::Particle;
use rand::Rng;

/// Which side of a contact was eaten by acid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Contact {
    pub first_dissolved: bool,
    pub second_dissolved: bool,
}

impl Contact {
    #[inline]
    pub fn any_dissolved(self) -> bool {
        self.first_dissolved || self.second_dissolved
    }
}

/// Apply ignition, dissolution and heat exchange to a touching pair.
///
/// Rules are checked in both directions. Dissolved particles are only
/// flagged here; the caller owns pool and grid and removes them.
pub fn interact<R: Rng + ?Sized>(a: &mut Particle, b: &mut Particle, rng: &mut R) -> Contact {
    if a.material == Material::Fire && b.material.descriptor().flammable {
        ignite(b, rng);
    }
    if b.material == Material::Fire && a.material.descriptor().flammable {
        ignite(a, rng);
    }

    let contact = Contact {
        first_dissolved: b.material == Material::Acid && a.material.descriptor().soluble,
        second_dissolved: a.material == Material::Acid && b.material.descriptor().soluble,
    };
    if contact.any_dissolved() {
        return contact;
    }

    exchange_heat(a, b);
    contact
}

pub fn ignite<R: Rng + ?Sized>(p: &mut Particle, rng: &mut R) {
    p.transmute(Material::Fire);
    p.life = rng.gen_range(0.5..1.0);
    p.temperature = IGNITION_TEMPERATURE;
}

/// Move both temperatures a fixed fraction toward their mean.
pub fn exchange_heat(a: &mut Particle, b: &mut Particle) {
    let mean = (a.temperature + b.temperature) * 0.5;
    a.temperature += (mean - a.temperature) * TEMPERATURE_DIFFUSION;
    b.temperature += (mean - b.temperature) * TEMPERATURE_DIFFUSION;
}
