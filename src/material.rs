//! Material kinds and their physical descriptors.
//!
//! The table is static: exactly one descriptor per kind, never mutated.
//! Particles carry only their kind; color and density are looked up here
//! whenever they are needed.

use crate::error::SimError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Downward acceleration added to non-gaseous particles every tick.
pub const GRAVITY: f32 = 0.2;
/// Gases rise with this fraction of gravity.
pub const GAS_LIFT: f32 = 0.3;
/// Fraction of the pairwise temperature gap closed per contact per tick.
pub const TEMPERATURE_DIFFUSION: f32 = 0.1;
/// Temperature a particle takes on when it catches fire.
pub const IGNITION_TEMPERATURE: f32 = 800.0;
/// Water above this temperature becomes steam.
pub const BOILING_POINT: f32 = 100.0;
/// Steam below this temperature condenses back into water.
pub const CONDENSATION_TEMPERATURE: f32 = 90.0;
/// Life lost by fire each tick.
pub const FIRE_DECAY: f32 = 0.01;
/// Life lost by smoke each tick.
pub const SMOKE_DECAY: f32 = 0.005;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Material {
    Sand,
    Water,
    Stone,
    Fire,
    Smoke,
    Oil,
    Acid,
    Steam,
}

/// Immutable physical description of a material kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialDescriptor {
    pub name: &'static str,
    pub color: Rgb,
    /// Mass used in collision impulses.
    pub density: f32,
    /// Velocity damping per tick is `1 - viscosity * 0.1`.
    pub viscosity: f32,
    /// Temperature a freshly placed particle starts at.
    pub temperature: f32,
    pub flammable: bool,
    pub soluble: bool,
    pub gaseous: bool,
}

const TABLE: [MaterialDescriptor; Material::COUNT] = [
    MaterialDescriptor {
        name: "Sand",
        color: Rgb::new(0xF4, 0xA4, 0x60),
        density: 2.65,
        viscosity: 0.9,
        temperature: 20.0,
        flammable: false,
        soluble: true,
        gaseous: false,
    },
    MaterialDescriptor {
        name: "Water",
        color: Rgb::new(0x1E, 0x90, 0xFF),
        density: 1.0,
        viscosity: 0.1,
        temperature: 20.0,
        flammable: false,
        soluble: false,
        gaseous: false,
    },
    MaterialDescriptor {
        name: "Stone",
        color: Rgb::new(0x69, 0x69, 0x69),
        density: 3.0,
        viscosity: 1.0,
        temperature: 20.0,
        flammable: false,
        soluble: true,
        gaseous: false,
    },
    MaterialDescriptor {
        name: "Fire",
        color: Rgb::new(0xFF, 0x45, 0x00),
        density: 0.3,
        viscosity: 0.05,
        temperature: IGNITION_TEMPERATURE,
        flammable: false,
        soluble: false,
        gaseous: true,
    },
    MaterialDescriptor {
        name: "Smoke",
        color: Rgb::new(0x80, 0x80, 0x80),
        density: 0.5,
        viscosity: 0.02,
        temperature: 100.0,
        flammable: false,
        soluble: false,
        gaseous: true,
    },
    MaterialDescriptor {
        name: "Oil",
        color: Rgb::new(0x2F, 0x4F, 0x2F),
        density: 0.8,
        viscosity: 0.3,
        temperature: 20.0,
        flammable: true,
        soluble: false,
        gaseous: false,
    },
    MaterialDescriptor {
        name: "Acid",
        color: Rgb::new(0x32, 0xCD, 0x32),
        density: 1.2,
        viscosity: 0.2,
        temperature: 20.0,
        flammable: false,
        soluble: false,
        gaseous: false,
    },
    MaterialDescriptor {
        name: "Steam",
        color: Rgb::new(0xE6, 0xE6, 0xFA),
        density: 0.1,
        viscosity: 0.01,
        temperature: 100.0,
        flammable: false,
        soluble: false,
        gaseous: true,
    },
];

impl Material {
    pub const COUNT: usize = 8;

    pub const ALL: [Material; Material::COUNT] = [
        Material::Sand,
        Material::Water,
        Material::Stone,
        Material::Fire,
        Material::Smoke,
        Material::Oil,
        Material::Acid,
        Material::Steam,
    ];

    #[inline]
    pub fn descriptor(self) -> &'static MaterialDescriptor {
        &TABLE[self as usize]
    }

    #[inline]
    pub fn color(self) -> Rgb {
        self.descriptor().color
    }

    #[inline]
    pub fn density(self) -> f32 {
        self.descriptor().density
    }

    /// Snapshot key, e.g. `"sand"`.
    pub const fn key(self) -> &'static str {
        match self {
            Material::Sand => "sand",
            Material::Water => "water",
            Material::Stone => "stone",
            Material::Fire => "fire",
            Material::Smoke => "smoke",
            Material::Oil => "oil",
            Material::Acid => "acid",
            Material::Steam => "steam",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

impl FromStr for Material {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .iter()
            .copied()
            .find(|m| m.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SimError::UnknownMaterial(s.to_string()))
    }
}
