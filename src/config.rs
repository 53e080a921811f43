use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;
pub const MAX_PARTICLES: usize = 10_000;
pub const CELL_SIZE: f32 = 8.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: u32,
    pub height: u32,
    pub max_particles: usize,
    pub cell_size: f32,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            max_particles: MAX_PARTICLES,
            cell_size: CELL_SIZE,
            seed: 0xC0FFEE_u64,
        }
    }
}

impl SimConfig {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SimError::InvalidConfig(format!(
                "field must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_particles == 0 {
            return Err(SimError::InvalidConfig("max_particles must be > 0".into()));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_values() {
        assert!(SimConfig::with_size(0, 10).validate().is_err());
        let mut c = SimConfig::default();
        c.cell_size = 0.0;
        assert!(c.validate().is_err());
        c = SimConfig::default();
        c.max_particles = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: SimConfig = serde_json::from_str(r#"{"width": 320, "seed": 5}"#).unwrap();
        assert_eq!(c.width, 320);
        assert_eq!(c.height, DEFAULT_HEIGHT);
        assert_eq!(c.seed, 5);
    }
}
