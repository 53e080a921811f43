//! Scene snapshots: a flat JSON list of particle records.
//!
//! ```json
//! { "version": 1,
//!   "particles": [ { "x": 1.0, "y": 2.0, "vx": 0.0, "vy": 0.1,
//!                    "type": "sand", "temperature": 20.0, "life": 1.0 } ] }
//! ```
//!
//! Color and density are not stored; they follow from `type`.

use crate::error::{Result, SimError};
use crate::material::Material;
use crate::pool::ParticlePool;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    #[serde(rename = "type")]
    pub kind: String,
    pub temperature: f32,
    pub life: f32,
}

#[derive(Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    particles: &'a [ParticleRecord],
}

// Records stay untyped until each one is checked on its own, so one bad
// entry does not sink the whole document.
#[derive(Deserialize)]
struct SnapshotIn {
    #[serde(default = "default_version")]
    version: u32,
    particles: Vec<Value>,
}

/// A record that passed validation and can go straight into a pool slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Restored {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub material: Material,
    pub temperature: f32,
    pub life: f32,
}

/// Outcome of a scene import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Records rejected individually (unknown material, bad values).
    pub skipped: usize,
    /// Valid records that found no free pool slot.
    pub dropped: usize,
}

pub fn encode(pool: &ParticlePool) -> Result<String> {
    let particles: Vec<ParticleRecord> = pool
        .iter()
        .map(|(_, p)| ParticleRecord {
            x: p.x,
            y: p.y,
            vx: p.vx,
            vy: p.vy,
            kind: p.material.key().to_string(),
            temperature: p.temperature,
            life: p.life,
        })
        .collect();
    let out = SnapshotOut {
        version: SNAPSHOT_VERSION,
        particles: &particles,
    };
    serde_json::to_string(&out).map_err(SimError::SnapshotEncode)
}

/// Parse a whole snapshot. Fails only when the document itself is unusable;
/// per-record problems come back inside the vector.
pub fn decode(data: &str, width: u32, height: u32) -> Result<Vec<Result<Restored>>> {
    let snap: SnapshotIn = serde_json::from_str(data).map_err(SimError::MalformedSnapshot)?;
    if snap.version > SNAPSHOT_VERSION {
        return Err(SimError::UnsupportedVersion {
            found: snap.version,
            supported: SNAPSHOT_VERSION,
        });
    }
    Ok(snap
        .particles
        .into_iter()
        .enumerate()
        .map(|(index, value)| restore(index, value, width, height))
        .collect())
}

fn restore(index: usize, value: Value, width: u32, height: u32) -> Result<Restored> {
    let invalid = |reason: String| SimError::InvalidRecord { index, reason };

    let rec: ParticleRecord = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
    let material: Material = rec.kind.parse()?;

    let numbers = [rec.x, rec.y, rec.vx, rec.vy, rec.temperature, rec.life];
    if numbers.iter().any(|v| !v.is_finite()) {
        return Err(invalid("non-finite value".into()));
    }
    if !(0.0..=1.0).contains(&rec.life) {
        return Err(invalid(format!("life {} outside [0, 1]", rec.life)));
    }
    if rec.x < 0.0 || rec.y < 0.0 || rec.x >= width as f32 || rec.y >= height as f32 {
        return Err(invalid(format!(
            "position ({}, {}) outside {}x{} field",
            rec.x, rec.y, width, height
        )));
    }

    Ok(Restored {
        x: rec.x,
        y: rec.y,
        vx: rec.vx,
        vy: rec.vy,
        material,
        temperature: rec.temperature,
        life: rec.life,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_version_reads_as_current() {
        let recs = decode(r#"{"particles": []}"#, 10, 10).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn newer_version_is_refused() {
        let err = decode(r#"{"version": 9, "particles": []}"#, 10, 10).unwrap_err();
        assert!(matches!(err, SimError::UnsupportedVersion { found: 9, .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            decode("not json", 10, 10),
            Err(SimError::MalformedSnapshot(_))
        ));
        assert!(matches!(
            decode(r#"{"particles": 3}"#, 10, 10),
            Err(SimError::MalformedSnapshot(_))
        ));
    }

    #[test]
    fn bad_records_are_reported_individually() {
        let doc = r#"{"particles": [
            {"x": 1, "y": 1, "vx": 0, "vy": 0, "type": "sand", "temperature": 20, "life": 1},
            {"x": 1, "y": 1, "vx": 0, "vy": 0, "type": "lava", "temperature": 20, "life": 1},
            {"x": 1, "y": 1, "vx": 0, "vy": 0, "type": "fire", "temperature": 20, "life": 3},
            {"x": 50, "y": 1, "vx": 0, "vy": 0, "type": "oil", "temperature": 20, "life": 1},
            {"x": 1, "y": 1, "type": "water"}
        ]}"#;
        let recs = decode(doc, 10, 10).unwrap();
        assert_eq!(recs.len(), 5);
        assert_eq!(recs[0].as_ref().unwrap().material, Material::Sand);
        assert!(matches!(recs[1], Err(SimError::UnknownMaterial(_))));
        assert!(matches!(recs[2], Err(SimError::InvalidRecord { index: 2, .. })));
        assert!(matches!(recs[3], Err(SimError::InvalidRecord { index: 3, .. })));
        assert!(matches!(recs[4], Err(SimError::InvalidRecord { index: 4, .. })));
    }

    #[test]
    fn encode_writes_keys_and_version() {
        let mut pool = ParticlePool::new(2);
        let s = pool.acquire().unwrap();
        pool.get_mut(s).unwrap().material = Material::Acid;
        let text = encode(&pool).unwrap();
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["version"], 1);
        assert_eq!(v["particles"][0]["type"], "acid");
        assert!(v["particles"][0].get("color").is_none());
    }
}
