use sandpit::{ImportReport, Material, SimConfig, SimError, Simulation};

fn sim() -> Simulation {
    Simulation::new(SimConfig::with_size(160, 120)).unwrap()
}

fn populated() -> Simulation {
    let mut sim = sim();
    sim.add_particles(30.0, 30.0, Material::Sand, 4.0);
    sim.add_particles(80.0, 20.0, Material::Water, 4.0);
    sim.add_particles(120.0, 100.0, Material::Stone, 3.0);
    sim.add_particles(60.0, 90.0, Material::Oil, 3.0);
    sim.add_particles(140.0, 30.0, Material::Acid, 2.0);
    for _ in 0..15 {
        sim.step();
    }
    sim
}

#[test]
fn export_then_import_restores_the_scene() {
    let source = populated();
    let text = source.export_scene().unwrap();

    let mut restored = sim();
    let report = restored.import_scene(&text).unwrap();
    assert_eq!(report.imported, source.particle_count());
    assert_eq!(report.skipped, 0);
    assert_eq!(report.dropped, 0);

    let a: Vec<_> = source.particles().collect();
    let b: Vec<_> = restored.particles().collect();
    assert_eq!(a.len(), b.len());
    for (p, q) in a.iter().zip(&b) {
        assert_eq!(p.material, q.material);
        assert_eq!((p.x, p.y), (q.x, q.y));
        assert_eq!((p.vx, p.vy), (q.vx, q.vy));
        assert_eq!(p.temperature, q.temperature);
        assert_eq!(p.life, q.life);
        assert_eq!(p.color(), q.color());
    }
    assert_eq!(restored.grid().len(), restored.particle_count());
}

#[test]
fn import_replaces_existing_particles() {
    let mut sim = populated();
    let doc = r#"{"version": 1, "particles": [
        {"x": 5, "y": 6, "vx": 0.5, "vy": -0.5, "type": "oil", "temperature": 30, "life": 1}
    ]}"#;
    let report = sim.import_scene(doc).unwrap();

    assert_eq!(report, ImportReport { imported: 1, skipped: 0, dropped: 0 });
    assert_eq!(sim.particle_count(), 1);
    let p = sim.particles().next().unwrap();
    assert_eq!(p.material, Material::Oil);
    assert_eq!((p.x, p.y, p.vx, p.vy), (5.0, 6.0, 0.5, -0.5));
    assert_eq!(p.temperature, 30.0);
}

#[test]
fn malformed_snapshot_leaves_scene_untouched() {
    let mut sim = populated();
    let before = sim.export_scene().unwrap();
    let count = sim.particle_count();

    for bad in ["", "{", "[1, 2, 3]", r#"{"particles": "sand"}"#] {
        let err = sim.import_scene(bad).unwrap_err();
        assert!(matches!(err, SimError::MalformedSnapshot(_)), "{bad:?} gave {err}");
    }
    let err = sim
        .import_scene(r#"{"version": 2, "particles": []}"#)
        .unwrap_err();
    assert!(matches!(err, SimError::UnsupportedVersion { found: 2, supported: 1 }));

    assert_eq!(sim.particle_count(), count);
    assert_eq!(sim.export_scene().unwrap(), before);
}

#[test]
fn unknown_material_is_skipped() {
    let mut sim = sim();
    let doc = r#"{"version": 1, "particles": [
        {"x": 10, "y": 10, "vx": 0, "vy": 0, "type": "plasma", "temperature": 20, "life": 1},
        {"x": 20, "y": 10, "vx": 0, "vy": 0, "type": "sand", "temperature": 20, "life": 1}
    ]}"#;
    let report = sim.import_scene(doc).unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(sim.particle_count(), 1);
    assert_eq!(sim.particles().next().unwrap().material, Material::Sand);
}

#[test]
fn invalid_records_are_skipped_individually() {
    let mut sim = sim();
    let doc = r#"{"particles": [
        {"x": 10, "y": 10, "vx": 0, "vy": 0, "type": "water", "temperature": 20, "life": 1.5},
        {"x": 500, "y": 10, "vx": 0, "vy": 0, "type": "water", "temperature": 20, "life": 1},
        {"x": 10, "y": 10, "type": "water"},
        "not a record",
        {"x": 12, "y": 14, "vx": 0, "vy": 0, "type": "Water", "temperature": 20, "life": 1}
    ]}"#;
    let report = sim.import_scene(doc).unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped, 4);
    let p = sim.particles().next().unwrap();
    assert_eq!((p.x, p.y), (12.0, 14.0));
}

#[test]
fn import_beyond_capacity_is_truncated() {
    let mut config = SimConfig::with_size(100, 100);
    config.max_particles = 2;
    let mut sim = Simulation::new(config).unwrap();
    let doc = r#"{"particles": [
        {"x": 1, "y": 1, "vx": 0, "vy": 0, "type": "sand", "temperature": 20, "life": 1},
        {"x": 2, "y": 1, "vx": 0, "vy": 0, "type": "sand", "temperature": 20, "life": 1},
        {"x": 3, "y": 1, "vx": 0, "vy": 0, "type": "sand", "temperature": 20, "life": 1}
    ]}"#;
    let report = sim.import_scene(doc).unwrap();

    assert_eq!(report.imported, 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(sim.particle_count(), 2);
}

#[test]
fn exported_records_use_material_keys() {
    let mut sim = sim();
    sim.spawn(10.0, 10.0, Material::Steam).unwrap();
    let v: serde_json::Value = serde_json::from_str(&sim.export_scene().unwrap()).unwrap();

    assert_eq!(v["version"], 1);
    let rec = &v["particles"][0];
    assert_eq!(rec["type"], "steam");
    for key in ["x", "y", "vx", "vy", "temperature", "life"] {
        assert!(rec[key].is_number(), "missing {key}");
    }
}
