use anyhow::{Context, Result};
use directories::ProjectDirs;
use sandpit::SimConfig;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) struct Paths {
    pub(crate) scene_path: PathBuf,
    pub(crate) config_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "sandpit", "Sandpit")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Ok(Paths {
        scene_path: dir.join("scene.json"),
        config_path: dir.join("config.json"),
        log_path: dir.join("sandpit.log"),
    })
}

/// Missing or unreadable config falls back to defaults.
pub(crate) fn load_config(path: &Path) -> SimConfig {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<SimConfig>(&s) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt config");
                SimConfig::default()
            }
        },
        Err(_) => SimConfig::default(),
    }
}

pub(crate) fn read_scene(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading scene {}", path.display()))
}

pub(crate) fn write_scene_atomic(path: &Path, data: &str) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename-over-existing fails on some platforms
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).with_context(|| format!("replacing {}", to.display()))?;
    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
pub(crate) fn init_logging(path: &Path) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
