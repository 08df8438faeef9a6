//! Config handling

use std::path::{Path, PathBuf};

use tracing::log::LevelFilter;

use crate::constants::DOTENV_FILENAME;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("reqwest", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Loads `.env` from the working directory (or a parent), then from next to
/// the executable. Variables already set are never overridden.
///
/// Returns the files that were read, for logging once the logger is up.
pub fn load_env_files() -> Vec<PathBuf> {
    let mut loaded = Vec::new();
    if let Ok(path) = dotenvy::dotenv() {
        loaded.push(path);
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DOTENV_FILENAME)));
    if let Some(path) = beside_exe
        && path.exists()
        && !loaded.contains(&path)
        && dotenvy::from_path(&path).is_ok()
    {
        loaded.push(path);
    }

    loaded
}

/// Directory relative paths are resolved against: the flag, then `$PWD`, then
/// the process working directory.
pub fn base_dir(cwd_flag: Option<&Path>) -> PathBuf {
    if let Some(dir) = cwd_flag {
        return dir.to_path_buf();
    }
    std::env::var_os("PWD")
        .map(PathBuf::from)
        .filter(|dir| dir.is_absolute())
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Joins relative paths onto `base`; absolute paths pass through.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
