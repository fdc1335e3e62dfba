use simplelog::*;
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// `$HOME/.local/share/<app_name>/logs`
pub fn log_dir(app_name: &str) -> Result<PathBuf, Error> {
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join(app_name)
        .join("logs"))
}

/// Route the `log` macros to `app.log` under [`log_dir`]. Only the first
/// call installs a logger; later calls report whether that one succeeded.
pub fn init_logger(app_name: &str, level: LevelFilter) -> Result<PathBuf, Error> {
    let log_dir = log_dir(app_name)?;
    fs::create_dir_all(&log_dir)?;
    let path = log_dir.join("app.log");

    let log_file = OpenOptions::new().create(true).append(true).open(&path)?;

    INIT.call_once(|| {
        if WriteLogger::init(level, Config::default(), log_file).is_ok() {
            LOGGER_INITIALIZED.store(true, Ordering::Release);
        }
    });

    if LOGGER_INITIALIZED.load(Ordering::Acquire) {
        Ok(path)
    } else {
        Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
    }
}
