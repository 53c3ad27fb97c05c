use log::{info, LevelFilter};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

/// Route `log` output to a dated file so the terminal UI stays clean.
/// Returns the file being written.
pub fn init_file_logger(level: LevelFilter) -> Result<PathBuf, Box<dyn Error>> {
    let dir = AppDirs::log_dir().unwrap_or_else(|| PathBuf::from("log"));
    init_file_logger_in(&dir, level)
}

pub fn init_file_logger_in(dir: &Path, level: LevelFilter) -> Result<PathBuf, Box<dyn Error>> {
    let path = log_file_path(dir);

    let logfile = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {l} - {m}\n")))
        .build(&path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("logfile", Box::new(logfile)))
        .build(Root::builder().appender("logfile").build(level))?;

    log4rs::init_config(config)?;
    info!("file logger initialized at {level}");

    Ok(path)
}

fn log_file_path(dir: &Path) -> PathBuf {
    let current_date = chrono::Local::now().date_naive().to_string();
    dir.join(format!("{current_date}.log"))
}
