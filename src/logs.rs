use std::{fs, io, path::Path};

use anyhow::Result;
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    {ContentLimit, FileRotate},
};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

/// Sends logs to `<cache_dir>/logs/main.log`, keeping a few rotated files.
/// The logger is process-wide, calling this twice is an error.
pub fn init(cache_dir: &str) -> Result<()> {
    let log_dir = Path::new(cache_dir).join("logs");
    fs::create_dir_all(&log_dir)?;
    let log = FileRotate::new(
        log_dir.join("main.log"),
        AppendTimestamp::default(FileLimit::MaxFiles(3)),
        ContentLimit::Lines(1000),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    WriteLogger::init(LevelFilter::Info, config, log)?;
    info!("logging to {}", log_dir.display());
    Ok(())
}

/// For tools and benches that have no cache dir.
pub fn init_stderr(level: LevelFilter) -> Result<()> {
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    WriteLogger::init(level, config, io::stderr())?;
    Ok(())
}
