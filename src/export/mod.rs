//! # History Export
//!
//! Writes the control history as CSV, one row per snapshot, oldest first.
//! Timestamps are UTC.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::Snapshot;
use crate::error::CoolingResult;

pub const CSV_HEADER: &str =
    "Time,T1,T2,T4,T5,DP1,FW_Freq,SW_Freq,FW_Count,SW_Count,Efficiency,Engine_Load";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Write the history when the controller shuts down
    pub enabled: bool,
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("."),
            file_prefix: "cooling_data".to_string(),
        }
    }
}

impl ExportConfig {
    /// `<directory>/<prefix>_<YYYYmmdd_HHMMSS>.csv`
    pub fn path_for(&self, at: DateTime<Utc>) -> PathBuf {
        self.directory.join(format!(
            "{}_{}.csv",
            self.file_prefix,
            at.format("%Y%m%d_%H%M%S")
        ))
    }
}

/// Write `history` as CSV into `out`.
pub fn write_csv<W: Write>(mut out: W, history: &[Snapshot]) -> std::io::Result<()> {
    writeln!(out, "{}", CSV_HEADER)?;
    for snapshot in history {
        let s = &snapshot.state;
        writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            snapshot.timestamp.format(TIME_FORMAT),
            s.t1_c,
            s.t2_c,
            s.t4_c,
            s.t5_c,
            s.dp1_bar,
            s.fw_freq_hz,
            s.sw_freq_hz,
            s.fw_count,
            s.sw_count,
            s.heat_exchanger_efficiency,
            s.engine_load_percent,
        )?;
    }
    out.flush()
}

/// Write `history` to `path`. An empty history writes no file.
pub fn export_to(path: &Path, history: &[Snapshot]) -> CoolingResult<bool> {
    if history.is_empty() {
        info!(path = %path.display(), "history empty, nothing exported");
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), history)?;

    info!(path = %path.display(), rows = history.len(), "history exported");
    Ok(true)
}

/// Export under the configured naming scheme, returning the written path.
pub fn export_history(
    config: &ExportConfig,
    history: &[Snapshot],
    at: DateTime<Utc>,
) -> CoolingResult<Option<PathBuf>> {
    let path = config.path_for(at);
    Ok(export_to(&path, history)?.then_some(path))
}
