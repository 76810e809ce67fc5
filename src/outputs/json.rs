//! JSON archive of each digest.
//!
//! When an archive directory is configured, every run writes its summary to
//! a file named after the local date:
//!
//! ```text
//! archive_dir/
//! ├── 2025-05-05.json
//! └── 2025-05-06.json
//! ```
//!
//! A second run on the same local day overwrites that day's file.

use crate::models::DigestSummary;
use chrono_tz::Tz;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `summary` as pretty-printed JSON under `archive_dir`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(archive_dir = %archive_dir))]
pub async fn write_archive(
    summary: &DigestSummary,
    archive_dir: &str,
    tz: Tz,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(summary)?;

    if let Err(e) = fs::create_dir_all(archive_dir).await {
        error!(%archive_dir, error = %e, "Failed to create archive dir");
        return Err(e.into());
    }

    let local_date = summary.generated_at.with_timezone(&tz).date_naive();
    let path = PathBuf::from(archive_dir).join(format!("{}.json", local_date));

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = summary.len(), "Wrote digest archive");
    Ok(path)
}
