use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;

/// `ad-creative-<unix millis>.png`
pub fn file_name(at: DateTime<Utc>) -> String {
    format!("ad-creative-{}.png", at.timestamp_millis())
}

/// Writes image bytes into `dir`, creating it when missing.
pub async fn write_image(dir: &Path, bytes: &[u8], at: DateTime<Utc>) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name(at));
    tokio::fs::write(&path, bytes).await?;
    log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}
