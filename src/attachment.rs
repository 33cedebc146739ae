//! Download of converted documents announced by `documentOpen`.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::Result;
use crate::session::random_hex;

/// Fresh destination for one attachment: `<dir>/<16 hex>-Editor.bin`.
#[must_use]
pub fn attachment_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}-Editor.bin", random_hex(8)))
}

/// Stream `url` into a new file under `dir`, creating `dir` if needed.
///
/// Returns the path written.
///
/// # Errors
///
/// `Error::Fetch` for HTTP failures and non-success statuses, `Error::Io`
/// for filesystem failures.
pub async fn fetch(client: &reqwest::Client, url: &str, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;

    let mut response = client.get(url).send().await?.error_for_status()?;

    let path = attachment_path(dir);
    let mut file = tokio::fs::File::create(&path).await?;
    let mut written = 0usize;
    while let Some(chunk) = response.chunk().await? {
        written += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    debug!(%url, path = %path.display(), bytes = written, "attachment saved");
    Ok(path)
}
