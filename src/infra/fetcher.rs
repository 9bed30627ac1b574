// ============================================================
// Layer 6 — Dataset Fetcher
// ============================================================
// Downloads the two source CSV files into a local data
// directory and reuses them on later runs.
//
//   data/
//     pml-training.csv   ← labelled pool (19,622 rows)
//     pml-testing.csv    ← quiz pool (20 rows, problem_id)
//
// A download is written to `<name>.part` first and renamed when
// complete, so an interrupted transfer never looks cached.
//
// Reference: ureq crate documentation

use anyhow::{bail, Context, Result};
use std::{
    fs,
    io,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_TRAINING_URL: &str =
    "https://d396qusza40orc.cloudfront.net/predmachlearn/pml-training.csv";

pub const DEFAULT_QUIZ_URL: &str =
    "https://d396qusza40orc.cloudfront.net/predmachlearn/pml-testing.csv";

pub struct DatasetFetcher {
    data_dir: PathBuf,
    timeout:  Duration,
}

impl DatasetFetcher {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            timeout:  Duration::from_secs(120),
        }
    }

    /// Where `url` is (or would be) cached
    pub fn local_path(&self, url: &str) -> Result<PathBuf> {
        Ok(self.data_dir.join(file_name(url)?))
    }

    /// Return the cached copy of `url`, downloading it first unless
    /// `offline` is set.
    pub fn ensure(&self, url: &str, offline: bool) -> Result<PathBuf> {
        let path = self.local_path(url)?;

        if path.exists() {
            tracing::info!("Using cached '{}'", path.display());
            return Ok(path);
        }
        if offline {
            bail!(
                "'{}' is not cached and offline mode forbids downloading {}",
                path.display(),
                url
            );
        }

        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Cannot create data directory '{}'", self.data_dir.display()))?;
        self.download(url, &path)?;
        Ok(path)
    }

    fn download(&self, url: &str, path: &Path) -> Result<()> {
        tracing::info!("Downloading {} → '{}'", url, path.display());

        let response = ureq::get(url)
            .timeout(self.timeout)
            .call()
            .with_context(|| format!("GET {url} failed"))?;

        let bytes = persist(response.into_reader(), path)
            .with_context(|| format!("Download of {url} failed"))?;

        tracing::info!("Saved {} bytes to '{}'", bytes, path.display());
        Ok(())
    }
}

/// Stream `reader` into `<path>.part`, then move it to `path`.
/// The partial file is removed when either step fails.
fn persist(mut reader: impl io::Read, path: &Path) -> Result<u64> {
    let partial = path.with_extension("part");

    let written = fs::File::create(&partial)
        .with_context(|| format!("Cannot create '{}'", partial.display()))
        .and_then(|mut out| io::copy(&mut reader, &mut out).context("Transfer was interrupted"))
        .and_then(|bytes| {
            fs::rename(&partial, path)
                .with_context(|| format!("Cannot move '{}' into place", partial.display()))?;
            Ok(bytes)
        });

    if written.is_err() && partial.exists() {
        if let Err(e) = fs::remove_file(&partial) {
            tracing::warn!("Cannot remove partial file '{}': {}", partial.display(), e);
        }
    }
    written
}

/// Last path segment of a URL, ignoring any query string
fn file_name(url: &str) -> Result<&str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    match without_query.rsplit('/').next() {
        Some(name) if !name.is_empty() => Ok(name),
        _ => bail!("Cannot derive a file name from URL '{url}'"),
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(file_name(DEFAULT_TRAINING_URL).unwrap(), "pml-training.csv");
        assert_eq!(file_name("https://host/a/b.csv?x=1").unwrap(), "b.csv");
        assert!(file_name("https://host/dir/").is_err());
    }

    #[test]
    fn test_cached_file_is_reused_without_network() {
        let dir     = tempfile::tempdir().unwrap();
        let fetcher = DatasetFetcher::new(dir.path());
        let cached  = dir.path().join("pml-testing.csv");
        fs::write(&cached, "problem_id\n1\n").unwrap();

        // offline = true proves no download is attempted
        let path = fetcher.ensure(DEFAULT_QUIZ_URL, true).unwrap();
        assert_eq!(path, cached);
    }

    /// Yields some bytes, then fails mid-transfer
    struct BrokenStream {
        sent: bool,
    }

    impl io::Read for BrokenStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
            }
            self.sent = true;
            let chunk = b"classe\nA\n";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn test_interrupted_transfer_leaves_no_files() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("pml-training.csv");

        assert!(persist(BrokenStream { sent: false }, &path).is_err());
        assert!(!path.exists());
        assert!(!dir.path().join("pml-training.part").exists());
    }

    #[test]
    fn test_complete_transfer_is_moved_into_place() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("pml-testing.csv");

        let bytes = persist("problem_id\n1\n".as_bytes(), &path).unwrap();
        assert_eq!(bytes, 13);
        assert_eq!(fs::read_to_string(&path).unwrap(), "problem_id\n1\n");
        assert!(!dir.path().join("pml-testing.part").exists());
    }

    #[test]
    fn test_offline_without_cache_fails() {
        let dir     = tempfile::tempdir().unwrap();
        let fetcher = DatasetFetcher::new(dir.path());
        assert!(fetcher.ensure(DEFAULT_TRAINING_URL, true).is_err());
    }
}
