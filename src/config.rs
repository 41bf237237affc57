use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pipeline::Bucket;

/// Run configuration: the directory to triage.
///
/// Resolved once by the binary and handed to [`crate::pipeline::run`]; the
/// library itself never reads the environment.
///
/// ```rust,no_run
/// use exif_date_fix::config::Config;
///
/// let config = Config::resolve(Some("./photos".into())).unwrap();
/// println!("fixed files go to {}", config.bucket_dir(exif_date_fix::pipeline::Bucket::Fixed).display());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory whose files are triaged. Buckets are created inside it.
    pub input_dir: PathBuf,
}

impl Config {
    /// Validate the input directory.
    ///
    /// Fails with [`Error::MissingInputDirectory`] when none was supplied and with
    /// [`Error::NotADirectory`] when the path is not an existing directory.
    pub fn resolve(input_dir: Option<PathBuf>) -> Result<Self> {
        let input_dir = input_dir
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(Error::MissingInputDirectory)?;
        if !input_dir.is_dir() {
            return Err(Error::NotADirectory(input_dir));
        }
        Ok(Self { input_dir })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Where files placed in `bucket` end up.
    pub fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.input_dir.join(bucket.dir_name())
    }
}
