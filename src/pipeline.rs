//! Directory triage: decide what happens to every file and put it in its bucket.
//!
//! For each direct entry of the input directory:
//!
//! 1. **Classify**: anything that is not a JPEG goes to [`Bucket::Remain`]
//! 2. **Inspect**: JPEGs that already carry both capture dates go to [`Bucket::Untouched`]
//! 3. **Infer**: the date is read from the filename; no match means [`Bucket::NotFixed`]
//! 4. **Write**: the patched JPEG is written to [`Bucket::Fixed`]
//!
//! A container that cannot be parsed at step 2 or 4 sends the file to
//! [`Bucket::Corrupted`]. Originals are always copied, never moved or modified.

use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::config::Config;
use crate::date;
use crate::error::{Error, Result};
use crate::exif;

/// OS metadata files that are never triaged.
const IGNORED_NAMES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Output bucket, one subdirectory of the input directory each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Patched JPEGs with both capture dates written.
    Fixed,
    /// JPEGs that already had both dates.
    Untouched,
    /// JPEGs whose stream or EXIF container could not be parsed.
    Corrupted,
    /// JPEGs missing a date whose filename gave none either.
    NotFixed,
    /// Everything that is not a JPEG.
    Remain,
}

impl Bucket {
    pub const ALL: [Bucket; 5] = [
        Bucket::Fixed,
        Bucket::Untouched,
        Bucket::Corrupted,
        Bucket::NotFixed,
        Bucket::Remain,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Fixed => "_fixed",
            Self::Untouched => "_untouched",
            Self::Corrupted => "_corrupted",
            Self::NotFixed => "_not_fixed",
            Self::Remain => "_remain",
        }
    }
}

/// How a file is treated, decided from its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.jpg` / `.jpeg`, any case.
    Jpeg,
    Other,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            _ => Self::Other,
        }
    }
}

/// What happened to a single file.
#[derive(Debug, Clone, Serialize)]
pub struct TriageResult {
    pub path: PathBuf,
    /// `None` when the file could not be placed at all (I/O failure).
    pub bucket: Option<Bucket>,
    /// The capture date written, for fixed files.
    pub date: Option<String>,
    /// Name of the filename pattern the date came from.
    pub pattern: Option<&'static str>,
    pub error: Option<String>,
}

impl TriageResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            bucket: None,
            date: None,
            pattern: None,
            error: None,
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input_dir: PathBuf,
    pub results: Vec<TriageResult>,
}

impl RunReport {
    pub fn count(&self, bucket: Bucket) -> usize {
        self.results.iter().filter(|r| r.bucket == Some(bucket)).count()
    }

    /// Files that could not be placed in any bucket.
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.bucket.is_none()).count()
    }
}

fn is_control_name(name: &str) -> bool {
    IGNORED_NAMES.contains(&name) || Bucket::ALL.iter().any(|b| b.dir_name() == name)
}

/// List the regular files directly inside `dir`, sorted by name.
///
/// Subdirectories, bucket directories and OS metadata files are skipped.
pub fn collect_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(Error::io(dir, e.into())),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy();
        if is_control_name(&name) {
            log::debug!("Ignoring {name}");
            continue;
        }
        if !entry.file_type().is_file() {
            log::debug!("Skipping non-file entry: {}", entry.path().display());
            continue;
        }
        files.push(entry.into_path());
    }

    Ok(files)
}

/// What to put in the chosen bucket.
enum Placement {
    /// A byte-identical copy of the original.
    Copy(Bucket),
    /// The patched JPEG, destined for [`Bucket::Fixed`].
    Fixed(Vec<u8>),
}

impl Placement {
    fn bucket(&self) -> Bucket {
        match self {
            Self::Copy(bucket) => *bucket,
            Self::Fixed(_) => Bucket::Fixed,
        }
    }
}

/// Run the core on one file. Per-file outcomes (corrupted, unrecognized name)
/// become placements; only I/O failures are returned as errors.
fn decide(path: &Path, result: &mut TriageResult) -> Result<Placement> {
    if FileKind::from_path(path) == FileKind::Other {
        return Ok(Placement::Copy(Bucket::Remain));
    }

    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;

    match exif::inspect(&bytes) {
        Ok(dates) if !dates.is_missing() => return Ok(Placement::Copy(Bucket::Untouched)),
        Ok(_) => {}
        Err(e) => {
            let err = Error::from(e);
            log::warn!("{}: {err}", path.display());
            result.error = Some(err.to_string());
            return Ok(Placement::Copy(Bucket::Corrupted));
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let inferred = match date::require(&file_name) {
        Ok(inferred) => inferred,
        Err(e) => {
            log::warn!("{e}");
            result.error = Some(e.to_string());
            return Ok(Placement::Copy(Bucket::NotFixed));
        }
    };
    if inferred.to_datetime().is_none() {
        log::warn!("{file_name}: {inferred} is not a calendar date, writing it as found");
    }
    result.date = Some(inferred.to_exif_string());
    result.pattern = Some(inferred.pattern.name());

    match exif::apply_date_to_bytes(&bytes, &inferred) {
        Ok(patched) => Ok(Placement::Fixed(patched)),
        Err(e) => {
            let err = Error::from(e);
            log::warn!("{}: {err}", path.display());
            result.error = Some(err.to_string());
            Ok(Placement::Copy(Bucket::Corrupted))
        }
    }
}

/// Write the placement under its bucket directory.
///
/// The content goes to a temporary file in the bucket first and is renamed into
/// place once complete, so a failed write never leaves a partial file behind.
fn place(source: &Path, placement: Placement, config: &Config) -> Result<PathBuf> {
    let dir = config.bucket_dir(placement.bucket());
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

    let file_name = source.file_name().ok_or_else(|| {
        Error::io(source, io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))
    })?;
    let dest = dir.join(file_name);

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| Error::io(&dir, e))?;
    match placement {
        Placement::Copy(_) => {
            let mut src = File::open(source).map_err(|e| Error::io(source, e))?;
            io::copy(&mut src, tmp.as_file_mut()).map_err(|e| Error::io(source, e))?;
        }
        Placement::Fixed(bytes) => {
            tmp.write_all(&bytes).map_err(|e| Error::io(tmp.path(), e))?;
        }
    }
    tmp.as_file().sync_all().map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(&dest).map_err(|e| Error::io(&dest, e.error))?;

    Ok(dest)
}

/// Triage a single file and place it in its bucket.
///
/// Never fails: problems are recorded in the returned [`TriageResult`].
pub fn triage_file(path: &Path, config: &Config) -> TriageResult {
    let mut result = TriageResult::new(path);

    let placement = match decide(path, &mut result) {
        Ok(placement) => placement,
        Err(e) => {
            log::error!("{e}");
            result.error = Some(e.to_string());
            return result;
        }
    };

    let bucket = placement.bucket();
    match place(path, placement, config) {
        Ok(dest) => {
            match &result.date {
                Some(date) => log::info!("  {} -> {} ({date})", path.display(), dest.display()),
                None => log::info!("  {} -> {}", path.display(), dest.display()),
            }
            result.bucket = Some(bucket);
        }
        Err(e) => {
            log::error!("Failed to place {} in {}: {e}", path.display(), bucket.dir_name());
            result.error = Some(e.to_string());
        }
    }

    result
}

/// Triage every file of the configured directory, one at a time.
///
/// Only an unreadable input directory fails the run; per-file problems are
/// reported in the [`RunReport`].
pub fn run(config: &Config) -> Result<RunReport> {
    let entries = collect_entries(config.input_dir())?;
    let total = entries.len();
    log::info!("Found {total} file(s) in {}", config.input_dir().display());

    let results = entries
        .iter()
        .enumerate()
        .map(|(i, path)| {
            log::debug!("[{}/{}] {}", i + 1, total, path.display());
            triage_file(path, config)
        })
        .collect();

    Ok(RunReport {
        input_dir: config.input_dir().to_path_buf(),
        results,
    })
}
