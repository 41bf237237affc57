use std::path::Path;

use super::container::{ContainerError, Entry, Namespace};
use super::{TAG_DATE_TIME_DIGITIZED, TAG_DATE_TIME_ORIGINAL, parse_jpeg, read_container};
use crate::error::{Error, Result};

/// The two capture-date tags as found in an image.
///
/// `None` means the tag is absent; `Some("")` means it is present but empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDates {
    pub original: Option<String>,
    pub digitized: Option<String>,
}

impl CaptureDates {
    /// True unless both tags hold a non-empty value.
    pub fn is_missing(&self) -> bool {
        is_blank(self.original.as_deref()) || is_blank(self.digitized.as_deref())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Read the capture-date tags from a JPEG byte stream.
///
/// A JPEG without an EXIF segment yields empty [`CaptureDates`]. A stream that is
/// not a JPEG, or whose EXIF segment does not decode, is an error.
pub fn inspect(bytes: &[u8]) -> std::result::Result<CaptureDates, ContainerError> {
    let jpeg = parse_jpeg(bytes)?;
    let Some(container) = read_container(&jpeg)? else {
        log::debug!("no EXIF segment");
        return Ok(CaptureDates::default());
    };

    let text = |tag| container.get(Namespace::Exif, tag).and_then(Entry::text);
    Ok(CaptureDates {
        original: text(TAG_DATE_TIME_ORIGINAL),
        digitized: text(TAG_DATE_TIME_DIGITIZED),
    })
}

/// Whether the image at `path` lacks either capture date.
///
/// Fails with [`Error::ContainerUnreadable`] when the file cannot be parsed.
pub fn has_missing_date(path: &Path) -> Result<bool> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(inspect(&bytes)?.is_missing())
}
