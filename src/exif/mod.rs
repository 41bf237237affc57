//! EXIF date reading and writing for JPEG files.
//!
//! - [`inspect`] / [`has_missing_date`]: report whether the capture dates are set
//! - [`apply_date_to_bytes`] / [`apply_date`]: set both capture dates, keep everything else
//!
//! The JPEG segment layer goes through `img-parts`; the TIFF structure inside the
//! `Exif\0\0` APP1 segment is handled by [`container`].

pub mod container;
mod reader;
mod writer;

use img_parts::Bytes;
use img_parts::jpeg::{Jpeg, JpegSegment};

pub use container::{ByteOrder, ContainerError, Entry, ExifContainer, Ifd, Namespace};
pub use reader::{CaptureDates, has_missing_date, inspect};
pub use writer::{apply_date, apply_date_to_bytes};

/// `DateTimeOriginal`, Exif IFD.
pub const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
/// `DateTimeDigitized` (a.k.a. `CreateDate`), Exif IFD.
pub const TAG_DATE_TIME_DIGITIZED: u16 = 0x9004;

const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const EXIF_PREFIX: &[u8] = b"Exif\0\0";
// Segment length field is u16 and counts itself.
const MAX_SEGMENT_CONTENTS: usize = u16::MAX as usize - 2;

fn parse_jpeg(bytes: &[u8]) -> Result<Jpeg, ContainerError> {
    Jpeg::from_bytes(Bytes::copy_from_slice(bytes)).map_err(|e| ContainerError::NotJpeg(e.to_string()))
}

/// Find the position of the EXIF APP1 segment in a JPEG.
fn find_exif_segment_pos(jpeg: &Jpeg) -> Option<usize> {
    jpeg.segments()
        .iter()
        .position(|s| s.marker() == MARKER_APP1 && s.contents().starts_with(EXIF_PREFIX))
}

/// Decode the EXIF container of a parsed JPEG, `None` when it has no EXIF segment.
fn read_container(jpeg: &Jpeg) -> Result<Option<ExifContainer>, ContainerError> {
    let Some(pos) = find_exif_segment_pos(jpeg) else {
        return Ok(None);
    };
    let contents = jpeg.segments()[pos].contents();
    ExifContainer::decode(&contents[EXIF_PREFIX.len()..]).map(Some)
}

/// Store the container in the JPEG, replacing the existing EXIF segment in place.
///
/// Without an existing segment the new one goes right after any leading APP0
/// (JFIF) segments.
fn write_container(jpeg: &mut Jpeg, container: &ExifContainer) -> Result<(), ContainerError> {
    let tiff = container.encode()?;
    let len = EXIF_PREFIX.len() + tiff.len();
    if len > MAX_SEGMENT_CONTENTS {
        return Err(ContainerError::TooLarge(len));
    }

    let mut contents = Vec::with_capacity(len);
    contents.extend_from_slice(EXIF_PREFIX);
    contents.extend_from_slice(&tiff);
    let segment = JpegSegment::new_with_contents(MARKER_APP1, Bytes::from(contents));

    match find_exif_segment_pos(jpeg) {
        Some(pos) => jpeg.segments_mut()[pos] = segment,
        None => {
            let segments = jpeg.segments_mut();
            let pos = segments
                .iter()
                .take_while(|s| s.marker() == MARKER_APP0)
                .count();
            segments.insert(pos, segment);
        }
    }
    Ok(())
}
