use std::path::Path;

use super::container::{ByteOrder, ContainerError, Entry, ExifContainer, Namespace};
use super::{TAG_DATE_TIME_DIGITIZED, TAG_DATE_TIME_ORIGINAL, parse_jpeg, read_container, write_container};
use crate::date::InferredDate;
use crate::error::{Error, Result};

/// Set `DateTimeOriginal` and `DateTimeDigitized` to the same value.
fn set_capture_dates(container: &mut ExifContainer, value: &str) {
    let exif = container.namespace_mut(Namespace::Exif);
    exif.set(Entry::ascii(TAG_DATE_TIME_ORIGINAL, value));
    exif.set(Entry::ascii(TAG_DATE_TIME_DIGITIZED, value));
}

/// Return a copy of the JPEG stream with both capture dates set to `date`.
///
/// Strategy:
/// 1. Parse the JPEG with img-parts (keeps every segment)
/// 2. Decode the existing EXIF container, or start an empty one
/// 3. Replace the two date tags, leave every other tag alone
/// 4. Re-encode and put the EXIF segment back where it was
pub fn apply_date_to_bytes(bytes: &[u8], date: &InferredDate) -> std::result::Result<Vec<u8>, ContainerError> {
    let mut jpeg = parse_jpeg(bytes)?;
    let mut container = match read_container(&jpeg)? {
        Some(container) => container,
        None => {
            log::debug!("no EXIF segment, creating one");
            ExifContainer::new(ByteOrder::Little)
        }
    };

    let value = date.to_exif_string();
    set_capture_dates(&mut container, &value);
    write_container(&mut jpeg, &container)?;

    log::debug!("capture dates set to {value}");
    Ok(jpeg.encoder().bytes().to_vec())
}

/// Read the image at `path` and return its bytes with both capture dates set.
///
/// Nothing is written to disk; callers persist the result.
pub fn apply_date(path: &Path, date: &InferredDate) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(apply_date_to_bytes(&bytes, date)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date;
    use crate::exif::inspect;
    use crate::exif::test_support::*;
    use ::exif as kexif;
    use std::io::Cursor;

    fn june_15() -> InferredDate {
        date::infer("IMG-20230615-0001.jpg").unwrap()
    }

    /// Read a tag back with kamadak-exif, an independent parser.
    fn ascii_tag(bytes: &[u8], tag: kexif::Tag) -> Option<Vec<u8>> {
        let exif = kexif::Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .unwrap();
        match &exif.get_field(tag, kexif::In::PRIMARY)?.value {
            kexif::Value::Ascii(parts) => parts.first().cloned(),
            other => panic!("unexpected value for {tag}: {other:?}"),
        }
    }

    #[test]
    fn writes_both_dates_into_plain_jpeg() {
        let out = apply_date_to_bytes(&plain_jpeg(), &june_15()).unwrap();

        let dates = inspect(&out).unwrap();
        assert_eq!(dates.original.as_deref(), Some("2023:06:15 12:00:00"));
        assert_eq!(dates.digitized.as_deref(), Some("2023:06:15 12:00:00"));
        assert!(!dates.is_missing());

        assert_eq!(
            ascii_tag(&out, kexif::Tag::DateTimeOriginal).as_deref(),
            Some(&b"2023:06:15 12:00:00"[..])
        );
        assert_eq!(
            ascii_tag(&out, kexif::Tag::DateTimeDigitized).as_deref(),
            Some(&b"2023:06:15 12:00:00"[..])
        );
    }

    #[test]
    fn output_still_decodes_as_image() {
        let out = apply_date_to_bytes(&plain_jpeg(), &june_15()).unwrap();
        let img = image::load_from_memory_with_format(&out, image::ImageFormat::Jpeg).unwrap();
        assert_eq!((img.width(), img.height()), (8, 8));
    }

    #[test]
    fn preserves_other_tags() {
        for order in [ByteOrder::Little, ByteOrder::Big] {
            let original = camera_container(order);
            let out = apply_date_to_bytes(&jpeg_with(&original), &june_15()).unwrap();

            let jpeg = parse_jpeg(&out).unwrap();
            let written = read_container(&jpeg).unwrap().unwrap();
            assert_eq!(written.byte_order(), order);
            assert_eq!(written.namespace(Namespace::Primary), original.namespace(Namespace::Primary));
            assert_eq!(written.namespace(Namespace::Gps), original.namespace(Namespace::Gps));

            let exif = written.namespace(Namespace::Exif).unwrap();
            let tags: Vec<u16> = exif.entries().iter().map(|e| e.tag).collect();
            assert_eq!(tags, vec![0x829A, TAG_DATE_TIME_ORIGINAL, TAG_DATE_TIME_DIGITIZED]);
            assert_eq!(exif.get(0x829A), original.get(Namespace::Exif, 0x829A));

            assert_eq!(ascii_tag(&out, kexif::Tag::Make).as_deref(), Some(&b"ACME"[..]));
        }
    }

    #[test]
    fn replaces_existing_dates_together() {
        let mut container = camera_container(ByteOrder::Little);
        container
            .namespace_mut(Namespace::Exif)
            .set(Entry::ascii(TAG_DATE_TIME_ORIGINAL, "1999:01:01 00:00:00"));
        let out = apply_date_to_bytes(&jpeg_with(&container), &june_15()).unwrap();

        let dates = inspect(&out).unwrap();
        assert_eq!(dates.original, dates.digitized);
        assert_eq!(dates.original.as_deref(), Some("2023:06:15 12:00:00"));
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let once = apply_date_to_bytes(&jpeg_with(&camera_container(ByteOrder::Big)), &june_15()).unwrap();
        let twice = apply_date_to_bytes(&once, &june_15()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn keeps_image_data_untouched() {
        let input = plain_jpeg();
        let out = apply_date_to_bytes(&input, &june_15()).unwrap();
        // Only one segment is added; the scan data at the end is unchanged.
        let tail = 64usize.min(input.len());
        assert!(out.ends_with(&input[input.len() - tail..]));
        assert!(out.len() > input.len());
    }

    #[test]
    fn corrupt_input_is_unreadable() {
        let date = june_15();
        assert!(matches!(
            apply_date_to_bytes(b"\xff\xd8 truncated", &date),
            Err(ContainerError::NotJpeg(_))
        ));
        assert!(matches!(
            apply_date_to_bytes(&jpeg_with_raw_exif(b"MM\0*\0\0\0\x08\0\x05"), &date),
            Err(ContainerError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn apply_date_reads_path_without_modifying_it() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("IMG-20230615-0001.jpg");
        let input = plain_jpeg();
        std::fs::write(&path, &input).unwrap();

        let out = apply_date(&path, &june_15()).unwrap();
        assert!(!inspect(&out).unwrap().is_missing());
        assert_eq!(std::fs::read(&path).unwrap(), input);

        std::fs::write(&path, b"garbage").unwrap();
        assert!(matches!(apply_date(&path, &june_15()), Err(Error::ContainerUnreadable(_))));
    }
}
