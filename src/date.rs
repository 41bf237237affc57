//! Capture-date inference from filenames.
//!
//! Phones and export tools often bake the capture date into the filename even
//! when the EXIF block gets lost. [`infer`] recognises the following
//! conventions (prefixes and the `jpg`/`jpeg` extension are case-insensitive):
//!
//! | Pattern | Example | Time of day |
//! |---------|---------|-------------|
//! | `IMG-YYYYMMDD-*.jpg` | `IMG-20230615-WA0001.jpg` | noon |
//! | `YYYYMMDD_*.jpg` | `20230615_093012.jpg` | noon |
//! | `YYYY-MM-DD*.jpg` | `2014-07-23-0290.jpg` | noon |
//! | `WP_YYYYMMDD*.jpg` | `WP_20131012_001.jpg` | noon |
//! | `YYYY-MM-DD HH-MM-SS.jpg` | `2019-05-09 15-47-33.jpg` | exact |

use chrono::{NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::Error;

static IMG_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^IMG-([0-9]{4})([0-9]{2})([0-9]{2})-.*\.jpe?g$").unwrap()
});
static COMPACT_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9]{4})([0-9]{2})([0-9]{2})_.*\.jpe?g$").unwrap()
});
static DASHED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9]{4})-([0-9]{2})-([0-9]{2}).*\.jpe?g$").unwrap()
});
static WINDOWS_PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^WP_([0-9]{4})([0-9]{2})([0-9]{2}).*\.jpe?g$").unwrap()
});
static DASHED_DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9]{4})-([0-9]{2})-([0-9]{2})\s([0-9]{2})-([0-9]{2})-([0-9]{2})\.jpe?g$")
        .unwrap()
});

/// A filename convention that carries a capture date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    /// `IMG-YYYYMMDD-*` (WhatsApp and similar messengers).
    ImgPrefix,
    /// `YYYYMMDD_*` (Samsung and most Android cameras).
    CompactUnderscore,
    /// `YYYY-MM-DD*` (scanners, Dropbox-style exports).
    DashedDate,
    /// `WP_YYYYMMDD*` (Windows Phone).
    WindowsPhone,
    /// `YYYY-MM-DD HH-MM-SS` (camera uploads with a full timestamp).
    DashedDateTime,
}

impl NamePattern {
    /// Order in which patterns are tried.
    ///
    /// `DashedDateTime` runs before `DashedDate`, whose expression also accepts
    /// every timestamped name and would otherwise drop the time of day.
    pub const EVALUATION_ORDER: [NamePattern; 5] = [
        NamePattern::ImgPrefix,
        NamePattern::CompactUnderscore,
        NamePattern::DashedDateTime,
        NamePattern::DashedDate,
        NamePattern::WindowsPhone,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ImgPrefix => "img-prefix",
            Self::CompactUnderscore => "compact-underscore",
            Self::DashedDate => "dashed-date",
            Self::WindowsPhone => "windows-phone",
            Self::DashedDateTime => "dashed-date-time",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            Self::ImgPrefix => &IMG_PREFIX,
            Self::CompactUnderscore => &COMPACT_UNDERSCORE,
            Self::DashedDate => &DASHED_DATE,
            Self::WindowsPhone => &WINDOWS_PHONE,
            Self::DashedDateTime => &DASHED_DATE_TIME,
        }
    }

    /// Whether the name encodes hour/minute/second (otherwise noon is used).
    pub fn has_time(self) -> bool {
        matches!(self, Self::DashedDateTime)
    }

    /// Match the whole filename and pull out the date (and time) digits.
    ///
    /// The digits are taken as written; `IMG-20231345-0001.jpg` yields month 13.
    pub fn extract(self, filename: &str) -> Option<InferredDate> {
        let caps = self.regex().captures(filename)?;
        let (hour, minute, second) = if self.has_time() {
            (group(&caps, 4)?, group(&caps, 5)?, group(&caps, 6)?)
        } else {
            (12, 0, 0)
        };

        Some(InferredDate {
            year: group(&caps, 1)?,
            month: group(&caps, 2)?,
            day: group(&caps, 3)?,
            hour,
            minute,
            second,
            pattern: self,
        })
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn group<T: FromStr>(caps: &Captures<'_>, index: usize) -> Option<T> {
    caps.get(index)?.as_str().parse().ok()
}

/// A capture timestamp recovered from a filename. Carries no timezone.
///
/// Fields hold the digits found in the name, unchecked against the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferredDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub pattern: NamePattern,
}

impl InferredDate {
    /// Render as `YYYY:MM:DD HH:MM:SS`, the form stored in EXIF date tags.
    pub fn to_exif_string(&self) -> String {
        self.to_string()
    }

    /// The timestamp as a calendar value, `None` when the digits do not name a
    /// real date and time (month 13, February 30, hour 25, ...).
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year.into(), self.month.into(), self.day.into())?.and_hms_opt(
            self.hour.into(),
            self.minute.into(),
            self.second.into(),
        )
    }
}

impl fmt::Display for InferredDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}:{:02}:{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Infer a capture date from a filename.
///
/// Any directory component is ignored. The first pattern in
/// [`NamePattern::EVALUATION_ORDER`] that matches wins.
pub fn infer(filename: &str) -> Option<InferredDate> {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    NamePattern::EVALUATION_ORDER
        .iter()
        .find_map(|pattern| pattern.extract(basename))
}

/// Like [`infer`], but reports an unrecognized name as [`Error::PatternUnrecognized`].
pub fn require(filename: &str) -> Result<InferredDate, Error> {
    infer(filename).ok_or_else(|| Error::PatternUnrecognized(filename.to_string()))
}
