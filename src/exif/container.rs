//! TIFF/IFD codec for the EXIF container.
//!
//! The container is decoded into an explicit structure (namespace -> tag ->
//! value) and encoded back with a fresh, compact layout. Sub-IFD pointers and the
//! thumbnail offset are modelled structurally rather than as plain entries, so a
//! re-encode always produces consistent offsets.

// IFD pointer tags
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_GPS_IFD_POINTER: u16 = 0x8825;
const TAG_INTEROP_IFD_POINTER: u16 = 0xA005;

// IFD1 thumbnail location
const TAG_JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;
const TAG_JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;

// TIFF value formats used directly by the codec
pub const FORMAT_ASCII: u16 = 2;
pub const FORMAT_SHORT: u16 = 3;
pub const FORMAT_LONG: u16 = 4;
const FORMAT_IFD: u16 = 13;

const TIFF_MAGIC: u16 = 42;
const TIFF_HEADER_LEN: usize = 8;
const IFD_ENTRY_LEN: usize = 12;

/// Failure to decode or encode the metadata container.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("not a JPEG stream: {0}")]
    NotJpeg(String),
    #[error("invalid TIFF header")]
    BadHeader,
    #[error("{what} at offset {offset} runs past the end of the container")]
    OutOfBounds { what: &'static str, offset: usize },
    #[error("tag {tag:#06x} uses unknown value format {format}")]
    UnknownFormat { tag: u16, format: u16 },
    #[error("tag {tag:#06x} is not a valid offset pointer")]
    BadPointer { tag: u16 },
    #[error("IFD at offset {0} is referenced more than once")]
    IfdCycle(usize),
    #[error("encoded container is too large ({0} bytes)")]
    TooLarge(usize),
}

/// Byte order declared in the TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// `II`
    Little,
    /// `MM`
    Big,
}

impl ByteOrder {
    fn marker(self) -> &'static [u8; 2] {
        match self {
            Self::Little => b"II",
            Self::Big => b"MM",
        }
    }

    fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        }
    }

    fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        }
    }

    pub fn u16_bytes(self, value: u16) -> [u8; 2] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    pub fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }
}

/// Named groups of tags inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// IFD0: main image description (Make, Model, Orientation, ...).
    Primary,
    /// Exif sub-IFD: capture information, including the date tags.
    Exif,
    Gps,
    Interop,
    /// IFD1: thumbnail description.
    Thumbnail,
}

/// Size in bytes of one value of the given TIFF format.
fn unit_size(format: u16) -> Option<usize> {
    match format {
        1 | 2 | 6 | 7 => Some(1),
        3 | 8 => Some(2),
        4 | 9 | 11 | 13 => Some(4),
        5 | 10 | 12 => Some(8),
        _ => None,
    }
}

/// One tag with its raw value bytes, kept in the container's byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub tag: u16,
    pub format: u16,
    pub count: u32,
    pub data: Vec<u8>,
}

impl Entry {
    /// A NUL-terminated ASCII entry.
    pub fn ascii(tag: u16, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        Self {
            tag,
            format: FORMAT_ASCII,
            count: data.len() as u32,
            data,
        }
    }

    fn pointer_placeholder(tag: u16) -> Self {
        Self {
            tag,
            format: FORMAT_LONG,
            count: 1,
            data: vec![0; 4],
        }
    }

    /// The value as text, without NUL padding. `None` for non-ASCII formats.
    pub fn text(&self) -> Option<String> {
        if self.format != FORMAT_ASCII {
            return None;
        }
        let end = self
            .data
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |i| i + 1);
        Some(String::from_utf8_lossy(&self.data[..end]).into_owned())
    }

    /// A single SHORT/LONG/IFD value as `u32`.
    fn single_u32(&self, order: ByteOrder) -> Option<u32> {
        if self.count != 1 {
            return None;
        }
        match self.format {
            FORMAT_SHORT => Some(order.read_u16([self.data[0], self.data[1]]) as u32),
            FORMAT_LONG | FORMAT_IFD => Some(order.read_u32([
                self.data[0],
                self.data[1],
                self.data[2],
                self.data[3],
            ])),
            _ => None,
        }
    }
}

/// An image file directory: an ordered list of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ifd {
    entries: Vec<Entry>,
}

impl Ifd {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, tag: u16) -> Option<&Entry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    /// Replace the entry with the same tag, or insert it keeping tags ascending.
    pub fn set(&mut self, entry: Entry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.tag == entry.tag) {
            *existing = entry;
            return;
        }
        let pos = self
            .entries
            .iter()
            .position(|e| e.tag > entry.tag)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
    }

    fn take(&mut self, tag: u16) -> Option<Entry> {
        let pos = self.entries.iter().position(|e| e.tag == tag)?;
        Some(self.entries.remove(pos))
    }
}

/// A decoded EXIF container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifContainer {
    byte_order: ByteOrder,
    primary: Ifd,
    exif: Option<Ifd>,
    gps: Option<Ifd>,
    interop: Option<Ifd>,
    thumbnail: Option<Ifd>,
    thumbnail_data: Option<Vec<u8>>,
}

impl ExifContainer {
    /// An empty container: an IFD0 with no entries.
    pub fn new(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            primary: Ifd::default(),
            exif: None,
            gps: None,
            interop: None,
            thumbnail: None,
            thumbnail_data: None,
        }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn namespace(&self, ns: Namespace) -> Option<&Ifd> {
        match ns {
            Namespace::Primary => Some(&self.primary),
            Namespace::Exif => self.exif.as_ref(),
            Namespace::Gps => self.gps.as_ref(),
            Namespace::Interop => self.interop.as_ref(),
            Namespace::Thumbnail => self.thumbnail.as_ref(),
        }
    }

    /// The namespace, created empty if the container does not have it yet.
    ///
    /// Interop hangs off the Exif IFD, so creating it creates Exif as well.
    pub fn namespace_mut(&mut self, ns: Namespace) -> &mut Ifd {
        match ns {
            Namespace::Primary => &mut self.primary,
            Namespace::Exif => self.exif.get_or_insert_with(Ifd::default),
            Namespace::Gps => self.gps.get_or_insert_with(Ifd::default),
            Namespace::Interop => {
                self.exif.get_or_insert_with(Ifd::default);
                self.interop.get_or_insert_with(Ifd::default)
            }
            Namespace::Thumbnail => self.thumbnail.get_or_insert_with(Ifd::default),
        }
    }

    pub fn get(&self, ns: Namespace, tag: u16) -> Option<&Entry> {
        self.namespace(ns)?.get(tag)
    }

    pub fn thumbnail_data(&self) -> Option<&[u8]> {
        self.thumbnail_data.as_deref()
    }

    /// Parse a TIFF structure (the APP1 payload after `Exif\0\0`).
    pub fn decode(data: &[u8]) -> Result<Self, ContainerError> {
        if data.len() < TIFF_HEADER_LEN {
            return Err(ContainerError::BadHeader);
        }
        let byte_order = match &data[0..2] {
            b"II" => ByteOrder::Little,
            b"MM" => ByteOrder::Big,
            _ => return Err(ContainerError::BadHeader),
        };
        let reader = TiffReader { data, byte_order };
        if reader.u16_at(2, "header")? != TIFF_MAGIC {
            return Err(ContainerError::BadHeader);
        }

        let mut visited = Vec::new();
        let ifd0_offset = reader.u32_at(4, "header")? as usize;
        let (mut primary, next) = reader.read_ifd(ifd0_offset, &mut visited)?;

        let mut exif = None;
        let mut interop = None;
        if let Some(offset) = reader.take_pointer(&mut primary, TAG_EXIF_IFD_POINTER)? {
            let (mut ifd, _) = reader.read_ifd(offset, &mut visited)?;
            if let Some(offset) = reader.take_pointer(&mut ifd, TAG_INTEROP_IFD_POINTER)? {
                interop = Some(reader.read_ifd(offset, &mut visited)?.0);
            }
            exif = Some(ifd);
        }

        let gps = match reader.take_pointer(&mut primary, TAG_GPS_IFD_POINTER)? {
            Some(offset) => Some(reader.read_ifd(offset, &mut visited)?.0),
            None => None,
        };

        let mut thumbnail = None;
        let mut thumbnail_data = None;
        if next != 0 {
            let (mut ifd, _) = reader.read_ifd(next as usize, &mut visited)?;
            if let Some(offset) = reader.take_pointer(&mut ifd, TAG_JPEG_INTERCHANGE_FORMAT)? {
                let len = ifd
                    .get(TAG_JPEG_INTERCHANGE_FORMAT_LENGTH)
                    .and_then(|e| e.single_u32(byte_order))
                    .ok_or(ContainerError::BadPointer {
                        tag: TAG_JPEG_INTERCHANGE_FORMAT_LENGTH,
                    })?;
                thumbnail_data = Some(reader.slice(offset, len as usize, "thumbnail")?.to_vec());
            }
            thumbnail = Some(ifd);
        }

        log::debug!(
            "decoded EXIF container: {} primary tags, exif={}, gps={}, thumbnail={}",
            primary.entries.len(),
            exif.is_some(),
            gps.is_some(),
            thumbnail_data.is_some()
        );

        Ok(Self {
            byte_order,
            primary,
            exif,
            gps,
            interop,
            thumbnail,
            thumbnail_data,
        })
    }

    /// Serialize to a TIFF structure in the container's byte order.
    ///
    /// Layout: header, IFD0, Exif, Interop, GPS, IFD1, thumbnail bytes. Each IFD
    /// is followed by its out-of-line values, padded to even offsets.
    pub fn encode(&self) -> Result<Vec<u8>, ContainerError> {
        let order = self.byte_order;
        let mut out = Vec::with_capacity(512);
        out.extend_from_slice(order.marker());
        out.extend_from_slice(&order.u16_bytes(TIFF_MAGIC));
        out.extend_from_slice(&order.u32_bytes(TIFF_HEADER_LEN as u32));

        let mut primary = self.primary.entries.clone();
        if self.exif.is_some() {
            primary.push(Entry::pointer_placeholder(TAG_EXIF_IFD_POINTER));
        }
        if self.gps.is_some() {
            primary.push(Entry::pointer_placeholder(TAG_GPS_IFD_POINTER));
        }
        let primary_slots = write_ifd(&mut out, order, primary)?;

        if let Some(exif) = &self.exif {
            let offset = offset_u32(out.len())?;
            primary_slots.patch(&mut out, order, TAG_EXIF_IFD_POINTER, offset);

            let mut entries = exif.entries.clone();
            if self.interop.is_some() {
                entries.push(Entry::pointer_placeholder(TAG_INTEROP_IFD_POINTER));
            }
            let exif_slots = write_ifd(&mut out, order, entries)?;

            if let Some(interop) = &self.interop {
                let offset = offset_u32(out.len())?;
                exif_slots.patch(&mut out, order, TAG_INTEROP_IFD_POINTER, offset);
                write_ifd(&mut out, order, interop.entries.clone())?;
            }
        }

        if let Some(gps) = &self.gps {
            let offset = offset_u32(out.len())?;
            primary_slots.patch(&mut out, order, TAG_GPS_IFD_POINTER, offset);
            write_ifd(&mut out, order, gps.entries.clone())?;
        }

        if let Some(thumbnail) = &self.thumbnail {
            let offset = offset_u32(out.len())?;
            patch_u32(&mut out, order, primary_slots.next, offset);

            let mut entries = thumbnail.entries.clone();
            if self.thumbnail_data.is_some() {
                entries.push(Entry::pointer_placeholder(TAG_JPEG_INTERCHANGE_FORMAT));
            }
            let thumb_slots = write_ifd(&mut out, order, entries)?;

            if let Some(data) = &self.thumbnail_data {
                let offset = offset_u32(out.len())?;
                thumb_slots.patch(&mut out, order, TAG_JPEG_INTERCHANGE_FORMAT, offset);
                out.extend_from_slice(data);
            }
        }

        offset_u32(out.len())?;
        Ok(out)
    }
}

fn offset_u32(len: usize) -> Result<u32, ContainerError> {
    u32::try_from(len).map_err(|_| ContainerError::TooLarge(len))
}

fn patch_u32(out: &mut [u8], order: ByteOrder, pos: usize, value: u32) {
    out[pos..pos + 4].copy_from_slice(&order.u32_bytes(value));
}

/// Positions of patchable value fields inside an IFD that was just written.
struct IfdSlots {
    values: Vec<(u16, usize)>,
    next: usize,
}

impl IfdSlots {
    fn patch(&self, out: &mut [u8], order: ByteOrder, tag: u16, value: u32) {
        if let Some(&(_, pos)) = self.values.iter().find(|(t, _)| *t == tag) {
            patch_u32(out, order, pos, value);
        }
    }
}

fn write_ifd(
    out: &mut Vec<u8>,
    order: ByteOrder,
    mut entries: Vec<Entry>,
) -> Result<IfdSlots, ContainerError> {
    entries.sort_by_key(|e| e.tag);
    let count = u16::try_from(entries.len()).map_err(|_| ContainerError::TooLarge(entries.len()))?;

    let table_len = 2 + entries.len() * IFD_ENTRY_LEN + 4;
    let values_start = out.len() + table_len;
    let mut values: Vec<u8> = Vec::new();
    let mut slots = Vec::with_capacity(entries.len());

    out.extend_from_slice(&order.u16_bytes(count));
    for entry in &entries {
        out.extend_from_slice(&order.u16_bytes(entry.tag));
        out.extend_from_slice(&order.u16_bytes(entry.format));
        out.extend_from_slice(&order.u32_bytes(entry.count));
        slots.push((entry.tag, out.len()));

        if entry.data.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..entry.data.len()].copy_from_slice(&entry.data);
            out.extend_from_slice(&inline);
        } else {
            let offset = offset_u32(values_start + values.len())?;
            out.extend_from_slice(&order.u32_bytes(offset));
            values.extend_from_slice(&entry.data);
            if values.len() % 2 == 1 {
                values.push(0);
            }
        }
    }

    let next = out.len();
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&values);

    Ok(IfdSlots {
        values: slots,
        next,
    })
}

/// Bounds-checked view over the raw TIFF bytes.
struct TiffReader<'a> {
    data: &'a [u8],
    byte_order: ByteOrder,
}

impl TiffReader<'_> {
    fn slice(&self, offset: usize, len: usize, what: &'static str) -> Result<&[u8], ContainerError> {
        offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .map(|end| &self.data[offset..end])
            .ok_or(ContainerError::OutOfBounds { what, offset })
    }

    fn u16_at(&self, offset: usize, what: &'static str) -> Result<u16, ContainerError> {
        let b = self.slice(offset, 2, what)?;
        Ok(self.byte_order.read_u16([b[0], b[1]]))
    }

    fn u32_at(&self, offset: usize, what: &'static str) -> Result<u32, ContainerError> {
        let b = self.slice(offset, 4, what)?;
        Ok(self.byte_order.read_u32([b[0], b[1], b[2], b[3]]))
    }

    /// Read one IFD, returning it with its next-IFD offset (0 when absent).
    fn read_ifd(&self, offset: usize, visited: &mut Vec<usize>) -> Result<(Ifd, u32), ContainerError> {
        if visited.contains(&offset) {
            return Err(ContainerError::IfdCycle(offset));
        }
        visited.push(offset);

        let count = self.u16_at(offset, "IFD entry count")? as usize;
        let table = offset + 2;
        self.slice(table, count * IFD_ENTRY_LEN, "IFD entry table")?;

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = table + i * IFD_ENTRY_LEN;
            let tag = self.u16_at(at, "IFD entry")?;
            let format = self.u16_at(at + 2, "IFD entry")?;
            let value_count = self.u32_at(at + 4, "IFD entry")?;

            let size = unit_size(format)
                .and_then(|unit| unit.checked_mul(value_count as usize))
                .ok_or(ContainerError::UnknownFormat { tag, format })?;
            let data = if size <= 4 {
                self.slice(at + 8, size, "inline value")?
            } else {
                let value_offset = self.u32_at(at + 8, "value offset")? as usize;
                self.slice(value_offset, size, "tag value")?
            };

            entries.push(Entry {
                tag,
                format,
                count: value_count,
                data: data.to_vec(),
            });
        }

        // Some writers drop the trailing next-IFD offset on the last directory.
        let next = self
            .u32_at(table + count * IFD_ENTRY_LEN, "next IFD offset")
            .unwrap_or(0);

        Ok((Ifd { entries }, next))
    }

    /// Remove a pointer entry from the IFD and return the offset it holds.
    fn take_pointer(&self, ifd: &mut Ifd, tag: u16) -> Result<Option<usize>, ContainerError> {
        let Some(entry) = ifd.take(tag) else {
            return Ok(None);
        };
        match entry.format {
            FORMAT_LONG | FORMAT_IFD => entry
                .single_u32(self.byte_order)
                .map(|v| Some(v as usize))
                .ok_or(ContainerError::BadPointer { tag }),
            _ => Err(ContainerError::BadPointer { tag }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG_MAKE: u16 = 0x010F;
    const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;

    /// Little-endian TIFF: IFD0 { Make = "Foo", ExifIFD -> 38 },
    /// Exif { DateTimeOriginal = "2020:01:02 03:04:05" }.
    fn little_endian_tiff() -> Vec<u8> {
        let mut t = Vec::new();
        t.extend_from_slice(b"II");
        t.extend_from_slice(&42u16.to_le_bytes());
        t.extend_from_slice(&8u32.to_le_bytes());
        // IFD0 at 8
        t.extend_from_slice(&2u16.to_le_bytes());
        t.extend_from_slice(&TAG_MAKE.to_le_bytes());
        t.extend_from_slice(&2u16.to_le_bytes());
        t.extend_from_slice(&4u32.to_le_bytes());
        t.extend_from_slice(b"Foo\0");
        t.extend_from_slice(&0x8769u16.to_le_bytes());
        t.extend_from_slice(&4u16.to_le_bytes());
        t.extend_from_slice(&1u32.to_le_bytes());
        t.extend_from_slice(&38u32.to_le_bytes());
        t.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(t.len(), 38);
        // Exif IFD at 38, value at 56
        t.extend_from_slice(&1u16.to_le_bytes());
        t.extend_from_slice(&TAG_DATE_TIME_ORIGINAL.to_le_bytes());
        t.extend_from_slice(&2u16.to_le_bytes());
        t.extend_from_slice(&20u32.to_le_bytes());
        t.extend_from_slice(&56u32.to_le_bytes());
        t.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(t.len(), 56);
        t.extend_from_slice(b"2020:01:02 03:04:05\0");
        t
    }

    /// Big-endian TIFF with a GPS IFD and an IFD1 thumbnail.
    fn big_endian_tiff_with_thumbnail() -> Vec<u8> {
        let mut t = Vec::new();
        t.extend_from_slice(b"MM");
        t.extend_from_slice(&42u16.to_be_bytes());
        t.extend_from_slice(&8u32.to_be_bytes());
        // IFD0 at 8: GPS pointer -> 26, next -> 44
        t.extend_from_slice(&1u16.to_be_bytes());
        t.extend_from_slice(&0x8825u16.to_be_bytes());
        t.extend_from_slice(&4u16.to_be_bytes());
        t.extend_from_slice(&1u32.to_be_bytes());
        t.extend_from_slice(&26u32.to_be_bytes());
        t.extend_from_slice(&44u32.to_be_bytes());
        assert_eq!(t.len(), 26);
        // GPS IFD at 26: GPSVersionID = 2.2.0.0 (BYTE x4, inline)
        t.extend_from_slice(&1u16.to_be_bytes());
        t.extend_from_slice(&0x0000u16.to_be_bytes());
        t.extend_from_slice(&1u16.to_be_bytes());
        t.extend_from_slice(&4u32.to_be_bytes());
        t.extend_from_slice(&[2, 2, 0, 0]);
        t.extend_from_slice(&0u32.to_be_bytes());
        assert_eq!(t.len(), 44);
        // IFD1 at 44: JPEGInterchangeFormat -> 74, length = 4
        t.extend_from_slice(&2u16.to_be_bytes());
        t.extend_from_slice(&0x0201u16.to_be_bytes());
        t.extend_from_slice(&4u16.to_be_bytes());
        t.extend_from_slice(&1u32.to_be_bytes());
        t.extend_from_slice(&74u32.to_be_bytes());
        t.extend_from_slice(&0x0202u16.to_be_bytes());
        t.extend_from_slice(&4u16.to_be_bytes());
        t.extend_from_slice(&1u32.to_be_bytes());
        t.extend_from_slice(&4u32.to_be_bytes());
        t.extend_from_slice(&0u32.to_be_bytes());
        assert_eq!(t.len(), 74);
        t.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xD9]);
        t
    }

    #[test]
    fn decodes_little_endian_namespaces() {
        let container = ExifContainer::decode(&little_endian_tiff()).unwrap();
        assert_eq!(container.byte_order(), ByteOrder::Little);
        assert_eq!(
            container.get(Namespace::Primary, TAG_MAKE).and_then(Entry::text).as_deref(),
            Some("Foo")
        );
        assert_eq!(
            container
                .get(Namespace::Exif, TAG_DATE_TIME_ORIGINAL)
                .and_then(Entry::text)
                .as_deref(),
            Some("2020:01:02 03:04:05")
        );
        // The pointer lives in the structure, not among the entries.
        assert!(container.get(Namespace::Primary, 0x8769).is_none());
        assert!(container.namespace(Namespace::Gps).is_none());
    }

    #[test]
    fn decodes_big_endian_gps_and_thumbnail() {
        let container = ExifContainer::decode(&big_endian_tiff_with_thumbnail()).unwrap();
        assert_eq!(container.byte_order(), ByteOrder::Big);
        assert_eq!(
            container.get(Namespace::Gps, 0x0000).map(|e| e.data.clone()),
            Some(vec![2, 2, 0, 0])
        );
        assert_eq!(container.thumbnail_data(), Some(&[0xFF, 0xD8, 0xFF, 0xD9][..]));
        assert!(container.namespace(Namespace::Exif).is_none());
    }

    #[test]
    fn encode_preserves_structure() {
        for tiff in [little_endian_tiff(), big_endian_tiff_with_thumbnail()] {
            let container = ExifContainer::decode(&tiff).unwrap();
            let encoded = container.encode().unwrap();
            assert_eq!(ExifContainer::decode(&encoded).unwrap(), container);
            // A second pass is a fixed point.
            assert_eq!(ExifContainer::decode(&encoded).unwrap().encode().unwrap(), encoded);
        }
    }

    #[test]
    fn set_inserts_in_tag_order_and_replaces() {
        let mut container = ExifContainer::decode(&little_endian_tiff()).unwrap();
        let exif = container.namespace_mut(Namespace::Exif);
        exif.set(Entry::ascii(0x9004, "2021:01:01 12:00:00"));
        exif.set(Entry::ascii(0x829A, "x"));
        exif.set(Entry::ascii(TAG_DATE_TIME_ORIGINAL, "2021:01:01 12:00:00"));

        let tags: Vec<u16> = exif.entries().iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![0x829A, 0x9003, 0x9004]);
        assert_eq!(
            exif.get(TAG_DATE_TIME_ORIGINAL).and_then(Entry::text).as_deref(),
            Some("2021:01:01 12:00:00")
        );
    }

    #[test]
    fn new_container_gains_exif_pointer_on_encode() {
        let mut container = ExifContainer::new(ByteOrder::Little);
        container
            .namespace_mut(Namespace::Exif)
            .set(Entry::ascii(TAG_DATE_TIME_ORIGINAL, "2023:06:15 12:00:00"));

        let decoded = ExifContainer::decode(&container.encode().unwrap()).unwrap();
        assert_eq!(
            decoded
                .get(Namespace::Exif, TAG_DATE_TIME_ORIGINAL)
                .and_then(Entry::text)
                .as_deref(),
            Some("2023:06:15 12:00:00")
        );
        assert!(decoded.namespace(Namespace::Primary).unwrap().entries().is_empty());
    }

    #[test]
    fn text_strips_nul_padding() {
        let entry = Entry {
            tag: TAG_DATE_TIME_ORIGINAL,
            format: FORMAT_ASCII,
            count: 4,
            data: vec![0, 0, 0, 0],
        };
        assert_eq!(entry.text().as_deref(), Some(""));
        let short = Entry { format: FORMAT_SHORT, count: 1, data: vec![1, 0], ..entry };
        assert!(short.text().is_none());
    }

    #[test]
    fn rejects_bad_header() {
        assert!(matches!(ExifContainer::decode(b"II*"), Err(ContainerError::BadHeader)));
        assert!(matches!(
            ExifContainer::decode(b"XX\x2a\x00\x08\x00\x00\x00"),
            Err(ContainerError::BadHeader)
        ));
        assert!(matches!(
            ExifContainer::decode(b"II\x2b\x00\x08\x00\x00\x00"),
            Err(ContainerError::BadHeader)
        ));
    }

    #[test]
    fn rejects_truncated_data() {
        let tiff = little_endian_tiff();
        for cut in [10, 30, 50, 60] {
            let err = ExifContainer::decode(&tiff[..cut]).unwrap_err();
            assert!(
                matches!(err, ContainerError::OutOfBounds { .. }),
                "cut at {cut}: {err:?}"
            );
        }
    }

    #[test]
    fn rejects_unknown_format() {
        let mut tiff = little_endian_tiff();
        // Format field of the Make entry.
        tiff[12..14].copy_from_slice(&99u16.to_le_bytes());
        assert!(matches!(
            ExifContainer::decode(&tiff),
            Err(ContainerError::UnknownFormat { tag: TAG_MAKE, format: 99 })
        ));
    }

    #[test]
    fn rejects_self_referencing_exif_pointer() {
        let mut tiff = little_endian_tiff();
        // Point the Exif IFD back at IFD0.
        tiff[30..34].copy_from_slice(&8u32.to_le_bytes());
        assert!(matches!(ExifContainer::decode(&tiff), Err(ContainerError::IfdCycle(8))));
    }

    #[test]
    fn rejects_ascii_pointer() {
        let mut tiff = little_endian_tiff();
        tiff[24..26].copy_from_slice(&2u16.to_le_bytes());
        assert!(matches!(
            ExifContainer::decode(&tiff),
            Err(ContainerError::BadPointer { tag: 0x8769 })
        ));
    }
}
