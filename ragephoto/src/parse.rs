//! Parses a photo container from bytes.
//!
//! The container is read front to back, one field at a time. Each field has
//! its own status, so the first thing that's wrong decides the error.

use ragephoto_types::{ErrorKind, PhotoFormat, format::HEADER_TEXT_SIZE};
use winnow::{Parser as _, binary::le_u32, error::EmptyError, token::take};

use crate::{
    buffers::{Capacities, ObservedLayout, Section, SectionOffsets},
    magic_number,
    record::{PhotoHeader, PhotoRecord},
    text,
};

/// The marker that closes every container.
const JEND_MARKER: &[u8; 4] = b"JEND";

/// Parses a whole container.
///
/// Returns the fresh record alongside the layout the file used.
pub(crate) fn parse(mut input: &[u8]) -> Result<(PhotoRecord, ObservedLayout), ErrorKind> {
    let input: &mut &[u8] = &mut input;
    log::trace!("Parsing photo container of `{}` bytes.", input.len());

    let format: PhotoFormat = magic_number::parse(input)?;
    log::debug!("Found {format} photo.");

    let (header, end_of_file) = header(input, format)?;
    let (json_offset, title_offset, description_offset) = offset_table(input)?;

    let (photo, photo_cap) = photo(input)?;
    let (json, json_cap) = slot(input, Section::Json)?;
    let (title, title_cap) = slot(input, Section::Title)?;
    let (description, description_cap) = slot(input, Section::Description)?;
    marker(
        input,
        JEND_MARKER,
        ErrorKind::IncompleteJendMarker,
        ErrorKind::IncorrectJendMarker,
    )?;

    if !input.is_empty() {
        log::debug!("Ignoring `{}` trailing bytes after `JEND`.", input.len());
    }

    let layout = ObservedLayout {
        capacities: Capacities {
            photo: photo_cap,
            json: json_cap,
            title: title_cap,
            description: description_cap,
        },
        offsets: SectionOffsets {
            json: json_offset,
            title: title_offset,
            description: description_offset,
            end_of_file,
        },
    };

    // the offsets aren't needed to read the file, so a mismatch is only odd
    if !layout.is_consistent() {
        log::warn!(
            "Stored offsets `{:?}` don't match the section capacities, which imply `{:?}`.",
            layout.offsets,
            layout.capacities.offsets(),
        );
    }

    let record = PhotoRecord {
        format: Some(format),
        header: Some(header),
        signature: crate::sign::signature(&photo, format),
        photo,
        json,
        title,
        description,
        last_error: ErrorKind::NoError,
    };

    log::trace!("Completed photo container parsing.");
    Ok((record, layout))
}

/// Reads one little-endian word, or fails with `missing`.
fn word(input: &mut &[u8], missing: ErrorKind) -> Result<u32, ErrorKind> {
    le_u32.parse_next(input).map_err(|_: EmptyError| {
        log::error!("Ran out of bytes! err: {missing}");
        missing
    })
}

/// Takes exactly `len` bytes, or fails with `missing`.
fn bytes<'i>(input: &mut &'i [u8], len: usize, missing: ErrorKind) -> Result<&'i [u8], ErrorKind> {
    take(len).parse_next(input).map_err(|_: EmptyError| {
        log::error!(
            "Wanted `{len}` bytes, but only `{}` remain! err: {missing}",
            input.len()
        );
        missing
    })
}

/// Checks a four-byte section marker.
fn marker(
    input: &mut &[u8],
    expected: &[u8; 4],
    incomplete: ErrorKind,
    incorrect: ErrorKind,
) -> Result<(), ErrorKind> {
    let found: &[u8] = bytes(input, 4, incomplete)?;

    if found != expected {
        log::error!(
            "Expected marker `{}`, but found `{}`.",
            expected.escape_ascii(),
            found.escape_ascii(),
        );
        return Err(incorrect);
    }

    Ok(())
}

/// Parses the rest of the header block, plus the end-of-file offset.
fn header(input: &mut &[u8], format: PhotoFormat) -> Result<(PhotoHeader, u32), ErrorKind> {
    log::trace!("Parsing: header.");

    let block: &[u8] = bytes(input, HEADER_TEXT_SIZE, ErrorKind::IncompleteHeader)?;
    let text: String = text::decode_header(block)?;

    let checksum: u32 = word(input, ErrorKind::IncompleteChecksum)?;

    let checksum2: u32 = if format.has_second_checksum() {
        let reserved: u32 = word(input, ErrorKind::IncompleteChecksum)?;
        if reserved != 0 {
            log::error!("Reserved header word should be zero, but was `0x{reserved:08x}`.");
            return Err(ErrorKind::IncompatibleFormat);
        }

        word(input, ErrorKind::IncompleteChecksum)?
    } else {
        0
    };

    let end_of_file: u32 = word(input, ErrorKind::IncompleteEOF)?;

    Ok((
        PhotoHeader {
            text,
            checksum,
            checksum2,
        },
        end_of_file,
    ))
}

/// Parses the JSON, title, and description offsets.
fn offset_table(input: &mut &[u8]) -> Result<(u32, u32, u32), ErrorKind> {
    log::trace!("Parsing: offset table.");

    let json: u32 = word(input, ErrorKind::IncompleteJsonOffset)?;
    let title: u32 = word(input, ErrorKind::IncompleteTitleOffset)?;
    let description: u32 = word(input, ErrorKind::IncompleteDescOffset)?;

    Ok((json, title, description))
}

/// Parses the photo section: marker, capacity, size, payload, and padding.
fn photo(input: &mut &[u8]) -> Result<(Vec<u8>, u32), ErrorKind> {
    log::trace!("Parsing: photo section.");

    marker(
        input,
        Section::Photo.marker(),
        ErrorKind::IncompleteJpegMarker,
        ErrorKind::IncorrectJpegMarker,
    )?;
    let capacity: u32 = word(input, ErrorKind::IncompletePhotoBuffer)?;
    let size: u32 = word(input, ErrorKind::IncompletePhotoSize)?;

    if size > capacity {
        log::error!("Photo size `{size}` is bigger than its capacity, `{capacity}`.");
        return Err(ErrorKind::PhotoReadError);
    }

    // the declared size is only allocated once the input has that many bytes
    let jpeg: &[u8] = bytes(input, size as usize, ErrorKind::PhotoReadError)?;

    let mut photo: Vec<u8> = Vec::new();
    photo.try_reserve_exact(jpeg.len()).map_err(|e| {
        log::error!("Couldn't allocate `{size}` bytes for the photo! err: {e}");
        Section::Photo.malloc_error()
    })?;
    photo.extend_from_slice(jpeg);

    // skip the padding. if it's cut short, the next marker will say so
    let padding: usize = (capacity - size) as usize;
    let skipped: usize = padding.min(input.len());
    *input = &input[skipped..];

    Ok((photo, capacity))
}

/// Parses a text section: marker, capacity, and the NUL-terminated slot.
fn slot(input: &mut &[u8], section: Section) -> Result<(String, u32), ErrorKind> {
    log::trace!("Parsing: {section:?} section.");

    let (incomplete_marker, incorrect_marker, incomplete_buffer, read_error) = match section {
        Section::Json => (
            ErrorKind::IncompleteJsonMarker,
            ErrorKind::IncorrectJsonMarker,
            ErrorKind::IncompleteJsonBuffer,
            ErrorKind::JsonReadError,
        ),
        Section::Title => (
            ErrorKind::IncompleteTitleMarker,
            ErrorKind::IncorrectTitleMarker,
            ErrorKind::IncompleteTitleBuffer,
            ErrorKind::TitleReadError,
        ),
        Section::Description => (
            ErrorKind::IncompleteDescMarker,
            ErrorKind::IncorrectDescMarker,
            ErrorKind::IncompleteDescBuffer,
            ErrorKind::DescReadError,
        ),
        Section::Photo => {
            log::error!("The photo section isn't a text slot.");
            return Err(ErrorKind::PhotoReadError);
        }
    };

    marker(input, section.marker(), incomplete_marker, incorrect_marker)?;
    let capacity: u32 = word(input, incomplete_buffer)?;

    let raw: &[u8] = bytes(input, capacity as usize, read_error)?;
    let decoded: &str = text::decode_slot(raw).ok_or(read_error)?;

    let mut owned = String::new();
    owned.try_reserve_exact(decoded.len()).map_err(|e| {
        log::error!("Couldn't allocate `{}` bytes for {section:?}! err: {e}", decoded.len());
        section.malloc_error()
    })?;
    owned.push_str(decoded);

    Ok((owned, capacity))
}

#[cfg(test)]
mod tests {
    use ragephoto_types::{ErrorKind, PhotoFormat};

    use super::parse;
    use crate::util::logger;

    /// Builds a container by hand, without the serializer.
    fn container(format: PhotoFormat, jpeg: &[u8], json: &str) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        let word = |out: &mut Vec<u8>, w: u32| out.extend_from_slice(&w.to_le_bytes());

        let photo_cap: u32 = jpeg.len() as u32 + 6;
        let json_cap: u32 = json.len() as u32 + 1;

        word(&mut out, format.magic());
        out.extend(
            "hi".encode_utf16()
                .flat_map(u16::to_le_bytes)
                .chain(core::iter::repeat(0))
                .take(256),
        );
        word(&mut out, 0xAABB_CCDD);
        if format == PhotoFormat::Rdr2 {
            word(&mut out, 0);
            word(&mut out, 0x1122_3344);
        }

        let json_offset = photo_cap + 28;
        let title_offset = json_offset + json_cap + 8;
        let desc_offset = title_offset + 1 + 8;
        word(&mut out, desc_offset + 1 + 12);
        word(&mut out, json_offset);
        word(&mut out, title_offset);
        word(&mut out, desc_offset);

        out.extend_from_slice(b"JPEG");
        word(&mut out, photo_cap);
        word(&mut out, jpeg.len() as u32);
        out.extend_from_slice(jpeg);
        out.extend_from_slice(&[0; 6]);

        out.extend_from_slice(b"JSON");
        word(&mut out, json_cap);
        out.extend_from_slice(json.as_bytes());
        out.push(0);

        out.extend_from_slice(b"TITL");
        word(&mut out, 1);
        out.push(0);

        out.extend_from_slice(b"DESC");
        word(&mut out, 1);
        out.push(0);

        out.extend_from_slice(b"JEND");
        out
    }

    #[test]
    fn parses_handmade_gta5_container() {
        logger();

        let bytes = container(PhotoFormat::Gta5, b"\xFF\xD8 jpeg", "{}");
        let (record, layout) = parse(&bytes).unwrap();

        assert_eq!(record.format, Some(PhotoFormat::Gta5));
        let header = record.header.unwrap();
        assert_eq!(header.text, "hi");
        assert_eq!(header.checksum, 0xAABB_CCDD);
        assert_eq!(header.checksum2, 0);
        assert_eq!(record.photo, b"\xFF\xD8 jpeg");
        assert_eq!(record.json, "{}");
        assert_eq!(record.title, "");
        assert_eq!(record.description, "");
        assert_eq!(record.last_error, ErrorKind::NoError);

        assert!(layout.is_consistent());
        assert_eq!(layout.capacities.photo, 13);
        assert_eq!(layout.capacities.json, 3);
    }

    #[test]
    fn parses_rdr2_checksums() {
        logger();

        let bytes = container(PhotoFormat::Rdr2, b"jpeg", "{\"a\":1}");
        let (record, layout) = parse(&bytes).unwrap();

        assert_eq!(record.format, Some(PhotoFormat::Rdr2));
        assert_eq!(record.header.unwrap().checksum2, 0x1122_3344);
        assert!(layout.is_consistent());
    }

    #[test]
    fn rdr2_reserved_word_must_be_zero() {
        logger();

        let mut bytes = container(PhotoFormat::Rdr2, b"jpeg", "{}");
        bytes[264] = 0x01;
        assert_eq!(parse(&bytes), Err(ErrorKind::IncompatibleFormat));
    }

    #[test]
    fn truncation_reports_the_first_missing_field() {
        logger();

        let bytes = container(PhotoFormat::Gta5, b"jpeg", "{}");

        let cases: &[(usize, ErrorKind)] = &[
            (0, ErrorKind::NoFormatIdentifier),
            (100, ErrorKind::IncompleteHeader),
            (262, ErrorKind::IncompleteChecksum),
            (266, ErrorKind::IncompleteEOF),
            (270, ErrorKind::IncompleteJsonOffset),
            (274, ErrorKind::IncompleteTitleOffset),
            (278, ErrorKind::IncompleteDescOffset),
            (282, ErrorKind::IncompleteJpegMarker),
            (286, ErrorKind::IncompletePhotoBuffer),
            (290, ErrorKind::IncompletePhotoSize),
            (294, ErrorKind::PhotoReadError),
            // padding cut short, so the next marker is missing
            (300, ErrorKind::IncompleteJsonMarker),
            (302, ErrorKind::IncompleteJsonMarker),
            (304, ErrorKind::IncompleteJsonMarker),
            (308, ErrorKind::IncompleteJsonBuffer),
            (311, ErrorKind::JsonReadError),
            (313, ErrorKind::IncompleteTitleMarker),
            (315, ErrorKind::IncompleteTitleMarker),
            (319, ErrorKind::IncompleteTitleBuffer),
            (321, ErrorKind::TitleReadError),
            (322, ErrorKind::IncompleteDescMarker),
            (324, ErrorKind::IncompleteDescMarker),
            (328, ErrorKind::IncompleteDescBuffer),
            (330, ErrorKind::DescReadError),
            (331, ErrorKind::IncompleteJendMarker),
            (bytes.len() - 2, ErrorKind::IncompleteJendMarker),
        ];

        // `JSON` at 302, `TITL` at 313, `DESC` at 322, `JEND` at 331
        assert_eq!(bytes.len(), 335);

        for (len, expected) in cases {
            assert_eq!(parse(&bytes[..*len]).map(|_| ()), Err(*expected), "len `{len}`");
        }
    }

    #[test]
    fn wrong_markers_are_incorrect() {
        logger();

        let bytes = container(PhotoFormat::Gta5, b"jpeg", "{}");

        let mut jpeg = bytes.clone();
        jpeg[280] = b'X';
        assert_eq!(parse(&jpeg).map(|_| ()), Err(ErrorKind::IncorrectJpegMarker));

        let cases: &[(usize, ErrorKind)] = &[
            (302, ErrorKind::IncorrectJsonMarker),
            (313, ErrorKind::IncorrectTitleMarker),
            (322, ErrorKind::IncorrectDescMarker),
            (334, ErrorKind::IncorrectJendMarker),
        ];

        for (at, expected) in cases {
            let mut corrupt = bytes.clone();
            corrupt[*at] = b'X';
            assert_eq!(parse(&corrupt).map(|_| ()), Err(*expected), "at `{at}`");
        }
    }

    #[test]
    fn slots_without_a_terminator_are_unreadable() {
        logger();

        let bytes = container(PhotoFormat::Gta5, b"jpeg", "{}");

        // overwrite each slot's terminator, so the slot is full
        let cases: &[(usize, ErrorKind)] = &[
            (312, ErrorKind::JsonReadError),
            (321, ErrorKind::TitleReadError),
            (330, ErrorKind::DescReadError),
        ];

        for (at, expected) in cases {
            let mut full = bytes.clone();
            assert_eq!(full[*at], 0x00);
            full[*at] = b'a';
            assert_eq!(parse(&full).map(|_| ()), Err(*expected), "at `{at}`");
        }
    }

    #[test]
    fn empty_slots_are_unreadable() {
        logger();

        // a title slot with no room for its terminator
        let bytes = container(PhotoFormat::Gta5, b"jpeg", "{}");
        let mut empty: Vec<u8> = bytes[..317].to_vec();
        empty.extend_from_slice(&0_u32.to_le_bytes());
        empty.extend_from_slice(&bytes[322..]);

        assert_eq!(parse(&empty).map(|_| ()), Err(ErrorKind::TitleReadError));
    }

    #[test]
    fn huge_photo_size_is_checked_against_the_input() {
        logger();

        let mut bytes = container(PhotoFormat::Gta5, b"jpeg", "{}");
        bytes[284..288].copy_from_slice(&u32::MAX.to_le_bytes());
        bytes[288..292].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(parse(&bytes).map(|_| ()), Err(ErrorKind::PhotoReadError));
    }

    #[test]
    fn bad_header_text_is_reported() {
        logger();

        let mut bytes = container(PhotoFormat::Gta5, b"jpeg", "{}");
        // an unpaired high surrogate, then `i`
        bytes[4..6].copy_from_slice(&0xD800_u16.to_le_bytes());
        assert_eq!(parse(&bytes).map(|_| ()), Err(ErrorKind::UnicodeHeaderError));
    }

    #[test]
    fn photo_bigger_than_its_slot_is_unreadable() {
        logger();

        let mut bytes = container(PhotoFormat::Gta5, b"jpeg", "{}");
        // photo size word follows the `JPEG` marker and capacity
        bytes[288..292].copy_from_slice(&100_u32.to_le_bytes());
        assert_eq!(parse(&bytes).map(|_| ()), Err(ErrorKind::PhotoReadError));
    }

    #[test]
    fn invalid_utf8_json_is_unreadable() {
        logger();

        let mut bytes = container(PhotoFormat::Gta5, b"jpeg", "{}");
        // first JSON byte: header, offsets, photo section, `JSON` and capacity
        let json_start = 264 + 16 + 12 + 10 + 8;
        assert_eq!(bytes[json_start], b'{');
        bytes[json_start] = 0xFF;
        assert_eq!(parse(&bytes).map(|_| ()), Err(ErrorKind::JsonReadError));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        logger();

        let mut bytes = container(PhotoFormat::Gta5, b"jpeg", "{}");
        bytes.extend_from_slice(b"trailing");
        assert!(parse(&bytes).is_ok());
    }
}
