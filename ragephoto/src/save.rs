//! Writes a photo container.
//!
//! Everything is checked before anything is written, so a save either
//! produces a complete container or nothing at all.

use ragephoto_types::{ErrorKind, PhotoFormat, format::HEADER_TEXT_SIZE};

use crate::{
    buffers::{BufferPlanner, Capacities, Section},
    record::PhotoRecord,
    text,
};

/// Serializes `record` in the given format, with the planner's capacities.
pub(crate) fn save(
    record: &PhotoRecord,
    planner: &BufferPlanner,
    format: PhotoFormat,
) -> Result<Vec<u8>, ErrorKind> {
    log::trace!("Saving {format} photo.");

    let Some(header) = record.header.as_ref() else {
        log::error!("Can't save a photo without a header.");
        return Err(ErrorKind::IncompleteHeader);
    };
    let header_block: [u8; HEADER_TEXT_SIZE] = text::encode_header(&header.text)?;

    let capacities: Capacities = planner.capacities();
    check_fits(Section::Photo, record.photo.len(), &capacities)?;
    check_fits(Section::Json, record.json_len(), &capacities)?;
    check_fits(Section::Title, record.title_len(), &capacities)?;
    check_fits(Section::Description, record.description_len(), &capacities)?;

    let size: usize = planner.save_size(format);
    let mut out: Vec<u8> = Vec::new();
    out.try_reserve_exact(size).map_err(|e| {
        log::error!("Couldn't allocate `{size}` bytes for the container! err: {e}");
        ErrorKind::PhotoMallocError
    })?;

    // header block
    push_word(&mut out, format.magic());
    out.extend_from_slice(&header_block);
    push_word(&mut out, header.checksum);
    if format.has_second_checksum() {
        push_word(&mut out, 0);
        push_word(&mut out, header.checksum2);
    }

    // offset table
    let offsets = capacities.offsets();
    push_word(&mut out, offsets.end_of_file);
    push_word(&mut out, offsets.json);
    push_word(&mut out, offsets.title);
    push_word(&mut out, offsets.description);

    // photo section
    out.extend_from_slice(Section::Photo.marker());
    push_word(&mut out, capacities.photo);
    push_word(&mut out, record.photo_size());
    push_slot(&mut out, &record.photo, capacities.photo);

    // text sections
    for (section, content) in [
        (Section::Json, &record.json),
        (Section::Title, &record.title),
        (Section::Description, &record.description),
    ] {
        out.extend_from_slice(section.marker());
        push_word(&mut out, capacities.get(section));
        push_slot(&mut out, content.as_bytes(), capacities.get(section));
    }

    out.extend_from_slice(b"JEND");

    debug_assert_eq!(out.len(), size, "planned size should match the output");
    log::trace!("Saved `{}` bytes.", out.len());
    Ok(out)
}

/// Fails with the section's tight error if `len` bytes don't fit.
fn check_fits(section: Section, len: usize, capacities: &Capacities) -> Result<(), ErrorKind> {
    let capacity: u32 = capacities.get(section);

    if len > capacity as usize {
        log::error!(
            "{section:?} needs `{len}` bytes, but its capacity is only `{capacity}` bytes."
        );
        return Err(section.tight_error());
    }

    Ok(())
}

fn push_word(out: &mut Vec<u8>, word: u32) {
    out.extend_from_slice(&word.to_le_bytes());
}

/// Writes `content`, then zeroes up to `capacity`.
///
/// Text content gets its terminator from the padding. `check_fits` has
/// already made room for it.
fn push_slot(out: &mut Vec<u8>, content: &[u8], capacity: u32) {
    out.extend_from_slice(content);
    out.resize(out.len() + (capacity as usize - content.len()), 0x00);
}
