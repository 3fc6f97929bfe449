//! Text encodings used inside the container.
//!
//! There are two of them:
//!
//! - the header, a fixed 256-byte block of UTF-16LE text padded with zeroes
//! - the JSON, title, and description "slots", which hold NUL-terminated
//!   UTF-8 followed by zero padding up to the slot's capacity

use ragephoto_types::{ErrorKind, format::HEADER_TEXT_SIZE};

/// Decodes the header block into a `String`.
///
/// Decoding stops at the first NUL code unit. If there isn't one, all 128
/// units are used.
pub(crate) fn decode_header(block: &[u8]) -> Result<String, ErrorKind> {
    let units = block
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0x0000);

    let mut text = String::new();
    text.try_reserve_exact(block.len() / 2).map_err(|e| {
        log::error!("Couldn't allocate room for the header text! err: {e}");
        ErrorKind::HeaderMallocError
    })?;

    for c in char::decode_utf16(units) {
        match c {
            Ok(c) => text.push(c),
            Err(e) => {
                log::error!(
                    "Header isn't valid UTF-16! Found unpaired surrogate `0x{:x}`.",
                    e.unpaired_surrogate()
                );
                return Err(ErrorKind::UnicodeHeaderError);
            }
        }
    }

    Ok(text)
}

/// Encodes header text into its fixed-size, zero-padded block.
///
/// Text that needs more than 256 bytes of UTF-16LE doesn't fit. Exactly 256
/// bytes is fine; the terminator is optional when the block is full.
pub(crate) fn encode_header(text: &str) -> Result<[u8; HEADER_TEXT_SIZE], ErrorKind> {
    let mut block = [0_u8; HEADER_TEXT_SIZE];

    for (i, unit) in text.encode_utf16().enumerate() {
        let Some(dst) = block.get_mut(i * 2..i * 2 + 2) else {
            log::error!(
                "Header text needs `{}` bytes as UTF-16, but only `{HEADER_TEXT_SIZE}` are available.",
                text.encode_utf16().count() * 2
            );
            return Err(ErrorKind::HeaderBufferTight);
        };
        dst.copy_from_slice(&unit.to_le_bytes());
    }

    Ok(block)
}

/// The number of bytes `text` takes up in a slot, terminator included.
pub(crate) fn slot_len(text: &str) -> usize {
    text.len() + 1
}

/// Decodes a slot's text: everything before the first NUL, as UTF-8.
///
/// Returns `None` if the bytes aren't UTF-8, or if the slot has no NUL at
/// all. A slot always holds its terminator, so a full or empty slot is
/// malformed.
pub(crate) fn decode_slot(slot: &[u8]) -> Option<&str> {
    let Some(end) = slot.iter().position(|b| *b == 0x00) else {
        log::error!("Slot of `{}` bytes has no NUL terminator!", slot.len());
        return None;
    };

    core::str::from_utf8(&slot[..end])
        .inspect_err(|e| log::error!("Slot text isn't valid UTF-8! err: {e}"))
        .ok()
}

/// Trims text at its first NUL.
///
/// Slot text is NUL-terminated on disk, so anything after an embedded NUL
/// would be lost on the next load anyway.
pub(crate) fn until_nul(text: &str) -> &str {
    match text.find('\0') {
        Some(end) => {
            log::warn!(
                "Text contains a NUL at byte `{end}`. \
                Everything after it will be dropped."
            );
            &text[..end]
        }
        None => text,
    }
}
