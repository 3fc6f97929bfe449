//! Figures out which game wrote a photo, without parsing the whole thing.
//!
//! Every container starts with a little-endian 32-bit magic number. That's
//! enough to tell the formats apart, so it's a cheap check to run before
//! committing to a full [`Photo::load`](crate::Photo::load).
//!
//! # Usage
//!
//! ```
//! use ragephoto::{PhotoFormat, magic_number};
//!
//! // a GTA V photo starts with `00 00 00 01`
//! let start_of_file: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0xAB, 0xCD];
//!
//! assert_eq!(magic_number::detect(start_of_file), Ok(PhotoFormat::Gta5));
//! assert!(magic_number::is_photo(start_of_file));
//!
//! // ...but a JPEG does not!
//! assert!(!magic_number::is_photo(&[0xFF, 0xD8, 0xFF, 0xE0]));
//! ```

use ragephoto_types::{ErrorKind, PhotoFormat};
use winnow::{Parser as _, binary::le_u32, error::EmptyError};

/// Reads the magic number off the front of `input`, advancing past it.
pub(crate) fn parse(input: &mut &[u8]) -> Result<PhotoFormat, ErrorKind> {
    log::trace!("Parsing: format identifier.");

    let magic: u32 = le_u32
        .parse_next(input)
        .map_err(|_: EmptyError| {
            log::error!("Not enough bytes to hold a format identifier!");
            ErrorKind::NoFormatIdentifier
        })?;

    PhotoFormat::from_magic(magic).ok_or_else(|| {
        log::error!("Unknown format identifier: `0x{magic:08x}`.");
        ErrorKind::IncompatibleFormat
    })
}

/// Finds the format of the given input.
///
/// # Errors
///
/// - [`ErrorKind::NoFormatIdentifier`] if there are fewer than four bytes.
/// - [`ErrorKind::IncompatibleFormat`] if the magic number isn't known.
pub fn detect(input: &[u8]) -> Result<PhotoFormat, ErrorKind> {
    parse(&mut &*input)
}

/// Whether the input starts like a photo container.
///
/// This only checks the magic number. A `true` here doesn't mean the rest of
/// the file is valid!
pub fn is_photo(input: &[u8]) -> bool {
    detect(input).is_ok()
}
