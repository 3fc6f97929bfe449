//! The photo formats and their per-format constants.

/// Default capacity of the description slot, in bytes.
pub const DEFAULT_DESCRIPTION_BUFFER: u32 = 256;

/// Default capacity of the JSON slot, in bytes.
pub const DEFAULT_JSON_BUFFER: u32 = 3072;

/// Default capacity of the title slot, in bytes.
pub const DEFAULT_TITLE_BUFFER: u32 = 256;

/// Size of the UTF-16LE header text, in bytes.
///
/// This is the same for every format. Shorter text is padded with zeroes.
pub const HEADER_TEXT_SIZE: usize = 256;

/// Bytes of fixed layout that follow the header block.
///
/// That's the end-of-file offset, the three section offsets, the `JPEG`
/// marker with its capacity and size words, the `JSON`, `TITL`, and `DESC`
/// markers with their capacity words, and the final `JEND` marker.
pub const FIXED_SECTION_OVERHEAD: usize = 56;

/// A kind of photo container.
///
/// Each game writes its own flavor. They share one layout, but differ in the
/// magic number, the header block, the default photo capacity, and the seed
/// of the photo signature.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum PhotoFormat {
    /// Grand Theft Auto V.
    Gta5 = 0x0100_0000,

    /// Red Dead Redemption 2.
    Rdr2 = 0x0400_0000,
}

impl PhotoFormat {
    /// Every known format, in magic number order.
    pub const ALL: [PhotoFormat; 2] = [PhotoFormat::Gta5, PhotoFormat::Rdr2];

    /// Finds the format with the given magic number.
    pub const fn from_magic(magic: u32) -> Option<Self> {
        match magic {
            0x0100_0000 => Some(PhotoFormat::Gta5),
            0x0400_0000 => Some(PhotoFormat::Rdr2),
            _ => None,
        }
    }

    /// The 32-bit magic number at the very start of the container.
    ///
    /// On disk, it's stored little-endian.
    pub const fn magic(self) -> u32 {
        self as u32
    }

    /// The photo capacity used when nothing else is known.
    pub const fn default_photo_buffer(self) -> u32 {
        match self {
            PhotoFormat::Gta5 => 524_288,
            PhotoFormat::Rdr2 => 1_048_576,
        }
    }

    /// Size of the header block: magic, header text, and checksum word(s).
    pub const fn header_size(self) -> usize {
        match self {
            PhotoFormat::Gta5 => 264,
            PhotoFormat::Rdr2 => 272,
        }
    }

    /// Whether this format stores a second header checksum.
    ///
    /// RDR 2 does, preceded by a reserved word of zeroes.
    pub const fn has_second_checksum(self) -> bool {
        matches!(self, PhotoFormat::Rdr2)
    }

    /// The initial value for the photo signature hash.
    pub const fn sign_initial(self) -> u32 {
        match self {
            PhotoFormat::Gta5 => 0xE47A_B81C,
            PhotoFormat::Rdr2 => 0x00FE_EB1E,
        }
    }

    /// A short, human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            PhotoFormat::Gta5 => "GTA V",
            PhotoFormat::Rdr2 => "RDR 2",
        }
    }
}

impl core::fmt::Display for PhotoFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u32> for PhotoFormat {
    type Error = u32;

    fn try_from(magic: u32) -> Result<Self, Self::Error> {
        PhotoFormat::from_magic(magic).ok_or(magic)
    }
}

impl From<PhotoFormat> for u32 {
    fn from(format: PhotoFormat) -> u32 {
        format.magic()
    }
}
