//! The in-memory contents of a photo container.

use ragephoto_types::{ErrorKind, PhotoFormat};

use crate::text;

/// The header of a photo container.
///
/// The text is a short, human-readable label the games write (e.g. a
/// timestamp). The checksums are opaque to this library: they're kept as-is
/// and written back unchanged.
#[derive(Clone, Debug, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct PhotoHeader {
    /// The header text.
    ///
    /// On disk, this is UTF-16LE and must fit in 256 bytes.
    pub text: String,

    /// The header checksum.
    pub checksum: u32,

    /// The second header checksum.
    ///
    /// Only RDR 2 stores this. It's zero (and ignored when saving) for GTA V.
    pub checksum2: u32,
}

/// Every parsed or settable field of one photo.
///
/// A record owns all of its buffers. Nothing borrowed from the loaded input
/// is kept around.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PhotoRecord {
    /// Which game wrote (or will read) this photo.
    ///
    /// `None` until something is loaded or a format is chosen.
    pub format: Option<PhotoFormat>,

    /// The header, if one has been loaded or set.
    ///
    /// A photo can't be saved without one.
    pub header: Option<PhotoHeader>,

    /// The embedded JPEG.
    ///
    /// Its length is the declared photo size. The bytes are never inspected.
    pub photo: Vec<u8>,

    /// The JSON metadata, as text.
    pub json: String,

    /// The photo's title.
    pub title: String,

    /// The photo's description.
    pub description: String,

    /// The last known photo signature.
    ///
    /// Computed on load and by [`crate::Photo::update_sign`].
    pub signature: u64,

    /// The status of the last load, save, or update.
    pub last_error: ErrorKind,
}

impl Default for PhotoRecord {
    fn default() -> Self {
        Self {
            format: None,
            header: None,
            photo: Vec::new(),
            json: String::new(),
            title: String::new(),
            description: String::new(),
            signature: 0,
            last_error: ErrorKind::Uninitialised,
        }
    }
}

impl PhotoRecord {
    /// The declared photo size, in bytes.
    ///
    /// Photos bigger than `u32::MAX` bytes can't be stored in a container, so
    /// the setters never let one in.
    pub fn photo_size(&self) -> u32 {
        self.photo.len() as u32
    }

    /// Bytes the JSON needs in its slot, terminator included.
    pub fn json_len(&self) -> usize {
        text::slot_len(&self.json)
    }

    /// Bytes the title needs in its slot, terminator included.
    pub fn title_len(&self) -> usize {
        text::slot_len(&self.title)
    }

    /// Bytes the description needs in its slot, terminator included.
    pub fn description_len(&self) -> usize {
        text::slot_len(&self.description)
    }

    /// Whether the record holds anything besides its status.
    pub fn is_empty(&self) -> bool {
        self.format.is_none()
            && self.header.is_none()
            && self.photo.is_empty()
            && self.json.is_empty()
            && self.title.is_empty()
            && self.description.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use ragephoto_types::{ErrorKind, PhotoFormat};

    use super::PhotoRecord;

    #[test]
    fn default_record_is_empty_and_uninitialised() {
        let record = PhotoRecord::default();

        assert!(record.is_empty());
        assert_eq!(record.last_error, ErrorKind::Uninitialised);
        assert_eq!(record.photo_size(), 0);
    }

    #[test]
    fn slot_lengths_include_terminators() {
        let record = PhotoRecord {
            format: Some(PhotoFormat::Gta5),
            json: "{}".into(),
            ..Default::default()
        };

        assert!(!record.is_empty());
        assert_eq!(record.json_len(), 3);
        assert_eq!(record.title_len(), 1);
        assert_eq!(record.description_len(), 1);
    }
}
