//! # `ragephoto`
//!
//! A library to read, edit, and write the photo containers saved by the
//! RAGE engine games, Grand Theft Auto V and Red Dead Redemption 2.
//!
//! Each container wraps a JPEG with a header, some JSON metadata, a title,
//! and a description. This crate parses all of it, lets you change any
//! field, and writes the result back out in a layout the games accept.
//!
//! ## Usage
//!
//! ```
//! use ragephoto::{Photo, PhotoFormat};
//!
//! // make a photo from scratch...
//! let mut photo = Photo::new();
//! photo.set_format(PhotoFormat::Gta5);
//! photo.set_header("PHOTO - 10/19/26 14:37:12", 0, 0).unwrap();
//! photo.set_photo(b"\xFF\xD8\xFF\xD9", None).unwrap();
//! photo.set_json("{}", None).unwrap();
//! photo.set_title("Sunset", None).unwrap();
//! photo.update_sign().unwrap();
//!
//! let bytes: Vec<u8> = photo.save().unwrap();
//!
//! // ...then read it back!
//! let mut loaded = Photo::new();
//! loaded.load(&bytes).unwrap();
//! assert_eq!(loaded.format(), Some(PhotoFormat::Gta5));
//! assert_eq!(loaded.title(), "Sunset");
//! assert_eq!(loaded.photo_size(), 4);
//! ```
//!
//! ## Errors
//!
//! Every fallible method returns a `Result`. The outcome is also remembered,
//! and [`Photo::error`] returns the status of the last load, save, or field
//! change. That's handy when a photo gets passed around a lot.
//!
//! ## License
//!
//! This project is dual-licensed under either the Apache License 2.0 or the MIT License at your option.
//!
//! For more information, please see the [`LICENSE-APACHE`](LICENSE-APACHE) and [`LICENSE-MIT`](LICENSE-MIT) files at the root of this repository.

#![forbid(unsafe_code)]

use std::path::Path;

pub use ragephoto_types::{ErrorKind, PhotoFormat, format};

pub mod buffers;
pub mod error;
pub mod magic_number;
pub mod record;
pub mod sign;

mod parse;
mod save;
mod text;

pub use buffers::{BufferPlanner, Capacities, ObservedLayout, Section, SectionOffsets};
pub use error::FileError;
pub use record::{PhotoHeader, PhotoRecord};
pub use sign::SignError;

/// The version of this library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// A photo container, plus the capacities it'll be saved with.
///
/// A new `Photo` is empty. Fill it with [`Photo::load`], or build one up
/// with the setters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Photo {
    record: PhotoRecord,
    buffers: BufferPlanner,
}

impl Photo {
    /// Creates an empty photo, with no format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets this photo to the state [`Photo::new`] creates.
    pub fn clear(&mut self) {
        log::trace!("Clearing photo.");
        *self = Self::new();
    }

    /// Parses a photo container.
    ///
    /// On success, every field is replaced and the capacities are taken from
    /// the file, so saving again reproduces its layout.
    ///
    /// # Errors
    ///
    /// If anything is wrong with the input, this returns the first problem
    /// found. The photo keeps whatever it held before; only
    /// [`Photo::error`] changes.
    pub fn load(&mut self, input: &[u8]) -> Result<(), ErrorKind> {
        match parse::parse(input) {
            Ok((record, layout)) => {
                self.record = record;
                self.buffers.observe(layout);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load photo! err: {e}");
                self.record.last_error = e;
                Err(e)
            }
        }
    }

    /// Reads a file, then [loads](Photo::load) it.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), FileError> {
        let path: &Path = path.as_ref();

        let bytes: Vec<u8> = std::fs::read(path).map_err(|e| {
            log::error!("Couldn't read photo file at `{}`! err: {e}", path.display());
            self.record.last_error = ErrorKind::Uninitialised;
            FileError::from(e)
        })?;

        self.load(&bytes).map_err(FileError::from)
    }

    /// The status of the last load, save, or field change.
    pub fn error(&self) -> ErrorKind {
        self.record.last_error
    }

    /// The photo's format, if it has one.
    pub fn format(&self) -> Option<PhotoFormat> {
        self.record.format
    }

    /// Sets the photo's format.
    ///
    /// This also resets every capacity to the format's defaults.
    pub fn set_format(&mut self, format: PhotoFormat) {
        log::debug!("Setting photo format to {format}.");
        self.record.format = Some(format);
        self.buffers.use_defaults(format);
    }

    /// The embedded JPEG.
    pub fn photo(&self) -> &[u8] {
        &self.record.photo
    }

    /// The size of the embedded JPEG, in bytes.
    pub fn photo_size(&self) -> u32 {
        self.record.photo_size()
    }

    /// Replaces the embedded JPEG.
    ///
    /// The photo slot is resized to `capacity`, or to the format's default
    /// photo capacity when that's `None`. Either way, it grows to the photo's
    /// size if that's bigger.
    pub fn set_photo(&mut self, photo: &[u8], capacity: Option<u32>) -> Result<(), ErrorKind> {
        let requested: u32 = self.requested_capacity(Section::Photo, capacity);
        let result = owned_photo(photo).map(|(photo, size)| {
            self.buffers.fit(Section::Photo, requested, size);
            self.record.photo = photo;
        });

        self.track(result)
    }

    /// The JSON metadata.
    pub fn json(&self) -> &str {
        &self.record.json
    }

    /// Replaces the JSON metadata.
    ///
    /// The text isn't checked to be JSON. Anything after a NUL is dropped.
    ///
    /// See [`Photo::set_photo`] for how `capacity` works. The default is
    /// 3072 bytes here, and text needs one extra byte for its terminator.
    pub fn set_json(&mut self, json: &str, capacity: Option<u32>) -> Result<(), ErrorKind> {
        let requested: u32 = self.requested_capacity(Section::Json, capacity);
        let result = owned_text(json, Section::Json).map(|(json, needed)| {
            self.buffers.fit(Section::Json, requested, needed);
            self.record.json = json;
        });

        self.track(result)
    }

    /// The photo's title.
    pub fn title(&self) -> &str {
        &self.record.title
    }

    /// Replaces the title. Works like [`Photo::set_json`], with a default
    /// capacity of 256 bytes.
    pub fn set_title(&mut self, title: &str, capacity: Option<u32>) -> Result<(), ErrorKind> {
        let requested: u32 = self.requested_capacity(Section::Title, capacity);
        let result = owned_text(title, Section::Title).map(|(title, needed)| {
            self.buffers.fit(Section::Title, requested, needed);
            self.record.title = title;
        });

        self.track(result)
    }

    /// The photo's description.
    pub fn description(&self) -> &str {
        &self.record.description
    }

    /// Replaces the description. Works like [`Photo::set_json`], with a
    /// default capacity of 256 bytes.
    pub fn set_description(
        &mut self,
        description: &str,
        capacity: Option<u32>,
    ) -> Result<(), ErrorKind> {
        let requested: u32 = self.requested_capacity(Section::Description, capacity);
        let result = owned_text(description, Section::Description).map(|(description, needed)| {
            self.buffers.fit(Section::Description, requested, needed);
            self.record.description = description;
        });

        self.track(result)
    }

    /// The header text, if there's a header.
    pub fn header(&self) -> Option<&str> {
        self.record.header.as_ref().map(|h| h.text.as_str())
    }

    /// The two header checksums, if there's a header.
    ///
    /// The second one is only meaningful for RDR 2 photos.
    pub fn header_checksums(&self) -> Option<(u32, u32)> {
        self.record
            .header
            .as_ref()
            .map(|h| (h.checksum, h.checksum2))
    }

    /// Replaces the header.
    ///
    /// Its length is only checked when saving, since the limit depends on
    /// the encoding.
    pub fn set_header(&mut self, text: &str, checksum: u32, checksum2: u32) -> Result<(), ErrorKind> {
        let text: &str = text::until_nul(text);

        let mut owned = String::new();
        let result = owned
            .try_reserve_exact(text.len())
            .map_err(|e| {
                log::error!("Couldn't allocate room for the header! err: {e}");
                ErrorKind::HeaderMallocError
            })
            .map(|()| {
                owned.push_str(text);
                self.record.header = Some(PhotoHeader {
                    text: owned,
                    checksum,
                    checksum2,
                });
            });

        self.track(result)
    }

    /// The photo's signature, as its own format computes it.
    ///
    /// Returns `None` if there's no format yet.
    pub fn signature(&self) -> Option<u64> {
        self.record.format.map(|f| self.signature_as(f))
    }

    /// The photo's signature, as the given format computes it.
    ///
    /// This is `0` while there's no photo.
    pub fn signature_as(&self, format: PhotoFormat) -> u64 {
        sign::signature(&self.record.photo, format)
    }

    /// Recomputes the signature and writes it into the JSON's `"sign"` key.
    ///
    /// The rest of the JSON keeps its keys and their order, but loses its
    /// whitespace. The JSON capacity goes back to its default (or the new
    /// JSON's length, if that's bigger).
    ///
    /// # Errors
    ///
    /// The JSON must be an object and there must be a format. On failure,
    /// nothing changes.
    pub fn update_sign(&mut self) -> Result<u64, SignError> {
        let Some(format) = self.record.format else {
            log::error!("Can't sign a photo without a format.");
            return Err(SignError::NoFormat);
        };

        let sign: u64 = self.signature_as(format);
        let json: String = sign::with_sign(&self.record.json, sign)?;

        self.set_json(&json, None).map_err(SignError::Store)?;
        self.record.signature = sign;

        log::debug!("Updated photo signature to `{sign}`.");
        Ok(sign)
    }

    /// Bytes a [`Photo::save`] would produce.
    ///
    /// Returns zero if there's no format yet.
    pub fn save_size(&self) -> usize {
        self.record
            .format
            .map(|f| self.save_size_as(f))
            .unwrap_or(0)
    }

    /// Bytes a [`Photo::save_as`] in the given format would produce.
    pub fn save_size_as(&self, format: PhotoFormat) -> usize {
        self.buffers.save_size(format)
    }

    /// Serializes the photo in its own format.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Uninitialised`] if there's no format.
    /// - Otherwise, see [`Photo::save_as`].
    pub fn save(&mut self) -> Result<Vec<u8>, ErrorKind> {
        match self.record.format {
            Some(format) => self.save_as(format),
            None => {
                log::error!("Can't save a photo without a format.");
                self.track(Err(ErrorKind::Uninitialised))
            }
        }
    }

    /// Serializes the photo in the given format.
    ///
    /// The photo's own format isn't changed.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::IncompleteHeader`] if there's no header.
    /// - [`ErrorKind::HeaderBufferTight`] if the header is too long.
    /// - A `*BufferTight` error for the first section that doesn't fit in
    ///   its capacity.
    pub fn save_as(&mut self, format: PhotoFormat) -> Result<Vec<u8>, ErrorKind> {
        let result = save::save(&self.record, &self.buffers, format);
        self.track(result)
    }

    /// [Saves](Photo::save) the photo to a file.
    pub fn save_file(&mut self, path: impl AsRef<Path>) -> Result<(), FileError> {
        let bytes: Vec<u8> = self.save()?;
        self.write_file(path.as_ref(), &bytes)
    }

    /// [Saves](Photo::save_as) the photo to a file, in the given format.
    pub fn save_file_as(
        &mut self,
        path: impl AsRef<Path>,
        format: PhotoFormat,
    ) -> Result<(), FileError> {
        let bytes: Vec<u8> = self.save_as(format)?;
        self.write_file(path.as_ref(), &bytes)
    }

    fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<(), FileError> {
        std::fs::write(path, bytes).map_err(|e| {
            log::error!("Couldn't write photo file at `{}`! err: {e}", path.display());
            self.record.last_error = ErrorKind::Uninitialised;
            FileError::from(e)
        })
    }

    /// Resets the JSON, title, and description capacities to their defaults.
    pub fn set_buffer_default(&mut self) {
        self.buffers.use_format_independent_defaults();
    }

    /// Restores the capacities of the last loaded file.
    ///
    /// Returns `false` if nothing was loaded.
    pub fn set_buffer_observed(&mut self) -> bool {
        self.buffers.use_observed()
    }

    /// Every field of the photo.
    pub fn record(&self) -> &PhotoRecord {
        &self.record
    }

    /// The capacities the photo will be saved with.
    pub fn buffers(&self) -> &BufferPlanner {
        &self.buffers
    }

    /// The capacities the photo will be saved with, for editing.
    pub fn buffers_mut(&mut self) -> &mut BufferPlanner {
        &mut self.buffers
    }

    /// Replaces every field at once.
    ///
    /// The record's status is ignored. The capacities are kept as they are.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::PhotoBufferTight`] if the photo is too big to ever be
    /// saved. Nothing is changed in that case.
    pub fn set_record(&mut self, record: PhotoRecord) -> Result<(), ErrorKind> {
        if u32::try_from(record.photo.len()).is_err() {
            log::error!("Photo of `{}` bytes is too big for any container.", record.photo.len());
            return self.track(Err(ErrorKind::PhotoBufferTight));
        }

        self.record = record;
        self.track(Ok(()))
    }

    /// The capacity a setter asks for: the caller's, or the section default.
    fn requested_capacity(&self, section: Section, capacity: Option<u32>) -> u32 {
        capacity.unwrap_or_else(|| BufferPlanner::default_capacity(section, self.record.format))
    }

    /// Records the outcome of an operation, then passes it along.
    fn track<T>(&mut self, result: Result<T, ErrorKind>) -> Result<T, ErrorKind> {
        self.record.last_error = match &result {
            Ok(_) => ErrorKind::NoError,
            Err(e) => *e,
        };
        result
    }
}

/// Copies a photo, checking that its size fits in a container.
fn owned_photo(photo: &[u8]) -> Result<(Vec<u8>, u32), ErrorKind> {
    let size: u32 = u32::try_from(photo.len()).map_err(|_| {
        log::error!("Photo of `{}` bytes is too big for any container.", photo.len());
        ErrorKind::PhotoBufferTight
    })?;

    let mut owned: Vec<u8> = Vec::new();
    owned.try_reserve_exact(photo.len()).map_err(|e| {
        log::error!("Couldn't allocate `{size}` bytes for the photo! err: {e}");
        ErrorKind::PhotoMallocError
    })?;
    owned.extend_from_slice(photo);

    Ok((owned, size))
}

/// Copies slot text up to its first NUL.
///
/// Also returns the bytes it needs in its slot.
fn owned_text(content: &str, section: Section) -> Result<(String, u32), ErrorKind> {
    let content: &str = text::until_nul(content);

    let needed: u32 = u32::try_from(text::slot_len(content)).map_err(|_| {
        log::error!("{section:?} of `{}` bytes is too big for any container.", content.len());
        section.tight_error()
    })?;

    let mut owned = String::new();
    owned.try_reserve_exact(content.len()).map_err(|e| {
        log::error!("Couldn't allocate `{}` bytes for {section:?}! err: {e}", content.len());
        section.malloc_error()
    })?;
    owned.push_str(content);

    Ok((owned, needed))
}

pub(crate) mod util {
    /// Helper function to initialize the logger for testing.
    #[cfg(test)]
    pub fn logger() {
        _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::max())
            .format_file(true)
            .format_line_number(true)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use ragephoto_types::{ErrorKind, PhotoFormat};

    use super::{Photo, Section};
    use crate::util::logger;

    #[test]
    fn new_photo_is_empty() {
        logger();

        let photo = Photo::new();
        assert_eq!(photo.format(), None);
        assert_eq!(photo.error(), ErrorKind::Uninitialised);
        assert_eq!(photo.header(), None);
        assert_eq!(photo.signature(), None);
        assert_eq!(photo.signature_as(PhotoFormat::Gta5), 0);
        assert_eq!(photo.save_size(), 0);
        assert_eq!(photo.buffers().capacity(Section::Photo), 0);
        assert!(photo.record().is_empty());
    }

    #[test]
    fn setters_record_their_status() {
        logger();

        let mut photo = Photo::new();
        photo.set_json("{}", None).unwrap();
        assert_eq!(photo.error(), ErrorKind::NoError);

        assert_eq!(photo.save(), Err(ErrorKind::Uninitialised));
        assert_eq!(photo.error(), ErrorKind::Uninitialised);
    }

    #[test]
    fn explicit_capacities_grow_to_fit() {
        logger();

        let mut photo = Photo::new();
        photo.set_title("a long title", Some(4)).unwrap();
        assert_eq!(photo.buffers().capacity(Section::Title), 13);

        photo.set_title("short", Some(64)).unwrap();
        assert_eq!(photo.buffers().capacity(Section::Title), 64);
    }

    #[test]
    fn no_capacity_means_the_default() {
        logger();

        let mut photo = Photo::new();
        photo.set_title("short", Some(8)).unwrap();
        photo.set_title("short", None).unwrap();
        assert_eq!(photo.buffers().capacity(Section::Title), 256);

        // the default still grows to fit
        photo.set_title("x".repeat(300).as_str(), None).unwrap();
        assert_eq!(photo.buffers().capacity(Section::Title), 301);

        // without a format, the photo's default is its own size
        photo.set_photo(&[0xAB; 20], None).unwrap();
        assert_eq!(photo.buffers().capacity(Section::Photo), 20);

        photo.set_format(PhotoFormat::Gta5);
        photo.set_photo(&[0xAB; 20], Some(4)).unwrap();
        assert_eq!(photo.buffers().capacity(Section::Photo), 20);
        photo.set_photo(&[0xAB; 20], None).unwrap();
        assert_eq!(photo.buffers().capacity(Section::Photo), 524_288);
    }

    #[test]
    fn text_setters_stop_at_nul() {
        logger();

        let mut photo = Photo::new();
        photo.set_description("seen\0unseen", None).unwrap();
        assert_eq!(photo.description(), "seen");
    }

    #[test]
    fn set_format_resets_capacities() {
        logger();

        let mut photo = Photo::new();
        photo.set_json("{}", Some(10)).unwrap();
        photo.set_format(PhotoFormat::Rdr2);

        assert_eq!(photo.format(), Some(PhotoFormat::Rdr2));
        assert_eq!(photo.buffers().capacity(Section::Json), 3072);
        assert_eq!(photo.buffers().capacity(Section::Photo), 1_048_576);
    }

    #[test]
    fn set_buffer_default_keeps_the_photo_slot() {
        logger();

        let mut photo = Photo::new();
        photo.set_format(PhotoFormat::Gta5);
        photo.set_photo(b"jpeg", Some(100)).unwrap();
        photo.set_json("{}", Some(10)).unwrap();

        photo.set_buffer_default();
        assert_eq!(photo.buffers().capacity(Section::Photo), 100);
        assert_eq!(photo.buffers().capacity(Section::Json), 3072);
        assert!(!photo.set_buffer_observed());
    }
}
