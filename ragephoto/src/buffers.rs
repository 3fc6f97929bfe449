//! Capacity planning for the variable-length sections.
//!
//! Every section in a container gets a fixed-size slot. The content only has
//! to fit in it, and the rest is zero padding. Keeping that slack around
//! means a photo can be edited and saved again without its layout changing.
//!
//! [`BufferPlanner`] decides how big each slot is. The sizes come from one
//! of three places:
//!
//! - format defaults ([`BufferPlanner::use_defaults`])
//! - the slots of the last loaded file ([`BufferPlanner::use_observed`])
//! - explicit values ([`BufferPlanner::set_capacity`], [`BufferPlanner::fit`])

use ragephoto_types::{
    ErrorKind, PhotoFormat,
    format::{
        DEFAULT_DESCRIPTION_BUFFER, DEFAULT_JSON_BUFFER, DEFAULT_TITLE_BUFFER,
        FIXED_SECTION_OVERHEAD,
    },
};

/// Bytes between the end of the header block and the photo slot.
///
/// End-of-file offset, three section offsets, `JPEG`, capacity, and size.
const PHOTO_LEAD: u32 = 28;

/// Bytes between two consecutive text slots: a marker and a capacity word.
const SLOT_LEAD: u32 = 8;

/// Bytes from the description offset to the end of the file, minus the
/// description slot itself: `DESC`, its capacity word, and `JEND`.
const DESCRIPTION_FRAME: u32 = 12;

/// A variable-length section of the container.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum Section {
    /// The embedded JPEG.
    Photo,

    /// The JSON metadata.
    Json,

    /// The title text.
    Title,

    /// The description text.
    Description,
}

impl Section {
    /// All sections, in on-disk order.
    pub const ALL: [Section; 4] = [
        Section::Photo,
        Section::Json,
        Section::Title,
        Section::Description,
    ];

    /// The four-byte marker in front of this section.
    pub const fn marker(self) -> &'static [u8; 4] {
        match self {
            Section::Photo => b"JPEG",
            Section::Json => b"JSON",
            Section::Title => b"TITL",
            Section::Description => b"DESC",
        }
    }

    /// The error for content that doesn't fit in this section's slot.
    pub const fn tight_error(self) -> ErrorKind {
        match self {
            Section::Photo => ErrorKind::PhotoBufferTight,
            Section::Json => ErrorKind::JsonBufferTight,
            Section::Title => ErrorKind::TitleBufferTight,
            Section::Description => ErrorKind::DescBufferTight,
        }
    }

    /// The error for a slot that couldn't be allocated.
    pub const fn malloc_error(self) -> ErrorKind {
        match self {
            Section::Photo => ErrorKind::PhotoMallocError,
            Section::Json => ErrorKind::JsonMallocError,
            Section::Title => ErrorKind::TitleMallocError,
            Section::Description => ErrorKind::DescMallocError,
        }
    }
}

/// One capacity per section.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Capacities {
    pub photo: u32,
    pub json: u32,
    pub title: u32,
    pub description: u32,
}

impl Capacities {
    /// The capacities a fresh photo of the given format uses.
    pub const fn defaults(format: PhotoFormat) -> Self {
        Self {
            photo: format.default_photo_buffer(),
            json: DEFAULT_JSON_BUFFER,
            title: DEFAULT_TITLE_BUFFER,
            description: DEFAULT_DESCRIPTION_BUFFER,
        }
    }

    pub const fn get(&self, section: Section) -> u32 {
        match section {
            Section::Photo => self.photo,
            Section::Json => self.json,
            Section::Title => self.title,
            Section::Description => self.description,
        }
    }

    pub fn set(&mut self, section: Section, capacity: u32) {
        match section {
            Section::Photo => self.photo = capacity,
            Section::Json => self.json = capacity,
            Section::Title => self.title = capacity,
            Section::Description => self.description = capacity,
        }
    }

    /// Sum of every slot.
    pub fn total(&self) -> usize {
        Section::ALL
            .iter()
            .map(|s| self.get(*s) as usize)
            .sum::<usize>()
    }

    /// The offset table these capacities produce.
    ///
    /// Offsets are 32-bit on disk, so they wrap like the format does.
    pub fn offsets(&self) -> SectionOffsets {
        let json = self.photo.wrapping_add(PHOTO_LEAD);
        let title = json.wrapping_add(self.json).wrapping_add(SLOT_LEAD);
        let description = title.wrapping_add(self.title).wrapping_add(SLOT_LEAD);
        let end_of_file = description
            .wrapping_add(self.description)
            .wrapping_add(DESCRIPTION_FRAME);

        SectionOffsets {
            json,
            title,
            description,
            end_of_file,
        }
    }
}

/// The offset table stored near the start of a container.
///
/// Each offset is counted from the end of the header block and points at a
/// section's marker. `end_of_file` is the length of everything after the
/// header block.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct SectionOffsets {
    pub json: u32,
    pub title: u32,
    pub description: u32,
    pub end_of_file: u32,
}

impl SectionOffsets {
    /// Whether the offsets are strictly increasing, as they should be.
    pub fn is_ordered(&self) -> bool {
        self.json < self.title && self.title < self.description && self.description < self.end_of_file
    }
}

/// The layout found in a loaded container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ObservedLayout {
    /// Slot sizes, as declared by each section's capacity word.
    ///
    /// Sections are packed back-to-back, so this is exactly the spacing the
    /// file used.
    pub capacities: Capacities,

    /// The offset table, as stored.
    pub offsets: SectionOffsets,
}

impl ObservedLayout {
    /// Whether the stored offset table agrees with the declared slot sizes.
    pub fn is_consistent(&self) -> bool {
        self.offsets == self.capacities.offsets()
    }
}

/// Decides the slot size of each variable-length section.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferPlanner {
    capacities: Capacities,
    observed: Option<ObservedLayout>,
}

impl Default for BufferPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPlanner {
    /// A planner with the format-independent defaults and no photo slot.
    ///
    /// The photo slot depends on the format, so it stays at zero until one
    /// is chosen.
    pub fn new() -> Self {
        let mut planner = Self {
            capacities: Capacities::default(),
            observed: None,
        };
        planner.use_format_independent_defaults();
        planner
    }

    /// The current capacity of a section.
    pub fn capacity(&self, section: Section) -> u32 {
        self.capacities.get(section)
    }

    /// All current capacities.
    pub fn capacities(&self) -> Capacities {
        self.capacities
    }

    /// Sets a section's capacity verbatim.
    ///
    /// This may be smaller than the section's content. Saving will then fail
    /// with that section's `*BufferTight` error.
    pub fn set_capacity(&mut self, section: Section, capacity: u32) {
        log::trace!("Setting {section:?} capacity to `{capacity}` bytes.");
        self.capacities.set(section, capacity);
    }

    /// Sets a section's capacity to `requested`, or `needed` if that's bigger.
    ///
    /// Returns the capacity that was set.
    pub fn fit(&mut self, section: Section, requested: u32, needed: u32) -> u32 {
        let capacity = if requested < needed {
            log::debug!(
                "Requested {section:?} capacity of `{requested}` bytes is too small \
                for `{needed}` bytes of content. Using `{needed}` instead."
            );
            needed
        } else {
            requested
        };

        self.set_capacity(section, capacity);
        capacity
    }

    /// The default capacity of one section.
    ///
    /// The photo's default depends on the format. Without one, it's zero.
    pub fn default_capacity(section: Section, format: Option<PhotoFormat>) -> u32 {
        match section {
            Section::Photo => format.map_or(0, PhotoFormat::default_photo_buffer),
            Section::Json => DEFAULT_JSON_BUFFER,
            Section::Title => DEFAULT_TITLE_BUFFER,
            Section::Description => DEFAULT_DESCRIPTION_BUFFER,
        }
    }

    /// Uses the default capacities of the given format for every section.
    pub fn use_defaults(&mut self, format: PhotoFormat) {
        log::debug!("Using default {format} buffer capacities.");
        self.capacities = Capacities::defaults(format);
    }

    /// Resets the JSON, title, and description capacities to their defaults.
    ///
    /// The photo capacity is left alone, since its default depends on the
    /// format.
    pub fn use_format_independent_defaults(&mut self) {
        self.capacities.json = DEFAULT_JSON_BUFFER;
        self.capacities.title = DEFAULT_TITLE_BUFFER;
        self.capacities.description = DEFAULT_DESCRIPTION_BUFFER;
    }

    /// Restores the capacities of the last loaded file.
    ///
    /// Returns `false`, changing nothing, if no file was loaded.
    pub fn use_observed(&mut self) -> bool {
        match self.observed {
            Some(layout) => {
                log::debug!("Using buffer capacities observed in the loaded file.");
                self.capacities = layout.capacities;
                true
            }
            None => {
                log::debug!("No file has been loaded, so there are no observed capacities.");
                false
            }
        }
    }

    /// Remembers a freshly loaded layout and switches to it.
    pub(crate) fn observe(&mut self, layout: ObservedLayout) {
        self.observed = Some(layout);
        self.use_observed();
    }

    /// The layout of the last loaded file, if any.
    pub fn observed(&self) -> Option<&ObservedLayout> {
        self.observed.as_ref()
    }

    /// The offset table a save would write.
    pub fn offsets(&self) -> SectionOffsets {
        self.capacities.offsets()
    }

    /// The exact number of bytes a save in the given format produces.
    pub fn save_size(&self, format: PhotoFormat) -> usize {
        format.header_size() + FIXED_SECTION_OVERHEAD + self.capacities.total()
    }
}
