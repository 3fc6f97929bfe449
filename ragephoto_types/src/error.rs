//! Status codes for every way a photo can fail to load, save, or change.

/// Generates [`ErrorKind`] and its lookups from one table.
///
/// Each row is `Variant = code => "message"`. The codes are stable: other
/// tools built around these photos compare against the raw numbers.
macro_rules! error_kinds {
    ( $(
        $(#[$meta:meta])*
        $variant:ident = $code:literal => $message:literal,
    )+ ) => {
        /// The outcome of a load, save, or field update.
        ///
        /// Errors are grouped by the section of the container they concern,
        /// then by what went wrong: missing (`Incomplete*`), a wrong marker
        /// (`Incorrect*`), content too big for its slot (`*BufferTight`),
        /// failed allocation (`*MallocError`), or otherwise unreadable
        /// (`*ReadError`).
        #[repr(i32)]
        #[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
        pub enum ErrorKind {
            $(
                $(#[$meta])*
                $variant = $code,
            )+
        }

        impl ErrorKind {
            /// Every status, including [`ErrorKind::NoError`].
            pub const ALL: &'static [ErrorKind] = &[$(ErrorKind::$variant,)+];

            /// Finds the status with the given numeric code.
            pub const fn from_code(code: i32) -> Option<Self> {
                match code {
                    $($code => Some(ErrorKind::$variant),)+
                    _ => None,
                }
            }

            /// A short description of this status.
            pub const fn message(self) -> &'static str {
                match self {
                    $(ErrorKind::$variant => $message,)+
                }
            }
        }
    };
}

error_kinds! {
    /// Nothing has been loaded yet, or a file couldn't be accessed.
    Uninitialised = 0 => "uninitialised, or file access failed",
    /// The input was too short to hold a format identifier.
    NoFormatIdentifier = 1 => "no format identifier found",
    /// The format identifier (or RDR 2's reserved header word) isn't known.
    IncompatibleFormat = 2 => "the format is incompatible",
    IncompleteHeader = 3 => "the header is incomplete",
    HeaderMallocError = 4 => "the header buffer couldn't be allocated",
    /// Kept for code compatibility; the header decoder needs no setup.
    UnicodeInitError = 5 => "failed to initialise the unicode decoder",
    UnicodeHeaderError = 6 => "the header couldn't be encoded or decoded",
    IncompleteChecksum = 7 => "the header checksum is incomplete",
    IncompleteEOF = 8 => "the end-of-file offset is incomplete",
    IncompleteJsonOffset = 9 => "the JSON offset is incomplete",
    IncompleteTitleOffset = 10 => "the title offset is incomplete",
    IncompleteDescOffset = 11 => "the description offset is incomplete",
    IncompleteJpegMarker = 12 => "the JPEG marker is incomplete",
    IncorrectJpegMarker = 13 => "the JPEG marker is incorrect",
    IncompletePhotoBuffer = 14 => "the photo buffer size is incomplete",
    IncompletePhotoSize = 15 => "the photo size is incomplete",
    PhotoMallocError = 16 => "the photo buffer couldn't be allocated",
    PhotoReadError = 17 => "the photo couldn't be read",
    IncompleteJsonMarker = 18 => "the JSON marker is incomplete",
    IncorrectJsonMarker = 19 => "the JSON marker is incorrect",
    IncompleteJsonBuffer = 20 => "the JSON buffer size is incomplete",
    JsonMallocError = 21 => "the JSON buffer couldn't be allocated",
    JsonReadError = 22 => "the JSON couldn't be read",
    IncompleteTitleMarker = 23 => "the title marker is incomplete",
    IncorrectTitleMarker = 24 => "the title marker is incorrect",
    IncompleteTitleBuffer = 25 => "the title buffer size is incomplete",
    TitleMallocError = 26 => "the title buffer couldn't be allocated",
    TitleReadError = 27 => "the title couldn't be read",
    IncompleteDescMarker = 28 => "the description marker is incomplete",
    IncorrectDescMarker = 29 => "the description marker is incorrect",
    IncompleteDescBuffer = 30 => "the description buffer size is incomplete",
    DescMallocError = 31 => "the description buffer couldn't be allocated",
    DescReadError = 32 => "the description couldn't be read",
    IncompleteJendMarker = 33 => "the JEND marker is incomplete",
    IncorrectJendMarker = 34 => "the JEND marker is incorrect",
    HeaderBufferTight = 35 => "the header doesn't fit in its buffer",
    PhotoBufferTight = 36 => "the photo doesn't fit in its buffer",
    JsonBufferTight = 37 => "the JSON doesn't fit in its buffer",
    TitleBufferTight = 38 => "the title doesn't fit in its buffer",
    DescBufferTight = 39 => "the description doesn't fit in its buffer",
    /// The last operation finished without errors.
    NoError = 255 => "finished without errors",
}

impl ErrorKind {
    /// The numeric status code.
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Whether this is the success status, [`ErrorKind::NoError`].
    pub const fn is_ok(self) -> bool {
        matches!(self, ErrorKind::NoError)
    }

    /// Whether this status can only come out of parsing a container.
    ///
    /// Save-time statuses (`*BufferTight`) and the catch-alls aren't
    /// included.
    pub const fn is_load_error(self) -> bool {
        let code = self.code();
        code >= ErrorKind::NoFormatIdentifier.code() && code <= ErrorKind::IncorrectJendMarker.code()
    }
}

impl TryFrom<i32> for ErrorKind {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        ErrorKind::from_code(code).ok_or(code)
    }
}

impl From<ErrorKind> for i32 {
    fn from(kind: ErrorKind) -> i32 {
        kind.code()
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (code `{}`)", self.message(), self.code())
    }
}

impl core::error::Error for ErrorKind {}

#[cfg(test)]
mod tests {
    use super::ErrorKind;

    #[test]
    fn codes_are_unique_and_round_trip() {
        for (i, kind) in ErrorKind::ALL.iter().enumerate() {
            assert_eq!(ErrorKind::from_code(kind.code()), Some(*kind));

            for other in &ErrorKind::ALL[i + 1..] {
                assert_ne!(kind.code(), other.code(), "{kind:?} and {other:?}");
            }
        }
    }

    #[test]
    fn known_codes() {
        assert_eq!(ErrorKind::Uninitialised.code(), 0);
        assert_eq!(ErrorKind::IncorrectJendMarker.code(), 34);
        assert_eq!(ErrorKind::DescBufferTight.code(), 39);
        assert_eq!(ErrorKind::NoError.code(), 255);
        assert_eq!(ErrorKind::try_from(40), Err(40));
    }

    #[test]
    fn load_errors_exclude_save_errors() {
        assert!(ErrorKind::IncompleteHeader.is_load_error());
        assert!(ErrorKind::IncorrectJendMarker.is_load_error());
        assert!(!ErrorKind::PhotoBufferTight.is_load_error());
        assert!(!ErrorKind::Uninitialised.is_load_error());
        assert!(!ErrorKind::NoError.is_load_error());
    }
}
