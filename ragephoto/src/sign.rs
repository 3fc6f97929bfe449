//! Photo signatures.
//!
//! The games tag each photo with a 64-bit "sign" derived from the JPEG bytes.
//! It's stored inside the JSON metadata under the `"sign"` key, and photos
//! whose sign doesn't match their JPEG are rejected in-game.

use std::sync::Arc;

use ragephoto_types::{ErrorKind, PhotoFormat};

/// The fixed high bits of every signature.
const SIGNATURE_PREFIX: u64 = 0x0100_0000_0000_0000;

/// The JSON key holding the signature.
pub const SIGN_KEY: &str = "sign";

/// Jenkins' one-at-a-time hash, starting from `initial`.
///
/// Bytes are added as signed values, so anything above `0x7F` is
/// sign-extended first.
pub fn joaat(data: &[u8], initial: u32) -> u32 {
    let mut val: u32 = initial;

    for b in data {
        val = val.wrapping_add(*b as i8 as i32 as u32);
        val = val.wrapping_add(val << 10);
        val ^= val >> 6;
    }

    val = val.wrapping_add(val << 3);
    val ^= val >> 11;
    val.wrapping_add(val << 15)
}

/// The signature of a photo, as the given format computes it.
///
/// An empty photo has no signature, so this is `0` for one.
pub fn signature(photo: &[u8], format: PhotoFormat) -> u64 {
    if photo.is_empty() {
        log::debug!("No photo to sign.");
        return 0;
    }

    SIGNATURE_PREFIX | u64::from(joaat(photo, format.sign_initial()))
}

/// Writes `sign` into the `"sign"` key of a JSON object.
///
/// Key order is kept, and the output is compact.
pub(crate) fn with_sign(json: &str, sign: u64) -> Result<String, SignError> {
    let mut value: serde_json::Value = serde_json::from_str(json).map_err(|e| {
        log::error!("Photo JSON couldn't be parsed! err: {e}");
        SignError::Json(Arc::new(e))
    })?;

    let Some(object) = value.as_object_mut() else {
        log::error!("Photo JSON isn't an object, so it can't hold a signature.");
        return Err(SignError::NotAnObject);
    };

    object.insert(SIGN_KEY.into(), serde_json::Value::from(sign));

    serde_json::to_string(&value).map_err(|e| {
        log::error!("Photo JSON couldn't be written back! err: {e}");
        SignError::Json(Arc::new(e))
    })
}

/// A failure to update a photo's signature.
#[derive(Clone, Debug)]
pub enum SignError {
    /// No format is set, so there's no way to pick a signature seed.
    NoFormat,

    /// The JSON isn't valid.
    Json(
        // note: `Arc` allows us to impl `Clone`
        Arc<serde_json::Error>,
    ),

    /// The JSON is valid, but isn't an object.
    NotAnObject,

    /// The updated JSON couldn't be stored.
    Store(ErrorKind),
}

impl core::fmt::Display for SignError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SignError::NoFormat => {
                f.write_str("The photo has no format, so its signature can't be computed.")
            }
            SignError::Json(e) => write!(f, "The photo's JSON couldn't be parsed. err: {e}"),
            SignError::NotAnObject => {
                f.write_str("The photo's JSON must be an object to hold a signature.")
            }
            SignError::Store(e) => write!(f, "The updated JSON couldn't be stored. err: {e}"),
        }
    }
}

impl core::error::Error for SignError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            SignError::Json(e) => Some(e.as_ref()),
            SignError::Store(e) => Some(e),
            SignError::NoFormat | SignError::NotAnObject => None,
        }
    }
}

impl From<serde_json::Error> for SignError {
    fn from(value: serde_json::Error) -> Self {
        SignError::Json(value.into())
    }
}
