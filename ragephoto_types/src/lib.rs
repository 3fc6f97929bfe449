//! # `ragephoto_types`
//!
//! Plain types shared by [`ragephoto`](https://docs.rs/ragephoto): the photo
//! formats, their constants, and the status codes reported by the codec.

#![forbid(unsafe_code)]

pub mod error;
pub mod format;

pub use error::ErrorKind;
pub use format::PhotoFormat;
