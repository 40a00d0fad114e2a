//! Adwizard Media — local photo handling before and after upload.
//!
//! Photos are re-encoded to drop embedded metadata, optionally checked
//! against a minimum resolution, and kept in an ordered list with exactly
//! one cover whenever the list is non-empty.

pub mod domain;
pub mod privacy;

pub use domain::{MediaError, MediaItem, MediaList, PreviewHandle};
pub use privacy::{
    ImageReencoder, IntakeReport, JpegReencoder, LocalFile, MediaRejection, PreparedFile,
    PrivacyError, prepare_files, privacy_strip,
};
