//! Metadata stripping and intake checks for local files.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use adwizard_core::config::{Dimensions, MediaPolicy};
use adwizard_core::error::ValidationError;
use adwizard_core::remote::UploadFile;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;
use tracing::debug;

/// Code attached to files below the minimum resolution.
pub const RESOLUTION_TOO_LOW: &str = "RESOLUTION_TOO_LOW";

/// Code attached to images that could not be decoded.
pub const UNREADABLE_IMAGE: &str = "UNREADABLE_IMAGE";

/// A file as picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// File name, used for MIME detection when `content_type` is absent.
    pub file_name: String,
    /// Declared MIME type, if the picker supplied one.
    pub content_type: Option<String>,
    /// Raw contents.
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Declared MIME type, or one guessed from the file name.
    #[must_use]
    pub fn mime(&self) -> String {
        self.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_owned()
        })
    }
}

/// A file ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedFile {
    /// File name as it will be uploaded.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// Contents, metadata-free for images.
    pub bytes: Arc<[u8]>,
    /// Pixel size for images.
    pub dimensions: Option<Dimensions>,
}

impl PreparedFile {
    /// Converts into the upload DTO.
    #[must_use]
    pub fn to_upload(&self) -> UploadFile {
        UploadFile {
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            bytes: Arc::clone(&self.bytes),
        }
    }
}

/// Failure to re-encode an image.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrivacyError {
    /// The bytes are not a decodable image.
    #[error("{file_name} could not be decoded: {reason}")]
    Decode {
        /// File concerned.
        file_name: String,
        /// Decoder message.
        reason: String,
    },

    /// The encoder failed.
    #[error("{file_name} could not be re-encoded: {reason}")]
    Encode {
        /// File concerned.
        file_name: String,
        /// Encoder message.
        reason: String,
    },
}

/// Output of a re-encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reencoded {
    /// New contents.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub content_type: String,
    /// Native pixel size.
    pub dimensions: Dimensions,
}

/// Rasterises an image and encodes it again, dropping everything but pixels.
pub trait ImageReencoder: Send + Sync {
    /// Re-encodes `bytes` at native dimensions.
    ///
    /// # Errors
    ///
    /// Returns `PrivacyError` when decoding or encoding fails.
    fn reencode(&self, file_name: &str, bytes: &[u8], quality: u8)
    -> Result<Reencoded, PrivacyError>;
}

/// Re-encodes every image as baseline JPEG.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegReencoder;

impl ImageReencoder for JpegReencoder {
    fn reencode(
        &self,
        file_name: &str,
        bytes: &[u8],
        quality: u8,
    ) -> Result<Reencoded, PrivacyError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| PrivacyError::Decode {
            file_name: file_name.to_owned(),
            reason: e.to_string(),
        })?;
        let dimensions = Dimensions::new(decoded.width(), decoded.height());
        let canvas = DynamicImage::ImageRgb8(decoded.to_rgb8());

        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        canvas
            .write_with_encoder(encoder)
            .map_err(|e| PrivacyError::Encode {
                file_name: file_name.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Reencoded {
            bytes: out.into_inner(),
            content_type: "image/jpeg".to_owned(),
            dimensions,
        })
    }
}

/// Strips embedded metadata from images by re-encoding them. Every image is
/// re-encoded; anything that is not an image passes through untouched.
///
/// # Errors
///
/// Returns `PrivacyError` when an image cannot be decoded or encoded.
pub fn privacy_strip(
    file: LocalFile,
    encoder: &dyn ImageReencoder,
    quality: u8,
) -> Result<PreparedFile, PrivacyError> {
    let mime = file.mime();
    if !mime.starts_with("image/") {
        debug!(file_name = %file.file_name, %mime, "non-image passes through");
        return Ok(PreparedFile {
            file_name: file.file_name,
            content_type: mime,
            bytes: file.bytes.into(),
            dimensions: None,
        });
    }

    let reencoded = encoder.reencode(&file.file_name, &file.bytes, quality)?;
    debug!(
        file_name = %file.file_name,
        before = file.bytes.len(),
        after = reencoded.bytes.len(),
        "image re-encoded"
    );
    Ok(PreparedFile {
        file_name: with_jpeg_extension(&file.file_name),
        content_type: reencoded.content_type,
        bytes: reencoded.bytes.into(),
        dimensions: Some(reencoded.dimensions),
    })
}

fn with_jpeg_extension(file_name: &str) -> String {
    Path::new(file_name)
        .with_extension("jpg")
        .to_string_lossy()
        .into_owned()
}

/// A file refused at intake, with a per-file diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRejection {
    /// Original file name.
    pub file_name: String,
    /// Machine-readable code.
    pub code: &'static str,
    /// Diagnostic naming the problem (and actual dimensions, when relevant).
    pub message: String,
}

impl MediaRejection {
    /// Field-scoped form for inline display.
    #[must_use]
    pub fn to_validation_error(&self) -> ValidationError {
        ValidationError::new("media", self.code, self.message.clone())
    }
}

/// Result of preparing a batch of picked files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeReport {
    /// Files ready for the media list, in pick order.
    pub accepted: Vec<PreparedFile>,
    /// Files refused, in pick order.
    pub rejected: Vec<MediaRejection>,
}

/// Strips metadata from every file and applies the resolution policy.
#[must_use]
pub fn prepare_files(
    files: Vec<LocalFile>,
    encoder: &dyn ImageReencoder,
    policy: &MediaPolicy,
) -> IntakeReport {
    let mut report = IntakeReport::default();
    for file in files {
        let file_name = file.file_name.clone();
        let prepared = match privacy_strip(file, encoder, policy.jpeg_quality) {
            Ok(prepared) => prepared,
            Err(err) => {
                report.rejected.push(MediaRejection {
                    file_name,
                    code: UNREADABLE_IMAGE,
                    message: err.to_string(),
                });
                continue;
            }
        };
        if let (Some(minimum), Some(actual)) = (policy.min_resolution, prepared.dimensions) {
            if !actual.covers(minimum) {
                report.rejected.push(MediaRejection {
                    message: format!(
                        "{file_name} is {actual} pixels; at least {minimum} is required"
                    ),
                    file_name,
                    code: RESOLUTION_TOO_LOW,
                });
                continue;
            }
        }
        report.accepted.push(prepared);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use adwizard_test_support::fixtures::{jpeg_with_exif, png_image};

    #[test]
    fn test_privacy_strip_drops_exif_segment() {
        // Arrange
        let original = jpeg_with_exif(1024, 768);
        assert!(original.windows(4).any(|w| w == b"Exif"));
        let file = LocalFile {
            file_name: "car.jpeg".into(),
            content_type: None,
            bytes: original,
        };

        // Act
        let prepared = privacy_strip(file, &JpegReencoder, 92).unwrap();

        // Assert
        assert!(!prepared.bytes.windows(4).any(|w| w == b"Exif"));
        assert_eq!(prepared.content_type, "image/jpeg");
        assert_eq!(prepared.file_name, "car.jpg");
        assert_eq!(prepared.dimensions, Some(Dimensions::new(1024, 768)));
    }

    #[test]
    fn test_privacy_strip_reencodes_png_as_jpeg() {
        let file = LocalFile {
            file_name: "plan.png".into(),
            content_type: Some("image/png".into()),
            bytes: png_image(900, 700),
        };

        let prepared = privacy_strip(file, &JpegReencoder, 92).unwrap();

        assert_eq!(prepared.content_type, "image/jpeg");
        assert_eq!(&prepared.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_privacy_strip_passes_non_images_through() {
        let file = LocalFile {
            file_name: "floorplan.pdf".into(),
            content_type: None,
            bytes: b"%PDF-1.7".to_vec(),
        };

        let prepared = privacy_strip(file, &JpegReencoder, 92).unwrap();

        assert_eq!(prepared.content_type, "application/pdf");
        assert_eq!(&*prepared.bytes, b"%PDF-1.7");
        assert_eq!(prepared.dimensions, None);
    }

    #[test]
    fn test_prepare_files_rejects_low_resolution_with_actual_dimensions() {
        // Arrange
        let policy = MediaPolicy {
            min_resolution: Some(Dimensions::new(800, 600)),
            ..MediaPolicy::default()
        };
        let files = vec![
            LocalFile {
                file_name: "small.jpg".into(),
                content_type: None,
                bytes: jpeg_with_exif(640, 480),
            },
            LocalFile {
                file_name: "large.jpg".into(),
                content_type: None,
                bytes: jpeg_with_exif(1600, 1200),
            },
        ];

        // Act
        let report = prepare_files(files, &JpegReencoder, &policy);

        // Assert
        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        let rejection = &report.rejected[0];
        assert_eq!(rejection.code, RESOLUTION_TOO_LOW);
        assert!(rejection.message.contains("640x480"));
        assert!(rejection.message.contains("800x600"));
    }

    #[test]
    fn test_prepare_files_reports_undecodable_images() {
        let files = vec![LocalFile {
            file_name: "broken.jpg".into(),
            content_type: None,
            bytes: vec![0xFF, 0xD8, 0x00],
        }];

        let report = prepare_files(files, &JpegReencoder, &MediaPolicy::default());

        assert!(report.accepted.is_empty());
        assert_eq!(report.rejected[0].code, UNREADABLE_IMAGE);
        assert_eq!(report.rejected[0].to_validation_error().field, "media");
    }
}
