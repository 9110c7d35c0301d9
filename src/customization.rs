//! Customizations
//!
//! The artifact attached to a customized position: an uploaded logo file or
//! a line of styled text. Artifacts are validated at construction, so a
//! stored [`Customization`] always holds exactly one valid artifact kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::positions::Method;

/// Maximum accepted logo upload size in bytes.
pub const MAX_LOGO_BYTES: u64 = 5 * 1024 * 1024;

/// Maximum accepted customization text length in characters.
pub const MAX_TEXT_CHARS: usize = 60;

const ALLOWED_MIME_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/svg+xml",
    "application/pdf",
    "application/postscript",
];

const ALLOWED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "svg", "eps", "ai", "pdf"];

/// Validation failures for customization artifacts.
///
/// These surface as field-level errors in the UI; no state is mutated when
/// one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CustomizationError {
    /// The uploaded file is neither an accepted MIME type nor an accepted
    /// extension.
    #[error("unsupported logo file type: {0}")]
    UnsupportedFileType(String),

    /// The uploaded file exceeds [`MAX_LOGO_BYTES`].
    #[error("logo file is {0} bytes; the limit is {MAX_LOGO_BYTES}")]
    FileTooLarge(u64),

    /// The customization text is empty after trimming.
    #[error("customization text is empty")]
    EmptyText,

    /// The customization text exceeds [`MAX_TEXT_CHARS`].
    #[error("customization text is {0} characters; the limit is {MAX_TEXT_CHARS}")]
    TextTooLong(usize),
}

/// An uploaded logo file awaiting validation: the metadata known before the
/// file contents have been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoFile<'a> {
    /// Original file name.
    pub name: &'a str,
    /// Declared MIME type (may be empty).
    pub mime: &'a str,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Validate an upload's type and size before its contents are read.
///
/// Accepts jpeg, png, svg and pdf by MIME type, and ai/eps (plus the same
/// set) by extension.
///
/// # Errors
///
/// Returns [`CustomizationError::UnsupportedFileType`] or
/// [`CustomizationError::FileTooLarge`].
pub fn validate_logo_file(file: &LogoFile<'_>) -> Result<(), CustomizationError> {
    let extension = file
        .name
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mime_ok = ALLOWED_MIME_TYPES.contains(&file.mime);
    let extension_ok = ALLOWED_EXTENSIONS.contains(&extension.as_str());

    if !mime_ok && !extension_ok {
        return Err(CustomizationError::UnsupportedFileType(
            file.name.to_string(),
        ));
    }

    if file.size_bytes > MAX_LOGO_BYTES {
        return Err(CustomizationError::FileTooLarge(file.size_bytes));
    }

    Ok(())
}

/// A validated, fully read logo upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoUpload {
    /// Original file name, for display.
    pub name: String,
    /// MIME type as declared at upload time.
    pub mime: String,
    /// Encoded file payload, opaque to the engine.
    pub data: String,
}

/// Styling for a text artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font family name.
    pub font: String,
    /// Point size.
    #[serde(rename = "fontSize")]
    pub font_size: u32,
    /// Fill colour.
    #[serde(rename = "textColor")]
    pub fill: String,
    /// Outline colour.
    #[serde(rename = "strokeColor")]
    pub outline: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: "Arial".to_string(),
            font_size: 24,
            fill: "#1f2937".to_string(),
            outline: "transparent".to_string(),
        }
    }
}

/// The artifact applied at a position: exactly one kind is ever populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Artifact {
    /// An uploaded logo image.
    Logo {
        /// The validated upload.
        logo: LogoUpload,
    },
    /// A line of styled text.
    Text {
        /// The text itself, trimmed, 1 to [`MAX_TEXT_CHARS`] characters.
        text: String,
        /// How the text is rendered.
        #[serde(flatten)]
        style: TextStyle,
    },
}

impl Artifact {
    /// Build a logo artifact, validating the file's type and size.
    ///
    /// `data` is the encoded payload produced by the caller's file read,
    /// which must have completed before this is called.
    ///
    /// # Errors
    ///
    /// Returns a [`CustomizationError`] if the file fails validation.
    pub fn logo(file: &LogoFile<'_>, data: impl Into<String>) -> Result<Self, CustomizationError> {
        validate_logo_file(file)?;

        Ok(Self::Logo {
            logo: LogoUpload {
                name: file.name.to_string(),
                mime: file.mime.to_string(),
                data: data.into(),
            },
        })
    }

    /// Build a text artifact, trimming and validating the text.
    ///
    /// # Errors
    ///
    /// Returns [`CustomizationError::EmptyText`] or
    /// [`CustomizationError::TextTooLong`].
    pub fn text(text: &str, style: TextStyle) -> Result<Self, CustomizationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(CustomizationError::EmptyText);
        }

        let length = trimmed.chars().count();
        if length > MAX_TEXT_CHARS {
            return Err(CustomizationError::TextTooLong(length));
        }

        Ok(Self::Text {
            text: trimmed.to_string(),
            style,
        })
    }

    /// Whether this artifact is an uploaded image (drives the one-time
    /// logo-setup fee).
    #[must_use]
    pub fn is_logo(&self) -> bool {
        matches!(self, Self::Logo { .. })
    }
}

/// One print/embroidery placement with its artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    /// The position this applies to.
    pub position: String,
    /// The application method the cost lookup uses.
    pub method: Method,
    /// The artifact to apply.
    #[serde(flatten)]
    pub artifact: Artifact,
}
