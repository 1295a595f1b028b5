//! Registry of the container formats the store understands.
//!
//! FileMaker identifies the representation of a container value with a
//! classic Mac OS style 4-character type code. Every other part of the crate
//! goes through [`Format`] to translate between those codes, the names
//! callers use, MIME types and file extensions.

use std::fmt;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
pub const DEFAULT_EXTENSION: &str = "bin";

/// A container format, either one of the registered codes or a raw code
/// the caller passed in that we hand to the store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Format {
    Png,
    Jpeg,
    Gif,
    Tiff,
    #[default]
    Pdf,
    File,
    Unrecognized(String),
}

/// Order in which formats are tried when nothing is known about the
/// stored content. Most common first.
pub const PROBE_ORDER: [Format; 5] = [
    Format::Jpeg,
    Format::Png,
    Format::Pdf,
    Format::Gif,
    Format::Tiff,
];

pub const KNOWN_FORMATS: [Format; 6] = [
    Format::Png,
    Format::Jpeg,
    Format::Gif,
    Format::Tiff,
    Format::Pdf,
    Format::File,
];

impl Format {
    /// Resolve a caller supplied format name or type code.
    ///
    /// Matching is case-insensitive and the input is never trimmed, since
    /// `PDF ` carries a significant trailing space. Anything else is passed
    /// through unchanged.
    pub fn normalize(input: &str) -> Self {
        match input.to_ascii_uppercase().as_str() {
            "PNG" | "PNGF" => Format::Png,
            "JPEG" | "JPG" => Format::Jpeg,
            "GIF" | "GIFF" => Format::Gif,
            "TIFF" | "TIF" => Format::Tiff,
            "PDF" | "PDF " => Format::Pdf,
            "FILE" => Format::File,
            _ => Format::Unrecognized(input.to_string()),
        }
    }

    /// Like [`Format::normalize`], falling back to the default (PDF) when
    /// the caller didn't ask for anything.
    pub fn normalize_or_default(input: Option<&str>) -> Self {
        match input {
            Some(s) if !s.is_empty() => Self::normalize(s),
            _ => Self::default(),
        }
    }

    /// Map a stored MIME type back to a format. Only the five typed formats
    /// are recognized; `FILE` content has no MIME type of its own.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Format::Jpeg),
            "image/png" => Some(Format::Png),
            "image/gif" => Some(Format::Gif),
            "image/tiff" => Some(Format::Tiff),
            "application/pdf" => Some(Format::Pdf),
            _ => None,
        }
    }

    /// Infer a format from the trailing extension of a container reference
    /// (usually the filename the content was stored under).
    pub fn from_reference(reference: &str) -> Option<Self> {
        let lower = reference.trim_end().to_ascii_lowercase();
        let (_, ext) = lower.rsplit_once('.')?;
        match ext {
            "jpg" | "jpeg" => Some(Format::Jpeg),
            "png" => Some(Format::Png),
            "gif" => Some(Format::Gif),
            "pdf" => Some(Format::Pdf),
            "tiff" | "tif" => Some(Format::Tiff),
            _ => None,
        }
    }

    pub fn canonical_name(&self) -> &str {
        match self {
            Format::Png => "PNG",
            Format::Jpeg => "JPEG",
            Format::Gif => "GIF",
            Format::Tiff => "TIFF",
            Format::Pdf => "PDF",
            Format::File => "FILE",
            Format::Unrecognized(raw) => raw,
        }
    }

    /// The 4-character type code passed to `GetAs`.
    pub fn dialect_code(&self) -> &str {
        match self {
            Format::Png => "PNGf",
            Format::Jpeg => "JPEG",
            Format::Gif => "GIFf",
            Format::Tiff => "TIFF",
            // Trailing space is part of the code
            Format::Pdf => "PDF ",
            Format::File => "FILE",
            Format::Unrecognized(raw) => raw,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Png => "image/png",
            Format::Jpeg => "image/jpeg",
            Format::Gif => "image/gif",
            Format::Tiff => "image/tiff",
            Format::Pdf => "application/pdf",
            Format::File | Format::Unrecognized(_) => DEFAULT_MIME_TYPE,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Jpeg => "jpg",
            Format::Gif => "gif",
            Format::Tiff => "tiff",
            Format::Pdf => "pdf",
            Format::File | Format::Unrecognized(_) => DEFAULT_EXTENSION,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Format::Unrecognized(_))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dialect_code())
    }
}

/// MIME type for content stored under `filename`, if its extension is one
/// we know about.
pub fn mime_for_filename(filename: &str) -> &'static str {
    Format::from_reference(filename)
        .map(|f| f.mime_type())
        .unwrap_or(DEFAULT_MIME_TYPE)
}
