//! File media kinds and LDAC material types.
//!
//! # Responsibility
//! - Classify files by extension into media kinds and MIME types.
//! - Map media kinds to `ldac:materialType` terms.
//!
//! # Invariants
//! - Unknown extensions are `application/octet-stream` and `ldac:Annotation`.

use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

pub const PRIMARY_MATERIAL: &str = "ldac:PrimaryMaterial";
pub const ANNOTATION: &str = "ldac:Annotation";
const MATERIAL_TYPES_SET: &str = "ldac:MaterialTypes";

/// Broad media class of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
    Image,
    Other,
}

impl MediaKind {
    /// Classifies a lowercased extension without the dot.
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            "mp4" | "mov" | "avi" | "mpg" | "mpeg" | "mts" | "m4v" | "webm" | "mkv" | "wmv" => {
                Self::Video
            }
            "wav" | "mp3" | "m4a" | "aif" | "aiff" | "flac" | "ogg" | "wma" | "aac" => Self::Audio,
            "jpg" | "jpeg" | "png" | "gif" | "tif" | "tiff" | "bmp" | "webp" | "heic" => {
                Self::Image
            }
            _ => Self::Other,
        }
    }

    /// Schema.org media type added next to `File`.
    pub fn schema_type(self) -> Option<&'static str> {
        match self {
            Self::Video => Some("VideoObject"),
            Self::Audio => Some("AudioObject"),
            Self::Image => Some("ImageObject"),
            Self::Other => None,
        }
    }

    pub fn material_type(self) -> &'static str {
        match self {
            Self::Video | Self::Audio | Self::Image => PRIMARY_MATERIAL,
            Self::Other => ANNOTATION,
        }
    }
}

/// MIME type for a lowercased extension.
pub fn mime_type(extension: &str) -> &'static str {
    match extension {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "aif" | "aiff" => "audio/aiff",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mpg" | "mpeg" => "video/mpeg",
        "webm" => "video/webm",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "xml" | "eaf" | "imdi" | "cmdi" => "application/xml",
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "odt" => "application/vnd.oasis.opendocument.text",
        "rtf" => "application/rtf",
        "session" | "person" | "sprj" | "meta" => "application/lameta+xml",
        _ => "application/octet-stream",
    }
}

/// Definitions for the material terms in `used`; empty when unused.
pub fn create_ldac_material_type_definitions(used: &BTreeSet<String>) -> Vec<Map<String, Value>> {
    if used.is_empty() {
        return Vec::new();
    }
    let mut set = Map::new();
    set.insert("@id".into(), json!(MATERIAL_TYPES_SET));
    set.insert("@type".into(), json!("DefinedTermSet"));
    set.insert("name".into(), json!("Material Types"));
    let mut definitions = vec![set];

    let terms = [
        (
            PRIMARY_MATERIAL,
            "Primary Material",
            "The object of study, such as a literary work, film, or recording of natural discourse.",
        ),
        (
            ANNOTATION,
            "Annotation",
            "The resource includes material that adds information to some other linguistic record.",
        ),
    ];
    for (id, name, description) in terms.into_iter().filter(|(id, ..)| used.contains(*id)) {
        let mut term = Map::new();
        term.insert("@id".into(), json!(id));
        term.insert("@type".into(), json!("DefinedTerm"));
        term.insert("name".into(), json!(name));
        term.insert("description".into(), json!(description));
        term.insert("inDefinedTermSet".into(), json!({ "@id": MATERIAL_TYPES_SET }));
        definitions.push(term);
    }
    definitions
}
