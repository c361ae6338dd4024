//! Static HTML preview of an exported crate.
//!
//! # Responsibility
//! - Render `ro-crate-preview.html` from a finished JSON-LD document.
//! - Nest entities by `@id` path and hide vocabulary plumbing.
//!
//! # Invariants
//! - Rendering never fails; malformed input yields a sparse page.
//! - No `file://` URL is ever written into the page.
//! - Every text value is HTML-escaped.

use crate::graph::{has_type, Entity, METADATA_DESCRIPTOR_ID};
use crate::iri::{is_ldac_identifier, ROOT_ID, UNKNOWN_TERM_ID};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write;

const LDAC_TERMS_BASE: &str = "https://w3id.org/ldac/terms#";
const GLOTTOLOG_ISO_BASE: &str = "https://glottolog.org/resource/languoid/iso/";
const CUSTOM_GENRE_TERM_SET: &str = "#CustomGenreTerms";

const FILE_TYPES: [&str; 4] = ["File", "ImageObject", "AudioObject", "VideoObject"];
const FILE_FIELDS: [&str; 2] = ["encodingFormat", "contentSize"];
const ROOT_FIELDS: [&str; 7] = [
    "description",
    "license",
    "holdingArchive",
    "ldac:subjectLanguage",
    "inLanguage",
    "contentLocation",
    "location",
];
const EXCLUDED_FIELDS: [&str; 6] = [
    "name",
    "conformsTo",
    "datePublished",
    "dateCreated",
    "dateModified",
    "publisher",
];
const VOCABULARY_TYPES: [&str; 5] = [
    "DefinedTerm",
    "DefinedTermSet",
    "Class",
    "DataReuseLicense",
    "ldac:DataReuseLicense",
];
const KNOWN_FOLDERS: [&str; 6] = [
    "Sessions",
    "People",
    "OtherDocs",
    "DescriptionDocuments",
    "OtherDocuments",
    "Description",
];

const STYLE: &str = r#"
    :root { --color-primary: #4f7c0c; --color-primary-content: #568115; --color-background: #f8ffed; --color-white: white; --color-text: #333; --color-text-muted: #666; --color-border: #ddd; }
    body { font-family: Arial, sans-serif; max-width: 1200px; margin: 0 auto; padding: 20px; line-height: 1.6; background-color: var(--color-background); }
    a { color: var(--color-primary); text-decoration: underline; }
    .main-content { overflow: auto; display: flex; flex-direction: column; gap: 20px; }
    .entity { border: 1px solid var(--color-border); border-radius: 5px; background-color: var(--color-white); position: relative; box-sizing: border-box; padding: 20px; }
    .entity.child .entity-header { display: none; }
    .entity-header { display: flex; justify-content: space-between; align-items: flex-start; margin-bottom: 10px; }
    .entity-id { font-weight: bold; background-color: var(--color-primary-content); color: var(--color-white); padding: 2px 8px; border-radius: 3px; font-size: 0.9em; display: inline-block; flex: 1; }
    .entity-types { position: absolute; bottom: 10px; right: 10px; display: flex; flex-wrap: wrap; gap: 5px; }
    .entity-type { color: var(--color-primary-content); padding: 2px 8px; font-size: 0.9em; }
    .property { margin: 8px 0; }
    .property-name { font-weight: bold; color: var(--color-text); }
    .property-value { color: var(--color-text-muted); margin-left: 10px; }
    .entity-list { list-style-type: disc; margin-left: 20px; padding-left: 0; }
    .image-thumbnail { max-width: 200px; max-height: 200px; border: 1px solid var(--color-border); border-radius: 5px; margin: 10px 0; display: block; }
    .media-player { max-width: 400px; width: 100%; border: 1px solid var(--color-border); border-radius: 5px; margin: 10px 0; display: block; }
    .entity-children-container { display: flex; flex-wrap: wrap; gap: 20px; align-items: flex-start; padding: 0 30px; }
    .entity-children-container .entity { flex: 0 0 auto; min-width: 250px; }
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Media {
    Image,
    Audio,
    Video,
}

struct Page<'a> {
    index: HashMap<&'a str, &'a Entity>,
    children: HashMap<&'a str, Vec<&'a Entity>>,
    sessions: Vec<&'a Entity>,
    people: Vec<&'a Entity>,
}

/// Renders the preview page for `document`.
pub fn generate_rocrate_html(document: &Value) -> String {
    let graph: Vec<&Entity> = document
        .get("@graph")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default();
    let index: HashMap<&str, &Entity> = graph
        .iter()
        .filter_map(|entity| Some((id_of(entity)?, *entity)))
        .collect();
    let visible: Vec<&Entity> = graph
        .iter()
        .copied()
        .filter(|entity| id_of(entity).is_some() && !is_suppressed(entity))
        .collect();

    let mut roots = Vec::new();
    let mut children: HashMap<&str, Vec<&Entity>> = HashMap::new();
    for entity in &visible {
        let id = id_of(entity).unwrap_or_default();
        let parent = visible
            .iter()
            .filter_map(|candidate| id_of(candidate))
            .find(|parent_id| is_direct_child(parent_id, id));
        match parent {
            Some(parent_id) => children.entry(parent_id).or_default().push(*entity),
            None => roots.push(*entity),
        }
    }
    roots.sort_by(|a, b| {
        (root_priority(a), id_of(a).unwrap_or_default())
            .cmp(&(root_priority(b), id_of(b).unwrap_or_default()))
    });

    let page = Page {
        index,
        children,
        sessions: visible
            .iter()
            .copied()
            .filter(|entity| has_type(entity, "Event") && id_of(entity) != Some(ROOT_ID))
            .collect(),
        people: visible
            .iter()
            .copied()
            .filter(|entity| has_type(entity, "Person") && id_of(entity) != Some(ROOT_ID))
            .collect(),
    };

    let root_name = page
        .index
        .get(ROOT_ID)
        .and_then(|root| root.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("Research Object");

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
         <title>RO-Crate Preview - {title}</title><style>{STYLE}</style></head><body>\
         <div class=\"header\"><h1>{title}</h1><p>This dataset was created by \
         <a href=\"https://github.com/onset/lameta\">lameta</a>. This page is a simplified, \
         human-readable view of the <a href=\"https://www.researchobject.org/ro-crate/\" \
         target=\"_blank\" rel=\"noopener noreferrer\">ro-crate</a> metadata found in the \
         accompanying <a href=\"ro-crate-metadata.json\">ro-crate-metadata.json</a> file, which \
         conforms to the <a href=\"https://w3id.org/ldac/profile\" target=\"_blank\" \
         rel=\"noopener noreferrer\">LDAC Profile</a>.</p></div><div class=\"main-content\">",
        title = escape(&display_text(root_name))
    );
    for root in roots {
        page.render_tree(root, false, &mut html);
    }
    html.push_str("</div></body></html>");
    html
}

impl Page<'_> {
    fn render_tree(&self, entity: &Entity, is_child: bool, out: &mut String) {
        self.render_entity(entity, is_child, out);
        let id = id_of(entity).unwrap_or_default();
        let Some(children) = self.children.get(id) else {
            return;
        };
        out.push_str("<div class=\"entity-children-container\">");
        for child in children {
            self.render_tree(child, true, out);
        }
        out.push_str("</div>");
    }

    fn render_entity(&self, entity: &Entity, is_child: bool, out: &mut String) {
        let id = id_of(entity).unwrap_or_default();
        let media = media_kind(entity);
        let mut classes = String::from("entity");
        if is_child {
            classes.push_str(" child");
        }
        match media {
            Some(Media::Image) => classes.push_str(" image-entity"),
            Some(_) => classes.push_str(" media-entity"),
            None => {}
        }

        let _ = write!(
            out,
            "<div class=\"{classes}\" id=\"{}\"><div class=\"entity-header\"><div class=\"entity-id\">{}</div></div>",
            anchor_id(id),
            escape(&display_path(id))
        );
        out.push_str("<div class=\"entity-types\">");
        for kind in types_of(entity) {
            let _ = write!(out, "<span class=\"entity-type\">{}</span>", escape(&display_text(kind)));
        }
        out.push_str("</div>");
        if let Some(name) = entity.get("name").and_then(Value::as_str) {
            let _ = write!(out, "<h3>{}</h3>", escape(&display_text(name)));
        }

        if let Some(media) = media {
            let src = escape(&display_path(id));
            let format = entity
                .get("encodingFormat")
                .and_then(Value::as_str)
                .unwrap_or_default();
            match media {
                Media::Image => {
                    let _ = write!(
                        out,
                        "<img src=\"{src}\" alt=\"Image: {}\" class=\"image-thumbnail\">",
                        escape(&display_text(
                            entity.get("name").and_then(Value::as_str).unwrap_or(id)
                        ))
                    );
                }
                Media::Audio | Media::Video => {
                    let tag = if media == Media::Audio { "audio" } else { "video" };
                    let _ = write!(
                        out,
                        "<{tag} controls class=\"media-player\"><source src=\"{src}\" type=\"{}\">\
                         Your browser does not support the {tag} tag.</{tag}>",
                        escape(&display_text(format))
                    );
                }
            }
        }

        for (key, value) in entity {
            if !self.shows_property(entity, key) {
                continue;
            }
            let rendered = if key == "contentSize" {
                value.as_u64().map(format_size)
            } else {
                self.render_value(value)
            };
            let Some(rendered) = rendered else {
                continue;
            };
            let _ = write!(
                out,
                "<div class=\"property\"><span class=\"property-name\">{}:</span> <span class=\"property-value\">{rendered}</span></div>",
                escape(&display_text(&format_label(key)))
            );
        }

        if id == ROOT_ID {
            self.render_entity_list("Sessions", &self.sessions, out);
            self.render_entity_list("People", &self.people, out);
        }
        out.push_str("</div>");
    }

    fn shows_property(&self, entity: &Entity, key: &str) -> bool {
        if key.starts_with('@') {
            return false;
        }
        if is_file_like(entity) {
            return FILE_FIELDS.contains(&key);
        }
        if id_of(entity) == Some(ROOT_ID) {
            return ROOT_FIELDS.contains(&key);
        }
        !EXCLUDED_FIELDS.contains(&key)
    }

    fn render_entity_list(&self, title: &str, entities: &[&Entity], out: &mut String) {
        if entities.is_empty() {
            return;
        }
        let _ = write!(
            out,
            "<div class=\"property\"><span class=\"property-name\">{title}:</span><div class=\"property-value\"><ul class=\"entity-list\">"
        );
        for entity in entities {
            let id = id_of(entity).unwrap_or_default();
            let name = entity.get("name").and_then(Value::as_str).unwrap_or(id);
            let _ = write!(
                out,
                "<li><a href=\"#{}\">{}</a></li>",
                anchor_id(id),
                escape(&display_text(name))
            );
        }
        out.push_str("</ul></div></div>");
    }

    /// Rendered value, or `None` when nothing displayable remains.
    fn render_value(&self, value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| self.render_value(item))
                    .collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
            Value::Object(object) => match object.get("@id").and_then(Value::as_str) {
                Some(id) => self.render_reference(id),
                None => Some(format!(
                    "<pre>{}</pre>",
                    escape(
                        &serde_json::to_string_pretty(&scrub_file_urls(value)).unwrap_or_default()
                    )
                )),
            },
            Value::String(text) if text == UNKNOWN_TERM_ID => None,
            Value::String(text) => Some(escape(&display_text(text))),
            other => Some(escape(&other.to_string())),
        }
    }

    fn render_reference(&self, id: &str) -> Option<String> {
        if id == UNKNOWN_TERM_ID {
            return None;
        }
        let target = self.index.get(id);
        let name = target
            .and_then(|entity| entity.get("name"))
            .and_then(Value::as_str);

        if is_ldac_identifier(id) {
            let term = id
                .strip_prefix("ldac:")
                .or_else(|| id.strip_prefix(LDAC_TERMS_BASE))
                .unwrap_or(id);
            return Some(external_link(
                &format!("{LDAC_TERMS_BASE}{term}"),
                name.unwrap_or(term),
            ));
        }
        if let Some(language) = target.filter(|entity| has_type(entity, "Language")) {
            let code = language
                .get("code")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Some(external_link(
                &format!("{GLOTTOLOG_ISO_BASE}{code}"),
                name.unwrap_or(code),
            ));
        }
        if target.is_some_and(|entity| is_suppressed(entity)) {
            return Some(escape(&display_text(name.unwrap_or(id))));
        }
        Some(format!(
            "<a href=\"#{}\">{}</a>",
            anchor_id(id),
            escape(&display_path(&display_text(name.unwrap_or(id))))
        ))
    }
}

fn external_link(href: &str, text: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
        escape(href),
        escape(&display_text(text))
    )
}

fn id_of(entity: &Entity) -> Option<&str> {
    entity.get("@id").and_then(Value::as_str)
}

fn types_of(entity: &Entity) -> Vec<&str> {
    match entity.get("@type") {
        Some(Value::String(kind)) => vec![kind.as_str()],
        Some(Value::Array(kinds)) => kinds.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn is_suppressed(entity: &Entity) -> bool {
    let id = id_of(entity).unwrap_or_default();
    if id == METADATA_DESCRIPTOR_ID || id == CUSTOM_GENRE_TERM_SET || id == UNKNOWN_TERM_ID {
        return true;
    }
    if has_type(entity, "Language") {
        return true;
    }
    is_ldac_identifier(id) && VOCABULARY_TYPES.iter().any(|kind| has_type(entity, kind))
}

fn is_file_like(entity: &Entity) -> bool {
    FILE_TYPES.iter().any(|kind| has_type(entity, kind))
}

fn media_kind(entity: &Entity) -> Option<Media> {
    let format = entity
        .get("encodingFormat")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if has_type(entity, "ImageObject") || format.starts_with("image/") {
        Some(Media::Image)
    } else if has_type(entity, "VideoObject") || format.starts_with("video/") {
        Some(Media::Video)
    } else if has_type(entity, "AudioObject") || format.starts_with("audio/") {
        Some(Media::Audio)
    } else {
        None
    }
}

fn root_priority(entity: &Entity) -> u8 {
    if id_of(entity) == Some(ROOT_ID) || has_type(entity, "Dataset") {
        0
    } else if has_type(entity, "Event") {
        1
    } else if has_type(entity, "Person") {
        2
    } else {
        3
    }
}

/// True when `child_id` sits one path segment below `parent_id`.
fn is_direct_child(parent_id: &str, child_id: &str) -> bool {
    if parent_id == child_id {
        return false;
    }
    let Some(remainder) = child_id.strip_prefix(parent_id) else {
        return false;
    };
    let segment = if parent_id.ends_with('/') {
        remainder
    } else {
        match remainder.strip_prefix('/') {
            Some(segment) => segment,
            None => return false,
        }
    };
    !segment.is_empty() && !segment.contains('/')
}

/// `entity_` plus the id with every non-alphanumeric character as `_`.
pub fn anchor_id(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("entity_{cleaned}")
}

/// Path shown for a file id; `file://` URLs become crate-relative.
pub fn display_path(id: &str) -> String {
    let Some(rest) = id.strip_prefix("file://") else {
        return id.replace("%20", " ");
    };
    let decoded = urlencoding::decode(rest)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| rest.to_string());
    let segments: Vec<&str> = decoded.split(['/', '\\']).collect();
    if let Some(start) = segments
        .iter()
        .position(|segment| KNOWN_FOLDERS.contains(segment))
    {
        return segments[start..].join("/");
    }
    segments
        .iter()
        .rev()
        .find(|segment| !segment.is_empty())
        .map_or_else(String::new, |segment| segment.to_string())
}

/// Free text with every `file://` URL replaced by its display path.
fn display_text(text: &str) -> String {
    if !text.contains("file://") {
        return text.to_string();
    }
    if text.starts_with("file://") && !text.contains(char::is_whitespace) {
        return display_path(text);
    }
    let shown: Vec<String> = text
        .split(' ')
        .map(|word| match word.find("file://") {
            Some(at) => format!("{}{}", &word[..at], display_path(&word[at..])),
            None => word.to_string(),
        })
        .collect();
    // A second URL inside one word is stripped outright.
    shown.join(" ").replace("file://", "")
}

fn scrub_file_urls(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(display_text(text)),
        Value::Array(items) => Value::Array(items.iter().map(scrub_file_urls).collect()),
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, item)| (display_text(key), scrub_file_urls(item)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// `encodingFormat` -> `Encoding Format`, `ldac:subjectLanguage` -> `Subject Language`.
pub fn format_label(key: &str) -> String {
    let bare = key.rsplit(':').next().unwrap_or(key);
    let mut label = String::new();
    for (index, c) in bare.chars().enumerate() {
        if index == 0 {
            label.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            label.push(' ');
            label.push(c);
        } else {
            label.push(c);
        }
    }
    label
}

/// Byte count as `B`, `KB` or `MB`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let size = bytes as f64;
    let (value, unit) = if size < KB {
        return format!("{bytes} B");
    } else if size < KB * KB {
        (size / KB, "KB")
    } else {
        (size / (KB * KB), "MB")
    };
    let rounded = format!("{value:.1}");
    let trimmed = rounded.strip_suffix(".0").unwrap_or(&rounded);
    format!("{trimmed} {unit}")
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_path_strips_file_urls() {
        assert_eq!(
            display_path("file:///C:/dev/lameta%20projects/Doondo/People/Person%20Name/Photo.JPG"),
            "People/Person Name/Photo.JPG"
        );
        assert_eq!(display_path("file:///some/unknown/path/image.jpg"), "image.jpg");
        assert_eq!(
            display_path("Sessions/Test%20Session/a.mp3"),
            "Sessions/Test Session/a.mp3"
        );
    }

    #[test]
    fn labels_sizes_and_anchors() {
        assert_eq!(format_label("encodingFormat"), "Encoding Format");
        assert_eq!(format_label("ldac:subjectLanguage"), "Subject Language");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3 MB");
        assert_eq!(anchor_id("#publisher-unknown"), "entity__publisher_unknown");
    }

    #[test]
    fn direct_children_by_path() {
        assert!(is_direct_child("People/Awi/", "People/Awi/photo.jpg"));
        assert!(!is_direct_child("People/", "People/Awi/photo.jpg"));
        assert!(is_direct_child("Sessions/ETR009", "Sessions/ETR009/a.wav"));
        assert!(!is_direct_child("Sessions/ETR", "Sessions/ETR009/a.wav"));
    }

    #[test]
    fn renders_external_links_and_drops_unknown_terms() {
        let document = json!({
            "@graph": [
                {"@id": "./", "@type": ["Dataset"], "name": "Edolo",
                 "ldac:subjectLanguage": [{"@id": "#language_etr"}]},
                {"@id": "#session-a", "@type": ["Dataset", "Event"], "name": "A",
                 "ldac:linguisticGenre": [{"@id": "ldac:Narrative"}],
                 "ldac:participant": [{"@id": "tag:lameta/unknown"}]},
                {"@id": "ldac:Narrative", "@type": "DefinedTerm", "name": "Narrative"},
                {"@id": "tag:lameta/unknown", "@type": "DefinedTerm", "name": "Unknown"},
                {"@id": "#language_etr", "@type": "Language", "code": "etr", "name": "Edolo"},
                {"@id": "ro-crate-metadata.json", "@type": "CreativeWork"}
            ]
        });
        let html = generate_rocrate_html(&document);
        assert!(html.contains("href=\"https://w3id.org/ldac/terms#Narrative\""));
        assert!(html.contains("href=\"https://glottolog.org/resource/languoid/iso/etr\""));
        assert!(html.contains("rel=\"noopener noreferrer\""));
        assert!(!html.contains("entity_tag_lameta_unknown"));
        assert!(!html.contains("Participant:"));
        assert!(!html.contains("id=\"entity_ro_crate_metadata_json\""));
    }

    #[test]
    fn file_entities_show_whitelisted_fields_only() {
        let document = json!({
            "@graph": [
                {"@id": "./", "@type": "Dataset", "name": "P"},
                {"@id": "test.person", "@type": "File", "name": "test.person",
                 "description": "secret", "encodingFormat": "application/lameta+xml",
                 "contentSize": 2048, "license": {"@id": "#x"}}
            ]
        });
        let html = generate_rocrate_html(&document);
        let start = html.find("id=\"entity_test_person\"").unwrap();
        let section = &html[start..];
        assert!(section.contains("Encoding Format:"));
        assert!(section.contains("2 KB"));
        assert!(!section.contains("Description:"));
        assert!(!section.contains("License:"));
    }

    #[test]
    fn escapes_text_and_survives_empty_documents() {
        let html = generate_rocrate_html(&json!({}));
        assert!(html.contains("Research Object"));
        let html = generate_rocrate_html(&json!({
            "@graph": [{"@id": "./", "@type": "Dataset", "name": "<b>", "description": "a & b"}]
        }));
        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn file_urls_in_plain_values_are_shown_as_paths() {
        let document = json!({
            "@graph": [
                {"@id": "./", "@type": "Dataset", "name": "P",
                 "hasPart": [{"@id": "Sessions/S1/"}]},
                {"@id": "Sessions/S1/", "@type": ["Dataset", "Event"], "name": "S1",
                 "recordingPath": "file:///C:/corpus/Sessions/S1/a.wav",
                 "note": "copied from file:///home/me/People/Awi/photo.jpg\tyesterday",
                 "extra": {"source": "file:///tmp/raw.wav", "kind": "audio"}}
            ]
        });
        let html = generate_rocrate_html(&document);
        assert!(!html.contains("file://"));
        assert!(html.contains("Sessions/S1/a.wav"));
        assert!(html.contains("People/Awi/photo.jpg"));
        assert!(html.contains("raw.wav"));
    }
}
