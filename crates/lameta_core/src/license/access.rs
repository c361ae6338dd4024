//! Access-label normalization and license entity builders.

use crate::iri::COLLECTION_LICENSE_ID;
use crate::model::{AccessChoice, Project, Session};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeSet;

pub const OPEN_ACCESS: &str = "ldac:OpenAccess";
pub const AUTHORIZED_ACCESS: &str = "ldac:AuthorizedAccess";
const ACCESS_TYPES_SET: &str = "ldac:AccessTypes";
const PUBLIC_ACCESS: &str = "public";
const PUBLIC_TERMS: [&str; 4] = ["public", "open", "free", "unrestricted"];

static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]").expect("valid license id regex"));

/// True for archive access labels that still need normalizing.
///
/// Fragment ids (`#license-...`) and URLs are already final.
pub fn is_raw_access_value(license: &str) -> bool {
    let trimmed = license.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#') && !trimmed.starts_with("http")
}

/// Trimmed access value, or `None` for blank and `unspecified`.
pub fn sanitize_access_value(access: &str) -> Option<String> {
    let trimmed = access.trim();
    if trimmed.is_empty() || trimmed == "unspecified" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `#license-<archive>-<key>` for an access label.
pub fn normalized_license_id(access: &str, project: &Project) -> String {
    let trimmed = access.trim();
    if !trimmed.is_empty() && !is_raw_access_value(trimmed) {
        return trimmed.to_string();
    }
    let access = sanitize_access_value(access).unwrap_or_else(|| PUBLIC_ACCESS.to_string());
    let archive = archive_name_or(project, "unknown");
    let key = access.split(':').next().unwrap_or(access.as_str()).trim();
    format!(
        "#license-{}-{}",
        normalize_segment(&archive),
        normalize_segment(key)
    )
}

/// License id of a session.
///
/// Without a project only the raw access value is known, so it is returned
/// as-is; callers normalize it once a project is available.
pub fn session_license_id(session: &Session, project: Option<&Project>) -> Option<String> {
    let access = session.access();
    match project {
        Some(project) => Some(normalized_license_id(&access, project)),
        None => (!access.is_empty()).then_some(access),
    }
}

/// Builds the `ldac:DataReuseLicense` entity for an access value.
pub fn create_access_license(access: Option<&str>, project: &Project) -> Map<String, Value> {
    let sanitized = access.and_then(sanitize_access_value);
    let shown_access = sanitized.clone().unwrap_or_else(|| PUBLIC_ACCESS.to_string());
    let archive = archive_name_or(project, "current archive");
    let choice = sanitized
        .as_deref()
        .and_then(|value| find_access_choice(project, value));
    let category = match &sanitized {
        Some(value) => ldac_access_category(value, choice),
        None => OPEN_ACCESS.to_string(),
    };
    let description = match (&sanitized, choice) {
        (Some(value), Some(choice)) if !choice.description.trim().is_empty() => format!(
            "Marked with the {archive}-specific term, '{value}' which means '{}'",
            choice.description.trim()
        ),
        (Some(value), _) => format!("Marked with the {archive}-specific term, '{value}'"),
        (None, _) => format!(
            "Marked with the {archive}-specific term, 'public' which means 'This is an open access license.'"
        ),
    };

    let mut license = Map::new();
    license.insert(
        "@id".into(),
        json!(normalized_license_id(&shown_access, project)),
    );
    license.insert("@type".into(), json!("ldac:DataReuseLicense"));
    license.insert("name".into(), json!(format!("{archive} {shown_access} License")));
    license.insert("description".into(), json!(description));
    license.insert("ldac:access".into(), json!({ "@id": category }));
    license
}

/// One license per distinct id across sessions and extra access values.
pub fn create_distinct_licenses(
    sessions: &[&Session],
    project: &Project,
    additional_access_values: &[String],
) -> Vec<Map<String, Value>> {
    let mut seen = BTreeSet::new();
    let mut licenses = Vec::new();
    let session_access = sessions.iter().map(|session| session.access());
    for access in session_access.chain(additional_access_values.iter().cloned()) {
        let license = create_access_license(Some(&access), project);
        let id = license
            .get("@id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if seen.insert(id) {
            licenses.push(license);
        }
    }
    licenses
}

/// License entity for an id a file carries directly.
///
/// An access choice of the current archive that normalizes to `id` supplies
/// the description and access category; otherwise the entity is built from
/// the id alone.
pub fn create_referenced_license(id: &str, project: &Project) -> Map<String, Value> {
    let matching = project.access_choices().iter().find_map(|choice| {
        [Some(choice.id.as_str()), choice.label.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| normalized_license_id(value, project) == id)
    });
    if let Some(access) = matching {
        let mut license = create_access_license(Some(access), project);
        license.insert("@id".into(), json!(id));
        return license;
    }
    let key = id.strip_prefix("#license-").unwrap_or(id);
    let mut license = Map::new();
    license.insert("@id".into(), json!(id));
    license.insert("@type".into(), json!("ldac:DataReuseLicense"));
    license.insert("name".into(), json!(format!("License {key}")));
    license.insert(
        "description".into(),
        json!(format!("License '{key}' assigned directly to an exported file.")),
    );
    license.insert(
        "ldac:access".into(),
        json!({ "@id": ldac_access_category(key, None) }),
    );
    license
}

/// `ldac:AccessTypes` plus the access terms in `used`; empty when unused.
pub fn create_ldac_access_type_definitions(used: &BTreeSet<String>) -> Vec<Map<String, Value>> {
    if used.is_empty() {
        return Vec::new();
    }
    let mut definitions = Vec::new();
    let mut set = Map::new();
    set.insert("@id".into(), json!(ACCESS_TYPES_SET));
    set.insert("@type".into(), json!("DefinedTermSet"));
    set.insert("name".into(), json!("Access Types"));
    definitions.push(set);

    let terms = [
        (
            OPEN_ACCESS,
            "Open Access",
            "Data covered by this license may be accessed as long as the license is served alongside it, and does not require any specific authorization step.",
        ),
        (
            AUTHORIZED_ACCESS,
            "Authorized Access",
            "Data covered by this license requires explicit authorization for access.",
        ),
    ];
    for (id, name, description) in terms {
        if !used.contains(id) {
            continue;
        }
        let mut term = Map::new();
        term.insert("@id".into(), json!(id));
        term.insert("@type".into(), json!("DefinedTerm"));
        term.insert("name".into(), json!(name));
        term.insert("description".into(), json!(description));
        term.insert("inDefinedTermSet".into(), json!({ "@id": ACCESS_TYPES_SET }));
        definitions.push(term);
    }
    definitions
}

/// License of the collection as a whole.
pub fn collection_license() -> Map<String, Value> {
    let mut license = Map::new();
    license.insert("@id".into(), json!(COLLECTION_LICENSE_ID));
    license.insert("@type".into(), json!("ldac:DataReuseLicense"));
    license.insert("name".into(), json!("Collection License"));
    license.insert(
        "description".into(),
        json!("License for the collection as a whole. Individual items may have their own specific licenses."),
    );
    license.insert("ldac:access".into(), json!({ "@id": OPEN_ACCESS }));
    license
}

fn archive_name_or(project: &Project, fallback: &str) -> String {
    let name = project.archive_configuration_name();
    if name.is_empty() {
        fallback.to_string()
    } else {
        name
    }
}

fn normalize_segment(value: &str) -> String {
    NON_ALNUM_RE.replace_all(&value.to_lowercase(), "-").into_owned()
}

fn find_access_choice<'a>(project: &'a Project, access: &str) -> Option<&'a AccessChoice> {
    project.access_choices().iter().find(|choice| {
        choice.id == access || choice.label.as_deref() == Some(access)
    })
}

fn ldac_access_category(access: &str, choice: Option<&AccessChoice>) -> String {
    if let Some(category) = choice.and_then(|choice| choice.ldac_access_category.as_deref()) {
        return category.to_string();
    }
    let lowered = access.to_lowercase();
    if PUBLIC_TERMS.iter().any(|term| lowered.contains(term)) {
        OPEN_ACCESS.to_string()
    } else {
        AUTHORIZED_ACCESS.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArchiveConfiguration, Properties, ARCHIVE_CONFIGURATION_KEY};

    fn project(archive: &str) -> Project {
        Project {
            properties: Properties::new().with(ARCHIVE_CONFIGURATION_KEY, archive),
            archive_configurations: vec![ArchiveConfiguration {
                name: archive.to_string(),
                access_choices: vec![
                    AccessChoice {
                        id: "U".into(),
                        description: "Unrestricted access".into(),
                        ldac_access_category: Some(OPEN_ACCESS.into()),
                        ..AccessChoice::default()
                    },
                    AccessChoice {
                        id: "Strategic partners".into(),
                        description: "Only partners".into(),
                        ..AccessChoice::default()
                    },
                ],
                ..ArchiveConfiguration::default()
            }],
            ..Project::default()
        }
    }

    #[test]
    fn normalizes_archive_and_key() {
        assert_eq!(
            normalized_license_id("F: Free to All", &project("ELAR")),
            "#license-elar-f"
        );
        assert_eq!(
            normalized_license_id("Strategic partners", &project("REAP")),
            "#license-reap-strategic-partners"
        );
        assert_eq!(
            normalized_license_id("unspecified", &Project::default()),
            "#license-unknown-public"
        );
    }

    #[test]
    fn referenced_license_uses_matching_access_choice() {
        let project = project("REAP");
        let known = create_referenced_license("#license-reap-u", &project);
        assert_eq!(known["@id"], "#license-reap-u");
        assert_eq!(known["ldac:access"]["@id"], OPEN_ACCESS);
        assert!(known["description"].as_str().unwrap().contains("Unrestricted access"));

        let foreign = create_referenced_license("#license-elar-o", &project);
        assert_eq!(foreign["@type"], "ldac:DataReuseLicense");
        assert_eq!(foreign["name"], "License elar-o");
        assert_eq!(foreign["ldac:access"]["@id"], AUTHORIZED_ACCESS);
    }

    #[test]
    fn normalized_ids_pass_through() {
        let project = project("REAP");
        let first = normalized_license_id("Strategic partners", &project);
        assert_eq!(normalized_license_id(&first, &project), first);
        assert_eq!(
            normalized_license_id("https://creativecommons.org/licenses/by/4.0/", &project),
            "https://creativecommons.org/licenses/by/4.0/"
        );
    }

    #[test]
    fn raw_access_detection() {
        assert!(is_raw_access_value("Strategic partners"));
        assert!(!is_raw_access_value("#license-reap-u"));
        assert!(!is_raw_access_value("https://creativecommons.org/licenses/by/4.0/"));
        assert!(!is_raw_access_value("  "));
    }

    #[test]
    fn license_uses_choice_category_and_description() {
        let license = create_access_license(Some("U"), &project("REAP"));
        assert_eq!(license["@id"], "#license-reap-u");
        assert_eq!(license["name"], "REAP U License");
        assert_eq!(license["ldac:access"]["@id"], OPEN_ACCESS);
        assert_eq!(
            license["description"],
            "Marked with the REAP-specific term, 'U' which means 'Unrestricted access'"
        );
    }

    #[test]
    fn license_without_category_falls_back_by_keywords() {
        let partners = create_access_license(Some("Strategic partners"), &project("REAP"));
        assert_eq!(partners["ldac:access"]["@id"], AUTHORIZED_ACCESS);
        let open = create_access_license(Some("Open to all"), &project("REAP"));
        assert_eq!(open["ldac:access"]["@id"], OPEN_ACCESS);
        assert_eq!(
            open["description"],
            "Marked with the REAP-specific term, 'Open to all'"
        );
    }

    #[test]
    fn missing_access_is_public() {
        let license = create_access_license(None, &Project::default());
        assert_eq!(license["@id"], "#license-unknown-public");
        assert_eq!(license["name"], "current archive public License");
        assert_eq!(
            license["description"],
            "Marked with the current archive-specific term, 'public' which means 'This is an open access license.'"
        );
    }

    #[test]
    fn distinct_licenses_dedupe_by_id() {
        let project = project("REAP");
        let mut a = Session::new("a");
        a.properties.insert("access", "U");
        let mut b = Session::new("b");
        b.properties.insert("access", "U");
        let licenses = create_distinct_licenses(&[&a, &b], &project, &["U".to_string()]);
        assert_eq!(licenses.len(), 1);
    }

    #[test]
    fn access_type_definitions_only_for_used_terms() {
        assert!(create_ldac_access_type_definitions(&BTreeSet::new()).is_empty());
        let used = BTreeSet::from([AUTHORIZED_ACCESS.to_string()]);
        let definitions = create_ldac_access_type_definitions(&used);
        let ids: Vec<_> = definitions.iter().map(|d| d["@id"].clone()).collect();
        assert_eq!(ids, vec![json!("ldac:AccessTypes"), json!(AUTHORIZED_ACCESS)]);
    }

    #[test]
    fn session_license_id_without_project_is_raw() {
        let mut session = Session::new("s");
        assert_eq!(session_license_id(&session, None), None);
        session.properties.insert("access", "Strategic partners");
        assert_eq!(
            session_license_id(&session, None).as_deref(),
            Some("Strategic partners")
        );
        assert_eq!(
            session_license_id(&session, Some(&project("REAP"))).as_deref(),
            Some("#license-reap-strategic-partners")
        );
    }
}
