use lameta_core::iri::{
    create_person_files_dataset_id, create_person_id, create_session_id,
    create_unresolved_contributor_id, sanitize_for_iri,
};
use lameta_core::license::{normalized_license_id, session_license_id};
use lameta_core::{FileRecord, LicenseManager, Project, Properties, Session};

fn project() -> Project {
    Project {
        properties: Properties::new().with("archiveConfigurationName", "REAP"),
        ..Project::default()
    }
}

fn session(access: &str) -> Session {
    let mut session = Session::new("ETR009");
    session.properties.insert("access", access);
    session
}

#[test]
fn raw_cached_value_is_overwritten_by_normalized_one() {
    let project = project();
    let session = session("Strategic partners");
    let file = FileRecord::new("/c/Sessions/ETR009/ETR009.wav");

    let mut manager = LicenseManager::new();
    manager.set_file_license(&file.path, "Strategic partners".to_string());
    let normalized = manager.ensure_file_license(&file, &session, Some(&project));
    assert_eq!(normalized.as_deref(), Some("#license-reap-strategic-partners"));
    assert_eq!(
        manager.file_license(&file.path),
        Some("#license-reap-strategic-partners")
    );

    let again = manager.ensure_file_license(&file, &session, Some(&project));
    assert_eq!(again, normalized);
}

#[test]
fn normalization_is_idempotent_and_archive_scoped() {
    let reap = project();
    let id = normalized_license_id("Strategic partners", &reap);
    assert_eq!(normalized_license_id(&id, &reap), id);

    let elar = Project {
        properties: Properties::new().with("archiveConfigurationName", "ELAR"),
        ..Project::default()
    };
    assert_ne!(normalized_license_id("U", &reap), normalized_license_id("U", &elar));
}

#[test]
fn session_license_without_project_stays_raw() {
    assert_eq!(
        session_license_id(&session("Strategic partners"), None).as_deref(),
        Some("Strategic partners")
    );
    assert_eq!(
        session_license_id(&session("unspecified"), None).as_deref(),
        Some("unspecified")
    );
    assert_eq!(
        session_license_id(&session(" public "), None).as_deref(),
        Some(" public ")
    );
    assert_eq!(session_license_id(&session(""), None), None);
}

#[test]
fn person_session_and_dataset_ids_do_not_collide() {
    let prefix = "ETR009";
    let ids = [
        create_person_id(prefix),
        create_session_id(prefix),
        create_person_files_dataset_id(prefix),
    ];
    assert_eq!(ids, ["People/ETR009/", "#session-ETR009", "#ETR009-files"]);
}

#[test]
fn unresolved_contributor_ids_trim_and_encode() {
    assert_eq!(
        create_unresolved_contributor_id(" Mary Jones "),
        create_unresolved_contributor_id("Mary Jones")
    );
    assert_ne!(
        create_unresolved_contributor_id("José"),
        create_unresolved_contributor_id("Jose")
    );
    assert_eq!(create_unresolved_contributor_id("   "), "#unknown-contributor");
}

#[test]
fn iri_sanitizing_encodes_tooling_hostile_marks() {
    assert_eq!(sanitize_for_iri("a (b)!"), "a%20%28b%29%21");
    assert_eq!(sanitize_for_iri(""), "");
}
