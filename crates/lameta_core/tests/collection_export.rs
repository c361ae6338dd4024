use lameta_core::{
    generate_rocrate_html, DocumentValidator, ExportOptions, GraphIntegrityValidator, Project,
    RoCrateExporter, ValidationRequest, GRAPH_INTEGRITY_SCHEMA,
};
use serde_json::{json, Map, Value};

const DATE: &str = "2026-01-01T00:00:00.000Z";

fn snapshot() -> Project {
    serde_json::from_value(json!({
        "properties": {
            "title": "Edolo Texts",
            "archiveConfigurationName": "REAP",
            "collectionDescription": "Stories recorded in Huya village.",
            "country": "Papua New Guinea",
            "continent": "Oceania",
            "collectionSubjectLanguages": ["etr: Edolo"],
            "depositor": "Jane Doe"
        },
        "archiveConfigurations": [{
            "name": "REAP",
            "configurationFullName": "Resource Network for Linguistic Diversity",
            "url": "https://reap.example.org",
            "accessChoices": [
                {"id": "U", "description": "Unrestricted", "ldacAccessCategory": "ldac:OpenAccess"},
                {"id": "Strategic partners", "description": "Only partners"}
            ]
        }],
        "sessions": [
            {
                "filePrefix": "ETR009",
                "properties": {
                    "title": "Hewya",
                    "date": "2010-06-06",
                    "access": "U",
                    "genre": "dialog",
                    "languages": "etr",
                    "location": "Huya"
                },
                "contributions": [
                    {"personReference": "Awi Heole", "role": "speaker"},
                    {"personReference": "Mary Jones", "role": "recorder"}
                ],
                "files": [
                    {"path": "/corpus/Sessions/ETR009/ETR009.wav", "size": 1024},
                    {"path": "/corpus/Sessions/ETR009/ETR009.eaf"},
                    {"path": "/corpus/Sessions/ETR009/ro-crate-metadata.json"}
                ]
            },
            {
                "filePrefix": "ETR010",
                "properties": {
                    "title": "Garden talk",
                    "access": "Strategic partners",
                    "genre": "unknown, Procedural chant"
                },
                "contributions": [
                    {"personReference": "awi heole", "role": "speaker"}
                ],
                "files": [
                    {"path": "/corpus/Sessions/ETR010/ETR010.mp3", "properties": {"license": "Strategic partners"}}
                ]
            }
        ],
        "people": [
            {
                "filePrefix": "Awi_Heole",
                "properties": {"name": "Awi Heole", "birthYear": "1960", "gender": "Male"},
                "files": [
                    {"path": "/corpus/People/Awi_Heole/Awi_Heole_Photo.jpg"},
                    {"path": "/corpus/People/Awi_Heole/Awi_Heole_Consent.pdf"}
                ]
            },
            {
                "filePrefix": "Unused_Person",
                "properties": {"name": "Unused Person"}
            }
        ],
        "descriptionDocuments": [
            {"path": "/corpus/DescriptionDocuments/protocol.pdf", "dateCreated": "2009-02-01T00:00:00.000Z"}
        ],
        "otherDocuments": [
            {"path": "/corpus/OtherDocuments/notes.txt", "properties": {"access": "Strategic partners"}}
        ]
    }))
    .unwrap()
}

fn export(project: &Project) -> Value {
    let mut exporter = RoCrateExporter::new().unwrap();
    exporter
        .export_project(project, &ExportOptions::with_date(DATE))
        .unwrap()
}

fn graph(document: &Value) -> &Vec<Value> {
    document["@graph"].as_array().unwrap()
}

fn find<'a>(document: &'a Value, id: &str) -> &'a Map<String, Value> {
    graph(document)
        .iter()
        .filter_map(Value::as_object)
        .find(|entity| entity["@id"] == id)
        .unwrap_or_else(|| panic!("missing entity {id}"))
}

fn has(document: &Value, id: &str) -> bool {
    graph(document).iter().any(|entity| entity["@id"] == id)
}

fn refs(value: &Value) -> Vec<&str> {
    match value {
        Value::Array(items) => items.iter().filter_map(|item| item["@id"].as_str()).collect(),
        Value::Object(_) => value["@id"].as_str().into_iter().collect(),
        _ => Vec::new(),
    }
}

#[test]
fn collection_passes_graph_integrity_check() {
    let document = export(&snapshot());
    let report = GraphIntegrityValidator.validate(&ValidationRequest::new(
        serde_json::to_string_pretty(&document).unwrap(),
        GRAPH_INTEGRITY_SCHEMA,
    ));
    assert!(report.valid, "{:#?}", report.errors);
}

#[test]
fn root_comes_first_and_ids_are_unique() {
    let document = export(&snapshot());
    let graph = graph(&document);
    assert_eq!(graph[0]["@id"], "./");
    let mut ids: Vec<&str> = graph.iter().map(|e| e["@id"].as_str().unwrap()).collect();
    let total = ids.len();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total);
}

#[test]
fn root_describes_collection_and_archive() {
    let document = export(&snapshot());
    let root = find(&document, "./");
    assert_eq!(root["name"], "Edolo Texts");
    assert_eq!(root["datePublished"], DATE);
    assert_eq!(root["license"]["@id"], "#collection-license");
    assert_eq!(root["publisher"]["@id"], "#publisher-reap");
    assert_eq!(root["holdingArchive"]["@id"], "#publisher-reap");
    assert_eq!(root["ldac:depositor"]["@id"], "#depositor-jane-doe");
    assert_eq!(root["author"]["@id"], "#unknown-contributor");
    assert_eq!(
        refs(&root["pcdm:hasMember"]),
        vec!["#session-ETR009", "#session-ETR010"]
    );
    assert_eq!(
        refs(&root["contentLocation"]),
        vec!["#place-country-Papua%20New%20Guinea"]
    );
    assert_eq!(refs(&root["ldac:subjectLanguage"]), vec!["#language_etr"]);
    assert_eq!(
        find(&document, "#publisher-reap")["name"],
        "Resource Network for Linguistic Diversity"
    );
}

#[test]
fn sessions_and_people_never_share_ids() {
    let document = export(&snapshot());
    assert!(has(&document, "#session-ETR009"));
    assert!(has(&document, "People/Awi_Heole/"));
    assert!(has(&document, "#Awi_Heole-files"));
    assert!(!has(&document, "People/Unused_Person/"));
    let session = find(&document, "#session-ETR009");
    assert_eq!(refs(&session["ldac:speaker"]), vec!["People/Awi_Heole/"]);
    assert_eq!(refs(&session["ldac:recorder"]), vec!["#contributor-Mary_Jones"]);
    assert_eq!(session["pcdm:memberOf"]["@id"], "./");
    assert_eq!(
        refs(&session["hasPart"]),
        vec!["Sessions/ETR009/ETR009.wav", "Sessions/ETR009/ETR009.eaf"]
    );
    assert_eq!(
        find(&document, "#contributor-Mary_Jones")["@type"],
        "Person"
    );
}

#[test]
fn person_files_are_grouped_under_people_directory() {
    let document = export(&snapshot());
    let person = find(&document, "People/Awi_Heole/");
    assert_eq!(person["name"], "Awi Heole");
    assert_eq!(person["ldac:age"], "50");
    assert_eq!(
        refs(&person["image"]),
        vec!["People/Awi_Heole/Awi_Heole_Photo.jpg"]
    );
    assert!(refs(&person["subjectOf"]).contains(&"#Awi_Heole-files"));
    assert!(!person.contains_key("hasPart"));

    let dataset = find(&document, "#Awi_Heole-files");
    assert_eq!(dataset["@type"], "Dataset");
    assert_eq!(dataset["isPartOf"]["@id"], "People/");
    assert_eq!(dataset["about"]["@id"], "People/Awi_Heole/");
    assert_eq!(refs(&dataset["hasPart"]).len(), 2);

    let photo = find(&document, "People/Awi_Heole/Awi_Heole_Photo.jpg");
    assert_eq!(photo["isPartOf"]["@id"], "#Awi_Heole-files");
    assert_eq!(photo["about"]["@id"], "People/Awi_Heole/");
    assert_eq!(photo["license"]["@id"], "#collection-license");

    let people = find(&document, "People/");
    assert_eq!(refs(&people["hasPart"]), vec!["#Awi_Heole-files"]);
}

#[test]
fn licenses_are_normalized_and_deduplicated() {
    let document = export(&snapshot());
    let wav = find(&document, "Sessions/ETR009/ETR009.wav");
    assert_eq!(wav["license"]["@id"], "#license-reap-u");
    let mp3 = find(&document, "Sessions/ETR010/ETR010.mp3");
    assert_eq!(mp3["license"]["@id"], "#license-reap-strategic-partners");
    let notes = find(&document, "OtherDocuments/notes.txt");
    assert_eq!(notes["license"]["@id"], "#license-reap-strategic-partners");

    let licenses: Vec<&str> = graph(&document)
        .iter()
        .filter(|entity| entity["@type"] == "ldac:DataReuseLicense")
        .filter_map(|entity| entity["@id"].as_str())
        .collect();
    assert_eq!(
        licenses,
        vec![
            "#license-reap-u",
            "#license-reap-strategic-partners",
            "#collection-license"
        ]
    );
    assert_eq!(
        find(&document, "#license-reap-strategic-partners")["ldac:access"]["@id"],
        "ldac:AuthorizedAccess"
    );
    assert!(has(&document, "ldac:OpenAccess"));
    assert!(has(&document, "ldac:AuthorizedAccess"));
}

#[test]
fn genres_map_to_ldac_custom_and_unknown_terms() {
    let document = export(&snapshot());
    let first = find(&document, "#session-ETR009");
    assert_eq!(refs(&first["ldac:linguisticGenre"]), vec!["ldac:Dialogue"]);
    let second = find(&document, "#session-ETR010");
    assert_eq!(
        refs(&second["ldac:linguisticGenre"]),
        vec![
            "tag:lameta/unknown",
            "tag:lameta,Edolo Texts:genre/Procedural chant"
        ]
    );
    assert_eq!(find(&document, "tag:lameta/unknown")["name"], "Unknown");
    assert!(has(&document, "ldac:LinguisticGenreTerms"));
    assert!(has(&document, "#CustomGenreTerms"));
}

#[test]
fn description_documents_expose_collection_protocol() {
    let document = export(&snapshot());
    let root = find(&document, "./");
    assert!(refs(&root["hasPart"]).contains(&"DescriptionDocuments/"));
    assert_eq!(root["ldac:hasCollectionProtocol"][0]["@id"], "#descriptionDocuments");
    let protocol = find(&document, "#descriptionDocuments");
    assert_eq!(protocol["@type"], "ldac:CollectionProtocol");
    assert_eq!(protocol["datePublished"], "2009-02-01T00:00:00.000Z");
    assert_eq!(
        refs(&protocol["hasPart"]),
        vec!["DescriptionDocuments/protocol.pdf"]
    );
}

#[test]
fn access_types_are_emitted_only_when_used() {
    let mut project = snapshot();
    project.sessions.truncate(1);
    project.other_documents.clear();
    let document = export(&project);
    assert!(has(&document, "ldac:OpenAccess"));
    assert!(!has(&document, "ldac:AuthorizedAccess"));
    assert!(!has(&document, "#CustomGenreTerms"));
}

#[test]
fn export_is_deterministic_for_fixed_date() {
    let project = snapshot();
    assert_eq!(export(&project), export(&project));
}

#[test]
fn preview_lists_sessions_without_file_urls() {
    let document = export(&snapshot());
    let html = generate_rocrate_html(&document);
    assert!(html.contains("Edolo Texts"));
    assert!(html.contains("Hewya"));
    assert!(html.contains("Awi Heole"));
    assert!(!html.contains("file://"));
}

fn file_licensed_snapshot() -> Project {
    serde_json::from_value(json!({
        "properties": {"title": "Edolo Texts", "archiveConfigurationName": "REAP"},
        "archiveConfigurations": [{
            "name": "REAP",
            "accessChoices": [
                {"id": "U", "description": "Unrestricted", "ldacAccessCategory": "ldac:OpenAccess"}
            ]
        }],
        "sessions": [{
            "filePrefix": "S1",
            "properties": {"title": "Recording", "access": "U"},
            "customProperties": {"recordingPath": "file:///C:/corpus/Sessions/S1/a.wav"},
            "files": [
                {"path": "/corpus/Sessions/S1/a.wav", "properties": {"license": "#license-elar-o"}},
                {"path": "/corpus/Sessions/S1/b.wav"}
            ]
        }]
    }))
    .unwrap()
}

#[test]
fn file_level_license_ids_resolve_to_entities() {
    let document = export(&file_licensed_snapshot());
    let report = GraphIntegrityValidator.validate(&ValidationRequest::new(
        serde_json::to_string_pretty(&document).unwrap(),
        GRAPH_INTEGRITY_SCHEMA,
    ));
    assert!(report.valid, "{:#?}", report.errors);

    assert_eq!(find(&document, "Sessions/S1/a.wav")["license"]["@id"], "#license-elar-o");
    assert_eq!(find(&document, "Sessions/S1/b.wav")["license"]["@id"], "#license-reap-u");
    let license = find(&document, "#license-elar-o");
    assert_eq!(license["@type"], "ldac:DataReuseLicense");
    assert!(license["name"].is_string());
    assert_eq!(license["ldac:access"]["@id"], "ldac:AuthorizedAccess");
    assert!(has(&document, "ldac:AuthorizedAccess"));
    assert!(has(&document, "ldac:OpenAccess"));
}

#[test]
fn custom_file_url_values_stay_out_of_preview() {
    let document = export(&file_licensed_snapshot());
    let session = find(&document, "#session-S1");
    assert_eq!(session["recordingPath"], "file:///C:/corpus/Sessions/S1/a.wav");
    let html = generate_rocrate_html(&document);
    assert!(!html.contains("file://"));
}
