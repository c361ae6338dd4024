//! Project-level Place entities.

use super::{reference, Entity};
use crate::iri::sanitize_for_iri;
use crate::model::Project;
use serde_json::{json, Value};

/// Country place (described by its continent), or a continent place when
/// only the continent is known.
pub fn project_content_location(project: &Project) -> Option<(Value, Entity)> {
    let country = project.properties.meaningful("country");
    let continent = project.properties.meaningful("continent");
    let (id, name, description) = match (country, continent) {
        (Some(country), continent) => (
            format!("#place-country-{}", sanitize_for_iri(&country)),
            country,
            continent.map(|continent| format!("Located in {continent}")),
        ),
        (None, Some(continent)) => (
            format!("#place-continent-{}", sanitize_for_iri(&continent)),
            continent,
            None,
        ),
        (None, None) => return None,
    };
    let mut place = Entity::new();
    place.insert("@id".into(), json!(id));
    place.insert("@type".into(), json!("Place"));
    place.insert("name".into(), json!(name));
    if let Some(description) = description {
        place.insert("description".into(), json!(description));
    }
    Some((json!([reference(&id)]), place))
}
