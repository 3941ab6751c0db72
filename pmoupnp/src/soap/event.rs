//! Notifications d'événements GENA (`e:propertyset`)

use xmltree::{Element, EmitterConfig, XMLNode};

use super::SoapError;
use super::builder::write_document;

pub const EVENT_NAMESPACE: &str = "urn:schemas-upnp-org:event-1-0";

const PROPERTY_SET: &str = "e:propertyset";
const PROPERTY: &str = "e:property";

/// Crée un `e:propertyset` vide, avec un premier `e:property` à remplir
pub fn create_event_property_set() -> Element {
    let mut set = Element::new(PROPERTY_SET);
    set.attributes
        .insert("xmlns:e".to_string(), EVENT_NAMESPACE.to_string());
    set.children.push(XMLNode::Element(Element::new(PROPERTY)));
    set
}

/// Ajoute une variable d'état au jeu de propriétés
///
/// Le premier `e:property` vide est rempli ; les suivantes sont ajoutées
/// dans de nouveaux `e:property`.
pub fn add_event_property(set: &mut Element, name: &str, value: &str) {
    let mut variable = Element::new(name);
    variable.children.push(XMLNode::Text(value.to_string()));

    let empty = set.children.iter_mut().find_map(|node| match node {
        XMLNode::Element(e) if e.name == PROPERTY && e.children.is_empty() => Some(e),
        _ => None,
    });

    match empty {
        Some(property) => property.children.push(XMLNode::Element(variable)),
        None => {
            let mut property = Element::new(PROPERTY);
            property.children.push(XMLNode::Element(variable));
            set.children.push(XMLNode::Element(property));
        }
    }
}

/// Corps d'une requête NOTIFY pour les variables données
pub fn build_event_notification(values: &[(&str, &str)]) -> Result<String, SoapError> {
    let mut set = create_event_property_set();
    for (name, value) in values {
        add_event_property(&mut set, name, value);
    }

    let config = EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(false);
    write_document(&set, config)
}
