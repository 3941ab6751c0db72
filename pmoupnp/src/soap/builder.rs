//! Construction de réponses SOAP

use xmltree::{Element, EmitterConfig, XMLNode};

use super::SoapError;

pub const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Crée l'élément racine d'une réponse d'action
///
/// L'élément s'appelle `u:<action>Response` et déclare `xmlns:u` avec le
/// type de service.
///
/// ```
/// use pmoupnp::soap::create_response;
///
/// let response = create_response("Browse", "urn:schemas-upnp-org:service:ContentDirectory:1");
/// assert_eq!(response.name, "u:BrowseResponse");
/// ```
pub fn create_response(action: &str, service_type: &str) -> Element {
    let mut response = Element::new(&format!("u:{}Response", action));
    response
        .attributes
        .insert("xmlns:u".to_string(), service_type.to_string());
    response
}

/// Ajoute un argument de sortie `<name>value</name>` à une réponse
pub fn add_response_value(response: &mut Element, name: &str, value: &str) {
    let mut child = Element::new(name);
    child.children.push(XMLNode::Text(value.to_string()));
    response.children.push(XMLNode::Element(child));
}

/// Enveloppe un élément dans `s:Envelope`/`s:Body`
pub fn build_soap_envelope(body_child: Element) -> Result<String, SoapError> {
    // Body
    let mut body = Element::new("s:Body");
    body.children.push(XMLNode::Element(body_child));

    // Envelope
    let mut envelope = Element::new("s:Envelope");
    envelope.attributes.insert(
        "xmlns:s".to_string(),
        SOAP_ENVELOPE_NAMESPACE.to_string(),
    );
    envelope.attributes.insert(
        "s:encodingStyle".to_string(),
        SOAP_ENCODING_STYLE.to_string(),
    );
    envelope.children.push(XMLNode::Element(body));

    let config = EmitterConfig::new()
        .write_document_declaration(true)
        .perform_indent(true)
        .indent_string("  ");
    write_document(&envelope, config)
}

/// Construit une réponse SOAP UPnP complète
///
/// # Arguments
///
/// * `service_urn` - URN du service (ex: "urn:schemas-upnp-org:service:ContentDirectory:1")
/// * `action` - Nom de l'action (ex: "Browse")
/// * `values` - Arguments de sortie, dans l'ordre de la description du service
pub fn build_soap_response(
    service_urn: &str,
    action: &str,
    values: Vec<(String, String)>,
) -> Result<String, SoapError> {
    let mut response = create_response(action, service_urn);
    for (key, value) in values {
        add_response_value(&mut response, &key, &value);
    }

    build_soap_envelope(response)
}

pub(crate) fn write_document(element: &Element, config: EmitterConfig) -> Result<String, SoapError> {
    let mut buf = Vec::new();
    element.write_with_config(&mut buf, config)?;
    Ok(String::from_utf8(buf)?)
}
