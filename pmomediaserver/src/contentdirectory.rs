//! # ContentDirectory - Réponses du service
//!
//! Assemble le rendu DIDL-Lite et les enveloppes SOAP pour les réponses
//! `Browse` et les notifications `SystemUpdateID`.

use std::sync::Arc;

use pmodidl::{CatalogObject, DidlBuilder, DidlError, ResourceSelection};
use pmoupnp::soap::{
    SoapError, add_response_value, build_event_notification, build_soap_envelope, create_response,
};
use thiserror::Error;

pub const CONTENT_DIRECTORY_SERVICE: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";

#[derive(Debug, Error)]
pub enum ContentDirectoryError {
    #[error("DIDL-Lite rendering failed: {0}")]
    Didl(#[from] DidlError),

    #[error("SOAP envelope failed: {0}")]
    Soap(#[from] SoapError),
}

/// Page de résultats d'un Browse
#[derive(Debug, Clone, Default)]
pub struct BrowsePage {
    pub objects: Vec<Arc<CatalogObject>>,
    pub total_matches: usize,
    pub update_id: u32,
}

/// Réponse SOAP complète d'une action `Browse`
pub fn build_browse_response(
    builder: &DidlBuilder,
    page: &BrowsePage,
) -> Result<String, ContentDirectoryError> {
    let didl = builder.render_didl(page.objects.iter().map(Arc::as_ref), ResourceSelection::All)?;

    let mut response = create_response("Browse", CONTENT_DIRECTORY_SERVICE);
    add_response_value(&mut response, "Result", &didl);
    add_response_value(&mut response, "NumberReturned", &page.objects.len().to_string());
    add_response_value(&mut response, "TotalMatches", &page.total_matches.to_string());
    add_response_value(&mut response, "UpdateID", &page.update_id.to_string());

    Ok(build_soap_envelope(response)?)
}

/// Corps NOTIFY signalant un changement du catalogue
pub fn build_system_update_event(update_id: u32) -> Result<String, ContentDirectoryError> {
    let update_id = update_id.to_string();
    Ok(build_event_notification(&[("SystemUpdateID", update_id.as_str())])?)
}
