//! # Module SOAP - Enveloppes de réponses et d'événements UPnP
//!
//! Constructeurs purs des documents échangés avec les points de contrôle :
//!
//! - [`create_response`] : élément `u:<action>Response` d'une réponse d'action
//! - [`build_soap_envelope`] / [`build_soap_response`] : enveloppe SOAP complète
//! - [`create_event_property_set`] / [`build_event_notification`] : corps GENA
//!
//! Aucune de ces fonctions ne fait d'entrée/sortie.
//!
//! ## Example
//!
//! ```
//! use pmoupnp::soap::build_soap_response;
//!
//! let response = build_soap_response(
//!     "urn:schemas-upnp-org:service:ContentDirectory:1",
//!     "GetSystemUpdateID",
//!     vec![("Id".to_string(), "7".to_string())],
//! ).unwrap();
//! assert!(response.contains("<Id>7</Id>"));
//! ```

mod builder;
mod errors;
mod event;

pub use builder::{
    SOAP_ENCODING_STYLE, SOAP_ENVELOPE_NAMESPACE, add_response_value, build_soap_envelope,
    build_soap_response, create_response,
};
pub use errors::SoapError;
pub use event::{
    EVENT_NAMESPACE, add_event_property, build_event_notification, create_event_property_set,
};
