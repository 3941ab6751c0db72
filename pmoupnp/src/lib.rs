//! # pmoupnp - Documents UPnP
//!
//! Construction des documents XML échangés par le serveur de médias avec les
//! points de contrôle : réponses d'actions SOAP et notifications d'événements.
//! Le transport (HTTP, GENA) n'est pas géré ici.

pub mod soap;

pub use soap::SoapError;
