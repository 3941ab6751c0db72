use thiserror::Error;

/// Erreurs de décodage d'un chemin de ressource
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("Missing '{0}' segment in resource path")]
    MissingSegment(&'static str),

    #[error("Invalid value '{value}' for '{segment}' segment")]
    InvalidNumber { segment: &'static str, value: String },
}

/// Erreurs du rendu DIDL-Lite
#[derive(Debug, Error)]
pub enum DidlError {
    #[error("XML serialization failed: {0}")]
    Xml(#[from] xmltree::Error),

    #[error("Serialized document is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
