//! Recherche des profils de transcodage.
//!
//! Les profils eux-mêmes sont décrits dans la configuration
//! ([`pmoconfig::TranscodingProfile`]) ; ce module ne fait que les
//! sélectionner pour un type de contenu donné.

pub use pmoconfig::TranscodingProfile;

use crate::protocol_info::resolve_mime;

/// Source de profils de transcodage
pub trait TranscodingLookup {
    /// Premier profil acceptant ce type (extension ou MIME)
    fn profile_for(&self, mime_or_extension: &str) -> Option<&TranscodingProfile>;

    /// Profil portant ce nom
    fn profile_named(&self, name: &str) -> Option<&TranscodingProfile>;
}

impl TranscodingLookup for [TranscodingProfile] {
    fn profile_for(&self, mime_or_extension: &str) -> Option<&TranscodingProfile> {
        let mime = resolve_mime(mime_or_extension);
        self.iter().find(|p| p.accepts(&mime))
    }

    fn profile_named(&self, name: &str) -> Option<&TranscodingProfile> {
        self.iter().find(|p| p.name == name)
    }
}

impl TranscodingLookup for Vec<TranscodingProfile> {
    fn profile_for(&self, mime_or_extension: &str) -> Option<&TranscodingProfile> {
        self.as_slice().profile_for(mime_or_extension)
    }

    fn profile_named(&self, name: &str) -> Option<&TranscodingProfile> {
        self.as_slice().profile_named(name)
    }
}
