//! # Metadata Service - Registre des handlers de contenu
//!
//! Associe chaque étiquette [`ContentHandler`] au [`MetadataHandler`] qui
//! sert les ressources correspondantes. La recherche est une simple
//! consultation de table : aucun handler n'hérite d'un autre.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use pmodidl::ContentHandler;

use crate::handler::{FileMetadataHandler, MetadataHandler};

/// Étiquettes servies directement depuis le disque
pub const FILE_HANDLER_TAGS: [ContentHandler; 6] = [
    ContentHandler::Default,
    ContentHandler::Id3,
    ContentHandler::Flac,
    ContentHandler::Subtitle,
    ContentHandler::FanArt,
    ContentHandler::ContainerArt,
];

/// Registre des handlers
///
/// Clonable à moindre coût : les clones partagent la même table.
#[derive(Clone, Default)]
pub struct MetadataService {
    handlers: Arc<RwLock<HashMap<ContentHandler, Arc<dyn MetadataHandler>>>>,
}

impl MetadataService {
    /// Crée un registre vide
    pub fn new() -> Self {
        Self::default()
    }

    /// Registre servant depuis le disque toutes les ressources locales
    pub fn with_file_handlers() -> Self {
        let service = Self::new();
        let file: Arc<dyn MetadataHandler> = Arc::new(FileMetadataHandler::new());
        for tag in FILE_HANDLER_TAGS {
            service.register(tag, file.clone());
        }
        service
    }

    /// Enregistre (ou remplace) le handler d'une étiquette
    pub fn register(&self, tag: ContentHandler, handler: Arc<dyn MetadataHandler>) {
        tracing::debug!(tag = %tag, handler = handler.name(), "Registering metadata handler");
        self.handlers.write().insert(tag, handler);
    }

    pub fn unregister(&self, tag: ContentHandler) -> Option<Arc<dyn MetadataHandler>> {
        self.handlers.write().remove(&tag)
    }

    /// Handler responsable d'une étiquette
    pub fn handler_for(&self, tag: ContentHandler) -> Option<Arc<dyn MetadataHandler>> {
        self.handlers.read().get(&tag).cloned()
    }

    pub fn is_registered(&self, tag: ContentHandler) -> bool {
        self.handlers.read().contains_key(&tag)
    }
}

impl std::fmt::Debug for MetadataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        f.debug_map()
            .entries(handlers.iter().map(|(tag, h)| (tag.as_str(), h.name())))
            .finish()
    }
}
