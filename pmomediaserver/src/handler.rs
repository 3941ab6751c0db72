//! # Handlers - Fournisseurs de contenu des ressources
//!
//! Un [`MetadataHandler`] sait décrire et ouvrir les ressources produites par
//! un [`ContentHandler`](pmodidl::ContentHandler) donné. Le choix du handler
//! est une simple recherche par étiquette dans le
//! [`MetadataService`](crate::MetadataService).

use std::io::SeekFrom;
use std::path::PathBuf;

use async_trait::async_trait;
use pmodidl::protocol_info::resolve_mime;
use pmodidl::{CatalogObject, ObjectKind, Resource, ResourceAttribute};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};

/// Type MIME annoncé quand la ressource n'en déclare pas
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Flux d'octets d'une ressource
pub type ResourceStream = Box<dyn AsyncRead + Send + Unpin>;

/// Plage d'octets demandée (bornes incluses)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Du décalage `start` jusqu'à la fin
    pub fn from_offset(start: u64) -> Self {
        Self { start, end: None }
    }

    /// Nombre d'octets couverts, si la plage est bornée
    pub fn len(&self) -> Option<u64> {
        self.end.map(|end| end.saturating_sub(self.start) + 1)
    }

    pub fn is_valid(&self) -> bool {
        self.end.is_none_or(|end| end >= self.start)
    }
}

/// Description d'une ressource servie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceInfo {
    pub mime_type: String,
    pub size: Option<u64>,
    /// Le flux accepte les plages d'octets
    pub seekable: bool,
}

/// Erreurs des handlers
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("No content source for resource {index} of object {object_id}")]
    MissingSource { object_id: i64, index: usize },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Invalid byte range {start}-{end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fournisseur de contenu pour une famille de ressources
#[async_trait]
pub trait MetadataHandler: Send + Sync {
    /// Nom court, pour les journaux
    fn name(&self) -> &'static str;

    /// Décrit la ressource `index` de l'objet (type, taille)
    async fn describe(
        &self,
        object: &CatalogObject,
        index: usize,
        resource: &Resource,
    ) -> Result<ResourceInfo, HandlerError>;

    /// Ouvre le contenu de la ressource, éventuellement à partir d'une plage
    async fn open(
        &self,
        object: &CatalogObject,
        index: usize,
        resource: &Resource,
        range: Option<ByteRange>,
    ) -> Result<ResourceStream, HandlerError>;
}

/// Type MIME d'une ressource, d'après son protocol-info
pub fn resource_mime_type(resource: &Resource) -> String {
    resource
        .mime_type()
        .map(|m| resolve_mime(&m))
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

/// Sert les ressources stockées sur disque
///
/// Le fichier est celui de l'attribut `RESOURCE_FILE`, sinon l'emplacement
/// local de l'item.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileMetadataHandler;

impl FileMetadataHandler {
    pub fn new() -> Self {
        Self
    }

    fn source_path(object: &CatalogObject, resource: &Resource) -> Option<PathBuf> {
        if let Some(file) = resource.attribute(ResourceAttribute::ResourceFile) {
            return Some(PathBuf::from(file));
        }
        match &object.kind {
            ObjectKind::Item {
                location: Some(location),
            } => Some(PathBuf::from(location)),
            _ => None,
        }
    }

    fn require_path(
        object: &CatalogObject,
        index: usize,
        resource: &Resource,
    ) -> Result<PathBuf, HandlerError> {
        Self::source_path(object, resource).ok_or(HandlerError::MissingSource {
            object_id: object.id,
            index,
        })
    }
}

#[async_trait]
impl MetadataHandler for FileMetadataHandler {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn describe(
        &self,
        object: &CatalogObject,
        index: usize,
        resource: &Resource,
    ) -> Result<ResourceInfo, HandlerError> {
        let path = Self::require_path(object, index, resource)?;
        let metadata = tokio::fs::metadata(&path).await?;

        Ok(ResourceInfo {
            mime_type: resource_mime_type(resource),
            size: Some(metadata.len()),
            seekable: true,
        })
    }

    async fn open(
        &self,
        object: &CatalogObject,
        index: usize,
        resource: &Resource,
        range: Option<ByteRange>,
    ) -> Result<ResourceStream, HandlerError> {
        let path = Self::require_path(object, index, resource)?;
        let mut file = File::open(&path).await?;

        tracing::debug!(path = %path.display(), ?range, "Opening resource file");

        let Some(range) = range else {
            return Ok(Box::new(file));
        };

        if !range.is_valid() {
            return Err(HandlerError::InvalidRange {
                start: range.start,
                end: range.end.unwrap_or_default(),
            });
        }

        // Un début au-delà de la fin n'est pas satisfiable
        let size = file.metadata().await?.len();
        if range.start >= size {
            return Err(HandlerError::InvalidRange {
                start: range.start,
                end: range.end.unwrap_or(size),
            });
        }

        file.seek(SeekFrom::Start(range.start)).await?;
        match range.len() {
            Some(len) => Ok(Box::new(file.take(len))),
            None => Ok(Box::new(file)),
        }
    }
}
