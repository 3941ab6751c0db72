//! # Resolver - Résolution des requêtes de ressources
//!
//! Le [`RequestResolver`] retrouve, à partir du chemin d'une requête HTTP,
//! l'objet du catalogue, la ressource demandée et le handler chargé de la
//! servir :
//!
//! 1. décodage du chemin ([`ResourceLocator`])
//! 2. lecture de l'objet dans le [`Catalog`]
//! 3. vérification de l'index de ressource
//! 4. choix du handler dans le [`MetadataService`]
//!
//! La résolution n'a aucun effet de bord : résoudre deux fois le même chemin
//! donne deux handles équivalents.

use std::fmt;
use std::sync::Arc;

use pmodidl::{CatalogObject, ContentHandler, LocatorError, Resource, ResourceLocator};
use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::handler::{ByteRange, HandlerError, MetadataHandler, ResourceInfo, ResourceStream};
use crate::registry::MetadataService;

/// Erreurs de résolution d'une requête
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Malformed resource locator: {0}")]
    MalformedLocator(#[from] LocatorError),

    #[error("Object {0} not found")]
    ObjectNotFound(i64),

    #[error("Resource {index} out of range for object {object_id} ({count} resources)")]
    ResourceIndexOutOfRange {
        object_id: i64,
        index: usize,
        count: usize,
    },

    #[error("No metadata handler registered for '{0}'")]
    NoHandler(ContentHandler),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

impl ResolveError {
    /// Code de statut HTTP à renvoyer au client
    pub fn status_code(&self) -> u16 {
        match self {
            ResolveError::MalformedLocator(_) => 400,
            ResolveError::ObjectNotFound(_) | ResolveError::ResourceIndexOutOfRange { .. } => 404,
            ResolveError::NoHandler(_) => 501,
            ResolveError::Handler(HandlerError::MissingSource { .. }) => 404,
            ResolveError::Handler(HandlerError::InvalidRange { .. }) => 416,
            ResolveError::Handler(HandlerError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => 404,
            ResolveError::Catalog(_) | ResolveError::Handler(_) => 500,
        }
    }
}

impl From<CatalogError> for ResolveError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => ResolveError::ObjectNotFound(id),
            CatalogError::Backend(msg) => ResolveError::Catalog(msg),
        }
    }
}

/// Résultat d'une résolution : objet, ressource et handler choisis
///
/// Les champs ne sont pas modifiables : l'index a été vérifié contre la
/// liste de ressources de l'objet lors de la résolution.
#[derive(Clone)]
pub struct ResourceHandle {
    locator: ResourceLocator,
    object: Arc<CatalogObject>,
    resource_index: usize,
    handler_tag: ContentHandler,
    handler: Arc<dyn MetadataHandler>,
}

impl ResourceHandle {
    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    pub fn object(&self) -> &Arc<CatalogObject> {
        &self.object
    }

    pub fn resource_index(&self) -> usize {
        self.resource_index
    }

    /// Étiquette ayant servi au choix du handler
    pub fn handler_tag(&self) -> ContentHandler {
        self.handler_tag
    }

    /// Ressource demandée
    pub fn resource(&self) -> &Resource {
        &self.object.resources[self.resource_index]
    }

    pub fn handler(&self) -> &Arc<dyn MetadataHandler> {
        &self.handler
    }

    /// Description de la ressource par son handler
    pub async fn describe(&self) -> Result<ResourceInfo, ResolveError> {
        Ok(self
            .handler
            .describe(&self.object, self.resource_index, self.resource())
            .await?)
    }

    /// Contenu de la ressource, éventuellement à partir d'une plage d'octets
    pub async fn open(&self, range: Option<ByteRange>) -> Result<ResourceStream, ResolveError> {
        Ok(self
            .handler
            .open(&self.object, self.resource_index, self.resource(), range)
            .await?)
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("locator", &self.locator)
            .field("object_id", &self.object.id)
            .field("resource_index", &self.resource_index)
            .field("handler_tag", &self.handler_tag)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Résolveur des requêtes de ressources
#[derive(Clone)]
pub struct RequestResolver {
    catalog: Arc<dyn Catalog>,
    metadata_service: MetadataService,
}

impl RequestResolver {
    pub fn new(catalog: Arc<dyn Catalog>, metadata_service: MetadataService) -> Self {
        Self {
            catalog,
            metadata_service,
        }
    }

    pub fn metadata_service(&self) -> &MetadataService {
        &self.metadata_service
    }

    /// Résout le chemin d'une requête
    pub async fn resolve(&self, path: &str) -> Result<ResourceHandle, ResolveError> {
        match self.resolve_inner(path).await {
            Ok(handle) => {
                tracing::debug!(
                    path = %path,
                    object_id = handle.object.id,
                    resource_index = handle.resource_index,
                    handler = %handle.handler_tag,
                    "Resolved resource request"
                );
                Ok(handle)
            }
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "Failed to resolve resource request");
                Err(err)
            }
        }
    }

    async fn resolve_inner(&self, path: &str) -> Result<ResourceHandle, ResolveError> {
        let locator = ResourceLocator::decode_path(path)?;
        let object = self.catalog.get_object_by_id(locator.object_id).await?;

        let count = object.resources.len();
        let resource_index = locator.resource_index;
        let Some(resource) = object.resource(resource_index) else {
            return Err(ResolveError::ResourceIndexOutOfRange {
                object_id: object.id,
                index: resource_index,
                count,
            });
        };

        let handler_tag = if locator.is_transcoded() {
            ContentHandler::Transcode
        } else {
            resource.handler
        };

        let handler = self
            .metadata_service
            .handler_for(handler_tag)
            .ok_or(ResolveError::NoHandler(handler_tag))?;

        Ok(ResourceHandle {
            locator,
            object,
            resource_index,
            handler_tag,
            handler,
        })
    }

    /// Informations de la ressource désignée par `path`
    pub async fn get_info(&self, path: &str) -> Result<ResourceInfo, ResolveError> {
        let handle = self.resolve(path).await?;
        handle.describe().await.inspect_err(|err| {
            tracing::warn!(path = %path, error = %err, "Failed to describe resource");
        })
    }

    /// Ouvre la ressource désignée par `path`
    pub async fn open(
        &self,
        path: &str,
        range: Option<ByteRange>,
    ) -> Result<ResourceStream, ResolveError> {
        let handle = self.resolve(path).await?;
        handle.open(range).await.inspect_err(|err| {
            tracing::warn!(path = %path, error = %err, "Failed to open resource");
        })
    }
}
