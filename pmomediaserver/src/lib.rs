//! Module MediaServer UPnP : service des ressources du catalogue.
//!
//! Ce crate relie le codec DIDL-Lite ([`pmodidl`]) aux collaborateurs du
//! serveur : le catalogue, les handlers de contenu et les enveloppes SOAP.
//!
//! # Architecture
//!
//! - [`Catalog`] : accès aux objets par identifiant ([`MemoryCatalog`] en mémoire)
//! - [`MetadataHandler`] : description et ouverture d'une ressource
//! - [`MetadataService`] : registre des handlers par [`ContentHandler`](pmodidl::ContentHandler)
//! - [`RequestResolver`] : chemin de requête → objet, ressource et handler
//! - [`contentdirectory`] : réponses `Browse` et événements `SystemUpdateID`
//!
//! Le catalogue et le registre sont injectés à la construction : aucun état
//! global n'est utilisé.
//!
//! # Utilisation de base
//!
//! ```no_run
//! use std::sync::Arc;
//! use pmomediaserver::{MemoryCatalog, MetadataService, RequestResolver};
//!
//! # async fn serve() -> Result<(), pmomediaserver::ResolveError> {
//! let catalog = Arc::new(MemoryCatalog::new());
//! let resolver = RequestResolver::new(catalog, MetadataService::with_file_handlers());
//!
//! let info = resolver
//!     .get_info("/content/media/object_id/42/res_id/0/group/default/ext/file.mp3")
//!     .await?;
//! println!("{} ({:?} bytes)", info.mime_type, info.size);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod contentdirectory;
pub mod handler;
pub mod registry;
pub mod resolver;

pub use catalog::{Catalog, CatalogError, MemoryCatalog};
pub use handler::{
    ByteRange, FileMetadataHandler, HandlerError, MetadataHandler, ResourceInfo, ResourceStream,
};
pub use registry::MetadataService;
pub use resolver::{RequestResolver, ResolveError, ResourceHandle};
