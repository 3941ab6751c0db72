//! # pmodidl - Codec DIDL-Lite du ContentDirectory
//!
//! Ce crate transforme les objets du catalogue en fragments DIDL-Lite et
//! fournit le codec des URLs par lesquelles les clients accèdent aux
//! ressources.
//!
//! ## Composants
//!
//! - [`protocol_info`] : chaînes `protocolInfo` et drapeaux DLNA
//! - [`locator`] : encodage et décodage des chemins de ressources
//! - [`renderer`] : rendu `<container>` / `<item>` et document `DIDL-Lite`
//! - [`object`], [`metadata`], [`resource`] : modèle des objets du catalogue
//!
//! Toutes les opérations sont pures et synchrones ; un [`DidlBuilder`] peut
//! être partagé entre tâches sans verrou.
//!
//! ## Exemple
//!
//! ```rust
//! use pmodidl::{
//!     CatalogObject, ContentHandler, DidlBuilder, Resource, ResourceAttribute,
//!     ResourcePurpose, ResourceSelection, upnp_class,
//! };
//!
//! let track = CatalogObject::item()
//!     .with_id(42)
//!     .with_parent_id(1)
//!     .with_title("Track")
//!     .with_class(upnp_class::MUSIC_TRACK)
//!     .with_resource(
//!         Resource::new(ContentHandler::Default, ResourcePurpose::Content)
//!             .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:audio/mpeg:*"),
//!     );
//!
//! let builder = DidlBuilder::new("http://192.168.0.10:8080/");
//! let didl = builder.render_didl([&track], ResourceSelection::All).unwrap();
//! assert!(didl.contains("content/media/object_id/42/res_id/0/group/default/ext/file.mp3"));
//! ```

pub mod error;
pub mod locator;
pub mod metadata;
pub mod object;
pub mod protocol_info;
pub mod renderer;
pub mod resource;
pub mod transcoding;

pub use error::{DidlError, LocatorError};
pub use locator::{ResourceLocator, VirtualRoot};
pub use metadata::{MetadataField, MetadataMap};
pub use object::{upnp_class, CatalogObject, ObjectFlags, ObjectKind};
pub use protocol_info::{
    extend_protocol_info, render_protocol_info, synthesize, ProtocolInfo, ProtocolInfoSpec,
};
pub use renderer::{to_xml_string, DidlBuilder, ResourceSelection};
pub use resource::{ContentHandler, Resource, ResourceAttribute, ResourcePurpose};
pub use transcoding::{TranscodingLookup, TranscodingProfile};
