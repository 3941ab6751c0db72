//! # Renderer - Rendu DIDL-Lite des objets du catalogue
//!
//! Le [`DidlBuilder`] transforme un [`CatalogObject`] en un élément
//! `<container>` ou `<item>` ajouté à un élément parent `xmltree`.
//!
//! Ordre des enfants d'un objet :
//!
//! 1. `dc:title`, `upnp:class`
//! 2. les métadonnées, dans l'ordre de [`MetadataField`]
//! 3. `upnp:albumArtURI` pour la première pochette
//! 4. pour les items : un `sec:CaptionInfoEx` par sous-titre, puis un `res`
//!    par ressource de contenu ou de sous-titres
//!
//! Cet ordre, comme celui des attributs de `res`, est lu positionnellement
//! par certains clients et doit être reproduit à l'octet près.

use pmoconfig::Config;
use tracing::trace;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::DidlError;
use crate::locator::{subtitle_type, ResourceLocator, VirtualRoot};
use crate::metadata::{MetadataField, MetadataMap};
use crate::object::{CatalogObject, ObjectKind};
use crate::protocol_info::{dlna_thumbnail_profile, extend_protocol_info, synthesize};
use crate::resource::{Resource, ResourceAttribute, ResourcePurpose};
use crate::transcoding::{TranscodingLookup, TranscodingProfile};

pub const DIDL_LITE_NAMESPACE: &str = "urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/";
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
pub const UPNP_NAMESPACE: &str = "urn:schemas-upnp-org:metadata-1-0/upnp/";
pub const DLNA_NAMESPACE: &str = "urn:schemas-dlna-org:metadata-1-0";
pub const SEC_NAMESPACE: &str = "http://www.sec.co.kr/";

/// Attributs recopiés sur la variante transcodée d'une ressource
const TRANSCODED_ATTRIBUTES: [ResourceAttribute; 4] = [
    ResourceAttribute::Duration,
    ResourceAttribute::SampleFrequency,
    ResourceAttribute::NrAudioChannels,
    ResourceAttribute::Resolution,
];

/// Sélection des ressources à rendre
///
/// Filtre uniquement les `sec:CaptionInfoEx` et les `res` ; l'objet n'est
/// jamais modifié.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceSelection {
    #[default]
    All,
    Only(usize),
}

impl ResourceSelection {
    pub fn includes(self, index: usize) -> bool {
        match self {
            ResourceSelection::All => true,
            ResourceSelection::Only(selected) => selected == index,
        }
    }
}

/// Générateur de documents DIDL-Lite
#[derive(Debug, Clone)]
pub struct DidlBuilder {
    virtual_url: String,
    entry_separator: String,
    transcoding_profiles: Vec<TranscodingProfile>,
    transcoding_enabled: bool,
}

impl DidlBuilder {
    /// Crée un générateur servant les ressources sous `virtual_url`
    pub fn new(virtual_url: impl Into<String>) -> Self {
        Self {
            virtual_url: virtual_url.into(),
            entry_separator: " / ".to_string(),
            transcoding_profiles: Vec::new(),
            transcoding_enabled: false,
        }
    }

    /// Séparateur utilisé pour aplatir les métadonnées multi-valuées
    pub fn with_entry_separator(mut self, separator: impl Into<String>) -> Self {
        self.entry_separator = separator.into();
        self
    }

    /// Active la proposition de variantes transcodées
    pub fn with_transcoding(mut self, profiles: Vec<TranscodingProfile>) -> Self {
        self.transcoding_profiles = profiles;
        self.transcoding_enabled = true;
        self
    }

    /// Construit un générateur à partir de la configuration
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut builder =
            Self::new(config.get_virtual_url()).with_entry_separator(config.get_entry_separator());
        if config.get_transcoding_enabled()? {
            builder = builder.with_transcoding(config.get_transcoding_profiles()?);
        }
        Ok(builder)
    }

    pub fn virtual_url(&self) -> &str {
        &self.virtual_url
    }

    pub fn entry_separator(&self) -> &str {
        &self.entry_separator
    }

    /// Ajoute l'élément DIDL-Lite de `object` comme dernier enfant de `parent`
    pub fn render_object(
        &self,
        object: &CatalogObject,
        selection: ResourceSelection,
        parent: &mut Element,
    ) {
        trace!(object_id = object.id, class = %object.class, "Rendering DIDL-Lite object");

        let mut element = match &object.kind {
            ObjectKind::Container { .. } => Element::new("container"),
            ObjectKind::Item { .. } | ObjectKind::ExternalUrl { .. } => Element::new("item"),
        };

        set_attribute(&mut element, "id", object.id.to_string());
        set_attribute(&mut element, "parentID", object.parent_id.to_string());
        set_attribute(
            &mut element,
            "restricted",
            if object.restricted { "1" } else { "0" },
        );
        if let ObjectKind::Container {
            child_count: Some(count),
        } = &object.kind
        {
            set_attribute(&mut element, "childCount", count.to_string());
        }

        push_text(&mut element, "dc:title", &object.title);
        push_text(&mut element, "upnp:class", &object.class);

        self.render_metadata(object, &mut element);
        self.render_album_art(object, &mut element);

        if object.is_item() {
            self.render_captions(object, selection, &mut element);
            self.render_resources(object, selection, &mut element);
        }

        parent.children.push(XMLNode::Element(element));
    }

    /// Document `DIDL-Lite` complet, sérialisé sans indentation
    ///
    /// C'est la valeur de l'argument `Result` d'une réponse Browse.
    pub fn render_didl<'a, I>(&self, objects: I, selection: ResourceSelection) -> Result<String, DidlError>
    where
        I: IntoIterator<Item = &'a CatalogObject>,
    {
        let mut root = Element::new("DIDL-Lite");
        set_attribute(&mut root, "xmlns", DIDL_LITE_NAMESPACE);
        set_attribute(&mut root, "xmlns:dc", DC_NAMESPACE);
        set_attribute(&mut root, "xmlns:upnp", UPNP_NAMESPACE);
        set_attribute(&mut root, "xmlns:dlna", DLNA_NAMESPACE);
        set_attribute(&mut root, "xmlns:sec", SEC_NAMESPACE);

        for object in objects {
            self.render_object(object, selection, &mut root);
        }

        to_xml_string(&root)
    }

    /// Chemin de la première ressource, sans l'URL virtuelle
    ///
    /// Un item externe non relayé renvoie son URI d'origine inchangée.
    pub fn first_resource_path(&self, object: &CatalogObject) -> String {
        match &object.kind {
            ObjectKind::ExternalUrl { location } if !object.is_proxied() => location.clone(),
            ObjectKind::ExternalUrl { .. } => ResourceLocator::online(object.id).encode_path(),
            ObjectKind::Container { .. } | ObjectKind::Item { .. } => {
                ResourceLocator::album_art(object.id, 0).encode_path()
            }
        }
    }

    fn render_metadata(&self, object: &CatalogObject, element: &mut Element) {
        let derived;
        let metadata = if object.is_container() {
            derived = container_metadata(&object.metadata, &self.entry_separator);
            &derived
        } else {
            &object.metadata
        };

        for (field, values) in metadata.iter() {
            push_text(element, field.element_name(), &values.join(&self.entry_separator));
        }
    }

    fn render_album_art(&self, object: &CatalogObject, element: &mut Element) {
        let Some((index, resource)) = object
            .resources
            .iter()
            .enumerate()
            .find(|(_, res)| res.purpose.is_artwork())
        else {
            return;
        };

        let mut art = Element::new("upnp:albumArtURI");
        if resource.attribute(ResourceAttribute::Resolution).is_some() {
            if let Some(profile) = resource
                .mime_type()
                .and_then(|mime| dlna_thumbnail_profile(&mime))
            {
                set_attribute(&mut art, "xmlns:dlna", DLNA_NAMESPACE);
                set_attribute(&mut art, "dlna:profileID", profile);
            }
        }

        let url = self.url_for(&ResourceLocator::album_art(object.id, index));
        art.children.push(XMLNode::Text(url));
        element.children.push(XMLNode::Element(art));
    }

    fn render_captions(&self, object: &CatalogObject, selection: ResourceSelection, element: &mut Element) {
        for (index, resource) in object.resources.iter().enumerate() {
            if resource.purpose != ResourcePurpose::Subtitle || !selection.includes(index) {
                continue;
            }

            let mut caption = Element::new("sec:CaptionInfoEx");
            if let Some(protocol_info) = resource.attribute(ResourceAttribute::ProtocolInfo) {
                set_attribute(&mut caption, "protocolInfo", protocol_info);
            }
            set_attribute(&mut caption, "sec:type", subtitle_type(resource));

            let url = self.url_for(&ResourceLocator::caption(object.id, index, resource));
            caption.children.push(XMLNode::Text(url));
            element.children.push(XMLNode::Element(caption));
        }
    }

    fn render_resources(&self, object: &CatalogObject, selection: ResourceSelection, element: &mut Element) {
        for (index, resource) in object.resources.iter().enumerate() {
            if resource.purpose.is_artwork() || !selection.includes(index) {
                continue;
            }

            let original = self.res_element(object, index, resource);
            match self.transcoding_for(object, resource) {
                Some(profile) => {
                    let transcoded = self.transcoded_res_element(object, index, resource, profile);
                    let (first, second) = if profile.first_resource {
                        (transcoded, original)
                    } else {
                        (original, transcoded)
                    };
                    element.children.push(XMLNode::Element(first));
                    element.children.push(XMLNode::Element(second));
                }
                None => element.children.push(XMLNode::Element(original)),
            }
        }
    }

    fn res_element(&self, object: &CatalogObject, index: usize, resource: &Resource) -> Element {
        let mut res = Element::new("res");
        for (attribute, value) in resource.attributes() {
            let Some(name) = attribute.xml_name() else {
                continue;
            };
            if attribute == ResourceAttribute::ProtocolInfo {
                set_attribute(&mut res, name, extend_protocol_info(value));
            } else {
                set_attribute(&mut res, name, value);
            }
        }

        // Seul le flux principal d'un item externe pointe vers la source distante
        let url = match &object.kind {
            ObjectKind::ExternalUrl { location }
                if resource.purpose == ResourcePurpose::Content && !object.is_proxied() =>
            {
                location.clone()
            }
            ObjectKind::ExternalUrl { .. } if resource.purpose == ResourcePurpose::Content => {
                self.url_for(&ResourceLocator::online(object.id))
            }
            _ => self.url_for(&ResourceLocator::content(object.id, index, resource)),
        };
        res.children.push(XMLNode::Text(url));
        res
    }

    fn transcoded_res_element(
        &self,
        object: &CatalogObject,
        index: usize,
        resource: &Resource,
        profile: &TranscodingProfile,
    ) -> Element {
        let mut res = Element::new("res");
        for attribute in TRANSCODED_ATTRIBUTES {
            if let (Some(name), Some(value)) = (attribute.xml_name(), resource.attribute(attribute)) {
                set_attribute(&mut res, name, value);
            }
        }
        let mime = resource.mime_type().unwrap_or_default();
        set_attribute(&mut res, "protocolInfo", synthesize(&mime, Some(profile)));

        let mut locator = ResourceLocator::transcoded(object.id, index, resource, profile);
        if matches!(object.kind, ObjectKind::ExternalUrl { .. }) {
            locator = locator.with_root(VirtualRoot::Online);
        }
        let url = self.url_for(&locator);
        res.children.push(XMLNode::Text(url));
        res
    }

    /// Profil applicable à une ressource de contenu
    ///
    /// Un item externe non relayé n'a pas de variante : le serveur ne voit
    /// jamais son flux.
    fn transcoding_for(&self, object: &CatalogObject, resource: &Resource) -> Option<&TranscodingProfile> {
        if !self.transcoding_enabled || resource.purpose != ResourcePurpose::Content {
            return None;
        }
        if matches!(object.kind, ObjectKind::ExternalUrl { .. }) && !object.is_proxied() {
            return None;
        }
        let mime = resource.mime_type()?;
        self.transcoding_profiles.profile_for(&mime)
    }

    fn url_for(&self, locator: &ResourceLocator) -> String {
        locator.to_url(&self.virtual_url)
    }
}

/// Métadonnées d'un container : le créateur est repris en artiste d'album et artiste
fn container_metadata(metadata: &MetadataMap, separator: &str) -> MetadataMap {
    let mut derived = metadata.clone();
    let creator = [
        MetadataField::AlbumArtist,
        MetadataField::Creator,
        MetadataField::Artist,
    ]
    .into_iter()
    .find_map(|field| metadata.joined(field, separator));

    if let Some(creator) = creator {
        derived.set(MetadataField::Creator, creator.clone());
        derived.set(MetadataField::AlbumArtist, creator.clone());
        derived.set(MetadataField::Artist, creator);
    }
    derived
}

fn set_attribute(element: &mut Element, name: &str, value: impl Into<String>) {
    element.attributes.insert(name.to_string(), value.into());
}

fn push_text(element: &mut Element, name: &str, text: &str) {
    let mut child = Element::new(name);
    child.children.push(XMLNode::Text(text.to_string()));
    element.children.push(XMLNode::Element(child));
}

/// Sérialise un élément sans déclaration ni indentation
pub fn to_xml_string(element: &Element) -> Result<String, DidlError> {
    let mut buf = Vec::new();
    let config = EmitterConfig::new()
        .write_document_declaration(false)
        .perform_indent(false);
    element.write_with_config(&mut buf, config)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectFlags;
    use crate::resource::ContentHandler;

    #[test]
    fn test_selection_filters_by_index() {
        assert!(ResourceSelection::All.includes(3));
        assert!(ResourceSelection::Only(1).includes(1));
        assert!(!ResourceSelection::Only(1).includes(0));
    }

    #[test]
    fn test_container_creator_is_propagated() {
        let mut meta = MetadataMap::new();
        meta.add(MetadataField::Artist, "A");
        meta.add(MetadataField::Artist, "B");

        let derived = container_metadata(&meta, ", ");
        assert_eq!(derived.get(MetadataField::Creator), Some("A, B"));
        assert_eq!(derived.get(MetadataField::AlbumArtist), Some("A, B"));
        assert_eq!(derived.get_all(MetadataField::Artist), ["A, B".to_string()]);
    }

    #[test]
    fn test_child_count_attribute() {
        let builder = DidlBuilder::new("http://server/");
        let container = CatalogObject::container()
            .with_id(3)
            .with_parent_id(0)
            .with_title("Music")
            .with_child_count(12);

        let mut root = Element::new("DIDL-Lite");
        builder.render_object(&container, ResourceSelection::All, &mut root);

        assert_eq!(
            to_xml_string(&root).unwrap(),
            "<DIDL-Lite><container id=\"3\" parentID=\"0\" restricted=\"1\" childCount=\"12\">\
             <dc:title>Music</dc:title><upnp:class>object.container</upnp:class>\
             </container></DIDL-Lite>"
        );
    }

    #[test]
    fn test_external_url_res_keeps_location() {
        let builder = DidlBuilder::new("http://server/");
        let radio = CatalogObject::external_url("http://radio.example/stream")
            .with_id(5)
            .with_resource(
                Resource::new(ContentHandler::ExtUrl, ResourcePurpose::Content)
                    .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:audio/mpeg:*"),
            );

        let mut root = Element::new("DIDL-Lite");
        builder.render_object(&radio, ResourceSelection::All, &mut root);
        let xml = to_xml_string(&root).unwrap();
        assert!(xml.contains(">http://radio.example/stream</res>"));

        let proxied = radio.clone().with_flags(ObjectFlags::PROXY_URL | ObjectFlags::ONLINE_SERVICE);
        let mut root = Element::new("DIDL-Lite");
        builder.render_object(&proxied, ResourceSelection::All, &mut root);
        let xml = to_xml_string(&root).unwrap();
        assert!(xml.contains(">http://server/content/online/object_id/5/res_id/0</res>"));
    }

    #[test]
    fn test_render_didl_declares_namespaces() {
        let builder = DidlBuilder::new("http://server/");
        let item = CatalogObject::item().with_id(1).with_title("T");
        let xml = builder.render_didl([&item], ResourceSelection::All).unwrap();

        assert!(xml.starts_with("<DIDL-Lite xmlns=\"urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/\""));
        assert!(xml.contains("xmlns:sec=\"http://www.sec.co.kr/\""));
        assert!(xml.contains("<item id=\"1\" parentID=\"0\" restricted=\"1\">"));
    }
}
