//! Ressources binaires attachées à un objet du catalogue.
//!
//! Le *rôle* d'une ressource ([`ResourcePurpose`]) et le *handler* qui l'a
//! produite ([`ContentHandler`]) sont deux énumérations indépendantes : le
//! premier pilote le rendu DIDL-Lite et la forme des URLs, le second le choix
//! du fournisseur de contenu côté serveur.

use std::collections::BTreeMap;

use crate::protocol_info::ProtocolInfo;

/// Rôle d'une ressource dans l'objet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourcePurpose {
    /// Flux principal (audio, vidéo, image)
    Content,
    /// Vignette / pochette d'un item
    Thumbnail,
    /// Sous-titres
    Subtitle,
    /// Pochette d'un container
    ContainerArt,
}

impl ResourcePurpose {
    /// Ressource utilisée comme `upnp:albumArtURI` plutôt que comme `res`
    pub fn is_artwork(self) -> bool {
        matches!(self, ResourcePurpose::Thumbnail | ResourcePurpose::ContainerArt)
    }
}

/// Handler ayant produit la ressource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentHandler {
    Default,
    Id3,
    Flac,
    Subtitle,
    FanArt,
    ContainerArt,
    Transcode,
    ExtUrl,
}

impl ContentHandler {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentHandler::Default => "default",
            ContentHandler::Id3 => "id3",
            ContentHandler::Flac => "flac",
            ContentHandler::Subtitle => "subtitle",
            ContentHandler::FanArt => "fanart",
            ContentHandler::ContainerArt => "containerart",
            ContentHandler::Transcode => "transcode",
            ContentHandler::ExtUrl => "exturl",
        }
    }
}

impl std::fmt::Display for ContentHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribut d'une ressource
///
/// L'ordre de déclaration est l'ordre d'émission des attributs de `<res>`.
/// Les attributs sans nom DIDL-Lite ([`ResourceAttribute::xml_name`] renvoie
/// `None`) restent internes au serveur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceAttribute {
    Size,
    Duration,
    Bitrate,
    SampleFrequency,
    NrAudioChannels,
    BitsPerSample,
    Resolution,
    ColorDepth,
    ProtocolInfo,
    ResourceFile,
    Language,
    AudioCodec,
    VideoCodec,
}

impl ResourceAttribute {
    /// Nom de l'attribut `<res>` correspondant
    pub fn xml_name(self) -> Option<&'static str> {
        match self {
            ResourceAttribute::Size => Some("size"),
            ResourceAttribute::Duration => Some("duration"),
            ResourceAttribute::Bitrate => Some("bitrate"),
            ResourceAttribute::SampleFrequency => Some("sampleFrequency"),
            ResourceAttribute::NrAudioChannels => Some("nrAudioChannels"),
            ResourceAttribute::BitsPerSample => Some("bitsPerSample"),
            ResourceAttribute::Resolution => Some("resolution"),
            ResourceAttribute::ColorDepth => Some("colorDepth"),
            ResourceAttribute::ProtocolInfo => Some("protocolInfo"),
            ResourceAttribute::ResourceFile
            | ResourceAttribute::Language
            | ResourceAttribute::AudioCodec
            | ResourceAttribute::VideoCodec => None,
        }
    }
}

/// Une ressource d'un objet du catalogue
///
/// Son identité est sa position dans la liste des ressources de l'objet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub purpose: ResourcePurpose,
    pub handler: ContentHandler,
    attributes: BTreeMap<ResourceAttribute, String>,
    parameters: BTreeMap<String, String>,
}

impl Resource {
    pub fn new(handler: ContentHandler, purpose: ResourcePurpose) -> Self {
        Self {
            purpose,
            handler,
            attributes: BTreeMap::new(),
            parameters: BTreeMap::new(),
        }
    }

    /// Ajoute un attribut (forme chaînable)
    pub fn with_attribute(mut self, attribute: ResourceAttribute, value: impl Into<String>) -> Self {
        self.add_attribute(attribute, value);
        self
    }

    /// Ajoute un paramètre d'URL (forme chaînable)
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_parameter(key, value);
        self
    }

    pub fn add_attribute(&mut self, attribute: ResourceAttribute, value: impl Into<String>) {
        self.attributes.insert(attribute, value.into());
    }

    pub fn add_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    pub fn attribute(&self, attribute: ResourceAttribute) -> Option<&str> {
        self.attributes.get(&attribute).map(String::as_str)
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// Attributs présents, dans l'ordre de [`ResourceAttribute`]
    pub fn attributes(&self) -> impl Iterator<Item = (ResourceAttribute, &str)> {
        self.attributes.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Protocol-info stocké, analysé
    pub fn protocol_info(&self) -> Option<ProtocolInfo> {
        self.attribute(ResourceAttribute::ProtocolInfo)
            .map(ProtocolInfo::parse)
    }

    /// Type MIME (champ contentFormat du protocol-info)
    pub fn mime_type(&self) -> Option<String> {
        self.protocol_info().map(|pi| pi.content_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_iterate_in_rendering_order() {
        let res = Resource::new(ContentHandler::Default, ResourcePurpose::Content)
            .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:audio/mpeg:*")
            .with_attribute(ResourceAttribute::NrAudioChannels, "2")
            .with_attribute(ResourceAttribute::Size, "4711")
            .with_attribute(ResourceAttribute::Bitrate, "16044");

        let order: Vec<ResourceAttribute> = res.attributes().map(|(a, _)| a).collect();
        assert_eq!(
            order,
            vec![
                ResourceAttribute::Size,
                ResourceAttribute::Bitrate,
                ResourceAttribute::NrAudioChannels,
                ResourceAttribute::ProtocolInfo,
            ]
        );
    }

    #[test]
    fn test_mime_type_from_protocol_info() {
        let res = Resource::new(ContentHandler::Default, ResourcePurpose::Content)
            .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:audio/flac:*");
        assert_eq!(res.mime_type().as_deref(), Some("audio/flac"));

        let bare = Resource::new(ContentHandler::Default, ResourcePurpose::Content);
        assert_eq!(bare.mime_type(), None);
    }

    #[test]
    fn test_internal_attributes_have_no_xml_name() {
        assert_eq!(ResourceAttribute::ResourceFile.xml_name(), None);
        assert_eq!(ResourceAttribute::Size.xml_name(), Some("size"));
        assert!(ResourcePurpose::ContainerArt.is_artwork());
        assert!(!ResourcePurpose::Subtitle.is_artwork());
    }
}
