//! # Locator - Codec des URLs de ressources
//!
//! Chaque ressource exposée par le serveur est accessible par un chemin
//! auto-descriptif, construit à partir de l'identifiant de l'objet et de la
//! position de la ressource dans sa liste :
//!
//! ```text
//! content/<media|online>/object_id/<id>/res_id/<idx>[/group/<g>][/type/<t>][/pr_name/<p>/tr/1][/ext/file.<ext>]
//! ```
//!
//! L'ordre et le nom des segments font partie du contrat avec les clients.
//! Le décodage est permissif : les segments inconnus sont ignorés, ce qui
//! permet d'ajouter des suffixes purement cosmétiques.
//!
//! ## Exemple
//!
//! ```rust
//! use pmodidl::ResourceLocator;
//!
//! let locator = ResourceLocator::new(42, 0)
//!     .with_group("default")
//!     .with_extension("mp3");
//! let path = locator.encode_path();
//! assert_eq!(path, "content/media/object_id/42/res_id/0/group/default/ext/file.mp3");
//! assert_eq!(ResourceLocator::decode_path(&path).unwrap(), locator);
//! ```

use std::fmt;
use std::str::FromStr;

use tracing::trace;
use url::Url;

use crate::error::LocatorError;
use crate::protocol_info::extension_for_mime;
use crate::resource::{Resource, ResourcePurpose};
use crate::transcoding::TranscodingProfile;

const SEG_CONTENT: &str = "content";
const SEG_OBJECT_ID: &str = "object_id";
const SEG_RES_ID: &str = "res_id";
const SEG_GROUP: &str = "group";
const SEG_TYPE: &str = "type";
const SEG_PROFILE: &str = "pr_name";
const SEG_TRANSCODE: &str = "tr";
const SEG_EXT: &str = "ext";

/// Préfixe du nom de fichier synthétique du segment `ext`
const FILE_PREFIX: &str = "file.";

/// Groupe utilisé quand la ressource n'en précise pas
pub const DEFAULT_GROUP: &str = "default";

/// Paramètre de ressource portant le nom de groupe
pub const GROUP_PARAMETER: &str = "group";

/// Paramètre de ressource portant le type de sous-titres
pub const TYPE_PARAMETER: &str = "type";

/// Racine virtuelle d'un chemin de ressource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VirtualRoot {
    /// Contenu servi depuis le catalogue local
    #[default]
    Media,
    /// Contenu relayé depuis un service en ligne
    Online,
}

impl VirtualRoot {
    pub fn as_str(self) -> &'static str {
        match self {
            VirtualRoot::Media => "media",
            VirtualRoot::Online => "online",
        }
    }

    /// Préfixe complet (`content/media`, `content/online`)
    pub fn prefix(self) -> String {
        format!("{}/{}", SEG_CONTENT, self.as_str())
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "media" => Some(VirtualRoot::Media),
            "online" => Some(VirtualRoot::Online),
            _ => None,
        }
    }
}

/// Identité d'une ressource telle que portée par son URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ResourceLocator {
    pub root: VirtualRoot,
    pub object_id: i64,
    pub resource_index: usize,
    pub group: Option<String>,
    pub subtitle_type: Option<String>,
    pub transcode_profile: Option<String>,
    /// Texte suivant `file.` dans le segment `ext` (`mp3`, `subtitle.srt`)
    pub extension: Option<String>,
}

impl ResourceLocator {
    pub fn new(object_id: i64, resource_index: usize) -> Self {
        Self {
            object_id,
            resource_index,
            ..Self::default()
        }
    }

    /// Forme nue, utilisée pour les pochettes et la première ressource
    pub fn album_art(object_id: i64, resource_index: usize) -> Self {
        Self::new(object_id, resource_index)
    }

    /// Item externe relayé : toujours la ressource 0 sous la racine `online`
    pub fn online(object_id: i64) -> Self {
        Self::new(object_id, 0).with_root(VirtualRoot::Online)
    }

    /// Forme `sec:CaptionInfoEx` : type et extension, sans groupe
    pub fn caption(object_id: i64, resource_index: usize, resource: &Resource) -> Self {
        let subtitle_type = subtitle_type(resource);
        Self::new(object_id, resource_index)
            .with_extension(format!("subtitle.{}", subtitle_type))
            .with_subtitle_type(subtitle_type)
    }

    /// Forme `res` : groupe, type éventuel pour les sous-titres, extension
    pub fn content(object_id: i64, resource_index: usize, resource: &Resource) -> Self {
        let mut locator = Self::new(object_id, resource_index).with_group(resource_group(resource));

        if resource.purpose == ResourcePurpose::Subtitle {
            let subtitle_type = subtitle_type(resource);
            locator = locator
                .with_extension(format!("subtitle.{}", subtitle_type))
                .with_subtitle_type(subtitle_type);
        } else if let Some(mime) = resource.mime_type() {
            locator = locator.with_extension(extension_for_mime(&mime));
        }

        locator
    }

    /// Forme transcodée : groupe, profil, extension du type produit
    pub fn transcoded(
        object_id: i64,
        resource_index: usize,
        resource: &Resource,
        profile: &TranscodingProfile,
    ) -> Self {
        Self::new(object_id, resource_index)
            .with_group(resource_group(resource))
            .with_transcode_profile(profile.name.clone())
            .with_extension(extension_for_mime(&profile.target_mime))
    }

    pub fn with_root(mut self, root: VirtualRoot) -> Self {
        self.root = root;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = non_empty(group.into());
        self
    }

    pub fn with_subtitle_type(mut self, subtitle_type: impl Into<String>) -> Self {
        self.subtitle_type = non_empty(subtitle_type.into());
        self
    }

    pub fn with_transcode_profile(mut self, profile: impl Into<String>) -> Self {
        self.transcode_profile = non_empty(profile.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn is_transcoded(&self) -> bool {
        self.transcode_profile.is_some()
    }

    /// Encode le chemin relatif (sans `/` initial)
    pub fn encode_path(&self) -> String {
        let mut segments: Vec<String> = vec![
            SEG_CONTENT.to_string(),
            self.root.as_str().to_string(),
            SEG_OBJECT_ID.to_string(),
            self.object_id.to_string(),
            SEG_RES_ID.to_string(),
            self.resource_index.to_string(),
        ];

        let mut push = |key: &str, value: &str| {
            segments.push(key.to_string());
            segments.push(urlencoding::encode(value).into_owned());
        };

        if let Some(group) = &self.group {
            push(SEG_GROUP, group);
        }
        if let Some(subtitle_type) = &self.subtitle_type {
            push(SEG_TYPE, subtitle_type);
        }
        if let Some(profile) = &self.transcode_profile {
            push(SEG_PROFILE, profile);
            push(SEG_TRANSCODE, "1");
        }
        if let Some(extension) = &self.extension {
            push(SEG_EXT, &format!("{}{}", FILE_PREFIX, extension));
        }

        segments.join("/")
    }

    /// URL absolue sous l'URL virtuelle du serveur
    pub fn to_url(&self, virtual_url: &str) -> String {
        format!("{}/{}", virtual_url.trim_end_matches('/'), self.encode_path())
    }

    /// Décode un chemin (ou une URL absolue) de ressource
    ///
    /// `object_id` et `res_id` sont obligatoires et numériques ; les autres
    /// segments sont optionnels et les segments inconnus ignorés.
    pub fn decode_path(path: &str) -> Result<Self, LocatorError> {
        let path = match Url::parse(path) {
            Ok(url) => url.path().to_string(),
            Err(_) => path.split(['?', '#']).next().unwrap_or_default().to_string(),
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // Tout ce qui précède `content/<racine>` est ignoré
        let (root, start) = segments
            .windows(2)
            .position(|pair| pair[0] == SEG_CONTENT && VirtualRoot::from_segment(pair[1]).is_some())
            .and_then(|pos| VirtualRoot::from_segment(segments[pos + 1]).map(|root| (root, pos + 2)))
            .unwrap_or((VirtualRoot::Media, 0));

        let mut object_id = None;
        let mut resource_index = None;
        let mut locator = Self {
            root,
            ..Self::default()
        };

        let mut i = start;
        while i < segments.len() {
            let key = segments[i];
            let value = segments.get(i + 1).map(|v| decode_segment(v));

            match (key, value) {
                (SEG_OBJECT_ID, Some(v)) => object_id = Some(parse_number::<i64>(SEG_OBJECT_ID, &v)?),
                (SEG_RES_ID, Some(v)) => resource_index = Some(parse_number::<usize>(SEG_RES_ID, &v)?),
                (SEG_GROUP, Some(v)) => locator.group = Some(v),
                (SEG_TYPE, Some(v)) => locator.subtitle_type = Some(v),
                (SEG_PROFILE, Some(v)) => locator.transcode_profile = Some(v),
                (SEG_TRANSCODE, Some(_)) => {}
                (SEG_EXT, Some(v)) => {
                    locator.extension = Some(v.strip_prefix(FILE_PREFIX).map(str::to_string).unwrap_or(v))
                }
                _ => {
                    trace!(segment = key, "Ignoring unknown resource path segment");
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        locator.object_id = object_id.ok_or(LocatorError::MissingSegment(SEG_OBJECT_ID))?;
        locator.resource_index = resource_index.ok_or(LocatorError::MissingSegment(SEG_RES_ID))?;
        Ok(locator)
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode_path())
    }
}

impl FromStr for ResourceLocator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode_path(s)
    }
}

/// Groupe d'une ressource : paramètre `group`, sinon `default`
///
/// Une valeur vide compte comme absente : un segment vide ne se décode pas.
pub fn resource_group(resource: &Resource) -> String {
    resource
        .parameter(GROUP_PARAMETER)
        .filter(|group| !group.is_empty())
        .unwrap_or(DEFAULT_GROUP)
        .to_string()
}

/// Type de sous-titres : paramètre `type`, sinon le type MIME stocké, sinon `srt`
pub fn subtitle_type(resource: &Resource) -> String {
    resource
        .parameter(TYPE_PARAMETER)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| resource.mime_type().filter(|mime| !mime.is_empty() && mime != "*"))
        .unwrap_or_else(|| "srt".to_string())
}

/// Un segment vide décalerait toutes les paires clé/valeur suivantes
fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn decode_segment(value: &str) -> String {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

fn parse_number<T: FromStr>(segment: &'static str, value: &str) -> Result<T, LocatorError> {
    value.parse().map_err(|_| LocatorError::InvalidNumber {
        segment,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ContentHandler, ResourceAttribute};

    #[test]
    fn test_bare_form() {
        assert_eq!(
            ResourceLocator::album_art(1, 0).encode_path(),
            "content/media/object_id/1/res_id/0"
        );
        assert_eq!(
            ResourceLocator::online(12345).encode_path(),
            "content/online/object_id/12345/res_id/0"
        );
    }

    #[test]
    fn test_subtitle_forms() {
        let srt = Resource::new(ContentHandler::Subtitle, ResourcePurpose::Subtitle)
            .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:srt:*")
            .with_parameter("type", "srt");

        assert_eq!(
            ResourceLocator::caption(42, 1, &srt).encode_path(),
            "content/media/object_id/42/res_id/1/type/srt/ext/file.subtitle.srt"
        );
        assert_eq!(
            ResourceLocator::content(42, 1, &srt).encode_path(),
            "content/media/object_id/42/res_id/1/group/default/type/srt/ext/file.subtitle.srt"
        );
    }

    #[test]
    fn test_subtitle_type_falls_back_to_mime() {
        let vtt = Resource::new(ContentHandler::Subtitle, ResourcePurpose::Subtitle)
            .with_attribute(ResourceAttribute::ProtocolInfo, "http-get:*:vtt:*");
        assert_eq!(subtitle_type(&vtt), "vtt");
    }

    #[test]
    fn test_segment_values_are_percent_encoded() {
        let locator = ResourceLocator::new(7, 2).with_group("my group/1");
        let path = locator.encode_path();
        assert_eq!(path, "content/media/object_id/7/res_id/2/group/my%20group%2F1");
        assert_eq!(ResourceLocator::decode_path(&path), Ok(locator));
    }

    #[test]
    fn test_decode_strips_url_parts() {
        let expected = ResourceLocator::new(42, 0)
            .with_group("default")
            .with_extension("mp3");

        for path in [
            "http://server:8080/content/media/object_id/42/res_id/0/group/default/ext/file.mp3",
            "/content/media/object_id/42/res_id/0/group/default/ext/file.mp3?seek=1",
            "/prefix/content/media/object_id/42/res_id/0/group/default/ext/file.mp3",
            "object_id/42/res_id/0/group/default/ext/file.mp3",
        ] {
            assert_eq!(ResourceLocator::decode_path(path), Ok(expected.clone()), "{}", path);
        }
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            ResourceLocator::decode_path("content/media/res_id/0"),
            Err(LocatorError::MissingSegment("object_id"))
        );
        assert_eq!(
            ResourceLocator::decode_path("content/media/object_id/12"),
            Err(LocatorError::MissingSegment("res_id"))
        );
        assert_eq!(
            ResourceLocator::decode_path("content/media/object_id/abc/res_id/0"),
            Err(LocatorError::InvalidNumber {
                segment: "object_id",
                value: "abc".to_string()
            })
        );
        assert!("content/media/object_id/1/res_id/-1".parse::<ResourceLocator>().is_err());
    }
}
