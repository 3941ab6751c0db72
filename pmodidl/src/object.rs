//! Objets du catalogue : containers, items et items à URL externe.

use bitflags::bitflags;

use crate::metadata::{MetadataField, MetadataMap};
use crate::resource::Resource;

/// Classes UPnP usuelles
pub mod upnp_class {
    pub const CONTAINER: &str = "object.container";
    pub const MUSIC_ALBUM: &str = "object.container.album.musicAlbum";
    pub const MUSIC_ARTIST: &str = "object.container.person.musicArtist";
    pub const MUSIC_GENRE: &str = "object.container.genre.musicGenre";
    pub const PLAYLIST_CONTAINER: &str = "object.container.playlistContainer";
    pub const ITEM: &str = "object.item";
    pub const AUDIO_ITEM: &str = "object.item.audioItem";
    pub const MUSIC_TRACK: &str = "object.item.audioItem.musicTrack";
    pub const AUDIO_BROADCAST: &str = "object.item.audioItem.audioBroadcast";
    pub const VIDEO_ITEM: &str = "object.item.videoItem";
    pub const IMAGE_ITEM: &str = "object.item.imageItem";
}

bitflags! {
    /// Drapeaux d'un objet du catalogue
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u32 {
        const RESTRICTED_ACCESS = 0x0000_0001;
        const SEARCHABLE = 0x0000_0002;
        const USE_RESOURCE_REF = 0x0000_0004;
        const PERSISTENT_CONTAINER = 0x0000_0008;
        const PLAYLIST_REF = 0x0000_0010;
        const PROXY_URL = 0x0000_0020;
        const ONLINE_SERVICE = 0x0000_0040;
        const OGG_THEORA = 0x0000_0080;
    }
}

/// Variante d'objet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Container {
        child_count: Option<u32>,
    },
    Item {
        /// Emplacement local du contenu (chemin de fichier)
        location: Option<String>,
    },
    ExternalUrl {
        /// URI distante du contenu
        location: String,
    },
}

/// Un objet du catalogue, en lecture seule pour le codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogObject {
    pub id: i64,
    pub parent_id: i64,
    pub title: String,
    pub class: String,
    pub restricted: bool,
    pub metadata: MetadataMap,
    pub resources: Vec<Resource>,
    pub flags: ObjectFlags,
    pub kind: ObjectKind,
}

impl CatalogObject {
    fn with_kind(kind: ObjectKind, class: &str) -> Self {
        Self {
            id: 0,
            parent_id: 0,
            title: String::new(),
            class: class.to_string(),
            restricted: true,
            metadata: MetadataMap::new(),
            resources: Vec::new(),
            flags: ObjectFlags::empty(),
            kind,
        }
    }

    /// Container vide de classe `object.container`
    pub fn container() -> Self {
        Self::with_kind(ObjectKind::Container { child_count: None }, upnp_class::CONTAINER)
    }

    /// Item vide de classe `object.item`
    pub fn item() -> Self {
        Self::with_kind(ObjectKind::Item { location: None }, upnp_class::ITEM)
    }

    /// Item pointant vers une URI distante
    pub fn external_url(location: impl Into<String>) -> Self {
        Self::with_kind(
            ObjectKind::ExternalUrl {
                location: location.into(),
            },
            upnp_class::ITEM,
        )
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, ObjectKind::Container { .. })
    }

    pub fn is_item(&self) -> bool {
        !self.is_container()
    }

    /// Emplacement du contenu, pour les items
    pub fn location(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Container { .. } => None,
            ObjectKind::Item { location } => location.as_deref(),
            ObjectKind::ExternalUrl { location } => Some(location),
        }
    }

    pub fn has_flag(&self, flag: ObjectFlags) -> bool {
        self.flags.contains(flag)
    }

    pub fn set_flag(&mut self, flag: ObjectFlags) {
        self.flags.insert(flag);
    }

    pub fn clear_flag(&mut self, flag: ObjectFlags) {
        self.flags.remove(flag);
    }

    /// Item externe servi par le serveur plutôt que par son URI d'origine
    pub fn is_proxied(&self) -> bool {
        matches!(self.kind, ObjectKind::ExternalUrl { .. }) && self.has_flag(ObjectFlags::PROXY_URL)
    }

    pub fn add_metadata(&mut self, field: MetadataField, value: impl Into<String>) {
        self.metadata.add(field, value);
    }

    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn resource(&self, index: usize) -> Option<&Resource> {
        self.resources.get(index)
    }

    // Setters chaînables, pratiques pour la couche d'import et les tests

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_parent_id(mut self, parent_id: i64) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_restricted(mut self, restricted: bool) -> Self {
        self.restricted = restricted;
        self
    }

    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_metadata(mut self, field: MetadataField, value: impl Into<String>) -> Self {
        self.add_metadata(field, value);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.add_resource(resource);
        self
    }

    /// Emplacement local d'un item (sans effet sur les autres variantes)
    pub fn with_location(mut self, path: impl Into<String>) -> Self {
        match &mut self.kind {
            ObjectKind::Item { location } => *location = Some(path.into()),
            ObjectKind::ExternalUrl { location } => *location = path.into(),
            ObjectKind::Container { .. } => {}
        }
        self
    }

    /// Nombre d'enfants d'un container (sans effet sur les items)
    pub fn with_child_count(mut self, count: u32) -> Self {
        if let ObjectKind::Container { child_count } = &mut self.kind {
            *child_count = Some(count);
        }
        self
    }
}
