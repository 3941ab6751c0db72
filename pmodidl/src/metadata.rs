//! Vocabulaire fermé des métadonnées d'un objet du catalogue.
//!
//! Chaque clé correspond à exactement un élément DIDL-Lite. L'ordre de
//! déclaration des variantes de [`MetadataField`] est l'ordre de rendu :
//! les éléments sont triés par nom qualifié (`dc:*` puis `upnp:*`).

use std::collections::BTreeMap;

/// Clé de métadonnée
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataField {
    Creator,
    Date,
    Description,
    Publisher,
    Actor,
    Album,
    AlbumArtist,
    Artist,
    Author,
    Composer,
    Conductor,
    UpnpDate,
    Director,
    Genre,
    LongDescription,
    Orchestra,
    TrackNumber,
    Producer,
}

impl MetadataField {
    /// Toutes les clés, dans l'ordre de rendu
    pub const ALL: [MetadataField; 18] = [
        MetadataField::Creator,
        MetadataField::Date,
        MetadataField::Description,
        MetadataField::Publisher,
        MetadataField::Actor,
        MetadataField::Album,
        MetadataField::AlbumArtist,
        MetadataField::Artist,
        MetadataField::Author,
        MetadataField::Composer,
        MetadataField::Conductor,
        MetadataField::UpnpDate,
        MetadataField::Director,
        MetadataField::Genre,
        MetadataField::LongDescription,
        MetadataField::Orchestra,
        MetadataField::TrackNumber,
        MetadataField::Producer,
    ];

    /// Nom de l'élément DIDL-Lite
    pub fn element_name(self) -> &'static str {
        match self {
            MetadataField::Creator => "dc:creator",
            MetadataField::Date => "dc:date",
            MetadataField::Description => "dc:description",
            MetadataField::Publisher => "dc:publisher",
            MetadataField::Actor => "upnp:actor",
            MetadataField::Album => "upnp:album",
            MetadataField::AlbumArtist => "upnp:albumArtist",
            MetadataField::Artist => "upnp:artist",
            MetadataField::Author => "upnp:author",
            MetadataField::Composer => "upnp:composer",
            MetadataField::Conductor => "upnp:conductor",
            MetadataField::UpnpDate => "upnp:date",
            MetadataField::Director => "upnp:director",
            MetadataField::Genre => "upnp:genre",
            MetadataField::LongDescription => "upnp:longDescription",
            MetadataField::Orchestra => "upnp:orchestra",
            MetadataField::TrackNumber => "upnp:originalTrackNumber",
            MetadataField::Producer => "upnp:producer",
        }
    }

    /// Nom court de la clé, tel qu'utilisé par la couche d'import
    pub fn key(self) -> &'static str {
        match self {
            MetadataField::Creator => "creator",
            MetadataField::Date => "date",
            MetadataField::Description => "description",
            MetadataField::Publisher => "publisher",
            MetadataField::Actor => "actor",
            MetadataField::Album => "album",
            MetadataField::AlbumArtist => "albumartist",
            MetadataField::Artist => "artist",
            MetadataField::Author => "author",
            MetadataField::Composer => "composer",
            MetadataField::Conductor => "conductor",
            MetadataField::UpnpDate => "upnpdate",
            MetadataField::Director => "director",
            MetadataField::Genre => "genre",
            MetadataField::LongDescription => "longdescription",
            MetadataField::Orchestra => "orchestra",
            MetadataField::TrackNumber => "tracknumber",
            MetadataField::Producer => "producer",
        }
    }

    /// Retrouve une clé à partir de son nom court (insensible à la casse)
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.key().eq_ignore_ascii_case(key))
    }
}

/// Métadonnées d'un objet : une clé peut porter plusieurs valeurs
///
/// L'itération suit toujours l'ordre de [`MetadataField`], quel que soit
/// l'ordre d'insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataMap {
    entries: BTreeMap<MetadataField, Vec<String>>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute une valeur ; les valeurs vides sont ignorées
    pub fn add(&mut self, field: MetadataField, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        self.entries.entry(field).or_default().push(value);
    }

    /// Remplace toutes les valeurs d'une clé
    pub fn set(&mut self, field: MetadataField, value: impl Into<String>) {
        self.entries.remove(&field);
        self.add(field, value);
    }

    pub fn remove(&mut self, field: MetadataField) -> Option<Vec<String>> {
        self.entries.remove(&field)
    }

    /// Première valeur d'une clé
    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.entries
            .get(&field)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, field: MetadataField) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: MetadataField) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Valeurs d'une clé jointes par `separator`
    pub fn joined(&self, field: MetadataField, separator: &str) -> Option<String> {
        self.entries
            .get(&field)
            .filter(|values| !values.is_empty())
            .map(|values| values.join(separator))
    }

    /// Itère sur les clés présentes, dans l'ordre de rendu
    pub fn iter(&self) -> impl Iterator<Item = (MetadataField, &[String])> {
        self.entries
            .iter()
            .map(|(field, values)| (*field, values.as_slice()))
    }
}
