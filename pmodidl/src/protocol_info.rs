//! # Protocol-Info - Synthèse des chaînes `protocolInfo` et des drapeaux DLNA
//!
//! Une chaîne protocol-info a quatre champs séparés par `:` :
//! `<protocole>:<réseau>:<type MIME>:<informations additionnelles>`.
//!
//! Pour un type sans profil DLNA connu, la forme minimale est produite :
//!
//! ```text
//! http-get:*:audio/flac:*
//! ```
//!
//! Sinon le quatrième champ porte le profil, les opérations de positionnement,
//! l'indicateur de conversion et les drapeaux DLNA (toujours 32 chiffres hexa) :
//!
//! ```text
//! http-get:*:audio/mpeg:DLNA.ORG_PN=MP3;DLNA.ORG_OP=01;DLNA.ORG_CI=0;DLNA.ORG_FLAGS=01700000000000000000000000000000
//! ```
//!
//! Toutes les fonctions de ce module sont pures : un type inconnu ne produit
//! jamais d'erreur, il retombe sur la forme minimale.

use std::fmt;

use crate::transcoding::TranscodingProfile;

pub const PROTOCOL_HTTP_GET: &str = "http-get";

// Drapeaux DLNA (32 bits de poids fort du champ DLNA.ORG_FLAGS)
pub const DLNA_FLAG_SENDER_PACED: u32 = 1 << 31;
pub const DLNA_FLAG_TIME_BASED_SEEK: u32 = 1 << 30;
pub const DLNA_FLAG_BYTE_BASED_SEEK: u32 = 1 << 29;
pub const DLNA_FLAG_PLAY_CONTAINER: u32 = 1 << 28;
pub const DLNA_FLAG_S0_INCREASE: u32 = 1 << 27;
pub const DLNA_FLAG_SN_INCREASE: u32 = 1 << 26;
pub const DLNA_FLAG_RTSP_PAUSE: u32 = 1 << 25;
pub const DLNA_FLAG_STREAMING_TRANSFER_MODE: u32 = 1 << 24;
pub const DLNA_FLAG_INTERACTIVE_TRANSFER_MODE: u32 = 1 << 23;
pub const DLNA_FLAG_BACKGROUND_TRANSFER_MODE: u32 = 1 << 22;
pub const DLNA_FLAG_CONNECTION_STALL: u32 = 1 << 21;
pub const DLNA_FLAG_DLNA_V15: u32 = 1 << 20;

/// Drapeaux des flux audio/vidéo : `01700000`
pub const DLNA_STREAMING_FLAGS: u32 = DLNA_FLAG_STREAMING_TRANSFER_MODE
    | DLNA_FLAG_BACKGROUND_TRANSFER_MODE
    | DLNA_FLAG_CONNECTION_STALL
    | DLNA_FLAG_DLNA_V15;

/// Drapeaux des images, sous-titres et autres contenus : `00d00000`
pub const DLNA_INTERACTIVE_FLAGS: u32 = DLNA_FLAG_INTERACTIVE_TRANSFER_MODE
    | DLNA_FLAG_BACKGROUND_TRANSFER_MODE
    | DLNA_FLAG_DLNA_V15;

/// Opérations : positionnement par plage d'octets
pub const DLNA_OP_BYTE_SEEK: &str = "01";
/// Opérations : aucun positionnement (flux transcodé)
pub const DLNA_OP_NONE: &str = "00";

/// Extension → type MIME. La première extension d'un type est son extension canonique.
const EXTENSION_MIME: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("flac", "audio/flac"),
    ("flac", "audio/x-flac"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("adts", "audio/vnd.dlna.adts"),
    ("wav", "audio/wav"),
    ("wav", "audio/x-wav"),
    ("wma", "audio/x-ms-wma"),
    ("aiff", "audio/aiff"),
    ("aif", "audio/aiff"),
    ("dsf", "audio/x-dsf"),
    ("pcm", "audio/L16"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
    ("mpg", "video/mpeg"),
    ("mpeg", "video/mpeg"),
    ("ts", "video/mp2t"),
    ("wmv", "video/x-ms-wmv"),
    ("webm", "video/webm"),
];

/// Type MIME → profil DLNA du contenu
const DLNA_PROFILES: &[(&str, &str)] = &[
    ("audio/mpeg", "MP3"),
    ("audio/L16", "LPCM"),
    ("audio/x-ms-wma", "WMABASE"),
    ("audio/mp4", "AAC_ISO_320"),
    ("audio/vnd.dlna.adts", "AAC_ADTS_320"),
    ("image/jpeg", "JPEG_LRG"),
    ("image/png", "PNG_LRG"),
    ("image/gif", "GIF_LRG"),
    ("video/mpeg", "MPEG_PS_PAL"),
    ("video/mp4", "AVC_MP4_MP_SD_AAC_MULT5"),
    ("video/mp2t", "MPEG_TS_SD_EU_ISO"),
    ("video/x-ms-wmv", "WMVMED_BASE"),
];

/// Type MIME → profil DLNA d'une vignette
const DLNA_THUMBNAIL_PROFILES: &[(&str, &str)] = &[("image/jpeg", "JPEG_TN"), ("image/png", "PNG_TN")];

/// Type MIME sans ses paramètres (`audio/L16;rate=44100` → `audio/L16`)
fn base_mime(mime: &str) -> &str {
    mime.split(';').next().unwrap_or(mime).trim()
}

fn lookup<'a>(table: &'a [(&'a str, &'a str)], mime: &str) -> Option<&'a str> {
    let mime = base_mime(mime);
    table
        .iter()
        .find(|(m, _)| m.eq_ignore_ascii_case(mime))
        .map(|(_, profile)| *profile)
}

/// Résout un jeton (extension ou type MIME) en type MIME
///
/// Un jeton contenant `/` est déjà un type MIME ; une extension connue est
/// traduite ; tout autre jeton est repris tel quel.
pub fn resolve_mime(token: &str) -> String {
    let token = token.trim();
    if token.contains('/') {
        return token.to_string();
    }
    let ext = token.trim_start_matches('.');
    EXTENSION_MIME
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| (*mime).to_string())
        .unwrap_or_else(|| token.to_string())
}

/// Extension canonique d'un type MIME, utilisée dans le segment `ext` des URLs
///
/// Un type inconnu retombe sur son sous-type, un jeton sans `/` sur lui-même.
pub fn extension_for_mime(mime: &str) -> String {
    let mime = base_mime(mime);
    if let Some((ext, _)) = EXTENSION_MIME
        .iter()
        .find(|(_, m)| m.eq_ignore_ascii_case(mime))
    {
        return (*ext).to_string();
    }
    match mime.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => subtype.to_string(),
        _ => mime.to_string(),
    }
}

/// Profil DLNA d'un contenu de ce type, s'il existe
pub fn dlna_profile(mime: &str) -> Option<&'static str> {
    lookup(DLNA_PROFILES, &resolve_mime(mime))
}

/// Profil DLNA d'une vignette de ce type, s'il existe
pub fn dlna_thumbnail_profile(mime: &str) -> Option<&'static str> {
    lookup(DLNA_THUMBNAIL_PROFILES, &resolve_mime(mime))
}

/// Flux audio ou vidéo
pub fn is_streaming_mime(mime: &str) -> bool {
    let mime = resolve_mime(mime).to_ascii_lowercase();
    mime.starts_with("audio/") || mime.starts_with("video/")
}

/// Drapeaux DLNA primaires adaptés au type
pub fn dlna_flags_for(mime: &str) -> u32 {
    if is_streaming_mime(mime) {
        DLNA_STREAMING_FLAGS
    } else {
        DLNA_INTERACTIVE_FLAGS
    }
}

/// Formate le champ DLNA.ORG_FLAGS : 8 chiffres significatifs puis 24 zéros
pub fn format_dlna_flags(flags: u32) -> String {
    format!("{:08x}{:024x}", flags, 0)
}

/// Chaîne protocol-info analysée
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolInfo {
    pub protocol: String,
    pub network: String,
    pub content_format: String,
    pub additional_info: String,
}

impl ProtocolInfo {
    /// Forme minimale `http-get:*:<mime>:*`
    pub fn http_get(mime: impl Into<String>) -> Self {
        Self {
            protocol: PROTOCOL_HTTP_GET.to_string(),
            network: "*".to_string(),
            content_format: mime.into(),
            additional_info: "*".to_string(),
        }
    }

    /// Analyse une chaîne protocol-info ; les champs absents valent `*`
    ///
    /// Un texte sans `:` est pris comme type MIME.
    pub fn parse(value: &str) -> Self {
        let fields: Vec<&str> = value.trim().splitn(4, ':').collect();
        let field = |i: usize| {
            fields
                .get(i)
                .filter(|f| !f.is_empty())
                .map(|f| (*f).to_string())
                .unwrap_or_else(|| "*".to_string())
        };

        if fields.len() == 1 {
            return Self::http_get(field(0));
        }

        Self {
            protocol: field(0),
            network: field(1),
            content_format: field(2),
            additional_info: field(3),
        }
    }

    /// Le quatrième champ ne porte encore aucune information
    pub fn is_wildcard(&self) -> bool {
        self.additional_info == "*"
    }

    /// Valeur d'un paramètre du quatrième champ (`DLNA.ORG_PN`, ...)
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.additional_info
            .split(';')
            .filter_map(|p| p.split_once('='))
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

impl fmt::Display for ProtocolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.protocol, self.network, self.content_format, self.additional_info
        )
    }
}

/// Description DLNA dérivée d'un type et d'un contexte de transcodage
///
/// Jamais stockée : recalculée à chaque rendu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolInfoSpec {
    pub mime: String,
    pub profile: Option<String>,
    pub operations: &'static str,
    pub converted: bool,
    pub flags: u32,
}

impl ProtocolInfoSpec {
    /// Dérive la description d'un jeton (extension ou MIME)
    ///
    /// Avec un profil de transcodage, la description porte sur le flux produit :
    /// type cible, pas de positionnement, `DLNA.ORG_CI=1`.
    pub fn derive(token: &str, transcoding: Option<&TranscodingProfile>) -> Self {
        match transcoding {
            Some(profile) => {
                let mime = resolve_mime(&profile.target_mime);
                Self {
                    profile: profile
                        .dlna_profile
                        .clone()
                        .or_else(|| dlna_profile(&mime).map(str::to_string)),
                    operations: DLNA_OP_NONE,
                    converted: true,
                    flags: dlna_flags_for(&mime),
                    mime,
                }
            }
            None => {
                let mime = resolve_mime(token);
                Self {
                    profile: dlna_profile(&mime).map(str::to_string),
                    operations: DLNA_OP_BYTE_SEEK,
                    converted: false,
                    flags: dlna_flags_for(&mime),
                    mime,
                }
            }
        }
    }

    /// Quatrième champ : `[DLNA.ORG_PN=..;]DLNA.ORG_OP=..;DLNA.ORG_CI=..;DLNA.ORG_FLAGS=..`
    pub fn dlna_parameters(&self) -> String {
        let mut params = Vec::with_capacity(4);
        if let Some(profile) = &self.profile {
            params.push(format!("DLNA.ORG_PN={}", profile));
        }
        params.push(format!("DLNA.ORG_OP={}", self.operations));
        params.push(format!("DLNA.ORG_CI={}", u8::from(self.converted)));
        params.push(format!("DLNA.ORG_FLAGS={}", format_dlna_flags(self.flags)));
        params.join(";")
    }

    pub fn to_protocol_info(&self) -> ProtocolInfo {
        ProtocolInfo {
            additional_info: self.dlna_parameters(),
            ..ProtocolInfo::http_get(self.mime.clone())
        }
    }
}

/// Produit la chaîne protocol-info d'un jeton dans un contexte de transcodage
///
/// Forme minimale si aucun profil DLNA n'est connu et qu'il n'y a pas de
/// transcodage, forme DLNA complète sinon.
pub fn synthesize(token: &str, transcoding: Option<&TranscodingProfile>) -> String {
    let spec = ProtocolInfoSpec::derive(token, transcoding);
    if spec.profile.is_none() && !spec.converted {
        ProtocolInfo::http_get(spec.mime).to_string()
    } else {
        spec.to_protocol_info().to_string()
    }
}

/// Protocol-info d'un contenu servi directement
pub fn render_protocol_info(token: &str) -> String {
    synthesize(token, None)
}

/// Forme utilisée sur les éléments `res`
///
/// Une chaîne stockée dont le quatrième champ vaut `*` reçoit les paramètres
/// DLNA (sans `DLNA.ORG_PN` si le type n'a pas de profil) ; le type MIME
/// stocké est conservé tel quel. Une chaîne déjà complète est inchangée.
pub fn extend_protocol_info(stored: &str) -> String {
    let info = ProtocolInfo::parse(stored);
    if !info.is_wildcard() {
        return info.to_string();
    }

    let spec = ProtocolInfoSpec::derive(&info.content_format, None);
    ProtocolInfo {
        additional_info: spec.dlna_parameters(),
        ..info
    }
    .to_string()
}
