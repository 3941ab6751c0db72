//! # PMOMusic Configuration Module
//!
//! This module provides configuration management for the PMOMusic media server, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for the values consumed by the ContentDirectory codec
//!   (virtual URL, metadata entry separator, transcoding profiles)
//!
//! The configuration is an explicit value: the bootstrap loads it once and hands it
//! to the components that need it.
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::Config;
//!
//! let config = Config::load_config("")?;
//!
//! let separator = config.get_entry_separator();
//! let virtual_url = config.get_virtual_url();
//! let profiles = config.get_transcoding_profiles()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Mutex, MutexGuard},
};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmomusic.yaml");

const ENV_CONFIG_DIR: &str = "PMOMUSIC_CONFIG";
const ENV_PREFIX: &str = "PMOMUSIC_CONFIG__";

// Default values for configuration
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_BASE_URL: &str = "127.0.0.1";
const DEFAULT_ENTRY_SEPARATOR: &str = " / ";
const DEFAULT_TRANSCODING_ENABLED: bool = false;

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                Ok(_) | Err(_) => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Macro to generate getter/setter for string values with default
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> String {
            match self.get_value($path) {
                Ok(Value::String(s)) => s,
                Ok(_) | Err(_) => $default.to_string(),
            }
        }

        pub fn $setter(&self, value: String) -> Result<()> {
            self.set_value($path, Value::String(value))
        }
    };
}

/// Profil de transcodage déclaré dans la configuration
///
/// Un profil indique pour quels types MIME source une variante transcodée
/// peut être proposée aux clients, et le format produit.
///
/// ```yaml
/// transcoding:
///   enabled: true
///   profiles:
///     - name: flac2mp3
///       source_mimes: ["audio/flac"]
///       target_mime: audio/mpeg
///       dlna_profile: MP3
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodingProfile {
    /// Nom du profil, repris tel quel dans le segment `pr_name` des URLs
    pub name: String,

    /// Types MIME acceptés en entrée
    #[serde(default)]
    pub source_mimes: Vec<String>,

    /// Type MIME produit
    pub target_mime: String,

    /// Profil DLNA forcé pour la sortie (sinon déduit de `target_mime`)
    #[serde(default)]
    pub dlna_profile: Option<String>,

    /// La variante transcodée est proposée avant la ressource d'origine
    #[serde(default)]
    pub first_resource: bool,
}

impl TranscodingProfile {
    /// Indique si ce profil accepte le type MIME donné en entrée
    pub fn accepts(&self, mime: &str) -> bool {
        self.source_mimes
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mime))
    }
}

/// Configuration de PMOMusic
///
/// Arbre YAML chargé une fois au démarrage puis transmis explicitement aux
/// composants. Les clés sont insensibles à la casse : elles sont stockées en
/// minuscules.
///
/// Les valeurs proviennent, par priorité croissante :
/// - de la configuration intégrée (`pmomusic.yaml`)
/// - du fichier `config.yaml` du répertoire de configuration
/// - des variables `PMOMUSIC_CONFIG__SECTION__CLE`
///
/// # Examples
///
/// ```
/// use pmoconfig::Config;
///
/// let config = Config::from_yaml_str("content:\n  entry_separator: \", \"\n").unwrap();
/// assert_eq!(config.get_entry_separator(), ", ");
/// ```
#[derive(Debug)]
pub struct Config {
    config_dir: Option<String>,
    path: Option<String>,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        let snapshot = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(snapshot),
        }
    }
}

/// Nom du répertoire de configuration recherché localement puis dans `$HOME`
const CONFIG_DIR_NAME: &str = ".pmomusic";
const CONFIG_FILE_NAME: &str = "config.yaml";

impl Config {
    /// Premier répertoire candidat : argument, variable d'environnement,
    /// `./.pmomusic`, `~/.pmomusic`, et `.pmomusic` à défaut
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(from_env) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %from_env, "Config directory taken from environment");
            return from_env;
        }

        let local = Path::new(CONFIG_DIR_NAME);
        let home = home_dir().map(|home| home.join(CONFIG_DIR_NAME));
        [Some(local.to_path_buf()), home]
            .into_iter()
            .flatten()
            .find(|candidate| candidate.exists())
            .map(|dir| dir.to_string_lossy().to_string())
            .unwrap_or_else(|| CONFIG_DIR_NAME.to_string())
    }

    /// Crée le répertoire au besoin et vérifie qu'il est lisible
    fn ensure_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }
        fs::read_dir(path).map(|_| ())?;
        Ok(())
    }

    /// Résout le répertoire de configuration, en le créant s'il n'existe pas
    ///
    /// Ordre de recherche : `directory` s'il est non vide, la variable
    /// `PMOMUSIC_CONFIG`, `.pmomusic` dans le répertoire courant puis dans le
    /// répertoire personnel.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir = Self::find_config_dir(directory);
        Self::ensure_config_dir(Path::new(&dir))?;
        Ok(dir)
    }

    /// Charge la configuration depuis `directory` (ou le répertoire par défaut)
    ///
    /// Le fichier `config.yaml` est fusionné sur la configuration intégrée,
    /// les variables d'environnement sont appliquées, puis le résultat est
    /// réécrit sur disque.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        let path = Path::new(&config_dir)
            .join(CONFIG_FILE_NAME)
            .to_string_lossy()
            .to_string();

        let yaml = match fs::read_to_string(&path) {
            Ok(content) => {
                info!(config_file = %path, "Loaded config file");
                content
            }
            Err(_) => {
                info!(config_file = %path, "No config file, starting from embedded defaults");
                String::new()
            }
        };

        let mut tree = Self::merged_with_defaults(&yaml)?;
        apply_env_overrides(&mut tree);

        let config = Config {
            config_dir: Some(config_dir),
            path: Some(path),
            data: Mutex::new(tree),
        };
        config.save()?;
        Ok(config)
    }

    /// Configuration en mémoire construite à partir d'un document YAML
    ///
    /// Le document est fusionné sur les valeurs intégrées. Aucun fichier
    /// n'est associé : les setters ne modifient que l'arbre en mémoire.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(Config {
            config_dir: None,
            path: None,
            data: Mutex::new(Self::merged_with_defaults(yaml)?),
        })
    }

    fn merged_with_defaults(yaml: &str) -> Result<Value> {
        let mut tree: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        let external: Value = serde_yaml::from_str(yaml)?;
        // Un document vide donne Null : on garde les valeurs par défaut
        if !external.is_null() {
            merge_yaml(&mut tree, &lowercase_keys(external));
        }
        Ok(tree)
    }

    fn data(&self) -> Result<MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration lock poisoned"))
    }

    /// Répertoire de configuration, pour une configuration issue d'un fichier
    pub fn directory(&self) -> Option<&str> {
        self.config_dir.as_deref()
    }

    /// Réécrit `config.yaml`
    ///
    /// Sans effet pour une configuration construite par [`Config::from_yaml_str`].
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let yaml = serde_yaml::to_string(&*self.data()?)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Modifie la valeur au chemin `path` (ex. `&["host", "http_port"]`) puis sauvegarde
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.data()?;
            insert_at(&mut data, path, value)?;
        }
        self.save()
    }

    /// Valeur au chemin `path`, ou une erreur si le chemin n'existe pas
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data()?;
        lookup(&data, path).cloned()
    }

    /// Gets the HTTP port from configuration
    ///
    /// Returns the configured HTTP port, or the default port (8080) if not configured or invalid.
    pub fn get_http_port(&self) -> u16 {
        match self.get_value(&["host", "http_port"]) {
            Ok(Value::Number(n)) => match n.as_u64().and_then(|p| u16::try_from(p).ok()) {
                Some(port) => port,
                None => {
                    tracing::warn!("Invalid HTTP port '{}', using default {}", n, DEFAULT_HTTP_PORT);
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(Value::String(s)) => match s.parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    tracing::warn!(
                        "Invalid HTTP port '{}', using default {}",
                        s,
                        DEFAULT_HTTP_PORT
                    );
                    DEFAULT_HTTP_PORT
                }
            },
            Ok(_) => {
                tracing::warn!(
                    "HTTP port not a number or string, using default {}",
                    DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
            Err(err) => {
                tracing::warn!(
                    "Failed to get HTTP port: {}, using default {}",
                    err,
                    DEFAULT_HTTP_PORT
                );
                DEFAULT_HTTP_PORT
            }
        }
    }

    /// Sets the HTTP port in configuration
    pub fn set_http_port(&self, port: u16) -> Result<()> {
        let n = Number::from(port);
        self.set_value(&["host", "http_port"], Value::Number(n))
    }

    /// Gets the host name or address the server is reachable at
    pub fn get_base_url(&self) -> String {
        match self.get_value(&["host", "base_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Gets the URL prefix under which resources are served
    ///
    /// Uses `host.virtual_url` when set, otherwise `http://<base_url>:<http_port>/`.
    /// The returned value always ends with a `/`.
    pub fn get_virtual_url(&self) -> String {
        let url = match self.get_value(&["host", "virtual_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => {
                let base = self.get_base_url();
                let base = base
                    .trim_start_matches("http://")
                    .trim_end_matches('/')
                    .to_string();
                format!("http://{}:{}", base, self.get_http_port())
            }
        };

        if url.ends_with('/') {
            url
        } else {
            format!("{}/", url)
        }
    }

    /// Gets the presentation URL advertised by the device (defaults to the virtual URL)
    pub fn get_presentation_url(&self) -> String {
        match self.get_value(&["host", "presentation_url"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => self.get_virtual_url(),
        }
    }

    impl_string_config!(
        get_entry_separator,
        set_entry_separator,
        &["content", "entry_separator"],
        DEFAULT_ENTRY_SEPARATOR
    );

    impl_bool_config!(
        get_transcoding_enabled,
        set_transcoding_enabled,
        &["transcoding", "enabled"],
        DEFAULT_TRANSCODING_ENABLED
    );

    /// Récupère la liste des profils de transcodage configurés
    ///
    /// Une liste absente donne une liste vide ; une liste mal formée est une erreur.
    pub fn get_transcoding_profiles(&self) -> Result<Vec<TranscodingProfile>> {
        match self.get_value(&["transcoding", "profiles"]) {
            Ok(Value::Null) | Err(_) => Ok(Vec::new()),
            Ok(value) => serde_yaml::from_value(value)
                .map_err(|e| anyhow!("Invalid transcoding profiles: {}", e)),
        }
    }
}

/// Fusionne `external` dans `base` : les tables sont fusionnées clé par clé,
/// les scalaires et les séquences sont remplacés
fn merge_yaml(base: &mut Value, external: &Value) {
    let (Value::Mapping(base_map), Value::Mapping(external_map)) = (&mut *base, external) else {
        *base = external.clone();
        return;
    };
    for (key, value) in external_map {
        match base_map.get_mut(key) {
            Some(existing) => merge_yaml(existing, value),
            None => {
                base_map.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Copie de `value` dont toutes les clés texte sont en minuscules
fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, val)| {
                    let key = match key {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (key, lowercase_keys(val))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

fn lookup<'a>(tree: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().enumerate().try_fold(tree, |node, (depth, key)| {
        let Value::Mapping(map) = node else {
            return Err(anyhow!("{} is not a section", path[..depth].join(".")));
        };
        map.get(&Value::String(key.to_lowercase()))
            .ok_or_else(|| anyhow!("{} not found", path[..=depth].join(".")))
    })
}

fn insert_at(tree: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *tree = value;
        return Ok(());
    };

    let mut node = tree;
    for key in parents {
        let Value::Mapping(map) = node else {
            return Err(anyhow!("Cannot set {}: {} is not a section", path.join("."), key));
        };
        node = map
            .entry(Value::String(key.to_lowercase()))
            .or_insert(Value::Mapping(Mapping::new()));
    }

    match node {
        Value::Mapping(map) => {
            map.insert(Value::String(last.to_lowercase()), value);
            Ok(())
        }
        _ => Err(anyhow!("Cannot set {}: parent is not a section", path.join("."))),
    }
}

/// Applique les variables `PMOMUSIC_CONFIG__A__B=valeur` (valeur lue en YAML)
fn apply_env_overrides(tree: &mut Value) {
    for (name, raw) in env::vars() {
        let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<&str> = suffix.split("__").collect();
        let value = serde_yaml::from_str::<Value>(&raw).unwrap_or_else(|_| Value::String(raw.clone()));
        if let Err(err) = insert_at(tree, &path, value) {
            tracing::warn!(variable = %name, error = %err, "Ignoring config override");
        }
    }
}
