//! # Catalog - Accès aux objets du catalogue
//!
//! Le résolveur de requêtes ne connaît le catalogue qu'à travers le trait
//! [`Catalog`]. Le stockage réel (base de données, sources en ligne) est
//! injecté à la construction du [`RequestResolver`](crate::RequestResolver).
//!
//! [`MemoryCatalog`] est une implémentation en mémoire, utilisée pour les
//! catalogues construits à la volée et dans les tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pmodidl::CatalogObject;
use thiserror::Error;
use tokio::sync::RwLock;

/// Erreurs d'accès au catalogue
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Object {0} not found")]
    NotFound(i64),

    #[error("Catalog backend error: {0}")]
    Backend(String),
}

/// Accès en lecture au catalogue
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Récupère un objet par son identifiant
    async fn get_object_by_id(&self, id: i64) -> Result<Arc<CatalogObject>, CatalogError>;
}

/// Catalogue en mémoire
///
/// # Thread Safety
///
/// Les objets sont partagés sous forme d'`Arc` : un objet rendu ou servi
/// reste stable même s'il est remplacé entre-temps dans le catalogue.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    objects: Arc<RwLock<HashMap<i64, Arc<CatalogObject>>>>,
}

impl MemoryCatalog {
    /// Crée un catalogue vide
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute ou remplace un objet
    pub async fn insert(&self, object: CatalogObject) -> Arc<CatalogObject> {
        let object = Arc::new(object);
        let mut objects = self.objects.write().await;

        tracing::info!(
            object_id = object.id,
            title = %object.title,
            resources = object.resources.len(),
            "Adding object to catalog"
        );

        objects.insert(object.id, object.clone());
        object
    }

    /// Retire un objet du catalogue
    pub async fn remove(&self, id: i64) -> Option<Arc<CatalogObject>> {
        let mut objects = self.objects.write().await;
        let removed = objects.remove(&id);
        if removed.is_some() {
            tracing::info!(object_id = id, "Removed object from catalog");
        }
        removed
    }

    /// Liste les enfants directs d'un container
    pub async fn children_of(&self, parent_id: i64) -> Vec<Arc<CatalogObject>> {
        let objects = self.objects.read().await;
        let mut children: Vec<Arc<CatalogObject>> = objects
            .values()
            .filter(|o| o.parent_id == parent_id && o.id != parent_id)
            .cloned()
            .collect();
        children.sort_by_key(|o| o.id);
        children
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn get_object_by_id(&self, id: i64) -> Result<Arc<CatalogObject>, CatalogError> {
        let objects = self.objects.read().await;
        objects.get(&id).cloned().ok_or(CatalogError::NotFound(id))
    }
}
