//! Hierarchical document storage.
//!
//! Documents are filed under `<root>/<client>/<category>/<name>.pdf` in an
//! external folder hierarchy. The [`HierarchicalStore`] trait is the seam to
//! that service; Google Drive implements it in production and
//! [`MemoryStore`] in tests and dry runs.
//!
//! ## Known race
//!
//! Folder resolution is lookup-then-create and the remote API offers no
//! transaction to make it atomic. Two callers resolving the same
//! `(parent, name)` at the same moment can both miss on lookup and both
//! create, leaving duplicate folders. Lookups return the first match, so later
//! documents converge on one of them; the other stays behind until removed by
//! hand.

mod memory;

pub use memory::{MemoryFile, MemoryFolder, MemoryStore};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the storage service.
///
/// Callers treat both variants as "storage unavailable": the pipeline maps
/// either one to a storage failure for the item. `PermissionDenied` only keeps
/// the provider's refusal distinguishable in logs and messages.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied by storage: {0}")]
    PermissionDenied(String),
}

/// Folder/file operations the intake pipeline needs from a storage provider.
#[async_trait]
pub trait HierarchicalStore: Send + Sync {
    /// Short provider name for logs.
    fn provider(&self) -> &'static str;

    /// Ids of non-trashed folders named exactly `name` directly under `parent_id`.
    async fn list_children(&self, parent_id: &str, name: &str)
        -> Result<Vec<String>, StorageError>;

    /// Create a folder under `parent_id`, returning its id.
    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String, StorageError>;

    /// Upload a file under `parent_id`, returning its id.
    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<String, StorageError>;
}

/// A folder returned by resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFolder {
    pub id: String,
    /// Whether this call created the folder.
    pub created: bool,
}

/// Find the child folder `name` under `parent_id`, creating it when missing.
///
/// See the module docs for the duplicate-folder race.
pub async fn find_or_create_folder(
    store: &dyn HierarchicalStore,
    parent_id: &str,
    name: &str,
) -> Result<ResolvedFolder, StorageError> {
    let existing = store.list_children(parent_id, name).await?;

    if let Some(id) = existing.first() {
        if existing.len() > 1 {
            warn!(
                "Found {} folders named '{}' under {} on {}; using {}",
                existing.len(),
                name,
                parent_id,
                store.provider(),
                id
            );
        }
        debug!("Reusing folder '{}' ({})", name, id);
        return Ok(ResolvedFolder {
            id: id.clone(),
            created: false,
        });
    }

    let id = store.create_folder(parent_id, name).await?;
    info!("Created folder '{}' ({}) under {}", name, id, parent_id);
    Ok(ResolvedFolder { id, created: true })
}

/// Return the id of child folder `name` under `parent_id`, creating it if needed.
pub async fn resolve_child_folder(
    store: &dyn HierarchicalStore,
    parent_id: &str,
    name: &str,
) -> Result<String, StorageError> {
    find_or_create_folder(store, parent_id, name)
        .await
        .map(|folder| folder.id)
}

/// Resolve a chain of nested folders, one segment at a time.
///
/// Returns one [`ResolvedFolder`] per segment; the last is the leaf. An empty
/// segment list resolves to nothing.
pub async fn resolve_path(
    store: &dyn HierarchicalStore,
    parent_id: &str,
    segments: &[&str],
) -> Result<Vec<ResolvedFolder>, StorageError> {
    let mut resolved = Vec::with_capacity(segments.len());
    let mut current = parent_id.to_string();

    for segment in segments {
        let folder = find_or_create_folder(store, &current, segment).await?;
        current = folder.id.clone();
        resolved.push(folder);
    }

    Ok(resolved)
}
