//! In-process store used for dry runs and tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{HierarchicalStore, StorageError};

/// A folder held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFolder {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub trashed: bool,
}

/// A file held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFile {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    folders: Vec<MemoryFolder>,
    files: Vec<MemoryFile>,
}

impl MemoryState {
    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// Folder tree kept in memory, with sequential ids.
#[derive(Debug)]
pub struct MemoryStore {
    root_id: String,
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new(root_id: impl Into<String>) -> Self {
        Self {
            root_id: root_id.into(),
            state: Mutex::new(MemoryState::default()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Make every subsequent call fail with [`StorageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Mark a folder as trashed so lookups skip it.
    pub fn trash(&self, folder_id: &str) {
        let mut state = self.lock();
        if let Some(folder) = state.folders.iter_mut().find(|f| f.id == folder_id) {
            folder.trashed = true;
        }
    }

    /// All folders in creation order.
    pub fn folders(&self) -> Vec<MemoryFolder> {
        self.lock().folders.clone()
    }

    /// All uploaded files in upload order.
    pub fn files(&self) -> Vec<MemoryFile> {
        self.lock().files.clone()
    }

    /// Slash-separated path of a folder or file relative to the root.
    pub fn folder_path(&self, id: &str) -> Option<String> {
        let state = self.lock();
        let mut segments = Vec::new();
        let mut current = id.to_string();

        if let Some(file) = state.files.iter().find(|f| f.id == id) {
            segments.push(file.name.clone());
            current = file.parent_id.clone();
        }

        while current != self.root_id {
            let folder = state.folders.iter().find(|f| f.id == current)?;
            segments.push(folder.name.clone());
            current = folder.parent_id.clone();
        }

        segments.reverse();
        Some(segments.join("/"))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-update
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable(
                "memory store marked unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HierarchicalStore for MemoryStore {
    fn provider(&self) -> &'static str {
        "memory"
    }

    async fn list_children(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<Vec<String>, StorageError> {
        self.check_available()?;
        Ok(self
            .lock()
            .folders
            .iter()
            .filter(|f| !f.trashed && f.parent_id == parent_id && f.name == name)
            .map(|f| f.id.clone())
            .collect())
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String, StorageError> {
        self.check_available()?;
        let mut state = self.lock();
        let id = state.allocate_id("folder");
        state.folders.push(MemoryFolder {
            id: id.clone(),
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            trashed: false,
        });
        Ok(id)
    }

    async fn upload_file(
        &self,
        parent_id: &str,
        name: &str,
        content: &[u8],
        mime_type: &str,
    ) -> Result<String, StorageError> {
        self.check_available()?;
        let mut state = self.lock();
        let id = state.allocate_id("file");
        state.files.push(MemoryFile {
            id: id.clone(),
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            content: content.to_vec(),
        });
        Ok(id)
    }
}
