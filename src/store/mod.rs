//! Durable storage for loaded files and notes
//!
//! The viewer only talks to [`Persistence`]. Every call made before
//! [`Persistence::initialize`] fails with [`StoreError::NotInitialized`].

mod schema;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store not initialized")]
    NotInitialized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Raw bytes of one input file
#[derive(Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub name: String,
    pub bytes: Arc<Vec<u8>>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }
}

impl std::fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBlob")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Stored note
///
/// `file_id` is the owning document's name and `page_num` its local page.
/// `x` and `y` are normalized page coordinates in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub file_id: String,
    pub page_num: i64,
    pub x: f64,
    pub y: f64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Note to be created; also accepts exported [`Note`] JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub file_id: String,
    pub page_num: i64,
    pub x: f64,
    pub y: f64,
    pub content: String,
}

impl NewNote {
    /// Same note with its anchor clamped onto the page
    pub fn normalized(mut self) -> Self {
        self.x = clamp_unit(self.x);
        self.y = clamp_unit(self.y);
        self
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl From<Note> for NewNote {
    fn from(note: Note) -> Self {
        Self {
            file_id: note.file_id,
            page_num: note.page_num,
            x: note.x,
            y: note.y,
            content: note.content,
        }
    }
}

#[async_trait]
pub trait Persistence: Send + Sync {
    /// Prepare the backing store; safe to call more than once
    async fn initialize(&self) -> StoreResult<()>;

    /// Atomically replace the stored file set
    async fn save_files(&self, files: &[FileBlob]) -> StoreResult<()>;

    /// Stored files in save order
    async fn get_files(&self) -> StoreResult<Vec<FileBlob>>;

    /// Returns the new note's id
    async fn save_note(&self, note: NewNote) -> StoreResult<i64>;

    async fn get_notes(&self, file_id: &str, page_num: i64) -> StoreResult<Vec<Note>>;

    async fn get_notes_for_file(&self, file_id: &str) -> StoreResult<Vec<Note>>;

    async fn update_note(&self, id: i64, content: &str) -> StoreResult<Note>;

    async fn delete_note(&self, id: i64) -> StoreResult<()>;

    /// Returns the number of notes removed
    async fn clear_notes_for_file(&self, file_id: &str) -> StoreResult<u64>;

    async fn export_all_notes(&self) -> StoreResult<Vec<Note>>;

    /// Insert `notes` under fresh ids; returns how many were stored
    async fn import_all_notes(&self, notes: Vec<NewNote>) -> StoreResult<usize>;
}
