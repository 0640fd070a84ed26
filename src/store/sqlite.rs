//! SQLite-backed [`Persistence`]

use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};

use super::schema::initialize_schema;
use super::{FileBlob, NewNote, Note, Persistence, StoreError, StoreResult};

const NOTE_COLUMNS: &str = "id, file_id, page_num, x, y, content, created_at, updated_at";

pub struct SqliteStore {
    pool: SqlitePool,
    initialized: AtomicBool,
}

impl SqliteStore {
    /// Connect to `database_url`, creating the database file when missing
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            initialized: AtomicBool::new(false),
        })
    }

    /// Open a database file, creating parent directories as needed
    pub async fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Self::connect(&format!("sqlite:{}", path.display())).await
    }

    fn pool(&self) -> StoreResult<&SqlitePool> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(&self.pool)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    async fn note(&self, id: i64) -> StoreResult<Note> {
        sqlx::query_as::<_, Note>(&format!("SELECT {} FROM notes WHERE id = ?", NOTE_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool()?)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("note {}", id)))
    }
}

#[async_trait]
impl Persistence for SqliteStore {
    async fn initialize(&self) -> StoreResult<()> {
        initialize_schema(&self.pool).await?;
        self.initialized.store(true, Ordering::Release);
        tracing::debug!("Store initialized");
        Ok(())
    }

    async fn save_files(&self, files: &[FileBlob]) -> StoreResult<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool()?.begin().await?;

        sqlx::query("DELETE FROM files").execute(&mut *tx).await?;
        for (position, file) in files.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO files (position, name, bytes, created_at)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(position as i64)
            .bind(&file.name)
            .bind(file.bytes.as_slice())
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(files = files.len(), "Saved file set");
        Ok(())
    }

    async fn get_files(&self) -> StoreResult<Vec<FileBlob>> {
        let rows = sqlx::query_as::<_, (String, Vec<u8>)>(
            "SELECT name, bytes FROM files ORDER BY position",
        )
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, bytes)| FileBlob {
                name,
                bytes: Arc::new(bytes),
            })
            .collect())
    }

    async fn save_note(&self, note: NewNote) -> StoreResult<i64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO notes (file_id, page_num, x, y, content, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.file_id)
        .bind(note.page_num)
        .bind(note.x)
        .bind(note.y)
        .bind(&note.content)
        .bind(&now)
        .bind(&now)
        .execute(self.pool()?)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn get_notes(&self, file_id: &str, page_num: i64) -> StoreResult<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(&format!(
            "SELECT {} FROM notes WHERE file_id = ? AND page_num = ? ORDER BY id",
            NOTE_COLUMNS
        ))
        .bind(file_id)
        .bind(page_num)
        .fetch_all(self.pool()?)
        .await?;

        Ok(notes)
    }

    async fn get_notes_for_file(&self, file_id: &str) -> StoreResult<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(&format!(
            "SELECT {} FROM notes WHERE file_id = ? ORDER BY page_num, id",
            NOTE_COLUMNS
        ))
        .bind(file_id)
        .fetch_all(self.pool()?)
        .await?;

        Ok(notes)
    }

    async fn update_note(&self, id: i64, content: &str) -> StoreResult<Note> {
        let result = sqlx::query("UPDATE notes SET content = ?, updated_at = ? WHERE id = ?")
            .bind(content)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(self.pool()?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("note {}", id)));
        }
        self.note(id).await
    }

    async fn delete_note(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(id)
            .execute(self.pool()?)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("note {}", id)));
        }
        Ok(())
    }

    async fn clear_notes_for_file(&self, file_id: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM notes WHERE file_id = ?")
            .bind(file_id)
            .execute(self.pool()?)
            .await?;

        Ok(result.rows_affected())
    }

    async fn export_all_notes(&self) -> StoreResult<Vec<Note>> {
        let notes = sqlx::query_as::<_, Note>(&format!(
            "SELECT {} FROM notes ORDER BY id",
            NOTE_COLUMNS
        ))
        .fetch_all(self.pool()?)
        .await?;

        Ok(notes)
    }

    async fn import_all_notes(&self, notes: Vec<NewNote>) -> StoreResult<usize> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool()?.begin().await?;

        for note in &notes {
            sqlx::query(
                r#"
                INSERT INTO notes (file_id, page_num, x, y, content, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&note.file_id)
            .bind(note.page_num)
            .bind(note.x)
            .bind(note.y)
            .bind(&note.content)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(notes = notes.len(), "Imported notes");
        Ok(notes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn store() -> (TempDir, SqliteStore) {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("data").join("folio.db"))
            .await
            .unwrap();
        store.initialize().await.unwrap();
        (dir, store)
    }

    fn new_note(file_id: &str, page_num: i64, content: &str) -> NewNote {
        NewNote {
            file_id: file_id.to_string(),
            page_num,
            x: 0.25,
            y: 0.75,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_calls_before_initialize_fail() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&dir.path().join("folio.db")).await.unwrap();

        assert!(matches!(store.get_files().await, Err(StoreError::NotInitialized)));
        assert!(matches!(
            store.save_note(new_note("a.pdf", 1, "x")).await,
            Err(StoreError::NotInitialized)
        ));
        assert!(matches!(store.export_all_notes().await, Err(StoreError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_save_files_replaces_set() {
        let (_dir, store) = store().await;

        store
            .save_files(&[FileBlob::new("a.pdf", b"one".to_vec()), FileBlob::new("b.pdf", b"two".to_vec())])
            .await
            .unwrap();
        store
            .save_files(&[FileBlob::new("c.pdf", b"three".to_vec())])
            .await
            .unwrap();

        let files = store.get_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "c.pdf");
        assert_eq!(files[0].bytes.as_slice(), b"three");
    }

    #[tokio::test]
    async fn test_files_keep_order() {
        let (_dir, store) = store().await;
        let names = ["z.pdf", "a.pdf", "m.pdf"];
        let blobs: Vec<FileBlob> = names.iter().map(|n| FileBlob::new(*n, Vec::new())).collect();

        store.save_files(&blobs).await.unwrap();
        let loaded: Vec<String> = store.get_files().await.unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(loaded, names);
    }

    #[tokio::test]
    async fn test_note_crud() {
        let (_dir, store) = store().await;

        let id = store.save_note(new_note("a.pdf", 2, "first")).await.unwrap();
        store.save_note(new_note("a.pdf", 3, "other page")).await.unwrap();

        let on_page = store.get_notes("a.pdf", 2).await.unwrap();
        assert_eq!(on_page.len(), 1);
        assert_eq!(on_page[0].content, "first");
        assert_eq!(on_page[0].x, 0.25);

        let updated = store.update_note(id, "edited").await.unwrap();
        assert_eq!(updated.content, "edited");
        assert_eq!(store.get_notes_for_file("a.pdf").await.unwrap().len(), 2);

        store.delete_note(id).await.unwrap();
        assert!(store.get_notes("a.pdf", 2).await.unwrap().is_empty());
        assert!(matches!(store.delete_note(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.update_note(id, "gone").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_notes_for_file() {
        let (_dir, store) = store().await;
        store.save_note(new_note("a.pdf", 1, "a1")).await.unwrap();
        store.save_note(new_note("a.pdf", 4, "a4")).await.unwrap();
        store.save_note(new_note("b.pdf", 1, "b1")).await.unwrap();

        assert_eq!(store.clear_notes_for_file("a.pdf").await.unwrap(), 2);
        let remaining = store.export_all_notes().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file_id, "b.pdf");
    }

    #[tokio::test]
    async fn test_import_assigns_fresh_ids() {
        let (_dir, source) = store().await;
        source.save_note(new_note("a.pdf", 1, "keep me")).await.unwrap();
        source.save_note(new_note("b.pdf", 2, "me too")).await.unwrap();
        let exported = source.export_all_notes().await.unwrap();

        let (_dir2, target) = store().await;
        let existing = target.save_note(new_note("c.pdf", 1, "already here")).await.unwrap();

        let imported = target
            .import_all_notes(exported.iter().cloned().map(NewNote::from).collect())
            .await
            .unwrap();
        assert_eq!(imported, 2);

        let all = target.export_all_notes().await.unwrap();
        assert_eq!(all.len(), 3);
        let ids: Vec<i64> = all.iter().map(|n| n.id).collect();
        assert!(ids.iter().all(|id| *id == existing || *id > existing));
        assert_eq!(all[1].content, "keep me");
        assert_eq!(all[2].file_id, "b.pdf");
    }
}
