use super::schema::{
    CandidateOrigin, DocumentListResponse, DocumentRecord, DocumentSearchResult, FileType,
};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

const RECORD_COLUMNS: &str =
    "id, filename, file_type, file_path, word_count, description, origin, session_id, created_at";

/// SQLite-backed document index with FTS5 full-text search.
#[derive(Clone)]
pub struct FileIndex {
    conn: Arc<Mutex<Connection>>,
}

impl FileIndex {
    pub fn new(workspace_dir: &Path) -> Result<Self> {
        let db_dir = workspace_dir.join("ftms");
        std::fs::create_dir_all(&db_dir)?;
        let conn = Connection::open(db_dir.join("documents.db"))
            .context("Failed to open documents.db")?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             PRAGMA cache_size   = -2000;
             PRAGMA temp_store   = MEMORY;",
        )?;

        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS ftms_documents (
                id              TEXT PRIMARY KEY,
                filename        TEXT NOT NULL,
                file_type       TEXT NOT NULL,
                file_path       TEXT NOT NULL,
                word_count      INTEGER NOT NULL,
                description     TEXT NOT NULL,
                origin          TEXT NOT NULL,
                content         TEXT NOT NULL,
                session_id      TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_ftms_doc_session ON ftms_documents(session_id);
            CREATE INDEX IF NOT EXISTS idx_ftms_doc_created ON ftms_documents(created_at);

            CREATE VIRTUAL TABLE IF NOT EXISTS ftms_documents_fts USING fts5(
                filename, description, content,
                content='ftms_documents', content_rowid='rowid'
            );

            CREATE TRIGGER IF NOT EXISTS ftms_documents_ai AFTER INSERT ON ftms_documents BEGIN
                INSERT INTO ftms_documents_fts(rowid, filename, description, content)
                VALUES (new.rowid, new.filename, new.description, new.content);
            END;

            CREATE TRIGGER IF NOT EXISTS ftms_documents_ad AFTER DELETE ON ftms_documents BEGIN
                INSERT INTO ftms_documents_fts(ftms_documents_fts, rowid, filename, description, content)
                VALUES ('delete', old.rowid, old.filename, old.description, old.content);
            END;",
        )
        .context("Failed to init document index schema")?;
        Ok(())
    }

    /// Insert a new document record along with its searchable body.
    pub fn insert(&self, record: &DocumentRecord, content: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO ftms_documents (id, filename, file_type, file_path, word_count,
             description, origin, content, session_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id,
                record.filename,
                record.file_type.extension(),
                record.file_path,
                record.word_count as i64,
                record.description,
                record.origin.as_str(),
                content,
                record.session_id,
                record.created_at,
            ],
        )
        .context("Failed to insert document record")?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<DocumentRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM ftms_documents WHERE id = ?1"
        ))?;
        match stmt.query_row(params![id], Self::row_to_record) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List documents newest first, optionally filtered by session or file type.
    pub fn list(
        &self,
        offset: usize,
        limit: usize,
        session_id: Option<&str>,
        file_type: Option<FileType>,
    ) -> Result<DocumentListResponse> {
        let conn = self.conn.lock();

        let (where_sql, filter_params) = Self::build_filter(session_id, file_type);

        let total: usize = conn.query_row(
            &format!("SELECT COUNT(*) FROM ftms_documents {where_sql}"),
            rusqlite::params_from_iter(&filter_params),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM ftms_documents {where_sql}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit} OFFSET {offset}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(&filter_params),
            Self::row_to_record,
        )?;

        let documents = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(DocumentListResponse {
            documents,
            total,
            offset,
            limit,
        })
    }

    /// Full-text search over filename, description and body.
    ///
    /// Every whitespace-separated term must appear; punctuation inside a term
    /// (`cambio-climatico`, `informe.md`) is matched as a phrase.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<DocumentSearchResult>> {
        let Some(fts_query) = escape_fts_query(query) else {
            return Ok(Vec::new());
        };
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT d.id, d.filename, d.file_type, d.file_path, d.word_count,
             d.description, d.origin, d.session_id, d.created_at, ftms_documents_fts.rank
             FROM ftms_documents_fts
             JOIN ftms_documents d ON d.rowid = ftms_documents_fts.rowid
             WHERE ftms_documents_fts MATCH ?1
             ORDER BY rank
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![fts_query, limit as i64], |row| {
            Ok(DocumentSearchResult {
                document: Self::row_to_record(row)?,
                rank: row.get(9)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to run document search")
    }

    /// Body text stored alongside the record.
    pub fn content(&self, id: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        match conn.query_row(
            "SELECT content FROM ftms_documents WHERE id = ?1",
            params![id],
            |row| row.get(0),
        ) {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a record. Returns whether anything was deleted.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn
            .execute("DELETE FROM ftms_documents WHERE id = ?1", params![id])
            .context("Failed to delete document record")?;
        Ok(changed > 0)
    }

    // Helper: build WHERE clause and params for list()
    fn build_filter(session_id: Option<&str>, file_type: Option<FileType>) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(sid) = session_id {
            clauses.push("session_id = ?");
            params.push(sid.to_string());
        }
        if let Some(ft) = file_type {
            clauses.push("file_type = ?");
            params.push(ft.extension().to_string());
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        (where_sql, params)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<DocumentRecord> {
        let file_type: String = row.get(2)?;
        let origin: String = row.get(6)?;
        Ok(DocumentRecord {
            id: row.get(0)?,
            filename: row.get(1)?,
            file_type: FileType::from_extension(&file_type).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(2, "file_type".into(), rusqlite::types::Type::Text)
            })?,
            file_path: row.get(3)?,
            word_count: row.get::<_, i64>(4)? as usize,
            description: row.get(5)?,
            origin: CandidateOrigin::parse(&origin).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(6, "origin".into(), rusqlite::types::Type::Text)
            })?,
            session_id: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

/// Quote each term so FTS5 operators and punctuation are taken literally.
fn escape_fts_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}
