use super::index::FileIndex;
use super::schema::{DocumentRecord, FileCandidate};
use super::storage::FileStorage;
use super::FtmsError;
use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

/// Persist accepted candidates: body to disk, metadata and body to the index.
///
/// All or nothing: if any candidate fails, the ones already saved in this call
/// are removed again before the error is returned.
pub async fn save_candidates(
    storage: &FileStorage,
    index: &FileIndex,
    candidates: &[FileCandidate],
    session_id: Option<&str>,
) -> Result<Vec<DocumentRecord>> {
    let mut saved = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match save_one(storage, index, candidate, session_id).await {
            Ok(record) => saved.push(record),
            Err(e) => {
                rollback(storage, index, &saved).await;
                return Err(e);
            }
        }
    }
    Ok(saved)
}

async fn save_one(
    storage: &FileStorage,
    index: &FileIndex,
    candidate: &FileCandidate,
    session_id: Option<&str>,
) -> Result<DocumentRecord> {
    let (rel_path, _) = storage.store(&candidate.content, candidate.file_type).await?;
    let record = DocumentRecord {
        id: Uuid::new_v4().to_string(),
        filename: candidate.filename.clone(),
        file_type: candidate.file_type,
        file_path: rel_path,
        word_count: candidate.word_count,
        description: candidate.description.clone(),
        origin: candidate.origin,
        session_id: session_id.map(str::to_string),
        created_at: Utc::now().to_rfc3339(),
    };
    if let Err(e) = index.insert(&record, &candidate.content) {
        storage.delete(&record.file_path).await?;
        return Err(e);
    }
    tracing::info!(
        id = %record.id,
        filename = %record.filename,
        words = record.word_count,
        "Document saved"
    );
    Ok(record)
}

async fn rollback(storage: &FileStorage, index: &FileIndex, saved: &[DocumentRecord]) {
    for record in saved {
        if let Err(e) = index.delete(&record.id) {
            tracing::warn!(id = %record.id, "Failed to roll back index entry: {e:#}");
        }
        if let Err(e) = storage.delete(&record.file_path).await {
            tracing::warn!(id = %record.id, "Failed to roll back stored file: {e:#}");
        }
    }
}

/// Fetch a saved document and its body from disk.
pub async fn load_document(
    storage: &FileStorage,
    index: &FileIndex,
    id: &str,
) -> Result<(DocumentRecord, String)> {
    let record = index
        .get(id)?
        .ok_or_else(|| FtmsError::DocumentNotFound(id.to_string()))?;
    let content = storage.read(&record.file_path).await?;
    Ok((record, content))
}

/// Remove a saved document from the index and disk.
pub async fn delete_document(storage: &FileStorage, index: &FileIndex, id: &str) -> Result<()> {
    let record = index
        .get(id)?
        .ok_or_else(|| FtmsError::DocumentNotFound(id.to_string()))?;
    index.delete(id)?;
    storage.delete(&record.file_path).await?;
    tracing::info!(id, "Document deleted");
    Ok(())
}
