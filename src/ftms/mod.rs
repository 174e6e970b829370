//! FTMS: File/Text Management System
//!
//! Turns assistant responses into chat text plus file candidates (hidden
//! markers first, heuristics as fallback) and keeps the documents a user
//! chose to save on disk with a full-text index.

pub mod schema;
pub mod markers;
pub mod detect;
pub mod describe;
pub mod extract;
pub mod process;
pub mod storage;
pub mod index;
pub mod save;

pub use schema::{
    CandidateOrigin, DocumentRecord, FileCandidate, FileType, ProcessOptions, ProcessedResponse,
};
pub use process::{process_response, ResponseProcessor};
pub use storage::FileStorage;
pub use index::FileIndex;

#[derive(Debug, thiserror::Error)]
pub enum FtmsError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),
    #[error("unknown file type `{0}` (expected md, txt or doc)")]
    UnknownFileType(String),
}
