use super::FtmsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document formats a candidate can be offered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Md,
    Txt,
    Doc,
}

impl FileType {
    pub const ALL: [FileType; 3] = [FileType::Md, FileType::Txt, FileType::Doc];

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Md => "md",
            FileType::Txt => "txt",
            FileType::Doc => "doc",
        }
    }

    /// Resolve a file type from a bare extension (`md`, `.TXT`, ...).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.extension() == ext)
    }

    /// Resolve a file type from a filename's trailing extension.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (stem, ext) = filename.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::from_extension(ext)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileType {
    type Err = FtmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| FtmsError::UnknownFileType(s.to_string()))
    }
}

/// How a candidate was found. Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateOrigin {
    AutoDetect,
    HiddenMarker,
}

impl CandidateOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateOrigin::AutoDetect => "auto-detect",
            CandidateOrigin::HiddenMarker => "hidden-marker",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto-detect" => Some(CandidateOrigin::AutoDetect),
            "hidden-marker" => Some(CandidateOrigin::HiddenMarker),
            _ => None,
        }
    }
}

/// A proposed file pulled out of (or detected in) an assistant response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCandidate {
    pub content: String,
    pub filename: String,
    pub description: String,
    pub file_type: FileType,
    pub word_count: usize,
    pub should_create_file: bool,
    pub origin: CandidateOrigin,
}

impl FileCandidate {
    /// Build a candidate; `word_count` is derived from `content` here and nowhere else.
    pub fn new(
        content: String,
        filename: String,
        description: String,
        file_type: FileType,
        origin: CandidateOrigin,
    ) -> Self {
        let word_count = super::extract::word_count(&content);
        Self {
            content,
            filename,
            description,
            file_type,
            word_count,
            should_create_file: true,
            origin,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        super::extract::mime_for(self.file_type)
    }
}

/// Caller switches for [`super::process_response`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOptions {
    #[serde(default)]
    pub skip_heuristics: bool,
}

/// Result of post-processing one assistant response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedResponse {
    pub clean_response: String,
    pub files: Vec<FileCandidate>,
}

/// A persisted candidate with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub file_type: FileType,
    pub file_path: String,
    pub word_count: usize,
    pub description: String,
    pub origin: CandidateOrigin,
    pub session_id: Option<String>,
    pub created_at: String,
}

/// Search result with relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSearchResult {
    pub document: DocumentRecord,
    pub rank: f64,
}

/// Paginated list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentRecord>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_filename_is_case_insensitive() {
        assert_eq!(FileType::from_filename("Notes.TXT"), Some(FileType::Txt));
        assert_eq!(FileType::from_filename("report.md"), Some(FileType::Md));
        assert_eq!(FileType::from_filename("memo.doc"), Some(FileType::Doc));
        assert_eq!(FileType::from_filename("data.csv"), None);
        assert_eq!(FileType::from_filename(".md"), None);
        assert_eq!(FileType::from_filename("readme"), None);
    }

    #[test]
    fn file_type_parses_from_str() {
        assert_eq!("txt".parse::<FileType>().unwrap(), FileType::Txt);
        assert_eq!(".Doc".parse::<FileType>().unwrap(), FileType::Doc);
        assert!(matches!(
            "pdf".parse::<FileType>(),
            Err(FtmsError::UnknownFileType(t)) if t == "pdf"
        ));
    }

    #[test]
    fn candidate_serializes_with_camel_case_fields() {
        let candidate = FileCandidate::new(
            "uno dos tres".into(),
            "notas.md".into(),
            "Notas".into(),
            FileType::Md,
            CandidateOrigin::HiddenMarker,
        );
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["wordCount"], 3);
        assert_eq!(json["shouldCreateFile"], true);
        assert_eq!(json["fileType"], "md");
        assert_eq!(json["origin"], "hidden-marker");
    }

    #[test]
    fn origin_round_trips_through_str() {
        for origin in [CandidateOrigin::AutoDetect, CandidateOrigin::HiddenMarker] {
            assert_eq!(CandidateOrigin::parse(origin.as_str()), Some(origin));
        }
        assert_eq!(CandidateOrigin::parse("manual"), None);
    }
}
