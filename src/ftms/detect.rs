//! Heuristic file detection for responses that carry no hidden marker.
//!
//! Decides from the shape of the text (and the user's request) whether a long
//! answer should be offered as a downloadable document instead of a chat bubble.
//! Structured tool results (Drive listings, calendar tables) always stay inline.

use super::describe::{synthesize_description, synthesize_filename};
use super::extract::{line_count, word_count};
use super::markers::{contains_marker_signature, scrub_marker_syntax};
use super::schema::{CandidateOrigin, FileCandidate, FileType};
use crate::util::fold_accents;
use chrono::{Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Word count at which a "long" request turns into a file.
pub const DEFAULT_LONG_FORM_MIN_WORDS: usize = 1000;

/// Phrases in the user's message that explicitly ask for a document (accent-folded).
const EXPLICIT_REQUEST_PHRASES: &[&str] = &[
    "escribe un ensayo",
    "escribe una historia",
    "escribe un cuento",
    "escribe un articulo",
    "escribe un reporte",
    "escribe un informe",
    "escribe una carta",
    "escribe una guia",
    "escribe un documento",
    "redacta un ensayo",
    "redacta un informe",
    "redacta un documento",
    "redacta una carta",
    "crea un documento",
    "crear un documento",
    "crea un archivo",
    "genera un documento",
    "genera un reporte",
    "genera un informe",
    "write an essay",
    "write a story",
    "write an article",
    "write a report",
    "write a letter",
    "write a guide",
    "write a document",
    "create a document",
    "create a file",
    "generate a document",
    "generate a report",
    "draft a document",
];

/// Phrases typical of tool results, matched case-sensitively at a word start.
static TOOL_RESPONSE_PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:Encontré|I found|archivos:|files:)").unwrap());

const TOOL_RESPONSE_EMOJIS: &[char] = &['📄', '📁', '📅', '🌟', '👥'];

static LONG_FORM_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:largo|long)\b").unwrap());

static TOOL_TABLE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\|[ \t]*(?:Hora|Evento)[ \t]*\|").unwrap()
});

/// `**5** archivos`, `**12** events`
static ITEM_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\*\*\d+\*\*\s+(?:archivos?|eventos?|files?|events?)\b",
    )
    .unwrap()
});

static MARKDOWN_SYNTAX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ ]{0,3}#{1,6}[ \t]+\S|\*\*[^*\n]+\*\*|__[^_\n]+__|\*[^*\s][^*\n]*[^*\s]\*",
    )
    .unwrap()
});

static REQUESTED_EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(md|txt|doc)\b").unwrap());

/// Why the detector decided what it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionReason {
    /// Text looks like a structured tool result; never exported.
    ToolResponse,
    /// Nothing to export.
    Empty,
    ExplicitRequest,
    MarkerSignature,
    LongFormRequest,
    NotRequested,
}

/// Outcome of the heuristic pass, with the counts it was based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub should_create: bool,
    pub reason: DetectionReason,
    pub word_count: usize,
    pub line_count: usize,
}

#[derive(Debug, Clone)]
pub struct HeuristicDetector {
    long_form_min_words: usize,
}

impl Default for HeuristicDetector {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_FORM_MIN_WORDS)
    }
}

impl HeuristicDetector {
    pub fn new(long_form_min_words: usize) -> Self {
        Self {
            long_form_min_words,
        }
    }

    pub fn assess(&self, text: &str, user_message: &str) -> Detection {
        let word_count = word_count(text);
        let line_count = line_count(text);
        let reason = self.reason(text, user_message, word_count);
        let should_create = matches!(
            reason,
            DetectionReason::ExplicitRequest
                | DetectionReason::MarkerSignature
                | DetectionReason::LongFormRequest
        );
        tracing::debug!(?reason, word_count, line_count, should_create, "file heuristics assessed");
        Detection {
            should_create,
            reason,
            word_count,
            line_count,
        }
    }

    fn reason(&self, text: &str, user_message: &str, word_count: usize) -> DetectionReason {
        if is_tool_response(text) {
            return DetectionReason::ToolResponse;
        }
        if word_count == 0 {
            return DetectionReason::Empty;
        }
        let request = fold_accents(user_message);
        if EXPLICIT_REQUEST_PHRASES.iter().any(|p| request.contains(p)) {
            return DetectionReason::ExplicitRequest;
        }
        if contains_marker_signature(text) {
            return DetectionReason::MarkerSignature;
        }
        if word_count >= self.long_form_min_words && LONG_FORM_WORD_RE.is_match(&request) {
            return DetectionReason::LongFormRequest;
        }
        DetectionReason::NotRequested
    }

    /// Candidate for `text` dated today, or `None` when it should stay in chat.
    pub fn detect(&self, text: &str, user_message: &str) -> Option<FileCandidate> {
        self.detect_on(text, user_message, Local::now().date_naive())
    }

    pub fn detect_on(
        &self,
        text: &str,
        user_message: &str,
        today: NaiveDate,
    ) -> Option<FileCandidate> {
        if !self.assess(text, user_message).should_create {
            return None;
        }
        let content = scrub_marker_syntax(text);
        if content.is_empty() {
            return None;
        }
        let file_type = infer_file_type(&content, user_message);
        let filename = synthesize_filename(&content, user_message, file_type, today);
        let description = synthesize_description(&content, user_message);
        Some(FileCandidate::new(
            content,
            filename,
            description,
            file_type,
            CandidateOrigin::AutoDetect,
        ))
    }
}

/// Heuristic candidate with default thresholds.
pub fn detect_file_candidate(text: &str, user_message: &str) -> Option<FileCandidate> {
    HeuristicDetector::default().detect(text, user_message)
}

/// Whether `text` reads like the rendered result of a Drive/Calendar-style tool call.
pub fn is_tool_response(text: &str) -> bool {
    TOOL_RESPONSE_PHRASE_RE.is_match(text)
        || text.contains(TOOL_RESPONSE_EMOJIS)
        || TOOL_TABLE_HEADER_RE.is_match(text)
        || ITEM_COUNT_RE.is_match(text)
}

/// Markdown syntax wins, then an extension named in the request, then `.md`.
pub fn infer_file_type(content: &str, user_message: &str) -> FileType {
    if MARKDOWN_SYNTAX_RE.is_match(content) {
        return FileType::Md;
    }
    REQUESTED_EXTENSION_RE
        .captures(user_message)
        .and_then(|caps| FileType::from_extension(&caps[1]))
        .unwrap_or_default()
}
