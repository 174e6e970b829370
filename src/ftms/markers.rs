//! Hidden file markers embedded by the model in its own output.
//!
//! Three syntaxes are recognised, tried in this order:
//!
//! ```text
//! <!-- GENERATED_DOCUMENT: name.ext
//! ...
//! END_GENERATED_DOCUMENT -->
//!
//! <<<FILE:name.ext
//! ...
//! >>>END_FILE
//!
//! <!--FILE:name.ext|description-->
//! ...
//! <!--/FILE-->
//! ```
//!
//! Each kind runs on the text left over by the previous kinds, so matches never
//! overlap. Matched blocks are cut out of the visible response entirely; their
//! content belongs to the file view only. Anything that does not match is left
//! alone as ordinary chat text.

use super::describe::{sanitize_filename, synthesize_description};
use super::schema::{CandidateOrigin, FileCandidate, FileType};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

static GENERATED_DOCUMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<!--\s*GENERATED_DOCUMENT:[ \t]*([^\n]*?)[ \t]*\r?\n(.*?)END_GENERATED_DOCUMENT[ \t]*-->",
    )
    .unwrap()
});

static ANGLE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<<<FILE:[ \t]*([^\n]*?)[ \t]*\r?\n(.*?)>>>END_FILE").unwrap()
});

static COMMENT_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--FILE:[ \t]*([^|\n]*?)[ \t]*(?:\|([^\n]*?))?[ \t]*-->(.*?)<!--/FILE-->")
        .unwrap()
});

/// Opening tag missing its `-->` or its closing tag: header ends at `-->` or end of line,
/// body runs to the closing tag or end of text.
static COMMENT_FILE_LOOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<!--FILE:[ \t]*([^|\n]*?)[ \t]*(?:\|([^\n]*?))?[ \t]*(?:-->|\r?\n)(.*?)(?:<!--/FILE-->|\z)",
    )
    .unwrap()
});

/// Any delimiter fragment that must never reach a caller inside extracted content.
static MARKER_SYNTAX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<!--\s*GENERATED_DOCUMENT:[^\n]*|END_GENERATED_DOCUMENT\s*-->|<<<FILE:[^\n]*|>>>END_FILE|<!--FILE:[^\n]*|<!--/FILE-->",
    )
    .unwrap()
});

static EXCESS_BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

/// Substrings that identify any of the marker syntaxes.
const MARKER_SIGNATURES: [&str; 3] = ["<!--FILE:", "<<<FILE:", "GENERATED_DOCUMENT:"];

/// Marker syntaxes in extraction priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `<!-- GENERATED_DOCUMENT: name` ... `END_GENERATED_DOCUMENT -->`
    GeneratedDocument,
    /// `<<<FILE:name` ... `>>>END_FILE`
    AngleFile,
    /// `<!--FILE:name|description-->` ... `<!--/FILE-->`
    CommentFile,
    /// `<!--FILE:name|description` (no `-->`) ... `<!--/FILE-->` or end of text
    CommentFileLoose,
}

impl MarkerKind {
    pub const PRIORITY: [MarkerKind; 4] = [
        MarkerKind::GeneratedDocument,
        MarkerKind::AngleFile,
        MarkerKind::CommentFile,
        MarkerKind::CommentFileLoose,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkerKind::GeneratedDocument => "generated_document",
            MarkerKind::AngleFile => "angle_file",
            MarkerKind::CommentFile => "comment_file",
            MarkerKind::CommentFileLoose => "comment_file_loose",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            MarkerKind::GeneratedDocument => &*GENERATED_DOCUMENT_RE,
            MarkerKind::AngleFile => &*ANGLE_FILE_RE,
            MarkerKind::CommentFile => &*COMMENT_FILE_RE,
            MarkerKind::CommentFileLoose => &*COMMENT_FILE_LOOSE_RE,
        }
    }

    /// Find every block of this kind in `text`.
    pub fn find_blocks(self, text: &str) -> Vec<MarkerBlock> {
        self.pattern()
            .captures_iter(text)
            .filter_map(|caps| self.parse(&caps))
            .collect()
    }

    fn parse(self, caps: &Captures<'_>) -> Option<MarkerBlock> {
        let span = caps.get(0)?.range();
        let (filename, description, content) = match self {
            MarkerKind::GeneratedDocument | MarkerKind::AngleFile => {
                (caps.get(1)?.as_str(), None, caps.get(2)?.as_str())
            }
            MarkerKind::CommentFile | MarkerKind::CommentFileLoose => (
                caps.get(1)?.as_str(),
                caps.get(2).map(|m| m.as_str()),
                caps.get(3)?.as_str(),
            ),
        };
        Some(MarkerBlock {
            kind: self,
            span,
            filename: strip_comment_close(filename).to_string(),
            description: description
                .map(strip_comment_close)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            content: scrub_marker_syntax(content),
        })
    }
}

/// One raw marker match, before filename sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerBlock {
    pub kind: MarkerKind,
    pub span: Range<usize>,
    pub filename: String,
    pub description: Option<String>,
    pub content: String,
}

impl MarkerBlock {
    pub fn into_candidate(self, user_message: &str) -> FileCandidate {
        let filename = sanitize_filename(&self.filename);
        let file_type = FileType::from_filename(&filename).unwrap_or_default();
        let description = self
            .description
            .unwrap_or_else(|| synthesize_description(&self.content, user_message));
        FileCandidate::new(
            self.content,
            filename,
            description,
            file_type,
            CandidateOrigin::HiddenMarker,
        )
    }
}

/// Cleaned response plus the candidates cut out of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerExtraction {
    pub clean_response: String,
    pub files: Vec<FileCandidate>,
}

/// Pull every hidden file block out of `response`.
///
/// When nothing matches, `clean_response` is `response` byte-for-byte.
pub fn extract_hidden_files(response: &str, user_message: &str) -> MarkerExtraction {
    let mut remaining = response.to_string();
    let mut files = Vec::new();

    for kind in MarkerKind::PRIORITY {
        let blocks = kind.find_blocks(&remaining);
        if blocks.is_empty() {
            continue;
        }
        tracing::debug!(kind = kind.name(), count = blocks.len(), "hidden file markers matched");
        remaining = remove_spans(&remaining, blocks.iter().map(|b| b.span.clone()));
        files.extend(blocks.into_iter().map(|b| b.into_candidate(user_message)));
    }

    if files.is_empty() {
        return MarkerExtraction {
            clean_response: response.to_string(),
            files,
        };
    }

    let clean_response = EXCESS_BLANK_LINES_RE
        .replace_all(&remaining, "\n\n")
        .trim()
        .to_string();
    MarkerExtraction {
        clean_response,
        files,
    }
}

/// Whether `text` carries any marker syntax at all.
pub fn contains_marker_signature(text: &str) -> bool {
    MARKER_SIGNATURES.iter().any(|sig| text.contains(sig))
}

/// Remove residual delimiters and trim.
pub fn scrub_marker_syntax(content: &str) -> String {
    MARKER_SYNTAX_RE.replace_all(content, "").trim().to_string()
}

fn strip_comment_close(s: &str) -> &str {
    s.trim().trim_end_matches("-->").trim()
}

/// Rebuild `text` without the given non-overlapping, ascending spans.
fn remove_spans(text: &str, spans: impl Iterator<Item = Range<usize>>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(&text[cursor..span.start]);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_generated_document_block() {
        let response = "Aquí tienes el documento.\n\n<!-- GENERATED_DOCUMENT: plan.md\n# Plan\n\nPaso uno.\nEND_GENERATED_DOCUMENT -->\n\n¿Algo más?";
        let out = extract_hidden_files(response, "Haz un plan");

        assert_eq!(out.files.len(), 1);
        let file = &out.files[0];
        assert_eq!(file.filename, "plan.md");
        assert_eq!(file.content, "# Plan\n\nPaso uno.");
        assert_eq!(file.word_count, 4);
        assert_eq!(file.file_type, FileType::Md);
        assert_eq!(file.origin, CandidateOrigin::HiddenMarker);
        assert_eq!(file.description, "Plan (solicitud: \"Haz un plan\")");
        assert_eq!(out.clean_response, "Aquí tienes el documento.\n\n¿Algo más?");
    }

    #[test]
    fn extracts_angle_bracket_block() {
        let response = "Listo:\n<<<FILE:notas.txt\nuno\ndos\n>>>END_FILE\nFin.";
        let out = extract_hidden_files(response, "");

        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].filename, "notas.txt");
        assert_eq!(out.files[0].file_type, FileType::Txt);
        assert_eq!(out.files[0].content, "uno\ndos");
        assert_eq!(out.clean_response, "Listo:\n\nFin.");
    }

    #[test]
    fn extracts_comment_block_with_description() {
        let response =
            "Te dejo el resumen.\n<!--FILE:resumen.md|Resumen ejecutivo-->\n## Resumen\nTodo bien.\n<!--/FILE-->";
        let out = extract_hidden_files(response, "resume esto");

        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].filename, "resumen.md");
        assert_eq!(out.files[0].description, "Resumen ejecutivo");
        assert_eq!(out.files[0].content, "## Resumen\nTodo bien.");
        assert_eq!(out.clean_response, "Te dejo el resumen.");
        assert!(!out.clean_response.contains("<!--"));
    }

    #[test]
    fn comment_block_without_description_synthesizes_one() {
        let response = "<!--FILE:idea.md-->Una idea suelta<!--/FILE-->";
        let out = extract_hidden_files(response, "");
        assert_eq!(out.files[0].filename, "idea.md");
        assert_eq!(out.files[0].description, "Una idea suelta");
        assert_eq!(out.clean_response, "");
    }

    #[test]
    fn malformed_opening_tag_uses_loose_match() {
        let response = "Intro\n<!--FILE:report.md|Summary\nLine one\nLine two\n<!--/FILE-->\nOutro";
        let out = extract_hidden_files(response, "");

        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].filename, "report.md");
        assert_eq!(out.files[0].description, "Summary");
        assert_eq!(out.files[0].content, "Line one\nLine two");
        assert_eq!(out.clean_response, "Intro\n\nOutro");
    }

    #[test]
    fn loose_match_runs_to_end_of_text_without_closing_tag() {
        let response = "Mira:\n<!--FILE:borrador|Borrador\ncontenido final";
        let out = extract_hidden_files(response, "");

        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].filename, "borrador.md");
        assert_eq!(out.files[0].content, "contenido final");
        assert_eq!(out.clean_response, "Mira:");
    }

    #[test]
    fn unclosed_well_formed_opening_drops_arrow_from_name() {
        let response = "<!--FILE:a.md-->\ncuerpo";
        let out = extract_hidden_files(response, "");
        assert_eq!(out.files[0].filename, "a.md");
        assert_eq!(out.files[0].content, "cuerpo");
    }

    #[test]
    fn unclosed_tag_keeps_text_on_the_opening_line() {
        let out = extract_hidden_files("<!--FILE:a.md-->content here\nmore", "");
        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].filename, "a.md");
        assert_eq!(out.files[0].content, "content here\nmore");
        assert_eq!(out.clean_response, "");

        let out = extract_hidden_files("Nota:\n<!--FILE:b.txt|Lista-->uno\ndos", "");
        assert_eq!(out.files[0].filename, "b.txt");
        assert_eq!(out.files[0].description, "Lista");
        assert_eq!(out.files[0].content, "uno\ndos");
        assert_eq!(out.clean_response, "Nota:");
    }

    #[test]
    fn kinds_run_in_priority_order_without_overlap() {
        let response = "<!--FILE:c.md|C-->c<!--/FILE-->\n<<<FILE:b.md\nb\n>>>END_FILE\n<!-- GENERATED_DOCUMENT: a.md\na\nEND_GENERATED_DOCUMENT -->";
        let out = extract_hidden_files(response, "");
        let names: Vec<_> = out.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, ["a.md", "b.md", "c.md"]);
        assert_eq!(out.clean_response, "");
    }

    #[test]
    fn multiple_blocks_of_one_kind_keep_position_order() {
        let response = "<<<FILE:uno.md\n1\n>>>END_FILE\ntexto\n<<<FILE:dos.md\n2\n>>>END_FILE";
        let out = extract_hidden_files(response, "");
        let names: Vec<_> = out.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, ["uno.md", "dos.md"]);
        assert_eq!(out.clean_response, "texto");
    }

    #[test]
    fn nested_delimiters_are_scrubbed_from_content() {
        let response =
            "<!-- GENERATED_DOCUMENT: outer.md\ntop\n<<<FILE:inner.md\nmid\nEND_GENERATED_DOCUMENT -->\nrest\n>>>END_FILE";
        let out = extract_hidden_files(response, "");

        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].filename, "outer.md");
        assert_eq!(out.files[0].content, "top\n\nmid");
        for file in &out.files {
            assert!(!contains_marker_signature(&file.content));
            assert!(!file.content.contains(">>>END_FILE"));
        }
    }

    #[test]
    fn unmatched_text_is_returned_verbatim() {
        let inputs = [
            "",
            "Hola, ¿cómo estás?\n\n\n\nBien.",
            "<!--FILE:sin-cierre.md|desc",
            "<<<FILE:x.md sin salto de línea",
            "END_GENERATED_DOCUMENT --> suelto",
            "<!--/FILE--> solo cierre",
            "<!-- comentario normal -->",
            "🌟🌟🌟 <<< >>> <!-- -->",
        ];
        for input in inputs {
            let out = extract_hidden_files(input, "");
            assert!(out.files.is_empty(), "{input:?}");
            assert_eq!(out.clean_response, input);
        }
    }

    #[test]
    fn bad_filenames_are_sanitized() {
        let response = "<<<FILE:\ncuerpo\n>>>END_FILE";
        let out = extract_hidden_files(response, "");
        assert_eq!(out.files[0].filename, "documento.md");

        let response = "<<<FILE:Mi Informe Final\ncuerpo\n>>>END_FILE";
        let out = extract_hidden_files(response, "");
        assert_eq!(out.files[0].filename, "mi-informe-final.md");
    }

    #[test]
    fn signature_detection() {
        assert!(contains_marker_signature("x <!--FILE:a.md"));
        assert!(contains_marker_signature("<<<FILE:"));
        assert!(contains_marker_signature("<!-- GENERATED_DOCUMENT: a"));
        assert!(!contains_marker_signature("<!-- FILE -->"));
    }

    #[test]
    fn remove_spans_cuts_ranges() {
        assert_eq!(remove_spans("abcdef", [1..2, 4..5].into_iter()), "acdf");
        assert_eq!(remove_spans("abc", std::iter::empty()), "abc");
    }
}
