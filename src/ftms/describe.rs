//! Filename and description synthesis for file candidates.

use super::schema::FileType;
use crate::util::{fold_accents, truncate_with_ellipsis};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Longest slug used in a generated filename.
pub const MAX_SLUG_CHARS: usize = 50;

/// Stem used when nothing usable survives slugification.
const FALLBACK_STEM: &str = "documento";

const FIRST_LINE_CHARS: usize = 80;
const PROMPT_CHARS: usize = 60;

/// Document-type prefixes and the (accent-folded) words that select them, in priority order.
const DOCUMENT_KINDS: &[(&str, &[&str])] = &[
    ("ensayo", &["ensayo", "essay"]),
    ("historia", &["historia", "cuento", "relato", "story"]),
    ("articulo", &["articulo", "article"]),
    ("reporte", &["reporte", "informe", "report"]),
    ("guia", &["guia", "tutorial", "guide"]),
    ("carta", &["carta", "letter"]),
];

const DEFAULT_DOCUMENT_KIND: &str = "documento";

/// First markdown H1/H2 heading.
static TITLE_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ ]{0,3}#{1,2}[ \t]+(.+?)[ \t#]*$").unwrap());

/// Lowercase ASCII slug: accents folded, everything else collapsed to single dashes.
pub fn slugify(text: &str, max_chars: usize) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in fold_accents(text).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.len() > max_chars {
        slug.truncate(max_chars);
    }
    slug.trim_end_matches('-').to_string()
}

/// Normalize a model-supplied filename.
///
/// Names that already end in a recognised extension keep their stem (directory
/// components and control characters stripped, extension lowercased). Anything
/// else is slugified and gets `.md`. The result always carries an extension.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw
        .trim()
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let base: String = base.chars().filter(|c| !c.is_control()).collect();
    let base = base.trim();

    if let Some(file_type) = FileType::from_filename(base) {
        if let Some((stem, _)) = base.rsplit_once('.') {
            let stem = stem.trim();
            if !stem.trim_matches('.').is_empty() {
                return format!("{stem}.{}", file_type.extension());
            }
        }
    }

    let slug = slugify(base, MAX_SLUG_CHARS);
    let stem = if slug.is_empty() { FALLBACK_STEM } else { slug.as_str() };
    format!("{stem}.{}", FileType::Md.extension())
}

/// Title used for generated filenames: the first H1/H2 heading, else the opening text.
pub fn extract_title(content: &str) -> String {
    if let Some(caps) = TITLE_HEADING_RE.captures(content) {
        let heading = caps[1].replace(['*', '_', '`'], "");
        let heading = heading.trim();
        if !heading.is_empty() {
            return heading.to_string();
        }
    }
    content.trim().chars().take(MAX_SLUG_CHARS).collect()
}

/// Document-type prefix inferred from the request, then from the title.
pub fn document_kind(user_message: &str, title: &str) -> &'static str {
    for source in [user_message, title] {
        let folded = fold_accents(source);
        for (kind, words) in DOCUMENT_KINDS {
            if words.iter().any(|w| folded.contains(w)) {
                return kind;
            }
        }
    }
    DEFAULT_DOCUMENT_KIND
}

/// `{kind}-{slug}-{date}.{ext}` for auto-detected candidates.
pub fn synthesize_filename(
    content: &str,
    user_message: &str,
    file_type: FileType,
    today: NaiveDate,
) -> String {
    let title = extract_title(content);
    let kind = document_kind(user_message, &title);
    let slug = slugify(&title, MAX_SLUG_CHARS);
    let date = today.format("%Y-%m-%d");
    let ext = file_type.extension();
    if slug.is_empty() {
        format!("{kind}-{date}.{ext}")
    } else {
        format!("{kind}-{slug}-{date}.{ext}")
    }
}

/// Short summary from the first content line and the originating request.
pub fn synthesize_description(content: &str, user_message: &str) -> String {
    let first_line = content
        .lines()
        .map(|l| l.trim().trim_start_matches('#').trim().trim_matches('*').trim())
        .find(|l| !l.is_empty())
        .map(|l| truncate_with_ellipsis(l, FIRST_LINE_CHARS));
    let prompt = user_message.trim();
    let prompt = (!prompt.is_empty()).then(|| truncate_with_ellipsis(prompt, PROMPT_CHARS));

    match (first_line, prompt) {
        (Some(line), Some(prompt)) => format!("{line} (solicitud: \"{prompt}\")"),
        (Some(line), None) => line,
        (None, Some(prompt)) => format!("Documento generado para: \"{prompt}\""),
        (None, None) => "Documento generado".to_string(),
    }
}
