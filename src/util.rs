/// Truncate to at most `max_chars` characters, appending `...` when cut.
/// Counts chars, not bytes, so multi-byte text never splits mid-codepoint.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", s[..idx].trim_end()),
        None => s.to_string(),
    }
}

/// Lowercase and strip the Spanish/Latin diacritics that show up in user prompts,
/// so keyword tables can be written once without accents.
pub fn fold_accents(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate_with_ellipsis("hola", 10), "hola");
        assert_eq!(truncate_with_ellipsis("hola", 4), "hola");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_with_ellipsis("canción larga", 7), "canción...");
        assert_eq!(truncate_with_ellipsis("añoñoño", 3), "año...");
    }

    #[test]
    fn fold_accents_lowercases_and_strips() {
        assert_eq!(fold_accents("Escribe una GUÍA de Ñandú"), "escribe una guia de nandu");
        assert_eq!(fold_accents("Artículo"), "articulo");
    }
}
