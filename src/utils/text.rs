// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TEXT UTILITIES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//
// Utilitários para processamento de texto:
// - Truncation por caracteres (seguro para UTF-8)
// - Cleaning
// - Contagem de ocorrências
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trunca texto para no máximo `max_chars` caracteres
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Remove caracteres de controle e normaliza whitespace
pub fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Conta ocorrências não sobrepostas de `needle` em `haystack`
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        0
    } else {
        haystack.matches(needle).count()
    }
}

/// Número de palavras separadas por whitespace
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_utf8() {
        assert_eq!(truncate_chars("análise", 3), "aná");
        assert_eq!(truncate_chars("curto", 10), "curto");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  hello\u{0007}   world \n"), "hello world");
    }

    #[test]
    fn test_count_occurrences() {
        assert_eq!(count_occurrences("fitness e fitness", "fitness"), 2);
        assert_eq!(count_occurrences("abc", ""), 0);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(" um  dois\ttrês\n"), 3);
    }
}
