//! Text normalization and sentence segmentation for narration.
//!
//! Narrated text usually comes straight from chat or markdown content, so it
//! is cleaned of markup and pictographs before it reaches the engine, then cut
//! into sentences so playback can be paced and tracked one sentence at a time.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_CODE: Lazy<Regex> = Lazy::new(|| compile(r"(?s)```.*?```"));

// Pictographs plus the joiners and modifiers that glue emoji sequences together.
static EMOJI: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        "[",
        "\u{1F000}-\u{1FAFF}",
        "\u{2600}-\u{27BF}",
        "\u{2300}-\u{23FF}",
        "\u{2B00}-\u{2BFF}",
        "\u{FE00}-\u{FE0F}",
        "\u{200D}",
        "\u{20E3}",
        "\u{E0020}-\u{E007F}",
        "]",
    ))
});

static HEADING: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^[ \t]*#{1,6}[ \t]*"));
static BLOCKQUOTE: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^[ \t]*>[ \t]?"));
static BULLET: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^[ \t]*[-*+•][ \t]+"));
static ORDINAL: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^[ \t]*\d+[.)][ \t]+"));
static LINK: Lazy<Regex> = Lazy::new(|| compile(r"!?\[([^\]]*)\]\([^)]*\)"));
static BOLD: Lazy<Regex> = Lazy::new(|| compile(r"\*\*(.+?)\*\*|__(.+?)__"));
static STRIKE: Lazy<Regex> = Lazy::new(|| compile(r"~~(.+?)~~"));
static ITALIC_STAR: Lazy<Regex> = Lazy::new(|| compile(r"\*([^*\n]+?)\*"));
// `_` is a word character, so `\b` on the outside of each underscore means
// "not glued to a word" without consuming the neighbouring character.
static ITALIC_UNDERSCORE: Lazy<Regex> = Lazy::new(|| compile(r"\b_([^_\n]+?)_\b"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| compile(r"`([^`]*)`"));
static STRAY_MARKERS: Lazy<Regex> = Lazy::new(|| compile(r"\*+|`+|~~"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| compile(r"\s+"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static narration pattern must compile")
}

/// Strip markup and pictographs from `text` and collapse whitespace.
///
/// Fenced code blocks are dropped entirely. Links and images keep their
/// visible text, emphasis and inline code keep their content, heading,
/// blockquote and list markers are removed. Plain text comes back unchanged
/// apart from whitespace collapsing and trimming.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let text = FENCED_CODE.replace_all(text, " ");
    let text = EMOJI.replace_all(&text, "");

    // Line-anchored markers must go before whitespace is collapsed.
    let text = HEADING.replace_all(&text, "");
    let text = BLOCKQUOTE.replace_all(&text, "");
    let text = BULLET.replace_all(&text, "");
    let text = ORDINAL.replace_all(&text, "");

    let text = LINK.replace_all(&text, "$1");
    let text = BOLD.replace_all(&text, "$1$2");
    let text = STRIKE.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = STRAY_MARKERS.replace_all(&text, "");

    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Sentence-terminal punctuation, including the ideographic full stop.
const fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。')
}

/// Split text into sentences after terminal punctuation followed by whitespace.
///
/// Segments are trimmed and empty ones discarded; source order is kept.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        if let Some(&(_, next)) = chars.peek() {
            if next.is_whitespace() {
                let end = i + c.len_utf8();
                push_segment(&mut sentences, &text[start..end]);
                start = end;
            }
        }
    }

    push_segment(&mut sentences, &text[start..]);
    sentences
}

fn push_segment(sentences: &mut Vec<String>, segment: &str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        sentences.push(segment.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_plain_text_unchanged() {
        let text = "Hello world! This is a test. Done?";
        assert_eq!(clean_text(text), text);
    }

    #[test]
    fn test_markdown_is_stripped() {
        let cleaned = clean_text("**Important:** see [this link](http://x) for `code`.");

        assert!(!cleaned.contains("**"));
        assert!(!cleaned.contains('`'));
        assert!(!cleaned.contains('['));
        assert!(!cleaned.contains("](") && !cleaned.contains("http://x"));
        for word in ["Important", "see", "this link", "for", "code"] {
            assert!(cleaned.contains(word), "missing {word:?} in {cleaned:?}");
        }
        assert_eq!(cleaned, "Important: see this link for code.");
    }

    #[rstest]
    #[case("# Resumen mensual", "Resumen mensual")]
    #[case("### Gastos\nTotal del mes.", "Gastos Total del mes.")]
    #[case("- Renta\n- Comida\n* Transporte", "Renta Comida Transporte")]
    #[case("1. Primero\n2) Segundo", "Primero Segundo")]
    #[case("> Nota importante", "Nota importante")]
    #[case("Texto *en cursiva* y _subrayado_.", "Texto en cursiva y subrayado.")]
    #[case("Un ~~error~~ corregido.", "Un error corregido.")]
    #[case("Mira ![recibo](img.png) aquí.", "Mira recibo aquí.")]
    #[case("Antes\n```rust\nlet x = 1;\n```\nDespués", "Antes Después")]
    #[case("variable snake_case_name sigue", "variable snake_case_name sigue")]
    #[case("_uno_ _dos_ y _tres_.", "uno dos y tres.")]
    #[case("(_nota_)", "(nota)")]
    #[case("El año 2024. Siguiente", "El año 2024. Siguiente")]
    fn test_clean_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_text(input), expected);
    }

    #[test]
    fn test_emoji_removed() {
        assert_eq!(clean_text("Great job! 🎉🚀"), "Great job!");
        assert_eq!(clean_text("Ahorro 💰 listo ✅"), "Ahorro listo");
        assert_eq!(clean_text("Familia 👨‍👩‍👧 feliz"), "Familia feliz");
        assert_eq!(clean_text("Bien 👍🏽 hecho"), "Bien hecho");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(clean_text("  uno \t dos\n\n tres  "), "uno dos tres");
    }

    #[test]
    fn test_clean_empty_inputs() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \n\t "), "");
        assert_eq!(clean_text("🎉 ✨"), "");
        assert_eq!(clean_text("```\nonly code\n```"), "");
    }

    #[test]
    fn test_split_basic() {
        assert_eq!(
            split_sentences("Hello world! This is a test. Done?"),
            vec!["Hello world!", "This is a test.", "Done?"]
        );
    }

    #[test]
    fn test_split_requires_whitespace() {
        assert_eq!(
            split_sentences("Total: 3.50 pesos. Listo"),
            vec!["Total: 3.50 pesos.", "Listo"]
        );
        assert_eq!(split_sentences("v1.2.3"), vec!["v1.2.3"]);
    }

    #[test]
    fn test_split_ideographic_period() {
        assert_eq!(
            split_sentences("第一句。 第二句。"),
            vec!["第一句。", "第二句。"]
        );
    }

    #[test]
    fn test_split_discards_empty_segments() {
        assert_eq!(split_sentences(""), Vec::<String>::new());
        assert_eq!(split_sentences("   "), Vec::<String>::new());
        assert_eq!(split_sentences("Hola.   ¿Qué tal?"), vec!["Hola.", "¿Qué tal?"]);
    }

    proptest! {
        #[test]
        fn prop_clean_plain_text_is_stable(words in proptest::collection::vec("[A-Za-z]{1,8}", 1..12)) {
            let text = words.join(" ");
            prop_assert_eq!(clean_text(&text), text.clone());
            prop_assert_eq!(clean_text(&clean_text(&text)), text);
        }

        #[test]
        fn prop_split_segments_are_non_empty(text in "[a-z .!?]{0,60}") {
            for sentence in split_sentences(&text) {
                prop_assert!(!sentence.is_empty());
                prop_assert_eq!(sentence.trim(), sentence.as_str());
            }
        }
    }
}
