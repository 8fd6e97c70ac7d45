//! Plain-text views of the HTML fragments stored in note content.
//!
//! Notes hold whatever markup the editor produced. Titles, counters and
//! exports only care about the visible text, so block-level boundaries are
//! turned into line breaks before the remaining tags are dropped.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{NoteStats, UNTITLED_NOTE_TITLE};
use crate::util::truncate_with_ellipsis;

/// Visible characters kept in a derived title before the ellipsis.
pub const TITLE_MAX_CHARS: usize = 50;

static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|h[1-6]|li|blockquote|pre|tr)\s*>")
        .expect("Invalid regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

/// Remove all markup, keeping one line per block element.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let with_breaks = BLOCK_BREAK.replace_all(html, "\n");
    let bare = TAG.replace_all(&with_breaks, "");
    decode_entities(&bare)
}

/// Tag-stripped text as trimmed, non-empty lines.
#[must_use]
pub fn text_lines(html: &str) -> Vec<String> {
    strip_tags(html)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Title from the first line of visible text.
///
/// Lines longer than [`TITLE_MAX_CHARS`] are cut and suffixed with `...`;
/// content without any text yields [`UNTITLED_NOTE_TITLE`].
#[must_use]
pub fn derive_title(html: &str) -> String {
    text_lines(html).first().map_or_else(
        || UNTITLED_NOTE_TITLE.to_string(),
        |line| truncate_with_ellipsis(line, TITLE_MAX_CHARS),
    )
}

/// Word, character and sentence counters for the status bar.
///
/// Characters exclude whitespace, so layout line breaks introduced by block
/// elements never inflate the count.
#[must_use]
pub fn note_stats(html: &str) -> NoteStats {
    let text = strip_tags(html);
    let trimmed = text.trim();

    let words = trimmed.split_whitespace().count();
    let characters = trimmed.chars().filter(|c| !c.is_whitespace()).count();
    let sentences = trimmed
        .split(['.', '!', '?'])
        .filter(|segment| !segment.trim().is_empty())
        .count();

    NoteStats {
        words,
        characters,
        sentences,
    }
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn stats_for_single_paragraph() {
        assert_eq!(
            note_stats("<p>Hello world. Bye!</p>"),
            NoteStats {
                words: 3,
                characters: 15,
                sentences: 2,
            }
        );
    }

    #[test]
    fn stats_for_empty_content() {
        assert_eq!(note_stats(""), NoteStats::default());
        assert_eq!(note_stats("<p><br></p>"), NoteStats::default());
    }

    #[test]
    fn stats_split_words_across_blocks() {
        let stats = note_stats("<p>one</p><p>two</p>");
        assert_eq!(stats.words, 2);
        assert_eq!(stats.characters, 6);
        assert_eq!(stats.sentences, 1);
    }

    #[test]
    fn strip_tags_keeps_block_lines_and_decodes_entities() {
        assert_eq!(
            strip_tags("<h1>Tom &amp; Jerry</h1><p>a &lt; b</p>"),
            "Tom & Jerry\na < b\n"
        );
    }

    #[test]
    fn derive_title_uses_first_non_empty_line() {
        assert_eq!(
            derive_title("<p>   </p><h2>Shopping <b>list</b></h2><p>eggs</p>"),
            "Shopping list"
        );
    }

    #[test]
    fn derive_title_truncates_long_lines() {
        let line = "x".repeat(60);
        let title = derive_title(&format!("<p>{line}</p>"));
        assert_eq!(title, format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn derive_title_exactly_fifty_chars_is_kept() {
        let line = "y".repeat(50);
        assert_eq!(derive_title(&line), line);
    }

    #[test]
    fn derive_title_defaults_when_blank() {
        assert_eq!(derive_title(""), "Untitled Note");
        assert_eq!(derive_title("  \n\t "), "Untitled Note");
        assert_eq!(derive_title("<p></p><div><br/></div>"), "Untitled Note");
    }

    #[test]
    fn escape_html_covers_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom's & co</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&#39;s &amp; co&lt;/a&gt;"
        );
    }
}
