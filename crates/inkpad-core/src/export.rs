//! Plain-text import and export of notes.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::{escape_html, text_lines};
use crate::Note;

/// Title used for imports that arrive without a usable file name.
pub const IMPORTED_NOTE_TITLE: &str = "Imported Note";

const IMPORT_MIME_TYPES: [&str; 2] = ["text/plain", "text/markdown"];
const IMPORT_EXTENSIONS: [&str; 2] = ["txt", "md"];

static NON_ALPHANUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]+").expect("Invalid regex"));

/// A note rendered as a downloadable text file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextExport {
    pub filename: String,
    pub text: String,
}

/// Render a note as plain text with one line per block of content.
#[must_use]
pub fn export_note_text(note: &Note) -> TextExport {
    TextExport {
        filename: suggested_export_file_name(&note.title),
        text: text_lines(&note.content).join("\n"),
    }
}

/// `<sanitized-title>.txt`: runs of non-alphanumeric characters become `_`.
#[must_use]
pub fn suggested_export_file_name(title: &str) -> String {
    let stem = NON_ALPHANUMERIC_RUN.replace_all(title, "_").to_ascii_lowercase();
    format!("{stem}.txt")
}

/// Convert line-delimited text into one escaped `<p>` per non-empty line.
#[must_use]
pub fn plain_text_to_html(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>", escape_html(line)))
        .collect()
}

/// Title for an imported file: its name without the extension.
#[must_use]
pub fn import_title(filename: Option<&str>) -> String {
    filename
        .and_then(|name| Path::new(name.trim()).file_stem())
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .map_or_else(|| IMPORTED_NOTE_TITLE.to_string(), ToString::to_string)
}

/// Whether a file may be imported, judged by MIME type or extension.
#[must_use]
pub fn is_supported_import(mime_type: Option<&str>, filename: &str) -> bool {
    let mime_ok = mime_type.is_some_and(|mime| {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        IMPORT_MIME_TYPES
            .iter()
            .any(|allowed| essence.eq_ignore_ascii_case(allowed))
    });
    let extension_ok = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMPORT_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        });
    mime_ok || extension_ok
}
