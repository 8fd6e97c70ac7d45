use std::path::Path;

use chrono::Utc;
use inkpad_core::local::{FileStorage, LocalStore};
use inkpad_core::{Note, NoteId};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::cli::CompletionShell;
use crate::commands::add::run_add;
use crate::commands::common::{
    default_editor, format_relative_time, normalize_content, normalize_note_identifier,
    normalize_search_query, note_preview, open_workspace, resolve_note, resolve_target_note,
    CliContext,
};
use crate::commands::completions::render_completions;
use crate::commands::config::{merge_profile, ProfileValues};
use crate::commands::delete::run_delete;
use crate::commands::export::{export_destination, run_export};
use crate::commands::import::run_import;
use crate::commands::open::run_open;
use crate::config_profiles::CliProfile;
use crate::error::CliError;

fn test_context(dir: &TempDir) -> CliContext {
    CliContext {
        data_dir: Some(dir.path().join("data")),
        profile: Some("cli-tests".to_string()),
        config_path: Some(dir.path().join("cli-config.json")),
    }
}

fn note_with_id(id: &str, title: &str) -> Note {
    let now = Utc::now();
    Note {
        id: NoteId::from(id),
        title: title.to_string(),
        content: format!("<p>{title}</p>"),
        created_at: now,
        updated_at: now,
    }
}

fn seed_notes(data_dir: &Path, notes: &[Note]) {
    let local = LocalStore::new(FileStorage::open(data_dir).unwrap());
    local.save(notes, notes.first().map(|note| &note.id)).unwrap();
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn normalize_search_query_rejects_empty() {
    assert!(normalize_search_query(" \n\t ").is_err());
    assert_eq!(
        normalize_search_query("  exact phrase  ").unwrap(),
        "exact phrase"
    );
}

#[test]
fn normalize_note_identifier_rejects_empty() {
    assert!(matches!(
        normalize_note_identifier(" \n "),
        Err(CliError::EmptyNoteId)
    ));
    assert_eq!(normalize_note_identifier("  abc123  ").unwrap(), "abc123");
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn note_preview_uses_visible_text() {
    let note = Note::new(
        "Long",
        "<p>This is a <b>very</b> long sentence that should be shortened</p><p>second</p>",
    );
    assert_eq!(note_preview(&note, 20), "This is a very lo...");
    assert_eq!(note_preview(&Note::new("Empty", ""), 20), "");
}

#[test]
fn merge_profile_prefers_explicit_then_env_then_existing() {
    let existing = CliProfile {
        supabase_url: Some("https://old.supabase.co".to_string()),
        supabase_anon_key: Some("old-key".to_string()),
        notes_table: Some("old_notes".to_string()),
    };
    let values = ProfileValues {
        supabase_url: Some(" https://new.supabase.co ".to_string()),
        supabase_anon_key: None,
        notes_table: Some("  ".to_string()),
    };
    let env = |name: &str| (name == "SUPABASE_ANON_KEY").then(|| "env-key".to_string());

    let merged = merge_profile(&existing, values, env);

    assert_eq!(
        merged,
        CliProfile {
            supabase_url: Some("https://new.supabase.co".to_string()),
            supabase_anon_key: Some("env-key".to_string()),
            notes_table: Some("old_notes".to_string()),
        }
    );
}

#[test]
fn export_destination_keeps_suggested_name_for_directories() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(
        export_destination(dir.path(), "groceries.txt"),
        dir.path().join("groceries.txt")
    );
    let file = dir.path().join("custom.txt");
    assert_eq!(export_destination(&file, "groceries.txt"), file);
}

#[test]
fn bash_completions_name_the_binary() {
    let script = String::from_utf8(render_completions(CompletionShell::Bash)).unwrap();
    assert!(script.contains("_inkpad()"));
    assert!(script.contains("complete -F _inkpad"));
}

#[tokio::test(flavor = "current_thread")]
async fn first_run_seeds_welcome_note_in_local_mode() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = open_workspace(&test_context(&dir)).await.unwrap();

    let notes = workspace.store.list().await;
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, inkpad_core::models::WELCOME_TITLE);
    assert!(!workspace.store.is_authenticated().await);
}

#[tokio::test(flavor = "current_thread")]
async fn added_notes_persist_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let context = test_context(&dir);

    run_add(Some("Groceries"), &["milk".to_string()], &context)
        .await
        .unwrap();
    run_add(None, &["call".to_string(), "mom".to_string()], &context)
        .await
        .unwrap();

    let workspace = open_workspace(&context).await.unwrap();
    let notes = workspace.store.list().await;
    assert_eq!(notes[0].title, "call mom");
    assert_eq!(notes[0].content, "<p>call mom</p>");
    assert_eq!(notes[1].title, "Groceries");
    assert_eq!(workspace.store.active_id().await, Some(notes[0].id.clone()));
}

#[tokio::test(flavor = "current_thread")]
async fn resolve_note_supports_exact_and_prefix_id() {
    let dir = tempfile::tempdir().unwrap();
    let context = test_context(&dir);
    seed_notes(
        &dir.path().join("data"),
        &[
            note_with_id("11111111-aaaa", "Note A"),
            note_with_id("11111111-bbbb", "Note B"),
        ],
    );
    let workspace = open_workspace(&context).await.unwrap();

    let by_exact = resolve_note(&workspace.store, "11111111-aaaa").await.unwrap();
    assert_eq!(by_exact.title, "Note A");

    let by_prefix = resolve_note(&workspace.store, " 11111111-b ").await.unwrap();
    assert_eq!(by_prefix.title, "Note B");

    let ambiguous = resolve_note(&workspace.store, "1111").await.unwrap_err();
    assert!(matches!(ambiguous, CliError::AmbiguousNoteId(_)));

    let missing = resolve_note(&workspace.store, "does-not-exist").await.unwrap_err();
    assert!(matches!(missing, CliError::NoteNotFound(_)));
}

#[tokio::test(flavor = "current_thread")]
async fn open_changes_the_active_note() {
    let dir = tempfile::tempdir().unwrap();
    let context = test_context(&dir);
    seed_notes(
        &dir.path().join("data"),
        &[note_with_id("n-1", "First"), note_with_id("n-2", "Second")],
    );

    run_open("n-2", &context).await.unwrap();

    let workspace = open_workspace(&context).await.unwrap();
    let active = resolve_target_note(&workspace.store, None).await.unwrap();
    assert_eq!(active.title, "Second");
}

#[tokio::test(flavor = "current_thread")]
async fn delete_requires_sign_in() {
    let dir = tempfile::tempdir().unwrap();
    let context = test_context(&dir);
    seed_notes(&dir.path().join("data"), &[note_with_id("n-1", "Keep")]);

    let error = run_delete("n-1", &context).await.unwrap_err();

    assert!(matches!(
        error,
        CliError::Core(inkpad_core::Error::Unauthorized(_))
    ));
    let workspace = open_workspace(&context).await.unwrap();
    assert_eq!(workspace.store.list().await.len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn import_accepts_text_and_rejects_other_files() {
    let dir = tempfile::tempdir().unwrap();
    let context = test_context(&dir);

    let text_file = dir.path().join("meeting notes.md");
    std::fs::write(&text_file, "agenda\n\n- budget\n").unwrap();
    run_import(&text_file, None, &context).await.unwrap();

    let pdf_file = dir.path().join("scan.pdf");
    std::fs::write(&pdf_file, "%PDF-1.7").unwrap();
    let error = run_import(&pdf_file, None, &context).await.unwrap_err();
    assert!(matches!(
        error,
        CliError::Core(inkpad_core::Error::UnsupportedImport(_))
    ));

    let workspace = open_workspace(&context).await.unwrap();
    let notes = workspace.store.list().await;
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "meeting notes");
    assert_eq!(notes[0].content, "<p>agenda</p><p>- budget</p>");
}

#[tokio::test(flavor = "current_thread")]
async fn export_writes_plain_text_file() {
    let dir = tempfile::tempdir().unwrap();
    let context = test_context(&dir);
    seed_notes(&dir.path().join("data"), &[note_with_id("n-1", "Trip Plan")]);
    let out_dir = dir.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();

    run_export(None, Some(&out_dir), &context).await.unwrap();

    let exported = std::fs::read_to_string(out_dir.join("trip_plan.txt")).unwrap();
    assert_eq!(exported, "Trip Plan");
}

#[tokio::test(flavor = "current_thread")]
async fn export_of_unknown_note_fails() {
    let dir = tempfile::tempdir().unwrap();
    let context = test_context(&dir);
    let error = run_export(Some("missing"), None, &context)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::NoteNotFound(_)));
}
