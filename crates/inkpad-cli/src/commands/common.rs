use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use inkpad_core::auth::AuthUser;
use inkpad_core::config::StoreOptions;
use inkpad_core::local::{FileStorage, LocalStore};
use inkpad_core::remote::{NotesGateway, SupabaseNotesGateway};
use inkpad_core::text::text_lines;
use inkpad_core::util::truncate_with_ellipsis;
use inkpad_core::{MigrationReport, Note, NoteId, NoteStore, StoreMode};
use serde::Serialize;

use crate::auth::{session_manager, CliSessionManager};
use crate::config_profiles::{BackendSource, CliProfilesConfig};
use crate::error::CliError;

pub const DATA_DIR_ENV: &str = "INKPAD_DATA_DIR";

/// Global flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CliContext {
    pub data_dir: Option<PathBuf>,
    pub profile: Option<String>,
    /// Profile config file; the default location when `None`
    pub config_path: Option<PathBuf>,
}

impl CliContext {
    pub fn load_config(&self) -> Result<CliProfilesConfig, CliError> {
        match &self.config_path {
            Some(path) => CliProfilesConfig::load_from_path(path),
            None => CliProfilesConfig::load(),
        }
        .map_err(CliError::Config)
    }
}

/// A bootstrapped note store plus the session it follows.
pub struct Workspace {
    pub store: NoteStore,
    pub session: CliSessionManager,
    pub profile_name: String,
    pub backend_source: BackendSource,
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub relative_time: String,
    pub active: bool,
}

/// Resolve config, restore the session and load notes for this profile.
///
/// A restored session switches the store to remote mode, which migrates
/// local notes the first time an account is used.
pub async fn open_workspace(context: &CliContext) -> Result<Workspace, CliError> {
    let config = context.load_config()?;
    let profile_name = config.resolve_profile_name(context.profile.as_deref());
    let (backend, backend_source) = config
        .backend_for(&profile_name)
        .map_err(CliError::Config)?;

    let session = session_manager(&profile_name, backend.as_ref())?;
    let user = session.initialize().await;

    let gateway = match backend.as_ref() {
        Some(config) => Some(Arc::new(
            SupabaseNotesGateway::new(config, session.subscribe())
                .map_err(inkpad_core::Error::from)?,
        ) as Arc<dyn NotesGateway>),
        None => None,
    };

    let data_dir = resolve_data_dir(context.data_dir.clone());
    let local = LocalStore::new(FileStorage::open(&data_dir)?);
    let store = NoteStore::new(local, gateway, StoreOptions::default());
    store.bootstrap().await;
    apply_session_or_stay_local(&store, user).await;

    tracing::debug!(
        "Workspace for profile '{}' opened in {} mode",
        profile_name,
        store.mode().await.label()
    );
    Ok(Workspace {
        store,
        session,
        profile_name,
        backend_source,
    })
}

/// Switch the store to `user`'s notes, reporting a migration if one ran.
///
/// When the account cannot be reached the notes stay on this device and the
/// next command tries again.
pub async fn apply_session_or_stay_local(store: &NoteStore, user: Option<AuthUser>) {
    match store.apply_session(user).await {
        Ok(Some(report)) => print_migration_report(&report),
        Ok(None) => {}
        Err(error) => eprintln!(
            "Could not reach your account ({error}); notes stay on this device for now."
        ),
    }
}

pub fn print_migration_report(report: &MigrationReport) {
    if report.skipped {
        return;
    }
    if report.failed == 0 {
        println!("Moved {} local notes into your account", report.migrated);
    } else {
        println!(
            "Moved {} local notes into your account ({} failed and stay on this device)",
            report.migrated, report.failed
        );
    }
}

/// Find a note by exact id or by a unique id prefix.
pub async fn resolve_note(store: &NoteStore, note_query: &str) -> Result<Note, CliError> {
    let note_query = normalize_note_identifier(note_query)?;
    if let Some(note) = store.get(&NoteId::from(note_query.as_str())).await {
        return Ok(note);
    }

    let matching = store
        .list()
        .await
        .into_iter()
        .filter(|note| note.id.as_str().starts_with(&note_query))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::NoteNotFound(note_query)),
        [note] => Ok(note.clone()),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|note| short_id(&note.id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// The note named by `note_query`, or the active note when none is given.
pub async fn resolve_target_note(
    store: &NoteStore,
    note_query: Option<&str>,
) -> Result<Note, CliError> {
    match note_query {
        Some(query) => resolve_note(store, query).await,
        None => store.active_note().await.ok_or(CliError::NoActiveNote),
    }
}

pub fn short_id(id: &NoteId) -> String {
    id.as_str().chars().take(13).collect()
}

pub fn format_note_lines(notes: &[Note], active_id: Option<&NoteId>) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let marker = if Some(&note.id) == active_id { '*' } else { ' ' };
            let short_id = short_id(&note.id);
            let title = truncate_with_ellipsis(&note.title, 37);
            let relative_time = format_relative_time(note.updated_at.timestamp_millis(), now_ms);
            format!("{marker} {short_id:<13}  {title:<40}  {relative_time}")
        })
        .collect()
}

pub fn note_to_list_item(note: &Note, active_id: Option<&NoteId>) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        preview: note_preview(note, 80),
        created_at: note.created_at,
        updated_at: note.updated_at,
        relative_time: format_relative_time(note.updated_at.timestamp_millis(), now_ms),
        active: Some(&note.id) == active_id,
    }
}

/// First line of visible text, whitespace collapsed, capped at `max_chars`.
pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = text_lines(&note.content).into_iter().next().unwrap_or_default();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        truncate_with_ellipsis(&collapsed, max_chars.saturating_sub(3))
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub const fn mode_label(mode: StoreMode) -> &'static str {
    match mode {
        StoreMode::Local => "local (notes stay on this device)",
        StoreMode::Remote => "remote (notes saved to your account)",
    }
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input()? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_with_initial("")
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        // EDITOR may carry arguments, e.g. "code --wait".
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let status = Command::new(program).args(parts).arg(file_path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("inkpad-note-{}-{now}.txt", std::process::id()))
}

pub fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> PathBuf {
    cli_data_dir
        .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(default_data_dir)
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(env::temp_dir)
        .join("inkpad")
}
