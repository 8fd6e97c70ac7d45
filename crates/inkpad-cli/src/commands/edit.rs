use inkpad_core::export::{export_note_text, plain_text_to_html};

use crate::commands::common::{
    capture_editor_input_with_initial, open_workspace, resolve_target_note, CliContext,
};
use crate::error::CliError;

/// Edit the note as plain text; the first line becomes the title.
///
/// Signed in, the change goes through the debounced auto-save and is flushed
/// before exit. Anonymous edits are written straight to the local mirror.
pub async fn run_edit(id: Option<&str>, context: &CliContext) -> Result<(), CliError> {
    let workspace = open_workspace(context).await?;
    let store = &workspace.store;
    let note = resolve_target_note(store, id).await?;
    let original = export_note_text(&note).text;

    let Some(edited) = capture_editor_input_with_initial(&original)? else {
        return Err(CliError::EmptyEditedContent);
    };

    if edited == original.trim() {
        println!("{}", note.id);
        return Ok(());
    }

    let html = plain_text_to_html(&edited);
    let saved = if store.auto_save(&note.id, html.clone()).await {
        store.flush_auto_save().await
    } else {
        store.update_title_from_content(&note.id, &html).await
    };

    let saved = saved.ok_or_else(|| CliError::NoteNotFound(note.id.to_string()))?;
    store.set_active(&saved.id).await;
    println!("{}  {}", saved.id, saved.title);
    Ok(())
}
