use inkpad_core::NotePatch;

use crate::commands::common::{normalize_content, open_workspace, resolve_note, CliContext};
use crate::error::CliError;

pub async fn run_rename(id: &str, title: &str, context: &CliContext) -> Result<(), CliError> {
    let title = normalize_content(title).ok_or(CliError::EmptyContent)?;
    let workspace = open_workspace(context).await?;
    let note = resolve_note(&workspace.store, id).await?;

    let renamed = workspace
        .store
        .update(&note.id, &NotePatch::title(title))
        .await
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;
    println!("{}  {}", renamed.id, renamed.title);
    Ok(())
}
