use std::path::{Path, PathBuf};

use crate::commands::common::{open_workspace, resolve_target_note, CliContext};
use crate::error::CliError;

pub async fn run_export(
    id: Option<&str>,
    output_path: Option<&Path>,
    context: &CliContext,
) -> Result<(), CliError> {
    let workspace = open_workspace(context).await?;
    let note = resolve_target_note(&workspace.store, id).await?;
    let export = workspace
        .store
        .export_text(&note.id)
        .await
        .ok_or_else(|| CliError::NoteNotFound(note.id.to_string()))?;

    if let Some(path) = output_path {
        let path = export_destination(path, &export.filename);
        std::fs::write(&path, export.text)?;
        println!("{}", path.display());
    } else {
        println!("{}", export.text);
    }

    Ok(())
}

/// Directories receive the suggested file name; anything else is used as is.
pub fn export_destination(path: &Path, suggested_name: &str) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_name)
    } else {
        path.to_path_buf()
    }
}
