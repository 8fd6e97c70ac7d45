use std::path::Path;

use crate::commands::common::{open_workspace, CliContext};
use crate::error::CliError;

pub async fn run_import(
    path: &Path,
    mime_type: Option<&str>,
    context: &CliContext,
) -> Result<(), CliError> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content = std::fs::read_to_string(path)?;

    let workspace = open_workspace(context).await?;
    let note = workspace
        .store
        .import_file(&content, &filename, mime_type)
        .await?;

    println!("{}  {}", note.id, note.title);
    Ok(())
}
