use inkpad_core::export::export_note_text;

use crate::commands::common::{open_workspace, resolve_target_note, CliContext};
use crate::error::CliError;

pub async fn run_show(id: Option<&str>, context: &CliContext) -> Result<(), CliError> {
    let workspace = open_workspace(context).await?;
    let note = resolve_target_note(&workspace.store, id).await?;

    println!("# {}", note.title);
    println!();
    println!("{}", export_note_text(&note).text);
    Ok(())
}
