use crate::commands::common::{open_workspace, resolve_note, CliContext};
use crate::error::CliError;

pub async fn run_open(id: &str, context: &CliContext) -> Result<(), CliError> {
    let workspace = open_workspace(context).await?;
    let note = resolve_note(&workspace.store, id).await?;

    workspace.store.set_active(&note.id).await;
    println!("{}  {}", note.id, note.title);
    Ok(())
}
