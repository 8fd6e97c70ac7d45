use crate::commands::common::{open_workspace, resolve_note, CliContext};
use crate::error::CliError;

pub async fn run_delete(id: &str, context: &CliContext) -> Result<(), CliError> {
    let workspace = open_workspace(context).await?;
    let note = resolve_note(&workspace.store, id).await?;

    workspace.store.delete(&note.id).await?;
    println!("{}", note.id);
    Ok(())
}
