use crate::commands::common::{open_workspace, resolve_target_note, CliContext};
use crate::error::CliError;

pub async fn run_stats(id: Option<&str>, as_json: bool, context: &CliContext) -> Result<(), CliError> {
    let workspace = open_workspace(context).await?;
    let note = resolve_target_note(&workspace.store, id).await?;
    let stats = workspace.store.get_stats(&note.content);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!(
            "{} words  {} characters  {} sentences",
            stats.words, stats.characters, stats.sentences
        );
    }
    Ok(())
}
