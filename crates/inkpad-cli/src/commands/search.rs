use crate::commands::common::{
    format_note_lines, normalize_search_query, note_to_list_item, open_workspace, CliContext,
    NoteListItem,
};
use crate::error::CliError;

pub async fn run_search(
    query: &str,
    limit: usize,
    as_json: bool,
    context: &CliContext,
) -> Result<(), CliError> {
    let normalized_query = normalize_search_query(query)?;
    let workspace = open_workspace(context).await?;
    let mut notes = workspace.store.search(&normalized_query).await;
    notes.truncate(limit);
    let active_id = workspace.store.active_id().await;

    if as_json {
        let json_items = notes
            .iter()
            .map(|note| note_to_list_item(note, active_id.as_ref()))
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes, active_id.as_ref()) {
            println!("{line}");
        }
    }

    Ok(())
}
