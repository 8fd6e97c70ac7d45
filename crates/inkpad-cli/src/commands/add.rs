use inkpad_core::export::plain_text_to_html;
use inkpad_core::text::derive_title;

use crate::commands::common::{open_workspace, resolve_note_content, CliContext};
use crate::error::CliError;

pub async fn run_add(
    title: Option<&str>,
    content_parts: &[String],
    context: &CliContext,
) -> Result<(), CliError> {
    let content = resolve_note_content(content_parts)?;
    let html = plain_text_to_html(&content);
    let title = title.map_or_else(|| derive_title(&html), ToString::to_string);

    let workspace = open_workspace(context).await?;
    let note = workspace.store.create(Some(&title), Some(&html)).await;

    println!("{}", note.id);
    Ok(())
}
