use crate::cli::JournalCommands;
use crate::commands::common::{
    format_journal_lines, journal_to_list_item, open_stores, resolve_entry_content, CliContext,
    JournalListItem,
};
use crate::error::CliError;

pub async fn run_journal(command: JournalCommands, ctx: &CliContext) -> Result<(), CliError> {
    match command {
        JournalCommands::List {
            search,
            limit,
            json,
        } => run_journal_list(search.as_deref(), limit, json, ctx).await,
        JournalCommands::Submit {
            title,
            content,
            private,
        } => run_journal_submit(&title, &content, private, ctx).await,
    }
}

async fn run_journal_list(
    search: Option<&str>,
    limit: usize,
    as_json: bool,
    ctx: &CliContext,
) -> Result<(), CliError> {
    let stores = open_stores(ctx).await?;
    let mut entries = stores.journal.filter(search);
    // Newest first for reading; the store keeps insertion order
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries.truncate(limit);

    if as_json {
        let items = entries
            .iter()
            .map(journal_to_list_item)
            .collect::<Vec<JournalListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if entries.is_empty() {
        println!("No journal entries.");
    } else {
        for line in format_journal_lines(&entries) {
            println!("{line}");
        }
    }
    Ok(())
}

async fn run_journal_submit(
    title: &str,
    content_parts: &[String],
    private: bool,
    ctx: &CliContext,
) -> Result<(), CliError> {
    let content = resolve_entry_content(content_parts)?;
    let stores = open_stores(&CliContext {
        sync_first: false,
        ..ctx.clone()
    })
    .await?;
    let message = stores.submit_journal(title, &content, private).await?;
    println!("{message}");
    Ok(())
}
