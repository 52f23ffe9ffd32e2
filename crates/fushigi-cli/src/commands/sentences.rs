use fushigi_core::models::Sentence;

use crate::cli::SentenceCommands;
use crate::commands::common::{format_sentence_lines, open_stores, CliContext};
use crate::error::CliError;

pub async fn run_sentences(command: SentenceCommands, ctx: &CliContext) -> Result<(), CliError> {
    match command {
        SentenceCommands::List {
            journal,
            grammar,
            limit,
            json,
        } => {
            let stores = open_stores(ctx).await?;
            let mut sentences = match (journal, grammar) {
                (Some(journal_id), _) => stores.sentences.for_journal(journal_id),
                (None, Some(grammar_id)) => stores.sentences.for_grammar(grammar_id),
                (None, None) => stores.sentences.get_all(),
            };
            if let (Some(_), Some(grammar_id)) = (journal, grammar) {
                sentences.retain(|sentence| sentence.grammar_id == grammar_id);
            }
            sentences.truncate(limit);
            print_sentences(&sentences, json)
        }
    }
}

fn print_sentences(sentences: &[Sentence], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(sentences)?);
    } else if sentences.is_empty() {
        println!("No tagged sentences.");
    } else {
        for line in format_sentence_lines(sentences) {
            println!("{line}");
        }
    }
    Ok(())
}
