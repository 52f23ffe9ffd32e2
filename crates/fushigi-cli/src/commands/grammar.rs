use fushigi_core::models::{Context, GrammarPoint, SourceMode};

use crate::cli::GrammarCommands;
use crate::commands::common::{
    format_grammar_detail, format_grammar_lines, open_stores, resolve_grammar_point, CliContext,
};
use crate::error::CliError;

pub async fn run_grammar(command: GrammarCommands, ctx: &CliContext) -> Result<(), CliError> {
    match command {
        GrammarCommands::List {
            search,
            context,
            limit,
            json,
        } => {
            let stores = open_stores(ctx).await?;
            let mut points = stores.grammar.filter(search.as_deref());
            points.retain(|point| matches_context(point, context));
            points.truncate(limit);
            print_points(&points, json)
        }
        GrammarCommands::Show { id, json } => {
            let stores = open_stores(ctx).await?;
            let point = stores
                .grammar
                .with_items(|points| resolve_grammar_point(&id, points))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&point)?);
            } else {
                for line in format_grammar_detail(&point) {
                    println!("{line}");
                }
                let examples = stores.sentences.for_grammar(point.id);
                if !examples.is_empty() {
                    println!();
                    println!("Used in {} journal sentence(s):", examples.len());
                    for sentence in examples {
                        println!("  {}", sentence.content);
                    }
                }
            }
            Ok(())
        }
        GrammarCommands::Daily {
            mode,
            refresh,
            json,
        } => {
            let stores = open_stores(ctx).await?;
            let mode = SourceMode::from(mode);
            if refresh {
                stores.grammar.force_daily_refresh(mode).await;
            }
            let points = stores.grammar.subset_for(mode).await;
            if !json {
                println!("{} practice set ({} points)", mode.display_name(), points.len());
            }
            print_points(&points, json)
        }
    }
}

/// `Context::All` and no context both match everything.
fn matches_context(point: &GrammarPoint, context: Option<Context>) -> bool {
    match context {
        None | Some(Context::All) => true,
        Some(context) => point.context.eq_ignore_ascii_case(context.as_str()),
    }
}

fn print_points(points: &[GrammarPoint], as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(points)?);
    } else if points.is_empty() {
        println!("No grammar points. Run `fushigi sync` to fetch them.");
    } else {
        for line in format_grammar_lines(points) {
            println!("{line}");
        }
    }
    Ok(())
}
