use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fushigi_core::models::{GrammarPoint, JournalEntry, Sentence};
use fushigi_core::sync::StoreSnapshot;
use fushigi_core::{AppStores, ClientConfig, SyncOutcome};
use serde::Serialize;
use uuid::Uuid;

use crate::error::CliError;

pub const ENV_DB_PATH: &str = "FUSHIGI_DB_PATH";

/// Everything a command needs to open the stores.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub db_path: PathBuf,
    pub config: ClientConfig,
    pub sync_first: bool,
}

#[derive(Debug, Serialize)]
pub struct JournalListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub content: String,
    pub private: bool,
    pub created_at: DateTime<Utc>,
    pub relative_time: String,
}

/// Open the stores, load the local cache and optionally sync.
///
/// Collections that end up in an error state are reported on stderr; the
/// command still runs against whatever is cached.
pub async fn open_stores(ctx: &CliContext) -> Result<AppStores, CliError> {
    let stores = AppStores::open(&ctx.db_path, &ctx.config).await?;
    stores.load_all().await;
    if ctx.sync_first {
        stores.sync_all().await;
    }

    for snapshot in stores.snapshots() {
        if let Some(warning) = snapshot_warning(&snapshot) {
            eprintln!("{warning}");
        }
    }
    Ok(stores)
}

pub fn load_config(
    config_path: Option<&Path>,
    api_url: Option<String>,
) -> Result<ClientConfig, CliError> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    let mut config = ClientConfig::load_from_path(&path)?.with_env(|key| env::var(key).ok())?;
    if let Some(url) = api_url {
        config.api_base_url = url;
    }
    Ok(config.normalized()?)
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_db_path.or_else(|| env::var_os(ENV_DB_PATH).map(PathBuf::from)) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("fushigi").join("fushigi.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("fushigi").join("config.json"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI config directory".to_string()))
}

/// Resolve a grammar point from a full ID or a unique ID prefix.
pub fn resolve_grammar_point(query: &str, points: &[GrammarPoint]) -> Result<GrammarPoint, CliError> {
    let query = normalize_identifier(query)?;

    if let Ok(id) = query.parse::<Uuid>() {
        if let Some(point) = points.iter().find(|point| point.id == id) {
            return Ok(point.clone());
        }
    }

    let prefix = query.to_ascii_lowercase();
    let matching = points
        .iter()
        .filter(|point| point.id.to_string().starts_with(&prefix))
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::GrammarNotFound(query)),
        [point] => Ok((*point).clone()),
        _ => {
            let options = matching
                .iter()
                .take(3)
                .map(|point| short_id(point.id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(13).collect()
}

pub fn format_grammar_lines(points: &[GrammarPoint]) -> Vec<String> {
    points
        .iter()
        .map(|point| {
            let usage = text_preview(&point.usage, 24);
            let meaning = text_preview(&point.meaning, 40);
            let line = format!(
                "{:<13}  {usage:<24}  {meaning:<40}  {}",
                short_id(point.id),
                point.context
            );
            if point.tags.is_empty() {
                line
            } else {
                format!("{line}  {}", render_tags(&point.tags))
            }
        })
        .collect()
}

pub fn format_grammar_detail(point: &GrammarPoint) -> Vec<String> {
    let mut lines = vec![
        format!("ID:      {}", point.id),
        format!("Usage:   {}", point.usage),
        format!("Meaning: {}", point.meaning),
        format!("Context: {}", point.context),
    ];
    if !point.tags.is_empty() {
        lines.push(format!("Tags:    {}", render_tags(&point.tags)));
    }
    lines
}

pub fn format_journal_lines(entries: &[JournalEntry]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    entries
        .iter()
        .map(|entry| {
            let title = text_preview(&entry.title, 24);
            let preview = text_preview(&entry.content, 40);
            let relative_time = format_relative_time(entry.created_at.timestamp_millis(), now_ms);
            let marker = if entry.is_private { "private" } else { "" };
            format!(
                "{:<13}  {title:<24}  {preview:<40}  {relative_time:<10}  {marker}",
                short_id(entry.id)
            )
            .trim_end()
            .to_string()
        })
        .collect()
}

pub fn journal_to_list_item(entry: &JournalEntry) -> JournalListItem {
    let now_ms = Utc::now().timestamp_millis();
    JournalListItem {
        id: entry.id.to_string(),
        title: entry.title.clone(),
        preview: text_preview(&entry.content, 80),
        content: entry.content.clone(),
        private: entry.is_private,
        created_at: entry.created_at,
        relative_time: format_relative_time(entry.created_at.timestamp_millis(), now_ms),
    }
}

pub fn format_sentence_lines(sentences: &[Sentence]) -> Vec<String> {
    sentences
        .iter()
        .map(|sentence| {
            format!(
                "{:<13}  journal={}  grammar={}  {}",
                short_id(sentence.id),
                short_id(sentence.journal_entry_id),
                short_id(sentence.grammar_id),
                text_preview(&sentence.content, 60)
            )
        })
        .collect()
}

pub fn format_snapshot_line(snapshot: &StoreSnapshot) -> String {
    let last_sync = snapshot
        .last_sync
        .map_or_else(|| "never".to_string(), format_sync_timestamp);
    format!(
        "{:<16}  {:>5} cached  last sync: {last_sync}  {}",
        snapshot.kind,
        snapshot.len,
        snapshot.state.description()
    )
}

/// A stderr notice for collections in an error state.
pub fn snapshot_warning(snapshot: &StoreSnapshot) -> Option<String> {
    if !snapshot.state.is_error() {
        return None;
    }
    let action = fushigi_core::HealthState::new(snapshot.availability, snapshot.health)
        .recovery_action()
        .map(|action| format!(" ({})", action.label()))
        .unwrap_or_default();
    Some(format!(
        "warning: {}: {}{action}",
        snapshot.kind,
        snapshot.state.description()
    ))
}

pub fn describe_outcome(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Synced {
            fetched,
            inserted,
            updated,
        } => format!("synced {fetched} ({inserted} new, {updated} updated)"),
        SyncOutcome::Skipped => "skipped".to_string(),
        SyncOutcome::RemoteFailed(reason) => format!("backend unavailable: {reason}"),
        SyncOutcome::SaveFailed(reason) => format!("fetched but not saved: {reason}"),
    }
}

pub fn render_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

/// First line of `text`, whitespace collapsed and cut to `max_chars`.
pub fn text_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_sync_timestamp(date_time: DateTime<Utc>) -> String {
    date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn resolve_entry_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }
    Ok(read_piped_stdin()?.unwrap_or_default())
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}
