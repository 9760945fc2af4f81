//! Iteration goal text: external generator with a deterministic fallback.
//!
//! The external collaborator is anything implementing
//! [`GoalTextGenerator`]. Its answer is checked once ([`check_goal_text`]);
//! a failure, an unusable answer or a timeout leaves the fallback text from
//! [`fallback_goal_text`] in place. The fallback depends only on the
//! request, so identical iterations always get identical goals.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cadence_core::model::PriorityTier;

/// Upper bound on accepted goal text, in characters.
pub const MAX_GOAL_CHARS: usize = 280;

const MAX_PHRASE_WORDS: usize = 8;
const TOP_PHRASES: usize = 3;

/// Matches the "I want ..." clause of a user story, up to the first clause
/// break.
static WANT_CLAUSE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\bI\s+want\s+(?:to\s+)?([^,.;:!?\n]+)").ok());

/// One planned item as seen by a goal generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub points: u32,
    pub tier: PriorityTier,
}

/// Everything a generator is told about one iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRequest {
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub items: Vec<GoalItem>,
}

/// Where an iteration's goal text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalSource {
    Generated,
    Fallback,
}

/// External goal-text collaborator. May fail or hang; callers bound it
/// with a timeout.
#[async_trait]
pub trait GoalTextGenerator: Send + Sync {
    async fn generate(&self, request: &GoalRequest) -> anyhow::Result<String>;
}

/// Wire shape of a generator response: `{"goal": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoalPayload {
    pub goal: String,
}

#[derive(Debug, Error)]
pub enum GoalParseError {
    #[error("goal response is not valid JSON of the form {{\"goal\": \"...\"}}: {0}")]
    Json(#[from] serde_json::Error),
    #[error("goal text is empty")]
    Empty,
    #[error("goal text is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Why a generated goal was not used.
#[derive(Debug, Error)]
pub enum GoalFailure {
    #[error("goal generator timed out after {0:?}")]
    Timeout(Duration),
    #[error("goal generator failed: {0}")]
    Generator(String),
    #[error(transparent)]
    Invalid(#[from] GoalParseError),
}

/// Trim `text` and check it is usable as a goal.
///
/// # Errors
///
/// [`GoalParseError::Empty`] for blank text, [`GoalParseError::TooLong`]
/// above [`MAX_GOAL_CHARS`].
pub fn check_goal_text(text: &str) -> Result<String, GoalParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GoalParseError::Empty);
    }
    let len = trimmed.chars().count();
    if len > MAX_GOAL_CHARS {
        return Err(GoalParseError::TooLong {
            len,
            max: MAX_GOAL_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// Parse a raw generator response with a single strict attempt.
///
/// # Errors
///
/// Returns [`GoalParseError`] when `raw` is not exactly `{"goal": "..."}`
/// or the goal text fails [`check_goal_text`].
pub fn parse_goal_payload(raw: &str) -> Result<GoalPayload, GoalParseError> {
    let payload: GoalPayload = serde_json::from_str(raw.trim())?;
    let goal = check_goal_text(&payload.goal)?;
    Ok(GoalPayload { goal })
}

/// Ask `generator` for a goal, bounded by `limit`.
///
/// # Errors
///
/// Returns [`GoalFailure`] on timeout, generator error or unusable text.
pub async fn generate_goal(
    generator: &dyn GoalTextGenerator,
    request: &GoalRequest,
    limit: Duration,
) -> Result<String, GoalFailure> {
    match tokio::time::timeout(limit, generator.generate(request)).await {
        Err(_) => Err(GoalFailure::Timeout(limit)),
        Ok(Err(err)) => Err(GoalFailure::Generator(format!("{err:#}"))),
        Ok(Ok(text)) => Ok(check_goal_text(&text)?),
    }
}

/// Deterministic local summary of an iteration.
///
/// Takes the "I want ..." clause of each item's description (or the title
/// when there is none), normalizes it, and joins the three most frequent
/// phrases, ties broken by first occurrence.
#[must_use]
pub fn fallback_goal_text(request: &GoalRequest) -> String {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (order, item) in request.items.iter().enumerate() {
        let phrase = item
            .description
            .as_deref()
            .and_then(want_clause)
            .map(|want| normalize_phrase(&want))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| normalize_phrase(&item.title));
        if phrase.is_empty() {
            continue;
        }
        counts.entry(phrase).or_insert((0, order)).0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(phrase, (count, first))| (phrase, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));

    let top: Vec<String> = ranked
        .into_iter()
        .take(TOP_PHRASES)
        .map(|(phrase, _, _)| phrase)
        .collect();

    match top.as_slice() {
        [] => format!("Iteration {}: no items planned", request.sequence),
        [only] => format!("Iteration {}: deliver {only}", request.sequence),
        [init @ .., last] => format!(
            "Iteration {}: deliver {} and {last}",
            request.sequence,
            init.join(", ")
        ),
    }
}

/// The "I want ..." clause of a user story, if present.
fn want_clause(description: &str) -> Option<String> {
    let re = WANT_CLAUSE.as_ref()?;
    let clause = re.captures(description)?.get(1)?.as_str();
    // Stories without a comma before "so that" keep the benefit in the clause.
    let lowered = clause.to_lowercase();
    let end = lowered.find(" so that").unwrap_or(lowered.len());
    Some(lowered[..end].to_string())
}

/// Lowercase, collapse whitespace, drop a leading "to" and trailing
/// punctuation, keep at most eight words.
fn normalize_phrase(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut words: Vec<&str> = lowered.split_whitespace().collect();
    if words.first() == Some(&"to") {
        words.remove(0);
    }
    words.truncate(MAX_PHRASE_WORDS);
    words
        .join(" ")
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_string()
}
