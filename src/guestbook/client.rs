//! Browser side of the guestbook: local cooldown, form submit, entry list.
use super::{validate, Entry, Submission, ValidationError, MESSAGE_MAX, READ_LIMIT};
use crate::browser;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use thiserror::Error;

pub const SUBMIT_URL: &str = "/api/guestbook";
pub const ENTRIES_URL: &str = "/data/guestbook.json";
pub const COOLDOWN_KEY: &str = "guestbook_last_submit";
pub const COOLDOWN_MS: f64 = 60_000.0;
pub const SUCCESS_TEXT: &str = "Signed! Your entry will appear shortly.";
pub const EMPTY_TEXT: &str = "No entries yet. Be the first to sign!";
const SUBMIT_FALLBACK: &str = "Failed to submit entry. Please try again.";

/// Key/value persistence for the last submit time
pub trait CooldownStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// `window.localStorage`, silently absent when storage is blocked
pub struct LocalStorage;

impl CooldownStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        browser::local_storage().ok()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) {
        let stored = browser::local_storage().and_then(|storage| {
            storage
                .set_item(key, value)
                .map_err(|err| anyhow!("Could not write {} : {:#?}", key, err))
        });
        if let Err(err) = stored {
            log_warn!("Guestbook cooldown not saved : {:#}", err);
        }
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl CooldownStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
    }
}

/// One post per minute per browser, times in epoch milliseconds
pub struct Cooldown<S: CooldownStore> {
    store: S,
}

impl<S: CooldownStore> Cooldown<S> {
    pub fn new(store: S) -> Self {
        Cooldown { store }
    }

    fn last_submit(&self) -> Option<f64> {
        self.store.get(COOLDOWN_KEY)?.parse().ok()
    }

    pub fn remaining_seconds(&self, now_ms: f64) -> u32 {
        match self.last_submit() {
            Some(last) if now_ms - last < COOLDOWN_MS => {
                ((COOLDOWN_MS - (now_ms - last)) / 1000.0).ceil() as u32
            }
            _ => 0,
        }
    }

    pub fn can_submit(&self, now_ms: f64) -> bool {
        self.remaining_seconds(now_ms) == 0
    }

    pub fn record(&self, now_ms: f64) {
        self.store.set(COOLDOWN_KEY, &format!("{}", now_ms as i64));
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("Please wait {0} seconds before posting again")]
    CoolingDown(u32),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// the service refused the entry itself, message shown as is
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    RateLimited(String),
    /// 5xx or a reply that makes no sense
    #[error("{0}")]
    Server(String),
    #[error("Failed to submit entry. Please try again.")]
    Network,
}

/// Local checks before anything goes over the wire
/// - `Ok(None)` means the honeypot is filled: pretend it worked and send nothing
pub fn prepare<S: CooldownStore>(
    form: &Submission,
    cooldown: &Cooldown<S>,
    now_ms: f64,
) -> Result<Option<Submission>, SubmitError> {
    if form.is_honeypot_filled() {
        return Ok(None);
    }
    let remaining = cooldown.remaining_seconds(now_ms);
    if remaining > 0 {
        return Err(SubmitError::CoolingDown(remaining));
    }
    let valid = validate(form)?;
    Ok(Some(Submission {
        name: valid.name,
        location: valid.location,
        message: valid.message,
        website: None,
    }))
}

/// Turns the service reply into an outcome
pub fn interpret_reply(status: u16, body: &Value) -> Result<(), SubmitError> {
    let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
    if (200..300).contains(&status) && success {
        return Ok(());
    }
    let message = body.get("error").and_then(Value::as_str);
    let text = message.unwrap_or(SUBMIT_FALLBACK).to_string();
    Err(match status {
        429 => SubmitError::RateLimited(text),
        400..=499 if message.is_some() => SubmitError::Rejected(text),
        _ => SubmitError::Server(text),
    })
}

/// Full submit flow, the cooldown is only recorded on success
pub async fn submit<S: CooldownStore>(form: Submission, cooldown: &Cooldown<S>) -> Result<(), SubmitError> {
    let now_ms = Utc::now().timestamp_millis() as f64;
    let Some(payload) = prepare(&form, cooldown, now_ms)? else {
        log!("Guestbook honeypot filled, nothing sent");
        return Ok(());
    };
    let (status, reply) = browser::post_json::<_, Value>(SUBMIT_URL, &payload)
        .await
        .map_err(|err| {
            log_error!("Guestbook submit failed : {:#}", err);
            SubmitError::Network
        })?;
    interpret_reply(status, &reply)?;
    cooldown.record(now_ms);
    Ok(())
}

/// Visible entries as published, newest first, cache busted
pub async fn fetch_entries() -> Result<Vec<Entry>> {
    let url = format!("{}?t={}", ENTRIES_URL, Utc::now().timestamp_millis());
    let entries = browser::fetch_json::<Vec<Entry>>(&url).await?;
    Ok(visible_latest(entries))
}

/// Drops hidden entries, newest first, at most `READ_LIMIT`
pub fn visible_latest(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.retain(|entry| entry.is_visible);
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries.truncate(READ_LIMIT);
    entries
}

/// "just now", "3 minutes ago", "1 week ago"...
pub fn relative_time(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - created;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    fn ago(count: i64, unit: &str) -> String {
        let plural = if count == 1 { "" } else { "s" };
        format!("{count} {unit}{plural} ago")
    }

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        ago(minutes, "minute")
    } else if hours < 24 {
        ago(hours, "hour")
    } else if days < 7 {
        ago(days, "day")
    } else if days / 7 < 4 {
        ago(days / 7, "week")
    } else {
        ago((days / 30).max(1), "month")
    }
}

pub fn char_count_label(message: &str) -> String {
    format!("{}/{}", message.chars().count(), MESSAGE_MAX)
}
