// ┌──────────────────────────────────────────────────────────────────────────┐
// │                      guestbook/ layout                                   │
// ├────────────────┬─────────────────────────────────────────────────────────┤
// │   mod.rs       │ entry + submission types, validation shared by both     │
// │   service.rs   │ write endpoint : rate limit, honeypot, persist          │
// │   client.rs    │ browser side : cooldown, submit, fetch, relative time   │
// └────────────────┴─────────────────────────────────────────────────────────┘
pub mod client;
pub mod service;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NAME_MAX: usize = 50;
pub const LOCATION_MAX: usize = 50;
pub const MESSAGE_MAX: usize = 500;
/// Most entries ever shown
pub const READ_LIMIT: usize = 50;

/// A signed guestbook line, as stored and as served
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// moderation flag, hidden entries are kept but never listed
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
}

fn visible_by_default() -> bool {
    true
}

/// What the form posts
/// - `website` is a honeypot, people never see the field so only bots fill it
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Submission {
    pub fn is_honeypot_filled(&self) -> bool {
        self.website
            .as_deref()
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,
    #[error("Name must be 50 characters or less")]
    NameTooLong,
    #[error("Message is required")]
    MessageRequired,
    #[error("Message must be 500 characters or less")]
    MessageTooLong,
    #[error("Location must be 50 characters or less")]
    LocationTooLong,
    #[error("URLs are not allowed in messages")]
    UrlInMessage,
    #[error("URLs are not allowed in name")]
    UrlInName,
}

/// Trimmed, checked submission waiting for a timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    pub name: String,
    pub location: Option<String>,
    pub message: String,
}

impl ValidEntry {
    pub fn stamp(self, created_at: DateTime<Utc>) -> Entry {
        Entry {
            name: self.name,
            location: self.location,
            message: self.message,
            created_at,
            is_visible: true,
        }
    }
}

/// `http://`, `https://` or `www.`, any case
pub fn contains_url(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["http://", "https://", "www."]
        .iter()
        .any(|pattern| lower.contains(pattern))
}

/// Same rules on both sides of the wire, checked in this order
pub fn validate(submission: &Submission) -> Result<ValidEntry, ValidationError> {
    let name = submission.name.trim();
    let message = submission.message.trim();
    let location = submission
        .location
        .as_deref()
        .map(str::trim)
        .filter(|location| !location.is_empty());

    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if name.chars().count() > NAME_MAX {
        return Err(ValidationError::NameTooLong);
    }
    if message.is_empty() {
        return Err(ValidationError::MessageRequired);
    }
    if message.chars().count() > MESSAGE_MAX {
        return Err(ValidationError::MessageTooLong);
    }
    if location.map(|l| l.chars().count() > LOCATION_MAX).unwrap_or(false) {
        return Err(ValidationError::LocationTooLong);
    }
    if contains_url(message) {
        return Err(ValidationError::UrlInMessage);
    }
    if contains_url(name) {
        return Err(ValidationError::UrlInName);
    }

    Ok(ValidEntry {
        name: name.to_string(),
        location: location.map(str::to_string),
        message: message.to_string(),
    })
}
