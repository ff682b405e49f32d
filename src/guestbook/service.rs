//! Guestbook write endpoint, independent of any HTTP framework: the host
//! hands over method, headers and JSON body and sends back status + JSON.
//!
//! Checks run in a fixed order: method, rate limit, honeypot, validation,
//! configuration, persist.
use super::{validate, Entry, Submission, ValidationError, READ_LIMIT};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

pub const RATE_LIMIT_MAX: u32 = 3;
pub const RATE_LIMIT_WINDOW_SECONDS: i64 = 60;
const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Error, Debug)]
pub enum GuestbookError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Too many requests. Please wait a minute.")]
    RateLimited,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Server configuration error")]
    ServerMisconfigured,
    #[error("Failed to save entry")]
    SaveFailed(anyhow::Error),
    #[error("Failed to read guestbook")]
    ReadFailed(anyhow::Error),
}

impl GuestbookError {
    pub fn status(&self) -> u16 {
        match self {
            GuestbookError::MethodNotAllowed => 405,
            GuestbookError::RateLimited => 429,
            GuestbookError::Validation(_) => 400,
            GuestbookError::ServerMisconfigured
            | GuestbookError::SaveFailed(_)
            | GuestbookError::ReadFailed(_) => 500,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

/// Status code and JSON body for the host to send
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl From<GuestbookError> for Response {
    fn from(err: GuestbookError) -> Self {
        Response {
            status: err.status(),
            body: json!(ErrorBody {
                error: err.to_string()
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    /// lower-case header names
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl Request {
    pub fn post(body: Value) -> Self {
        Request {
            method: "POST".into(),
            headers: HashMap::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    /// First hop of `x-forwarded-for`
    pub fn client_key(&self) -> String {
        self.headers
            .get("x-forwarded-for")
            .and_then(|forwarded| forwarded.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(UNKNOWN_CLIENT)
            .to_string()
    }
}

/// Where entries live, newest first
pub trait EntryStore {
    fn prepend(&mut self, entry: Entry) -> Result<()>;
    fn newest(&self, limit: usize) -> Result<Vec<Entry>>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntryStore for MemoryStore {
    fn prepend(&mut self, entry: Entry) -> Result<()> {
        self.entries.insert(0, entry);
        Ok(())
    }

    fn newest(&self, limit: usize) -> Result<Vec<Entry>> {
        Ok(self.entries.iter().take(limit).cloned().collect())
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: DateTime<Utc>,
    count: u32,
}

/// Fixed window per client key
#[derive(Debug)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    clients: HashMap<String, Window>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        RateLimiter::new(RATE_LIMIT_MAX, Duration::seconds(RATE_LIMIT_WINDOW_SECONDS))
    }
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        RateLimiter {
            max,
            window,
            clients: HashMap::new(),
        }
    }

    /// Counts this request and reports whether it is over the limit
    pub fn is_limited(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        match self.clients.get_mut(key) {
            Some(window) if now - window.start <= self.window => {
                window.count += 1;
                window.count > self.max
            }
            _ => {
                self.clients
                    .insert(key.to_string(), Window { start: now, count: 1 });
                false
            }
        }
    }
}

/// Accepted requests either stored an entry or were quietly dropped
#[derive(Debug, Clone, PartialEq)]
pub enum Accepted {
    Stored(Entry),
    Discarded,
}

pub struct GuestbookService<S: EntryStore> {
    /// `None` until a backing store is configured
    store: Option<S>,
    limiter: RateLimiter,
}

impl<S: EntryStore> GuestbookService<S> {
    pub fn new(store: Option<S>) -> Self {
        GuestbookService {
            store,
            limiter: RateLimiter::default(),
        }
    }

    pub fn store(&self) -> Option<&S> {
        self.store.as_ref()
    }

    pub fn handle(&mut self, request: &Request, now: DateTime<Utc>) -> Response {
        match self.submit(request, now) {
            Ok(Accepted::Stored(entry)) => Response {
                status: 200,
                body: json!({ "success": true, "entry": entry }),
            },
            Ok(Accepted::Discarded) => Response {
                status: 200,
                body: json!({ "success": true }),
            },
            Err(err) => {
                if let GuestbookError::SaveFailed(source) = &err {
                    log_error!("Guestbook store failed : {:#}", source);
                }
                err.into()
            }
        }
    }

    pub fn submit(&mut self, request: &Request, now: DateTime<Utc>) -> Result<Accepted, GuestbookError> {
        if !request.method.eq_ignore_ascii_case("POST") {
            return Err(GuestbookError::MethodNotAllowed);
        }
        if self.limiter.is_limited(&request.client_key(), now) {
            return Err(GuestbookError::RateLimited);
        }
        if honeypot_filled(&request.body) {
            return Ok(Accepted::Discarded);
        }

        // a body of the wrong shape reads as an empty form
        let submission: Submission = serde_json::from_value(request.body.clone()).unwrap_or_default();
        let valid = validate(&submission)?;

        let store = self
            .store
            .as_mut()
            .ok_or(GuestbookError::ServerMisconfigured)?;
        let entry = valid.stamp(now);
        store
            .prepend(entry.clone())
            .map_err(GuestbookError::SaveFailed)?;
        Ok(Accepted::Stored(entry))
    }

    /// Up to 50 entries, newest first
    pub fn list(&self) -> Result<Vec<Entry>, GuestbookError> {
        let store = self.store.as_ref().ok_or(GuestbookError::ServerMisconfigured)?;
        store.newest(READ_LIMIT).map_err(GuestbookError::ReadFailed)
    }
}

fn honeypot_filled(body: &Value) -> bool {
    match body.get("website") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(value)) => !value.is_empty(),
        Some(Value::Number(number)) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Some(_) => true,
    }
}
