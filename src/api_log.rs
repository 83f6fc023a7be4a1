//! Ledger of backend calls, kept for the log inspector.
//!
//! The backend returns an `apiLog` object next to most responses. Each one is
//! stamped, appended to a ledger bounded to [`MAX_LOG_ENTRIES`] and mirrored
//! into session storage so the receipt screen can show it after navigation.
//!
//! The ledger is a cheap `Rc` handle. The app constructs one and hands it
//! down through a Yew context; there is no global instance.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::{KeyValueStore, SessionArea};

pub const MAX_LOG_ENTRIES: usize = 50;
pub const API_LOG_KEY: &str = "apiLogs";

/// One request/response pair as described by the backend.
///
/// Only the fields the client reads are typed; everything else the backend
/// sends is kept verbatim in `extra`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ApiCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApiCall {
    pub fn new(method: &str, endpoint: &str) -> Self {
        Self {
            method: Some(method.to_string()),
            endpoint: Some(endpoint.to_string()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.as_ref().is_some_and(|e| !e.is_null())
    }

    fn mentions_order(&self, order_id: &str) -> bool {
        let Some(request) = &self.request else {
            return false;
        };
        let in_body = request
            .pointer("/body/orderId")
            .and_then(Value::as_str)
            .is_some_and(|id| id == order_id);
        let in_url = request
            .get("url")
            .and_then(Value::as_str)
            .is_some_and(|url| url.contains(order_id));
        in_body || in_url
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ApiLogEntry {
    pub timestamp: DateTime<Utc>,
    pub id: String,
    #[serde(flatten)]
    pub call: ApiCall,
}

impl ApiLogEntry {
    pub fn duration_label(&self) -> String {
        match &self.call.duration {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => format!("{}ms", n),
            _ => String::new(),
        }
    }
}

/// Kind of payload shown in an entry's detail view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionKind {
    Request,
    Response,
    Error,
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogSection<'a> {
    pub title: String,
    pub kind: SectionKind,
    pub data: &'a Value,
}

impl ApiLogEntry {
    /// Request, response and error payloads, then any other object the backend attached.
    pub fn sections(&self) -> Vec<LogSection<'_>> {
        let typed = [
            ("Request", SectionKind::Request, &self.call.request),
            ("Response", SectionKind::Response, &self.call.response),
            ("Error Details", SectionKind::Error, &self.call.error),
        ];
        let mut sections: Vec<LogSection<'_>> = typed
            .into_iter()
            .filter_map(|(title, kind, data)| {
                data.as_ref().filter(|v| !v.is_null()).map(|data| LogSection {
                    title: title.to_string(),
                    kind,
                    data,
                })
            })
            .collect();
        sections.extend(
            self.call
                .extra
                .iter()
                .filter(|(_, value)| value.is_object())
                .map(|(key, data)| LogSection {
                    title: key.clone(),
                    kind: SectionKind::Other,
                    data,
                }),
        );
        sections
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub endpoints: BTreeMap<String, usize>,
}

struct Ledger {
    entries: Vec<ApiLogEntry>,
    next_seq: u64,
    /// Bumped on every change so views can tell a stale render apart.
    revision: u64,
    storage: Rc<dyn KeyValueStore>,
}

impl Ledger {
    fn persist(&self) {
        let saved = serde_json::to_string(&self.entries)
            .map_err(crate::error::CheckoutError::from)
            .and_then(|raw| self.storage.set(API_LOG_KEY, &raw));
        if let Err(err) = saved {
            log::error!("Error saving logs to session storage: {}", err);
        }
    }
}

#[derive(Clone)]
pub struct ApiLog {
    inner: Rc<RefCell<Ledger>>,
}

impl PartialEq for ApiLog {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl ApiLog {
    /// Create a ledger over `storage`, restoring whatever it already holds.
    pub fn new(storage: Rc<dyn KeyValueStore>) -> Self {
        let entries = load_entries(storage.as_ref());
        let next_seq = entries.len() as u64;
        Self {
            inner: Rc::new(RefCell::new(Ledger {
                entries,
                next_seq,
                revision: 0,
                storage,
            })),
        }
    }

    /// Ledger mirrored into `window.sessionStorage`.
    pub fn session() -> Self {
        Self::new(Rc::new(SessionArea::new()))
    }

    pub fn record(&self, call: ApiCall) -> ApiLogEntry {
        let mut ledger = self.inner.borrow_mut();
        let timestamp = Utc::now();
        ledger.next_seq += 1;
        let id = format!(
            "{}-{:06}",
            timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            ledger.next_seq
        );

        let mut call = call;
        call.extra.remove("timestamp");
        call.extra.remove("id");
        let entry = ApiLogEntry { timestamp, id, call };

        ledger.entries.push(entry.clone());
        if ledger.entries.len() > MAX_LOG_ENTRIES {
            let excess = ledger.entries.len() - MAX_LOG_ENTRIES;
            ledger.entries.drain(..excess);
        }
        ledger.revision += 1;
        ledger.persist();

        log::debug!(
            target: "api_log",
            "{} {} ({})",
            entry.call.method.as_deref().unwrap_or("API"),
            entry.call.endpoint.as_deref().unwrap_or("unknown"),
            entry.id
        );
        entry
    }

    /// Record `call` if there is one.
    pub fn record_opt(&self, call: Option<ApiCall>) -> Option<ApiLogEntry> {
        call.map(|call| self.record(call))
    }

    pub fn entries(&self) -> Vec<ApiLogEntry> {
        self.inner.borrow().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn by_order_id(&self, order_id: &str) -> Vec<ApiLogEntry> {
        self.inner
            .borrow()
            .entries
            .iter()
            .filter(|entry| entry.call.mentions_order(order_id))
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> LogStats {
        let ledger = self.inner.borrow();
        let mut stats = LogStats {
            total: ledger.entries.len(),
            ..LogStats::default()
        };
        for entry in &ledger.entries {
            if entry.call.is_error() {
                stats.failed += 1;
            } else {
                stats.successful += 1;
            }
            let endpoint = entry.call.endpoint.clone().unwrap_or_else(|| "unknown".to_string());
            *stats.endpoints.entry(endpoint).or_default() += 1;
        }
        stats
    }

    pub fn clear(&self) {
        let mut ledger = self.inner.borrow_mut();
        ledger.entries.clear();
        ledger.revision += 1;
        ledger.persist();
    }

    /// Change counter of this handle. Ledger contents are shared behind an
    /// `Rc`, so components pass this as a prop to re-render on new calls.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(&self.inner.borrow().entries).unwrap_or_else(|_| "[]".to_string())
    }

    /// File name offered when the ledger is downloaded.
    pub fn export_file_name(&self) -> String {
        format!(
            "api-logs-{}.json",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

fn load_entries(storage: &dyn KeyValueStore) -> Vec<ApiLogEntry> {
    let raw = match storage.get(API_LOG_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            log::error!("Error loading logs from session storage: {}", err);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<ApiLogEntry>>(&raw) {
        Ok(mut entries) => {
            if entries.len() > MAX_LOG_ENTRIES {
                entries.drain(..entries.len() - MAX_LOG_ENTRIES);
            }
            entries
        }
        Err(err) => {
            log::error!("Error loading logs from session storage: {}", err);
            Vec::new()
        }
    }
}
