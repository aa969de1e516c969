use super::{json_column, method_column, Database};
use crate::error::StoreError;
use crate::proxy::RequestMethod;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Longest response preview kept per entry, in characters.
pub const PREVIEW_LIMIT: usize = 2048;

/// One executed request and its outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub method: RequestMethod,
    pub endpoint: String,
    /// Absent when the request never got an HTTP response.
    pub status_code: Option<u16>,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub response_preview: Option<String>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(method: RequestMethod, endpoint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            method,
            endpoint: endpoint.into(),
            status_code: None,
            headers: HashMap::new(),
            body: None,
            response_preview: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_request(mut self, headers: HashMap<String, String>, body: Option<String>) -> Self {
        self.headers = headers;
        self.body = body;
        self
    }

    pub fn with_response(mut self, status_code: u16, data: &serde_json::Value) -> Self {
        self.status_code = Some(status_code);
        self.response_preview = Some(preview(data));
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

fn preview(data: &serde_json::Value) -> String {
    let text = match data {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() <= PREVIEW_LIMIT {
        text
    } else {
        text.chars().take(PREVIEW_LIMIT).collect()
    }
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let headers: String = row.get(4)?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        method: method_column(1, row.get(1)?)?,
        endpoint: row.get(2)?,
        status_code: row.get(3)?,
        headers: json_column(4, &headers)?,
        body: row.get(5)?,
        response_preview: row.get(6)?,
        error: row.get(7)?,
        timestamp: row.get(8)?,
    })
}

#[derive(Clone)]
pub struct HistoryStore {
    db: Arc<Database>,
    limit: usize,
}

impl HistoryStore {
    pub fn new(db: Arc<Database>, limit: usize) -> Self {
        Self { db, limit }
    }

    pub fn append(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        let headers = serde_json::to_string(&entry.headers)?;
        let conn = self.db.lock()?;
        conn.execute(
            r#"
            INSERT INTO request_history
                (id, method, endpoint, status_code, headers, body, response_preview, error, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                entry.id,
                entry.method.as_str(),
                entry.endpoint,
                entry.status_code,
                headers,
                entry.body,
                entry.response_preview,
                entry.error,
                entry.timestamp,
            ],
        )?;
        Ok(())
    }

    /// Most recent first, capped at the configured limit.
    pub fn list(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, method, endpoint, status_code, headers, body, response_preview, error, timestamp
            FROM request_history
            ORDER BY seq DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map([self.limit as i64], from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn clear(&self) -> Result<usize, StoreError> {
        let conn = self.db.lock()?;
        let removed = conn.execute("DELETE FROM request_history", [])?;
        tracing::debug!(removed, "History cleared");
        Ok(removed)
    }
}
