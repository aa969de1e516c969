use super::{json_column, method_column, Database};
use crate::error::StoreError;
use crate::proxy::{redact_auth, RequestMethod};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A named, reusable request template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedRequest {
    pub id: String,
    pub name: String,
    pub method: RequestMethod,
    pub endpoint: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub category: String,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSavedRequest {
    pub name: String,
    pub method: RequestMethod,
    pub endpoint: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub body: String,
    pub category: String,
    #[serde(default)]
    pub is_favorite: bool,
}

fn nullable_string<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

const COLUMNS: &str =
    "id, name, method, endpoint, headers, body, category, is_favorite, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<SavedRequest> {
    let method: String = row.get(2)?;
    let headers: String = row.get(4)?;
    Ok(SavedRequest {
        id: row.get(0)?,
        name: row.get(1)?,
        method: method_column(2, method)?,
        endpoint: row.get(3)?,
        headers: json_column(4, &headers)?,
        body: row.get(5)?,
        category: row.get(6)?,
        is_favorite: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[derive(Clone)]
pub struct SavedRequestStore {
    db: Arc<Database>,
}

impl SavedRequestStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn create(&self, input: NewSavedRequest) -> Result<SavedRequest, StoreError> {
        if input.name.trim().is_empty() {
            return Err(StoreError::EmptyName);
        }

        let saved = SavedRequest {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            method: input.method,
            endpoint: input.endpoint,
            headers: redact_auth(&input.headers),
            body: input.body,
            category: input.category,
            is_favorite: input.is_favorite,
            created_at: Utc::now(),
        };

        let headers = serde_json::to_string(&saved.headers)?;
        let conn = self.db.lock()?;
        conn.execute(
            &format!("INSERT INTO saved_requests ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                saved.id,
                saved.name,
                saved.method.as_str(),
                saved.endpoint,
                headers,
                saved.body,
                saved.category,
                saved.is_favorite,
                saved.created_at,
            ],
        )?;

        tracing::debug!(id = %saved.id, name = %saved.name, "Saved request created");
        Ok(saved)
    }

    /// All saved requests in creation order.
    pub fn list(&self) -> Result<Vec<SavedRequest>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM saved_requests ORDER BY seq ASC"
        ))?;
        let rows = stmt.query_map([], from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get(&self, id: &str) -> Result<SavedRequest, StoreError> {
        let conn = self.db.lock()?;
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM saved_requests WHERE id = ?1"),
            [id],
            from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Sets the favorite flag. Setting the value already held is a success.
    pub fn patch_favorite(&self, id: &str, is_favorite: bool) -> Result<SavedRequest, StoreError> {
        let conn = self.db.lock()?;
        let matched = conn.execute(
            "UPDATE saved_requests SET is_favorite = ?1 WHERE id = ?2",
            params![is_favorite, id],
        )?;
        if matched == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(conn.query_row(
            &format!("SELECT {COLUMNS} FROM saved_requests WHERE id = ?1"),
            [id],
            from_row,
        )?)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.db.lock()?;
        let removed = conn.execute("DELETE FROM saved_requests WHERE id = ?1", [id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        tracing::debug!(id, "Saved request deleted");
        Ok(())
    }
}
