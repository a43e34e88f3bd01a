//! Declarative filtering for post listings.
//!
//! Raw request parameters arrive as loose strings; `PostFilter` normalizes the
//! recognized ones into typed predicates and renders them as a SQL `WHERE`
//! fragment. Unrecognized parameters are ignored, never errors. Malformed
//! values for recognized parameters surface as field-level validation errors.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::db::models::PostKind;
use crate::error::{AppError, FieldError};

/// Listing query parameters as they arrive on the request, untyped and all
/// optional. Serde drops unknown keys on deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub title: Option<String>,
    pub category: Option<String>,
    pub kind: Option<String>,
    pub posted_after: Option<String>,
    pub posted_before: Option<String>,
    pub page: Option<String>,
}

impl ListingParams {
    /// 1-based page number; absent means the first page.
    pub fn page_number(&self) -> Result<u32, AppError> {
        match &self.page {
            None => Ok(1),
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => Ok(n),
                _ => Err(AppError::Validation(vec![FieldError::new(
                    "page",
                    "must be a positive integer",
                )])),
            },
        }
    }
}

/// Normalized predicate over the post collection. No fields set means the
/// identity filter: every post matches. Listings echo it back so clients can
/// see what was applied.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PostFilter {
    /// Case-insensitive substring match on the title.
    pub title_contains: Option<String>,
    /// Exact category id.
    pub category_id: Option<i64>,
    /// Exact post kind.
    pub kind: Option<PostKind>,
    /// Inclusive lower bound on `posted_at`.
    pub posted_after: Option<String>,
    /// Inclusive upper bound on `posted_at`.
    pub posted_before: Option<String>,
}

impl PostFilter {
    pub fn from_params(params: &ListingParams) -> Result<Self, AppError> {
        let mut filter = PostFilter::default();
        let mut errors = Vec::new();

        if let Some(title) = non_empty(&params.title) {
            filter.title_contains = Some(title.to_string());
        }

        if let Some(category) = non_empty(&params.category) {
            match category.parse::<i64>() {
                Ok(id) => filter.category_id = Some(id),
                Err(_) => errors.push(FieldError::new("category", "must be a category id")),
            }
        }

        if let Some(kind) = non_empty(&params.kind) {
            match kind.parse::<PostKind>() {
                Ok(k) => filter.kind = Some(k),
                Err(_) => errors.push(FieldError::new("kind", "must be 'news' or 'article'")),
            }
        }

        if let Some(after) = non_empty(&params.posted_after) {
            match parse_time_bound(after, Bound::Lower) {
                Some(ts) => filter.posted_after = Some(ts),
                None => errors.push(FieldError::new("posted_after", "not a recognized date")),
            }
        }

        if let Some(before) = non_empty(&params.posted_before) {
            match parse_time_bound(before, Bound::Upper) {
                Some(ts) => filter.posted_before = Some(ts),
                None => errors.push(FieldError::new("posted_before", "not a recognized date")),
            }
        }

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(AppError::Validation(errors))
        }
    }

    /// Render the predicate as a `WHERE` fragment (empty string for the
    /// identity filter) plus its bind values, in placeholder order. The same
    /// fragment backs both the COUNT and the page query.
    pub fn sql_where(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(title) = &self.title_contains {
            clauses.push("LOWER(title) LIKE '%' || ? || '%' ESCAPE '\\'");
            values.push(Value::Text(escape_like(&title.to_lowercase())));
        }
        if let Some(id) = self.category_id {
            clauses.push("category_id = ?");
            values.push(Value::Integer(id));
        }
        if let Some(kind) = self.kind {
            clauses.push("kind = ?");
            values.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(after) = &self.posted_after {
            clauses.push("posted_at >= ?");
            values.push(Value::Text(after.clone()));
        }
        if let Some(before) = &self.posted_before {
            clauses.push("posted_at <= ?");
            values.push(Value::Text(before.clone()));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }
}

fn non_empty(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

enum Bound {
    Lower,
    Upper,
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, or a bare date.
/// A bare date expands to the start or end of that day so both bounds stay
/// inclusive.
fn parse_time_bound(raw: &str, bound: Bound) -> Option<String> {
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.format("%Y-%m-%d %H:%M:%S").to_string());
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let time = match bound {
        Bound::Lower => "00:00:00",
        Bound::Upper => "23:59:59",
    };
    Some(format!("{} {}", date.format("%Y-%m-%d"), time))
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
