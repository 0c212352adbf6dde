//! REST client for the hosted row storage service
//!
//! Speaks the PostgREST dialect exposed under `/rest/v1/`. Uses synchronous
//! HTTP (ureq) so callers decide which executor, if any, runs it.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::traits::{EMAILS_TABLE, LEADS_TABLE};
use super::{EmailPatch, Filter, StorageError, TriageStore};
use crate::models::{Email, EmailId, Lead, LeadId, LeadPatch, NewLead};

/// Storage client backed by the service's REST endpoint
pub struct RestStore {
    agent: ureq::Agent,
    base_url: Url,
    api_key: String,
}

impl RestStore {
    /// Path of the REST surface relative to the project URL
    const REST_PATH: &'static str = "rest/v1/";

    /// Create a client for the project at `project_url`
    pub fn new(project_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let mut base = project_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .and_then(|u| u.join(Self::REST_PATH))
            .with_context(|| format!("Invalid storage URL: {}", project_url))?;

        Ok(Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url,
            api_key: api_key.into(),
        })
    }

    fn table_url(&self, table: &str, query: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(table)
            .with_context(|| format!("Invalid table name: {}", table))?;
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        Ok(url)
    }

    fn get_rows<T: DeserializeOwned>(&self, table: &'static str, query: &str) -> Result<Vec<T>> {
        let url = self.table_url(table, query)?;
        debug!("GET {}", url);

        let mut response = self
            .agent
            .get(url.as_str())
            .header("apikey", &self.api_key)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .call()
            .map_err(|e| query_error(table, e))?;

        let rows: Vec<T> = response
            .body_mut()
            .read_json()
            .map_err(|e| StorageError::InvalidResponse(format!("{} rows: {}", table, e)))?;
        Ok(rows)
    }

    fn patch_row<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &'static str,
        id: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.table_url(table, &build_query(&[Filter::eq("id", id)], &[]))?;
        debug!("PATCH {}", url);

        let mut response = self
            .agent
            .patch(url.as_str())
            .header("apikey", &self.api_key)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
            .send_json(body)
            .map_err(|e| write_error(table, id, e))?;

        let mut rows: Vec<T> = response
            .body_mut()
            .read_json()
            .map_err(|e| StorageError::InvalidResponse(format!("{} update: {}", table, e)))?;

        // An empty representation means the filter matched nothing
        if rows.is_empty() {
            return Err(StorageError::NotFound {
                table,
                id: id.to_string(),
            }
            .into());
        }
        Ok(rows.swap_remove(0))
    }
}

impl TriageStore for RestStore {
    fn list_emails_by_categories(&self, categories: &[String]) -> Result<Vec<Email>> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "{}&category=in.{}",
            build_query(&[], &[("order", "received_at.asc")]),
            urlencoding::encode(&in_list(categories))
        );
        self.get_rows(EMAILS_TABLE, &query)
    }

    fn find_emails(&self, filters: &[Filter]) -> Result<Vec<Email>> {
        self.get_rows(EMAILS_TABLE, &build_query(filters, &[]))
    }

    fn count_emails(&self, filters: &[Filter]) -> Result<usize> {
        let url = self.table_url(EMAILS_TABLE, &build_query(filters, &[]))?;
        debug!("HEAD {}", url);

        let response = self
            .agent
            .head(url.as_str())
            .header("apikey", &self.api_key)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Prefer", "count=exact")
            .call()
            .map_err(|e| query_error(EMAILS_TABLE, e))?;

        let range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| StorageError::InvalidResponse("missing Content-Range".to_string()))?;

        parse_content_range_total(range).ok_or_else(|| {
            StorageError::InvalidResponse(format!("unparseable Content-Range: {}", range)).into()
        })
    }

    fn update_email(&self, id: &EmailId, patch: &EmailPatch) -> Result<Email> {
        if patch.is_empty() {
            warn!("Empty update for email {}", id);
        }
        self.patch_row(EMAILS_TABLE, id.as_str(), patch)
    }

    fn list_leads(&self) -> Result<Vec<Lead>> {
        self.get_rows(LEADS_TABLE, &build_query(&[], &[]))
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<Lead> {
        let url = self.table_url(LEADS_TABLE, "")?;
        debug!("POST {}", url);

        let mut response = self
            .agent
            .post(url.as_str())
            .header("apikey", &self.api_key)
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .header("Prefer", "return=representation")
            .send_json(lead)
            .map_err(|e| write_error(LEADS_TABLE, "new", e))?;

        let mut rows: Vec<Lead> = response
            .body_mut()
            .read_json()
            .map_err(|e| StorageError::InvalidResponse(format!("lead insert: {}", e)))?;
        rows.pop()
            .ok_or_else(|| StorageError::InvalidResponse("insert returned no row".to_string()).into())
    }

    fn update_lead(&self, id: &LeadId, patch: &LeadPatch) -> Result<Lead> {
        self.patch_row(LEADS_TABLE, id.as_str(), patch)
    }
}

fn query_error(table: &'static str, err: ureq::Error) -> StorageError {
    StorageError::Query {
        table,
        reason: describe(err),
    }
}

fn write_error(table: &'static str, id: &str, err: ureq::Error) -> StorageError {
    StorageError::Write {
        table,
        id: id.to_string(),
        reason: describe(err),
    }
}

fn describe(err: ureq::Error) -> String {
    match err {
        ureq::Error::StatusCode(code) => format!("HTTP {}", code),
        other => other.to_string(),
    }
}

/// Build a query string selecting every column, with equality filters and
/// extra raw parameters
pub(crate) fn build_query(filters: &[Filter], extra: &[(&str, &str)]) -> String {
    let mut parts = vec!["select=*".to_string()];
    for filter in filters {
        parts.push(format!(
            "{}=eq.{}",
            urlencoding::encode(&filter.column),
            urlencoding::encode(&filter.value)
        ));
    }
    for (key, value) in extra {
        parts.push(format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)));
    }
    parts.join("&")
}

/// Format values as a PostgREST `in` list, quoting values with reserved characters
pub(crate) fn in_list(values: &[String]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| {
            if v.chars().any(|c| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | ' ')) {
                format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                v.clone()
            }
        })
        .collect();
    format!("({})", items.join(","))
}

/// Total row count from a `Content-Range` header like `0-24/25` or `*/0`
pub(crate) fn parse_content_range_total(header: &str) -> Option<usize> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.parse().ok()
}
