use anyhow::Result;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Typed failure reported by PostgREST. Wrapped in `anyhow::Error`, callers
/// recover it with `downcast_ref::<SupabaseError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SupabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl SupabaseError {
    fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => SupabaseError::Auth(message),
            404 => SupabaseError::NotFound(message),
            409 => SupabaseError::Conflict(message),
            _ => SupabaseError::Api { status, message },
        }
    }
}

/// True when `err` carries a PostgREST 409, i.e. a unique constraint fired.
pub fn is_conflict(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<SupabaseError>(), Some(SupabaseError::Conflict(_)))
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        let apikey = HeaderValue::from_str(&self.anon_key)
            .map_err(|e| SupabaseError::InvalidHeader(e.to_string()))?;
        headers.insert("apikey", apikey);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| SupabaseError::InvalidHeader(e.to_string()))?;
            headers.insert(AUTHORIZATION, bearer);
        }

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> Result<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> Result<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(SupabaseError::from_status(status.as_u16(), error_text).into());
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// `GET /rest/v1/{table}?{filters}` returning every matching row.
    pub async fn select<T>(&self, table: &str, filters: &str, auth_token: &str) -> Result<Vec<T>>
    where T: DeserializeOwned {
        let path = rest_path(table, filters);
        self.request(Method::GET, &path, Some(auth_token), None).await
    }

    /// Cheap existence probe: asks for at most one id.
    pub async fn exists(&self, table: &str, filters: &str, auth_token: &str) -> Result<bool> {
        let filters = if filters.is_empty() {
            "select=id&limit=1".to_string()
        } else {
            format!("{}&select=id&limit=1", filters)
        };
        let rows: Vec<Value> = self.select(table, &filters, auth_token).await?;
        Ok(!rows.is_empty())
    }

    /// Inserts one row and returns its stored representation.
    pub async fn insert<T>(&self, table: &str, row: Value, auth_token: &str) -> Result<T>
    where T: DeserializeOwned {
        self.insert_one(table, "", row, Some(auth_token), return_representation()).await
    }

    /// Insert under the anon key only, for routes reached before sign-in.
    pub async fn insert_anonymous<T>(&self, table: &str, row: Value) -> Result<T>
    where T: DeserializeOwned {
        self.insert_one(table, "", row, None, return_representation()).await
    }

    /// Insert-or-merge on the `on_conflict` column.
    pub async fn upsert<T>(&self, table: &str, on_conflict: &str, row: Value, auth_token: &str) -> Result<T>
    where T: DeserializeOwned {
        let filters = format!("on_conflict={}", on_conflict);
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );
        self.insert_one(table, &filters, row, Some(auth_token), headers).await
    }

    async fn insert_one<T>(&self, table: &str, filters: &str, row: Value,
                           auth_token: Option<&str>, headers: HeaderMap) -> Result<T>
    where T: DeserializeOwned {
        let path = rest_path(table, filters);
        let rows: Vec<T> = self.request_with_headers(
            Method::POST,
            &path,
            auth_token,
            Some(row),
            Some(headers),
        ).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::Api {
                status: 201,
                message: format!("insert into {} returned no rows", table),
            }.into())
    }

    /// Patches every row matching `filters`, returning the updated rows.
    pub async fn update<T>(&self, table: &str, filters: &str, patch: Value, auth_token: &str) -> Result<Vec<T>>
    where T: DeserializeOwned {
        let path = rest_path(table, filters);
        self.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(patch),
            Some(return_representation()),
        ).await
    }

    /// Deletes every row matching `filters`, returning the removed rows.
    pub async fn delete(&self, table: &str, filters: &str, auth_token: &str) -> Result<Vec<Value>> {
        let path = rest_path(table, filters);
        self.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(return_representation()),
        ).await
    }
}

fn rest_path(table: &str, filters: &str) -> String {
    if filters.is_empty() {
        format!("/rest/v1/{}", table)
    } else {
        format!("/rest/v1/{}?{}", table, filters)
    }
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}
