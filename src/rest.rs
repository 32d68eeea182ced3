//! Row-oriented access to the backend REST API

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::Error;
use crate::fetch::Fetch;

const CLIENT_INFO: &str = "prepbase/0.2.0";

/// Client for the backend's row-oriented REST API.
///
/// Cheap to clone; holds the project URL, the anonymous key, and the shared
/// HTTP client.
#[derive(Debug, Clone)]
pub struct RestClient {
    url: String,
    key: String,
    client: Client,
}

impl RestClient {
    /// Create a new RestClient
    pub fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
        }
    }

    /// Access a table or view
    pub fn table(&self, name: &str) -> TableClient {
        TableClient {
            url: format!("{}/rest/v1/{}", self.url, name),
            key: self.key.clone(),
            client: self.client.clone(),
        }
    }

    /// Call a stored procedure or function
    pub fn rpc<T: Serialize>(&self, function: &str, params: T) -> RpcBuilder<T> {
        RpcBuilder {
            url: format!("{}/rest/v1/rpc/{}", self.url, function),
            key: self.key.clone(),
            params,
            client: self.client.clone(),
            token: None,
        }
    }
}

/// Client scoped to a single table
#[derive(Debug, Clone)]
pub struct TableClient {
    url: String,
    key: String,
    client: Client,
}

impl TableClient {
    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        let mut params = HashMap::new();
        params.insert("select".to_string(), columns.to_string());
        SelectBuilder {
            url: self.url.clone(),
            key: self.key.clone(),
            client: self.client.clone(),
            params,
            token: None,
        }
    }

    /// Upsert rows (insert, or update on conflict)
    pub fn upsert<T: Serialize>(&self, values: T) -> UpsertBuilder<T> {
        UpsertBuilder {
            url: self.url.clone(),
            key: self.key.clone(),
            values,
            client: self.client.clone(),
            on_conflict: None,
            token: None,
        }
    }

    /// Delete rows matching the applied filters
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder {
            url: self.url.clone(),
            key: self.key.clone(),
            client: self.client.clone(),
            params: HashMap::new(),
            token: None,
        }
    }

    /// Probe the table with a minimal select.
    ///
    /// Used by connection checks and diagnostics; the rows themselves are
    /// discarded.
    pub async fn probe(&self, token: Option<&str>) -> Result<(), Error> {
        let mut builder = self.select("id").limit(1);
        if let Some(token) = token {
            builder = builder.auth(token);
        }
        builder.execute::<serde_json::Value>().await?;
        Ok(())
    }
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    url: String,
    key: String,
    client: Client,
    params: HashMap<String, String>,
    token: Option<String>,
}

impl SelectBuilder {
    /// Attach the caller's access token
    pub fn auth(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Filter rows where column equals a value
    pub fn eq<T: ToString>(mut self, column: &str, value: T) -> Self {
        self.params
            .insert(column.to_string(), format!("eq.{}", value.to_string()));
        self
    }

    /// Order the results by a column
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .insert("order".to_string(), format!("{}.{}", column, direction));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: i32) -> Self {
        self.params.insert("limit".to_string(), count.to_string());
        self
    }

    /// Execute the query and return the rows
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        let mut fetch = Fetch::get(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .query(self.params.clone());
        if let Some(ref token) = self.token {
            fetch = fetch.bearer_auth(token);
        }
        fetch.execute::<Vec<T>>().await
    }

    /// Execute the query and return the first row, if any
    pub async fn execute_one<T: DeserializeOwned>(self) -> Result<Option<T>, Error> {
        let rows = self.limit(1).execute::<T>().await?;
        Ok(rows.into_iter().next())
    }
}

/// Builder for UPSERT queries
pub struct UpsertBuilder<T: Serialize> {
    url: String,
    key: String,
    values: T,
    client: Client,
    on_conflict: Option<String>,
    token: Option<String>,
}

impl<T: Serialize> UpsertBuilder<T> {
    /// Attach the caller's access token
    pub fn auth(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Specify the column to check for conflicts
    pub fn on_conflict(mut self, column: &str) -> Self {
        self.on_conflict = Some(column.to_string());
        self
    }

    /// Execute the upsert and return the stored rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        let mut params = HashMap::new();
        let prefer = match self.on_conflict {
            Some(ref conflict) => {
                params.insert("on_conflict".to_string(), conflict.clone());
                "resolution=merge-duplicates,return=representation"
            }
            None => "return=representation",
        };

        let mut fetch = Fetch::post(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .header("Prefer", prefer)
            .query(params);
        if let Some(ref token) = self.token {
            fetch = fetch.bearer_auth(token);
        }
        fetch.json(&self.values)?.execute::<Vec<R>>().await
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    url: String,
    key: String,
    client: Client,
    params: HashMap<String, String>,
    token: Option<String>,
}

impl DeleteBuilder {
    /// Attach the caller's access token
    pub fn auth(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Filter rows where column equals a value
    pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
        self.params
            .insert(column.to_string(), format!("eq.{}", value.to_string()));
        self
    }

    /// Execute the delete without returning the removed rows
    pub async fn execute(&self) -> Result<(), Error> {
        let mut fetch = Fetch::delete(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO)
            .header("Prefer", "return=minimal")
            .query(self.params.clone());
        if let Some(ref token) = self.token {
            fetch = fetch.bearer_auth(token);
        }
        fetch.execute_no_return().await
    }
}

/// Builder for RPC (stored procedure) calls
pub struct RpcBuilder<T: Serialize> {
    url: String,
    key: String,
    params: T,
    client: Client,
    token: Option<String>,
}

impl<T: Serialize> RpcBuilder<T> {
    /// Attach the caller's access token
    pub fn auth(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Execute the call and return the result
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<R, Error> {
        let mut fetch = Fetch::post(&self.client, &self.url)
            .header("apikey", &self.key)
            .header("X-Client-Info", CLIENT_INFO);
        if let Some(ref token) = self.token {
            fetch = fetch.bearer_auth(token);
        }
        fetch.json(&self.params)?.execute::<R>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn select_orders_and_deserializes_rows() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/recipes"))
            .and(query_param("select", "*"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "r2", "name": "Stock" },
                { "id": "r1", "name": "Roux" }
            ])))
            .mount(&mock_server)
            .await;

        let rest = RestClient::new(&mock_server.uri(), "fake-key", Client::new());
        let rows = rest
            .table("recipes")
            .select("*")
            .order("created_at", false)
            .execute::<Value>()
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "r2");
    }

    #[tokio::test]
    async fn upsert_sends_conflict_resolution_prefer_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/containers"))
            .and(query_param("on_conflict", "id"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!([{ "id": "c1", "name": "Hotel pan" }])),
            )
            .mount(&mock_server)
            .await;

        let rest = RestClient::new(&mock_server.uri(), "fake-key", Client::new());
        let rows = rest
            .table("containers")
            .upsert(json!({ "id": "c1", "name": "Hotel pan" }))
            .on_conflict("id")
            .execute::<Value>()
            .await
            .unwrap();

        assert_eq!(rows[0]["name"], "Hotel pan");

        let requests = mock_server.received_requests().await.unwrap();
        let upsert = requests
            .iter()
            .find(|request| request.url.path() == "/rest/v1/containers")
            .unwrap();
        // wiremock splits comma-separated header values, so gather every
        // Prefer value before asserting on the directives.
        let prefer: Vec<String> = upsert
            .headers
            .iter()
            .filter(|(name, _)| name.as_str().eq_ignore_ascii_case("prefer"))
            .flat_map(|(_, values)| values.iter().map(|value| value.as_str().to_string()))
            .collect();
        assert!(prefer.iter().any(|v| v.contains("resolution=merge-duplicates")));
        assert!(prefer.iter().any(|v| v.contains("return=representation")));
    }

    #[tokio::test]
    async fn error_body_is_reclassified() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": "42P01",
                "message": "relation \"public.ghost\" does not exist"
            })))
            .mount(&mock_server)
            .await;

        let rest = RestClient::new(&mock_server.uri(), "fake-key", Client::new());
        let err = rest
            .table("ghost")
            .select("*")
            .execute::<Value>()
            .await
            .unwrap_err();

        assert_eq!(
            err.remote_kind(),
            Some(crate::error::RemoteErrorKind::TableMissing)
        );
    }
}
