//! An `IndexGateway` backed by an HTTP document index speaking the
//! bulk/msearch NDJSON wire protocol from spec §6.

use crate::contracts::index_gateway::{BulkAction, IndexGateway, MsearchQuery, SortOrder, CONTAINER_INDEX};
use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub struct HttpIndexGateway {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl HttpIndexGateway {
    pub fn new(base_url: impl Into<String>, username: Option<String>, password: Option<String>) -> Self {
        let client = Client::builder().build().expect("reqwest client always builds");
        let credentials = username.zip(password);
        Self {
            client,
            base_url: base_url.into(),
            credentials,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.credentials {
            Some((user, pass)) => req.basic_auth(user, Some(pass)),
            None => req,
        }
    }
}

#[async_trait]
impl IndexGateway for HttpIndexGateway {
    async fn bulk(&self, actions: Vec<BulkAction>) -> Result<()> {
        if actions.is_empty() {
            return Ok(());
        }
        let mut body = String::new();
        for action in &actions {
            match action {
                BulkAction::Index { id, body: doc } => {
                    body.push_str(&json!({"index": {"_index": CONTAINER_INDEX, "_id": id}}).to_string());
                    body.push('\n');
                    body.push_str(&doc.to_string());
                    body.push('\n');
                }
                BulkAction::Update { id, partial } => {
                    body.push_str(&json!({"update": {"_index": CONTAINER_INDEX, "_id": id}}).to_string());
                    body.push('\n');
                    body.push_str(&json!({"doc": partial}).to_string());
                    body.push('\n');
                }
            }
        }

        let resp = self
            .request(reqwest::Method::POST, "/_bulk")
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))?;

        if !resp.status().is_success() {
            return Err(MonitorError::Transient(anyhow::anyhow!(
                "bulk request failed with status {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn msearch(&self, queries: Vec<MsearchQuery>) -> Result<Vec<Vec<Value>>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let mut body = String::new();
        for q in &queries {
            body.push_str(&json!({"index": q.index}).to_string());
            body.push('\n');
            let sort_dir = match q.sort_order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            let query = json!({
                "size": q.size,
                "query": {
                    "bool": {
                        "filter": [
                            {"term": {"container_id": q.container_id}},
                            {"range": {"last_updated": {"gte": q.range_gte, "lt": q.range_lt}}}
                        ]
                    }
                },
                "sort": [{"counter": sort_dir}]
            });
            body.push_str(&query.to_string());
            body.push('\n');
        }

        let resp = self
            .request(reqwest::Method::POST, "/_msearch")
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))?;

        if !resp.status().is_success() {
            return Err(MonitorError::Transient(anyhow::anyhow!(
                "msearch request failed with status {}",
                resp.status()
            )));
        }

        let parsed: Value = resp
            .json()
            .await
            .map_err(|e| MonitorError::Transient(anyhow::anyhow!(e)))?;
        let responses = parsed
            .get("responses")
            .and_then(Value::as_array)
            .ok_or_else(|| MonitorError::Transient(anyhow::anyhow!("msearch response missing `responses`")))?;

        let mut out = Vec::with_capacity(responses.len());
        for response in responses {
            let hits = response
                .get("hits")
                .and_then(|h| h.get("hits"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let sources = hits
                .into_iter()
                .filter_map(|hit| hit.get("_source").cloned())
                .collect();
            out.push(sources);
        }
        Ok(out)
    }
}
