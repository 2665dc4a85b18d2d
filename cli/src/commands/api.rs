//! `lab api`: issue one request through the configured client.

use crate::config::AppConfig;
use clap::Args;
use lab_api::ApiClient;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Args, PartialEq, Debug)]
pub struct ApiArgs {
    /// Path relative to the API root, e.g. `projects/42/issues` (unused with --graphql)
    #[arg(default_value = "")]
    pub path: String,

    /// Host to connect to (default: gitlab.com or $LAB_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Send a GraphQL query; pass the document as `-f query=...`
    #[arg(long, default_value_t = false)]
    pub graphql: bool,

    /// HTTP method for REST requests
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// `key=value` pairs: query parameters for GET, a JSON body otherwise
    #[arg(short = 'f', long = "field")]
    pub fields: Vec<String>,
}

/// Split `key=value` arguments. The value may itself contain `=`.
pub(crate) fn parse_fields(fields: &[String]) -> Result<Vec<(String, String)>, String> {
    fields
        .iter()
        .map(|field| {
            field
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| format!("Invalid field '{}': expected key=value", field))
        })
        .collect()
}

/// Separate the `query` field from GraphQL variables.
pub(crate) fn graphql_payload(fields: Vec<(String, String)>) -> Result<(String, Value), String> {
    let mut query = None;
    let mut variables = Map::new();
    for (key, value) in fields {
        if key == "query" {
            query = Some(value);
        } else {
            variables.insert(key, Value::String(value));
        }
    }
    let query = query.ok_or("GraphQL requests need a query: -f query='{ currentUser { username } }'")?;
    Ok((query, Value::Object(variables)))
}

impl ApiArgs {
    pub async fn run(self, config: &AppConfig) -> Result<(), String> {
        let fields = parse_fields(&self.fields)?;

        let mut client = ApiClient::new();
        let handle = client
            .connect_with_config(self.host.as_deref().unwrap_or_default(), config, self.graphql)
            .map_err(|e| e.to_string())?;

        let request = if self.graphql {
            let (query, variables) = graphql_payload(fields)?;
            handle.graphql(&query, variables).map_err(|e| e.to_string())?
        } else {
            let method = Method::from_bytes(self.method.to_uppercase().as_bytes())
                .map_err(|_| format!("Invalid HTTP method '{}'", self.method))?;
            let builder = handle
                .request(method.clone(), &self.path)
                .map_err(|e| e.to_string())?;
            if fields.is_empty() {
                builder
            } else if method == Method::GET {
                builder.query(&fields)
            } else {
                let body: Map<String, Value> = fields
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect();
                builder.json(&body)
            }
        };

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body = response.text().await.map_err(|e| e.to_string())?;
        debug!(%status, bytes = body.len(), "API response");

        match serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
        {
            Some(pretty) => println!("{}", pretty),
            None => println!("{}", body),
        }

        if status.is_success() {
            Ok(())
        } else {
            Err(format!("HTTP {}", status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_fields() {
        let fields = parse_fields(&["state=opened".into(), "search=a=b".into()]).unwrap();
        assert_eq!(
            fields,
            vec![
                ("state".to_string(), "opened".to_string()),
                ("search".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_fields() {
        assert!(parse_fields(&["novalue".into()]).is_err());
        assert!(parse_fields(&["=value".into()]).is_err());
    }

    #[test]
    fn graphql_payload_splits_query_and_variables() {
        let (query, variables) = graphql_payload(vec![
            ("query".into(), "query($id: ID!) { project(fullPath: $id) { name } }".into()),
            ("id".into(), "group/project".into()),
        ])
        .unwrap();
        assert!(query.starts_with("query($id"));
        assert_eq!(variables["id"], "group/project");
    }

    #[test]
    fn graphql_payload_requires_query() {
        assert!(graphql_payload(vec![("id".into(), "1".into())]).is_err());
    }
}
