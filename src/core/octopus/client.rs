//! HTTP client for the destination server's REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::VariableApi;
use crate::core::config::DestinationConfig;
use crate::core::constants::API_KEY_HEADER;
use crate::core::domain::{LibraryVariableSet, Variable, VariableSet};
use crate::error::{PublishError, Result};

/// Longest response body kept in an error message.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(rename = "Items", default = "Vec::new")]
    items: Vec<T>,
}

/// REST client bound to one space.
pub struct OctopusClient {
    http: Client,
    base: String,
    api_key: String,
}

impl OctopusClient {
    /// Build a client for `settings.server` and `settings.space`.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Request` if the HTTP client cannot be built.
    pub fn new(settings: &DestinationConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| PublishError::Request {
                path: settings.server.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base: format!(
                "{}/api/{}",
                settings.server.trim_end_matches('/'),
                settings.space
            ),
            api_key: api_key.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        trace!(%method, path, "destination request");
        self.http
            .request(method, format!("{}/{}", self.base, path))
            .header(API_KEY_HEADER, &self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| PublishError::Request {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, ERROR_BODY_LIMIT));
            return Err(PublishError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        response.json::<T>().await.map_err(|e| {
            PublishError::Decode {
                path: path.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(path, self.request(Method::GET, path)).await
    }

    async fn write<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.send(path, self.request(method, path).json(body)).await
    }

    async fn put_variable_set(&self, set: &VariableSet) -> Result<VariableSet> {
        let path = format!("variables/{}", set.id);
        self.write(Method::PUT, &path, set).await
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[async_trait]
impl VariableApi for OctopusClient {
    async fn find_library_variable_set(&self, name: &str) -> Result<Option<LibraryVariableSet>> {
        let path = "libraryvariablesets";
        let page: Page<LibraryVariableSet> = self
            .send(
                path,
                self.request(Method::GET, path)
                    .query(&[("partialName", name)]),
            )
            .await?;
        Ok(page.items.into_iter().find(|set| set.name == name))
    }

    async fn create_library_variable_set(&self, name: &str) -> Result<LibraryVariableSet> {
        debug!(name, "creating library variable set");
        self.write(
            Method::POST,
            "libraryvariablesets",
            &LibraryVariableSet::new(name),
        )
        .await
    }

    async fn library_variable_sets(&self) -> Result<Vec<LibraryVariableSet>> {
        self.get("libraryvariablesets/all").await
    }

    async fn variable_set(&self, id: &str) -> Result<VariableSet> {
        self.get(&format!("variables/{}", id)).await
    }

    async fn add_variable(&self, set_id: &str, variable: &Variable) -> Result<VariableSet> {
        let mut set = self.variable_set(set_id).await?;
        let mut variable = variable.clone();
        variable.id = None;
        set.variables.push(variable);
        self.put_variable_set(&set).await
    }

    async fn update_variable(&self, set_id: &str, variable: &Variable) -> Result<VariableSet> {
        let id = variable.id.as_deref().ok_or_else(|| PublishError::MissingId {
            set: set_id.to_string(),
            name: variable.name.clone(),
        })?;

        let mut set = self.variable_set(set_id).await?;
        let slot = set
            .variables
            .iter_mut()
            .find(|v| v.id.as_deref() == Some(id))
            .ok_or_else(|| PublishError::VariableNotFound {
                set: set_id.to_string(),
                id: id.to_string(),
            })?;
        *slot = variable.clone();
        self.put_variable_set(&set).await
    }

    async fn delete_variable(&self, set_id: &str, variable_id: &str) -> Result<VariableSet> {
        let mut set = self.variable_set(set_id).await?;
        let before = set.variables.len();
        set.variables.retain(|v| v.id.as_deref() != Some(variable_id));
        if set.variables.len() == before {
            return Err(PublishError::VariableNotFound {
                set: set_id.to_string(),
                id: variable_id.to_string(),
            }
            .into());
        }
        self.put_variable_set(&set).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_includes_space() {
        let settings = DestinationConfig {
            server: "https://octopus.example.com/".to_string(),
            space: "Spaces-2".to_string(),
            request_timeout_secs: 5,
        };
        let client = OctopusClient::new(&settings, "API-KEY").unwrap();
        assert_eq!(client.base, "https://octopus.example.com/api/Spaces-2");
    }

    #[test]
    fn test_floor_char_boundary() {
        assert_eq!(floor_char_boundary("abc", 10), 3);
        assert_eq!(floor_char_boundary("abcdef", 4), 4);
        // 'é' is two bytes starting at index 1
        assert_eq!(floor_char_boundary("aéb", 2), 1);
    }
}
