//! HTTP implementation of `RemoteStore` against the builder REST API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use pagesmith_api::{
    ApiError, Page, RemoteStore, WidgetDefinition, WidgetInstance, WidgetUpdate,
};

use crate::config::RemoteConfig;
use crate::models::CreateWidgetDto;

pub struct BuilderClient {
    base_url: String,
    default_headers: HeaderMap,
    client: reqwest::Client,
}

impl BuilderClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(credential) = &config.credential {
            let value = HeaderValue::from_str(&format!("Basic {}", credential)).map_err(|_| {
                ApiError::InvalidOperation {
                    message: "credential contains characters not valid in a header".to_string(),
                }
            })?;
            headers.insert("Authorization", value);
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::InternalError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_headers: headers,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Produce a usable message out of the opaque reqwest error categories
    fn format_reqwest_error(e: reqwest::Error, url: &str, operation: &str) -> String {
        if e.is_timeout() {
            format!("Failed to {} for {}: timeout - request took too long", operation, url)
        } else if e.is_connect() {
            format!(
                "Failed to {} for {}: connection error - check network connectivity. Error: {}",
                operation, url, e
            )
        } else if e.is_decode() {
            format!(
                "Failed to {} for {}: decode error - unexpected response format. Error: {}",
                operation, url, e
            )
        } else {
            format!("Failed to {} for {}: {}", operation, url, e)
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        operation: &str,
    ) -> Result<reqwest::Response, ApiError> {
        request
            .headers(self.default_headers.clone())
            .send()
            .await
            .map_err(|e| {
                let message = Self::format_reqwest_error(e, url, operation);
                error!("[BuilderClient] {}", message);
                ApiError::NetworkError { message }
            })
    }

    /// Check the status and read the body; `not_found` maps a 404 to the
    /// operation's domain error.
    async fn handle_response(
        response: reqwest::Response,
        url: &str,
        not_found: impl FnOnce() -> ApiError,
    ) -> Result<String, ApiError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(not_found());
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkError {
                message: format!("Failed to read response body from {}: {}", url, e),
            })?;

        if !status.is_success() {
            let message = format!(
                "HTTP {} error from {}: {}",
                status.as_u16(),
                url,
                truncate_body(&body)
            );
            error!("[BuilderClient] {}", message);
            return Err(ApiError::NetworkError { message });
        }

        Ok(body)
    }

    fn parse<T: DeserializeOwned>(body: &str, url: &str) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|e| {
            let message = format!(
                "Failed to parse response from {}: {} - body (first 500): {}",
                url,
                e,
                &body.chars().take(500).collect::<String>()
            );
            error!("[BuilderClient] {}", message);
            ApiError::NetworkError { message }
        })
    }
}

/// Error bodies can be arbitrarily large HTML pages; keep logged messages
/// bounded. Counts chars, not bytes, so multi-byte content never splits.
fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 500;
    if body.chars().count() > LIMIT {
        format!(
            "{}... (truncated)",
            body.chars().take(LIMIT).collect::<String>()
        )
    } else {
        body.to_string()
    }
}

#[async_trait]
impl RemoteStore for BuilderClient {
    async fn fetch_widgets(&self, page_id: &str) -> Result<Vec<WidgetInstance>, ApiError> {
        let url = self.url(&format!("/Widgets/page/{}", page_id));
        debug!("[BuilderClient] Fetching widgets: page_id={}", page_id);

        let response = self
            .send(self.client.get(&url), &url, "fetch widgets")
            .await?;
        let body = Self::handle_response(response, &url, || ApiError::PageNotFound {
            page_id: page_id.to_string(),
        })
        .await?;

        let widgets: Vec<WidgetInstance> = Self::parse(&body, &url)?;
        info!(
            "[BuilderClient] Fetched widgets: page_id={}, count={}",
            page_id,
            widgets.len()
        );
        Ok(widgets)
    }

    async fn create_widget(&self, widget: &WidgetInstance) -> Result<WidgetInstance, ApiError> {
        let url = self.url("/Widgets");
        debug!(
            "[BuilderClient] Creating widget: id={}, type={}",
            widget.id, widget.widget_type
        );

        let dto = CreateWidgetDto::from(widget);
        let response = self
            .send(self.client.post(&url).json(&dto), &url, "create widget")
            .await?;
        let body = Self::handle_response(response, &url, || ApiError::PageNotFound {
            page_id: widget.page_id.clone(),
        })
        .await?;

        let created: WidgetInstance = Self::parse(&body, &url)?;
        debug!(
            "[BuilderClient] Widget created: client_id={}, server_id={}",
            widget.id, created.id
        );
        Ok(created)
    }

    async fn update_widget(&self, id: &str, fields: &WidgetUpdate) -> Result<(), ApiError> {
        let url = self.url(&format!("/Widgets/{}", id));
        debug!("[BuilderClient] Updating widget: id={}", id);

        let response = self
            .send(self.client.put(&url).json(fields), &url, "update widget")
            .await?;
        Self::handle_response(response, &url, || ApiError::WidgetNotFound {
            id: id.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn delete_widget(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/Widgets/{}", id));
        debug!("[BuilderClient] Deleting widget: id={}", id);

        let response = self
            .send(self.client.delete(&url), &url, "delete widget")
            .await?;
        Self::handle_response(response, &url, || ApiError::WidgetNotFound {
            id: id.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn fetch_widget_definition(
        &self,
        widget_type: &str,
    ) -> Result<WidgetDefinition, ApiError> {
        let url = self.url(&format!("/WidgetDefinitions/type/{}", widget_type));
        debug!("[BuilderClient] Fetching definition: type={}", widget_type);

        let response = self
            .send(self.client.get(&url), &url, "fetch widget definition")
            .await?;
        let body = Self::handle_response(response, &url, || ApiError::DefinitionNotFound {
            widget_type: widget_type.to_string(),
        })
        .await?;
        Self::parse(&body, &url)
    }

    async fn fetch_widget_definitions(&self) -> Result<Vec<WidgetDefinition>, ApiError> {
        let url = self.url("/WidgetDefinitions");
        debug!("[BuilderClient] Fetching widget definition catalog");

        let response = self
            .send(self.client.get(&url), &url, "fetch widget definitions")
            .await?;
        let body = Self::handle_response(response, &url, || ApiError::NetworkError {
            message: format!("HTTP 404 error from {}", url),
        })
        .await?;
        Self::parse(&body, &url)
    }

    async fn fetch_pages(&self, app_instance_id: &str) -> Result<Vec<Page>, ApiError> {
        let url = self.url(&format!("/Pages/App/{}", app_instance_id));
        debug!("[BuilderClient] Fetching pages: app={}", app_instance_id);

        let response = self
            .send(self.client.get(&url), &url, "fetch pages")
            .await?;
        let body = Self::handle_response(response, &url, || ApiError::NetworkError {
            message: format!("HTTP 404 error from {}", url),
        })
        .await?;
        Self::parse(&body, &url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_with_credential() {
        let config = RemoteConfig::new("http://localhost:5000/api/").with_credential("dXNlcjpwYXNz");
        let client = BuilderClient::new(&config).unwrap();
        assert_eq!(
            client.default_headers.get("Authorization").unwrap(),
            "Basic dXNlcjpwYXNz"
        );
        // Trailing slash is normalized away
        assert_eq!(client.url("/Widgets"), "http://localhost:5000/api/Widgets");
    }

    #[test]
    fn test_client_creation_without_credential() {
        let config = RemoteConfig::new("http://localhost:5000/api");
        let client = BuilderClient::new(&config).unwrap();
        assert!(client.default_headers.get("Authorization").is_none());
    }

    #[test]
    fn test_error_body_truncation_keeps_char_boundaries() {
        // Two-byte chars put byte 500 inside a char; truncation must not
        // split it
        let body = "é".repeat(600);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("... (truncated)"));
        assert_eq!(truncated.chars().filter(|c| *c == 'é').count(), 500);

        let short = "plain body";
        assert_eq!(truncate_body(short), short);
    }
}
