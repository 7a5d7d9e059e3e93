use crate::types::{AppError, Result, TaskRequest};
use crate::utils::toml_config::AgentEndpointConfig;
use async_trait::async_trait;

/// Request/response boundary to a remote specialist agent.
///
/// Implementations return the raw response body of a successful exchange.
/// Connection failures and non-2xx statuses are transport errors; judging the
/// body is left to the dispatcher.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn send(&self, endpoint: &AgentEndpointConfig, request: &TaskRequest)
        -> Result<String>;
}

/// HTTP transport posting JSON task requests to `{endpoint}/tasks`.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentTransport for HttpTransport {
    async fn send(
        &self,
        endpoint: &AgentEndpointConfig,
        request: &TaskRequest,
    ) -> Result<String> {
        let url = format!("{}/tasks", endpoint.endpoint.trim_end_matches('/'));

        let mut req = self.client.post(&url).json(request);
        if let Some(token) = endpoint.auth_token() {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Transport(format!(
                "Agent at {} returned status {}",
                url, status
            )));
        }

        Ok(response.text().await?)
    }
}
