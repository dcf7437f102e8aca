use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::generator::{GenerationRequest, Generator, Stage};
use super::types::{CreatePipeRequest, CreatePipeResponse, Message, PipeRequest, PipeResponse};
use crate::config::{LangbaseConfig, PipeConfig, RequestConfig};
use crate::error::{LangbaseError, LangbaseResult};

/// Client for interacting with Langbase Pipes API
#[derive(Clone)]
pub struct LangbaseClient {
    client: Client,
    base_url: String,
    api_key: String,
    request_config: RequestConfig,
    pipes: PipeConfig,
}

impl LangbaseClient {
    /// Create a new Langbase client
    pub fn new(
        config: &LangbaseConfig,
        request_config: RequestConfig,
        pipes: PipeConfig,
    ) -> LangbaseResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(LangbaseError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
            pipes,
        })
    }

    /// Pipe name serving the given stage
    pub fn pipe_for(&self, stage: Stage) -> &str {
        match stage {
            Stage::Clarify => &self.pipes.clarify,
            Stage::Summary => &self.pipes.summary,
            Stage::Critique => &self.pipes.critique,
            Stage::ContextUpdate => &self.pipes.context_update,
            Stage::Synthesis => &self.pipes.synthesis,
            Stage::Mitigation => &self.pipes.mitigation,
        }
    }

    /// Call a Langbase pipe with the given request.
    ///
    /// Transient failures (timeouts, transport errors, 429 and 5xx) are
    /// retried up to `max_retries` times with exponential backoff. Anything
    /// else is returned immediately.
    pub async fn call_pipe(&self, request: PipeRequest) -> LangbaseResult<PipeResponse> {
        let url = format!("{}/v1/pipes/run", self.base_url);
        let pipe_name = request.name.clone();

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    pipe = %pipe_name,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying Langbase request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, &request).await {
                Ok(response) => {
                    info!(
                        pipe = %pipe_name,
                        latency_ms = start.elapsed().as_millis(),
                        tokens = ?response.total_tokens(),
                        "Langbase pipe call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    error!(
                        pipe = %pipe_name,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Langbase pipe call failed"
                    );
                    if !is_transient(&e) {
                        return Err(e);
                    }
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(LangbaseError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries: retries.saturating_sub(1),
        })
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        request: &PipeRequest,
    ) -> LangbaseResult<PipeResponse> {
        debug!(
            pipe = %request.name,
            messages = request.messages.len(),
            "Calling Langbase pipe"
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LangbaseError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    LangbaseError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LangbaseError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let pipe_response: PipeResponse =
            response
                .json()
                .await
                .map_err(|e| LangbaseError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        Ok(pipe_response)
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a new pipe
    pub async fn create_pipe(
        &self,
        request: CreatePipeRequest,
    ) -> LangbaseResult<CreatePipeResponse> {
        let url = format!("{}/v1/pipes", self.base_url);

        info!(pipe = %request.name, "Creating Langbase pipe");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(LangbaseError::Http)?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LangbaseError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| LangbaseError::InvalidResponse {
                message: format!("Failed to parse create pipe response: {}", e),
            })
    }

    /// Ensure one pipe per workflow stage exists, creating it if needed
    pub async fn ensure_pipes(&self) -> LangbaseResult<()> {
        for stage in Stage::ALL {
            let pipe_name = self.pipe_for(stage).to_string();
            let request = CreatePipeRequest::new(&pipe_name)
                .with_description(format!("Idea hardener {} stage", stage))
                .with_model(&self.pipes.model)
                .with_upsert(true)
                .with_temperature(stage.temperature())
                .with_max_tokens(4000)
                .with_messages(vec![Message::system(stage.system_prompt())]);

            match self.create_pipe(request).await {
                Ok(_) => info!(pipe = %pipe_name, stage = %stage, "Pipe ready"),
                Err(LangbaseError::Api { status: 409, .. }) => {
                    info!(pipe = %pipe_name, "Pipe already exists");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Generator for LangbaseClient {
    async fn generate(&self, request: GenerationRequest) -> LangbaseResult<String> {
        let pipe_name = self.pipe_for(request.stage);
        debug!(
            stage = %request.stage,
            temperature = request.temperature,
            "Dispatching generation request"
        );

        let pipe_request = PipeRequest::new(
            pipe_name,
            vec![Message::system(request.system), Message::user(request.prompt)],
        )
        .with_temperature(request.temperature);
        let response = self.call_pipe(pipe_request).await?;

        if response.completion.trim().is_empty() {
            return Err(LangbaseError::InvalidResponse {
                message: format!("Empty completion from pipe {}", pipe_name),
            });
        }

        Ok(response.completion)
    }
}

/// Whether a failed call is worth retrying.
fn is_transient(error: &LangbaseError) -> bool {
    match error {
        LangbaseError::Timeout { .. } | LangbaseError::Http(_) => true,
        LangbaseError::Api { status, .. } => *status == 429 || *status >= 500,
        LangbaseError::InvalidResponse { .. } | LangbaseError::Unavailable { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> LangbaseClient {
        let config = LangbaseConfig {
            api_key: "test_key".to_string(),
            base_url: "https://api.langbase.com/".to_string(),
        };
        LangbaseClient::new(&config, RequestConfig::default(), PipeConfig::default())
            .expect("client")
    }

    #[test]
    fn test_client_creation_trims_base_url() {
        assert_eq!(test_client().base_url(), "https://api.langbase.com");
    }

    #[test]
    fn test_pipe_for_stage() {
        let client = test_client();
        assert_eq!(client.pipe_for(Stage::Clarify), "hardener-clarify-v1");
        assert_eq!(client.pipe_for(Stage::Critique), "hardener-critique-v1");
        assert_eq!(
            client.pipe_for(Stage::ContextUpdate),
            "hardener-context-update-v1"
        );
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&LangbaseError::Timeout { timeout_ms: 10 }));
        assert!(is_transient(&LangbaseError::Api {
            status: 503,
            message: String::new()
        }));
        assert!(is_transient(&LangbaseError::Api {
            status: 429,
            message: String::new()
        }));
        assert!(!is_transient(&LangbaseError::Api {
            status: 401,
            message: String::new()
        }));
        assert!(!is_transient(&LangbaseError::InvalidResponse {
            message: String::new()
        }));
    }
}
