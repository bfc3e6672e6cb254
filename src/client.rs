use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{normalize, ClientConfig};
use crate::error::{ComfyError, Result};
use crate::history::{plan_downloads, GenerationHistory};
use crate::routes;
use crate::types::{prompt_id_from, ImageRef, PromptEnvelope, PromptId, Workflow};
use crate::wait::PollWait;

/// Async client for a ComfyUI server instance.
///
/// Submits workflows, polls `/history` and downloads outputs. The
/// underlying `reqwest::Client` can be shared with the rest of your
/// application via [`ComfyClient::with_http_client`]; it is never closed
/// by this crate.
///
/// # Example
/// ```no_run
/// use comfyui_api::ComfyClient;
///
/// # async fn example(workflow: serde_json::Value) -> comfyui_api::Result<()> {
/// let client = ComfyClient::new("http://127.0.0.1:8188");
/// let written = client.generate_image(&workflow, "out.png").await?;
/// println!("saved {:?}", written);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ComfyClient {
    http: Client,
    config: ClientConfig,
    cancellation: Option<Arc<AtomicBool>>,
}

impl ComfyClient {
    /// Create a new client pointing at the given ComfyUI endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(endpoint))
    }

    /// Create a client for `http://{host}:{port}`.
    pub fn from_host_port(host: &str, port: u16) -> Self {
        Self::from_config(ClientConfig::builder().with_host_port(host, port).build())
    }

    /// Create a client from a full [`ClientConfig`].
    pub fn from_config(mut config: ClientConfig) -> Self {
        config.base_url = normalize(config.base_url);
        Self {
            http: Client::new(),
            config,
            cancellation: None,
        }
    }

    /// Use an existing `reqwest::Client` (shared session, proxies, pooling).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Set the delay between history polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Give up waiting for a prompt after `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.config.max_wait = Some(max_wait);
        self
    }

    /// Apply a timeout to every HTTP request made by this client.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Set the client ID sent alongside submitted prompts.
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = Some(id.into());
        self
    }

    /// Abort history polling once `flag` is set to `true`.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.config.base_url
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ── Transport ───────────────────────────────────────────────────

    fn with_timeout(&self, req: RequestBuilder) -> RequestBuilder {
        match self.config.request_timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder, context: &str) -> Result<Response> {
        let resp = self
            .with_timeout(req)
            .send()
            .await
            .map_err(|e| ComfyError::Network {
                context: format!("{} ({})", context, self.config.base_url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ComfyError::Http { status, body });
        }
        Ok(resp)
    }

    async fn call_api<T: DeserializeOwned>(&self, req: RequestBuilder, context: &str) -> Result<T> {
        let bytes = self
            .send(req, context)
            .await?
            .bytes()
            .await
            .map_err(|e| ComfyError::Network {
                context: format!("{}: failed to read body", context),
                source: e,
            })?;
        serde_json::from_slice(&bytes).map_err(|e| ComfyError::Decode {
            context: format!("{}: invalid JSON", context),
            source: e,
        })
    }

    // ── Prompt ──────────────────────────────────────────────────────

    /// Queue a workflow. Returns the decoded `/prompt` response as-is.
    pub async fn submit(&self, workflow: &Workflow) -> Result<Value> {
        let url = routes::prompt(&self.config.base_url);
        let body = PromptEnvelope {
            prompt: workflow,
            client_id: self.config.client_id.as_deref(),
        };
        tracing::debug!(%url, "submitting workflow");
        self.call_api(self.http.post(&url).json(&body), "Failed to submit prompt to ComfyUI")
            .await
    }

    /// Queue a workflow and return its `prompt_id`.
    pub async fn queue_prompt(&self, workflow: &Workflow) -> Result<PromptId> {
        let prompt_id = prompt_id_from(&self.submit(workflow).await?)?;
        tracing::info!(%prompt_id, "prompt queued");
        Ok(prompt_id)
    }

    // ── History ─────────────────────────────────────────────────────

    /// Fetch `/history/{prompt_id}`. Empty until the prompt has finished.
    pub async fn poll_status(&self, prompt_id: &str) -> Result<GenerationHistory> {
        let url = routes::history(&self.config.base_url, prompt_id);
        tracing::debug!(%url, "polling history");
        self.call_api(self.http.get(&url), "Failed to fetch ComfyUI history")
            .await
    }

    /// Sleep and poll until the history for `prompt_id` is non-empty.
    pub async fn wait_for_history(&self, prompt_id: &str) -> Result<GenerationHistory> {
        let mut wait = PollWait::new(
            prompt_id,
            self.config.poll_interval,
            self.config.max_wait,
            self.cancellation.as_deref(),
        );
        loop {
            tokio::time::sleep(wait.next_delay()?).await;
            wait.check_cancelled()?;
            let history = self.poll_status(prompt_id).await?;
            wait.record_poll();
            if !history.is_empty() {
                tracing::info!(%prompt_id, polls = wait.attempts(), "generation finished");
                return Ok(history);
            }
        }
    }

    // ── Image download ──────────────────────────────────────────────

    /// Download an output image by its reference. Returns raw bytes.
    pub async fn image(&self, img: &ImageRef) -> Result<Vec<u8>> {
        let url = routes::view(&self.config.base_url, img)?;
        tracing::debug!(%url, "downloading image");
        let context = format!("Failed to fetch image {} from ComfyUI", img.filename);
        let bytes = self
            .send(self.http.get(url), &context)
            .await?
            .bytes()
            .await
            .map_err(|e| ComfyError::Network {
                context: "Failed to read image bytes".into(),
                source: e,
            })?;
        Ok(bytes.to_vec())
    }

    /// Download an image and write it to `dest`, replacing any existing file.
    pub async fn download_image(&self, dest: impl AsRef<Path>, img: &ImageRef) -> Result<()> {
        let dest = dest.as_ref();
        let bytes = self.image(img).await?;
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| ComfyError::Io {
                path: dest.to_path_buf(),
                source: e,
            })
    }

    // ── Generate and save ───────────────────────────────────────────

    /// Submit `workflow`, wait for it to finish and save its images.
    ///
    /// With a single output node the image lands at `save_path`; with
    /// several, the node id is inserted before the extension
    /// (`out.png` → `out9.png`). Returns the paths written, which is empty
    /// when the workflow produced no outputs.
    pub async fn generate_image(
        &self,
        workflow: &Workflow,
        save_path: impl AsRef<Path>,
    ) -> Result<Vec<PathBuf>> {
        let prompt_id = self.queue_prompt(workflow).await?;
        let history = self.wait_for_history(&prompt_id).await?;

        let slots = history.outputs(&prompt_id)?;
        if slots.is_empty() {
            tracing::warn!(%prompt_id, "generation finished without outputs, nothing to save");
        }

        let mut written = Vec::new();
        for planned in plan_downloads(&slots, save_path.as_ref())? {
            self.download_image(&planned.path, &planned.image).await?;
            tracing::debug!(slot = %planned.slot, path = %planned.path.display(), "image saved");
            written.push(planned.path);
        }
        Ok(written)
    }
}
