//! # comfyui-api
//!
//! Rust client for [ComfyUI](https://github.com/comfyanonymous/ComfyUI),
//! the node-based Stable Diffusion GUI/backend.
//!
//! Submits API-format workflows, polls `/history` until they finish and
//! downloads the produced images. [`ComfyClient`] is async (tokio);
//! [`BlockingComfyClient`] (feature `blocking`, on by default) does the same
//! on the calling thread.
//!
//! ## Quick Start
//!
//! ```no_run
//! use comfyui_api::ComfyClient;
//! use std::time::Duration;
//!
//! # async fn example() -> comfyui_api::Result<()> {
//! let workflow: serde_json::Value =
//!     serde_json::from_str(&std::fs::read_to_string("workflow_api.json").unwrap()).unwrap();
//!
//! let client = ComfyClient::new("http://127.0.0.1:8188")
//!     .with_poll_interval(Duration::from_secs(1))
//!     .with_max_wait(Duration::from_secs(300));
//!
//! // One call: submit, wait, save
//! client.generate_image(&workflow, "sunset.png").await?;
//!
//! // Or step by step
//! let prompt_id = client.queue_prompt(&workflow).await?;
//! let history = client.wait_for_history(&prompt_id).await?;
//! for slot in history.outputs(&prompt_id)? {
//!     for img in &slot.images {
//!         client.download_image(&img.filename, img).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "blocking")]
pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
mod routes;
pub mod types;
mod wait;

#[cfg(feature = "blocking")]
pub use blocking::BlockingComfyClient;
pub use client::ComfyClient;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL, DEFAULT_POLL_INTERVAL};
pub use error::{ComfyError, Result};
pub use history::{plan_downloads, slot_path, GenerationHistory, OutputSlot, PlannedDownload};
pub use types::{prompt_id_from, ImageRef, PromptId, Workflow};
