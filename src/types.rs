use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ComfyError, Result};

/// A workflow in ComfyUI's API format (node id → node definition).
///
/// The client treats it as an opaque document and never inspects it.
pub type Workflow = Value;

/// Server-assigned identifier of a queued workflow.
pub type PromptId = String;

/// Reference to an image stored in ComfyUI's output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_img_type")]
    pub img_type: String,
}

fn default_img_type() -> String {
    "output".to_string()
}

impl ImageRef {
    /// An image in the top-level `output` folder.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            subfolder: String::new(),
            img_type: default_img_type(),
        }
    }

    pub fn subfolder(mut self, subfolder: impl Into<String>) -> Self {
        self.subfolder = subfolder.into();
        self
    }

    pub fn img_type(mut self, img_type: impl Into<String>) -> Self {
        self.img_type = img_type.into();
        self
    }
}

/// Body POSTed to `/prompt`.
#[derive(Debug, Serialize)]
pub(crate) struct PromptEnvelope<'a> {
    pub prompt: &'a Workflow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<&'a str>,
}

/// Pull the `prompt_id` out of a `/prompt` response.
pub fn prompt_id_from(response: &Value) -> Result<PromptId> {
    response
        .get("prompt_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ComfyError::missing("`prompt_id` in /prompt response"))
}
