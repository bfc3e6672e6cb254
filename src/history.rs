//! Parsed `/history/{prompt_id}` responses and the download plan derived
//! from them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ComfyError, Result};
use crate::types::ImageRef;

/// Body of `/history/{prompt_id}`.
///
/// Empty until the prompt has finished; afterwards keyed by prompt id.
/// Queued and running prompts look the same. Key order is the server's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationHistory(Map<String, Value>);

impl GenerationHistory {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Prompt ids present in this response.
    pub fn prompt_ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Raw history record for one prompt.
    pub fn record(&self, prompt_id: &str) -> Option<&Value> {
        self.0.get(prompt_id)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Output slots of a finished prompt, in server order.
    pub fn outputs(&self, prompt_id: &str) -> Result<Vec<OutputSlot>> {
        let record = self
            .record(prompt_id)
            .ok_or_else(|| ComfyError::missing(format!("history record for {}", prompt_id)))?;
        let outputs = record
            .get("outputs")
            .and_then(|o| o.as_object())
            .ok_or_else(|| ComfyError::missing(format!("`outputs` in history of {}", prompt_id)))?;

        outputs
            .iter()
            .map(|(id, node_output)| OutputSlot::parse(id, node_output))
            .collect()
    }
}

impl From<Map<String, Value>> for GenerationHistory {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Images produced by one output node.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSlot {
    pub id: String,
    pub images: Vec<ImageRef>,
}

impl OutputSlot {
    fn parse(id: &str, node_output: &Value) -> Result<Self> {
        let images = match node_output.get("images") {
            Some(imgs) => {
                Vec::<ImageRef>::deserialize(imgs).map_err(|e| ComfyError::Decode {
                    context: format!("Malformed images list in output slot {}", id),
                    source: e,
                })?
            }
            None => Vec::new(),
        };
        Ok(Self {
            id: id.to_string(),
            images,
        })
    }
}

/// One image to fetch and where to put it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDownload {
    pub slot: String,
    pub path: PathBuf,
    pub image: ImageRef,
}

/// Decide which images `generate_image` saves.
///
/// One slot goes straight to `save_path`; with several, each slot's id is
/// spliced into the file name (see [`slot_path`]). Only the first image of
/// each slot is used. No slots means nothing to download.
///
/// With several slots, slots that produced no images (text or latent
/// outputs) are skipped. A lone slot without images is a `MissingField`.
pub fn plan_downloads(slots: &[OutputSlot], save_path: &Path) -> Result<Vec<PlannedDownload>> {
    if let [slot] = slots {
        let image = slot
            .images
            .first()
            .cloned()
            .ok_or_else(|| ComfyError::missing(format!("images in output slot {}", slot.id)))?;
        return Ok(vec![PlannedDownload {
            slot: slot.id.clone(),
            path: save_path.to_path_buf(),
            image,
        }]);
    }

    Ok(slots
        .iter()
        .filter_map(|slot| {
            let Some(image) = slot.images.first() else {
                tracing::debug!(slot = %slot.id, "output slot has no images, skipping");
                return None;
            };
            Some(PlannedDownload {
                slot: slot.id.clone(),
                path: slot_path(save_path, &slot.id),
                image: image.clone(),
            })
        })
        .collect())
}

/// Insert `slot` before the last `.` of the file name: `out.png` + `5` →
/// `out5.png`. A file name without a dot gets the slot appended.
pub fn slot_path(save_path: &Path, slot: &str) -> PathBuf {
    let file_name = match save_path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return save_path.join(slot),
    };
    let renamed = match file_name.rfind('.') {
        Some(dot) => format!("{}{}{}", &file_name[..dot], slot, &file_name[dot..]),
        None => format!("{}{}", file_name, slot),
    };
    save_path.with_file_name(renamed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn history(value: Value) -> GenerationHistory {
        serde_json::from_value(value).unwrap()
    }

    fn image(name: &str) -> Value {
        json!({"filename": name, "subfolder": "", "type": "output"})
    }

    #[test]
    fn test_empty_history() {
        let h = history(json!({}));
        assert!(h.is_empty());
        assert_eq!(h.prompt_ids().count(), 0);
    }

    #[test]
    fn test_non_object_history_is_rejected() {
        assert!(serde_json::from_value::<GenerationHistory>(json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_history_response() {
        let h = history(json!({
            "abc123": {
                "status": {"status_str": "success", "completed": true},
                "outputs": {
                    "9": {"images": [image("ComfyUI_00001_.png"), image("ComfyUI_00002_.png")]}
                }
            }
        }));
        assert_eq!(h.prompt_ids().collect::<Vec<_>>(), vec!["abc123"]);

        let slots = h.outputs("abc123").unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].id, "9");
        assert_eq!(slots[0].images.len(), 2);
        assert_eq!(slots[0].images[0].filename, "ComfyUI_00001_.png");
    }

    #[test]
    fn test_outputs_keep_server_order() {
        let h: GenerationHistory = serde_json::from_str(
            r#"{"p": {"outputs": {
                "12": {"images": [{"filename": "x.png", "subfolder": "", "type": "output"}]},
                "3": {"images": [{"filename": "y.png", "subfolder": "", "type": "output"}]}
            }}}"#,
        )
        .unwrap();
        let ids: Vec<String> = h.outputs("p").unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["12", "3"]);
    }

    #[test]
    fn test_missing_record_or_outputs() {
        let h = history(json!({"other": {"outputs": {}}}));
        assert!(matches!(h.outputs("abc"), Err(ComfyError::MissingField(_))));

        let h = history(json!({"abc": {"status": {}}}));
        assert!(matches!(h.outputs("abc"), Err(ComfyError::MissingField(_))));
    }

    #[test]
    fn test_plan_single_slot_uses_save_path() {
        let slots = vec![OutputSlot {
            id: "5".into(),
            images: vec![ImageRef::new("a.png"), ImageRef::new("b.png")],
        }];
        let plan = plan_downloads(&slots, Path::new("out.png")).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].path, PathBuf::from("out.png"));
        assert_eq!(plan[0].image, ImageRef::new("a.png"));
    }

    #[test]
    fn test_plan_multiple_slots() {
        let slots = vec![
            OutputSlot {
                id: "5".into(),
                images: vec![ImageRef::new("a.png")],
            },
            OutputSlot {
                id: "6".into(),
                images: vec![ImageRef::new("b.png")],
            },
        ];
        let plan = plan_downloads(&slots, Path::new("renders/out.png")).unwrap();
        let paths: Vec<PathBuf> = plan.iter().map(|d| d.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("renders/out5.png"),
                PathBuf::from("renders/out6.png")
            ]
        );
        assert_eq!(plan[1].image.filename, "b.png");
    }

    #[test]
    fn test_plan_no_slots() {
        assert!(plan_downloads(&[], Path::new("out.png")).unwrap().is_empty());
    }

    #[test]
    fn test_plan_slot_without_images() {
        let slots = vec![OutputSlot {
            id: "7".into(),
            images: vec![],
        }];
        let err = plan_downloads(&slots, Path::new("out.png")).unwrap_err();
        assert!(matches!(err, ComfyError::MissingField(_)));
    }

    #[test]
    fn test_plan_skips_imageless_slots_among_several() {
        let slots = vec![
            OutputSlot {
                id: "3".into(),
                images: vec![],
            },
            OutputSlot {
                id: "9".into(),
                images: vec![ImageRef::new("a.png")],
            },
        ];
        let plan = plan_downloads(&slots, Path::new("out.png")).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].slot, "9");
        assert_eq!(plan[0].path, PathBuf::from("out9.png"));
    }

    #[test]
    fn test_slot_path() {
        assert_eq!(slot_path(Path::new("out.png"), "5"), PathBuf::from("out5.png"));
        assert_eq!(
            slot_path(Path::new("a.b.png"), "12"),
            PathBuf::from("a.b12.png")
        );
        assert_eq!(
            slot_path(Path::new("dir.v2/out.png"), "5"),
            PathBuf::from("dir.v2/out5.png")
        );
        assert_eq!(slot_path(Path::new("out"), "5"), PathBuf::from("out5"));
    }
}
