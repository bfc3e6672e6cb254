//! URLs for the three ComfyUI endpoints the client talks to.

use reqwest::Url;

use crate::error::{ComfyError, Result};
use crate::types::ImageRef;

pub(crate) fn prompt(base: &str) -> String {
    format!("{}/prompt", base)
}

pub(crate) fn history(base: &str, prompt_id: &str) -> String {
    format!("{}/history/{}", base, prompt_id)
}

/// `/view` with the image's filename, subfolder and type as query parameters.
pub(crate) fn view(base: &str, img: &ImageRef) -> Result<Url> {
    Url::parse_with_params(
        &format!("{}/view", base),
        &[
            ("filename", img.filename.as_str()),
            ("subfolder", img.subfolder.as_str()),
            ("type", img.img_type.as_str()),
        ],
    )
    .map_err(|e| ComfyError::InvalidUrl(format!("Bad image URL for {}: {}", img.filename, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://127.0.0.1:8188";

    #[test]
    fn test_prompt_and_history_paths() {
        assert_eq!(prompt(BASE), "http://127.0.0.1:8188/prompt");
        assert_eq!(
            history(BASE, "abc-123"),
            "http://127.0.0.1:8188/history/abc-123"
        );
    }

    #[test]
    fn test_view_query() {
        let url = view(BASE, &ImageRef::new("a.png")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8188/view?filename=a.png&subfolder=&type=output"
        );
    }

    #[test]
    fn test_view_query_is_encoded() {
        let img = ImageRef::new("my image.png").subfolder("a&b");
        let url = view(BASE, &img).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("filename".into(), "my image.png".into()));
        assert_eq!(pairs[1], ("subfolder".into(), "a&b".into()));
    }

    #[test]
    fn test_view_rejects_bad_base() {
        let err = view("not a url", &ImageRef::new("a.png")).unwrap_err();
        assert!(matches!(err, ComfyError::InvalidUrl(_)));
    }
}
