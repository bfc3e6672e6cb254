//! Submit a workflow, wait for it and save the result.
//!
//! Requires a running ComfyUI instance at http://127.0.0.1:8188 and a
//! workflow exported with "Save (API Format)".
//!
//! ```sh
//! RUST_LOG=comfyui_api=debug cargo run --example generate_image -- workflow_api.json out.png
//! ```

use comfyui_api::ComfyClient;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let workflow_path = args.next().unwrap_or_else(|| "workflow_api.json".into());
    let save_path = args.next().unwrap_or_else(|| "out.png".into());

    let workflow: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&workflow_path)?)?;

    let client = ComfyClient::new("http://127.0.0.1:8188")
        .with_poll_interval(Duration::from_secs(3))
        .with_max_wait(Duration::from_secs(600));

    let written = client.generate_image(&workflow, &save_path).await?;
    if written.is_empty() {
        eprintln!("Workflow produced no images");
    }
    for path in written {
        println!("Saved: {}", path.display());
    }

    Ok(())
}
