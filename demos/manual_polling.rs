//! Drive the submit / poll / download steps by hand, printing every
//! output image instead of only the first one per node.
//!
//! ```sh
//! cargo run --example manual_polling -- workflow_api.json
//! ```

use comfyui_api::{ComfyClient, ComfyError};
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let workflow_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "workflow_api.json".into());
    let workflow: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&workflow_path)?)?;

    // Ctrl-C stops the wait loop instead of killing the process mid-download
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::Relaxed);
        }
    });

    let client = ComfyClient::new("http://127.0.0.1:8188")
        .with_poll_interval(Duration::from_secs(1))
        .with_cancellation(cancel);

    let response = client.submit(&workflow).await?;
    println!("Server response: {}", response);
    let prompt_id = comfyui_api::prompt_id_from(&response)?;

    let history = match client.wait_for_history(&prompt_id).await {
        Ok(history) => history,
        Err(ComfyError::Cancelled { .. }) => {
            eprintln!("Stopped waiting for {}", prompt_id);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for slot in history.outputs(&prompt_id)? {
        for (idx, img) in slot.images.iter().enumerate() {
            let dest = format!("{}_{}_{}", slot.id, idx, img.filename);
            client.download_image(&dest, img).await?;
            println!("Node {} -> {}", slot.id, dest);
        }
    }

    Ok(())
}
