//! Same as `generate_image`, without an async runtime.
//!
//! ```sh
//! cargo run --example blocking_generate -- 127.0.0.1 8188 workflow_api.json out.png
//! ```

use comfyui_api::BlockingComfyClient;
use tracing_subscriber::EnvFilter;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 4 {
        eprintln!("usage: blocking_generate <host> <port> <workflow.json> <save_path>");
        std::process::exit(2);
    }

    let port: u16 = args[1].parse()?;
    let workflow: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&args[2])?)?;

    let client = BlockingComfyClient::from_host_port(&args[0], port);
    for path in client.generate_image(&workflow, &args[3])? {
        println!("Saved: {}", path.display());
    }

    Ok(())
}
