//! REST API server example
//!
//! Runs sheet-image-dl with its REST API, configured from the environment
//! (and `.env`). `CMS_ACCESS_TOKEN` is required.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:5000/swagger-ui
//! - Upload a sheet via POST http://localhost:5000/upload
//! - Retrieve files via POST http://localhost:5000/download-images
//! - Stream files via POST http://localhost:5000/download-images-stream
//!
//! ```bash
//! RUST_LOG=sheet_image_dl=debug,tower_http=info \
//!   cargo run --example rest_api_server
//! ```

use sheet_image_dl::{Config, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sheet_image_dl=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    // Fail fast instead of reporting a missing token on every fetch
    config.require_access_token()?;

    let address = config.server.api.bind_address;
    println!("Starting sheet-image-dl REST API server");
    println!("Swagger UI: http://{address}/swagger-ui");
    println!();
    println!("Example commands:");
    println!("  # Upload a sheet and list its columns");
    println!("  curl -F file=@contacts.csv http://{address}/upload");
    println!();
    println!("  # Write every file of the Image column to ./out/Image/");
    println!("  curl -X POST http://{address}/download-images \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!(
        "    -d '{{\"filename\": \"contacts.csv\", \"columns\": [\"Image\"], \"downloadPath\": \"out\"}}'"
    );
    println!();
    println!("  # Stream files as server-sent events");
    println!("  curl -N -F file=@contacts.csv -F 'columns=[\"Image\"]' \\");
    println!("    http://{address}/download-images-stream");

    run_with_shutdown(config).await?;
    Ok(())
}
