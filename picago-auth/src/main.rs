use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use picago_auth::{PicasaClient, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so the consent prompt on stdout stays readable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();

    let settings = Settings::new().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("\nPlease create a config.toml file with the following content:");
        eprintln!("\nclient_id = \"YOUR_CLIENT_ID\"");
        eprintln!("client_secret = \"YOUR_CLIENT_SECRET\"");
        eprintln!("# online = true  # re-prompt instead of keeping a refresh token");
        e
    })?;
    tracing::info!("Configuration loaded successfully");

    let client = PicasaClient::from_settings(&settings)?;
    let token = client.token().await?;

    println!("✓ Authentication successful");
    match token.expires_at {
        Some(expires_at) => println!("Access token valid until {}", expires_at),
        None => println!("Access token has no expiry"),
    }

    Ok(())
}
