//! Print the model catalog and the current settings.
//!
//! Run with: cargo run -p pickup-client --example list_models
//!
//! Set PICKUP_API_TOKEN, or PICKUP_USERNAME and PICKUP_PASSWORD to log in first.

use pickup_client::{ClientConfig, PickupApi, PickupClient};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ClientConfig::from_env()?;
    println!("Connecting to {}...", config.base_url);

    let client = match (env::var("PICKUP_USERNAME"), env::var("PICKUP_PASSWORD")) {
        (Ok(username), Ok(password)) => PickupClient::login(config, &username, &password).await?,
        _ => PickupClient::new(config)?,
    };

    let models = client.models().await?;
    println!("Available models ({}):", models.len());
    for model in &models {
        println!("  {:<45} {} - {}", model.id, model.name, model.description);
    }

    match client.settings().await {
        Ok(settings) => println!("\nPreferred model: {}", settings.preferred_model),
        Err(e) if e.is_not_found() => println!("\nNo settings saved yet, defaults apply"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
