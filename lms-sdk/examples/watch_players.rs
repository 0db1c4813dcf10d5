//! Print every player and then follow their changes
//!
//! ```text
//! LMS_HOST=192.168.1.10 LMS_LOG_MODE=development cargo run -p lms-sdk --example watch_players
//! ```

use lms_sdk::{ClientConfig, LmsClient, StateChange};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lms_sdk::init_logging_from_env()?;

    let config = ClientConfig::from_env()?;
    println!("Connecting to {}", config.address());

    let client = LmsClient::connect(config).await?;
    let mut changes = client.subscribe();

    for player in client.wait_for_discovery().await? {
        println!(
            "{:>2}  {}  {:<20}  mode={:<6} volume={}",
            player.index(),
            player.id(),
            player.name().unwrap_or("(unnamed)"),
            player.mode(),
            player.volume()
        );
    }

    loop {
        tokio::select! {
            change = changes.recv() => match change {
                Ok(StateChange::PropertyChanged { player_id, property }) => {
                    let noise = client.player(&player_id).map(|p| p.noise_level()).unwrap_or(0);
                    println!("{} {:?} (noise level {})", player_id, property, noise);
                }
                Ok(StateChange::PlayerEvent { player_id, name, args }) => {
                    println!("{} event {} {:?}", player_id, name, args);
                }
                Ok(StateChange::ConnectionLost { reason }) => {
                    println!("Connection lost: {}", reason);
                    break;
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    println!("Missed {} changes", missed);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.shutdown();
    Ok(())
}
