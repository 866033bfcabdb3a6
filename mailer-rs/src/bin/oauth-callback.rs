//! Complete the Gmail authorization and store `token.json`

use clap::Parser;
use mailer_rs::callback::CallbackServer;
use mailer_rs::config::{Config, DEFAULT_CONFIG_PATH};
use mailer_rs::logging;
use mailer_rs::oauth::OAuthFlow;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "oauth-callback", about = "Receive the OAuth2 redirect and save the token")]
struct Args {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Listen address, overrides oauth.callback_addr
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = Config::load_from(&args.config)?;
    logging::init(&config.logging)?;

    let flow = OAuthFlow::from_config(&config.oauth)?;
    if flow.has_token()? {
        info!(
            "A token is already stored at {}; delete it to authorize again",
            config.oauth.token_path
        );
        return Ok(());
    }

    let pending = match flow.pending()? {
        Some(pending) => pending,
        None => flow.begin()?,
    };
    println!(
        "Go to the following link in your browser to authorize access:\n{}",
        pending.auth_url
    );

    let addr = args.addr.unwrap_or_else(|| config.oauth.callback_addr.clone());
    CallbackServer::new(flow, addr).run().await?;

    println!("Token saved to {}", config.oauth.token_path);
    Ok(())
}
