use clap::error::ErrorKind;
use mailer_rs::cli::{self, EXIT_USAGE, USAGE};
use mailer_rs::config::{Config, EmailEnv};
use mailer_rs::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // EMAIL_* and MAILER__* may come from a .env file; real variables win
    dotenvy::dotenv().ok();

    let cli = match cli::parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("{}", e.render());
            eprintln!("{}", USAGE);
            std::process::exit(EXIT_USAGE);
        }
    };

    // Load configuration
    let config = Config::load_from(&cli.config)?;
    logging::init(&config.logging)?;

    info!("Starting mailer-rs v{}", env!("CARGO_PKG_VERSION"));

    let email_env = EmailEnv::from_env()?;

    if let Err(e) = cli::run(cli.method, &config, &email_env).await {
        error!("Unable to send email using {}: {}", cli.method, e);
        return Err(e.into());
    }

    Ok(())
}
