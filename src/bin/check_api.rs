#![forbid(unsafe_code)]

//! Verifies that a YouTube Data API key is accepted, optionally saving it to
//! the `.env` file used by `export_channel`.

use anyhow::{Result, bail};
use channel_exporter::YouTubeClient;
use channel_exporter::config::{API_KEY_VAR, DEFAULT_ENV_PATH, resolve_api_key, upsert_env_value};
use channel_exporter::pipeline::{check_connection, explain_connection_error};
use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "check_api")]
#[command(about = "Test a YouTube Data API key with a single cheap request")]
struct Cli {
    /// YouTube Data API key (defaults to YOUTUBE_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Alternate .env file
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Store the key in the .env file after a successful check
    #[arg(long)]
    save_key: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let env_path = cli
        .env_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_PATH));
    let api_key = resolve_api_key(cli.api_key.clone(), Some(env_path.as_path()))?;

    info!("testing API connection");
    let client = YouTubeClient::new(api_key.clone());
    if let Err(err) = check_connection(&client) {
        bail!("API connection failed: {}", explain_connection_error(&err));
    }
    println!("API connection successful!");

    if cli.save_key {
        upsert_env_value(&env_path, API_KEY_VAR, &api_key)?;
        println!("Saved {API_KEY_VAR} to {}", env_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "check_api",
            "--api-key",
            "secret",
            "--env-file",
            "conf/.env",
            "--save-key",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("secret"));
        assert_eq!(cli.env_file, Some(PathBuf::from("conf/.env")));
        assert!(cli.save_key);
    }

    #[test]
    fn cli_flags_are_optional() {
        let cli = Cli::try_parse_from(["check_api"]).unwrap();
        assert!(cli.api_key.is_none());
        assert!(!cli.save_key);
    }
}
