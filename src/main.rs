use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::debug;

mod artifact;
mod config;
mod env;
mod error;
mod installer;
mod networking;
mod prompt;
mod updater;
mod util;

use artifact::ArtifactPattern;
use config::ConfigStore;
use error::Result;
use networking::{DEFAULT_API_BASE, HttpTransport, PaperApi};
use prompt::{Answer, Console};
use updater::Updater;

#[derive(Parser, Debug)]
#[command(
    name = "Paper Updater",
    author,
    version,
    about = "Keeps a Paper server on the newest build of its tracked version"
)]
struct Cli {
    /// Install a newer build without asking first.
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Open the configuration menu instead of checking for updates.
    #[arg(short = 'c', long = "configure", visible_aliases = ["conf", "config"])]
    configure: bool,

    /// Base URL of the Paper build API.
    #[arg(long, env = "PAPER_UPDATER_API", default_value = DEFAULT_API_BASE)]
    api_url: String,

    /// Configuration file (defaults to one next to the executable).
    #[arg(long)]
    config_file: Option<PathBuf>,

    /// Directory holding the server builds (defaults to the executable's parent folder).
    #[arg(long)]
    server_dir: Option<PathBuf>,

    /// Log what the updater is doing.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let paths = env::Paths::resolve(cli.config_file, cli.server_dir);
    debug!("paths: {paths:?}");

    let api = PaperApi::new(HttpTransport::new()?, cli.api_url);
    let mut console = Console::stdio();
    let store = ConfigStore::new(&paths.config_file);

    let mut config = match store
        .load_or_create(&mut console, &api, &paths.default_script())
        .await?
    {
        Answer::Value(config) => config,
        Answer::Cancelled => return console.clear(),
    };

    if cli.configure {
        if config::edit_interactive(&mut console, &api, &mut config).await? {
            store.save(&config)?;
        }
        return console.clear();
    }

    let updater = Updater::new(api, ArtifactPattern::paper(), paths.server_dir);
    updater.run(&config, &mut console, !cli.yes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_configure_spelling() {
        for flag in ["-c", "--conf", "--config", "--configure"] {
            let cli = Cli::try_parse_from(["paper-updater", flag]).unwrap();
            assert!(cli.configure, "{flag}");
            assert!(!cli.yes);
        }
    }

    #[test]
    fn yes_skips_confirmation() {
        let cli = Cli::try_parse_from(["paper-updater", "-y"]).unwrap();
        assert!(cli.yes);
        assert!(!cli.configure);
    }

    #[test]
    fn api_url_can_be_overridden() {
        let cli = Cli::try_parse_from(["paper-updater", "--api-url", "http://localhost:9000/paper"])
            .unwrap();
        assert_eq!(cli.api_url, "http://localhost:9000/paper");
        assert!(cli.config_file.is_none());
        assert!(cli.server_dir.is_none());
    }

    #[test]
    fn unknown_arguments_are_rejected() {
        let err = Cli::try_parse_from(["paper-updater", "--frobnicate", "-y"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
        assert_eq!(err.exit_code(), 2);
    }
}
