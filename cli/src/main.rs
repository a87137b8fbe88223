mod render;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use clicker::config::{DEFAULT_API_URL, DEFAULT_IDENTITY_PATH};
use clicker::{
    ClientConfig, ConfigError, FileIdentityStore, IdentityError, IdentityStore, Input, RegisterError,
    ServerError, SessionClient, SnapshotError,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("registration failed: {0}")]
    Register(#[from] RegisterError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("request failed: {0}")]
    Server(#[from] ServerError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("stdin read failed: {0}")]
    Io(#[from] io::Error),
    #[error("no player registered; run `clicker-cli register <name>` first")]
    NotRegistered,
}

#[derive(Parser, Debug)]
#[command(name = "clicker-cli", about = "Terminal client for the clicker game")]
struct Cli {
    #[arg(long, env = "CLICKER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, env = "CLICKER_IDENTITY_PATH", default_value = DEFAULT_IDENTITY_PATH)]
    identity_path: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Claim a nickname and remember it on this machine.
    Register { username: String },
    /// Play interactively: `c` click, `f` feed, `t` toggle leaderboard, `q` quit.
    Play,
    /// Print the current leaderboard.
    Leaderboard,
    /// Show the remembered nickname and its score.
    Whoami,
    /// Forget the remembered nickname.
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?
        .with_api_url(&cli.api_url)?
        .with_identity_path(cli.identity_path);
    tracing::debug!(api_url = %config.api_url, identity_path = %config.identity_path.display(), "config loaded");
    let store: Arc<dyn IdentityStore> = Arc::new(FileIdentityStore::new(config.identity_path.clone()));

    match cli.command {
        Command::Register { username } => run_register(config, store, &username).await,
        Command::Play => run_play(config, store).await,
        Command::Leaderboard => run_leaderboard(config, store).await,
        Command::Whoami => run_whoami(config, store).await,
        Command::Logout => {
            store.clear()?;
            println!("logged out");
            Ok(())
        }
    }
}

fn session_client(config: ClientConfig, store: Arc<dyn IdentityStore>) -> SessionClient {
    SessionClient::new(reqwest::Client::new(), config, store)
}

async fn run_register(config: ClientConfig, store: Arc<dyn IdentityStore>, username: &str) -> Result<(), CliError> {
    let identity = session_client(config, store).register(username).await?;
    println!("registered as {identity}");
    Ok(())
}

async fn run_leaderboard(config: ClientConfig, store: Arc<dyn IdentityStore>) -> Result<(), CliError> {
    let entries = session_client(config, store).fetch_leaderboard().await?;
    if entries.is_empty() {
        println!("leaderboard is empty");
    }
    for line in render::leaderboard_lines(&entries) {
        println!("{line}");
    }
    Ok(())
}

async fn run_whoami(config: ClientConfig, store: Arc<dyn IdentityStore>) -> Result<(), CliError> {
    let session = session_client(config, store);
    let Some(identity) = session.resume() else {
        return Err(CliError::NotRegistered);
    };
    match session.fetch_snapshot(identity.username()).await {
        Ok(snapshot) => {
            println!("{identity}: score {} rank #{}", snapshot.player.score, snapshot.player.position);
            Ok(())
        }
        Err(SnapshotError::NotFound { .. }) => {
            session.forget();
            Err(CliError::NotRegistered)
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_play(config: ClientConfig, store: Arc<dyn IdentityStore>) -> Result<(), CliError> {
    if store.load().is_none() {
        return Err(CliError::NotRegistered);
    }

    let mut session = clicker::spawn(config, store);
    let mut view = session.view();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("c = click, f = feed, t = toggle leaderboard, q = quit");

    let result = loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(CliError::Io(e)),
                };
                match line.trim() {
                    "c" | "" => {
                        session.send(Input::CharacterClicked);
                    }
                    "f" => {
                        session.send(Input::DragStarted);
                        session.send(Input::FoodDropped);
                        session.send(Input::DragEnded);
                    }
                    "t" => {
                        session.send(Input::LeaderboardToggled);
                    }
                    "q" => break Ok(()),
                    other => eprintln!("unknown command `{other}`"),
                }
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = view.borrow_and_update().clone();
                let Some(game) = current.game() else {
                    break Err(CliError::NotRegistered);
                };
                for line in render::game_lines(game) {
                    println!("{line}");
                }
            }
            Some(cue) = session.next_cue() => {
                println!("{}", render::cue_line(cue));
            }
        }
    };

    session.shutdown().await;
    result
}
