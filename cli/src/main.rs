//! Terminal client for the realtime grid game.
//!
//! Creates, joins, or resumes a session through the coordinator, then runs a
//! small interactive loop: moves are read from stdin while pushed updates
//! repaint the board as they arrive.

use std::time::Duration;

use clap::{Parser, Subcommand};
use coordinator::{ClientConfig, CoordinatorError, GameClient, SessionView};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;
use wire::{BOARD_SIZE, GameOutcome, GameStatus};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
    #[error("stdin read failed: {0}")]
    Stdin(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "grid-cli", about = "Terminal client for the realtime grid game")]
struct Cli {
    #[arg(long, env = "GRID_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Realtime endpoint; derived from the base URL when absent.
    #[arg(long, env = "GRID_WS_URL")]
    ws_url: Option<String>,

    #[arg(long, env = "GRID_BEARER_TOKEN")]
    bearer_token: Option<String>,

    /// Stable participant id; a fresh one is generated when absent.
    #[arg(long, env = "GRID_PLAYER_ID")]
    player_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new session and wait for an opponent.
    Create,
    /// Join an existing session as the second participant.
    Join { session_id: String },
    /// Reconnect to a session this participant already belongs to.
    Resume { session_id: String },
}

enum Input {
    Move(u8, u8),
    Retry,
    Quit,
    Unknown,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let player_id = cli
        .player_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut config = ClientConfig::new(cli.base_url);
    if let Some(ws_url) = cli.ws_url {
        config = config.with_ws_url(ws_url);
    }
    if let Some(token) = cli.bearer_token {
        config = config.with_bearer_token(token);
    }

    let client = match cli.command {
        Command::Create => GameClient::create_session(config, &player_id).await?,
        Command::Join { session_id } => {
            GameClient::join_session(config, &session_id, &player_id).await?
        }
        Command::Resume { session_id } => {
            GameClient::resume_session(config, &session_id, &player_id).await?
        }
    };

    let view = client.view();
    println!("session {} (participant {player_id})", view.id);
    println!("enter moves as `row col` (0-2), `retry` to force a reconnect, `quit` to leave");

    let outcome = play(&client).await;
    client.leave();
    outcome
}

async fn play(client: &GameClient) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interval = tokio::time::interval(Duration::from_millis(250));
    let mut rendered_revision = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let view = client.view();
                if rendered_revision != Some(view.revision) {
                    rendered_revision = Some(view.revision);
                    render(&view);
                    if view.status == GameStatus::Finished {
                        return Ok(());
                    }
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                match parse_input(&line) {
                    Input::Move(row, col) => {
                        match client.attempt_move(row, col).await {
                            Ok(view) => {
                                rendered_revision = Some(view.revision);
                                render(&view);
                                if view.status == GameStatus::Finished {
                                    return Ok(());
                                }
                            }
                            Err(
                                error @ (CoordinatorError::IllegalMove(_)
                                | CoordinatorError::Rejected { .. }),
                            ) => println!("move refused: {error}"),
                            Err(error) => println!("move failed: {error}"),
                        }
                    }
                    Input::Retry => {
                        match client.retry_now().await {
                            Ok(()) => println!("reconnected"),
                            Err(error) => println!("retry failed: {error}"),
                        }
                    }
                    Input::Quit => return Ok(()),
                    Input::Unknown => {
                        println!("enter `row col` (0-2), `retry`, or `quit`");
                    }
                }
            }
        }
    }
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed {
        "quit" | "q" => return Input::Quit,
        "retry" => return Input::Retry,
        _ => {}
    }

    let mut parts = trimmed
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty());
    let (Some(row), Some(col), None) = (parts.next(), parts.next(), parts.next()) else {
        return Input::Unknown;
    };
    match (row.parse::<u8>(), col.parse::<u8>()) {
        (Ok(row), Ok(col)) => Input::Move(row, col),
        _ => Input::Unknown,
    }
}

fn render(view: &SessionView) {
    println!();
    println!("     0   1   2");
    for (index, row) in view.board.rows().iter().enumerate() {
        let cell = |column: usize| row[column].map_or(' ', |mark| match mark {
            wire::Mark::X => 'X',
            wire::Mark::O => 'O',
        });
        println!("  {index}  {} | {} | {}", cell(0), cell(1), cell(2));
        if index + 1 < BOARD_SIZE {
            println!("    ---+---+---");
        }
    }
    println!("  {}", status_line(view));
}

fn status_line(view: &SessionView) -> String {
    match view.status {
        GameStatus::Waiting => {
            format!("waiting for an opponent ({}/2 in the room)", view.occupancy)
        }
        GameStatus::Ongoing => match view.local_mark {
            Some(mark) if view.local_turn => format!("you are {mark}, your move"),
            Some(mark) => format!("you are {mark}, waiting for {}", view.turn),
            None => format!("{} to move", view.turn),
        },
        GameStatus::Finished => match view.outcome {
            Some(GameOutcome::Winner(mark)) if view.local_mark == Some(mark) => {
                format!("game over: you win as {mark}")
            }
            Some(GameOutcome::Winner(mark)) => format!("game over: {mark} wins"),
            Some(GameOutcome::Draw) => "game over: draw".to_owned(),
            None => "game over".to_owned(),
        },
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
