mod commands;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use arena_core::domain::ContestId;
use clap::Parser;
use contest_session::{ClientConfig, ContestSession, EventStream, HttpApiClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::Command;

/// Terminal client for the coding contest arena.
#[derive(Debug, Parser)]
#[command(name = "arena", version)]
struct Args {
    /// Path to the client configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Username to log in with; registered on first use.
    #[arg(short, long)]
    username: String,

    /// Contest to enter after logging in.
    #[arg(long)]
    contest: ContestId,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("failed to load client config from {}", path.display()))?,
        None => ClientConfig::default(),
    };
    info!(base_url = %config.base_url, "starting arena client");

    let api = Arc::new(HttpApiClient::new(&config).context("failed to build http client")?);
    let session = ContestSession::join(api, &config, &args.username)
        .await
        .context("failed to resolve user")?;
    println!(
        "logged in as {} (id {})",
        session.identity().username(),
        session.identity().user_id()
    );

    let printer = tokio::spawn(print_events(session.subscribe_events()));

    match session.enter(args.contest).await {
        Ok(contest) => {
            let selected = session.view().await.selected;
            print!("{}", render::problems(&contest, selected));
        }
        Err(err) => eprintln!("could not enter contest {}: {err}", args.contest),
    }
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, leaving contest");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => {
                        if let Err(err) = run(&session, command).await {
                            eprintln!("error: {err:#}");
                        }
                    }
                    Ok(None) => {}
                    Err(message) => eprintln!("{message}"),
                }
            }
        }
    }

    session.exit().await;
    printer.abort();
    info!("arena client stopped");
    Ok(())
}

async fn run(session: &ContestSession, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Problems => {
            let view = session.view().await;
            match &view.contest {
                Some(contest) => print!("{}", render::problems(contest, view.selected)),
                None => println!("not in a contest"),
            }
        }
        Command::Select(problem_id) => {
            let problem = session.select_problem(problem_id).await?;
            println!("selected [{}] {}", problem.id, problem.title);
        }
        Command::Show => match session.view().await.selected_problem() {
            Some(problem) => print!("{}", render::problem(problem)),
            None => println!("no problem selected"),
        },
        Command::Submit(path) => {
            let code = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let handle = session.submit_current(code).await?;
            println!("submitted as {} ({})", handle.created().id, handle.sequence());
        }
        Command::Status => println!("{}", render::tracker(&session.tracker().snapshot())),
        Command::Board => {
            let snapshot = session.leaderboard().snapshot();
            if !snapshot.is_loaded() {
                println!("leaderboard not loaded yet");
            } else {
                print!("{}", render::leaderboard(&snapshot.entries));
            }
            if let Some(error) = &snapshot.last_error {
                println!("last refresh failed: {error}");
            }
        }
        Command::History => {
            for submission in session.history().await? {
                println!("{}", render::submission(&submission));
            }
        }
        Command::Contests => {
            for contest in session.contests().await? {
                println!(
                    "[{}] {} ({} problems)",
                    contest.id, contest.name, contest.problem_count
                );
            }
        }
        Command::Help => println!("{}", Command::USAGE),
        Command::Quit => {}
    }
    Ok(())
}

async fn print_events(mut events: EventStream) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(line) = render::event(&event) {
                    println!("{line}");
                }
            }
            Err(err) => {
                warn!(error = %err, "event stream closed");
                break;
            }
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
