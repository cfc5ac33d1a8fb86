use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use viewer::clients::{ContentApiClient, LichessClient};
use viewer::snapshot::{load_snapshot, save_snapshot};
use viewer::{Config, GameRef, SessionOptions, ViewingSession};

const USAGE: &str = "usage: pgn-viewer <file.pgn> [--autoplay] [--game-id ID] [--master ID] [--explore] [--save]\n       pgn-viewer --restore [--autoplay] [--explore]";

#[derive(Debug, Default)]
struct Args {
    pgn_path: Option<PathBuf>,
    autoplay: bool,
    game_id: Option<String>,
    master_id: Option<String>,
    explore: bool,
    save: bool,
    restore: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--autoplay" => args.autoplay = true,
            "--explore" => args.explore = true,
            "--save" => args.save = true,
            "--restore" => args.restore = true,
            "--game-id" => args.game_id = Some(iter.next().context("--game-id needs a value")?),
            "--master" => args.master_id = Some(iter.next().context("--master needs a value")?),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            path => args.pgn_path = Some(PathBuf::from(path)),
        }
    }

    if args.pgn_path.is_none() && !args.restore {
        bail!("{USAGE}");
    }
    Ok(args)
}

type Session = ViewingSession<ContentApiClient, LichessClient>;

fn print_game(session: &Session) {
    let Some(doc) = session.document() else { return };
    let info = doc.info();

    println!("{} | {} | {}", info.event, info.site, info.date);
    println!("{} vs {}  {}  (ECO {})", info.white, info.black, info.result, info.eco);

    let line: Vec<String> = doc
        .moves
        .iter()
        .enumerate()
        .map(|(ply, san)| {
            if ply % 2 == 0 {
                format!("{}. {}", ply / 2 + 1, san)
            } else {
                san.clone()
            }
        })
        .collect();
    println!("{}", line.join(" "));

    for comment in &doc.comments {
        println!("  {{{}}} after {}", comment.text, doc.move_label(comment.move_index));
    }
}

fn print_view(session: &Session) {
    if let Some(view) = session.view() {
        println!(
            "{}  {}  {} to move  {}",
            view.move_label,
            view.last_move.as_deref().unwrap_or("-"),
            view.side_to_move,
            view.position
        );
        for comment in &view.annotated.comments {
            println!("    {}: {}", comment.author, comment.text);
        }
        for annotation in &view.annotated.annotations {
            println!("    [{}] {}", annotation.author, annotation.text);
        }
    }
}

async fn explore(session: &Session) {
    match session.explore_current().await {
        Ok(explorer) => {
            println!("Masters: {} games", explorer.total_games());
            for mv in explorer.moves.iter().take(5) {
                println!("  {:<8} {:>7} games", mv.san, mv.games());
            }
            for game in &explorer.top_games {
                println!("  {}  {}", game.id, game.label());
            }
        }
        Err(e) => tracing::warn!("Explorer unavailable: {e}"),
    }

    match session.evaluate_current().await {
        Ok(eval) => println!(
            "Eval: {} best {} ({})",
            eval.score().map_or_else(|| "mate".to_string(), |s| format!("{s:+.2}")),
            eval.suggested_move().unwrap_or_else(|| "-".to_string()),
            eval.summary()
        ),
        Err(e) => tracing::warn!("Evaluation unavailable: {e}"),
    }
}

async fn run_autoplay(session: &Session, config: &Config) {
    if !session.toggle_autoplay() {
        return;
    }
    print_view(session);
    while session.is_autoplay_active() {
        tokio::time::sleep(config.autoplay_interval()).await;
        print_view(session);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = parse_args()?;
    let config = Config::from_env();
    config.validate()?;

    let content = ContentApiClient::new(&config)?;
    let lichess = LichessClient::new(&config)?;
    let session = ViewingSession::new(content, lichess, SessionOptions::from(&config));

    if args.restore {
        let snapshot = load_snapshot(&config.snapshot_path)
            .with_context(|| format!("reading {}", config.snapshot_path))?;
        let index = session.restore(&snapshot)?;
        tracing::info!(game_id = snapshot.game.id(), index, "Restored session");
    } else if let Some(path) = &args.pgn_path {
        let pgn = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let game = match &args.game_id {
            Some(id) => GameRef::Archive(id.clone()),
            None => GameRef::Archive(path.display().to_string()),
        };
        session.load_game(game, &pgn)?;
        session.go_to_end();
    }

    print_game(&session);

    if args.game_id.is_some() {
        if let Err(e) = session.refresh_content().await {
            tracing::warn!("Comments and annotations unavailable: {e}");
        }
        for (index, bound) in session.bindings() {
            println!(
                "{}: {} comments, {} annotations",
                index,
                bound.comments.len(),
                bound.annotations.len()
            );
        }
    }

    if let Some(master_id) = &args.master_id {
        let index = session.switch_to_master_game(master_id).await?;
        println!("Switched to master game {master_id} at move index {index}");
        print_game(&session);
    }

    if args.autoplay {
        session.go_to_start();
        run_autoplay(&session, &config).await;
    } else {
        print_view(&session);
    }

    if args.explore {
        explore(&session).await;
    }

    if args.save {
        if let Some(snapshot) = session.snapshot() {
            save_snapshot(&snapshot, &config.snapshot_path)?;
            println!("Session saved to {}", config.snapshot_path);
        }
    }

    session.close();
    Ok(())
}
