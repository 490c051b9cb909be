use clap::{Parser, Subcommand};
use simple_drop::candidate::collect_candidates;
use simple_drop::drag::{DragOutcome, DragReorderSession};
use simple_drop::imaging::ImageTransformer;
use simple_drop::intake::{ChangeSink, IntakeController, Snapshot};
use simple_drop::{config, naming, output, validate};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-drop")]
#[command(about = "Validate, normalize, and order a batch of image files")]
#[command(long_about = "\
Validate, normalize, and order a batch of image files

Files and directories given on the command line are treated as one drop.
Every file is checked against the accepted types and the item limit, then
accepted images are resized and recompressed concurrently. The resulting
collection keeps the order the files were given in.

Pipeline:

  paths ──▶ type + capacity check ──▶ normalize (bounded, concurrent)
                   │                           │
                   ▼                           ▼
               rejections                ordered collection ──▶ --move / --remove ──▶ --out

Positions are 1-based, as printed. '--move 3:1' drags the third item to the
front.

Run 'simple-drop gen-config' to generate a documented drop.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "drop.toml", global = true)]
    config: PathBuf,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct IngestArgs {
    /// Files or directories to drop
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Reorder after intake, as FROM:TO positions (repeatable)
    #[arg(long = "move", value_name = "FROM:TO", value_parser = parse_move)]
    moves: Vec<(usize, usize)>,

    /// Remove an item by id or filename after intake (repeatable)
    #[arg(long, value_name = "ID")]
    remove: Vec<String>,

    /// Write the normalized files here, prefixed with their position
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the final collection and rejections as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Accept, normalize, and order a batch of files
    Ingest(IngestArgs),
    /// Show what a drop would accept or reject, without normalizing
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print a stock drop.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Ingest(args) => {
            let config = config::load_config(&cli.config)?;
            ingest(config, &args).await?;
        }
        Command::Check { paths } => {
            let config = config::load_config(&cli.config)?;
            let candidates = collect_candidates(&paths)?;
            let classification = validate::classify(candidates, &config, 0);
            output::print_check(&classification);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Logs go to stderr so `--json` output stays parseable.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "simple_drop=debug"
    } else {
        "simple_drop=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn ingest(
    config: config::DropConfig,
    args: &IngestArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let candidates = collect_candidates(&args.paths)?;
    info!(count = candidates.len(), "collected candidates");

    let quiet = args.json;
    let sink: Arc<dyn ChangeSink> = Arc::new(move |snapshot: Snapshot| {
        debug!(items = snapshot.items().len(), "collection changed");
        if !quiet {
            println!("{}", output::format_notification(&snapshot));
        }
    });
    let controller = IntakeController::new(config, Arc::new(ImageTransformer::new()), sink)?;
    controller.ingest(candidates).await;

    for &(from, to) in &args.moves {
        apply_move(&controller, from, to, !args.json)?;
    }
    for target in &args.remove {
        match controller.lookup(target) {
            Some(view) => {
                controller.remove(&view.id);
            }
            None => warn!(item = %target, "no such item to remove"),
        }
    }

    if let Some(dir) = &args.out {
        write_outputs(&controller, dir)?;
    }

    if args.json {
        let report = serde_json::json!({
            "items": controller.snapshot(),
            "rejections": controller.rejections(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_change(
            &controller.items(),
            controller.config().effective_max_items(),
            &controller.rejections(),
        );
    }

    controller.teardown();
    debug!("{}", output::format_stats(&controller.registry().stats()));
    Ok(())
}

/// Replay one `--move` as a drag gesture, showing the drag state first.
fn apply_move(
    controller: &IntakeController,
    from: usize,
    to: usize,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = DragReorderSession::new();
    session.begin(from)?;
    session.hover(to)?;
    if show {
        for line in controller.render_thumbnails(&output::TextThumbnails, &session) {
            println!("{}", line);
        }
        println!();
    }
    match controller.finish_drag(&mut session) {
        DragOutcome::Committed { from, to } => info!(from = from + 1, to = to + 1, "moved"),
        DragOutcome::Cancelled => warn!(from = from + 1, to = to + 1, "move had no effect"),
    }
    Ok(())
}

fn write_outputs(controller: &IntakeController, dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for (position, file) in controller.normalized_files().iter().enumerate() {
        let path = dir.join(naming::numbered_filename(position, &file.filename));
        std::fs::write(&path, &file.bytes)?;
        debug!(path = %path.display(), bytes = file.len(), "wrote file");
    }
    Ok(())
}

/// Parse a 1-based `FROM:TO` pair into 0-based indices.
fn parse_move(s: &str) -> Result<(usize, usize), String> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| format!("expected FROM:TO, got '{s}'"))?;
    let position = |part: &str| -> Result<usize, String> {
        match part.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(format!("'{part}' is not a position (1, 2, ...)")),
            Ok(n) => Ok(n - 1),
        }
    };
    Ok((position(from)?, position(to)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_move_converts_to_zero_based() {
        assert_eq!(parse_move("3:1"), Ok((2, 0)));
        assert_eq!(parse_move(" 1 : 2 "), Ok((0, 1)));
    }

    #[test]
    fn parse_move_rejects_bad_input() {
        assert!(parse_move("3").is_err());
        assert!(parse_move("0:1").is_err());
        assert!(parse_move("a:b").is_err());
    }

    #[test]
    fn cli_parses_ingest_flags() {
        let cli = Cli::try_parse_from([
            "simple-drop",
            "ingest",
            "a.jpg",
            "b.png",
            "--move",
            "2:1",
            "--remove",
            "a.jpg",
            "--json",
        ])
        .unwrap();
        let Command::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.paths.len(), 2);
        assert_eq!(args.moves, vec![(1, 0)]);
        assert_eq!(args.remove, vec!["a.jpg"]);
        assert!(args.json);
        assert_eq!(cli.config, PathBuf::from("drop.toml"));
    }
}
