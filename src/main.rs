use std::path::{Path, PathBuf};

use annotator::client::{AnnotationClient, ClientError};
use annotator::config::{AnnotatorConfig, ConfigError, normalize_base_url, parse_fit, parse_size};
use annotator::session::{Editor, EditorError, InputEvent};
use canvas::render::RenderBinding;
use canvas::viewport::{FitPolicy, Size};
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no filename given; pass one or set ANNOTATOR_AUTOLOAD")]
    MissingFilename,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("cannot access {path}: {message}")]
    Io { path: String, message: String },
    #[error("events line {line}: {message}")]
    BadEvent { line: usize, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "annotator", about = "Draw, inspect, and persist labeled image regions")]
struct Cli {
    /// Annotation server root (overrides ANNOTATOR_BASE_URL).
    #[arg(long)]
    base_url: Option<String>,

    /// Drawing surface size, WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_size)]
    display: Option<Size>,

    /// `letterbox` or `fixed_width`.
    #[arg(long)]
    fit: Option<String>,

    /// Target width for `--fit fixed_width`.
    #[arg(long)]
    fixed_width: Option<f64>,

    /// Stay in rectangle mode after each rectangle.
    #[arg(long, default_value_t = false)]
    sticky_rect: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load an image's annotation and print its shapes in canvas space.
    Show {
        filename: Option<String>,
        #[arg(long, value_parser = parse_size)]
        image_size: Size,
    },
    /// Replay a JSON-lines input script against an image, then save.
    Replay {
        filename: Option<String>,
        #[arg(long, value_parser = parse_size)]
        image_size: Size,
        #[arg(long, help = "Event script, one JSON event per line")]
        events: PathBuf,
    },
    /// Download an image's raw bytes.
    FetchImage {
        filename: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Upload an image, optionally with an annotation file.
    Upload {
        image: PathBuf,
        #[arg(long)]
        annotation: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let client = AnnotationClient::from_config(&config)?;

    match cli.command {
        Command::Show { filename, image_size } => {
            let filename = pick_filename(filename, &config)?;
            run_show(client, &config, &filename, image_size).await
        }
        Command::Replay { filename, image_size, events } => {
            let filename = pick_filename(filename, &config)?;
            run_replay(client, &config, &filename, image_size, &events).await
        }
        Command::FetchImage { filename, out } => {
            let filename = pick_filename(filename, &config)?;
            let written = client.download_image(&filename, &out).await?;
            println!("wrote {written} bytes to {}", out.display());
            Ok(())
        }
        Command::Upload { image, annotation } => {
            client.upload(&image, annotation.as_deref()).await?;
            println!("uploaded {}", image.display());
            Ok(())
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AnnotatorConfig, CliError> {
    let mut config = AnnotatorConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = normalize_base_url(base_url);
    }
    if let Some(display) = cli.display {
        config.display = display;
    }
    if let Some(fit) = &cli.fit {
        let width = match config.fit {
            FitPolicy::FixedWidth { width } => width,
            FitPolicy::Letterbox => annotator::config::DEFAULT_FIXED_WIDTH,
        };
        config.fit = parse_fit(Some(fit), width)?;
    }
    if let (Some(width), FitPolicy::FixedWidth { .. }) = (cli.fixed_width, config.fit) {
        config.fit = FitPolicy::FixedWidth { width };
    }
    if cli.sticky_rect {
        config.sticky_rect_mode = true;
    }
    Ok(config)
}

fn pick_filename(explicit: Option<String>, config: &AnnotatorConfig) -> Result<String, CliError> {
    explicit.or_else(|| config.autoload.clone()).ok_or(CliError::MissingFilename)
}

async fn run_show(client: AnnotationClient, config: &AnnotatorConfig, filename: &str, image: Size) -> Result<(), CliError> {
    let mut editor = Editor::headless(client, config.engine());
    editor.open(filename, image).await?;

    let engine = editor.engine();
    let mut shapes = Vec::new();
    for stored in engine.store().iter() {
        let points: Vec<[f64; 2]> = engine
            .binding()
            .effective_geometry(&stored.id)
            .map(|g| g.points().into_iter().map(<[f64; 2]>::from).collect())
            .unwrap_or_default();
        shapes.push(serde_json::json!({ "label": stored.label, "canvas_points": points }));
    }
    let report = serde_json::json!({
        "filename": filename,
        "viewport": engine.viewport(),
        "shapes": shapes,
    });
    print_json(&report)
}

async fn run_replay(
    client: AnnotationClient,
    config: &AnnotatorConfig,
    filename: &str,
    image: Size,
    events: &Path,
) -> Result<(), CliError> {
    let mut editor = Editor::headless(client, config.engine());
    editor.open(filename, image).await?;

    let script = tokio::fs::read_to_string(events).await.map_err(|e| io_error(events, &e))?;
    for (index, line) in script.lines().enumerate() {
        let Some(event) = parse_event_line(line, index + 1)? else {
            continue;
        };
        editor.apply(&event);
        for notice in editor.take_notices() {
            eprintln!("{notice}");
        }
    }
    if editor.engine().is_awaiting_label() {
        editor.apply(&InputEvent::CancelLabel);
    }

    let result = editor.save().await;
    for notice in editor.take_notices() {
        eprintln!("{notice}");
    }
    result?;
    println!("saved {} shapes for {filename}", editor.engine().store().len());
    Ok(())
}

fn parse_event_line(line: &str, number: usize) -> Result<Option<InputEvent>, CliError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| CliError::BadEvent { line: number, message: e.to_string() })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn io_error(path: &Path, error: &std::io::Error) -> CliError {
    CliError::Io { path: path.display().to_string(), message: error.to_string() }
}
