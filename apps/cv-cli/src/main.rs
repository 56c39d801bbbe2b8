use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cv_core::SlotVisibilities;
use cv_engine::TransformKind;
use cv_engine::reference::PlfEngine;
use cv_share::{SharedState, decode, encode, query_of, share_link};
use cv_viz::{
    ConfigError, LegendEntry, PlotCommand, RecordingLabels, RecordingPlot, VizConfig, VizError,
    Visualizer,
};
use serde::Serialize;
use tracing::{info, warn};

type CliResult<T> = Result<T, CliError>;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("{0}")]
    Viz(#[from] VizError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Parser)]
#[command(name = "cv-cli")]
#[command(about = "Convolution visualizer CLI - share links and headless rendering", long_about = None)]
struct Cli {
    /// Visualizer config YAML (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a share link from explicit values
    Encode {
        /// Curve A definition
        #[arg(long)]
        curve_a: Option<String>,
        /// Curve B definition
        #[arg(long)]
        curve_b: Option<String>,
        /// Transform kind ordinal (0-3)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..4))]
        kind: Option<u8>,
        /// Current position
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        position: f64,
        /// Seven-character visibility bitstring
        #[arg(long)]
        visibilities: Option<String>,
        /// Print only the query string
        #[arg(long)]
        query_only: bool,
    },
    /// Decode a share link or query string
    Decode {
        /// Full link or bare query string
        link: String,
    },
    /// Load a share link into a headless visualizer and dump what it draws
    Render {
        /// Full link or bare query string
        link: String,
        /// Include the full plot command log
        #[arg(long)]
        commands: bool,
    },
    /// Print the effective config, or write it to a file
    Config {
        /// Output YAML path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Encode {
            curve_a,
            curve_b,
            kind,
            position,
            visibilities,
            query_only,
        } => cmd_encode(
            &config,
            curve_a,
            curve_b,
            kind,
            position,
            visibilities.as_deref(),
            query_only,
        ),
        Commands::Decode { link } => cmd_decode(&config, &link),
        Commands::Render { link, commands } => cmd_render(config, &link, commands),
        Commands::Config { output } => cmd_config(&config, output.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<VizConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            Ok(VizConfig::load_yaml(path)?)
        }
        None => Ok(VizConfig::default()),
    }
}

fn cmd_encode(
    config: &VizConfig,
    curve_a: Option<String>,
    curve_b: Option<String>,
    kind: Option<u8>,
    position: f64,
    visibilities: Option<&str>,
    query_only: bool,
) -> CliResult<()> {
    let defaults = config.shared_defaults();
    let kind = match kind {
        Some(ordinal) => TransformKind::from_ordinal(ordinal.into())
            .map_err(|e| CliError::Argument(e.to_string()))?,
        None => defaults.kind,
    };
    let visibilities = match visibilities {
        Some(bits) => SlotVisibilities::from_bitstring(bits)
            .map_err(|e| CliError::Argument(e.to_string()))?,
        None => defaults.visibilities,
    };
    if !position.is_finite() {
        return Err(CliError::Argument(format!("position {position} is not finite")));
    }
    let state = SharedState {
        curve_a: curve_a.unwrap_or(defaults.curve_a),
        curve_b: curve_b.unwrap_or(defaults.curve_b),
        kind,
        position,
        visibilities,
    };

    if query_only {
        println!("{}", encode(&state));
    } else {
        println!("{}", share_link(&config.base_url, &state));
    }
    Ok(())
}

#[derive(Serialize)]
struct DecodeReport {
    state: SharedState,
    warnings: Vec<String>,
}

fn cmd_decode(config: &VizConfig, link: &str) -> CliResult<()> {
    let decoded = decode(query_of(link), &config.shared_defaults());
    let report = DecodeReport {
        state: decoded.state,
        warnings: decoded.warnings.iter().map(ToString::to_string).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[derive(Serialize)]
struct RenderReport {
    state: SharedState,
    title_prefix: Option<String>,
    title_tex: Option<String>,
    position_label: String,
    x_range: Option<[f64; 2]>,
    y_range: Option<[f64; 2]>,
    legend: Vec<LegendEntry>,
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commands: Option<Vec<PlotCommand>>,
}

fn cmd_render(config: VizConfig, link: &str, with_commands: bool) -> CliResult<()> {
    let mut viz = Visualizer::new(
        PlfEngine::new(),
        RecordingPlot::new(),
        RecordingLabels::new(),
        config,
    )?;
    let warnings = viz.load_query(query_of(link))?;
    for warning in &warnings {
        warn!(%warning, "share link field replaced by default");
    }

    let viewport = viz.state().viewport();
    let report = RenderReport {
        state: viz.export_state(),
        title_prefix: viz
            .labels()
            .prefix(cv_viz::LabelTarget::Title)
            .map(String::from),
        title_tex: viz
            .labels()
            .get(cv_viz::LabelTarget::Title)
            .map(String::from),
        position_label: viz.state().position_label(),
        x_range: viewport.map(|r| r.x),
        y_range: viewport.map(|r| r.y),
        legend: viz.legend().to_vec(),
        warnings: warnings.iter().map(ToString::to_string).collect(),
        commands: with_commands.then(|| viz.plot().commands().to_vec()),
    };
    let (engine, _, _) = viz.shutdown();
    if engine.live_objects() != 0 {
        warn!(live = engine.live_objects(), "engine objects left after shutdown");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_config(config: &VizConfig, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => {
            config.save_yaml(path)?;
            println!("✓ Config written to {}", path.display());
        }
        None => print!("{}", serde_yaml::to_string(config)?),
    }
    Ok(())
}
