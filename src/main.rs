use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use millkit::{
    init_logging, Config, EdgeAxis, LogFormat, MillingParameters, PathGenerator, Session,
    StreamSink, BUILD_DATE, VERSION,
};

/// Toolpath and calibration generator for a milling attachment
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (TOML or JSON); defaults to the platform config dir
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// enable debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    /// log as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Raster surfacing of the top face
    Surface(MillingArgs),
    /// Diagonal surfacing of the top face, starting from X0 Y0 Z0
    Diagonal(MillingArgs),
    /// Mill the edge along X
    EdgeX(MillingArgs),
    /// Mill the edge along Y
    EdgeY(MillingArgs),
    /// Peck drill at the current position
    Drill(MillingArgs),
    /// Scan a program file for its X/Y extents
    Scan {
        /// Program file
        file: PathBuf,
        /// print the full scan report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the menu actions offered in the current state
    Actions {
        /// a job is running
        #[arg(long)]
        busy: bool,
    },
    /// Write a default config file
    InitConfig {
        /// overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Milling parameter overrides; values are clamped into their ranges
#[derive(Args, Debug, Default)]
struct MillingArgs {
    /// area width (mm)
    #[arg(long)]
    width: Option<f64>,
    /// area height (mm)
    #[arg(long)]
    height: Option<f64>,
    /// tool diameter (mm)
    #[arg(long)]
    tool: Option<f64>,
    /// depth layers or drill cycles
    #[arg(long)]
    depth: Option<u32>,
    /// row overlap in percent
    #[arg(long)]
    overlap: Option<f64>,
    /// feed speed (mm/min)
    #[arg(long)]
    speed: Option<f64>,
}

impl MillingArgs {
    fn apply(&self, mut params: MillingParameters) -> MillingParameters {
        if let Some(width) = self.width {
            params.area_width = width;
        }
        if let Some(height) = self.height {
            params.area_height = height;
        }
        if let Some(tool) = self.tool {
            params.tool_diameter = tool;
        }
        if let Some(depth) = self.depth {
            params.pass_depth_count = depth;
        }
        if let Some(overlap) = self.overlap {
            params.overlap_fraction = overlap / 100.0;
        }
        if let Some(speed) = self.speed {
            params.feed_speed = speed;
        }
        params
    }
}

fn config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Ok(Config::default_path()?),
    }
}

fn session_with(config: Config, args: &MillingArgs) -> Session {
    let mut session = Session::new(config);
    let params = args.apply(*session.milling());
    session.set_milling(params);
    session
}

fn gcode_sink() -> StreamSink<io::StdoutLock<'static>> {
    StreamSink::new(io::stdout().lock())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(level, format)?;
    tracing::debug!("millkit {} built {}", VERSION, BUILD_DATE);

    let path = config_path(&cli)?;

    if let Commands::InitConfig { force } = &cli.command {
        if path.exists() && !force {
            anyhow::bail!("{} exists; pass --force to overwrite", path.display());
        }
        Config::default()
            .save_to_file(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("{}", path.display());
        return Ok(());
    }

    let config = Config::load_or_default(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    match &cli.command {
        Commands::Surface(args) => session_with(config, args).run_raster_top(&mut gcode_sink())?,
        Commands::Diagonal(args) => {
            // No live position to read: the sweep returns to X0 Y0 Z0
            let session = session_with(config, args);
            session.diagonal_top().run(&mut gcode_sink())?;
        }
        Commands::EdgeX(args) => {
            session_with(config, args).run_edge(&mut gcode_sink(), EdgeAxis::X)?
        }
        Commands::EdgeY(args) => {
            session_with(config, args).run_edge(&mut gcode_sink(), EdgeAxis::Y)?
        }
        Commands::Drill(args) => {
            // Drill feeds sit below the milling range; skip the milling clamp
            let session = Session::new(config);
            let params = args.apply(*session.milling());
            session.drill_with(&params).run(&mut gcode_sink())?;
        }
        Commands::Scan { file, json } => {
            let mut session = Session::new(config);
            let report = session.scan_file(file)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(report)?);
            } else {
                println!("{}", report.summary());
                if let Some(error) = &report.read_error {
                    tracing::warn!("Scan stopped early: {}", error);
                }
            }
        }
        Commands::Actions { busy } => {
            let session = Session::new(config);
            for action in session.available_actions(*busy) {
                println!("{}", action);
            }
        }
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}
