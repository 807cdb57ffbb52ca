//! lyseplate CLI — plate, position and frame analysis commands.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use lyseplate::{
    analyze_plate, analyze_position, AnalysisConfig, FrameAssets, PlateDirs, PlotConfig,
    StrainTable, WellOutcome, WellPosition,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "lyseplate")]
#[command(about = "Classify infection outcomes from fluorescence microscopy plate data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a full 96-well plate and export the strain/ratio table.
    AnalyzePlate(AnalyzePlateArgs),

    /// Analyze a single well position.
    AnalyzePos(AnalyzePosArgs),

    /// Dump per-region statistics for one frame (JSON).
    InspectFrame(InspectFrameArgs),
}

#[derive(Debug, Clone, Args)]
struct DataArgs {
    /// Directory with infection-sample images (one subdirectory per position).
    #[arg(long)]
    infection_dir: PathBuf,

    /// Directory with uninfected-control images.
    #[arg(long)]
    control_dir: PathBuf,

    /// Directory with segmentation masks for the infection sample.
    #[arg(long)]
    mask_dir: PathBuf,

    /// Directory with segmentation masks for the control sample.
    #[arg(long)]
    control_mask_dir: PathBuf,
}

impl DataArgs {
    fn to_dirs(&self) -> PlateDirs {
        PlateDirs {
            infection: self.infection_dir.clone(),
            control: self.control_dir.clone(),
            infection_masks: self.mask_dir.clone(),
            control_masks: self.control_mask_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
struct TuningArgs {
    /// Probability cutoff applied to the segmentation mask.
    #[arg(long, default_value = "0.75")]
    mask_threshold: f32,

    /// Columns discarded at the left image edge (pixels).
    #[arg(long, default_value = "50")]
    crop_left: u32,

    /// Columns discarded at the right image edge (pixels).
    #[arg(long, default_value = "50")]
    crop_right: u32,

    /// IQR multiplier for morphology outlier rejection.
    #[arg(long, default_value = "1.5")]
    iqr_multiplier: f64,

    /// Gaussian classifier tail-probability cutoff.
    #[arg(long, default_value = "0.99999")]
    confidence: f64,

    /// Number of frames acquired per position.
    #[arg(long, default_value = "25")]
    frames: u32,

    /// Log per-well counts and ratios.
    #[arg(long)]
    verbose: bool,

    /// Write a classified scatter per analyzed well.
    #[arg(long)]
    plot: bool,

    /// Directory for scatter plots (required with --plot).
    #[arg(long)]
    plot_dir: Option<PathBuf>,
}

impl TuningArgs {
    fn to_config(&self) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.mask.probability_threshold = self.mask_threshold;
        config.mask.crop_left_px = self.crop_left;
        config.mask.crop_right_px = self.crop_right;
        config.outlier.iqr_multiplier = self.iqr_multiplier;
        config.classifier.confidence = self.confidence;
        config.frames_per_position = self.frames;
        config.verbose = self.verbose;
        config.plot = PlotConfig {
            enable: self.plot,
            out_dir: self.plot_dir.clone(),
        };
        config
    }
}

#[derive(Debug, Clone, Args)]
struct AnalyzePlateArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Plate number used to key the strain table.
    #[arg(long)]
    plate: u32,

    /// Strain table CSV (plate,well,strain).
    #[arg(long)]
    strain_table: PathBuf,

    /// Path for the strain/ratio CSV export.
    #[arg(long)]
    out: PathBuf,

    /// Optional path for the full plate result (JSON).
    #[arg(long)]
    out_json: Option<PathBuf>,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Debug, Clone, Args)]
struct AnalyzePosArgs {
    #[command(flatten)]
    data: DataArgs,

    /// Well position name, e.g. A7.
    #[arg(long)]
    pos: String,

    /// Plate number used to key the strain table.
    #[arg(long, default_value = "1")]
    plate: u32,

    /// Optional strain table CSV (plate,well,strain).
    #[arg(long)]
    strain_table: Option<PathBuf>,

    /// Optional path for the analysis result (JSON); stdout otherwise.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Debug, Clone, Args)]
struct InspectFrameArgs {
    /// Position data directory holding the channel images.
    #[arg(long)]
    data_dir: PathBuf,

    /// Position mask directory.
    #[arg(long)]
    mask_dir: PathBuf,

    /// Frame index.
    #[arg(long)]
    frame: u32,

    /// Probability cutoff applied to the segmentation mask.
    #[arg(long, default_value = "0.75")]
    mask_threshold: f32,

    /// Columns discarded at the left image edge (pixels).
    #[arg(long, default_value = "50")]
    crop_left: u32,

    /// Columns discarded at the right image edge (pixels).
    #[arg(long, default_value = "50")]
    crop_right: u32,

    /// Optional path for the region statistics (JSON); stdout otherwise.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::AnalyzePlate(args) => run_analyze_plate(&args),
        Commands::AnalyzePos(args) => run_analyze_pos(&args),
        Commands::InspectFrame(args) => run_inspect_frame(&args),
    }
}

// ── analyze-plate ──────────────────────────────────────────────────────

fn run_analyze_plate(args: &AnalyzePlateArgs) -> CliResult<()> {
    let config = args.tuning.to_config();
    let strains = StrainTable::from_csv(&args.strain_table)?;
    tracing::info!(
        "strain table loaded: {} entries ({})",
        strains.len(),
        args.strain_table.display()
    );

    let dirs = args.data.to_dirs();
    let result = analyze_plate(&dirs, args.plate, Some(&strains), &config)?;

    let failed = 96 - result.analyzed_count();
    tracing::info!(
        "plate {}: {} wells analyzed, {} failed",
        args.plate,
        result.analyzed_count(),
        failed
    );
    if failed > 0 {
        for pos in WellPosition::all() {
            if let WellOutcome::Failed { message } = result.get(pos) {
                tracing::warn!("well {}: {}", pos, message);
            }
        }
    }

    lyseplate::export::write_strain_ratio_csv(&result, &strains, &args.out)?;
    tracing::info!("strain/ratio table written to {}", args.out.display());

    if let Some(json_path) = &args.out_json {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(json_path, &json)?;
        tracing::info!("plate result written to {}", json_path.display());
    }

    Ok(())
}

// ── analyze-pos ────────────────────────────────────────────────────────

fn run_analyze_pos(args: &AnalyzePosArgs) -> CliResult<()> {
    let pos = WellPosition::parse(&args.pos)
        .ok_or_else(|| -> CliError { format!("invalid well position '{}'", args.pos).into() })?;
    let config = args.tuning.to_config();
    let strains = args
        .strain_table
        .as_deref()
        .map(StrainTable::from_csv)
        .transpose()?;

    let dirs = args.data.to_dirs();
    let analysis = analyze_position(&dirs, pos, args.plate, strains.as_ref(), &config)?;

    tracing::info!(
        "position {}: lysis ratio {:.4} ({} measurements)",
        pos,
        analysis.lysis_ratio,
        analysis.n_measurements
    );

    let json = serde_json::to_string_pretty(&analysis)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("result written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

// ── inspect-frame ──────────────────────────────────────────────────────

fn run_inspect_frame(args: &InspectFrameArgs) -> CliResult<()> {
    let assets = FrameAssets::locate(&args.data_dir, &args.mask_dir, args.frame);
    let images = assets.load()?;

    let mask_config = lyseplate::MaskConfig {
        probability_threshold: args.mask_threshold,
        crop_left_px: args.crop_left,
        crop_right_px: args.crop_right,
    };
    let regions = lyseplate::frame::extract_regions(&images, &mask_config)?;
    tracing::info!("frame {}: {} regions", args.frame, regions.len());

    let json = serde_json::to_string_pretty(&regions)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            tracing::info!("region statistics written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
