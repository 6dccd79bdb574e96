//! stomata CLI: batch measurement of stomata from detection dumps.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use stomata::io::{export_csvs, load_image_records, write_image_record};
use stomata::pipeline::filter_population_outliers;
use stomata::{
    AnalysisOptions, BatchContext, BatchProgress, Calibration, ImageRecord, MeasureConfig,
    Morphology, PlantSpecies, SampleSummary, StomataAnalyzer, UserFilter,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "stomata")]
#[command(about = "Measure plant stomata (pore size, density, g_max) from instance segmentation output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure a directory of detection dumps and write per-image records.
    Measure(CliMeasureArgs),

    /// Summarize previously written per-image records.
    Summarize(CliSummarizeArgs),

    /// Print the built-in species table.
    SpeciesInfo,

    /// Print the default measurement configuration (JSON).
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct CliMeasureArgs {
    /// Directory of per-image detection dumps (JSON).
    #[arg(long)]
    detections: PathBuf,

    /// Directory to write per-image records and CSV exports.
    #[arg(long)]
    out: PathBuf,

    /// Measurement configuration file (JSON). Missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overlap IoU above which the less confident detection is dropped.
    #[arg(long)]
    iou_threshold: Option<f64>,

    /// Distance to the image border (px) that counts as "near edge".
    #[arg(long)]
    edge_distance_px: Option<f64>,

    /// Skip the batch-level outlier filter.
    #[arg(long)]
    no_population_filter: bool,

    /// Sample name used in CSV file names (default: detection directory name).
    #[arg(long)]
    sample_name: Option<String>,

    #[command(flatten)]
    analysis: CliAnalysisArgs,
}

#[derive(Debug, Clone, Args)]
struct CliSummarizeArgs {
    /// Directory of per-image records written by `measure`.
    #[arg(long)]
    records: PathBuf,

    /// Directory to write CSV exports.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Re-run the population filter over the loaded records and rewrite them.
    #[arg(long)]
    refilter: bool,

    /// Configuration used by --refilter (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sample name used in CSV file names (default: records directory name).
    #[arg(long)]
    sample_name: Option<String>,

    #[command(flatten)]
    analysis: CliAnalysisArgs,
}

#[derive(Debug, Clone, Args, Default)]
struct CliAnalysisArgs {
    /// Species preset providing calibration and morphology.
    #[arg(long)]
    species: Option<PlantSpecies>,

    /// Calibration in pixels per micrometre. Overrides the species value.
    #[arg(long)]
    calibration: Option<f64>,

    /// Leaf morphology. Overrides the species value.
    #[arg(long, value_enum)]
    morphology: Option<MorphologyArg>,

    /// Fixed field-of-view area in mm² used for densities.
    #[arg(long)]
    image_area_mm2: Option<f64>,

    /// Minimum detection confidence kept in summaries.
    #[arg(long, default_value_t = 0.0)]
    min_confidence: f32,

    /// Minimum pore length (px) kept in summaries.
    #[arg(long, default_value_t = 0.0)]
    min_pore_length: f64,

    /// Count near-edge complexes removed by the spatial filter in densities.
    #[arg(long)]
    count_edge_rejections: bool,
}

impl CliAnalysisArgs {
    fn to_options(&self) -> AnalysisOptions {
        let mut options = match self.species {
            Some(species) => AnalysisOptions::for_species(species),
            None => AnalysisOptions::default(),
        };
        if let Some(px_per_um) = self.calibration {
            options.calibration = Calibration::new(px_per_um);
        }
        if let Some(morphology) = self.morphology {
            options.morphology = morphology.to_core();
        }
        options.image_area_mm2 = self.image_area_mm2;
        options.user_filter = UserFilter {
            min_confidence: self.min_confidence,
            min_pore_length_px: self.min_pore_length,
        };
        options.count_edge_rejections = self.count_edge_rejections;
        options
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MorphologyArg {
    Monocot,
    Dicot,
}

impl MorphologyArg {
    fn to_core(self) -> Morphology {
        match self {
            Self::Monocot => Morphology::Monocot,
            Self::Dicot => Morphology::Dicot,
        }
    }
}

fn load_config(path: Option<&Path>) -> CliResult<MeasureConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading config: {}", path.display());
            Ok(MeasureConfig::from_json_file(path)?)
        }
        None => Ok(MeasureConfig::default()),
    }
}

fn sample_name(explicit: Option<&str>, dir: &Path) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| {
            dir.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "sample".to_owned())
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
        Commands::Measure(args) => run_measure(&args),
        Commands::Summarize(args) => run_summarize(&args),
        Commands::SpeciesInfo => run_species_info(),
        Commands::DefaultConfig => run_default_config(),
    }
}

// ── species-info ───────────────────────────────────────────────────────

fn run_species_info() -> CliResult<()> {
    println!("stomata built-in species");
    for species in PlantSpecies::ALL {
        println!(
            "  {:<12} morphology={:<8} calibration={:.4} px/um  field of view={:.4} mm\u{b2}",
            species.name(),
            format!("{:?}", species.morphology()).to_lowercase(),
            species.calibration().px_per_um(),
            species.example_image_area_mm2(),
        );
    }
    Ok(())
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config() -> CliResult<()> {
    println!("{}", MeasureConfig::default().to_json_pretty()?);
    Ok(())
}

// ── measure ────────────────────────────────────────────────────────────

fn run_measure(args: &CliMeasureArgs) -> CliResult<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(iou) = args.iou_threshold {
        config.spatial_filter.iou_threshold = iou;
    }
    if let Some(dist) = args.edge_distance_px {
        config.spatial_filter.edge_distance_px = dist;
        config.population_filter.edge_distance_px = dist;
    }
    if args.no_population_filter {
        config.population_filter.enable = false;
    }

    let analyzer = StomataAnalyzer::with_config(config);
    tracing::info!("Measuring detection dumps in {}", args.detections.display());

    let output = analyzer.measure_dump_dir(&args.detections, None, |p: &BatchProgress<'_>| {
        match p.total {
            Some(total) => tracing::info!("[{}/{}] {}", p.processed, total, p.source),
            None => tracing::info!("[{}] {}", p.processed, p.source),
        }
    })?;

    for failure in &output.failures {
        tracing::warn!("Skipped {}: {}", failure.source, failure.error);
    }
    tracing::info!(
        "Measured {} images ({} stomata, {} failures)",
        output.records.len(),
        output.stoma_count(),
        output.failures.len(),
    );

    std::fs::create_dir_all(&args.out)?;
    for record in &output.records {
        write_image_record(&args.out, record)?;
    }
    if !output.failures.is_empty() {
        let failures_path = args.out.join("failures.json");
        std::fs::write(&failures_path, serde_json::to_string_pretty(&output.failures)?)?;
        tracing::info!("Failures written to {}", failures_path.display());
    }

    let options = args.analysis.to_options();
    let name = sample_name(args.sample_name.as_deref(), &args.detections);
    report(&output.records, &options, &args.out, &name)
}

// ── summarize ──────────────────────────────────────────────────────────

fn run_summarize(args: &CliSummarizeArgs) -> CliResult<()> {
    let mut records = load_image_records(&args.records)?;
    if records.is_empty() {
        return Err(format!("no image records found in {}", args.records.display()).into());
    }

    if args.refilter {
        let config = load_config(args.config.as_deref())?;
        refilter(&mut records, &config, &args.records)?;
    }

    let options = args.analysis.to_options();
    let name = sample_name(args.sample_name.as_deref(), &args.records);
    match &args.out {
        Some(out) => report(&records, &options, out, &name),
        None => {
            println!("{}", SampleSummary::from_records(&records, &options));
            Ok(())
        }
    }
}

fn refilter(records: &mut [ImageRecord], config: &MeasureConfig, dir: &Path) -> CliResult<()> {
    let ctx = BatchContext::from_records(records);
    let stats = filter_population_outliers(records, &ctx, &config.population_filter);
    tracing::info!("Refilter moved {} stomata to invalid", stats.total());
    for record in records.iter() {
        write_image_record(dir, record)?;
    }
    Ok(())
}

fn report(
    records: &[ImageRecord],
    options: &AnalysisOptions,
    out: &Path,
    sample_name: &str,
) -> CliResult<()> {
    export_csvs(out, sample_name, records, options)?;
    println!("{}", SampleSummary::from_records(records, options));
    Ok(())
}
