//! Command-line interface for the plate pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{ColonyConfig, LaneConfig};
use crate::core::writers;
use crate::processors::{colonies, lanes, tabular};
use crate::visualization;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "plate-pipeline")]
#[command(about = "Plate-reader, blot and colony image analysis", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a plate-reader export into tidy well/time/value rows
    Tidy {
        /// Delimited export (CSV, TSV or semicolon-separated)
        input: PathBuf,
        /// Plate map with Well and Group/Condition/Sample columns
        #[arg(short, long)]
        metadata: Option<PathBuf>,
        /// Output CSV (defaults to <input>_tidy.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep raw readings instead of subtracting each well's minimum
        #[arg(long)]
        no_baseline: bool,
    },

    /// Fit exponential growth rates per well
    Growth {
        /// Delimited export (CSV, TSV or semicolon-separated)
        input: PathBuf,
        /// Plate map with Well and Group/Condition/Sample columns
        #[arg(short, long)]
        metadata: Option<PathBuf>,
        /// Output CSV (defaults to <input>_growth.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also save an ln(value) plot of the best fits
        #[arg(long)]
        plot: Option<PathBuf>,
        /// Minimum positive readings per fitted well
        #[arg(long)]
        min_points: Option<usize>,
        /// Keep raw readings instead of subtracting each well's minimum
        #[arg(long)]
        no_baseline: bool,
    },

    /// Quantify blot lanes relative to a control lane
    Lanes {
        /// Blot image
        image: PathBuf,
        /// Number of lanes
        #[arg(long)]
        lanes: Option<usize>,
        /// 1-indexed control lane
        #[arg(long)]
        control: Option<usize>,
        /// Output CSV (defaults to <image>_lanes.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Save the image with lane boundaries drawn on it
        #[arg(long)]
        overlay: Option<PathBuf>,
    },

    /// Count colonies on a plate image, or on every image of a directory
    Colonies {
        /// Plate image, or a directory with --batch
        input: PathBuf,
        /// Gray level a pixel must exceed to count as colony
        #[arg(short, long)]
        threshold: Option<u8>,
        /// Minimum colony area in pixels
        #[arg(long)]
        min_area: Option<usize>,
        /// Output CSV (single image) or directory (batch)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Save the image with counted colonies circled (single image only)
        #[arg(long)]
        overlay: Option<PathBuf>,
        /// Process every image in the input directory
        #[arg(long)]
        batch: bool,
    },

    /// Write the default configuration as YAML
    InitConfig {
        /// Destination YAML file
        path: PathBuf,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

/// Print the diagnostic notes collected by the tabular stages
fn print_notes(notes: &[String]) {
    for note in notes {
        println!("  - {}", note);
    }
}

/// `<dir>/<stem><suffix>` next to `input`
fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}{}", stem, suffix))
}

/// Log the error and exit with status 1
fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    error!("{}: {}", context, e);
    std::process::exit(1);
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::Tidy {
            input,
            metadata,
            output,
            no_baseline,
        } => {
            cmd_tidy(&input, metadata.as_deref(), output, no_baseline, config);
        }
        Commands::Growth {
            input,
            metadata,
            output,
            plot,
            min_points,
            no_baseline,
        } => {
            cmd_growth(
                &input,
                metadata.as_deref(),
                output,
                plot,
                min_points,
                no_baseline,
                config,
            );
        }
        Commands::Lanes {
            image,
            lanes,
            control,
            output,
            overlay,
        } => {
            cmd_lanes(&image, lanes, control, output, overlay, &config);
        }
        Commands::Colonies {
            input,
            threshold,
            min_area,
            output,
            overlay,
            batch,
        } => {
            cmd_colonies(&input, threshold, min_area, output, overlay, batch, &config);
        }
        Commands::InitConfig { path } => cmd_init_config(&path, &config),
    }
}

fn cmd_tidy(
    input: &Path,
    metadata: Option<&Path>,
    output: Option<PathBuf>,
    no_baseline: bool,
    mut config: PipelineConfig,
) {
    let start = Instant::now();
    if no_baseline {
        config.normalizer.subtract_baseline = false;
    }
    let output_path = output.unwrap_or_else(|| sibling_path(input, "_tidy.csv"));

    let spinner = create_spinner("Normalizing plate export...");
    let report = match tabular::process_table_file(input, metadata, &config) {
        Ok(report) => report,
        Err(e) => {
            spinner.finish_and_clear();
            fail("Normalization failed", e);
        }
    };
    spinner.finish_and_clear();

    if let Err(e) = writers::write_tidy_csv(&output_path, &report.records) {
        fail("Writing tidy CSV failed", e);
    }

    println!("Notes:");
    print_notes(&report.notes);

    print_summary(
        "Tidy Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output CSV", output_path.display().to_string()),
            (
                "Layout",
                report
                    .layout
                    .map_or("unrecognized", |l| l.describe())
                    .to_string(),
            ),
            ("Readings", report.records.len().to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_growth(
    input: &Path,
    metadata: Option<&Path>,
    output: Option<PathBuf>,
    plot: Option<PathBuf>,
    min_points: Option<usize>,
    no_baseline: bool,
    mut config: PipelineConfig,
) {
    let start = Instant::now();
    if let Some(min_points) = min_points {
        config.growth.min_points = min_points;
    }
    if no_baseline {
        config.normalizer.subtract_baseline = false;
    }
    let output_path = output.unwrap_or_else(|| sibling_path(input, "_growth.csv"));

    let spinner = create_spinner("Fitting growth curves...");
    let report = match tabular::process_table_file(input, metadata, &config) {
        Ok(report) => report,
        Err(e) => {
            spinner.finish_and_clear();
            fail("Growth fitting failed", e);
        }
    };
    spinner.finish_and_clear();

    if let Err(e) = writers::write_fits_csv(&output_path, &report.fits) {
        fail("Writing growth CSV failed", e);
    }

    if let Some(plot_path) = &plot {
        // A missing plot is not worth failing the run over.
        match visualization::plot_growth_curves(plot_path, &report.records, &report.fits, 12) {
            Ok(()) => info!("Saved growth plot to {}", plot_path.display()),
            Err(e) => warn!("Growth plot skipped: {}", e),
        }
    }

    println!("Notes:");
    print_notes(&report.notes);

    let best = report
        .fits
        .first()
        .map(|f| format!("{} (rate {:.4}, R² {:.3})", f.well, f.growth_rate, f.r_squared))
        .unwrap_or_else(|| "-".to_string());

    print_summary(
        "Growth Fitting Complete",
        &[
            ("Input file", input.display().to_string()),
            ("Output CSV", output_path.display().to_string()),
            ("Readings", report.records.len().to_string()),
            ("Wells fitted", report.fits.len().to_string()),
            ("Best fit", best),
            ("min_points", config.growth.min_points.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_lanes(
    image: &Path,
    lane_count: Option<usize>,
    control: Option<usize>,
    output: Option<PathBuf>,
    overlay: Option<PathBuf>,
    config: &PipelineConfig,
) {
    let start = Instant::now();

    let lane_config = LaneConfig {
        lane_count: lane_count.unwrap_or(config.lanes.lane_count),
        control_lane: control.unwrap_or(config.lanes.control_lane),
    };
    let output_path = output.unwrap_or_else(|| sibling_path(image, "_lanes.csv"));

    let spinner = create_spinner("Quantifying lanes...");
    let (frame, results) = match lanes::process_lane_image(image, &lane_config) {
        Ok(out) => out,
        Err(e) => {
            spinner.finish_and_clear();
            fail("Lane quantification failed", e);
        }
    };
    spinner.finish_and_clear();

    if let Err(e) = writers::write_lanes_csv(&output_path, &results) {
        fail("Writing lanes CSV failed", e);
    }

    if let Some(overlay_path) = &overlay {
        if let Err(e) = visualization::draw_lane_overlay(overlay_path, &frame, &results) {
            fail("Lane overlay failed", e);
        }
    }

    if results.iter().all(|l| l.relative_density.is_none()) {
        println!(
            "Control lane {} has no signal; relative densities left empty.",
            lane_config.control_lane
        );
    }

    print_summary(
        "Lane Quantification Complete",
        &[
            ("Input image", image.display().to_string()),
            ("Output CSV", output_path.display().to_string()),
            ("Image size", format!("{}x{}", frame.width(), frame.height())),
            ("Lanes", lane_config.lane_count.to_string()),
            ("Control lane", lane_config.control_lane.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_colonies(
    input: &Path,
    threshold: Option<u8>,
    min_area: Option<usize>,
    output: Option<PathBuf>,
    overlay: Option<PathBuf>,
    batch: bool,
    config: &PipelineConfig,
) {
    let start = Instant::now();

    let colony_config = ColonyConfig {
        threshold: threshold.unwrap_or(config.colonies.threshold),
        min_area: min_area.unwrap_or(config.colonies.min_area),
    };

    if batch {
        let output_dir = output.unwrap_or_else(|| input.to_path_buf());
        if overlay.is_some() {
            warn!("--overlay is ignored in batch mode");
        }

        let spinner = create_spinner("Counting colonies in directory...");
        let results = match colonies::count_colonies_batch(input, &colony_config) {
            Ok(results) => results,
            Err(e) => {
                spinner.finish_and_clear();
                fail("Batch colony counting failed", e);
            }
        };
        spinner.finish_and_clear();

        let mut total = 0usize;
        for (path, found) in &results {
            let csv_path = output_dir.join(
                sibling_path(path, "_colonies.csv")
                    .file_name()
                    .unwrap_or_default(),
            );
            if let Err(e) = writers::write_colonies_csv(&csv_path, found) {
                fail("Writing colonies CSV failed", e);
            }
            println!("  {}: {} colonies", path.display(), found.len());
            total += found.len();
        }

        print_summary(
            "Batch Colony Count Complete",
            &[
                ("Input directory", input.display().to_string()),
                ("Output directory", output_dir.display().to_string()),
                ("Images counted", results.len().to_string()),
                ("Total colonies", total.to_string()),
                ("Threshold", colony_config.threshold.to_string()),
                ("Min area", colony_config.min_area.to_string()),
                ("Duration", format!("{:.2?}", start.elapsed())),
            ],
        );
        return;
    }

    let output_path = output.unwrap_or_else(|| sibling_path(input, "_colonies.csv"));

    let spinner = create_spinner("Counting colonies...");
    let (frame, found) = match colonies::process_colony_image(input, &colony_config) {
        Ok(out) => out,
        Err(e) => {
            spinner.finish_and_clear();
            fail("Colony counting failed", e);
        }
    };
    spinner.finish_and_clear();

    if let Err(e) = writers::write_colonies_csv(&output_path, &found) {
        fail("Writing colonies CSV failed", e);
    }

    if let Some(overlay_path) = &overlay {
        if let Err(e) = visualization::draw_colony_overlay(overlay_path, &frame, &found) {
            fail("Colony overlay failed", e);
        }
    }

    print_summary(
        "Colony Count Complete",
        &[
            ("Input image", input.display().to_string()),
            ("Output CSV", output_path.display().to_string()),
            ("Colonies", found.len().to_string()),
            ("Threshold", colony_config.threshold.to_string()),
            ("Min area", colony_config.min_area.to_string()),
            ("Duration", format!("{:.2?}", start.elapsed())),
        ],
    );
}

fn cmd_init_config(path: &Path, config: &PipelineConfig) {
    if let Err(e) = config.to_yaml(path) {
        fail("Writing config failed", e);
    }
    println!("Wrote configuration to {}", path.display());
}
