use crate::config::Profile;
use crate::generator::{Generator, GeneratorConfig};
use crate::writer::{DatasetWriter, OutputFormat, WriteOptions, WriteReport};
use indicatif::{ProgressBar, ProgressStyle};
use schemars::JsonSchema;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

pub struct GenerateArgs {
    pub output: PathBuf,
    pub customers: Option<usize>,
    pub sellers: Option<usize>,
    pub orders: Option<usize>,
    pub seed: Option<u64>,
    pub workers: Option<usize>,
    pub format: String,
    pub gzip: bool,
    pub config: Option<PathBuf>,
    pub progress: bool,
    pub json: bool,
    pub dry_run: bool,
}

/// JSON output for the generate command
#[derive(Serialize, JsonSchema)]
pub(crate) struct GenerateJsonOutput {
    output_dir: String,
    format: String,
    gzip: bool,
    seed: u64,
    workers: usize,
    dry_run: bool,
    statistics: GenerateStatistics,
    files: Vec<GeneratedFile>,
}

#[derive(Serialize, JsonSchema)]
pub(crate) struct GenerateStatistics {
    products: usize,
    customers: usize,
    sellers: usize,
    orders: usize,
    order_items: usize,
    total_rows: usize,
    bytes_written: u64,
    elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    rows_per_sec: Option<f64>,
}

#[derive(Serialize, JsonSchema)]
pub(crate) struct GeneratedFile {
    table: String,
    path: String,
    rows: usize,
    bytes: u64,
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let format: OutputFormat = args
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut config = GeneratorConfig::default();
    if let Some(ref path) = args.config {
        Profile::load(path)?.apply(&mut config);
    }
    if let Some(n) = args.customers {
        config.customers = n;
    }
    if let Some(n) = args.sellers {
        config.sellers = n;
    }
    if let Some(n) = args.orders {
        config.orders = n;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let workers = config.effective_workers();
    let seed = config.seed;

    if !args.json {
        eprintln!(
            "Generating dataset: {} customers, {} sellers, {} orders [seed: {}, workers: {}]",
            config.customers, config.sellers, config.orders, seed, workers
        );
    }

    let pb = spinner(args.progress && !args.json);
    let start_time = Instant::now();

    if let Some(pb) = &pb {
        pb.set_message("Generating records...");
    }
    let generator = Generator::new(config);
    let dataset = generator.generate()?;

    let report = if args.dry_run {
        WriteReport::default()
    } else {
        if let Some(pb) = &pb {
            pb.set_message(format!("Writing {} files...", format));
        }
        let writer = DatasetWriter::new(
            args.output.clone(),
            WriteOptions {
                format,
                gzip: args.gzip,
            },
        );
        writer.write(&dataset)?
    };

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let elapsed = start_time.elapsed();

    if args.json {
        let elapsed_secs = elapsed.as_secs_f64();
        let output = GenerateJsonOutput {
            output_dir: args.output.display().to_string(),
            format: format.to_string(),
            gzip: args.gzip,
            seed,
            workers,
            dry_run: args.dry_run,
            statistics: GenerateStatistics {
                products: dataset.products.len(),
                customers: dataset.customers.len(),
                sellers: dataset.sellers.len(),
                orders: dataset.orders.len(),
                order_items: dataset.order_items.len(),
                total_rows: dataset.total_rows(),
                bytes_written: report.total_bytes(),
                elapsed_secs,
                rows_per_sec: if elapsed_secs > 0.0 {
                    Some(dataset.total_rows() as f64 / elapsed_secs)
                } else {
                    None
                },
            },
            files: report
                .files
                .iter()
                .map(|f| GeneratedFile {
                    table: f.table.clone(),
                    path: f.path.display().to_string(),
                    rows: f.rows,
                    bytes: f.bytes,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    eprintln!("Generated in {:.3?}:", elapsed);
    eprintln!("  Products:    {:>10}", dataset.products.len());
    eprintln!("  Customers:   {:>10}", dataset.customers.len());
    eprintln!("  Sellers:     {:>10}", dataset.sellers.len());
    eprintln!("  Orders:      {:>10}", dataset.orders.len());
    eprintln!("  Order items: {:>10}", dataset.order_items.len());

    if args.dry_run {
        eprintln!();
        eprintln!("Dry run: no files written");
        return Ok(());
    }

    eprintln!();
    for file in &report.files {
        eprintln!(
            "  Wrote {} ({} rows, {:.2} KB)",
            file.path.display(),
            file.rows,
            file.bytes as f64 / 1024.0
        );
    }
    eprintln!();
    eprintln!(
        "Done: {} rows, {:.2} MB in {}",
        report.total_rows(),
        report.total_bytes() as f64 / (1024.0 * 1024.0),
        args.output.display()
    );

    Ok(())
}

fn spinner(enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Some(pb)
}
