use anyhow::{bail, Result};
use clap::Parser;
use interop::{ImagingTable, RunLayout, RunMetrics, SummaryOptions, DEFAULT_Q_THRESHOLD};

#[derive(Parser)]
struct Args {
    /// Run folder containing an InterOp directory
    #[clap(required = true)]
    run_dir: String,
    /// Q-score threshold for percent bases over Q
    #[clap(short, long, default_value_t = DEFAULT_Q_THRESHOLD)]
    q_threshold: u8,
    /// Count the last cycle of each lane in percent over Q
    #[clap(long)]
    include_last_cycle: bool,
    /// Number of threads (0 = all cores)
    #[clap(short = 't', long, default_value_t = 0)]
    threads: usize,
    /// Name of the InterOp directory inside the run folder
    #[clap(long, default_value = "InterOp")]
    interop_dir: String,
    /// Imaging table (CSV) to summarize per tile
    #[clap(long)]
    imaging: Option<String>,
}

fn fmt(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.2}", value)
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let layout = RunLayout::default().with_interop_dir(&args.interop_dir);
    let options = SummaryOptions::default()
        .with_q_threshold(args.q_threshold)
        .with_exclude_last_cycle(!args.include_last_cycle);

    let run = RunMetrics::load(&args.run_dir, &layout, args.threads);
    for failure in &run.failures {
        eprintln!(
            "Warning: skipped {} ({}): {}",
            failure.family,
            failure.path.display(),
            failure.error
        );
    }
    if run.loaded().is_empty() {
        bail!("No metric files could be decoded under {}", args.run_dir);
    }

    let summary = run.summarize(&options);
    println!(
        "lane\ttiles\tclusters\tclusters_pf\t%pf\tdensity\tdensity_sd\t%aligned\t%>=Q{}\toccupied\t%occupied\terror_rate\t%no_calls",
        summary.q_threshold
    );
    for lane in &summary.lanes {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            lane.lane,
            lane.tile_count,
            fmt(lane.cluster_count),
            fmt(lane.cluster_count_pf),
            fmt(lane.percent_pf),
            fmt(lane.density),
            fmt(lane.density_std_dev),
            fmt(lane.percent_aligned),
            fmt(lane.percent_over_q),
            fmt(lane.occupied_clusters),
            fmt(lane.percent_occupied),
            fmt(lane.error_rate),
            fmt(lane.percent_no_calls),
        );
    }
    println!("\nTotal %>=Q{}: {}", summary.q_threshold, fmt(summary.percent_over_q));

    if let Some(total_yield) = summary.total_yield {
        println!("\nIndexed clusters: {}", total_yield);
        for (sample, fraction) in &summary.sample_fractions {
            println!("  {}\t{:.2}%", sample, 100.0 * fraction);
        }
    }

    if let Some(path) = &args.imaging {
        let table = ImagingTable::from_path(path)?;
        println!("\nlane\ttile\t%occupied\t%pf");
        for tile in table.tile_summaries() {
            println!(
                "{}\t{}\t{}\t{}",
                tile.lane,
                tile.tile,
                fmt(tile.percent_occupied),
                fmt(tile.percent_pf)
            );
        }
    }

    Ok(())
}
