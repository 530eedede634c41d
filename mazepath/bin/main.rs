use std::{fs, path::PathBuf};

use anyhow::Context;
use clap::Parser;
use log::info;
use mazepath::{solve, Algorithm, Cell, Coordinate, ExtractConfig, MazeExtractor};

#[derive(Parser, Debug)]
#[command(name = "mazepath", about = "Solve a photographed maze", version)]
struct Cli {
    /// Photograph or scan of the maze
    image: PathBuf,

    /// Start cell as `row,col` (defaults to the first boundary opening)
    #[arg(long)]
    start: Option<Coordinate>,

    /// Finish cell as `row,col` (defaults to the last boundary opening)
    #[arg(long)]
    finish: Option<Coordinate>,

    /// One of a*, greedy, dijkstra-heap, dijkstra-linear
    #[arg(short, long, default_value = "a*")]
    algorithm: Algorithm,

    /// JSON file with extraction settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Luma below which a pixel counts as wall
    #[arg(long)]
    threshold: Option<u8>,

    /// Write the extracted grid as text
    #[arg(long)]
    dump_grid: Option<PathBuf>,

    /// Write the cropped grayscale image
    #[arg(long)]
    dump_image: Option<PathBuf>,

    /// Write the step log as JSON
    #[arg(long)]
    steps: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<ExtractConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ExtractConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.wall_threshold = threshold;
    }
    Ok(config)
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "info" }),
    )
    .init();

    let extractor = MazeExtractor::new(load_config(&cli)?);
    let extraction = extractor
        .extract_file(&cli.image)
        .with_context(|| format!("extracting maze from {}", cli.image.display()))?;
    let grid = &extraction.grid;

    if let Some(path) = &cli.dump_grid {
        fs::write(path, grid.to_string())?;
    }
    if let Some(path) = &cli.dump_image {
        extraction.cropped.save(path)?;
    }

    let openings = grid.openings();
    let start = match cli.start {
        Some(start) => start,
        None => *openings.first().context("maze has no opening to start from")?,
    };
    let finish = match cli.finish {
        Some(finish) => finish,
        None => *openings.last().context("maze has no opening to finish at")?,
    };

    let log = solve(grid, start, finish, cli.algorithm)?;
    println!("{}", grid.replay(&log));

    if let Some(path) = &cli.steps {
        fs::write(path, serde_json::to_string_pretty(&log)?)?;
    }

    match log.path_cost() {
        Some(cost) => info!(
            "{} from {} to {}: {} steps, path cost {}, {} dead ends",
            cli.algorithm,
            start,
            finish,
            log.len(),
            cost,
            log.count(Cell::DeadEnd)
        ),
        None => info!("{} found no path from {} to {}", cli.algorithm, start, finish),
    }

    Ok(())
}
