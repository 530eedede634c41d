//! Turning a photographed maze into a [`Grid`].
//!
//! The photograph is cropped to the outer wall, every pixel is classified as
//! wall or open, the corridor and wall thickness are measured, and finally the
//! full resolution grid is sampled down so that every corridor and every wall
//! band becomes exactly one cell wide.

use std::{path::Path, time::Instant};

use image::{imageops, DynamicImage, GrayImage};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Detection, Result};
use crate::grid::{Cell, Direction, Grid};

/// Tuning knobs for [`MazeExtractor`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Luma values below this are walls.
    pub wall_threshold: u8,
    /// Runs of this many pixels or fewer are ignored when measuring widths.
    pub noise_threshold: usize,
    /// How many lines are tried per side before giving up on a border.
    pub border_samples: usize,
    /// Evenly spaced rows (and columns) sampled for the wall width.
    pub width_samples: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            wall_threshold: 128,
            noise_threshold: 2,
            border_samples: 5,
            width_samples: 7,
        }
    }
}

/// Inclusive pixel bounds of the maze inside the source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Bounds {
    pub fn width(&self) -> u32 {
        self.right - self.left + 1
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }
}

/// Result of a successful extraction.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub grid: Grid,
    /// Corridor thickness in pixels.
    pub path_size: usize,
    /// Wall thickness in pixels.
    pub wall_size: usize,
    pub bounds: Bounds,
    /// The cropped grayscale image the grid was sampled from.
    pub cropped: GrayImage,
}

#[derive(Clone, Debug, Default)]
pub struct MazeExtractor {
    config: ExtractConfig,
}

impl MazeExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<Extraction> {
        let img = image::open(path.as_ref())?;
        debug!("loaded {} ({}x{})", path.as_ref().display(), img.width(), img.height());
        self.extract_image(&img)
    }

    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<Extraction> {
        let img = image::load_from_memory(bytes)?;
        self.extract_image(&img)
    }

    pub fn extract_image(&self, img: &DynamicImage) -> Result<Extraction> {
        let started = Instant::now();
        let luma = img.to_luma8();

        let bounds = find_bounds(&luma, &self.config)?;
        debug!("maze bounds {:?}", bounds);
        let cropped =
            imageops::crop_imm(&luma, bounds.left, bounds.top, bounds.width(), bounds.height()).to_image();

        let full = parse_img(&cropped, self.config.wall_threshold);
        let path_size = corridor_width(&full, self.config.noise_threshold).ok_or(Detection::NoCorridor)?;
        let wall_size = wall_width(&full, &self.config).ok_or(Detection::NoWall)?;
        debug!("corridor width {}px, wall width {}px", path_size, wall_size);

        let grid = reduce_grid(&full, path_size, wall_size);
        info!(
            "extracted {}x{} maze from {}x{} pixels in {:?}",
            grid.rows(),
            grid.columns(),
            cropped.width(),
            cropped.height(),
            started.elapsed()
        );

        Ok(Extraction {
            grid,
            path_size,
            wall_size,
            bounds,
            cropped,
        })
    }
}

/// Extracts the maze in the image at `path` with the default configuration.
pub fn extract<P: AsRef<Path>>(path: P) -> Result<Grid> {
    MazeExtractor::default().extract_file(path).map(|e| e.grid)
}

/// One cell per pixel: dark pixels are walls, the rest is open.
pub fn parse_img(img: &GrayImage, wall_threshold: u8) -> Grid {
    let cells = img
        .pixels()
        .map(|p| {
            if p.0[0] < wall_threshold {
                Cell::Wall
            } else {
                Cell::Traversable
            }
        })
        .collect();
    Grid::from_cells(img.height() as usize, img.width() as usize, cells)
}

fn find_bounds(img: &GrayImage, config: &ExtractConfig) -> std::result::Result<Bounds, Detection> {
    let bounds = Bounds {
        left: measure_border(img, Direction::Right, config)?,
        top: measure_border(img, Direction::Down, config)?,
        right: measure_border(img, Direction::Left, config)?,
        bottom: measure_border(img, Direction::Up, config)?,
    };
    if bounds.right < bounds.left || bounds.bottom < bounds.top {
        return Err(Detection::EmptyCrop);
    }
    Ok(bounds)
}

/// Scans lines in the `scan` direction and returns the position of the first
/// wall pixel once two consecutive lines agree on it.
fn measure_border(img: &GrayImage, scan: Direction, config: &ExtractConfig) -> std::result::Result<u32, Detection> {
    let span = match scan {
        Direction::Left | Direction::Right => img.height(),
        Direction::Up | Direction::Down => img.width(),
    };

    let mut previous = None;
    for line in sample_lines(span).take(config.border_samples) {
        match first_wall(img, scan, line, config.wall_threshold) {
            None => {
                warn!("no wall found scanning {} along line {}", scan, line);
                previous = None;
            }
            Some(position) if previous == Some(position) => return Ok(position),
            found => previous = found,
        }
    }
    Err(Detection::BorderNotFound(scan))
}

/// The middle line first, then alternating outwards in steps of a sixth.
fn sample_lines(span: u32) -> impl Iterator<Item = u32> {
    let (mid, step) = (i64::from(span / 2), i64::from((span / 6).max(1)));
    (0..=2 * i64::from(span))
        .map(move |k| {
            let offset = (k + 1) / 2 * step;
            if k % 2 == 1 {
                mid + offset
            } else {
                mid - offset
            }
        })
        .filter(move |line| (0..i64::from(span)).contains(line))
        .map(|line| line as u32)
}

fn first_wall(img: &GrayImage, scan: Direction, line: u32, threshold: u8) -> Option<u32> {
    let (width, height) = img.dimensions();
    let wall = |x: u32, y: u32| img.get_pixel(x, y).0[0] < threshold;
    match scan {
        Direction::Right => (0..width).find(|&x| wall(x, line)),
        Direction::Left => (0..width).rev().find(|&x| wall(x, line)),
        Direction::Down => (0..height).find(|&y| wall(line, y)),
        Direction::Up => (0..height).rev().find(|&y| wall(line, y)),
    }
}

/// Lengths of the maximal runs of cells matching `wanted`.
fn runs(cells: impl IntoIterator<Item = Cell>, wanted: fn(Cell) -> bool) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = 0;
    for cell in cells {
        if wanted(cell) {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}

/// Narrowest opening along the four outer edges.
fn corridor_width(grid: &Grid, noise: usize) -> Option<usize> {
    if grid.rows() == 0 || grid.columns() == 0 {
        return None;
    }
    let (last_row, last_col) = (grid.rows() - 1, grid.columns() - 1);
    let edges: [Vec<Cell>; 4] = [
        grid.row(0).to_vec(),
        grid.column(last_col).collect(),
        grid.row(last_row).iter().rev().copied().collect(),
        grid.column(0).rev().collect(),
    ];

    edges
        .into_iter()
        .flat_map(|edge| runs(edge, Cell::is_open))
        .filter(|&run| run > noise)
        .min()
}

/// Thinnest wall band, taken as the smallest of the longest wall runs on
/// evenly spaced rows and columns. Lines without any opening are skipped.
fn wall_width(grid: &Grid, config: &ExtractConfig) -> Option<usize> {
    let samples = config.width_samples;
    let rows = (1..=samples).map(|k| k * grid.rows() / (samples + 1));
    let columns = (1..=samples).map(|k| k * grid.columns() / (samples + 1));

    let lines = rows
        .filter(|&r| r < grid.rows())
        .map(|r| grid.row(r).to_vec())
        .chain(
            columns
                .filter(|&c| c < grid.columns())
                .map(|c| grid.column(c).collect::<Vec<_>>()),
        );

    lines
        .filter(|line| line.iter().any(|cell| cell.is_open()))
        .filter_map(|line| runs(line, Cell::is_wall).into_iter().max())
        .filter(|&run| run > config.noise_threshold)
        .min()
}

/// Keeps the last pixel of every wall band and the first pixel of the
/// following corridor band, in both directions.
fn reduce_grid(full: &Grid, path_size: usize, wall_size: usize) -> Grid {
    let skip = path_size + wall_size;
    let mut rows = Vec::new();
    for i in (wall_size - 1..full.rows()).step_by(skip) {
        rows.push(reduce_line(full.row(i), skip, wall_size));
        if i + 1 < full.rows() {
            rows.push(reduce_line(full.row(i + 1), skip, wall_size));
        }
    }
    Grid::from_rows(rows)
}

fn reduce_line(line: &[Cell], skip: usize, wall_size: usize) -> Vec<Cell> {
    let mut reduced = Vec::new();
    for j in (wall_size - 1..line.len()).step_by(skip) {
        // a wall sample that disagrees with the corridor before it is a post
        if j < wall_size || line[j - wall_size] == line[j] {
            reduced.push(line[j]);
        } else {
            reduced.push(Cell::Wall);
        }
        if let Some(&next) = line.get(j + 1) {
            reduced.push(next);
        }
    }
    reduced
}
