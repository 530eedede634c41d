use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use mazepath::{solve, Algorithm, Cell, Coordinate, Detection, Grid, MazeError, MazeExtractor};

const MARGIN: u32 = 8;
const SCALE: u32 = 4;

/// Draws `grid` with every cell as a `SCALE` pixel square inside a white
/// margin.
fn rasterize(grid: &Grid) -> GrayImage {
    let width = grid.columns() as u32 * SCALE + 2 * MARGIN;
    let height = grid.rows() as u32 * SCALE + 2 * MARGIN;
    GrayImage::from_fn(width, height, |x, y| {
        let inside = (MARGIN..width - MARGIN).contains(&x) && (MARGIN..height - MARGIN).contains(&y);
        if !inside {
            return Luma([255]);
        }
        let cell = Coordinate::new(((y - MARGIN) / SCALE) as usize, ((x - MARGIN) / SCALE) as usize);
        if grid.get(cell).is_wall() {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

fn png_bytes(img: GrayImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img)
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .unwrap();
    bytes.into_inner()
}

fn create_maze() -> Grid {
    [
        "#.#######", //
        "#...#...#", //
        "#.#.#.#.#", //
        "#.#...#.#", //
        "#.#####.#", //
        "#.......#", //
        "#######.#", //
    ]
    .join("\n")
    .parse()
    .unwrap()
}

#[test]
fn test_hallway_reduces_to_three_cells() {
    // 5px corridor between 3px walls, open at both ends
    let img = GrayImage::from_fn(19, 19, |x, y| {
        let inside = (4..=14).contains(&x) && (4..=14).contains(&y);
        if inside && !(7..=11).contains(&y) {
            Luma([0])
        } else {
            Luma([255])
        }
    });

    let extraction = MazeExtractor::default().extract_bytes(&png_bytes(img)).unwrap();
    assert_eq!(extraction.path_size, 5);
    assert_eq!(extraction.wall_size, 3);

    let expected: Grid = "###\n...\n###".parse().unwrap();
    assert_eq!(extraction.grid, expected);
}

#[test]
fn test_rasterized_grid_extracts_to_itself() {
    let maze = create_maze();

    let first = MazeExtractor::default()
        .extract_bytes(&png_bytes(rasterize(&maze)))
        .unwrap();
    assert_eq!(first.path_size, SCALE as usize);
    assert_eq!(first.wall_size, SCALE as usize);
    assert_eq!(first.bounds.left, MARGIN);
    assert_eq!(first.bounds.top, MARGIN);
    assert_eq!(first.grid, maze);

    let second = MazeExtractor::default()
        .extract_bytes(&png_bytes(rasterize(&first.grid)))
        .unwrap();
    assert_eq!(second.grid, first.grid);
}

#[test]
fn test_extracted_maze_is_solvable() {
    let maze = create_maze();
    let extraction = MazeExtractor::default()
        .extract_bytes(&png_bytes(rasterize(&maze)))
        .unwrap();
    let grid = &extraction.grid;
    let openings = grid.openings();

    for algorithm in Algorithm::ALL {
        let log = solve(grid, openings[0], openings[1], algorithm).unwrap();
        let path = log.path();
        assert!(path.iter().all(|c| grid.get(*c) != Cell::Wall));
        assert!(log.path_cost().is_some(), "{} found no path", algorithm);
    }
}

#[test]
fn test_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("mazepath-extract-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("maze.png");
    rasterize(&create_maze()).save(&path).unwrap();

    let grid = mazepath::extract(&path).unwrap();
    assert_eq!(grid, create_maze());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_garbage_bytes_fail_to_decode() {
    let result = MazeExtractor::default().extract_bytes(b"not an image");
    assert!(matches!(result, Err(MazeError::ImageDecode(_))));
}

#[test]
fn test_missing_file_fails_to_decode() {
    let result = mazepath::extract("this/file/does/not/exist.png");
    assert!(matches!(result, Err(MazeError::ImageDecode(_))));
}

#[test]
fn test_blank_page_has_no_maze() {
    let img = GrayImage::from_pixel(40, 30, Luma([250]));
    let result = MazeExtractor::default().extract_bytes(&png_bytes(img));
    assert!(matches!(
        result,
        Err(MazeError::NoMazeDetected(Detection::BorderNotFound(_)))
    ));
}
