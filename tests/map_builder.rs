use image::{DynamicImage, Rgb, RgbImage};
use std::collections::VecDeque;

use tile_mapper::TileCatalog;
use tile_mapper::imaging::{NoPreview, PreviewSink, Tile};
use tile_mapper::labeler::{LabelDecision, Labeler, SkipLabeler};
use tile_mapper::matcher::{HashMatcher, PixelMatcher};
use tile_mapper::{MapBuilder, MapOutcome, MapperConfig, MapperError};

#[derive(Clone, Copy)]
enum Pattern {
    Solid(u8),
    Checker,
}

fn paint(img: &mut RgbImage, row: u32, col: u32, pattern: Pattern) {
    for dy in 0..16 {
        for dx in 0..16 {
            let (x, y) = (col * 16 + dx, row * 16 + dy);
            if x >= img.width() || y >= img.height() {
                continue;
            }
            let v = match pattern {
                Pattern::Solid(v) => v,
                Pattern::Checker => if (dx / 4 + dy / 4) % 2 == 0 { 30 } else { 220 },
            };
            img.put_pixel(x, y, Rgb([v, v, v]));
        }
    }
}

const WALL: Pattern = Pattern::Solid(40);
const FLOOR: Pattern = Pattern::Solid(200);
const DOOR: Pattern = Pattern::Checker;

/// wall floor wall
/// door floor wall
fn dungeon() -> DynamicImage {
    let mut img = RgbImage::new(48, 32);
    let layout = [[WALL, FLOOR, WALL], [DOOR, FLOOR, WALL]];
    for (r, row) in layout.iter().enumerate() {
        for (c, pattern) in row.iter().enumerate() {
            paint(&mut img, r as u32, c as u32, *pattern);
        }
    }
    DynamicImage::ImageRgb8(img)
}

struct ScriptedLabeler {
    answers: VecDeque<LabelDecision>,
    asked: Vec<(u32, u32)>,
}

impl ScriptedLabeler {
    fn new(answers: &[LabelDecision]) -> Self {
        Self {
            answers: answers.iter().cloned().collect(),
            asked: Vec::new(),
        }
    }
}

impl Labeler for ScriptedLabeler {
    fn label_tile(&mut self, tile: &Tile) -> Result<LabelDecision, MapperError> {
        self.asked.push((tile.row, tile.col));
        Ok(self
            .answers
            .pop_front()
            .expect("labeler asked more often than scripted"))
    }
}

/// Answers from a script, then fails like a closed terminal.
struct FailingLabeler {
    answers: VecDeque<LabelDecision>,
}

impl Labeler for FailingLabeler {
    fn label_tile(&mut self, _tile: &Tile) -> Result<LabelDecision, MapperError> {
        self.answers.pop_front().ok_or_else(|| {
            MapperError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "terminal went away",
            ))
        })
    }
}

#[derive(Default)]
struct RecordingPreview {
    shown: Vec<(u32, u32, u32, u32)>,
}

impl PreviewSink for RecordingPreview {
    fn show(&mut self, tile: &Tile, preview: &RgbImage) -> Result<(), MapperError> {
        self.shown
            .push((tile.row, tile.col, preview.width(), preview.height()));
        Ok(())
    }
}

fn label(s: &str) -> LabelDecision {
    LabelDecision::Label(s.to_string())
}

fn rows(grid: &tile_mapper::LabelGrid) -> Vec<Vec<&str>> {
    grid.rows()
        .iter()
        .map(|r| r.iter().map(String::as_str).collect())
        .collect()
}

#[test]
fn asks_once_per_new_tile_type() {
    let mut catalog = TileCatalog::new();
    let mut labeler = ScriptedLabeler::new(&[label("wall"), label("floor"), label("door")]);
    let mut preview = RecordingPreview::default();

    let outcome = MapBuilder::new(MapperConfig::default())
        .build(&dungeon(), &mut catalog, &HashMatcher, &mut labeler, &mut preview)
        .expect("build failed");

    assert!(outcome.completed);
    assert_eq!(
        rows(&outcome.grid),
        vec![vec!["wall", "floor", "wall"], vec!["door", "floor", "wall"]]
    );
    assert_eq!(labeler.asked, vec![(0, 0), (0, 1), (1, 0)]);
    assert_eq!((outcome.learned, outcome.recognized, outcome.skipped), (3, 3, 0));
    assert_eq!(catalog.len(), 3);

    // Corner tile: one tile of context right and below, magnified 16x.
    assert_eq!(preview.shown[0], (0, 0, 512, 512));
    // Middle of the top row: context on both sides.
    assert_eq!(preview.shown[1], (0, 1, 768, 512));
}

#[test]
fn second_pass_needs_no_operator() {
    let mut catalog = TileCatalog::new();
    let builder = MapBuilder::new(MapperConfig::default());
    let mut first = ScriptedLabeler::new(&[label("wall"), label("floor"), label("door")]);
    let expected = builder
        .build(&dungeon(), &mut catalog, &HashMatcher, &mut first, &mut NoPreview)
        .unwrap();

    let mut second = ScriptedLabeler::new(&[]);
    let outcome = builder
        .build(&dungeon(), &mut catalog, &HashMatcher, &mut second, &mut NoPreview)
        .unwrap();

    assert!(second.asked.is_empty());
    assert_eq!(outcome.grid, expected.grid);
    assert_eq!(outcome.recognized, 6);
}

#[test]
fn catalog_is_saved_after_each_label() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("known_tiles.json");
    let mut catalog = TileCatalog::new();
    let mut labeler = ScriptedLabeler::new(&[label("wall"), LabelDecision::Quit]);

    let outcome = MapBuilder::new(MapperConfig::default())
        .with_catalog_path(&path)
        .build(&dungeon(), &mut catalog, &HashMatcher, &mut labeler, &mut NoPreview)
        .unwrap();

    assert!(!outcome.completed);
    assert_eq!(rows(&outcome.grid), vec![vec!["wall"]]);

    let saved = TileCatalog::load_or_default(&path).unwrap();
    assert_eq!(saved.labels().collect::<Vec<_>>(), vec!["wall"]);
    assert_eq!(saved.entry("wall").unwrap().hashes.len(), 1);
}

#[test]
fn skipped_tiles_are_unknown_and_not_learned() {
    let mut catalog = TileCatalog::new();
    let outcome = MapBuilder::new(MapperConfig::default())
        .build(&dungeon(), &mut catalog, &HashMatcher, &mut SkipLabeler, &mut NoPreview)
        .unwrap();

    assert!(outcome.completed);
    assert_eq!(outcome.skipped, 6);
    assert!(catalog.is_empty());
    assert_eq!(outcome.grid.label_counts().get("unknown"), Some(&6));
}

#[test]
fn pixel_matcher_absorbs_small_noise() {
    let mut img = RgbImage::new(32, 16);
    paint(&mut img, 0, 0, Pattern::Solid(100));
    paint(&mut img, 0, 1, Pattern::Solid(100));
    img.put_pixel(20, 5, Rgb([130, 130, 130]));

    let config = MapperConfig {
        keep_samples: true,
        pixel_tolerance: 0.05,
        ..MapperConfig::default()
    };
    let mut catalog = TileCatalog::new();
    let mut labeler = ScriptedLabeler::new(&[label("grass")]);
    let outcome = MapBuilder::new(config)
        .build(
            &DynamicImage::ImageRgb8(img),
            &mut catalog,
            &PixelMatcher::new(0.05),
            &mut labeler,
            &mut NoPreview,
        )
        .unwrap();

    assert_eq!(rows(&outcome.grid), vec![vec!["grass", "grass"]]);
    assert_eq!(labeler.asked.len(), 1);
    // The noisy variant is remembered by hash for exact lookups later.
    assert_eq!(catalog.entry("grass").unwrap().hashes.len(), 2);
    assert_eq!(catalog.samples("grass").len(), 1);
}

#[test]
fn hash_matcher_treats_noise_as_new_tile() {
    let mut img = RgbImage::new(32, 16);
    paint(&mut img, 0, 0, Pattern::Solid(100));
    paint(&mut img, 0, 1, Pattern::Solid(100));
    img.put_pixel(20, 5, Rgb([130, 130, 130]));

    let mut catalog = TileCatalog::new();
    let mut labeler = ScriptedLabeler::new(&[label("grass"), label("grass")]);
    let outcome = MapBuilder::new(MapperConfig::default())
        .build(
            &DynamicImage::ImageRgb8(img),
            &mut catalog,
            &HashMatcher,
            &mut labeler,
            &mut NoPreview,
        )
        .unwrap();

    assert_eq!(labeler.asked.len(), 2);
    assert_eq!(rows(&outcome.grid), vec![vec!["grass", "grass"]]);
    assert_eq!(catalog.entry("grass").unwrap().hashes.len(), 2);
}

#[test]
fn partial_edge_tiles_are_labeled() {
    let mut img = RgbImage::new(40, 16);
    paint(&mut img, 0, 0, WALL);
    paint(&mut img, 0, 1, WALL);
    paint(&mut img, 0, 2, WALL);

    let mut catalog = TileCatalog::new();
    let mut labeler = ScriptedLabeler::new(&[label("wall"), label("wall_edge")]);
    let outcome = MapBuilder::new(MapperConfig::default())
        .build(
            &DynamicImage::ImageRgb8(img),
            &mut catalog,
            &HashMatcher,
            &mut labeler,
            &mut NoPreview,
        )
        .unwrap();

    assert_eq!(rows(&outcome.grid), vec![vec!["wall", "wall", "wall_edge"]]);
    assert_eq!(labeler.asked, vec![(0, 0), (0, 2)]);
}

#[test]
fn invalid_config_is_rejected_before_labeling() {
    let config = MapperConfig {
        tile_height: 0,
        ..MapperConfig::default()
    };
    let mut catalog = TileCatalog::new();
    let result = MapBuilder::new(config).build(
        &dungeon(),
        &mut catalog,
        &HashMatcher,
        &mut SkipLabeler,
        &mut NoPreview,
    );
    assert!(matches!(result, Err(MapperError::InvalidConfig(_))));
}

#[test]
fn failure_mid_map_keeps_labeled_rows() {
    let mut catalog = TileCatalog::new();
    // Row 0 needs wall and floor; row 1 starts with an unseen door.
    let mut labeler = FailingLabeler {
        answers: [label("wall"), label("floor")].into_iter().collect(),
    };
    let mut outcome = MapOutcome::default();

    let result = MapBuilder::new(MapperConfig::default()).build_into(
        &dungeon(),
        &mut catalog,
        &HashMatcher,
        &mut labeler,
        &mut NoPreview,
        &mut outcome,
    );

    assert!(matches!(result, Err(MapperError::Io(_))));
    assert!(!outcome.completed);
    assert_eq!(rows(&outcome.grid), vec![vec!["wall", "floor", "wall"]]);
    assert_eq!(outcome.learned, 2);
    assert_eq!(catalog.len(), 2);
}

#[test]
fn failure_keeps_partial_current_row() {
    let mut catalog = TileCatalog::new();
    let mut labeler = FailingLabeler {
        answers: [label("wall")].into_iter().collect(),
    };
    let mut outcome = MapOutcome::default();

    let result = MapBuilder::new(MapperConfig::default()).build_into(
        &dungeon(),
        &mut catalog,
        &HashMatcher,
        &mut labeler,
        &mut NoPreview,
        &mut outcome,
    );

    assert!(result.is_err());
    assert_eq!(rows(&outcome.grid), vec![vec!["wall"]]);
}
