//! Keyboard layout engine
//!
//! Computes the geometry of every key for a display region and a range of
//! octaves. White keys split the region into equal columns; black keys
//! straddle the boundary after every white key that has a sharp.

use crate::error::{Error, Result};
use crate::note::{Note, WHITE_LETTERS};
use serde::{Deserialize, Serialize};

/// Octaves rendered by default (C4 - B5)
pub const DEFAULT_OCTAVES: [i8; 2] = [4, 5];

/// Black key width relative to a white key column
pub const BLACK_KEY_WIDTH_RATIO: f32 = 0.6;

/// Black key height relative to the white key height
pub const BLACK_KEY_HEIGHT_RATIO: f32 = 0.6;

/// A point in display coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Center of a terminal cell
    pub fn cell_center(column: u16, row: u16) -> Self {
        Self::new(column as f32 + 0.5, row as f32 + 0.5)
    }
}

/// Axis-aligned rectangle in display coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether the point lies inside; left/top edges inclusive, right/bottom exclusive
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Whether the horizontal extents of the two rectangles overlap
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right()
    }
}

/// One drawable, clickable key
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    pub note: Note,
    pub bounds: Rect,
    pub is_black: bool,
    pub is_pressed: bool,
}

impl Key {
    fn new(note: Note, bounds: Rect, is_black: bool) -> Self {
        Self {
            note,
            bounds,
            is_black,
            is_pressed: false,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }
}

/// Space reserved above and below the keys for status text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Rows (or pixels) above the keys
    pub margin_top: u32,
    /// Rows (or pixels) below the keys
    pub margin_bottom: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            margin_top: 2,
            margin_bottom: 2,
        }
    }
}

/// Compute the keyboard layout with the default margins
pub fn compute_layout(width: u32, height: u32, octaves: &[i8]) -> Result<Vec<Key>> {
    compute_layout_with(&LayoutSettings::default(), width, height, octaves)
}

/// Compute the keyboard layout for a `width` x `height` region.
///
/// Returns all white keys in column order followed by all black keys in
/// column order. Renderers draw in this order so black keys end up on top.
pub fn compute_layout_with(
    settings: &LayoutSettings,
    width: u32,
    height: u32,
    octaves: &[i8],
) -> Result<Vec<Key>> {
    if octaves.is_empty() {
        return Err(Error::DegenerateGeometry("no octaves to lay out".to_string()));
    }
    for (i, octave) in octaves.iter().enumerate() {
        if octaves[..i].contains(octave) {
            return Err(Error::DegenerateGeometry(format!(
                "octave {} listed more than once",
                octave
            )));
        }
    }

    let columns = (WHITE_LETTERS.len() * octaves.len()) as u32;
    let column_width = width / columns;
    if column_width == 0 {
        return Err(Error::DegenerateGeometry(format!(
            "width {} is too narrow for {} white keys",
            width, columns
        )));
    }

    let margins = settings.margin_top.saturating_add(settings.margin_bottom);
    if height <= margins {
        return Err(Error::DegenerateGeometry(format!(
            "height {} leaves no room for keys between margins of {}",
            height, margins
        )));
    }

    if column_width < 2 {
        log::warn!(
            "White keys are {} unit wide, black keys are narrower than one unit",
            column_width
        );
    }

    let column_width = column_width as f32;
    let top = settings.margin_top as f32;
    let white_height = (height - margins) as f32;
    let black_width = column_width * BLACK_KEY_WIDTH_RATIO;
    let black_height = white_height * BLACK_KEY_HEIGHT_RATIO;

    let mut whites = Vec::with_capacity(columns as usize);
    let mut blacks = Vec::with_capacity(5 * octaves.len());

    let letters = octaves
        .iter()
        .flat_map(|&octave| WHITE_LETTERS.iter().map(move |&letter| (letter, octave)));
    for (column, (letter, octave)) in letters.enumerate() {
        let x = column as f32 * column_width;
        whites.push(Key::new(
            Note::new(letter, octave),
            Rect::new(x, top, column_width, white_height),
            false,
        ));

        if let Some(sharp) = letter.sharp() {
            blacks.push(Key::new(
                Note::new(sharp, octave),
                Rect::new(x + column_width - black_width / 2.0, top, black_width, black_height),
                true,
            ));
        }
    }

    whites.append(&mut blacks);
    Ok(whites)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Letter;
    use std::collections::HashSet;

    #[test]
    fn test_key_counts_per_octave() {
        let octave_sets: [&[i8]; 4] = [&[4], &[4, 5], &[3, 4, 5], &[0, 1, 2, 3, 4, 5, 6]];
        for octaves in octave_sets {
            let keys = compute_layout(700, 40, octaves).unwrap();
            let whites = keys.iter().filter(|k| !k.is_black).count();
            let blacks = keys.iter().filter(|k| k.is_black).count();
            assert_eq!(whites, 7 * octaves.len());
            assert_eq!(blacks, 5 * octaves.len());

            let notes: HashSet<_> = keys.iter().map(|k| k.note).collect();
            assert_eq!(notes.len(), keys.len());
        }
    }

    #[test]
    fn test_whites_before_blacks() {
        let keys = compute_layout(140, 30, &DEFAULT_OCTAVES).unwrap();
        let first_black = keys.iter().position(|k| k.is_black).unwrap();
        assert_eq!(first_black, 14);
        assert!(keys[first_black..].iter().all(|k| k.is_black));
        assert!(keys.iter().all(|k| !k.is_pressed));
    }

    #[test]
    fn test_default_two_octaves() {
        let keys = compute_layout(1400, 600, &DEFAULT_OCTAVES).unwrap();
        let names: Vec<_> = keys.iter().map(|k| k.note.to_string()).collect();
        assert_eq!(
            names,
            [
                "C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5", "D5", "E5", "F5", "G5", "A5",
                "B5", "C#4", "D#4", "F#4", "G#4", "A#4", "C#5", "D#5", "F#5", "G#5", "A#5",
            ]
        );
    }

    #[test]
    fn test_pixel_geometry() {
        // The classic 1400x600 window with 50px margins
        let settings = LayoutSettings {
            margin_top: 50,
            margin_bottom: 50,
        };
        let keys = compute_layout_with(&settings, 1400, 600, &DEFAULT_OCTAVES).unwrap();

        let e4 = &keys[2];
        assert_eq!(e4.note, Note::new(Letter::E, 4));
        assert_eq!(e4.bounds, Rect::new(200.0, 50.0, 100.0, 500.0));

        let close = |a: f32, b: f32| (a - b).abs() < 1e-3;

        let c_sharp = keys.iter().find(|k| k.note == Note::new(Letter::CSharp, 4)).unwrap();
        assert!(close(c_sharp.bounds.x, 70.0));
        assert!(close(c_sharp.bounds.y, 50.0));
        assert!(close(c_sharp.bounds.width, 60.0));
        assert!(close(c_sharp.bounds.height, 300.0));

        let a_sharp5 = keys.iter().find(|k| k.note == Note::new(Letter::ASharp, 5)).unwrap();
        assert!(close(a_sharp5.bounds.x, 1270.0));
    }

    #[test]
    fn test_integer_column_width() {
        // 1000 / 14 = 71 with the remainder left unused
        let keys = compute_layout(1000, 100, &DEFAULT_OCTAVES).unwrap();
        assert!(keys.iter().filter(|k| !k.is_black).all(|k| k.bounds.width == 71.0));
        assert_eq!(keys[13].bounds.right(), 994.0);
    }

    #[test]
    fn test_black_keys_straddle_neighbours() {
        let keys = compute_layout(980, 60, &[3, 4, 5]).unwrap();
        let whites: Vec<_> = keys.iter().filter(|k| !k.is_black).collect();
        let white_top = whites[0].bounds.y;
        let white_height = whites[0].bounds.height;

        for black in keys.iter().filter(|k| k.is_black) {
            let left = whites
                .iter()
                .position(|w| w.note.letter.sharp() == Some(black.note.letter) && w.note.octave == black.note.octave)
                .unwrap();
            let right = whites[left + 1];
            assert!(black.bounds.overlaps_horizontally(&whites[left].bounds));
            assert!(black.bounds.overlaps_horizontally(&right.bounds));
            assert!(black.bounds.y >= white_top);
            assert!(black.bounds.bottom() <= white_top + white_height * BLACK_KEY_HEIGHT_RATIO + 1e-3);
        }
    }

    #[test]
    fn test_degenerate_geometry() {
        assert!(matches!(compute_layout(13, 100, &DEFAULT_OCTAVES), Err(Error::DegenerateGeometry(_))));
        assert!(matches!(compute_layout(140, 4, &DEFAULT_OCTAVES), Err(Error::DegenerateGeometry(_))));
        assert!(matches!(compute_layout(140, 100, &[]), Err(Error::DegenerateGeometry(_))));
        assert!(matches!(compute_layout(140, 100, &[4, 4]), Err(Error::DegenerateGeometry(_))));
        assert!(compute_layout(14, 5, &DEFAULT_OCTAVES).is_ok());
    }

    #[test]
    fn test_rect_contains_half_open() {
        let rect = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(14.9, 14.9)));
        assert!(!rect.contains(Point::new(15.0, 12.0)));
        assert!(!rect.contains(Point::new(12.0, 15.0)));
        assert_eq!(Point::cell_center(3, 4), Point::new(3.5, 4.5));
    }
}
