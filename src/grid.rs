use std::fmt::{Display, Formatter, Write};
use std::io::{Cursor, Read};

use bitvec::bitvec;

use crate::color::{Cell, Color};
use crate::dir::Dir;
use crate::GridError;

const SNAPSHOT_HEADER: &[u8; 8] = b"PXGRID\x00\x97";
const SNAPSHOT_VERSION: u32 = 0x01;

// Snapshot cell word: 0 = blank, otherwise PAINTED_BIT | 0xRRGGBB.
const PAINTED_BIT: u32 = 1 << 24;

/// Fixed-size paint surface. Cells are stored row-major
/// (`index = y * width + x`); dimensions never change after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(48, 30)
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        for (i, cell) in self.cells.iter().enumerate() {
            f.write_char(if cell.is_blank() { '.' } else { '#' })?;
            if i % self.width == self.width - 1 {
                f.write_char('\n')?;
            }
        }
        Ok(())
    }
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        if width == 0 || height == 0 {
            panic!("grid must have at least one cell")
        }
        let cells = vec![Default::default(); width * height];
        Self {
            width,
            height,
            cells,
        }
    }

    /// Build a grid from a row-major cell list, e.g. a restored snapshot.
    pub fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Result<Self, GridError> {
        if cells.len() != width * height {
            return Err(GridError::DimensionMismatch {
                expected: width * height,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub const fn index_of(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y * self.width + x)
        } else {
            None
        }
    }

    pub const fn pos_of(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.index_of(x, y).map(|idx| self.cells[idx])
    }

    /// Single-cell paint: unconditionally overwrites whatever is there.
    pub fn set(&mut self, x: usize, y: usize, paint: Cell) -> Result<(), GridError> {
        let idx = self.index_of(x, y).ok_or(GridError::OutOfBounds { x, y })?;
        self.cells[idx] = paint;
        Ok(())
    }

    /// Recolor the maximal 4-connected blank region containing `(x, y)`.
    ///
    /// Painted cells act as barriers and are never overwritten; a painted
    /// seed recolors nothing. Returns the indices that were recolored.
    /// Traversal uses an explicit stack so region size never threatens the
    /// call stack.
    pub fn flood_fill(&mut self, x: usize, y: usize, paint: Cell) -> Result<Vec<usize>, GridError> {
        let start = self.index_of(x, y).ok_or(GridError::OutOfBounds { x, y })?;
        let mut recolored = Vec::new();
        if !self.cells[start].is_blank() {
            return Ok(recolored);
        }
        let mut visited = bitvec![0; self.cells.len()];
        let mut to_visit = vec![start];
        while let Some(pos) = to_visit.pop() {
            if visited[pos] {
                continue;
            }
            visited.set(pos, true);
            self.cells[pos] = paint;
            recolored.push(pos);
            for dir in Dir::ALL {
                let Some(nbr) = dir.nbr_of(pos, self.width, self.height) else {
                    continue;
                };
                if !visited[nbr] && self.cells[nbr].is_blank() {
                    to_visit.push(nbr);
                }
            }
        }
        Ok(recolored)
    }

    /*
    8-byte magic header
    u32 format version
    u32 width
    u32 height

    [u32; width*height] cell, row-major:
        0 = blank
        bit 24 set, bits 0-23 = 0xRRGGBB for a painted cell
    */
    pub fn write_snapshot(&self) -> Vec<u8> {
        let mut serialized = Vec::with_capacity(16 + self.cells.len() * 4);
        serialized.extend(SNAPSHOT_HEADER);
        serialized.extend(SNAPSHOT_VERSION.to_be_bytes());
        serialized.extend((self.width as u32).to_be_bytes());
        serialized.extend((self.height as u32).to_be_bytes());
        for cell in &self.cells {
            let word = match cell {
                Cell::Blank => 0,
                Cell::Painted(color) => PAINTED_BIT | color.rgb24(),
            };
            serialized.extend(word.to_be_bytes());
        }
        serialized
    }

    /// Restore a snapshot written by [`Grid::write_snapshot`]. Any defect
    /// rejects the whole snapshot; nothing is ever partially applied.
    pub fn read_snapshot(serialized: &[u8]) -> Result<Self, GridError> {
        let mut cursor = Cursor::new(serialized);
        let mut scratch_buf = [0u8; 8];
        cursor
            .read_exact(&mut scratch_buf)
            .map_err(|_| GridError::BadHeader)?;
        if &scratch_buf != SNAPSHOT_HEADER {
            return Err(GridError::BadHeader);
        }
        cursor
            .read_exact(&mut scratch_buf[..4])
            .map_err(|_| GridError::BadHeader)?;
        if scratch_buf[..4] != SNAPSHOT_VERSION.to_be_bytes() {
            return Err(GridError::UnsupportedVersion);
        }
        let mut read_u32 = |cursor: &mut Cursor<&[u8]>| -> Result<usize, GridError> {
            cursor
                .read_exact(&mut scratch_buf[..4])
                .map_err(|_| GridError::BadHeader)?;
            let word: &[u8; 4] = scratch_buf[..4].try_into().map_err(|_| GridError::BadHeader)?;
            Ok(u32::from_be_bytes(*word) as usize)
        };
        let width = read_u32(&mut cursor)?;
        let height = read_u32(&mut cursor)?;
        if width == 0 || height == 0 {
            return Err(GridError::BadHeader);
        }
        let body = &serialized[cursor.position() as usize..];
        if body.len() != width * height * 4 {
            return Err(GridError::DimensionMismatch {
                expected: width * height,
                actual: body.len() / 4,
            });
        }
        let mut cells = Vec::with_capacity(width * height);
        for chunk in body.chunks_exact(4) {
            let word = u32::from_be_bytes(chunk.try_into().map_err(|_| GridError::InvalidCell)?);
            cells.push(match word {
                0 => Cell::Blank,
                w if w & PAINTED_BIT != 0 && w >> 25 == 0 => {
                    // Cell::from re-normalizes a painted-white word to blank.
                    Cell::from(Color::from_rgb24(w))
                }
                _ => return Err(GridError::InvalidCell),
            });
        }
        Self::from_cells(width, height, cells)
    }

    /// Export as a truecolor PNG, one pixel per cell, blank cells white.
    pub fn to_png(&self) -> Vec<u8> {
        let mut serialized = Vec::new();
        let mut encoder = png::Encoder::new(
            Cursor::new(&mut serialized),
            self.width as u32,
            self.height as u32,
        );
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut pixels = Vec::with_capacity(self.cells.len() * 3);
        for cell in &self.cells {
            let color = cell.color();
            pixels.extend([color.r(), color.g(), color.b()]);
        }
        {
            let mut pix_writer = encoder.write_header().expect("png header");
            pix_writer.write_image_data(&pixels).expect("png image data");
        }
        serialized
    }

    /// Import a PNG written by [`Grid::to_png`]. White pixels come back as
    /// blank cells, so export/import round-trips the visual state exactly.
    pub fn from_png(data: &[u8]) -> Result<Self, GridError> {
        let decoder = png::Decoder::new(Cursor::new(data));
        let mut reader = decoder.read_info().map_err(|_| GridError::BadImage)?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).map_err(|_| GridError::BadImage)?;
        if info.color_type != png::ColorType::Rgb || info.bit_depth != png::BitDepth::Eight {
            return Err(GridError::BadImage);
        }
        let (width, height) = (info.width as usize, info.height as usize);
        if width == 0 || height == 0 {
            return Err(GridError::BadImage);
        }
        let cells = buf[..info.buffer_size()]
            .chunks_exact(3)
            .map(|px| Cell::from(Color::rgb(px[0], px[1], px[2])))
            .collect();
        Self::from_cells(width, height, cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Cell = Cell::Painted(Color::rgb(0xff, 0x0c, 0x00));
    const BLUE: Cell = Cell::Painted(Color::rgb(0x28, 0x1e, 0xff));
    const GREEN: Cell = Cell::Painted(Color::rgb(0x0c, 0xff, 0x00));

    #[test]
    fn set_overwrites_painted_cells() {
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, RED).unwrap();
        grid.set(1, 1, BLUE).unwrap();
        assert_eq!(grid.get(1, 1), Some(BLUE));
    }

    #[test]
    fn set_rejects_out_of_bounds() {
        let mut grid = Grid::new(3, 3);
        assert_eq!(
            grid.set(3, 0, RED),
            Err(GridError::OutOfBounds { x: 3, y: 0 })
        );
        assert_eq!(grid.get(2, 2), Some(Cell::Blank));
    }

    #[test]
    fn fill_rejects_out_of_bounds_seed() {
        let mut grid = Grid::new(3, 3);
        assert_eq!(
            grid.flood_fill(0, 3, BLUE),
            Err(GridError::OutOfBounds { x: 0, y: 3 })
        );
        assert!(grid.cells().iter().all(|cell| cell.is_blank()));
    }

    #[test]
    fn fill_paints_every_reachable_blank_cell() {
        let mut grid = Grid::new(4, 4);
        let recolored = grid.flood_fill(2, 1, BLUE).unwrap();
        assert_eq!(recolored.len(), 16);
        assert!(grid.cells().iter().all(|&cell| cell == BLUE));
    }

    #[test]
    fn fill_around_center_obstacle_leaves_it_untouched() {
        // 3x3, center red: the border ring stays connected around it.
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, RED).unwrap();
        let recolored = grid.flood_fill(0, 0, BLUE).unwrap();
        assert_eq!(recolored.len(), 8);
        assert_eq!(grid.get(1, 1), Some(RED));
        for idx in 0..9 {
            let (x, y) = grid.pos_of(idx);
            if (x, y) != (1, 1) {
                assert_eq!(grid.get(x, y), Some(BLUE));
            }
        }
    }

    #[test]
    fn fill_stops_at_a_painted_barrier() {
        // 3x1 with a red middle cell: the far side is unreachable.
        let mut grid = Grid::new(3, 1);
        grid.set(1, 0, RED).unwrap();
        let recolored = grid.flood_fill(0, 0, GREEN).unwrap();
        assert_eq!(recolored, vec![0]);
        assert_eq!(grid.get(0, 0), Some(GREEN));
        assert_eq!(grid.get(1, 0), Some(RED));
        assert_eq!(grid.get(2, 0), Some(Cell::Blank));
    }

    #[test]
    fn fill_never_leaks_across_a_wall() {
        // Vertical red wall at x=2 splits a 5x3 grid in two.
        let mut grid = Grid::new(5, 3);
        for y in 0..3 {
            grid.set(2, y, RED).unwrap();
        }
        grid.flood_fill(0, 1, BLUE).unwrap();
        for y in 0..3 {
            for x in 0..5 {
                let expected = match x {
                    0 | 1 => BLUE,
                    2 => RED,
                    _ => Cell::Blank,
                };
                assert_eq!(grid.get(x, y), Some(expected), "({x}, {y})");
            }
        }
    }

    #[test]
    fn fill_on_painted_seed_changes_nothing() {
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, RED).unwrap();
        let before = grid.clone();
        let recolored = grid.flood_fill(1, 1, BLUE).unwrap();
        assert!(recolored.is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn refilling_a_filled_region_is_idempotent() {
        let mut grid = Grid::new(3, 3);
        grid.flood_fill(0, 0, BLUE).unwrap();
        let before = grid.clone();
        let recolored = grid.flood_fill(0, 0, BLUE).unwrap();
        assert!(recolored.is_empty());
        assert_eq!(grid, before);
    }

    #[test]
    fn fill_from_corner_of_single_cell_grid() {
        let mut grid = Grid::new(1, 1);
        let recolored = grid.flood_fill(0, 0, GREEN).unwrap();
        assert_eq!(recolored, vec![0]);
        assert_eq!(grid.get(0, 0), Some(GREEN));
    }

    #[test]
    fn snapshot_round_trips_exactly() {
        let mut grid = Grid::new(4, 3);
        grid.set(0, 0, RED).unwrap();
        grid.set(3, 2, BLUE).unwrap();
        grid.flood_fill(1, 1, GREEN).unwrap();
        let restored = Grid::read_snapshot(&grid.write_snapshot()).unwrap();
        assert_eq!(restored, grid);
    }

    #[test]
    fn snapshot_round_trips_blank_cells() {
        let grid = Grid::new(2, 2);
        let restored = Grid::read_snapshot(&grid.write_snapshot()).unwrap();
        assert!(restored.cells().iter().all(|cell| cell.is_blank()));
    }

    #[test]
    fn read_rejects_foreign_bytes() {
        assert_eq!(Grid::read_snapshot(b""), Err(GridError::BadHeader));
        assert_eq!(
            Grid::read_snapshot(b"NOTAGRID\x00\x00\x00\x01"),
            Err(GridError::BadHeader)
        );
    }

    #[test]
    fn read_rejects_unknown_version() {
        let mut snapshot = Grid::new(2, 2).write_snapshot();
        snapshot[11] = 0x7f;
        assert_eq!(
            Grid::read_snapshot(&snapshot),
            Err(GridError::UnsupportedVersion)
        );
    }

    #[test]
    fn read_rejects_truncated_body() {
        let mut snapshot = Grid::new(2, 2).write_snapshot();
        snapshot.truncate(snapshot.len() - 4);
        assert_eq!(
            Grid::read_snapshot(&snapshot),
            Err(GridError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn read_rejects_malformed_cell_words() {
        let mut snapshot = Grid::new(1, 1).write_snapshot();
        let malformed = 0xff00_0000u32.to_be_bytes();
        let body = snapshot.len() - 4;
        snapshot[body..].copy_from_slice(&malformed);
        assert_eq!(Grid::read_snapshot(&snapshot), Err(GridError::InvalidCell));
    }

    #[test]
    fn from_cells_rejects_wrong_length() {
        assert_eq!(
            Grid::from_cells(3, 3, vec![Cell::Blank; 8]),
            Err(GridError::DimensionMismatch {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn png_round_trips_including_blanks() {
        let mut grid = Grid::new(5, 4);
        grid.set(0, 3, RED).unwrap();
        grid.set(4, 0, BLUE).unwrap();
        let restored = Grid::from_png(&grid.to_png()).unwrap();
        assert_eq!(restored, grid);
    }

    #[test]
    fn from_png_rejects_non_png_bytes() {
        assert_eq!(Grid::from_png(b"not a png"), Err(GridError::BadImage));
    }
}
