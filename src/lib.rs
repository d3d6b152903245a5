mod utils;

pub mod color;
pub mod dir;
pub mod grid;
pub mod palette;

use std::fmt::{Display, Formatter};

use rand::thread_rng;
use wasm_bindgen::prelude::*;

pub use color::{Cell, Color, ParseColorError};
pub use grid::Grid;
pub use palette::{generate_palette, ColorHistory, DEFAULT_PALETTE};

const CELL_SIZE: usize = 16;
const BORDER_SIZE: usize = 1;
const BORDER_FILL: Color = Color::rgb(0xcc, 0xcc, 0xcc);
const DEFAULT_WIDTH: usize = 48;
const DEFAULT_HEIGHT: usize = 30;

pub type Pcg = rand_pcg::Pcg32;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

#[cfg(not(target_arch = "wasm32"))]
fn log(s: &str) {
    eprintln!("{s}");
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridError {
    OutOfBounds { x: usize, y: usize },
    DimensionMismatch { expected: usize, actual: usize },
    BadHeader,
    UnsupportedVersion,
    InvalidCell,
    BadImage,
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        match self {
            GridError::OutOfBounds { x, y } => {
                write!(f, "position ({x}, {y}) is outside the grid")
            }
            GridError::DimensionMismatch { expected, actual } => {
                write!(f, "snapshot holds {actual} cells, grid needs {expected}")
            }
            GridError::BadHeader => write!(f, "not a grid snapshot"),
            GridError::UnsupportedVersion => write!(f, "unsupported snapshot version"),
            GridError::InvalidCell => write!(f, "malformed cell in snapshot"),
            GridError::BadImage => write!(f, "image is not an exported grid"),
        }
    }
}

impl std::error::Error for GridError {}

/// The browser-facing paint surface: owns the grid, the rendered pixel
/// buffer, and the interaction state (selected color, paint mode, recent
/// colors, drag tracking). The JS side blits `pix_buf` onto a `<canvas>`
/// and forwards pointer events.
#[wasm_bindgen]
pub struct Painter {
    grid: Grid,
    pix_buf: Vec<u8>,
    selected: Option<Cell>,
    fill_mode: bool,
    history: ColorHistory,
    is_mouse_down: bool,
}

impl Default for Painter {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

#[wasm_bindgen]
impl Painter {
    fn set_pix(buf: &mut [u8], loc: usize, color: u32) {
        buf[loc * 4..loc * 4 + 4].copy_from_slice(&color.to_be_bytes());
    }

    pub fn new(width: usize, height: usize) -> Self {
        utils::set_panic_hook();
        let grid = Grid::new(width, height);
        let total_width = width * CELL_SIZE + (width - 1) * BORDER_SIZE;
        let total_height = height * CELL_SIZE + (height - 1) * BORDER_SIZE;
        let mut pix_buf = (0..(total_width * total_height * 4))
            .map(|i| if i % 4 == 3 { 0xff } else { 0 })
            .collect::<Vec<u8>>();

        for y in 0..total_height {
            for x in 0..total_width {
                if x % (CELL_SIZE + BORDER_SIZE) >= CELL_SIZE
                    || y % (CELL_SIZE + BORDER_SIZE) >= CELL_SIZE
                {
                    Self::set_pix(&mut pix_buf, y * total_width + x, BORDER_FILL.rgba());
                }
            }
        }
        let mut painter = Self {
            grid,
            pix_buf,
            selected: None,
            fill_mode: false,
            history: ColorHistory::new(),
            is_mouse_down: false,
        };
        painter.render();
        painter
    }

    fn render_cell(&mut self, x: usize, y: usize) {
        let Some(cell) = self.grid.get(x, y) else {
            return;
        };
        let rgba = cell.color().rgba();
        let start_x = x * (CELL_SIZE + BORDER_SIZE);
        let start_y = y * (CELL_SIZE + BORDER_SIZE);
        let canvas_width = self.canvas_width();
        for dy in 0..CELL_SIZE {
            for dx in 0..CELL_SIZE {
                let pos = (start_y + dy) * canvas_width + start_x + dx;
                Self::set_pix(&mut self.pix_buf, pos, rgba);
            }
        }
    }

    pub fn render(&mut self) {
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                self.render_cell(x, y);
            }
        }
    }

    pub fn get_pix_buf(&self) -> *const u8 {
        self.pix_buf.as_ptr()
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn canvas_width(&self) -> usize {
        self.grid.width() * CELL_SIZE + (self.grid.width() - 1) * BORDER_SIZE
    }

    pub fn canvas_height(&self) -> usize {
        self.grid.height() * CELL_SIZE + (self.grid.height() - 1) * BORDER_SIZE
    }

    /// Map a canvas pixel to its cell, or `None` on the gutter between cells.
    pub fn box_at(&self, x: usize, y: usize) -> Option<Vec<usize>> {
        let x_pos = x % (CELL_SIZE + BORDER_SIZE);
        let y_pos = y % (CELL_SIZE + BORDER_SIZE);
        if x_pos >= CELL_SIZE || y_pos >= CELL_SIZE {
            return None;
        }
        Some([x / (CELL_SIZE + BORDER_SIZE), y / (CELL_SIZE + BORDER_SIZE)].into())
    }

    fn vec_to_tup(&self, pos: Vec<i32>) -> Option<(usize, usize)> {
        if pos.len() != 2 || pos[0] < 0 || pos[1] < 0 {
            return None;
        }
        let cell_pos = self.box_at(pos[0] as usize, pos[1] as usize)?;
        let (x, y) = (cell_pos[0], cell_pos[1]);
        if !((0..self.grid.width()).contains(&x) && (0..self.grid.height()).contains(&y)) {
            return None;
        }
        Some((x, y))
    }

    /// Select a paint color from the palette or the picker input. Any
    /// spelling of white selects the eraser (blank).
    pub fn pick_color(&mut self, value: String) -> bool {
        match value.parse::<Cell>() {
            Ok(paint) => {
                self.selected = Some(paint);
                self.history.push(paint);
                true
            }
            Err(err) => {
                log(&format!("{err}"));
                false
            }
        }
    }

    pub fn selected_color(&self) -> Option<u32> {
        self.selected.map(|paint| paint.color().rgb24())
    }

    /// Recent paint values, newest first, as `0xRRGGBB` words.
    pub fn history(&self) -> Vec<u32> {
        self.history.iter().map(|paint| paint.color().rgb24()).collect()
    }

    pub fn set_fill_mode(&mut self, enabled: bool) {
        self.fill_mode = enabled;
    }

    pub fn is_fill_mode(&self) -> bool {
        self.fill_mode
    }

    pub fn color_at(&self, x: usize, y: usize) -> Option<u32> {
        self.grid.get(x, y).map(|cell| cell.color().rgb24())
    }

    fn paint(&mut self, x: usize, y: usize) {
        let Some(paint) = self.selected else {
            return;
        };
        if self.fill_mode {
            if let Ok(recolored) = self.grid.flood_fill(x, y, paint) {
                for idx in recolored {
                    let (cx, cy) = self.grid.pos_of(idx);
                    self.render_cell(cx, cy);
                }
            }
        } else if self.grid.set(x, y, paint).is_ok() {
            self.render_cell(x, y);
        }
    }

    pub fn handle_md(&mut self, pos: Vec<i32>) {
        let Some((x, y)) = self.vec_to_tup(pos) else {
            return;
        };
        self.is_mouse_down = true;
        self.paint(x, y);
    }

    pub fn handle_mm(&mut self, pos: Vec<i32>) {
        // fill fires on click only; dragging paints single cells
        if !self.is_mouse_down || self.fill_mode {
            return;
        }
        let Some((x, y)) = self.vec_to_tup(pos) else {
            return;
        };
        self.paint(x, y);
    }

    pub fn handle_mu(&mut self) {
        self.is_mouse_down = false;
    }

    pub fn clear(&mut self) {
        self.grid = Grid::new(self.grid.width(), self.grid.height());
        self.render();
    }

    pub fn save(&self) -> Vec<u8> {
        let snapshot = self.grid.write_snapshot();
        log(&format!("serialized {} bytes", snapshot.len()));
        snapshot
    }

    /// Restore a saved snapshot. A snapshot that does not match this
    /// canvas, or fails validation, is rejected and the current drawing is
    /// left untouched.
    pub fn load(&mut self, serialized: &[u8]) -> bool {
        match Grid::read_snapshot(serialized) {
            Ok(loaded)
                if loaded.width() == self.grid.width()
                    && loaded.height() == self.grid.height() =>
            {
                self.grid = loaded;
                self.render();
                true
            }
            Ok(loaded) => {
                log(&format!(
                    "snapshot is {}x{}, canvas is {}x{}",
                    loaded.width(),
                    loaded.height(),
                    self.grid.width(),
                    self.grid.height()
                ));
                false
            }
            Err(err) => {
                log(&format!("failed to load snapshot: {err}"));
                false
            }
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.grid.width() == width && self.grid.height() == height {
            return;
        }
        let fresh = Painter::new(width, height);
        self.grid = fresh.grid;
        self.pix_buf = fresh.pix_buf;
    }

    pub fn to_png(&self) -> Vec<u8> {
        self.grid.to_png()
    }

    /// Import a PNG export, resizing the canvas to the image.
    pub fn load_png(&mut self, data: &[u8]) -> bool {
        match Grid::from_png(data) {
            Ok(loaded) => {
                self.resize(loaded.width(), loaded.height());
                self.grid = loaded;
                self.render();
                true
            }
            Err(err) => {
                log(&format!("failed to import png: {err}"));
                false
            }
        }
    }
}

/// Palette swatches for the picker UI, as `0xRRGGBB` words.
#[wasm_bindgen]
pub fn default_palette() -> Vec<u32> {
    DEFAULT_PALETTE.iter().map(|color| color.rgb24()).collect()
}

/// A freshly generated palette of `size` spread-out swatches.
#[wasm_bindgen]
pub fn random_palette(size: usize) -> Vec<u32> {
    let mut rng = thread_rng();
    generate_palette(size, &mut rng)
        .iter()
        .map(|color| color.rgb24())
        .collect()
}
