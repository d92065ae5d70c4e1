//! Cursor-based page layout producing PDF content operations.
//!
//! Coordinates are millimetres from the top-left corner of the page; text is
//! placed in cells the way flowing documents are usually built: a cell has a
//! width and height, its text is aligned inside it, and the cursor moves
//! right or down afterwards.

use crate::encoding::encode_win_ansi;
use crate::fonts::{FontStyle, PT_PER_MM};
use lopdf::content::Operation;
use lopdf::Object;

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// Horizontal padding between a cell edge and its text.
const CELL_PADDING_MM: f32 = 1.0;

/// Text alignment inside a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Round to hundredths so content streams stay short and stable.
fn real(value: f32) -> Object {
    ((value * 100.0).round() / 100.0).into()
}

/// A single page being laid out.
#[derive(Debug, Clone)]
pub struct PageLayout {
    width: f32,
    height: f32,
    left_margin: f32,
    right_margin: f32,
    x: f32,
    y: f32,
    font: FontStyle,
    font_size: f32,
    color: (u8, u8, u8),
    operations: Vec<Operation>,
    substitutions: usize,
}

impl PageLayout {
    /// An A4 portrait page with the cursor at the top-left margin.
    pub fn a4(left_margin: f32, top_margin: f32, right_margin: f32) -> Self {
        Self {
            width: A4_WIDTH_MM,
            height: A4_HEIGHT_MM,
            left_margin,
            right_margin,
            x: left_margin,
            y: top_margin,
            font: FontStyle::Regular,
            font_size: 10.0,
            color: (0, 0, 0),
            operations: Vec::new(),
            substitutions: 0,
        }
    }

    /// Page size in points, for the media box.
    pub fn size_pt(&self) -> (f32, f32) {
        (self.width * PT_PER_MM, self.height * PT_PER_MM)
    }

    pub fn set_font(&mut self, style: FontStyle, size_pt: f32) {
        self.font = style;
        self.font_size = size_pt;
    }

    pub fn set_text_color(&mut self, r: u8, g: u8, b: u8) {
        self.color = (r, g, b);
    }

    /// Current cursor position in millimetres.
    pub fn cursor(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn set_x(&mut self, x: f32) {
        self.x = x;
    }

    /// Move to the left margin, `h` millimetres down.
    pub fn ln(&mut self, h: f32) {
        self.x = self.left_margin;
        self.y += h;
    }

    /// Characters that could not be encoded exactly so far.
    pub fn substitutions(&self) -> usize {
        self.substitutions
    }

    /// Width from the cursor to the right margin.
    fn remaining_width(&self) -> f32 {
        self.width - self.right_margin - self.x
    }

    /// Width of `text` in the current font.
    pub fn text_width(&self, text: &str) -> f32 {
        self.font
            .text_width_mm(&encode_win_ansi(text).bytes, self.font_size)
    }

    /// Print one line of text in a `w` by `h` cell at the cursor.
    ///
    /// A zero width extends the cell to the right margin. With `new_line`
    /// the cursor moves to the start of the next line, otherwise to the
    /// right edge of the cell.
    pub fn cell(&mut self, w: f32, h: f32, text: &str, align: Align, new_line: bool) {
        let w = if w == 0.0 { self.remaining_width() } else { w };
        let encoded = encode_win_ansi(text);
        self.substitutions += encoded.substitutions;

        self.draw_text(self.x, w, h, &encoded.bytes, align);

        if new_line {
            self.ln(h);
        } else {
            self.x += w;
        }
    }

    /// Print wrapped text, one `h`-high line at a time, inside width `w`.
    ///
    /// Explicit newlines start new lines. Following lines keep the cursor's
    /// starting column; afterwards the cursor returns to the left margin.
    pub fn multi_cell(&mut self, w: f32, h: f32, text: &str, align: Align) {
        let w = if w == 0.0 { self.remaining_width() } else { w };
        let start_x = self.x;

        for line in self.wrap(text, w - 2.0 * CELL_PADDING_MM) {
            self.draw_text(start_x, w, h, &line, align);
            self.y += h;
        }

        self.x = self.left_margin;
    }

    /// Split text into encoded lines no wider than `max_width`.
    pub fn wrap(&mut self, text: &str, max_width: f32) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let encoded = encode_win_ansi(paragraph);
            self.substitutions += encoded.substitutions;
            let start = lines.len();
            let mut current: Vec<u8> = Vec::new();

            for word in encoded.bytes.split(|&b| b == b' ').filter(|w| !w.is_empty()) {
                let mut candidate = current.clone();
                if !candidate.is_empty() {
                    candidate.push(b' ');
                }
                candidate.extend_from_slice(word);

                if self.font.text_width_mm(&candidate, self.font_size) <= max_width {
                    current = candidate;
                    continue;
                }

                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }

                // Break words wider than a whole line.
                for &byte in word {
                    current.push(byte);
                    if current.len() > 1
                        && self.font.text_width_mm(&current, self.font_size) > max_width
                    {
                        current.pop();
                        lines.push(std::mem::replace(&mut current, vec![byte]));
                    }
                }
            }

            if !current.is_empty() || lines.len() == start {
                lines.push(current);
            }
        }

        lines
    }

    /// Emit the operators for one line of text inside a cell at `x`.
    fn draw_text(&mut self, x: f32, w: f32, h: f32, bytes: &[u8], align: Align) {
        if bytes.is_empty() {
            return;
        }

        let text_width = self.font.text_width_mm(bytes, self.font_size);
        let dx = match align {
            Align::Left => CELL_PADDING_MM,
            Align::Center => (w - text_width) / 2.0,
            Align::Right => w - CELL_PADDING_MM - text_width,
        };
        let font_size_mm = self.font_size / PT_PER_MM;
        let baseline = self.y + 0.5 * h + 0.3 * font_size_mm;

        let (r, g, b) = self.color;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![self.font.resource_name().into(), real(self.font_size)],
            ),
            Operation::new(
                "rg",
                vec![
                    real(r as f32 / 255.0),
                    real(g as f32 / 255.0),
                    real(b as f32 / 255.0),
                ],
            ),
            Operation::new(
                "Td",
                vec![
                    real((x + dx) * PT_PER_MM),
                    real((self.height - baseline) * PT_PER_MM),
                ],
            ),
            Operation::new("Tj", vec![Object::string_literal(bytes.to_vec())]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Finish the page, returning its content operations.
    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}
