//! Built-in PDF fonts and their glyph widths.

/// Advance widths (1/1000 em) of Helvetica for bytes 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778,
    722, 667, 611, 722, 667, 944, 667, 667, 611, // A..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556,
    333, 500, 278, 556, 500, 722, 500, 500, 500, // a..z
    334, 260, 334, 584, // {..~
];

/// Advance widths (1/1000 em) of Helvetica-Bold for bytes 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778,
    722, 667, 611, 722, 667, 944, 667, 667, 611, // A..Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611,
    389, 556, 333, 611, 556, 778, 556, 556, 500, // a..z
    389, 280, 389, 584, // {..~
];

/// Width used for bytes outside the printable ASCII range.
const FALLBACK_WIDTH: u16 = 556;

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// The Helvetica family, available in every PDF reader without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    pub const ALL: [FontStyle; 3] = [FontStyle::Regular, FontStyle::Bold, FontStyle::Italic];

    /// Name of the font in the page resource dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
            FontStyle::Italic => "F3",
        }
    }

    /// PostScript name of the standard font.
    pub fn base_font(self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
            FontStyle::Italic => "Helvetica-Oblique",
        }
    }

    /// Advance width of one WinAnsi byte, in 1/1000 em.
    pub fn char_width(self, byte: u8) -> u16 {
        let table = match self {
            FontStyle::Bold => &HELVETICA_BOLD_WIDTHS,
            // Oblique shares the upright metrics.
            FontStyle::Regular | FontStyle::Italic => &HELVETICA_WIDTHS,
        };
        match byte {
            32..=126 => table[(byte - 32) as usize],
            0xA0 => table[0],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Width of encoded text at `size_pt`, in millimetres.
    pub fn text_width_mm(self, bytes: &[u8], size_pt: f32) -> f32 {
        let units: u32 = bytes.iter().map(|&b| self.char_width(b) as u32).sum();
        units as f32 * size_pt / 1000.0 / PT_PER_MM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        assert_eq!(FontStyle::Regular.char_width(b' '), 278);
        assert_eq!(FontStyle::Regular.char_width(b'A'), 667);
        assert_eq!(FontStyle::Regular.char_width(b'i'), 222);
        assert_eq!(FontStyle::Bold.char_width(b'i'), 278);
        assert_eq!(FontStyle::Italic.char_width(b'W'), 944);
        assert_eq!(FontStyle::Regular.char_width(b'~'), 584);
        assert_eq!(FontStyle::Regular.char_width(0xE9), FALLBACK_WIDTH);
    }

    #[test]
    fn test_text_width_scales_with_size() {
        let small = FontStyle::Regular.text_width_mm(b"Receipt", 10.0);
        let large = FontStyle::Regular.text_width_mm(b"Receipt", 20.0);

        assert!(small > 0.0);
        assert!((large - 2.0 * small).abs() < 1e-4);
    }

    #[test]
    fn test_resource_names_distinct() {
        assert_eq!(FontStyle::ALL.map(FontStyle::resource_name), ["F1", "F2", "F3"]);
    }
}
