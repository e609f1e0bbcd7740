//! Text-safe drawing backend
//!
//! `FontSafeBackend` wraps any plotters backend and takes over text when the
//! font engine cannot serve it: no font registered, a font error, or a panic
//! inside the rasterizer. The fallback face is a 5x7 bitmap plotted through
//! `draw_pixel`, honouring the style's anchor and rotation so rotated bar
//! labels and the axis title still read correctly.

use std::panic::{self, AssertUnwindSafe};

use plotters_backend::{
    text_anchor, BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend,
    DrawingErrorKind, FontTransform,
};
use tracing::warn;

const FALLBACK_FONT_HEIGHT: usize = 7;
const FALLBACK_SPACE_WIDTH: u8 = 2;

pub struct FontSafeBackend<DB> {
    inner: DB,
    fallback_logged: bool,
}

impl<DB> FontSafeBackend<DB> {
    pub fn new(inner: DB) -> Self {
        Self {
            inner,
            fallback_logged: false,
        }
    }
}

impl<DB: DrawingBackend> DrawingBackend for FontSafeBackend<DB> {
    type ErrorType = DB::ErrorType;

    fn get_size(&self) -> (u32, u32) {
        self.inner.get_size()
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.ensure_prepared()
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.present()
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_pixel(point, color)
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_line(from, to, style)
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_rect(upper_left, bottom_right, style, fill)
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_path(path, style)
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.draw_circle(center, radius, style, fill)
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.fill_polygon(vert, style)
    }

    fn blit_bitmap(
        &mut self,
        pos: BackendCoord,
        (iw, ih): (u32, u32),
        src: &[u8],
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        self.inner.blit_bitmap(pos, (iw, ih), src)
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<Self::ErrorType>> {
        let drawn = panic::catch_unwind(AssertUnwindSafe(|| self.inner.draw_text(text, style, pos)));
        match drawn {
            Ok(Err(DrawingErrorKind::FontError(error))) => {
                self.log_fallback(&error.to_string());
                self.draw_text_fallback(text, style, pos)
            }
            Ok(result) => result,
            Err(_) => {
                self.log_fallback("font rasterizer panicked");
                self.draw_text_fallback(text, style, pos)
            }
        }
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Self::ErrorType>> {
        let estimated =
            panic::catch_unwind(AssertUnwindSafe(|| self.inner.estimate_text_size(text, style)));
        match estimated {
            Ok(Err(DrawingErrorKind::FontError(_))) | Err(_) => {
                Ok(fallback_extent(text, fallback_scale(style.size())))
            }
            Ok(result) => result,
        }
    }
}

impl<DB: DrawingBackend> FontSafeBackend<DB> {
    fn log_fallback(&mut self, reason: &str) {
        if !self.fallback_logged {
            warn!("Drawing text with the built-in bitmap face: {}", reason);
            self.fallback_logged = true;
        }
    }

    fn draw_text_fallback<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        let color = style.color();
        if color.alpha == 0.0 || text.trim().is_empty() {
            return Ok(());
        }

        let scale = fallback_scale(style.size());
        let (width, height) = fallback_extent(text, scale);
        let (width, height) = (width as i32, height as i32);
        let dx = match style.anchor().h_pos {
            text_anchor::HPos::Left => 0,
            text_anchor::HPos::Right => -width,
            text_anchor::HPos::Center => -width / 2,
        };
        let dy = match style.anchor().v_pos {
            text_anchor::VPos::Top => 0,
            text_anchor::VPos::Center => -height / 2,
            text_anchor::VPos::Bottom => -height,
        };
        let transform = style.transform();

        let mut cursor_x = dx;
        for ch in text.chars() {
            let glyph = fallback_glyph(ch);
            for (row, pattern) in glyph.rows.iter().enumerate() {
                for col in 0..glyph.width {
                    if pattern & (1 << (glyph.width - 1 - col)) != 0 {
                        self.draw_scaled_pixel_block(
                            pos,
                            &transform,
                            (cursor_x + col as i32 * scale, dy + row as i32 * scale),
                            scale,
                            color,
                        )?;
                    }
                }
            }
            cursor_x += scale * (glyph.width as i32 + 1);
        }
        Ok(())
    }

    /// One font cell, laid out in text space and rotated onto the backend
    fn draw_scaled_pixel_block(
        &mut self,
        pos: BackendCoord,
        transform: &FontTransform,
        (x, y): (i32, i32),
        scale: i32,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        let (w, h) = self.inner.get_size();
        for dx in 0..scale {
            for dy in 0..scale {
                let (tx, ty) = transform.transform(x + dx, y + dy);
                let (px, py) = (pos.0 + tx, pos.1 + ty);
                if px >= 0 && py >= 0 && px < w as i32 && py < h as i32 {
                    self.inner.draw_pixel((px, py), color)?;
                }
            }
        }
        Ok(())
    }
}

/// Whole multiple of the 7-row face closest to the requested size
fn fallback_scale(size: f64) -> i32 {
    (size / FALLBACK_FONT_HEIGHT as f64).round().max(1.0) as i32
}

/// Unrotated (width, height) of `text` in the fallback face
fn fallback_extent(text: &str, scale: i32) -> (u32, u32) {
    let cells: i32 = text
        .chars()
        .map(|ch| fallback_glyph(ch).width as i32 + 1)
        .sum();
    let width = ((cells - 1).max(0) * scale) as u32;
    (width, (FALLBACK_FONT_HEIGHT as i32 * scale) as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Glyph {
    width: u8,
    rows: [u8; FALLBACK_FONT_HEIGHT],
}

const SPACE: Glyph = Glyph {
    width: FALLBACK_SPACE_WIDTH,
    rows: [0; FALLBACK_FONT_HEIGHT],
};

/// Drawn for anything the face has no shape for, so no character goes missing
const MISSING: Glyph = Glyph {
    width: 5,
    rows: [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
};

/// Latin-1 letters share the shape of their unaccented base
fn fold_accent(ch: char) -> char {
    match ch {
        'À'..='Å' | 'à'..='å' => 'A',
        'Ç' | 'ç' => 'C',
        'È'..='Ë' | 'è'..='ë' => 'E',
        'Ì'..='Ï' | 'ì'..='ï' => 'I',
        'Ñ' | 'ñ' => 'N',
        'Ò'..='Ö' | 'Ø' | 'ò'..='ö' | 'ø' => 'O',
        'Ù'..='Ü' | 'ù'..='ü' => 'U',
        'Ý' | 'ý' | 'ÿ' => 'Y',
        other => other,
    }
}

fn fallback_glyph(ch: char) -> Glyph {
    if ch.is_whitespace() {
        return SPACE;
    }
    let rows = match fold_accent(ch).to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
        '*' => [0b00000, 0b00100, 0b10101, 0b01110, 0b10101, 0b00100, 0b00000],
        '/' => [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000],
        '<' => [0b00010, 0b00100, 0b01000, 0b10000, 0b01000, 0b00100, 0b00010],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '\'' => [0b00100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        _ => return MISSING,
    };
    Glyph { width: 5, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::prelude::BitMapBackend;
    use plotters::style::text_anchor::{HPos, Pos, VPos};
    use plotters::style::{FontDesc, FontFamily, FontStyle, WHITE};

    const W: u32 = 30;
    const H: u32 = 60;

    fn lit(buffer: &[u8], x: u32, y: u32) -> bool {
        let i = ((y * W + x) * 3) as usize;
        buffer[i..i + 3] != [0, 0, 0]
    }

    #[test]
    fn test_accented_letters_fold() {
        assert_eq!(fallback_glyph('É'), fallback_glyph('E'));
        assert_eq!(fallback_glyph('ö'), fallback_glyph('O'));
        assert_eq!(fallback_glyph('ñ'), fallback_glyph('n'));
        assert_ne!(fallback_glyph('É'), MISSING);
    }

    #[test]
    fn test_no_character_is_dropped() {
        let label = "Élyssa - Quel'Thalas *";
        for ch in label.chars().filter(|c| !c.is_whitespace()) {
            assert!(fallback_glyph(ch).rows.iter().any(|row| *row != 0), "{}", ch);
        }
        assert_eq!(fallback_glyph('☃'), MISSING);

        // 19 five-wide glyphs plus 3 spaces, one column of spacing after each but the last
        let (width, height) = fallback_extent(label, 1);
        assert_eq!(width, 19 * 6 + 3 * 3 - 1);
        assert_eq!(height, 7);
        assert_eq!(fallback_extent(label, 2).0, width * 2);
    }

    #[test]
    fn test_rotated_text_reads_upward() {
        let mut buffer = vec![0u8; (W * H * 3) as usize];
        {
            let mut backend = FontSafeBackend::new(BitMapBackend::with_buffer(&mut buffer, (W, H)));
            let style = FontDesc::new(FontFamily::SansSerif, 7.0, FontStyle::Normal)
                .transform(FontTransform::Rotate270)
                .color(&WHITE)
                .pos(Pos::new(HPos::Left, VPos::Top));
            backend.draw_text("--", &style, (10, 50)).unwrap();
        }

        // Each dash is one lit glyph row, turned into a vertical run in column 13
        for y in (46..=50).chain(40..=44) {
            assert!(lit(&buffer, 13, y), "y = {}", y);
        }
        assert!(!lit(&buffer, 13, 45));
        for x in (0..W).filter(|x| *x != 13) {
            assert!((0..H).all(|y| !lit(&buffer, x, y)), "x = {}", x);
        }
    }

    #[test]
    fn test_fallback_estimates_size() {
        let buffer = &mut vec![0u8; (W * H * 3) as usize];
        let backend = FontSafeBackend::new(BitMapBackend::with_buffer(buffer, (W, H)));
        let style = FontDesc::new(FontFamily::SansSerif, 14.0, FontStyle::Normal).color(&WHITE);
        assert_eq!(backend.estimate_text_size("10/10M", &style).unwrap(), (70, 14));
    }
}
