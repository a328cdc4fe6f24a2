/// Minimal 4x5 bitmap font for the status banner. Each glyph is 4 pixels
/// wide, 5 rows tall. Bits are MSB-left within each u8 (only top 4 bits used).
/// Lower-case text is drawn with the upper-case glyphs.
const GLYPHS: &[(&[u8; 5], u8)] = &[
    (&[0x60, 0x90, 0x90, 0x90, 0x60], b'0'),
    (&[0x20, 0x60, 0x20, 0x20, 0x70], b'1'),
    (&[0x60, 0x90, 0x20, 0x40, 0xF0], b'2'),
    (&[0x60, 0x90, 0x20, 0x90, 0x60], b'3'),
    (&[0x90, 0x90, 0xF0, 0x10, 0x10], b'4'),
    (&[0xF0, 0x80, 0xE0, 0x10, 0xE0], b'5'),
    (&[0x60, 0x80, 0xE0, 0x90, 0x60], b'6'),
    (&[0xF0, 0x10, 0x20, 0x40, 0x40], b'7'),
    (&[0x60, 0x90, 0x60, 0x90, 0x60], b'8'),
    (&[0x60, 0x90, 0x70, 0x10, 0x60], b'9'),
    (&[0x60, 0x90, 0xF0, 0x90, 0x90], b'A'),
    (&[0xE0, 0x90, 0xE0, 0x90, 0xE0], b'B'),
    (&[0x70, 0x80, 0x80, 0x80, 0x70], b'C'),
    (&[0xE0, 0x90, 0x90, 0x90, 0xE0], b'D'),
    (&[0xF0, 0x80, 0xE0, 0x80, 0xF0], b'E'),
    (&[0xF0, 0x80, 0xE0, 0x80, 0x80], b'F'),
    (&[0x70, 0x80, 0xB0, 0x90, 0x70], b'G'),
    (&[0x90, 0x90, 0xF0, 0x90, 0x90], b'H'),
    (&[0xE0, 0x40, 0x40, 0x40, 0xE0], b'I'),
    (&[0x30, 0x10, 0x10, 0x90, 0x60], b'J'),
    (&[0x90, 0xA0, 0xC0, 0xA0, 0x90], b'K'),
    (&[0x80, 0x80, 0x80, 0x80, 0xF0], b'L'),
    (&[0x90, 0xF0, 0xF0, 0x90, 0x90], b'M'),
    (&[0x90, 0xD0, 0xB0, 0x90, 0x90], b'N'),
    (&[0x60, 0x90, 0x90, 0x90, 0x60], b'O'),
    (&[0xE0, 0x90, 0xE0, 0x80, 0x80], b'P'),
    (&[0x60, 0x90, 0x90, 0xA0, 0x50], b'Q'),
    (&[0xE0, 0x90, 0xE0, 0xA0, 0x90], b'R'),
    (&[0x70, 0x80, 0x60, 0x10, 0xE0], b'S'),
    (&[0xE0, 0x40, 0x40, 0x40, 0x40], b'T'),
    (&[0x90, 0x90, 0x90, 0x90, 0x60], b'U'),
    (&[0x90, 0x90, 0x90, 0x60, 0x60], b'V'),
    (&[0x90, 0x90, 0xF0, 0xF0, 0x90], b'W'),
    (&[0x90, 0x90, 0x60, 0x90, 0x90], b'X'),
    (&[0xA0, 0xA0, 0x40, 0x40, 0x40], b'Y'),
    (&[0xF0, 0x20, 0x40, 0x80, 0xF0], b'Z'),
    (&[0x00, 0x00, 0x00, 0x00, 0x40], b'.'),
    (&[0x00, 0x00, 0x00, 0x40, 0x80], b','),
    (&[0x00, 0x40, 0x00, 0x40, 0x00], b':'),
    (&[0x40, 0x40, 0x40, 0x00, 0x40], b'!'),
    (&[0x00, 0x00, 0xE0, 0x00, 0x00], b'-'),
    (&[0x10, 0x20, 0x40, 0x80, 0x00], b'/'),
    (&[0x00, 0x00, 0x00, 0x00, 0x00], b' '),
];

pub const GLYPH_W: usize = 4;
pub const GLYPH_H: usize = 5;
/// Horizontal advance per character (glyph plus one column of spacing).
pub const ADVANCE: usize = GLYPH_W + 1;
/// Height of the dimmed banner strip at the top of the frame.
pub const BANNER_H: usize = GLYPH_H + 4;

const PAD: usize = 2;
const BLANK: [u8; 5] = [0x00; 5];

fn glyph_for(ch: u8) -> &'static [u8; 5] {
    let ch = ch.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|&&(_, c)| c == ch)
        .map_or(&BLANK, |&(data, _)| data)
}

/// Halve the brightness of the top [`BANNER_H`] rows of an RGB24 buffer.
pub fn dim_banner(buffer: &mut [u8], width: usize) {
    let end = (width * BANNER_H * 3).min(buffer.len());
    for byte in &mut buffer[..end] {
        *byte /= 2;
    }
}

/// Draw `text` in white onto an RGB24 framebuffer, top-left with 2px
/// padding. Characters past the right edge are clipped.
pub fn draw_text(buffer: &mut [u8], width: usize, text: &str) {
    for (ci, ch) in text.bytes().enumerate() {
        let gx = PAD + ci * ADVANCE;
        if gx + GLYPH_W > width {
            break;
        }
        let glyph = glyph_for(ch);

        for (row, &bits) in glyph.iter().enumerate() {
            let py = PAD + row;
            for col in 0..GLYPH_W {
                if bits & (0x80 >> col) != 0 {
                    let offset = (py * width + gx + col) * 3;
                    if let Some(px) = buffer.get_mut(offset..offset + 3) {
                        px.fill(255);
                    }
                }
            }
        }
    }
}

/// Dim the banner strip and draw `text` on it.
pub fn draw_banner(buffer: &mut [u8], width: usize, text: &str) {
    dim_banner(buffer, width);
    draw_text(buffer, width, text);
}
