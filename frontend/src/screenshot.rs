use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// `<rom>.<n>.png` for the first `n >= start` that does not exist yet.
pub fn next_path(rom_path: &Path, start: u32) -> (PathBuf, u32) {
    let mut n = start;
    loop {
        let mut name = rom_path.as_os_str().to_os_string();
        name.push(format!(".{n}.png"));
        let path = PathBuf::from(name);
        if !path.exists() {
            return (path, n);
        }
        n += 1;
    }
}

/// Write an RGB24 frame as an 8-bit PNG.
pub fn save_png(path: &Path, frame: &[u8], width: u32, height: u32) -> Result<(), png::EncodingError> {
    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(frame)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_skips_existing_files() {
        let dir = std::env::temp_dir().join("cadence_screenshot_test_numbering");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let rom = dir.join("game.gba");

        let (first, n) = next_path(&rom, 0);
        assert_eq!(first, dir.join("game.gba.0.png"));
        assert_eq!(n, 0);

        std::fs::write(&first, b"").unwrap();
        let (second, n) = next_path(&rom, 0);
        assert_eq!(second, dir.join("game.gba.1.png"));
        assert_eq!(n, 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn written_png_decodes_to_same_pixels() {
        let dir = std::env::temp_dir().join("cadence_screenshot_test_png");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("shot.png");

        let frame: Vec<u8> = (0..4 * 3 * 3).map(|i| (i * 7) as u8).collect();
        save_png(&path, &frame, 4, 3).unwrap();

        let decoder = png::Decoder::new(File::open(&path).unwrap());
        let mut reader = decoder.read_info().unwrap();
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).unwrap();
        assert_eq!((info.width, info.height), (4, 3));
        assert_eq!(&buf[..info.buffer_size()], frame.as_slice());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
