use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};

use crate::error::StartupError;

/// Create a resizable SDL window and renderer for the given native
/// resolution. The image keeps its aspect ratio when resized.
pub fn open_window(
    sdl_video: &sdl2::VideoSubsystem,
    title: &str,
    native_width: u32,
    native_height: u32,
    scale: u32,
    vsync: bool,
) -> Result<Canvas<Window>, StartupError> {
    let scale = scale.max(1);
    let window = sdl_video
        .window(title, native_width * scale, native_height * scale)
        .position_centered()
        .resizable()
        .build()
        .map_err(|e| StartupError::Sdl(e.to_string()))?;

    let mut builder = window.into_canvas().accelerated();
    if vsync {
        builder = builder.present_vsync();
    }
    let mut canvas = builder
        .build()
        .map_err(|e| StartupError::Sdl(e.to_string()))?;
    canvas
        .set_logical_size(native_width, native_height)
        .map_err(|e| StartupError::Sdl(e.to_string()))?;
    Ok(canvas)
}

/// Canvas plus the one streaming texture every frame is uploaded into.
/// The texture borrows the creator, which the caller keeps alive.
pub struct Video<'t> {
    texture: Texture<'t>,
    canvas: Canvas<Window>,
    width: u32,
    height: u32,
}

impl<'t> Video<'t> {
    pub fn new(
        canvas: Canvas<Window>,
        texture_creator: &'t TextureCreator<WindowContext>,
        native_width: u32,
        native_height: u32,
    ) -> Result<Self, StartupError> {
        let texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::RGB24, native_width, native_height)
            .map_err(|e| StartupError::Sdl(e.to_string()))?;

        Ok(Self {
            texture,
            canvas,
            width: native_width,
            height: native_height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Upload an RGB24 framebuffer to the texture and present it.
    pub fn present(&mut self, framebuffer: &[u8]) -> Result<(), String> {
        self.texture
            .update(None, framebuffer, (self.width * 3) as usize)
            .map_err(|e| e.to_string())?;

        self.canvas.clear();
        self.canvas.copy(&self.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }
}
