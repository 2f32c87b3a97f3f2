use crate::foundation::core::{PixelSize, Rgba8, SurfaceSize, sanitize_dpr};
use crate::foundation::error::{GlimmerError, GlimmerResult};

/// A rendered frame as plain bytes.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    /// Row-major RGBA8.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied.
    pub premultiplied: bool,
}

/// The visible raster: a physical-pixel pixmap for a logical box at a device pixel ratio.
pub struct Surface {
    pub(crate) pixmap: vello_cpu::Pixmap,
    logical: SurfaceSize,
    dpr: f32,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("logical", &self.logical)
            .field("pixel", &self.pixel_size())
            .field("dpr", &self.dpr)
            .finish()
    }
}

impl Surface {
    /// Allocate a transparent surface; fails for sizes with no pixels.
    pub fn new(logical: SurfaceSize, dpr: f32) -> GlimmerResult<Self> {
        let dpr = sanitize_dpr(dpr);
        let px = PixelSize::from_logical(logical, dpr);
        if px.is_empty() {
            return Err(GlimmerError::raster(format!(
                "surface {}x{} at dpr {dpr} has no pixels",
                logical.width, logical.height
            )));
        }
        Ok(Self {
            pixmap: vello_cpu::Pixmap::new(px.width, px.height),
            logical,
            dpr,
        })
    }

    /// Logical box size.
    pub fn logical_size(&self) -> SurfaceSize {
        self.logical
    }

    /// Backing size in physical pixels.
    pub fn pixel_size(&self) -> PixelSize {
        PixelSize {
            width: self.pixmap.width(),
            height: self.pixmap.height(),
        }
    }

    /// Device pixel ratio the surface was allocated for.
    pub fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    /// Premultiplied RGBA of one physical pixel.
    pub fn pixel(&self, x: u16, y: u16) -> Option<[u8; 4]> {
        let size = self.pixel_size();
        if x >= size.width || y >= size.height {
            return None;
        }
        let i = (usize::from(y) * usize::from(size.width) + usize::from(x)) * 4;
        let d = self.pixmap.data_as_u8_slice();
        Some([d[i], d[i + 1], d[i + 2], d[i + 3]])
    }

    /// `true` when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.pixmap
            .data_as_u8_slice()
            .chunks_exact(4)
            .all(|px| px[3] == 0)
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    /// Copy out as straight-alpha bytes, ready for image encoders.
    pub fn to_frame(&self) -> FrameRGBA {
        let size = self.pixel_size();
        let mut data = Vec::with_capacity(self.pixmap.data_as_u8_slice().len());
        for px in self.pixmap.data_as_u8_slice().chunks_exact(4) {
            let c = Rgba8::from_premultiplied([px[0], px[1], px[2], px[3]]);
            data.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
        FrameRGBA {
            width: u32::from(size.width),
            height: u32::from(size.height),
            data,
            premultiplied: false,
        }
    }
}
