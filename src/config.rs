use crate::error::Error;
use crate::model::Rotation;

/// Renderer configuration. Rotations are validated when set; a bad bit depth
/// falls back to 8 with a warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererOptions {
    color_images: bool,
    bits_per_pixel: u8,
    portrait_rotation: Rotation,
    landscape_rotation: Rotation,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            color_images: false,
            bits_per_pixel: 8,
            portrait_rotation: Rotation::Deg0,
            landscape_rotation: Rotation::Deg270,
        }
    }
}

impl RendererOptions {
    pub fn color_images(&self) -> bool {
        self.color_images
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    pub fn portrait_rotation(&self) -> Rotation {
        self.portrait_rotation
    }

    pub fn landscape_rotation(&self) -> Rotation {
        self.landscape_rotation
    }

    pub fn with_color_images(mut self, color: bool) -> Self {
        self.color_images = color;
        self
    }

    pub fn with_bits_per_pixel(mut self, bits: u32) -> Self {
        self.bits_per_pixel = match bits {
            1 | 4 | 8 => bits as u8,
            _ => {
                log::warn!("Invalid bits_per_pixel value {bits}, must be 1, 4 or 8, using 8");
                8
            }
        };
        self
    }

    pub fn with_portrait_rotation(mut self, degrees: u32) -> Result<Self, Error> {
        self.portrait_rotation = Rotation::from_degrees(degrees).map_err(|_| {
            Error::InvalidConfiguration(format!(
                "the portrait rotation must be one of the values 0, 90, 180, 270 (got {degrees})"
            ))
        })?;
        Ok(self)
    }

    pub fn with_landscape_rotation(mut self, degrees: u32) -> Result<Self, Error> {
        self.landscape_rotation = Rotation::from_degrees(degrees).map_err(|_| {
            Error::InvalidConfiguration(format!(
                "the landscape rotation must be one of the values 0, 90, 180, 270 (got {degrees})"
            ))
        })?;
        Ok(self)
    }

    /// Rotation applied to a page of the given class.
    pub fn page_rotation(&self, landscape: bool) -> Rotation {
        if landscape {
            self.landscape_rotation
        } else {
            self.portrait_rotation
        }
    }
}
