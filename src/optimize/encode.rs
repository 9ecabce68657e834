use anyhow::{anyhow, Context, Result};
use image::codecs::avif::AvifEncoder as ImageAvifEncoder;
use image::DynamicImage;

/// WebP output quality (lossy, 0-100).
pub const WEBP_QUALITY: u8 = 82;
/// AVIF output quality (0-100).
pub const AVIF_QUALITY: u8 = 65;
/// rav1e speed preset (1 = slowest/best, 10 = fastest).
pub const AVIF_SPEED: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DerivativeFormat {
    Webp,
    Avif,
}

impl DerivativeFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Webp => "WebP",
            Self::Avif => "AVIF",
        }
    }

    pub fn quality(self) -> u8 {
        match self {
            Self::Webp => WEBP_QUALITY,
            Self::Avif => AVIF_QUALITY,
        }
    }

    /// What to tell the operator when this codec fails the preflight probe.
    pub fn install_hint(self) -> &'static str {
        match self {
            Self::Webp => "libwebp (bundled by the `webp` crate; needs a C toolchain at build time)",
            Self::Avif => "rav1e (enable the `avif` feature of the `image` crate)",
        }
    }
}

impl std::fmt::Display for DerivativeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Turns a decoded source image into the bytes of one derivative format.
pub trait DerivativeEncoder {
    fn format(&self) -> DerivativeFormat;
    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>>;
}

/// Lossy WebP through libwebp.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpEncoder;

impl DerivativeEncoder for WebpEncoder {
    fn format(&self) -> DerivativeFormat {
        DerivativeFormat::Webp
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let quality = f32::from(self.format().quality());
        let encoded = if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                .encode_simple(false, quality)
                .map_err(|err| anyhow!("WebP encoding failed: {err:?}"))?
                .to_vec()
        } else {
            let rgb = image.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
                .encode_simple(false, quality)
                .map_err(|err| anyhow!("WebP encoding failed: {err:?}"))?
                .to_vec()
        };
        Ok(encoded)
    }
}

/// AVIF through the `image` crate's rav1e-backed encoder.
#[derive(Debug, Clone, Copy)]
pub struct AvifEncoder {
    speed: u8,
}

impl Default for AvifEncoder {
    fn default() -> Self {
        Self { speed: AVIF_SPEED }
    }
}

impl DerivativeEncoder for AvifEncoder {
    fn format(&self) -> DerivativeFormat {
        DerivativeFormat::Avif
    }

    fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        // The encoder only accepts 8-bit buffers; 16-bit PNGs are narrowed.
        let prepared = if image.color().has_alpha() {
            DynamicImage::ImageRgba8(image.to_rgba8())
        } else {
            DynamicImage::ImageRgb8(image.to_rgb8())
        };
        let mut bytes = Vec::new();
        let encoder =
            ImageAvifEncoder::new_with_speed_quality(&mut bytes, self.speed, self.format().quality());
        prepared
            .write_with_encoder(encoder)
            .context("AVIF encoding failed")?;
        Ok(bytes)
    }
}

/// The production encoder set, WebP first.
pub fn standard_encoders() -> Vec<Box<dyn DerivativeEncoder>> {
    vec![
        Box::new(WebpEncoder),
        Box::new(AvifEncoder::default()),
    ]
}
