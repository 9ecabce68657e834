//! Preflight checks for the optimizer.
//!
//! Validates that every derivative codec actually works on this build
//! before touching any image. This prevents a run that silently produces
//! half the derivatives.
//!
//! # Example
//!
//! ```rust,ignore
//! use asset_pipeline::optimize::standard_encoders;
//! use asset_pipeline::preflight::check_codecs;
//!
//! if let Err(e) = check_codecs(&standard_encoders()) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};
use image::{DynamicImage, Rgb, RgbImage};

use crate::optimize::{DerivativeEncoder, DerivativeFormat};

/// Check whether a single encoder can encode a tiny probe image.
pub fn codec_available(encoder: &dyn DerivativeEncoder) -> bool {
    let probe = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([128, 64, 32])));
    match encoder.encode(&probe) {
        Ok(bytes) => !bytes.is_empty(),
        Err(err) => {
            tracing::debug!(format = %encoder.format(), error = %format!("{err:#}"), "codec probe failed");
            false
        }
    }
}

/// Check that every encoder works.
///
/// # Returns
///
/// * `Ok(())` if all codecs encode the probe
/// * `Err` listing the failing formats and what to install for each
pub fn check_codecs(encoders: &[Box<dyn DerivativeEncoder>]) -> Result<()> {
    let missing: Vec<DerivativeFormat> = encoders
        .iter()
        .filter(|encoder| !codec_available(encoder.as_ref()))
        .map(|encoder| encoder.format())
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|format| format!("  {} (install: {})", format, format.install_hint()))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required image codecs:\n{}", msg);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::standard_encoders;
    use anyhow::anyhow;

    struct BrokenEncoder;

    impl DerivativeEncoder for BrokenEncoder {
        fn format(&self) -> DerivativeFormat {
            DerivativeFormat::Avif
        }

        fn encode(&self, _image: &DynamicImage) -> Result<Vec<u8>> {
            Err(anyhow!("codec not compiled in"))
        }
    }

    #[test]
    fn test_standard_codecs_available() {
        assert!(check_codecs(&standard_encoders()).is_ok());
    }

    #[test]
    fn test_check_codecs_failure_names_format() {
        let encoders: Vec<Box<dyn DerivativeEncoder>> = vec![Box::new(BrokenEncoder)];
        let err = check_codecs(&encoders).unwrap_err().to_string();
        assert!(err.contains("AVIF"));
        assert!(err.contains("install:"));
    }
}
