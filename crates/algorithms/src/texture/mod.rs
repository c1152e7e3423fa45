//! Texture and feature extraction algorithms
//!
//! - **GLCM**: Gray-Level Co-occurrence contrast on a quantized image

mod glcm;

pub use glcm::{glcm_contrast, quantize, GlcmParams};
