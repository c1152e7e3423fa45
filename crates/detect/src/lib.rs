//! # subcanopy-detect
//!
//! Detection of built structures beneath forest canopy from aligned
//! radar and optical rasters.
//!
//! Five indicators (temporal stability, double-bounce ratio, texture
//! contrast, backscatter anomaly and optical built-up anomaly) are fused
//! with configurable weights inside a forest mask. The probability
//! surface is bucketed into confidence classes, cleaned with a binary
//! opening and vectorized into attributed footprints, which are finally
//! cross-referenced with an external built-up layer.
//!
//! ```ignore
//! use subcanopy_detect::prelude::*;
//!
//! let config = DetectionConfig::from_json_str(r#"{ "thresh_high": 0.7 }"#)?;
//! let result = Detector::new(config).run(&inputs)?;
//! for f in &result.footprints {
//!     println!("{} {:.0} m² {:?}", f.label, f.area_m2, f.confidence);
//! }
//! ```

pub mod area;
pub mod cleanup;
pub mod config;
pub mod diagnose;
pub mod error;
pub mod footprint;
pub mod fusion;
pub mod indicators;
pub mod inputs;
pub mod mask;
pub mod pipeline;
pub mod radiometry;
pub mod summary;
pub mod validation;

pub use config::{DetectionConfig, ExecutionConfig, FusionWeights, WeightPolicy};
pub use error::{DetectError, Result};
pub use footprint::{Footprint, ValidationClass};
pub use fusion::Confidence;
pub use inputs::{OpticalComposite, SceneInputs};
pub use pipeline::{DetectionResult, Detector, SubcanopyDetection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{DetectionConfig, ExecutionConfig, FusionWeights, WeightPolicy};
    pub use crate::diagnose::PixelDiagnostics;
    pub use crate::error::{DetectError, Result};
    pub use crate::footprint::{Footprint, ValidationClass};
    pub use crate::fusion::Confidence;
    pub use crate::inputs::{OpticalComposite, SceneInputs};
    pub use crate::pipeline::{DetectionResult, Detector, SubcanopyDetection};
    pub use crate::summary::DetectionSummary;
    pub use crate::validation::ValidationSummary;
    pub use subcanopy_core::prelude::*;
    pub use subcanopy_parallel::ProcessingMode;
}
