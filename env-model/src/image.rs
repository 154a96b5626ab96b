//! The image side of fusion.
//!
//! Image analysis itself lives outside this crate. Fusion only needs the
//! openings an analyzer finds, so the capability is a one-method trait and a
//! real vision backend can be dropped in without touching the modeler.

use std::collections::HashMap;
use std::fmt;

use pcd_core::pointcloud::bounds::BoundingVolume;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInput {
    pub id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing)]
    pub data: Vec<u8>,
}

impl ImageInput {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningType {
    Door,
    Window,
    Vent,
    Passage,
}

impl fmt::Display for OpeningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpeningType::Door => "door",
            OpeningType::Window => "window",
            OpeningType::Vent => "vent",
            OpeningType::Passage => "passage",
        };
        f.write_str(name)
    }
}

/// Pixel rectangle, origin at the top-left corner of the image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening2d {
    pub opening_type: OpeningType,
    pub bbox: PixelBox,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub openings: Vec<Opening2d>,
}

pub trait ImageAnalyzer: Send + Sync {
    fn analyze(&self, image: &ImageInput) -> ImageAnalysis;
}

/// Finds nothing. Used when no vision backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopImageAnalyzer;

impl ImageAnalyzer for NoopImageAnalyzer {
    fn analyze(&self, _image: &ImageInput) -> ImageAnalysis {
        ImageAnalysis::default()
    }
}

/// Replays canned results keyed by image id.
#[derive(Debug, Clone, Default)]
pub struct StaticImageAnalyzer {
    results: HashMap<String, ImageAnalysis>,
}

impl StaticImageAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, image_id: impl Into<String>, analysis: ImageAnalysis) -> Self {
        self.results.insert(image_id.into(), analysis);
        self
    }
}

impl ImageAnalyzer for StaticImageAnalyzer {
    fn analyze(&self, image: &ImageInput) -> ImageAnalysis {
        self.results.get(&image.id).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedOpening {
    pub id: String,
    pub opening_type: OpeningType,
    pub bounds: BoundingVolume,
    /// mm
    pub width: f64,
    /// mm
    pub height: f64,
    pub confidence: f64,
    pub source_image: String,
}

/// Lifts 2D openings into the scan frame.
///
/// Without calibration the image is assumed to lie in the plane y = 0 with
/// pixel columns along x and pixel rows along z.
pub fn project_openings(
    image: &ImageInput,
    analysis: &ImageAnalysis,
    pixel_scale: f64,
    confidence_scale: f64,
) -> Vec<DetectedOpening> {
    analysis
        .openings
        .iter()
        .enumerate()
        .map(|(n, opening)| {
            let PixelBox {
                x,
                y,
                width,
                height,
            } = opening.bbox;
            let bounds = BoundingVolume::new(
                [x * pixel_scale, 0.0, y * pixel_scale],
                [(x + width) * pixel_scale, 0.0, (y + height) * pixel_scale],
            );
            DetectedOpening {
                id: format!("opening:{}:{}", image.id, n),
                opening_type: opening.opening_type,
                bounds,
                width: width * pixel_scale,
                height: height * pixel_scale,
                confidence: opening.confidence * confidence_scale,
                source_image: image.id.clone(),
            }
        })
        .collect()
}
