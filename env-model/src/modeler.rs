use std::time::Instant;

use pcd_core::pointcloud::{bounds::BoundingVolume, point::PointCloud};
use pcd_detector::{
    detect_edges, detect_obstacles, DetectedEdge, DetectedObstacle, DetectedSurface,
    SurfaceDetector,
};
use pcd_transformer::{ConditioningTransformBuilder, PointCloudTransformer, Transformer};
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

use crate::{
    attachment::generate_attachment_points,
    clearance::derive_clearance_zones,
    config::ModelerConfig,
    image::{project_openings, DetectedOpening, ImageAnalyzer, ImageInput, NoopImageAnalyzer},
    merge::{dedupe_obstacles, merge_surfaces},
    model::{EnvironmentModel, ProcessingMetadata, SourceKind, SourceRecord},
};

#[derive(Debug, Clone, Default)]
pub struct ModelInput {
    pub clouds: Vec<PointCloud>,
    pub images: Vec<ImageInput>,
}

/// Everything found in one conditioned cloud.
#[derive(Debug, Clone)]
pub struct CloudDetections {
    pub conditioned: PointCloud,
    pub surfaces: Vec<DetectedSurface>,
    pub obstacles: Vec<DetectedObstacle>,
    pub edges: Vec<DetectedEdge>,
}

pub struct EnvironmentModeler {
    config: ModelerConfig,
    analyzer: Box<dyn ImageAnalyzer>,
}

impl Default for EnvironmentModeler {
    fn default() -> Self {
        Self::new(ModelerConfig::default(), Box::new(NoopImageAnalyzer))
    }
}

impl EnvironmentModeler {
    pub fn new(config: ModelerConfig, analyzer: Box<dyn ImageAnalyzer>) -> Self {
        Self { config, analyzer }
    }

    pub fn config(&self) -> &ModelerConfig {
        &self.config
    }

    /// Conditions one cloud and runs every detector on the result.
    ///
    /// The generator is seeded from the configured seed plus `index`, so the
    /// outcome does not depend on which thread handles the cloud.
    pub fn process_cloud(&self, cloud: &PointCloud, index: usize) -> CloudDetections {
        let builder = ConditioningTransformBuilder::new(self.config.conditioning.clone());
        let conditioned = PointCloudTransformer::from_builder(&builder).execute(cloud);

        let seed = self.config.surfaces.seed.wrapping_add(index as u64);
        let mut rng = StdRng::seed_from_u64(seed);
        let detector = SurfaceDetector::new(self.config.surfaces.clone());
        let surfaces = detector.detect(&conditioned, &mut rng);
        let obstacles = detect_obstacles(&conditioned, &surfaces, &self.config.obstacles);
        let edges = detect_edges(&surfaces, &self.config.edges);

        log::info!(
            "{}: {} surfaces, {} obstacles, {} edges",
            cloud.id(),
            surfaces.len(),
            obstacles.len(),
            edges.len()
        );

        CloudDetections {
            conditioned,
            surfaces,
            obstacles,
            edges,
        }
    }

    fn analyze_images(&self, images: &[ImageInput]) -> Vec<Vec<DetectedOpening>> {
        let fusion = &self.config.fusion;
        images
            .iter()
            .map(|image| {
                let analysis = self.analyzer.analyze(image);
                project_openings(
                    image,
                    &analysis,
                    fusion.pixel_scale,
                    fusion.opening_confidence_scale,
                )
            })
            .collect()
    }

    pub fn build_model(&self, input: &ModelInput) -> EnvironmentModel {
        let start = Instant::now();

        let detections: Vec<CloudDetections> = input
            .clouds
            .par_iter()
            .enumerate()
            .map(|(index, cloud)| self.process_cloud(cloud, index))
            .collect();
        let openings_per_image = self.analyze_images(&input.images);

        let mut sources: Vec<SourceRecord> = input
            .clouds
            .iter()
            .map(|cloud| SourceRecord {
                id: cloud.id().to_string(),
                kind: SourceKind::PointCloud,
                origin: cloud.metadata().source.clone(),
                item_count: cloud.len(),
            })
            .collect();
        sources.extend(
            input
                .images
                .iter()
                .zip(&openings_per_image)
                .map(|(image, openings)| SourceRecord {
                    id: image.id.clone(),
                    kind: SourceKind::Image,
                    origin: "image".to_string(),
                    item_count: openings.len(),
                }),
        );

        let mut surfaces = Vec::new();
        let mut obstacles = Vec::new();
        let mut edges = Vec::new();
        for detection in detections {
            surfaces.extend(detection.surfaces);
            obstacles.extend(detection.obstacles);
            edges.extend(detection.edges);
        }
        let openings: Vec<DetectedOpening> = openings_per_image.into_iter().flatten().collect();

        let fusion = &self.config.fusion;
        let surfaces = merge_surfaces(surfaces, fusion.surface_overlap_ratio);
        let obstacles = dedupe_obstacles(obstacles, fusion.obstacle_merge_distance);

        let bounds = union_bounds(
            surfaces
                .iter()
                .map(|surface| &surface.bounds)
                .chain(obstacles.iter().map(|obstacle| &obstacle.bounds)),
        )
        .unwrap_or(fusion.default_bounds);

        let attachment_points = generate_attachment_points(&surfaces, &self.config.attachment);
        let clearance_zones = derive_clearance_zones(&openings, &obstacles, &self.config.clearance);

        let confidences: Vec<f64> = surfaces
            .iter()
            .map(|surface| surface.confidence)
            .chain(obstacles.iter().map(|obstacle| obstacle.confidence))
            .collect();
        let confidence = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };

        let metadata = ProcessingMetadata {
            point_count: input.clouds.iter().map(PointCloud::len).sum(),
            image_count: input.images.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            confidence,
        };

        log::info!(
            "model: {} surfaces, {} obstacles, {} openings, {} attachment points, confidence {:.2}",
            surfaces.len(),
            obstacles.len(),
            openings.len(),
            attachment_points.len(),
            confidence
        );

        EnvironmentModel {
            bounds,
            surfaces,
            obstacles,
            openings,
            edges,
            attachment_points,
            clearance_zones,
            sources,
            metadata,
        }
    }
}

/// Union of the given boxes, `None` when there are none.
pub fn union_bounds<'a, I>(boxes: I) -> Option<BoundingVolume>
where
    I: IntoIterator<Item = &'a BoundingVolume>,
{
    boxes
        .into_iter()
        .copied()
        .reduce(|acc, bounds| acc.union(&bounds))
}
