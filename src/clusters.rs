//! Emotion cluster scatter plot.
//!
//! Each entry's seven-way distribution is projected to 2D by anchoring every
//! label on the unit circle and placing the point at the probability-weighted
//! sum of anchors. Confident predictions sit near their label's anchor;
//! mixed ones drift toward the centre. The plot is written as a PNG.
//!
//! ```text
//!            anger
//!    surprise      disgust
//!   sadness    ·     fear
//!       neutral   joy
//! ```

use crate::config::ClusterConfig;
use crate::error::{Result, SentioError};
use crate::memory::ConversationEntry;
use image::{ImageBuffer, ImageFormat, Rgba};
use sentio_model::{EmotionDistribution, EmotionLabel, LABEL_COUNT};
use serde::Serialize;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::PathBuf;
use tracing::info;

type Canvas = ImageBuffer<Rgba<u8>, Vec<u8>>;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const GUIDE: Rgba<u8> = Rgba([210, 210, 210, 255]);
const POINT_RADIUS: i64 = 5;
const ANCHOR_HALF: i64 = 7;
/// Plot extent in projection units on each side of the origin.
const EXTENT: f64 = 1.15;

/// One projected conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClusterPoint {
    pub index: u64,
    pub label: EmotionLabel,
    pub x: f64,
    pub y: f64,
}

/// Outcome of [`generate_clusters`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterReport {
    /// Too few entries to plot.
    NotEnoughData { have: usize, need: usize },
    /// Plot written to `path`.
    Generated {
        path: PathBuf,
        points: Vec<ClusterPoint>,
    },
}

impl ClusterReport {
    /// User-facing summary line.
    pub fn message(&self) -> String {
        match self {
            Self::NotEnoughData { need, .. } => {
                format!("Not enough data for clustering (need at least {need} interactions)")
            }
            Self::Generated { .. } => "Clusters generated successfully".to_owned(),
        }
    }
}

/// Unit-circle position of `label`, starting at the top and going clockwise
/// in declaration order.
pub fn anchor(label: EmotionLabel) -> (f64, f64) {
    let angle = TAU * label.index() as f64 / LABEL_COUNT as f64 - FRAC_PI_2;
    (angle.cos(), angle.sin())
}

/// Probability-weighted sum of label anchors. Lies inside the unit disc.
pub fn project(distribution: &EmotionDistribution) -> (f64, f64) {
    distribution
        .iter()
        .fold((0.0, 0.0), |(x, y), (label, p)| {
            let (ax, ay) = anchor(label);
            (x + f64::from(p) * ax, y + f64::from(p) * ay)
        })
}

/// Fixed colour per label.
pub fn label_color(label: EmotionLabel) -> Rgba<u8> {
    match label {
        EmotionLabel::Anger => Rgba([214, 39, 40, 255]),
        EmotionLabel::Disgust => Rgba([140, 86, 75, 255]),
        EmotionLabel::Fear => Rgba([148, 103, 189, 255]),
        EmotionLabel::Joy => Rgba([255, 187, 0, 255]),
        EmotionLabel::Neutral => Rgba([127, 127, 127, 255]),
        EmotionLabel::Sadness => Rgba([31, 119, 180, 255]),
        EmotionLabel::Surprise => Rgba([44, 160, 44, 255]),
    }
}

/// Project `entries` and render them to `config.output_path`.
///
/// # Errors
///
/// Returns [`SentioError::Config`] if `config` is invalid and
/// [`SentioError::Render`] if the output directory or image cannot be
/// written. Too few entries is not an error.
pub fn generate_clusters(
    entries: &[ConversationEntry],
    config: &ClusterConfig,
) -> Result<ClusterReport> {
    if entries.len() < config.min_samples {
        return Ok(ClusterReport::NotEnoughData {
            have: entries.len(),
            need: config.min_samples,
        });
    }
    config.validate()?;

    let points: Vec<ClusterPoint> = entries
        .iter()
        .map(|entry| {
            let (x, y) = project(&entry.distribution);
            ClusterPoint {
                index: entry.index,
                label: entry.label,
                x,
                y,
            }
        })
        .collect();

    let canvas = render(&points, config.width, config.height);
    let path = config.output_path.clone();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            SentioError::Render(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    canvas
        .save_with_format(&path, ImageFormat::Png)
        .map_err(|e| SentioError::Render(format!("failed to save {}: {e}", path.display())))?;

    info!(points = points.len(), "cluster plot written to {}", path.display());
    Ok(ClusterReport::Generated { path, points })
}

// ---------------------------------------------------------------------------
// Rasterisation
// ---------------------------------------------------------------------------

fn render(points: &[ClusterPoint], width: u32, height: u32) -> Canvas {
    let mut canvas = Canvas::from_pixel(width, height, BACKGROUND);
    let to_px = |x: f64, y: f64| -> (i64, i64) {
        let px = (x + EXTENT) / (2.0 * EXTENT) * f64::from(width);
        let py = (y + EXTENT) / (2.0 * EXTENT) * f64::from(height);
        (px.round() as i64, py.round() as i64)
    };

    // Unit circle guide.
    let steps = 720;
    for i in 0..steps {
        let t = TAU * f64::from(i) / f64::from(steps);
        let (px, py) = to_px(t.cos(), t.sin());
        put(&mut canvas, px, py, GUIDE);
    }

    for label in EmotionLabel::ALL {
        let (ax, ay) = anchor(label);
        let (px, py) = to_px(ax, ay);
        fill_square(&mut canvas, px, py, ANCHOR_HALF, label_color(label));
    }

    for point in points {
        let (px, py) = to_px(point.x, point.y);
        fill_circle(&mut canvas, px, py, POINT_RADIUS, label_color(point.label));
    }
    canvas
}

fn put(canvas: &mut Canvas, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(canvas.width()) && y < i64::from(canvas.height()) {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_circle(canvas: &mut Canvas, cx: i64, cy: i64, r: i64, color: Rgba<u8>) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put(canvas, cx + dx, cy + dy, color);
            }
        }
    }
}

fn fill_square(canvas: &mut Canvas, cx: i64, cy: i64, half: i64, color: Rgba<u8>) {
    for dy in -half..=half {
        for dx in -half..=half {
            // Hollow so overlapping points stay visible.
            if dx.abs() == half || dy.abs() == half {
                put(canvas, cx + dx, cy + dy, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::memory::EmotionMemory;
    use sentio_model::Prediction;

    fn config_in(dir: &std::path::Path) -> ClusterConfig {
        ClusterConfig {
            output_path: dir.join("static").join("clusters.png"),
            ..Default::default()
        }
    }

    fn log_of(n: usize) -> Vec<ConversationEntry> {
        let mut memory = EmotionMemory::new();
        for i in 0..n {
            let label = EmotionLabel::ALL[i % EmotionLabel::ALL.len()];
            memory.record(&format!("message {i}"), label).unwrap();
        }
        memory.snapshot()
    }

    #[test]
    fn anchors_lie_on_unit_circle() {
        for label in EmotionLabel::ALL {
            let (x, y) = anchor(label);
            assert!(((x * x + y * y).sqrt() - 1.0).abs() < 1e-9);
        }
        let (x, y) = anchor(EmotionLabel::Anger);
        assert!(x.abs() < 1e-9 && (y + 1.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_projects_to_origin() {
        let (x, y) = project(&EmotionDistribution::uniform());
        assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
    }

    #[test]
    fn one_hot_projects_to_anchor() {
        let (x, y) = project(&EmotionDistribution::one_hot(EmotionLabel::Joy));
        let (ax, ay) = anchor(EmotionLabel::Joy);
        assert!((x - ax).abs() < 1e-6 && (y - ay).abs() < 1e-6);
    }

    #[test]
    fn below_minimum_is_not_enough_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        for n in 0..5 {
            let report = generate_clusters(&log_of(n), &config).unwrap();
            assert_eq!(report, ClusterReport::NotEnoughData { have: n, need: 5 });
        }
        assert!(!config.output_path.exists());
    }

    #[test]
    fn not_enough_data_message() {
        let report = ClusterReport::NotEnoughData { have: 2, need: 5 };
        assert_eq!(
            report.message(),
            "Not enough data for clustering (need at least 5 interactions)"
        );
    }

    #[test]
    fn writes_png_at_minimum() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let report = generate_clusters(&log_of(5), &config).unwrap();
        let ClusterReport::Generated { path, points } = report else {
            panic!("expected a generated plot");
        };
        assert_eq!(path, config.output_path);
        assert_eq!(points.len(), 5);

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (config.width, config.height));
        assert!(img.pixels().any(|p| *p == label_color(EmotionLabel::Anger)));
    }

    #[test]
    fn points_keep_entry_order_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let mut memory = EmotionMemory::new();
        for i in 0..6 {
            memory
                .record_prediction(&format!("m{i}"), &Prediction::fallback())
                .unwrap();
        }
        let report = generate_clusters(&memory.snapshot(), &config_in(dir.path())).unwrap();
        let ClusterReport::Generated { points, .. } = report else {
            panic!("expected a generated plot");
        };
        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.index, i as u64);
            assert_eq!(p.label, EmotionLabel::Neutral);
            assert!(p.x.abs() < 1e-6 && p.y.abs() < 1e-6);
        }
    }

    #[test]
    fn oversized_canvas_is_rejected_before_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClusterConfig {
            output_path: dir.path().join("clusters.png"),
            width: 100_000,
            ..Default::default()
        };
        let err = generate_clusters(&log_of(5), &config).unwrap_err();
        assert!(matches!(err, SentioError::Config(_)));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn unwritable_output_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("static");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let config = ClusterConfig {
            output_path: blocker.join("clusters.png"),
            ..Default::default()
        };
        let err = generate_clusters(&log_of(5), &config).unwrap_err();
        assert!(matches!(err, SentioError::Render(_)));
    }
}
