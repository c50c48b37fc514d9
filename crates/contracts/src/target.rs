//! TargetGeometry - calibration target description
//!
//! Shared read-only by every `DetectionRecord` of a run.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{FeatureId, Point3, CORNERS_PER_FEATURE};

/// Calibration target kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Grid of AprilTags, one feature per tag
    #[default]
    Aprilgrid,
    /// Plain checkerboard (features are inner corners, grouped per square)
    Checkerboard,
}

/// Geometry of the calibration target
///
/// Tag `id` sits at row `id / tag_cols`, column `id % tag_cols`. Adjacent
/// tags are `tag_size * (1 + tag_spacing)` apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TargetGeometry {
    #[serde(default)]
    pub target_type: TargetType,

    /// Number of tag rows
    #[validate(range(min = 1))]
    pub tag_rows: u32,

    /// Number of tag columns
    #[validate(range(min = 1))]
    pub tag_cols: u32,

    /// Tag edge length (metres)
    #[validate(range(exclusive_min = 0.0))]
    pub tag_size: f64,

    /// Gap between tags as a ratio of `tag_size`
    #[validate(range(min = 0.0))]
    pub tag_spacing: f64,
}

impl TargetGeometry {
    pub fn aprilgrid(tag_rows: u32, tag_cols: u32, tag_size: f64, tag_spacing: f64) -> Self {
        Self {
            target_type: TargetType::Aprilgrid,
            tag_rows,
            tag_cols,
            tag_size,
            tag_spacing,
        }
    }

    pub fn num_tags(&self) -> usize {
        self.tag_rows as usize * self.tag_cols as usize
    }

    pub fn contains_tag(&self, id: FeatureId) -> bool {
        (id as usize) < self.num_tags()
    }

    /// `(row, col)` of a tag, `None` when the id is outside the grid.
    pub fn tag_grid_index(&self, id: FeatureId) -> Option<(u32, u32)> {
        self.contains_tag(id)
            .then(|| (id / self.tag_cols, id % self.tag_cols))
    }

    /// Target-frame corners of a tag: bottom-left, bottom-right, top-right,
    /// top-left, all on the `z = 0` plane.
    pub fn object_points(&self, id: FeatureId) -> Option<[Point3; CORNERS_PER_FEATURE]> {
        let (row, col) = self.tag_grid_index(id)?;
        let pitch = self.tag_size * (1.0 + self.tag_spacing);
        let x = col as f64 * pitch;
        let y = row as f64 * pitch;
        let s = self.tag_size;

        Some([
            Point3::new(x, y, 0.0),
            Point3::new(x + s, y, 0.0),
            Point3::new(x + s, y + s, 0.0),
            Point3::new(x, y + s, 0.0),
        ])
    }

    /// Overall width and height of the printed grid (metres).
    pub fn extent(&self) -> (f64, f64) {
        let pitch = self.tag_size * (1.0 + self.tag_spacing);
        let span = |n: u32| (n.saturating_sub(1)) as f64 * pitch + self.tag_size;
        (span(self.tag_cols), span(self.tag_rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_layout() {
        let target = TargetGeometry::aprilgrid(6, 7, 0.1, 0.5);
        assert_eq!(target.num_tags(), 42);
        assert_eq!(target.tag_grid_index(0), Some((0, 0)));
        assert_eq!(target.tag_grid_index(8), Some((1, 1)));
        assert_eq!(target.tag_grid_index(42), None);
    }

    #[test]
    fn test_object_points_follow_pitch() {
        let target = TargetGeometry::aprilgrid(2, 2, 0.1, 0.5);
        let corners = target.object_points(3).unwrap();
        assert!((corners[0].x - 0.15).abs() < 1e-12);
        assert!((corners[0].y - 0.15).abs() < 1e-12);
        assert!((corners[2].x - 0.25).abs() < 1e-12);
        assert!((corners[3].y - 0.25).abs() < 1e-12);
        assert!(target.object_points(4).is_none());
    }

    #[test]
    fn test_extent() {
        let target = TargetGeometry::aprilgrid(1, 3, 0.1, 1.0);
        let (w, h) = target.extent();
        assert!((w - 0.5).abs() < 1e-12);
        assert!((h - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_validation_rejects_degenerate_grid() {
        assert!(TargetGeometry::aprilgrid(6, 6, 0.088, 0.3).validate().is_ok());
        assert!(TargetGeometry::aprilgrid(0, 6, 0.088, 0.3).validate().is_err());
        assert!(TargetGeometry::aprilgrid(6, 6, 0.0, 0.3).validate().is_err());
        assert!(TargetGeometry::aprilgrid(6, 6, 0.088, -0.1).validate().is_err());
    }
}
