//! Pinhole-radtan helpers on top of `nalgebra`.

use contracts::{CameraIntrinsics, Point2};
use nalgebra::{Matrix3, Vector2, Vector3};

/// Camera matrix K
pub fn camera_matrix(intrinsics: &CameraIntrinsics) -> Matrix3<f64> {
    Matrix3::new(
        intrinsics.fx,
        0.0,
        intrinsics.cx,
        0.0,
        intrinsics.fy,
        intrinsics.cy,
        0.0,
        0.0,
        1.0,
    )
}

/// Apply radial-tangential distortion (k1, k2, p1, p2) to a normalized point.
pub fn distort_radtan(distortion: &[f64; 4], p: Vector2<f64>) -> Vector2<f64> {
    let [k1, k2, p1, p2] = *distortion;
    let (x, y) = (p.x, p.y);
    let r2 = x * x + y * y;
    let radial = 1.0 + k1 * r2 + k2 * r2 * r2;
    let dx = 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
    let dy = p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;
    Vector2::new(x * radial + dx, y * radial + dy)
}

/// Project a camera-frame point to pixels; `None` behind the camera.
pub fn project(intrinsics: &CameraIntrinsics, point: Vector3<f64>) -> Option<Point2> {
    if point.z <= f64::EPSILON {
        return None;
    }
    let normalized = distort_radtan(&intrinsics.distortion, point.xy() / point.z);
    let pixel = camera_matrix(intrinsics) * normalized.push(1.0);
    Some(Point2::new(pixel.x, pixel.y))
}

/// Image size implied by a centred principal point.
pub fn nominal_image_size(intrinsics: &CameraIntrinsics) -> (f64, f64) {
    (2.0 * intrinsics.cx, 2.0 * intrinsics.cy)
}
