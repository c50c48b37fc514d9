//! Camera intrinsics passed to the feature detector

use serde::{Deserialize, Serialize};

/// Pinhole intrinsics with radial-tangential distortion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,

    /// k1, k2, p1, p2
    #[serde(default)]
    pub distortion: [f64; 4],
}

impl CameraIntrinsics {
    pub fn pinhole(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            distortion: [0.0; 4],
        }
    }

    /// Undistorted pinhole guessed from image size and lens field of view.
    ///
    /// Principal point at the image centre.
    pub fn from_fov(image_width: f64, image_height: f64, hfov_deg: f64, vfov_deg: f64) -> Self {
        Self::pinhole(
            pinhole_focal(image_width, hfov_deg),
            pinhole_focal(image_height, vfov_deg),
            image_width / 2.0,
            image_height / 2.0,
        )
    }
}

/// Focal length (pixels) for an image dimension and field of view (degrees).
pub fn pinhole_focal(image_size: f64, fov_deg: f64) -> f64 {
    (image_size / 2.0) / (fov_deg.to_radians() / 2.0).tan()
}

/// How a camera's intrinsics are specified in the dataset config
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntrinsicsSpec {
    /// Explicit values
    Calibrated(CameraIntrinsics),
    /// Image size + lens field of view
    FieldOfView {
        image_size: [f64; 2],
        lens_hfov: f64,
        lens_vfov: f64,
    },
}

impl IntrinsicsSpec {
    pub fn resolve(&self) -> CameraIntrinsics {
        match *self {
            Self::Calibrated(intrinsics) => intrinsics,
            Self::FieldOfView {
                image_size,
                lens_hfov,
                lens_vfov,
            } => CameraIntrinsics::from_fov(image_size[0], image_size[1], lens_hfov, lens_vfov),
        }
    }
}
