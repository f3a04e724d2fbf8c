//! Local TRS transforms and matrix layout conversion.
//!
//! Source scenes store node matrices row-major, the document expects column-major.
//! The conversion is an explicit index mapping so it can be tested on its own.

use cgmath::{Matrix4, One, Quaternion, Vector3};

/// Position, rotation (as quaternion) and scale of a model relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// `T * R * S`: scale first, then rotate, then translate.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// Swap the storage order of a flat 4x4 matrix: element `[r][c]` of `src` becomes `[c][r]`.
pub fn transpose_flat(src: &[f32; 16]) -> [f32; 16] {
    let mut dst = [0.0; 16];
    for r in 0..4 {
        for c in 0..4 {
            dst[c * 4 + r] = src[r * 4 + c];
        }
    }
    dst
}

/// Convert a row-major flat matrix (as stored in scene nodes) to a column-major [`Matrix4`].
pub fn row_major_to_column_major(src: &[f32; 16]) -> Matrix4<f32> {
    let m = transpose_flat(src);
    Matrix4::new(
        m[0], m[1], m[2], m[3], //
        m[4], m[5], m[6], m[7], //
        m[8], m[9], m[10], m[11], //
        m[12], m[13], m[14], m[15],
    )
}

/// Convert column-major `[[f32; 4]; 4]` (as glTF hands out) to the row-major flat layout.
pub fn columns_to_row_major(columns: &[[f32; 4]; 4]) -> [f32; 16] {
    let mut dst = [0.0; 16];
    for (c, column) in columns.iter().enumerate() {
        for (r, value) in column.iter().enumerate() {
            dst[r * 4 + c] = *value;
        }
    }
    dst
}
