//! 4x4 matrices in Direct3D row-vector layout.
//!
//! `m[3]` holds the translation row, so the flat array can be uploaded to
//! GL unchanged (it reads as column-major there).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub m: [[f32; 4]; 4],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Left-handed off-center orthographic projection (D3DXMatrixOrthoOffCenterLH).
    #[must_use]
    pub fn ortho_off_center_lh(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        let w = right - left;
        let h = top - bottom;
        Self {
            m: [
                [2.0 / w, 0.0, 0.0, 0.0],
                [0.0, 2.0 / h, 0.0, 0.0],
                [0.0, 0.0, 1.0 / (z_far - z_near), 0.0],
                [
                    -(left + right) / w,
                    -(top + bottom) / h,
                    z_near / (z_near - z_far),
                    1.0,
                ],
            ],
        }
    }

    /// Right-handed variant, used when presenting the back buffer.
    #[must_use]
    pub fn ortho_off_center_rh(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        let mut o = Self::ortho_off_center_lh(left, right, bottom, top, z_near, z_far);
        o.m[2][2] = 1.0 / (z_near - z_far);
        o
    }

    #[must_use]
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        let mut n = [[0.0f32; 4]; 4];
        for (x, row) in n.iter_mut().enumerate() {
            for (y, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|z| self.m[x][z] * other.m[z][y]).sum();
            }
        }
        Matrix { m: n }
    }

    /// Transform a point as a row vector.
    #[must_use]
    pub fn transform_point(&self, x: f32, y: f32, z: f32) -> [f32; 4] {
        let v = [x, y, z, 1.0];
        let mut out = [0.0f32; 4];
        for (col, o) in out.iter_mut().enumerate() {
            *o = (0..4).map(|row| v[row] * self.m[row][col]).sum();
        }
        out
    }

    /// Flat column-major view for uniform upload.
    #[must_use]
    pub fn as_flat(&self) -> &[f32; 16] {
        bytemuck::cast_ref(&self.m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ortho_maps_screen_corners() {
        let proj = Matrix::ortho_off_center_lh(0.0, 640.0, 0.0, 480.0, -32768.0, 32767.0);
        let p = proj.transform_point(0.0, 0.0, 0.0);
        assert!((p[0] + 1.0).abs() < 1e-6);
        assert!((p[1] + 1.0).abs() < 1e-6);
        let p = proj.transform_point(640.0, 480.0, 0.0);
        assert!((p[0] - 1.0).abs() < 1e-6);
        assert!((p[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_identity_multiply() {
        let proj = Matrix::ortho_off_center_lh(0.0, 320.0, 0.0, 240.0, -1.0, 1.0);
        assert_eq!(proj.multiply(&Matrix::identity()), proj);
        assert_eq!(Matrix::identity().as_flat()[15], 1.0);
    }
}
