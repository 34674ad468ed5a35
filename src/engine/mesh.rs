/// Floats per vertex: position (3), color (3), texture coordinate (2).
pub const VERTEX_STRIDE: usize = 8;

pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// Unit square in the XY plane facing +Z, for billboards.
    pub fn quad() -> Self {
        let vertices = vec![
            -0.5, -0.5, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0,
            0.5, -0.5, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0,
            0.5, 0.5, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0,
            -0.5, 0.5, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0,
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        Mesh { vertices, indices }
    }

    /// UV sphere of radius 1 with `segments` slices and rings.
    pub fn sphere(segments: u16, r: f32, g: f32, b: f32) -> Self {
        let segments = segments.clamp(3, 180);
        let mut vertices = Vec::with_capacity((segments as usize + 1).pow(2) * VERTEX_STRIDE);
        let mut indices = Vec::with_capacity(segments as usize * segments as usize * 6);

        for ring in 0..=segments {
            let v = ring as f32 / segments as f32;
            let theta = v * std::f32::consts::PI;
            for slice in 0..=segments {
                let u = slice as f32 / segments as f32;
                let phi = u * 2.0 * std::f32::consts::PI;

                let x = -phi.cos() * theta.sin();
                let y = theta.cos();
                let z = phi.sin() * theta.sin();
                vertices.extend_from_slice(&[x, y, z, r, g, b, u, v]);
            }
        }

        let row = segments + 1;
        for ring in 0..segments {
            for slice in 0..segments {
                let top = ring * row + slice;
                let bottom = top + row;
                indices.extend_from_slice(&[top, bottom, top + 1, bottom, bottom + 1, top + 1]);
            }
        }

        Mesh { vertices, indices }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }
}
