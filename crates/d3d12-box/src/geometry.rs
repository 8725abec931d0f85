use bevy_math::Mat4;

/// Per-vertex input: `POSITION` then `COLOR`, packed back to back.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Byte offset of [`Vertex::color`], for the input layout.
pub const VERTEX_COLOR_OFFSET: u32 = 12;

/// The `cbPerObject` constant buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectConstants {
    /// Column-major, which is how HLSL reads a `float4x4` by default.
    pub world_view_proj: [f32; 16],
}

impl ObjectConstants {
    pub fn new(world_view_proj: Mat4) -> Self {
        Self {
            world_view_proj: world_view_proj.to_cols_array(),
        }
    }
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

/// A range of a shared vertex/index buffer pair drawn with one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmeshGeometry {
    pub index_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: i32,
}

pub mod colors {
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    /// Web green, not pure green.
    pub const GREEN: [f32; 4] = [0.0, 0.501_960_8, 0.0, 1.0];
    pub const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
    pub const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
    pub const CYAN: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
    pub const MAGENTA: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
}

pub const BOX_VERTICES: [Vertex; 8] = [
    Vertex { position: [-1.0, -1.0, -1.0], color: colors::WHITE },
    Vertex { position: [-1.0, 1.0, -1.0], color: colors::BLACK },
    Vertex { position: [1.0, 1.0, -1.0], color: colors::RED },
    Vertex { position: [1.0, -1.0, -1.0], color: colors::GREEN },
    Vertex { position: [-1.0, -1.0, 1.0], color: colors::BLUE },
    Vertex { position: [-1.0, 1.0, 1.0], color: colors::YELLOW },
    Vertex { position: [1.0, 1.0, 1.0], color: colors::CYAN },
    Vertex { position: [1.0, -1.0, 1.0], color: colors::MAGENTA },
];

/// Two clockwise triangles per face, as seen from outside the box.
#[rustfmt::skip]
pub const BOX_INDICES: [u16; 36] = [
    // front face
    0, 1, 2,
    0, 2, 3,
    // back face
    4, 6, 5,
    4, 7, 6,
    // left face
    4, 5, 1,
    4, 1, 0,
    // right face
    3, 2, 6,
    3, 6, 7,
    // top face
    1, 5, 6,
    1, 6, 2,
    // bottom face
    4, 0, 3,
    4, 3, 7,
];

pub const BOX_SUBMESH_NAME: &str = "box";

pub fn box_submesh() -> SubmeshGeometry {
    SubmeshGeometry {
        index_count: BOX_INDICES.len() as u32,
        start_index_location: 0,
        base_vertex_location: 0,
    }
}

/// The raw bytes of a slice of plain `#[repr(C)]` values, for uploading.
pub fn as_bytes<T: Copy>(values: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(values.as_ptr().cast::<u8>(), std::mem::size_of_val(values)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_math::Vec3;
    use d3d12_app_framework::upload::UploadLayout;

    #[test]
    fn vertex_layout_matches_the_input_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 28);
        assert_eq!(std::mem::offset_of!(Vertex, color), VERTEX_COLOR_OFFSET as usize);
        assert_eq!(as_bytes(&BOX_VERTICES).len(), 8 * 28);
        assert_eq!(as_bytes(&BOX_INDICES).len(), 72);
    }

    #[test]
    fn object_constants_take_one_constant_buffer_slot() {
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 64);
        let layout = UploadLayout::of::<ObjectConstants>(1, true).unwrap();
        assert_eq!(layout.stride(), 256);
    }

    #[test]
    fn every_triangle_faces_outward() {
        for triangle in BOX_INDICES.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(BOX_VERTICES[triangle[i] as usize].position));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(
                normal.dot(centroid) > 0.0,
                "triangle {triangle:?} winds the wrong way"
            );
        }
    }

    #[test]
    fn indices_cover_every_vertex() {
        let mut used = [false; 8];
        for &index in &BOX_INDICES {
            used[index as usize] = true;
        }
        assert!(used.iter().all(|&u| u));
        assert_eq!(box_submesh().index_count, 36);
    }

    #[test]
    fn constants_are_column_major() {
        let translation = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let constants = ObjectConstants::new(translation);
        assert_eq!(&constants.world_view_proj[12..16], &[1.0, 2.0, 3.0, 1.0]);
    }
}
