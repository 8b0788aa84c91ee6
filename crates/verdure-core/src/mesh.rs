use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            uv: Vec2::ZERO,
        }
    }
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounds: BoundingBox,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let bounds = BoundingBox::from_vertices(&vertices);
        Self {
            vertices,
            indices,
            bounds,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Face normal of triangle `t`, scaled by twice the triangle's area.
    pub fn face_normal(&self, t: usize) -> Vec3 {
        let i0 = self.indices[t * 3] as usize;
        let i1 = self.indices[t * 3 + 1] as usize;
        let i2 = self.indices[t * 3 + 2] as usize;

        let p0 = self.vertices[i0].position;
        let p1 = self.vertices[i1].position;
        let p2 = self.vertices[i2].position;

        (p1 - p0).cross(p2 - p0)
    }

    /// Smooth normals: every vertex gets the area-weighted sum of the faces
    /// touching it, normalised. Vertices used by no face end up with a zero normal.
    pub fn recalculate_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];

        for t in 0..self.triangle_count() {
            let n = self.face_normal(t);
            for corner in &self.indices[t * 3..t * 3 + 3] {
                accumulated[*corner as usize] += n;
            }
        }

        for (vertex, n) in self.vertices.iter_mut().zip(accumulated) {
            vertex.normal = n.normalize_or_zero();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let Some(first) = vertices.first() else {
            return Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            };
        };

        let mut min = first.position;
        let mut max = first.position;

        for vertex in vertices.iter().skip(1) {
            min = min.min(vertex.position);
            max = max.max(vertex.position);
        }

        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn extents(&self) -> Vec3 {
        self.size() * 0.5
    }
}

pub mod primitives {
    use super::*;

    /// A single tapered grass blade facing +Z.
    ///
    /// The blade is centred on the origin, spanning `y ∈ [-height/2, height/2]`,
    /// so an instance has to be lifted by half its scaled height to stand on
    /// the ground.
    pub fn create_blade(width: f32, height: f32, segments: u32) -> Mesh {
        let segments = segments.max(1);
        let mut vertices = Vec::with_capacity(segments as usize * 2 + 1);
        let mut indices = Vec::with_capacity(segments as usize * 6);

        for i in 0..segments {
            let t = i as f32 / segments as f32;
            let y = (t - 0.5) * height;
            let half = width * 0.5 * (1.0 - t);

            vertices.push(Vertex::new(Vec3::new(-half, y, 0.0), Vec3::Z, Vec2::new(0.0, t)));
            vertices.push(Vertex::new(Vec3::new(half, y, 0.0), Vec3::Z, Vec2::new(1.0, t)));
        }
        vertices.push(Vertex::new(
            Vec3::new(0.0, height * 0.5, 0.0),
            Vec3::Z,
            Vec2::new(0.5, 1.0),
        ));

        let tip = segments * 2;
        for i in 0..segments {
            let left = i * 2;
            let right = left + 1;
            if i + 1 < segments {
                let next_left = left + 2;
                let next_right = left + 3;
                indices.extend_from_slice(&[left, right, next_right, left, next_right, next_left]);
            } else {
                indices.extend_from_slice(&[left, right, tip]);
            }
        }

        Mesh::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blade_bounds_span_full_height() {
        let blade = primitives::create_blade(0.1, 2.0, 4);
        let size = blade.bounds.size();
        assert!((size.y - 2.0).abs() < 1e-6);
        assert!((blade.bounds.center().y).abs() < 1e-6);
        assert_eq!(blade.triangle_count(), 3 * 2 + 1);
    }

    #[test]
    fn recalculated_normals_follow_winding() {
        let vertices = vec![
            Vertex::new(Vec3::ZERO, Vec3::ZERO, Vec2::ZERO),
            Vertex::new(Vec3::X, Vec3::ZERO, Vec2::ZERO),
            Vertex::new(Vec3::Y, Vec3::ZERO, Vec2::ZERO),
        ];
        let mut mesh = Mesh::new(vertices, vec![0, 1, 2]);
        mesh.recalculate_normals();
        for v in &mesh.vertices {
            assert_eq!(v.normal, Vec3::Z);
        }
    }

    #[test]
    fn empty_mesh_has_degenerate_bounds() {
        let mesh = Mesh::new(Vec::new(), Vec::new());
        assert_eq!(mesh.bounds.size(), Vec3::ZERO);
    }
}
