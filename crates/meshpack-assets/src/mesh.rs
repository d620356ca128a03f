use glam::Vec4;
use meshpack_core::AttributeKind;

/// One logical sub-mesh read from a source model file. A source file yields
/// one or more of these; the converter concatenates them into a single mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSubMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[f32; 4]>>,
    pub tangents: Option<Vec<[f32; 4]>>,
    /// Triangle list. `None` means the vertices are already in draw order.
    pub indices: Option<Vec<u32>>,
}

impl SourceSubMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Whether every vertex carries a value for `kind`.
    pub fn has(&self, kind: AttributeKind) -> bool {
        let len = match kind {
            AttributeKind::Position => Some(self.positions.len()),
            AttributeKind::Normal => self.normals.as_ref().map(Vec::len),
            AttributeKind::TexCoord => self.tex_coords.as_ref().map(Vec::len),
            AttributeKind::Color => self.colors.as_ref().map(Vec::len),
            AttributeKind::Tangent => self.tangents.as_ref().map(Vec::len),
        };
        len == Some(self.vertex_count())
    }

    /// Value of `kind` for vertex `vertex`, widened to four components.
    ///
    /// Positions get `w = 1`; directions and texture coordinates are padded
    /// with zeros.
    pub fn field(&self, kind: AttributeKind, vertex: usize) -> Option<Vec4> {
        match kind {
            AttributeKind::Position => self
                .positions
                .get(vertex)
                .map(|&[x, y, z]| Vec4::new(x, y, z, 1.0)),
            AttributeKind::Normal => self
                .normals
                .as_ref()?
                .get(vertex)
                .map(|&[x, y, z]| Vec4::new(x, y, z, 0.0)),
            AttributeKind::TexCoord => self
                .tex_coords
                .as_ref()?
                .get(vertex)
                .map(|&[u, v]| Vec4::new(u, v, 0.0, 0.0)),
            AttributeKind::Color => self.colors.as_ref()?.get(vertex).map(|&c| Vec4::from(c)),
            AttributeKind::Tangent => self.tangents.as_ref()?.get(vertex).map(|&t| Vec4::from(t)),
        }
    }

    /// Triangle indices, generating `0..vertex_count` when the source has none.
    pub fn triangle_indices(&self) -> Vec<u32> {
        match &self.indices {
            Some(indices) => indices.clone(),
            None => (0..self.vertex_count() as u32).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> SourceSubMesh {
        SourceSubMesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: Some(vec![[0.0, 0.0, 1.0]; 3]),
            tex_coords: Some(vec![[0.0, 0.0], [1.0, 0.0]]),
            ..Default::default()
        }
    }

    #[test]
    fn has_requires_full_coverage() {
        let mesh = triangle();
        assert!(mesh.has(AttributeKind::Position));
        assert!(mesh.has(AttributeKind::Normal));
        // two texcoords for three vertices
        assert!(!mesh.has(AttributeKind::TexCoord));
        assert!(!mesh.has(AttributeKind::Color));
    }

    #[test]
    fn fields_are_widened() {
        let mesh = triangle();
        assert_eq!(
            mesh.field(AttributeKind::Position, 1),
            Some(Vec4::new(1.0, 0.0, 0.0, 1.0))
        );
        assert_eq!(
            mesh.field(AttributeKind::Normal, 2),
            Some(Vec4::new(0.0, 0.0, 1.0, 0.0))
        );
        assert_eq!(mesh.field(AttributeKind::Tangent, 0), None);
        assert_eq!(mesh.field(AttributeKind::Position, 3), None);
    }

    #[test]
    fn missing_indices_are_sequential() {
        assert_eq!(triangle().triangle_indices(), vec![0, 1, 2]);
        let indexed = SourceSubMesh {
            indices: Some(vec![2, 1, 0]),
            ..triangle()
        };
        assert_eq!(indexed.triangle_indices(), vec![2, 1, 0]);
    }
}
