use std::collections::HashMap;

use meshpack_core::{AssetError, MeshDrawInfo, VertexAttribute, VertexLayout, INDEX_SIZE};
use serde::Serialize;
use tracing::debug;

/// Draws that share a batching tag, in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshGroup {
    tag: String,
    draws: Vec<MeshDrawInfo>,
}

impl MeshGroup {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            draws: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn draws(&self) -> &[MeshDrawInfo] {
        &self.draws
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeshDrawInfo> {
        self.draws.iter()
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}

impl<'a> IntoIterator for &'a MeshGroup {
    type Item = &'a MeshDrawInfo;
    type IntoIter = std::slice::Iter<'a, MeshDrawInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.draws.iter()
    }
}

/// Meshes of one converted folder. All of them share a vertex layout and
/// live in one contiguous region of the vertex and index buffers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshFormatGroup {
    name: String,
    layout: VertexLayout,
    vertex_offset: usize,
    index_offset: usize,
    groups: Vec<MeshGroup>,
}

impl MeshFormatGroup {
    pub(crate) fn new(
        name: String,
        layout: VertexLayout,
        vertex_offset: usize,
        index_offset: usize,
    ) -> Self {
        Self {
            name,
            layout,
            vertex_offset,
            index_offset,
            groups: Vec::new(),
        }
    }

    /// Name of the folder the meshes were loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn attribute(&self, name: &str) -> Option<VertexAttribute> {
        self.layout.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.layout.contains(name)
    }

    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    /// Byte offset of the group's vertices in the shared vertex buffer.
    pub fn vertex_offset(&self) -> usize {
        self.vertex_offset
    }

    /// Byte offset of the group's indices in the shared index buffer.
    pub fn index_offset(&self) -> usize {
        self.index_offset
    }

    /// Tag groups in first-draw order.
    pub fn groups(&self) -> &[MeshGroup] {
        &self.groups
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeshGroup> {
        self.groups.iter()
    }

    fn group_mut(&mut self, tag: &str) -> &mut MeshGroup {
        let position = match self.groups.iter().position(|g| g.tag == tag) {
            Some(position) => position,
            None => {
                self.groups.push(MeshGroup::new(tag));
                self.groups.len() - 1
            }
        };
        &mut self.groups[position]
    }
}

impl<'a> IntoIterator for &'a MeshFormatGroup {
    type Item = &'a MeshGroup;
    type IntoIter = std::slice::Iter<'a, MeshGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

#[derive(Debug, Clone, Copy)]
struct PlannedMesh {
    draw: MeshDrawInfo,
    format: usize,
}

/// Collects draw requests grouped by vertex format, then by tag.
///
/// Iterating the planner yields format groups in folder order, each with its
/// tag groups in the order their first draw was registered.
#[derive(Debug, Clone, Default)]
pub struct MeshDrawPlanner {
    formats: Vec<MeshFormatGroup>,
    meshes: HashMap<String, PlannedMesh>,
}

impl MeshDrawPlanner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_format(&mut self, group: MeshFormatGroup) -> usize {
        self.formats.push(group);
        self.formats.len() - 1
    }

    /// Register a loaded mesh. `draw` is local to the format group's region;
    /// its `first_index` is translated into the shared index buffer here.
    pub(crate) fn insert_mesh(
        &mut self,
        name: String,
        draw: MeshDrawInfo,
        format: usize,
    ) -> Result<(), AssetError> {
        let index_base = self.formats[format].index_offset / INDEX_SIZE;
        let Some(draw) = draw.shifted(index_base) else {
            return Err(AssetError::IndexOverflow(name));
        };
        self.meshes.insert(name, PlannedMesh { draw, format });
        Ok(())
    }

    /// Queue one draw of `mesh` under `tag`. Repeated calls queue repeated draws.
    pub fn draw(&mut self, mesh: &str, tag: &str) -> Result<(), AssetError> {
        let planned = self
            .meshes
            .get(mesh)
            .copied()
            .ok_or_else(|| AssetError::UnknownMesh(mesh.to_owned()))?;

        let format = &mut self.formats[planned.format];
        let draw = planned.draw;

        debug!(
            "Plan draw '{}' in '{}' with tag '{}': first index {}, {} indices",
            mesh, format.name, tag, draw.first_index, draw.index_count
        );

        format.group_mut(tag).draws.push(draw);
        Ok(())
    }

    pub fn format_groups(&self) -> &[MeshFormatGroup] {
        &self.formats
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeshFormatGroup> {
        self.formats.iter()
    }

    /// Draw info of a loaded mesh, with `first_index` in the shared index
    /// buffer, and the name of its format group.
    pub fn mesh(&self, name: &str) -> Option<(MeshDrawInfo, &str)> {
        self.meshes
            .get(name)
            .map(|planned| (planned.draw, self.formats[planned.format].name.as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }

    /// Names of every loaded mesh, sorted.
    pub fn mesh_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.meshes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Forget all queued draws. Format groups and loaded meshes are kept.
    pub fn clear(&mut self) {
        for format in &mut self.formats {
            format.groups.clear();
        }
    }

    /// Number of queued draws across all groups.
    pub fn draw_count(&self) -> usize {
        self.formats
            .iter()
            .flat_map(|f| f.groups.iter())
            .map(MeshGroup::len)
            .sum()
    }
}

impl<'a> IntoIterator for &'a MeshDrawPlanner {
    type Item = &'a MeshFormatGroup;
    type IntoIter = std::slice::Iter<'a, MeshFormatGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.formats.iter()
    }
}
