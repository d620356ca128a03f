//! Attribute recipes and the interleaved vertex layouts they describe

use serde::{Deserialize, Serialize};

use crate::format::{AttributeKind, Format};

/// One attribute of a recipe: where to read it from and how to encode it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeEntry {
    /// Attribute name, matched against shader inputs downstream.
    pub name: String,
    /// Source field the value is extracted from.
    pub kind: AttributeKind,
    /// Output encoding.
    pub format: Format,
}

impl RecipeEntry {
    pub fn new(name: impl Into<String>, kind: AttributeKind, format: Format) -> Self {
        Self {
            name: name.into(),
            kind,
            format,
        }
    }
}

/// Ordered list of attributes defining one interleaved vertex layout.
///
/// Entry order is byte order: each attribute starts where the previous one ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeRecipe {
    entries: Vec<RecipeEntry>,
}

impl AttributeRecipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RecipeEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RecipeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of one interleaved vertex in bytes.
    pub fn stride(&self) -> usize {
        self.entries.iter().map(|e| e.format.size()).sum()
    }

    /// The first entry whose format cannot be encoded, if any.
    pub fn first_unsupported(&self) -> Option<&RecipeEntry> {
        self.entries.iter().find(|e| !e.format.is_encodable())
    }

    /// Layout produced by this recipe, with running-sum offsets.
    pub fn layout(&self) -> VertexLayout {
        let mut offset = 0u32;
        let attributes = self
            .entries
            .iter()
            .map(|entry| {
                let attribute = NamedAttribute {
                    name: entry.name.clone(),
                    attribute: VertexAttribute {
                        format: entry.format,
                        kind: entry.kind,
                        offset,
                    },
                };
                offset += entry.format.size() as u32;
                attribute
            })
            .collect();
        VertexLayout { attributes }
    }
}

impl FromIterator<RecipeEntry> for AttributeRecipe {
    fn from_iter<T: IntoIterator<Item = RecipeEntry>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Encoding and position of one attribute inside a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VertexAttribute {
    pub format: Format,
    pub kind: AttributeKind,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedAttribute {
    pub name: String,
    #[serde(flatten)]
    pub attribute: VertexAttribute,
}

/// Attribute layout of one converted folder, in offset order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VertexLayout {
    attributes: Vec<NamedAttribute>,
}

impl VertexLayout {
    pub fn from_attributes(attributes: Vec<NamedAttribute>) -> Self {
        Self { attributes }
    }

    pub fn get(&self, name: &str) -> Option<VertexAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.attribute)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedAttribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Size of one vertex in bytes.
    pub fn stride(&self) -> usize {
        self.attributes
            .iter()
            .map(|a| a.attribute.format.size())
            .sum()
    }
}

impl<'a> IntoIterator for &'a VertexLayout {
    type Item = &'a NamedAttribute;
    type IntoIter = std::slice::Iter<'a, NamedAttribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}
