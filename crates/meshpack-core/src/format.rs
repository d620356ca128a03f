//! Vertex attribute encodings and the semantics they are extracted from

use std::fmt;

use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Byte encoding of a single vertex attribute.
///
/// Every variant has a fixed size. `Undefined` is the only variant without an
/// encoding; a recipe that names it is rejected before any vertex is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    #[default]
    #[serde(rename = "undefined")]
    Undefined,
    #[serde(rename = "r32_sfloat")]
    R32Sfloat,
    #[serde(rename = "r32g32_sfloat")]
    R32G32Sfloat,
    #[serde(rename = "r32g32b32_sfloat")]
    R32G32B32Sfloat,
    #[serde(rename = "r32g32b32a32_sfloat")]
    R32G32B32A32Sfloat,
    #[serde(rename = "r8g8b8a8_unorm")]
    R8G8B8A8Unorm,
    #[serde(rename = "r16g16_unorm")]
    R16G16Unorm,
}

/// Returned when a value is encoded with a format that has no encoding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("format {0} has no encoding")]
pub struct NoEncoding(pub Format);

impl Format {
    /// Every format, in on-disk code order.
    pub const ALL: [Format; 7] = [
        Format::Undefined,
        Format::R32Sfloat,
        Format::R32G32Sfloat,
        Format::R32G32B32Sfloat,
        Format::R32G32B32A32Sfloat,
        Format::R8G8B8A8Unorm,
        Format::R16G16Unorm,
    ];

    /// Size of one encoded value in bytes.
    pub fn size(self) -> usize {
        match self {
            Format::Undefined => 0,
            Format::R32Sfloat => 4,
            Format::R32G32Sfloat => 8,
            Format::R32G32B32Sfloat => 12,
            Format::R32G32B32A32Sfloat => 16,
            Format::R8G8B8A8Unorm => 4,
            Format::R16G16Unorm => 4,
        }
    }

    /// Whether values can be encoded in this format.
    pub fn is_encodable(self) -> bool {
        !matches!(self, Format::Undefined)
    }

    /// Append `value` to `out` in this encoding. Components the format does
    /// not carry are dropped; normalized formats clamp to `[0, 1]`.
    pub fn encode(self, value: Vec4, out: &mut Vec<u8>) -> Result<(), NoEncoding> {
        match self {
            Format::Undefined => return Err(NoEncoding(self)),
            Format::R32Sfloat => out.extend_from_slice(bytemuck::bytes_of(&value.x)),
            Format::R32G32Sfloat => {
                out.extend_from_slice(bytemuck::bytes_of(&[value.x, value.y]))
            }
            Format::R32G32B32Sfloat => {
                out.extend_from_slice(bytemuck::bytes_of(&value.truncate().to_array()))
            }
            Format::R32G32B32A32Sfloat => {
                out.extend_from_slice(bytemuck::bytes_of(&value.to_array()))
            }
            Format::R8G8B8A8Unorm => {
                let unorm = value.to_array().map(|c| unorm(c, u8::MAX as f32) as u8);
                out.extend_from_slice(&unorm);
            }
            Format::R16G16Unorm => {
                let unorm = [value.x, value.y].map(|c| unorm(c, u16::MAX as f32) as u16);
                out.extend_from_slice(bytemuck::bytes_of(&unorm));
            }
        }
        Ok(())
    }

    /// Code stored in package files.
    pub fn to_raw(self) -> u32 {
        match self {
            Format::Undefined => 0,
            Format::R32Sfloat => 1,
            Format::R32G32Sfloat => 2,
            Format::R32G32B32Sfloat => 3,
            Format::R32G32B32A32Sfloat => 4,
            Format::R8G8B8A8Unorm => 5,
            Format::R16G16Unorm => 6,
        }
    }

    /// Inverse of [`Format::to_raw`].
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.to_raw() == raw)
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Undefined => "undefined",
            Format::R32Sfloat => "r32_sfloat",
            Format::R32G32Sfloat => "r32g32_sfloat",
            Format::R32G32B32Sfloat => "r32g32b32_sfloat",
            Format::R32G32B32A32Sfloat => "r32g32b32a32_sfloat",
            Format::R8G8B8A8Unorm => "r8g8b8a8_unorm",
            Format::R16G16Unorm => "r16g16_unorm",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn unorm(component: f32, max: f32) -> f32 {
    (component.clamp(0.0, 1.0) * max).round()
}

/// Which per-vertex source field an attribute is extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Position,
    Normal,
    TexCoord,
    Color,
    Tangent,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 5] = [
        AttributeKind::Position,
        AttributeKind::Normal,
        AttributeKind::TexCoord,
        AttributeKind::Color,
        AttributeKind::Tangent,
    ];

    pub fn to_raw(self) -> u32 {
        match self {
            AttributeKind::Position => 0,
            AttributeKind::Normal => 1,
            AttributeKind::TexCoord => 2,
            AttributeKind::Color => 3,
            AttributeKind::Tangent => 4,
        }
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.to_raw() == raw)
    }

    pub fn name(self) -> &'static str {
        match self {
            AttributeKind::Position => "position",
            AttributeKind::Normal => "normal",
            AttributeKind::TexCoord => "tex_coord",
            AttributeKind::Color => "color",
            AttributeKind::Tangent => "tangent",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
