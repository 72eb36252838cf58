//! Vertex formats produced by the drawing layer.

use bytemuck::{Pod, Zeroable};

use super::backend::{VertexAttribute, VertexDefinition, VertexElement, VertexValueType};

/// A vertex type with a static layout description.
pub trait Vertex: Pod {
    fn definition() -> &'static VertexDefinition;
}

/// Untextured vertex: position and packed RGBA colour.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Position2Color {
    pub x: f32,
    pub y: f32,
    pub color: u32,
}

impl Position2Color {
    #[must_use]
    pub const fn new(x: f32, y: f32, color: u32) -> Self {
        Self { x, y, color }
    }
}

/// Textured vertex: position, texture coordinate and packed RGBA colour.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Position2Tex2Color {
    pub x: f32,
    pub y: f32,
    pub tcx: f32,
    pub tcy: f32,
    pub color: u32,
}

impl Position2Tex2Color {
    #[must_use]
    pub const fn new(x: f32, y: f32, tcx: f32, tcy: f32, color: u32) -> Self {
        Self {
            x,
            y,
            tcx,
            tcy,
            color,
        }
    }
}

static POSITION2_COLOR_ELEMENTS: [VertexElement; 2] = [
    VertexElement {
        attribute: VertexAttribute::Position,
        components: 2,
        value_type: VertexValueType::Float,
        offset: 0,
    },
    VertexElement {
        attribute: VertexAttribute::Color,
        components: 4,
        value_type: VertexValueType::UnsignedByte,
        offset: 8,
    },
];

static POSITION2_TEX2_COLOR_ELEMENTS: [VertexElement; 3] = [
    VertexElement {
        attribute: VertexAttribute::Position,
        components: 2,
        value_type: VertexValueType::Float,
        offset: 0,
    },
    VertexElement {
        attribute: VertexAttribute::TexCoord0,
        components: 2,
        value_type: VertexValueType::Float,
        offset: 8,
    },
    VertexElement {
        attribute: VertexAttribute::Color,
        components: 4,
        value_type: VertexValueType::UnsignedByte,
        offset: 16,
    },
];

pub static POSITION2_COLOR_DEFINITION: VertexDefinition = VertexDefinition {
    elements: &POSITION2_COLOR_ELEMENTS,
    stride: std::mem::size_of::<Position2Color>(),
};

pub static POSITION2_TEX2_COLOR_DEFINITION: VertexDefinition = VertexDefinition {
    elements: &POSITION2_TEX2_COLOR_ELEMENTS,
    stride: std::mem::size_of::<Position2Tex2Color>(),
};

impl Vertex for Position2Color {
    fn definition() -> &'static VertexDefinition {
        &POSITION2_COLOR_DEFINITION
    }
}

impl Vertex for Position2Tex2Color {
    fn definition() -> &'static VertexDefinition {
        &POSITION2_TEX2_COLOR_DEFINITION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_match_structs() {
        assert_eq!(Position2Color::definition().stride, 12);
        assert_eq!(Position2Tex2Color::definition().stride, 20);
        let color = Position2Tex2Color::definition()
            .element(VertexAttribute::Color)
            .unwrap();
        assert_eq!(color.offset, std::mem::offset_of!(Position2Tex2Color, color));
        assert!(Position2Color::definition()
            .element(VertexAttribute::TexCoord0)
            .is_none());
    }
}
