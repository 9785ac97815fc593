//! Vertex-attribute binding description attached to a pass.

use std::str::FromStr;

use crate::errors::{Error, Result};

/// The maximum number of vertex attributes a pass may bind.
pub const MAX_VERTEX_ATTRIBUTES: usize = 12;

/// The possible pre-defined and named attributes in a vertex component,
/// describing what the component is used for.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Attribute {
    Position = 0,
    Normal = 1,
    Tangent = 2,
    Bitangent = 3,
    Color0 = 4,
    Color1 = 5,
    Indices = 6,
    Weight = 7,
    Texcoord0 = 8,
    Texcoord1 = 9,
    Texcoord2 = 10,
    Texcoord3 = 11,
}

impl Into<&'static str> for Attribute {
    fn into(self) -> &'static str {
        match self {
            Attribute::Position => "Position",
            Attribute::Normal => "Normal",
            Attribute::Tangent => "Tangent",
            Attribute::Bitangent => "Bitangent",
            Attribute::Color0 => "Color0",
            Attribute::Color1 => "Color1",
            Attribute::Indices => "Indices",
            Attribute::Weight => "Weight",
            Attribute::Texcoord0 => "Texcoord0",
            Attribute::Texcoord1 => "Texcoord1",
            Attribute::Texcoord2 => "Texcoord2",
            Attribute::Texcoord3 => "Texcoord3",
        }
    }
}

impl Attribute {
    /// The conventional GLSL name this attribute is declared under in
    /// shader source, e.g. `a_Position`.
    pub fn shader_name(self) -> &'static str {
        match self {
            Attribute::Position => "a_Position",
            Attribute::Normal => "a_Normal",
            Attribute::Tangent => "a_Tangent",
            Attribute::Bitangent => "a_Bitangent",
            Attribute::Color0 => "a_Color0",
            Attribute::Color1 => "a_Color1",
            Attribute::Indices => "a_Indices",
            Attribute::Weight => "a_Weight",
            Attribute::Texcoord0 => "a_Texcoord0",
            Attribute::Texcoord1 => "a_Texcoord1",
            Attribute::Texcoord2 => "a_Texcoord2",
            Attribute::Texcoord3 => "a_Texcoord3",
        }
    }
}

impl FromStr for Attribute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Position" => Ok(Attribute::Position),
            "Normal" => Ok(Attribute::Normal),
            "Tangent" => Ok(Attribute::Tangent),
            "Bitangent" => Ok(Attribute::Bitangent),
            "Color0" => Ok(Attribute::Color0),
            "Color1" => Ok(Attribute::Color1),
            "Indices" => Ok(Attribute::Indices),
            "Weight" => Ok(Attribute::Weight),
            "Texcoord0" => Ok(Attribute::Texcoord0),
            "Texcoord1" => Ok(Attribute::Texcoord1),
            "Texcoord2" => Ok(Attribute::Texcoord2),
            "Texcoord3" => Ok(Attribute::Texcoord3),
            _ => Err(Error::ParseFailure("Attribute", s.into())),
        }
    }
}

/// `AttributeLayout` describes the vertex attributes a pass feeds into its
/// effect: which named attribute, how many components, and whether the
/// vertex data is required to provide it.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AttributeLayout {
    len: u8,
    elements: [(Attribute, u8, bool); MAX_VERTEX_ATTRIBUTES],
}

impl Default for AttributeLayout {
    fn default() -> Self {
        AttributeLayout {
            len: 0,
            elements: [(Attribute::Position, 0, false); MAX_VERTEX_ATTRIBUTES],
        }
    }
}

impl AttributeLayout {
    pub fn build() -> AttributeLayoutBuilder {
        AttributeLayoutBuilder::new()
    }

    pub fn iter(&self) -> AttributeLayoutIter {
        AttributeLayoutIter {
            pos: 0,
            layout: self,
        }
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub struct AttributeLayoutIter<'a> {
    pos: u8,
    layout: &'a AttributeLayout,
}

impl<'a> Iterator for AttributeLayoutIter<'a> {
    type Item = (Attribute, u8, bool);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.layout.len {
            None
        } else {
            self.pos += 1;
            Some(self.layout.elements[self.pos as usize - 1])
        }
    }
}

#[derive(Default)]
pub struct AttributeLayoutBuilder(AttributeLayout);

impl AttributeLayoutBuilder {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    #[inline]
    pub fn with(self, attribute: Attribute, size: u8) -> Self {
        self.append(attribute, size, true)
    }

    #[inline]
    pub fn with_optional(self, attribute: Attribute, size: u8) -> Self {
        self.append(attribute, size, false)
    }

    fn append(mut self, attribute: Attribute, size: u8, required: bool) -> Self {
        assert!(size > 0 && size <= 4);

        for i in 0..self.0.len {
            let i = i as usize;
            if self.0.elements[i].0 == attribute {
                self.0.elements[i] = (attribute, size, required);
                return self;
            }
        }

        assert!((self.0.len as usize) < MAX_VERTEX_ATTRIBUTES);
        self.0.elements[self.0.len as usize] = (attribute, size, required);
        self.0.len += 1;
        self
    }

    #[inline]
    pub fn finish(self) -> AttributeLayout {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder_replaces_duplicates() {
        let layout = AttributeLayout::build()
            .with(Attribute::Position, 3)
            .with_optional(Attribute::Normal, 3)
            .with(Attribute::Position, 4)
            .finish();

        assert_eq!(layout.len(), 2);
        assert_eq!(
            layout.iter().next(),
            Some((Attribute::Position, 4, true))
        );
    }

    #[test]
    fn shader_names() {
        assert_eq!(Attribute::Position.shader_name(), "a_Position");
        assert_eq!(Attribute::Texcoord2.shader_name(), "a_Texcoord2");
    }
}
