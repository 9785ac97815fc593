//! Typed uniform bindings and the values that can be pushed into them.

use crate::backend::TextureHandle;
use crate::math::prelude::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};
use crate::utils::prelude::HashValue;

/// Uniform variable type.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniformVariableType {
    Texture,
    I32,
    F32,
    Vector2f,
    Vector3f,
    Vector4f,
    Matrix2f,
    Matrix3f,
    Matrix4f,
    Vector4fArray,
}

/// Uniform variable for a program object. Each matrix based
/// `UniformVariable` is assumed to be supplied in row major order with an
/// optional transpose.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformVariable {
    Texture(TextureHandle),
    I32(i32),
    F32(f32),
    Vector2f([f32; 2]),
    Vector3f([f32; 3]),
    Vector4f([f32; 4]),
    Matrix2f([[f32; 2]; 2], bool),
    Matrix3f([[f32; 3]; 3], bool),
    Matrix4f([[f32; 4]; 4], bool),
    Vector4fArray(Vec<[f32; 4]>),
}

impl UniformVariable {
    pub fn variable_type(&self) -> UniformVariableType {
        match *self {
            UniformVariable::Texture(_) => UniformVariableType::Texture,
            UniformVariable::I32(_) => UniformVariableType::I32,
            UniformVariable::F32(_) => UniformVariableType::F32,
            UniformVariable::Vector2f(_) => UniformVariableType::Vector2f,
            UniformVariable::Vector3f(_) => UniformVariableType::Vector3f,
            UniformVariable::Vector4f(_) => UniformVariableType::Vector4f,
            UniformVariable::Matrix2f(_, _) => UniformVariableType::Matrix2f,
            UniformVariable::Matrix3f(_, _) => UniformVariableType::Matrix3f,
            UniformVariable::Matrix4f(_, _) => UniformVariableType::Matrix4f,
            UniformVariable::Vector4fArray(_) => UniformVariableType::Vector4fArray,
        }
    }

    /// Returns true if a value of this variable's type can be written into
    /// a uniform declared with `tp`. An array of vec4 elements is writable
    /// into a `vec4[]` uniform, which reflects as `Vector4f`.
    pub fn fits(&self, tp: UniformVariableType) -> bool {
        let own = self.variable_type();
        own == tp || (own == UniformVariableType::Vector4fArray && tp == UniformVariableType::Vector4f)
    }
}

impl Into<UniformVariable> for TextureHandle {
    fn into(self) -> UniformVariable {
        UniformVariable::Texture(self)
    }
}

impl Into<UniformVariable> for i32 {
    fn into(self) -> UniformVariable {
        UniformVariable::I32(self)
    }
}

impl Into<UniformVariable> for f32 {
    fn into(self) -> UniformVariable {
        UniformVariable::F32(self)
    }
}

impl Into<UniformVariable> for Matrix2<f32> {
    fn into(self) -> UniformVariable {
        UniformVariable::Matrix2f(*self.as_ref(), false)
    }
}

impl Into<UniformVariable> for [[f32; 2]; 2] {
    fn into(self) -> UniformVariable {
        UniformVariable::Matrix2f(self, false)
    }
}

impl Into<UniformVariable> for Matrix3<f32> {
    fn into(self) -> UniformVariable {
        UniformVariable::Matrix3f(*self.as_ref(), false)
    }
}

impl Into<UniformVariable> for [[f32; 3]; 3] {
    fn into(self) -> UniformVariable {
        UniformVariable::Matrix3f(self, false)
    }
}

impl Into<UniformVariable> for Matrix4<f32> {
    fn into(self) -> UniformVariable {
        UniformVariable::Matrix4f(*self.as_ref(), false)
    }
}

impl Into<UniformVariable> for [[f32; 4]; 4] {
    fn into(self) -> UniformVariable {
        UniformVariable::Matrix4f(self, false)
    }
}

impl Into<UniformVariable> for Vector2<f32> {
    fn into(self) -> UniformVariable {
        UniformVariable::Vector2f(*self.as_ref())
    }
}

impl Into<UniformVariable> for [f32; 2] {
    fn into(self) -> UniformVariable {
        UniformVariable::Vector2f(self)
    }
}

impl Into<UniformVariable> for Vector3<f32> {
    fn into(self) -> UniformVariable {
        UniformVariable::Vector3f(*self.as_ref())
    }
}

impl Into<UniformVariable> for [f32; 3] {
    fn into(self) -> UniformVariable {
        UniformVariable::Vector3f(self)
    }
}

impl Into<UniformVariable> for Vector4<f32> {
    fn into(self) -> UniformVariable {
        UniformVariable::Vector4f(*self.as_ref())
    }
}

impl Into<UniformVariable> for [f32; 4] {
    fn into(self) -> UniformVariable {
        UniformVariable::Vector4f(self)
    }
}

impl Into<UniformVariable> for Vec<[f32; 4]> {
    fn into(self) -> UniformVariable {
        UniformVariable::Vector4fArray(self)
    }
}

/// One typed binding location reflected from a compiled effect. Uniforms
/// are immutable once created and never independently owned; they are
/// handed out as `Arc`s by their [`Effect`](super::Effect).
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    name: String,
    hash: HashValue<str>,
    location: i32,
    tp: UniformVariableType,
}

impl Uniform {
    pub(crate) fn new(name: String, location: i32, tp: UniformVariableType) -> Self {
        let hash = HashValue::from(&name);
        Uniform {
            name,
            hash,
            location,
            tp,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn hash(&self) -> HashValue<str> {
        self.hash
    }

    #[inline]
    pub fn location(&self) -> i32 {
        self.location
    }

    #[inline]
    pub fn variable_type(&self) -> UniformVariableType {
        self.tp
    }
}
