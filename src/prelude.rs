//! The most commonly used types, re-exported for glob import.

pub use crate::backend::{ShaderStage, TextureHandle, Visitor};
pub use crate::binding::{
    AutoBinding, AutoBindingResolver, NodeId, Resolution, SceneBinding,
};
pub use crate::context::RenderContext;
pub use crate::effect::layout::{Attribute, AttributeLayout};
pub use crate::effect::uniform::{UniformVariable, UniformVariableType};
pub use crate::effect::Effect;
pub use crate::errors::{Error, Result};
pub use crate::material::parameter::MaterialParameter;
pub use crate::material::pass::Pass;
pub use crate::material::technique::Technique;
pub use crate::material::{loader, CloneContext, Material};
pub use crate::math::prelude::*;
pub use crate::states::{
    flags, BlendFactor, BlendValue, Comparison, CullFace, FrontFaceOrder, StateBlock, StateField,
    StateValues, StencilOp,
};
