//! The GPU boundary consumed by the binding engine.
//!
//! The engine never talks to a device directly. Compiling processed source
//! into an executable stage, reflecting declared bindings, activating
//! programs, pushing uniform values and flipping fixed-function state all
//! go through the `Visitor` trait. Calls are
//! treated as atomic; no retry is attempted on failure.

pub mod headless;

use crate::effect::uniform::{UniformVariable, UniformVariableType};
use crate::errors::Result;
use crate::states::StateField;

impl_handle!(StageHandle);
impl_handle!(ProgramHandle);
impl_handle!(LayoutHandle);

/// An opaque reference to a texture object owned by the embedder. The
/// binding engine only routes it into sampler uniforms.
impl_handle!(TextureHandle);

/// The kind of shader stage submitted for compilation.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Whether a reflected binding is a vertex attribute or a uniform.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BindingKind {
    Attribute,
    Uniform,
}

/// One declared binding reported back by the backend after linking.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedBinding {
    pub name: String,
    pub kind: BindingKind,
    pub tp: UniformVariableType,
    pub location: i32,
}

/// The backend of the binding engine. Implementations are expected to be
/// immediate-mode: `apply_state` takes effect right away, and `set_uniform`
/// writes into the currently bound program.
pub trait Visitor {
    /// Compiles one stage from fully preprocessed source text.
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<StageHandle>;

    /// Links a vertex and a fragment stage into an executable program. The
    /// stage handles are consumed; the backend releases them after linking,
    /// whether or not the link succeeds.
    fn link_program(&mut self, vs: StageHandle, fs: StageHandle) -> Result<ProgramHandle>;

    /// Releases a compiled stage that will never be linked.
    fn delete_stage(&mut self, stage: StageHandle) -> Result<()>;

    /// Reports the attributes and uniforms a linked program declares, in
    /// declaration order.
    fn reflect_bindings(&mut self, program: ProgramHandle) -> Result<Vec<ReflectedBinding>>;

    /// Builds the binding-layout descriptor a pass requires to draw with
    /// the given reflected bindings.
    fn create_binding_layout(&mut self, bindings: &[ReflectedBinding]) -> Result<LayoutHandle>;

    /// Activates the program on the current pipeline state.
    fn bind_program(&mut self, program: ProgramHandle) -> Result<()>;

    /// Writes one uniform value at a reflected location.
    fn set_uniform(&mut self, location: i32, variable: &UniformVariable) -> Result<()>;

    /// Issues a single fixed-function state change.
    fn apply_state(&mut self, field: StateField) -> Result<()>;

    fn delete_program(&mut self, program: ProgramHandle) -> Result<()>;

    fn delete_binding_layout(&mut self, layout: LayoutHandle) -> Result<()>;
}

/// Creates a headless visitor, which compiles nothing and draws nowhere.
/// It still performs a naive textual reflection of submitted sources, so
/// the whole binding engine is exercisable without a GPU.
pub fn new_headless() -> Box<dyn Visitor> {
    Box::new(self::headless::HeadlessVisitor::new())
}
