//! A `Visitor` that compiles nothing and draws nowhere.
//!
//! Sources are still scanned for `attribute` and `uniform` declarations, so
//! reflection behaves like a real backend: attributes get sequential
//! locations, uniforms get locations advanced by their declared array
//! length. A source containing the token `#error` fails compilation, which
//! is enough to exercise failure paths. All observable activity is recorded
//! into shared [`HeadlessStats`].

use std::sync::{Arc, RwLock};

use crate::effect::uniform::{UniformVariable, UniformVariableType};
use crate::errors::{Error, Result};
use crate::states::StateField;
use crate::utils::prelude::FastHashMap;

use super::{
    BindingKind, LayoutHandle, ProgramHandle, ReflectedBinding, ShaderStage, StageHandle, Visitor,
};

/// Everything the headless visitor has been asked to do, in order.
#[derive(Debug, Default)]
pub struct HeadlessStats {
    pub compiles: usize,
    pub links: usize,
    pub live_stages: usize,
    pub live_programs: usize,
    pub live_layouts: usize,
    pub bound_programs: Vec<ProgramHandle>,
    pub uniform_writes: Vec<(i32, UniformVariable)>,
    pub state_changes: Vec<StateField>,
}

#[derive(Debug, Clone)]
struct Declaration {
    name: String,
    kind: BindingKind,
    tp: UniformVariableType,
    array_len: usize,
}

pub struct HeadlessVisitor {
    next_handle: u32,
    stages: FastHashMap<StageHandle, Vec<Declaration>>,
    programs: FastHashMap<ProgramHandle, Vec<ReflectedBinding>>,
    layouts: FastHashMap<LayoutHandle, usize>,
    stats: Arc<RwLock<HeadlessStats>>,
}

impl HeadlessVisitor {
    pub fn new() -> Self {
        HeadlessVisitor {
            next_handle: 0,
            stages: FastHashMap::default(),
            programs: FastHashMap::default(),
            layouts: FastHashMap::default(),
            stats: Arc::new(RwLock::new(HeadlessStats::default())),
        }
    }

    /// A shared view of the recorded activity. The same `Arc` keeps
    /// reporting after the visitor has been boxed away into a context.
    pub fn stats(&self) -> Arc<RwLock<HeadlessStats>> {
        self.stats.clone()
    }

    fn alloc(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn take_stage(&mut self, stage: StageHandle) -> Option<Vec<Declaration>> {
        let declarations = self.stages.remove(&stage);
        if declarations.is_some() {
            self.stats.write().unwrap().live_stages -= 1;
        }
        declarations
    }
}

impl Default for HeadlessVisitor {
    fn default() -> Self {
        HeadlessVisitor::new()
    }
}

impl Visitor for HeadlessVisitor {
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<StageHandle> {
        if source.contains("#error") {
            let line = source
                .lines()
                .find(|v| v.contains("#error"))
                .unwrap_or("#error")
                .trim()
                .to_owned();
            return Err(Error::Compile(stage, line));
        }

        let declarations = scan_declarations(source);
        let handle = StageHandle::new(self.alloc(), 1);
        self.stages.insert(handle, declarations);

        let mut stats = self.stats.write().unwrap();
        stats.compiles += 1;
        stats.live_stages += 1;
        Ok(handle)
    }

    fn link_program(&mut self, vs: StageHandle, fs: StageHandle) -> Result<ProgramHandle> {
        let vdecls = self.take_stage(vs);
        let fdecls = self.take_stage(fs);
        let vdecls = vdecls.ok_or_else(|| Error::Link(format!("unknown vertex stage {}", vs)))?;
        let fdecls = fdecls.ok_or_else(|| Error::Link(format!("unknown fragment stage {}", fs)))?;

        let mut bindings = Vec::new();
        let mut next_attribute = 0i32;
        let mut next_uniform = 0i32;
        for decl in vdecls.into_iter().chain(fdecls) {
            if bindings
                .iter()
                .any(|v: &ReflectedBinding| v.name == decl.name)
            {
                continue;
            }

            let location = match decl.kind {
                BindingKind::Attribute => {
                    let v = next_attribute;
                    next_attribute += 1;
                    v
                }
                BindingKind::Uniform => {
                    let v = next_uniform;
                    next_uniform += decl.array_len as i32;
                    v
                }
            };

            bindings.push(ReflectedBinding {
                name: decl.name,
                kind: decl.kind,
                tp: decl.tp,
                location,
            });
        }

        let handle = ProgramHandle::new(self.alloc(), 1);
        self.programs.insert(handle, bindings);

        let mut stats = self.stats.write().unwrap();
        stats.links += 1;
        stats.live_programs += 1;
        Ok(handle)
    }

    fn reflect_bindings(&mut self, program: ProgramHandle) -> Result<Vec<ReflectedBinding>> {
        self.programs
            .get(&program)
            .cloned()
            .ok_or_else(|| Error::Backend(format!("unknown program {}", program)))
    }

    fn create_binding_layout(&mut self, bindings: &[ReflectedBinding]) -> Result<LayoutHandle> {
        let handle = LayoutHandle::new(self.alloc(), 1);
        self.layouts.insert(handle, bindings.len());
        self.stats.write().unwrap().live_layouts += 1;
        Ok(handle)
    }

    fn bind_program(&mut self, program: ProgramHandle) -> Result<()> {
        if !self.programs.contains_key(&program) {
            return Err(Error::Backend(format!("unknown program {}", program)));
        }

        self.stats.write().unwrap().bound_programs.push(program);
        Ok(())
    }

    fn set_uniform(&mut self, location: i32, variable: &UniformVariable) -> Result<()> {
        self.stats
            .write()
            .unwrap()
            .uniform_writes
            .push((location, variable.clone()));
        Ok(())
    }

    fn apply_state(&mut self, field: StateField) -> Result<()> {
        self.stats.write().unwrap().state_changes.push(field);
        Ok(())
    }

    fn delete_stage(&mut self, stage: StageHandle) -> Result<()> {
        self.take_stage(stage);
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramHandle) -> Result<()> {
        if self.programs.remove(&program).is_some() {
            self.stats.write().unwrap().live_programs -= 1;
        }
        Ok(())
    }

    fn delete_binding_layout(&mut self, layout: LayoutHandle) -> Result<()> {
        if self.layouts.remove(&layout).is_some() {
            self.stats.write().unwrap().live_layouts -= 1;
        }
        Ok(())
    }
}

/// Scans processed GLSL line by line for `attribute`/`uniform` declarations.
/// Anything it cannot type is skipped.
fn scan_declarations(source: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for line in source.lines() {
        let line = line.trim();
        let mut words = line.split_whitespace();

        let kind = match words.next() {
            Some("attribute") => BindingKind::Attribute,
            Some("uniform") => BindingKind::Uniform,
            _ => continue,
        };

        let tp = match words.next().and_then(parse_type) {
            Some(v) => v,
            None => continue,
        };

        let name = match words.next() {
            Some(v) => v.trim_end_matches(';'),
            None => continue,
        };

        let (name, array_len) = match name.find('[') {
            Some(open) => {
                let len = name[open + 1..]
                    .trim_end_matches(']')
                    .parse::<usize>()
                    .unwrap_or(1);
                (&name[..open], len)
            }
            None => (name, 1),
        };

        if name.is_empty() {
            continue;
        }

        declarations.push(Declaration {
            name: name.to_owned(),
            kind,
            tp,
            array_len,
        });
    }

    declarations
}

fn parse_type(word: &str) -> Option<UniformVariableType> {
    match word {
        "float" => Some(UniformVariableType::F32),
        "int" => Some(UniformVariableType::I32),
        "vec2" => Some(UniformVariableType::Vector2f),
        "vec3" => Some(UniformVariableType::Vector3f),
        "vec4" => Some(UniformVariableType::Vector4f),
        "mat2" => Some(UniformVariableType::Matrix2f),
        "mat3" => Some(UniformVariableType::Matrix3f),
        "mat4" => Some(UniformVariableType::Matrix4f),
        "sampler2D" | "samplerCube" => Some(UniformVariableType::Texture),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reflection_scan() {
        let source = r#"
            attribute vec3 a_Position;
            attribute vec2 a_Texcoord;
            uniform mat4 u_WorldViewProjection;
            uniform vec4 u_Lights[4];
            uniform sampler2D u_Diffuse;
            varying vec2 v_Texcoord;
        "#;

        let declarations = scan_declarations(source);
        assert_eq!(declarations.len(), 5);
        assert_eq!(declarations[3].name, "u_Lights");
        assert_eq!(declarations[3].array_len, 4);
        assert_eq!(declarations[3].tp, UniformVariableType::Vector4f);
    }

    #[test]
    fn uniform_locations_advance_by_array_len() {
        let mut visitor = HeadlessVisitor::new();
        let vs = visitor
            .compile_stage(
                ShaderStage::Vertex,
                "uniform vec4 u_Lights[4];\nuniform mat4 u_World;",
            )
            .unwrap();
        let fs = visitor
            .compile_stage(ShaderStage::Fragment, "uniform sampler2D u_Diffuse;")
            .unwrap();
        let program = visitor.link_program(vs, fs).unwrap();

        let bindings = visitor.reflect_bindings(program).unwrap();
        assert_eq!(bindings[0].location, 0);
        assert_eq!(bindings[1].location, 4);
        assert_eq!(bindings[2].location, 5);
    }

    #[test]
    fn error_token_fails_compilation() {
        let mut visitor = HeadlessVisitor::new();
        let err = visitor.compile_stage(ShaderStage::Vertex, "#error unsupported\n");
        assert!(err.is_err());
    }
}
