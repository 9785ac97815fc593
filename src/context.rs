//! The owning context: one GPU visitor, one effect cache, one applied
//! state mirror. Nothing in this crate is process-global; two contexts
//! are fully independent, cache and all.

use std::path::Path;
use std::sync::{Arc, RwLock, Weak};

use smallvec::SmallVec;

use crate::backend::headless::{HeadlessStats, HeadlessVisitor};
use crate::backend::{BindingKind, LayoutHandle, ProgramHandle, ShaderStage, Visitor};
use crate::binding::{
    resolve_builtin, AutoBinding, AutoBindingResolver, NodeId, Resolution, SceneBinding,
};
use crate::effect::uniform::Uniform;
use crate::effect::{effect_key, Effect};
use crate::errors::Result;
use crate::material::parameter::MaterialParameter;
use crate::material::Material;
use crate::shader;
use crate::states::{flags, StateBlock, StateField, StateValues};
use crate::utils::prelude::FastHashMap;

/// The state shared between a `RenderContext` and the effects it has
/// handed out. Effects hold a `Weak` back-reference so that dropping the
/// last `Arc<Effect>` can clean the cache and release backend handles,
/// while a dropped context simply orphans its effects.
pub(crate) struct ContextShared {
    visitor: RwLock<Box<dyn Visitor>>,
    effects: RwLock<FastHashMap<String, Weak<Effect>>>,
    current_effect: RwLock<Option<String>>,
    applied: RwLock<StateValues>,
}

impl ContextShared {
    fn new(visitor: Box<dyn Visitor>) -> Self {
        ContextShared {
            visitor: RwLock::new(visitor),
            effects: RwLock::new(FastHashMap::default()),
            current_effect: RwLock::new(None),
            applied: RwLock::new(StateValues::default()),
        }
    }

    /// Called from `Effect::drop`. Removes the cache entry, forgets the
    /// effect if it is the currently bound one, and releases the backend
    /// handles.
    pub(crate) fn forget_effect(&self, key: &str, program: ProgramHandle, layout: LayoutHandle) {
        self.effects.write().unwrap().remove(key);

        {
            let mut current = self.current_effect.write().unwrap();
            if current.as_ref().map(|v| v == key).unwrap_or(false) {
                *current = None;
            }
        }

        let mut visitor = self.visitor.write().unwrap();
        if let Err(err) = visitor.delete_binding_layout(layout) {
            warn!("Failed to delete binding layout of {}: {}.", key, err);
        }
        if let Err(err) = visitor.delete_program(program) {
            warn!("Failed to delete program of {}: {}.", key, err);
        }
    }
}

pub struct RenderContext {
    shared: Arc<ContextShared>,
    resolvers: Vec<Box<dyn AutoBindingResolver>>,
    platform_defines: String,
    global_defines: String,
}

impl RenderContext {
    pub fn new(visitor: Box<dyn Visitor>) -> Self {
        RenderContext {
            shared: Arc::new(ContextShared::new(visitor)),
            resolvers: Vec::new(),
            platform_defines: String::new(),
            global_defines: String::new(),
        }
    }

    /// A context over the headless backend, plus the stats handle that
    /// keeps reporting what the backend was asked to do.
    pub fn headless() -> (Self, Arc<RwLock<HeadlessStats>>) {
        let visitor = HeadlessVisitor::new();
        let stats = visitor.stats();
        (RenderContext::new(Box::new(visitor)), stats)
    }

    /// Defines injected into every shader this context compiles, ahead of
    /// the global and call-site groups. Typically the platform tag, e.g.
    /// `OPENGL_ES`.
    pub fn set_platform_defines<T: Into<String>>(&mut self, defines: T) {
        self.platform_defines = defines.into();
    }

    /// Defines injected into every shader this context compiles, after the
    /// platform group and ahead of the call-site group.
    pub fn set_global_defines<T: Into<String>>(&mut self, defines: T) {
        self.global_defines = defines.into();
    }

    /// Registers an auto-binding resolver. Resolvers are consulted in
    /// registration order, before the built-in table; the first
    /// `Resolved` wins.
    pub fn register_resolver(&mut self, resolver: Box<dyn AutoBindingResolver>) {
        self.resolvers.push(resolver);
    }

    /// The number of live cached effects.
    pub fn effect_count(&self) -> usize {
        self.shared
            .effects
            .read()
            .unwrap()
            .values()
            .filter(|v| v.upgrade().is_some())
            .count()
    }

    /// Returns the compiled effect for the given sources, reusing the
    /// cached instance when one is still alive under the same
    /// (vertex path, fragment path, defines) identity.
    pub fn create_effect_from_files<P: AsRef<Path>>(
        &self,
        vsh: P,
        fsh: P,
        defines: &str,
    ) -> Result<Arc<Effect>> {
        let vsh = vsh.as_ref();
        let fsh = fsh.as_ref();
        let key = effect_key(&vsh.to_string_lossy(), &fsh.to_string_lossy(), defines);

        if let Some(effect) = self.cached(&key) {
            debug!("Effect cache hit for {}.", key);
            return Ok(effect);
        }

        let block = self.defines_block(defines);
        let vsrc = shader::process_file(vsh, &block)?;
        let fsrc = shader::process_file(fsh, &block)?;
        self.compile(key, vsh, fsh, &vsrc, &fsrc)
    }

    /// Compiles in-memory source text. The paths are used only for
    /// `#include` resolution, diagnostics and the cache key; no file is
    /// read for the top-level sources.
    pub fn create_effect_from_sources<P: AsRef<Path>>(
        &self,
        vsh: P,
        fsh: P,
        vsh_source: &str,
        fsh_source: &str,
        defines: &str,
    ) -> Result<Arc<Effect>> {
        let vsh = vsh.as_ref();
        let fsh = fsh.as_ref();
        let key = effect_key(&vsh.to_string_lossy(), &fsh.to_string_lossy(), defines);

        if let Some(effect) = self.cached(&key) {
            debug!("Effect cache hit for {}.", key);
            return Ok(effect);
        }

        let block = self.defines_block(defines);
        let vsrc = shader::process_source(vsh_source, vsh, &block)?;
        let fsrc = shader::process_source(fsh_source, fsh, &block)?;
        self.compile(key, vsh, fsh, &vsrc, &fsrc)
    }

    /// Activates an effect's program, skipping the backend call when it is
    /// already the current one.
    pub fn bind_effect(&self, effect: &Arc<Effect>) -> Result<()> {
        {
            let current = self.shared.current_effect.read().unwrap();
            if current.as_ref().map(|v| v == effect.key()).unwrap_or(false) {
                return Ok(());
            }
        }

        self.shared
            .visitor
            .write()
            .unwrap()
            .bind_program(effect.program())?;
        *self.shared.current_effect.write().unwrap() = Some(effect.key().to_owned());
        Ok(())
    }

    /// Applies a state block differentially: backend calls are issued only
    /// for explicitly-set fields that differ from the applied mirror. The
    /// mirror afterwards reflects this block resolved against the engine
    /// defaults, so fields the block leaves unset are considered to be at
    /// their defaults by the next bind.
    pub fn bind_state_block(&self, block: &StateBlock) {
        let defaults = StateValues::default();
        let mut applied = self.shared.applied.write().unwrap();
        let mut visitor = self.shared.visitor.write().unwrap();

        if let Some(v) = block.cull_face {
            if applied.cull_face != v {
                issue(&mut **visitor, StateField::CullFace(v));
            }
        }
        if let Some(v) = block.front_face {
            if applied.front_face != v {
                issue(&mut **visitor, StateField::FrontFace(v));
            }
        }
        if let Some(v) = block.depth_test {
            if applied.depth_test != v {
                issue(&mut **visitor, StateField::DepthTest(v));
            }
        }
        if let Some(v) = block.depth_write {
            if applied.depth_write != v {
                issue(&mut **visitor, StateField::DepthWrite(v));
            }
        }
        if let Some(v) = block.depth_func {
            if applied.depth_func != v {
                issue(&mut **visitor, StateField::DepthFunc(v));
            }
        }
        if let Some(v) = block.blend {
            if applied.blend != v {
                issue(&mut **visitor, StateField::Blend(v));
            }
        }
        if let Some(v) = block.blend_src {
            if applied.blend_src != v {
                issue(&mut **visitor, StateField::BlendSrc(v));
            }
        }
        if let Some(v) = block.blend_dst {
            if applied.blend_dst != v {
                issue(&mut **visitor, StateField::BlendDst(v));
            }
        }
        if let Some(v) = block.stencil_test {
            if applied.stencil_test != v {
                issue(&mut **visitor, StateField::StencilTest(v));
            }
        }
        if let Some(v) = block.stencil_write {
            if applied.stencil_write != v {
                issue(&mut **visitor, StateField::StencilWrite(v));
            }
        }
        if let Some(v) = block.stencil_func {
            if applied.stencil_func != v {
                issue(&mut **visitor, StateField::StencilFunc(v.0, v.1, v.2));
            }
        }
        if let Some(v) = block.stencil_op {
            if applied.stencil_op != v {
                issue(&mut **visitor, StateField::StencilOp(v.0, v.1, v.2));
            }
        }

        *applied = block.resolve(&defaults);
    }

    /// Forces the named fields back to the engine defaults, issuing
    /// backend calls only where the mirror differs. `flags::ALL` restores
    /// everything.
    pub fn restore_states(&self, mask: u32) {
        let defaults = StateValues::default();
        let mut applied = self.shared.applied.write().unwrap();
        let mut visitor = self.shared.visitor.write().unwrap();

        if mask & flags::CULL_FACE != 0 && applied.cull_face != defaults.cull_face {
            issue(&mut **visitor, StateField::CullFace(defaults.cull_face));
            applied.cull_face = defaults.cull_face;
        }
        if mask & flags::FRONT_FACE != 0 && applied.front_face != defaults.front_face {
            issue(&mut **visitor, StateField::FrontFace(defaults.front_face));
            applied.front_face = defaults.front_face;
        }
        if mask & flags::DEPTH_TEST != 0 && applied.depth_test != defaults.depth_test {
            issue(&mut **visitor, StateField::DepthTest(defaults.depth_test));
            applied.depth_test = defaults.depth_test;
        }
        if mask & flags::DEPTH_WRITE != 0 && applied.depth_write != defaults.depth_write {
            issue(&mut **visitor, StateField::DepthWrite(defaults.depth_write));
            applied.depth_write = defaults.depth_write;
        }
        if mask & flags::DEPTH_FUNC != 0 && applied.depth_func != defaults.depth_func {
            issue(&mut **visitor, StateField::DepthFunc(defaults.depth_func));
            applied.depth_func = defaults.depth_func;
        }
        if mask & flags::BLEND != 0 && applied.blend != defaults.blend {
            issue(&mut **visitor, StateField::Blend(defaults.blend));
            applied.blend = defaults.blend;
        }
        if mask & flags::BLEND_SRC != 0 && applied.blend_src != defaults.blend_src {
            issue(&mut **visitor, StateField::BlendSrc(defaults.blend_src));
            applied.blend_src = defaults.blend_src;
        }
        if mask & flags::BLEND_DST != 0 && applied.blend_dst != defaults.blend_dst {
            issue(&mut **visitor, StateField::BlendDst(defaults.blend_dst));
            applied.blend_dst = defaults.blend_dst;
        }
        if mask & flags::STENCIL_TEST != 0 && applied.stencil_test != defaults.stencil_test {
            issue(&mut **visitor, StateField::StencilTest(defaults.stencil_test));
            applied.stencil_test = defaults.stencil_test;
        }
        if mask & flags::STENCIL_WRITE != 0 && applied.stencil_write != defaults.stencil_write {
            issue(&mut **visitor, StateField::StencilWrite(defaults.stencil_write));
            applied.stencil_write = defaults.stencil_write;
        }
        if mask & flags::STENCIL_FUNC != 0 && applied.stencil_func != defaults.stencil_func {
            let v = defaults.stencil_func;
            issue(&mut **visitor, StateField::StencilFunc(v.0, v.1, v.2));
            applied.stencil_func = v;
        }
        if mask & flags::STENCIL_OP != 0 && applied.stencil_op != defaults.stencil_op {
            let v = defaults.stencil_op;
            issue(&mut **visitor, StateField::StencilOp(v.0, v.1, v.2));
            applied.stencil_op = v;
        }
    }

    /// Binds one pass of a material for drawing: activates its effect,
    /// diff-applies the merged material → technique → pass state block and
    /// pushes the effective parameter values into the effect's uniforms.
    ///
    /// `technique` of `None` uses the material's current technique.
    /// Per-frame problems (no such technique or pass, an unsatisfiable
    /// attribute layout, a failed program activation, no such uniform,
    /// unresolved auto-binding, type mismatch, backend write failure) are
    /// logged and skipped; the call never fails mid-frame.
    pub fn bind_pass(
        &self,
        material: &Material,
        technique: Option<&str>,
        pass: usize,
        scene: &dyn SceneBinding,
    ) -> Result<()> {
        let technique = match technique {
            Some(name) => material.technique(name),
            None => material.current_technique(),
        };
        let technique = match technique {
            Some(v) => v,
            None => {
                warn!("No technique to bind; material skipped.");
                return Ok(());
            }
        };
        let pass = match technique.pass(pass) {
            Some(v) => v,
            None => {
                warn!("Technique {} has no pass {}; skipped.", technique.name(), pass);
                return Ok(());
            }
        };

        if !pass.effect().matches_layout(pass.attributes()) {
            warn!(
                "Pass {} requires attributes that {} does not declare; skipped.",
                pass.name(),
                pass.effect().key()
            );
            return Ok(());
        }

        if let Err(err) = self.bind_effect(pass.effect()) {
            warn!("Failed to bind effect {}: {}.", pass.effect().key(), err);
            return Ok(());
        }

        let mut block = StateBlock::new();
        for state in &[material.state(), technique.state(), pass.state()] {
            if let Some(v) = state.state_block() {
                block.merge(v);
            }
        }
        self.bind_state_block(&block);

        // Innermost setting wins, order of first appearance is kept.
        let mut effective: SmallVec<[&MaterialParameter; 16]> = SmallVec::new();
        for state in &[material.state(), technique.state(), pass.state()] {
            for param in state.parameters() {
                match effective.iter().position(|v| v.hash() == param.hash()) {
                    Some(index) => effective[index] = param,
                    None => effective.push(param),
                }
            }
        }

        let effect = pass.effect();
        for param in effective {
            let uniform = match effect.uniform(param.name()) {
                Some(v) => v,
                None => {
                    trace!("{} has no uniform {}; skipped.", effect.key(), param.name());
                    continue;
                }
            };

            let value = if let Some(v) = param.value() {
                v.clone()
            } else if let Some(name) = param.auto_binding() {
                match self.resolve_auto_binding(name, material.node(), scene) {
                    Resolution::Resolved(v) => v,
                    Resolution::Unresolved => {
                        trace!("Auto-binding {} unresolved; skipped.", name);
                        continue;
                    }
                }
            } else {
                continue;
            };

            if !value.fits(uniform.variable_type()) {
                warn!(
                    "Parameter {} is {:?} but the uniform wants {:?}; skipped.",
                    param.name(),
                    value.variable_type(),
                    uniform.variable_type()
                );
                continue;
            }

            let mut visitor = self.shared.visitor.write().unwrap();
            if let Err(err) = visitor.set_uniform(uniform.location(), &value) {
                warn!("Failed to set uniform {}: {}.", param.name(), err);
            }
        }

        Ok(())
    }

    fn resolve_auto_binding(
        &self,
        name: &str,
        node: Option<NodeId>,
        scene: &dyn SceneBinding,
    ) -> Resolution {
        for resolver in &self.resolvers {
            if let Resolution::Resolved(v) = resolver.resolve(name, node, scene) {
                return Resolution::Resolved(v);
            }
        }

        match name.parse::<AutoBinding>() {
            Ok(binding) => resolve_builtin(binding, node, scene),
            Err(_) => Resolution::Unresolved,
        }
    }

    fn cached(&self, key: &str) -> Option<Arc<Effect>> {
        self.shared
            .effects
            .read()
            .unwrap()
            .get(key)
            .and_then(Weak::upgrade)
    }

    fn defines_block(&self, call_site: &str) -> String {
        shader::assemble_defines(vec![
            self.platform_defines.as_str(),
            self.global_defines.as_str(),
            call_site,
        ])
    }

    fn compile(
        &self,
        key: String,
        vsh: &Path,
        fsh: &Path,
        vsrc: &str,
        fsrc: &str,
    ) -> Result<Arc<Effect>> {
        let (program, layout, attributes, uniforms) = {
            let mut visitor = self.shared.visitor.write().unwrap();

            let vs = match visitor.compile_stage(ShaderStage::Vertex, vsrc) {
                Ok(v) => v,
                Err(err) => {
                    shader::write_error_sidecar(vsh, vsrc);
                    return Err(err);
                }
            };
            let fs = match visitor.compile_stage(ShaderStage::Fragment, fsrc) {
                Ok(v) => v,
                Err(err) => {
                    shader::write_error_sidecar(fsh, fsrc);
                    if let Err(cleanup) = visitor.delete_stage(vs) {
                        warn!("Failed to delete orphaned vertex stage: {}.", cleanup);
                    }
                    return Err(err);
                }
            };

            // The link consumes both stages whether it succeeds or not.
            let program = visitor.link_program(vs, fs)?;
            let bindings = match visitor.reflect_bindings(program) {
                Ok(v) => v,
                Err(err) => {
                    let _ = visitor.delete_program(program);
                    return Err(err);
                }
            };

            let attribute_bindings: Vec<_> = bindings
                .iter()
                .filter(|v| v.kind == BindingKind::Attribute)
                .cloned()
                .collect();
            let layout = match visitor.create_binding_layout(&attribute_bindings) {
                Ok(v) => v,
                Err(err) => {
                    let _ = visitor.delete_program(program);
                    return Err(err);
                }
            };

            let attributes = attribute_bindings
                .into_iter()
                .map(|v| (v.name, v.location))
                .collect();
            let uniforms = bindings
                .iter()
                .filter(|v| v.kind == BindingKind::Uniform)
                .map(|v| Uniform::new(v.name.clone(), v.location, v.tp))
                .collect();

            (program, layout, attributes, uniforms)
        };

        let effect = Arc::new(Effect::new(
            key.clone(),
            program,
            layout,
            attributes,
            uniforms,
            Arc::downgrade(&self.shared),
        ));
        self.shared
            .effects
            .write()
            .unwrap()
            .insert(key, Arc::downgrade(&effect));

        info!("Compiled effect {}.", effect.key());
        Ok(effect)
    }
}

fn issue(visitor: &mut dyn Visitor, field: StateField) {
    if let Err(err) = visitor.apply_state(field) {
        warn!("State change {:?} failed: {}.", field, err);
    }
}
