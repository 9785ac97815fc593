//! The material → technique → pass hierarchy.
//!
//! A material owns its techniques and selects one as current; every level
//! carries a [`RenderState`](render_state::RenderState) of parameters and
//! an optional state block. At bind time the context walks material →
//! technique → pass and lets the innermost setting win. There are no back
//! references; children never know their parent.

pub mod loader;
pub mod parameter;
pub mod pass;
pub mod render_state;
pub mod technique;

use crate::binding::NodeId;
use crate::utils::prelude::{FastHashMap, HashValue};

use self::render_state::RenderState;
use self::technique::Technique;

/// Remaps node references while cloning a material, so the clone binds the
/// embedder's cloned nodes instead of the originals. Unregistered nodes
/// pass through unchanged.
#[derive(Debug, Default)]
pub struct CloneContext {
    mapping: FastHashMap<NodeId, NodeId>,
}

impl CloneContext {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn register(&mut self, original: NodeId, clone: NodeId) {
        self.mapping.insert(original, clone);
    }

    pub fn remap(&self, node: Option<NodeId>) -> Option<NodeId> {
        node.map(|v| self.mapping.get(&v).cloned().unwrap_or(v))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Material {
    techniques: Vec<Technique>,
    current: Option<usize>,
    state: RenderState,
    node: Option<NodeId>,
    part_overrides: FastHashMap<usize, Material>,
}

impl Material {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a technique; the first one added becomes current.
    pub fn add_technique(&mut self, technique: Technique) {
        if self.current.is_none() {
            self.current = Some(self.techniques.len());
        }

        self.techniques.push(technique);
    }

    pub fn technique<T: AsRef<str>>(&self, name: T) -> Option<&Technique> {
        let hash = HashValue::from(name.as_ref());
        self.techniques.iter().find(|v| v.hash() == hash)
    }

    pub fn technique_mut<T: AsRef<str>>(&mut self, name: T) -> Option<&mut Technique> {
        let hash = HashValue::from(name.as_ref());
        self.techniques.iter_mut().find(|v| v.hash() == hash)
    }

    pub fn current_technique(&self) -> Option<&Technique> {
        self.current.and_then(|v| self.techniques.get(v))
    }

    pub fn current_technique_mut(&mut self) -> Option<&mut Technique> {
        match self.current {
            Some(v) => self.techniques.get_mut(v),
            None => None,
        }
    }

    /// Selects the current technique by name. Returns false and leaves the
    /// selection alone when no technique carries the name.
    pub fn set_technique<T: AsRef<str>>(&mut self, name: T) -> bool {
        let hash = HashValue::from(name.as_ref());
        match self.techniques.iter().position(|v| v.hash() == hash) {
            Some(index) => {
                self.current = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn technique_count(&self) -> usize {
        self.techniques.len()
    }

    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    /// The scene node per-node auto-bindings resolve against.
    #[inline]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn set_node(&mut self, node: Option<NodeId>) {
        self.node = node;
    }

    /// A replacement material for one mesh part. The embedder looks the
    /// override up when drawing that part and binds it instead of this
    /// material.
    pub fn part_override(&self, part: usize) -> Option<&Material> {
        self.part_overrides.get(&part)
    }

    pub fn set_part_override(&mut self, part: usize, material: Material) {
        self.part_overrides.insert(part, material);
    }

    /// Deep-clones the hierarchy. Effects stay shared between the original
    /// and the clone; node references are remapped through `ctx`.
    pub fn clone_with(&self, ctx: &CloneContext) -> Material {
        Material {
            techniques: self.techniques.clone(),
            current: self.current,
            state: self.state.clone(),
            node: ctx.remap(self.node),
            part_overrides: self
                .part_overrides
                .iter()
                .map(|(part, material)| (*part, material.clone_with(ctx)))
                .collect(),
        }
    }
}
