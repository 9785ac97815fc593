//! A single drawable configuration: one effect plus its overrides.

use std::sync::Arc;

use crate::effect::layout::AttributeLayout;
use crate::effect::Effect;

use super::render_state::RenderState;

/// A pass pins one effect for its whole lifetime; the shared `Arc` is what
/// keeps the compiled program alive in the context cache.
#[derive(Debug, Clone)]
pub struct Pass {
    name: String,
    effect: Arc<Effect>,
    state: RenderState,
    attributes: AttributeLayout,
}

impl Pass {
    pub fn new<T: Into<String>>(name: T, effect: Arc<Effect>) -> Self {
        Pass {
            name: name.into(),
            effect,
            state: RenderState::new(),
            attributes: AttributeLayout::default(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn effect(&self) -> &Arc<Effect> {
        &self.effect
    }

    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    #[inline]
    pub fn attributes(&self) -> &AttributeLayout {
        &self.attributes
    }

    pub fn set_attributes(&mut self, layout: AttributeLayout) {
        self.attributes = layout;
    }
}
