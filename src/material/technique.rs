//! A named group of passes drawn in order.

use crate::utils::prelude::HashValue;

use super::pass::Pass;
use super::render_state::RenderState;

#[derive(Debug, Clone)]
pub struct Technique {
    name: String,
    hash: HashValue<str>,
    passes: Vec<Pass>,
    state: RenderState,
}

impl Technique {
    pub fn new<T: Into<String>>(name: T) -> Self {
        let name = name.into();
        let hash = HashValue::from(&name);
        Technique {
            name,
            hash,
            passes: Vec::new(),
            state: RenderState::new(),
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

    pub fn add_pass(&mut self, pass: Pass) {
        self.passes.push(pass);
    }

    pub fn pass(&self, index: usize) -> Option<&Pass> {
        self.passes.get(index)
    }

    pub fn pass_mut(&mut self, index: usize) -> Option<&mut Pass> {
        self.passes.get_mut(index)
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }
}
