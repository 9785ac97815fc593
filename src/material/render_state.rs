//! The shared parameter-and-state bundle every level of the material
//! hierarchy carries.

use crate::states::StateBlock;
use crate::utils::prelude::HashValue;

use super::parameter::MaterialParameter;

/// Parameters plus an optional fixed-function state block. One of these
/// lives on each material, technique and pass; at bind time the three are
/// walked in order with the innermost setting winning.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    parameters: Vec<MaterialParameter>,
    state_block: Option<StateBlock>,
}

impl RenderState {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the parameter with the given name, appending an empty one
    /// if it does not exist yet.
    pub fn parameter<T: AsRef<str>>(&mut self, name: T) -> &mut MaterialParameter {
        let name = name.as_ref();
        let hash = HashValue::from(name);

        if let Some(index) = self.parameters.iter().position(|v| v.hash() == hash) {
            return &mut self.parameters[index];
        }

        self.parameters.push(MaterialParameter::new(name));
        self.parameters.last_mut().unwrap()
    }

    pub fn find_parameter(&self, hash: HashValue<str>) -> Option<&MaterialParameter> {
        self.parameters.iter().find(|v| v.hash() == hash)
    }

    pub fn parameters(&self) -> &[MaterialParameter] {
        &self.parameters
    }

    /// The state block, created on first access.
    pub fn state_block_mut(&mut self) -> &mut StateBlock {
        if self.state_block.is_none() {
            self.state_block = Some(StateBlock::new());
        }

        self.state_block.as_mut().unwrap()
    }

    pub fn state_block(&self) -> Option<&StateBlock> {
        self.state_block.as_ref()
    }
}
