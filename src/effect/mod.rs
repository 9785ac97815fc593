//! Compiled GPU programs with reflected binding metadata, deduplicated
//! process-wide by source identity.
//!
//! An `Effect` is the pairing of a compiled vertex and fragment stage with
//! the attribute and uniform tables the backend reflected out of them.
//! Effects are created through
//! [`RenderContext::create_effect_from_files`](crate::context::RenderContext::create_effect_from_files)
//! and shared via `Arc`: identical (vertex path, fragment path, defines)
//! identities always yield the same live instance. The context keeps only a
//! `Weak` entry per identity; when the last strong reference drops, the
//! entry is removed and the backend handles are released.

pub mod layout;
pub mod uniform;

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use crate::backend::{LayoutHandle, ProgramHandle};
use crate::context::ContextShared;
use crate::utils::prelude::{FastHashMap, HashValue};

use self::layout::AttributeLayout;
use self::uniform::{Uniform, UniformVariableType};

/// The composite identity an effect is cached under: vertex path, fragment
/// path and defines string joined with `;`.
pub fn effect_key(vsh: &str, fsh: &str, defines: &str) -> String {
    format!("{};{};{}", vsh, fsh, defines)
}

struct UniformTable {
    by_name: FastHashMap<HashValue<str>, Arc<Uniform>>,
    // Reflected uniforms in declaration order; synthesized array elements
    // are cached in `by_name` only.
    ordered: Vec<Arc<Uniform>>,
}

pub struct Effect {
    key: String,
    program: ProgramHandle,
    layout: LayoutHandle,
    attributes: Vec<(String, i32)>,
    attribute_locations: FastHashMap<HashValue<str>, i32>,
    uniforms: RwLock<UniformTable>,
    shared: Weak<ContextShared>,
}

impl Effect {
    pub(crate) fn new(
        key: String,
        program: ProgramHandle,
        layout: LayoutHandle,
        attributes: Vec<(String, i32)>,
        uniforms: Vec<Uniform>,
        shared: Weak<ContextShared>,
    ) -> Self {
        let attribute_locations = attributes
            .iter()
            .map(|(name, location)| (HashValue::from(name), *location))
            .collect();

        let mut by_name = FastHashMap::default();
        let mut ordered = Vec::with_capacity(uniforms.len());
        for uniform in uniforms {
            let uniform = Arc::new(uniform);
            by_name.insert(uniform.hash(), uniform.clone());
            ordered.push(uniform);
        }

        Effect {
            key,
            program,
            layout,
            attributes,
            attribute_locations,
            uniforms: RwLock::new(UniformTable { by_name, ordered }),
            shared,
        }
    }

    /// The composite identity this effect is cached under.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    #[inline]
    pub fn binding_layout(&self) -> LayoutHandle {
        self.layout
    }

    /// Looks up the location of a reflected vertex attribute. `None` means
    /// "nothing to bind", not an error.
    pub fn attribute_location<T: AsRef<str>>(&self, name: T) -> Option<i32> {
        self.attribute_locations.get(&name.as_ref().into()).cloned()
    }

    /// Checks that every required element of `layout` has a matching
    /// attribute declared in this effect, under its conventional shader
    /// name. Optional elements never fail the match.
    pub fn matches_layout(&self, layout: &AttributeLayout) -> bool {
        layout
            .iter()
            .filter(|&(_, _, required)| required)
            .all(|(attribute, _, _)| self.attribute_location(attribute.shader_name()).is_some())
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute_at(&self, index: usize) -> Option<(&str, i32)> {
        self.attributes
            .get(index)
            .map(|(name, location)| (name.as_str(), *location))
    }

    /// Looks up a uniform by name. A miss with a trailing `[index]` suffix
    /// synthesizes an array-element uniform from the unindexed parent,
    /// using the parent's declared type at `parent location + index`, and
    /// caches it under the indexed name, so a second identical query
    /// returns the same instance. A plain miss returns `None`.
    pub fn uniform<T: AsRef<str>>(&self, name: T) -> Option<Arc<Uniform>> {
        let name = name.as_ref();
        let hash = HashValue::from(name);

        {
            let table = self.uniforms.read().unwrap();
            if let Some(uniform) = table.by_name.get(&hash) {
                return Some(uniform.clone());
            }
        }

        let (parent, index) = split_array_suffix(name)?;
        let mut table = self.uniforms.write().unwrap();
        let element = {
            let parent = table.by_name.get(&HashValue::from(parent))?;
            Arc::new(Uniform::new(
                name.to_owned(),
                parent.location() + index as i32,
                parent.variable_type(),
            ))
        };
        table.by_name.insert(hash, element.clone());
        Some(element)
    }

    /// Number of reflected uniforms, excluding synthesized array elements.
    pub fn uniform_count(&self) -> usize {
        self.uniforms.read().unwrap().ordered.len()
    }

    /// Returns the reflected uniform at `index`, in declaration order.
    pub fn uniform_at(&self, index: usize) -> Option<Arc<Uniform>> {
        self.uniforms.read().unwrap().ordered.get(index).cloned()
    }

    pub fn uniform_type<T: AsRef<str>>(&self, name: T) -> Option<UniformVariableType> {
        self.uniform(name).map(|v| v.variable_type())
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Effect")
            .field("key", &self.key)
            .field("program", &self.program)
            .finish()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        // The context outlives its effects in normal use; if it is already
        // gone, so are the backend handles.
        if let Some(shared) = self.shared.upgrade() {
            shared.forget_effect(&self.key, self.program, self.layout);
            debug!("Effect {} released.", self.key);
        }
    }
}

/// Splits `name[3]` into `("name", 3)`.
fn split_array_suffix(name: &str) -> Option<(&str, usize)> {
    if !name.ends_with(']') {
        return None;
    }

    let open = name.find('[')?;
    let index = name[open + 1..name.len() - 1].parse::<usize>().ok()?;
    Some((&name[..open], index))
}
