//! Commonly used utilities like hashes and handles.

#[macro_use]
pub mod handle;
pub mod hash;
pub mod hash_value;

pub mod prelude {
    pub use super::handle::{Handle, HandleIndex};
    pub use super::hash::{FastHashMap, FastHashSet};
    pub use super::hash_value::HashValue;
}
