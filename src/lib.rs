//! # Glaze
//!
//! Glaze is a small shader/material binding engine for real-time rendering.
//! It sits between a scene graph and a GPU backend, and turns textual shader
//! sources plus symbolic material descriptions into bound draw state:
//!
//! - Compiles and deduplicates shader programs from source, with textual
//!   macro injection and recursive `#include` expansion.
//! - Maintains the material → technique → pass hierarchy, whose named
//!   parameters are either explicit values or lazily-resolved auto-bindings
//!   sourced from scene context.
//! - Tracks fixed-function state sparsely and applies only the differences
//!   against the currently applied state.
//!
//! The GPU itself is a collaborator, not a part of this crate. Everything
//! goes through the [`Visitor`](backend/trait.Visitor.html) trait, and a
//! headless implementation is provided for tests and tooling.
//!
//! All of the shared state lives in an explicit
//! [`RenderContext`](context/struct.RenderContext.html); there are no
//! process-wide singletons.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

#[macro_use]
pub mod utils;
pub mod errors;
pub mod math;

pub mod backend;
pub mod binding;
pub mod context;
pub mod effect;
pub mod material;
pub mod shader;
pub mod states;

pub mod prelude;

pub use self::context::RenderContext;
