//! Load-time error kinds.
//!
//! Only operations that happen at load time produce errors: reading shader
//! text, include expansion, backend compilation and material parsing.
//! Per-frame lookups that miss (uniforms, attributes, auto-bindings) are
//! deliberately not errors; they return `None` or are skipped so that the
//! render loop always completes a frame.

use std::path::PathBuf;

use crate::backend::ShaderStage;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Failed to read {:?}: {}.", _0, _1)]
    FileRead(PathBuf, String),
    #[fail(display = "Unterminated #include path in {:?}.", _0)]
    IncludeSyntax(PathBuf),
    #[fail(display = "Include depth limit exceeded in {:?}, likely an include cycle.", _0)]
    IncludeDepth(PathBuf),
    #[fail(display = "Failed to compile {:?} shader:\n{}", _0, _1)]
    Compile(ShaderStage, String),
    #[fail(display = "Failed to link program:\n{}", _0)]
    Link(String),
    #[fail(display = "Backend: {}.", _0)]
    Backend(String),
    #[fail(display = "Can not parse {} from str '{}'.", _0, _1)]
    ParseFailure(&'static str, String),
    #[fail(display = "Unknown render state '{}'.", _0)]
    StateUnknown(String),
    #[fail(display = "Material syntax error at line {}: {}.", _0, _1)]
    MaterialSyntax(usize, String),
}

pub type Result<T> = ::std::result::Result<T, Error>;
