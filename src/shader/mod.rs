//! Textual shader preprocessing: define injection and `#include` expansion.
//!
//! This is not a general preprocessor. Defines are prepended as literal
//! `#define` lines and includes are spliced by a naive textual scan; no
//! conditional evaluation happens here, the compiler downstream owns that.
//! There are no include guards either, so a file that includes itself is
//! only stopped by the nesting limit.

use std::fs;
use std::path::Path;

use crate::errors::{Error, Result};

/// Includes may nest no deeper than this. Exceeding it almost always means
/// an include cycle.
const MAX_INCLUDE_DEPTH: usize = 32;

/// Assembles ordered define groups into a block of `#define` lines. Each
/// group is a semicolon-separated list of `NAME` or `NAME=VALUE` tokens;
/// every token is emitted verbatim after `#define `. Empty tokens are
/// skipped, ordering within and across groups is preserved.
pub fn assemble_defines<'a, I>(groups: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut block = String::new();
    for group in groups {
        for token in group.split(';') {
            let token = token.trim();
            if !token.is_empty() {
                block.push_str("#define ");
                block.push_str(token);
                block.push('\n');
            }
        }
    }
    block
}

/// Reads a shader source file and preprocesses it. `defines` is a
/// ready-made block from [`assemble_defines`].
pub fn process_file<P: AsRef<Path>>(path: P, defines: &str) -> Result<String> {
    let path = path.as_ref();
    let source = read_source(path)?;
    process_source(&source, path, defines)
}

/// Preprocesses in-memory source text. `path` names the source for include
/// resolution and diagnostics only; the file itself is never read.
pub fn process_source(source: &str, path: &Path, defines: &str) -> Result<String> {
    let mut out = String::with_capacity(defines.len() + source.len());
    out.push_str(defines);

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    if let Err(err) = expand_includes(source, path, dir, 0, &mut out) {
        write_error_sidecar(path, &out);
        return Err(err);
    }

    Ok(out)
}

/// Expands `#include "..."` directives depth-first, splicing the included
/// file in place of the directive. Paths resolve against the directory of
/// the file currently being processed. The single newline immediately
/// following the closing quote is consumed with the directive, so an
/// included file ending in a newline splices without introducing a blank
/// line.
fn expand_includes(
    source: &str,
    path: &Path,
    dir: &Path,
    depth: usize,
    out: &mut String,
) -> Result<()> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(Error::IncludeDepth(path.to_owned()));
    }

    let mut rest = source;
    while let Some(at) = rest.find("#include") {
        out.push_str(&rest[..at]);
        rest = &rest[at + "#include".len()..];

        let open = rest
            .find('"')
            .ok_or_else(|| Error::IncludeSyntax(path.to_owned()))?;
        let close = rest[open + 1..]
            .find('"')
            .map(|v| open + 1 + v)
            .ok_or_else(|| Error::IncludeSyntax(path.to_owned()))?;

        let target = dir.join(&rest[open + 1..close]);
        let nested = read_source(&target)?;
        let nested_dir = target.parent().unwrap_or_else(|| Path::new("."));
        expand_includes(&nested, &target, nested_dir, depth + 1, out)?;

        rest = &rest[close + 1..];
        if rest.starts_with("\r\n") {
            rest = &rest[2..];
        } else if rest.starts_with('\n') {
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| Error::FileRead(path.to_owned(), err.to_string()))
}

/// Dumps preprocessed source next to the original as `<path>.err` so a
/// broken shader can be inspected as the compiler saw it. Best effort; a
/// failed dump is logged and swallowed.
pub(crate) fn write_error_sidecar(path: &Path, contents: &str) {
    let mut sidecar = path.as_os_str().to_owned();
    sidecar.push(".err");

    if let Err(err) = fs::write(&sidecar, contents) {
        warn!("Failed to write {:?}: {}.", sidecar, err);
    } else {
        warn!("Dumped failing shader source to {:?}.", sidecar);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defines_emit_tokens_verbatim_in_order() {
        let block = assemble_defines(vec!["OPENGL", "FOO;BAR=2", ""]);
        assert_eq!(block, "#define OPENGL\n#define FOO\n#define BAR=2\n");
    }

    #[test]
    fn source_without_includes_is_unchanged() {
        let source = "void main() {}\n";
        let out = process_source(source, Path::new("a.vert"), "").unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn unterminated_include_is_rejected() {
        let source = "#include \"broken.glsl\nvoid main() {}\n";
        let path = std::env::temp_dir().join("glaze_unterminated.vert");
        let err = process_source(source, &path, "");
        assert!(err.is_err());
    }
}
