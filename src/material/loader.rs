//! Builds material hierarchies from block-structured property text.
//!
//! ```text
//! material wood
//! {
//!     u_ambientColor = 0.2, 0.2, 0.2
//!
//!     technique
//!     {
//!         pass
//!         {
//!             vertexShader = shaders/textured.vert
//!             fragmentShader = shaders/textured.frag
//!             defines = SPECULAR
//!             u_worldViewProjectionMatrix = WORLD_VIEW_PROJECTION_MATRIX
//!
//!             renderState
//!             {
//!                 cullFace = true
//!                 depthTest = true
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! ALL-CAPS values naming a built-in auto-binding become auto-bindings,
//! numeric scalars and comma-separated float lists become typed values,
//! `renderState` blocks feed textual `StateBlock` assignments.

use std::fs;
use std::path::Path;

use crate::binding::AutoBinding;
use crate::context::RenderContext;
use crate::effect::uniform::UniformVariable;
use crate::errors::{Error, Result};
use crate::states::StateBlock;

use super::pass::Pass;
use super::render_state::RenderState;
use super::technique::Technique;
use super::Material;

/// Parses a material definition from property text.
pub fn load(ctx: &RenderContext, source: &str) -> Result<Material> {
    Parser::new(source)?.parse_material(ctx)
}

/// Reads and parses a material definition file.
pub fn load_from_file<P: AsRef<Path>>(ctx: &RenderContext, path: P) -> Result<Material> {
    let path = path.as_ref();
    let source =
        fs::read_to_string(path).map_err(|err| Error::FileRead(path.to_owned(), err.to_string()))?;
    load(ctx, &source)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Block(String, Option<String>),
    Assign(String, String),
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        for (index, line) in source.lines().enumerate() {
            let number = index + 1;
            let line = match line.find("//") {
                Some(at) => &line[..at],
                None => line,
            };
            let mut line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut trailing_open = false;
            if line != "{" && line.ends_with('{') {
                trailing_open = true;
                line = line[..line.len() - 1].trim();
            }

            match line {
                "{" => tokens.push((number, Token::Open)),
                "}" => tokens.push((number, Token::Close)),
                _ => {
                    if let Some(at) = line.find('=') {
                        let key = line[..at].trim();
                        let value = line[at + 1..].trim();
                        if key.is_empty() {
                            return Err(Error::MaterialSyntax(number, "missing key".into()));
                        }
                        tokens.push((number, Token::Assign(key.into(), value.into())));
                    } else {
                        let mut words = line.split_whitespace();
                        let kind = words.next().unwrap().to_owned();
                        let name = words.next().map(str::to_owned);
                        tokens.push((number, Token::Block(kind, name)));
                    }
                }
            }

            if trailing_open {
                tokens.push((number, Token::Open));
            }
        }

        Ok(Parser { tokens, pos: 0 })
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_open(&mut self, after: usize) -> Result<()> {
        match self.next() {
            Some((_, Token::Open)) => Ok(()),
            _ => Err(Error::MaterialSyntax(after, "expected '{'".into())),
        }
    }

    fn parse_material(&mut self, ctx: &RenderContext) -> Result<Material> {
        let line = match self.next() {
            Some((line, Token::Block(ref kind, _))) if kind == "material" => line,
            Some((line, _)) => {
                return Err(Error::MaterialSyntax(line, "expected 'material'".into()));
            }
            None => return Err(Error::MaterialSyntax(0, "empty material source".into())),
        };
        self.expect_open(line)?;

        let mut material = Material::new();
        loop {
            match self.next() {
                Some((_, Token::Close)) => break,
                Some((line, Token::Assign(key, value))) => {
                    apply_value(material.state_mut(), &key, &value, line)?;
                }
                Some((line, Token::Block(kind, name))) => match kind.as_str() {
                    "technique" => {
                        let technique = self.parse_technique(ctx, line, name)?;
                        material.add_technique(technique);
                    }
                    "renderState" => {
                        self.parse_render_state(line, material.state_mut().state_block_mut())?;
                    }
                    "sampler" => self.skip_block(line, &name)?,
                    _ => {
                        return Err(Error::MaterialSyntax(line, format!("unknown block '{}'", kind)));
                    }
                },
                Some((line, Token::Open)) => {
                    return Err(Error::MaterialSyntax(line, "unexpected '{'".into()));
                }
                None => return Err(Error::MaterialSyntax(0, "unterminated material".into())),
            }
        }

        Ok(material)
    }

    fn parse_technique(
        &mut self,
        ctx: &RenderContext,
        after: usize,
        name: Option<String>,
    ) -> Result<Technique> {
        self.expect_open(after)?;

        let mut technique = Technique::new(name.unwrap_or_default());
        loop {
            match self.next() {
                Some((_, Token::Close)) => break,
                Some((line, Token::Assign(key, value))) => {
                    apply_value(technique.state_mut(), &key, &value, line)?;
                }
                Some((line, Token::Block(kind, name))) => match kind.as_str() {
                    "pass" => {
                        let pass = self.parse_pass(ctx, line, name)?;
                        technique.add_pass(pass);
                    }
                    "renderState" => {
                        self.parse_render_state(line, technique.state_mut().state_block_mut())?;
                    }
                    "sampler" => self.skip_block(line, &name)?,
                    _ => {
                        return Err(Error::MaterialSyntax(line, format!("unknown block '{}'", kind)));
                    }
                },
                Some((line, Token::Open)) => {
                    return Err(Error::MaterialSyntax(line, "unexpected '{'".into()));
                }
                None => return Err(Error::MaterialSyntax(0, "unterminated technique".into())),
            }
        }

        Ok(technique)
    }

    fn parse_pass(
        &mut self,
        ctx: &RenderContext,
        after: usize,
        name: Option<String>,
    ) -> Result<Pass> {
        self.expect_open(after)?;

        let mut vsh = None;
        let mut fsh = None;
        let mut defines = String::new();
        let mut state = RenderState::new();

        loop {
            match self.next() {
                Some((_, Token::Close)) => break,
                Some((line, Token::Assign(key, value))) => match key.as_str() {
                    "vertexShader" => vsh = Some(value),
                    "fragmentShader" => fsh = Some(value),
                    "defines" => defines = value,
                    _ => apply_value(&mut state, &key, &value, line)?,
                },
                Some((line, Token::Block(kind, name))) => match kind.as_str() {
                    "renderState" => {
                        self.parse_render_state(line, state.state_block_mut())?;
                    }
                    "sampler" => self.skip_block(line, &name)?,
                    _ => {
                        return Err(Error::MaterialSyntax(line, format!("unknown block '{}'", kind)));
                    }
                },
                Some((line, Token::Open)) => {
                    return Err(Error::MaterialSyntax(line, "unexpected '{'".into()));
                }
                None => return Err(Error::MaterialSyntax(0, "unterminated pass".into())),
            }
        }

        let vsh = vsh.ok_or_else(|| {
            Error::MaterialSyntax(after, "pass is missing 'vertexShader'".into())
        })?;
        let fsh = fsh.ok_or_else(|| {
            Error::MaterialSyntax(after, "pass is missing 'fragmentShader'".into())
        })?;

        let effect = ctx.create_effect_from_files(&vsh, &fsh, &defines)?;
        let mut pass = Pass::new(name.unwrap_or_default(), effect);
        *pass.state_mut() = state;
        Ok(pass)
    }

    fn parse_render_state(&mut self, after: usize, block: &mut StateBlock) -> Result<()> {
        self.expect_open(after)?;
        loop {
            match self.next() {
                Some((_, Token::Close)) => return Ok(()),
                Some((line, Token::Assign(key, value))) => {
                    block
                        .set(&key, &value)
                        .map_err(|err| Error::MaterialSyntax(line, err.to_string()))?;
                }
                Some((line, _)) => {
                    return Err(Error::MaterialSyntax(line, "expected 'key = value'".into()));
                }
                None => return Err(Error::MaterialSyntax(0, "unterminated renderState".into())),
            }
        }
    }

    /// Consumes a block this loader does not model, warning once.
    fn skip_block(&mut self, after: usize, name: &Option<String>) -> Result<()> {
        warn!(
            "Skipping unsupported block {:?} at line {}.",
            name.as_ref().map(String::as_str).unwrap_or(""),
            after
        );

        self.expect_open(after)?;
        let mut depth = 1;
        loop {
            match self.next() {
                Some((_, Token::Open)) => depth += 1,
                Some((_, Token::Close)) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => {}
                None => return Err(Error::MaterialSyntax(0, "unterminated block".into())),
            }
        }
    }
}

/// Applies one `key = value` assignment as a parameter on `state`.
fn apply_value(state: &mut RenderState, key: &str, value: &str, line: usize) -> Result<()> {
    if value.parse::<AutoBinding>().is_ok() {
        state.parameter(key).bind_auto(value);
        return Ok(());
    }

    match parse_uniform_value(value) {
        Some(v) => {
            state.parameter(key).set_value(v);
            Ok(())
        }
        None => Err(Error::MaterialSyntax(
            line,
            format!("cannot type value '{}' for '{}'", value, key),
        )),
    }
}

fn parse_uniform_value(value: &str) -> Option<UniformVariable> {
    if value.contains(',') {
        let floats = value
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<::std::result::Result<Vec<_>, _>>()
            .ok()?;

        return match floats.len() {
            2 => Some(UniformVariable::Vector2f([floats[0], floats[1]])),
            3 => Some(UniformVariable::Vector3f([floats[0], floats[1], floats[2]])),
            4 => Some(UniformVariable::Vector4f([
                floats[0], floats[1], floats[2], floats[3],
            ])),
            16 => {
                let mut m = [[0.0f32; 4]; 4];
                for (index, v) in floats.into_iter().enumerate() {
                    m[index / 4][index % 4] = v;
                }
                Some(UniformVariable::Matrix4f(m, false))
            }
            _ => None,
        };
    }

    if !value.contains('.') {
        if let Ok(v) = value.parse::<i32>() {
            return Some(UniformVariable::I32(v));
        }
    }

    value.parse::<f32>().ok().map(UniformVariable::F32)
}
