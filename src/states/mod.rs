//! Sparse fixed-function state descriptors and their differential
//! application model.
//!
//! A `StateBlock` only carries the fields that were explicitly set on it;
//! everything else defers to the engine defaults in `StateValues`. Binding
//! a block through the [`RenderContext`](crate::context::RenderContext)
//! issues backend calls only for set fields that differ from the currently
//! applied mirror, then rewrites the mirror as this block merged with
//! defaults, so a later, sparser block restores true defaults instead of
//! inheriting stale values from an unrelated prior bind.

use std::str::FromStr;

use crate::errors::{Error, Result};

/// Specify whether front- or back-facing polygons can be culled.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum CullFace {
    Nothing,
    Front,
    Back,
}

/// Define front- and back-facing polygons.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum FrontFaceOrder {
    Clockwise,
    CounterClockwise,
}

/// A pixel-wise comparison function, used for both depth and stencil tests.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Comparison {
    Never,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
    Always,
}

/// Blend values.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlendValue {
    SourceColor,
    SourceAlpha,
    DestinationColor,
    DestinationAlpha,
}

/// Blend factors.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlendFactor {
    Zero,
    One,
    Value(BlendValue),
    OneMinusValue(BlendValue),
}

/// Stencil buffer operations.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    Increment,
    Decrement,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

impl FromStr for CullFace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NONE" => Ok(CullFace::Nothing),
            "FRONT" => Ok(CullFace::Front),
            "BACK" => Ok(CullFace::Back),
            _ => Err(Error::ParseFailure("CullFace", s.into())),
        }
    }
}

impl FromStr for FrontFaceOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CW" => Ok(FrontFaceOrder::Clockwise),
            "CCW" => Ok(FrontFaceOrder::CounterClockwise),
            _ => Err(Error::ParseFailure("FrontFaceOrder", s.into())),
        }
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NEVER" => Ok(Comparison::Never),
            "LESS" => Ok(Comparison::Less),
            "LEQUAL" => Ok(Comparison::LessOrEqual),
            "GREATER" => Ok(Comparison::Greater),
            "GEQUAL" => Ok(Comparison::GreaterOrEqual),
            "EQUAL" => Ok(Comparison::Equal),
            "NOTEQUAL" => Ok(Comparison::NotEqual),
            "ALWAYS" => Ok(Comparison::Always),
            _ => Err(Error::ParseFailure("Comparison", s.into())),
        }
    }
}

impl FromStr for BlendFactor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ZERO" => Ok(BlendFactor::Zero),
            "ONE" => Ok(BlendFactor::One),
            "SRC_COLOR" => Ok(BlendFactor::Value(BlendValue::SourceColor)),
            "ONE_MINUS_SRC_COLOR" => Ok(BlendFactor::OneMinusValue(BlendValue::SourceColor)),
            "SRC_ALPHA" => Ok(BlendFactor::Value(BlendValue::SourceAlpha)),
            "ONE_MINUS_SRC_ALPHA" => Ok(BlendFactor::OneMinusValue(BlendValue::SourceAlpha)),
            "DST_COLOR" => Ok(BlendFactor::Value(BlendValue::DestinationColor)),
            "ONE_MINUS_DST_COLOR" => Ok(BlendFactor::OneMinusValue(BlendValue::DestinationColor)),
            "DST_ALPHA" => Ok(BlendFactor::Value(BlendValue::DestinationAlpha)),
            "ONE_MINUS_DST_ALPHA" => Ok(BlendFactor::OneMinusValue(BlendValue::DestinationAlpha)),
            _ => Err(Error::ParseFailure("BlendFactor", s.into())),
        }
    }
}

impl FromStr for StencilOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "KEEP" => Ok(StencilOp::Keep),
            "ZERO" => Ok(StencilOp::Zero),
            "REPLACE" => Ok(StencilOp::Replace),
            "INCR" => Ok(StencilOp::Increment),
            "DECR" => Ok(StencilOp::Decrement),
            "INVERT" => Ok(StencilOp::Invert),
            "INCR_WRAP" => Ok(StencilOp::IncrementWrap),
            "DECR_WRAP" => Ok(StencilOp::DecrementWrap),
            _ => Err(Error::ParseFailure("StencilOp", s.into())),
        }
    }
}

/// A single fixed-function state change crossing the backend boundary.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum StateField {
    CullFace(CullFace),
    FrontFace(FrontFaceOrder),
    DepthTest(bool),
    DepthWrite(bool),
    DepthFunc(Comparison),
    Blend(bool),
    BlendSrc(BlendFactor),
    BlendDst(BlendFactor),
    StencilTest(bool),
    StencilWrite(u32),
    StencilFunc(Comparison, i32, u32),
    StencilOp(StencilOp, StencilOp, StencilOp),
}

/// Bit names for the fields of a `StateBlock`, used by
/// [`RenderContext::restore_states`](crate::context::RenderContext::restore_states).
pub mod flags {
    pub const CULL_FACE: u32 = 1;
    pub const FRONT_FACE: u32 = 1 << 1;
    pub const DEPTH_TEST: u32 = 1 << 2;
    pub const DEPTH_WRITE: u32 = 1 << 3;
    pub const DEPTH_FUNC: u32 = 1 << 4;
    pub const BLEND: u32 = 1 << 5;
    pub const BLEND_SRC: u32 = 1 << 6;
    pub const BLEND_DST: u32 = 1 << 7;
    pub const STENCIL_TEST: u32 = 1 << 8;
    pub const STENCIL_WRITE: u32 = 1 << 9;
    pub const STENCIL_FUNC: u32 = 1 << 10;
    pub const STENCIL_OP: u32 = 1 << 11;
    pub const ALL: u32 = 0xFFF;
}

/// A fully populated set of fixed-function values; `default()` yields the
/// engine defaults every unset `StateBlock` field falls back to.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct StateValues {
    pub cull_face: CullFace,
    pub front_face: FrontFaceOrder,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_func: Comparison,
    pub blend: bool,
    pub blend_src: BlendFactor,
    pub blend_dst: BlendFactor,
    pub stencil_test: bool,
    pub stencil_write: u32,
    pub stencil_func: (Comparison, i32, u32),
    pub stencil_op: (StencilOp, StencilOp, StencilOp),
}

impl Default for StateValues {
    fn default() -> Self {
        StateValues {
            cull_face: CullFace::Nothing,
            front_face: FrontFaceOrder::CounterClockwise,
            depth_test: false,
            depth_write: true,
            depth_func: Comparison::Less,
            blend: false,
            blend_src: BlendFactor::One,
            blend_dst: BlendFactor::Zero,
            stencil_test: false,
            stencil_write: !0,
            stencil_func: (Comparison::Always, 0, !0),
            stencil_op: (StencilOp::Keep, StencilOp::Keep, StencilOp::Keep),
        }
    }
}

/// A sparse override of the fixed-function defaults. `None` means "not
/// explicitly set"; such fields neither issue backend calls nor shadow
/// the defaults when the block is bound.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, Copy)]
pub struct StateBlock {
    pub cull_face: Option<CullFace>,
    pub front_face: Option<FrontFaceOrder>,
    pub depth_test: Option<bool>,
    pub depth_write: Option<bool>,
    pub depth_func: Option<Comparison>,
    pub blend: Option<bool>,
    pub blend_src: Option<BlendFactor>,
    pub blend_dst: Option<BlendFactor>,
    pub stencil_test: Option<bool>,
    pub stencil_write: Option<u32>,
    pub stencil_func: Option<(Comparison, i32, u32)>,
    pub stencil_op: Option<(StencilOp, StencilOp, StencilOp)>,
}

impl StateBlock {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the bitmask of explicitly-set fields.
    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.cull_face.is_some() {
            bits |= flags::CULL_FACE;
        }
        if self.front_face.is_some() {
            bits |= flags::FRONT_FACE;
        }
        if self.depth_test.is_some() {
            bits |= flags::DEPTH_TEST;
        }
        if self.depth_write.is_some() {
            bits |= flags::DEPTH_WRITE;
        }
        if self.depth_func.is_some() {
            bits |= flags::DEPTH_FUNC;
        }
        if self.blend.is_some() {
            bits |= flags::BLEND;
        }
        if self.blend_src.is_some() {
            bits |= flags::BLEND_SRC;
        }
        if self.blend_dst.is_some() {
            bits |= flags::BLEND_DST;
        }
        if self.stencil_test.is_some() {
            bits |= flags::STENCIL_TEST;
        }
        if self.stencil_write.is_some() {
            bits |= flags::STENCIL_WRITE;
        }
        if self.stencil_func.is_some() {
            bits |= flags::STENCIL_FUNC;
        }
        if self.stencil_op.is_some() {
            bits |= flags::STENCIL_OP;
        }
        bits
    }

    /// Overlays `other` on top of this block; fields `other` sets win.
    pub fn merge(&mut self, other: &StateBlock) {
        if other.cull_face.is_some() {
            self.cull_face = other.cull_face;
        }
        if other.front_face.is_some() {
            self.front_face = other.front_face;
        }
        if other.depth_test.is_some() {
            self.depth_test = other.depth_test;
        }
        if other.depth_write.is_some() {
            self.depth_write = other.depth_write;
        }
        if other.depth_func.is_some() {
            self.depth_func = other.depth_func;
        }
        if other.blend.is_some() {
            self.blend = other.blend;
        }
        if other.blend_src.is_some() {
            self.blend_src = other.blend_src;
        }
        if other.blend_dst.is_some() {
            self.blend_dst = other.blend_dst;
        }
        if other.stencil_test.is_some() {
            self.stencil_test = other.stencil_test;
        }
        if other.stencil_write.is_some() {
            self.stencil_write = other.stencil_write;
        }
        if other.stencil_func.is_some() {
            self.stencil_func = other.stencil_func;
        }
        if other.stencil_op.is_some() {
            self.stencil_op = other.stencil_op;
        }
    }

    /// Resolves this block against the engine defaults, yielding concrete
    /// values for every field.
    pub fn resolve(&self, defaults: &StateValues) -> StateValues {
        StateValues {
            cull_face: self.cull_face.unwrap_or(defaults.cull_face),
            front_face: self.front_face.unwrap_or(defaults.front_face),
            depth_test: self.depth_test.unwrap_or(defaults.depth_test),
            depth_write: self.depth_write.unwrap_or(defaults.depth_write),
            depth_func: self.depth_func.unwrap_or(defaults.depth_func),
            blend: self.blend.unwrap_or(defaults.blend),
            blend_src: self.blend_src.unwrap_or(defaults.blend_src),
            blend_dst: self.blend_dst.unwrap_or(defaults.blend_dst),
            stencil_test: self.stencil_test.unwrap_or(defaults.stencil_test),
            stencil_write: self.stencil_write.unwrap_or(defaults.stencil_write),
            stencil_func: self.stencil_func.unwrap_or(defaults.stencil_func),
            stencil_op: self.stencil_op.unwrap_or(defaults.stencil_op),
        }
    }

    /// Applies one textual `name = value` state assignment, as found in
    /// material property text. Names follow the original engine's spelling
    /// (`cullFace`, `blendSrc`, `depthFunc`, ...).
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "cullFace" => self.cull_face = Some(parse_cull_enable(value)?),
            "cullFaceSide" => self.cull_face = Some(value.parse()?),
            "frontFace" => self.front_face = Some(value.parse()?),
            "depthTest" => self.depth_test = Some(parse_bool(value)?),
            "depthWrite" => self.depth_write = Some(parse_bool(value)?),
            "depthFunc" => self.depth_func = Some(value.parse()?),
            "blend" => self.blend = Some(parse_bool(value)?),
            "blendSrc" => self.blend_src = Some(value.parse()?),
            "blendDst" => self.blend_dst = Some(value.parse()?),
            "stencilTest" => self.stencil_test = Some(parse_bool(value)?),
            "stencilWrite" => {
                self.stencil_write = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| Error::ParseFailure("u32", value.into()))?,
                )
            }
            "stencilFunction" => {
                let mut func = self.stencil_func.unwrap_or(default_stencil_func());
                func.0 = value.parse()?;
                self.stencil_func = Some(func);
            }
            "stencilFunctionRef" => {
                let mut func = self.stencil_func.unwrap_or(default_stencil_func());
                func.1 = value
                    .parse::<i32>()
                    .map_err(|_| Error::ParseFailure("i32", value.into()))?;
                self.stencil_func = Some(func);
            }
            "stencilFunctionMask" => {
                let mut func = self.stencil_func.unwrap_or(default_stencil_func());
                func.2 = value
                    .parse::<u32>()
                    .map_err(|_| Error::ParseFailure("u32", value.into()))?;
                self.stencil_func = Some(func);
            }
            "stencilOpSfail" => {
                let mut op = self.stencil_op.unwrap_or(default_stencil_op());
                op.0 = value.parse()?;
                self.stencil_op = Some(op);
            }
            "stencilOpDpfail" => {
                let mut op = self.stencil_op.unwrap_or(default_stencil_op());
                op.1 = value.parse()?;
                self.stencil_op = Some(op);
            }
            "stencilOpDppass" => {
                let mut op = self.stencil_op.unwrap_or(default_stencil_op());
                op.2 = value.parse()?;
                self.stencil_op = Some(op);
            }
            _ => return Err(Error::StateUnknown(name.into())),
        }

        Ok(())
    }
}

// `cullFace = true` enables back-face culling; the side can be refined
// with `cullFaceSide`.
fn parse_cull_enable(value: &str) -> Result<CullFace> {
    match parse_bool(value)? {
        true => Ok(CullFace::Back),
        false => Ok(CullFace::Nothing),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::ParseFailure("bool", value.into())),
    }
}

fn default_stencil_func() -> (Comparison, i32, u32) {
    StateValues::default().stencil_func
}

fn default_stencil_op() -> (StencilOp, StencilOp, StencilOp) {
    StateValues::default().stencil_op
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bits_track_set_fields() {
        let mut block = StateBlock::new();
        assert_eq!(block.bits(), 0);

        block.blend = Some(true);
        block.depth_test = Some(true);
        assert_eq!(block.bits(), flags::BLEND | flags::DEPTH_TEST);
    }

    #[test]
    fn merge_prefers_innermost() {
        let mut outer = StateBlock::new();
        outer.blend = Some(true);
        outer.depth_test = Some(true);

        let mut inner = StateBlock::new();
        inner.blend = Some(false);

        outer.merge(&inner);
        assert_eq!(outer.blend, Some(false));
        assert_eq!(outer.depth_test, Some(true));
    }

    #[test]
    fn textual_assignments() {
        let mut block = StateBlock::new();
        block.set("cullFace", "true").unwrap();
        block.set("cullFaceSide", "FRONT").unwrap();
        block.set("blendSrc", "SRC_ALPHA").unwrap();
        block.set("depthFunc", "LEQUAL").unwrap();

        assert_eq!(block.cull_face, Some(CullFace::Front));
        assert_eq!(
            block.blend_src,
            Some(BlendFactor::Value(BlendValue::SourceAlpha))
        );
        assert_eq!(block.depth_func, Some(Comparison::LessOrEqual));

        assert!(block.set("wireframe", "true").is_err());
        assert!(block.set("depthTest", "yes").is_err());
    }

    #[test]
    fn resolve_falls_back_to_defaults() {
        let mut block = StateBlock::new();
        block.blend = Some(true);

        let values = block.resolve(&StateValues::default());
        assert!(values.blend);
        assert_eq!(values.depth_func, Comparison::Less);
        assert!(!values.depth_test);
    }
}
