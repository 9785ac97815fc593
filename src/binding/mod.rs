//! Auto-bindings: material parameters whose values come from the scene
//! at bind time instead of being stored in the material.
//!
//! The built-in table covers the usual transform chain and camera/light
//! queries. Embedders with additional sources register
//! [`AutoBindingResolver`]s on the context; registered resolvers are
//! consulted in registration order before the built-in table, and the
//! first claim wins.

use std::str::FromStr;

use cgmath::prelude::*;

use crate::effect::uniform::UniformVariable;
use crate::errors::{Error, Result};
use crate::math::prelude::{Color, Matrix4, Vector3};

/// An opaque reference to a node owned by the embedder's scene graph.
/// Materials carry it so the scene view can answer per-node queries.
impl_handle!(NodeId);

/// The built-in auto-binding sources.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AutoBinding {
    WorldMatrix,
    ViewMatrix,
    ProjectionMatrix,
    WorldViewMatrix,
    ViewProjectionMatrix,
    WorldViewProjectionMatrix,
    InverseTransposeWorldMatrix,
    InverseTransposeWorldViewMatrix,
    CameraWorldPosition,
    CameraViewPosition,
    SceneAmbientColor,
    MatrixPalette,
}

impl Into<&'static str> for AutoBinding {
    fn into(self) -> &'static str {
        match self {
            AutoBinding::WorldMatrix => "WORLD_MATRIX",
            AutoBinding::ViewMatrix => "VIEW_MATRIX",
            AutoBinding::ProjectionMatrix => "PROJECTION_MATRIX",
            AutoBinding::WorldViewMatrix => "WORLD_VIEW_MATRIX",
            AutoBinding::ViewProjectionMatrix => "VIEW_PROJECTION_MATRIX",
            AutoBinding::WorldViewProjectionMatrix => "WORLD_VIEW_PROJECTION_MATRIX",
            AutoBinding::InverseTransposeWorldMatrix => "INVERSE_TRANSPOSE_WORLD_MATRIX",
            AutoBinding::InverseTransposeWorldViewMatrix => "INVERSE_TRANSPOSE_WORLD_VIEW_MATRIX",
            AutoBinding::CameraWorldPosition => "CAMERA_WORLD_POSITION",
            AutoBinding::CameraViewPosition => "CAMERA_VIEW_POSITION",
            AutoBinding::SceneAmbientColor => "SCENE_AMBIENT_COLOR",
            AutoBinding::MatrixPalette => "MATRIX_PALETTE",
        }
    }
}

impl FromStr for AutoBinding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WORLD_MATRIX" => Ok(AutoBinding::WorldMatrix),
            "VIEW_MATRIX" => Ok(AutoBinding::ViewMatrix),
            "PROJECTION_MATRIX" => Ok(AutoBinding::ProjectionMatrix),
            "WORLD_VIEW_MATRIX" => Ok(AutoBinding::WorldViewMatrix),
            "VIEW_PROJECTION_MATRIX" => Ok(AutoBinding::ViewProjectionMatrix),
            "WORLD_VIEW_PROJECTION_MATRIX" => Ok(AutoBinding::WorldViewProjectionMatrix),
            "INVERSE_TRANSPOSE_WORLD_MATRIX" => Ok(AutoBinding::InverseTransposeWorldMatrix),
            "INVERSE_TRANSPOSE_WORLD_VIEW_MATRIX" => {
                Ok(AutoBinding::InverseTransposeWorldViewMatrix)
            }
            "CAMERA_WORLD_POSITION" => Ok(AutoBinding::CameraWorldPosition),
            "CAMERA_VIEW_POSITION" => Ok(AutoBinding::CameraViewPosition),
            "SCENE_AMBIENT_COLOR" => Ok(AutoBinding::SceneAmbientColor),
            "MATRIX_PALETTE" => Ok(AutoBinding::MatrixPalette),
            _ => Err(Error::ParseFailure("AutoBinding", s.into())),
        }
    }
}

/// The scene-side accessor surface consumed during auto-binding
/// resolution. The embedder implements this once per view; per-node
/// queries receive the node recorded on the material being bound, if any.
pub trait SceneBinding {
    fn world_matrix(&self, node: Option<NodeId>) -> Matrix4<f32>;

    fn view_matrix(&self) -> Matrix4<f32>;

    fn projection_matrix(&self) -> Matrix4<f32>;

    fn camera_world_position(&self) -> Vector3<f32>;

    fn camera_view_position(&self) -> Vector3<f32>;

    fn ambient_color(&self) -> Color {
        Color::white()
    }

    /// Skinning palette rows for the node, if it is skinned.
    fn matrix_palette(&self, _node: Option<NodeId>) -> Option<Vec<[f32; 4]>> {
        None
    }
}

/// The outcome of asking one resolver about one auto-binding name.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(UniformVariable),
    Unresolved,
}

/// A pluggable auto-binding source registered on the context. `name` is
/// the raw auto-binding string recorded on the parameter, which may or may
/// not be one of the built-in table's names.
pub trait AutoBindingResolver {
    fn resolve(
        &self,
        name: &str,
        node: Option<NodeId>,
        scene: &dyn SceneBinding,
    ) -> Resolution;
}

/// Resolves one built-in auto-binding against a scene view.
pub fn resolve_builtin(
    binding: AutoBinding,
    node: Option<NodeId>,
    scene: &dyn SceneBinding,
) -> Resolution {
    let value = match binding {
        AutoBinding::WorldMatrix => scene.world_matrix(node).into(),
        AutoBinding::ViewMatrix => scene.view_matrix().into(),
        AutoBinding::ProjectionMatrix => scene.projection_matrix().into(),
        AutoBinding::WorldViewMatrix => (scene.view_matrix() * scene.world_matrix(node)).into(),
        AutoBinding::ViewProjectionMatrix => {
            (scene.projection_matrix() * scene.view_matrix()).into()
        }
        AutoBinding::WorldViewProjectionMatrix => {
            (scene.projection_matrix() * scene.view_matrix() * scene.world_matrix(node)).into()
        }
        AutoBinding::InverseTransposeWorldMatrix => {
            inverse_transpose(scene.world_matrix(node)).into()
        }
        AutoBinding::InverseTransposeWorldViewMatrix => {
            inverse_transpose(scene.view_matrix() * scene.world_matrix(node)).into()
        }
        AutoBinding::CameraWorldPosition => {
            let v: [f32; 3] = scene.camera_world_position().into();
            v.into()
        }
        AutoBinding::CameraViewPosition => {
            let v: [f32; 3] = scene.camera_view_position().into();
            v.into()
        }
        AutoBinding::SceneAmbientColor => scene.ambient_color().rgb().into(),
        AutoBinding::MatrixPalette => match scene.matrix_palette(node) {
            Some(rows) => rows.into(),
            None => return Resolution::Unresolved,
        },
    };

    Resolution::Resolved(value)
}

/// A singular matrix falls back to itself transposed, which is what a
/// degenerate normal transform degrades to anyway.
fn inverse_transpose(m: Matrix4<f32>) -> Matrix4<f32> {
    m.invert().unwrap_or(m).transpose()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_round_trip() {
        for binding in &[
            AutoBinding::WorldMatrix,
            AutoBinding::WorldViewProjectionMatrix,
            AutoBinding::InverseTransposeWorldViewMatrix,
            AutoBinding::CameraViewPosition,
            AutoBinding::MatrixPalette,
        ] {
            let name: &'static str = (*binding).into();
            assert_eq!(name.parse::<AutoBinding>().unwrap(), *binding);
        }

        assert!("world_matrix".parse::<AutoBinding>().is_err());
        assert!("U_CUSTOM".parse::<AutoBinding>().is_err());
    }
}
