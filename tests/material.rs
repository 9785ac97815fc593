use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use glaze::prelude::*;

const VSH: &str = "attribute vec3 a_Position;\nuniform mat4 u_mvp;\nvoid main() {}\n";
const FSH: &str = "uniform vec4 u_color;\nuniform float u_time;\nvoid main() {}\n";

struct TestScene;

impl SceneBinding for TestScene {
    fn world_matrix(&self, _node: Option<NodeId>) -> Matrix4<f32> {
        Matrix4::identity()
    }

    fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::identity()
    }

    fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::identity()
    }

    fn camera_world_position(&self) -> Vector3<f32> {
        Vector3::new(0.0, 1.0, 2.0)
    }

    fn camera_view_position(&self) -> Vector3<f32> {
        Vector3::new(0.0, 0.0, 0.0)
    }
}

fn simple_material(ctx: &RenderContext) -> (Material, Arc<Effect>) {
    let effect = ctx
        .create_effect_from_sources("m.vert", "m.frag", VSH, FSH, "")
        .unwrap();

    let mut technique = Technique::new("default");
    technique.add_pass(Pass::new("main", effect.clone()));

    let mut material = Material::new();
    material.add_technique(technique);
    (material, effect)
}

fn writes_at(stats: &glaze::backend::headless::HeadlessStats, location: i32) -> Vec<UniformVariable> {
    stats
        .uniform_writes
        .iter()
        .filter(|(at, _)| *at == location)
        .map(|(_, v)| v.clone())
        .collect()
}

#[test]
fn innermost_parameter_wins_and_is_written_once() {
    let _ = env_logger::try_init();
    let (ctx, stats) = RenderContext::headless();
    let (mut material, effect) = simple_material(&ctx);

    let red = [1.0f32, 0.0, 0.0, 1.0];
    let blue = [0.0f32, 0.0, 1.0, 1.0];
    material.state_mut().parameter("u_color").set_value(red);
    material
        .current_technique_mut()
        .unwrap()
        .pass_mut(0)
        .unwrap()
        .state_mut()
        .parameter("u_color")
        .set_value(blue);

    ctx.bind_pass(&material, None, 0, &TestScene).unwrap();

    let location = effect.uniform("u_color").unwrap().location();
    let writes = writes_at(&stats.read().unwrap(), location);
    assert_eq!(writes, vec![UniformVariable::Vector4f(blue)]);
}

#[test]
fn auto_bindings_resolve_from_the_scene() {
    let (ctx, stats) = RenderContext::headless();
    let (mut material, effect) = simple_material(&ctx);

    material
        .state_mut()
        .parameter("u_mvp")
        .bind_auto("WORLD_VIEW_PROJECTION_MATRIX");

    ctx.bind_pass(&material, None, 0, &TestScene).unwrap();

    let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
    let location = effect.uniform("u_mvp").unwrap().location();
    let writes = writes_at(&stats.read().unwrap(), location);
    assert_eq!(writes, vec![UniformVariable::Matrix4f(identity, false)]);
}

#[test]
fn per_parameter_problems_skip_instead_of_failing() {
    let (ctx, stats) = RenderContext::headless();
    let (mut material, _effect) = simple_material(&ctx);

    // No such uniform.
    material.state_mut().parameter("u_nothing").set_value(1i32);
    // Unresolvable auto-binding.
    material.state_mut().parameter("u_time").bind_auto("U_TIME");
    // Type mismatch.
    material.state_mut().parameter("u_color").set_value(0.5f32);
    // Empty parameter.
    material.state_mut().parameter("u_mvp");

    ctx.bind_pass(&material, None, 0, &TestScene).unwrap();
    assert!(stats.read().unwrap().uniform_writes.is_empty());
}

struct TimeResolver;

impl AutoBindingResolver for TimeResolver {
    fn resolve(
        &self,
        name: &str,
        _node: Option<NodeId>,
        _scene: &dyn SceneBinding,
    ) -> Resolution {
        match name {
            "U_TIME" => Resolution::Resolved(UniformVariable::F32(42.0)),
            _ => Resolution::Unresolved,
        }
    }
}

struct ShadowResolver;

impl AutoBindingResolver for ShadowResolver {
    fn resolve(
        &self,
        name: &str,
        _node: Option<NodeId>,
        _scene: &dyn SceneBinding,
    ) -> Resolution {
        match name {
            "WORLD_VIEW_PROJECTION_MATRIX" => {
                Resolution::Resolved(UniformVariable::Matrix4f([[2.0; 4]; 4], false))
            }
            _ => Resolution::Unresolved,
        }
    }
}

#[test]
fn registered_resolvers_run_before_the_builtin_table() {
    let (mut ctx, stats) = RenderContext::headless();
    ctx.register_resolver(Box::new(TimeResolver));
    ctx.register_resolver(Box::new(ShadowResolver));

    let (mut material, effect) = simple_material(&ctx);
    material.state_mut().parameter("u_time").bind_auto("U_TIME");
    material
        .state_mut()
        .parameter("u_mvp")
        .bind_auto("WORLD_VIEW_PROJECTION_MATRIX");

    ctx.bind_pass(&material, None, 0, &TestScene).unwrap();

    let stats = stats.read().unwrap();
    let time = effect.uniform("u_time").unwrap().location();
    assert_eq!(writes_at(&stats, time), vec![UniformVariable::F32(42.0)]);

    // The custom resolver shadows the built-in source for the same name.
    let mvp = effect.uniform("u_mvp").unwrap().location();
    assert_eq!(
        writes_at(&stats, mvp),
        vec![UniformVariable::Matrix4f([[2.0; 4]; 4], false)]
    );
}

#[test]
fn unsatisfied_required_attributes_skip_the_pass() {
    let _ = env_logger::try_init();
    let (ctx, stats) = RenderContext::headless();
    let (mut material, _) = simple_material(&ctx);

    // The effect declares a_Position only; requiring a_Normal as well
    // makes the pass unbindable.
    let layout = AttributeLayout::build()
        .with(Attribute::Position, 3)
        .with(Attribute::Normal, 3)
        .finish();
    material
        .current_technique_mut()
        .unwrap()
        .pass_mut(0)
        .unwrap()
        .set_attributes(layout);

    ctx.bind_pass(&material, None, 0, &TestScene).unwrap();
    assert!(stats.read().unwrap().bound_programs.is_empty());
}

#[test]
fn optional_attributes_do_not_block_the_pass() {
    let (ctx, stats) = RenderContext::headless();
    let (mut material, _) = simple_material(&ctx);

    let layout = AttributeLayout::build()
        .with(Attribute::Position, 3)
        .with_optional(Attribute::Normal, 3)
        .finish();
    material
        .current_technique_mut()
        .unwrap()
        .pass_mut(0)
        .unwrap()
        .set_attributes(layout);

    ctx.bind_pass(&material, None, 0, &TestScene).unwrap();
    assert_eq!(stats.read().unwrap().bound_programs.len(), 1);
}

#[test]
fn foreign_effects_are_skipped_without_failing_the_frame() {
    let _ = env_logger::try_init();
    let (owner, _) = RenderContext::headless();
    let (ctx, stats) = RenderContext::headless();

    // The material's effect lives in another context; binding it here
    // cannot work, but the per-frame call still returns cleanly.
    let (material, _) = simple_material(&owner);
    ctx.bind_pass(&material, None, 0, &TestScene).unwrap();

    let stats = stats.read().unwrap();
    assert!(stats.bound_programs.is_empty());
    assert!(stats.uniform_writes.is_empty());
}

#[test]
fn merged_state_blocks_prefer_the_innermost_level() {
    let (ctx, stats) = RenderContext::headless();
    let (mut material, _) = simple_material(&ctx);

    material.state_mut().state_block_mut().depth_test = Some(true);
    {
        let technique = material.current_technique_mut().unwrap();
        technique.state_mut().state_block_mut().depth_test = Some(false);
        technique
            .pass_mut(0)
            .unwrap()
            .state_mut()
            .state_block_mut()
            .blend = Some(true);
    }

    ctx.bind_pass(&material, None, 0, &TestScene).unwrap();

    // The technique pins depth testing back at its default, so the only
    // difference issued is the blend toggle.
    let stats = stats.read().unwrap();
    assert_eq!(stats.state_changes, vec![StateField::Blend(true)]);
}

#[test]
fn clones_share_effects_and_remap_nodes() {
    let (ctx, _) = RenderContext::headless();
    let (mut material, effect) = simple_material(&ctx);

    let original = NodeId::new(1, 1);
    let cloned = NodeId::new(7, 1);
    material.set_node(Some(original));
    material.state_mut().parameter("u_time").set_value(1.0f32);

    let mut clone_ctx = CloneContext::new();
    clone_ctx.register(original, cloned);
    let mut clone = material.clone_with(&clone_ctx);

    assert_eq!(clone.node(), Some(cloned));
    assert_eq!(material.node(), Some(original));
    assert!(Arc::ptr_eq(
        clone.current_technique().unwrap().pass(0).unwrap().effect(),
        &effect,
    ));

    // Parameters are deep copies.
    clone.state_mut().parameter("u_time").set_value(2.0f32);
    assert_eq!(
        material.state().parameters()[0].value(),
        Some(&UniformVariable::F32(1.0))
    );
}

#[test]
fn part_overrides_are_cloned_through() {
    let (ctx, _) = RenderContext::headless();
    let (mut material, _) = simple_material(&ctx);
    let (mut part, _) = simple_material(&ctx);

    let original = NodeId::new(3, 1);
    let cloned = NodeId::new(4, 1);
    part.set_node(Some(original));
    material.set_part_override(1, part);

    let mut clone_ctx = CloneContext::new();
    clone_ctx.register(original, cloned);
    let clone = material.clone_with(&clone_ctx);

    assert!(clone.part_override(0).is_none());
    assert_eq!(clone.part_override(1).unwrap().node(), Some(cloned));
}

#[test]
fn technique_selection_by_name() {
    let mut material = Material::new();
    material.add_technique(Technique::new("forward"));
    material.add_technique(Technique::new("shadowmap"));

    assert_eq!(material.current_technique().unwrap().name(), "forward");
    assert!(material.set_technique("shadowmap"));
    assert_eq!(material.current_technique().unwrap().name(), "shadowmap");
    assert!(!material.set_technique("deferred"));
    assert_eq!(material.current_technique().unwrap().name(), "shadowmap");
}

#[test]
fn matrix_palettes_write_into_the_array_uniform() {
    struct SkinnedScene;

    impl SceneBinding for SkinnedScene {
        fn world_matrix(&self, _node: Option<NodeId>) -> Matrix4<f32> {
            Matrix4::identity()
        }

        fn view_matrix(&self) -> Matrix4<f32> {
            Matrix4::identity()
        }

        fn projection_matrix(&self) -> Matrix4<f32> {
            Matrix4::identity()
        }

        fn camera_world_position(&self) -> Vector3<f32> {
            Vector3::new(0.0, 0.0, 0.0)
        }

        fn camera_view_position(&self) -> Vector3<f32> {
            Vector3::new(0.0, 0.0, 0.0)
        }

        fn matrix_palette(&self, _node: Option<NodeId>) -> Option<Vec<[f32; 4]>> {
            Some(vec![[1.0; 4]; 6])
        }
    }

    let (ctx, stats) = RenderContext::headless();
    let effect = ctx
        .create_effect_from_sources(
            "skinned.vert",
            "skinned.frag",
            "uniform vec4 u_matrixPalette[8];\nvoid main() {}\n",
            "void main() {}\n",
            "",
        )
        .unwrap();

    let mut technique = Technique::new("default");
    technique.add_pass(Pass::new("main", effect.clone()));
    let mut material = Material::new();
    material.add_technique(technique);
    material
        .state_mut()
        .parameter("u_matrixPalette")
        .bind_auto("MATRIX_PALETTE");

    ctx.bind_pass(&material, None, 0, &SkinnedScene).unwrap();

    let location = effect.uniform("u_matrixPalette").unwrap().location();
    let writes = writes_at(&stats.read().unwrap(), location);
    assert_eq!(
        writes,
        vec![UniformVariable::Vector4fArray(vec![[1.0; 4]; 6])]
    );
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glaze_{}_{:08x}", tag, rand::random::<u32>()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn loader_builds_a_bindable_hierarchy() {
    let dir = scratch_dir("loader");
    let vsh = dir.join("lit.vert");
    let fsh = dir.join("lit.frag");
    fs::write(&vsh, "attribute vec3 a_Position;\nuniform mat4 u_mvp;\nvoid main() {}\n").unwrap();
    fs::write(
        &fsh,
        "uniform vec3 u_ambientColor;\nuniform float u_time;\nvoid main() {}\n",
    )
    .unwrap();

    let source = format!(
        r#"
material wood
{{
    u_ambientColor = 0.2, 0.4, 0.6

    technique lit
    {{
        pass main
        {{
            vertexShader = {}
            fragmentShader = {}
            defines = LIT;MAX_LIGHTS=4
            u_mvp = WORLD_VIEW_PROJECTION_MATRIX
            u_time = 0.5

            renderState
            {{
                cullFace = true
                depthTest = true
                blendSrc = SRC_ALPHA
            }}
        }}
    }}
}}
"#,
        vsh.display(),
        fsh.display()
    );

    let (ctx, stats) = RenderContext::headless();
    let material = loader::load(&ctx, &source).unwrap();

    let technique = material.technique("lit").unwrap();
    assert_eq!(technique.pass_count(), 1);

    let pass = technique.pass(0).unwrap();
    let block = pass.state().state_block().unwrap();
    assert_eq!(block.cull_face, Some(CullFace::Back));
    assert_eq!(block.depth_test, Some(true));
    assert_eq!(
        block.blend_src,
        Some(BlendFactor::Value(BlendValue::SourceAlpha))
    );

    ctx.bind_pass(&material, Some("lit"), 0, &TestScene).unwrap();

    let stats = stats.read().unwrap();
    let effect = pass.effect();
    let ambient = effect.uniform("u_ambientColor").unwrap().location();
    let time = effect.uniform("u_time").unwrap().location();
    assert!(stats
        .uniform_writes
        .contains(&(ambient, UniformVariable::Vector3f([0.2, 0.4, 0.6]))));
    assert!(stats.uniform_writes.contains(&(time, UniformVariable::F32(0.5))));
    assert!(stats.state_changes.contains(&StateField::CullFace(CullFace::Back)));
    assert!(stats.state_changes.contains(&StateField::DepthTest(true)));

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn loader_rejects_untypable_values_with_a_line_number() {
    let (ctx, _) = RenderContext::headless();
    let source = "material broken\n{\n    u_color = shiny\n}\n";

    match loader::load(&ctx, source) {
        Err(Error::MaterialSyntax(3, _)) => {}
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}
