use glaze::prelude::*;

#[test]
fn binds_issue_only_differences_against_the_mirror() {
    let (ctx, stats) = RenderContext::headless();

    // A: both fields differ from the defaults.
    let mut a = StateBlock::new();
    a.blend = Some(true);
    a.depth_test = Some(true);
    ctx.bind_state_block(&a);
    {
        let stats = stats.read().unwrap();
        assert_eq!(stats.state_changes.len(), 2);
        assert!(stats.state_changes.contains(&StateField::Blend(true)));
        assert!(stats.state_changes.contains(&StateField::DepthTest(true)));
    }

    // B: sets blend to what the mirror already holds; nothing is issued.
    let mut b = StateBlock::new();
    b.blend = Some(true);
    ctx.bind_state_block(&b);
    assert_eq!(stats.read().unwrap().state_changes.len(), 2);

    // C: after B the mirror considers depth testing back at its default,
    // so setting it again is a difference.
    let mut c = StateBlock::new();
    c.depth_test = Some(true);
    ctx.bind_state_block(&c);
    {
        let stats = stats.read().unwrap();
        assert_eq!(stats.state_changes.len(), 3);
        assert_eq!(stats.state_changes[2], StateField::DepthTest(true));
    }
}

#[test]
fn explicit_disable_after_enable_issues_the_change() {
    let (ctx, stats) = RenderContext::headless();

    let mut a = StateBlock::new();
    a.blend = Some(true);
    ctx.bind_state_block(&a);

    let mut c = StateBlock::new();
    c.blend = Some(false);
    ctx.bind_state_block(&c);

    assert_eq!(
        stats.read().unwrap().state_changes,
        vec![StateField::Blend(true), StateField::Blend(false)]
    );
}

#[test]
fn identical_rebind_is_a_no_op() {
    let (ctx, stats) = RenderContext::headless();

    let mut block = StateBlock::new();
    block.cull_face = Some(CullFace::Front);
    block.depth_func = Some(Comparison::LessOrEqual);

    ctx.bind_state_block(&block);
    ctx.bind_state_block(&block);
    ctx.bind_state_block(&block);

    assert_eq!(stats.read().unwrap().state_changes.len(), 2);
}

#[test]
fn restore_resets_only_dirty_named_fields() {
    let (ctx, stats) = RenderContext::headless();

    let mut block = StateBlock::new();
    block.blend = Some(true);
    block.blend_src = Some(BlendFactor::Value(BlendValue::SourceAlpha));
    block.depth_test = Some(true);
    ctx.bind_state_block(&block);
    assert_eq!(stats.read().unwrap().state_changes.len(), 3);

    // Restoring blend flips the two dirty blend fields back; depth is
    // outside the mask and stays.
    ctx.restore_states(flags::BLEND | flags::BLEND_SRC | flags::BLEND_DST);
    {
        let stats = stats.read().unwrap();
        assert_eq!(stats.state_changes.len(), 5);
        assert!(stats.state_changes.contains(&StateField::Blend(false)));
        assert!(stats
            .state_changes
            .contains(&StateField::BlendSrc(BlendFactor::One)));
    }

    // A full restore touches exactly the remaining dirty field.
    ctx.restore_states(flags::ALL);
    assert_eq!(stats.read().unwrap().state_changes.len(), 6);
    assert_eq!(
        *stats.read().unwrap().state_changes.last().unwrap(),
        StateField::DepthTest(false)
    );

    // And is then itself a no-op.
    ctx.restore_states(flags::ALL);
    assert_eq!(stats.read().unwrap().state_changes.len(), 6);
}
