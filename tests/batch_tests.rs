use std::collections::HashMap;

use tempo_engine::camera::{Camera, CameraId};
use tempo_engine::graphics::batch::{Batch, Channel};
use tempo_engine::graphics::group::Group;
use tempo_engine::graphics::state::{
    BlendFunc, Capability, ProgramId, RenderState, StatePart, UniformBinding,
};
use tempo_engine::texture::TextureId;
use tempo_engine::utils::Size;

fn camera() -> Camera {
    Camera::null(Size::new(320.0, 240.0))
}

fn state(texture: TextureId) -> RenderState {
    RenderState::from_parts([
        StatePart::Program(ProgramId(0)),
        StatePart::UniformBinding(UniformBinding(0)),
        StatePart::TextureUnit(0),
        StatePart::Texture(texture),
        StatePart::Enable(Capability::Blend),
        StatePart::BlendFunc(BlendFunc::ALPHA),
    ])
}

fn states(camera: CameraId, state: &RenderState) -> HashMap<CameraId, RenderState> {
    HashMap::from([(camera, state.clone())])
}

#[test]
fn equal_states_share_one_draw_call() {
    let cam = camera();
    let batch = Batch::new();
    let group = Group::new(0);
    let a = state(TextureId::new());
    let b = state(TextureId::new());

    let _q1 = batch.add_quad(&group, states(cam.id(), &a));
    let _q2 = batch.add_quad(&group, states(cam.id(), &b));
    let _q3 = batch.add_quad(&group, states(cam.id(), &a));

    assert_eq!(batch.quad_count(), 3);
    assert_eq!(batch.distinct_states(cam.id()), 2);
    let calls = batch.draw_calls(cam.id());
    assert_eq!(calls.len(), 2);
    let merged = calls.iter().find(|c| c.state == a).unwrap();
    assert_eq!(merged.index_count, 12);
    let single = calls.iter().find(|c| c.state == b).unwrap();
    assert_eq!(single.index_count, 6);

    // only the texture differs between the two descriptors
    assert_eq!(calls[0].switches.len(), 6);
    assert_eq!(calls[1].switches.len(), 1);
    assert!(matches!(calls[1].switches[0], StatePart::Texture(_)));
}

#[test]
fn quads_of_one_state_index_their_slots() {
    let cam = camera();
    let batch = Batch::new();
    let group = Group::new(0);
    let a = state(TextureId::new());
    let _q1 = batch.add_quad(&group, states(cam.id(), &a));
    let _q2 = batch.add_quad(&group, states(cam.id(), &a));
    assert_eq!(
        batch.indices(cam.id()),
        vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]
    );
}

#[test]
fn group_order_wins_over_merging() {
    let cam = camera();
    let batch = Batch::new();
    let a = state(TextureId::new());
    let b = state(TextureId::new());

    let _top = batch.add_quad(&Group::new(2), states(cam.id(), &a));
    let _middle = batch.add_quad(&Group::new(1), states(cam.id(), &b));
    let _bottom = batch.add_quad(&Group::new(0), states(cam.id(), &a));

    let calls = batch.draw_calls(cam.id());
    let order: Vec<&RenderState> = calls.iter().map(|c| &c.state).collect();
    assert_eq!(order, vec![&a, &b, &a]);
    assert_eq!(calls[2].index_start, 12);
}

#[test]
fn child_groups_draw_after_their_lower_siblings() {
    let cam = camera();
    let batch = Batch::new();
    let root = Group::new(0);
    let front = Group::child_of(&root, 1);
    let nested = Group::child_of(&Group::child_of(&root, 0), 5);
    let a = state(TextureId::new());
    let b = state(TextureId::new());

    let _f = batch.add_quad(&front, states(cam.id(), &a));
    let _n = batch.add_quad(&nested, states(cam.id(), &b));
    let calls = batch.draw_calls(cam.id());
    assert_eq!(calls[0].state, b);
    assert_eq!(calls[1].state, a);
    assert!(nested.is_descendant_of(&root));
}

#[test]
fn hidden_quads_are_not_drawn() {
    let cam = camera();
    let batch = Batch::new();
    let group = Group::new(0);
    let a = state(TextureId::new());
    let mut q1 = batch.add_quad(&group, states(cam.id(), &a));
    let _q2 = batch.add_quad(&group, states(cam.id(), &a));

    q1.set_visibility(false);
    assert!(!q1.visible());
    assert_eq!(batch.indices(cam.id()).len(), 6);
    q1.set_visibility(true);
    assert_eq!(batch.indices(cam.id()).len(), 12);
}

#[test]
fn each_camera_gets_its_own_list() {
    let near = camera();
    let far = camera();
    let batch = Batch::new();
    let group = Group::new(0);
    let tex = TextureId::new();
    let mut per_camera = HashMap::new();
    per_camera.insert(near.id(), state(tex));
    per_camera.insert(
        far.id(),
        state(tex).with(StatePart::UniformBinding(UniformBinding(1))),
    );
    let _q = batch.add_quad(&group, per_camera);
    let _only_near = batch.add_quad(&group, states(near.id(), &state(tex)));

    assert_eq!(batch.cameras().len(), 2);
    assert_eq!(batch.indices(near.id()).len(), 12);
    assert_eq!(batch.indices(far.id()).len(), 6);
}

#[test]
fn writes_stay_inside_their_quad() {
    let cam = camera();
    let batch = Batch::new();
    let group = Group::new(0);
    let a = state(TextureId::new());
    let mut q1 = batch.add_quad(&group, states(cam.id(), &a));
    let q2 = batch.add_quad(&group, states(cam.id(), &a));

    q1.set_vertex_attr(Channel::Translate, &[3.0, 4.0]);
    q1.set_data(Channel::Position, &[0.0, 0.0, 8.0, 0.0, 8.0, 8.0, 0.0, 8.0]);
    assert_eq!(q1.data(Channel::Translate), vec![3.0, 4.0, 3.0, 4.0, 3.0, 4.0, 3.0, 4.0]);
    assert_eq!(q2.data(Channel::Translate), vec![0.0; 8]);
    assert_eq!(q2.data(Channel::Position), vec![0.0; 8]);
    batch.with_vertices(|v| {
        assert_eq!(v.len(), 8);
        assert_eq!(v[2].position, [8.0, 8.0]);
    });
}

#[test]
fn migration_keeps_vertex_data_and_states() {
    let cam = camera();
    let from = Batch::new();
    let to = Batch::new();
    let group = Group::new(0);
    let a = state(TextureId::new());
    let mut quad = from.add_quad(&group, states(cam.id(), &a));
    quad.set_vertex_attr(Channel::Color, &[1.0, 0.5, 0.25, 1.0]);
    quad.set_visibility(false);

    let target_group = Group::new(3);
    quad.migrate(&to, &target_group, None);
    assert_eq!(from.quad_count(), 0);
    assert_eq!(to.quad_count(), 1);
    assert_eq!(quad.batch(), &to);
    assert_eq!(quad.data(Channel::Color)[..4], [1.0, 0.5, 0.25, 1.0]);
    assert_eq!(quad.states().get(&cam.id()), Some(&a));
    assert_eq!(quad.group(), Some(target_group));
    assert!(!quad.visible());
}

#[test]
fn migrating_within_a_batch_only_regroups() {
    let cam = camera();
    let batch = Batch::new();
    let a = state(TextureId::new());
    let b = state(TextureId::new());
    let mut quad = batch.add_quad(&Group::new(0), states(cam.id(), &a));
    let id = quad.id();

    let group = Group::new(1);
    quad.migrate(&batch.clone(), &group, Some(states(cam.id(), &b)));
    assert_eq!(quad.id(), id);
    assert_eq!(quad.group(), Some(group));
    assert_eq!(batch.distinct_states(cam.id()), 1);
    assert_eq!(batch.draw_calls(cam.id())[0].state, b);
}

#[test]
fn deleting_frees_the_slot_for_reuse() {
    let cam = camera();
    let batch = Batch::new();
    let group = Group::new(0);
    let a = state(TextureId::new());
    let mut quad = batch.add_quad(&group, states(cam.id(), &a));
    quad.delete();
    quad.delete();
    assert!(quad.is_deleted());
    assert_eq!(batch.quad_count(), 0);
    assert_eq!(batch.distinct_states(cam.id()), 0);
    assert!(batch.draw_calls(cam.id()).is_empty());

    let _again = batch.add_quad(&group, states(cam.id(), &a));
    assert_eq!(batch.slot_capacity(), 1);
}
