use tempo_engine::camera::Camera;
use tempo_engine::context::RenderContext;
use tempo_engine::graphics::batch::{Batch, Channel};
use tempo_engine::graphics::group::Group;
use tempo_engine::graphics::state::{StateKind, StatePart, UniformBinding};
use tempo_engine::sprites::container::SpriteContainer;
use tempo_engine::sprites::sprite::Sprite;
use tempo_engine::texture::{BuiltinTextures, Texture, TextureProvider};
use tempo_engine::utils::{Color, Position, Rectangle, Size};
use tempo_engine::FrameInfo;

const GAME: Size = Size {
    width: 640.0,
    height: 480.0,
};

fn texture_of(sprite: &Sprite, camera: &Camera) -> Option<StatePart> {
    sprite
        .interfacer()
        .states()
        .get(&camera.id())
        .and_then(|s| s.get(StateKind::Texture).copied())
}

#[test]
fn new_sprite_fills_its_quad() {
    let camera = Camera::null(GAME);
    let ctx = RenderContext::with_camera(camera.clone());
    let sprite = Sprite::new(Texture::new(32, 16), Position::new(5.0, 6.0), &ctx);

    assert_eq!(ctx.batch().quad_count(), 1);
    assert_eq!(sprite.origin(), Position::new(16.0, 8.0));
    let q = sprite.interfacer();
    assert_eq!(q.data(Channel::Position), vec![0.0, 0.0, 32.0, 0.0, 32.0, 16.0, 0.0, 16.0]);
    assert_eq!(q.data(Channel::Translate)[..2], [5.0, 6.0]);
    assert_eq!(q.data(Channel::Color)[..4], [1.0, 1.0, 1.0, 1.0]);
    assert_eq!(
        texture_of(&sprite, &camera),
        Some(StatePart::Texture(sprite.texture().id()))
    );
}

#[test]
fn sprites_sharing_a_texture_draw_together() {
    let camera = Camera::null(GAME);
    let ctx = RenderContext::with_camera(camera.clone());
    let atlas = Texture::new(64, 64);
    let a = Sprite::new(atlas.region(Rectangle::new(0.0, 0.0, 32.0, 32.0)), Position::ZERO, &ctx);
    let b = Sprite::new(atlas.region(Rectangle::new(32.0, 0.0, 32.0, 32.0)), Position::ZERO, &ctx);
    let _c = Sprite::new(Texture::new(8, 8), Position::ZERO, &ctx);

    assert_eq!(a.build_state(&camera), b.build_state(&camera));
    assert_eq!(ctx.batch().distinct_states(camera.id()), 2);
    assert_eq!(ctx.batch().draw_calls(camera.id()).len(), 2);
}

#[test]
fn moving_to_another_batch_keeps_attributes() {
    let camera = Camera::null(GAME);
    let first = RenderContext::with_camera(camera.clone());
    let mut sprite = Sprite::new(Texture::new(32, 32), Position::ZERO, &first);
    sprite.set_position(Position::new(10.0, 20.0));
    sprite.set_rotation(45.0);
    sprite.set_rgba(Color::rgb(255, 0, 0), 51.0);

    let second = RenderContext::new(Batch::new(), Group::new(0), [camera.clone()]);
    sprite.set_context(&second);

    assert_eq!(first.batch().quad_count(), 0);
    assert_eq!(second.batch().quad_count(), 1);
    assert_eq!(sprite.batch(), second.batch());
    assert_eq!(sprite.context().group().parent(), Some(second.group()));
    let q = sprite.interfacer();
    assert_eq!(q.data(Channel::Translate)[..2], [10.0, 20.0]);
    assert_eq!(q.data(Channel::Rotation), vec![45.0; 4]);
    assert_eq!(q.data(Channel::Color)[..4], [1.0, 0.0, 0.0, 0.2]);
    assert!(q.states().contains_key(&camera.id()));
}

#[test]
fn changing_cameras_rebuilds_states() {
    let near = Camera::null(GAME);
    let ctx = RenderContext::with_camera(near.clone());
    let mut sprite = Sprite::new(Texture::new(32, 32), Position::ZERO, &ctx);

    let hud = Camera::new(UniformBinding(3), GAME, GAME);
    let hud_ctx = RenderContext::new(ctx.batch().clone(), ctx.group().clone(), [hud.clone()]);
    sprite.set_context(&hud_ctx);

    let states = sprite.interfacer().states();
    assert_eq!(states.len(), 1);
    let state = &states[&hud.id()];
    assert_eq!(
        state.get(StateKind::UniformBinding),
        Some(&StatePart::UniformBinding(UniformBinding(3)))
    );
    assert_eq!(ctx.batch().distinct_states(near.id()), 0);
    assert_eq!(ctx.batch().draw_calls(hud.id()).len(), 1);
}

#[test]
fn rebinding_to_the_same_parent_is_free() {
    let camera = Camera::null(GAME);
    let ctx = RenderContext::with_camera(camera);
    let mut sprite = Sprite::new(Texture::new(32, 32), Position::ZERO, &ctx);
    let group = sprite.context().group().clone();
    sprite.set_context(&ctx);
    assert_eq!(sprite.context().group(), &group);
}

#[test]
fn new_images_rebind_the_texture() {
    let camera = Camera::null(GAME);
    let ctx = RenderContext::with_camera(camera.clone());
    let mut sprite = Sprite::new(Texture::new(32, 32), Position::ZERO, &ctx);
    let replacement = Texture::new(16, 64);
    sprite.set_image(replacement.clone());

    assert_eq!(texture_of(&sprite, &camera), Some(StatePart::Texture(replacement.id())));
    assert_eq!((sprite.width(), sprite.height()), (16.0, 64.0));
    assert_eq!(sprite.origin(), Position::new(8.0, 32.0));
    assert_eq!(
        sprite.interfacer().data(Channel::Position)[4..6],
        [16.0, 64.0]
    );
}

#[test]
fn animations_drive_texture_and_offset() {
    let camera = Camera::null(GAME);
    let ctx = RenderContext::with_camera(camera.clone());
    let atlas = Texture::new(64, 32);
    let frames: Vec<FrameInfo> = (0..2)
        .map(|i| FrameInfo::untrimmed(atlas.region(Rectangle::new(32.0 * i as f32, 0.0, 32.0, 32.0))))
        .collect();
    let mut sprite = Sprite::new(Texture::new(8, 8), Position::ZERO, &ctx);
    sprite
        .animation_mut()
        .add("left", &frames, 10.0, true, Some(Position::new(4.0, 0.0)), &[])
        .unwrap();
    sprite.animation_mut().add("idle", &frames, 10.0, true, None, &[]).unwrap();

    sprite.animation_mut().play("left", false).unwrap();
    sprite.update(0.0);
    assert_eq!(sprite.offset(), Position::new(4.0, 0.0));
    assert_eq!(sprite.texture(), &frames[0].texture);
    assert_eq!(texture_of(&sprite, &camera), Some(StatePart::Texture(atlas.id())));

    sprite.update(0.15);
    assert_eq!(sprite.texture(), &frames[1].texture);
    assert_eq!(sprite.interfacer().data(Channel::TexCoords)[..2], [0.5, 0.0]);

    sprite.animation_mut().play("idle", false).unwrap();
    sprite.check_animation();
    assert_eq!(sprite.offset(), Position::ZERO);
}

#[test]
fn animation_offsets_follow_scale() {
    let ctx = RenderContext::with_camera(Camera::null(GAME));
    let atlas = Texture::new(32, 32);
    let frames = [FrameInfo::untrimmed(atlas.clone())];
    let mut sprite = Sprite::new(atlas, Position::ZERO, &ctx);
    sprite.set_scale(2.0);
    sprite.set_scale_y(0.5);
    sprite
        .animation_mut()
        .add("pose", &frames, 24.0, false, Some(Position::new(3.0, 8.0)), &[])
        .unwrap();
    sprite.animation_mut().play("pose", false).unwrap();
    sprite.check_animation();
    assert_eq!(sprite.offset(), Position::new(6.0, 8.0));
}

#[test]
fn repositioning_overwrites_the_offset() {
    let ctx = RenderContext::with_camera(Camera::null(GAME));
    let mut sprite = Sprite::new(Texture::new(32, 32), Position::ZERO, &ctx);
    sprite.set_offset(Position::new(4.0, 4.0));
    sprite.set_scale_and_repos(2.0);
    assert_eq!((sprite.width(), sprite.height()), (64.0, 64.0));
    assert_eq!(sprite.offset(), Position::new(-16.0, -16.0));
    assert_eq!(sprite.origin(), Position::new(16.0, 16.0));
    assert_eq!(sprite.interfacer().data(Channel::Scale)[..2], [2.0, 2.0]);
}

#[test]
fn make_rect_stretches_the_pixel_texture() {
    let builtins = BuiltinTextures::new();
    let ctx = RenderContext::with_camera(Camera::null(GAME));
    let mut sprite = Sprite::with_fallback(&builtins, Position::ZERO, &ctx);
    assert_eq!(sprite.texture().size(), Size::new(16.0, 16.0));

    sprite.make_rect(&builtins, Color::BLACK, 128.0, 10.0, 4.0);
    assert_eq!(sprite.texture(), &builtins.pixel_texture());
    assert_eq!((sprite.width(), sprite.height()), (10.0, 4.0));
    assert_eq!(sprite.offset(), Position::new(-4.0, -1.0));
    assert_eq!(sprite.opacity(), 128.0);
    assert_eq!(sprite.color(), Color::BLACK);
}

#[test]
fn movement_integrates_velocity() {
    let ctx = RenderContext::with_camera(Camera::null(GAME));
    let mut sprite = Sprite::new(Texture::new(4, 4), Position::new(1.0, 1.0), &ctx);
    sprite.start_movement(Position::new(10.0, -4.0), None);
    sprite.update(0.5);
    assert_eq!(sprite.position(), Position::new(6.0, -1.0));
    sprite.stop_movement();
    sprite.update(0.5);
    assert_eq!(sprite.position(), Position::new(6.0, -1.0));
    assert!(sprite.movement().is_none());
}

#[test]
fn hidden_and_deleted_sprites_leave_the_draw_list() {
    let camera = Camera::null(GAME);
    let ctx = RenderContext::with_camera(camera.clone());
    let mut a = Sprite::new(Texture::new(4, 4), Position::ZERO, &ctx);
    let mut b = Sprite::new(Texture::new(4, 4), Position::ZERO, &ctx);
    a.set_visible(false);
    assert_eq!(ctx.batch().indices(camera.id()).len(), 6);
    b.delete();
    assert!(b.is_deleted());
    assert_eq!(ctx.batch().quad_count(), 1);
    assert!(ctx.batch().indices(camera.id()).is_empty());
    a.set_visible(true);
    assert_eq!(ctx.batch().indices(camera.id()).len(), 6);
}

#[test]
fn containers_carry_children_along() {
    let ctx = RenderContext::with_camera(Camera::null(GAME));
    let mut container = SpriteContainer::new(Position::new(5.0, 5.0), &ctx);
    container.add(Sprite::new(Texture::new(10, 10), Position::new(1.0, 1.0), &ctx));
    container.add(Sprite::new(Texture::new(10, 20), Position::new(11.0, 1.0), &ctx));
    assert_eq!(container.get(0).unwrap().position(), Position::new(6.0, 6.0));
    assert_eq!(container.width(), 20.0);
    assert_eq!(container.height(), 20.0);

    container.set_position(Position::new(10.0, 10.0));
    assert_eq!(container.get(1).unwrap().position(), Position::new(21.0, 11.0));

    let removed = container.remove(0).unwrap();
    assert_eq!(removed.position(), Position::new(1.0, 1.0));
    assert_eq!(container.len(), 1);
    assert!(container.remove(4).is_none());
}

#[test]
fn nested_containers_share_the_batch() {
    let camera = Camera::null(GAME);
    let ctx = RenderContext::with_camera(camera.clone());
    let mut outer = SpriteContainer::new(Position::ZERO, &ctx);
    let mut inner = SpriteContainer::new(Position::ZERO, &ctx);
    inner.add(Sprite::new(Texture::new(4, 4), Position::ZERO, &ctx));
    outer.add(inner);

    let leaf = outer
        .get(0)
        .and_then(|v| v.as_container())
        .and_then(|c| c.get(0))
        .and_then(|v| v.as_sprite())
        .unwrap();
    assert!(leaf.context().group().is_descendant_of(outer.context().group()));

    let elsewhere = RenderContext::with_camera(camera);
    outer.set_context(&elsewhere);
    assert_eq!(ctx.batch().quad_count(), 0);
    assert_eq!(elsewhere.batch().quad_count(), 1);
}
