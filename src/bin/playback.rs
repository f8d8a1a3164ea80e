//! Headless playback of a small scene: a dancer cycling through its
//! animations, a note strip fading in and a hit marker flickering.
//!
//! Usage: `playback [config.json] [seconds]`

use std::env;

use anyhow::{Context, Result};
use tempo_engine::anim::Ease;
use tempo_engine::diagnostics::{DebugPane, FrameStats};
use tempo_engine::effects::TweenAttr;
use tempo_engine::texture::{BuiltinTextures, Texture};
use tempo_engine::{
    Camera, EngineConfig, FrameInfo, Position, Rectangle, RenderContext, Sprite, SpriteContainer,
};

const STEP: f32 = 1.0 / 60.0;

fn dancer_frames() -> Vec<FrameInfo> {
    let atlas = Texture::new(512, 128);
    (0..8)
        .map(|i| {
            let cell = Rectangle::new(64.0 * i as f32, 0.0, 64.0, 128.0);
            // every other frame is trimmed by 4px on the left
            if i % 2 == 1 {
                let trimmed = Rectangle::new(cell.x + 4.0, cell.y, 60.0, 128.0);
                FrameInfo::new(atlas.region(trimmed), Rectangle::new(-4.0, 0.0, 60.0, 128.0))
            } else {
                FrameInfo::untrimmed(atlas.region(cell))
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "tempo.json".to_string());
    let seconds: f32 = match args.next() {
        Some(s) => s.parse().context("duration must be a number of seconds")?,
        None => 4.0,
    };

    let config = EngineConfig::load(&config_path)
        .with_context(|| format!("loading config from {config_path}"))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter))
        .init();
    log::info!("game area {:?}, {}s of playback", config.game_dimensions(), seconds);

    let (mut pane, pane_tx) = DebugPane::new(config.debug_pane_lines);
    let builtins = BuiltinTextures::new();
    let camera = Camera::null(config.game_dimensions());
    let scene = RenderContext::with_camera(camera.clone());

    let frames = dancer_frames();
    let mut dancer = Sprite::with_options(
        frames[0].texture.clone(),
        Position::new(400.0, 300.0),
        &scene,
        (&config).into(),
    );
    {
        let anim = dancer.animation_mut();
        anim.add_by_indices("idle", &frames, &[0, 1, 2, 3], config.default_fps, true, None, &["idle"])?;
        anim.add_by_indices(
            "left",
            &frames,
            &[4, 5, 6, 7],
            config.default_fps,
            false,
            Some(Position::new(-6.0, 0.0)),
            &["sing"],
        )?;
        for def in &config.animations {
            def.register(anim, &frames, config.default_fps)?;
        }
        anim.play("idle", false)?;
    }

    let mut strip = SpriteContainer::new(Position::new(100.0, 50.0), &scene);
    for lane in 0..4 {
        let mut note = Sprite::with_fallback(&builtins, Position::new(40.0 * lane as f32, 0.0), &scene);
        note.set_opacity(0.0);
        strip.add(note);
    }
    strip.set_opacity(0.0);
    strip.start_tween(Ease::OutCubic, &[(TweenAttr::Opacity, 255.0)], 1.0, None)?;

    let mut marker = Sprite::with_fallback(&builtins, Position::new(600.0, 80.0), &scene);
    marker.make_rect(&builtins, tempo_engine::Color::rgb(255, 64, 64), 200.0, 32.0, 8.0);
    let tx = pane_tx.clone();
    marker.start_flicker(
        1.5,
        0.1,
        true,
        Some(Box::new(move || tx.send("marker settled"))),
    )?;

    let mut elapsed = 0.0;
    let mut sang = false;
    while elapsed < seconds {
        elapsed += STEP;
        if !sang && elapsed >= 1.0 {
            dancer.animation_mut().play("left", true)?;
            sang = true;
        }
        if dancer.animation().current_name() == Some("left") && !dancer.animation().is_playing() {
            dancer.animation_mut().play("idle", false)?;
            pane_tx.send("back to idle");
        }
        camera.update();
        dancer.update(STEP);
        strip.update(STEP);
        marker.update(STEP);

        pane.drain();
        pane.set_stats(FrameStats {
            fps: 1.0 / STEP,
            draw_calls: scene.batch().draw_calls(camera.id()).len(),
            quads: scene.batch().quad_count(),
        });
    }

    println!("{}", pane.text());
    for (i, call) in scene.batch().draw_calls(camera.id()).iter().enumerate() {
        println!(
            "call {i}: {} indices from {}, {} state switches",
            call.index_count,
            call.index_start,
            call.switches.len()
        );
    }
    log::info!(
        "dancer ended on frame {:?} with offset {:?}",
        dancer.animation().frame_index(),
        dancer.offset()
    );
    Ok(())
}
