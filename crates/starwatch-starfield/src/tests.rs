use starwatch_config::StarfieldConfig;
use starwatch_render::{RenderError, RenderSurface, SurfaceSize};

use crate::error::StarfieldError;
use crate::lifecycle::{LoopControl, start, stop};
use crate::testing::FakeHost;

const DT: f64 = 1.0 / 60.0;

fn seeded_config(seed: u64) -> StarfieldConfig {
    StarfieldConfig {
        seed: Some(seed),
        ..StarfieldConfig::default()
    }
}

#[test]
fn test_mount_draws_three_layers_and_no_stars() {
    let mut host = FakeHost::new();
    let handle = start(&mut host, 800, 600, &seeded_config(1)).unwrap();
    let animation = handle.animation_loop();

    assert_eq!(animation.tick(0.0), LoopControl::Continue);

    handle.with_driver(|driver| {
        assert_eq!(driver.scene().layers.len(), 3);
        assert!(driver.scene().stars.is_empty());
        assert!(driver.spawn_timer_remaining() > 0.0);
    });

    let log = host.log.borrow();
    let counts: Vec<usize> = log.uploads.iter().map(|(_, _, n)| *n).collect();
    assert_eq!(counts, vec![1500, 750, 3000]);
    assert_eq!(log.frames.len(), 1);
    assert_eq!(log.frames[0].layers.len(), 3);
    assert!(log.frames[0].lines.is_empty());
}

#[test]
fn test_layers_share_one_sprite_upload() {
    let mut host = FakeHost::new();
    let handle = start(&mut host, 800, 600, &seeded_config(4)).unwrap();

    assert_eq!(host.log.borrow().sprites, vec![(64, 64)]);
    assert_eq!(host.log.borrow().uploads.len(), 3);
    stop(&mut host, handle);
}

#[test]
fn test_star_spawns_when_timer_runs_out() {
    let mut host = FakeHost::new();
    let handle = start(&mut host, 800, 600, &seeded_config(2)).unwrap();
    let animation = handle.animation_loop();
    animation.tick(0.0);

    let due = handle.with_driver(|driver| driver.spawn_timer_remaining());
    let (control, stats) = animation.tick_with_stats(due);
    assert_eq!(control, LoopControl::Continue);
    assert!(stats.unwrap().spawned);

    handle.with_driver(|driver| {
        let stars = &driver.scene().stars;
        assert_eq!(stars.len(), 1);
        assert_eq!(stars[0].star.elapsed(), 0.0);
        assert_eq!(stars[0].star.opacity(), 1.0);
        assert!((1.0..6.0).contains(&driver.spawn_timer_remaining()));
    });

    let log = host.log.borrow();
    let last = log.frames.last().unwrap();
    assert_eq!(last.lines.len(), 1);
    assert_eq!(last.lines[0].opacity, 1.0);
}

#[test]
fn test_star_fades_out_and_is_removed_at_expiry() {
    let mut host = FakeHost::new();
    let handle = start(&mut host, 800, 600, &seeded_config(3)).unwrap();
    let animation = handle.animation_loop();
    animation.tick(0.0);

    let mut t = handle.with_driver(|driver| driver.spawn_timer_remaining());
    animation.tick(t);
    let (line, max_lifetime) = handle.with_driver(|driver| {
        let active = &driver.scene().stars[0];
        (active.line, active.star.max_lifetime())
    });

    let mut last_opacity = None;
    let mut frames = 0;
    loop {
        t += DT;
        frames += 1;
        assert!(frames < 1000, "star never expired");
        animation.tick(t);

        let log = host.log.borrow();
        let drawn = log
            .frames
            .last()
            .unwrap()
            .lines
            .iter()
            .find(|draw| draw.handle == line)
            .copied();
        match drawn {
            Some(draw) => last_opacity = Some(draw.opacity),
            None => {
                assert!(log.removed_lines.contains(&line));
                assert!(!log.live_lines.contains_key(&line));
                break;
            }
        }
    }

    let last_opacity = last_opacity.unwrap();
    assert!(last_opacity >= 0.0);
    assert!(last_opacity as f64 <= DT / max_lifetime + 1e-6);
    handle.with_driver(|driver| {
        assert!(driver.scene().stars.iter().all(|active| active.line != line));
    });
}

#[test]
fn test_stop_releases_everything_and_detaches_listener() {
    let mut host = FakeHost::new();
    let handle = start(&mut host, 800, 600, &seeded_config(4)).unwrap();
    let animation = handle.animation_loop();
    animation.tick(0.0);
    let due = handle.with_driver(|driver| driver.spawn_timer_remaining());
    animation.tick(due);

    assert_eq!(host.resize(1024, 768), 1);
    assert_eq!(host.log.borrow().resizes.len(), 1);

    let report = stop(&mut host, handle);
    assert_eq!(report.layers_released, 3);
    assert_eq!(report.lines_removed, 1);
    assert!(report.listener_removed);
    assert!(report.surface_detached);
    assert_eq!(host.surfaces_detached, 1);

    {
        let log = host.log.borrow();
        assert!(log.live_layers.is_empty());
        assert!(log.live_lines.is_empty());
        assert_eq!(log.released_layers.len(), 3);
    }

    assert_eq!(host.resize(640, 480), 0);
    assert_eq!(host.log.borrow().resizes.len(), 1);

    let frames_before = host.log.borrow().frames.len();
    assert_eq!(animation.tick(due + 1.0), LoopControl::Stop);
    assert!(!animation.is_alive());
    assert_eq!(host.log.borrow().frames.len(), frames_before);
}

#[test]
fn test_resize_listener_updates_aspect_and_surface() {
    let mut host = FakeHost::new();
    let handle = start(&mut host, 800, 600, &seeded_config(5)).unwrap();

    host.resize(1920, 1080);

    handle.with_driver(|driver| {
        assert_eq!(driver.scene().camera.aspect_ratio, 1920.0 / 1080.0);
        assert_eq!(
            driver.surface().map(|surface| surface.size()),
            Some(SurfaceSize::new(1920, 1080))
        );
    });
    stop(&mut host, handle);
}

#[test]
fn test_failed_upload_releases_partial_mount() {
    let mut host = FakeHost {
        fail_upload_at: Some(2),
        ..FakeHost::new()
    };
    let result = start(&mut host, 800, 600, &seeded_config(6));

    assert!(matches!(
        result,
        Err(StarfieldError::Render(RenderError::OutOfMemory))
    ));
    let log = host.log.borrow();
    assert_eq!(log.released_layers.len(), 2);
    assert!(log.live_layers.is_empty());
    assert_eq!(host.surfaces_created, 1);
    assert_eq!(host.surfaces_detached, 1);
    assert!(host.listeners.is_empty());
}

#[test]
fn test_sprite_failure_allocates_nothing() {
    let mut host = FakeHost::new();
    let config = StarfieldConfig {
        sprite_size: 0,
        ..seeded_config(7)
    };
    let result = start(&mut host, 800, 600, &config);

    assert!(matches!(result, Err(StarfieldError::Sprite(_))));
    assert_eq!(host.surfaces_created, 0);
    assert!(host.listeners.is_empty());
}

#[test]
fn test_surface_creation_failure_is_reported() {
    let mut host = FakeHost {
        fail_create: true,
        ..FakeHost::new()
    };
    let result = start(&mut host, 800, 600, &seeded_config(8));
    assert!(matches!(
        result,
        Err(StarfieldError::Render(RenderError::NoAdapter))
    ));
    assert!(host.listeners.is_empty());
}

#[test]
fn test_same_seed_same_spawn_schedule() {
    let mut host_a = FakeHost::new();
    let mut host_b = FakeHost::new();
    let a = start(&mut host_a, 800, 600, &seeded_config(9)).unwrap();
    let b = start(&mut host_b, 800, 600, &seeded_config(9)).unwrap();

    let timer_a = a.with_driver(|driver| driver.spawn_timer_remaining());
    let timer_b = b.with_driver(|driver| driver.spawn_timer_remaining());
    assert_eq!(timer_a, timer_b);

    let first_a = a.with_driver(|driver| driver.scene().layers[0].layer.points()[0]);
    let first_b = b.with_driver(|driver| driver.scene().layers[0].layer.points()[0]);
    assert_eq!(first_a, first_b);
}

#[test]
fn test_dragging_through_handle() {
    let mut host = FakeHost::new();
    let handle = start(&mut host, 800, 600, &seeded_config(10)).unwrap();
    let animation = handle.animation_loop();

    handle.set_dragging(true);
    animation.tick(0.0);
    animation.tick(DT);
    handle.with_driver(|driver| assert_eq!(driver.scene().rotation, glam::Vec2::ZERO));

    handle.set_dragging(false);
    animation.tick(2.0 * DT);
    handle.with_driver(|driver| assert!(driver.scene().rotation.x > 0.0));
}
