use bevy::prelude::*;
use bevy::tasks::{ComputeTaskPool, TaskPoolBuilder};
use micromegas_tracing::dispatch::{
    flush_log_buffer, flush_metrics_buffer, flush_thread_buffer, init_thread_stream,
};
use micromegas_tracing::levels::{self, LevelFilter};
use micromegas_tracing::prelude::*;
use micromegas_tracing::prelude::info;
use micromegas_tracing::test_utils::init_in_memory_tracing;
use pacman3d::components::Pellet;
use pacman3d::plugins::telemetry::TelemetryPlugin;
use pacman3d::resources::GameConfig;
use serial_test::serial;

fn init_task_pool() {
    ComputeTaskPool::get_or_init(|| {
        TaskPoolBuilder::new()
            .on_thread_spawn(|| {
                init_thread_stream();
            })
            .on_thread_destroy(|| {
                flush_thread_buffer();
                micromegas_tracing::dispatch::unregister_thread_stream();
            })
            .build()
    });
}

/// The telemetry plugin records a frame-time metric and two population
/// metrics every frame.
#[test]
#[serial]
fn telemetry_plugin_emits_frame_metrics() {
    let guard = init_in_memory_tracing();
    levels::set_max_level(LevelFilter::Trace);
    init_thread_stream();
    init_task_pool();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(TelemetryPlugin);
    for _ in 0..3 {
        app.world_mut().spawn(Pellet);
    }
    for _ in 0..5 {
        app.update();
    }

    flush_thread_buffer();
    flush_metrics_buffer();

    let sink = &guard.sink;
    // 3 metrics x 5 frames
    assert!(
        sink.total_metrics_events() >= 15,
        "expected >= 15 metrics events, got {}",
        sink.total_metrics_events()
    );
}

/// Falling back to the default config is reported in the log.
#[test]
#[serial]
fn missing_config_is_logged() {
    let guard = init_in_memory_tracing();
    levels::set_max_level(LevelFilter::Trace);

    let cfg = GameConfig::load_or_default("no/such/config.json");
    assert_eq!(cfg, GameConfig::default());

    flush_log_buffer();
    assert!(
        guard.sink.total_log_events() >= 1,
        "expected the fallback warning to be logged"
    );
}

/// Spans are dropped, not fatal, on threads that never registered a stream.
#[test]
#[serial]
fn spans_silently_dropped_without_thread_init() {
    let guard = init_in_memory_tracing();
    levels::set_max_level(LevelFilter::Trace);

    let handle = std::thread::spawn(|| {
        span_scope!("ghost_tick");
        info!("ghost tick from an unregistered thread");
    });
    handle.join().unwrap();

    flush_log_buffer();

    let sink = &guard.sink;
    assert!(sink.total_log_events() >= 1);
    assert_eq!(sink.total_thread_events(), 0);
}
