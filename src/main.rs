use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::tasks::{ComputeTaskPool, TaskPoolBuilder};
use bevy::window::WindowResolution;
use micromegas_telemetry_sink::TelemetryGuardBuilder;
use micromegas_telemetry_sink::tracing_interop::TracingCaptureLayer;
use micromegas_tracing::dispatch::{flush_thread_buffer, init_thread_stream, unregister_thread_stream};
use micromegas_tracing::levels::LevelFilter;
use micromegas_tracing::prelude::info;
use pacman3d::tracing_bridge::ScheduleSpanBridge;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

fn main() {
    // Spans need MICROMEGAS_ENABLE_CPU_TRACING=true; logs and metrics are always on.
    let _telemetry_guard = TelemetryGuardBuilder::default()
        .with_install_tracing_capture(false)
        .build()
        .expect("failed to initialize telemetry");

    info!("Pacman3D starting");

    // Must be global before Bevy starts so schedule spans reach Micromegas.
    let log_layer = TracingCaptureLayer {
        max_level: LevelFilter::Info,
    };
    let subscriber = Registry::default()
        .with(ScheduleSpanBridge)
        .with(log_layer);
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    // TaskPoolPlugin skips its own init when the pool already exists.
    ComputeTaskPool::get_or_init(|| {
        TaskPoolBuilder::new()
            .on_thread_spawn(|| {
                init_thread_stream();
            })
            .on_thread_destroy(|| {
                flush_thread_buffer();
                unregister_thread_stream();
            })
            .build()
    });

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.1)))
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Pacman3D".to_string(),
                        resolution: WindowResolution::new(1000, 800),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .add_plugins(pacman3d::Pacman3dPlugin)
        .run();
}
