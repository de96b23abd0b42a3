mod animation;
mod config;
mod control;
mod display;
mod error;
mod frame;
mod marble;
mod math3d;
mod mqtt;
mod noise;
mod palette;
mod renderer;
mod scene;
mod texture;
mod util;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use sdl2::keyboard::Keycode;

use config::{MarbleConfig, DEFAULT_CONFIG_PATH};
use control::{Command, Controller};
use display::{Display, InputEvent, PixelBuffer, RenderTarget};
use error::MarbleError;
use frame::ParameterUpdater;
use marble::{MarbleMaterial, MarbleTunables, RenderParameters};
use mqtt::MqttClient;
use renderer::{probe_pixel, render_frame, sphere_hit_at};
use scene::Scene;
use texture::Texture;
use util::{FpsCounter, FrameStats};

/// Iterations added or removed per Up/Down key press
const ITERATION_KEY_STEP: u32 = 8;
/// Simulated frame time for headless benchmarks
const BENCH_DT: f32 = 1.0 / 60.0;

#[derive(Parser)]
#[command(name = "marble", about = "Software-rendered volumetric marble sphere")]
struct Args {
    /// Config file (JSON). Missing file means defaults.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Window width
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Window height
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Disable VSync for uncapped framerate
    #[arg(long)]
    no_vsync: bool,

    /// March iterations per fragment
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Render this many frames off-screen, log timing statistics and exit
    #[arg(long, value_name = "FRAMES")]
    bench: Option<u32>,

    /// MQTT broker host for remote commands
    #[arg(long)]
    mqtt_host: Option<String>,

    /// MQTT topic to subscribe to
    #[arg(long)]
    mqtt_topic: Option<String>,

    /// Do not open the Unix control socket
    #[arg(long)]
    no_socket: bool,
}

impl Args {
    /// Command-line values win over the config file
    fn apply(&self, config: &mut MarbleConfig) {
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        if self.no_vsync {
            config.window.vsync = false;
        }
        if let Some(iterations) = self.iterations {
            config.tunables.iterations = iterations;
        }
        if let Some(host) = &self.mqtt_host {
            config.remote.mqtt_host = Some(host.clone());
        }
        if let Some(topic) = &self.mqtt_topic {
            config.remote.mqtt_topic = topic.clone();
        }
        if self.no_socket {
            config.remote.socket = None;
        }
    }
}

/// Keyboard shortcuts share the remote command set
fn key_command(key: Keycode, tunables: &MarbleTunables) -> Option<Command> {
    let command = match key {
        Keycode::Space => Command::Step,
        Keycode::R => Command::Reset,
        Keycode::F => Command::ToggleFps,
        Keycode::S => Command::Save,
        Keycode::Escape => Command::Quit,
        Keycode::P => Command::Probe,
        Keycode::Up => Command::Set {
            name: "iterations".into(),
            value: tunables.iterations.saturating_add(ITERATION_KEY_STEP) as f32,
        },
        Keycode::Down => Command::Set {
            name: "iterations".into(),
            value: tunables.iterations.saturating_sub(ITERATION_KEY_STEP).max(1) as f32,
        },
        _ => return None,
    };
    Some(command)
}

/// Mutable application state touched by commands
struct App {
    config: MarbleConfig,
    config_path: PathBuf,
    scene: Scene,
    show_fps: bool,
    probe_requested: bool,
    /// Last pointer position in window pixels
    pointer: Option<(i32, i32)>,
}

impl App {
    /// Returns false when the application should quit
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Step => self.scene.advance_step(),
            Command::Reset => self.scene.reset_step(),
            Command::ToggleFps => {
                self.show_fps = !self.show_fps;
                log::info!("FPS logging {}", if self.show_fps { "on" } else { "off" });
            },
            Command::Save => {
                if let Err(e) = self.config.save(&self.config_path) {
                    log::error!("failed to save config: {e}");
                }
            },
            Command::Quit => return false,
            Command::Probe => self.probe_requested = true,
            Command::Set { name, value } => match self.config.tunables.set(&name, value) {
                Ok(()) => log::info!("set {name} = {value}"),
                Err(e) => log::warn!("rejected: {e}"),
            },
        }
        true
    }
}

fn connect_remotes(config: &MarbleConfig) -> (Option<Controller>, Option<MqttClient>) {
    let controller = config.remote.socket.as_deref().and_then(|path| {
        Controller::new(path)
            .map_err(|e| log::warn!("remote control disabled: {e}"))
            .ok()
    });
    let mqtt = config.remote.mqtt_host.as_deref().and_then(|host| {
        MqttClient::new(host, &config.remote.mqtt_topic)
            .map_err(|e| log::warn!("MQTT disabled: {e}"))
            .ok()
    });
    (controller, mqtt)
}

fn run_bench(
    frames: u32,
    app: &mut App,
    material: &mut MarbleMaterial,
    updater: &mut ParameterUpdater,
) -> Result<(), MarbleError> {
    let (width, height) = (app.config.window.width, app.config.window.height);
    let mut buffer = PixelBuffer::with_size(width, height);
    let mut stats = FrameStats::new(frames as usize);
    log::info!("benchmark: {frames} frames at {width}x{height}");

    for i in 0..frames {
        // Walk the palette so colour transitions are part of the measurement
        if i % 120 == 119 {
            app.scene.advance_step();
        }
        app.scene.advance(BENCH_DT);

        let start = Instant::now();
        updater.apply(material.params_mut(), &app.scene.frame_inputs(app.config.tunables))?;
        render_frame(&mut buffer, material, &app.scene.camera(), updater.background_hsl());
        stats.record(start.elapsed().as_secs_f32());
    }

    log::info!("benchmark: {}", stats.summary());
    Ok(())
}

fn run_interactive(
    app: &mut App,
    material: &mut MarbleMaterial,
    updater: &mut ParameterUpdater,
) -> Result<(), MarbleError> {
    let window = app.config.window.clone();
    let (mut display, texture_creator) =
        Display::with_options("marble", window.width, window.height, window.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, window.width, window.height)?;
    let mut buffer = PixelBuffer::with_size(window.width, window.height);
    let (controller, mqtt) = connect_remotes(&app.config);

    // FPS counter with 60 sample rolling average
    let mut fps_counter = FpsCounter::new(60);
    let mut frame: u64 = 0;

    log::info!("Resolution: {}x{}", window.width, window.height);
    if window.vsync {
        log::info!("VSync: ON. Use --no-vsync for uncapped.");
    } else {
        log::info!("VSync: OFF (uncapped framerate)");
    }
    log::info!("Controls:");
    log::info!("  Click/Space - Next palette step");
    log::info!("  R           - Reset palette");
    log::info!("  Up/Down     - More/fewer march iterations");
    log::info!("  F           - Toggle FPS logging");
    log::info!("  S           - Save config");
    log::info!("  Escape      - Quit");

    'main: loop {
        let dt = fps_counter.tick();
        let (w, h) = (display.width(), display.height());

        // Picking uses last frame's transforms, which is what is on screen
        let camera = app.scene.camera();
        let params = material.params();
        let on_sphere =
            |x: i32, y: i32| sphere_hit_at(&camera, params, x as f32, y as f32, w, h);

        let mut commands = Vec::new();
        for event in display.poll_events() {
            match event {
                InputEvent::Quit => break 'main,
                InputEvent::KeyDown(key) => {
                    commands.extend(key_command(key, &app.config.tunables));
                },
                InputEvent::PointerMove { x, y } => {
                    app.pointer = Some((x, y));
                    let hit = on_sphere(x, y);
                    app.scene.pointer_moved(hit);
                },
                InputEvent::PointerDown { x, y } => {
                    let hit = on_sphere(x, y);
                    app.scene.pointer_down(hit);
                },
                InputEvent::PointerUp { x, y } => {
                    let hit = on_sphere(x, y);
                    app.scene.pointer_up(hit);
                },
                InputEvent::PointerLeave => {
                    app.pointer = None;
                    app.scene.pointer_left();
                },
            }
        }
        if let Some(controller) = &controller {
            commands.extend(controller.poll());
        }
        if let Some(mqtt) = &mqtt {
            commands.extend(mqtt.poll());
        }
        for command in commands {
            if !app.handle_command(command) {
                break 'main;
            }
        }

        app.scene.advance(dt);
        let inputs = app.scene.frame_inputs(app.config.tunables);
        match updater.apply(material.params_mut(), &inputs) {
            Ok(()) => {
                render_frame(&mut buffer, material, &app.scene.camera(), updater.background_hsl());
            },
            // Previous frame stays on screen
            Err(e) => log::warn!("skipping frame: {e}"),
        }

        if std::mem::take(&mut app.probe_requested) {
            log_probe(app, material, w, h);
        }

        frame += 1;
        if app.show_fps && frame % 60 == 0 {
            log::info!("{}", fps_counter.stats().summary());
        }

        display.present(&mut target, &buffer)?;
    }

    Ok(())
}

/// Log every march step behind the pixel under the pointer (or the centre)
fn log_probe(app: &App, material: &MarbleMaterial, width: u32, height: u32) {
    let (x, y) = app
        .pointer
        .unwrap_or((width as i32 / 2, height as i32 / 2));
    let camera = app.scene.camera();
    let Some(steps) = probe_pixel(material, &camera, x as f32, y as f32, width, height) else {
        log::info!("probe ({x}, {y}): background");
        return;
    };
    log::info!("probe ({x}, {y}): {} steps", steps.len());
    for step in &steps {
        log::info!(
            "  #{:<3} pos ({:+.3}, {:+.3}, {:+.3}) r {:.3} density {:.3} cutoff {:.3} mask {:.3}",
            step.index,
            step.position.x,
            step.position.y,
            step.position.z,
            step.depth_frac,
            step.density,
            step.cutoff,
            step.mask
        );
    }
}

fn build_material(config: &MarbleConfig) -> Result<MarbleMaterial, MarbleError> {
    let start = Instant::now();
    let size = config.textures.size;
    let seed = config.textures.seed;
    let noise_map = Texture::density_map(size, seed);
    let displacement_map = Texture::displacement_map(size, seed.wrapping_add(1));
    log::debug!(
        "generated {}x{} textures in {:?}",
        noise_map.width(),
        noise_map.height(),
        start.elapsed()
    );
    Ok(MarbleMaterial::new(
        RenderParameters::new(config.tunables)?,
        noise_map,
        displacement_map,
    ))
}

fn config_summary(config: &MarbleConfig, path: &Path) {
    let t = &config.tunables;
    log::info!("=== marble ===");
    log::info!("config: {}", path.display());
    log::info!(
        "iterations {} max_depth {} smoothing {} refraction {} displacement {}",
        t.iterations,
        t.max_depth,
        t.smoothing,
        t.refraction,
        t.displacement_strength
    );
}

fn main() -> Result<(), MarbleError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = MarbleConfig::load(&args.config)?;
    args.apply(&mut config);
    config.validate()?;
    config_summary(&config, &args.config);

    let mut material = build_material(&config)?;
    let scene = Scene::new();
    let mut updater = ParameterUpdater::new(scene.step());
    let mut app = App {
        config,
        config_path: args.config.clone(),
        scene,
        show_fps: false,
        probe_requested: false,
        pointer: None,
    };

    match args.bench {
        Some(frames) => run_bench(frames, &mut app, &mut material, &mut updater),
        None => run_interactive(&mut app, &mut material, &mut updater),
    }
}
