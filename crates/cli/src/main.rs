#![deny(unsafe_code)]
//! CLI binary for the charge-field point-charge renderer.
//!
//! Subcommands:
//! - `render`: build a scene, integrate it for N frames, write a PNG
//! - `simulate`: integrate a scene and print the final particles
//! - `list`: print available kernels, integration methods and presets

mod error;

use charge_field_core::{Engine, Particle, Preset, Scene};
use charge_field_physics::{ChargeSystem, IntegrationMethod};
use charge_field_render::{snapshot, Kernel, RenderParams};
use clap::{ArgAction, Args, Parser, Subcommand};
use error::CliError;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "charge-field", about = "Point-charge field renderer and simulator")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Where the scene comes from, plus overrides applied on top of it.
#[derive(Args, Debug)]
struct SceneArgs {
    /// Preset name (dipole, quadrupole, ring, random).
    #[arg(short, long, default_value = "dipole")]
    preset: String,

    /// Scene JSON file; takes precedence over --preset.
    #[arg(long, conflicts_with = "particles")]
    scene: Option<PathBuf>,

    /// Particle records as a JSON array, replacing the preset's particles.
    #[arg(long)]
    particles: Option<String>,

    /// Canvas width in pixels.
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Canvas height in pixels.
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// PRNG seed for the random preset.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Frames to integrate before output.
    #[arg(short, long)]
    frames: Option<usize>,

    /// Physics parameters as a JSON object, merged over the scene's.
    #[arg(long)]
    physics: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Integrate a scene and write a PNG snapshot of its field.
    Render {
        #[command(flatten)]
        scene: SceneArgs,

        /// Field kernel (scalar, lanes).
        #[arg(short, long)]
        kernel: Option<String>,

        /// Grid divisions across the box; 0 disables the grid.
        #[arg(short, long)]
        grid: Option<usize>,

        /// Render parameters as a JSON object, merged over the scene's.
        #[arg(long)]
        render: Option<String>,

        /// Output file path.
        #[arg(short, long, default_value = "output.png")]
        output: PathBuf,
    },
    /// Integrate a scene and print the final particle records.
    Simulate {
        #[command(flatten)]
        scene: SceneArgs,

        /// Also write the final state as a scene JSON file.
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// List available kernels, integration methods and presets.
    List,
}

/// Default canvas side for presets.
const DEFAULT_SIZE: usize = 256;

fn parse_json_flag(flag: &str, text: &str) -> Result<Value, CliError> {
    serde_json::from_str(text).map_err(|e| CliError::Input(format!("invalid --{flag} JSON: {e}")))
}

/// Copies every key of `overrides` into `target`, which must be an object.
fn merge_object(target: &mut Value, overrides: Value) -> Result<(), CliError> {
    let Value::Object(overrides) = overrides else {
        return Err(CliError::Input("parameter overrides must be a JSON object".into()));
    };
    match target {
        Value::Object(map) => map.extend(overrides),
        other => *other = Value::Object(overrides),
    }
    Ok(())
}

fn read_scene(path: &Path) -> Result<Scene, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("invalid scene file {}: {e}", path.display())))
}

/// Builds the scene described by `args` and checks it.
fn load_scene(args: &SceneArgs) -> Result<Scene, CliError> {
    let mut scene = match &args.scene {
        Some(path) => read_scene(path)?,
        None => Scene::from_preset(&args.preset, DEFAULT_SIZE, DEFAULT_SIZE, args.seed)?,
    };
    if let Some(text) = &args.particles {
        scene.particles = serde_json::from_str::<Vec<Particle>>(text)
            .map_err(|e| CliError::Input(format!("invalid --particles JSON: {e}")))?;
    }
    if let Some(width) = args.width {
        scene.width = width;
    }
    if let Some(height) = args.height {
        scene.height = height;
    }
    if let Some(frames) = args.frames {
        scene.frames = frames;
    }
    if let Some(text) = &args.physics {
        merge_object(&mut scene.physics, parse_json_flag("physics", text)?)?;
    }
    scene.validate()?;
    log::info!(
        "scene: {}x{}, {} particles, {} frames",
        scene.width,
        scene.height,
        scene.particles.len(),
        scene.frames
    );
    Ok(scene)
}

/// Runs the scene's frames and returns the evolved system.
fn integrate(scene: &Scene) -> Result<ChargeSystem, CliError> {
    let mut system = ChargeSystem::from_scene(scene)?;
    (0..scene.frames).try_for_each(|_| system.step())?;
    Ok(system)
}

/// Writes `scene` as JSON. A run that diverged to non-finite values is
/// refused instead of being written as `null`s that cannot be read back.
fn save_scene(scene: &Scene, path: &Path) -> Result<(), CliError> {
    scene.validate()?;
    std::fs::write(path, serde_json::to_string_pretty(scene)?)
        .map_err(|e| CliError::Io(format!("cannot write {}: {e}", path.display())))?;
    log::info!("saved evolved scene to {}", path.display());
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let kernels = Kernel::list_kernels();
            let methods = IntegrationMethod::list_names();
            let presets = Preset::list_names();
            if cli.json {
                print_json(&json!({
                    "kernels": kernels,
                    "methods": methods,
                    "presets": presets,
                }))?;
            } else {
                println!("Kernels:");
                println!("  {}", kernels.join(", "));
                println!("Integration methods:");
                println!("  {}", methods.join(", "));
                println!("Presets:");
                for name in presets {
                    println!("  {name}");
                }
            }
        }
        Command::Render {
            scene: args,
            kernel,
            grid,
            render,
            output,
        } => {
            let mut scene = load_scene(&args)?;
            if let Some(text) = render {
                merge_object(&mut scene.render, parse_json_flag("render", &text)?)?;
            }
            if let Some(kernel) = kernel {
                merge_object(&mut scene.render, json!({ "kernel": kernel }))?;
            }
            if let Some(grid) = grid {
                merge_object(&mut scene.render, json!({ "grid": grid }))?;
            }
            let params = RenderParams::from_json(&scene.render)?;
            let system = integrate(&scene)?;

            snapshot::render_png(
                scene.width,
                scene.height,
                system.particles(),
                &params,
                &output,
            )?;

            if cli.json {
                print_json(&json!({
                    "width": scene.width,
                    "height": scene.height,
                    "particles": scene.particles.len(),
                    "frames": scene.frames,
                    "seed": scene.seed,
                    "physics": system.params(),
                    "render": params.to_json(),
                    "output": output.display().to_string(),
                }))?;
            } else {
                eprintln!(
                    "rendered {} particles ({}x{}, {} frames, {} kernel) -> {}",
                    scene.particles.len(),
                    scene.width,
                    scene.height,
                    scene.frames,
                    params.kernel.name(),
                    output.display()
                );
            }
        }
        Command::Simulate { scene: args, save } => {
            let scene = load_scene(&args)?;
            let system = integrate(&scene)?;
            let particles = system.particles();
            let records = particles.records();

            if let Some(path) = &save {
                let evolved = Scene {
                    particles: records.clone(),
                    frames: 0,
                    ..scene.clone()
                };
                save_scene(&evolved, path)?;
            }

            let (px, py) = particles.momentum();
            if cli.json {
                print_json(&json!({
                    "frames": system.frames(),
                    "physics": system.params(),
                    "momentum": [px, py],
                    "kinetic_energy": particles.kinetic_energy(),
                    "particles": records,
                }))?;
            } else {
                println!(
                    "{:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                    "q", "m", "x", "y", "vx", "vy"
                );
                for p in &records {
                    println!(
                        "{:>10.3} {:>10.3} {:>10.5} {:>10.5} {:>10.5} {:>10.5}",
                        p.q, p.m, p.x, p.y, p.vx, p.vy
                    );
                }
                eprintln!(
                    "{} frames, momentum ({px:.5}, {py:.5}), kinetic energy {:.5}",
                    system.frames(),
                    particles.kinetic_energy()
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
