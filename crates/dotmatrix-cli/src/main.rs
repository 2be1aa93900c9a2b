mod config;

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, ValueEnum};
use dotmatrix_core::{Buttons, Console, ConsoleConfig, ConsoleError, ppu::Layer};
use env_logger::Env;
use log::{debug, error, info};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to encode PNG: {0}")]
    Png(#[from] png::EncodingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ButtonArg {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayerArg {
    Screen,
    Background,
    Window,
    Sprites,
    BgMap,
    WindowMap,
    Tileset,
}

#[derive(Parser)]
#[command(version, about = "Run a Game Boy ROM headlessly")]
struct Args {
    /// Path to ROM file
    rom: PathBuf,

    /// Path to a 256-byte DMG boot ROM
    #[arg(long)]
    boot_rom: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long)]
    frames: Option<u32>,

    /// Buttons held down for the whole run
    #[arg(long, value_enum, num_args = 1..)]
    hold: Vec<ButtonArg>,

    /// Write the selected layer to a PNG after the last frame
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Layer captured by --screenshot
    #[arg(long, value_enum, default_value_t = LayerArg::Screen)]
    layer: LayerArg,

    /// Config file (defaults to $XDG_CONFIG_HOME/dotmatrix/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at trace level
    #[arg(long)]
    trace: bool,

    /// Print bytes sent over the serial port
    #[arg(long)]
    serial: bool,
}

fn held_buttons(hold: &[ButtonArg]) -> Buttons {
    let mut buttons = Buttons::default();
    for button in hold {
        match button {
            ButtonArg::Up => buttons.up = true,
            ButtonArg::Down => buttons.down = true,
            ButtonArg::Left => buttons.left = true,
            ButtonArg::Right => buttons.right = true,
            ButtonArg::A => buttons.a = true,
            ButtonArg::B => buttons.b = true,
            ButtonArg::Start => buttons.start = true,
            ButtonArg::Select => buttons.select = true,
        }
    }
    buttons
}

fn select_layer(console: &Console, layer: LayerArg) -> &Layer {
    match layer {
        LayerArg::Screen => console.screen(),
        LayerArg::Background => console.background(),
        LayerArg::Window => console.window(),
        LayerArg::Sprites => console.sprites(),
        LayerArg::BgMap => console.background_map(),
        LayerArg::WindowMap => console.window_map(),
        LayerArg::Tileset => console.tileset(),
    }
}

fn layer_to_rgb(layer: &Layer, palette: &[[u8; 3]; 4]) -> Vec<u8> {
    layer
        .shades()
        .iter()
        .flat_map(|&shade| palette[(shade & 0x03) as usize])
        .collect()
}

fn write_png(path: &Path, width: u32, height: u32, rgb: &[u8]) -> Result<(), CliError> {
    let file = File::create(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgb)?;
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let cfg = config::load_from_file(&config_path);

    let boot_rom = match args.boot_rom.as_ref().or(cfg.emulation.boot_rom.as_ref()) {
        Some(path) => Some(std::fs::read(path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?),
        None => None,
    };

    let mut console = Console::with_config(ConsoleConfig {
        boot_rom,
        sprite_order: cfg.emulation.sprite_order.into(),
        audio_sample_rate: cfg.audio.sample_rate,
    })?;
    console.load_rom_file(&args.rom)?;
    console.power_on();

    let frames = args.frames.unwrap_or(cfg.emulation.frames);
    let buttons = held_buttons(&args.hold);
    let mut cycles = 0u64;
    for _ in 0..frames {
        cycles += console.run_frame(buttons).cycles as u64;
        // Samples have nowhere to go without an audio device.
        console.take_audio_samples();
        if console.ram_flush_requested() {
            debug!("Game disabled cartridge RAM");
            console.clear_ram_flush_request();
        }
    }
    info!("Ran {frames} frames ({cycles} cycles)");

    if args.serial {
        let output = console.take_serial_output();
        println!("{}", String::from_utf8_lossy(&output));
    }

    if let Some(path) = &args.screenshot {
        let layer = select_layer(&console, args.layer);
        let rgb = layer_to_rgb(layer, &cfg.video.rgb_palette());
        write_png(path, layer.width() as u32, layer.height() as u32, &rgb)?;
        info!("Wrote {:?} layer to {}", args.layer, path.display());
    }

    console.power_off()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.trace { "trace" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
