// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vidout::Config;

mod cli;

#[derive(Parser)]
#[command(name = "vidout")]
#[command(about = "Video output drivers and codec configuration tools")]
#[command(version = vidout::constants::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available video output drivers
    Drivers,

    /// List the codecs of codecs.conf
    Codecs {
        /// List audio codecs instead of video codecs
        #[arg(short, long)]
        audio: bool,

        /// codecs.conf to read (default: the user file, else the builtin table)
        #[arg(long)]
        codecs_conf: Option<PathBuf>,
    },

    /// Show which codecs would be tried for a FourCC or format id
    FindCodec {
        /// Four characters (DIVX) or a number (0x55)
        code: String,

        /// Look in the audio codecs
        #[arg(short, long)]
        audio: bool,

        /// Also list codecs that do not declare the code
        #[arg(short, long)]
        force: bool,

        #[arg(long)]
        codecs_conf: Option<PathBuf>,
    },

    /// Show the settings file, or change settings with --set
    Config {
        /// Setting to change and save, e.g. --set fps=30 (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Render frames through a video output driver
    Play {
        /// Driver list, e.g. "pnm:pgm:outdir=frames,null" (trailing ',' adds autoprobe drivers)
        #[arg(long)]
        vo: Option<String>,

        /// "test" for the test pattern, or a file of raw frames
        #[arg(short, long, default_value = "test")]
        source: String,

        /// Image format of a raw file (e.g. i420, yv12, rgb24)
        #[arg(long)]
        format: Option<String>,

        /// Picture size as WIDTHxHEIGHT
        #[arg(long, value_parser = cli::parse_size)]
        size: Option<(u32, u32)>,

        /// Stop after this many frames
        #[arg(short = 'n', long)]
        frames: Option<u64>,

        #[arg(long)]
        fps: Option<u32>,

        /// Deliver planar pictures in this many slices
        #[arg(long, default_value = "1")]
        slices: u32,

        /// Keep the frame rate instead of rendering as fast as possible
        #[arg(long)]
        pace: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=vidout=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_filter))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Drivers => cli::list_video_drivers(),
        Commands::Config { set } => cli::configure(config, &set),
        Commands::Codecs { audio, codecs_conf } => cli::list_codecs(&config, audio, codecs_conf),
        Commands::FindCodec {
            code,
            audio,
            force,
            codecs_conf,
        } => cli::find_codec(&config, &code, audio, force, codecs_conf),
        Commands::Play {
            vo,
            source,
            format,
            size,
            frames,
            fps,
            slices,
            pace,
        } => cli::play(
            &config,
            cli::PlayArgs {
                vo,
                source,
                format,
                size,
                frames,
                fps,
                slices,
                pace,
            },
        ),
    }
}
