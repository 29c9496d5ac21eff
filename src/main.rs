use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use solar_sim::{ui, Config};
use std::io;

/// Animated 3D solar system viewer
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
  /// Seed for the starfield and the initial orbital phases
  #[arg(short, long)]
  seed: Option<u64>,
  /// Run the simulation without a window
  #[arg(long, default_value_t = false)]
  headless: bool,
  /// Frames to simulate in headless mode (0 runs until Ctrl-C)
  #[arg(long, default_value_t = 600)]
  frames: u64,
  /// Start with the light theme
  #[arg(long, default_value_t = false)]
  light: bool,
  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Generate shell completion scripts
  Completions {
    /// The shell to generate the script for
    #[arg(value_enum)]
    shell: Shell,
  },
}

fn main() {
  let args = Args::parse();

  if let Some(Commands::Completions { shell }) = args.command {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    return;
  }

  env_logger::Builder::from_env(
    env_logger::Env::default().default_filter_or("info,wgpu_core=warn,wgpu_hal=warn,naga=warn"),
  )
  .init();

  let config = Config {
    seed: args.seed,
    light_theme: args.light,
    ..Config::default()
  };
  if let Err(err) = solar_sim::state::run(config, args.headless, args.frames) {
    log::error!("{err:#}");
    eprintln!("{}", ui::error_banner(&format!("{err:#}")));
    std::process::exit(1);
  }
}
