mod cmd;
mod ctx;

use clap::{Arg, App, SubCommand};
use std::fmt::Display;
use std::path::PathBuf;

fn main() {
  // Initialize.
  let commands = cmd::init();

  // Parse the environment variables.
  let env: ctx::Env = envy::prefixed("PBX_").from_env()
    .check(|| "Failed to parse environment variables");

  let filter = if env.log.is_empty() { "info".to_string() } else { env.log };
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();

  // Parse the command line.
  let args = App::new(env!("CARGO_PKG_NAME"))
    .version(env!("CARGO_PKG_VERSION"))
    .author(env!("CARGO_PKG_AUTHORS"))
    .about(env!("CARGO_PKG_DESCRIPTION"))
    .arg(Arg::with_name("PROJECT")
         .help("Path to the .xcodeproj bundle or project.pbxproj file")
         .required(true))
    .arg(Arg::with_name("config")
         .short("c")
         .long("config")
         .value_name("FILE")
         .help("Name of the output settings file")
         .takes_value(true))
    .subcommands(commands.iter().map(|(name, cmd)| {
      cmd.init(SubCommand::with_name(name))
    }))
    .get_matches();

  let path = PathBuf::from(args.value_of("PROJECT").unwrap());

  // Load the output settings, if a settings file is present.
  let config: ctx::Config = {
    let file = args.value_of("config").unwrap_or("Pbx.toml");
    match std::fs::read(file) {
      Ok(bytes) => toml::from_slice(&bytes)
        .check(|| format!("Failed to read the settings file ({})", file)),
      Err(_) => ctx::Config::default()
    }
  };

  // Execute the requested command.
  let ctx = ctx::Context {
    args:   &args,
    config: &config,
    path
  };

  let cmd_name = ctx.args.subcommand_name().unwrap_or("show");
  commands[cmd_name].run(&ctx)
    .check(|| format!("Failed to run command ({})", cmd_name));
}

trait Check {
  type R;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display;
}

impl<T, E> Check for Result<T, E> where E: Display {
  type R = T;
  fn check<F, S>(self, msg: F) -> Self::R where F: FnOnce() -> S, S: Display {
    match self {
      Ok (v) => v,
      Err(e) => fatal(format!("{}: {}", msg(), e))
    }
  }
}

fn fatal<S: Display>(msg: S) -> ! {
  eprintln!("{}", msg);
  std::process::exit(1)
}
