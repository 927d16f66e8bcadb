use clap::{App, ArgMatches};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub trait Command {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b>;

  fn run(&self, ctx: &Context) -> RunResult;
}

pub type DynResult<T> = Result<T, Box<dyn std::error::Error>>;
pub type RunResult    = DynResult<()>;

pub type Commands = BTreeMap<&'static str, Box<dyn Command>>;

pub struct Context<'a> {
  pub args:   &'a ArgMatches<'a>,
  pub config: &'a Config,

  /// The `.xcodeproj` bundle or `project.pbxproj` file being operated on.
  pub path: PathBuf
}

impl<'a> Context<'a> {
  /// Matches for the currently running subcommand.
  pub fn cmd_args(&self, name: &str) -> Option<&ArgMatches<'a>> {
    self.args.subcommand_matches(name)
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Env {
  /// Log filter, e.g. `debug` or `pbxproj=trace`.
  pub log: String
}

/// Output settings, read from `Pbx.toml` when present.
#[derive(Debug, Deserialize)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct Config {
  /// Replace an existing project file whose contents differ.
  pub overwrite: bool,

  /// Also maintain the `project.xcworkspace` sidecar when rewriting.
  pub workspace: bool
}

impl Default for Config {
  fn default() -> Self {
    Config {
      overwrite: true,
      workspace: false
    }
  }
}
