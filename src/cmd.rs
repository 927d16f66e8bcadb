mod check;
mod fmt;
mod show;

use crate::ctx::Commands;

pub fn init() -> Commands {
  let mut commands = Commands::new();
  commands.insert("check", Box::new(check::Check));
  commands.insert("fmt",   Box::new(fmt::Fmt));
  commands.insert("show",  Box::new(show::Show));
  commands
}
