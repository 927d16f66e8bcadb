use clap::{App};

use pbxproj::Pbxproj;

use crate::ctx::{Command, Context, RunResult};

pub struct Check;

impl Command for Check {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Parses the project and verifies that every reference resolves")
  }

  fn run(&self, ctx: &Context) -> RunResult {
    let doc = Pbxproj::open(&ctx.path)?;
    doc.validate()?;
    println!("ok: {} objects, all references resolve", doc.store.len());
    Ok(())
  }
}
