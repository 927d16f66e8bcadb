use std::fs;

use clap::{App, Arg};

use pbxproj::{Pbxproj, XCWorkspaceData};

use crate::ctx::{Command, Context, RunResult};

pub struct Fmt;

impl Command for Fmt {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Rewrites the project in canonical form")
      .arg(Arg::with_name("dry-run")
           .short("n")
           .long("dry-run")
           .help("Report whether a rewrite is needed without writing"))
  }

  fn run(&self, ctx: &Context) -> RunResult {
    let dry_run = ctx.cmd_args("fmt")
      .map(|args| args.is_present("dry-run"))
      .unwrap_or(false);

    let mut doc = Pbxproj::open(&ctx.path)?;

    if dry_run {
      let canonical = doc.canonical_text()?;
      let file = Pbxproj::locate(&ctx.path)?;
      let on_disk = fs::read_to_string(&file)?;
      if on_disk == canonical {
        println!("{} is canonical", file.display());
      }
      else {
        println!("{} would be rewritten", file.display());
      }
      return Ok(());
    }

    let wrote = doc.write(&ctx.path, ctx.config.overwrite)?;
    if wrote {
      println!("rewrote {}", ctx.path.display());
    }
    else {
      println!("{} already canonical", ctx.path.display());
    }

    if ctx.config.workspace {
      if let Some(bundle) = bundle_dir(&ctx.path) {
        let sidecar = bundle.join("project.xcworkspace").join("contents.xcworkspacedata");
        XCWorkspaceData::default().write(&sidecar, false)?;
      }
    }

    Ok(())
  }
}

fn bundle_dir(path: &std::path::Path) -> Option<std::path::PathBuf> {
  if path.extension().map(|e| e == "xcodeproj").unwrap_or(false) {
    Some(path.to_path_buf())
  }
  else {
    path.parent()
      .filter(|dir| dir.extension().map(|e| e == "xcodeproj").unwrap_or(false))
      .map(|dir| dir.to_path_buf())
  }
}
