use clap::{App};

use pbxproj::obj::Object;
use pbxproj::Pbxproj;

use crate::ctx::{Command, Context, RunResult};

pub struct Show;

impl Command for Show {
  fn init<'a, 'b>(&self, cmd: App<'a, 'b>) -> App<'a, 'b> {
    cmd.about("Displays a summary of the project")
  }

  fn run(&self, ctx: &Context) -> RunResult {
    let doc = Pbxproj::open(&ctx.path)?;
    let project = doc.root_project().ok_or("project has no root object")?;

    println!("{} (object version {}, {} objects)",
             project.name, doc.object_version, doc.store.len());

    let configurations = project.build_configuration_list.get(&doc.store)
      .map(|list| {
        list.build_configurations.iter()
          .filter_map(|c| c.get(&doc.store).map(|c| c.name.clone()))
          .collect::<Vec<_>>()
      })
      .unwrap_or_default();
    println!("configurations: {}", configurations.join(", "));

    for target in doc.targets() {
      match target.get(&doc.store) {
        Some(Object::PBXNativeTarget(t)) => {
          println!("target {} ({})",
                   t.data.name, t.product_type.as_deref().unwrap_or("unknown type"));
        },
        Some(Object::PBXAggregateTarget(t)) => println!("target {} (aggregate)", t.data.name),
        Some(Object::PBXLegacyTarget(t))    => println!("target {} (legacy)", t.data.name),
        _ => {}
      }
    }

    for (_, object) in doc.store.iter() {
      if let Object::XCRemoteSwiftPackageReference(p) = object {
        println!("package {} ({})", p.name(), p.repository_url);
      }
    }

    Ok(())
  }
}
