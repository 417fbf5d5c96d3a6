use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use crystal_object::{register_builtins, Object, ObjectFactory, ResourceManager, Scene};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let mut factory = ObjectFactory::new();
    register_builtins(factory.registry_mut());
    let mut resources = match Path::new(&options.path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => ResourceManager::with_root(dir),
        _ => ResourceManager::new(),
    };

    let mut scene = Scene::load_file(&options.path, &mut factory, &mut resources)
        .with_context(|| format!("failed to load scene {}", options.path))?;

    println!("Loaded scene with {} objects", scene.objects.len());
    for object in &scene.objects {
        let guard = object.read();
        println!(
            " - {} ({}) uuid={}",
            guard.name(),
            guard.class_name(),
            guard.uuid()
        );
    }

    if options.duplicate {
        let copies: Vec<_> = scene
            .objects
            .iter()
            .map(|object| factory.duplicate(object))
            .collect();
        println!("Duplicated {} object(s):", copies.len());
        for (source, copy) in scene.objects.iter().zip(&copies) {
            println!(
                " - {} uuid={} -> uuid={}",
                source.read().name(),
                source.read().uuid(),
                copy.read().uuid()
            );
        }
        scene.objects.extend(copies);
    }

    if let Some(path) = &options.save {
        scene
            .save_file(path, &factory, &mut resources)
            .with_context(|| format!("failed to save scene {path}"))?;
        println!("Saved scene to {path}");
    }

    Ok(())
}

struct CliOptions {
    path: String,
    duplicate: bool,
    save: Option<String>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: crystal-object <scene.json> [--duplicate] [--save <path>]"
            ));
        };
        let mut duplicate = false;
        let mut save = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--duplicate" => duplicate = true,
                "--save" => {
                    save = Some(
                        args.next()
                            .ok_or_else(|| anyhow!("--save expects a file path"))?,
                    );
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --duplicate or --save <path>"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            duplicate,
            save,
        })
    }
}
