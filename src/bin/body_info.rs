use std::f64::consts::TAU;
use std::path::PathBuf;

use rust_orrery::file::{default_scene, read_file};

use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    name: String,
    /// Scene file; defaults to the built-in solar system
    #[arg(long)]
    scene: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let loaded = match &args.scene {
        Some(path) => read_file(path),
        None => default_scene(),
    };
    let orrery = match loaded {
        Ok(orrery) => orrery,
        Err(e) => {
            eprintln!("Could not load scene: {}", e);
            std::process::exit(1);
        }
    };

    let mut found = false;
    for body in orrery.bodies() {
        if body.name().to_lowercase() != args.name.to_lowercase() {
            continue;
        }
        found = true;

        let info = body.info();
        let orbit = body.orbit();
        println!("Orbital characteristics for {}", info.name);
        match orrery.parent_of(body.name()) {
            Some(parent) => println!("- Orbits: {}", parent.name()),
            None => println!("- Orbits: nothing (root body)"),
        }
        println!("- Size: {}", info.size);
        println!("- Light source: {}", info.is_light_source);
        println!("- Shininess: {}", info.shininess);
        if orbit.is_stationary() {
            println!("- Stationary at {}", body.center());
            println!();
            continue;
        }
        println!("- Orbital radius: {}", orbit.radius());
        println!(
            "- Orbital inclination: {}",
            orbit.inclination().to_degrees()
        );
        println!("- Orbital period: {}", orbit.period());
        println!("- Angular speed: {} rad / time unit", orbit.angular_speed());
        println!(
            "- Orbital speed: {}",
            TAU * orbit.radius() / orbit.period()
        );
        println!("- Starting phase: {}", body.current_angle().to_degrees());
        println!();
    }

    if !found {
        eprintln!("No body named {}", args.name);
        std::process::exit(1);
    }
}
