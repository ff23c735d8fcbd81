use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::time::Duration;

use emergency_sim::simulation::{
    self, CityConfig, ConsolePrompter, Prompter, ScriptedPrompter, SimWorld, TerminalRenderer,
    CITY_NAMES,
};

#[derive(Parser)]
#[command(name = "emergency_sim")]
#[command(about = "Fire truck and ambulance dispatch on generated city grids")]
struct Cli {
    /// City to dispatch in (defaults to the first city)
    #[arg(long)]
    city: Option<String>,

    /// House with the emergency (defaults to the first house)
    #[arg(long)]
    house: Option<String>,

    /// Treat the emergency as medical and send the ambulance
    #[arg(long)]
    medical: bool,

    /// Ask questions on stdin instead of using --medical
    #[arg(long)]
    interactive: bool,

    /// Seed for reproducible city generation
    #[arg(long)]
    seed: Option<u64>,

    /// Side length of each city grid
    #[arg(long, default_value_t = simulation::DEFAULT_GRID_SIZE)]
    grid_size: usize,

    /// Houses per city
    #[arg(long, default_value_t = simulation::DEFAULT_HOUSE_COUNT)]
    houses: usize,

    /// Grey obstacle cells per city
    #[arg(long, default_value_t = simulation::DEFAULT_GREY_OBSTACLES)]
    grey: usize,

    /// Green obstacle cells per city
    #[arg(long, default_value_t = simulation::DEFAULT_GREEN_OBSTACLES)]
    green: usize,

    /// Delay between motion steps in milliseconds
    #[arg(long, default_value_t = simulation::DEFAULT_STEP_INTERVAL.as_millis() as u64)]
    step_ms: u64,

    /// Print the map after every step
    #[arg(long)]
    draw: bool,

    /// List cities and their houses, then exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,emergency_sim=info"),
    )
    .init();

    let cli = Cli::parse();

    let config = CityConfig {
        size: cli.grid_size,
        house_count: cli.houses,
        grey_obstacles: cli.grey,
        green_obstacles: cli.green,
        ..CityConfig::default()
    };
    let mut world = SimWorld::generate(
        &config,
        &CITY_NAMES,
        cli.seed,
        Duration::from_millis(cli.step_ms),
    )?;

    if cli.list {
        list_cities(&world);
        return Ok(());
    }

    if let Some(city) = &cli.city {
        world.select_city(city)?;
    }

    let house = match &cli.house {
        Some(house) => house.clone(),
        None => world
            .city()
            .houses
            .names()
            .next()
            .map(str::to_string)
            .context("Selected city has no houses")?,
    };

    // Ctrl-C ends the simulation: the run stops at its next cancellation check
    let token = world.cancellation_token();
    ctrlc::set_handler(move || {
        info!("Received Ctrl-C, ending simulation");
        token.cancel();
    })
    .context("Failed to set Ctrl-C handler")?;

    let mut renderer = TerminalRenderer::new(cli.draw);
    let mut prompter: Box<dyn Prompter> = if cli.interactive {
        Box::new(ConsolePrompter::new(world.cancellation_token()))
    } else {
        Box::new(ScriptedPrompter::new(cli.medical))
    };

    info!(
        "Dispatching to {} in {} ({} ms per step)",
        house,
        world.city().name,
        world.step_interval().as_millis()
    );
    let outcome = world.handle_emergency(&house, &mut renderer, prompter.as_mut())?;

    world.print_summary();
    world.render(&mut TerminalRenderer::new(true));

    info!("Outcome: {:?}", outcome);
    if let Some(report) = world.controller().last_report() {
        if let Some(len) = report.truck_path_len {
            info!("Truck path length: {}", len);
        }
        if let Some((outbound, back)) = report.ambulance_path_lens {
            info!("Ambulance path lengths: {} out, {} back", outbound, back);
        }
    }
    info!("Frames rendered: {}", renderer.frames());
    info!("RUN COMPLETE");

    Ok(())
}

fn list_cities(world: &SimWorld) {
    for city in world.catalog().iter() {
        println!("{}:", city.name);
        for house in city.houses.iter() {
            println!("  {} at {}", house.name, house.anchor);
        }
    }
}
