use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tripplanner::cli::{Cli, Command, PlanArgs};
use tripplanner::planner::{TripPlan, TripPlanner};
use tripplanner::{TripPlannerConfig, TripPlannerError, logging, web};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<TripPlannerError>() {
                Some(err) => eprintln!("Error: {}", err.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = TripPlannerConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.log_level.as_deref())?;

    let planner = TripPlanner::from_config(&config)?;

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            web::run(planner, &host, port).await
        }
        Command::Plan(args) => {
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| config.output.directory.clone());
            plan(&planner, &args, &output).await
        }
    }
}

async fn plan(planner: &TripPlanner, args: &PlanArgs, output: &Path) -> Result<()> {
    let request = args.to_request(Local::now().date_naive());
    let plan = planner.plan(request).await?;

    print_plan(&plan);

    let artifact = plan.to_artifact()?;
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let path = output.join(artifact.disk_file_name());
    std::fs::write(&path, &artifact.content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("\n💾 Itinerary saved to {}", path.display());
    Ok(())
}

fn print_plan(plan: &TripPlan) {
    println!("🌍 Your Travel Itinerary\n");
    println!("{}\n", plan.result.itinerary_text());
    println!("{}", plan.budget_summary());

    if let Some(weather) = plan.weather_summary() {
        println!("\n🌦️ Weather Forecast\n{weather}");
    }

    if let Some(map) = &plan.map {
        let view = &map.initial_view_state;
        println!(
            "\n🗺️ Route: {:.0} km, map centered at {:.4}, {:.4}",
            map.distance_km, view.latitude, view.longitude
        );
    }

    for notice in &plan.notices {
        println!("⚠️ {notice}");
    }
}
