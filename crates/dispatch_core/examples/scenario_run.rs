//! Tick the two-hub Berlin scenario to completion and print a summary.
//!
//! Run with: cargo run -p dispatch_core --example scenario_run

use dispatch_core::simulation::SimulationContext;
use dispatch_core::test_helpers::example_params;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dispatch_core=info".into()),
        )
        .init();

    let params = example_params();
    let mut context = SimulationContext::new(params.clone())?;
    context.start(1.0)?;
    let report = context.run_to_completion(100_000)?;
    let totals = &report.totals;

    println!(
        "--- Scenario run ({} orders, {} drivers, {} hubs, seed {}) ---",
        params.order_count,
        params.driver_count,
        params.hubs.len(),
        params.seed
    );
    println!("Ticks: {}", report.tick.unwrap_or(0));
    println!("Simulated minutes: {:.1}", report.now);
    println!("Batches: {} ({} completed)", totals.batches, totals.completed_batches);
    if let Some(avg) = totals.avg_delivery_minutes {
        println!("Average delivery time: {avg:.1} min");
    }
    println!(
        "Order value {:.2}, driver pay {:.2}, delivery margin {:.2}",
        totals.economics.total_value, totals.economics.driver_pay, totals.economics.delivery_margin
    );

    println!("\nBatches:");
    for batch in &report.batches {
        println!(
            "  batch {:>2} hub {} orders {:?} driver {:?} depart {:.1} finish {:.1} km {:.2}",
            batch.id.0,
            batch.hub_id.0,
            batch.order_ids.iter().map(|id| id.0).collect::<Vec<_>>(),
            batch.driver_id.map(|id| id.0),
            batch.depart_at.unwrap_or_default(),
            batch.finish_at.unwrap_or_default(),
            batch.route.total_km(),
        );
    }
    println!("\nDrivers:");
    for driver in &report.drivers {
        println!(
            "  driver {} batches {} km {:.2} earnings {:.2} at {}",
            driver.id.0,
            driver.completed_batches,
            driver.cumulative_km,
            driver.cumulative_earnings,
            driver.location
        );
    }
    Ok(())
}
