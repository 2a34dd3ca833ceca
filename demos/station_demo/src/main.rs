//! Station Demo
//!
//! Stows a small cargo manifest, plans a retrieval, uses some supplies,
//! lets time pass until food expires, and prepares the waste for undocking.
//!
//! Usage: `station_demo [config.ron] [--db <path>]`

use chrono::Duration;
use std::sync::Arc;
use stowage_core::{Container, Dimensions, Item, NaiveDate};
use stowage_hub::{
    ExportFormat, Hub, LogsRequest, PlaceRequest, PlacementOutcome, RecordRetrievalRequest,
    RetrieveQuery, ReturnPlanRequest, SimulateRequest, StowageConfig, UndockingRequest, UsageRef,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config_path = None;
    let mut db_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => db_path = args.next(),
            _ => config_path = Some(arg),
        }
    }

    let config = match &config_path {
        Some(path) => StowageConfig::load(path)?,
        None => StowageConfig::default(),
    };
    let start = config.start_date;

    let hub = match &db_path {
        Some(path) => {
            let store = Arc::new(stowage_db::Store::open(path)?);
            Hub::with_stores(config, store.clone(), store)?
        }
        None => Hub::new(config),
    };

    println!("=== Station Stowage Demo ===\n");
    info!(date = %hub.current_date(), "station online");

    // Stow the manifest
    let response = hub.place(&PlaceRequest {
        items: manifest(start),
        containers: vec![
            Container::new("contA", "Crew Quarters", Dimensions::new(100.0, 85.0, 200.0)),
            Container::new("contB", "Airlock", Dimensions::new(50.0, 85.0, 200.0)),
            Container::new("contC", "Laboratory", Dimensions::new(200.0, 85.0, 200.0)),
            Container::new("contD", "Medical Bay", Dimensions::new(60.0, 40.0, 60.0)),
        ],
        user_id: Some("astronaut-1".into()),
    });
    println!("Placed {} items:", response.placements.len());
    for placement in &response.placements {
        let start = placement.position.start;
        println!(
            "  {:<6} -> {:<6} at ({}, {}, {})",
            placement.item_id, placement.container_id, start.width, start.depth, start.height
        );
    }
    for outcome in &response.outcomes {
        match outcome {
            PlacementOutcome::Placed { .. } => {}
            PlacementOutcome::PlacedAfterRearrangement { item_id, container_id } => {
                println!("  {:<6} placed in {} after rearrangement", item_id, container_id)
            }
            PlacementOutcome::Failed { item_id, reason } => {
                println!("  {:<6} not placed: {:?}", item_id, reason)
            }
        }
    }
    println!("Rearrangements: {}\n", response.rearrangements.len());

    // Plan a retrieval
    let retrieval = hub.retrieve_item(&RetrieveQuery::by_name("First Aid Kit"))?;
    if retrieval.found {
        println!("Retrieving First Aid Kit:");
        for step in &retrieval.retrieval_steps {
            println!("  {}. {:?} {} ({})", step.step, step.action, step.item_name, step.item_id);
        }
    } else {
        println!("First Aid Kit not found");
    }
    hub.record_retrieval(&RecordRetrievalRequest {
        item_id: "002".into(),
        user_id: Some("astronaut-2".into()),
        timestamp: None,
    })?;
    println!();

    // Let time pass
    let end = start + Duration::days(10);
    let report = hub.simulate(
        &SimulateRequest::between(start, end).using(vec![UsageRef {
            item_id: Some("003".into()),
            name: None,
        }]),
    )?;
    println!("Simulated {} to {}:", report.start_date, report.end_date);
    println!("  expired:  {:?}", report.expired_items);
    println!("  depleted: {:?}", report.depleted_items);
    println!("  disposed: {:?}\n", report.disposed_items);

    // Waste for the next undocking
    let plan = hub.waste_return_plan(&ReturnPlanRequest {
        undocking_container_id: "contB".into(),
        undocking_date: end,
        max_weight: 50.0,
    })?;
    println!(
        "Return plan: {} items, {:.1} kg",
        plan.return_manifest.return_items.len(),
        plan.return_manifest.total_weight
    );
    let undocked = hub.complete_undocking(&UndockingRequest {
        undocking_container_id: "contB".into(),
        user_id: Some("astronaut-1".into()),
        timestamp: None,
    })?;
    println!("Undocked {} items\n", undocked.items_removed);

    println!("{}", hub.log_summary(&LogsRequest::default())?);
    println!("History of 002:");
    for entry in hub.item_history(&"002".into()) {
        println!("  {} {} by {}", entry.timestamp.date_naive(), entry.action_type, entry.user_id);
    }
    println!();
    println!("{}", hub.export_logs(&LogsRequest::default(), ExportFormat::Text)?);

    let csv = hub.export_arrangement()?;
    println!("=== Arrangement ===\n{}", String::from_utf8_lossy(&csv));
    Ok(())
}

fn manifest(start: NaiveDate) -> Vec<Item> {
    let day = |n| start + Duration::days(n);
    vec![
        Item::new("001", "Food Packet", Dimensions::new(10.0, 10.0, 20.0), 80)
            .with_mass(5.0)
            .with_expiry(day(5))
            .with_preferred_zone("Crew Quarters"),
        Item::new("002", "Oxygen Cylinder", Dimensions::new(15.0, 15.0, 50.0), 95)
            .with_mass(30.0)
            .with_usage_limit(100)
            .with_preferred_zone("Airlock"),
        Item::new("003", "First Aid Kit", Dimensions::new(20.0, 20.0, 10.0), 100)
            .with_mass(2.0)
            .with_usage_limit(5)
            .with_preferred_zone("Medical Bay"),
        Item::new("004", "Water Pouch", Dimensions::new(10.0, 10.0, 15.0), 70)
            .with_mass(1.5)
            .with_expiry(day(30))
            .with_preferred_zone("Crew Quarters"),
        Item::new("005", "Sample Cartridge", Dimensions::new(40.0, 40.0, 40.0), 40)
            .with_mass(4.0)
            .with_preferred_zone("Laboratory"),
        Item::new("006", "Ration Bar", Dimensions::new(5.0, 5.0, 10.0), 60)
            .with_mass(0.5)
            .with_expiry(day(2))
            .with_preferred_zone("Crew Quarters"),
    ]
}
