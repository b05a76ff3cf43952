//! Command-line probe for `facetmap_core`.
//!
//! # Responsibility
//! - Print core linkage info when run without arguments.
//! - `clusters <db> [config.json]`: print the clusters a map view would draw.

use facetmap_core::{
    aggregate, open_store, Accessors, ItemCollection, MapViewConfig, SqliteItemStore,
};
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Ok(dir) = std::env::var("FACETMAP_LOG_DIR") {
        if let Err(err) = facetmap_core::init_logging(facetmap_core::default_log_level(), &dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match args.first().map(String::as_str) {
        None => {
            println!("facetmap_core ping={}", facetmap_core::ping());
            println!("facetmap_core version={}", facetmap_core::core_version());
            ExitCode::SUCCESS
        }
        Some("clusters") => match print_clusters(&args[1..]) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                error!("event=cli_clusters module=cli status=error");
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
        Some(other) => {
            eprintln!("unknown command `{other}`; usage: facetmap_cli [clusters <db> [config.json]]");
            ExitCode::from(2)
        }
    }
}

fn print_clusters(args: &[String]) -> Result<(), String> {
    let db_path = args
        .first()
        .ok_or_else(|| "usage: facetmap_cli clusters <db> [config.json]".to_string())?;
    let config = match args.get(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|err| format!("cannot read `{path}`: {err}"))?;
            MapViewConfig::from_json(&raw).map_err(|err| err.to_string())?
        }
        None => MapViewConfig::default(),
    };

    let conn = open_store(db_path).map_err(|err| err.to_string())?;
    let store = SqliteItemStore::new(&conn);
    let collection = ItemCollection::from_store(&store).map_err(|err| err.to_string())?;
    let accessors = Accessors::from_config(&config.accessors);

    let aggregation = aggregate(&collection, &store, &accessors);
    for cluster in &aggregation.clusters {
        println!(
            "{}\t{}\t{}",
            cluster.coordinate_key,
            cluster.len(),
            cluster.items.join(",")
        );
    }
    println!(
        "plotted={} unplottable={}",
        aggregation.plotted,
        aggregation.unplottable.len()
    );
    Ok(())
}
