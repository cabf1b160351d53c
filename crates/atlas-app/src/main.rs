//! Main application entry point
//!
//! Loads the datasets, wires the engine together and plays back a few years,
//! logging what the charts and the map would show.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use atlas_core::events::events::{LayerLoaded, StaleResponseDropped};
use atlas_core::events::{handler_from_fn, EventBus};
use atlas_core::{AtlasSettings, TokioScheduler, Viewport, ViewportController};
use atlas_data::{
    fetch_into, Aggregation, DataLayer, JsonEntitySource, LayerEntity, MilitaryEvent, Person,
    RangeReducer, Work,
};
use atlas_geo::SpiralPlacer;
use clap::Parser;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod report;

use cli::{load_settings, Args};
use report::{log_histogram, log_person_placements, ViewportLog};

/// Create a layer and fill it from `path`
async fn load_layer<T>(
    path: &Path,
    settings: &AtlasSettings,
    bus: &Arc<EventBus>,
) -> Result<DataLayer<T>>
where
    T: LayerEntity + DeserializeOwned,
{
    let layer = DataLayer::from_settings(settings).with_event_bus(bus.clone());
    let source = JsonEntitySource::<T>::new(path);
    fetch_into(&layer, &source)
        .await
        .with_context(|| format!("Failed to load {} layer", T::KIND))?;
    Ok(layer)
}

fn log_layer<T: LayerEntity>(layer: &DataLayer<T>, viewport: &Viewport) {
    let histogram = layer.histogram(viewport.window_range, Aggregation::Sum);
    log_histogram(layer.name(), &histogram);
}

fn event_bus() -> Arc<EventBus> {
    let bus = Arc::new(EventBus::new());
    bus.subscribe::<LayerLoaded>(handler_from_fn(|event| {
        if let Some(loaded) = event.as_any().downcast_ref::<LayerLoaded>() {
            info!(
                layer = %loaded.layer,
                entities = loaded.entity_count,
                range = %loaded.full_range,
                "Layer ready"
            );
        }
    }));
    bus.subscribe::<StaleResponseDropped>(handler_from_fn(|event| {
        if let Some(stale) = event.as_any().downcast_ref::<StaleResponseDropped>() {
            warn!(layer = %stale.layer, generation = stale.generation, "Stale response dropped");
        }
    }));
    bus
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let settings = load_settings(args.settings.as_deref())?;
    info!("Starting chronoatlas");

    let bus = event_bus();
    let persons = load_layer::<Person>(&args.persons, &settings, &bus).await?;
    let events = match &args.events {
        Some(path) => Some(load_layer::<MilitaryEvent>(path, &settings, &bus).await?),
        None => None,
    };
    let works = match &args.works {
        Some(path) => Some(load_layer::<Work>(path, &settings, &bus).await?),
        None => None,
    };

    let reducer = RangeReducer::new(settings.ranges.clone());
    let full_range = reducer.union(&[
        persons.active_range(),
        events.as_ref().and_then(DataLayer::active_range),
        works.as_ref().and_then(DataLayer::active_range),
    ]);
    info!(%full_range, "Combined range");

    let (scheduler, mut timer_ticks) = TokioScheduler::new(tokio::runtime::Handle::current());
    let controller = ViewportController::new(
        full_range,
        settings.playback.clone(),
        settings.binning.clone(),
        Arc::new(scheduler),
    )
    .with_event_bus(bus.clone());

    let viewport_log = Arc::new(ViewportLog::default());
    controller.add_subscriber(viewport_log.clone());

    let viewport = controller.viewport();
    log_layer(&persons, &viewport);
    if let Some(layer) = &events {
        log_layer(layer, &viewport);
    }
    if let Some(layer) = &works {
        log_layer(layer, &viewport);
    }

    let placer = SpiralPlacer::new(settings.spiral.clone());
    log_person_placements(
        &persons.visible_at(viewport.selected_year),
        viewport.selected_year,
        &placer,
    );

    info!(ticks = args.ticks, slider_step = controller.slider_step(), "Starting playback");
    controller.play_default();

    let mut remaining = args.ticks;
    while remaining > 0 {
        let Some(token) = timer_ticks.recv().await else {
            break;
        };
        let Some(year) = controller.tick(token) else {
            continue;
        };
        remaining -= 1;

        let alive = persons.visible_at(year).len();
        let active_events = events.as_ref().map_or(0, |layer| layer.visible_at(year).len());
        let shown_works = works.as_ref().map_or(0, |layer| layer.visible_at(year).len());
        info!(year, alive, active_events, shown_works, "Tick");
    }

    controller.stop();
    info!(viewport_changes = viewport_log.changes(), "Playback finished");
    Ok(())
}
