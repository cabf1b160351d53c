//! Data layers: one dataset kind with its derived ranges and counts
//!
//! A layer accepts only the response to its most recent fetch. Responses to
//! superseded fetches are logged and dropped.

use std::sync::Arc;

use atlas_core::events::events::{LayerLoaded, StaleResponseDropped};
use atlas_core::events::EventBus;
use atlas_core::settings::{AtlasSettings, CountingSettings};
use atlas_core::{RequestGate, RequestTicket, Year, YearCount, YearRange};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{HistogramCache, HistogramKey};
use crate::entities::LayerEntity;
use crate::histogram::{Aggregation, Histogram, HistogramBinner};
use crate::ranges::RangeReducer;

/// Below this many entities a layer publishes no counts
pub const MIN_ENTITIES_FOR_COUNTS: usize = 2;

struct LayerState<T> {
    entities: Arc<Vec<T>>,
    full_range: Option<YearRange>,
    counts: Arc<Vec<YearCount>>,
    /// Generation of the accepted response, 0 before the first load
    generation: u64,
    loading: bool,
    active: bool,
}

impl<T> Default for LayerState<T> {
    fn default() -> Self {
        Self {
            entities: Arc::new(Vec::new()),
            full_range: None,
            counts: Arc::new(Vec::new()),
            generation: 0,
            loading: false,
            active: true,
        }
    }
}

/// A dataset shown as a map layer
pub struct DataLayer<T: LayerEntity> {
    gate: RequestGate,
    state: Arc<RwLock<LayerState<T>>>,
    reducer: RangeReducer,
    counting: CountingSettings,
    binner: HistogramBinner,
    cache: HistogramCache,
    event_bus: Option<Arc<EventBus>>,
}

impl<T: LayerEntity> DataLayer<T> {
    pub fn new(reducer: RangeReducer, counting: CountingSettings, binner: HistogramBinner) -> Self {
        Self {
            gate: RequestGate::new(),
            state: Arc::new(RwLock::new(LayerState::default())),
            reducer,
            counting,
            binner,
            cache: HistogramCache::default(),
            event_bus: None,
        }
    }

    /// Layer configured from the engine settings, using the local clock's year
    pub fn from_settings(settings: &AtlasSettings) -> Self {
        Self::new(
            RangeReducer::new(settings.ranges.clone()),
            settings.counting.clone(),
            HistogramBinner::new(settings.binning.clone()),
        )
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn name(&self) -> &'static str {
        T::KIND.name()
    }

    /// Start a fetch. Any earlier fetch still in flight becomes stale.
    pub fn begin_fetch(&self) -> RequestTicket {
        let ticket = self.gate.begin();
        self.state.write().loading = true;
        debug!(layer = self.name(), generation = ticket.generation(), "Fetch started");
        ticket
    }

    /// Merge a fetch response. Returns `false` if the ticket was superseded.
    ///
    /// Staleness is checked again under the state lock, so a newer response
    /// merged while this one was being aggregated is never overwritten.
    pub fn apply_response(&self, ticket: RequestTicket, entities: Vec<T>) -> bool {
        let Some(entities) = self.gate.accept(&ticket, entities) else {
            self.drop_stale(&ticket);
            return false;
        };

        let full_range = T::full_range(&entities, &self.reducer);
        let counts = if entities.len() >= MIN_ENTITIES_FOR_COUNTS {
            T::counts(&entities, full_range, &self.counting)
        } else {
            Vec::new()
        };
        let entity_count = entities.len();

        {
            let mut state = self.state.write();
            if !self.gate.is_current(&ticket) || ticket.generation() <= state.generation {
                drop(state);
                self.drop_stale(&ticket);
                return false;
            }
            state.entities = Arc::new(entities);
            state.full_range = Some(full_range);
            state.counts = Arc::new(counts);
            state.generation = ticket.generation();
            state.loading = false;
        }
        self.cache.retain_generation(ticket.generation());

        info!(layer = self.name(), entity_count, %full_range, "Layer loaded");
        if let Some(bus) = &self.event_bus {
            bus.publish(LayerLoaded {
                layer: self.name().to_string(),
                entity_count,
                full_range,
            });
        }
        true
    }

    fn drop_stale(&self, ticket: &RequestTicket) {
        warn!(
            layer = self.name(),
            generation = ticket.generation(),
            latest = self.gate.latest_generation(),
            "Dropping stale response"
        );
        if let Some(bus) = &self.event_bus {
            bus.publish(StaleResponseDropped {
                layer: self.name().to_string(),
                generation: ticket.generation(),
            });
        }
    }

    /// Abandon the fetch in flight, if any
    pub fn cancel(&self) {
        self.gate.cancel();
        self.state.write().loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn is_active(&self) -> bool {
        self.state.read().active
    }

    /// Hide or show the layer. Inactive layers show nothing and take no part in the range union.
    pub fn set_active(&self, active: bool) {
        self.state.write().active = active;
    }

    pub fn entities(&self) -> Arc<Vec<T>> {
        self.state.read().entities.clone()
    }

    /// Full range of the last accepted response
    pub fn full_range(&self) -> Option<YearRange> {
        self.state.read().full_range
    }

    /// Full range if the layer is active, for unioning across layers
    pub fn active_range(&self) -> Option<YearRange> {
        let state = self.state.read();
        if state.active {
            state.full_range
        } else {
            None
        }
    }

    /// Per-year counts over the full range
    pub fn counts(&self) -> Arc<Vec<YearCount>> {
        self.state.read().counts.clone()
    }

    /// Entities shown on the map at `year`
    pub fn visible_at(&self, year: Year) -> Vec<T> {
        let state = self.state.read();
        if !state.active {
            return Vec::new();
        }
        state
            .entities
            .iter()
            .filter(|entity| entity.is_visible_at(year, &self.counting))
            .cloned()
            .collect()
    }

    /// Histogram of the layer's counts over `window`
    pub fn histogram(&self, window: YearRange, aggregation: Aggregation) -> Arc<Histogram> {
        let (entities, generation) = {
            let state = self.state.read();
            (state.entities.clone(), state.generation)
        };

        let key = HistogramKey {
            generation,
            window,
            aggregation,
        };
        self.cache.get_or_insert_with(key, || {
            let counts = if entities.len() >= MIN_ENTITIES_FOR_COUNTS {
                T::counts(&entities, window, &self.counting)
            } else {
                Vec::new()
            };
            self.binner.bin(&counts, window, aggregation)
        })
    }
}
