use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// System-wide event bus
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Common engine events
pub mod events {
    use super::Event;
    use crate::navigation::{PlaybackState, Viewport};
    use crate::timeline::YearRange;

    /// What caused a viewport change
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ViewportChange {
        FullRange,
        Window,
        Zoom,
        Pan,
        Recenter,
        Selection,
        Tick,
    }

    /// The viewport moved
    #[derive(Debug, Clone)]
    pub struct ViewportChanged {
        pub viewport: Viewport,
        pub cause: ViewportChange,
    }

    /// Playback started or stopped
    #[derive(Debug, Clone)]
    pub struct PlaybackChanged {
        pub state: PlaybackState,
    }

    /// A data layer accepted a fresh response
    #[derive(Debug, Clone)]
    pub struct LayerLoaded {
        pub layer: String,
        pub entity_count: usize,
        pub full_range: YearRange,
    }

    /// A data layer discarded a superseded response
    #[derive(Debug, Clone)]
    pub struct StaleResponseDropped {
        pub layer: String,
        pub generation: u64,
    }

    // Implement Event trait for all event types
    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        ViewportChanged,
        PlaybackChanged,
        LayerLoaded,
        StaleResponseDropped
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_default().push(handler);
    }

    /// Publish an event.
    ///
    /// Handlers run while the bus is locked and must not publish themselves.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}
