//! Viewport controller implementation

use super::{PlaybackScheduler, PlaybackState, TimerToken, Viewport, ViewportSubscriber};
use crate::events::events::{PlaybackChanged, ViewportChange, ViewportChanged};
use crate::events::EventBus;
use crate::settings::{BinningSettings, PlaybackSettings};
use crate::timeline::{Year, YearRange};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

/// Controller state stored internally
#[derive(Debug, Clone)]
struct ControllerState {
    viewport: Viewport,
    playback: PlaybackState,
    timer: Option<TimerToken>,
    tick_years: Year,
}

/// Single source of truth for the selected year, the visible window and the
/// full data range.
///
/// Every mutator restores the viewport invariants before notifying
/// subscribers. Playback ticks arrive from the injected scheduler through
/// [`ViewportController::tick`].
pub struct ViewportController {
    state: Arc<RwLock<ControllerState>>,
    scheduler: Arc<dyn PlaybackScheduler>,
    playback_settings: PlaybackSettings,
    binning: BinningSettings,
    subscribers: Arc<RwLock<Vec<Weak<dyn ViewportSubscriber>>>>,
    event_bus: Option<Arc<EventBus>>,
}

impl ViewportController {
    /// Create a controller showing all of `full_range`
    pub fn new(
        full_range: YearRange,
        playback_settings: PlaybackSettings,
        binning: BinningSettings,
        scheduler: Arc<dyn PlaybackScheduler>,
    ) -> Self {
        let state = ControllerState {
            viewport: Viewport::new(full_range),
            playback: PlaybackState::Stopped,
            timer: None,
            tick_years: playback_settings.tick_years.max(1),
        };

        Self {
            state: Arc::new(RwLock::new(state)),
            scheduler,
            playback_settings,
            binning,
            subscribers: Arc::new(RwLock::new(Vec::new())),
            event_bus: None,
        }
    }

    /// Publish viewport and playback events on `event_bus`
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Current viewport snapshot
    pub fn viewport(&self) -> Viewport {
        self.state.read().viewport
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state.read().playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state().is_playing()
    }

    /// Replace the full range (dataset changed)
    pub fn set_full_range(&self, full_range: YearRange) {
        debug!(%full_range, "Full range updated");
        self.apply(ViewportChange::FullRange, |vp| vp.with_full_range(full_range));
    }

    /// Replace the window (range slider or program driven)
    pub fn set_window_range(&self, window_range: YearRange) {
        self.apply(ViewportChange::Window, |vp| vp.with_window(window_range));
    }

    /// Zoom the window around `anchor_year` by `scale_factor`
    pub fn zoom(&self, anchor_year: f64, scale_factor: f64, min_window_years: Year) {
        self.apply(ViewportChange::Zoom, |vp| {
            vp.zoomed(anchor_year, scale_factor, min_window_years)
        });
    }

    /// Zoom from a wheel delta; positive deltas zoom out
    pub fn zoom_by_wheel(&self, anchor_year: f64, wheel_delta: f64) {
        let scale = (wheel_delta * self.playback_settings.zoom_intensity).exp();
        self.zoom(anchor_year, scale, self.playback_settings.min_window_years);
    }

    /// Shift the window by `delta_years`
    pub fn pan(&self, delta_years: f64) {
        self.apply(ViewportChange::Pan, |vp| vp.panned(delta_years));
    }

    /// Set an absolute window width (zoom slider)
    pub fn recenter_on_window_width(&self, width: i64) {
        self.apply(ViewportChange::Recenter, |vp| vp.with_window_width(width));
    }

    /// Select a year from the scrubber. Stops playback.
    pub fn set_selected_year(&self, year: Year) {
        let was_playing = {
            let mut state = self.state.write();
            let was_playing = self.halt(&mut state);
            state.viewport = state.viewport.with_selected_year(year);
            was_playing
        };

        if was_playing {
            self.publish_playback(PlaybackState::Stopped);
        }
        self.notify(ViewportChange::Selection);
    }

    /// Step the selected year manually (step buttons). Stops playback.
    pub fn step(&self, delta_years: Year) {
        let year = self.viewport().selected_year.saturating_add(delta_years);
        self.set_selected_year(year);
    }

    /// Start autoplay with the configured tick size and interval
    pub fn play_default(&self) {
        self.play(
            self.playback_settings.tick_years,
            Duration::from_millis(self.playback_settings.interval_ms),
        );
    }

    /// Start autoplay. Playing again restarts with a fresh timer.
    pub fn play(&self, tick_years: Year, interval: Duration) {
        {
            let mut state = self.state.write();
            if let Some(previous) = state.timer.take() {
                self.scheduler.cancel(previous);
            }
            state.tick_years = tick_years.max(1);
            state.timer = Some(self.scheduler.schedule(interval));
            state.playback = PlaybackState::Playing;
            debug!(tick_years = state.tick_years, ?interval, "Playback started");
        }

        self.publish_playback(PlaybackState::Playing);
        self.notify_subscribers();
    }

    /// Stop autoplay and cancel the pending timer
    pub fn stop(&self) {
        let was_playing = {
            let mut state = self.state.write();
            self.halt(&mut state)
        };

        if was_playing {
            debug!("Playback stopped");
            self.publish_playback(PlaybackState::Stopped);
            self.notify_subscribers();
        }
    }

    /// Play/pause toggle
    pub fn toggle_playback(&self) {
        if self.is_playing() {
            self.stop();
        } else {
            self.play_default();
        }
    }

    /// Advance playback by one tick.
    ///
    /// Past the window's upper bound the year wraps to the lower bound.
    /// Returns the new year, or `None` when the token is not the active timer.
    pub fn tick(&self, token: TimerToken) -> Option<Year> {
        let year = {
            let mut state = self.state.write();
            if !state.playback.is_playing() || state.timer != Some(token) {
                debug!(token = token.id(), "Ignoring tick from inactive timer");
                return None;
            }

            let window = state.viewport.window_range;
            let next = state.viewport.selected_year as i64 + state.tick_years as i64;
            let next = if next > window.max as i64 {
                window.min
            } else {
                next as Year
            };
            state.viewport = state.viewport.with_selected_year(next);
            state.viewport.selected_year
        };

        self.notify(ViewportChange::Tick);
        Some(year)
    }

    /// Year slider step for the current window span
    pub fn slider_step(&self) -> u32 {
        self.binning.width_for_span(self.viewport().window_range.span())
    }

    /// Add a subscriber
    pub fn add_subscriber(&self, subscriber: Arc<dyn ViewportSubscriber>) {
        let mut subscribers = self.subscribers.write();
        subscribers.push(Arc::downgrade(&subscriber));
    }

    fn halt(&self, state: &mut ControllerState) -> bool {
        if let Some(timer) = state.timer.take() {
            self.scheduler.cancel(timer);
        }
        let was_playing = state.playback.is_playing();
        state.playback = PlaybackState::Stopped;
        was_playing
    }

    fn apply(&self, cause: ViewportChange, transition: impl FnOnce(Viewport) -> Viewport) {
        let changed = {
            let mut state = self.state.write();
            let next = transition(state.viewport);
            debug_assert!(next.is_consistent());
            let changed = next != state.viewport;
            state.viewport = next;
            changed
        };

        if changed {
            self.notify(cause);
        }
    }

    fn notify(&self, cause: ViewportChange) {
        if let Some(bus) = &self.event_bus {
            bus.publish(ViewportChanged {
                viewport: self.viewport(),
                cause,
            });
        }
        self.notify_subscribers();
    }

    fn publish_playback(&self, state: PlaybackState) {
        if let Some(bus) = &self.event_bus {
            bus.publish(PlaybackChanged { state });
        }
    }

    /// Notify all subscribers of a viewport change
    fn notify_subscribers(&self) {
        let viewport = self.viewport();
        let playback = self.playback_state();
        let mut subscribers = self.subscribers.write();

        // Remove any dead weak references
        subscribers.retain(|weak| weak.strong_count() > 0);

        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_viewport_change(&viewport, playback);
            }
        }
    }
}
