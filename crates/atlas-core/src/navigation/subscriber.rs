//! Viewport subscriber trait

use super::{PlaybackState, Viewport};

/// Trait for components that need to respond to viewport changes
pub trait ViewportSubscriber: Send + Sync {
    /// Called after the viewport or the playback state changes
    fn on_viewport_change(&self, viewport: &Viewport, playback: PlaybackState);
}
