//! Year navigation: the viewport value, its controller and playback

use serde::{Deserialize, Serialize};

mod engine;
mod playback;
mod subscriber;
mod viewport;

pub use engine::ViewportController;
pub use playback::{ManualScheduler, PlaybackScheduler, TimerToken, TokioScheduler};
pub use subscriber::ViewportSubscriber;
pub use viewport::Viewport;

/// Autoplay state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}
