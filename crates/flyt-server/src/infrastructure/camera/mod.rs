//! Camera feed adapters.
//!
//! [`LatestFrame`] is the single-slot frame store `get_image` reads from.
//! A camera publishes into it whenever it has a new frame; readers get the
//! most recent one without waiting.

pub mod synthetic;

use std::sync::{Arc, PoisonError, RwLock};

use flyt_core::Image;

use crate::application::vehicle::FrameSource;

/// Holds the most recently published frame.
#[derive(Debug, Default)]
pub struct LatestFrame {
    slot: RwLock<Option<Arc<Image>>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored frame.
    pub fn publish(&self, image: Image) {
        let frame = Arc::new(image);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(frame);
    }
}

impl FrameSource for LatestFrame {
    fn latest_frame(&self) -> Option<Arc<Image>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(fill: u8) -> Image {
        Image { width: 1, height: 1, data: vec![fill; 3] }
    }

    #[test]
    fn test_empty_slot_has_no_frame() {
        assert!(LatestFrame::new().latest_frame().is_none());
    }

    #[test]
    fn test_publish_replaces_previous_frame() {
        let slot = LatestFrame::new();

        slot.publish(image(1));
        let first = slot.latest_frame().unwrap();
        slot.publish(image(2));

        assert_eq!(first.data, vec![1; 3]);
        assert_eq!(slot.latest_frame().unwrap().data, vec![2; 3]);
    }
}
