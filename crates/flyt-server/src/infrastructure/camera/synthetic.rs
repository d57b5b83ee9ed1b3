//! A camera that renders moving RGB gradients.
//!
//! Used whenever no real camera is attached, so `get_image` has something to
//! return.  Frames are 8-bit RGB, row-major, `width * height * 3` bytes.

use std::sync::Arc;
use std::time::Duration;

use flyt_core::{Image, StopToken};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::LatestFrame;

/// Renders frame number `seq`: a diagonal gradient that scrolls one pixel
/// per frame.
pub fn render_frame(width: u32, height: u32, seq: u64) -> Image {
    let mut data = Vec::with_capacity(width as usize * height as usize * 3);
    let (w, h) = (u64::from(width.max(1)), u64::from(height.max(1)));
    for y in 0..u64::from(height) {
        for x in 0..u64::from(width) {
            let r = (x.wrapping_add(seq) % w * 255 / w) as u8;
            let g = (y * 255 / h) as u8;
            let b = (x.wrapping_add(y).wrapping_add(seq) & 0xFF) as u8;
            data.extend_from_slice(&[r, g, b]);
        }
    }
    Image { width, height, data }
}

/// Publishes a new frame into `slot` every `interval` until `stop` fires.
///
/// The first frame is published immediately.
pub fn spawn_synthetic_camera(
    slot: Arc<LatestFrame>,
    width: u32,
    height: u32,
    interval: Duration,
    stop: StopToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(width, height, interval_ms = interval.as_millis() as u64, "synthetic camera started");
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut seq: u64 = 0;
        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => break,
                _ = ticker.tick() => {}
            }
            slot.publish(render_frame(width, height, seq));
            debug!(seq, "frame published");
            seq = seq.wrapping_add(1);
        }
        info!(frames = seq, "synthetic camera stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::vehicle::FrameSource;
    use flyt_core::StopSource;

    #[test]
    fn test_render_frame_has_rgb_size() {
        let frame = render_frame(64, 48, 0);
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.data.len(), 64 * 48 * 3);
    }

    #[test]
    fn test_consecutive_frames_differ() {
        assert_ne!(render_frame(8, 4, 0).data, render_frame(8, 4, 1).data);
    }

    #[test]
    fn test_empty_frame_is_allowed() {
        assert!(render_frame(0, 0, 3).data.is_empty());
    }

    #[tokio::test]
    async fn test_camera_publishes_until_stopped() {
        // Arrange
        let slot = Arc::new(LatestFrame::new());
        let (source, token) = StopSource::new();

        // Act
        let camera = spawn_synthetic_camera(Arc::clone(&slot), 4, 2, Duration::from_millis(5), token);
        tokio::time::sleep(Duration::from_millis(30)).await;
        source.stop();
        tokio::time::timeout(Duration::from_secs(1), camera)
            .await
            .expect("camera did not stop")
            .unwrap();

        // Assert
        let frame = slot.latest_frame().expect("a frame was published");
        assert_eq!(frame.data.len(), 4 * 2 * 3);
    }
}
