use crate::libprep::session::Event;
use log::debug;

/// A drag has to cover more than this vertical distance to count as a swipe.
pub const SWIPE_THRESHOLD: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Up,
    Down,
}

impl Swipe {
    /// An upward swipe skips the question. Downward swipes do nothing.
    pub fn event(self) -> Option<Event> {
        match self {
            Swipe::Up => Some(Event::Skip),
            Swipe::Down => None,
        }
    }
}

/// Tracks one vertical drag. Positions grow downwards, like screen
/// coordinates.
#[derive(Debug, Default, Clone)]
pub struct DragTracker {
    start_y: Option<f32>,
}

impl DragTracker {
    pub fn new() -> DragTracker {
        DragTracker::default()
    }

    pub fn begin(&mut self, y: f32) {
        self.start_y = Some(y);
    }

    pub fn end(&mut self) {
        self.start_y = None;
    }

    /// Reports a swipe once the drag has gone past the threshold, then starts
    /// measuring again from `y`.
    pub fn moved(&mut self, y: f32) -> Option<Swipe> {
        let start = self.start_y?;
        let delta = y - start;
        if delta.abs() <= SWIPE_THRESHOLD {
            return None;
        }
        self.start_y = Some(y);
        let swipe = if delta < 0.0 { Swipe::Up } else { Swipe::Down };
        debug!("[Gesture] {:?} swipe over {} px", swipe, delta.abs());
        Some(swipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_drags_are_ignored() {
        let mut tracker = DragTracker::new();
        tracker.begin(400.0);
        assert_eq!(tracker.moved(350.0), None);
        assert_eq!(tracker.moved(301.0), None);
    }

    #[test]
    fn large_upward_drag_skips() {
        let mut tracker = DragTracker::new();
        tracker.begin(400.0);
        let swipe = tracker.moved(280.0);
        assert_eq!(swipe, Some(Swipe::Up));
        assert_eq!(swipe.and_then(Swipe::event), Some(Event::Skip));
    }

    #[test]
    fn tracker_restarts_after_each_swipe() {
        let mut tracker = DragTracker::new();
        tracker.begin(400.0);
        assert_eq!(tracker.moved(280.0), Some(Swipe::Up));
        assert_eq!(tracker.moved(230.0), None);
        assert_eq!(tracker.moved(350.0), None);
        assert_eq!(tracker.moved(420.0), Some(Swipe::Down));
        assert_eq!(Swipe::Down.event(), None);
    }

    #[test]
    fn exactly_the_threshold_is_not_a_swipe() {
        let mut tracker = DragTracker::new();
        tracker.begin(400.0);
        assert_eq!(tracker.moved(300.0), None);
        assert_eq!(tracker.moved(299.5), Some(Swipe::Up));
    }

    #[test]
    fn no_swipe_without_a_drag_in_progress() {
        let mut tracker = DragTracker::new();
        assert_eq!(tracker.moved(0.0), None);
        tracker.begin(500.0);
        tracker.end();
        assert_eq!(tracker.moved(0.0), None);
    }
}
