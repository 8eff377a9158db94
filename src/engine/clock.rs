use crate::engine::Transport;
use std::time::{Duration, Instant};

/// A silent transport that plays for a fixed length of wall-clock time.
///
/// Stands in for the music player when the song itself is played elsewhere.
#[derive(Debug, Clone)]
pub struct WallClockTransport {
    length: Duration,
    started: Option<Instant>,
}

impl WallClockTransport {
    pub fn new(length: Duration) -> Self {
        Self {
            length,
            started: None,
        }
    }
}

impl Transport for WallClockTransport {
    fn play(&mut self) {
        self.started = Some(Instant::now());
    }

    fn is_playing(&self) -> bool {
        self.started
            .map(|start| start.elapsed() < self.length)
            .unwrap_or(false)
    }

    fn current_time(&self) -> f64 {
        self.started
            .map(|start| start.elapsed().min(self.length).as_secs_f64())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stopped_until_played() {
        let transport = WallClockTransport::new(Duration::from_secs(5));
        assert!(!transport.is_playing());
        assert_eq!(transport.current_time(), 0.0);
    }

    #[test]
    fn plays_for_its_length() {
        let mut transport = WallClockTransport::new(Duration::from_millis(30));
        transport.play();
        assert!(transport.is_playing());

        spin_sleep::sleep(Duration::from_millis(40));
        assert!(!transport.is_playing());
        assert!((transport.current_time() - 0.030).abs() < 1e-9);
    }
}
