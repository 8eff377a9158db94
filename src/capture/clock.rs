use crate::engine::Transport;

/// One sample of the transport, taken at the start of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub playing: bool,
    /// Playback position in seconds.
    pub time: f64,
    /// Seconds since the previous frame.
    pub delta: f64,
}

/// Samples a transport once per frame and derives the frame delta from the
/// distance between successive playback positions.
#[derive(Debug, Clone)]
pub struct ClockSampler {
    nominal_delta: f64,
    last_time: Option<f64>,
}

impl ClockSampler {
    pub fn new(nominal_delta: f64) -> Self {
        Self {
            nominal_delta,
            last_time: None,
        }
    }

    pub fn sample<T: Transport + ?Sized>(&mut self, transport: &T) -> Frame {
        let playing = transport.is_playing();
        let time = transport.current_time();

        // First frame has nothing to diff against; a clock that jumped back is treated as paused.
        let delta = match self.last_time {
            None => self.nominal_delta,
            Some(last) => (time - last).max(0.0),
        };
        self.last_time = Some(time);

        Frame {
            playing,
            time,
            delta,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct FixedTransport {
        time: f64,
        playing: bool,
    }

    impl Transport for FixedTransport {
        fn play(&mut self) {
            self.playing = true;
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn current_time(&self) -> f64 {
            self.time
        }
    }

    #[test]
    fn delta_from_successive_samples() {
        let mut transport = FixedTransport {
            time: 1.0,
            playing: true,
        };
        let mut sampler = ClockSampler::new(0.125);

        let first = sampler.sample(&transport);
        assert_eq!(first.delta, 0.125);
        assert_eq!(first.time, 1.0);
        assert!(first.playing);

        transport.time = 1.25;
        assert_eq!(sampler.sample(&transport).delta, 0.25);

        transport.time = 1.25;
        assert_eq!(sampler.sample(&transport).delta, 0.0);

        transport.time = 0.5;
        transport.playing = false;
        let rewound = sampler.sample(&transport);
        assert_eq!(rewound.delta, 0.0);
        assert!(!rewound.playing);
    }
}
