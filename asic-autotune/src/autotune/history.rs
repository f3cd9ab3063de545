/// Number of hashrate samples kept, about 54 s of ticks.
pub const HISTORY_SIZE: usize = 30;

/// Ring buffer of recent hashrate samples.
///
/// Answers one question: has the hashrate risen above the oldest sample
/// in the window? The oldest sample stands in for the hashrate at the
/// time of the last adjustment, and scanning the whole window rides out
/// single noisy readings.
#[derive(Debug, Clone)]
pub struct HashrateHistory {
    samples: [f32; HISTORY_SIZE],
    cursor: usize,
    initialized: bool,
}

impl HashrateHistory {
    pub fn new() -> Self {
        Self {
            samples: [0.0; HISTORY_SIZE],
            cursor: 0,
            initialized: false,
        }
    }

    /// Records a sample, overwriting the oldest one.
    ///
    /// The first sample is copied into every slot so that an unfilled
    /// window never reports a trend.
    pub fn push(&mut self, sample: f32) {
        if !self.initialized {
            self.samples = [sample; HISTORY_SIZE];
            self.initialized = true;
        }

        self.samples[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % HISTORY_SIZE;
    }

    /// Returns true if any sample newer than the one under the cursor is
    /// strictly greater than it.
    pub fn increased_since_mark(&self) -> bool {
        if !self.initialized {
            return false;
        }

        let mark = self.samples[self.cursor];
        (1..HISTORY_SIZE)
            .map(|offset| self.samples[(self.cursor + offset) % HISTORY_SIZE])
            .any(|sample| sample > mark)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Default for HashrateHistory {
    fn default() -> Self {
        Self::new()
    }
}
