use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Sample {
    usage_usec: u64,
    at: Instant,
}

/// Turns successive cumulative CPU usage readings of one container into a utilisation
/// percentage.
///
/// The sampler is bound to a container id. Feeding it a reading for a different id, or
/// calling [`CpuSampler::invalidate`] after the container was seen stopped, discards the
/// previous reading, so a new or restarted container never inherits stale state.
///
/// 100% corresponds to one fully busy core; multi-threaded load can exceed it.
#[derive(Debug, Default)]
pub struct CpuSampler {
    container_id: Option<String>,
    last: Option<Sample>,
}

impl CpuSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `usage_usec` (cumulative, from `cpu.stat`) taken at `at` and returns the
    /// utilisation since the previous reading. The first reading after a reset yields `0.0`.
    pub fn sample(&mut self, container_id: &str, usage_usec: u64, at: Instant) -> f64 {
        if self.container_id.as_deref() != Some(container_id) {
            self.container_id = Some(container_id.to_string());
            self.last = None;
        }

        let percentage = match self.last {
            Some(prev) if at > prev.at && usage_usec >= prev.usage_usec => {
                let elapsed_usec = at.duration_since(prev.at).as_micros() as f64;
                (usage_usec - prev.usage_usec) as f64 / elapsed_usec * 100.0
            }
            _ => 0.0,
        };

        self.last = Some(Sample { usage_usec, at });
        percentage
    }

    /// Forgets the bound container and its last reading.
    pub fn invalidate(&mut self) {
        if let Some(id) = self.container_id.take() {
            log::debug!("invalidating cpu sampler for container {id}");
        }
        self.last = None;
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }
}
