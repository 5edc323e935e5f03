//! Tone cache: memoizes generated waveform buffers per quantized
//! frequency.
//!
//! Synthesis (especially the additive and filtered generators) is too
//! costly to redo per keypress; the cache trades memory for latency.
//! Entries are created lazily, shared read-only, and never evicted
//! within a session; the reachable frequency set is bounded by the key
//! layout times the modifier combinations, so growth is bounded too.
//! Changing the tuning or the generator means building a new cache, not
//! invalidating this one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SynthError;
use crate::sink::SharedBuffer;

use super::generator::{Generator, quantize_i16};

/// Memoized waveform synthesis at fixed volume and duration.
#[derive(Debug, Clone)]
pub struct ToneCache {
    generator: Generator,
    volume: f64,
    duration: f64,
    enabled: bool,
    entries: HashMap<i64, SharedBuffer>,
}

impl ToneCache {
    pub fn new(generator: Generator, volume: f64, duration: f64, enabled: bool) -> Self {
        ToneCache {
            generator,
            volume,
            duration,
            enabled,
            entries: HashMap::new(),
        }
    }

    /// Fetch the buffer for `frequency`, synthesizing on first request.
    ///
    /// The frequency is validated before any generator runs; a corrupt
    /// buffer would persist for the whole session, so NaN/Inf and
    /// non-positive values are rejected at this boundary. With
    /// caching disabled every call synthesizes fresh.
    pub fn get(&mut self, frequency: f64) -> Result<SharedBuffer, SynthError> {
        validate_frequency(frequency)?;

        if !self.enabled {
            return Ok(self.synthesize(frequency));
        }

        let key = quantize(frequency);
        if let Some(buffer) = self.entries.get(&key) {
            return Ok(Arc::clone(buffer));
        }

        let buffer = self.synthesize(frequency);
        self.entries.insert(key, Arc::clone(&buffer));
        Ok(buffer)
    }

    /// Number of cached buffers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a buffer for this frequency is already cached.
    pub fn contains(&self, frequency: f64) -> bool {
        self.entries.contains_key(&quantize(frequency))
    }

    fn synthesize(&self, frequency: f64) -> SharedBuffer {
        let samples = self.generator.generate(frequency, self.volume, self.duration);
        Arc::new(quantize_i16(&samples))
    }
}

/// Cache key: the frequency truncated toward zero.
fn quantize(frequency: f64) -> i64 {
    frequency as i64
}

fn validate_frequency(frequency: f64) -> Result<(), SynthError> {
    if !frequency.is_finite() {
        return Err(SynthError::NonFiniteFrequency { hz: frequency });
    }
    if frequency <= 0.0 {
        return Err(SynthError::NonPositiveFrequency { hz: frequency });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::generator::Timbre;

    fn cache(enabled: bool) -> ToneCache {
        ToneCache::new(Generator::new(Timbre::Looped, 44100), 0.4, 0.05, enabled)
    }

    #[test]
    fn repeated_gets_share_one_buffer() {
        let mut c = cache(true);
        let a = c.get(523.25).expect("first get");
        let b = c.get(523.25).expect("second get");
        assert!(Arc::ptr_eq(&a, &b), "Cached gets should share the buffer");
        assert_eq!(*a, *b, "Buffers should be element-wise identical");
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn key_truncates_toward_zero() {
        let mut c = cache(true);
        let a = c.get(440.2).expect("get");
        let b = c.get(440.9).expect("get");
        assert!(Arc::ptr_eq(&a, &b), "440.2 and 440.9 share the 440 entry");
        assert_eq!(c.len(), 1);

        c.get(441.0).expect("get");
        assert_eq!(c.len(), 2);
        assert!(c.contains(440.0));
        assert!(c.contains(441.5));
        assert!(!c.contains(442.0));
    }

    #[test]
    fn disabled_cache_synthesizes_fresh() {
        let mut c = cache(false);
        let a = c.get(440.0).expect("get");
        let b = c.get(440.0).expect("get");
        assert!(!Arc::ptr_eq(&a, &b), "Bypass mode should not share buffers");
        assert_eq!(*a, *b, "Fresh synthesis is still deterministic");
        assert!(c.is_empty());
    }

    #[test]
    fn rejects_degenerate_frequencies() {
        let mut c = cache(true);
        assert!(matches!(
            c.get(0.0),
            Err(SynthError::NonPositiveFrequency { .. })
        ));
        assert!(matches!(
            c.get(-220.0),
            Err(SynthError::NonPositiveFrequency { .. })
        ));
        assert!(matches!(
            c.get(f64::NAN),
            Err(SynthError::NonFiniteFrequency { .. })
        ));
        assert!(matches!(
            c.get(f64::INFINITY),
            Err(SynthError::NonFiniteFrequency { .. })
        ));
        assert!(c.is_empty(), "Rejected frequencies must never be cached");
    }

    #[test]
    fn buffers_are_quantized_pcm() {
        let mut c = cache(true);
        let buf = c.get(440.0).expect("get");
        assert_eq!(buf.len(), 2205);
        let peak = buf.iter().fold(0_i16, |m, &s| m.max(s.abs()));
        assert!(peak > 0, "Cached buffer should contain audio");
    }
}
