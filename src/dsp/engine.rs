//! Tone engine: the live note lifecycle over a pluggable audio sink.
//!
//! The engine owns all mutable session state: the tuning table, the
//! tone cache, the held-modifier set, and the active-note map. Events
//! are consumed one at a time and handled to completion; per key a note
//! is either Idle or Sounding, never both. Construction and teardown
//! are explicit so multiple independent engines can coexist and tests
//! stay deterministic.

use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::dsp::cache::ToneCache;
use crate::dsp::generator::Generator;
use crate::error::PolytoneError;
use crate::events::{InputEvent, Key, KeyCode, Modifier};
use crate::sink::AudioSink;
use crate::tuning::{Tuning, TuningTable};

/// Fade length on note release. A short ramp instead of an instant stop
/// avoids audible clicks.
pub const DEFAULT_FADE_MS: u32 = 100;

/// The set of currently held octave modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifierState {
    raise: bool,
    lower: bool,
    widen: bool,
}

impl ModifierState {
    pub fn press(&mut self, modifier: Modifier) {
        match modifier {
            Modifier::Raise => self.raise = true,
            Modifier::Lower => self.lower = true,
            Modifier::Widen => self.widen = true,
        }
    }

    pub fn release(&mut self, modifier: Modifier) {
        match modifier {
            Modifier::Raise => self.raise = false,
            Modifier::Lower => self.lower = false,
            Modifier::Widen => self.widen = false,
        }
    }

    pub fn is_held(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Raise => self.raise,
            Modifier::Lower => self.lower,
            Modifier::Widen => self.widen,
        }
    }

    /// Multiplicative pitch factor for this modifier set.
    ///
    /// Raise adds one to the octave exponent, lower subtracts one.
    /// Widen doubles the accumulated exponent and shifts the baseline
    /// down one octave, so the unmodified case stays at factor 1:
    /// `2^(2e−1)` with widen held, `2^e` without.
    pub fn factor(&self) -> f64 {
        let mut exponent = 0_i32;
        if self.raise {
            exponent += 1;
        }
        if self.lower {
            exponent -= 1;
        }
        if self.widen {
            (2.0_f64).powi(2 * exponent - 1)
        } else {
            (2.0_f64).powi(exponent)
        }
    }

    /// Every combination of held modifiers, for cache pre-warming.
    pub fn all_combinations() -> [ModifierState; 8] {
        let mut states = [ModifierState::default(); 8];
        for (i, state) in states.iter_mut().enumerate() {
            state.raise = i & 1 != 0;
            state.lower = i & 2 != 0;
            state.widen = i & 4 != 0;
        }
        states
    }
}

/// Whether the event loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineControl {
    Continue,
    Quit,
}

/// A polyphonic tone engine bound to one audio sink.
pub struct ToneEngine<S: AudioSink> {
    sink: S,
    table: TuningTable,
    cache: ToneCache,
    modifiers: ModifierState,
    /// At most one sounding voice per key.
    active: HashMap<Key, S::Handle>,
    fade_ms: u32,
    tuning_defaulted: bool,
}

impl<S: AudioSink> ToneEngine<S> {
    /// Build an engine from a validated config and a sink.
    ///
    /// An unrecognized tuning name is a warning, not an error: the
    /// engine comes up in 12-TET and reports it via
    /// [`ToneEngine::tuning_was_defaulted`].
    pub fn new(config: &EngineConfig, sink: S) -> Result<Self, PolytoneError> {
        config.validate()?;

        let resolution = Tuning::resolve(&config.tuning);
        let table = TuningTable::build(&resolution.tuning(), config.reference_pitch);

        let mut generator = Generator::new(config.timbre, config.sample_rate);
        if let Some(cutoff) = config.low_pass_cutoff {
            generator = generator.with_low_pass(cutoff);
        }
        let cache = ToneCache::new(generator, config.volume, config.buffer_duration, config.cache);

        Ok(ToneEngine {
            sink,
            table,
            cache,
            modifiers: ModifierState::default(),
            active: HashMap::new(),
            fade_ms: DEFAULT_FADE_MS,
            tuning_defaulted: resolution.was_defaulted(),
        })
    }

    /// Whether the configured tuning name failed to resolve and the
    /// engine fell back to 12-TET.
    pub fn tuning_was_defaulted(&self) -> bool {
        self.tuning_defaulted
    }

    /// The pitch a press of `key` would sound right now, accounting for
    /// the currently held modifiers. `None` for keys outside the
    /// tuning layout.
    pub fn effective_frequency(&self, key: Key) -> Option<f64> {
        self.table
            .frequency(key)
            .map(|f| f * self.modifiers.factor())
    }

    /// Start (or restart) the note for `key`.
    ///
    /// Unknown keys are a no-op returning `Ok(false)`. A re-press while
    /// the key is already sounding stops the old voice and starts a
    /// fresh one: exactly one active note per key, never two stacked.
    /// If the sink rejects playback, no active-note entry is left
    /// behind.
    pub fn note_on(&mut self, key: Key) -> Result<bool, PolytoneError> {
        let Some(base) = self.table.frequency(key) else {
            return Ok(false);
        };
        let frequency = base * self.modifiers.factor();
        let buffer = self.cache.get(frequency)?;

        if let Some(old) = self.active.remove(&key) {
            self.sink.stop(&old);
        }

        let handle = self.sink.play(&buffer)?;
        self.active.insert(key, handle);
        log::debug!("Playing: {key} | {frequency}Hz");
        Ok(true)
    }

    /// Release the note for `key`, fading it out. No-op when the key is
    /// not sounding; returns whether a voice was released.
    pub fn note_off(&mut self, key: Key) -> bool {
        match self.active.remove(&key) {
            Some(handle) => {
                self.sink.fade_out(&handle, self.fade_ms);
                log::debug!("Released: {key}");
                true
            }
            None => false,
        }
    }

    /// Dispatch one input event.
    ///
    /// Modifier changes take effect for subsequent presses only; notes
    /// already sounding keep their pitch. Unknown note keys fall
    /// through as no-ops, so a stray press never stops the loop.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<EngineControl, PolytoneError> {
        match event {
            InputEvent::Quit => return Ok(EngineControl::Quit),
            InputEvent::KeyDown(KeyCode::Modifier(m)) => self.modifiers.press(m),
            InputEvent::KeyUp(KeyCode::Modifier(m)) => self.modifiers.release(m),
            InputEvent::KeyDown(KeyCode::Note(key)) => {
                self.note_on(key)?;
            }
            InputEvent::KeyUp(KeyCode::Note(key)) => {
                self.note_off(key);
            }
        }
        Ok(EngineControl::Continue)
    }

    /// Populate the tone cache for every reachable frequency (all
    /// table keys across all modifier combinations) so first presses
    /// pay no synthesis latency.
    pub fn prewarm(&mut self) -> Result<(), PolytoneError> {
        let bases: Vec<f64> = self.table.iter().map(|(_, freq)| freq).collect();
        for state in ModifierState::all_combinations() {
            let factor = state.factor();
            for &base in &bases {
                self.cache.get(base * factor)?;
            }
        }
        log::debug!("Prewarmed {} tones", self.cache.len());
        Ok(())
    }

    /// Fade out every sounding note. Deterministic teardown for the
    /// owning process.
    pub fn all_notes_off(&mut self) {
        for (_, handle) in self.active.drain() {
            self.sink.fade_out(&handle, self.fade_ms);
        }
    }

    /// Number of currently sounding notes.
    pub fn active_notes(&self) -> usize {
        self.active.len()
    }

    pub fn is_sounding(&self, key: Key) -> bool {
        self.active.contains_key(&key)
    }

    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    /// Number of distinct tones currently cached.
    pub fn cached_tones(&self) -> usize {
        self.cache.len()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::generator::Timbre;
    use crate::sink::{SharedBuffer, SinkError};
    use std::sync::Arc;

    /// Records every sink call; handles are sequence numbers.
    #[derive(Default)]
    struct TestSink {
        next_handle: usize,
        plays: Vec<(usize, SharedBuffer)>,
        stops: Vec<usize>,
        fades: Vec<(usize, u32)>,
        fail_next_play: bool,
    }

    impl AudioSink for TestSink {
        type Handle = usize;

        fn play(&mut self, buffer: &SharedBuffer) -> Result<usize, SinkError> {
            if self.fail_next_play {
                self.fail_next_play = false;
                return Err(SinkError::Unavailable);
            }
            let handle = self.next_handle;
            self.next_handle += 1;
            self.plays.push((handle, Arc::clone(buffer)));
            Ok(handle)
        }

        fn stop(&mut self, handle: &usize) {
            self.stops.push(*handle);
        }

        fn fade_out(&mut self, handle: &usize, duration_ms: u32) {
            self.fades.push((*handle, duration_ms));
        }
    }

    fn test_config() -> EngineConfig {
        EngineConfig {
            timbre: Timbre::Looped,
            buffer_duration: 0.05,
            ..Default::default()
        }
    }

    fn engine() -> ToneEngine<TestSink> {
        ToneEngine::new(&test_config(), TestSink::default()).expect("engine build")
    }

    #[test]
    fn modifier_factor_table() {
        let cases: &[(&[Modifier], f64)] = &[
            (&[], 1.0),
            (&[Modifier::Raise], 2.0),
            (&[Modifier::Lower], 0.5),
            (&[Modifier::Raise, Modifier::Widen], 2.0),
            (&[Modifier::Lower, Modifier::Widen], 0.125),
            (&[Modifier::Widen], 0.5),
            (&[Modifier::Raise, Modifier::Lower], 1.0),
        ];
        for (held, expected) in cases {
            let mut state = ModifierState::default();
            for &m in *held {
                state.press(m);
            }
            assert_eq!(
                state.factor(),
                *expected,
                "factor for {held:?} should be {expected}"
            );
        }
    }

    #[test]
    fn modifier_release_restores_neutral() {
        let mut state = ModifierState::default();
        state.press(Modifier::Raise);
        assert!(state.is_held(Modifier::Raise));
        state.release(Modifier::Raise);
        assert_eq!(state.factor(), 1.0);
        assert_eq!(state, ModifierState::default());
    }

    #[test]
    fn unknown_key_is_a_noop() {
        let mut e = engine();
        // 'Q' is outside the 12TET layout.
        let started = e.note_on(Key::new('Q')).expect("note_on");
        assert!(!started);
        assert_eq!(e.active_notes(), 0);
        assert!(e.sink().plays.is_empty());
    }

    #[test]
    fn note_on_starts_one_voice() {
        let mut e = engine();
        let started = e.note_on(Key::new('Z')).expect("note_on");
        assert!(started);
        assert_eq!(e.active_notes(), 1);
        assert!(e.is_sounding(Key::new('z')));
        assert_eq!(e.sink().plays.len(), 1);
    }

    #[test]
    fn repress_restarts_instead_of_stacking() {
        let mut e = engine();
        e.note_on(Key::new('Z')).expect("first press");
        e.note_on(Key::new('Z')).expect("second press");

        assert_eq!(e.active_notes(), 1, "Re-press must not stack voices");
        assert_eq!(e.sink().plays.len(), 2);
        // Exactly one stop: the first voice, replaced by the second.
        assert_eq!(e.sink().stops, vec![0]);
    }

    #[test]
    fn note_off_fades_instead_of_stopping() {
        let mut e = engine();
        e.note_on(Key::new('Z')).expect("press");
        assert!(e.note_off(Key::new('z')));

        assert_eq!(e.active_notes(), 0);
        assert!(e.sink().stops.is_empty(), "Release should fade, not stop");
        assert_eq!(e.sink().fades, vec![(0, DEFAULT_FADE_MS)]);

        // Releasing again is a no-op.
        assert!(!e.note_off(Key::new('Z')));
        assert_eq!(e.sink().fades.len(), 1);
    }

    #[test]
    fn cached_buffer_is_shared_across_replays() {
        let mut e = engine();
        e.note_on(Key::new('Z')).expect("press");
        e.note_off(Key::new('Z'));
        e.note_on(Key::new('Z')).expect("press again");

        let plays = &e.sink().plays;
        assert!(
            Arc::ptr_eq(&plays[0].1, &plays[1].1),
            "Replays of the same pitch should share one cached buffer"
        );
    }

    #[test]
    fn failed_play_leaves_no_dangling_note() {
        let mut e = engine();
        e.sink_mut().fail_next_play = true;
        let result = e.note_on(Key::new('Z'));
        assert!(matches!(result, Err(PolytoneError::Sink(SinkError::Unavailable))));
        assert_eq!(e.active_notes(), 0, "Failed play must not register a note");
    }

    #[test]
    fn modifier_changes_apply_to_next_press_only() {
        let mut e = engine();
        let base = e.effective_frequency(Key::new('Z')).expect("anchor");

        e.handle_event(InputEvent::KeyDown(KeyCode::Modifier(Modifier::Lower)))
            .expect("modifier down");
        let lowered = e.effective_frequency(Key::new('Z')).expect("anchor");
        assert!((lowered - base / 2.0).abs() < 1e-9);

        e.handle_event(InputEvent::KeyUp(KeyCode::Modifier(Modifier::Lower)))
            .expect("modifier up");
        let restored = e.effective_frequency(Key::new('Z')).expect("anchor");
        assert_eq!(restored, base);
    }

    #[test]
    fn anchor_key_pitch_matches_reference() {
        // 12TET at A=440: the anchor key sounds A × 2^(3/12) ≈ 523.25 Hz.
        let e = engine();
        let f = e.effective_frequency(Key::new('Z')).expect("anchor");
        let expected = 440.0 * (2.0_f64).powf(3.0 / 12.0);
        assert!((f - expected).abs() < 1e-9, "Anchor should be {expected}, got {f}");
    }

    #[test]
    fn event_loop_end_to_end() {
        let mut e = engine();

        assert_eq!(
            e.handle_event(InputEvent::note_down('z')).expect("press"),
            EngineControl::Continue
        );
        assert!(e.is_sounding(Key::new('Z')));

        // Lower + re-press: restart at half pitch.
        e.handle_event(InputEvent::KeyDown(KeyCode::Modifier(Modifier::Lower)))
            .expect("modifier");
        e.handle_event(InputEvent::note_down('z')).expect("re-press");
        assert_eq!(e.active_notes(), 1);
        assert_eq!(e.sink().plays.len(), 2);

        // Release fades.
        e.handle_event(InputEvent::note_up('Z')).expect("release");
        assert_eq!(e.active_notes(), 0);
        assert_eq!(e.sink().fades.len(), 1);

        assert_eq!(
            e.handle_event(InputEvent::Quit).expect("quit"),
            EngineControl::Quit
        );
    }

    #[test]
    fn prewarm_covers_all_reachable_tones() {
        let mut e = engine();
        e.prewarm().expect("prewarm");
        let warmed = e.cached_tones();
        assert!(warmed > 0);

        // Interactive presses hit the warmed cache, adding nothing.
        e.note_on(Key::new('Z')).expect("press");
        e.handle_event(InputEvent::KeyDown(KeyCode::Modifier(Modifier::Raise)))
            .expect("modifier");
        e.note_on(Key::new('X')).expect("press");
        assert_eq!(e.cached_tones(), warmed);
    }

    #[test]
    fn unrecognized_tuning_defaults_with_warning_flag() {
        let config = EngineConfig {
            tuning: "NotARealTuning".to_string(),
            ..test_config()
        };
        let e = ToneEngine::new(&config, TestSink::default()).expect("engine build");
        assert!(e.tuning_was_defaulted());
        // Fallback is 12TET: the anchor key resolves.
        assert!(e.effective_frequency(Key::new('Z')).is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            volume: 2.0,
            ..test_config()
        };
        assert!(matches!(
            ToneEngine::new(&config, TestSink::default()),
            Err(PolytoneError::Config(_))
        ));
    }

    #[test]
    fn all_notes_off_fades_everything() {
        let mut e = engine();
        e.note_on(Key::new('Z')).expect("press");
        e.note_on(Key::new('X')).expect("press");
        assert_eq!(e.active_notes(), 2);

        e.all_notes_off();
        assert_eq!(e.active_notes(), 0);
        assert_eq!(e.sink().fades.len(), 2);
    }
}
