// Sequencer - clock, track and live MIDI, split between audio and control side
//
// `Sequencer` lives in the audio callback and owns the track. `SequencerHandle` is
// the cloneable control surface used by the console. Both sides share one
// `SharedSequencerState`: the clock (play head, tempo, time signature) behind a
// mutex held for a whole render, the atomic transport, the melody, and the synth slot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::melody::Melody;
use super::note::{Note, NoteError, NoteId};
use super::play_head::{LoopRange, PlayHead, PlayHeadError};
use super::render_context::RenderContext;
use super::tempo::{DEFAULT_BPM, Tempo, TempoError};
use super::time_signature::TimeSignature;
use super::track::Track;
use super::transport::{PlayState, SharedTransport};
use crate::audio::buffer::AudioBuffer;
use crate::midi::buffer::{DEFAULT_MIDI_BUFFER_CAPACITY, MidiBuffer};
use crate::midi::collector::{
    DEFAULT_MIDI_QUEUE_CAPACITY, MidiCollector, MidiQueueProducer, create_midi_queue,
};
use crate::midi::input::{MidiError, MidiInput};
use crate::synth::envelope::AdsrParams;
use crate::synth::modulation_synth::DEFAULT_NUM_VOICES;
use crate::synth::{SynthError, SynthKind, SynthSlot};

/// Velocity of notes entered with `add_note`
pub const DEFAULT_NOTE_VELOCITY: u8 = 100;

type TempoCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Start-up parameters of a sequencer pair
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerSettings {
    pub tempo_bpm: f64,
    pub time_signature: TimeSignature,
    /// Loop the first N bars; `None` plays straight through
    pub loop_bars: Option<u64>,
    pub synth: SynthKind,
    pub num_voices: usize,
    pub envelope: AdsrParams,
    pub midi_queue_capacity: usize,
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            tempo_bpm: DEFAULT_BPM,
            time_signature: TimeSignature::default(),
            loop_bars: Some(1),
            synth: SynthKind::default(),
            num_voices: DEFAULT_NUM_VOICES,
            envelope: AdsrParams::default(),
            midi_queue_capacity: DEFAULT_MIDI_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug)]
pub struct Clock {
    pub play_head: PlayHead,
    pub tempo: Tempo,
    pub time_signature: TimeSignature,
    /// Set when the loop was given in bars, so it follows time signature changes
    loop_bars: Option<u64>,
}

impl Clock {
    fn new(tempo: Tempo, time_signature: TimeSignature) -> Self {
        let mut clock = Self {
            play_head: PlayHead::new(),
            tempo,
            time_signature,
            loop_bars: None,
        };
        clock.update_tick_time();
        clock
    }

    fn update_tick_time(&mut self) {
        let tick_time = self
            .tempo
            .tick_time_ms(self.time_signature.ticks_per_quarter_note());
        // Both inputs are validated, the result is always finite and positive
        if let Err(err) = self.play_head.set_tick_time_ms(tick_time) {
            log::error!("Tempo produced an unusable tick time: {}", err);
        }
    }

    fn set_loop_bars(&mut self, bars: u64) -> Result<(), PlayHeadError> {
        let end = bars.saturating_mul(self.time_signature.ticks_per_bar());
        self.play_head.set_looping(0, end)?;
        self.loop_bars = Some(bars);
        Ok(())
    }
}

pub struct SharedSequencerState {
    clock: Mutex<Clock>,
    transport: SharedTransport,
    melody: Arc<Melody>,
    synth: Arc<SynthSlot>,
    record_enabled: Arc<AtomicBool>,
    tempo_listener: Mutex<Option<TempoCallback>>,
}

impl SharedSequencerState {
    fn lock_clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.transport
    }

    pub fn melody(&self) -> &Arc<Melody> {
        &self.melody
    }

    pub fn synth(&self) -> &Arc<SynthSlot> {
        &self.synth
    }
}

/// Audio-thread side
pub struct Sequencer {
    shared: Arc<SharedSequencerState>,
    track: Track,
    sample_rate: f64,
    midi_collector: MidiCollector,
    external_midi: MidiBuffer,
}

impl Sequencer {
    /// Build the audio side and its control handle with the built-in synth
    pub fn new(settings: &SequencerSettings) -> Result<(Self, SequencerHandle), SequencerError> {
        let synth = Arc::new(SynthSlot::new(
            settings.synth,
            settings.num_voices,
            settings.envelope,
        ));
        Self::with_synth_slot(settings, synth)
    }

    /// Same as `new` with a caller-provided synth slot
    pub fn with_synth_slot(
        settings: &SequencerSettings,
        synth: Arc<SynthSlot>,
    ) -> Result<(Self, SequencerHandle), SequencerError> {
        let tempo = Tempo::new(settings.tempo_bpm)?;
        let mut clock = Clock::new(tempo, settings.time_signature);
        if let Some(bars) = settings.loop_bars {
            clock.set_loop_bars(bars)?;
        }

        let melody = Arc::new(Melody::new());
        let record_enabled = Arc::new(AtomicBool::new(true));
        let shared = Arc::new(SharedSequencerState {
            clock: Mutex::new(clock),
            transport: SharedTransport::new(),
            melody: Arc::clone(&melody),
            synth: Arc::clone(&synth),
            record_enabled: Arc::clone(&record_enabled),
            tempo_listener: Mutex::new(None),
        });

        let (producer, midi_collector) = create_midi_queue(settings.midi_queue_capacity.max(1));

        let sequencer = Self {
            shared: Arc::clone(&shared),
            track: Track::new(melody, synth, record_enabled),
            sample_rate: 0.0,
            midi_collector,
            external_midi: MidiBuffer::with_capacity(DEFAULT_MIDI_BUFFER_CAPACITY),
        };

        let handle = SequencerHandle {
            shared,
            midi_producer: Arc::new(Mutex::new(producer)),
            midi_input: Arc::new(Mutex::new(None)),
        };

        Ok((sequencer, handle))
    }

    pub fn prepare(&mut self, sample_rate: f64, max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.track.prepare(sample_rate, max_block_size);
        self.midi_collector.set_sample_rate(sample_rate);
    }

    pub fn release(&mut self) {
        self.track.release();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn shared(&self) -> &Arc<SharedSequencerState> {
        &self.shared
    }

    /// Render one device buffer. `audio` is cleared, then the track adds into it.
    pub fn get_next_audio_block(&mut self, audio: &mut AudioBuffer) {
        audio.clear();
        let num_samples = audio.num_samples();
        if self.sample_rate <= 0.0 || num_samples == 0 {
            return;
        }

        let callback_duration_ms = num_samples as f64 / self.sample_rate * 1000.0;

        self.external_midi.clear();
        self.midi_collector
            .remove_next_block_of_messages(&mut self.external_midi, num_samples);

        let play_state = self.shared.transport.state();

        let mut clock = self.shared.lock_clock();
        if clock.play_head.device_callback_duration_ms() != callback_duration_ms {
            clock
                .play_head
                .set_device_callback_duration_ms(callback_duration_ms);
        }

        {
            let clock = &*clock;
            let mut context = RenderContext {
                audio,
                external_midi: &self.external_midi,
                play_head: &clock.play_head,
                time_signature: &clock.time_signature,
                play_state,
                sample_rate: self.sample_rate,
            };
            self.track.render_next_block(&mut context);
        }

        if !play_state.is_stopped() {
            clock.play_head.advance_device_buffer();
        }
    }
}

/// Read-only picture of the sequencer for listings
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerSnapshot {
    pub tempo_bpm: f64,
    pub time_signature: TimeSignature,
    pub play_state: PlayState,
    pub notes: Vec<(NoteId, Note)>,
    pub loop_range: Option<LoopRange>,
    pub current_tick: u64,
    pub synth_kind: Option<SynthKind>,
    pub midi_input: Option<String>,
    pub record_enabled: bool,
}

/// Control side, safe to use from any thread while the audio side renders
#[derive(Clone)]
pub struct SequencerHandle {
    shared: Arc<SharedSequencerState>,
    midi_producer: Arc<Mutex<MidiQueueProducer>>,
    midi_input: Arc<Mutex<Option<MidiInput>>>,
}

impl SequencerHandle {
    // Transport ---------------------------------------------------------

    pub fn start_playback(&self) {
        self.shared.transport.start_playback();
    }

    pub fn stop_playback(&self) {
        self.shared.transport.stop_playback();
    }

    pub fn start_recording(&self) {
        self.shared.transport.start_recording();
    }

    pub fn start_export(&self) {
        self.shared.transport.start_export();
    }

    pub fn play_state(&self) -> PlayState {
        self.shared.transport.state()
    }

    // Tempo / time signature ----------------------------------------------

    /// Validate, store and push the new tick time into the play head
    pub fn set_tempo_bpm(&self, bpm: f64) -> Result<(), TempoError> {
        let tempo = Tempo::new(bpm)?;
        {
            let mut clock = self.shared.lock_clock();
            clock.tempo = tempo;
            clock.update_tick_time();
        }

        let listener = self
            .shared
            .tempo_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener(bpm);
        }
        Ok(())
    }

    pub fn tempo_bpm(&self) -> f64 {
        self.shared.lock_clock().tempo.bpm()
    }

    /// Called with the new BPM after every successful tempo change
    pub fn on_tempo_change(&self, callback: impl Fn(f64) + Send + Sync + 'static) {
        *self
            .shared
            .tempo_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
    }

    pub fn set_time_signature(&self, time_signature: TimeSignature) -> Result<(), PlayHeadError> {
        let mut clock = self.shared.lock_clock();
        clock.time_signature = time_signature;
        clock.update_tick_time();
        if let Some(bars) = clock.loop_bars {
            clock.set_loop_bars(bars)?;
        }
        Ok(())
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.shared.lock_clock().time_signature
    }

    // Looping / position -------------------------------------------------

    /// Loop over `[start, end)` ticks
    pub fn set_loop_ticks(&self, start: u64, end: u64) -> Result<(), PlayHeadError> {
        let mut clock = self.shared.lock_clock();
        clock.play_head.set_looping(start, end)?;
        clock.loop_bars = None;
        Ok(())
    }

    /// Loop over the first `bars` bars
    pub fn set_loop_bars(&self, bars: u64) -> Result<(), PlayHeadError> {
        self.shared.lock_clock().set_loop_bars(bars)
    }

    pub fn clear_looping(&self) {
        let mut clock = self.shared.lock_clock();
        clock.play_head.clear_looping();
        clock.loop_bars = None;
    }

    pub fn loop_range(&self) -> Option<LoopRange> {
        self.shared.lock_clock().play_head.looping_range()
    }

    pub fn set_position_in_ticks(&self, tick: u64) {
        self.shared.lock_clock().play_head.set_position_in_ticks(tick);
    }

    pub fn current_tick(&self) -> u64 {
        self.shared.lock_clock().play_head.current_tick()
    }

    /// Duration of the last device buffer rendered, in ms
    pub fn device_callback_duration_ms(&self) -> f64 {
        self.shared.lock_clock().play_head.device_callback_duration_ms()
    }

    // Notes ----------------------------------------------------------------

    /// Add a note lasting one beat of the time signature, at velocity 100
    pub fn add_note(&self, note_number: u8, start_tick: u64) -> Result<NoteId, NoteError> {
        let length = self.time_signature().ticks_per_denominator();
        let note = Note::new(note_number, DEFAULT_NOTE_VELOCITY, start_tick, length)?;
        Ok(self.insert_note(note))
    }

    pub fn insert_note(&self, note: Note) -> NoteId {
        self.shared.melody.add_note(note)
    }

    pub fn remove_note(&self, id: NoteId) -> Option<Note> {
        self.shared.melody.remove_note(id)
    }

    pub fn notes(&self) -> Vec<(NoteId, Note)> {
        self.shared.melody.notes()
    }

    pub fn melody(&self) -> &Arc<Melody> {
        &self.shared.melody
    }

    // Synth ------------------------------------------------------------------

    /// Returns false when `kind` is already playing
    pub fn switch_synth(&self, kind: SynthKind) -> bool {
        self.shared.synth.switch(kind)
    }

    pub fn synth_kind(&self) -> Option<SynthKind> {
        self.shared.synth.kind()
    }

    pub fn set_ratios(&self, ratios: &[f64]) -> Result<(), SynthError> {
        self.shared.synth.set_ratios(ratios)
    }

    /// Times in seconds, sustain level in 0..1 (out-of-range values are clamped)
    pub fn set_envelope(&self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.shared
            .synth
            .set_envelope(AdsrParams::new(attack, decay, sustain, release));
    }

    pub fn envelope(&self) -> AdsrParams {
        self.shared.synth.envelope()
    }

    // Live MIDI --------------------------------------------------------------

    pub fn set_record_enabled(&self, enabled: bool) {
        self.shared.record_enabled.store(enabled, Ordering::Release);
    }

    pub fn is_record_enabled(&self) -> bool {
        self.shared.record_enabled.load(Ordering::Acquire)
    }

    /// Open the input port best matching `name` and route it to the track.
    /// Returns the full port name. The previous connection is closed on success.
    pub fn open_midi_input(&self, name: &str) -> Result<String, MidiError> {
        // Blocking device work happens before touching any shared lock
        let input = MidiInput::open(name, Arc::clone(&self.midi_producer))?;
        let port_name = input.port_name().to_string();

        let previous = self
            .midi_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(input);
        drop(previous);

        log::info!("MIDI input '{}' connected", port_name);
        Ok(port_name)
    }

    pub fn close_midi_input(&self) -> Option<String> {
        let previous = self
            .midi_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        previous.map(|input| {
            let name = input.port_name().to_string();
            log::info!("MIDI input '{}' closed", name);
            name
        })
    }

    pub fn midi_input_name(&self) -> Option<String> {
        self.midi_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|input| input.port_name().to_string())
    }

    /// Producer end of the live MIDI queue (what the MIDI input callback writes to)
    pub fn midi_producer(&self) -> Arc<Mutex<MidiQueueProducer>> {
        Arc::clone(&self.midi_producer)
    }

    // State ------------------------------------------------------------------

    pub fn snapshot(&self) -> SequencerSnapshot {
        let (tempo_bpm, time_signature, loop_range, current_tick) = {
            let clock = self.shared.lock_clock();
            (
                clock.tempo.bpm(),
                clock.time_signature,
                clock.play_head.looping_range(),
                clock.play_head.current_tick(),
            )
        };

        SequencerSnapshot {
            tempo_bpm,
            time_signature,
            play_state: self.play_state(),
            notes: self.notes(),
            loop_range,
            current_tick,
            synth_kind: self.synth_kind(),
            midi_input: self.midi_input_name(),
            record_enabled: self.is_record_enabled(),
        }
    }
}

/// Errors raised while building or reconfiguring a sequencer
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error(transparent)]
    Tempo(#[from] TempoError),

    #[error(transparent)]
    TimeSignature(#[from] super::time_signature::TimeSignatureError),

    #[error(transparent)]
    PlayHead(#[from] PlayHeadError),

    #[error(transparent)]
    Note(#[from] NoteError),

    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Midi(#[from] MidiError),
}
