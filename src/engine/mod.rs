//! The engine: control-thread command surface over a render-thread voice mix.
//!
//! ```text
//!  control thread                                  render thread
//!  ──────────────                                  ─────────────
//!  note_on ──→ VoiceBuilder ──→ Start(voice) ══╗
//!  note_off ─→ VoiceRegistry ─→ Release      ══╬══ rtrb ══→ Renderer ──→ voices ──→ EffectsBus ──→ device
//!  set_settings ─────────────→ Bus(params)   ══╝               │              │
//!                                                              │              └──→ scope ──→ magnitude_spectrum
//!  tick ←══════════════ retired voices (graveyard ring) ═══════┘
//! ```
//!
//! Every command is non-blocking and infallible from the caller's point of
//! view: when the audio device cannot be opened the engine stays inert and
//! commands do nothing. Only [`Engine::ensure_initialized`] reports why.

pub mod bus;
pub mod clock;
pub mod registry;
pub mod renderer;
pub mod scheduler;

use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, info, warn};

use crate::{
    analysis::{scope, ScopeReader, SpectrumAnalyzer},
    dsp::impulse::reverb_impulse,
    error::{EngineError, Result},
    io::{
        device::{AudioDevice, CpalOutput},
        mic::{CpalInput, InputSource, MicSession},
    },
    pitch::PitchSample,
    settings::{EngineConfig, SettingsPatch, SynthSettings},
    synth::{
        builder::VoiceBuilder,
        message::{BusParams, EngineMessage},
        voice::{Voice, VoiceId, TEARDOWN_MARGIN},
    },
};

use self::{bus::EffectsBus, clock::RenderClock, registry::VoiceRegistry, renderer::Renderer};

/// Highest valid MIDI note.
const MAX_NOTE: u8 = 127;
/// Retired voices in flight back to the control thread.
const GRAVEYARD_CAPACITY: usize = 256;

pub struct Engine {
    config: EngineConfig,
    settings: SynthSettings,
    device: Box<dyn AudioDevice>,
    input: Box<dyn InputSource>,
    state: EngineState,
    mic: Option<MicSession>,
    init_failures: u32,
}

enum EngineState {
    Uninitialized,
    Ready(Box<Running>),
}

/// Everything that exists once the output device is running.
struct Running {
    tx: Producer<EngineMessage>,
    graveyard: Consumer<Box<Voice>>,
    clock: RenderClock,
    builder: VoiceBuilder,
    registry: VoiceRegistry,
    scope: ScopeReader,
    analyzer: SpectrumAnalyzer,
    pending_releases: Vec<PendingRelease>,
}

/// A note-off that could not be queued yet.
#[derive(Debug, Clone, Copy)]
struct PendingRelease {
    note: u8,
    id: VoiceId,
    release: f32,
}

impl Engine {
    /// Engine on the default system output and microphone.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_io(config, Box::new(CpalOutput::new()), Box::new(CpalInput::new()))
    }

    pub fn with_io(
        config: EngineConfig,
        device: Box<dyn AudioDevice>,
        input: Box<dyn InputSource>,
    ) -> Self {
        Self {
            config,
            settings: SynthSettings::default(),
            device,
            input,
            state: EngineState::Uninitialized,
            mic: None,
            init_failures: 0,
        }
    }

    /// Open the output device and build the effects bus.
    ///
    /// Idempotent. On failure the engine stays inert and the next call
    /// tries again.
    pub fn ensure_initialized(&mut self) -> Result<()> {
        if let EngineState::Ready(_) = self.state {
            if self.device.is_suspended() {
                self.device.resume()?;
            }
            return Ok(());
        }

        match self.start_output() {
            Ok(running) => {
                self.state = EngineState::Ready(Box::new(running));
                self.init_failures = 0;
                Ok(())
            }
            Err(err) => {
                if self.init_failures == 0 {
                    warn!(%err, "audio engine unavailable");
                } else {
                    debug!(%err, attempt = self.init_failures + 1, "audio engine still unavailable");
                }
                self.init_failures += 1;
                Err(err)
            }
        }
    }

    fn start_output(&mut self) -> Result<Running> {
        let sample_rate = self.device.open(self.config.sample_rate)?;
        let mut rng = self.config.rng();

        let impulse = reverb_impulse(
            sample_rate,
            self.config.reverb_seconds,
            self.config.reverb_decay,
            &mut rng,
        );
        let bus = EffectsBus::new(BusParams::from(&self.settings), impulse, self.config.master_gain);
        let builder = VoiceBuilder::from_config(&self.config, sample_rate, &mut rng);

        let (tx, rx) = RingBuffer::new(self.config.queue_capacity.max(1));
        let (grave_tx, graveyard) = RingBuffer::new(GRAVEYARD_CAPACITY);
        let (scope_writer, scope) = scope(self.config.fft_size.max(1));
        let clock = RenderClock::new(sample_rate);

        let renderer = Renderer::new(rx, grave_tx, bus, scope_writer, clock.clone());
        self.device.start(renderer)?;

        info!(
            sample_rate,
            reverb_seconds = self.config.reverb_seconds,
            "audio engine initialised"
        );
        Ok(Running {
            tx,
            graveyard,
            clock,
            builder,
            registry: VoiceRegistry::new(),
            scope,
            analyzer: SpectrumAnalyzer::from_config(&self.config),
            pending_releases: Vec::new(),
        })
    }

    /// Start a voice for `note`, replacing any voice already on it.
    pub fn note_on(&mut self, note: u8) {
        if note > MAX_NOTE || self.ensure_initialized().is_err() {
            return;
        }
        let settings = self.settings;
        let Some(running) = self.running_mut() else {
            return;
        };
        running.collect();

        let voice = running.builder.build_voice(note, &settings);
        let id = voice.id();
        if let Err(err) = running.send(EngineMessage::Start(Box::new(voice))) {
            warn!(%err, note, "note dropped");
            return;
        }

        match running.registry.insert(note, id) {
            Some(previous) => debug!(note, ?id, replaced = ?previous.id, "voice retriggered"),
            None => debug!(note, ?id, "voice started"),
        }
    }

    /// Release the voice on `note`. Unknown or already released notes are
    /// ignored.
    ///
    /// A release that finds the command queue full is retried on every
    /// later command and [`Engine::tick`] until it gets through or the note
    /// is retriggered.
    pub fn note_off(&mut self, note: u8) {
        let release = self.settings.release;
        let Some(running) = self.running_mut() else {
            return;
        };
        running.collect();

        let Some(entry) = running.registry.get(note).copied() else {
            return;
        };
        if entry.state != registry::EntryState::Held {
            return;
        }

        if let Err(err) = running.release(note, entry.id, release) {
            warn!(%err, note, "release deferred");
            running.pending_releases.retain(|pending| pending.note != note);
            running.pending_releases.push(PendingRelease {
                note,
                id: entry.id,
                release,
            });
        }
    }

    /// Merge `patch` into the current settings.
    ///
    /// Filter and reverb changes glide on voices already sounding; the rest
    /// apply to voices started from now on.
    pub fn set_settings(&mut self, patch: SettingsPatch) {
        self.settings.merge(&patch);
        if !patch.touches_bus() {
            return;
        }
        let params = BusParams::from(&self.settings);
        if let Some(running) = self.running_mut() {
            if let Err(err) = running.send(EngineMessage::Bus(params)) {
                warn!(%err, "bus update dropped");
            }
        }
    }

    pub fn settings(&self) -> &SynthSettings {
        &self.settings
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    /// Output sample rate, once initialised.
    pub fn sample_rate(&self) -> Option<f32> {
        self.running().map(|r| r.clock.sample_rate())
    }

    /// Render-clock time in seconds, once initialised.
    pub fn current_time(&self) -> Option<f64> {
        self.running().map(|r| r.clock.now())
    }

    /// Notes with a registered voice, held or releasing, ascending.
    pub fn active_notes(&self) -> Vec<u8> {
        self.running()
            .map(|r| r.registry.notes())
            .unwrap_or_default()
    }

    /// Drop retired voices and expire registry entries past their deadline.
    ///
    /// Every command does this too; call it on a timer to keep the registry
    /// current while idle.
    pub fn tick(&mut self) {
        if let Some(running) = self.running_mut() {
            running.collect();
        }
    }

    /// Open the microphone. Returns true if a session is open afterwards.
    pub fn start_mic(&mut self) -> bool {
        if self.mic.is_some() {
            return true;
        }
        if self.ensure_initialized().is_err() {
            return false;
        }

        match self.input.open(self.config.mic_window.max(1)) {
            Ok(stream) => {
                info!(sample_rate = stream.sample_rate(), "microphone started");
                self.mic = Some(MicSession::new(stream, self.config.mic_window));
                true
            }
            Err(err) => {
                warn!(%err, "microphone unavailable");
                false
            }
        }
    }

    pub fn stop_mic(&mut self) {
        if self.mic.take().is_some() {
            info!("microphone stopped");
        }
    }

    pub fn is_mic_active(&self) -> bool {
        self.mic.is_some()
    }

    /// Pitch of the latest microphone window. `None` without an open
    /// session or without a clear pitch.
    pub fn detected_pitch(&mut self) -> Option<PitchSample> {
        self.mic.as_mut()?.detect()
    }

    /// Byte magnitude spectrum of the latest output, one value per bin.
    /// `None` until the engine is initialised.
    pub fn magnitude_spectrum(&mut self) -> Option<Vec<u8>> {
        let running = self.running_mut()?;
        let window = running.scope.snapshot(running.analyzer.fft_size());
        Some(running.analyzer.byte_frequency_data(&window))
    }

    fn running(&self) -> Option<&Running> {
        match &self.state {
            EngineState::Ready(running) => Some(running),
            EngineState::Uninitialized => None,
        }
    }

    fn running_mut(&mut self) -> Option<&mut Running> {
        match &mut self.state {
            EngineState::Ready(running) => Some(running),
            EngineState::Uninitialized => None,
        }
    }
}

impl Running {
    fn send(&mut self, message: EngineMessage) -> Result<()> {
        self.tx.push(message).map_err(|_| EngineError::QueueFull)
    }

    /// Queue the release of voice `id` on `note` and schedule its teardown.
    fn release(&mut self, note: u8, id: VoiceId, release: f32) -> Result<()> {
        self.send(EngineMessage::Release { note, id, release })?;
        let deadline = self.clock.now() + release.max(0.0) as f64 + TEARDOWN_MARGIN;
        self.registry.release(note, deadline);
        debug!(note, ?id, release, deadline, "voice released");
        Ok(())
    }

    fn retry_releases(&mut self) {
        let mut pending = std::mem::take(&mut self.pending_releases);
        pending.retain(|p| {
            let still_held = self.registry.get(p.note).is_some_and(|entry| {
                entry.id == p.id && entry.state == registry::EntryState::Held
            });
            still_held && self.release(p.note, p.id, p.release).is_err()
        });
        self.pending_releases = pending;
    }

    fn collect(&mut self) {
        let mut retired = 0;
        while let Ok(voice) = self.graveyard.pop() {
            drop(voice);
            retired += 1;
        }
        if retired > 0 {
            debug!(retired, "dropped retired voices");
        }

        for (note, id) in self.registry.poll(self.clock.now()) {
            debug!(note, ?id, "voice torn down");
        }

        if !self.pending_releases.is_empty() {
            self.retry_releases();
        }
    }
}
