//! keyvox - event loop, held notes and polling of the engine's read-outs

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;

use keyvox::{Engine, OscType, PitchSample, Preset, SettingsPatch};

use super::{keymap, ui};

/// Terminals report key presses but not releases: a note sounds this long
/// after the last press or auto-repeat of its key.
const HOLD: Duration = Duration::from_millis(300);
const PITCH_POLL: Duration = Duration::from_millis(80);
const FRAME: Duration = Duration::from_millis(16);

/// What the UI draws each frame.
pub struct View {
    pub preset: Option<Preset>,
    pub osc_type: OscType,
    pub sample_rate: Option<f32>,
    pub held: Vec<u8>,
    pub spectrum: Vec<u8>,
    pub mic_active: bool,
    pub pitch: Option<PitchSample>,
    pub status: String,
}

pub struct App {
    engine: Engine,
    /// Sounding keys and when they let go.
    held: Vec<(u8, Instant)>,
    last_pitch_poll: Instant,
    view: View,
    should_quit: bool,
}

impl App {
    pub fn new(engine: Engine) -> Self {
        let osc_type = engine.settings().osc_type;
        Self {
            engine,
            held: Vec::new(),
            last_pitch_poll: Instant::now(),
            view: View {
                preset: None,
                osc_type,
                sample_rate: None,
                held: Vec::new(),
                spectrum: Vec::new(),
                mic_active: false,
                pitch: None,
                status: "press a key to start audio".into(),
            },
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.release_expired(Instant::now());
            self.engine.tick();
            self.poll_engine();

            terminal.draw(|frame| ui::render(frame, &self.view))?;

            if event::poll(FRAME)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }

        for (note, _) in self.held.drain(..) {
            self.engine.note_off(note);
        }
        self.engine.stop_mic();
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        let repeat = key.kind == KeyEventKind::Repeat;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('m') if !repeat => self.toggle_mic(),
            KeyCode::Char('v') if !repeat => self.toggle_vocal(),
            KeyCode::Char(c @ '1'..='4') if !repeat => {
                let preset = Preset::ALL[(c as u8 - b'1') as usize];
                self.engine.set_settings(preset.patch());
                self.view.preset = Some(preset);
                self.view.osc_type = self.engine.settings().osc_type;
                self.view.status = format!("preset: {}", preset.name());
            }
            KeyCode::Char(c) => {
                if let Some(note) = keymap::note_for_key(c) {
                    self.press(note, repeat);
                }
            }
            _ => {}
        }
    }

    fn press(&mut self, note: u8, repeat: bool) {
        let until = Instant::now() + HOLD;
        if let Some(held) = self.held.iter_mut().find(|(n, _)| *n == note) {
            held.1 = until;
            if repeat {
                return;
            }
        } else {
            self.held.push((note, until));
        }

        self.engine.note_on(note);
        if !self.engine.is_initialized() {
            self.view.status = "audio output unavailable".into();
        }
    }

    fn release_expired(&mut self, now: Instant) {
        let engine = &mut self.engine;
        self.held.retain(|&(note, until)| {
            let keep = until > now;
            if !keep {
                engine.note_off(note);
            }
            keep
        });
    }

    fn toggle_mic(&mut self) {
        if self.engine.is_mic_active() {
            self.engine.stop_mic();
            self.view.pitch = None;
            self.view.status = "microphone off".into();
        } else if self.engine.start_mic() {
            self.view.status = "microphone on".into();
        } else {
            self.view.status = "microphone unavailable".into();
        }
    }

    fn toggle_vocal(&mut self) {
        let osc_type = match self.engine.settings().osc_type {
            OscType::Vocal => OscType::Triangle,
            _ => OscType::Vocal,
        };
        self.engine
            .set_settings(SettingsPatch::new().osc_type(osc_type));
        self.view.osc_type = osc_type;
        self.view.status = format!("timbre: {osc_type:?}");
    }

    fn poll_engine(&mut self) {
        self.view.sample_rate = self.engine.sample_rate();
        self.view.mic_active = self.engine.is_mic_active();
        self.view.held = self.held.iter().map(|&(note, _)| note).collect();
        if let Some(spectrum) = self.engine.magnitude_spectrum() {
            self.view.spectrum = spectrum;
        }

        if self.view.mic_active && self.last_pitch_poll.elapsed() >= PITCH_POLL {
            self.last_pitch_poll = Instant::now();
            // Hold the last reading through brief gaps
            if let Some(pitch) = self.engine.detected_pitch() {
                self.view.pitch = Some(pitch);
            }
        }
    }
}
