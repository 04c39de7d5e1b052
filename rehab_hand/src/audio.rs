//! Sound cues on a background MIDI thread.
//!
//! The game loop never blocks on audio: [`CuePlayer::play`] only posts a
//! command.  When no MIDI output is available every cue is silently dropped.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use rehab_core::Cue;

// ════════════════════════════════════════════════════════════════════════════
// CueCommand — sent to the cue thread
// ════════════════════════════════════════════════════════════════════════════

enum CueCommand {
    Play(Cue),
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut — abstraction over midir / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

trait MidiOut: Send {
    fn program_change(&mut self, channel: u8, program: u8);
    fn note_on(&mut self,  channel: u8, note: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, note: u8);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn program_change(&mut self, channel: u8, program: u8) {
        let _ = self.conn.send(&[0xC0 | (channel & 0x0F), program]);
    }
    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let _ = self.conn.send(&[0x90 | (channel & 0x0F), note, velocity]);
    }
    fn note_off(&mut self, channel: u8, note: u8) {
        let _ = self.conn.send(&[0x80 | (channel & 0x0F), note, 0]);
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

struct NullOut;
impl MidiOut for NullOut {
    fn program_change(&mut self, _ch: u8, _p: u8)   {}
    fn note_on(&mut self, _ch: u8, _n: u8, _v: u8)  {}
    fn note_off(&mut self, _ch: u8, _n: u8)          {}
}

/// Try to open the first available MIDI output port, preferring a
/// software synth.  Falls back to `NullOut` with a warning.
fn open_midi_output() -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new("rehab_hand_cues") {
        Ok(m)  => m,
        Err(e) => {
            log::warn!("MIDI init error: {} — sound cues disabled", e);
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        log::warn!("no MIDI output ports found — sound cues disabled");
        return Box::new(NullOut);
    }

    let port_idx = ports.iter().enumerate()
        .find(|(_, p)| {
            midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") ||
                n.contains("microsoft") || n.contains("synth")
            }).unwrap_or(false)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    let port = &ports[port_idx];
    let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());
    log::info!("sound cues on MIDI port: {}", name);

    match midi_out.connect(port, "rehab-cues") {
        Ok(conn) => Box::new(MidirOut { conn }),
        Err(e) => {
            log::warn!("MIDI connect failed: {} — sound cues disabled", e);
            Box::new(NullOut)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Cue melodies
// ════════════════════════════════════════════════════════════════════════════

/// (note, milliseconds) pairs for a cue.
fn melody(cue: Cue) -> &'static [(u8, u64)] {
    match cue {
        // E5 → A5, a short rising chime
        Cue::Correct => &[(76, 70), (81, 140)],
        // low G2, longer
        Cue::Fail    => &[(43, 260)],
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CuePlayer — handle to the cue thread
// ════════════════════════════════════════════════════════════════════════════

pub struct CuePlayer {
    cmd_tx: Sender<CueCommand>,
}

impl CuePlayer {
    /// Spawn the cue thread on the first MIDI port found.
    pub fn spawn(program: u8, velocity: u8) -> Self {
        Self::spawn_with(open_midi_output, program, velocity)
    }

    /// A player that swallows every cue.
    pub fn silent() -> Self {
        Self::spawn_with(|| Box::new(NullOut) as Box<dyn MidiOut>, 0, 0)
    }

    fn spawn_with<F>(open: F, program: u8, velocity: u8) -> Self
    where
        F: FnOnce() -> Box<dyn MidiOut> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<CueCommand>();
        let spawned = thread::Builder::new()
            .name("cue-player".to_string())
            .spawn(move || cue_thread(open(), program, velocity, cmd_rx));
        if let Err(e) = spawned {
            log::warn!("could not start cue thread: {} — sound cues disabled", e);
        }
        CuePlayer { cmd_tx }
    }

    /// Queue a cue.  Never blocks; errors are ignored.
    pub fn play(&self, cue: Cue) {
        let _ = self.cmd_tx.send(CueCommand::Play(cue));
    }

    pub fn quit(&self) {
        let _ = self.cmd_tx.send(CueCommand::Quit);
    }
}

impl Drop for CuePlayer {
    fn drop(&mut self) { self.quit(); }
}

const CHANNEL: u8 = 0;

fn cue_thread(mut midi: Box<dyn MidiOut>, program: u8, velocity: u8, cmd_rx: Receiver<CueCommand>) {
    midi.program_change(CHANNEL, program);
    for cmd in cmd_rx {
        match cmd {
            CueCommand::Play(cue) => {
                for &(note, ms) in melody(cue) {
                    midi.note_on(CHANNEL, note, velocity);
                    thread::sleep(Duration::from_millis(ms));
                    midi.note_off(CHANNEL, note);
                }
            }
            CueCommand::Quit => return,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(char, u8)>>>);

    impl MidiOut for Recorder {
        fn program_change(&mut self, _ch: u8, p: u8) { self.0.lock().unwrap().push(('p', p)); }
        fn note_on(&mut self, _ch: u8, n: u8, _v: u8) { self.0.lock().unwrap().push(('+', n)); }
        fn note_off(&mut self, _ch: u8, n: u8)        { self.0.lock().unwrap().push(('-', n)); }
    }

    #[test]
    fn correct_cue_rises() {
        let notes = melody(Cue::Correct);
        assert!(notes.len() >= 2);
        assert!(notes.windows(2).all(|w| w[1].0 > w[0].0));
    }

    #[test]
    fn fail_cue_is_lower_than_correct() {
        let low = melody(Cue::Fail).iter().map(|n| n.0).max().unwrap();
        let high = melody(Cue::Correct).iter().map(|n| n.0).min().unwrap();
        assert!(low < high);
    }

    #[test]
    fn cue_thread_plays_in_order_and_quits() {
        let rec = Recorder::default();
        let (tx, rx) = mpsc::channel();
        tx.send(CueCommand::Play(Cue::Fail)).unwrap();
        tx.send(CueCommand::Play(Cue::Correct)).unwrap();
        tx.send(CueCommand::Quit).unwrap();
        tx.send(CueCommand::Play(Cue::Fail)).unwrap();
        cue_thread(Box::new(rec.clone()), 11, 90, rx);

        let log = rec.0.lock().unwrap().clone();
        assert_eq!(log, vec![
            ('p', 11),
            ('+', 43), ('-', 43),
            ('+', 76), ('-', 76), ('+', 81), ('-', 81),
        ]);
    }

    #[test]
    fn silent_player_accepts_cues() {
        let p = CuePlayer::silent();
        p.play(Cue::Correct);
        p.play(Cue::Fail);
    }
}
