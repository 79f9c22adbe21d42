/// Beat playback simulation with the browser-style autoplay rule: nothing
/// plays before the first user gesture. A rejected play is downgraded to
/// "not playing" and parked; the next gesture resumes it exactly once.
#[derive(Debug, Default)]
pub struct Player {
    playing: bool,
    gesture_seen: bool,
    resume_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    Rejected,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_play(&mut self) -> PlayOutcome {
        if self.gesture_seen {
            self.playing = true;
            PlayOutcome::Started
        } else {
            self.playing = false;
            self.resume_pending = true;
            PlayOutcome::Rejected
        }
    }

    /// Records a user interaction. Returns true when a previously rejected
    /// play resumed because of it.
    pub fn note_user_gesture(&mut self) -> bool {
        self.gesture_seen = true;
        if self.resume_pending {
            self.resume_pending = false;
            self.playing = true;
            true
        } else {
            false
        }
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}
