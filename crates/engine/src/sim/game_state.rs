#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ScenePhase {
    #[default]
    Intro,
    Playing,
    Won,
}

/// How a restart request should be honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RestartKind {
    /// Put the player back at spawn; everything collected stays collected.
    Reposition,
    /// Rebuild the level from scratch.
    Reload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    phase: ScenePhase,
    has_key: bool,
    won: bool,
    coins_collected: u32,
    restart_request: Option<RestartKind>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    pub fn has_key(&self) -> bool {
        self.has_key
    }

    pub fn won(&self) -> bool {
        self.won
    }

    pub fn coins_collected(&self) -> u32 {
        self.coins_collected
    }

    pub fn restart_request(&self) -> Option<RestartKind> {
        self.restart_request
    }

    pub fn begin_play(&mut self) -> bool {
        if self.phase != ScenePhase::Intro {
            return false;
        }
        self.phase = ScenePhase::Playing;
        true
    }

    pub fn record_coin(&mut self) {
        self.coins_collected = self.coins_collected.saturating_add(1);
    }

    /// Returns true only on the first call.
    pub fn collect_key(&mut self) -> bool {
        let first = !self.has_key;
        self.has_key = true;
        first
    }

    /// Latches the win. Returns true only on the first call.
    pub fn finish(&mut self) -> bool {
        if self.won {
            return false;
        }
        self.won = true;
        self.phase = ScenePhase::Won;
        true
    }

    /// A pending reload is never downgraded to a reposition.
    pub fn request_restart(&mut self, kind: RestartKind) {
        self.restart_request = Some(match self.restart_request {
            Some(pending) => pending.max(kind),
            None => kind,
        });
    }

    pub fn take_restart_request(&mut self) -> Option<RestartKind> {
        self.restart_request.take()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
