//! Shared economy and progress counters.

/// Capability to read and mutate the player's cash.
pub trait CashLedger {
    /// Cash currently available.
    fn cash(&self) -> u32;

    /// Overwrites the available cash.
    fn set_cash(&mut self, cash: u32);

    /// Credits `amount` to the ledger, saturating at the numeric limit.
    fn increment_cash(&mut self, amount: u32) {
        let cash = self.cash().saturating_add(amount);
        self.set_cash(cash);
    }

    /// Deducts `amount` if enough cash is available.
    ///
    /// Returns `false` and leaves the balance untouched otherwise.
    fn try_spend(&mut self, amount: u32) -> bool {
        match self.cash().checked_sub(amount) {
            Some(remaining) => {
                self.set_cash(remaining);
                true
            }
            None => false,
        }
    }
}

/// Capability to read and mutate lives, the wave counter and the game-over flag.
pub trait ProgressLedger {
    /// Lives remaining.
    fn lives(&self) -> u32;

    /// Overwrites the remaining lives. Reaching zero ends the game.
    fn set_lives(&mut self, lives: u32);

    /// Removes a single life.
    fn lose_life(&mut self) {
        let lives = self.lives().saturating_sub(1);
        self.set_lives(lives);
    }

    /// Number of waves started so far.
    fn wave(&self) -> u32;

    /// Overwrites the wave counter.
    fn set_wave(&mut self, wave: u32);

    /// Reports whether the game has ended.
    fn game_over(&self) -> bool;

    /// Raises the game-over flag. Lowering it has no effect.
    fn set_game_over(&mut self, game_over: bool);
}

/// Authoritative status counters displayed by the HUD.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StatusLedger {
    cash: u32,
    lives: u32,
    wave: u32,
    game_over: bool,
}

impl StatusLedger {
    /// Creates a ledger with the level's starting cash and lives.
    #[must_use]
    pub const fn new(cash: u32, lives: u32) -> Self {
        Self {
            cash,
            lives,
            wave: 0,
            game_over: lives == 0,
        }
    }
}

impl CashLedger for StatusLedger {
    fn cash(&self) -> u32 {
        self.cash
    }

    fn set_cash(&mut self, cash: u32) {
        self.cash = cash;
    }
}

impl ProgressLedger for StatusLedger {
    fn lives(&self) -> u32 {
        self.lives
    }

    fn set_lives(&mut self, lives: u32) {
        self.lives = lives;
        if lives == 0 {
            self.game_over = true;
        }
    }

    fn wave(&self) -> u32 {
        self.wave
    }

    fn set_wave(&mut self, wave: u32) {
        self.wave = wave;
    }

    fn game_over(&self) -> bool {
        self.game_over
    }

    fn set_game_over(&mut self, game_over: bool) {
        self.game_over |= game_over;
    }
}
