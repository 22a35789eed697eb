pub const BOMB_SENTINEL: i8 = -1;

/// What a single click did to a tile. The caller decides what the outcome
/// is worth and whether it ends the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Revealed,
    Detonated,
    AlreadyRevealed,
    FlagProtected,
}

/// Fitness awarded or charged for each kind of click, plus the session-level
/// bonuses and penalties.
#[derive(Debug, Clone, Copy)]
pub struct Scoring {
    pub correct_tile: i64,
    pub win_bonus: i64,
    pub move_penalty: i64,
    pub bomb_penalty: i64,
    pub already_revealed: i64,
}

impl Default for Scoring {
    fn default() -> Scoring {
        Scoring {
            correct_tile: 2,
            win_bonus: 100,
            move_penalty: 0,
            bomb_penalty: -5,
            already_revealed: -2,
        }
    }
}

impl Scoring {
    pub fn click_delta(&self, outcome: ClickOutcome) -> i64 {
        match outcome {
            ClickOutcome::Revealed => self.correct_tile,
            ClickOutcome::Detonated => self.bomb_penalty,
            ClickOutcome::AlreadyRevealed => self.already_revealed,
            ClickOutcome::FlagProtected => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tile {
    is_bomb: bool,
    touching: i8,
    is_revealed: bool,
    is_flagged: bool,
}

impl Tile {
    pub fn new() -> Tile {
        Tile {
            is_bomb: false,
            touching: 0,
            is_revealed: false,
            is_flagged: false,
        }
    }

    pub fn is_bomb(&self) -> bool {
        self.is_bomb
    }

    // only meaningful once the whole board's adjacency has been assigned
    pub fn touching(&self) -> i8 {
        self.touching
    }

    pub fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    pub fn is_flagged(&self) -> bool {
        self.is_flagged
    }

    pub fn set_bomb(&mut self) {
        self.is_bomb = true;
    }

    pub(crate) fn set_touching(&mut self, touching: i8) {
        self.touching = touching;
    }

    pub fn flag(&mut self) {
        if !self.is_revealed {
            self.is_flagged = !self.is_flagged;
        }
    }

    pub fn reveal(&mut self) {
        self.is_revealed = true;
    }

    pub fn click(&mut self) -> ClickOutcome {
        if self.is_revealed {
            return ClickOutcome::AlreadyRevealed;
        }
        if self.is_flagged {
            return ClickOutcome::FlagProtected;
        }
        self.is_revealed = true;
        if self.is_bomb {
            ClickOutcome::Detonated
        } else {
            ClickOutcome::Revealed
        }
    }

    /// The only information an observer may see: the touching count once
    /// revealed, the sentinel otherwise.
    pub fn visible(&self) -> i8 {
        if self.is_revealed {
            self.touching
        } else {
            -1
        }
    }

    pub(crate) fn glyph(&self) -> char {
        if !self.is_revealed && self.is_flagged {
            return '▶';
        }
        if !self.is_revealed {
            return '□';
        }
        if self.is_bomb {
            return 'X';
        }
        if self.touching == 0 {
            '_'
        } else {
            char::from_digit(self.touching as u32, 10).unwrap_or('?')
        }
    }
}

impl Default for Tile {
    fn default() -> Tile {
        Tile::new()
    }
}
