//! Tic-tac-toe state machine.
//!
//! Positions are numbered 0..9 row by row. X always moves first.

use crate::errors::{Error, Result};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// One of the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    /// Moves first
    X,
    /// Moves second
    O,
}

impl Player {
    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    /// Index into a `[x_player, o_player]` pair.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::O => 1,
        }
    }

    /// Emoji used on boards and buttons.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::X => "❌",
            Self::O => "⭕",
        }
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Three in a row
    Winner(Player),
    /// Board full without a line
    Draw,
}

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// A 3x3 board and whose turn it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [Option<Player>; 9],
    turn: Player,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board with X to move.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [None; 9],
            turn: Player::X,
        }
    }

    /// The side to move next.
    #[must_use]
    pub const fn turn(&self) -> Player {
        self.turn
    }

    /// Contents of a cell, None when empty or out of range.
    #[must_use]
    pub fn cell(&self, position: usize) -> Option<Player> {
        self.cells.get(position).copied().flatten()
    }

    /// All cells, row by row.
    #[must_use]
    pub const fn cells(&self) -> &[Option<Player>; 9] {
        &self.cells
    }

    /// One-based positions of the empty cells, in order.
    pub fn valid_moves(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(position, _)| position + 1)
    }

    /// Places the current player's mark and passes the turn.
    ///
    /// # Errors
    /// Rejects positions outside 0..9, taken cells and moves after the game ended.
    pub fn make_move(&mut self, position: usize) -> Result<Player> {
        let invalid = |reason| Error::InvalidMove { position, reason };

        if position >= self.cells.len() {
            return Err(invalid("position must be in 0..9"));
        }
        if self.outcome().is_some() {
            return Err(invalid("the game is over"));
        }
        if self.cells[position].is_some() {
            return Err(invalid("position already taken"));
        }

        let player = self.turn;
        self.cells[position] = Some(player);
        self.turn = player.opponent();
        Ok(player)
    }

    /// None while the game is running.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        for [a, b, c] in LINES {
            if let Some(player) = self.cells[a] {
                if self.cells[b] == Some(player) && self.cells[c] == Some(player) {
                    return Some(Outcome::Winner(player));
                }
            }
        }

        if self.cells.iter().all(Option::is_some) {
            Some(Outcome::Draw)
        } else {
            None
        }
    }
}

/// Which side of a challenge is already busy with another game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Busy {
    /// The member who started the challenge
    Author,
    /// The challenged member
    Opponent,
}

/// Players currently in a game, shared by every game front-end.
#[derive(Debug, Default)]
pub struct ActivePlayers {
    players: Mutex<HashSet<u64>>,
}

impl ActivePlayers {
    /// Seats both players, or reports who is already playing.
    ///
    /// The seats are released when the returned guard is dropped.
    pub fn try_seat(&self, author: u64, opponent: u64) -> std::result::Result<Seats<'_>, Busy> {
        let mut players = self.players.lock().unwrap_or_else(PoisonError::into_inner);
        if players.contains(&author) {
            return Err(Busy::Author);
        }
        if players.contains(&opponent) {
            return Err(Busy::Opponent);
        }
        players.insert(author);
        players.insert(opponent);
        Ok(Seats {
            registry: self,
            players: [author, opponent],
        })
    }

    #[cfg(test)]
    fn is_playing(&self, user_id: u64) -> bool {
        self.players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&user_id)
    }
}

/// Two occupied seats in [`ActivePlayers`].
#[derive(Debug)]
pub struct Seats<'a> {
    registry: &'a ActivePlayers,
    players: [u64; 2],
}

impl Drop for Seats<'_> {
    fn drop(&mut self) {
        let mut players = self
            .registry
            .players
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for id in self.players {
            players.remove(&id);
        }
    }
}
