//! WASM bindings for stacktoe-core
//!
//! Provides a JavaScript-friendly API for the game logic and the bots.

use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

use crate::{select_bot_move, Difficulty, GameState, GameStatus, Move, MoveError, Player, Pos};

/// WASM-friendly wrapper around GameState
#[wasm_bindgen]
pub struct WasmGame {
    inner: GameState,
    rng: StdRng,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a fresh game. The seed drives every bot decision.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WasmGame {
        WasmGame {
            inner: GameState::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Start over from the empty board, keeping the RNG stream
    pub fn reset(&mut self) {
        self.inner = GameState::new();
    }

    /// Player to move (1 or 2)
    #[wasm_bindgen(js_name = currentPlayer)]
    pub fn current_player(&self) -> u8 {
        self.inner.to_move() as u8
    }

    /// Check for winner. Returns 0 (none), 1 (First), or 2 (Second)
    #[wasm_bindgen(js_name = checkWinner)]
    pub fn check_winner(&self) -> u8 {
        self.inner.winner().map_or(0, |player| player as u8)
    }

    /// Get winning line as cell indices, or an empty array if no winner
    #[wasm_bindgen(js_name = winningLine)]
    pub fn winning_line(&self) -> Vec<u8> {
        self.inner
            .winner()
            .and_then(|winner| self.inner.board().winning_line(winner))
            .map(|line| line.iter().map(|pos| pos.0).collect())
            .unwrap_or_default()
    }

    /// Remaining pieces for a player as [small, medium, large]
    pub fn inventory(&self, player: u8) -> Vec<u8> {
        match Player::from_bits(player) {
            Some(player) => self.inner.inventory().counts(player).to_vec(),
            None => vec![],
        }
    }

    /// Cell stack as [player, size, player, size, ...], bottom to top.
    /// Sizes are 1=S, 2=M, 3=L.
    #[wasm_bindgen(js_name = cellStack)]
    pub fn cell_stack(&self, cell: u8) -> Vec<u8> {
        let pos = Pos(cell);
        if !pos.is_valid() {
            return vec![];
        }
        self.inner
            .board()
            .stack(pos)
            .into_iter()
            .flat_map(|piece| [piece.owner as u8, piece.size as u8 + 1])
            .collect()
    }

    /// Legal moves for the side to move as a JSON array, e.g.
    /// `{ "type": "place", "size": "small", "cell": 4 }` or
    /// `{ "type": "relocate", "from": 0, "to": 8 }`
    #[wasm_bindgen(js_name = legalMoves)]
    pub fn legal_moves(&self) -> Result<JsValue, JsError> {
        let moves = self.inner.generate_moves(self.inner.to_move());
        serde_wasm_bindgen::to_value(&moves).map_err(|e| JsError::new(&e.to_string()))
    }

    /// Apply a move object (same shape as `legalMoves`). Returns true if it was legal.
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, mov: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<Move>(mov) {
            Ok(mov) => self.inner.apply_move(mov).is_ok(),
            Err(_) => false,
        }
    }

    /// Let the bot play for the side to move.
    /// Returns the applied move, or null once the game is over (won, or the
    /// bot has no legal moves).
    #[wasm_bindgen(js_name = botMove)]
    pub fn bot_move(&mut self, difficulty: &str) -> Result<JsValue, JsError> {
        let difficulty: Difficulty = difficulty.parse()?;
        match self.play_bot(difficulty)? {
            Some(mov) => {
                serde_wasm_bindgen::to_value(&mov).map_err(|e| JsError::new(&e.to_string()))
            }
            None => Ok(JsValue::NULL),
        }
    }

    /// Get game result: "ongoing", "first_wins", "second_wins", or "draw"
    pub fn result(&self) -> String {
        match self.inner.status() {
            GameStatus::Ongoing => "ongoing",
            GameStatus::Won(Player::First) => "first_wins",
            GameStatus::Won(Player::Second) => "second_wins",
            GameStatus::Drawn => "draw",
        }
        .to_string()
    }

    /// Text rendering of the position, for debugging from the console
    pub fn render(&self) -> String {
        self.inner.to_string()
    }
}

impl WasmGame {
    fn play_bot(&mut self, difficulty: Difficulty) -> Result<Option<Move>, MoveError> {
        if self.inner.status() != GameStatus::Ongoing {
            return Ok(None);
        }
        let Some(mov) = select_bot_move(&self.inner, difficulty, &mut self.rng) else {
            return Ok(None);
        };
        self.inner.apply_move(mov)?;
        Ok(Some(mov))
    }
}
