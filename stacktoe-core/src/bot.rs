//! Bot move selection per difficulty tier.
//!
//! | Difficulty       | Strategy                                  |
//! |------------------|-------------------------------------------|
//! | `Easy`           | uniformly random legal move               |
//! | `Medium`, `Hard` | win now, else block, else random          |
//! | `Expert`         | depth-limited minimax, else random        |
//!
//! Medium and Hard share one strategy.

use std::fmt;
use std::str::FromStr;

use rand::seq::IndexedRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::search::{find_blocking_move, find_winning_move, search};
use crate::{GameState, Move};

/// Bot strength selected by the player.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    /// The move-selection policy for this tier.
    pub fn strategy(self) -> &'static dyn Strategy {
        match self {
            Difficulty::Easy => &RandomStrategy,
            Difficulty::Medium | Difficulty::Hard => &TacticalStrategy,
            Difficulty::Expert => &MinimaxStrategy,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown difficulty name.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Unknown difficulty {:?} (expected easy, medium, hard or expert)", _0)]
pub struct ParseDifficultyError(pub String);

impl std::error::Error for ParseDifficultyError {}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|difficulty| difficulty.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseDifficultyError(s.to_string()))
    }
}

/// A move-selection policy.
///
/// `moves` is the non-empty list of legal moves for `state.to_move()`, in
/// generation order.
pub trait Strategy {
    fn name(&self) -> &'static str;

    fn choose(&self, state: &GameState, moves: &[Move], rng: &mut dyn RngCore) -> Option<Move>;
}

/// Uniformly random legal move.
pub struct RandomStrategy;

impl Strategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose(&self, _state: &GameState, moves: &[Move], rng: &mut dyn RngCore) -> Option<Move> {
        moves.choose(rng).copied()
    }
}

/// Immediate win, else a block of the opponent's immediate win, else random.
pub struct TacticalStrategy;

impl Strategy for TacticalStrategy {
    fn name(&self) -> &'static str {
        "tactical"
    }

    fn choose(&self, state: &GameState, moves: &[Move], rng: &mut dyn RngCore) -> Option<Move> {
        let bot = state.to_move();
        find_winning_move(state, bot)
            .or_else(|| find_blocking_move(state, bot))
            .or_else(|| RandomStrategy.choose(state, moves, rng))
    }
}

/// Fixed-depth minimax, with a random fallback.
pub struct MinimaxStrategy;

impl Strategy for MinimaxStrategy {
    fn name(&self) -> &'static str {
        "minimax"
    }

    fn choose(&self, state: &GameState, moves: &[Move], rng: &mut dyn RngCore) -> Option<Move> {
        let result = search(state, state.to_move());
        debug!(
            score = result.score,
            nodes = result.stats.nodes,
            terminals = result.stats.terminals,
            cutoffs = result.stats.cutoffs,
            "minimax stats"
        );
        result
            .best_move
            .or_else(|| RandomStrategy.choose(state, moves, rng))
    }
}

/// Pick a move for the side to move at `difficulty`.
///
/// Returns `None` when the side to move has no legal moves: the game is
/// drawn, not broken.
pub fn select_bot_move(
    state: &GameState,
    difficulty: Difficulty,
    rng: &mut dyn RngCore,
) -> Option<Move> {
    let bot = state.to_move();
    let moves = state.generate_moves(bot);
    if moves.is_empty() {
        debug!(?bot, %difficulty, "no legal moves, game is drawn");
        return None;
    }

    let strategy = difficulty.strategy();
    let chosen = strategy.choose(state, &moves, rng);
    debug!(
        ?bot,
        %difficulty,
        strategy = strategy.name(),
        candidates = moves.len(),
        chosen = ?chosen,
        "bot selected move"
    );
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, Inventory, Piece, Player, Pos, Size};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_difficulty() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" Expert ".parse::<Difficulty>(), Ok(Difficulty::Expert));
        assert_eq!(
            "impossible".parse::<Difficulty>(),
            Err(ParseDifficultyError("impossible".to_string()))
        );
        for difficulty in Difficulty::ALL {
            assert_eq!(difficulty.to_string().parse::<Difficulty>(), Ok(difficulty));
        }
    }

    #[test]
    fn test_medium_and_hard_share_strategy() {
        assert_eq!(Difficulty::Medium.strategy().name(), "tactical");
        assert_eq!(Difficulty::Hard.strategy().name(), "tactical");
        assert_eq!(Difficulty::Easy.strategy().name(), "random");
        assert_eq!(Difficulty::Expert.strategy().name(), "minimax");
    }

    #[test]
    fn test_easy_is_seed_deterministic() {
        let state = GameState::new();
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);

        for _ in 0..10 {
            assert_eq!(
                select_bot_move(&state, Difficulty::Easy, &mut a),
                select_bot_move(&state, Difficulty::Easy, &mut b)
            );
        }
    }

    #[test]
    fn test_tactical_takes_the_win() {
        let mut board = Board::new();
        board.push_piece(Pos(4), Piece::new(Player::First, Size::Small));
        board.push_piece(Pos(8), Piece::new(Player::First, Size::Small));
        board.push_piece(Pos(1), Piece::new(Player::Second, Size::Small));
        board.push_piece(Pos(2), Piece::new(Player::Second, Size::Small));
        let state = GameState::from_parts(board, Inventory::new(), Player::First);
        let mut rng = StdRng::seed_from_u64(1);

        // Both sides threaten: winning beats blocking.
        let mov = select_bot_move(&state, Difficulty::Hard, &mut rng);
        assert_eq!(
            mov,
            Some(Move::Place {
                size: Size::Small,
                cell: Pos(0),
            })
        );
    }

    #[test]
    fn test_tactical_blocks() {
        let mut board = Board::new();
        board.push_piece(Pos(0), Piece::new(Player::First, Size::Small));
        board.push_piece(Pos(1), Piece::new(Player::First, Size::Small));
        let inventory = Inventory::from_counts([0, 2, 2], [2, 2, 2]);
        let state = GameState::from_parts(board, inventory, Player::Second);
        let mut rng = StdRng::seed_from_u64(1);

        let mov = select_bot_move(&state, Difficulty::Medium, &mut rng).unwrap();
        let mut after = state;
        after.apply_move(mov).unwrap();
        assert_eq!(find_winning_move(&after, Player::First), None);
    }

    #[test]
    fn test_stuck_bot_returns_none() {
        let mut board = Board::new();
        board.push_piece(Pos(0), Piece::new(Player::Second, Size::Small));
        board.push_piece(Pos(0), Piece::new(Player::First, Size::Large));
        let inventory = Inventory::from_counts([2, 2, 1], [0, 0, 0]);
        let state = GameState::from_parts(board, inventory, Player::Second);
        let mut rng = StdRng::seed_from_u64(1);

        for difficulty in Difficulty::ALL {
            assert_eq!(select_bot_move(&state, difficulty, &mut rng), None);
        }
    }
}
