//! Depth-limited minimax with alpha-beta pruning, plus the one-ply tactical
//! helpers used by the easier bots.
//!
//! The search has no positional evaluation: a won position scores
//! `WIN_SCORE - depth`, a lost one `-WIN_SCORE + depth`, and everything else
//! (horizon reached, side to move stuck) scores 0. All work happens on one
//! private copy of the state through `apply` / `reverse`.

use tracing::debug;

use crate::{GameState, Move, Player};

/// Plies searched before a position is scored as neutral.
pub const DEPTH_LIMIT: u8 = 6;

/// Score of a win found at depth 0. Scores never leave `[-WIN_SCORE, WIN_SCORE]`.
pub const WIN_SCORE: i32 = 100;

/// Stands in for ±infinity in the alpha-beta window.
const INF: i32 = WIN_SCORE + 1;

/// Counters collected during one search.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes entered, root children included
    pub nodes: u64,
    /// Nodes where one side had a completed line
    pub terminals: u64,
    /// Nodes cut off by the depth limit
    pub horizon: u64,
    /// Nodes where the side to move had no legal moves
    pub stalled: u64,
    /// Sibling loops abandoned because `beta <= alpha`
    pub cutoffs: u64,
    /// Deepest ply entered
    pub max_depth: u8,
}

/// Outcome of a root search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best move found, if the bot had any
    pub best_move: Option<Move>,
    /// Minimax score of `best_move`
    pub score: i32,
    pub stats: SearchStats,
}

struct Searcher {
    bot: Player,
    limit: u8,
    stats: SearchStats,
}

impl Searcher {
    fn minimax(
        &mut self,
        state: &mut GameState,
        depth: u8,
        maximizing: bool,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        self.stats.nodes += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        match state.winner() {
            Some(winner) if winner == self.bot => {
                self.stats.terminals += 1;
                return WIN_SCORE - depth as i32;
            }
            Some(_) => {
                self.stats.terminals += 1;
                return -WIN_SCORE + depth as i32;
            }
            None => {}
        }

        if depth >= self.limit {
            self.stats.horizon += 1;
            return 0;
        }

        let player = if maximizing { self.bot } else { self.bot.opponent() };
        let moves = state.generate_moves(player);
        if moves.is_empty() {
            self.stats.stalled += 1;
            return 0;
        }

        let mut best = if maximizing { -INF } else { INF };

        for mov in moves {
            state.apply(mov, player);
            let score = self.minimax(state, depth + 1, !maximizing, alpha, beta);
            state.reverse(mov, player);

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }

            if beta <= alpha {
                self.stats.cutoffs += 1;
                break;
            }
        }

        best
    }
}

/// Search every bot move with a fresh full window and keep the first one
/// whose score beats everything seen before it.
pub(crate) fn search_to_depth(state: &GameState, bot: Player, limit: u8) -> SearchResult {
    let mut work = *state;
    let mut searcher = Searcher {
        bot,
        limit,
        stats: SearchStats::default(),
    };

    let mut best_move = None;
    let mut best_score = -INF;

    for mov in work.generate_moves(bot) {
        work.apply(mov, bot);
        let score = searcher.minimax(&mut work, 1, false, -INF, INF);
        work.reverse(mov, bot);

        if score > best_score {
            best_score = score;
            best_move = Some(mov);
        }
    }
    debug_assert_eq!(work, *state, "search left the state modified");

    let score = if best_move.is_some() { best_score } else { 0 };
    debug!(
        ?bot,
        best = ?best_move,
        score,
        nodes = searcher.stats.nodes,
        cutoffs = searcher.stats.cutoffs,
        "minimax search finished"
    );

    SearchResult {
        best_move,
        score,
        stats: searcher.stats,
    }
}

/// Run the fixed-depth search for `bot`.
pub fn search(state: &GameState, bot: Player) -> SearchResult {
    search_to_depth(state, bot, DEPTH_LIMIT)
}

/// Best move for `bot` by minimax, ties broken by generation order.
pub fn minimax_best_move(state: &GameState, bot: Player) -> Option<Move> {
    search(state, bot).best_move
}

fn winning_move_in(state: &mut GameState, player: Player) -> Option<Move> {
    for mov in state.generate_moves(player) {
        state.apply(mov, player);
        let wins = state.winner() == Some(player);
        state.reverse(mov, player);
        if wins {
            return Some(mov);
        }
    }
    None
}

/// First move (in generation order) after which `player` owns a line.
pub fn find_winning_move(state: &GameState, player: Player) -> Option<Move> {
    let mut work = *state;
    winning_move_in(&mut work, player)
}

/// First bot move that leaves the opponent without an immediate win.
///
/// Returns `None` when the opponent has no immediate win to begin with, or
/// when no single move takes away every winning reply. Only one ply of
/// replies is examined.
pub fn find_blocking_move(state: &GameState, bot: Player) -> Option<Move> {
    let opponent = bot.opponent();
    let mut work = *state;

    winning_move_in(&mut work, opponent)?;

    for mov in work.generate_moves(bot) {
        work.apply(mov, bot);
        let still_wins = winning_move_in(&mut work, opponent).is_some();
        work.reverse(mov, bot);
        if !still_wins {
            return Some(mov);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Board, Inventory, Piece, Pos, Size};
    use rand::prelude::*;

    fn board_with(pieces: &[(u8, Player, Size)]) -> Board {
        let mut board = Board::new();
        for &(pos, owner, size) in pieces {
            board.push_piece(Pos(pos), Piece::new(owner, size));
        }
        board
    }

    /// Plain minimax without pruning, to check alpha-beta against.
    fn reference(
        state: &mut GameState,
        bot: Player,
        depth: u8,
        maximizing: bool,
        limit: u8,
    ) -> i32 {
        match state.winner() {
            Some(w) if w == bot => return WIN_SCORE - depth as i32,
            Some(_) => return -WIN_SCORE + depth as i32,
            None => {}
        }
        if depth >= limit {
            return 0;
        }
        let player = if maximizing { bot } else { bot.opponent() };
        let moves = state.generate_moves(player);
        if moves.is_empty() {
            return 0;
        }
        let scores = moves.into_iter().map(|mov| {
            state.apply(mov, player);
            let score = reference(state, bot, depth + 1, !maximizing, limit);
            state.reverse(mov, player);
            score
        });
        if maximizing {
            scores.max().unwrap()
        } else {
            scores.min().unwrap()
        }
    }

    fn random_position(rng: &mut StdRng, plies: usize) -> GameState {
        let mut state = GameState::new();
        for _ in 0..plies {
            let moves = state.generate_moves(state.to_move());
            if moves.is_empty() || state.winner().is_some() {
                break;
            }
            let mov = moves[rng.random_range(0..moves.len())];
            state.apply_move(mov).unwrap();
        }
        state
    }

    #[test]
    fn test_win_in_one_scores_99() {
        let board = board_with(&[
            (0, Player::Second, Size::Small),
            (1, Player::Second, Size::Small),
            (3, Player::First, Size::Small),
            (8, Player::First, Size::Small),
        ]);
        let inventory = Inventory::from_counts([0, 1, 0], [0, 1, 0]);
        let state = GameState::from_parts(board, inventory, Player::Second);

        let result = search(&state, Player::Second);
        assert_eq!(result.score, 99);
        assert_eq!(
            result.best_move,
            Some(Move::Place {
                size: Size::Medium,
                cell: Pos(2),
            })
        );
        assert!(result.stats.nodes > 0);
    }

    #[test]
    fn test_forced_loss_in_one_scores_minus_99() {
        // Second's lone Large hides the shared corner of two First lines.
        let board = board_with(&[
            (0, Player::First, Size::Small),
            (0, Player::Second, Size::Large),
            (1, Player::First, Size::Small),
            (2, Player::First, Size::Medium),
            (3, Player::First, Size::Medium),
            (6, Player::First, Size::Large),
        ]);
        let inventory = Inventory::from_counts([0, 0, 1], [0, 0, 0]);
        let state = GameState::from_parts(board, inventory, Player::Second);
        assert_eq!(state.winner(), None);

        let result = search(&state, Player::Second);
        assert_eq!(result.score, -99);
        assert_eq!(
            result.best_move,
            Some(Move::Relocate {
                from: Pos(0),
                to: Pos(1),
            })
        );
    }

    #[test]
    fn test_no_moves_means_no_best_move() {
        let board = board_with(&[
            (0, Player::Second, Size::Small),
            (0, Player::First, Size::Large),
        ]);
        let inventory = Inventory::from_counts([2, 2, 1], [0, 0, 0]);
        let state = GameState::from_parts(board, inventory, Player::Second);

        let result = search(&state, Player::Second);
        assert_eq!(result.best_move, None);
        assert_eq!(minimax_best_move(&state, Player::Second), None);
    }

    #[test]
    fn test_alpha_beta_matches_plain_minimax() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..20 {
            let plies = rng.random_range(0..8);
            let state = random_position(&mut rng, plies);
            if state.winner().is_some() {
                continue;
            }
            let bot = state.to_move();

            let mut work = state;
            let expected = work
                .generate_moves(bot)
                .into_iter()
                .map(|mov| {
                    work.apply(mov, bot);
                    let score = reference(&mut work, bot, 1, false, 3);
                    work.reverse(mov, bot);
                    score
                })
                .max();

            let result = search_to_depth(&state, bot, 3);
            assert_eq!(result.best_move.map(|_| result.score), expected);
        }
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..30 {
            let plies = rng.random_range(4..16);
            let state = random_position(&mut rng, plies);
            let result = search_to_depth(&state, state.to_move(), 3);
            assert!((-WIN_SCORE..=WIN_SCORE).contains(&result.score));
        }
    }

    #[test]
    fn test_find_winning_move() {
        let board = board_with(&[
            (0, Player::Second, Size::Small),
            (1, Player::Second, Size::Small),
        ]);
        let inventory = Inventory::from_counts([2, 2, 2], [0, 1, 0]);
        let state = GameState::from_parts(board, inventory, Player::Second);

        assert_eq!(
            find_winning_move(&state, Player::Second),
            Some(Move::Place {
                size: Size::Medium,
                cell: Pos(2),
            })
        );
        assert_eq!(find_winning_move(&state, Player::First), None);
    }

    #[test]
    fn test_winning_move_must_belong_to_mover() {
        // Lifting First's Large reveals Second's row; that is not a First win.
        let board = board_with(&[
            (0, Player::Second, Size::Small),
            (0, Player::First, Size::Large),
            (1, Player::Second, Size::Small),
            (2, Player::Second, Size::Medium),
        ]);
        let inventory = Inventory::from_counts([0, 0, 0], [0, 0, 0]);
        let state = GameState::from_parts(board, inventory, Player::First);

        assert_eq!(find_winning_move(&state, Player::First), None);
    }

    #[test]
    fn test_no_block_needed() {
        let state = GameState::new();
        assert_eq!(find_blocking_move(&state, Player::First), None);
    }
}
