//! Stacking tic-tac-toe game logic with bit-based board representation.
//!
//! # Board Encoding (64-bit)
//!
//! ```text
//! Bits 0-53:  Board state (9 cells × 6 bits per cell)
//! Bits 54-63: Unused (always zero)
//!
//! Each cell (6 bits) - indexed by SIZE, not stack position:
//!   Bits 0-1: Small piece owner (0=empty, 1=First, 2=Second)
//!   Bits 2-3: Medium piece owner
//!   Bits 4-5: Large piece owner
//!
//! Cell indices (row-major order):
//!   (0,0)=0  (0,1)=1  (0,2)=2
//!   (1,0)=3  (1,1)=4  (1,2)=5
//!   (2,0)=6  (2,1)=7  (2,2)=8
//! ```
//!
//! A stack only ever grows with strictly larger pieces, so the set of
//! occupied size layers fully determines stack order: the top piece is the
//! largest occupied layer.
//!
//! The side to move and each player's remaining pieces live next to the
//! board in [`GameState`]. Inventory is tracked explicitly rather than
//! derived from the board, so positions with arbitrary reserves can be built.
//!
//! # Move Order
//!
//! [`GameState::generate_moves`] yields all placements first (Small, Medium,
//! Large; cells 0-8 within each size), then all relocations (source cells
//! 0-8; destinations 0-8 within each source). Bots depend on this order.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

pub mod bot;
pub mod search;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use bot::{select_bot_move, Difficulty, ParseDifficultyError, Strategy};
pub use search::{
    find_blocking_move, find_winning_move, minimax_best_move, search, SearchResult, SearchStats,
    DEPTH_LIMIT, WIN_SCORE,
};

/// Pieces of each size a player starts with.
pub const PIECES_PER_SIZE: u8 = 2;

/// Player identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Player {
    First = 1,
    Second = 2,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    /// Convert from the 2-bit layer value (1 or 2) to Player.
    #[inline]
    pub fn from_bits(bits: u8) -> Option<Player> {
        match bits {
            1 => Some(Player::First),
            2 => Some(Player::Second),
            _ => None,
        }
    }

    /// Board glyph: `X` moves first, `O` second.
    pub fn symbol(self) -> char {
        match self {
            Player::First => 'X',
            Player::Second => 'O',
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize - 1
    }
}

/// Piece size.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Size {
    Small = 0,
    Medium = 1,
    Large = 2,
}

impl Size {
    /// Check if this size can cover another size. Equal sizes never stack.
    #[inline]
    pub fn can_cover(self, other: Size) -> bool {
        (self as u8) > (other as u8)
    }

    /// Get all sizes as an iterator, smallest first.
    pub fn all() -> impl DoubleEndedIterator<Item = Size> {
        [Size::Small, Size::Medium, Size::Large].into_iter()
    }

    pub fn letter(self) -> char {
        match self {
            Size::Small => 'S',
            Size::Medium => 'M',
            Size::Large => 'L',
        }
    }
}

/// Position on the 3x3 board (0-8).
///
/// Layout:
/// ```text
///   0 1 2
///   3 4 5
///   6 7 8
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pos(pub u8);

impl Pos {
    /// Create a position from row and column (0-2 each).
    #[inline]
    pub fn from_row_col(row: u8, col: u8) -> Pos {
        debug_assert!(row < 3 && col < 3);
        Pos(row * 3 + col)
    }

    /// Get the row (0-2).
    #[inline]
    pub fn row(self) -> u8 {
        self.0 / 3
    }

    /// Get the column (0-2).
    #[inline]
    pub fn col(self) -> u8 {
        self.0 % 3
    }

    /// Check if this is a valid position (0-8).
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 < 9
    }

    /// Iterate over all 9 positions.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..9).map(Pos)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sized piece owned by one player.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub owner: Player,
    pub size: Size,
}

impl Piece {
    #[inline]
    pub fn new(owner: Player, size: Size) -> Piece {
        Piece { owner, size }
    }
}

/// A move in the game.
///
/// Moves are plain descriptors: the acting player and the size of a
/// relocated piece come from the state the move is applied to.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Move {
    /// Place a new piece from the inventory.
    Place { size: Size, cell: Pos },
    /// Move the top piece of one cell onto another.
    Relocate { from: Pos, to: Pos },
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Place { size, cell } => write!(f, "{}@{}", size.letter(), cell),
            Move::Relocate { from, to } => write!(f, "{}->{}", from, to),
        }
    }
}

/// Error returned when a move is rejected at the API boundary.
///
/// A rejected move never mutates the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// Covering, inventory or ownership rules forbid the move.
    #[display("Illegal move {}", _0)]
    IllegalMove(Move),

    /// The game already has a winner.
    #[display("Game is already won by {:?}", _0)]
    GameOver(Player),
}

impl std::error::Error for MoveError {}

/// Compact board state - fits in a single u64.
///
/// See module documentation for encoding details.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Board(u64);

impl Board {
    /// Bits per cell (6 bits = 3 sizes × 2 bits each).
    const CELL_BITS: u32 = 6;
    /// Mask for a single cell (0b111111).
    const CELL_MASK: u64 = 0b111111;
    /// Mask for a single layer (2 bits for player: 0=empty, 1=First, 2=Second).
    const LAYER_MASK: u64 = 0b11;

    /// The 8 winning lines in scan order: 3 rows, 3 columns, 2 diagonals.
    pub const WIN_LINES: [[Pos; 3]; 8] = [
        [Pos(0), Pos(1), Pos(2)], // Row 0
        [Pos(3), Pos(4), Pos(5)], // Row 1
        [Pos(6), Pos(7), Pos(8)], // Row 2
        [Pos(0), Pos(3), Pos(6)], // Col 0
        [Pos(1), Pos(4), Pos(7)], // Col 1
        [Pos(2), Pos(5), Pos(8)], // Col 2
        [Pos(0), Pos(4), Pos(8)], // Main diagonal
        [Pos(2), Pos(4), Pos(6)], // Anti-diagonal
    ];

    /// Bitmasks for winning lines, same order as `WIN_LINES`.
    const WIN_MASKS: [u16; 8] = [
        0b000_000_111, // Row 0: cells 0,1,2
        0b000_111_000, // Row 1: cells 3,4,5
        0b111_000_000, // Row 2: cells 6,7,8
        0b001_001_001, // Col 0: cells 0,3,6
        0b010_010_010, // Col 1: cells 1,4,7
        0b100_100_100, // Col 2: cells 2,5,8
        0b100_010_001, // Main diagonal: cells 0,4,8
        0b001_010_100, // Anti-diagonal: cells 2,4,6
    ];

    /// Create a new empty board.
    #[inline]
    pub fn new() -> Board {
        Board(0)
    }

    /// Get the 6 bits for a cell at the given position.
    /// Off-board positions read as empty.
    #[inline]
    fn cell(&self, pos: Pos) -> u64 {
        if !pos.is_valid() {
            return 0;
        }
        (self.0 >> (pos.0 as u32 * Self::CELL_BITS)) & Self::CELL_MASK
    }

    /// Set the 6 bits for a cell at the given position.
    #[inline]
    fn set_cell(&mut self, pos: Pos, value: u64) {
        debug_assert!(pos.is_valid(), "cell {} is off the board", pos);
        if !pos.is_valid() {
            return;
        }
        let shift = pos.0 as u32 * Self::CELL_BITS;
        self.0 = (self.0 & !(Self::CELL_MASK << shift)) | ((value & Self::CELL_MASK) << shift);
    }

    /// Get the owner of a specific size piece at a position.
    /// Returns None if no piece of that size at that position.
    #[inline]
    pub fn piece_owner(&self, pos: Pos, size: Size) -> Option<Player> {
        let layer_shift = (size as u32) * 2;
        let bits = (self.cell(pos) >> layer_shift) & Self::LAYER_MASK;
        Player::from_bits(bits as u8)
    }

    /// Get the top (visible) piece at a position.
    /// Checks Large, then Medium, then Small.
    #[inline]
    pub fn top_piece(&self, pos: Pos) -> Option<Piece> {
        Size::all()
            .rev()
            .find_map(|size| self.piece_owner(pos, size).map(|owner| Piece::new(owner, size)))
    }

    /// Check if a cell is empty.
    #[inline]
    pub fn is_empty(&self, pos: Pos) -> bool {
        self.cell(pos) == 0
    }

    /// The pieces stacked at a position, bottom to top.
    pub fn stack(&self, pos: Pos) -> Vec<Piece> {
        Size::all()
            .filter_map(|size| self.piece_owner(pos, size).map(|owner| Piece::new(owner, size)))
            .collect()
    }

    /// Push a piece onto a cell. It becomes the top piece.
    /// Does NOT validate - caller must ensure the piece covers the current top.
    #[inline]
    pub fn push_piece(&mut self, pos: Pos, piece: Piece) {
        debug_assert!(
            self.can_place(piece.size, pos),
            "{:?} cannot cover the top of cell {}",
            piece,
            pos
        );
        let layer_shift = (piece.size as u32) * 2;
        let cell = self.cell(pos);
        let new_cell =
            (cell & !(Self::LAYER_MASK << layer_shift)) | ((piece.owner as u64) << layer_shift);
        self.set_cell(pos, new_cell);
    }

    /// Remove the top piece from a cell.
    /// Returns the piece that was removed, or None if cell was empty.
    pub fn pop_top(&mut self, pos: Pos) -> Option<Piece> {
        let top = self.top_piece(pos)?;
        let layer_shift = (top.size as u32) * 2;
        let new_cell = self.cell(pos) & !(Self::LAYER_MASK << layer_shift);
        self.set_cell(pos, new_cell);
        Some(top)
    }

    /// Check if a piece of the given size can be set on this position.
    /// A piece can be placed if the cell is empty or the top piece is strictly smaller.
    /// Off-board positions never accept a piece.
    #[inline]
    pub fn can_place(&self, size: Size, pos: Pos) -> bool {
        if !pos.is_valid() {
            return false;
        }
        match self.top_piece(pos) {
            None => true,
            Some(top) => size.can_cover(top.size),
        }
    }

    /// Compute visibility masks for both players.
    /// Returns (first_mask, second_mask) where bit i is set if that player tops cell i.
    #[inline]
    pub fn visibility_masks(&self) -> (u16, u16) {
        let mut first_mask = 0u16;
        let mut second_mask = 0u16;

        for pos in Pos::all() {
            match self.top_piece(pos).map(|piece| piece.owner) {
                Some(Player::First) => first_mask |= 1 << pos.0,
                Some(Player::Second) => second_mask |= 1 << pos.0,
                None => {}
            }
        }

        (first_mask, second_mask)
    }

    /// Scan the winning lines in order and report the owner of the first
    /// line whose three top pieces share one owner.
    ///
    /// Covered pieces never count.
    pub fn check_winner(&self) -> Option<Player> {
        let (first_mask, second_mask) = self.visibility_masks();

        for &win_mask in &Self::WIN_MASKS {
            if (first_mask & win_mask) == win_mask {
                return Some(Player::First);
            }
            if (second_mask & win_mask) == win_mask {
                return Some(Player::Second);
            }
        }

        None
    }

    /// Get the first winning line for a player, if any.
    pub fn winning_line(&self, player: Player) -> Option<[Pos; 3]> {
        let (first_mask, second_mask) = self.visibility_masks();
        let mask = match player {
            Player::First => first_mask,
            Player::Second => second_mask,
        };

        Self::WIN_MASKS
            .iter()
            .position(|&win_mask| (mask & win_mask) == win_mask)
            .map(|idx| Self::WIN_LINES[idx])
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            let cells: Vec<String> = (0..3)
                .map(|col| match self.top_piece(Pos::from_row_col(row, col)) {
                    Some(piece) => format!("{}{}", piece.owner.symbol(), piece.size.letter()),
                    None => "..".to_string(),
                })
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Remaining pieces per player, indexed `[player][size]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Inventory([[u8; 3]; 2]);

impl Inventory {
    /// Full inventory: two of each size for both players.
    pub fn new() -> Inventory {
        Inventory([[PIECES_PER_SIZE; 3]; 2])
    }

    /// Build an inventory from explicit `[small, medium, large]` counts.
    /// Counts above [`PIECES_PER_SIZE`] are clamped.
    pub fn from_counts(first: [u8; 3], second: [u8; 3]) -> Inventory {
        Inventory([first, second].map(|counts| counts.map(|n| n.min(PIECES_PER_SIZE))))
    }

    /// Remaining pieces of `size` for `player`.
    #[inline]
    pub fn remaining(&self, player: Player, size: Size) -> u8 {
        self.0[player.index()][size as usize]
    }

    /// Remaining counts for `player` as `[small, medium, large]`.
    #[inline]
    pub fn counts(&self, player: Player) -> [u8; 3] {
        self.0[player.index()]
    }

    #[inline]
    fn take(&mut self, player: Player, size: Size) {
        let count = &mut self.0[player.index()][size as usize];
        debug_assert!(*count > 0, "{:?} has no {:?} left", player, size);
        *count = count.saturating_sub(1);
    }

    #[inline]
    fn give_back(&mut self, player: Player, size: Size) {
        let count = &mut self.0[player.index()][size as usize];
        debug_assert!(*count < PIECES_PER_SIZE, "{:?} {:?} over-returned", player, size);
        *count += 1;
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a game stands.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Ongoing,
    Won(Player),
    /// The side to move has no legal moves.
    Drawn,
}

/// Board, inventory and side to move.
///
/// `GameState` is `Copy`; search code mutates a private copy through
/// [`apply`](GameState::apply) / [`reverse`](GameState::reverse) and never
/// shares it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GameState {
    board: Board,
    inventory: Inventory,
    to_move: Player,
}

impl GameState {
    /// Empty board, full inventory, First to move.
    pub fn new() -> GameState {
        GameState {
            board: Board::new(),
            inventory: Inventory::new(),
            to_move: Player::First,
        }
    }

    /// Assemble a position from its parts.
    pub fn from_parts(board: Board, inventory: Inventory, to_move: Player) -> GameState {
        GameState {
            board,
            inventory,
            to_move,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    #[inline]
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    /// Check whether `player` may set a piece of `size` on `cell`.
    ///
    /// The top piece must be strictly smaller. Placements also need a piece
    /// of that size left in the inventory; relocations move a piece that is
    /// already on the board and skip that check.
    #[inline]
    pub fn can_place(&self, cell: Pos, player: Player, size: Size, is_relocation: bool) -> bool {
        if !self.board.can_place(size, cell) {
            return false;
        }
        is_relocation || self.inventory.remaining(player, size) > 0
    }

    /// Generate all legal moves for `player`, placements before relocations.
    pub fn generate_moves(&self, player: Player) -> Vec<Move> {
        let mut moves = Vec::with_capacity(32);

        for size in Size::all() {
            if self.inventory.remaining(player, size) > 0 {
                for cell in Pos::all() {
                    if self.can_place(cell, player, size, false) {
                        moves.push(Move::Place { size, cell });
                    }
                }
            }
        }

        for from in Pos::all() {
            if let Some(piece) = self.board.top_piece(from) {
                if piece.owner == player {
                    for to in Pos::all() {
                        if from != to && self.can_place(to, player, piece.size, true) {
                            moves.push(Move::Relocate { from, to });
                        }
                    }
                }
            }
        }

        moves
    }

    /// Owner of the first completed line, if any.
    #[inline]
    pub fn winner(&self) -> Option<Player> {
        self.board.check_winner()
    }

    /// Check whether the side to move may play `mov`.
    ///
    /// Agrees exactly with membership in `generate_moves(self.to_move())`.
    pub fn legal_move(&self, mov: Move) -> bool {
        let player = self.to_move;
        match mov {
            Move::Place { size, cell } => {
                cell.is_valid() && self.can_place(cell, player, size, false)
            }
            Move::Relocate { from, to } => {
                if !from.is_valid() || !to.is_valid() || from == to {
                    return false;
                }
                match self.board.top_piece(from) {
                    Some(piece) if piece.owner == player => {
                        self.can_place(to, player, piece.size, true)
                    }
                    _ => false,
                }
            }
        }
    }

    /// Apply a move for `player` without validation or turn change.
    ///
    /// Pair every call with [`reverse`](GameState::reverse) in LIFO order.
    pub fn apply(&mut self, mov: Move, player: Player) {
        match mov {
            Move::Place { size, cell } => {
                self.board.push_piece(cell, Piece::new(player, size));
                self.inventory.take(player, size);
            }
            Move::Relocate { from, to } => {
                let piece = self.board.pop_top(from);
                debug_assert!(piece.is_some(), "relocation from empty cell {}", from);
                if let Some(piece) = piece {
                    self.board.push_piece(to, piece);
                }
            }
        }
    }

    /// Undo the most recent [`apply`](GameState::apply) of `mov` by `player`.
    ///
    /// Reversing anything but the latest applied move is a contract
    /// violation and trips a debug assertion.
    pub fn reverse(&mut self, mov: Move, player: Player) {
        match mov {
            Move::Place { size, cell } => {
                let popped = self.board.pop_top(cell);
                debug_assert_eq!(
                    popped,
                    Some(Piece::new(player, size)),
                    "reverse of {} out of order",
                    mov
                );
                self.inventory.give_back(player, size);
            }
            Move::Relocate { from, to } => {
                let popped = self.board.pop_top(to);
                debug_assert!(
                    matches!(popped, Some(piece) if piece.owner == player),
                    "reverse of {} out of order",
                    mov
                );
                if let Some(piece) = popped {
                    self.board.push_piece(from, piece);
                }
            }
        }
    }

    /// Validate and play `mov` for the side to move, then pass the turn.
    ///
    /// Rejected moves leave the state untouched.
    pub fn apply_move(&mut self, mov: Move) -> Result<(), MoveError> {
        if let Some(winner) = self.winner() {
            return Err(MoveError::GameOver(winner));
        }
        if !self.legal_move(mov) {
            trace!(%mov, player = ?self.to_move, "rejected illegal move");
            return Err(MoveError::IllegalMove(mov));
        }

        self.apply(mov, self.to_move);
        self.to_move = self.to_move.opponent();
        Ok(())
    }

    /// Won, drawn (side to move is stuck) or still going.
    pub fn status(&self) -> GameStatus {
        if let Some(winner) = self.winner() {
            GameStatus::Won(winner)
        } else if self.generate_moves(self.to_move).is_empty() {
            GameStatus::Drawn
        } else {
            GameStatus::Ongoing
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)?;
        for player in [Player::First, Player::Second] {
            let [small, medium, large] = self.inventory.counts(player);
            writeln!(f, "{}: S{} M{} L{}", player.symbol(), small, medium, large)?;
        }
        write!(f, "{} to move", self.to_move.symbol())
    }
}
