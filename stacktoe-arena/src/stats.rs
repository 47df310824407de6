//! Match statistics tracking.

use std::time::Instant;

use stacktoe_core::Player;
use tracing::info;

/// How one game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Won { winner: Player, plies: u32 },
    /// The side to move had no legal moves.
    Drawn { plies: u32 },
    /// Hit the ply cap before anyone won.
    Truncated { plies: u32 },
}

impl GameOutcome {
    pub fn plies(self) -> u32 {
        match self {
            GameOutcome::Won { plies, .. }
            | GameOutcome::Drawn { plies }
            | GameOutcome::Truncated { plies } => plies,
        }
    }
}

/// Format a duration in seconds as HH:MM:SS.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Statistics collected over a series of games.
#[derive(Debug)]
pub struct MatchStats {
    pub games: u64,
    pub first_wins: u64,
    pub second_wins: u64,
    pub draws: u64,
    pub truncated: u64,

    /// Sum of plies over all games, for the average
    pub total_plies: u64,
    pub shortest_win: Option<u32>,

    start_time: Instant,
    last_log_time: Instant,
}

impl MatchStats {
    pub fn new() -> Self {
        Self {
            games: 0,
            first_wins: 0,
            second_wins: 0,
            draws: 0,
            truncated: 0,
            total_plies: 0,
            shortest_win: None,
            start_time: Instant::now(),
            last_log_time: Instant::now(),
        }
    }

    /// Record a finished game
    pub fn record(&mut self, outcome: GameOutcome) {
        self.games += 1;
        self.total_plies += outcome.plies() as u64;
        match outcome {
            GameOutcome::Won { winner, plies } => {
                match winner {
                    Player::First => self.first_wins += 1,
                    Player::Second => self.second_wins += 1,
                }
                self.shortest_win = Some(self.shortest_win.map_or(plies, |s| s.min(plies)));
            }
            GameOutcome::Drawn { .. } => self.draws += 1,
            GameOutcome::Truncated { .. } => self.truncated += 1,
        }
    }

    pub fn average_plies(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_plies as f64 / self.games as f64
        }
    }

    /// Check if we should log progress
    pub fn should_log(&self, interval_secs: u64) -> bool {
        self.last_log_time.elapsed().as_secs() >= interval_secs
    }

    /// Log progress and reset log timer
    pub fn log_progress(&mut self) {
        info!(
            elapsed = %format_elapsed(self.start_time.elapsed().as_secs()),
            games = self.games,
            first = self.first_wins,
            second = self.second_wins,
            draws = self.draws,
            truncated = self.truncated,
            "progress"
        );
        self.last_log_time = Instant::now();
    }

    /// Print final summary
    pub fn print_summary(&self) {
        let pct = |n: u64| {
            if self.games == 0 {
                0.0
            } else {
                100.0 * n as f64 / self.games as f64
            }
        };

        println!("Games played: {}", self.games);
        println!("  - First wins:  {} ({:.1}%)", self.first_wins, pct(self.first_wins));
        println!("  - Second wins: {} ({:.1}%)", self.second_wins, pct(self.second_wins));
        println!("  - Draws:       {} ({:.1}%)", self.draws, pct(self.draws));
        println!("  - Truncated:   {} ({:.1}%)", self.truncated, pct(self.truncated));
        println!("Average length: {:.1} plies", self.average_plies());
        if let Some(shortest) = self.shortest_win {
            println!("Shortest win: {} plies", shortest);
        }
        println!(
            "Elapsed: {}",
            format_elapsed(self.start_time.elapsed().as_secs())
        );
    }
}

impl Default for MatchStats {
    fn default() -> Self {
        Self::new()
    }
}
