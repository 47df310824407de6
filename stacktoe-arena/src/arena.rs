//! Bot-vs-bot game loop.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stacktoe_core::{select_bot_move, Difficulty, GameState, GameStatus, Player};
use tracing::{debug, info};

use crate::stats::{GameOutcome, MatchStats};

/// Which bot plays which side.
#[derive(Debug, Clone, Copy)]
pub struct Pairing {
    pub first: Difficulty,
    pub second: Difficulty,
}

impl Pairing {
    pub fn for_player(&self, player: Player) -> Difficulty {
        match player {
            Player::First => self.first,
            Player::Second => self.second,
        }
    }
}

/// Series settings.
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub pairing: Pairing,
    pub games: u64,
    /// Game `i` is played with seed `seed + i`
    pub seed: u64,
    pub max_plies: u32,
    pub log_interval_secs: u64,
}

/// Play one game from the empty board.
pub fn play_game(
    pairing: Pairing,
    max_plies: u32,
    rng: &mut StdRng,
) -> anyhow::Result<GameOutcome> {
    let mut state = GameState::new();
    let mut plies = 0;

    loop {
        match state.status() {
            GameStatus::Won(winner) => return Ok(GameOutcome::Won { winner, plies }),
            GameStatus::Drawn => return Ok(GameOutcome::Drawn { plies }),
            GameStatus::Ongoing if plies >= max_plies => {
                return Ok(GameOutcome::Truncated { plies })
            }
            GameStatus::Ongoing => {}
        }

        let player = state.to_move();
        let difficulty = pairing.for_player(player);
        let Some(mov) = select_bot_move(&state, difficulty, rng) else {
            return Ok(GameOutcome::Drawn { plies });
        };
        state
            .apply_move(mov)
            .with_context(|| format!("{} bot chose {} at ply {}", difficulty, mov, plies))?;
        plies += 1;

        debug!(ply = plies, ?player, %mov, "\n{}", state);
    }
}

/// Play `config.games` games, stopping early once `running` is cleared.
pub fn run_series(config: &ArenaConfig, running: &AtomicBool) -> anyhow::Result<MatchStats> {
    let mut stats = MatchStats::new();

    for game in 0..config.games {
        if !running.load(Ordering::SeqCst) {
            info!(played = game, "series interrupted");
            break;
        }

        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(game));
        let outcome = play_game(config.pairing, config.max_plies, &mut rng)
            .with_context(|| format!("game {} failed", game))?;
        debug!(game, ?outcome, "game finished");
        stats.record(outcome);

        if stats.should_log(config.log_interval_secs) {
            stats.log_progress();
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(first: Difficulty, second: Difficulty, games: u64) -> ArenaConfig {
        ArenaConfig {
            pairing: Pairing { first, second },
            games,
            seed: 17,
            max_plies: 100,
            log_interval_secs: 3600,
        }
    }

    #[test]
    fn test_play_game_respects_ply_cap() {
        let pairing = Pairing {
            first: Difficulty::Easy,
            second: Difficulty::Easy,
        };
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = play_game(pairing, 30, &mut rng).unwrap();
            assert!(outcome.plies() <= 30);
        }
    }

    #[test]
    fn test_games_are_reproducible() {
        let pairing = Pairing {
            first: Difficulty::Medium,
            second: Difficulty::Easy,
        };
        let a = play_game(pairing, 100, &mut StdRng::seed_from_u64(8)).unwrap();
        let b = play_game(pairing, 100, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_series_counts_every_game() {
        let running = AtomicBool::new(true);
        let stats = run_series(&config(Difficulty::Hard, Difficulty::Easy, 12), &running).unwrap();
        assert_eq!(stats.games, 12);
        assert_eq!(
            stats.first_wins + stats.second_wins + stats.draws + stats.truncated,
            12
        );
    }

    #[test]
    fn test_interrupted_series_stops() {
        let running = AtomicBool::new(false);
        let stats = run_series(&config(Difficulty::Easy, Difficulty::Easy, 50), &running).unwrap();
        assert_eq!(stats.games, 0);
    }
}
