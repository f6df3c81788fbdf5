//! Replay command implementation.

use super::output::{ReplayStats, format_text, render_board};
use super::{CliError, ReplayFormat, load_rules};
use frontline::{Action, GameState};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if a file cannot be read, the board size is invalid, or
/// `strict` is set and an action is rejected.
pub(crate) fn execute(
    actions_path: PathBuf,
    width: u16,
    height: u16,
    rules_path: Option<PathBuf>,
    format: ReplayFormat,
    player: Option<u8>,
    strict: bool,
) -> Result<(), CliError> {
    let rules = load_rules(rules_path.as_deref())?;
    let text = fs::read_to_string(&actions_path).map_err(|e| {
        CliError::new(format!("Failed to read {}: {e}", actions_path.display()))
    })?;
    let actions: Vec<Action> = serde_json::from_str(&text)
        .map_err(|e| CliError::new(format!("Invalid action log: {e}")))?;

    let mut game = GameState::new(width, height, rules)
        .ok_or_else(|| CliError::new(format!("Invalid board size {width}x{height}")))?;
    let stats = run(&mut game, &actions, strict)?;

    match format {
        ReplayFormat::Text => print!("{}", format_text(&game, &stats)),
        ReplayFormat::Json => println!("{}", game.snapshot().to_json()?),
        ReplayFormat::Board => {
            print!("{}", format_text(&game, &stats));
            println!();
            let view = player.map(|p| game.view_for(p));
            print!("{}", render_board(&game, view.as_ref()));
        }
    }
    Ok(())
}

/// Apply every action in order, recording which were rejected.
fn run(game: &mut GameState, actions: &[Action], strict: bool) -> Result<ReplayStats, CliError> {
    let mut stats = ReplayStats::default();
    for (index, action) in actions.iter().enumerate() {
        if game.apply_action(action) {
            debug!(index, ?action, revision = game.revision(), "applied");
            stats.accepted += 1;
        } else {
            warn!(index, ?action, "rejected");
            if strict {
                return Err(CliError::new(format!("Action {index} rejected: {action:?}")));
            }
            stats.rejected.push(index);
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontline::{Coord, Purchase, RulesConfig, UnitType};

    #[test]
    fn test_run_counts_rejections() {
        let mut game = GameState::new(8, 8, RulesConfig::default()).unwrap();
        let actions = [
            Action::Spawn {
                player: 0,
                purchase: Purchase::Unit(UnitType::Infantry),
                at: Coord::new(1, 0),
            },
            Action::EndTurn { player: 1 },
            Action::EndTurn { player: 0 },
        ];
        let stats = run(&mut game, &actions, false).unwrap();
        assert_eq!(stats.accepted, 2);
        assert_eq!(stats.rejected, vec![1]);
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn test_strict_stops_at_rejection() {
        let mut game = GameState::new(8, 8, RulesConfig::default()).unwrap();
        let actions = [Action::EndTurn { player: 1 }, Action::EndTurn { player: 0 }];
        assert!(run(&mut game, &actions, true).is_err());
        assert_eq!(game.current_player(), 0);
    }
}
