//! Snapshot validation command implementation.

use super::CliError;
use frontline::game::invariants::check_invariants;
use frontline::{GameState, RulesConfig, Snapshot};
use std::fs;
use std::path::PathBuf;

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or is inconsistent.
pub(crate) fn execute(path: PathBuf) -> Result<(), CliError> {
    let text = fs::read_to_string(&path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;

    println!("Validating: {}", path.display());
    println!();

    let snapshot = match Snapshot::from_json(&text) {
        Ok(snapshot) => {
            print_check("JSON document", true);
            snapshot
        }
        Err(e) => {
            print_check("JSON document", false);
            return Err(e.into());
        }
    };

    let revision = snapshot.revision;
    let game = match GameState::from_snapshot(snapshot, RulesConfig::default()) {
        Ok(game) => {
            print_check("Snapshot consistency", true);
            game
        }
        Err(e) => {
            print_check("Snapshot consistency", false);
            return Err(e.into());
        }
    };

    let violations = check_invariants(&game);
    print_check("Game invariants", violations.is_empty());
    if !violations.is_empty() {
        for violation in &violations {
            println!("    - {}", violation.message);
        }
        return Err(CliError::new(format!("{} invariant violations", violations.len())));
    }

    println!();
    println!("Summary:");
    println!("  Board:     {}x{}", game.grid().width(), game.grid().height());
    println!("  Turn:      {}", game.turn());
    println!("  Revision:  {revision}");
    println!("  Units:     {}", game.units().count());
    println!("  Structures: {}", game.fortifications().count());
    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
