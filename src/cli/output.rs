//! Output formatting utilities for CLI.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use frontline::game::{Flag, FlagState, Fortification, PlayerView, Unit, rank_label};
use frontline::{Coord, FortType, GameState, UnitType};

/// Summary of a replayed action log.
#[derive(Debug, Default)]
pub(super) struct ReplayStats {
    /// Actions the engine accepted.
    pub(super) accepted: usize,
    /// Actions the engine rejected, by position in the log.
    pub(super) rejected: Vec<usize>,
}

const fn unit_glyph(unit_type: UnitType) -> char {
    match unit_type {
        UnitType::Infantry => 'I',
        UnitType::Tank => 'T',
        UnitType::Artillery => 'A',
        UnitType::AntiTankGun => 'G',
        UnitType::Engineer => 'E',
        UnitType::Officer => 'O',
        UnitType::Medic => 'M',
        UnitType::Scout => 'S',
        UnitType::MechanizedInfantry => 'V',
    }
}

const fn fort_glyph(fort_type: FortType) -> char {
    match fort_type {
        FortType::Pillbox => 'P',
        FortType::Bunker => 'B',
        FortType::BarbedWire => 'W',
        FortType::SupplyDepot => 'D',
    }
}

/// Player 0 renders upper case, player 1 lower case.
fn owned(glyph: char, player: u8) -> char {
    if player == 0 {
        glyph
    } else {
        glyph.to_ascii_lowercase()
    }
}

/// Format a one-paragraph summary of the game.
pub(super) fn format_text(game: &GameState, stats: &ReplayStats) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Replayed {} actions ({} rejected)",
        stats.accepted + stats.rejected.len(),
        stats.rejected.len()
    );
    if !stats.rejected.is_empty() {
        let positions: Vec<String> = stats.rejected.iter().map(ToString::to_string).collect();
        let _ = writeln!(output, "  Rejected at: {}", positions.join(", "));
    }
    let _ = writeln!(
        output,
        "  Turn {} | Player {} to move | Revision {}",
        game.turn(),
        game.current_player(),
        game.revision()
    );
    if let Some(winner) = game.winner() {
        let _ = writeln!(output, "  Winner: Player {winner}");
    }
    output.push('\n');

    for player in game.players() {
        let units = game.units_of(player.id).count();
        let forts = game.fortifications_of(player.id).count();
        let _ = writeln!(
            output,
            "  Player {}: ${} | {} units | {} structures | {} captures | flag {}",
            player.id,
            player.money,
            units,
            forts,
            player.captures,
            flag_label(&player.flag)
        );
        for unit in game.units_of(player.id) {
            let rank = game.rules().rank_for_xp(unit.xp);
            let _ = writeln!(
                output,
                "    #{} {:?} at {} | hp {}/{} | {}",
                unit.id,
                unit.unit_type,
                unit.position,
                unit.hp,
                unit.max_hp,
                rank_label(rank)
            );
        }
    }

    output
}

fn flag_label(flag: &Flag) -> String {
    match flag.state {
        FlagState::AtBase => "at base".to_string(),
        FlagState::Carried { carried_by } => format!("carried by #{carried_by}"),
        FlagState::Dropped { at } => format!("dropped at {at}"),
    }
}

/// Render the board as ASCII, optionally through one player's fog.
pub(super) fn render_board(game: &GameState, view: Option<&PlayerView>) -> String {
    let units: Vec<&Unit>;
    let forts: Vec<&Fortification>;
    let visible: Option<HashSet<Coord>>;
    match view {
        Some(view) => {
            units = view.units.iter().collect();
            forts = view.fortifications.iter().collect();
            visible = Some(view.visible.iter().copied().collect());
        }
        None => {
            units = game.units().collect();
            forts = game.fortifications().collect();
            visible = None;
        }
    }

    let mut tiles: HashMap<Coord, char> = HashMap::new();
    for player in game.players() {
        tiles.insert(player.base, char::from(b'0' + player.id));
        if let FlagState::Dropped { at } = player.flag.state {
            tiles.insert(at, owned('F', player.id));
        }
    }
    for fort in forts {
        tiles.insert(fort.position, owned(fort_glyph(fort.fort_type), fort.player));
    }
    for unit in units {
        tiles.insert(unit.position, owned(unit_glyph(unit.unit_type), unit.player));
    }

    let grid = game.grid();
    let mut output = String::new();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let coord = Coord::new(x, y);
            let glyph = if visible.as_ref().is_some_and(|v| !v.contains(&coord)) {
                '?'
            } else {
                tiles.get(&coord).copied().unwrap_or('.')
            };
            output.push(glyph);
            output.push(' ');
        }
        output.push('\n');
    }
    output.push_str(
        "\nLegend: I=Infantry T=Tank A=Artillery G=AT gun E=Engineer O=Officer M=Medic S=Scout \
         V=Mech  P=Pillbox B=Bunker W=Wire D=Depot  F=Flag  0/1=Base  ?=Fog\n\
         Upper case = player 0, lower case = player 1\n",
    );
    output
}
