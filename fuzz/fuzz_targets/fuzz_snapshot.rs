#![no_main]

//! Snapshot decoder fuzzer.
//!
//! Remote snapshots are untrusted input. Any document that decodes and passes
//! validation must load into a game that satisfies every invariant and can
//! keep playing without panicking.

use frontline::game::invariants::check_invariants;
use frontline::{GameState, RulesConfig, Snapshot};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(snapshot) = Snapshot::from_json(text) else {
        return;
    };
    let Ok(mut game) = GameState::from_snapshot(snapshot, RulesConfig::default()) else {
        return;
    };

    let violations = check_invariants(&game);
    assert!(violations.is_empty(), "{violations:?}");

    // Keep playing from the loaded state.
    let ids: Vec<u32> = game.units().map(|u| u.id).collect();
    for id in ids {
        let targets: Vec<_> = game.move_range(id).into_iter().collect();
        if let Some(&to) = targets.first() {
            game.move_unit(id, to);
        }
    }
    if !game.is_game_over() {
        assert!(game.end_turn());
    }
    let violations = check_invariants(&game);
    assert!(violations.is_empty(), "{violations:?}");
});
