//! Flag pickup, capture, return and drop.

use tracing::{debug, info};

use crate::game::{Coord, EntityId, FlagState, GameState, PlayerId, opponent};

impl GameState {
    /// Where a player's flag currently is.
    ///
    /// A carried flag is reported at its carrier's tile.
    #[must_use]
    pub fn flag_position(&self, owner: PlayerId) -> Option<Coord> {
        let player = self.player(owner)?;
        match player.flag.state {
            FlagState::AtBase => Some(player.base),
            FlagState::Dropped { at } => Some(at),
            FlagState::Carried { carried_by } => self.units.get(&carried_by).map(|u| u.position),
        }
    }

    /// Owners of the flags a unit is carrying.
    pub fn flags_carried_by(&self, unit_id: EntityId) -> impl Iterator<Item = PlayerId> + '_ {
        self.players
            .iter()
            .filter(move |p| p.flag.carrier() == Some(unit_id))
            .map(|p| p.id)
    }

    /// Pick up every loose flag on the unit's tile.
    ///
    /// A unit never lifts its own flag off its own base.
    pub(crate) fn pick_up_flags(&mut self, unit_id: EntityId) {
        let Some(unit) = self.units.get(&unit_id) else {
            return;
        };
        let (carrier_player, at) = (unit.player, unit.position);

        for owner in 0..self.players.len() {
            let Some(position) = self.flag_position(self.players[owner].id) else {
                continue;
            };
            let flag = &mut self.players[owner].flag;
            if !flag.is_loose() || position != at {
                continue;
            }
            if flag.owner == carrier_player && flag.state == FlagState::AtBase {
                continue;
            }
            flag.state = FlagState::Carried {
                carried_by: unit_id,
            };
            debug!(unit = unit_id, flag = flag.owner, at = %at, "flag picked up");
        }
    }

    /// Resolve flags a unit brings onto its own base.
    ///
    /// The enemy flag is captured: it returns to its base and the carrier's
    /// player is paid the capture reward. The unit's own flag is returned home.
    /// Returns `true` if a capture happened.
    pub(crate) fn resolve_flag_at_base(&mut self, unit_id: EntityId) -> bool {
        let Some(unit) = self.units.get(&unit_id) else {
            return false;
        };
        let player = unit.player;
        let Some(base) = self.player(player).map(|p| p.base) else {
            return false;
        };
        if unit.position != base {
            return false;
        }

        let mut captured = false;
        let enemy = usize::from(opponent(player));
        if self.players[enemy].flag.carrier() == Some(unit_id) {
            self.players[enemy].flag.reset();
            let reward = self.rules.capture_reward;
            let scorer = &mut self.players[usize::from(player)];
            scorer.earn(reward);
            scorer.captures = scorer.captures.saturating_add(1);
            captured = true;
            info!(player, unit = unit_id, captures = scorer.captures, "flag captured");
        }
        let own = &mut self.players[usize::from(player)].flag;
        if own.carrier() == Some(unit_id) {
            own.reset();
            debug!(player, unit = unit_id, "flag returned");
        }
        captured
    }

    /// Drop every flag a unit carries onto `at`.
    pub(crate) fn drop_flags_carried_by(&mut self, unit_id: EntityId, at: Coord) {
        for player in &mut self.players {
            if player.flag.carrier() == Some(unit_id) {
                player.flag.drop_at(at);
                debug!(unit = unit_id, flag = player.id, at = %at, "flag dropped");
            }
        }
    }
}
