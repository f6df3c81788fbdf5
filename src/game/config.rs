//! Balance constants for the rules engine.
//!
//! Every tunable number the rules use lives in [`RulesConfig`], which is handed
//! to [`GameState`](crate::game::GameState) at construction. Tests and callers
//! override individual values with struct update syntax.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable rule constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RulesConfig {
    /// Money each player starts with.
    pub starting_money: u32,
    /// Flat stipend paid to the incoming player every turn.
    pub turn_income: u32,
    /// Extra income per owned income-generating structure.
    pub structure_income: u32,
    /// Money awarded for capturing the opponent's flag.
    pub capture_reward: u32,
    /// Damage removed from hits on a unit standing in a friendly bunker.
    pub cover_reduction: u32,
    /// Chebyshev radius of the leadership aura.
    pub aura_radius: u16,
    /// Damage bonus granted by the leadership aura.
    pub aura_bonus: u32,
    /// Hit points restored by each support unit per turn.
    pub heal_amount: u32,
    /// Chebyshev radius of support-unit healing.
    pub heal_radius: u16,
    /// Experience needed for each rank tier, ascending.
    pub rank_thresholds: Vec<u32>,
    /// Damage bonus per rank tier.
    pub rank_bonus: u32,
    /// Manhattan radius around a target within which a friendly recon unit spots it.
    pub spotting_radius: u32,
    /// Hard Chebyshev ceiling for spotted indirect fire.
    pub spotted_range_ceiling: u16,
    /// Damage removed when a structure fires on an armored unit.
    pub structure_armor_penalty: u32,
    /// Damage added when a structure fires on an unarmored unit.
    pub structure_soft_bonus: u32,
    /// Damage added when an anti-armor unit strikes an armored unit.
    pub anti_armor_attack_bonus: u32,
    /// Counter-damage added when an anti-armor unit is attacked by an armored unit.
    pub anti_armor_defense_bonus: u32,
    /// Chebyshev radius around a base where purchases may be placed.
    pub spawn_radius: u16,
    /// Chebyshev radius around an engineer where it may build.
    pub build_radius: u16,
    /// Experience gained by an attacker per attack.
    pub xp_per_attack: u32,
    /// Experience gained by a defender that survives and returns fire.
    pub xp_per_counter: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            starting_money: 100,
            turn_income: 50,
            structure_income: 25,
            capture_reward: 100,
            cover_reduction: 2,
            aura_radius: 2,
            aura_bonus: 1,
            heal_amount: 2,
            heal_radius: 1,
            rank_thresholds: vec![3, 6],
            rank_bonus: 1,
            spotting_radius: 5,
            spotted_range_ceiling: 10,
            structure_armor_penalty: 2,
            structure_soft_bonus: 1,
            anti_armor_attack_bonus: 3,
            anti_armor_defense_bonus: 2,
            spawn_radius: 1,
            build_radius: 1,
            xp_per_attack: 1,
            xp_per_counter: 1,
        }
    }
}

impl RulesConfig {
    /// Parse a rules document. Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON or fails [`validate`](Self::validate).
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// Returns an error if rank thresholds are not strictly increasing or a
    /// placement radius is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rank_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ConfigError::RankThresholds(self.rank_thresholds.clone()));
        }
        if self.spawn_radius == 0 {
            return Err(ConfigError::Zero("spawnRadius"));
        }
        if self.build_radius == 0 {
            return Err(ConfigError::Zero("buildRadius"));
        }
        Ok(())
    }

    /// Rank tier reached with `xp` experience, capped at the highest tier.
    #[must_use]
    pub fn rank_for_xp(&self, xp: u32) -> u8 {
        let tier = self.rank_thresholds.iter().take_while(|&&t| xp >= t).count();
        u8::try_from(tier).unwrap_or(u8::MAX)
    }

    /// Damage bonus granted by `xp` experience.
    #[must_use]
    pub fn rank_bonus_for_xp(&self, xp: u32) -> u32 {
        u32::from(self.rank_for_xp(xp)).saturating_mul(self.rank_bonus)
    }
}

/// Display name for a rank tier.
#[must_use]
pub const fn rank_label(rank: u8) -> &'static str {
    match rank {
        0 => "Private",
        1 => "Corporal",
        2 => "Sergeant",
        _ => "Veteran",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_tiers() {
        let config = RulesConfig::default();
        assert_eq!(config.rank_for_xp(0), 0);
        assert_eq!(config.rank_for_xp(2), 0);
        assert_eq!(config.rank_for_xp(3), 1);
        assert_eq!(config.rank_for_xp(5), 1);
        assert_eq!(config.rank_for_xp(6), 2);
        // Capped at the last tier.
        assert_eq!(config.rank_for_xp(1000), 2);
        assert_eq!(config.rank_bonus_for_xp(1000), 2);
        assert_eq!(rank_label(config.rank_for_xp(4)), "Corporal");
    }

    #[test]
    fn test_from_json_partial() {
        let config = RulesConfig::from_json(r#"{"captureReward": 250}"#).unwrap();
        assert_eq!(config.capture_reward, 250);
        assert_eq!(config.turn_income, RulesConfig::default().turn_income);
    }

    #[test]
    fn test_rejects_unsorted_thresholds() {
        let err = RulesConfig::from_json(r#"{"rankThresholds": [6, 3]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::RankThresholds(_)));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            RulesConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
