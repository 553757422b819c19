//! Turn-based combat engine for fifth-edition-style tabletop play.
//!
//! This crate provides:
//! - Dice notation parsing and rolling with advantage/disadvantage
//! - Character building from free-form sheet text and built-in rules tables
//! - Initiative order, rounds, turn phases, and action economy tracking
//! - Attack and saving-throw resolution
//! - Spell slot and class resource pools with rest-based recharge
//!
//! # Quick Start
//!
//! ```ignore
//! use encounter_core::{
//!     Advantage, AttackRequest, CharacterProfile, CombatEngine, CombatSession, SessionConfig,
//! };
//!
//! let mut engine = CombatEngine::new();
//! let mut session = CombatSession::new(SessionConfig::new("Goblin Ambush"));
//!
//! let bryn = CharacterProfile::new("Bryn")
//!     .with_class("Fighter")
//!     .with_level(3)
//!     .with_equipment("Chain mail, longsword, shield");
//! session.add_combatant(engine.build_combatant("bryn", &bryn));
//! session.add_npc("Goblin", Some(7), Some(15), None);
//!
//! engine.roll_initiative(&mut session, "player_bryn", Advantage::Normal)?;
//! engine.roll_initiative(&mut session, "npc_goblin", Advantage::Normal)?;
//! session.begin_combat();
//!
//! let outcome = engine.attack(&mut session, &AttackRequest::new("player_bryn", "npc_goblin"))?;
//! println!("{}", outcome.attack_roll);
//! ```

pub mod builder;
pub mod combatant;
pub mod dice;
pub mod engine;
pub mod parse;
pub mod progression;
pub mod registry;
pub mod report;
pub mod resources;
pub mod rules;
pub mod session;
pub mod testing;

// Primary public API
pub use builder::{build_combatant_from_profile, CharacterProfile};
pub use combatant::{Ability, AbilityScores, Combatant, Recharge, Resource};
pub use dice::{Advantage, DiceError, DiceExpression, DiceRoller, RandomRoller, RollResult};
pub use engine::{AttackOutcome, AttackRequest, CombatEngine, SavingThrowOutcome};
pub use progression::{ProgressionLookup, StandardProgression};
pub use registry::{SessionHandle, SessionRegistry};
pub use report::format_status;
pub use rules::{RulesLookup, StandardRules};
pub use session::{ActionError, CombatSession, SessionConfig, SessionStatus, TurnPhase};
pub use testing::SequenceRoller;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_builds_a_combatant() {
        let engine = CombatEngine::new();
        let profile = CharacterProfile::new("Mira").with_class("Wizard");
        let mira = engine.build_combatant("mira", &profile);
        assert_eq!(mira.id, "player_mira");
        assert!(mira.spell_slots.get(1).is_some());
    }

    #[test]
    fn test_status_for_no_session() {
        assert_eq!(format_status(None), "No active combat.");
    }
}
