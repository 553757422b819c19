//! The combat engine: every operation that needs dice or rules tables.
//!
//! [`CombatEngine`] owns the three collaborators and stays generic over
//! them, so tests swap in a scripted roller and homebrew tables slot in
//! without touching the resolution logic. Session bookkeeping that needs
//! neither dice nor tables lives on [`CombatSession`] itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::{build_combatant_from_profile, CharacterProfile};
use crate::combatant::{Ability, Combatant};
use crate::dice::{Advantage, DiceError, DiceExpression, DiceRoller, RandomRoller, RollResult};
use crate::parse::{parse_ability, parse_weapon_damage};
use crate::progression::{ProgressionLookup, StandardProgression};
use crate::rules::{RulesLookup, StandardRules};
use crate::session::{ActionError, CombatSession};

/// An attack to resolve. Without an explicit weapon the attacker's first
/// listed weapon is used; without that the swing is unarmed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackRequest {
    pub attacker_id: String,
    pub target_id: String,
    pub weapon: Option<String>,
    pub advantage: Advantage,
    /// Replaces the weapon's damage dice entirely when present.
    pub override_damage: Option<String>,
}

impl AttackRequest {
    pub fn new(attacker_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            attacker_id: attacker_id.into(),
            target_id: target_id.into(),
            weapon: None,
            advantage: Advantage::default(),
            override_damage: None,
        }
    }

    pub fn with_weapon(mut self, weapon: impl Into<String>) -> Self {
        self.weapon = Some(weapon.into());
        self
    }

    pub fn with_advantage(mut self, advantage: Advantage) -> Self {
        self.advantage = advantage;
        self
    }

    pub fn with_damage_override(mut self, expression: impl Into<String>) -> Self {
        self.override_damage = Some(expression.into());
        self
    }
}

/// What came of an attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub attacker_id: String,
    pub target_id: String,
    /// Canonical weapon name when the table knows it, the given name
    /// otherwise, "Unarmed" when there was none at all.
    pub weapon: String,
    pub attack_roll: RollResult,
    pub hit: bool,
    pub damage_roll: Option<RollResult>,
    pub damage_total: i32,
    pub target_hp: Option<i32>,
}

/// What came of a saving throw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingThrowOutcome {
    pub combatant_id: String,
    /// `None` when the ability text was not recognized; the roll is then
    /// a flat d20.
    pub ability: Option<Ability>,
    pub proficient: bool,
    pub roll: RollResult,
    pub dc: Option<i32>,
    /// `None` when no DC was given; the table adjudicates by hand.
    pub success: Option<bool>,
}

/// The resolver. The default engine uses the built-in tables and the
/// thread-local RNG.
pub struct CombatEngine<R = StandardRules, P = StandardProgression, D = RandomRoller> {
    rules: R,
    progression: P,
    dice: D,
}

impl CombatEngine {
    pub fn new() -> Self {
        Self {
            rules: StandardRules,
            progression: StandardProgression,
            dice: RandomRoller,
        }
    }
}

impl Default for CombatEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P, D> CombatEngine<R, P, D>
where
    R: RulesLookup,
    P: ProgressionLookup,
    D: DiceRoller,
{
    pub fn with_collaborators(rules: R, progression: P, dice: D) -> Self {
        Self {
            rules,
            progression,
            dice,
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn progression(&self) -> &P {
        &self.progression
    }

    /// Build a player combatant from a profile using this engine's
    /// tables.
    pub fn build_combatant(&self, user_id: &str, profile: &CharacterProfile) -> Combatant {
        build_combatant_from_profile(&self.rules, &self.progression, user_id, profile)
    }

    /// Parse and roll a free-form dice expression.
    pub fn roll(&mut self, input: &str) -> Result<RollResult, DiceError> {
        let expression = DiceExpression::parse(input)?;
        Ok(self.dice.roll(&expression))
    }

    /// Roll initiative (1d20 + Dex) for a combatant and record the total.
    pub fn roll_initiative(
        &mut self,
        session: &mut CombatSession,
        combatant_id: &str,
        advantage: Advantage,
    ) -> Result<RollResult, ActionError> {
        let combatant = session
            .combatant_mut(combatant_id)
            .ok_or(ActionError::CombatantNotFound)?;
        let modifier = combatant.ability_modifier(Ability::Dexterity);
        let roll = self.dice.roll(&DiceExpression::d20(modifier, advantage));
        combatant.initiative = Some(roll.total);
        debug!(combatant = combatant_id, total = roll.total, "initiative rolled");
        Ok(roll)
    }

    /// Resolve an attack: a d20 against the target's AC, then damage on a
    /// hit. A target with unknown AC is always hit; a target with unknown
    /// HP takes no tracked damage.
    pub fn attack(
        &mut self,
        session: &mut CombatSession,
        request: &AttackRequest,
    ) -> Result<AttackOutcome, ActionError> {
        if !session.combatants.contains_key(&request.attacker_id)
            || !session.combatants.contains_key(&request.target_id)
        {
            return Err(ActionError::InvalidAttackerOrTarget);
        }
        let attacker = session
            .combatant(&request.attacker_id)
            .ok_or(ActionError::InvalidAttackerOrTarget)?;

        let weapon_query = request
            .weapon
            .clone()
            .or_else(|| attacker.weapon_names().first().cloned());
        let weapon_row = weapon_query
            .as_deref()
            .and_then(|name| self.rules.weapon(name));

        // An unrecognized weapon swings with no modifier and no
        // proficiency, like an improvised attack.
        let (ability_mod, proficient) = match weapon_row {
            Some(row) => {
                let modifier = if row.is_finesse() {
                    attacker
                        .ability_modifier(Ability::Strength)
                        .max(attacker.ability_modifier(Ability::Dexterity))
                } else if row.is_ranged() {
                    attacker.ability_modifier(Ability::Dexterity)
                } else {
                    attacker.ability_modifier(Ability::Strength)
                };
                (modifier, attacker.proficient_with(&row.category))
            }
            None => (0, false),
        };
        let to_hit = ability_mod
            + if proficient {
                attacker.proficiency_bonus
            } else {
                0
            };

        let target_ac = session
            .combatant(&request.target_id)
            .and_then(|target| target.armor_class);

        let attack_roll = self
            .dice
            .roll(&DiceExpression::d20(to_hit, request.advantage));
        let hit = match target_ac {
            Some(ac) => attack_roll.total >= ac,
            None => true,
        };

        let mut damage_roll: Option<RollResult> = None;
        let mut damage_total = 0;
        if hit {
            if let Some(text) = request.override_damage.as_deref() {
                // An override that does not parse deals no damage; the
                // hit itself stands.
                if let Ok(expression) = DiceExpression::parse(text) {
                    let roll = self.dice.roll(&expression);
                    damage_total = roll.total;
                    damage_roll = Some(roll);
                }
            } else if let Some(damage) =
                weapon_row.and_then(|row| parse_weapon_damage(&row.damage))
            {
                let expression = DiceExpression {
                    count: damage.count,
                    sides: damage.sides,
                    modifier: ability_mod + damage.flat,
                    advantage: Advantage::Normal,
                };
                let roll = self.dice.roll(&expression);
                damage_total = roll.total;
                damage_roll = Some(roll);
            }
        }

        let weapon_name = weapon_row
            .map(|row| row.name.clone())
            .or(weapon_query)
            .unwrap_or_else(|| "Unarmed".to_string());

        let target = session
            .combatant_mut(&request.target_id)
            .ok_or(ActionError::InvalidAttackerOrTarget)?;
        let target_hp = if hit && target.current_hp.is_some() {
            Some(target.apply_damage(damage_total))
        } else {
            target.current_hp
        };

        debug!(
            attacker = request.attacker_id.as_str(),
            target = request.target_id.as_str(),
            weapon = weapon_name.as_str(),
            hit,
            damage = damage_total,
            "attack resolved"
        );

        Ok(AttackOutcome {
            attacker_id: request.attacker_id.clone(),
            target_id: request.target_id.clone(),
            weapon: weapon_name,
            attack_roll,
            hit,
            damage_roll,
            damage_total,
            target_hp,
        })
    }

    /// Roll a saving throw. Unrecognized ability text rolls a flat d20;
    /// without a DC the outcome is left to the table.
    pub fn roll_saving_throw(
        &mut self,
        session: &CombatSession,
        combatant_id: &str,
        ability_text: &str,
        dc: Option<i32>,
        advantage: Advantage,
    ) -> Result<SavingThrowOutcome, ActionError> {
        let combatant = session
            .combatant(combatant_id)
            .ok_or(ActionError::TargetNotFound)?;
        let ability = parse_ability(ability_text);
        let (modifier, proficient) = match ability {
            Some(ability) => {
                let proficient = combatant.saving_throw_proficient(ability);
                let mut modifier = combatant.ability_modifier(ability);
                if proficient {
                    modifier += combatant.proficiency_bonus;
                }
                (modifier, proficient)
            }
            None => (0, false),
        };
        let roll = self.dice.roll(&DiceExpression::d20(modifier, advantage));
        let success = dc.map(|dc| roll.total >= dc);
        Ok(SavingThrowOutcome {
            combatant_id: combatant_id.to_string(),
            ability,
            proficient,
            roll,
            dc,
            success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;
    use crate::testing::SequenceRoller;

    type TestEngine = CombatEngine<StandardRules, StandardProgression, SequenceRoller>;

    fn scripted(faces: &[u32]) -> TestEngine {
        CombatEngine::with_collaborators(
            StandardRules,
            StandardProgression,
            SequenceRoller::new(faces.iter().copied()),
        )
    }

    fn arena() -> (TestEngine, CombatSession) {
        let engine = scripted(&[]);
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        let fighter = engine.build_combatant(
            "bryn",
            &CharacterProfile::new("Bryn")
                .with_class("Fighter")
                .with_stats("STR 16 DEX 12 CON 14")
                .with_equipment("Chain mail, longsword"),
        );
        session.add_combatant(fighter);
        session.add_npc("Goblin", Some(15), Some(15), None);
        (engine, session)
    }

    #[test]
    fn test_attack_hit_and_damage() {
        let (_, mut session) = arena();
        let mut engine = scripted(&[12, 4]);
        let outcome = engine
            .attack(&mut session, &AttackRequest::new("player_bryn", "npc_goblin"))
            .unwrap();
        // +3 Str, +2 proficiency: 12 + 5 = 17 against AC 15.
        assert!(outcome.hit);
        assert_eq!(outcome.attack_roll.total, 17);
        assert_eq!(outcome.weapon, "Longsword");
        // 1d8 + 3: the scripted 4 becomes 7.
        assert_eq!(outcome.damage_total, 7);
        assert_eq!(outcome.target_hp, Some(8));
        assert_eq!(session.combatant("npc_goblin").unwrap().current_hp, Some(8));
    }

    #[test]
    fn test_attack_miss_rolls_no_damage() {
        let (_, mut session) = arena();
        let mut engine = scripted(&[9, 4]);
        let outcome = engine
            .attack(&mut session, &AttackRequest::new("player_bryn", "npc_goblin"))
            .unwrap();
        assert!(!outcome.hit);
        assert_eq!(outcome.attack_roll.total, 14);
        assert!(outcome.damage_roll.is_none());
        assert_eq!(outcome.damage_total, 0);
        assert_eq!(session.combatant("npc_goblin").unwrap().current_hp, Some(15));
    }

    #[test]
    fn test_unknown_ac_always_hits() {
        let (_, mut session) = arena();
        session.add_npc("Wisp", Some(5), None, None);
        let mut engine = scripted(&[1, 2]);
        let outcome = engine
            .attack(&mut session, &AttackRequest::new("player_bryn", "npc_wisp"))
            .unwrap();
        assert!(outcome.hit);
        assert_eq!(outcome.target_hp, Some(0));
    }

    #[test]
    fn test_unknown_hp_is_left_alone() {
        let (_, mut session) = arena();
        session.add_npc("Shade", None, Some(10), None);
        let mut engine = scripted(&[20, 8]);
        let outcome = engine
            .attack(&mut session, &AttackRequest::new("player_bryn", "npc_shade"))
            .unwrap();
        assert!(outcome.hit);
        assert_eq!(outcome.target_hp, None);
        assert_eq!(session.combatant("npc_shade").unwrap().current_hp, None);
    }

    #[test]
    fn test_finesse_uses_the_better_modifier() {
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        let rogue = scripted(&[]).build_combatant(
            "vex",
            &CharacterProfile::new("Vex")
                .with_class("Rogue")
                .with_stats("STR 8 DEX 16")
                .with_equipped(vec!["Dagger".to_string()]),
        );
        session.add_combatant(rogue);
        session.add_npc("Goblin", Some(7), Some(10), None);

        let mut engine = scripted(&[10, 2]);
        let outcome = engine
            .attack(&mut session, &AttackRequest::new("player_vex", "npc_goblin"))
            .unwrap();
        // Dex +3 wins over Str -1; simple weapon proficiency adds +2.
        assert_eq!(outcome.attack_roll.total, 15);
        assert_eq!(outcome.damage_total, 5);
    }

    #[test]
    fn test_unrecognized_weapon_swings_flat() {
        let (_, mut session) = arena();
        let mut engine = scripted(&[14]);
        let outcome = engine
            .attack(
                &mut session,
                &AttackRequest::new("player_bryn", "npc_goblin").with_weapon("Glass Sword"),
            )
            .unwrap();
        assert_eq!(outcome.attack_roll.total, 14);
        assert_eq!(outcome.weapon, "Glass Sword");
        assert!(outcome.damage_roll.is_none());
        assert_eq!(outcome.damage_total, 0);
        assert_eq!(outcome.target_hp, Some(15));
    }

    #[test]
    fn test_unarmed_when_no_weapon_anywhere() {
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        session.add_npc("Brawler", Some(10), None, None);
        session.add_npc("Goblin", Some(7), Some(5), None);
        let mut engine = scripted(&[10]);
        let outcome = engine
            .attack(&mut session, &AttackRequest::new("npc_brawler", "npc_goblin"))
            .unwrap();
        assert_eq!(outcome.weapon, "Unarmed");
        assert!(outcome.hit);
        assert_eq!(outcome.damage_total, 0);
    }

    #[test]
    fn test_damage_override() {
        let (_, mut session) = arena();
        let mut engine = scripted(&[12, 3, 4]);
        let outcome = engine
            .attack(
                &mut session,
                &AttackRequest::new("player_bryn", "npc_goblin").with_damage_override("2d6+1"),
            )
            .unwrap();
        assert!(outcome.hit);
        assert_eq!(outcome.damage_total, 8);

        // A bad override still hits but deals nothing.
        let mut engine = scripted(&[12]);
        let outcome = engine
            .attack(
                &mut session,
                &AttackRequest::new("player_bryn", "npc_goblin").with_damage_override("banana"),
            )
            .unwrap();
        assert!(outcome.hit);
        assert!(outcome.damage_roll.is_none());
        assert_eq!(outcome.damage_total, 0);
    }

    #[test]
    fn test_attack_validates_both_sides() {
        let (_, mut session) = arena();
        let mut engine = scripted(&[]);
        assert_eq!(
            engine.attack(&mut session, &AttackRequest::new("player_bryn", "npc_ghost")),
            Err(ActionError::InvalidAttackerOrTarget)
        );
        assert_eq!(
            engine.attack(&mut session, &AttackRequest::new("npc_ghost", "npc_goblin")),
            Err(ActionError::InvalidAttackerOrTarget)
        );
    }

    #[test]
    fn test_roll_initiative_records_total() {
        let (_, mut session) = arena();
        let mut engine = scripted(&[11]);
        let roll = engine
            .roll_initiative(&mut session, "player_bryn", Advantage::Normal)
            .unwrap();
        // Dex 12 gives +1.
        assert_eq!(roll.total, 12);
        assert_eq!(
            session.combatant("player_bryn").unwrap().initiative,
            Some(12)
        );

        let mut engine = scripted(&[5, 17]);
        let roll = engine
            .roll_initiative(&mut session, "player_bryn", Advantage::Advantage)
            .unwrap();
        assert_eq!(roll.chosen, Some(17));
        assert_eq!(roll.total, 18);
    }

    #[test]
    fn test_saving_throw_without_proficiency() {
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        let cleric = scripted(&[]).build_combatant(
            "mira",
            &CharacterProfile::new("Mira")
                .with_class("Cleric")
                .with_stats("STR 12 WIS 16"),
        );
        session.add_combatant(cleric);

        let mut engine = scripted(&[11]);
        let outcome = engine
            .roll_saving_throw(&session, "player_mira", "str", Some(13), Advantage::Normal)
            .unwrap();
        assert_eq!(outcome.ability, Some(Ability::Strength));
        assert!(!outcome.proficient);
        assert_eq!(outcome.roll.total, 12);
        assert_eq!(outcome.success, Some(false));
    }

    #[test]
    fn test_saving_throw_with_proficiency() {
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        let cleric = scripted(&[]).build_combatant(
            "mira",
            &CharacterProfile::new("Mira")
                .with_class("Cleric")
                .with_stats("WIS 16"),
        );
        session.add_combatant(cleric);

        let mut engine = scripted(&[10]);
        let outcome = engine
            .roll_saving_throw(&session, "player_mira", "Wisdom", Some(15), Advantage::Normal)
            .unwrap();
        // Wis +3 plus proficiency +2.
        assert!(outcome.proficient);
        assert_eq!(outcome.roll.total, 15);
        assert_eq!(outcome.success, Some(true));
    }

    #[test]
    fn test_saving_throw_edge_inputs() {
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        session.add_npc("Goblin", Some(7), None, None);

        let mut engine = scripted(&[9]);
        let outcome = engine
            .roll_saving_throw(&session, "npc_goblin", "luck", None, Advantage::Normal)
            .unwrap();
        assert_eq!(outcome.ability, None);
        assert_eq!(outcome.roll.total, 9);
        assert_eq!(outcome.success, None);

        assert_eq!(
            engine.roll_saving_throw(&session, "npc_ghost", "dex", None, Advantage::Normal),
            Err(ActionError::TargetNotFound)
        );
    }

    #[test]
    fn test_free_roll() {
        let mut engine = scripted(&[3, 5]);
        let roll = engine.roll("2d6+3").unwrap();
        assert_eq!(roll.total, 11);
        assert_eq!(engine.roll("banana"), Err(DiceError::Malformed));
    }
}
