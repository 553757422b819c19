//! Combatants and the pieces of a character sheet the engine tracks.
//!
//! A combatant is either a player derived from a profile sheet or a bare
//! NPC stat block. Numeric facts the sheet could not supply stay `None`
//! ("unknown") rather than collapsing to zero; every operation downstream
//! is written to keep working with unknowns.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::parse::normalize_name;

// ============================================================================
// Abilities
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    /// Three-letter sheet abbreviation.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "str",
            Ability::Dexterity => "dex",
            Ability::Constitution => "con",
            Ability::Intelligence => "int",
            Ability::Wisdom => "wis",
            Ability::Charisma => "cha",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    /// Match a three-letter abbreviation, case-insensitive.
    pub fn from_abbreviation(text: &str) -> Option<Ability> {
        Ability::all()
            .into_iter()
            .find(|ability| ability.abbreviation().eq_ignore_ascii_case(text))
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The six scores of a sheet. Unparsed abilities stay at 10 (+0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityScores {
    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, score: u8) {
        match ability {
            Ability::Strength => self.strength = score,
            Ability::Dexterity => self.dexterity = score,
            Ability::Constitution => self.constitution = score,
            Ability::Intelligence => self.intelligence = score,
            Ability::Wisdom => self.wisdom = score,
            Ability::Charisma => self.charisma = score,
        }
    }

    /// Ability modifier: floor((score - 10) / 2).
    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.get(ability) as i32 - 10).div_euclid(2)
    }
}

/// Standard proficiency-bonus tiers by character level. Levels at or past
/// 17 cap at +6; non-positive levels fall back to +2.
pub fn proficiency_bonus_for_level(level: i32) -> i32 {
    match level {
        i32::MIN..=4 => 2,
        5..=8 => 3,
        9..=12 => 4,
        13..=16 => 5,
        _ => 6,
    }
}

// ============================================================================
// Weapon proficiency
// ============================================================================

/// Which broad weapon groups a class grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeaponProficiencies {
    pub simple: bool,
    pub martial: bool,
}

impl WeaponProficiencies {
    /// Whether the flags cover a weapon category ("Simple Melee",
    /// "Martial Ranged", ...). Categories naming neither group are never
    /// covered.
    pub fn covers(&self, category: &str) -> bool {
        let lower = category.to_lowercase();
        if lower.contains("simple") {
            self.simple
        } else if lower.contains("martial") {
            self.martial
        } else {
            false
        }
    }
}

// ============================================================================
// Spell slots
// ============================================================================

/// One slot level: how many exist and how many were spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotInfo {
    pub total: u32,
    pub spent: u32,
}

impl SlotInfo {
    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.spent)
    }
}

/// Spell slots for levels 1 through 9. A level with a zero total is the
/// same as a level the caster does not have.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpellSlots {
    slots: [SlotInfo; 9],
}

impl SpellSlots {
    fn index(level: u8) -> Option<usize> {
        (1..=9).contains(&level).then(|| level as usize - 1)
    }

    pub fn set_total(&mut self, level: u8, total: u32) {
        if let Some(i) = Self::index(level) {
            self.slots[i] = SlotInfo { total, spent: 0 };
        }
    }

    /// The slot record for a level the caster actually has.
    pub fn get(&self, level: u8) -> Option<SlotInfo> {
        let info = self.slots[Self::index(level)?];
        (info.total > 0).then_some(info)
    }

    pub(crate) fn slot_mut(&mut self, level: u8) -> Option<&mut SlotInfo> {
        let i = Self::index(level)?;
        Some(&mut self.slots[i])
    }

    /// Levels with at least one slot, ascending.
    pub fn iter_filled(&self) -> impl Iterator<Item = (u8, SlotInfo)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, info)| info.total > 0)
            .map(|(i, info)| (i as u8 + 1, *info))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|info| info.total == 0)
    }
}

// ============================================================================
// Limited-use resources
// ============================================================================

/// When a limited-use pool refills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recharge {
    ShortRest,
    LongRest,
}

impl fmt::Display for Recharge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recharge::ShortRest => write!(f, "short rest"),
            Recharge::LongRest => write!(f, "long rest"),
        }
    }
}

/// How a pool's maximum was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Fixed,
    ByLevel,
    SeeClassTable,
    Invocation,
    Custom,
}

/// A limited-use pool: rage uses, superiority dice, a once-per-rest
/// invocation, or anything a table wants tracked ad hoc.
///
/// `current`/`max` are `None` when the source data could not be resolved
/// (a progression cell reading "Unlimited", an unknown subclass). Spending
/// from an unknown pool fails; setting a value makes it known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub current: Option<u32>,
    pub max: Option<u32>,
    pub recharge: Option<Recharge>,
    pub kind: PoolKind,
    #[serde(default)]
    pub notes: String,
    pub die_size: Option<u32>,
    pub slot_level: Option<u8>,
}

impl Resource {
    /// An ad-hoc pool created by setting a value on an id nobody defined.
    pub fn custom(id: impl Into<String>, name: impl Into<String>, value: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            current: Some(value),
            max: None,
            recharge: None,
            kind: PoolKind::Custom,
            notes: String::new(),
            die_size: None,
            slot_level: None,
        }
    }
}

// ============================================================================
// Combatant
// ============================================================================

/// Player-only sheet data. NPCs never carry one; everything that reads it
/// falls back to neutral values (+0 modifiers, no proficiencies).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSheet {
    pub user_id: String,
    pub class_id: Option<String>,
    pub level: i32,
    pub abilities: AbilityScores,
    pub weapon_proficiencies: WeaponProficiencies,
    pub saving_throws: Vec<Ability>,
    pub equipment: Vec<String>,
    pub weapons: Vec<String>,
}

/// Player or NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatantKind {
    Player(PlayerSheet),
    Npc,
}

/// One participant in a combat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: String,
    pub name: String,
    pub initiative: Option<i32>,
    pub max_hp: Option<i32>,
    pub current_hp: Option<i32>,
    pub armor_class: Option<i32>,
    pub proficiency_bonus: i32,
    pub conditions: Vec<String>,
    pub spell_slots: SpellSlots,
    pub resources: Vec<Resource>,
    pub kind: CombatantKind,
}

impl Combatant {
    /// A bare NPC stat block: name, HP, AC, initiative, nothing else.
    pub fn npc(
        id: impl Into<String>,
        name: impl Into<String>,
        hp: Option<i32>,
        armor_class: Option<i32>,
        initiative: Option<i32>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            initiative,
            max_hp: hp,
            current_hp: hp,
            armor_class,
            proficiency_bonus: 2,
            conditions: Vec::new(),
            spell_slots: SpellSlots::default(),
            resources: Vec::new(),
            kind: CombatantKind::Npc,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, CombatantKind::Player(_))
    }

    pub fn is_npc(&self) -> bool {
        matches!(self.kind, CombatantKind::Npc)
    }

    pub fn sheet(&self) -> Option<&PlayerSheet> {
        match &self.kind {
            CombatantKind::Player(sheet) => Some(sheet),
            CombatantKind::Npc => None,
        }
    }

    /// Ability modifier from the sheet; NPCs are +0 across the board.
    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        self.sheet()
            .map(|sheet| sheet.abilities.modifier(ability))
            .unwrap_or(0)
    }

    pub fn weapon_names(&self) -> &[String] {
        self.sheet().map(|sheet| sheet.weapons.as_slice()).unwrap_or(&[])
    }

    pub fn proficient_with(&self, weapon_category: &str) -> bool {
        self.sheet()
            .map(|sheet| sheet.weapon_proficiencies.covers(weapon_category))
            .unwrap_or(false)
    }

    pub fn saving_throw_proficient(&self, ability: Ability) -> bool {
        self.sheet()
            .map(|sheet| sheet.saving_throws.contains(&ability))
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // Hit points
    // ------------------------------------------------------------------

    /// Subtract damage. Unknown current HP is treated as 0 first, and the
    /// result is clamped into `[0, max_hp]` where the maximum is known.
    /// Negative amounts heal. Returns the new current HP.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        let current = self.current_hp.unwrap_or(0);
        let mut next = current.saturating_sub(amount).max(0);
        if let Some(max) = self.max_hp {
            next = next.min(max.max(0));
        }
        self.current_hp = Some(next);
        next
    }

    /// Set current HP directly, clamped into `[0, max_hp]` where known.
    pub fn set_current_hp(&mut self, value: i32) {
        let mut next = value.max(0);
        if let Some(max) = self.max_hp {
            next = next.min(max.max(0));
        }
        self.current_hp = Some(next);
    }

    // ------------------------------------------------------------------
    // Conditions
    // ------------------------------------------------------------------

    pub fn has_condition(&self, condition: &str) -> bool {
        self.conditions.iter().any(|c| c == condition)
    }

    /// Add a condition once; re-adding is a no-op.
    pub fn add_condition(&mut self, condition: &str) {
        if !self.has_condition(condition) {
            self.conditions.push(condition.to_string());
        }
    }

    /// Remove a condition; removing one that is absent is a no-op.
    pub fn remove_condition(&mut self, condition: &str) {
        self.conditions.retain(|c| c != condition);
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    fn resource_index(&self, query: &str) -> Option<usize> {
        if let Some(i) = self.resources.iter().position(|r| r.id == query) {
            return Some(i);
        }
        let norm = normalize_name(query);
        if norm.is_empty() {
            return None;
        }
        self.resources
            .iter()
            .position(|r| normalize_name(&r.name) == norm || normalize_name(&r.id) == norm)
    }

    /// Locate a pool by exact id first, then by normalized name or id.
    pub fn find_resource(&self, query: &str) -> Option<&Resource> {
        self.resource_index(query).map(|i| &self.resources[i])
    }

    pub fn find_resource_mut(&mut self, query: &str) -> Option<&mut Resource> {
        self.resource_index(query).map(move |i| &mut self.resources[i])
    }
}
