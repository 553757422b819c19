//! Building a player combatant from a character profile.
//!
//! Profiles come from whatever the host stores about a character: free
//! text for stats and equipment, optional numeric overrides from play.
//! The builder never fails; fields it cannot derive stay unknown, and an
//! unrecognized class simply produces a combatant with no class math.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::combatant::{
    proficiency_bonus_for_level, Ability, Combatant, CombatantKind, PlayerSheet, SpellSlots,
    WeaponProficiencies,
};
use crate::parse;
use crate::progression::ProgressionLookup;
use crate::resources::{self, ResourceContext};
use crate::rules::{InvocationRecord, RulesLookup};

/// Everything the host knows about a character before combat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    pub name: String,
    /// Class reference: a `CLS_` id or a display name.
    pub class_name: Option<String>,
    pub subclass_name: Option<String>,
    pub level: Option<i32>,
    /// Free text like "STR 10 DEX 16 CON 14".
    pub stats: String,
    /// Free text like "Scale mail + shield, longsword".
    pub equipment: String,
    pub inventory: Vec<String>,
    /// Hand-equipped item names; these win the weapon selection as-is.
    pub equipped: Vec<String>,
    pub invocations: Vec<String>,
    pub max_hp: Option<i32>,
    pub current_hp: Option<i32>,
    pub armor_class: Option<i32>,
}

impl CharacterProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class_name = Some(class.into());
        self
    }

    pub fn with_subclass(mut self, subclass: impl Into<String>) -> Self {
        self.subclass_name = Some(subclass.into());
        self
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_stats(mut self, stats: impl Into<String>) -> Self {
        self.stats = stats.into();
        self
    }

    pub fn with_equipment(mut self, equipment: impl Into<String>) -> Self {
        self.equipment = equipment.into();
        self
    }

    pub fn with_inventory(mut self, inventory: Vec<String>) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_equipped(mut self, equipped: Vec<String>) -> Self {
        self.equipped = equipped;
        self
    }

    pub fn with_invocations(mut self, invocations: Vec<String>) -> Self {
        self.invocations = invocations;
        self
    }

    pub fn with_max_hp(mut self, max_hp: i32) -> Self {
        self.max_hp = Some(max_hp);
        self
    }

    pub fn with_current_hp(mut self, current_hp: i32) -> Self {
        self.current_hp = Some(current_hp);
        self
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = Some(armor_class);
        self
    }
}

/// Derive a player combatant from a profile. Overrides beat computed
/// values field by field, so a table that tracks HP by hand keeps its
/// numbers.
pub fn build_combatant_from_profile<R, P>(
    rules: &R,
    progression: &P,
    user_id: &str,
    profile: &CharacterProfile,
) -> Combatant
where
    R: RulesLookup + ?Sized,
    P: ProgressionLookup + ?Sized,
{
    let id = parse::combatant_id("player", user_id);
    let name = if profile.name.is_empty() {
        format!("Player {}", user_id)
    } else {
        profile.name.clone()
    };

    let class_record = profile.class_name.as_deref().and_then(|text| {
        if text.starts_with("CLS_") {
            rules.class_by_id(text)
        } else {
            rules.class_by_name(text)
        }
    });
    if let Some(text) = profile.class_name.as_deref() {
        if class_record.is_none() {
            debug!(class = text, user_id, "class not found in rules tables");
        }
    }

    let level = profile.level.unwrap_or(1);
    let abilities = parse::parse_ability_scores(&profile.stats);
    let con_mod = abilities.modifier(Ability::Constitution);
    let dex_mod = abilities.modifier(Ability::Dexterity);

    let computed_max =
        class_record.and_then(|class| compute_max_hp(&class.hit_die, level, con_mod));
    let max_hp = profile.max_hp.or(computed_max);
    let current_hp = profile.current_hp.or(max_hp);

    let equipment_list = parse::parse_equipment_list(&profile.equipment);
    let armor_class = profile.armor_class.or_else(|| {
        let items: &[String] = if profile.inventory.is_empty() {
            &equipment_list
        } else {
            &profile.inventory
        };
        Some(compute_armor_class(rules, items, dex_mod))
    });

    let proficiency_bonus = proficiency_bonus_for_level(level);
    let weapon_proficiencies = class_record
        .map(|class| {
            let text = class.weapon_proficiencies.to_lowercase();
            WeaponProficiencies {
                simple: text.contains("simple"),
                martial: text.contains("martial"),
            }
        })
        .unwrap_or_default();
    let saving_throws = class_record
        .map(|class| parse::parse_saving_throws(&class.saving_throws))
        .unwrap_or_default();

    let row = class_record.and_then(|class| progression.row(&class.id, level));
    let mut spell_slots = SpellSlots::default();
    if let Some(row) = &row {
        for (i, &total) in row.spell_slots.iter().enumerate() {
            if total > 0 {
                spell_slots.set_total(i as u8 + 1, total);
            }
        }
    }

    let weapons = select_weapons(rules, profile, &equipment_list);

    let class_features = class_record
        .map(|class| rules.class_features(&class.id))
        .unwrap_or(&[]);
    let subclass_features = profile
        .subclass_name
        .as_deref()
        .and_then(|name| rules.subclass_by_name(name))
        .map(|subclass| rules.subclass_features(&subclass.id))
        .unwrap_or(&[]);
    let invocation_records: Vec<&InvocationRecord> = profile
        .invocations
        .iter()
        .filter_map(|name| rules.invocation(name))
        .collect();
    let ctx = ResourceContext {
        level,
        proficiency_bonus,
        abilities: &abilities,
        row: row.as_ref(),
    };
    let pools = resources::collect(class_features, subclass_features, &invocation_records, &ctx);

    let mut combatant = Combatant {
        id,
        name,
        initiative: None,
        max_hp,
        current_hp,
        armor_class,
        proficiency_bonus,
        conditions: Vec::new(),
        spell_slots,
        resources: pools,
        kind: CombatantKind::Player(PlayerSheet {
            user_id: user_id.to_string(),
            class_id: class_record.map(|class| class.id.clone()),
            level,
            abilities,
            weapon_proficiencies,
            saving_throws,
            equipment: equipment_list,
            weapons,
        }),
    };
    // Route the starting HP through the clamp so an override cannot land
    // outside the known range.
    if let Some(value) = combatant.current_hp {
        combatant.set_current_hp(value);
    }
    combatant
}

/// Hit points the standard way: max die at first level, the die average
/// rounded up afterwards, Constitution each level. `None` when the hit
/// die text does not parse or the total leaves the numeric range.
fn compute_max_hp(hit_die: &str, level: i32, con_mod: i32) -> Option<i32> {
    let die = i32::try_from(parse::parse_die_size(hit_die)?).ok()?;
    let first = die + con_mod;
    if level <= 1 {
        return Some(first);
    }
    let per_level = die / 2 + 1 + con_mod;
    (level - 1)
        .checked_mul(per_level)
        .and_then(|extra| first.checked_add(extra))
}

/// Base 10 + Dex, or the best recognized body armor with its Dex cap
/// applied; a shield adds 2 either way.
fn compute_armor_class<R: RulesLookup + ?Sized>(
    rules: &R,
    items: &[String],
    dex_mod: i32,
) -> i32 {
    let mut best_armor: Option<i32> = None;
    let mut has_shield = false;
    for item in items {
        let Some(record) = rules.armor(item) else {
            continue;
        };
        if record.is_shield() {
            has_shield = true;
        } else if record.is_body_armor() {
            let parsed = parse::parse_armor_ac(&record.armor_class);
            if let Some(base) = parsed.base {
                let dex_part = match parsed.max_dex {
                    Some(cap) => dex_mod.min(cap),
                    None => dex_mod,
                };
                let total = base + dex_part;
                if best_armor.map_or(true, |best| total > best) {
                    best_armor = Some(total);
                }
            }
        }
    }
    let mut ac = best_armor.unwrap_or(10 + dex_mod);
    if has_shield {
        ac += 2;
    }
    ac
}

/// Weapon selection, most explicit source first: hand-equipped names are
/// kept exactly as given; otherwise inventory entries the weapon table
/// recognizes, under their canonical names; otherwise recognized entries
/// from the equipment text.
fn select_weapons<R: RulesLookup + ?Sized>(
    rules: &R,
    profile: &CharacterProfile,
    equipment_list: &[String],
) -> Vec<String> {
    let mut equipped: Vec<String> = Vec::new();
    for item in &profile.equipped {
        if !item.is_empty() && !equipped.iter().any(|known| known == item) {
            equipped.push(item.clone());
        }
    }
    if !equipped.is_empty() {
        return equipped;
    }

    let mut weapons: Vec<String> = Vec::new();
    for item in &profile.inventory {
        if let Some(record) = rules.weapon(item) {
            if !weapons.iter().any(|known| known == &record.name) {
                weapons.push(record.name.clone());
            }
        }
    }
    if !weapons.is_empty() {
        return weapons;
    }

    for item in equipment_list {
        if let Some(record) = rules.weapon(item) {
            if !weapons.iter().any(|known| known == &record.name) {
                weapons.push(record.name.clone());
            }
        }
    }
    weapons
}
