//! The rules reference: weapons, armor, classes, features, invocations.
//!
//! A compact SRD subset, enough to drive combat math for the common
//! classes. Records keep their sheet text (damage dice, AC formulas,
//! proficiency lists) verbatim; the parsers in [`crate::parse`] interpret
//! that text when a combatant is built, so homebrew tables with the same
//! shape slot in without code changes.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::parse::normalize_name;

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub damage: String,
    pub properties: String,
}

impl WeaponRecord {
    fn new(id: &str, name: &str, category: &str, damage: &str, properties: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            damage: damage.to_string(),
            properties: properties.to_string(),
        }
    }

    /// Finesse weapons attack with the better of Strength and Dexterity.
    pub fn is_finesse(&self) -> bool {
        self.properties.to_lowercase().contains("finesse")
    }

    /// Ranged weapons always attack with Dexterity.
    pub fn is_ranged(&self) -> bool {
        self.category.to_lowercase().contains("ranged")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmorRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub armor_class: String,
}

impl ArmorRecord {
    fn new(id: &str, name: &str, category: &str, armor_class: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            armor_class: armor_class.to_string(),
        }
    }

    pub fn is_body_armor(&self) -> bool {
        self.category.to_lowercase().contains("armor")
    }

    pub fn is_shield(&self) -> bool {
        self.category.to_lowercase().contains("shield")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: String,
    pub name: String,
    pub hit_die: String,
    pub weapon_proficiencies: String,
    pub saving_throws: String,
}

impl ClassRecord {
    fn new(
        id: &str,
        name: &str,
        hit_die: &str,
        weapon_proficiencies: &str,
        saving_throws: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            hit_die: hit_die.to_string(),
            weapon_proficiencies: weapon_proficiencies.to_string(),
            saving_throws: saving_throws.to_string(),
        }
    }
}

/// A class or subclass feature that may carry a limited-use pool. The
/// record id doubles as the pool id on the combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub id: String,
    pub name: String,
    pub level: i32,
    pub uses: String,
    pub recharge: String,
    #[serde(default)]
    pub notes: String,
}

impl FeatureRecord {
    fn new(id: &str, name: &str, level: i32, uses: &str, recharge: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level,
            uses: uses.to_string(),
            recharge: recharge.to_string(),
            notes: String::new(),
        }
    }

    fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubclassRecord {
    pub id: String,
    pub name: String,
    pub class_id: String,
}

impl SubclassRecord {
    fn new(id: &str, name: &str, class_id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            class_id: class_id.to_string(),
        }
    }
}

/// An eldritch invocation. Ones whose text grants a spell once per rest
/// become a one-use pool; `slot_level` records the slot the cast consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub id: String,
    pub name: String,
    pub text: String,
    pub slot_level: Option<u8>,
}

impl InvocationRecord {
    fn new(id: &str, name: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            text: text.to_string(),
            slot_level: None,
        }
    }

    fn with_slot_level(mut self, level: u8) -> Self {
        self.slot_level = Some(level);
        self
    }
}

// ============================================================================
// Lookup trait
// ============================================================================

/// Read access to the rules tables. Name lookups go through
/// [`normalize_name`], so "Chain Mail" and "chainmail" hit the same row.
pub trait RulesLookup {
    fn weapon(&self, name: &str) -> Option<&WeaponRecord>;
    fn armor(&self, name: &str) -> Option<&ArmorRecord>;
    fn class_by_id(&self, id: &str) -> Option<&ClassRecord>;
    fn class_by_name(&self, name: &str) -> Option<&ClassRecord>;
    fn class_features(&self, class_id: &str) -> &[FeatureRecord];
    fn subclass_by_name(&self, name: &str) -> Option<&SubclassRecord>;
    fn subclass_features(&self, subclass_id: &str) -> &[FeatureRecord];
    fn invocation(&self, name: &str) -> Option<&InvocationRecord>;
    fn weapons(&self) -> &[WeaponRecord];
}

/// The built-in tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl RulesLookup for StandardRules {
    fn weapon(&self, name: &str) -> Option<&WeaponRecord> {
        WEAPON_INDEX.get(&normalize_name(name)).map(|&i| &WEAPONS[i])
    }

    fn armor(&self, name: &str) -> Option<&ArmorRecord> {
        ARMOR_INDEX.get(&normalize_name(name)).map(|&i| &ARMOR[i])
    }

    fn class_by_id(&self, id: &str) -> Option<&ClassRecord> {
        CLASSES.iter().find(|class| class.id == id)
    }

    fn class_by_name(&self, name: &str) -> Option<&ClassRecord> {
        let norm = normalize_name(name);
        CLASSES.iter().find(|class| normalize_name(&class.name) == norm)
    }

    fn class_features(&self, class_id: &str) -> &[FeatureRecord] {
        CLASS_FEATURES
            .get(class_id)
            .map(|features| features.as_slice())
            .unwrap_or(&[])
    }

    fn subclass_by_name(&self, name: &str) -> Option<&SubclassRecord> {
        let norm = normalize_name(name);
        SUBCLASSES
            .iter()
            .find(|subclass| normalize_name(&subclass.name) == norm)
    }

    fn subclass_features(&self, subclass_id: &str) -> &[FeatureRecord] {
        SUBCLASS_FEATURES
            .get(subclass_id)
            .map(|features| features.as_slice())
            .unwrap_or(&[])
    }

    fn invocation(&self, name: &str) -> Option<&InvocationRecord> {
        let norm = normalize_name(name);
        INVOCATIONS
            .iter()
            .find(|invocation| normalize_name(&invocation.name) == norm)
    }

    fn weapons(&self) -> &[WeaponRecord] {
        &WEAPONS
    }
}

// ============================================================================
// Tables
// ============================================================================

fn index_by_name<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    names
        .enumerate()
        .map(|(i, name)| (normalize_name(name), i))
        .collect()
}

lazy_static! {
    static ref WEAPONS: Vec<WeaponRecord> = vec![
        WeaponRecord::new("WPN_CLUB", "Club", "Simple Melee", "1d4 bludgeoning", "Light"),
        WeaponRecord::new(
            "WPN_DAGGER",
            "Dagger",
            "Simple Melee",
            "1d4 piercing",
            "Finesse, light, thrown (range 20/60)"
        ),
        WeaponRecord::new("WPN_GREATCLUB", "Greatclub", "Simple Melee", "1d8 bludgeoning", "Two-handed"),
        WeaponRecord::new(
            "WPN_HANDAXE",
            "Handaxe",
            "Simple Melee",
            "1d6 slashing",
            "Light, thrown (range 20/60)"
        ),
        WeaponRecord::new("WPN_JAVELIN", "Javelin", "Simple Melee", "1d6 piercing", "Thrown (range 30/120)"),
        WeaponRecord::new("WPN_MACE", "Mace", "Simple Melee", "1d6 bludgeoning", ""),
        WeaponRecord::new("WPN_QUARTERSTAFF", "Quarterstaff", "Simple Melee", "1d6 bludgeoning", "Versatile (1d8)"),
        WeaponRecord::new("WPN_SICKLE", "Sickle", "Simple Melee", "1d4 slashing", "Light"),
        WeaponRecord::new(
            "WPN_SPEAR",
            "Spear",
            "Simple Melee",
            "1d6 piercing",
            "Thrown (range 20/60), versatile (1d8)"
        ),
        WeaponRecord::new(
            "WPN_LIGHT_CROSSBOW",
            "Light Crossbow",
            "Simple Ranged",
            "1d8 piercing",
            "Ammunition (range 80/320), loading, two-handed"
        ),
        WeaponRecord::new("WPN_DART", "Dart", "Simple Ranged", "1d4 piercing", "Finesse, thrown (range 20/60)"),
        WeaponRecord::new(
            "WPN_SHORTBOW",
            "Shortbow",
            "Simple Ranged",
            "1d6 piercing",
            "Ammunition (range 80/320), two-handed"
        ),
        WeaponRecord::new("WPN_SLING", "Sling", "Simple Ranged", "1d4 bludgeoning", "Ammunition (range 30/120)"),
        WeaponRecord::new("WPN_BATTLEAXE", "Battleaxe", "Martial Melee", "1d8 slashing", "Versatile (1d10)"),
        WeaponRecord::new("WPN_GLAIVE", "Glaive", "Martial Melee", "1d10 slashing", "Heavy, reach, two-handed"),
        WeaponRecord::new("WPN_GREATAXE", "Greataxe", "Martial Melee", "1d12 slashing", "Heavy, two-handed"),
        WeaponRecord::new("WPN_GREATSWORD", "Greatsword", "Martial Melee", "2d6 slashing", "Heavy, two-handed"),
        WeaponRecord::new("WPN_LONGSWORD", "Longsword", "Martial Melee", "1d8 slashing", "Versatile (1d10)"),
        WeaponRecord::new("WPN_MAUL", "Maul", "Martial Melee", "2d6 bludgeoning", "Heavy, two-handed"),
        WeaponRecord::new("WPN_MORNINGSTAR", "Morningstar", "Martial Melee", "1d8 piercing", ""),
        WeaponRecord::new("WPN_RAPIER", "Rapier", "Martial Melee", "1d8 piercing", "Finesse"),
        WeaponRecord::new("WPN_SCIMITAR", "Scimitar", "Martial Melee", "1d6 slashing", "Finesse, light"),
        WeaponRecord::new("WPN_SHORTSWORD", "Shortsword", "Martial Melee", "1d6 piercing", "Finesse, light"),
        WeaponRecord::new("WPN_WARHAMMER", "Warhammer", "Martial Melee", "1d8 bludgeoning", "Versatile (1d10)"),
        WeaponRecord::new(
            "WPN_HAND_CROSSBOW",
            "Hand Crossbow",
            "Martial Ranged",
            "1d6 piercing",
            "Ammunition (range 30/120), light, loading"
        ),
        WeaponRecord::new(
            "WPN_HEAVY_CROSSBOW",
            "Heavy Crossbow",
            "Martial Ranged",
            "1d10 piercing",
            "Ammunition (range 100/400), heavy, loading, two-handed"
        ),
        WeaponRecord::new(
            "WPN_LONGBOW",
            "Longbow",
            "Martial Ranged",
            "1d8 piercing",
            "Ammunition (range 150/600), heavy, two-handed"
        ),
    ];
    static ref WEAPON_INDEX: HashMap<String, usize> =
        index_by_name(WEAPONS.iter().map(|w| w.name.as_str()));

    static ref ARMOR: Vec<ArmorRecord> = vec![
        ArmorRecord::new("ARM_PADDED", "Padded", "Light Armor", "11 + Dex modifier"),
        ArmorRecord::new("ARM_LEATHER", "Leather", "Light Armor", "11 + Dex modifier"),
        ArmorRecord::new("ARM_STUDDED_LEATHER", "Studded Leather", "Light Armor", "12 + Dex modifier"),
        ArmorRecord::new("ARM_HIDE", "Hide", "Medium Armor", "12 + Dex modifier (max 2)"),
        ArmorRecord::new("ARM_CHAIN_SHIRT", "Chain Shirt", "Medium Armor", "13 + Dex modifier (max 2)"),
        ArmorRecord::new("ARM_SCALE_MAIL", "Scale Mail", "Medium Armor", "14 + Dex modifier (max 2)"),
        ArmorRecord::new("ARM_BREASTPLATE", "Breastplate", "Medium Armor", "14 + Dex modifier (max 2)"),
        ArmorRecord::new("ARM_HALF_PLATE", "Half Plate", "Medium Armor", "15 + Dex modifier (max 2)"),
        ArmorRecord::new("ARM_RING_MAIL", "Ring Mail", "Heavy Armor", "14 (max 0)"),
        ArmorRecord::new("ARM_CHAIN_MAIL", "Chain Mail", "Heavy Armor", "16 (max 0)"),
        ArmorRecord::new("ARM_SPLINT", "Splint", "Heavy Armor", "17 (max 0)"),
        ArmorRecord::new("ARM_PLATE", "Plate", "Heavy Armor", "18 (max 0)"),
        ArmorRecord::new("ARM_SHIELD", "Shield", "Shield", "+2"),
    ];
    static ref ARMOR_INDEX: HashMap<String, usize> =
        index_by_name(ARMOR.iter().map(|a| a.name.as_str()));

    static ref CLASSES: Vec<ClassRecord> = vec![
        ClassRecord::new("CLS_BARBARIAN", "Barbarian", "d12", "Simple and martial weapons", "Strength, Constitution"),
        ClassRecord::new(
            "CLS_BARD",
            "Bard",
            "d8",
            "Simple weapons, hand crossbows, longswords, rapiers, shortswords",
            "Dexterity, Charisma"
        ),
        ClassRecord::new("CLS_CLERIC", "Cleric", "d8", "Simple weapons", "Wisdom, Charisma"),
        ClassRecord::new(
            "CLS_DRUID",
            "Druid",
            "d8",
            "Clubs, daggers, darts, javelins, maces, quarterstaffs, scimitars, sickles, slings, spears",
            "Intelligence, Wisdom"
        ),
        ClassRecord::new("CLS_FIGHTER", "Fighter", "d10", "Simple and martial weapons", "Strength, Constitution"),
        ClassRecord::new("CLS_MONK", "Monk", "d8", "Simple weapons, shortswords", "Strength, Dexterity"),
        ClassRecord::new("CLS_PALADIN", "Paladin", "d10", "Simple and martial weapons", "Wisdom, Charisma"),
        ClassRecord::new("CLS_RANGER", "Ranger", "d10", "Simple and martial weapons", "Strength, Dexterity"),
        ClassRecord::new(
            "CLS_ROGUE",
            "Rogue",
            "d8",
            "Simple weapons, hand crossbows, longswords, rapiers, shortswords",
            "Dexterity, Intelligence"
        ),
        ClassRecord::new(
            "CLS_SORCERER",
            "Sorcerer",
            "d6",
            "Daggers, darts, slings, quarterstaffs, light crossbows",
            "Constitution, Charisma"
        ),
        ClassRecord::new("CLS_WARLOCK", "Warlock", "d8", "Simple weapons", "Wisdom, Charisma"),
        ClassRecord::new(
            "CLS_WIZARD",
            "Wizard",
            "d6",
            "Daggers, darts, slings, quarterstaffs, light crossbows",
            "Intelligence, Wisdom"
        ),
    ];

    static ref CLASS_FEATURES: HashMap<String, Vec<FeatureRecord>> = {
        let mut map = HashMap::new();
        map.insert(
            "CLS_BARBARIAN".to_string(),
            vec![FeatureRecord::new("rage", "Rage", 1, "see table", "long rest")
                .with_notes("Bonus action. Advantage on Strength checks and saving throws.")],
        );
        map.insert(
            "CLS_BARD".to_string(),
            vec![FeatureRecord::new(
                "bardic_inspiration",
                "Bardic Inspiration",
                1,
                "Charisma modifier (minimum 1)",
                "long rest",
            )
            .with_notes("Bonus action. Grant an inspiration die to another creature.")],
        );
        map.insert(
            "CLS_CLERIC".to_string(),
            vec![FeatureRecord::new("channel_divinity", "Channel Divinity", 2, "1", "short rest")],
        );
        map.insert(
            "CLS_DRUID".to_string(),
            vec![FeatureRecord::new("wild_shape", "Wild Shape", 2, "2", "short rest")],
        );
        map.insert(
            "CLS_FIGHTER".to_string(),
            vec![
                FeatureRecord::new("second_wind", "Second Wind", 1, "1", "short rest")
                    .with_notes("Bonus action. Regain 1d10 + fighter level hit points."),
                FeatureRecord::new("action_surge", "Action Surge", 2, "1", "short rest")
                    .with_notes("Take one additional action on your turn."),
            ],
        );
        map.insert(
            "CLS_MONK".to_string(),
            vec![FeatureRecord::new("ki", "Ki", 2, "monk level", "short rest")],
        );
        map.insert(
            "CLS_PALADIN".to_string(),
            vec![FeatureRecord::new("lay_on_hands", "Lay on Hands", 1, "5 x paladin level", "long rest")
                .with_notes("Pool of healing points.")],
        );
        map.insert(
            "CLS_SORCERER".to_string(),
            vec![FeatureRecord::new("sorcery_points", "Sorcery Points", 2, "sorcerer level", "long rest")],
        );
        map.insert(
            "CLS_WIZARD".to_string(),
            vec![FeatureRecord::new("arcane_recovery", "Arcane Recovery", 1, "1", "long rest")],
        );
        map
    };

    static ref SUBCLASSES: Vec<SubclassRecord> = vec![
        SubclassRecord::new("battle_master", "Battle Master", "CLS_FIGHTER"),
        SubclassRecord::new("champion", "Champion", "CLS_FIGHTER"),
        SubclassRecord::new("soulknife", "Soulknife", "CLS_ROGUE"),
    ];

    static ref SUBCLASS_FEATURES: HashMap<String, Vec<FeatureRecord>> = {
        let mut map = HashMap::new();
        map.insert(
            "battle_master".to_string(),
            vec![FeatureRecord::new("superiority_dice", "Superiority Dice", 3, "4", "short rest")
                .with_notes("Fuel combat maneuvers.")],
        );
        map.insert(
            "soulknife".to_string(),
            vec![FeatureRecord::new(
                "psionic_energy_dice",
                "Psionic Energy Dice",
                3,
                "proficiency bonus x 2",
                "long rest",
            )],
        );
        map
    };

    static ref INVOCATIONS: Vec<InvocationRecord> = vec![
        InvocationRecord::new(
            "INV_ARMOR_OF_SHADOWS",
            "Armor of Shadows",
            "You can cast mage armor on yourself at will, without expending a spell slot."
        ),
        InvocationRecord::new(
            "INV_FIENDISH_VIGOR",
            "Fiendish Vigor",
            "You can cast false life on yourself at will as a 1st-level spell, without expending a spell slot."
        ),
        InvocationRecord::new(
            "INV_MINIONS_OF_CHAOS",
            "Minions of Chaos",
            "You can cast conjure elemental once per long rest using a warlock spell slot."
        )
        .with_slot_level(5),
        InvocationRecord::new(
            "INV_MIRE_THE_MIND",
            "Mire the Mind",
            "You can cast slow once per long rest using a warlock spell slot."
        )
        .with_slot_level(3),
        InvocationRecord::new(
            "INV_SCULPTOR_OF_FLESH",
            "Sculptor of Flesh",
            "You can cast polymorph once per long rest using a warlock spell slot."
        )
        .with_slot_level(4),
        InvocationRecord::new(
            "INV_THIEF_OF_FIVE_FATES",
            "Thief of Five Fates",
            "You can cast bane once per long rest using a warlock spell slot."
        )
        .with_slot_level(1),
    ];
}
