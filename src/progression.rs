//! Class progression tables: spell slots by level plus the per-class
//! columns (rages, bardic die) that feature pools read.
//!
//! Rows are synthesized from compact tier tables rather than stored as
//! twenty literal rows per class. Lookups outside levels 1 through 20, or
//! for a class with no table, return `None` and callers degrade to
//! "unknown" instead of guessing.

use serde::{Deserialize, Serialize};

/// One class's row at one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionRow {
    pub class_id: String,
    pub level: i32,
    /// Slot counts for spell levels 1 through 9.
    pub spell_slots: [u32; 9],
    /// Named table cells, kept as sheet text ("4", "d8", "Unlimited").
    pub columns: Vec<(String, String)>,
}

impl ProgressionRow {
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_spell_slots(&self) -> bool {
        self.spell_slots.iter().any(|&count| count > 0)
    }
}

/// Access to progression rows. Implementations return an owned row so
/// they are free to synthesize it on demand.
pub trait ProgressionLookup {
    fn row(&self, class_id: &str, level: i32) -> Option<ProgressionRow>;
}

/// The built-in tables for the twelve standard classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardProgression;

impl ProgressionLookup for StandardProgression {
    fn row(&self, class_id: &str, level: i32) -> Option<ProgressionRow> {
        if !(1..=20).contains(&level) {
            return None;
        }
        let i = (level - 1) as usize;
        let (spell_slots, columns) = match class_id {
            "CLS_BARD" => (
                FULL_CASTER_SLOTS[i],
                vec![column("bardic_die", level, BARDIC_DIE)],
            ),
            "CLS_CLERIC" | "CLS_DRUID" | "CLS_SORCERER" | "CLS_WIZARD" => {
                (FULL_CASTER_SLOTS[i], Vec::new())
            }
            "CLS_PALADIN" | "CLS_RANGER" => (HALF_CASTER_SLOTS[i], Vec::new()),
            "CLS_WARLOCK" => (pact_magic_slots(level), Vec::new()),
            "CLS_BARBARIAN" => (
                [0; 9],
                vec![
                    column("rages", level, RAGES),
                    column("rage_damage", level, RAGE_DAMAGE),
                ],
            ),
            "CLS_FIGHTER" | "CLS_MONK" | "CLS_ROGUE" => ([0; 9], Vec::new()),
            _ => return None,
        };
        Some(ProgressionRow {
            class_id: class_id.to_string(),
            level,
            spell_slots,
            columns,
        })
    }
}

// ============================================================================
// Tables
// ============================================================================

#[rustfmt::skip]
const FULL_CASTER_SLOTS: [[u32; 9]; 20] = [
    [2, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 2, 1, 1],
];

#[rustfmt::skip]
const HALF_CASTER_SLOTS: [[u32; 9]; 20] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [2, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
];

/// Warlock pact magic: a few slots, all at one escalating slot level.
fn pact_magic_slots(level: i32) -> [u32; 9] {
    let count = match level {
        1 => 1,
        2..=10 => 2,
        11..=16 => 3,
        _ => 4,
    };
    let slot_level: usize = match level {
        1..=2 => 1,
        3..=4 => 2,
        5..=6 => 3,
        7..=8 => 4,
        _ => 5,
    };
    let mut slots = [0u32; 9];
    slots[slot_level - 1] = count;
    slots
}

/// Tier tables: `(minimum level, cell text)` pairs in ascending order.
const RAGES: &[(i32, &str)] = &[(1, "2"), (3, "3"), (6, "4"), (12, "5"), (17, "6"), (20, "Unlimited")];
const RAGE_DAMAGE: &[(i32, &str)] = &[(1, "+2"), (9, "+3"), (16, "+4")];
const BARDIC_DIE: &[(i32, &str)] = &[(1, "d6"), (5, "d8"), (10, "d10"), (15, "d12")];

fn column(name: &str, level: i32, tiers: &[(i32, &str)]) -> (String, String) {
    let mut value = tiers[0].1;
    for &(min_level, text) in tiers {
        if level >= min_level {
            value = text;
        }
    }
    (name.to_string(), value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_caster_slots() {
        let progression = StandardProgression;
        let row = progression.row("CLS_WIZARD", 1).unwrap();
        assert_eq!(row.spell_slots, [2, 0, 0, 0, 0, 0, 0, 0, 0]);

        let row = progression.row("CLS_WIZARD", 5).unwrap();
        assert_eq!(row.spell_slots, [4, 3, 2, 0, 0, 0, 0, 0, 0]);

        let row = progression.row("CLS_CLERIC", 20).unwrap();
        assert_eq!(row.spell_slots, [4, 3, 3, 3, 3, 2, 2, 1, 1]);
    }

    #[test]
    fn test_half_caster_slots() {
        let progression = StandardProgression;
        let row = progression.row("CLS_PALADIN", 1).unwrap();
        assert!(!row.has_spell_slots());

        let row = progression.row("CLS_RANGER", 5).unwrap();
        assert_eq!(row.spell_slots, [4, 2, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_pact_magic_slots() {
        let progression = StandardProgression;
        let row = progression.row("CLS_WARLOCK", 1).unwrap();
        assert_eq!(row.spell_slots, [1, 0, 0, 0, 0, 0, 0, 0, 0]);

        let row = progression.row("CLS_WARLOCK", 5).unwrap();
        assert_eq!(row.spell_slots, [0, 0, 2, 0, 0, 0, 0, 0, 0]);

        let row = progression.row("CLS_WARLOCK", 17).unwrap();
        assert_eq!(row.spell_slots, [0, 0, 0, 0, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn test_barbarian_columns() {
        let progression = StandardProgression;
        assert_eq!(progression.row("CLS_BARBARIAN", 1).unwrap().column("rages"), Some("2"));
        assert_eq!(progression.row("CLS_BARBARIAN", 3).unwrap().column("rages"), Some("3"));
        assert_eq!(progression.row("CLS_BARBARIAN", 12).unwrap().column("rages"), Some("5"));
        assert_eq!(
            progression.row("CLS_BARBARIAN", 20).unwrap().column("rages"),
            Some("Unlimited")
        );
        assert_eq!(
            progression.row("CLS_BARBARIAN", 9).unwrap().column("rage_damage"),
            Some("+3")
        );
        assert!(!progression.row("CLS_BARBARIAN", 20).unwrap().has_spell_slots());
    }

    #[test]
    fn test_bardic_die_column() {
        let progression = StandardProgression;
        assert_eq!(progression.row("CLS_BARD", 4).unwrap().column("bardic_die"), Some("d6"));
        assert_eq!(progression.row("CLS_BARD", 5).unwrap().column("bardic_die"), Some("d8"));
        assert_eq!(progression.row("CLS_BARD", 15).unwrap().column("bardic_die"), Some("d12"));
    }

    #[test]
    fn test_out_of_range_levels() {
        let progression = StandardProgression;
        assert!(progression.row("CLS_WIZARD", 0).is_none());
        assert!(progression.row("CLS_WIZARD", 21).is_none());
        assert!(progression.row("CLS_ARTIFICER", 5).is_none());
    }

    #[test]
    fn test_martial_row_exists_but_is_bare() {
        let progression = StandardProgression;
        let row = progression.row("CLS_FIGHTER", 7).unwrap();
        assert!(!row.has_spell_slots());
        assert!(row.columns.is_empty());
        assert_eq!(row.column("rages"), None);
    }
}
