//! Heuristic parsers for character-sheet text.
//!
//! Profile fields and rules-table cells arrive as free-form text:
//! "STR 16 DEX 14", "14 + Dex modifier (max 2)", "1d8 slashing".
//! Each parser here interprets exactly one field shape and reports a miss
//! as `None` or an empty result, so the combatant builder can degrade to
//! "unknown" instead of failing.

use crate::combatant::{Ability, AbilityScores, Recharge};

/// Lowercase a name and strip everything that is not a letter or digit.
///
/// "Chain Mail", "chain-mail" and "chainmail" all index the same record.
pub fn normalize_name(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Build a combatant id as `prefix_value`, lowercased, with whitespace
/// runs collapsed to single underscores.
pub fn combatant_id(prefix: &str, value: &str) -> String {
    let mut collapsed = String::with_capacity(value.len());
    let mut in_space = false;
    for c in value.chars() {
        if c.is_whitespace() {
            if !in_space {
                collapsed.push('_');
            }
            in_space = true;
        } else {
            collapsed.push(c);
            in_space = false;
        }
    }
    format!("{}_{}", prefix, collapsed.to_lowercase())
}

/// Pull `STR 16`-style pairs out of free text, case-insensitive.
///
/// Later occurrences overwrite earlier ones. Absent abilities keep the
/// default score of 10, which carries the same +0 modifier that missing
/// data works out to everywhere downstream.
pub fn parse_ability_scores(text: &str) -> AbilityScores {
    let mut scores = AbilityScores::default();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i + 3 <= bytes.len() {
        let Some(ability) = text.get(i..i + 3).and_then(Ability::from_abbreviation) else {
            i += 1;
            continue;
        };
        let mut j = i + 3;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > start {
            if let Ok(score) = text[start..j].parse::<u32>() {
                scores.set(ability, score.min(u8::MAX as u32) as u8);
            }
            i = j;
        } else {
            i += 1;
        }
    }
    scores
}

/// One parsed damage field like `1d8 slashing` or `2d6 + 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponDamage {
    pub count: u32,
    pub sides: u32,
    pub flat: i32,
}

/// First `NdM` term in the text, with an optional `+ K` flat bonus after it.
///
/// A bare `d8` without a count does not match; neither does anything else,
/// and the caller treats that as zero damage.
pub fn parse_weapon_damage(text: &str) -> Option<WeaponDamage> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let count_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i >= bytes.len() || (bytes[i] != b'd' && bytes[i] != b'D') {
            continue;
        }
        let sides_start = i + 1;
        let mut j = sides_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j == sides_start {
            continue;
        }
        let count = text[count_start..i].parse().ok()?;
        let sides = text[sides_start..j].parse().ok()?;
        let mut k = j;
        while k < bytes.len() && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        let mut flat = 0;
        if k < bytes.len() && bytes[k] == b'+' {
            k += 1;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            let flat_start = k;
            while k < bytes.len() && bytes[k].is_ascii_digit() {
                k += 1;
            }
            if k > flat_start {
                flat = text[flat_start..k].parse().unwrap_or(0);
            }
        }
        return Some(WeaponDamage { count, sides, flat });
    }
    None
}

/// Parsed armor-class text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArmorAc {
    pub base: Option<i32>,
    pub max_dex: Option<i32>,
}

/// AC text like `14 + Dex modifier (max 2)`: the first number is the base,
/// a number right after `max` caps the dexterity contribution. Text with
/// no max clause leaves the dexterity contribution uncapped.
pub fn parse_armor_ac(text: &str) -> ArmorAc {
    let lower = text.to_lowercase();
    let max_dex = lower.match_indices("max").find_map(|(pos, _)| {
        let rest = lower[pos + 3..].as_bytes();
        let mut k = 0;
        while k < rest.len() && rest[k].is_ascii_whitespace() {
            k += 1;
        }
        let start = k;
        while k < rest.len() && rest[k].is_ascii_digit() {
            k += 1;
        }
        if k > start {
            lower[pos + 3 + start..pos + 3 + k].parse().ok()
        } else {
            None
        }
    });
    ArmorAc {
        base: first_number(text),
        max_dex,
    }
}

/// Split an equipment field on `+` and `,`, dropping empty entries.
pub fn parse_equipment_list(text: &str) -> Vec<String> {
    text.split(['+', ','])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read an ability the way sheets abbreviate it: the first three letters
/// decide, so "str", "Strength" and "STRENGTH" all land on the same one.
pub fn parse_ability(text: &str) -> Option<Ability> {
    let lower = text.trim().to_lowercase();
    Ability::from_abbreviation(lower.get(..3)?)
}

/// Class saving-throw text: entries split on commas or slashes, each
/// normalized to an ability. Unrecognized entries are dropped.
pub fn parse_saving_throws(text: &str) -> Vec<Ability> {
    let mut found = Vec::new();
    for part in text.split([',', '/']) {
        if let Some(ability) = parse_ability(part) {
            if !found.contains(&ability) {
                found.push(ability);
            }
        }
    }
    found
}

/// Recharge wording: any mention of a short or long rest.
pub fn parse_recharge(text: &str) -> Option<Recharge> {
    let lower = text.to_lowercase();
    if lower.contains("short rest") {
        Some(Recharge::ShortRest)
    } else if lower.contains("long rest") {
        Some(Recharge::LongRest)
    } else {
        None
    }
}

/// The wording that marks a limited-use invocation. Anything else is an
/// at-will ability and gets no resource pool.
pub fn parse_once_per_rest(text: &str) -> Option<Recharge> {
    let lower = text.to_lowercase();
    if lower.contains("once per short rest") {
        Some(Recharge::ShortRest)
    } else if lower.contains("once per long rest") {
        Some(Recharge::LongRest)
    } else {
        None
    }
}

/// Die text like `d8` (or `1d8`, or a hit-die cell): the number after the
/// first `d`.
pub fn parse_die_size(text: &str) -> Option<u32> {
    let lower = text.trim().to_lowercase();
    let pos = lower.find('d')?;
    let rest = &lower[pos + 1..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    rest[..end].parse().ok()
}

/// First run of digits anywhere in the text.
pub fn first_number(text: &str) -> Option<i32> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            return text[start..i].parse().ok();
        }
        i += 1;
    }
    None
}
