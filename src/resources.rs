//! Resolving class features and invocations into limited-use pools.
//!
//! Feature rows store their uses as sheet text ("see table", "monk
//! level"). A fixed formula table keyed by feature id does the actual
//! math; text is only consulted as a numeric fallback for features the
//! table does not know. Anything that still cannot be resolved becomes a
//! pool with an unknown maximum rather than a wrong one.

use crate::combatant::{Ability, AbilityScores, PoolKind, Resource};
use crate::parse;
use crate::progression::ProgressionRow;
use crate::rules::{FeatureRecord, InvocationRecord};

/// How a pool's maximum is computed from the character.
enum MaxFormula {
    Fixed(u32),
    Level,
    LevelTimes(u32),
    ProficiencyBonusTimes(u32),
    AbilityModifier { ability: Ability, minimum: u32 },
    Tiered(&'static [(i32, u32)]),
    TableColumn(&'static str),
}

const RESOURCE_FORMULAS: &[(&str, MaxFormula)] = &[
    ("rage", MaxFormula::TableColumn("rages")),
    ("second_wind", MaxFormula::Fixed(1)),
    ("action_surge", MaxFormula::Tiered(&[(2, 1), (17, 2)])),
    (
        "bardic_inspiration",
        MaxFormula::AbilityModifier {
            ability: Ability::Charisma,
            minimum: 1,
        },
    ),
    ("channel_divinity", MaxFormula::Tiered(&[(2, 1), (6, 2), (18, 3)])),
    ("wild_shape", MaxFormula::Fixed(2)),
    ("ki", MaxFormula::Level),
    ("lay_on_hands", MaxFormula::LevelTimes(5)),
    ("sorcery_points", MaxFormula::Level),
    ("arcane_recovery", MaxFormula::Fixed(1)),
    ("superiority_dice", MaxFormula::Tiered(&[(3, 4), (7, 5), (15, 6)])),
    ("psionic_energy_dice", MaxFormula::ProficiencyBonusTimes(2)),
];

/// Pools whose die grows with level.
const DIE_TIERS: &[(&str, &[(i32, u32)])] = &[
    ("superiority_dice", &[(3, 8), (10, 10), (18, 12)]),
    ("psionic_energy_dice", &[(3, 6), (5, 8), (11, 10), (17, 12)]),
];

/// Everything the formulas may consult.
pub struct ResourceContext<'a> {
    pub level: i32,
    pub proficiency_bonus: i32,
    pub abilities: &'a AbilityScores,
    pub row: Option<&'a ProgressionRow>,
}

/// Build the pool list for a character: class features first, then
/// subclass features, then limited-use invocations. The first pool to
/// claim an id keeps it. Features above the character's level are
/// skipped.
pub fn collect(
    class_features: &[FeatureRecord],
    subclass_features: &[FeatureRecord],
    invocations: &[&InvocationRecord],
    ctx: &ResourceContext<'_>,
) -> Vec<Resource> {
    let mut pools: Vec<Resource> = Vec::new();
    for feature in class_features.iter().chain(subclass_features) {
        if feature.level > ctx.level {
            continue;
        }
        let pool = resource_from_feature(feature, ctx);
        if !pools.iter().any(|existing| existing.id == pool.id) {
            pools.push(pool);
        }
    }
    for invocation in invocations {
        if let Some(pool) = resource_from_invocation(invocation) {
            if !pools.iter().any(|existing| existing.id == pool.id) {
                pools.push(pool);
            }
        }
    }
    pools
}

fn resource_from_feature(feature: &FeatureRecord, ctx: &ResourceContext<'_>) -> Resource {
    let formula = RESOURCE_FORMULAS
        .iter()
        .find(|(id, _)| *id == feature.id)
        .map(|(_, formula)| formula);
    let (max, kind) = match formula {
        Some(formula) => (evaluate(formula, ctx), kind_for(formula)),
        None => match parse::first_number(&feature.uses).and_then(|n| u32::try_from(n).ok()) {
            Some(count) => (Some(count), PoolKind::Fixed),
            None => (None, PoolKind::Custom),
        },
    };
    Resource {
        id: feature.id.clone(),
        name: feature.name.clone(),
        current: max,
        max,
        recharge: parse::parse_recharge(&feature.recharge),
        kind,
        notes: feature.notes.clone(),
        die_size: die_size_for(&feature.id, ctx),
        slot_level: None,
    }
}

/// Invocations granting a spell once per rest become one-use pools; the
/// at-will ones produce nothing to track.
fn resource_from_invocation(invocation: &InvocationRecord) -> Option<Resource> {
    let recharge = parse::parse_once_per_rest(&invocation.text)?;
    Some(Resource {
        id: invocation.id.to_lowercase(),
        name: invocation.name.clone(),
        current: Some(1),
        max: Some(1),
        recharge: Some(recharge),
        kind: PoolKind::Invocation,
        notes: invocation.text.clone(),
        die_size: None,
        slot_level: invocation.slot_level,
    })
}

fn evaluate(formula: &MaxFormula, ctx: &ResourceContext<'_>) -> Option<u32> {
    match formula {
        MaxFormula::Fixed(count) => Some(*count),
        MaxFormula::Level => u32::try_from(ctx.level).ok(),
        MaxFormula::LevelTimes(per) => u32::try_from(ctx.level)
            .ok()
            .and_then(|l| l.checked_mul(*per)),
        MaxFormula::ProficiencyBonusTimes(per) => u32::try_from(ctx.proficiency_bonus)
            .ok()
            .and_then(|p| p.checked_mul(*per)),
        MaxFormula::AbilityModifier { ability, minimum } => {
            Some(ctx.abilities.modifier(*ability).max(*minimum as i32) as u32)
        }
        MaxFormula::Tiered(tiers) => tiered(ctx.level, tiers),
        MaxFormula::TableColumn(name) => {
            let text = ctx.row?.column(name)?;
            parse::first_number(text).and_then(|n| u32::try_from(n).ok())
        }
    }
}

fn kind_for(formula: &MaxFormula) -> PoolKind {
    match formula {
        MaxFormula::Fixed(_) => PoolKind::Fixed,
        MaxFormula::Level | MaxFormula::LevelTimes(_) | MaxFormula::ProficiencyBonusTimes(_) => {
            PoolKind::ByLevel
        }
        MaxFormula::AbilityModifier { .. }
        | MaxFormula::Tiered(_)
        | MaxFormula::TableColumn(_) => PoolKind::SeeClassTable,
    }
}

fn tiered(level: i32, tiers: &[(i32, u32)]) -> Option<u32> {
    let mut value = None;
    for &(min_level, count) in tiers {
        if level >= min_level {
            value = Some(count);
        }
    }
    value
}

fn die_size_for(feature_id: &str, ctx: &ResourceContext<'_>) -> Option<u32> {
    if feature_id == "bardic_inspiration" {
        return parse::parse_die_size(ctx.row?.column("bardic_die")?);
    }
    DIE_TIERS
        .iter()
        .find(|(id, _)| *id == feature_id)
        .and_then(|(_, tiers)| tiered(ctx.level, tiers))
}
