//! Rendering a session as chat text.
//!
//! One status block per call: header, round and phase, whose turn it is
//! and what they have left, the initiative order, then a roster line per
//! combatant with slots and pools indented beneath. Unknown numbers
//! print as `?` rather than pretending to be zero.

use crate::combatant::{Combatant, Resource};
use crate::session::CombatSession;

/// Format the whole session; `None` means nothing is running.
pub fn format_status(session: Option<&CombatSession>) -> String {
    let Some(session) = session else {
        return "No active combat.".to_string();
    };

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("{} ({})", session.name, session.status));
    lines.push(format!("Round: {}", session.round));
    lines.push(format!("Phase: {}", session.phase));

    if let Some(active) = session.active_combatant() {
        let flags = session.turn_flags(&active.id).unwrap_or_default();
        lines.push(format!(
            "Turn: {} (action {}, bonus {}, reaction {})",
            active.name,
            used_label(flags.action_used),
            used_label(flags.bonus_action_used),
            used_label(flags.reaction_used),
        ));
    }

    if !session.initiative_order.is_empty() {
        let entries: Vec<String> = session
            .initiative_order
            .iter()
            .filter_map(|id| session.combatant(id))
            .map(|combatant| {
                let initiative = combatant
                    .initiative
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!("{} ({})", combatant.name, initiative)
            })
            .collect();
        lines.push(format!("Order: {}", entries.join(" -> ")));
    }

    for combatant in session.combatants.values() {
        lines.push(roster_line(combatant));
        if let Some(slots) = slots_line(combatant) {
            lines.push(slots);
        }
        if let Some(resources) = resources_line(combatant) {
            lines.push(resources);
        }
    }

    lines.join("\n")
}

fn used_label(used: bool) -> &'static str {
    if used {
        "used"
    } else {
        "available"
    }
}

fn roster_line(combatant: &Combatant) -> String {
    let ac = combatant
        .armor_class
        .map(|value| value.to_string())
        .unwrap_or_else(|| "?".to_string());
    let hp = match combatant.current_hp {
        Some(current) => {
            let max = combatant
                .max_hp
                .map(|value| value.to_string())
                .unwrap_or_else(|| "?".to_string());
            format!("{}/{}", current, max)
        }
        None => "?".to_string(),
    };
    let mut line = format!("- {} (AC {}, HP {})", combatant.name, ac, hp);
    if !combatant.conditions.is_empty() {
        line.push_str(&format!(" [{}]", combatant.conditions.join(", ")));
    }
    line
}

fn slots_line(combatant: &Combatant) -> Option<String> {
    if combatant.spell_slots.is_empty() {
        return None;
    }
    let parts: Vec<String> = combatant
        .spell_slots
        .iter_filled()
        .map(|(level, info)| format!("{}:{}/{}", level, info.remaining(), info.total))
        .collect();
    Some(format!("  Slots: {}", parts.join(", ")))
}

fn resources_line(combatant: &Combatant) -> Option<String> {
    if combatant.resources.is_empty() {
        return None;
    }
    let parts: Vec<String> = combatant.resources.iter().map(resource_entry).collect();
    Some(format!("  Resources: {}", parts.join(", ")))
}

fn resource_entry(pool: &Resource) -> String {
    let mut entry = pool.name.clone();
    if let Some(die) = pool.die_size {
        entry.push_str(&format!(" (d{})", die));
    }
    let current = pool
        .current
        .map(|value| value.to_string())
        .unwrap_or_else(|| "?".to_string());
    let max = pool
        .max
        .map(|value| value.to_string())
        .unwrap_or_else(|| "?".to_string());
    entry.push_str(&format!(" {}/{}", current, max));
    if let Some(recharge) = pool.recharge {
        entry.push_str(&format!(" ({})", recharge));
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_combatant_from_profile, CharacterProfile};
    use crate::progression::StandardProgression;
    use crate::rules::StandardRules;
    use crate::session::SessionConfig;

    fn player(user_id: &str, profile: CharacterProfile) -> Combatant {
        build_combatant_from_profile(&StandardRules, &StandardProgression, user_id, &profile)
    }

    #[test]
    fn test_no_session() {
        assert_eq!(format_status(None), "No active combat.");
    }

    #[test]
    fn test_setup_session() {
        let mut session = CombatSession::new(SessionConfig::new("Goblin Ambush"));
        session.add_npc("Goblin", Some(7), Some(15), None);
        assert_eq!(
            format_status(Some(&session)),
            "Goblin Ambush (setup)\n\
             Round: 0\n\
             Phase: turn-start\n\
             - Goblin (AC 15, HP 7/7)"
        );
    }

    #[test]
    fn test_active_session_with_order_and_flags() {
        let mut session = CombatSession::new(SessionConfig::new("Bridge Fight"));
        session.add_npc("Goblin", Some(7), Some(15), Some(14));
        session.add_npc("Wolf", None, None, Some(9));
        session.begin_combat();
        session.use_action("npc_goblin");

        assert_eq!(
            format_status(Some(&session)),
            "Bridge Fight (active)\n\
             Round: 1\n\
             Phase: turn-start\n\
             Turn: Goblin (action used, bonus available, reaction available)\n\
             Order: Goblin (14) -> Wolf (9)\n\
             - Goblin (AC 15, HP 7/7)\n\
             - Wolf (AC ?, HP ?)"
        );
    }

    #[test]
    fn test_conditions_in_brackets() {
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        session.add_npc("Goblin", Some(7), Some(15), None);
        session.add_condition("npc_goblin", "Prone").unwrap();
        session.add_condition("npc_goblin", "Poisoned").unwrap();
        let status = format_status(Some(&session));
        assert!(status.contains("- Goblin (AC 15, HP 7/7) [Prone, Poisoned]"));
    }

    #[test]
    fn test_slots_and_resources_lines() {
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        let wizard = player(
            "mira",
            CharacterProfile::new("Mira").with_class("Wizard").with_level(3),
        );
        session.add_combatant(wizard);
        session.spend_spell_slot("player_mira", 1).unwrap();

        let barbarian = player(
            "korg",
            CharacterProfile::new("Korg").with_class("Barbarian").with_level(5),
        );
        session.add_combatant(barbarian);
        session.spend_resource("player_korg", "rage", 1).unwrap();

        let status = format_status(Some(&session));
        assert!(status.contains("  Slots: 1:3/4, 2:2/2"));
        assert!(status.contains("  Resources: Rage 2/3 (long rest)"));
    }

    #[test]
    fn test_die_and_unknown_pool_rendering() {
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        let fighter = player(
            "bryn",
            CharacterProfile::new("Bryn")
                .with_class("Fighter")
                .with_subclass("Battle Master")
                .with_level(3),
        );
        session.add_combatant(fighter);
        let barbarian = player(
            "korg",
            CharacterProfile::new("Korg").with_class("Barbarian").with_level(20),
        );
        session.add_combatant(barbarian);

        let status = format_status(Some(&session));
        assert!(status.contains("Superiority Dice (d8) 4/4 (short rest)"));
        assert!(status.contains("Rage ?/? (long rest)"));
    }

    #[test]
    fn test_unrolled_initiative_prints_question_mark() {
        let mut session = CombatSession::new(SessionConfig::new("Test"));
        session.add_npc("Goblin", None, None, Some(12));
        session.begin_combat();
        // Hand-editing the order can point at an unrolled combatant.
        session.combatant_mut("npc_goblin").unwrap().initiative = None;
        let status = format_status(Some(&session));
        assert!(status.contains("Order: Goblin (?)"));
    }
}
