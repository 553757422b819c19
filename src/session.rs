//! Combat sessions: the roster, initiative order, rounds, turn phases,
//! and the bookkeeping actions that need no dice or rules tables.
//!
//! A session starts in setup while combatants gather and roll
//! initiative, then runs active rounds until the host closes it. All
//! collections are ordered maps so serializing the same session twice
//! produces identical output.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::combatant::{Ability, Combatant, Resource};
use crate::dice::DiceError;
use crate::parse::{combatant_id, normalize_name};

// ============================================================================
// Errors
// ============================================================================

/// Action failures. The messages read well in chat and are part of the
/// interface; hosts relay them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Invalid attacker or target.")]
    InvalidAttackerOrTarget,
    #[error("Target not found.")]
    TargetNotFound,
    #[error("Caster not found.")]
    CasterNotFound,
    #[error("Combatant not found.")]
    CombatantNotFound,
    #[error("No slots for that level.")]
    NoSlotsForLevel,
    #[error("No spell slots left.")]
    NoSpellSlotsLeft,
    #[error("Resource not found.")]
    ResourceNotFound,
    #[error("Resource pool is unknown.")]
    UnknownResourcePool,
    #[error("Not enough of that resource left.")]
    InsufficientResource,
    #[error("Condition cannot be blank.")]
    BlankCondition,
    #[error(transparent)]
    Dice(#[from] DiceError),
}

// ============================================================================
// Identity and configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How to open a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    pub origin_channel: Option<String>,
    pub created_by: Option<String>,
}

impl SessionConfig {
    /// A blank name falls back to "Combat".
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.trim().is_empty() {
            "Combat".to_string()
        } else {
            name
        };
        Self {
            name,
            origin_channel: None,
            created_by: None,
        }
    }

    pub fn with_origin_channel(mut self, channel: impl Into<String>) -> Self {
        self.origin_channel = Some(channel.into());
        self
    }

    pub fn with_created_by(mut self, user: impl Into<String>) -> Self {
        self.created_by = Some(user.into());
        self
    }
}

// ============================================================================
// Status, phases, turn records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Setup,
    Active,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Setup => write!(f, "setup"),
            SessionStatus::Active => write!(f, "active"),
        }
    }
}

/// The four beats of one combatant's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnPhase {
    #[default]
    TurnStart,
    Action,
    BonusReaction,
    TurnEnd,
}

impl TurnPhase {
    /// The cycle wraps: a turn's end leads into the next turn's start.
    pub fn next(self) -> TurnPhase {
        match self {
            TurnPhase::TurnStart => TurnPhase::Action,
            TurnPhase::Action => TurnPhase::BonusReaction,
            TurnPhase::BonusReaction => TurnPhase::TurnEnd,
            TurnPhase::TurnEnd => TurnPhase::TurnStart,
        }
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::TurnStart => write!(f, "turn-start"),
            TurnPhase::Action => write!(f, "action"),
            TurnPhase::BonusReaction => write!(f, "bonus-reaction"),
            TurnPhase::TurnEnd => write!(f, "turn-end"),
        }
    }
}

/// Which of the one-per-turn economies a combatant has used. Marking a
/// used flag again changes nothing; only the turn changing resets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnFlags {
    pub action_used: bool,
    pub bonus_action_used: bool,
    pub reaction_used: bool,
}

// ============================================================================
// Receipts
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlotReceipt {
    pub level: u8,
    pub remaining: u32,
}

/// Snapshot of a pool after a spend, restore, or set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReceipt {
    pub id: String,
    pub name: String,
    pub current: Option<u32>,
    pub max: Option<u32>,
}

impl From<&Resource> for ResourceReceipt {
    fn from(pool: &Resource) -> Self {
        Self {
            id: pool.id.clone(),
            name: pool.name.clone(),
            current: pool.current,
            max: pool.max,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// One combat from setup to finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatSession {
    pub id: SessionId,
    pub name: String,
    pub origin_channel: Option<String>,
    pub created_by: Option<String>,
    pub status: SessionStatus,
    pub phase: TurnPhase,
    /// 0 during setup, 1-based once combat begins.
    pub round: u32,
    pub turn_index: usize,
    pub initiative_order: Vec<String>,
    pub combatants: BTreeMap<String, Combatant>,
    pub turn_state: BTreeMap<String, TurnFlags>,
}

impl CombatSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: SessionId::new(),
            name: config.name,
            origin_channel: config.origin_channel,
            created_by: config.created_by,
            status: SessionStatus::Setup,
            phase: TurnPhase::TurnStart,
            round: 0,
            turn_index: 0,
            initiative_order: Vec::new(),
            combatants: BTreeMap::new(),
            turn_state: BTreeMap::new(),
        }
    }

    /// Snapshot the session as JSON for the host's storage.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a session from a stored snapshot.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    // ------------------------------------------------------------------
    // Roster
    // ------------------------------------------------------------------

    /// Insert or replace a combatant, resetting its turn record.
    pub fn add_combatant(&mut self, combatant: Combatant) -> &Combatant {
        let id = combatant.id.clone();
        self.turn_state.insert(id.clone(), TurnFlags::default());
        match self.combatants.entry(id) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(combatant);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(combatant),
        }
    }

    /// Add a quick NPC stat block. A blank name gets a generated id and
    /// the display name "NPC".
    pub fn add_npc(
        &mut self,
        name: &str,
        hp: Option<i32>,
        armor_class: Option<i32>,
        initiative: Option<i32>,
    ) -> &Combatant {
        let trimmed = name.trim();
        let (id, display) = if trimmed.is_empty() {
            let suffix = Uuid::new_v4().simple().to_string();
            (format!("npc_{}", &suffix[..8]), "NPC".to_string())
        } else {
            (combatant_id("npc", trimmed), trimmed.to_string())
        };
        self.add_combatant(Combatant::npc(id, display, hp, armor_class, initiative))
    }

    pub fn combatant(&self, combatant_id: &str) -> Option<&Combatant> {
        self.combatants.get(combatant_id)
    }

    pub fn combatant_mut(&mut self, combatant_id: &str) -> Option<&mut Combatant> {
        self.combatants.get_mut(combatant_id)
    }

    // ------------------------------------------------------------------
    // Initiative and turns
    // ------------------------------------------------------------------

    pub fn set_initiative(&mut self, combatant_id: &str, value: i32) -> Option<&Combatant> {
        let combatant = self.combatants.get_mut(combatant_id)?;
        combatant.initiative = Some(value);
        Some(&*combatant)
    }

    /// Sort everyone with an initiative into the order and start round 1
    /// at the top. Combatants without initiative sit out. Ties break by
    /// Dexterity modifier, then id, so the order is reproducible.
    ///
    /// Calling this on a running session re-sorts and restarts the round
    /// counter.
    pub fn begin_combat(&mut self) -> Option<&Combatant> {
        let mut order: Vec<String> = self
            .combatants
            .values()
            .filter(|c| c.initiative.is_some())
            .map(|c| c.id.clone())
            .collect();
        order.sort_by(|a, b| {
            let lhs = &self.combatants[a];
            let rhs = &self.combatants[b];
            rhs.initiative
                .cmp(&lhs.initiative)
                .then_with(|| {
                    rhs.ability_modifier(Ability::Dexterity)
                        .cmp(&lhs.ability_modifier(Ability::Dexterity))
                })
                .then_with(|| lhs.id.cmp(&rhs.id))
        });

        self.initiative_order = order;
        self.round = 1;
        self.turn_index = 0;
        self.status = SessionStatus::Active;
        self.phase = TurnPhase::TurnStart;
        if let Some(id) = self.initiative_order.first().cloned() {
            self.turn_state.insert(id, TurnFlags::default());
        }
        debug!(
            session = %self.id,
            combatants = self.initiative_order.len(),
            "combat started"
        );
        self.active_combatant()
    }

    pub fn active_combatant(&self) -> Option<&Combatant> {
        if self.status != SessionStatus::Active {
            return None;
        }
        let id = self.initiative_order.get(self.turn_index)?;
        self.combatants.get(id)
    }

    /// Advance to the next combatant in order, wrapping into a new round
    /// at the top. The phase and the new active combatant's turn record
    /// reset; everyone else's flags stay as they were.
    pub fn next_turn(&mut self) -> Option<&Combatant> {
        if self.status != SessionStatus::Active || self.initiative_order.is_empty() {
            return None;
        }
        self.turn_index = (self.turn_index + 1) % self.initiative_order.len();
        if self.turn_index == 0 {
            self.round += 1;
            debug!(session = %self.id, round = self.round, "new round");
        }
        self.phase = TurnPhase::TurnStart;
        if let Some(id) = self.initiative_order.get(self.turn_index).cloned() {
            self.turn_state.insert(id, TurnFlags::default());
        }
        self.active_combatant()
    }

    // ------------------------------------------------------------------
    // Phases and turn flags
    // ------------------------------------------------------------------

    pub fn set_phase(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }

    pub fn advance_phase(&mut self) -> TurnPhase {
        self.phase = self.phase.next();
        self.phase
    }

    pub fn turn_flags(&self, combatant_id: &str) -> Option<TurnFlags> {
        self.turn_state.get(combatant_id).copied()
    }

    pub fn use_action(&mut self, combatant_id: &str) -> Option<TurnFlags> {
        let flags = self.turn_state.get_mut(combatant_id)?;
        flags.action_used = true;
        Some(*flags)
    }

    pub fn use_bonus_action(&mut self, combatant_id: &str) -> Option<TurnFlags> {
        let flags = self.turn_state.get_mut(combatant_id)?;
        flags.bonus_action_used = true;
        Some(*flags)
    }

    pub fn use_reaction(&mut self, combatant_id: &str) -> Option<TurnFlags> {
        let flags = self.turn_state.get_mut(combatant_id)?;
        flags.reaction_used = true;
        Some(*flags)
    }

    // ------------------------------------------------------------------
    // Bookkeeping actions
    // ------------------------------------------------------------------

    /// Apply damage directly, outside any attack. Negative amounts heal.
    pub fn apply_damage(&mut self, target_id: &str, amount: i32) -> Result<i32, ActionError> {
        let target = self
            .combatants
            .get_mut(target_id)
            .ok_or(ActionError::TargetNotFound)?;
        Ok(target.apply_damage(amount))
    }

    pub fn add_condition(
        &mut self,
        combatant_id: &str,
        condition: &str,
    ) -> Result<(), ActionError> {
        let trimmed = condition.trim();
        if trimmed.is_empty() {
            return Err(ActionError::BlankCondition);
        }
        let combatant = self
            .combatants
            .get_mut(combatant_id)
            .ok_or(ActionError::CombatantNotFound)?;
        combatant.add_condition(trimmed);
        Ok(())
    }

    pub fn remove_condition(
        &mut self,
        combatant_id: &str,
        condition: &str,
    ) -> Result<(), ActionError> {
        let combatant = self
            .combatants
            .get_mut(combatant_id)
            .ok_or(ActionError::CombatantNotFound)?;
        combatant.remove_condition(condition.trim());
        Ok(())
    }

    /// Spend one spell slot of the given level.
    pub fn spend_spell_slot(
        &mut self,
        caster_id: &str,
        level: u8,
    ) -> Result<SpellSlotReceipt, ActionError> {
        let caster = self
            .combatants
            .get_mut(caster_id)
            .ok_or(ActionError::CasterNotFound)?;
        let info = caster
            .spell_slots
            .get(level)
            .ok_or(ActionError::NoSlotsForLevel)?;
        if info.remaining() == 0 {
            return Err(ActionError::NoSpellSlotsLeft);
        }
        let slot = caster
            .spell_slots
            .slot_mut(level)
            .ok_or(ActionError::NoSlotsForLevel)?;
        slot.spent += 1;
        Ok(SpellSlotReceipt {
            level,
            remaining: slot.remaining(),
        })
    }

    /// Spend from a pool. A pool with an unknown current value cannot be
    /// spent from until someone sets it.
    pub fn spend_resource(
        &mut self,
        combatant_id: &str,
        resource: &str,
        amount: u32,
    ) -> Result<ResourceReceipt, ActionError> {
        let combatant = self
            .combatants
            .get_mut(combatant_id)
            .ok_or(ActionError::CombatantNotFound)?;
        let pool = combatant
            .find_resource_mut(resource)
            .ok_or(ActionError::ResourceNotFound)?;
        let current = pool.current.ok_or(ActionError::UnknownResourcePool)?;
        if current < amount {
            return Err(ActionError::InsufficientResource);
        }
        pool.current = Some(current - amount);
        Ok(ResourceReceipt::from(&*pool))
    }

    /// Give back spent uses, clamped at the maximum when one is known.
    pub fn restore_resource(
        &mut self,
        combatant_id: &str,
        resource: &str,
        amount: u32,
    ) -> Result<ResourceReceipt, ActionError> {
        let combatant = self
            .combatants
            .get_mut(combatant_id)
            .ok_or(ActionError::CombatantNotFound)?;
        let pool = combatant
            .find_resource_mut(resource)
            .ok_or(ActionError::ResourceNotFound)?;
        let current = pool.current.ok_or(ActionError::UnknownResourcePool)?;
        let mut next = current.saturating_add(amount);
        if let Some(max) = pool.max {
            next = next.min(max);
        }
        pool.current = Some(next);
        Ok(ResourceReceipt::from(&*pool))
    }

    /// Set a pool to an exact value. A name no pool answers to creates a
    /// custom pool; setting is also how an unknown pool becomes known.
    pub fn set_resource_value(
        &mut self,
        combatant_id: &str,
        resource: &str,
        value: u32,
    ) -> Result<ResourceReceipt, ActionError> {
        let combatant = self
            .combatants
            .get_mut(combatant_id)
            .ok_or(ActionError::CombatantNotFound)?;
        if let Some(pool) = combatant.find_resource_mut(resource) {
            let mut next = value;
            if let Some(max) = pool.max {
                next = next.min(max);
            }
            pool.current = Some(next);
            return Ok(ResourceReceipt::from(&*pool));
        }
        let trimmed = resource.trim();
        let id = normalize_name(trimmed);
        if id.is_empty() {
            return Err(ActionError::ResourceNotFound);
        }
        combatant.resources.push(Resource::custom(id, trimmed, value));
        let created = combatant
            .resources
            .last()
            .ok_or(ActionError::ResourceNotFound)?;
        Ok(ResourceReceipt::from(created))
    }
}
