//! Deterministic dice for tests.
//!
//! [`SequenceRoller`] swaps into [`CombatEngine`] wherever a
//! [`DiceRoller`] is expected, turning every attack, save, and initiative
//! roll into a scripted outcome.
//!
//! [`CombatEngine`]: crate::engine::CombatEngine

use std::collections::VecDeque;

use crate::dice::{Advantage, DiceExpression, DiceRoller, RollResult};

/// A roller that deals faces from a fixed script instead of an RNG.
///
/// Each die consumes one face from the front of the queue; advantage and
/// disadvantage consume two. Faces outside the die's range are clamped
/// into it, and an exhausted script keeps producing 1s, so a short
/// script never panics mid-test.
#[derive(Debug, Clone, Default)]
pub struct SequenceRoller {
    faces: VecDeque<u32>,
}

impl SequenceRoller {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
        }
    }

    /// Append another face to the script.
    pub fn push(&mut self, face: u32) {
        self.faces.push_back(face);
    }

    /// Faces not yet consumed. Handy for asserting a test spent exactly
    /// the rolls it scripted.
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }

    fn next_face(&mut self, sides: u32) -> u32 {
        self.faces.pop_front().unwrap_or(1).clamp(1, sides)
    }
}

impl DiceRoller for SequenceRoller {
    fn roll(&mut self, expression: &DiceExpression) -> RollResult {
        match expression.advantage {
            Advantage::Normal => {
                let rolls: Vec<u32> = (0..expression.count)
                    .map(|_| self.next_face(expression.sides))
                    .collect();
                let total = rolls.iter().map(|&r| r as i32).sum::<i32>() + expression.modifier;
                RollResult {
                    expression: *expression,
                    rolls,
                    chosen: None,
                    total,
                }
            }
            Advantage::Advantage | Advantage::Disadvantage => {
                let first = self.next_face(expression.sides);
                let second = self.next_face(expression.sides);
                let chosen = if expression.advantage == Advantage::Advantage {
                    first.max(second)
                } else {
                    first.min(second)
                };
                RollResult {
                    expression: *expression,
                    rolls: vec![first, second],
                    chosen: Some(chosen),
                    total: chosen as i32 + expression.modifier,
                }
            }
        }
    }
}
