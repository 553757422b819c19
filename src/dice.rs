//! Dice expressions: parsing, rolling, and chat-friendly formatting.
//!
//! Expressions use the tabletop `NdM+K` shape ("2d6+3", "d20"). A bare
//! `adv`/`advantage` or `dis`/`disadvantage` word anywhere in the input
//! switches a plain `1d20` into a roll-two-take-one check.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Everything that can go wrong parsing a dice expression. The messages
/// are surfaced to players verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Provide a dice expression like 1d20+5.")]
    Empty,
    #[error("Choose either advantage or disadvantage, not both.")]
    ConflictingAdvantage,
    #[error("Use NdM with optional +K/-K (e.g., 2d6+3, d20).")]
    Malformed,
    #[error("Dice count must be between 1 and 50.")]
    CountOutOfRange,
    #[error("Dice sides must be between 2 and 1000.")]
    SidesOutOfRange,
    #[error("Modifier is too large.")]
    ModifierTooLarge,
    #[error("Advantage/disadvantage only applies to 1d20.")]
    AdvantageRequiresD20,
}

/// Advantage state for a d20 roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

/// A validated `NdM+K` dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
    pub advantage: Advantage,
}

impl DiceExpression {
    /// A single d20 with a flat modifier, the shape every check uses.
    pub fn d20(modifier: i32, advantage: Advantage) -> Self {
        Self {
            count: 1,
            sides: 20,
            modifier,
            advantage,
        }
    }

    /// Parse player input. Leading/trailing whitespace and case are
    /// ignored; `adv`/`dis` words may appear before or after the body.
    pub fn parse(input: &str) -> Result<Self, DiceError> {
        let text = input.trim().to_lowercase();
        if text.is_empty() {
            return Err(DiceError::Empty);
        }

        let mut advantage = false;
        let mut disadvantage = false;
        let mut body_tokens: Vec<&str> = Vec::new();
        for token in text.split_whitespace() {
            match token {
                "adv" | "advantage" => advantage = true,
                "dis" | "disadvantage" => disadvantage = true,
                other => body_tokens.push(other),
            }
        }
        if advantage && disadvantage {
            return Err(DiceError::ConflictingAdvantage);
        }

        let body = body_tokens.join(" ");
        let (count, sides, modifier) = parse_body(&body).ok_or(DiceError::Malformed)?;
        if !(1..=50).contains(&count) {
            return Err(DiceError::CountOutOfRange);
        }
        if !(2..=1000).contains(&sides) {
            return Err(DiceError::SidesOutOfRange);
        }
        if modifier.abs() > 10_000 {
            return Err(DiceError::ModifierTooLarge);
        }

        let advantage = if advantage {
            Advantage::Advantage
        } else if disadvantage {
            Advantage::Disadvantage
        } else {
            Advantage::Normal
        };
        if advantage != Advantage::Normal && (count != 1 || sides != 20) {
            return Err(DiceError::AdvantageRequiresD20);
        }

        Ok(Self {
            count: count as u32,
            sides: sides as u32,
            modifier: modifier as i32,
            advantage,
        })
    }

    /// Roll with a caller-supplied RNG. Advantage and disadvantage roll
    /// exactly two dice and keep the higher or lower one.
    pub fn roll_with_rng<R: Rng>(&self, rng: &mut R) -> RollResult {
        match self.advantage {
            Advantage::Normal => {
                let rolls: Vec<u32> = (0..self.count)
                    .map(|_| rng.gen_range(1..=self.sides))
                    .collect();
                let total = rolls.iter().map(|&r| r as i32).sum::<i32>() + self.modifier;
                RollResult {
                    expression: *self,
                    rolls,
                    chosen: None,
                    total,
                }
            }
            Advantage::Advantage | Advantage::Disadvantage => {
                let first = rng.gen_range(1..=self.sides);
                let second = rng.gen_range(1..=self.sides);
                let chosen = if self.advantage == Advantage::Advantage {
                    first.max(second)
                } else {
                    first.min(second)
                };
                RollResult {
                    expression: *self,
                    rolls: vec![first, second],
                    chosen: Some(chosen),
                    total: chosen as i32 + self.modifier,
                }
            }
        }
    }
}

/// Scan `count? d sides (+|- modifier)?` with whitespace allowed between
/// elements but not inside a number.
fn parse_body(body: &str) -> Option<(u64, u64, i64)> {
    let chars: Vec<char> = body.chars().collect();

    let (mut i, count) = read_number(&chars, 0);
    let count = count.unwrap_or(1);
    i = skip_whitespace(&chars, i);
    if i >= chars.len() || chars[i] != 'd' {
        return None;
    }
    i = skip_whitespace(&chars, i + 1);
    let (next, sides) = read_number(&chars, i);
    let sides = sides?;
    i = skip_whitespace(&chars, next);

    let mut modifier: i64 = 0;
    if i < chars.len() {
        let sign: i64 = match chars[i] {
            '+' => 1,
            '-' => -1,
            _ => return None,
        };
        i = skip_whitespace(&chars, i + 1);
        let (next, value) = read_number(&chars, i);
        let value = value?;
        if next != chars.len() {
            return None;
        }
        modifier = sign * value as i64;
    }
    Some((count, sides, modifier))
}

fn skip_whitespace(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && chars[i].is_whitespace() {
        i += 1;
    }
    i
}

fn read_number(chars: &[char], mut i: usize) -> (usize, Option<u64>) {
    let start = i;
    let mut value: u64 = 0;
    while i < chars.len() && chars[i].is_ascii_digit() {
        value = value
            .saturating_mul(10)
            .saturating_add(chars[i] as u64 - '0' as u64);
        i += 1;
    }
    if i == start {
        (i, None)
    } else {
        (i, Some(value))
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        Ok(())
    }
}

/// The outcome of rolling an expression. `chosen` is set only for
/// advantage and disadvantage rolls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: DiceExpression,
    pub rolls: Vec<u32>,
    pub chosen: Option<u32>,
    pub total: i32,
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rolled {}", self.expression)?;
        match self.expression.advantage {
            Advantage::Advantage => write!(f, " (advantage)")?,
            Advantage::Disadvantage => write!(f, " (disadvantage)")?,
            Advantage::Normal => {}
        }
        let rolls: Vec<String> = self.rolls.iter().map(|r| r.to_string()).collect();
        write!(f, "\nRolls: {}", rolls.join(", "))?;
        if let Some(chosen) = self.chosen {
            write!(f, " -> {}", chosen)?;
        }
        write!(f, "\nTotal: {}", self.total)
    }
}

/// Source of randomness for the engine. Swapping in a scripted roller
/// makes every combat outcome deterministic under test.
pub trait DiceRoller {
    fn roll(&mut self, expression: &DiceExpression) -> RollResult;
}

/// The default roller, backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRoller;

impl DiceRoller for RandomRoller {
    fn roll(&mut self, expression: &DiceExpression) -> RollResult {
        expression.roll_with_rng(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_basic_expressions() {
        let expr = DiceExpression::parse("2d6+3").unwrap();
        assert_eq!(expr.count, 2);
        assert_eq!(expr.sides, 6);
        assert_eq!(expr.modifier, 3);
        assert_eq!(expr.advantage, Advantage::Normal);

        let expr = DiceExpression::parse("d20").unwrap();
        assert_eq!(expr.count, 1);
        assert_eq!(expr.sides, 20);
        assert_eq!(expr.modifier, 0);

        let expr = DiceExpression::parse("  1D8 - 2  ").unwrap();
        assert_eq!((expr.count, expr.sides, expr.modifier), (1, 8, -2));

        let expr = DiceExpression::parse("1 d 20 + 5").unwrap();
        assert_eq!((expr.count, expr.sides, expr.modifier), (1, 20, 5));
    }

    #[test]
    fn test_parse_advantage_markers() {
        let expr = DiceExpression::parse("1d20+5 adv").unwrap();
        assert_eq!(expr.advantage, Advantage::Advantage);

        let expr = DiceExpression::parse("disadvantage d20").unwrap();
        assert_eq!(expr.advantage, Advantage::Disadvantage);

        assert_eq!(
            DiceExpression::parse("1d20 adv dis"),
            Err(DiceError::ConflictingAdvantage)
        );
        assert_eq!(
            DiceExpression::parse("2d6 adv"),
            Err(DiceError::AdvantageRequiresD20)
        );
        assert_eq!(
            DiceExpression::parse("d12 advantage"),
            Err(DiceError::AdvantageRequiresD20)
        );
    }

    #[test]
    fn test_parse_rejections() {
        assert_eq!(DiceExpression::parse(""), Err(DiceError::Empty));
        assert_eq!(DiceExpression::parse("   "), Err(DiceError::Empty));
        assert_eq!(DiceExpression::parse("banana"), Err(DiceError::Malformed));
        assert_eq!(DiceExpression::parse("1 0 d6"), Err(DiceError::Malformed));
        assert_eq!(DiceExpression::parse("2d6+"), Err(DiceError::Malformed));
        assert_eq!(DiceExpression::parse("0d6"), Err(DiceError::CountOutOfRange));
        assert_eq!(DiceExpression::parse("51d6"), Err(DiceError::CountOutOfRange));
        assert_eq!(DiceExpression::parse("1d1"), Err(DiceError::SidesOutOfRange));
        assert_eq!(
            DiceExpression::parse("1d1001"),
            Err(DiceError::SidesOutOfRange)
        );
        assert_eq!(
            DiceExpression::parse("1d20+10001"),
            Err(DiceError::ModifierTooLarge)
        );
    }

    #[test]
    fn test_conflict_reported_even_without_body() {
        // The marker clash wins over the malformed remainder.
        assert_eq!(
            DiceExpression::parse("adv dis"),
            Err(DiceError::ConflictingAdvantage)
        );
    }

    #[test]
    fn test_roll_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let expr = DiceExpression::parse("4d6+2").unwrap();
        for _ in 0..100 {
            let result = expr.roll_with_rng(&mut rng);
            assert_eq!(result.rolls.len(), 4);
            assert!(result.rolls.iter().all(|&r| (1..=6).contains(&r)));
            let sum: i32 = result.rolls.iter().map(|&r| r as i32).sum();
            assert_eq!(result.total, sum + 2);
            assert_eq!(result.chosen, None);
        }
    }

    #[test]
    fn test_advantage_rolls_two_and_keeps_high() {
        let mut rng = StdRng::seed_from_u64(11);
        let expr = DiceExpression::d20(3, Advantage::Advantage);
        for _ in 0..100 {
            let result = expr.roll_with_rng(&mut rng);
            assert_eq!(result.rolls.len(), 2);
            let high = result.rolls[0].max(result.rolls[1]);
            assert_eq!(result.chosen, Some(high));
            assert_eq!(result.total, high as i32 + 3);
        }
    }

    #[test]
    fn test_disadvantage_keeps_low() {
        let mut rng = StdRng::seed_from_u64(13);
        let expr = DiceExpression::d20(0, Advantage::Disadvantage);
        for _ in 0..100 {
            let result = expr.roll_with_rng(&mut rng);
            let low = result.rolls[0].min(result.rolls[1]);
            assert_eq!(result.chosen, Some(low));
            assert_eq!(result.total, low as i32);
        }
    }

    #[test]
    fn test_expression_display() {
        assert_eq!(DiceExpression::parse("2d6+3").unwrap().to_string(), "2d6+3");
        assert_eq!(DiceExpression::parse("d20").unwrap().to_string(), "1d20");
        assert_eq!(
            DiceExpression::parse("1d20 - 2").unwrap().to_string(),
            "1d20-2"
        );
    }

    #[test]
    fn test_roll_result_display() {
        let result = RollResult {
            expression: "2d6+3".parse().unwrap(),
            rolls: vec![4, 2],
            chosen: None,
            total: 9,
        };
        assert_eq!(result.to_string(), "Rolled 2d6+3\nRolls: 4, 2\nTotal: 9");

        let result = RollResult {
            expression: DiceExpression::d20(5, Advantage::Advantage),
            rolls: vec![11, 17],
            chosen: Some(17),
            total: 22,
        };
        assert_eq!(
            result.to_string(),
            "Rolled 1d20+5 (advantage)\nRolls: 11, 17 -> 17\nTotal: 22"
        );
    }
}
