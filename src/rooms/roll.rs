//! Dice roll results and their canonical chat rendering.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Most dice a single server-side roll will throw.
pub const MAX_DICE_PER_ROLL: u32 = 100;

/// A finished roll as reported by a client (or produced by [`DiceRollResult::roll`]).
///
/// `total` is taken as given; it is never recomputed from `results` and `modifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollResult {
    pub die_size: u32,
    #[serde(default)]
    pub results: Vec<u32>,
    #[serde(default)]
    pub modifier: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request for the server to throw the dice itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollRequest {
    pub die_size: u32,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub modifier: i64,
    #[serde(default)]
    pub description: Option<String>,
}

fn one() -> u32 {
    1
}

impl DiceRollResult {
    /// Whether the roll can be rendered: at least one die, and every die inside `[1, die_size]`.
    pub fn is_well_formed(&self) -> bool {
        self.die_size > 0
            && !self.results.is_empty()
            && self.results.iter().all(|r| (1..=self.die_size).contains(r))
    }

    /// Throws `count` dice of `die_size` sides.
    ///
    /// `count` is clamped to `1..=MAX_DICE_PER_ROLL` and a zero-sided die is treated as a d1.
    /// Returns `None` when the modifier pushes the total out of `i64` range.
    pub fn roll(rng: &mut impl Rng, request: RollRequest) -> Option<Self> {
        let die_size = request.die_size.max(1);
        let count = request.count.clamp(1, MAX_DICE_PER_ROLL);

        let results: Vec<u32> = (0..count).map(|_| rng.random_range(1..=die_size)).collect();
        let total = results
            .iter()
            .map(|&r| i64::from(r))
            .sum::<i64>()
            .checked_add(request.modifier)?;

        Some(Self {
            die_size,
            results,
            modifier: request.modifier,
            total,
            description: request.description,
        })
    }

    /// Renders `"{N}d{die}: {r1}, {r2} {+|-} {modifier} = {total} ({description})"`.
    ///
    /// The modifier clause is left out when the modifier is zero and the description
    /// clause when there is no (or an empty) description. Callers must check
    /// [`is_well_formed`](Self::is_well_formed) first.
    pub fn format(&self) -> String {
        let results: Vec<String> = self.results.iter().map(u32::to_string).collect();
        let mut out = format!("{}d{}: {}", self.results.len(), self.die_size, results.join(", "));

        if self.modifier != 0 {
            let sign = if self.modifier > 0 { '+' } else { '-' };
            out += &format!(" {sign} {}", self.modifier.unsigned_abs());
        }

        out += &format!(" = {}", self.total);

        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            out += &format!(" ({description})");
        }

        out
    }
}
