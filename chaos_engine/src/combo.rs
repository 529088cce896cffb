/*!
This module handles the timed combo counter that multiplies score across
rapid successive line clears.
*/

use std::time::Duration;

use crate::GameTime;

/// The rolling state of consecutive line clears inside the combo time window.
///
/// Exists only while a combo is running; it lapses (and is removed) once the
/// deadline passes without a new clear.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComboState {
    /// How many clears this combo has chained so far. Doubles as the score
    /// multiplier; `1` is the no-combo baseline.
    pub count: u32,
    /// The in-game time until which the next clear must happen to extend the
    /// combo.
    pub deadline: GameTime,
}

/// Registers a clear at `now` and returns the multiplier to score it with.
///
/// A clear inside the window of a running combo increments the count;
/// anything else starts over at `1`. Either way the deadline is re-armed to
/// `now + window`.
pub(crate) fn bump(combo: &mut Option<ComboState>, now: GameTime, window: Duration) -> u32 {
    let count = match combo {
        Some(running) if now <= running.deadline => running.count + 1,
        _ => 1,
    };
    *combo = Some(ComboState {
        count,
        deadline: now + window,
    });
    count
}

/// Drops the combo state if its deadline has passed.
pub(crate) fn expire(combo: &mut Option<ComboState>, now: GameTime) {
    if combo.is_some_and(|running| running.deadline < now) {
        *combo = None;
    }
}
