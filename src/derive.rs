//! Plaintext derivation from a (possibly partial) wheel bank.
//!
//! Derivation decrypts every position whose wheel slot holds a residue
//! and leaves the rest as the explicit unknown sentinel (`None`).
//! Positions are always reported in original text order; only the key
//! schedule looks through the route.
//!
//! The autokey extension repeats the pass as a bounded fixed-point
//! iteration: each pass may decrypt a position using plaintext derived
//! at `i − delay` by the *previous* pass as key material. This is the
//! one place derivation is not independent across positions.

use serde::{Deserialize, Serialize};

use crate::alphabet::{render_partial, Letter};
use crate::error::{ConfigError, RouteError, SolverResult};
use crate::route::Route;
use crate::wheel::WheelBank;

/// Default bound on autokey feedback passes.
pub const DEFAULT_MAX_PASSES: usize = 3;

/// Autokey / running-key configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autokey {
    /// Distance back into the derived plaintext that supplies key
    /// material. Must be non-zero.
    pub delay: usize,

    /// Bound on feedback passes; iteration also halts as soon as a pass
    /// makes no new determination.
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

fn default_max_passes() -> usize {
    DEFAULT_MAX_PASSES
}

impl Autokey {
    /// Autokey with the given delay and the default pass bound.
    #[must_use]
    pub const fn new(delay: usize) -> Self {
        Self {
            delay,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

/// A derivation result: plaintext with explicit unknowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    /// One entry per text position, in original order; `None` marks an
    /// undetermined position.
    pub plaintext: Vec<Option<Letter>>,

    /// Number of determined positions.
    pub forced_count: usize,

    /// Passes executed (1 without autokey).
    pub passes: usize,
}

impl Derivation {
    /// Indexes of undetermined positions, ascending.
    #[must_use]
    pub fn unknown_positions(&self) -> Vec<usize> {
        self.plaintext
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.is_none().then_some(i))
            .collect()
    }

    /// Number of undetermined positions.
    #[must_use]
    pub fn unknown_count(&self) -> usize {
        self.plaintext.len() - self.forced_count
    }

    /// True when every position is determined.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.forced_count == self.plaintext.len()
    }

    /// Renders the plaintext, substituting `sentinel` for unknowns.
    #[must_use]
    pub fn render(&self, sentinel: char) -> String {
        render_partial(&self.plaintext, sentinel)
    }
}

fn check_lengths(
    bank: &WheelBank,
    text_len: usize,
    route: Option<&Route>,
) -> SolverResult<()> {
    if text_len != bank.text_len() {
        return Err(ConfigError::TextLengthMismatch {
            expected: bank.text_len(),
            found: text_len,
        }
        .into());
    }
    if let Some(route) = route {
        if route.len() != text_len {
            return Err(RouteError::LengthMismatch {
                route_id: route.id().to_string(),
                expected: text_len,
                found: route.len(),
            }
            .into());
        }
    }
    Ok(())
}

/// Derives plaintext from every position whose wheel slot is known.
///
/// # Errors
///
/// Returns length-mismatch or unknown-class configuration errors; a
/// partial bank is not an error, it just leaves unknowns.
pub fn derive(
    bank: &WheelBank,
    ciphertext: &[Letter],
    route: Option<&Route>,
) -> SolverResult<Derivation> {
    check_lengths(bank, ciphertext.len(), route)?;

    let mut plaintext = vec![None; ciphertext.len()];
    let mut forced_count = 0;
    for (index, &symbol) in ciphertext.iter().enumerate() {
        let schedule_position = route.map_or(index, |r| r.wheel_position(index));
        let wheel = bank.wheel_at(schedule_position)?;
        if let Some(residue) = wheel.residue_at(schedule_position) {
            plaintext[index] = Some(wheel.family().decrypt(symbol, residue));
            forced_count += 1;
        }
    }

    Ok(Derivation {
        plaintext,
        forced_count,
        passes: 1,
    })
}

/// Derives plaintext with autokey/running-key feedback.
///
/// Runs the plain wheel pass, then up to `autokey.max_passes` feedback
/// passes. Each feedback pass reads a frozen snapshot of the previous
/// pass, so a determination made in pass `n` feeds keys only from pass
/// `n + 1` on; iteration halts early once a pass determines nothing new.
///
/// # Errors
///
/// Returns `ConfigError::ZeroAutokeyDelay` for a zero delay, plus the
/// same errors as [`derive`].
pub fn derive_autokey(
    bank: &WheelBank,
    ciphertext: &[Letter],
    route: Option<&Route>,
    autokey: Autokey,
) -> SolverResult<Derivation> {
    if autokey.delay == 0 {
        return Err(ConfigError::ZeroAutokeyDelay.into());
    }

    let mut derivation = derive(bank, ciphertext, route)?;
    for _ in 0..autokey.max_passes {
        let snapshot = derivation.plaintext.clone();
        let mut determined = 0;
        for index in autokey.delay..ciphertext.len() {
            if derivation.plaintext[index].is_some() {
                continue;
            }
            let Some(key_letter) = snapshot[index - autokey.delay] else {
                continue;
            };
            let schedule_position = route.map_or(index, |r| r.wheel_position(index));
            let wheel = bank.wheel_at(schedule_position)?;
            derivation.plaintext[index] =
                Some(wheel.family().decrypt(ciphertext[index], key_letter.value()));
            determined += 1;
        }
        derivation.passes += 1;
        derivation.forced_count += determined;
        if determined == 0 {
            break;
        }
    }

    Ok(derivation)
}

/// Re-encrypts plaintext through a wheel bank and route.
///
/// The reverse direction of [`derive`], used to verify closure: for a
/// fully determined bank, `encrypt(derive(c)) == c`.
///
/// # Errors
///
/// Returns `ConfigError::UnknownSlot` if any needed slot was never
/// forced, plus the length-mismatch errors of [`derive`].
pub fn encrypt(
    bank: &WheelBank,
    plaintext: &[Letter],
    route: Option<&Route>,
) -> SolverResult<Vec<Letter>> {
    check_lengths(bank, plaintext.len(), route)?;

    let mut ciphertext = Vec::with_capacity(plaintext.len());
    for (index, &symbol) in plaintext.iter().enumerate() {
        let schedule_position = route.map_or(index, |r| r.wheel_position(index));
        let wheel = bank.wheel_at(schedule_position)?;
        let residue = wheel
            .residue_at(schedule_position)
            .ok_or(ConfigError::UnknownSlot {
                class_id: wheel.class_id(),
                slot: wheel.slot_index(schedule_position),
            })?;
        ciphertext.push(wheel.family().encrypt(symbol, residue));
    }
    Ok(ciphertext)
}
