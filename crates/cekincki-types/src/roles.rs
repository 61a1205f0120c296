//! Points value to role name mapping
//!
//! Two naming schemes are supported:
//! - `Value`: one role per exact value (`Cekinčki: 42`)
//! - `Tier`: one role per tier of a ladder (`Cekinčki: Silver`)
//!
//! Every role the synchronizer manages starts with `prefix + " "`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Role prefix used when none is configured
pub const DEFAULT_ROLE_PREFIX: &str = "Cekinčki:";

/// Naming scheme for managed roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleMode {
    /// One role per exact value
    #[default]
    Value,

    /// One role per tier
    Tier,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role mode: {0} (expected 'value' or 'tier')")]
pub struct RoleModeError(String);

impl FromStr for RoleMode {
    type Err = RoleModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" | "exact" => Ok(RoleMode::Value),
            "tier" | "tiers" => Ok(RoleMode::Tier),
            other => Err(RoleModeError(other.to_string())),
        }
    }
}

impl fmt::Display for RoleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleMode::Value => f.write_str("value"),
            RoleMode::Tier => f.write_str("tier"),
        }
    }
}

/// A named tier with an inclusive lower bound.
///
/// `min` is any JSON number, so `10.0` and `2.5` are valid bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub min: f64,
    pub name: String,
}

impl Tier {
    pub fn new(min: impl Into<f64>, name: impl Into<String>) -> Self {
        Self {
            min: min.into(),
            name: name.into(),
        }
    }
}

/// Tiers sorted ascending by `min`; never empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tier>", into = "Vec<Tier>")]
pub struct TierLadder(Vec<Tier>);

impl Default for TierLadder {
    fn default() -> Self {
        Self(vec![
            Tier::new(0, "Novice"),
            Tier::new(10, "Bronze"),
            Tier::new(50, "Silver"),
            Tier::new(100, "Gold"),
            Tier::new(500, "Platinum"),
        ])
    }
}

impl TryFrom<Vec<Tier>> for TierLadder {
    type Error = String;

    fn try_from(mut tiers: Vec<Tier>) -> Result<Self, Self::Error> {
        if tiers.is_empty() {
            return Err("tier ladder must contain at least one tier".to_string());
        }
        if tiers.iter().any(|t| !t.min.is_finite()) {
            return Err("tier bounds must be finite numbers".to_string());
        }
        tiers.sort_by(|a, b| a.min.total_cmp(&b.min));
        Ok(Self(tiers))
    }
}

impl From<TierLadder> for Vec<Tier> {
    fn from(ladder: TierLadder) -> Self {
        ladder.0
    }
}

impl TierLadder {
    /// Parse a JSON array of `{min, name}`. Malformed input yields the default ladder.
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str::<Vec<Tier>>(raw)
            .ok()
            .and_then(|tiers| Self::try_from(tiers).ok())
            .unwrap_or_default()
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.0
    }

    /// Highest tier whose `min` is at most `value`; the lowest tier when none is.
    pub fn tier_for(&self, value: i64) -> &Tier {
        let mut chosen = &self.0[0];
        for tier in &self.0 {
            if value as f64 >= tier.min {
                chosen = tier;
            } else {
                break;
            }
        }
        chosen
    }
}

pub fn value_role_name(prefix: &str, value: i64) -> String {
    format!("{} {}", prefix, value)
}

pub fn tier_role_name(prefix: &str, tier: &Tier) -> String {
    format!("{} {}", prefix, tier.name)
}

/// Role the member should wear for `value`
pub fn target_role_name(mode: RoleMode, prefix: &str, ladder: &TierLadder, value: i64) -> String {
    match mode {
        RoleMode::Value => value_role_name(prefix, value),
        RoleMode::Tier => tier_role_name(prefix, ladder.tier_for(value)),
    }
}

/// Whether `role_name` is managed under `prefix`
pub fn is_managed_role(prefix: &str, role_name: &str) -> bool {
    role_name
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with(' '))
}
