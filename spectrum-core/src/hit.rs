use serde::{Deserialize, Serialize};
use spectrum_types::{Guess, Target};
use std::str::FromStr;

use crate::SurfaceTransform;

// Absorbs float noise on the square's boundary.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Decides whether a guess landed inside the target.
pub trait HitPolicy {
    fn is_hit(&self, guess: &Guess, target: Option<&Target>) -> bool;

    fn name(&self) -> &'static str;
}

/// Trusts the oracle's `hit_target` stamp verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthoritativeHit;

impl HitPolicy for AuthoritativeHit {
    fn is_hit(&self, guess: &Guess, _target: Option<&Target>) -> bool {
        guess.hit_target
    }

    fn name(&self) -> &'static str {
        "authoritative"
    }
}

/// Local square containment in pixel space, for offline play and tests.
#[derive(Debug, Clone, Copy)]
pub struct GeometricHit {
    pub transform: SurfaceTransform,
}

impl GeometricHit {
    pub fn new(transform: SurfaceTransform) -> Self {
        Self { transform }
    }
}

impl HitPolicy for GeometricHit {
    fn is_hit(&self, guess: &Guess, target: Option<&Target>) -> bool {
        let Some(target) = target else {
            return false;
        };
        let g = self.transform.to_pixel(guess.point.clamped());
        let t = self.transform.to_pixel(target.point.clamped());
        (g.x - t.x).abs() <= target.size * self.transform.scale_x() + BOUNDARY_EPSILON
            && (g.y - t.y).abs() <= target.size * self.transform.scale_y() + BOUNDARY_EPSILON
    }

    fn name(&self) -> &'static str {
        "geometric"
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitPolicyKind {
    #[default]
    Authoritative,
    Geometric,
}

impl FromStr for HitPolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authoritative" | "server" => Ok(HitPolicyKind::Authoritative),
            "geometric" | "local" => Ok(HitPolicyKind::Geometric),
            other => Err(format!("unknown hit policy '{}'", other)),
        }
    }
}

impl HitPolicyKind {
    /// Build the policy. The geometric policy needs a live transform; without
    /// one it can never report a hit.
    pub fn build(self, transform: Option<SurfaceTransform>) -> Box<dyn HitPolicy> {
        match (self, transform) {
            (HitPolicyKind::Authoritative, _) => Box::new(AuthoritativeHit),
            (HitPolicyKind::Geometric, Some(transform)) => Box::new(GeometricHit::new(transform)),
            (HitPolicyKind::Geometric, None) => Box::new(NeverHit),
        }
    }
}

struct NeverHit;

impl HitPolicy for NeverHit {
    fn is_hit(&self, _guess: &Guess, _target: Option<&Target>) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "geometric"
    }
}

/// The hit that flipped the session to won.
#[derive(Debug, Clone, PartialEq)]
pub struct WinTransition {
    pub guess: Guess,
    pub token: Option<String>,
}

pub struct WinEvaluator;

impl WinEvaluator {
    /// Scan the guesses in submission order and report the first hit.
    /// Returns `None` when `already_won` so the transition fires once.
    pub fn evaluate(
        guesses: &[Guess],
        target: Option<&Target>,
        policy: &dyn HitPolicy,
        already_won: bool,
    ) -> Option<WinTransition> {
        if already_won {
            return None;
        }
        guesses
            .iter()
            .find(|guess| policy.is_hit(guess, target))
            .map(|guess| WinTransition {
                guess: guess.clone(),
                token: guess.win_token.clone(),
            })
    }
}

/// An oracle-reported hit must also be inside the locally computed square.
pub fn consistency_check(guess: &Guess, target: &Target, transform: SurfaceTransform) -> bool {
    !guess.hit_target || GeometricHit::new(transform).is_hit(guess, Some(target))
}
