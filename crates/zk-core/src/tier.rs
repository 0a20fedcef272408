//! Reputation tiers
//!
//! | Tier       | Minimum score |
//! |------------|---------------|
//! | Unverified | 0             |
//! | Bronze     | 25            |
//! | Silver     | 50            |
//! | Gold       | 75            |
//! | Platinum   | 90            |

use core::fmt;
use core::str::FromStr;

use crate::errors::{FieldError, UnknownTier};

/// Highest valid score or threshold
pub const MAX_SCORE: u16 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Tier {
    #[default]
    Unverified = 0,
    Bronze = 1,
    Silver = 2,
    Gold = 3,
    Platinum = 4,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Unverified,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
    ];

    /// Highest tier whose minimum does not exceed `threshold`.
    pub fn for_threshold(threshold: u16) -> Result<Self, FieldError> {
        check_score(threshold)?;
        Ok(Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|t| threshold >= t.threshold())
            .unwrap_or(Tier::Unverified))
    }

    /// Minimum score for this tier
    pub const fn threshold(self) -> u16 {
        match self {
            Tier::Unverified => 0,
            Tier::Bronze => 25,
            Tier::Silver => 50,
            Tier::Gold => 75,
            Tier::Platinum => 90,
        }
    }

    pub fn qualifies(self, score: u16) -> bool {
        score <= MAX_SCORE && score >= self.threshold()
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Tier::Unverified => "unverified",
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }
}

/// Reject scores and thresholds above 100.
pub fn check_score(value: u16) -> Result<u16, FieldError> {
    if value > MAX_SCORE {
        return Err(FieldError::ScoreOutOfRange(value));
    }
    Ok(value)
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier as u8
    }
}

impl FromStr for Tier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == lower)
            .ok_or_else(|| UnknownTier(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let cases = [
            (0, Tier::Unverified),
            (24, Tier::Unverified),
            (25, Tier::Bronze),
            (49, Tier::Bronze),
            (50, Tier::Silver),
            (74, Tier::Silver),
            (75, Tier::Gold),
            (89, Tier::Gold),
            (90, Tier::Platinum),
            (100, Tier::Platinum),
        ];
        for (threshold, tier) in cases {
            assert_eq!(Tier::for_threshold(threshold).unwrap(), tier, "{}", threshold);
        }
    }

    #[test]
    fn test_tier_out_of_range() {
        assert_eq!(
            Tier::for_threshold(101),
            Err(FieldError::ScoreOutOfRange(101))
        );
    }

    #[test]
    fn test_qualifies() {
        assert!(Tier::Gold.qualifies(85));
        assert!(!Tier::Platinum.qualifies(85));
        assert!(Tier::Unverified.qualifies(0));
        assert!(!Tier::Unverified.qualifies(101));
    }

    #[test]
    fn test_u8_and_str_conversions() {
        for tier in Tier::ALL {
            assert_eq!(Tier::from_u8(u8::from(tier)), Some(tier));
            assert_eq!(tier.to_string().parse::<Tier>().unwrap(), tier);
        }
        assert_eq!(Tier::from_u8(5), None);
        assert_eq!("GOLD".parse::<Tier>().unwrap(), Tier::Gold);
        assert_eq!(
            "diamond".parse::<Tier>(),
            Err(UnknownTier("diamond".to_string()))
        );
        assert_eq!("Unverified".parse::<Tier>().unwrap(), Tier::Unverified);
        assert_eq!(Tier::default().to_string(), "unverified");
    }
}
