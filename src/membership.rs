use serde::{Deserialize, Serialize};

/// Membership tier. The ordering is total: Free < Bronze < Silver < Gold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Bronze, Tier::Silver, Tier::Gold];

    pub fn rank(&self) -> u8 {
        match self {
            Tier::Free => 0,
            Tier::Bronze => 1,
            Tier::Silver => 2,
            Tier::Gold => 3,
        }
    }

    /// Whether a user holding this tier may access content requiring
    /// `required`. Pure rank comparison, consulted on every gated read.
    pub fn can_access(&self, required: Tier) -> bool {
        self.rank() >= required.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
        }
    }

    /// Parses a tier name. Unknown names rank as the most restrictive
    /// interpretation: for a user tier that means no paid access, so this
    /// fails closed to `Free` instead of erroring.
    pub fn parse_or_free(s: &str) -> Tier {
        match s {
            "bronze" => Tier::Bronze,
            "silver" => Tier::Silver,
            "gold" => Tier::Gold,
            _ => Tier::Free,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of a purchasable plan, served by the pricing page.
#[derive(Clone, Debug, Serialize)]
pub struct TierPlan {
    pub name: Tier,
    pub monthly_price: u32,
    pub yearly_price: u32,
    pub features: &'static [&'static str],
    pub popular: bool,
}

pub fn tier_plans() -> Vec<TierPlan> {
    vec![
        TierPlan {
            name: Tier::Free,
            monthly_price: 0,
            yearly_price: 0,
            features: &[
                "Daily coaching tips",
                "Browse course catalog (preview only)",
                "Limited community access (read-only)",
                "Full podcast access (ALL episodes free!)",
                "Industry news feed",
            ],
            popular: false,
        },
        TierPlan {
            name: Tier::Bronze,
            monthly_price: 29,
            yearly_price: 290,
            features: &[
                "Everything in Free, plus:",
                "Access to Bronze-tier courses",
                "Full community participation",
                "Downloadable resources",
            ],
            popular: false,
        },
        TierPlan {
            name: Tier::Silver,
            monthly_price: 79,
            yearly_price: 790,
            features: &[
                "Everything in Bronze, plus:",
                "Access to ALL courses (Bronze + Silver tier)",
                "Weekly live coaching sessions",
                "Priority community support",
                "Exclusive templates & scripts",
            ],
            popular: true,
        },
        TierPlan {
            name: Tier::Gold,
            monthly_price: 149,
            yearly_price: 1490,
            features: &[
                "Everything in Silver, plus:",
                "VIP access to ALL premium content",
                "Monthly 1-on-1 coaching session",
                "Advanced marketing resources",
                "Early access to new content",
                "Exclusive Gold member events",
            ],
            popular: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_order_is_total() {
        for (i, lower) in Tier::ALL.iter().enumerate() {
            for higher in Tier::ALL.iter().skip(i + 1) {
                assert!(!lower.can_access(*higher), "{} vs {}", lower, higher);
                assert!(higher.can_access(*lower), "{} vs {}", higher, lower);
            }
        }
    }

    #[test]
    fn tier_access_is_reflexive() {
        for tier in Tier::ALL {
            assert!(tier.can_access(tier));
        }
    }

    #[test]
    fn unknown_tier_ranks_as_free() {
        assert_eq!(Tier::parse_or_free("platinum"), Tier::Free);
        assert_eq!(Tier::parse_or_free(""), Tier::Free);
        assert!(!Tier::parse_or_free("diamond").can_access(Tier::Bronze));
    }

    #[test]
    fn tier_string_round_trip() {
        for tier in Tier::ALL {
            assert_eq!(Tier::parse_or_free(tier.as_str()), tier);
        }
        let json = serde_json::to_string(&Tier::Silver).unwrap();
        assert_eq!(json, "\"silver\"");
    }

    #[test]
    fn four_plans_in_ascending_order() {
        let plans = tier_plans();
        assert_eq!(plans.len(), 4);
        for pair in plans.windows(2) {
            assert!(pair[0].name < pair[1].name);
            assert!(pair[0].monthly_price < pair[1].monthly_price || pair[0].monthly_price == 0);
        }
    }
}
