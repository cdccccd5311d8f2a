//! Tier-keyed dietary recommendations and the report disclaimer
//!
//! Static text shown alongside an assessment. The lists are not derived from
//! the metrics; they are a lookup keyed by risk tier.

use crate::types::RiskTier;

/// Number of recommendations shown with an assessment
pub const DISPLAYED_RECOMMENDATIONS: usize = 5;

/// Shown with every assessment
pub const DISCLAIMER: &str = "This is not a medical diagnosis. Please consult with a healthcare professional for proper evaluation.";

const LOW: &[&str] = &[
    "Berries (blueberries, strawberries) - high in antioxidants",
    "Green tea - contains polyphenols",
    "Nuts (walnuts, almonds) - good source of healthy fats",
    "Fatty fish (salmon, mackerel) - rich in omega-3 fatty acids",
    "Turmeric - contains curcumin with anti-inflammatory properties",
];

const MODERATE: &[&str] = &[
    "Green leafy vegetables (spinach, kale) - high in antioxidants",
    "Probiotic foods (yogurt, kefir) - supports gut-brain axis",
    "Olive oil - contains oleocanthal with anti-inflammatory properties",
    "Whole grains - provides sustained energy and fiber",
    "Fresh herbs (rosemary, oregano) - contains antioxidants",
    "Water with lemon - helps with hydration and detoxification",
];

const HIGH: &[&str] = &[
    "Fresh vegetables (broccoli, bell peppers) - high in antioxidants",
    "Legumes (lentils, beans) - rich in protein and fiber",
    "Fermented foods (sauerkraut, kimchi) - supports gut health",
    "Seeds (flaxseeds, chia seeds) - high in omega-3 fatty acids",
    "Dark chocolate (70%+ cocoa) - contains flavonoids",
    "Ginger - has anti-inflammatory properties",
    "Green smoothies - easy to digest nutrients",
    "Hydrating foods (cucumber, watermelon)",
];

/// Full recommendation list for a tier
pub fn recommendations(tier: RiskTier) -> &'static [&'static str] {
    match tier {
        RiskTier::Low => LOW,
        RiskTier::Moderate => MODERATE,
        RiskTier::High => HIGH,
    }
}

/// The entries displayed with an assessment
pub fn displayed_recommendations(tier: RiskTier) -> Vec<String> {
    recommendations(tier)
        .iter()
        .take(DISPLAYED_RECOMMENDATIONS)
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_sizes() {
        assert_eq!(recommendations(RiskTier::Low).len(), 5);
        assert_eq!(recommendations(RiskTier::Moderate).len(), 6);
        assert_eq!(recommendations(RiskTier::High).len(), 8);
    }

    #[test]
    fn test_displayed_is_capped() {
        assert_eq!(displayed_recommendations(RiskTier::High).len(), DISPLAYED_RECOMMENDATIONS);
        assert!(displayed_recommendations(RiskTier::Low)[0].starts_with("Berries"));
    }
}
