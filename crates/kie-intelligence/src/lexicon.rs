// crates/kie-intelligence/src/lexicon.rs
// ============================================================================
// Module: Role Lexicon
// Description: Curated keyword and synonym sets per semantic role.
// Purpose: Ground keyword scoring and objective relevance in one vocabulary.
// Dependencies: kie-core
// ============================================================================

//! ## Overview
//! Each semantic role carries a curated keyword set used by the mapper's
//! tier-1 scoring and by triage's objective-relevance overlap. The built-in
//! sets are extendable through `[lexicon]` configuration; extensions merge
//! over, never replace, the built-ins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use kie_core::SemanticRole;

// ============================================================================
// SECTION: Built-in Keywords
// ============================================================================

/// Returns the built-in keyword set for a role.
#[must_use]
pub const fn role_keywords(role: SemanticRole) -> &'static [&'static str] {
    match role {
        SemanticRole::Revenue => &[
            "revenue", "sales", "income", "turnover", "recurring", "arr", "mrr", "billing",
            "bookings",
        ],
        SemanticRole::Cost => &[
            "cost", "costs", "expense", "expenses", "spend", "spending", "cogs", "opex", "capex",
        ],
        SemanticRole::Margin => &[
            "margin", "gross", "profit", "profitability", "rate", "ratio", "pct", "percent",
            "conversion",
        ],
        SemanticRole::Quantity => &[
            "quantity", "qty", "units", "volume", "count", "orders", "headcount", "visits",
        ],
        SemanticRole::Date => &[
            "date", "day", "month", "year", "quarter", "week", "period", "time", "timestamp",
        ],
        SemanticRole::Category => &[
            "category", "segment", "product", "type", "group", "class", "line", "channel", "tier",
            "brand", "division",
        ],
        SemanticRole::Region => &[
            "region", "territory", "market", "country", "state", "province", "area", "district",
        ],
        SemanticRole::Id => &["id", "identifier", "code", "key", "uuid", "number"],
        SemanticRole::Geo => &[
            "geo", "city", "location", "latitude", "longitude", "lat", "lng", "lon", "address",
        ],
    }
}

// ============================================================================
// SECTION: Merged Lexicon
// ============================================================================

/// Role lexicon with configuration extensions merged over the built-ins.
///
/// # Invariants
/// - Built-in keywords are always present; extensions only add.
#[derive(Debug, Clone, Default)]
pub struct RoleLexicon {
    /// Extra lowercase keywords per role.
    extra: BTreeMap<SemanticRole, Vec<String>>,
}

impl RoleLexicon {
    /// Creates a lexicon with the given extensions.
    #[must_use]
    pub fn new(extra: BTreeMap<SemanticRole, Vec<String>>) -> Self {
        Self {
            extra,
        }
    }

    /// Returns the merged keyword set for a role.
    #[must_use]
    pub fn keywords(&self, role: SemanticRole) -> BTreeSet<String> {
        let mut keywords: BTreeSet<String> =
            role_keywords(role).iter().map(|keyword| (*keyword).to_string()).collect();
        if let Some(extra) = self.extra.get(&role) {
            keywords.extend(extra.iter().map(|keyword| keyword.to_ascii_lowercase()));
        }
        keywords
    }

    /// Returns true when the token appears in the role's merged set.
    #[must_use]
    pub fn contains(&self, role: SemanticRole, token: &str) -> bool {
        self.keywords(role).contains(token)
    }
}
