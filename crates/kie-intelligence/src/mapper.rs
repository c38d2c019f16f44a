// crates/kie-intelligence/src/mapper.rs
// ============================================================================
// Module: Semantic Column Mapper
// Description: Four-tier role assignment over real dataset columns.
// Purpose: Decide which column plays which semantic role, explainably.
// Dependencies: crate::{lexicon, loader, table}, kie-core, serde
// ============================================================================

//! ## Overview
//! The mapper assigns closed-vocabulary roles to columns through four tiers,
//! applied in order: (1) semantic keyword match, (2) identifier avoidance for
//! measure roles, (3) percentage-safe scaling for rate-expecting roles, and
//! (4) a coefficient-of-variation tie-breaker, with remaining ties resolved
//! by keyword-match strength and then column order. The tier at which each
//! decision was made is part of the output. A spec override takes absolute
//! precedence; an override naming a non-existent column is ignored for that
//! role and the tiers fill it instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use kie_core::ALL_ROLES;
use kie_core::SemanticRole;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::lexicon::RoleLexicon;
use crate::loader::tokenize;
use crate::table::CellValue;
use crate::table::Column;
use crate::table::ColumnType;
use crate::table::DataTable;
use crate::table::coefficient_of_variation;
use crate::table::mean;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Keyword-overlap score at which a match counts as strong.
const STRONG_MATCH_SCORE: f64 = 0.34;

/// Uniqueness ratio above which an integer column reads as an identifier.
const ID_UNIQUE_RATIO: f64 = 0.99;

/// Mean above which a low-variance integer column reads as a geographic code.
const GEO_CODE_MEAN_FLOOR: f64 = 10_000.0;

/// Coefficient of variation below which a geographic code reads as such.
const GEO_CODE_CV_CEILING: f64 = 0.25;

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// Tier at which a role assignment was decided.
///
/// # Invariants
/// - Variants are stable for serialization and evidence explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingTier {
    /// Spec override; absolute precedence.
    Override,
    /// Tier 1: semantic keyword match.
    KeywordMatch,
    /// Tier 2: identifier avoidance filtered the candidate set.
    IdentifierAvoidance,
    /// Tier 3: value-range (rate) signature decided among ties.
    RateSignature,
    /// Tier 4: coefficient-of-variation tie-breaker (or type-affinity fallback).
    StatisticalVitality,
}

/// One decided role assignment.
///
/// # Invariants
/// - `column` exists in the mapped table.
/// - `score` lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Chosen column name.
    pub column: String,
    /// Tier at which the decision was made.
    pub tier: MappingTier,
    /// Keyword-overlap score of the chosen column for this role.
    pub score: f64,
}

/// Override entry discarded because its column does not exist.
///
/// # Invariants
/// - Recorded whenever an override falls back to inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredOverride {
    /// Role the override named.
    pub role: SemanticRole,
    /// Non-existent column the override referenced.
    pub column: String,
}

/// Complete mapping output.
///
/// # Invariants
/// - A role appears either in `assignments` or in `unassigned_roles`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Decided assignments per role.
    pub assignments: BTreeMap<SemanticRole, RoleAssignment>,
    /// Roles no column could fill.
    pub unassigned_roles: Vec<SemanticRole>,
    /// Override entries ignored because their column is missing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides_ignored: Vec<IgnoredOverride>,
}

impl ColumnMapping {
    /// Returns the column mapped to a role, when assigned.
    #[must_use]
    pub fn column_for(&self, role: SemanticRole) -> Option<&str> {
        self.assignments.get(&role).map(|assignment| assignment.column.as_str())
    }

    /// Returns the roles whose mapped column equals `column`.
    #[must_use]
    pub fn roles_of(&self, column: &str) -> Vec<SemanticRole> {
        self.assignments
            .iter()
            .filter(|(_, assignment)| assignment.column == column)
            .map(|(role, _)| *role)
            .collect()
    }
}

// ============================================================================
// SECTION: Mapping
// ============================================================================

/// Scored candidate column for one role.
#[derive(Debug, Clone)]
struct Candidate {
    /// Column index in source order.
    index: usize,
    /// Column name.
    name: String,
    /// Keyword-overlap score in `[0, 1]`.
    score: f64,
    /// Count of matched keywords (tie strength).
    strength: usize,
    /// Coefficient of variation, when defined.
    cv: Option<f64>,
    /// Rate-range signature (all values in `[0, 1]`).
    rate_signature: bool,
}

/// Maps roles to columns, honoring overrides and applying the four tiers.
#[must_use]
pub fn map_columns(
    table: &DataTable,
    overrides: Option<&BTreeMap<SemanticRole, String>>,
    lexicon: &RoleLexicon,
) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();
    let mut taken: Vec<String> = Vec::new();

    for role in ALL_ROLES {
        if let Some(overridden) = overrides.and_then(|map| map.get(&role)) {
            if table.has_column(overridden) {
                taken.push(overridden.clone());
                mapping.assignments.insert(
                    role,
                    RoleAssignment {
                        column: overridden.clone(),
                        tier: MappingTier::Override,
                        score: 1.0,
                    },
                );
                continue;
            }
            debug!(role = role.as_str(), column = %overridden, "override ignored");
            mapping.overrides_ignored.push(IgnoredOverride {
                role,
                column: overridden.clone(),
            });
        }

        match infer_role(table, role, lexicon, &taken) {
            Some(assignment) => {
                taken.push(assignment.column.clone());
                mapping.assignments.insert(role, assignment);
            }
            None => mapping.unassigned_roles.push(role),
        }
    }
    mapping
}

/// Infers the column for one role through tiers 1–4.
fn infer_role(
    table: &DataTable,
    role: SemanticRole,
    lexicon: &RoleLexicon,
    taken: &[String],
) -> Option<RoleAssignment> {
    let eligible: Vec<&Column> = table
        .columns
        .iter()
        .filter(|column| !taken.contains(&column.name))
        .filter(|column| column_eligible(column, role))
        .collect();
    if eligible.is_empty() {
        return None;
    }

    let mut candidates: Vec<Candidate> = eligible
        .iter()
        .enumerate()
        .map(|(index, column)| score_candidate(index, column, role, lexicon))
        .collect();

    // Tier 2: identifier avoidance for measure roles.
    let mut avoided = false;
    if role.is_measure() {
        let before = candidates.len();
        let rejected: Vec<usize> = eligible
            .iter()
            .enumerate()
            .filter(|(_, column)| id_like_signature(column))
            .map(|(index, _)| index)
            .collect();
        candidates.retain(|candidate| !rejected.contains(&candidate.index));
        avoided = candidates.len() < before;
        if candidates.is_empty() {
            return None;
        }
    }

    let scored: Vec<&Candidate> =
        candidates.iter().filter(|candidate| candidate.score > 0.0).collect();

    // Tier 1: unique strong keyword winner.
    if let Some(winner) = unique_strong_winner(&scored) {
        let tier = if avoided {
            MappingTier::IdentifierAvoidance
        } else {
            MappingTier::KeywordMatch
        };
        return Some(RoleAssignment {
            column: winner.name.clone(),
            tier,
            score: winner.score,
        });
    }

    if scored.is_empty() {
        return fallback_by_type(&candidates, role);
    }

    // Tiers 3 and 4 resolve ties among the top-scoring candidates.
    let top = scored.iter().copied().max_by(|a, b| compare_score(a, b))?;
    let tied: Vec<&Candidate> = scored
        .iter()
        .copied()
        .filter(|candidate| compare_score(candidate, top).is_eq())
        .collect();

    if role.expects_rate()
        && let Some(rate_winner) = tied.iter().find(|candidate| candidate.rate_signature)
    {
        return Some(RoleAssignment {
            column: rate_winner.name.clone(),
            tier: MappingTier::RateSignature,
            score: rate_winner.score,
        });
    }

    if tied.len() == 1 {
        let winner = tied[0];
        let tier = if avoided {
            MappingTier::IdentifierAvoidance
        } else {
            MappingTier::KeywordMatch
        };
        return Some(RoleAssignment {
            column: winner.name.clone(),
            tier,
            score: winner.score,
        });
    }

    let winner = tied
        .iter()
        .max_by(|a, b| {
            let a_cv = a.cv.unwrap_or(0.0);
            let b_cv = b.cv.unwrap_or(0.0);
            a_cv.total_cmp(&b_cv)
                .then(a.strength.cmp(&b.strength))
                .then(b.index.cmp(&a.index))
        })?;
    Some(RoleAssignment {
        column: winner.name.clone(),
        tier: MappingTier::StatisticalVitality,
        score: winner.score,
    })
}

/// Compares candidates by keyword score, then matched-keyword strength.
fn compare_score(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    a.score.total_cmp(&b.score).then(a.strength.cmp(&b.strength))
}

/// Finds a strictly dominant strong-match candidate.
fn unique_strong_winner<'a>(scored: &[&'a Candidate]) -> Option<&'a Candidate> {
    let best = scored.iter().copied().max_by(|a, b| compare_score(a, b))?;
    if best.score < STRONG_MATCH_SCORE {
        return None;
    }
    let dominated = scored
        .iter()
        .filter(|candidate| candidate.index != best.index)
        .all(|candidate| compare_score(candidate, best).is_lt());
    if dominated { Some(best) } else { None }
}

/// Type-affinity fallback when no keyword evidence exists.
fn fallback_by_type(candidates: &[Candidate], role: SemanticRole) -> Option<RoleAssignment> {
    match role {
        SemanticRole::Date | SemanticRole::Category => {
            let first = candidates.iter().min_by_key(|candidate| candidate.index)?;
            Some(RoleAssignment {
                column: first.name.clone(),
                tier: MappingTier::StatisticalVitality,
                score: 0.0,
            })
        }
        _ => None,
    }
}

/// Scores a column against the role's keyword set.
fn score_candidate(
    index: usize,
    column: &Column,
    role: SemanticRole,
    lexicon: &RoleLexicon,
) -> Candidate {
    let tokens = tokenize(&column.name);
    let matched = tokens.iter().filter(|token| lexicon.contains(role, token)).count();
    let score = if tokens.is_empty() {
        0.0
    } else {
        matched as f64 / tokens.len() as f64
    };
    let numbers = column.numeric_values();
    Candidate {
        index,
        name: column.name.clone(),
        score,
        strength: matched,
        cv: coefficient_of_variation(&numbers),
        rate_signature: column.has_rate_signature(),
    }
}

/// Returns true when the column is type-eligible for the role.
fn column_eligible(column: &Column, role: SemanticRole) -> bool {
    if column.values.iter().all(CellValue::is_null) {
        return false;
    }
    match role {
        SemanticRole::Revenue
        | SemanticRole::Cost
        | SemanticRole::Margin
        | SemanticRole::Quantity => column.column_type == ColumnType::Numeric,
        SemanticRole::Date => column.column_type == ColumnType::Datetime,
        SemanticRole::Category => column.column_type == ColumnType::Categorical,
        SemanticRole::Region | SemanticRole::Geo => matches!(
            column.column_type,
            ColumnType::Categorical | ColumnType::Textual
        ),
        SemanticRole::Id => column.column_type == ColumnType::Identifier,
    }
}

/// Returns true for numeric columns exhibiting identifier signatures.
fn id_like_signature(column: &Column) -> bool {
    let tokens = tokenize(&column.name);
    let id_keyword = tokens
        .iter()
        .any(|token| matches!(token.as_str(), "id" | "code" | "zip" | "fips" | "key"));
    if id_keyword {
        return true;
    }
    if column.is_monotone_int() && column.unique_ratio() >= ID_UNIQUE_RATIO {
        return true;
    }
    let numbers = column.numeric_values();
    let integral = column
        .values
        .iter()
        .all(|value| !matches!(value, CellValue::Float(float) if float.fract() != 0.0));
    if let (Some(center), Some(cv)) = (mean(&numbers), coefficient_of_variation(&numbers)) {
        return integral && center > GEO_CODE_MEAN_FLOOR && cv < GEO_CODE_CV_CEILING;
    }
    false
}
