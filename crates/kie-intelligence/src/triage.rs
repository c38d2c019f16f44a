// crates/kie-intelligence/src/triage.rs
// ============================================================================
// Module: Insight Triage
// Description: Deduplication, suppression, entailment merging, and priority.
// Purpose: Decide which insights deserve a chart, and record why not.
// Dependencies: crate::{analyzer, lexicon, loader, mapper}, kie-config, kie-core
// ============================================================================

//! ## Overview
//! Triage tags every raw insight `keep`, `suppressed`, or `merged`, with a
//! priority score `α·magnitude + β·confidence + γ·relevance` whose weights
//! come from configuration. Relevance is the cosine overlap between the
//! objective's tokens and the insight's column/role vocabulary. Suppressed
//! insights are persisted with their reasons, never deleted, so the planner
//! can explain omissions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use kie_config::TriageConfig;
use kie_core::InsightId;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::analyzer::InsightKind;
use crate::analyzer::RawInsight;
use crate::lexicon::RoleLexicon;
use crate::loader::tokenize;
use crate::mapper::ColumnMapping;

// ============================================================================
// SECTION: Triage Types
// ============================================================================

/// Disposition of one insight after triage.
///
/// # Invariants
/// - Variants are stable for serialization; reasons are human-readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriageStatus {
    /// The insight is fit for rendering.
    Keep,
    /// The insight is unfit for rendering; persisted with its reason.
    Suppressed {
        /// Why the insight was suppressed.
        reason: String,
    },
    /// The insight restates another; merged into it.
    MergedInto {
        /// Identifier of the surviving insight.
        id: InsightId,
    },
}

/// Triage outcome for one insight.
///
/// # Invariants
/// - `priority` and `relevance` lie in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageEntry {
    /// Insight the entry refers to.
    pub id: InsightId,
    /// Disposition.
    #[serde(flatten)]
    pub status: TriageStatus,
    /// Weighted priority score.
    pub priority: f64,
    /// Objective-relevance component of the priority.
    pub relevance: f64,
}

/// Raw insights together with their triage, persisted as one artifact.
///
/// # Invariants
/// - `triage` has exactly one entry per insight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightCatalog {
    /// Raw insights in generation order.
    pub insights: Vec<RawInsight>,
    /// Triage entries, one per insight.
    pub triage: Vec<TriageEntry>,
}

// ============================================================================
// SECTION: Triage
// ============================================================================

/// Entailment table: the second kind restates the first on shared columns.
const ENTAILMENTS: [(InsightKind, InsightKind); 3] = [
    (InsightKind::Comparison, InsightKind::Ranking),
    (InsightKind::Concentration, InsightKind::Ranking),
    (InsightKind::Correlation, InsightKind::Trend),
];

/// Triages raw insights against the objective.
#[must_use]
pub fn triage(
    insights: &[RawInsight],
    objective: &str,
    mapping: &ColumnMapping,
    lexicon: &RoleLexicon,
    config: &TriageConfig,
) -> Vec<TriageEntry> {
    let objective_tokens = objective_token_set(objective);
    let objective_columns = objective_relevant_columns(&objective_tokens, mapping, lexicon);

    let mut statuses: Vec<TriageStatus> = vec![TriageStatus::Keep; insights.len()];

    // Deduplicate: overlapping entity tuples with identical kind keep the
    // highest magnitude.
    for index in 0..insights.len() {
        if statuses[index] != TriageStatus::Keep {
            continue;
        }
        for other in index + 1..insights.len() {
            if statuses[other] != TriageStatus::Keep {
                continue;
            }
            let same_kind = insights[index].kind == insights[other].kind;
            if same_kind && entities_overlap(&insights[index], &insights[other]) {
                let (winner, loser) = if insights[other].magnitude > insights[index].magnitude {
                    (other, index)
                } else {
                    (index, other)
                };
                statuses[loser] = TriageStatus::MergedInto {
                    id: insights[winner].id.clone(),
                };
            }
        }
    }

    // Merge strict entailments: the entailed kind is a restatement of the
    // dominant one over a shared column set.
    for (dominant_kind, entailed_kind) in ENTAILMENTS {
        for index in 0..insights.len() {
            if statuses[index] != TriageStatus::Keep
                || insights[index].kind != entailed_kind
            {
                continue;
            }
            let entailed_columns: BTreeSet<&str> =
                insights[index].source_columns.iter().map(String::as_str).collect();
            let dominant = insights.iter().enumerate().find(|(other, insight)| {
                statuses[*other] == TriageStatus::Keep
                    && insight.kind == dominant_kind
                    && entailed_columns.is_subset(
                        &insight.source_columns.iter().map(String::as_str).collect(),
                    )
            });
            if let Some((_, dominant_insight)) = dominant {
                statuses[index] = TriageStatus::MergedInto {
                    id: dominant_insight.id.clone(),
                };
            }
        }
    }

    // Suppress by floors and objective relevance.
    for (index, insight) in insights.iter().enumerate() {
        if statuses[index] != TriageStatus::Keep {
            continue;
        }
        if insight.magnitude < config.magnitude_floor {
            statuses[index] = TriageStatus::Suppressed {
                reason: format!(
                    "magnitude {:.2} below floor {:.2}",
                    insight.magnitude, config.magnitude_floor
                ),
            };
            continue;
        }
        if insight.confidence < config.confidence_floor {
            statuses[index] = TriageStatus::Suppressed {
                reason: format!(
                    "confidence {:.2} below floor {:.2}",
                    insight.confidence, config.confidence_floor
                ),
            };
            continue;
        }
        if !objective_columns.is_empty()
            && !insight
                .source_columns
                .iter()
                .any(|column| objective_columns.contains(column.as_str()))
        {
            statuses[index] = TriageStatus::Suppressed {
                reason: "source columns are unrelated to the objective".to_string(),
            };
        }
    }

    let weight_sum = config.alpha + config.beta + config.gamma;
    let entries: Vec<TriageEntry> = insights
        .iter()
        .zip(statuses)
        .map(|(insight, status)| {
            let relevance = relevance(insight, &objective_tokens, mapping, lexicon);
            let priority = (config.alpha * insight.magnitude
                + config.beta * insight.confidence
                + config.gamma * relevance)
                / weight_sum;
            TriageEntry {
                id: insight.id.clone(),
                status,
                priority: round6(priority),
                relevance: round6(relevance),
            }
        })
        .collect();
    let kept = entries
        .iter()
        .filter(|entry| entry.status == TriageStatus::Keep)
        .count();
    debug!(total = entries.len(), kept, "triage complete");
    entries
}

/// Rounds to six decimals for stable serialization.
fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Returns true when two insights share at least one entity.
fn entities_overlap(left: &RawInsight, right: &RawInsight) -> bool {
    let left_set: BTreeSet<&str> = left.entities.iter().map(String::as_str).collect();
    right.entities.iter().any(|entity| left_set.contains(entity.as_str()))
}

// ============================================================================
// SECTION: Objective Relevance
// ============================================================================

/// Stopwords excluded from objective tokenization.
const STOPWORDS: [&str; 12] = [
    "the", "a", "an", "of", "and", "or", "to", "in", "for", "by", "on", "with",
];

/// Tokenizes the objective into a lowercase content-word set.
fn objective_token_set(objective: &str) -> BTreeSet<String> {
    objective
        .split(|ch: char| !ch.is_alphanumeric())
        .map(str::to_ascii_lowercase)
        .filter(|token| token.len() > 1 && !STOPWORDS.contains(&token.as_str()))
        .collect()
}

/// Columns mapped to roles the objective's vocabulary touches.
fn objective_relevant_columns<'a>(
    objective_tokens: &BTreeSet<String>,
    mapping: &'a ColumnMapping,
    lexicon: &RoleLexicon,
) -> BTreeSet<&'a str> {
    let mut columns = BTreeSet::new();
    for (role, assignment) in &mapping.assignments {
        let keywords = lexicon.keywords(*role);
        let touched = objective_tokens.iter().any(|token| keywords.contains(token));
        if touched {
            columns.insert(assignment.column.as_str());
        }
    }
    columns
}

/// Cosine overlap between objective tokens and the insight's vocabulary.
fn relevance(
    insight: &RawInsight,
    objective_tokens: &BTreeSet<String>,
    mapping: &ColumnMapping,
    lexicon: &RoleLexicon,
) -> f64 {
    if objective_tokens.is_empty() {
        return 0.0;
    }
    let mut insight_tokens: BTreeSet<String> = BTreeSet::new();
    for column in &insight.source_columns {
        insight_tokens.extend(tokenize(column));
        for role in mapping.roles_of(column) {
            insight_tokens.extend(lexicon.keywords(role));
        }
    }
    if insight_tokens.is_empty() {
        return 0.0;
    }
    let intersection = objective_tokens.intersection(&insight_tokens).count();
    let denominator = (objective_tokens.len() as f64).sqrt() * (insight_tokens.len() as f64).sqrt();
    if denominator < f64::EPSILON {
        return 0.0;
    }
    (intersection as f64 / denominator).min(1.0)
}
