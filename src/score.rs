/*!
 * Revenue Health Score engine
 *
 * Scores one practice against its specialty benchmark across five weighted
 * factors, producing a 0-100 score with a tier label and an estimated
 * population percentile. Pure and deterministic: identical inputs always
 * produce identical output, and no input is ever mutated.
 */

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DISTINCT_CODES;
use crate::data_types::{PracticeProfile, Program, SpecialtyBenchmark};

/// Factor weights. The five weights sum to 1.0.
pub const W_CODING: f64 = 0.25;
pub const W_PROGRAMS: f64 = 0.25;
pub const W_REVENUE: f64 = 0.20;
pub const W_DIVERSITY: f64 = 0.15;
pub const W_VOLUME: f64 = 0.15;

/// Assigned when a factor has no signal to score (no evaluation visits, or
/// no program relevant to the specialty).
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Cap on the practice-to-benchmark visit-mix ratio.
pub const EM_RATIO_CAP: f64 = 1.2;

/// Floor applied to benchmark visit-mix percentages before division.
pub const BENCHMARK_PCT_FLOOR: f64 = 0.01;

/// Mid/high complexity mix inside the coding factor.
pub const EM_MID_WEIGHT: f64 = 0.6;
pub const EM_HIGH_WEIGHT: f64 = 0.4;

/// Benchmark adoption rate below which a program is irrelevant to the
/// specialty and excluded from the utilization factor.
pub const PROGRAM_RELEVANCE_FLOOR: f64 = 0.01;

/// Cap on the revenue-efficiency and revenue-per-patient ratios; scores
/// scale by `100 / EFFICIENCY_RATIO_CAP` so the cap maps to 100.
pub const EFFICIENCY_RATIO_CAP: f64 = 1.5;

/// Service-diversity step table: minimum distinct codes, awarded score.
pub const DIVERSITY_STEPS: [(u32, f64); 5] =
    [(20, 100.0), (15, 85.0), (10, 70.0), (6, 55.0), (3, 35.0)];

/// Score when fewer than three distinct codes are billed.
pub const DIVERSITY_FLOOR_SCORE: f64 = 15.0;

/// Relative point weight of each program inside the utilization factor.
/// The weights are relative shares, not percentages.
pub fn program_points(program: Program) -> f64 {
    match program {
        Program::Ccm => 25.0,
        Program::Rpm => 20.0,
        Program::Bhi => 15.0,
        Program::Awv => 40.0,
    }
}

/// Divide with a caller-specified fallback for non-positive denominators.
///
/// Every division in the engines goes through this helper; there are no
/// exceptional control paths in the core.
pub fn safe_divide(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator <= 0.0 || denominator.is_nan() {
        fallback
    } else {
        numerator / denominator
    }
}

/// Clamp a sub-score into the 0-100 range.
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Tier label for a Revenue Health Score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreTier {
    Elite,
    Strong,
    Average,
    BelowAverage,
    Critical,
}

/// Ordered tier table: minimum score, tier. First matching row wins.
pub const TIER_TABLE: [(f64, ScoreTier); 5] = [
    (90.0, ScoreTier::Elite),
    (75.0, ScoreTier::Strong),
    (60.0, ScoreTier::Average),
    (40.0, ScoreTier::BelowAverage),
    (0.0, ScoreTier::Critical),
];

impl ScoreTier {
    /// Tier for an overall score
    pub fn from_score(score: f64) -> Self {
        for (floor, tier) in TIER_TABLE {
            if score >= floor {
                return tier;
            }
        }
        ScoreTier::Critical
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreTier::Elite => "Elite",
            ScoreTier::Strong => "Strong",
            ScoreTier::Average => "Average",
            ScoreTier::BelowAverage => "Below Average",
            ScoreTier::Critical => "Critical",
        }
    }

    /// Lowest overall score that maps into this tier
    pub fn min_score(&self) -> f64 {
        match self {
            ScoreTier::Elite => 90.0,
            ScoreTier::Strong => 75.0,
            ScoreTier::Average => 60.0,
            ScoreTier::BelowAverage => 40.0,
            ScoreTier::Critical => 0.0,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScoreTier::Elite => "Capturing nearly all available revenue for the specialty",
            ScoreTier::Strong => "Ahead of most peers with modest remaining upside",
            ScoreTier::Average => "In line with peers; clear optimization opportunities remain",
            ScoreTier::BelowAverage => "Trailing the peer group across multiple factors",
            ScoreTier::Critical => "Substantial unrealized revenue relative to peers",
        }
    }
}

impl std::fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Five-factor score breakdown. Derived and ephemeral: recomputed per
/// request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Visit-complexity coding vs. the peer mix
    pub coding_optimization: f64,
    /// Share of specialty-relevant program points the practice earns
    pub program_utilization: f64,
    /// Actual vs. expected payment at the practice's patient volume
    pub revenue_efficiency: f64,
    /// Breadth of distinct billing codes
    pub service_diversity: f64,
    /// Revenue per patient vs. the peer average
    pub patient_volume: f64,
    /// Weighted, rounded combination of the five factors
    pub overall: f64,
    pub tier: ScoreTier,
}

/// Compute the Revenue Health Score for one practice against its benchmark.
///
/// `distinct_codes` overrides the profile's own code count when the caller
/// has fresher code-level data; when both are absent a midrange default is
/// assumed.
pub fn score_practice(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
    distinct_codes: Option<u32>,
) -> ScoreBreakdown {
    let codes = distinct_codes
        .or(profile.distinct_codes)
        .unwrap_or(DEFAULT_DISTINCT_CODES);

    let coding_optimization = coding_optimization_score(profile, benchmark);
    let program_utilization = program_utilization_score(profile, benchmark);
    let revenue_efficiency = revenue_efficiency_score(profile, benchmark);
    let service_diversity = service_diversity_score(codes);
    let patient_volume = patient_volume_score(profile, benchmark);

    let overall = clamp_score(
        (coding_optimization * W_CODING
            + program_utilization * W_PROGRAMS
            + revenue_efficiency * W_REVENUE
            + service_diversity * W_DIVERSITY
            + patient_volume * W_VOLUME)
            .round(),
    );

    ScoreBreakdown {
        coding_optimization,
        program_utilization,
        revenue_efficiency,
        service_diversity,
        patient_volume,
        overall,
        tier: ScoreTier::from_score(overall),
    }
}

/// Visit-complexity coding factor.
///
/// Practices with no evaluation visits at all (purely procedural
/// specialties) score a neutral 50 rather than being penalized.
pub fn coding_optimization_score(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
) -> f64 {
    if profile.em_total() == 0 {
        return NEUTRAL_SCORE;
    }

    let ratio_mid = (profile.pct_99214()
        / benchmark.pct_99214.max(BENCHMARK_PCT_FLOOR))
    .min(EM_RATIO_CAP);
    let ratio_high = (profile.pct_99215()
        / benchmark.pct_99215.max(BENCHMARK_PCT_FLOOR))
    .min(EM_RATIO_CAP);

    clamp_score((EM_MID_WEIGHT * ratio_mid + EM_HIGH_WEIGHT * ratio_high) * 100.0)
}

/// Program-utilization factor.
///
/// A program only counts when at least 1% of the specialty's peers bill it;
/// specialties with no relevant program score a neutral 50.
pub fn program_utilization_score(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
) -> f64 {
    let mut relevant_points = 0.0;
    let mut earned_points = 0.0;

    for program in Program::ALL {
        if benchmark.adoption_rate(program) >= PROGRAM_RELEVANCE_FLOOR {
            let points = program_points(program);
            relevant_points += points;
            if profile.bills(program) {
                earned_points += points;
            }
        }
    }

    if relevant_points == 0.0 {
        return NEUTRAL_SCORE;
    }
    clamp_score(earned_points / relevant_points * 100.0)
}

/// Revenue-efficiency factor: actual payment against the payment a peer of
/// the same patient volume would collect.
pub fn revenue_efficiency_score(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
) -> f64 {
    let patient_ratio = safe_divide(
        profile.total_patients as f64,
        benchmark.avg_patients,
        0.0,
    );
    let expected_payment = patient_ratio * benchmark.avg_total_payment;
    let ratio = safe_divide(profile.total_payment, expected_payment, 0.0)
        .min(EFFICIENCY_RATIO_CAP);

    clamp_score(ratio * (100.0 / EFFICIENCY_RATIO_CAP))
}

/// Service-diversity factor: stepwise lookup on distinct billing codes.
pub fn service_diversity_score(distinct_codes: u32) -> f64 {
    for (min_codes, score) in DIVERSITY_STEPS {
        if distinct_codes >= min_codes {
            return score;
        }
    }
    DIVERSITY_FLOOR_SCORE
}

/// Revenue-per-patient factor against the peer average.
pub fn patient_volume_score(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
) -> f64 {
    let actual_per_patient = safe_divide(
        profile.total_payment,
        profile.total_patients as f64,
        0.0,
    );
    let benchmark_per_patient = benchmark.avg_revenue_per_patient.max(1.0);
    let ratio = (actual_per_patient / benchmark_per_patient).min(EFFICIENCY_RATIO_CAP);

    clamp_score(ratio * (100.0 / EFFICIENCY_RATIO_CAP))
}

// Percentile curve segment constants: base percentile and slope per score
// band. The curve is continuous across the four anchors at 90/75/60/40.
pub const PCTL_ELITE_BASE: f64 = 95.0;
pub const PCTL_ELITE_SLOPE: f64 = 0.5;
pub const PCTL_STRONG_BASE: f64 = 80.0;
pub const PCTL_STRONG_SLOPE: f64 = 1.0;
pub const PCTL_AVERAGE_BASE: f64 = 60.0;
pub const PCTL_AVERAGE_SLOPE: f64 = 20.0 / 15.0;
pub const PCTL_BELOW_BASE: f64 = 30.0;
pub const PCTL_BELOW_SLOPE: f64 = 1.5;
pub const PCTL_TAIL_SLOPE: f64 = 0.75;

/// Estimate the population percentile for an overall score.
///
/// This is a fixed piecewise-linear approximation anchored at the tier cut
/// points, not a fit against an observed score distribution.
pub fn estimate_percentile(overall: f64) -> u8 {
    let score = overall.clamp(0.0, 100.0);
    let percentile = if score >= 90.0 {
        PCTL_ELITE_BASE + (score - 90.0) * PCTL_ELITE_SLOPE
    } else if score >= 75.0 {
        PCTL_STRONG_BASE + (score - 75.0) * PCTL_STRONG_SLOPE
    } else if score >= 60.0 {
        PCTL_AVERAGE_BASE + (score - 60.0) * PCTL_AVERAGE_SLOPE
    } else if score >= 40.0 {
        PCTL_BELOW_BASE + (score - 40.0) * PCTL_BELOW_SLOPE
    } else {
        score * PCTL_TAIL_SLOPE
    };

    percentile.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{PracticeId, ProgramActivity};

    fn benchmark() -> SpecialtyBenchmark {
        SpecialtyBenchmark {
            specialty: "Cardiology".to_string(),
            provider_count: 1_200,
            avg_patients: 380.0,
            avg_revenue_per_patient: 820.0,
            avg_total_payment: 311_600.0,
            avg_total_services: 2_400.0,
            pct_99213: 0.35,
            pct_99214: 0.50,
            pct_99215: 0.15,
            ccm_adoption: 0.22,
            rpm_adoption: 0.08,
            bhi_adoption: 0.03,
            awv_adoption: 0.41,
            chronic_prevalence: Some(0.6),
            last_refreshed: None,
        }
    }

    fn profile() -> PracticeProfile {
        PracticeProfile {
            id: PracticeId("P001".to_string()),
            specialty: "Cardiology".to_string(),
            state: "TX".to_string(),
            city: None,
            total_patients: 400,
            total_services: 2_500,
            total_payment: 310_000.0,
            em_99213: 350,
            em_99214: 500,
            em_99215: 150,
            ccm: ProgramActivity { services: 120, payment: 7_400.0 },
            rpm: ProgramActivity::default(),
            bhi: ProgramActivity::default(),
            awv: ProgramActivity { services: 60, payment: 10_500.0 },
            distinct_codes: Some(14),
            last_refreshed: None,
        }
    }

    #[test]
    fn test_all_factors_in_range() {
        let breakdown = score_practice(&profile(), &benchmark(), None);
        for value in [
            breakdown.coding_optimization,
            breakdown.program_utilization,
            breakdown.revenue_efficiency,
            breakdown.service_diversity,
            breakdown.patient_volume,
            breakdown.overall,
        ] {
            assert!((0.0..=100.0).contains(&value), "factor out of range: {}", value);
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let a = score_practice(&profile(), &benchmark(), Some(14));
        let b = score_practice(&profile(), &benchmark(), Some(14));
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_evaluation_visits_scores_neutral() {
        let procedural = PracticeProfile {
            em_99213: 0,
            em_99214: 0,
            em_99215: 0,
            ..profile()
        };
        assert_eq!(coding_optimization_score(&procedural, &benchmark()), NEUTRAL_SCORE);
    }

    #[test]
    fn test_no_relevant_programs_scores_neutral() {
        let niche = SpecialtyBenchmark {
            ccm_adoption: 0.004,
            rpm_adoption: 0.0,
            bhi_adoption: 0.009,
            awv_adoption: 0.002,
            ..benchmark()
        };
        assert_eq!(program_utilization_score(&profile(), &niche), NEUTRAL_SCORE);
    }

    #[test]
    fn test_matching_peer_mix_contributes_full_mid_weight() {
        // 500 of 1000 visits at mid complexity against a 0.50 benchmark:
        // the mid ratio is exactly 1.0, under the 1.2 cap.
        let matched = PracticeProfile {
            em_99213: 400,
            em_99214: 500,
            em_99215: 100,
            ..profile()
        };
        let bench = SpecialtyBenchmark { pct_99215: 0.10, ..benchmark() };
        let score = coding_optimization_score(&matched, &bench);
        // 0.6 * 1.0 + 0.4 * 1.0 = 1.0 => 100
        assert_eq!(score, 100.0);

        // Remove the high-complexity visits entirely: only the mid term is
        // left, contributing its 0.6 weight.
        let mid_only = PracticeProfile {
            em_99213: 500,
            em_99214: 500,
            em_99215: 0,
            ..profile()
        };
        let score = coding_optimization_score(&mid_only, &bench);
        assert_eq!(score, 60.0);
    }

    #[test]
    fn test_em_ratio_is_capped() {
        // Practice bills 90% at mid complexity against a 0.50 benchmark:
        // 1.8 ratio capped to 1.2.
        let heavy = PracticeProfile {
            em_99213: 50,
            em_99214: 900,
            em_99215: 50,
            ..profile()
        };
        let score = coding_optimization_score(&heavy, &benchmark());
        assert!(score <= 100.0);
        let mid_term = EM_MID_WEIGHT * EM_RATIO_CAP * 100.0;
        assert!(score >= mid_term.min(100.0) - 1e-9);
    }

    #[test]
    fn test_service_diversity_steps() {
        assert_eq!(service_diversity_score(25), 100.0);
        assert_eq!(service_diversity_score(20), 100.0);
        assert_eq!(service_diversity_score(19), 85.0);
        assert_eq!(service_diversity_score(12), 70.0);
        assert_eq!(service_diversity_score(7), 55.0);
        assert_eq!(service_diversity_score(4), 35.0);
        assert_eq!(service_diversity_score(2), 15.0);
    }

    #[test]
    fn test_safe_divide_fallbacks() {
        assert_eq!(safe_divide(10.0, 2.0, 0.0), 5.0);
        assert_eq!(safe_divide(10.0, 0.0, 0.5), 0.5);
        assert_eq!(safe_divide(10.0, -3.0, 0.0), 0.0);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ScoreTier::from_score(95.0), ScoreTier::Elite);
        assert_eq!(ScoreTier::from_score(90.0), ScoreTier::Elite);
        assert_eq!(ScoreTier::from_score(89.0), ScoreTier::Strong);
        assert_eq!(ScoreTier::from_score(60.0), ScoreTier::Average);
        assert_eq!(ScoreTier::from_score(59.0), ScoreTier::BelowAverage);
        assert_eq!(ScoreTier::from_score(12.0), ScoreTier::Critical);
    }

    #[test]
    fn test_percentile_curve_is_monotonic_and_anchored() {
        assert_eq!(estimate_percentile(100.0), 100);
        assert_eq!(estimate_percentile(90.0), 95);
        assert_eq!(estimate_percentile(75.0), 80);
        assert_eq!(estimate_percentile(60.0), 60);
        assert_eq!(estimate_percentile(40.0), 30);
        assert_eq!(estimate_percentile(0.0), 0);

        let mut last = 0;
        for score in 0..=100 {
            let p = estimate_percentile(score as f64);
            assert!(p >= last, "percentile dipped at score {}", score);
            last = p;
        }
    }
}
