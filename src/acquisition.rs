/*!
 * Acquisition opportunity engine
 *
 * Scores how attractive a practice is as an investment or optimization
 * target. This is the inverse lens of the Revenue Health Score: a weak
 * health score with a solid patient base means upside, and the engine
 * quantifies that upside in points and projected dollars.
 */

use serde::{Deserialize, Serialize};

use crate::data_types::{PracticeProfile, Program, SpecialtyBenchmark};
use crate::score::{clamp_score, score_practice, ScoreBreakdown};

/// Factor weights. The four weights sum to 1.0.
pub const W_UPSIDE: f64 = 0.35;
pub const W_PATIENT_BASE: f64 = 0.25;
pub const W_READINESS: f64 = 0.25;
pub const W_MARKET: f64 = 0.15;

/// Cap on the patient-base ratio before scaling.
pub const PATIENT_BASE_RATIO_CAP: f64 = 2.0;

/// Scale applied to the capped patient-base ratio (cap maps to 100).
pub const PATIENT_BASE_SCALE: f64 = 50.0;

/// Points earned per missing-but-relevant program.
pub const MISSING_PROGRAM_POINTS: f64 = 22.0;

/// Coding-lag bonuses: mid-complexity share trailing the benchmark by more
/// than 10 points earns the major bonus, more than 5 the minor one.
pub const CODING_LAG_MAJOR: f64 = 0.10;
pub const CODING_LAG_MAJOR_POINTS: f64 = 15.0;
pub const CODING_LAG_MINOR: f64 = 0.05;
pub const CODING_LAG_MINOR_POINTS: f64 = 8.0;

/// Post-optimization revenue capture, as a multiple of the benchmark
/// revenue per patient. A flat business assumption, not a fitted constant.
pub const CAPTURE_FACTOR: f64 = 1.15;

/// Benchmark adoption rate above which a program the practice does not bill
/// counts toward optimization readiness. AWV carries a higher bar because
/// near-universal programs say little about readiness.
pub fn readiness_threshold(program: Program) -> f64 {
    match program {
        Program::Ccm => 0.02,
        Program::Rpm => 0.01,
        Program::Bhi => 0.01,
        Program::Awv => 0.05,
    }
}

/// Patient-volume multiplier applied to the health-score gap.
pub fn patient_volume_multiplier(patients: u32) -> f64 {
    if patients >= 200 {
        1.3
    } else if patients >= 100 {
        1.1
    } else if patients >= 50 {
        1.0
    } else {
        0.7
    }
}

/// Tier label for an acquisition score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcquisitionTier {
    PrimeTarget,
    StrongCandidate,
    WorthEvaluating,
    Marginal,
    LowPriority,
}

impl AcquisitionTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            AcquisitionTier::PrimeTarget
        } else if score >= 65.0 {
            AcquisitionTier::StrongCandidate
        } else if score >= 50.0 {
            AcquisitionTier::WorthEvaluating
        } else if score >= 35.0 {
            AcquisitionTier::Marginal
        } else {
            AcquisitionTier::LowPriority
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AcquisitionTier::PrimeTarget => "Prime Target",
            AcquisitionTier::StrongCandidate => "Strong Candidate",
            AcquisitionTier::WorthEvaluating => "Worth Evaluating",
            AcquisitionTier::Marginal => "Marginal",
            AcquisitionTier::LowPriority => "Low Priority",
        }
    }
}

impl std::fmt::Display for AcquisitionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Four-factor acquisition breakdown with the projected dollar upside.
/// Derived and ephemeral, like [`ScoreBreakdown`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionBreakdown {
    /// Health-score gap scaled by patient volume
    pub upside_potential: f64,
    /// Patient base relative to the peer average
    pub patient_base_value: f64,
    /// Missing-but-relevant programs and coding lag
    pub optimization_readiness: f64,
    /// Peer-market size and the practice's own revenue scale
    pub market_position: f64,
    /// Weighted, rounded combination of the four factors
    pub overall: f64,
    pub tier: AcquisitionTier,
    /// Projected annual revenue after optimization
    pub projected_revenue: f64,
    /// Dollar gap between projected and current revenue (never negative)
    pub estimated_upside: f64,
    /// Upside as a rounded percentage of current revenue (0 when the
    /// practice has no current payment)
    pub revenue_increase_pct: f64,
    /// The health score this breakdown was derived from
    pub score: ScoreBreakdown,
}

/// Evaluate one practice as an acquisition target.
pub fn evaluate_acquisition(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
    distinct_codes: Option<u32>,
) -> AcquisitionBreakdown {
    let score = score_practice(profile, benchmark, distinct_codes);
    let score_gap = 100.0 - score.overall;

    let upside_potential = upside_potential_score(score_gap, profile.total_patients);
    let patient_base_value = patient_base_score(profile, benchmark);
    let optimization_readiness = optimization_readiness_score(profile, benchmark);
    let market_position = market_position_score(profile, benchmark);

    let overall = clamp_score(
        (upside_potential * W_UPSIDE
            + patient_base_value * W_PATIENT_BASE
            + optimization_readiness * W_READINESS
            + market_position * W_MARKET)
            .round(),
    );

    let projected_revenue =
        profile.total_patients as f64 * benchmark.avg_revenue_per_patient * CAPTURE_FACTOR;
    let estimated_upside = (projected_revenue - profile.total_payment).max(0.0);
    let revenue_increase_pct = if profile.total_payment > 0.0 {
        (estimated_upside / profile.total_payment * 100.0).round()
    } else {
        0.0
    };

    AcquisitionBreakdown {
        upside_potential,
        patient_base_value,
        optimization_readiness,
        market_position,
        overall,
        tier: AcquisitionTier::from_score(overall),
        projected_revenue,
        estimated_upside,
        revenue_increase_pct,
        score,
    }
}

/// Upside factor: the health-score gap, amplified or damped by patient
/// volume. A low score at a 30-patient practice is not worth much.
pub fn upside_potential_score(score_gap: f64, patients: u32) -> f64 {
    clamp_score(score_gap * patient_volume_multiplier(patients))
}

/// Patient-base factor: panel size relative to the peer average, capped at
/// twice the average.
pub fn patient_base_score(profile: &PracticeProfile, benchmark: &SpecialtyBenchmark) -> f64 {
    let ratio = (profile.total_patients as f64 / benchmark.avg_patients.max(1.0))
        .min(PATIENT_BASE_RATIO_CAP);
    clamp_score(ratio * PATIENT_BASE_SCALE)
}

/// Readiness factor: each program the practice skips while peers
/// meaningfully bill it, plus a bonus when mid-complexity coding trails the
/// benchmark.
pub fn optimization_readiness_score(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
) -> f64 {
    let mut points = 0.0;

    for program in Program::ALL {
        if !profile.bills(program)
            && benchmark.adoption_rate(program) > readiness_threshold(program)
        {
            points += MISSING_PROGRAM_POINTS;
        }
    }

    let coding_lag = benchmark.pct_99214 - profile.pct_99214();
    if coding_lag > CODING_LAG_MAJOR {
        points += CODING_LAG_MAJOR_POINTS;
    } else if coding_lag > CODING_LAG_MINOR {
        points += CODING_LAG_MINOR_POINTS;
    }

    clamp_score(points)
}

/// Market-position factor: demand from the peer-population size plus a
/// revenue-scale bonus from the practice's own payment volume.
pub fn market_position_score(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
) -> f64 {
    let demand = if benchmark.provider_count > 20_000 {
        70.0
    } else if benchmark.provider_count > 10_000 {
        55.0
    } else if benchmark.provider_count > 5_000 {
        40.0
    } else {
        30.0
    };

    let revenue_bonus = if profile.total_payment > 100_000.0 {
        30.0
    } else if profile.total_payment > 50_000.0 {
        20.0
    } else {
        10.0
    };

    clamp_score(demand + revenue_bonus)
}
