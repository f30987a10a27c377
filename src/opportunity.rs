/*!
 * Revenue opportunity ranker
 *
 * Finds the highest-dollar-value missing opportunities for a geography,
 * specialty slice, or billing code: programs adopted below the reference
 * rate, and codes billed where a related higher-value code would apply.
 * Returns at most the top three, ranked by estimated annual value and
 * tagged with a sample-size confidence grade.
 */

use serde::{Deserialize, Serialize};

use crate::comparison::NationalRates;
use crate::data_types::{
    BillingCodeAggregate, Confidence, Program, SpecialtyBenchmark, StateAggregate,
    StateSpecialtyAggregate,
};
use crate::forecast::{combined_rate, AWV_VISIT_RATE};

/// Maximum opportunities returned per query.
pub const MAX_OPPORTUNITIES: usize = 3;

/// Services per provider per year assumed when valuing a code upgrade.
pub const ASSUMED_SERVICES_PER_PROVIDER: f64 = 20.0;

/// Annual wellness visits an adopting provider is assumed to perform.
pub const AWV_VISITS_PER_ADOPTER: f64 = 45.0;

/// Patients an adopting provider is assumed to enroll in a recurring
/// program.
pub fn assumed_patients_per_adopter(program: Program) -> f64 {
    match program {
        Program::Ccm => 15.0,
        Program::Rpm => 20.0,
        Program::Bhi => 10.0,
        Program::Awv => AWV_VISITS_PER_ADOPTER,
    }
}

/// Annual revenue one newly adopting provider is assumed to add.
pub fn annual_value_per_adopter(program: Program) -> f64 {
    match program {
        // Per-visit rate times assumed visit volume; AWV does not recur
        // monthly.
        Program::Awv => AWV_VISIT_RATE * AWV_VISITS_PER_ADOPTER,
        _ => combined_rate(program) * 12.0 * assumed_patients_per_adopter(program),
    }
}

/// Higher-value codes a billed code is compared against.
const RELATED_CODES: &[(&str, &[&str])] = &[
    ("99212", &["99213", "99214"]),
    ("99213", &["99214", "99215"]),
    ("99214", &["99215"]),
];

fn related_codes(code: &str) -> &'static [&'static str] {
    RELATED_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, related)| *related)
        .unwrap_or(&[])
}

/// What kind of gap an opportunity closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityCategory {
    /// A care-management program adopted below the reference rate
    Program(Program),
    /// A billing code with a related higher-value code
    CodingUpgrade,
}

/// One ranked revenue opportunity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueOpportunity {
    /// 1-based position after ranking by estimated revenue
    pub rank: u32,
    pub category: OpportunityCategory,
    /// Human-readable summary embedding the observed rates and counts
    pub description: String,
    /// Estimated annual dollar value of closing the gap
    pub estimated_revenue: f64,
    /// Observed adoption rate, or per-service payment for code upgrades
    pub current_rate: f64,
    /// Reference adoption rate, or the related code's per-service payment
    pub target_rate: f64,
    /// Providers the opportunity covers
    pub affected_providers: u32,
    pub confidence: Confidence,
}

/// Rank program opportunities for a state against national adoption.
pub fn state_opportunities(
    state: &StateAggregate,
    national: &NationalRates,
) -> Vec<RevenueOpportunity> {
    let candidates = program_candidates(
        |program| state.adoption_rate(program),
        |program| national.rate(program),
        state.provider_count,
        Confidence::from_sample_size(state.provider_count),
        &format!("{} providers", state.state),
    );
    rank_opportunities(candidates)
}

/// Rank program opportunities for a state + specialty slice against the
/// specialty benchmark.
pub fn state_specialty_opportunities(
    slice: &StateSpecialtyAggregate,
    benchmark: &SpecialtyBenchmark,
) -> Vec<RevenueOpportunity> {
    let candidates = program_candidates(
        |program| slice.adoption_rate(program),
        |program| benchmark.adoption_rate(program),
        slice.provider_count,
        Confidence::from_sample_size(slice.provider_count),
        &format!("{} providers", slice.specialty),
    );
    rank_opportunities(candidates)
}

/// Rank upgrade opportunities for one billing code against its related
/// higher-value codes found in `peers`.
pub fn code_opportunities(
    target: &BillingCodeAggregate,
    peers: &[BillingCodeAggregate],
) -> Vec<RevenueOpportunity> {
    let mut candidates = Vec::new();

    for related in related_codes(&target.code) {
        let Some(peer) = peers.iter().find(|c| c.code == *related) else {
            continue;
        };
        // Only a strictly better-paying related code is an opportunity.
        if peer.avg_payment_per_service <= target.avg_payment_per_service {
            continue;
        }

        let per_service_lift = peer.avg_payment_per_service - target.avg_payment_per_service;
        let estimated_revenue =
            per_service_lift * target.provider_count as f64 * ASSUMED_SERVICES_PER_PROVIDER;

        candidates.push(RevenueOpportunity {
            rank: 0,
            category: OpportunityCategory::CodingUpgrade,
            description: format!(
                "{} providers billing {} at ${:.2} per service could document toward {} at ${:.2}",
                target.provider_count,
                target.code,
                target.avg_payment_per_service,
                peer.code,
                peer.avg_payment_per_service,
            ),
            estimated_revenue,
            current_rate: target.avg_payment_per_service,
            target_rate: peer.avg_payment_per_service,
            affected_providers: target.provider_count,
            confidence: Confidence::from_sample_size(target.provider_count),
        });
    }

    rank_opportunities(candidates)
}

fn program_candidates(
    current_rate: impl Fn(Program) -> f64,
    reference_rate: impl Fn(Program) -> f64,
    total_providers: u32,
    confidence: Confidence,
    population_label: &str,
) -> Vec<RevenueOpportunity> {
    let mut candidates = Vec::new();

    for program in Program::ALL {
        let current = current_rate(program);
        let reference = reference_rate(program);
        if current >= reference {
            continue;
        }

        let gap = reference - current;
        let additional_providers = (gap * total_providers as f64).round() as u32;
        let estimated_revenue = additional_providers as f64 * annual_value_per_adopter(program);

        candidates.push(RevenueOpportunity {
            rank: 0,
            category: OpportunityCategory::Program(program),
            description: format!(
                "{:.1}% of {} bill {} against a {:.1}% reference rate; closing the gap means {} additional adopters",
                current * 100.0,
                population_label,
                program.display_name(),
                reference * 100.0,
                additional_providers,
            ),
            estimated_revenue,
            current_rate: current,
            target_rate: reference,
            affected_providers: additional_providers,
            confidence,
        });
    }

    candidates
}

/// Sort candidates by estimated revenue, keep the top three, and number
/// them by rank.
fn rank_opportunities(mut candidates: Vec<RevenueOpportunity>) -> Vec<RevenueOpportunity> {
    candidates.sort_by(|a, b| b.estimated_revenue.total_cmp(&a.estimated_revenue));
    candidates.truncate(MAX_OPPORTUNITIES);
    for (index, opportunity) in candidates.iter_mut().enumerate() {
        opportunity.rank = index as u32 + 1;
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::ProgramCounts;

    fn state() -> StateAggregate {
        StateAggregate {
            state: "OK".to_string(),
            provider_count: 1_000,
            avg_payment: 180_000.0,
            // 5% CCM, 1% RPM, 1% BHI, 30% AWV
            program_providers: ProgramCounts { ccm: 50, rpm: 10, bhi: 10, awv: 300 },
            specialties: Vec::new(),
        }
    }

    fn national() -> NationalRates {
        NationalRates {
            ccm: 0.20,
            rpm: 0.05,
            bhi: 0.03,
            awv: 0.45,
        }
    }

    #[test]
    fn test_at_most_three_sorted_by_value() {
        let opportunities = state_opportunities(&state(), &national());
        assert_eq!(opportunities.len(), 3);
        for pair in opportunities.windows(2) {
            assert!(pair[0].estimated_revenue >= pair[1].estimated_revenue);
        }
        for (index, opportunity) in opportunities.iter().enumerate() {
            assert_eq!(opportunity.rank, index as u32 + 1);
        }
    }

    #[test]
    fn test_only_trailing_programs_emitted() {
        let mut leading = state();
        // Lead on everything except CCM.
        leading.program_providers = ProgramCounts { ccm: 50, rpm: 200, bhi: 100, awv: 500 };
        let opportunities = state_opportunities(&leading, &national());
        assert_eq!(opportunities.len(), 1);
        assert_eq!(
            opportunities[0].category,
            OpportunityCategory::Program(Program::Ccm)
        );
        assert!(opportunities[0].current_rate < opportunities[0].target_rate);
    }

    #[test]
    fn test_program_gap_valuation() {
        let opportunities = state_opportunities(&state(), &national());
        let ccm = opportunities
            .iter()
            .find(|o| o.category == OpportunityCategory::Program(Program::Ccm))
            .unwrap();
        // Gap of 15 points over 1,000 providers: 150 additional adopters.
        assert_eq!(ccm.affected_providers, 150);
        let expected = 150.0 * annual_value_per_adopter(Program::Ccm);
        assert!((ccm.estimated_revenue - expected).abs() < 1e-9);
        assert_eq!(ccm.confidence, Confidence::High);
    }

    #[test]
    fn test_awv_valued_per_visit() {
        let value = annual_value_per_adopter(Program::Awv);
        assert!((value - AWV_VISIT_RATE * AWV_VISITS_PER_ADOPTER).abs() < 1e-9);
        // No 12-month multiplier on the annual program.
        assert!(value < combined_rate(Program::Awv) * 12.0 * AWV_VISITS_PER_ADOPTER);
    }

    #[test]
    fn test_code_upgrade_requires_strictly_higher_rate() {
        let low = BillingCodeAggregate {
            code: "99213".to_string(),
            provider_count: 400,
            total_services: 60_000,
            avg_payment_per_service: 90.0,
        };
        let peers = vec![
            BillingCodeAggregate {
                code: "99214".to_string(),
                provider_count: 350,
                total_services: 40_000,
                avg_payment_per_service: 128.0,
            },
            BillingCodeAggregate {
                code: "99215".to_string(),
                provider_count: 200,
                total_services: 8_000,
                avg_payment_per_service: 90.0, // not better; must be skipped
            },
        ];

        let opportunities = code_opportunities(&low, &peers);
        assert_eq!(opportunities.len(), 1);
        let upgrade = &opportunities[0];
        assert_eq!(upgrade.category, OpportunityCategory::CodingUpgrade);
        let expected = (128.0 - 90.0) * 400.0 * ASSUMED_SERVICES_PER_PROVIDER;
        assert!((upgrade.estimated_revenue - expected).abs() < 1e-9);
        assert!(upgrade.description.contains("99214"));
    }

    #[test]
    fn test_unknown_code_has_no_related_codes() {
        let code = BillingCodeAggregate {
            code: "99490".to_string(),
            provider_count: 100,
            total_services: 5_000,
            avg_payment_per_service: 62.0,
        };
        assert!(code_opportunities(&code, &[]).is_empty());
    }
}
