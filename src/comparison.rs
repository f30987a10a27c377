/*!
 * Geographic comparison engine
 *
 * Ranks one state (or state + specialty pair) against its peers and
 * bordering states: national rank and delta, neighbor comparisons from a
 * static adjacency table, the locally strongest specialty, and the program
 * whose local adoption trails the national average the most. Comparisons
 * carry a confidence grade derived from the underlying sample size.
 */

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::data_types::{Confidence, Program, SpecialtyBenchmark, StateAggregate};
use crate::score::safe_divide;

/// Maximum neighbor rows returned per comparison.
pub const MAX_NEIGHBOR_COMPARISONS: usize = 4;

/// Static borders table. Non-contiguous entries (AK, HI) carry an empty
/// list; corner touches at the Four Corners are included.
const STATE_ADJACENCY: &[(&str, &[&str])] = &[
    ("AK", &[]),
    ("AL", &["FL", "GA", "MS", "TN"]),
    ("AR", &["LA", "MO", "MS", "OK", "TN", "TX"]),
    ("AZ", &["CA", "CO", "NM", "NV", "UT"]),
    ("CA", &["AZ", "NV", "OR"]),
    ("CO", &["AZ", "KS", "NE", "NM", "OK", "UT", "WY"]),
    ("CT", &["MA", "NY", "RI"]),
    ("DC", &["MD", "VA"]),
    ("DE", &["MD", "NJ", "PA"]),
    ("FL", &["AL", "GA"]),
    ("GA", &["AL", "FL", "NC", "SC", "TN"]),
    ("HI", &[]),
    ("IA", &["IL", "MN", "MO", "NE", "SD", "WI"]),
    ("ID", &["MT", "NV", "OR", "UT", "WA", "WY"]),
    ("IL", &["IA", "IN", "KY", "MO", "WI"]),
    ("IN", &["IL", "KY", "MI", "OH"]),
    ("KS", &["CO", "MO", "NE", "OK"]),
    ("KY", &["IL", "IN", "MO", "OH", "TN", "VA", "WV"]),
    ("LA", &["AR", "MS", "TX"]),
    ("MA", &["CT", "NH", "NY", "RI", "VT"]),
    ("MD", &["DC", "DE", "PA", "VA", "WV"]),
    ("ME", &["NH"]),
    ("MI", &["IN", "OH", "WI"]),
    ("MN", &["IA", "ND", "SD", "WI"]),
    ("MO", &["AR", "IA", "IL", "KS", "KY", "NE", "OK", "TN"]),
    ("MS", &["AL", "AR", "LA", "TN"]),
    ("MT", &["ID", "ND", "SD", "WY"]),
    ("NC", &["GA", "SC", "TN", "VA"]),
    ("ND", &["MN", "MT", "SD"]),
    ("NE", &["CO", "IA", "KS", "MO", "SD", "WY"]),
    ("NH", &["MA", "ME", "VT"]),
    ("NJ", &["DE", "NY", "PA"]),
    ("NM", &["AZ", "CO", "OK", "TX", "UT"]),
    ("NV", &["AZ", "CA", "ID", "OR", "UT"]),
    ("NY", &["CT", "MA", "NJ", "PA", "VT"]),
    ("OH", &["IN", "KY", "MI", "PA", "WV"]),
    ("OK", &["AR", "CO", "KS", "MO", "NM", "TX"]),
    ("OR", &["CA", "ID", "NV", "WA"]),
    ("PA", &["DE", "MD", "NJ", "NY", "OH", "WV"]),
    ("RI", &["CT", "MA"]),
    ("SC", &["GA", "NC"]),
    ("SD", &["IA", "MN", "MT", "ND", "NE", "WY"]),
    ("TN", &["AL", "AR", "GA", "KY", "MO", "MS", "NC", "VA"]),
    ("TX", &["AR", "LA", "NM", "OK"]),
    ("UT", &["AZ", "CO", "ID", "NM", "NV", "WY"]),
    ("VA", &["DC", "KY", "MD", "NC", "TN", "WV"]),
    ("VT", &["MA", "NH", "NY"]),
    ("WA", &["ID", "OR"]),
    ("WI", &["IA", "IL", "MI", "MN"]),
    ("WV", &["KY", "MD", "OH", "PA", "VA"]),
    ("WY", &["CO", "ID", "MT", "NE", "SD", "UT"]),
];

lazy_static! {
    static ref ADJACENCY_MAP: HashMap<&'static str, &'static [&'static str]> =
        STATE_ADJACENCY.iter().copied().collect();
}

/// Bordering states for a state code. Unknown codes and non-contiguous
/// states yield an empty list, never an error.
pub fn neighboring_states(state: &str) -> &'static [&'static str] {
    ADJACENCY_MAP
        .get(state.to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or(&[])
}

/// One bordering state's payment comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborComparison {
    pub state: String,
    pub avg_payment: f64,
    /// Target's average payment relative to this neighbor, in percent
    /// (positive when the target is ahead)
    pub delta_pct: f64,
    pub provider_count: u32,
}

/// Raw program adoption rates for a geography
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgramRates {
    pub ccm: f64,
    pub rpm: f64,
    pub bhi: f64,
    pub awv: f64,
}

impl ProgramRates {
    fn of(state: &StateAggregate) -> Self {
        Self {
            ccm: state.adoption_rate(Program::Ccm),
            rpm: state.adoption_rate(Program::Rpm),
            bhi: state.adoption_rate(Program::Bhi),
            awv: state.adoption_rate(Program::Awv),
        }
    }
}

/// A program trailing its national adoption average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgramDelta {
    pub program: Program,
    pub local_rate: f64,
    pub national_rate: f64,
    /// `local_rate - national_rate`; always negative when surfaced as a
    /// weakest program
    pub delta: f64,
}

/// State-level peer comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateComparison {
    pub state: String,
    /// 1 = highest average payment nationally
    pub national_rank: u32,
    pub total_states: u32,
    pub avg_payment: f64,
    pub national_avg_payment: f64,
    /// Percentage delta of the target from the national average
    pub pct_vs_national: f64,
    pub neighbors: Vec<NeighborComparison>,
    /// Specialty with the most providers in the state
    pub strongest_specialty: Option<String>,
    /// Only surfaced when some program trails the national average
    pub weakest_program: Option<ProgramDelta>,
    pub program_adoption: ProgramRates,
}

/// State + specialty peer comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpecialtyComparison {
    pub state: String,
    pub specialty: String,
    /// Rank among states offering the specialty, by average payment
    pub national_rank: u32,
    pub total_states: u32,
    /// `round((total - rank) / (total - 1) * 100)`; 0 for a lone peer group
    pub percentile_position: u8,
    /// Providers of the specialty in the state
    pub peer_group_size: u32,
    pub confidence: Confidence,
    pub avg_payment: f64,
    pub benchmark_avg_payment: f64,
    pub payment_delta_pct: f64,
    pub ccm_adoption_delta: f64,
    pub rpm_adoption_delta: f64,
    pub bhi_adoption_delta: f64,
}

/// Compare one state against the full peer list.
///
/// Returns `None` only when the target state is absent from the peer list.
pub fn compare_state(target: &str, states: &[StateAggregate]) -> Option<StateComparison> {
    let target_state = states
        .iter()
        .find(|s| s.state.eq_ignore_ascii_case(target))?;

    let national_rank = states
        .iter()
        .filter(|s| s.avg_payment > target_state.avg_payment)
        .count() as u32
        + 1;

    let national_avg_payment = safe_divide(
        states.iter().map(|s| s.avg_payment).sum(),
        states.len() as f64,
        0.0,
    );
    let pct_vs_national = safe_divide(
        target_state.avg_payment - national_avg_payment,
        national_avg_payment,
        0.0,
    ) * 100.0;

    let neighbors = neighboring_states(&target_state.state)
        .iter()
        .filter_map(|code| states.iter().find(|s| s.state.eq_ignore_ascii_case(code)))
        .take(MAX_NEIGHBOR_COMPARISONS)
        .map(|neighbor| NeighborComparison {
            state: neighbor.state.clone(),
            avg_payment: neighbor.avg_payment,
            delta_pct: safe_divide(
                target_state.avg_payment - neighbor.avg_payment,
                neighbor.avg_payment,
                0.0,
            ) * 100.0,
            provider_count: neighbor.provider_count,
        })
        .collect();

    let national_rates = national_program_rates(states);
    let weakest_program = Program::ALL
        .into_iter()
        .map(|program| {
            let local_rate = target_state.adoption_rate(program);
            let national_rate = national_rates.rate(program);
            ProgramDelta {
                program,
                local_rate,
                national_rate,
                delta: local_rate - national_rate,
            }
        })
        .min_by(|a, b| a.delta.total_cmp(&b.delta))
        .filter(|d| d.delta < 0.0);

    Some(StateComparison {
        state: target_state.state.clone(),
        national_rank,
        total_states: states.len() as u32,
        avg_payment: target_state.avg_payment,
        national_avg_payment,
        pct_vs_national,
        neighbors,
        strongest_specialty: target_state
            .strongest_specialty()
            .map(|s| s.specialty.clone()),
        weakest_program,
        program_adoption: ProgramRates::of(target_state),
    })
}

/// Compare one state's showing in a specialty against every other state
/// offering it.
///
/// Returns `None` when the target state is absent or does not offer the
/// specialty.
pub fn compare_state_specialty(
    target: &str,
    specialty: &str,
    states: &[StateAggregate],
    benchmark: &SpecialtyBenchmark,
) -> Option<StateSpecialtyComparison> {
    let target_state = states
        .iter()
        .find(|s| s.state.eq_ignore_ascii_case(target))?;
    let local = target_state.specialty(specialty)?;

    let offering: Vec<_> = states
        .iter()
        .filter_map(|s| s.specialty(specialty).map(|slice| (s, slice)))
        .collect();

    let national_rank = offering
        .iter()
        .filter(|(_, slice)| slice.avg_payment > local.avg_payment)
        .count() as u32
        + 1;
    let total_states = offering.len() as u32;

    let percentile_position = (safe_divide(
        (total_states - national_rank) as f64,
        (total_states - 1) as f64,
        0.0,
    ) * 100.0)
        .round() as u8;

    Some(StateSpecialtyComparison {
        state: target_state.state.clone(),
        specialty: local.specialty.clone(),
        national_rank,
        total_states,
        percentile_position,
        peer_group_size: local.provider_count,
        confidence: Confidence::from_sample_size(local.provider_count),
        avg_payment: local.avg_payment,
        benchmark_avg_payment: benchmark.avg_total_payment,
        payment_delta_pct: safe_divide(
            local.avg_payment - benchmark.avg_total_payment,
            benchmark.avg_total_payment,
            0.0,
        ) * 100.0,
        ccm_adoption_delta: local.adoption_rate(Program::Ccm) - benchmark.ccm_adoption,
        rpm_adoption_delta: local.adoption_rate(Program::Rpm) - benchmark.rpm_adoption,
        bhi_adoption_delta: local.adoption_rate(Program::Bhi) - benchmark.bhi_adoption,
    })
}

/// Cross-specialty national adoption rates, provider-weighted across all
/// states.
pub fn national_program_rates(states: &[StateAggregate]) -> NationalRates {
    let total_providers: u64 = states.iter().map(|s| s.provider_count as u64).sum();
    let rate = |program: Program| {
        let billing: u64 = states
            .iter()
            .map(|s| s.program_providers.get(program) as u64)
            .sum();
        safe_divide(billing as f64, total_providers as f64, 0.0)
    };
    NationalRates {
        ccm: rate(Program::Ccm),
        rpm: rate(Program::Rpm),
        bhi: rate(Program::Bhi),
        awv: rate(Program::Awv),
    }
}

/// Provider-weighted national adoption rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NationalRates {
    pub ccm: f64,
    pub rpm: f64,
    pub bhi: f64,
    pub awv: f64,
}

impl NationalRates {
    pub fn rate(&self, program: Program) -> f64 {
        match program {
            Program::Ccm => self.ccm,
            Program::Rpm => self.rpm,
            Program::Bhi => self.bhi,
            Program::Awv => self.awv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{ProgramCounts, StateSpecialtyAggregate};

    fn state(
        code: &str,
        providers: u32,
        avg_payment: f64,
        counts: ProgramCounts,
    ) -> StateAggregate {
        StateAggregate {
            state: code.to_string(),
            provider_count: providers,
            avg_payment,
            program_providers: counts,
            specialties: vec![
                StateSpecialtyAggregate {
                    specialty: "Cardiology".to_string(),
                    provider_count: providers / 4,
                    avg_payment: avg_payment * 1.4,
                    program_providers: ProgramCounts::default(),
                },
                StateSpecialtyAggregate {
                    specialty: "Family Medicine".to_string(),
                    provider_count: providers / 2,
                    avg_payment: avg_payment * 0.8,
                    program_providers: ProgramCounts::default(),
                },
            ],
        }
    }

    fn peer_states() -> Vec<StateAggregate> {
        vec![
            state("TX", 4_000, 250_000.0, ProgramCounts { ccm: 800, rpm: 200, bhi: 100, awv: 1_800 }),
            state("OK", 1_000, 180_000.0, ProgramCounts { ccm: 150, rpm: 40, bhi: 30, awv: 500 }),
            state("NM", 600, 170_000.0, ProgramCounts { ccm: 60, rpm: 20, bhi: 15, awv: 240 }),
            state("LA", 1_200, 210_000.0, ProgramCounts { ccm: 300, rpm: 70, bhi: 40, awv: 600 }),
            state("AR", 700, 160_000.0, ProgramCounts { ccm: 120, rpm: 25, bhi: 18, awv: 320 }),
            state("CA", 9_000, 280_000.0, ProgramCounts { ccm: 2_400, rpm: 900, bhi: 500, awv: 5_000 }),
        ]
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        for (code, neighbors) in STATE_ADJACENCY {
            for neighbor in *neighbors {
                assert!(
                    neighboring_states(neighbor).contains(code),
                    "{} lists {} but not vice versa",
                    code,
                    neighbor
                );
            }
        }
    }

    #[test]
    fn test_islands_have_no_neighbors() {
        assert!(neighboring_states("AK").is_empty());
        assert!(neighboring_states("HI").is_empty());
        assert!(neighboring_states("XX").is_empty());
    }

    #[test]
    fn test_state_ranking_and_deltas() {
        let states = peer_states();
        let comparison = compare_state("TX", &states).unwrap();

        assert_eq!(comparison.national_rank, 2); // CA is ahead
        assert_eq!(comparison.total_states, 6);
        assert!(comparison.pct_vs_national > 0.0);
        assert_eq!(comparison.strongest_specialty.as_deref(), Some("Family Medicine"));
    }

    #[test]
    fn test_neighbors_limited_to_peers_present() {
        let states = peer_states();
        // TX borders AR, LA, NM, OK; all four are in the peer list.
        let comparison = compare_state("TX", &states).unwrap();
        assert_eq!(comparison.neighbors.len(), 4);

        // Remove two of them: only the remaining neighbors appear.
        let trimmed: Vec<_> = states
            .into_iter()
            .filter(|s| s.state != "NM" && s.state != "AR")
            .collect();
        let comparison = compare_state("TX", &trimmed).unwrap();
        let codes: Vec<_> = comparison.neighbors.iter().map(|n| n.state.as_str()).collect();
        assert_eq!(codes.len(), 2);
        assert!(codes.contains(&"LA") && codes.contains(&"OK"));
    }

    #[test]
    fn test_weakest_program_only_when_trailing() {
        let states = peer_states();
        // OK trails on several programs; something must surface.
        let comparison = compare_state("OK", &states).unwrap();
        let weakest = comparison.weakest_program.unwrap();
        assert!(weakest.delta < 0.0);

        // A state ahead of the national average on every program surfaces
        // nothing.
        let mut ahead = peer_states();
        ahead[0].program_providers = ProgramCounts {
            ccm: 3_000,
            rpm: 2_000,
            bhi: 1_500,
            awv: 3_900,
        };
        let comparison = compare_state("TX", &ahead).unwrap();
        assert!(comparison.weakest_program.is_none());
    }

    #[test]
    fn test_specialty_percentile_extremes() {
        let mut states = peer_states();
        // Make TX the top-paying cardiology state and AR the lowest.
        states[0].specialties[0].avg_payment = 500_000.0;
        states[4].specialties[0].avg_payment = 100_000.0;

        let benchmark = SpecialtyBenchmark {
            specialty: "Cardiology".to_string(),
            provider_count: 12_000,
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
            chronic_prevalence: None,
            last_refreshed: None,
        };

        let top = compare_state_specialty("TX", "Cardiology", &states, &benchmark).unwrap();
        assert_eq!(top.national_rank, 1);
        assert_eq!(top.percentile_position, 100);

        let bottom = compare_state_specialty("AR", "Cardiology", &states, &benchmark).unwrap();
        assert_eq!(bottom.national_rank, 6);
        assert_eq!(bottom.percentile_position, 0);

        assert!(compare_state_specialty("TX", "Dermatology", &states, &benchmark).is_none());
    }
}
