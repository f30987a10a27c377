/*!
 * Data type definitions for practice billing and benchmark records
 *
 * This module contains type-safe representations of the records consumed by
 * the scoring, forecasting, and comparison engines. Records are constructed
 * and validated at the repository boundary; the engines treat them as
 * immutable inputs and never mutate them.
 */

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

/// Tolerance allowed when the three visit-level percentages are checked
/// against a sum of 1.0.
pub const VISIT_MIX_TOLERANCE: f64 = 0.02;

/// Sample size at or above which a comparison is graded `high` confidence.
pub const HIGH_CONFIDENCE_SAMPLE: u32 = 100;

/// Sample size at or above which a comparison is graded `medium` confidence.
pub const MEDIUM_CONFIDENCE_SAMPLE: u32 = 20;

/// Unique identifier for a billing entity (individual provider or organization)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PracticeId(pub String);

impl PracticeId {
    /// Create a new practice identifier, validating that it is non-empty
    pub fn new(id: String) -> Result<Self, crate::RevPulseError> {
        if id.trim().is_empty() {
            return Err(crate::RevPulseError::DataValidation {
                message: "practice id cannot be empty".to_string(),
                field: Some("id".to_string()),
                value: Some(id),
                context: Default::default(),
            });
        }
        Ok(PracticeId(id))
    }

    /// Get the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PracticeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Care-management billing program
///
/// The four recurring-revenue programs tracked across practices and
/// benchmarks. CCM, RPM, and BHI bill per patient per month; AWV bills per
/// visit on an annual cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Program {
    /// Chronic Care Management
    Ccm,
    /// Remote Patient Monitoring
    Rpm,
    /// Behavioral Health Integration
    Bhi,
    /// Annual Wellness Visit
    Awv,
}

impl Program {
    /// All four programs, in canonical order
    pub const ALL: [Program; 4] = [Program::Ccm, Program::Rpm, Program::Bhi, Program::Awv];

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "ccm" => Some(Program::Ccm),
            "rpm" => Some(Program::Rpm),
            "bhi" => Some(Program::Bhi),
            "awv" => Some(Program::Awv),
            _ => None,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Program::Ccm => "ccm",
            Program::Rpm => "rpm",
            Program::Bhi => "bhi",
            Program::Awv => "awv",
        }
    }

    /// Human-readable program name
    pub fn display_name(&self) -> &'static str {
        match self {
            Program::Ccm => "Chronic Care Management",
            Program::Rpm => "Remote Patient Monitoring",
            Program::Bhi => "Behavioral Health Integration",
            Program::Awv => "Annual Wellness Visit",
        }
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A practice's billing activity in one program
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgramActivity {
    /// Number of services billed under the program's codes
    pub services: u64,
    /// Total payment received for those services
    pub payment: f64,
}

impl ProgramActivity {
    /// Whether the practice bills this program at all
    pub fn is_billed(&self) -> bool {
        self.services > 0
    }
}

/// One billing entity's profile, recomputed upstream on the ingestion cycle
///
/// All counts and amounts are non-negative; `total_services` covers every
/// code-level count drawn from it. The engines never mutate a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeProfile {
    pub id: PracticeId,
    /// Specialty key, matching `SpecialtyBenchmark::specialty`
    pub specialty: String,
    /// Two-letter state code
    pub state: String,
    pub city: Option<String>,
    /// Distinct patients seen over the extract window
    pub total_patients: u32,
    pub total_services: u64,
    pub total_payment: f64,
    /// Low-complexity evaluation visits (99213)
    pub em_99213: u64,
    /// Mid-complexity evaluation visits (99214)
    pub em_99214: u64,
    /// High-complexity evaluation visits (99215)
    pub em_99215: u64,
    pub ccm: ProgramActivity,
    pub rpm: ProgramActivity,
    pub bhi: ProgramActivity,
    pub awv: ProgramActivity,
    /// Distinct billing codes used, when the extract carries code-level data
    pub distinct_codes: Option<u32>,
    /// Date the upstream extract was last recomputed
    pub last_refreshed: Option<NaiveDate>,
}

impl PracticeProfile {
    /// Total evaluation-visit volume across all three complexity levels
    pub fn em_total(&self) -> u64 {
        self.em_99213 + self.em_99214 + self.em_99215
    }

    /// Fraction of evaluation visits billed at mid complexity (0 when there
    /// are no evaluation visits)
    pub fn pct_99214(&self) -> f64 {
        let total = self.em_total();
        if total == 0 {
            return 0.0;
        }
        self.em_99214 as f64 / total as f64
    }

    /// Fraction of evaluation visits billed at high complexity
    pub fn pct_99215(&self) -> f64 {
        let total = self.em_total();
        if total == 0 {
            return 0.0;
        }
        self.em_99215 as f64 / total as f64
    }

    /// Billing activity for one program
    pub fn program(&self, program: Program) -> &ProgramActivity {
        match program {
            Program::Ccm => &self.ccm,
            Program::Rpm => &self.rpm,
            Program::Bhi => &self.bhi,
            Program::Awv => &self.awv,
        }
    }

    /// Whether the practice bills the given program
    pub fn bills(&self, program: Program) -> bool {
        self.program(program).is_billed()
    }

    /// Validate the record invariants enforced at the repository boundary
    pub fn validate(&self) -> crate::Result<()> {
        if self.total_payment < 0.0 {
            return Err(crate::RevPulseError::negative_value(
                "total_payment",
                &self.total_payment.to_string(),
            ));
        }
        for program in Program::ALL {
            let activity = self.program(program);
            if activity.payment < 0.0 {
                return Err(crate::RevPulseError::negative_value(
                    &format!("{}_payment", program.as_code()),
                    &activity.payment.to_string(),
                ));
            }
        }
        if self.em_total() > self.total_services {
            return Err(crate::RevPulseError::DataValidation {
                message: format!(
                    "evaluation visit count {} exceeds total services {}",
                    self.em_total(),
                    self.total_services
                ),
                field: Some("total_services".to_string()),
                value: Some(self.total_services.to_string()),
                context: Default::default(),
            });
        }
        Ok(())
    }
}

/// Peer-average statistics for one specialty, recomputed upstream from the
/// full peer population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyBenchmark {
    pub specialty: String,
    /// Number of peers contributing to the averages
    pub provider_count: u32,
    pub avg_patients: f64,
    pub avg_revenue_per_patient: f64,
    pub avg_total_payment: f64,
    pub avg_total_services: f64,
    /// Peer visit mix: the three percentages sum to 1.0 within rounding
    pub pct_99213: f64,
    pub pct_99214: f64,
    pub pct_99215: f64,
    /// Fraction of peers billing each program, in [0, 1]
    pub ccm_adoption: f64,
    pub rpm_adoption: f64,
    pub bhi_adoption: f64,
    pub awv_adoption: f64,
    /// Fraction of the specialty's patient panel with chronic conditions
    pub chronic_prevalence: Option<f64>,
    pub last_refreshed: Option<NaiveDate>,
}

impl SpecialtyBenchmark {
    /// Peer adoption rate for one program
    pub fn adoption_rate(&self, program: Program) -> f64 {
        match program {
            Program::Ccm => self.ccm_adoption,
            Program::Rpm => self.rpm_adoption,
            Program::Bhi => self.bhi_adoption,
            Program::Awv => self.awv_adoption,
        }
    }

    /// Validate rate ranges and the visit-mix sum invariant
    pub fn validate(&self) -> crate::Result<()> {
        for program in Program::ALL {
            let rate = self.adoption_rate(program);
            if !(0.0..=1.0).contains(&rate) || rate.is_nan() {
                return Err(crate::RevPulseError::invalid_rate(
                    &format!("{}_adoption", program.as_code()),
                    rate,
                ));
            }
        }
        if let Some(prevalence) = self.chronic_prevalence {
            if !(0.0..=1.0).contains(&prevalence) || prevalence.is_nan() {
                return Err(crate::RevPulseError::invalid_rate(
                    "chronic_prevalence",
                    prevalence,
                ));
            }
        }
        let mix = self.pct_99213 + self.pct_99214 + self.pct_99215;
        if (mix - 1.0).abs() > VISIT_MIX_TOLERANCE {
            return Err(crate::RevPulseError::DataValidation {
                message: format!("visit-level percentages sum to {:.4}, expected 1.0", mix),
                field: Some("pct_99213/pct_99214/pct_99215".to_string()),
                value: Some(format!("{:.4}", mix)),
                context: Default::default(),
            });
        }
        Ok(())
    }
}

/// Providers billing each program within a geography
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramCounts {
    pub ccm: u32,
    pub rpm: u32,
    pub bhi: u32,
    pub awv: u32,
}

impl ProgramCounts {
    pub fn get(&self, program: Program) -> u32 {
        match program {
            Program::Ccm => self.ccm,
            Program::Rpm => self.rpm,
            Program::Bhi => self.bhi,
            Program::Awv => self.awv,
        }
    }
}

/// Per-specialty slice of a state aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSpecialtyAggregate {
    pub specialty: String,
    pub provider_count: u32,
    pub avg_payment: f64,
    pub program_providers: ProgramCounts,
}

impl StateSpecialtyAggregate {
    /// Fraction of the state's specialty providers billing a program
    pub fn adoption_rate(&self, program: Program) -> f64 {
        if self.provider_count == 0 {
            return 0.0;
        }
        self.program_providers.get(program) as f64 / self.provider_count as f64
    }
}

/// One geography's aggregate billing statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateAggregate {
    /// Two-letter state code
    pub state: String,
    pub provider_count: u32,
    pub avg_payment: f64,
    /// Providers billing each program, across all specialties in the state
    pub program_providers: ProgramCounts,
    pub specialties: Vec<StateSpecialtyAggregate>,
}

impl StateAggregate {
    /// Fraction of the state's providers billing a program
    pub fn adoption_rate(&self, program: Program) -> f64 {
        if self.provider_count == 0 {
            return 0.0;
        }
        self.program_providers.get(program) as f64 / self.provider_count as f64
    }

    /// Look up the per-specialty slice for a specialty key
    pub fn specialty(&self, specialty: &str) -> Option<&StateSpecialtyAggregate> {
        self.specialties
            .iter()
            .find(|s| s.specialty.eq_ignore_ascii_case(specialty))
    }

    /// The specialty with the most providers in this state
    pub fn strongest_specialty(&self) -> Option<&StateSpecialtyAggregate> {
        self.specialties.iter().max_by_key(|s| s.provider_count)
    }
}

/// Aggregate billing statistics for one billing code within a geography
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingCodeAggregate {
    pub code: String,
    /// Providers billing this code
    pub provider_count: u32,
    pub total_services: u64,
    pub avg_payment_per_service: f64,
}

/// Qualitative reliability grade derived from underlying sample size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Grade a comparison by the number of records behind it
    pub fn from_sample_size(sample: u32) -> Self {
        if sample >= HIGH_CONFIDENCE_SAMPLE {
            Confidence::High
        } else if sample >= MEDIUM_CONFIDENCE_SAMPLE {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PracticeProfile {
        PracticeProfile {
            id: PracticeId("P001".to_string()),
            specialty: "Cardiology".to_string(),
            state: "TX".to_string(),
            city: None,
            total_patients: 400,
            total_services: 2_500,
            total_payment: 310_000.0,
            em_99213: 500,
            em_99214: 700,
            em_99215: 100,
            ccm: ProgramActivity { services: 120, payment: 7_400.0 },
            rpm: ProgramActivity::default(),
            bhi: ProgramActivity::default(),
            awv: ProgramActivity { services: 60, payment: 10_500.0 },
            distinct_codes: Some(14),
            last_refreshed: None,
        }
    }

    #[test]
    fn test_practice_id_validation() {
        assert!(PracticeId::new("1093817".to_string()).is_ok());
        assert!(PracticeId::new("  ".to_string()).is_err());
    }

    #[test]
    fn test_program_codes_round_trip() {
        for program in Program::ALL {
            assert_eq!(Program::from_code(program.as_code()), Some(program));
        }
        assert_eq!(Program::from_code("CCM"), Some(Program::Ccm));
        assert!(Program::from_code("tcm").is_none());
    }

    #[test]
    fn test_visit_mix_percentages() {
        let p = profile();
        assert_eq!(p.em_total(), 1_300);
        assert!((p.pct_99214() - 700.0 / 1_300.0).abs() < 1e-12);

        let empty = PracticeProfile { em_99213: 0, em_99214: 0, em_99215: 0, ..profile() };
        assert_eq!(empty.pct_99214(), 0.0);
        assert_eq!(empty.pct_99215(), 0.0);
    }

    #[test]
    fn test_profile_invariants() {
        assert!(profile().validate().is_ok());

        let bad = PracticeProfile { total_services: 100, ..profile() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_benchmark_rate_validation() {
        let mut benchmark = SpecialtyBenchmark {
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
        };
        assert!(benchmark.validate().is_ok());

        benchmark.rpm_adoption = 1.7;
        assert!(benchmark.validate().is_err());

        benchmark.rpm_adoption = 0.08;
        benchmark.pct_99215 = 0.40;
        assert!(benchmark.validate().is_err());
    }

    #[test]
    fn test_confidence_grading() {
        assert_eq!(Confidence::from_sample_size(250), Confidence::High);
        assert_eq!(Confidence::from_sample_size(100), Confidence::High);
        assert_eq!(Confidence::from_sample_size(99), Confidence::Medium);
        assert_eq!(Confidence::from_sample_size(20), Confidence::Medium);
        assert_eq!(Confidence::from_sample_size(19), Confidence::Low);
    }
}
