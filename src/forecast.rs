/*!
 * Revenue growth forecast engine
 *
 * Simulates twelve monthly steps of care-program adoption and
 * coding-optimization ramp-up for one practice. Clinical programs follow a
 * sigmoid ramp (slow launch, rapid mid-year growth, plateau); coding
 * revenue follows a linear ramp driven by documentation habit change; the
 * annual wellness visit distributes across the year once ramped instead of
 * recurring monthly.
 */

use serde::{Deserialize, Serialize};

use crate::constants::{ASSUMED_CHRONIC_PREVALENCE, FORECAST_HORIZON_MONTHS};
use crate::data_types::{PracticeProfile, Program, SpecialtyBenchmark};

// Per-patient reimbursement constants, CMS-style national figures.
/// CCM base care management, 99490, per patient per month
pub const CCM_BASE_RATE: f64 = 62.0;
/// RPM device supply, 99454, per patient per month
pub const RPM_DEVICE_SUPPLY_RATE: f64 = 55.0;
/// RPM treatment management, 99457, per patient per month
pub const RPM_MANAGEMENT_RATE: f64 = 50.0;
/// BHI care management, 99484, per patient per month
pub const BHI_CARE_RATE: f64 = 48.0;
/// Annual wellness visit, G0438/G0439 blended, per visit
pub const AWV_VISIT_RATE: f64 = 175.0;

// Office visit rates used for the coding-optimization gap.
pub const EM_99213_RATE: f64 = 92.0;
pub const EM_99214_RATE: f64 = 131.0;
pub const EM_99215_RATE: f64 = 184.0;

/// Months until coding-optimization revenue reaches full run rate.
pub const CODING_RAMP_MONTHS: f64 = 6.0;

/// Boost applied to the AWV ramp before capping at 1.0: visit scheduling
/// catches up faster than enrollment-driven programs.
pub const AWV_RAMP_BOOST: f64 = 1.5;

/// Fraction of annual visits assumed shiftable from 99213 to 99214 when
/// estimating a prospect's coding gap.
pub const CODING_SHIFT_FRACTION: f64 = 0.15;

/// Evaluation visits per patient per year assumed for prospects with no
/// billing extract.
pub const VISITS_PER_PATIENT_PER_YEAR: f64 = 3.0;

/// Sigmoid ramp parameters per program: (midpoint month, speed).
///
/// CCM launches fastest; BHI is slowest because it needs an additional
/// clinical workflow. AWV ramps early since it is scheduling-driven.
pub fn ramp_parameters(program: Program) -> (f64, f64) {
    match program {
        Program::Ccm => (5.0, 0.8),
        Program::Rpm => (6.0, 0.7),
        Program::Bhi => (7.0, 0.6),
        Program::Awv => (4.0, 0.9),
    }
}

/// Combined per-patient reimbursement for one program: monthly for the
/// recurring programs, per-visit for AWV.
pub fn combined_rate(program: Program) -> f64 {
    match program {
        Program::Ccm => CCM_BASE_RATE,
        Program::Rpm => RPM_DEVICE_SUPPLY_RATE + RPM_MANAGEMENT_RATE,
        Program::Bhi => BHI_CARE_RATE,
        Program::Awv => AWV_VISIT_RATE,
    }
}

/// Fraction of the chronic population eligible for each program.
pub fn eligible_fraction(program: Program) -> f64 {
    match program {
        Program::Ccm => 0.8,
        Program::Rpm => 0.5,
        Program::Bhi => 0.3,
        Program::Awv => 1.0,
    }
}

/// Sigmoid adoption ramp. `s(midpoint, midpoint, speed) == 0.5` for any
/// speed; the curve approaches but never reaches 1.0.
pub fn sigmoid_ramp(month: u32, midpoint: f64, speed: f64) -> f64 {
    1.0 / (1.0 + (-speed * (month as f64 - midpoint)).exp())
}

/// Linear ramp reaching 1.0 at `full_month` and flat afterwards.
pub fn linear_ramp(month: u32, full_month: f64) -> f64 {
    (month as f64 / full_month).min(1.0)
}

/// Caller-supplied forecast switches: which revenue streams to simulate and
/// the enrollment targets ([0, 100] percent of eligible patients).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ForecastConfig {
    pub ccm_enabled: bool,
    pub rpm_enabled: bool,
    pub bhi_enabled: bool,
    pub awv_enabled: bool,
    pub coding_enabled: bool,
    pub ccm_enrollment_pct: f64,
    pub rpm_enrollment_pct: f64,
    pub bhi_enrollment_pct: f64,
    pub awv_enrollment_pct: f64,
}

impl ForecastConfig {
    pub fn enabled(&self, program: Program) -> bool {
        match program {
            Program::Ccm => self.ccm_enabled,
            Program::Rpm => self.rpm_enabled,
            Program::Bhi => self.bhi_enabled,
            Program::Awv => self.awv_enabled,
        }
    }

    pub fn enrollment_pct(&self, program: Program) -> f64 {
        match program {
            Program::Ccm => self.ccm_enrollment_pct,
            Program::Rpm => self.rpm_enrollment_pct,
            Program::Bhi => self.bhi_enrollment_pct,
            Program::Awv => self.awv_enrollment_pct,
        }
    }
}

/// Named preset scenarios exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    CcmOnly,
    CcmRpm,
    FullOptimization,
    AggressiveGrowth,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::CcmOnly,
        Scenario::CcmRpm,
        Scenario::FullOptimization,
        Scenario::AggressiveGrowth,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::CcmOnly => "CCM Only",
            Scenario::CcmRpm => "CCM + RPM",
            Scenario::FullOptimization => "Full Optimization",
            Scenario::AggressiveGrowth => "Aggressive Growth",
        }
    }

    /// The fixed configuration this scenario runs with.
    pub fn config(&self) -> ForecastConfig {
        match self {
            Scenario::CcmOnly => ForecastConfig {
                ccm_enabled: true,
                ccm_enrollment_pct: 50.0,
                ..Default::default()
            },
            Scenario::CcmRpm => ForecastConfig {
                ccm_enabled: true,
                rpm_enabled: true,
                ccm_enrollment_pct: 50.0,
                rpm_enrollment_pct: 40.0,
                ..Default::default()
            },
            Scenario::FullOptimization => ForecastConfig {
                ccm_enabled: true,
                rpm_enabled: true,
                bhi_enabled: true,
                awv_enabled: true,
                coding_enabled: true,
                ccm_enrollment_pct: 50.0,
                rpm_enrollment_pct: 40.0,
                bhi_enrollment_pct: 30.0,
                awv_enrollment_pct: 70.0,
            },
            Scenario::AggressiveGrowth => ForecastConfig {
                ccm_enabled: true,
                rpm_enabled: true,
                bhi_enabled: true,
                awv_enabled: true,
                coding_enabled: true,
                ccm_enrollment_pct: 80.0,
                rpm_enrollment_pct: 60.0,
                bhi_enrollment_pct: 50.0,
                awv_enrollment_pct: 90.0,
            },
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One program's enrollment and revenue gap, derived upstream of the
/// forecast loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramGap {
    pub program: Program,
    /// Patients who could be enrolled
    pub eligible_patients: u32,
    /// Patients currently enrolled (informational; the forecast targets a
    /// fraction of the eligible population)
    pub enrolled_patients: u32,
    /// Combined per-patient rate: monthly for recurring programs, per-visit
    /// for AWV
    pub rate: f64,
    pub current_annual_revenue: f64,
    pub potential_annual_revenue: f64,
}

/// Everything the forecast loop needs for one practice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInputs {
    pub gaps: Vec<ProgramGap>,
    /// Annual revenue recoverable through coding optimization
    pub annual_coding_gap: f64,
}

impl ForecastInputs {
    pub fn gap(&self, program: Program) -> Option<&ProgramGap> {
        self.gaps.iter().find(|g| g.program == program)
    }
}

/// One simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    /// Month index, 1 through 12
    pub month: u32,
    pub ccm_revenue: f64,
    pub rpm_revenue: f64,
    pub bhi_revenue: f64,
    pub awv_revenue: f64,
    pub coding_revenue: f64,
    /// Sum of all enabled streams for this month
    pub total: f64,
    /// Running total through this month
    pub cumulative: f64,
}

impl MonthlyProjection {
    /// Revenue contribution of one program in this month
    pub fn program_revenue(&self, program: Program) -> f64 {
        match program {
            Program::Ccm => self.ccm_revenue,
            Program::Rpm => self.rpm_revenue,
            Program::Bhi => self.bhi_revenue,
            Program::Awv => self.awv_revenue,
        }
    }
}

/// Year-one summary for one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramForecast {
    pub program: Program,
    pub eligible_patients: u32,
    /// Steady-state enrollment the scenario targets
    pub target_enrollment: u32,
    /// Monthly revenue run rate reached in month 12
    pub month_12_revenue: f64,
    /// Total contribution across the 12 simulated months
    pub annual_revenue: f64,
}

/// Full forecast output: monthly curve, per-program summaries, and totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub monthly: Vec<MonthlyProjection>,
    pub programs: Vec<ProgramForecast>,
    /// Year-one total from coding optimization alone
    pub coding_revenue: f64,
    /// Cumulative revenue at month 12
    pub total_year_one: f64,
}

/// Simulate the 12-month adoption ramp for one practice.
pub fn run_forecast(inputs: &ForecastInputs, config: &ForecastConfig) -> ForecastResult {
    let monthly_coding_gap = inputs.annual_coding_gap / FORECAST_HORIZON_MONTHS as f64;
    let mut monthly = Vec::with_capacity(FORECAST_HORIZON_MONTHS as usize);
    let mut cumulative = 0.0;

    for month in 1..=FORECAST_HORIZON_MONTHS {
        let ccm_revenue = program_month_revenue(inputs, config, Program::Ccm, month);
        let rpm_revenue = program_month_revenue(inputs, config, Program::Rpm, month);
        let bhi_revenue = program_month_revenue(inputs, config, Program::Bhi, month);
        let awv_revenue = program_month_revenue(inputs, config, Program::Awv, month);
        let coding_revenue = if config.coding_enabled {
            (monthly_coding_gap * linear_ramp(month, CODING_RAMP_MONTHS)).round()
        } else {
            0.0
        };

        let total = ccm_revenue + rpm_revenue + bhi_revenue + awv_revenue + coding_revenue;
        cumulative += total;

        monthly.push(MonthlyProjection {
            month,
            ccm_revenue,
            rpm_revenue,
            bhi_revenue,
            awv_revenue,
            coding_revenue,
            total,
            cumulative,
        });
    }

    let mut programs = Vec::new();
    for gap in &inputs.gaps {
        if !config.enabled(gap.program) || gap.eligible_patients == 0 {
            continue;
        }
        let target_enrollment = (gap.eligible_patients as f64
            * config.enrollment_pct(gap.program)
            / 100.0)
            .round() as u32;
        let annual_revenue: f64 = monthly
            .iter()
            .map(|m| m.program_revenue(gap.program))
            .sum();
        let month_12_revenue = monthly
            .last()
            .map(|m| m.program_revenue(gap.program))
            .unwrap_or(0.0);
        programs.push(ProgramForecast {
            program: gap.program,
            eligible_patients: gap.eligible_patients,
            target_enrollment,
            month_12_revenue,
            annual_revenue,
        });
    }

    let coding_revenue = monthly.iter().map(|m| m.coding_revenue).sum();
    let total_year_one = monthly.last().map(|m| m.cumulative).unwrap_or(0.0);

    ForecastResult {
        monthly,
        programs,
        coding_revenue,
        total_year_one,
    }
}

/// Run one of the named preset scenarios.
pub fn run_scenario(inputs: &ForecastInputs, scenario: Scenario) -> ForecastResult {
    run_forecast(inputs, &scenario.config())
}

fn program_month_revenue(
    inputs: &ForecastInputs,
    config: &ForecastConfig,
    program: Program,
    month: u32,
) -> f64 {
    if !config.enabled(program) {
        return 0.0;
    }
    let Some(gap) = inputs.gap(program) else {
        return 0.0;
    };
    if gap.eligible_patients == 0 {
        return 0.0;
    }

    let target = gap.eligible_patients as f64 * config.enrollment_pct(program) / 100.0;
    let (midpoint, speed) = ramp_parameters(program);
    let ramp = sigmoid_ramp(month, midpoint, speed);

    let patients = match program {
        // AWV is annual-frequency: visits distribute across the year once
        // ramped rather than recurring monthly per patient.
        Program::Awv => ((target / FORECAST_HORIZON_MONTHS as f64)
            * (ramp * AWV_RAMP_BOOST).min(1.0))
        .round(),
        _ => (target * ramp).round(),
    };

    patients * gap.rate
}

/// Derive forecast inputs from a live billing profile and its benchmark.
///
/// Eligibility comes from the chronic population (the benchmark's
/// prevalence, or the documented default when absent); current enrollment
/// is inferred from billed service counts.
pub fn derive_forecast_inputs(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
) -> ForecastInputs {
    let prevalence = benchmark
        .chronic_prevalence
        .unwrap_or(ASSUMED_CHRONIC_PREVALENCE);
    let chronic_patients = profile.total_patients as f64 * prevalence;

    let mut gaps = Vec::with_capacity(Program::ALL.len());
    for program in Program::ALL {
        let eligible = (chronic_patients * eligible_fraction(program)).round() as u32;
        let activity = profile.program(program);
        let enrolled = match program {
            // One AWV service per patient per year
            Program::Awv => activity.services as u32,
            // Recurring programs bill one service per patient per month
            _ => (activity.services as f64 / 12.0).round() as u32,
        };
        let rate = combined_rate(program);
        let potential_annual_revenue = match program {
            Program::Awv => eligible as f64 * rate,
            _ => eligible as f64 * rate * 12.0,
        };
        gaps.push(ProgramGap {
            program,
            eligible_patients: eligible,
            enrolled_patients: enrolled,
            rate,
            current_annual_revenue: activity.payment,
            potential_annual_revenue,
        });
    }

    ForecastInputs {
        gaps,
        annual_coding_gap: coding_gap_from_profile(profile, benchmark),
    }
}

/// Annual revenue recoverable by closing the mid-complexity coding lag.
pub fn coding_gap_from_profile(
    profile: &PracticeProfile,
    benchmark: &SpecialtyBenchmark,
) -> f64 {
    let lag = (benchmark.pct_99214 - profile.pct_99214()).max(0.0);
    lag * profile.em_total() as f64 * (EM_99214_RATE - EM_99213_RATE)
}

/// A prospective practice with no billing extract yet: the minimal inputs
/// for a standalone forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProspectInputs {
    pub specialty: String,
    pub total_patients: u32,
    /// Chronic-condition prevalence as a fraction in [0, 1]
    pub chronic_prevalence: f64,
    pub has_ccm: bool,
    pub has_rpm: bool,
    pub has_bhi: bool,
    pub has_awv: bool,
}

impl ProspectInputs {
    pub fn has(&self, program: Program) -> bool {
        match program {
            Program::Ccm => self.has_ccm,
            Program::Rpm => self.has_rpm,
            Program::Bhi => self.has_bhi,
            Program::Awv => self.has_awv,
        }
    }
}

/// Derive synthetic forecast inputs for a prospect.
///
/// Programs the prospect already runs carry no incremental opportunity and
/// are zeroed out; the coding gap assumes the documented visit volume and
/// shift fraction.
pub fn derive_prospect_inputs(prospect: &ProspectInputs) -> ForecastInputs {
    let chronic_patients = prospect.total_patients as f64 * prospect.chronic_prevalence;

    let mut gaps = Vec::with_capacity(Program::ALL.len());
    for program in Program::ALL {
        let eligible = if prospect.has(program) {
            0
        } else {
            (chronic_patients * eligible_fraction(program)).round() as u32
        };
        let rate = combined_rate(program);
        let potential_annual_revenue = match program {
            Program::Awv => eligible as f64 * rate,
            _ => eligible as f64 * rate * 12.0,
        };
        gaps.push(ProgramGap {
            program,
            eligible_patients: eligible,
            enrolled_patients: 0,
            rate,
            current_annual_revenue: 0.0,
            potential_annual_revenue,
        });
    }

    let visits_per_year = prospect.total_patients as f64 * VISITS_PER_PATIENT_PER_YEAR;
    let annual_coding_gap =
        visits_per_year * CODING_SHIFT_FRACTION * (EM_99214_RATE - EM_99213_RATE);

    ForecastInputs {
        gaps,
        annual_coding_gap,
    }
}
