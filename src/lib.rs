/*!
 * # RevPulse — Practice Revenue Intelligence Library
 *
 * A Rust library for scoring, forecasting, and benchmarking medical
 * practice revenue performance against specialty and geographic peers.
 *
 * ## Features
 *
 * - 📊 **Revenue Health Scoring**: 5-factor 0-100 score with tier labels
 * - 🎯 **Acquisition Targeting**: upside scoring for ranking investment targets
 * - 📈 **12-Month Forecasting**: sigmoid adoption ramps with named scenarios
 * - 🗺️ **Peer Comparison**: state and specialty rankings with confidence grades
 * - 💰 **Opportunity Ranking**: top missing-revenue opportunities by dollar value
 * - 🧩 **Pure Core**: deterministic, I/O-free engines, safe to parallelize
 * - 🛡️ **Type Safe**: validated records constructed at the repository boundary
 *
 * ## Quick Start
 *
 * ```no_run
 * use revpulse::prelude::*;
 *
 * # fn main() -> Result<()> {
 * // Load practices, benchmarks, and state aggregates from a directory
 * let repository = InMemoryRepository::load_standard("./data")?;
 *
 * // Score one practice against its specialty benchmark
 * let practice = repository
 *     .get_practice(&PracticeId::new("P001".to_string())?)
 *     .expect("practice loaded");
 * let benchmark = repository
 *     .get_benchmark(&practice.specialty)
 *     .expect("benchmark available");
 *
 * let breakdown = score_practice(practice, benchmark, None);
 * println!(
 *     "{}: {} ({})",
 *     practice.id,
 *     breakdown.overall,
 *     breakdown.tier.label()
 * );
 *
 * // Project a year of growth under a preset scenario
 * let inputs = derive_forecast_inputs(practice, benchmark);
 * let forecast = run_scenario(&inputs, Scenario::FullOptimization);
 * println!("Year-one upside: {:.0}", forecast.total_year_one);
 * # Ok(())
 * # }
 * ```
 *
 * ## Scoring a Market
 *
 * ```no_run
 * # use revpulse::prelude::*;
 * # fn main() -> Result<()> {
 * # let repository = InMemoryRepository::load_standard("./data")?;
 * // Population-level summary across every practice with a benchmark
 * let summary = market_opportunity(&repository.practices, repository.benchmark_map());
 * println!(
 *     "{} practices, {:.0} missed revenue, {} prime targets",
 *     summary.practice_count,
 *     summary.missed_revenue,
 *     summary.prime_target_count
 * );
 *
 * // Portfolio view over one owner's holdings
 * let holdings = repository.list_practices(&PracticeFilter {
 *     state: Some("TX".to_string()),
 *     ..Default::default()
 * });
 * let owned: Vec<_> = holdings.into_iter().cloned().collect();
 * let analysis = portfolio_analysis(&owned, repository.benchmark_map());
 * for action in &analysis.recommended_actions {
 *     println!("- {}", action);
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Comparing Geographies
 *
 * ```no_run
 * # use revpulse::prelude::*;
 * # fn main() -> Result<()> {
 * # let repository = InMemoryRepository::load_standard("./data")?;
 * let states: Vec<_> = repository
 *     .state_aggregates()
 *     .into_iter()
 *     .cloned()
 *     .collect();
 *
 * if let Some(comparison) = compare_state("TX", &states) {
 *     println!(
 *         "TX ranks {} of {} ({:+.1}% vs national)",
 *         comparison.national_rank,
 *         comparison.total_states,
 *         comparison.pct_vs_national
 *     );
 * }
 *
 * let national = national_program_rates(&states);
 * if let Some(state) = repository.get_state_aggregate("TX") {
 *     for opportunity in state_opportunities(state, &national) {
 *         println!("#{} {}", opportunity.rank, opportunity.description);
 *     }
 * }
 * # Ok(())
 * # }
 * ```
 *
 * ## Data Files
 *
 * The repository builder loads three CSV extracts:
 *
 * - **practices.csv** — one row per billing entity
 * - **benchmarks.csv** — one row per specialty peer average
 * - **states.csv** — state totals plus per-specialty slices
 *
 * All amounts are plain numerics in one currency unit; formatting to
 * "$1.2M"-style strings belongs to the presentation layer.
 */

// Re-export error types from root
pub use error::{RevPulseError, Result, ErrorContext, ExportFormat};

// Public modules
pub mod data_types;
pub mod reader;
pub mod error;
pub mod score;
pub mod acquisition;
pub mod forecast;
pub mod market;
pub mod comparison;
pub mod opportunity;
pub mod repository;
pub mod export;
pub mod config;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use revpulse::prelude::*;
/// ```
pub mod prelude {
    pub use crate::data_types::*;
    pub use crate::error::{RevPulseError, Result};
    pub use crate::score::{
        estimate_percentile, score_practice, safe_divide, ScoreBreakdown, ScoreTier,
    };
    pub use crate::acquisition::{
        evaluate_acquisition, AcquisitionBreakdown, AcquisitionTier,
    };
    pub use crate::forecast::{
        derive_forecast_inputs, derive_prospect_inputs, run_forecast, run_scenario,
        ForecastConfig, ForecastInputs, ForecastResult, MonthlyProjection, ProgramForecast,
        ProgramGap, ProspectInputs, Scenario,
    };
    pub use crate::market::{
        market_opportunity, portfolio_analysis, MarketOpportunity, PortfolioAnalysis,
        SpecialtyGap,
    };
    pub use crate::comparison::{
        compare_state, compare_state_specialty, national_program_rates, neighboring_states,
        NationalRates, StateComparison, StateSpecialtyComparison,
    };
    pub use crate::opportunity::{
        code_opportunities, state_opportunities, state_specialty_opportunities,
        OpportunityCategory, RevenueOpportunity,
    };
    pub use crate::repository::{
        BenchmarkRepository, InMemoryRepository, PracticeFilter, RepositoryBuilder,
    };
    pub use crate::reader::RevPulseReader;
    pub use crate::export::{CsvExporter, JsonExporter};
    pub use crate::config::ConfigBuilder;
    pub use crate::ExportFormat;
}

/// Shared constants
pub mod constants {
    /// Standard file name for the practice extract
    pub const PRACTICE_FILE_NAME: &str = "practices.csv";

    /// Standard file name for the specialty benchmark file
    pub const BENCHMARK_FILE_NAME: &str = "benchmarks.csv";

    /// Standard file name for the state aggregate file
    pub const STATE_FILE_NAME: &str = "states.csv";

    /// Months simulated by the forecast engine
    pub const FORECAST_HORIZON_MONTHS: u32 = 12;

    /// Distinct-code count assumed when no code-level data is available
    /// (the midrange step of the diversity table)
    pub const DEFAULT_DISTINCT_CODES: u32 = 8;

    /// Chronic-condition prevalence assumed when a benchmark omits it
    pub const ASSUMED_CHRONIC_PREVALENCE: f64 = 0.55;
}

/// Common recipes combining the repository with the engines
pub mod cookbook {
    use crate::prelude::*;

    /// Score a practice by id, resolving its benchmark first
    ///
    /// Returns `None` when the practice is unknown or its specialty has no
    /// benchmark; the engines are never invoked without one.
    ///
    /// # Example
    /// ```no_run
    /// # use revpulse::prelude::*;
    /// # use revpulse::cookbook::score_practice_by_id;
    /// # fn main() -> Result<()> {
    /// # let repository = InMemoryRepository::load_standard("./data")?;
    /// if let Some(breakdown) = score_practice_by_id(&repository, "P001") {
    ///     println!("{} ({})", breakdown.overall, breakdown.tier.label());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn score_practice_by_id(
        repository: &InMemoryRepository,
        id: &str,
    ) -> Option<ScoreBreakdown> {
        let practice = repository.get_practice(&PracticeId(id.to_string()))?;
        let benchmark = repository.get_benchmark(&practice.specialty)?;
        Some(score_practice(practice, benchmark, None))
    }

    /// Evaluate a practice as an acquisition target by id
    pub fn evaluate_acquisition_by_id(
        repository: &InMemoryRepository,
        id: &str,
    ) -> Option<AcquisitionBreakdown> {
        let practice = repository.get_practice(&PracticeId(id.to_string()))?;
        let benchmark = repository.get_benchmark(&practice.specialty)?;
        Some(evaluate_acquisition(practice, benchmark, None))
    }

    /// Run a preset forecast scenario for a practice by id
    pub fn forecast_scenario_by_id(
        repository: &InMemoryRepository,
        id: &str,
        scenario: Scenario,
    ) -> Option<ForecastResult> {
        let practice = repository.get_practice(&PracticeId(id.to_string()))?;
        let benchmark = repository.get_benchmark(&practice.specialty)?;
        let inputs = derive_forecast_inputs(practice, benchmark);
        Some(run_scenario(&inputs, scenario))
    }

    /// Top program opportunities for a state against national adoption
    pub fn state_opportunity_report(
        repository: &InMemoryRepository,
        state: &str,
    ) -> Option<Vec<RevenueOpportunity>> {
        let target = repository.get_state_aggregate(state)?;
        let states: Vec<StateAggregate> = repository
            .state_aggregates()
            .into_iter()
            .cloned()
            .collect();
        let national = national_program_rates(&states);
        Some(state_opportunities(target, &national))
    }
}

#[cfg(test)]
mod tests {
    use crate::data_types::{Confidence, Program};
    use crate::score::{estimate_percentile, ScoreTier};

    #[test]
    fn test_program_round_trip() {
        assert_eq!(Program::from_code("rpm"), Some(Program::Rpm));
        assert_eq!(Program::Awv.display_name(), "Annual Wellness Visit");
        assert!(Program::from_code("dme").is_none());
    }

    #[test]
    fn test_tier_and_percentile_agree_at_the_top() {
        assert_eq!(ScoreTier::from_score(92.0), ScoreTier::Elite);
        assert!(estimate_percentile(92.0) >= 95);
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(Confidence::from_sample_size(500), Confidence::High);
        assert_eq!(Confidence::from_sample_size(50), Confidence::Medium);
        assert_eq!(Confidence::from_sample_size(5), Confidence::Low);
    }
}
