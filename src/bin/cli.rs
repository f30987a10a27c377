use anyhow::{Context, Result};
use clap::{Parser, Subcommand, Args, ValueEnum};
use revpulse::cookbook;
use revpulse::prelude::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rpcli")]
#[command(about = "RevPulse CLI - Score, forecast, and benchmark medical practice revenue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a practice's revenue health against its specialty benchmark
    Score(ScoreArgs),
    /// Evaluate a practice as an acquisition target
    Acquire(PracticeArgs),
    /// Project 12 months of revenue growth under a preset scenario
    Forecast(ForecastArgs),
    /// Summarize the market opportunity across all loaded practices
    Market(DataArgs),
    /// Analyze a filtered set of practices as a portfolio
    Portfolio(PortfolioArgs),
    /// Compare a state (optionally within a specialty) against its peers
    Compare(CompareArgs),
    /// Rank the top revenue opportunities for a state
    Opportunities(OpportunityArgs),
}

#[derive(Args)]
struct DataArgs {
    /// Path to the directory containing the CSV extract files
    #[arg(short, long)]
    data_dir: PathBuf,
}

#[derive(Args)]
struct PracticeArgs {
    /// Path to the directory containing the CSV extract files
    #[arg(short, long)]
    data_dir: PathBuf,
    /// Practice identifier
    #[arg(long)]
    practice: String,
}

#[derive(Args)]
struct ScoreArgs {
    /// Path to the directory containing the CSV extract files
    #[arg(short, long)]
    data_dir: PathBuf,
    /// Practice identifier
    #[arg(long)]
    practice: String,
    /// Override the distinct billing-code count
    #[arg(long)]
    codes: Option<u32>,
}

#[derive(Args)]
struct ForecastArgs {
    /// Path to the directory containing the CSV extract files
    #[arg(short, long)]
    data_dir: PathBuf,
    /// Practice identifier
    #[arg(long)]
    practice: String,
    /// Preset scenario to run
    #[arg(long, value_enum, default_value_t = ScenarioOpt::Full)]
    scenario: ScenarioOpt,
    /// Write the monthly curve to a file instead of printing
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = FormatOpt::Json)]
    format: FormatOpt,
}

#[derive(Args)]
struct PortfolioArgs {
    /// Path to the directory containing the CSV extract files
    #[arg(short, long)]
    data_dir: PathBuf,
    /// State filter (e.g. TX)
    #[arg(long)]
    state: Option<String>,
    /// Specialty filter (e.g. Cardiology)
    #[arg(long)]
    specialty: Option<String>,
    /// Write per-holding rows to a CSV file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CompareArgs {
    /// Path to the directory containing the CSV extract files
    #[arg(short, long)]
    data_dir: PathBuf,
    /// State code (e.g. TX)
    #[arg(long)]
    state: String,
    /// Narrow the comparison to one specialty
    #[arg(long)]
    specialty: Option<String>,
}

#[derive(Args)]
struct OpportunityArgs {
    /// Path to the directory containing the CSV extract files
    #[arg(short, long)]
    data_dir: PathBuf,
    /// State code (e.g. TX)
    #[arg(long)]
    state: String,
    /// Narrow the ranking to one specialty
    #[arg(long)]
    specialty: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ScenarioOpt {
    CcmOnly,
    CcmRpm,
    Full,
    Aggressive,
}

impl From<ScenarioOpt> for Scenario {
    fn from(opt: ScenarioOpt) -> Self {
        match opt {
            ScenarioOpt::CcmOnly => Scenario::CcmOnly,
            ScenarioOpt::CcmRpm => Scenario::CcmRpm,
            ScenarioOpt::Full => Scenario::FullOptimization,
            ScenarioOpt::Aggressive => Scenario::AggressiveGrowth,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatOpt {
    Json,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Score(args) => cmd_score(args),
        Commands::Acquire(args) => cmd_acquire(args),
        Commands::Forecast(args) => cmd_forecast(args),
        Commands::Market(args) => cmd_market(args),
        Commands::Portfolio(args) => cmd_portfolio(args),
        Commands::Compare(args) => cmd_compare(args),
        Commands::Opportunities(args) => cmd_opportunities(args),
    }
}

fn load_repository(data_dir: &PathBuf) -> Result<InMemoryRepository> {
    InMemoryRepository::load_standard(data_dir)
        .with_context(|| format!("failed to load extracts from '{}'", data_dir.display()))
}

fn cmd_score(args: ScoreArgs) -> Result<()> {
    let repository = load_repository(&args.data_dir)?;
    let practice = repository
        .get_practice(&PracticeId(args.practice.clone()))
        .with_context(|| format!("unknown practice '{}'", args.practice))?;
    let benchmark = repository
        .get_benchmark(&practice.specialty)
        .with_context(|| format!("no benchmark for specialty '{}'", practice.specialty))?;

    let breakdown = score_practice(practice, benchmark, args.codes);
    println!("Practice {} ({})", practice.id, practice.specialty);
    println!("  Overall:             {:>5.0}  [{}]", breakdown.overall, breakdown.tier.label());
    println!("  Coding optimization: {:>5.1}", breakdown.coding_optimization);
    println!("  Program utilization: {:>5.1}", breakdown.program_utilization);
    println!("  Revenue efficiency:  {:>5.1}", breakdown.revenue_efficiency);
    println!("  Service diversity:   {:>5.1}", breakdown.service_diversity);
    println!("  Patient volume:      {:>5.1}", breakdown.patient_volume);
    println!("  Estimated percentile: ~{}th", estimate_percentile(breakdown.overall));
    Ok(())
}

fn cmd_acquire(args: PracticeArgs) -> Result<()> {
    let repository = load_repository(&args.data_dir)?;
    let result = cookbook::evaluate_acquisition_by_id(&repository, &args.practice)
        .with_context(|| format!("no scoreable practice '{}'", args.practice))?;

    println!("Acquisition score: {:.0}  [{}]", result.overall, result.tier.label());
    println!("  Upside potential:       {:>5.1}", result.upside_potential);
    println!("  Patient base value:     {:>5.1}", result.patient_base_value);
    println!("  Optimization readiness: {:>5.1}", result.optimization_readiness);
    println!("  Market position:        {:>5.1}", result.market_position);
    println!(
        "  Projected revenue: {:.0} (+{:.0}, {:.0}%)",
        result.projected_revenue, result.estimated_upside, result.revenue_increase_pct
    );
    Ok(())
}

fn cmd_forecast(args: ForecastArgs) -> Result<()> {
    let repository = load_repository(&args.data_dir)?;
    let scenario: Scenario = args.scenario.into();
    let result = cookbook::forecast_scenario_by_id(&repository, &args.practice, scenario)
        .with_context(|| format!("no scoreable practice '{}'", args.practice))?;

    if let Some(output) = args.output {
        match args.format {
            FormatOpt::Json => JsonExporter::new().export(&result, &output)?,
            FormatOpt::Csv => CsvExporter::new().export_forecast(&result, &output)?,
        }
        println!("Wrote {} forecast to {}", scenario.name(), output.display());
        return Ok(());
    }

    println!("{} forecast", scenario.name());
    for month in &result.monthly {
        println!(
            "  month {:>2}: {:>10.0}  (cumulative {:>11.0})",
            month.month, month.total, month.cumulative
        );
    }
    for program in &result.programs {
        println!(
            "  {}: {} of {} eligible, {:.0}/yr",
            program.program.display_name(),
            program.target_enrollment,
            program.eligible_patients,
            program.annual_revenue
        );
    }
    println!("Year-one total: {:.0}", result.total_year_one);
    Ok(())
}

fn cmd_market(args: DataArgs) -> Result<()> {
    let repository = load_repository(&args.data_dir)?;
    let summary = market_opportunity(&repository.practices, repository.benchmark_map());

    println!("Market summary ({} practices scored, {} skipped)",
        summary.practice_count, summary.skipped_practices);
    println!("  Average health score:  {:.0}", summary.avg_health_score);
    println!("  Current payment:       {:.0}", summary.total_current_payment);
    println!("  Addressable payment:   {:.0}", summary.total_addressable_payment);
    println!("  Missed revenue:        {:.0}", summary.missed_revenue);
    println!("  Underperforming (<60): {}", summary.underperforming_count);
    println!("  Prime targets (>=70):  {}", summary.prime_target_count);
    for gap in &summary.top_specialty_gaps {
        println!(
            "  {:<30} {:>4} practices, avg gap {:>10.0}",
            gap.specialty, gap.practice_count, gap.avg_gap
        );
    }
    Ok(())
}

fn cmd_portfolio(args: PortfolioArgs) -> Result<()> {
    let repository = load_repository(&args.data_dir)?;
    let filter = PracticeFilter {
        state: args.state,
        specialty: args.specialty,
        min_patients: None,
    };
    let holdings: Vec<_> = repository
        .list_practices(&filter)
        .into_iter()
        .cloned()
        .collect();
    let analysis = portfolio_analysis(&holdings, repository.benchmark_map());

    if let Some(output) = args.output {
        CsvExporter::new().export_portfolio(&analysis, &output)?;
        println!("Wrote {} holdings to {}", analysis.practices.len(), output.display());
        return Ok(());
    }

    println!("Portfolio of {} holdings", analysis.practices.len());
    for holding in &analysis.practices {
        println!(
            "  {} | {:<24} | {:>3.0} [{}] | upside {:>10.0}",
            holding.id,
            holding.specialty,
            holding.acquisition.overall,
            holding.acquisition.tier.label(),
            holding.acquisition.estimated_upside
        );
    }
    println!("  Average acquisition score: {:.0}", analysis.avg_acquisition_score);
    println!("  Total upside: {:.0}", analysis.total_upside);
    for action in &analysis.recommended_actions {
        println!("  -> {}", action);
    }
    Ok(())
}

fn cmd_compare(args: CompareArgs) -> Result<()> {
    let repository = load_repository(&args.data_dir)?;
    let states: Vec<StateAggregate> = repository
        .state_aggregates()
        .into_iter()
        .cloned()
        .collect();

    if let Some(specialty) = args.specialty {
        let benchmark = repository
            .get_benchmark(&specialty)
            .with_context(|| format!("no benchmark for specialty '{}'", specialty))?;
        let comparison = compare_state_specialty(&args.state, &specialty, &states, benchmark)
            .with_context(|| format!("'{}' has no {} data", args.state, specialty))?;

        println!("{} {} providers: {} peers", comparison.state, comparison.specialty, comparison.peer_group_size);
        println!(
            "  National rank {} of {} ({}th percentile, {} confidence)",
            comparison.national_rank,
            comparison.total_states,
            comparison.percentile_position,
            comparison.confidence
        );
        println!(
            "  Avg payment {:.0} vs benchmark {:.0} ({:+.1}%)",
            comparison.avg_payment, comparison.benchmark_avg_payment, comparison.payment_delta_pct
        );
        println!(
            "  Adoption deltas: CCM {:+.1}pp, RPM {:+.1}pp, BHI {:+.1}pp",
            comparison.ccm_adoption_delta * 100.0,
            comparison.rpm_adoption_delta * 100.0,
            comparison.bhi_adoption_delta * 100.0
        );
        return Ok(());
    }

    let comparison = compare_state(&args.state, &states)
        .with_context(|| format!("state '{}' is not in the loaded aggregates", args.state))?;

    println!(
        "{}: rank {} of {} ({:+.1}% vs national average)",
        comparison.state, comparison.national_rank, comparison.total_states, comparison.pct_vs_national
    );
    for neighbor in &comparison.neighbors {
        println!(
            "  vs {}: {:+.1}% ({} providers)",
            neighbor.state, neighbor.delta_pct, neighbor.provider_count
        );
    }
    if let Some(specialty) = &comparison.strongest_specialty {
        println!("  Strongest specialty: {}", specialty);
    }
    if let Some(weakest) = &comparison.weakest_program {
        println!(
            "  Weakest program: {} ({:.1}% vs {:.1}% nationally)",
            weakest.program.display_name(),
            weakest.local_rate * 100.0,
            weakest.national_rate * 100.0
        );
    }
    Ok(())
}

fn cmd_opportunities(args: OpportunityArgs) -> Result<()> {
    let repository = load_repository(&args.data_dir)?;

    let opportunities = if let Some(specialty) = &args.specialty {
        let state = repository
            .get_state_aggregate(&args.state)
            .with_context(|| format!("state '{}' is not in the loaded aggregates", args.state))?;
        let slice = state
            .specialty(specialty)
            .with_context(|| format!("'{}' has no {} data", args.state, specialty))?;
        let benchmark = repository
            .get_benchmark(specialty)
            .with_context(|| format!("no benchmark for specialty '{}'", specialty))?;
        state_specialty_opportunities(slice, benchmark)
    } else {
        cookbook::state_opportunity_report(&repository, &args.state)
            .with_context(|| format!("state '{}' is not in the loaded aggregates", args.state))?
    };

    if opportunities.is_empty() {
        println!("No trailing programs: nothing to rank.");
        return Ok(());
    }
    for opportunity in &opportunities {
        println!(
            "#{} [{}] ~{:.0}/yr: {}",
            opportunity.rank,
            opportunity.confidence,
            opportunity.estimated_revenue,
            opportunity.description
        );
    }
    Ok(())
}
