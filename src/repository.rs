/*!
 * Repository boundary for practice, benchmark, and state records
 *
 * The engines consume already-resolved records and never perform storage or
 * network calls themselves. This module defines the lookup interface they
 * rely on, an in-memory implementation with indexes, and a builder that
 * loads a repository from CSV extract files.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{BENCHMARK_FILE_NAME, PRACTICE_FILE_NAME, STATE_FILE_NAME};
use crate::data_types::*;
use crate::reader::RevPulseReader;
use crate::{Result, RevPulseError};

/// Filter for practice listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PracticeFilter {
    /// Two-letter state code
    pub state: Option<String>,
    pub specialty: Option<String>,
    /// Minimum distinct-patient count
    pub min_patients: Option<u32>,
}

impl PracticeFilter {
    /// Whether a profile passes every set criterion
    pub fn matches(&self, profile: &PracticeProfile) -> bool {
        if let Some(state) = &self.state {
            if !profile.state.eq_ignore_ascii_case(state) {
                return false;
            }
        }
        if let Some(specialty) = &self.specialty {
            if !profile.specialty.eq_ignore_ascii_case(specialty) {
                return false;
            }
        }
        if let Some(min) = self.min_patients {
            if profile.total_patients < min {
                return false;
            }
        }
        true
    }
}

/// Lookup interface the engines consume
///
/// Both "not found" cases are recoverable by design: a missing benchmark
/// excludes the practice from aggregate computations, and a missing state
/// yields no comparison. Neither is an error.
pub trait BenchmarkRepository {
    fn get_practice(&self, id: &PracticeId) -> Option<&PracticeProfile>;
    fn get_benchmark(&self, specialty: &str) -> Option<&SpecialtyBenchmark>;
    fn get_state_aggregate(&self, state: &str) -> Option<&StateAggregate>;
    fn list_practices(&self, filter: &PracticeFilter) -> Vec<&PracticeProfile>;
    fn list_benchmarks(&self) -> Vec<&SpecialtyBenchmark>;
}

/// In-memory repository with O(1) lookups
pub struct InMemoryRepository {
    /// Practice profiles in load order
    pub practices: Vec<PracticeProfile>,
    benchmark_map: HashMap<String, SpecialtyBenchmark>,
    state_map: HashMap<String, StateAggregate>,
    practice_index: HashMap<PracticeId, usize>,
}

impl InMemoryRepository {
    /// Build a repository from already-validated records
    pub fn new(
        practices: Vec<PracticeProfile>,
        benchmarks: Vec<SpecialtyBenchmark>,
        states: Vec<StateAggregate>,
    ) -> Self {
        let practice_index = practices
            .iter()
            .enumerate()
            .map(|(index, p)| (p.id.clone(), index))
            .collect();
        let benchmark_map = benchmarks
            .into_iter()
            .map(|b| (b.specialty.clone(), b))
            .collect();
        let state_map = states
            .into_iter()
            .map(|s| (s.state.clone(), s))
            .collect();

        Self {
            practices,
            benchmark_map,
            state_map,
            practice_index,
        }
    }

    /// Load a repository from a directory of standard extract files
    ///
    /// # Example
    /// ```no_run
    /// # use revpulse::repository::InMemoryRepository;
    /// let repository = InMemoryRepository::load_standard("./data")?;
    /// # Ok::<(), revpulse::RevPulseError>(())
    /// ```
    pub fn load_standard<P: AsRef<Path>>(dir: P) -> Result<Self> {
        RepositoryBuilder::from_directory(dir)?.build()
    }

    /// Number of practices loaded
    pub fn len(&self) -> usize {
        self.practices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.practices.is_empty()
    }

    /// Benchmarks keyed by specialty, as the aggregation engines consume them
    pub fn benchmark_map(&self) -> &HashMap<String, SpecialtyBenchmark> {
        &self.benchmark_map
    }

    /// All state aggregates, for peer comparisons
    pub fn state_aggregates(&self) -> Vec<&StateAggregate> {
        self.state_map.values().collect()
    }
}

impl BenchmarkRepository for InMemoryRepository {
    fn get_practice(&self, id: &PracticeId) -> Option<&PracticeProfile> {
        self.practice_index
            .get(id)
            .and_then(|&index| self.practices.get(index))
    }

    fn get_benchmark(&self, specialty: &str) -> Option<&SpecialtyBenchmark> {
        self.benchmark_map.get(specialty)
    }

    fn get_state_aggregate(&self, state: &str) -> Option<&StateAggregate> {
        self.state_map.get(&state.to_ascii_uppercase())
    }

    fn list_practices(&self, filter: &PracticeFilter) -> Vec<&PracticeProfile> {
        self.practices
            .iter()
            .filter(|p| filter.matches(p))
            .collect()
    }

    fn list_benchmarks(&self) -> Vec<&SpecialtyBenchmark> {
        self.benchmark_map.values().collect()
    }
}

/// Builder for loading a repository from CSV extract files
///
/// # Example
/// ```no_run
/// # use revpulse::repository::RepositoryBuilder;
/// let repository = RepositoryBuilder::new()
///     .practices("data/practices.csv")
///     .benchmarks("data/benchmarks.csv")
///     .states("data/states.csv")
///     .skip_invalid_records(true)
///     .build()?;
/// # Ok::<(), revpulse::RevPulseError>(())
/// ```
pub struct RepositoryBuilder {
    practices_path: Option<PathBuf>,
    benchmarks_path: Option<PathBuf>,
    states_path: Option<PathBuf>,
    skip_invalid_records: bool,
    #[cfg(feature = "progress")]
    show_progress: bool,
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryBuilder {
    /// Create a new repository builder
    pub fn new() -> Self {
        Self {
            practices_path: None,
            benchmarks_path: None,
            states_path: None,
            skip_invalid_records: false,
            #[cfg(feature = "progress")]
            show_progress: true,
        }
    }

    /// Set the path to the practice extract file
    pub fn practices<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.practices_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the path to the specialty benchmark file
    pub fn benchmarks<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.benchmarks_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the path to the state aggregate file
    pub fn states<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.states_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable skipping invalid records
    pub fn skip_invalid_records(mut self, skip: bool) -> Self {
        self.skip_invalid_records = skip;
        self
    }

    #[cfg(feature = "progress")]
    /// Enable or disable progress bars
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Look for standard extract files in a directory
    pub fn from_directory<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        if !dir.is_dir() {
            return Err(RevPulseError::Custom {
                message: format!("'{}' is not a directory", dir.display()),
                suggestion: Some(
                    "Provide a directory containing practices.csv and benchmarks.csv".to_string(),
                ),
            });
        }

        let mut builder = Self::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

            match filename {
                PRACTICE_FILE_NAME => builder = builder.practices(path),
                BENCHMARK_FILE_NAME => builder = builder.benchmarks(path),
                STATE_FILE_NAME => builder = builder.states(path),
                _ => {}
            }
        }

        Ok(builder)
    }

    /// Build the repository, loading all specified files
    pub fn build(self) -> Result<InMemoryRepository> {
        let practices_path = self.practices_path.ok_or_else(|| RevPulseError::Custom {
            message: "Practice extract path not specified".to_string(),
            suggestion: Some("Use .practices() to specify the practice extract file".to_string()),
        })?;
        let benchmarks_path = self.benchmarks_path.ok_or_else(|| RevPulseError::Custom {
            message: "Benchmark file path not specified".to_string(),
            suggestion: Some("Use .benchmarks() to specify the benchmark file".to_string()),
        })?;

        let mut reader = RevPulseReader::new().with_skip_invalid_records(self.skip_invalid_records);

        #[cfg(feature = "progress")]
        {
            reader = reader.with_progress_bar(self.show_progress);
        }

        println!("Loading practice profiles from: {}", practices_path.display());
        let practices = reader.load_practices(&practices_path)?;

        println!("Loading specialty benchmarks from: {}", benchmarks_path.display());
        let benchmarks = reader.load_benchmarks(&benchmarks_path)?;

        let states = if let Some(path) = self.states_path {
            println!("Loading state aggregates from: {}", path.display());
            reader.load_state_aggregates(&path)?
        } else {
            Vec::new()
        };

        println!(
            "Loaded {} practices, {} benchmarks, {} states",
            practices.len(),
            benchmarks.len(),
            states.len()
        );

        Ok(InMemoryRepository::new(practices, benchmarks, states))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::ProgramActivity;

    fn practice(id: &str, specialty: &str, state: &str, patients: u32) -> PracticeProfile {
        PracticeProfile {
            id: PracticeId(id.to_string()),
            specialty: specialty.to_string(),
            state: state.to_string(),
            city: None,
            total_patients: patients,
            total_services: 2_000,
            total_payment: 150_000.0,
            em_99213: 500,
            em_99214: 400,
            em_99215: 100,
            ccm: ProgramActivity::default(),
            rpm: ProgramActivity::default(),
            bhi: ProgramActivity::default(),
            awv: ProgramActivity::default(),
            distinct_codes: None,
            last_refreshed: None,
        }
    }

    fn repository() -> InMemoryRepository {
        let benchmark = SpecialtyBenchmark {
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
            chronic_prevalence: None,
            last_refreshed: None,
        };
        InMemoryRepository::new(
            vec![
                practice("P1", "Cardiology", "TX", 400),
                practice("P2", "Cardiology", "OK", 150),
                practice("P3", "Dermatology", "TX", 600),
            ],
            vec![benchmark],
            vec![StateAggregate {
                state: "TX".to_string(),
                provider_count: 4_000,
                avg_payment: 250_000.0,
                program_providers: ProgramCounts::default(),
                specialties: Vec::new(),
            }],
        )
    }

    #[test]
    fn test_practice_lookup_by_id() {
        let repo = repository();
        assert_eq!(repo.len(), 3);
        let found = repo.get_practice(&PracticeId("P2".to_string())).unwrap();
        assert_eq!(found.state, "OK");
        assert!(repo.get_practice(&PracticeId("P9".to_string())).is_none());
    }

    #[test]
    fn test_missing_benchmark_is_none_not_error() {
        let repo = repository();
        assert!(repo.get_benchmark("Cardiology").is_some());
        assert!(repo.get_benchmark("Dermatology").is_none());
    }

    #[test]
    fn test_state_lookup_is_case_insensitive() {
        let repo = repository();
        assert!(repo.get_state_aggregate("tx").is_some());
        assert!(repo.get_state_aggregate("HI").is_none());
    }

    #[test]
    fn test_filtered_listing() {
        let repo = repository();

        let texan = repo.list_practices(&PracticeFilter {
            state: Some("TX".to_string()),
            ..Default::default()
        });
        assert_eq!(texan.len(), 2);

        let large_cardiology = repo.list_practices(&PracticeFilter {
            specialty: Some("Cardiology".to_string()),
            min_patients: Some(200),
            ..Default::default()
        });
        assert_eq!(large_cardiology.len(), 1);
        assert_eq!(large_cardiology[0].id.as_str(), "P1");

        assert_eq!(repo.list_practices(&PracticeFilter::default()).len(), 3);
    }
}
