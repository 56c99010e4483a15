use super::runner::RunResults;
use chrono::{DateTime, SecondsFormat, Utc};
use std::{collections::BTreeMap, fmt, time::Duration};

/// Latency distribution of the successful attempts in milliseconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatencyStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl LatencyStats {
    /// `None` without samples
    pub fn from_millis(mut samples: Vec<f64>) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        samples.sort_by(f64::total_cmp);

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            min: samples[0],
            max: samples[samples.len() - 1],
            mean,
            median: samples[samples.len() / 2],
            std_dev: variance.sqrt(),
        })
    }
}

/// Summary printed at the end of a run
#[derive(Clone, Debug, PartialEq)]
pub struct LoadTestReport {
    /// Attempted user operations
    pub samples: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration: Duration,
    pub successes: usize,
    pub failures: usize,
    /// Confirmed user operations per second
    pub uops: f64,
    /// Confirmed transactions per second
    pub tps: f64,
    pub latency: Option<LatencyStats>,
    /// Failure message and its number of occurrences
    pub errors: BTreeMap<String, usize>,
}

impl LoadTestReport {
    pub fn new(run: &RunResults, batch_size: usize) -> Self {
        let successes = run.results.iter().filter(|r| r.is_success()).count();
        let failures = run.results.len() - successes;
        let seconds = run.duration.as_secs_f64();
        let per_second = |n: usize| if seconds > 0.0 { n as f64 / seconds } else { 0.0 };

        let mut errors = BTreeMap::new();
        for error in run.results.iter().filter_map(|r| r.error()) {
            *errors.entry(error.to_string()).or_insert(0) += 1;
        }

        Self {
            samples: run.results.len() * batch_size,
            started_at: run.started_at,
            ended_at: run.ended_at,
            duration: run.duration,
            successes,
            failures,
            uops: per_second(successes * batch_size),
            tps: per_second(successes),
            latency: LatencyStats::from_millis(
                run.results
                    .iter()
                    .filter(|r| r.is_success())
                    .map(|r| r.latency().as_secs_f64() * 1000.0)
                    .collect(),
            ),
            errors,
        }
    }
}

impl fmt::Display for LoadTestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "* Results")?;
        writeln!(f, "Samples: {}", self.samples)?;
        writeln!(f, "Start time: {}", self.started_at.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        writeln!(f, "End time: {}", self.ended_at.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        writeln!(f, "UserOperations Per Second (UOPS): {:.2}", self.uops)?;
        writeln!(f, "Transactions Per Second (TPS): {:.2}", self.tps)?;

        match &self.latency {
            Some(latency) => {
                writeln!(f, "\nRequest Latency Stats (ms):")?;
                writeln!(f, "  Min: {:.2}", latency.min)?;
                writeln!(f, "  Max: {:.2}", latency.max)?;
                writeln!(f, "  Mean: {:.2}", latency.mean)?;
                writeln!(f, "  Median: {:.2}", latency.median)?;
                writeln!(f, "  StdDev: {:.2}", latency.std_dev)?;
            }
            None => writeln!(f, "\nNo successful transactions to calculate latency statistics.")?,
        }

        writeln!(f, "\nTest Duration: {:.2}s", self.duration.as_secs_f64())?;
        writeln!(f, "Number of Errors: {}", self.failures)?;

        if !self.errors.is_empty() {
            writeln!(f, "\nError Summary:")?;
            for (error, count) in &self.errors {
                writeln!(f, "  {error}: {count} occurrences")?;
            }
        }
        Ok(())
    }
}
