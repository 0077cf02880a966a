//! Scheduler construction config and runtime options.
//!
//! Construction-time knobs live in [`SchedulerConfig`] (validated once, up
//! front). Runtime options arrive through [`SchedulerOption`], the option
//! family engines use to configure any scheduler uniformly; options the
//! splash scheduler does not consume are warned about and ignored, never
//! fatal.

/// Default work budget per splash (cumulative edge count).
pub const DEFAULT_SPLASH_SIZE: usize = 100;

/// Construction-time configuration.
///
/// All defaults are conservative. Profile with your workload before tuning.
///
/// | Knob | Sensitivity |
/// |------|-------------|
/// | workers | must match the engine's worker thread count |
/// | splash_size | update cost vs. scheduling overhead trade |
/// | seed | reproducibility only, never correctness |
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Number of worker threads the engine will run.
    pub workers: usize,

    /// Seed for the per-worker neighbour-shuffle RNGs (and the optional
    /// shard-map permutation). Same seed + same task sequence = same
    /// per-worker emission order.
    pub seed: u64,

    /// Maximum cumulative edge count per splash.
    pub splash_size: usize,

    /// Applies a seeded permutation to the vertex→shard map instead of the
    /// default `vertex mod num_shards` assignment. Off by default; turn it
    /// on when vertex ids correlate with graph locality badly enough to
    /// unbalance the shards.
    pub shuffle_shard_map: bool,
}

impl SchedulerConfig {
    /// Creates a config for `workers` threads with default knobs.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Validates the configuration. Panics on invalid values.
    pub fn validate(&self) {
        assert!(self.workers > 0, "workers must be > 0");
        assert!(self.splash_size > 0, "splash_size must be > 0");
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            seed: 0x853c49e6748fea9b,
            splash_size: DEFAULT_SPLASH_SIZE,
            shuffle_shard_map: false,
        }
    }
}

/// Runtime option family shared by the scheduler zoo.
///
/// The splash scheduler consumes `SplashSize` and `UpdateFunction`;
/// everything else is logged and ignored so engines can broadcast one
/// option set to whichever scheduler they constructed.
#[derive(Clone, Copy, Debug)]
pub enum SchedulerOption<F> {
    /// Work budget per splash; see [`SchedulerConfig::splash_size`].
    SplashSize(usize),
    /// Canonical update function carried by every task.
    UpdateFunction(F),
    /// Iteration cap used by sweep-style schedulers. Not consumed here.
    MaxIterations(usize),
}

impl<F> SchedulerOption<F> {
    /// Stable option name used in warnings.
    pub fn name(&self) -> &'static str {
        match self {
            SchedulerOption::SplashSize(_) => "SPLASH_SIZE",
            SchedulerOption::UpdateFunction(_) => "UPDATE_FUNCTION",
            SchedulerOption::MaxIterations(_) => "MAX_ITERATIONS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SchedulerConfig::default().validate();
        assert_eq!(SchedulerConfig::default().splash_size, DEFAULT_SPLASH_SIZE);
    }

    #[test]
    #[should_panic(expected = "workers must be > 0")]
    fn zero_workers_rejected() {
        SchedulerConfig {
            workers: 0,
            ..SchedulerConfig::default()
        }
        .validate();
    }

    #[test]
    #[should_panic(expected = "splash_size must be > 0")]
    fn zero_splash_size_rejected() {
        SchedulerConfig {
            splash_size: 0,
            ..SchedulerConfig::default()
        }
        .validate();
    }

    #[test]
    fn option_names_are_stable() {
        assert_eq!(SchedulerOption::<()>::SplashSize(1).name(), "SPLASH_SIZE");
        assert_eq!(
            SchedulerOption::UpdateFunction(()).name(),
            "UPDATE_FUNCTION"
        );
        assert_eq!(
            SchedulerOption::<()>::MaxIterations(5).name(),
            "MAX_ITERATIONS"
        );
    }
}
