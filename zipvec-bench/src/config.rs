//! Settings for the benchmark harness.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `ZIPVEC_`, using `__` between
//! nested keys (`ZIPVEC_BENCH__SIZE=65536`).

use std::path::Path;

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use zipvec::Arch;
use zipvec::VecConfig;
use zipvec::DEFAULT_PAGE_LEN;

/// Elements written by each benchmark unless configured otherwise.
pub const DEFAULT_SIZE: u64 = 1 << 20;

/// Configuration error variants.
#[derive(Debug, thiserror::Error)]
pub enum BenchConfigError {
    /// The vector settings were rejected.
    #[error("invalid vector settings: {0}")]
    Vector(#[from] zipvec::Error),

    /// A count that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroForbidden(&'static str),
}

/// Which kernels the benchmarked vectors use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchSetting {
    /// Probe the CPU.
    #[default]
    Auto,
    /// Force the one-value-at-a-time kernels.
    Generic,
    /// Force the eight-lane kernels.
    Wide,
}

impl From<ArchSetting> for Option<Arch> {
    fn from(value: ArchSetting) -> Self {
        match value {
            ArchSetting::Auto => None,
            ArchSetting::Generic => Some(Arch::Generic),
            ArchSetting::Wide => Some(Arch::Wide),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Benchmark parameters
    pub bench: BenchSettings,
}

/// Benchmark parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BenchSettings {
    /// Elements per vector
    pub size: usize,
    /// Repetitions per benchmark; the fastest is reported
    pub runs: usize,
    /// Elements per page
    pub page_len: usize,
    /// Kernel selection
    pub arch: ArchSetting,
    /// Pattern generator seed
    pub seed: u64,
}

impl BenchSettings {
    /// The vector settings these parameters describe.
    pub fn vec_config(&self) -> VecConfig {
        VecConfig {
            page_len: self.page_len,
            arch: self.arch.into(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.vec_config()
            .validate()
            .map_err(|err| ConfigError::Message(BenchConfigError::from(err).to_string()))?;

        if self.size == 0 {
            let err = BenchConfigError::ZeroForbidden("bench.size");
            return Err(ConfigError::Message(err.to_string()));
        }
        if self.runs == 0 {
            let err = BenchConfigError::ZeroForbidden("bench.runs");
            return Err(ConfigError::Message(err.to_string()));
        }
        Ok(())
    }
}

impl Settings {
    /// Initializing the global config first with default values and then
    /// with the provided config file, followed by the environment.
    pub fn new(config_path: Option<impl AsRef<Path>>) -> Result<Self, ConfigError> {
        let mut cfg_builder = Self::defaults()?;
        if let Some(path) = config_path {
            cfg_builder = cfg_builder.add_source(File::from(path.as_ref()));
        }
        Self::finish(cfg_builder)
    }

    fn defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("bench.size", DEFAULT_SIZE)?
            .set_default("bench.runs", 3)?
            .set_default("bench.page_len", DEFAULT_PAGE_LEN as u64)?
            .set_default("bench.arch", "auto")?
            .set_default("bench.seed", zipvec::testing::DEFAULT_SEED)
    }

    fn finish(
        cfg_builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let env = Environment::with_prefix("ZIPVEC")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);

        let cfg = cfg_builder.add_source(env).build()?;
        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bench.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings, ConfigError> {
        let cfg_builder = Settings::defaults()?.add_source(File::from_str(toml, FileFormat::Toml));
        Settings::finish(cfg_builder)
    }

    #[test]
    fn defaults_load() {
        let settings = Settings::new(None::<&Path>).unwrap();
        assert_eq!(settings.bench.page_len, 512);
        assert_eq!(settings.bench.arch, ArchSetting::Auto);
        assert_eq!(settings.bench.vec_config().arch, None);
    }

    #[test]
    fn file_overrides_defaults() {
        let settings = from_toml(
            r#"
            [bench]
            size = 4096
            page_len = 64
            arch = "generic"
            seed = 11
            "#,
        )
        .unwrap();

        assert_eq!(settings.bench.size, 4096);
        assert_eq!(settings.bench.seed, 11);
        let vec_config = settings.bench.vec_config();
        assert_eq!(vec_config.page_len, 64);
        assert_eq!(vec_config.arch, Some(Arch::Generic));
    }

    #[test]
    fn environment_overrides_defaults() {
        std::env::set_var("ZIPVEC_BENCH__RUNS", "7");
        let settings = Settings::new(None::<&Path>);
        std::env::remove_var("ZIPVEC_BENCH__RUNS");

        assert_eq!(settings.unwrap().bench.runs, 7);
    }

    #[test]
    fn bad_page_length_is_rejected() {
        let err = from_toml("[bench]\npage_len = 100\n").unwrap_err();
        let expected = BenchConfigError::Vector(zipvec::Error::PageLenNotPowerOfTwo(100));
        assert_matches!(err, ConfigError::Message(msg) if msg == expected.to_string());
    }

    #[test]
    fn zero_size_is_rejected() {
        let err = from_toml("[bench]\nsize = 0\n").unwrap_err();
        let expected = BenchConfigError::ZeroForbidden("bench.size");
        assert_matches!(err, ConfigError::Message(msg) if msg == expected.to_string());
    }

    #[test]
    fn unknown_arch_is_rejected() {
        assert!(from_toml("[bench]\narch = \"sse\"\n").is_err());
    }
}
