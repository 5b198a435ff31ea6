use {
    std::{ffi::OsString, fmt, path::PathBuf, str::FromStr},
    thiserror::Error,
};

// deep enough to give every thread plenty of tasks for n around 10-15
pub const DEFAULT_FORK_DEPTH: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid arguments: {0}")]
    Args(#[from] pico_args::Error),
    #[error("unsupported dimension {0:?}, expected 2 or 3")]
    Dimension(String),
    #[error("unexpected arguments: {0:?}")]
    Unused(Vec<OsString>),
    #[error("thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Dimension {
    Two,
    #[default]
    Three,
}

impl Dimension {
    pub fn rank(self) -> u8 {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }
}

impl FromStr for Dimension {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.trim() {
            "2" | "2d" => Ok(Dimension::Two),
            "3" | "3d" => Ok(Dimension::Three),
            other => Err(ConfigError::Dimension(other.to_owned())),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.rank())
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Config {
    pub max_size: usize,
    pub dimension: Dimension,
    pub fork_depth: usize,
    /// Size of the global rayon pool, rayon's default when unset.
    pub threads: Option<usize>,
    pub json: Option<PathBuf>,
}

impl Config {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            dimension: Dimension::default(),
            fork_depth: DEFAULT_FORK_DEPTH,
            threads: None,
            json: None,
        }
    }

    pub const USAGE: &'static str =
        "usage: polycube-count <N> [THREADS] [--dim 2|3] [--fork-depth K] [--json PATH]";

    /// `<N> [THREADS] [--dim 2|3] [--fork-depth K] [--json PATH]`
    pub fn from_args(mut args: pico_args::Arguments) -> Result<Self, ConfigError> {
        let dimension = args.opt_value_from_str("--dim")?.unwrap_or_default();
        let fork_depth = args
            .opt_value_from_str("--fork-depth")?
            .unwrap_or(DEFAULT_FORK_DEPTH);
        let json = args.opt_value_from_os_str("--json", |s| {
            Ok::<_, std::convert::Infallible>(PathBuf::from(s))
        })?;

        let max_size = args.free_from_str()?;
        let threads = args.opt_free_from_str()?;

        let rest = args.finish();
        if !rest.is_empty() {
            return Err(ConfigError::Unused(rest));
        }

        Ok(Self {
            max_size,
            dimension,
            fork_depth,
            threads,
            json,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args(pico_args::Arguments::from_env())
    }

    /// Sizes the global rayon pool once, before any enumeration starts.
    pub fn install_thread_pool(&self) -> Result<(), ConfigError> {
        if let Some(num_threads) = self.threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, ConfigError> {
        Config::from_args(pico_args::Arguments::from_vec(
            args.iter().map(OsString::from).collect(),
        ))
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["9"]).unwrap();
        assert_eq!(config, Config::new(9));
        assert_eq!(config.dimension, Dimension::Three);
        assert_eq!(config.fork_depth, DEFAULT_FORK_DEPTH);
    }

    #[test]
    fn test_all_options() {
        let config = parse(&[
            "--dim",
            "2",
            "12",
            "--fork-depth",
            "6",
            "8",
            "--json",
            "out.json",
        ])
        .unwrap();

        assert_eq!(config.max_size, 12);
        assert_eq!(config.threads, Some(8));
        assert_eq!(config.dimension, Dimension::Two);
        assert_eq!(config.fork_depth, 6);
        assert_eq!(config.json, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse(&[]), Err(ConfigError::Args(_))));
        assert!(matches!(parse(&["ten"]), Err(ConfigError::Args(_))));
        assert!(matches!(
            parse(&["5", "--dim", "4"]),
            Err(ConfigError::Args(_))
        ));
        assert!(matches!(
            parse(&["5", "2", "extra"]),
            Err(ConfigError::Unused(_))
        ));
    }

    #[test]
    fn test_dimension_from_str() {
        assert_eq!("2".parse::<Dimension>().unwrap(), Dimension::Two);
        assert_eq!("3d".parse::<Dimension>().unwrap(), Dimension::Three);
        assert!(matches!(
            "4".parse::<Dimension>(),
            Err(ConfigError::Dimension(d)) if d == "4"
        ));
        assert_eq!(Dimension::Two.to_string(), "2d");
    }
}
