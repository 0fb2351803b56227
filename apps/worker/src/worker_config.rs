use std::str::FromStr;
use std::time::Duration;

use dirsweep_core::{AppError, AppResult};
use dirsweep_domain::DirectoryResourceType;
use dirsweep_infrastructure::{DEFAULT_GRAPH_BASE_URL, GraphClientConfig};

/// Directory backend the worker deletes from.
#[derive(Debug, Clone)]
pub enum WorkerBackend {
    /// Microsoft Graph over HTTPS.
    Graph(GraphClientConfig),
    /// In-process directory for dry runs.
    Memory {
        /// Lookups before a delete becomes visible.
        replication_lag: u32,
    },
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub backend: WorkerBackend,
    pub resource_type: DirectoryResourceType,
    pub object_ids: Vec<String>,
    pub hard_delete: bool,
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub concurrency: usize,
    pub deadline: Option<Duration>,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let backend = match env
            .optional("DIRSWEEP_BACKEND")
            .unwrap_or_else(|| "graph".to_owned())
            .to_ascii_lowercase()
            .as_str()
        {
            "graph" => {
                let base_url = env
                    .optional("GRAPH_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_owned());
                let access_token = env.required("GRAPH_ACCESS_TOKEN")?;
                let timeout_seconds = env.parse("GRAPH_REQUEST_TIMEOUT_SECONDS", 30_u64)?;
                WorkerBackend::Graph(GraphClientConfig::new(
                    base_url.as_str(),
                    access_token,
                    Duration::from_secs(timeout_seconds),
                )?)
            }
            "memory" => WorkerBackend::Memory {
                replication_lag: env.parse("MEMORY_REPLICATION_LAG", 2_u32)?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "DIRSWEEP_BACKEND must be 'graph' or 'memory', got '{other}'"
                )));
            }
        };

        let resource_type = DirectoryResourceType::from_str(
            env.required("DELETE_RESOURCE_TYPE")?.as_str(),
        )?;

        let object_ids: Vec<String> = env
            .required("DELETE_OBJECT_IDS")?
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
            .collect();
        if object_ids.is_empty() {
            return Err(AppError::Validation(
                "DELETE_OBJECT_IDS must list at least one object id".to_owned(),
            ));
        }

        let hard_delete = env.parse_bool("DELETE_HARD", false)?;
        let max_retries = env.parse("DELETE_MAX_RETRIES", 0_u32)?;
        let retry_interval = Duration::from_millis(env.parse("DELETE_RETRY_INTERVAL_MS", 0_u64)?);
        let concurrency = env.parse("WORKER_CONCURRENCY", 4_usize)?;
        if concurrency == 0 {
            return Err(AppError::Validation(
                "WORKER_CONCURRENCY must be greater than zero".to_owned(),
            ));
        }

        let deadline = env
            .optional("WORKER_DEADLINE_SECONDS")
            .map(|value| {
                value.parse::<u64>().map_err(|error| {
                    AppError::Validation(format!(
                        "invalid WORKER_DEADLINE_SECONDS value '{value}': {error}"
                    ))
                })
            })
            .transpose()?
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs);

        Ok(Self {
            backend,
            resource_type,
            object_ids,
            hard_delete,
            max_retries,
            retry_interval,
            concurrency,
            deadline,
        })
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, name: &str) -> AppResult<String> {
        self.optional(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    fn parse<T>(&self, name: &str, default: T) -> AppResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(value) => value.parse::<T>().map_err(|error| {
                AppError::Validation(format!("invalid {name} value '{value}': {error}"))
            }),
            None => Ok(default),
        }
    }

    fn parse_bool(&self, name: &str, default: bool) -> AppResult<bool> {
        match self.optional(name) {
            Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
            Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => Err(AppError::Validation(format!(
                "invalid {name} value '{value}': expected true or false"
            ))),
            None => Ok(default),
        }
    }
}
