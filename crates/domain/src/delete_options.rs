use std::time::Duration;

use dirsweep_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::DirectoryResourceType;

/// Retry budget for one verification polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_interval: Duration,
}

impl RetryPolicy {
    /// Defaults used when verifying that a soft delete became visible.
    pub const SOFT_DELETE: Self = Self {
        max_retries: 10,
        retry_interval: Duration::from_secs(3),
    };

    /// Defaults used when verifying that a hard delete removed the object.
    pub const HARD_DELETE: Self = Self {
        max_retries: 5,
        retry_interval: Duration::from_secs(2),
    };

    /// Creates a retry policy. Zero values fall back to the soft delete defaults.
    #[must_use]
    pub fn new(max_retries: u32, retry_interval: Duration) -> Self {
        Self {
            max_retries,
            retry_interval,
        }
        .or(Self::SOFT_DELETE)
    }

    /// Returns the maximum number of lookup attempts.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the base interval between lookup attempts.
    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Returns the worst-case time spent sleeping in one loop.
    #[must_use]
    pub fn max_total_delay(&self) -> Duration {
        self.retry_interval
            .mul_f64(1.5)
            .saturating_mul(self.max_retries.saturating_sub(1))
    }

    fn or(self, defaults: Self) -> Self {
        Self {
            max_retries: if self.max_retries == 0 {
                defaults.max_retries
            } else {
                self.max_retries
            },
            retry_interval: if self.retry_interval.is_zero() {
                defaults.retry_interval
            } else {
                self.retry_interval
            },
        }
    }
}

/// Parameters of one verified delete of a directory object.
///
/// Retry fields left at zero are unset and resolved by the operation that
/// consumes the options, since soft and hard delete verification use
/// different defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOptions {
    resource_type: DirectoryResourceType,
    resource_id: NonEmptyString,
    display_name: Option<String>,
    max_retries: u32,
    retry_interval: Duration,
}

impl DeleteOptions {
    /// Creates delete options for the given object with all retry fields unset.
    pub fn new(
        resource_type: DirectoryResourceType,
        resource_id: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            resource_type,
            resource_id: NonEmptyString::new(resource_id)?,
            display_name: None,
            max_retries: 0,
            retry_interval: Duration::ZERO,
        })
    }

    /// Attaches a display name used in log lines.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        self.display_name = Some(display_name).filter(|value| !value.trim().is_empty());
        self
    }

    /// Sets the maximum number of lookup attempts. Zero leaves it unset.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base interval between lookups. Zero leaves it unset.
    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Returns the resource type tag.
    #[must_use]
    pub fn resource_type(&self) -> DirectoryResourceType {
        self.resource_type
    }

    /// Returns the directory object identifier.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    /// Returns the display name, if one was attached.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the configured retry count, zero when unset.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the configured retry interval, zero when unset.
    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Resolves the retry policy, filling unset fields from `defaults`.
    #[must_use]
    pub fn retry_policy(&self, defaults: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            retry_interval: self.retry_interval,
        }
        .or(defaults)
    }

    /// Returns a copy with unset retry fields filled from `defaults`.
    #[must_use]
    pub fn with_defaults(&self, defaults: RetryPolicy) -> Self {
        let policy = self.retry_policy(defaults);
        Self {
            max_retries: policy.max_retries,
            retry_interval: policy.retry_interval,
            ..self.clone()
        }
    }
}
