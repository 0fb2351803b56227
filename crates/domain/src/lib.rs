//! Domain types and rules for verified directory deletes.

#![forbid(unsafe_code)]

mod delete_options;
mod jitter;
mod not_found;
mod resource;

pub use delete_options::{DeleteOptions, RetryPolicy};
pub use jitter::{jittered, jittered_delay};
pub use not_found::{
    NOT_FOUND_ERROR_CODES, NOT_FOUND_MESSAGE_PATTERNS, is_not_found, is_not_found_error,
};
pub use resource::DirectoryResourceType;
