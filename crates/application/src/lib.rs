//! Application services and ports.

#![forbid(unsafe_code)]

mod delete_ports;
mod delete_verification_service;

pub use delete_ports::{DeletedItemsDirectory, DirectoryObjectRemover};
pub use delete_verification_service::{
    DeletePhase, DeleteVerificationError, DeleteVerificationResult, DeleteVerificationService,
    ObservedError,
};
