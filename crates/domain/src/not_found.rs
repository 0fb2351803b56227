use dirsweep_core::{AppError, GraphErrorInfo};

/// `OData` error codes that Microsoft Graph uses for missing objects.
pub const NOT_FOUND_ERROR_CODES: &[&str] = &[
    "ResourceNotFound",
    "Request_ResourceNotFound",
    "ItemNotFound",
    "ErrorItemNotFound",
    "NotFound",
];

/// Lowercase message fragments that indicate a missing object.
pub const NOT_FOUND_MESSAGE_PATTERNS: &[&str] = &[
    "does not exist",
    "not found",
    "could not be found",
    "cannot be found",
    "no longer exists",
];

/// Returns whether the error detail describes a missing object.
///
/// Checks the HTTP status first, then the `OData` code, then the message.
/// Graph endpoints disagree on which of these they fill in, so any single
/// match is enough.
#[must_use]
pub fn is_not_found(info: &GraphErrorInfo) -> bool {
    if info.status_code() == Some(404) {
        return true;
    }

    if info
        .error_code()
        .is_some_and(|code| NOT_FOUND_ERROR_CODES.contains(&code))
    {
        return true;
    }

    let message = info.message().to_lowercase();
    NOT_FOUND_MESSAGE_PATTERNS
        .iter()
        .any(|pattern| message.contains(pattern))
}

/// Returns whether an application error describes a missing object.
#[must_use]
pub fn is_not_found_error(error: &AppError) -> bool {
    is_not_found(&GraphErrorInfo::from_app_error(error))
}
