//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Bill commands and the dues summary
pub mod bill;

/// General utility commands
pub mod general;

/// Bulk payment commands
pub mod payment;

/// Tenant management commands
pub mod tenant;

use crate::errors::Error;

// Export commands
pub use bill::*;
pub use general::*;
pub use payment::*;
pub use tenant::*;

/// True for errors caused by what the user typed, which are answered inline
/// instead of going through the framework error hook.
pub(crate) const fn is_user_error(error: &Error) -> bool {
    matches!(
        error,
        Error::InvalidInput { .. }
            | Error::DuplicateEntry { .. }
            | Error::TenantNotFound { .. }
            | Error::TenantExists { .. }
            | Error::BillNotFound { .. }
    )
}
