//! Entry validation: signature verification and structural checks.

use crate::entry::{Entry, ENTRY_VERSION, MAX_NEXT};
use crate::error::ValidationError;

/// Validate an entry's structure and signature.
///
/// This performs, in order:
/// - Version check
/// - Clock/author consistency
/// - Parent-ref rules (count, sorted, unique)
/// - Root/clock consistency (no parents ⇔ time 0 at the root side)
/// - Signature verification
///
/// Graph-level rules (parents resolvable, time strictly above each
/// parent) are checked by [`crate::log::Log::join`] against local state.
pub fn validate_entry(entry: &Entry) -> Result<(), ValidationError> {
    validate_entry_structure(entry)?;
    entry.verify()
}

/// Validate entry structure without signature verification.
///
/// Useful when the signature is already known to be good (e.g. an entry
/// re-read from trusted local storage).
pub fn validate_entry_structure(entry: &Entry) -> Result<(), ValidationError> {
    if entry.version != ENTRY_VERSION {
        return Err(ValidationError::UnsupportedVersion(entry.version));
    }

    if entry.clock.id != entry.author {
        return Err(ValidationError::ClockAuthorMismatch);
    }

    if entry.next.len() > MAX_NEXT {
        return Err(ValidationError::TooManyParents {
            max: MAX_NEXT,
            got: entry.next.len(),
        });
    }

    if entry.next.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ValidationError::UnsortedParents);
    }

    if entry.next.is_empty() && entry.clock.time != 0 {
        return Err(ValidationError::RootWithTime(entry.clock.time));
    }

    if !entry.next.is_empty() && entry.clock.time == 0 {
        return Err(ValidationError::ZeroTimeWithParents);
    }

    Ok(())
}
