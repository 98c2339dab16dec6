//! Activity name validation

use crate::runtime::ActivityStore;
use thiserror::Error;

/// Why a candidate activity name was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameRejection {
    #[error("activity name cannot start with \"/\"")]
    InvalidNameFormat,
    #[error("activity with name \"{0}\" already exists in the chat")]
    DuplicateName(String),
}

/// Outcome of validating a name; `Err` is a user-correctable rejection
pub type Verdict = Result<(), NameRejection>;

/// Checks that need no storage access
pub fn check_name_format(name: &str) -> Verdict {
    if name.starts_with('/') {
        return Err(NameRejection::InvalidNameFormat);
    }
    Ok(())
}

/// Full validation of a name for `chat_id`.
///
/// The format check runs first so obviously bad input never reaches the store.
/// The outer `Err` is a storage fault, not a rejection.
pub async fn validate_name<S>(store: &S, chat_id: i64, name: &str) -> Result<Verdict, String>
where
    S: ActivityStore + ?Sized,
{
    if let Err(rejection) = check_name_format(name) {
        return Ok(Err(rejection));
    }

    if store
        .find_activity_by_chat_and_name(chat_id, name)
        .await?
        .is_some()
    {
        return Ok(Err(NameRejection::DuplicateName(name.to_string())));
    }

    Ok(Ok(()))
}
