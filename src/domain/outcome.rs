use serde::{Serialize, Serializer};

use crate::domain::error::{CoreError, ErrorCode};

/// The result shape every public entry point hands across the core boundary.
///
/// Serialises as `{"success": true, ...payload}` or
/// `{"success": false, "error": "...", "errorCode": "..."}` so the caller can
/// branch on `success` without knowing the Rust error types. Using an enum
/// forces Rust callers to handle the failure case explicitly.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Failure(Failure),
}

/// A failed call: human-readable message plus a machine-readable category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{error}")]
pub struct Failure {
    pub error: String,
    pub error_code: ErrorCode,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// The payload, if the call succeeded.
    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(v) => Some(v),
            Outcome::Failure(_) => None,
        }
    }

    /// The failure, if the call failed.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(f) => Some(f),
        }
    }

    /// Convert back into a `Result` for `?`-style Rust callers.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure(f) => Err(f),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T>
where
    E: Into<CoreError>,
{
    fn from(res: Result<T, E>) -> Self {
        match res {
            Ok(v) => Outcome::Success(v),
            Err(e) => {
                let err: CoreError = e.into();
                Outcome::Failure(Failure {
                    error: err.to_string(),
                    error_code: err.code(),
                })
            }
        }
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Succeeded<'a, T> {
            success: bool,
            #[serde(flatten)]
            payload: &'a T,
        }

        #[derive(Serialize)]
        struct Failed<'a> {
            success: bool,
            #[serde(flatten)]
            failure: &'a Failure,
        }

        match self {
            Outcome::Success(payload) => Succeeded {
                success: true,
                payload,
            }
            .serialize(serializer),
            Outcome::Failure(failure) => Failed {
                success: false,
                failure,
            }
            .serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{CompareError, SourceError};
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        sql: String,
    }

    #[test]
    fn success_flattens_payload() {
        let out: Outcome<Payload> = Ok::<_, CoreError>(Payload { sql: "x".into() }).into();
        assert!(out.is_success());
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"success": true, "sql": "x"})
        );
    }

    #[test]
    fn failure_carries_message_and_code() {
        let out: Outcome<Payload> = Err::<Payload, _>(SourceError::not_found("connection", "c1")).into();
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"success": false, "error": "connection not found", "errorCode": "NOT_FOUND"})
        );
    }

    #[test]
    fn into_result_round_trips_failure() {
        let out: Outcome<()> =
            Err::<(), _>(CompareError::InvalidComparisonConfig("no keys".into())).into();
        let err = out.into_result().unwrap_err();
        assert_eq!(err.error_code, ErrorCode::InvalidComparisonConfig);
        assert_eq!(err.to_string(), "invalid comparison config: no keys");
    }
}
