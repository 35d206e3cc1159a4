use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Failed to connect to database `{}`", .path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("Failed to write report")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("Unknown parameter: `{0}`")]
    UnknownParameter(String),
    #[error("Backend failure: `{0}`")]
    Backend(String),
    #[error("{}", case_message(.case, .iteration))]
    Case {
        case: &'static str,
        /// `None` when the case failed before its timing loop started.
        iteration: Option<u32>,
        #[source]
        source: Box<Error>,
    },
}

fn case_message(case: &str, iteration: &Option<u32>) -> String {
    match iteration {
        Some(iteration) => format!("case `{case}` failed at iteration {iteration}"),
        None => format!("case `{case}` failed before its first iteration"),
    }
}

impl Error {
    pub(crate) fn in_case(self, case: &'static str, iteration: Option<u32>) -> Self {
        Error::Case {
            case,
            iteration,
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping the case context.
    pub fn root(&self) -> &Error {
        match self {
            Error::Case { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_case_context_message() {
        let err = Error::Backend("disk I/O error".into()).in_case("Single Reader", Some(7));
        assert_eq!(err.to_string(), "case `Single Reader` failed at iteration 7");
        assert!(matches!(err.root(), Error::Backend(_)));

        let err = Error::UnknownParameter("p3".into()).in_case("Execute Scalar", None);
        assert_eq!(
            err.to_string(),
            "case `Execute Scalar` failed before its first iteration"
        );
        assert_eq!(
            std::error::Error::source(&err).map(|e| e.to_string()),
            Some("Unknown parameter: `p3`".to_string())
        );
    }
}
