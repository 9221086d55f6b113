//! Identifies the user/project/domain an object belongs to.
use serde::Deserialize;
use serde::Serialize;

/// Ownership triple attached to clusters, nodes and actions.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Owner {
    pub user: String,
    pub project: String,
    pub domain: String,
}

impl Owner {
    pub fn new<S1, S2, S3>(user: S1, project: S2, domain: S3) -> Owner
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Owner {
            user: user.into(),
            project: project.into(),
            domain: domain.into(),
        }
    }
}
