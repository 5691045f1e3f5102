use std::{collections::HashMap, fmt, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;

/// Resource
///
/// The resource types the gate knows about. Anything not listed here cannot be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    User,
    Student,
    Mentor,
    Course,
    Enrollment,
    Batch,
    Hire,
    Dashboard,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::User => "user",
            Resource::Student => "student",
            Resource::Mentor => "mentor",
            Resource::Course => "course",
            Resource::Enrollment => "enrollment",
            Resource::Batch => "batch",
            Resource::Hire => "hire",
            Resource::Dashboard => "dashboard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Scope
///
/// How far a grant reaches: `Own` covers records owned by the caller, `Any` covers all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Own,
    Any,
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid policy document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{role}/{resource}/{operation} is granted more than once")]
    Duplicate {
        role: Role,
        resource: Resource,
        operation: Operation,
    },
}

/// One line of a policy document: a role gets the listed operations on a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Grant {
    pub role: Role,
    pub resource: Resource,
    pub operations: Vec<Operation>,
    pub scope: Scope,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    pub grants: Vec<Grant>,
}

/// RolePolicy
///
/// Static (role, resource, operation) -> scope table. Built once at startup and shared
/// read-only; a missing entry is a denial.
#[derive(Debug, Clone, PartialEq)]
pub struct RolePolicy {
    table: HashMap<(Role, Resource, Operation), Scope>,
}

const CRUD: [Operation; 4] = [
    Operation::Create,
    Operation::Read,
    Operation::Update,
    Operation::Delete,
];

impl RolePolicy {
    /// The table shipped with the service.
    pub fn standard() -> Self {
        use Operation::*;
        use Resource::*;
        use Scope::*;

        let mut grants = Vec::new();
        let mut grant = |role: Role, resource: Resource, operations: &[Operation], scope: Scope| {
            grants.push(Grant {
                role,
                resource,
                operations: operations.to_vec(),
                scope,
            });
        };

        for resource in [User, Student, Mentor, Course, Enrollment, Batch, Hire] {
            grant(Role::Admin, resource, &CRUD, Any);
        }
        grant(Role::Admin, Dashboard, &[Read], Any);

        grant(Role::Mentor, User, &[Read, Update], Own);
        grant(Role::Mentor, Student, &[Read], Any);
        grant(Role::Mentor, Mentor, &[Read], Any);
        grant(Role::Mentor, Mentor, &[Update], Own);
        grant(Role::Mentor, Course, &[Read], Any);
        grant(Role::Mentor, Course, &[Create, Update, Delete], Own);
        grant(Role::Mentor, Enrollment, &[Read], Own);
        grant(Role::Mentor, Batch, &[Read], Own);

        grant(Role::Student, User, &[Read, Update], Own);
        grant(Role::Student, Student, &[Read, Update], Own);
        grant(Role::Student, Mentor, &[Read], Any);
        grant(Role::Student, Course, &[Read], Any);
        grant(Role::Student, Enrollment, &[Create, Read, Delete], Own);

        // The built-in grants are disjoint.
        Self::from_grants(grants).unwrap_or_else(|_| Self::empty())
    }

    /// A table that denies everything.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn from_grants(grants: impl IntoIterator<Item = Grant>) -> Result<Self, PolicyError> {
        let mut table = HashMap::new();
        for grant in grants {
            for operation in grant.operations {
                let key = (grant.role, grant.resource, operation);
                if table.insert(key, grant.scope).is_some() {
                    return Err(PolicyError::Duplicate {
                        role: grant.role,
                        resource: grant.resource,
                        operation,
                    });
                }
            }
        }
        Ok(Self { table })
    }

    /// from_json
    ///
    /// Parses a policy document. Unknown role, resource, operation or scope names fail the
    /// parse instead of being skipped.
    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        let doc: PolicyDocument = serde_json::from_str(raw)?;
        Self::from_grants(doc.grants)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// The built-in table, or the one in `path` when given.
    pub fn load(path: Option<&str>) -> Result<Self, PolicyError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::standard()),
        }
    }

    /// lookup
    ///
    /// `None` means the triple is not granted.
    pub fn lookup(&self, role: Role, resource: Resource, operation: Operation) -> Option<Scope> {
        self.table.get(&(role, resource, operation)).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
