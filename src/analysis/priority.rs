// Processing priority for large scans
//
// Coarser than role classification: entry points and controllers first, then
// the service/data layer, then everything else.

use super::roles::{directory_role, name_role, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// File names that start an application
const ENTRY_FILES: &[&str] = &[
    "program.cs",
    "startup.cs",
    "main.py",
    "__main__.py",
    "app.py",
    "manage.py",
    "wsgi.py",
    "asgi.py",
];

/// Processing priority; sorts with `High` first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank a file by its path alone
pub fn rank(path: &Path) -> Priority {
    let is_entry = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| ENTRY_FILES.contains(&n.to_ascii_lowercase().as_str()));
    if is_entry {
        return Priority::High;
    }

    let role = name_role(path)
        .or_else(|| directory_role(path))
        .map(|c| c.role);
    match role {
        Some(Role::Controller) => Priority::High,
        Some(Role::Service | Role::Repository | Role::Handler | Role::Entity | Role::DbContext) => {
            Priority::Medium
        }
        _ => Priority::Low,
    }
}
