// Architectural role classification
//
// Assigns each file one role from a closed set using cheap signals, strongest
// first: the file name, then the directory, then marker strings in the
// code of the file's language, then the shape of the extracted model. Every step is an ordered
// table and the first match wins, so results are deterministic.

use crate::parser::mask::mask_non_code;
use crate::parser::{SourceLanguage, SourceModel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Architectural role of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Controller,
    Service,
    Repository,
    Entity,
    Dto,
    Configuration,
    Handler,
    Middleware,
    Extension,
    Migration,
    Event,
    ValueObject,
    Command,
    Query,
    Validator,
    Exception,
    Utility,
    Interface,
    Abstraction,
    Builder,
    DbContext,
    /// Declares classes but matched no specific role
    Class,
    Unknown,
}

impl Role {
    pub const ALL: [Role; 23] = [
        Role::Controller,
        Role::Service,
        Role::Repository,
        Role::Entity,
        Role::Dto,
        Role::Configuration,
        Role::Handler,
        Role::Middleware,
        Role::Extension,
        Role::Migration,
        Role::Event,
        Role::ValueObject,
        Role::Command,
        Role::Query,
        Role::Validator,
        Role::Exception,
        Role::Utility,
        Role::Interface,
        Role::Abstraction,
        Role::Builder,
        Role::DbContext,
        Role::Class,
        Role::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Controller => "controller",
            Role::Service => "service",
            Role::Repository => "repository",
            Role::Entity => "entity",
            Role::Dto => "dto",
            Role::Configuration => "configuration",
            Role::Handler => "handler",
            Role::Middleware => "middleware",
            Role::Extension => "extension",
            Role::Migration => "migration",
            Role::Event => "event",
            Role::ValueObject => "value_object",
            Role::Command => "command",
            Role::Query => "query",
            Role::Validator => "validator",
            Role::Exception => "exception",
            Role::Utility => "utility",
            Role::Interface => "interface",
            Role::Abstraction => "abstraction",
            Role::Builder => "builder",
            Role::DbContext => "db_context",
            Role::Class => "class",
            Role::Unknown => "unknown",
        }
    }

    /// Human-readable plural, used as a section heading
    pub fn label(&self) -> &'static str {
        match self {
            Role::Controller => "Controllers",
            Role::Service => "Services",
            Role::Repository => "Repositories",
            Role::Entity => "Entities",
            Role::Dto => "DTOs",
            Role::Configuration => "Configurations",
            Role::Handler => "Handlers",
            Role::Middleware => "Middlewares",
            Role::Extension => "Extensions",
            Role::Migration => "Migrations",
            Role::Event => "Events",
            Role::ValueObject => "Value Objects",
            Role::Command => "Commands",
            Role::Query => "Queries",
            Role::Validator => "Validators",
            Role::Exception => "Exceptions",
            Role::Utility => "Utilities",
            Role::Interface => "Interfaces",
            Role::Abstraction => "Abstractions",
            Role::Builder => "Builders",
            Role::DbContext => "Database Contexts",
            Role::Class => "Classes",
            Role::Unknown => "Other",
        }
    }

    /// Layered documentation folder for files of this role
    pub fn folder(&self) -> &'static str {
        match self {
            Role::Controller => "api/controllers",
            Role::Dto => "api/models",
            Role::Middleware => "api/middlewares",
            Role::Service => "application/services",
            Role::Handler => "application/handlers",
            Role::Command => "application/commands",
            Role::Query => "application/queries",
            Role::Validator => "application/validators",
            Role::Entity => "domain/entities",
            Role::Event => "domain/events",
            Role::ValueObject => "domain/value-objects",
            Role::Repository => "infrastructure/repositories",
            Role::Configuration => "infrastructure/configurations",
            Role::Migration => "infrastructure/migrations",
            Role::DbContext => "infrastructure/contexts",
            Role::Extension => "shared/extensions",
            Role::Exception => "shared/exceptions",
            Role::Utility => "shared/utilities",
            Role::Interface => "shared/interfaces",
            Role::Abstraction => "shared/abstractions",
            Role::Builder => "shared/builders",
            Role::Class | Role::Unknown => "other",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

/// File-name suffixes, compared case-insensitively with `_` and `-` removed.
/// Longer suffixes sit before the shorter ones they end with.
const SUFFIX_RULES: &[(&str, Role)] = &[
    ("commandhandler", Role::Handler),
    ("queryhandler", Role::Handler),
    ("eventhandler", Role::Handler),
    ("controller", Role::Controller),
    ("modelsnapshot", Role::Migration),
    ("dbcontext", Role::DbContext),
    ("repository", Role::Repository),
    ("repositories", Role::Repository),
    ("services", Role::Service),
    ("service", Role::Service),
    ("handler", Role::Handler),
    ("handlers", Role::Handler),
    ("middleware", Role::Middleware),
    ("extensions", Role::Extension),
    ("extension", Role::Extension),
    ("configuration", Role::Configuration),
    ("config", Role::Configuration),
    ("settings", Role::Configuration),
    ("options", Role::Configuration),
    ("validator", Role::Validator),
    ("validators", Role::Validator),
    ("exception", Role::Exception),
    ("exceptions", Role::Exception),
    ("errors", Role::Exception),
    ("builder", Role::Builder),
    ("command", Role::Command),
    ("query", Role::Query),
    ("event", Role::Event),
    ("viewmodel", Role::Dto),
    ("viewmodels", Role::Dto),
    ("dto", Role::Dto),
    ("request", Role::Dto),
    ("response", Role::Dto),
    ("schemas", Role::Dto),
    ("schema", Role::Dto),
    ("serializers", Role::Dto),
    ("serializer", Role::Dto),
    ("views", Role::Controller),
    ("routes", Role::Controller),
    ("router", Role::Controller),
    ("models", Role::Entity),
    ("entity", Role::Entity),
    ("valueobject", Role::ValueObject),
    ("migration", Role::Migration),
    ("utilities", Role::Utility),
    ("utils", Role::Utility),
    ("util", Role::Utility),
    ("helpers", Role::Utility),
    ("helper", Role::Utility),
];

/// Directory names, compared the same way as suffixes
const DIRECTORY_RULES: &[(&str, Role)] = &[
    ("controllers", Role::Controller),
    ("endpoints", Role::Controller),
    ("routers", Role::Controller),
    ("views", Role::Controller),
    ("services", Role::Service),
    ("repositories", Role::Repository),
    ("repository", Role::Repository),
    ("entities", Role::Entity),
    ("models", Role::Entity),
    ("dtos", Role::Dto),
    ("contracts", Role::Dto),
    ("requests", Role::Dto),
    ("responses", Role::Dto),
    ("viewmodels", Role::Dto),
    ("schemas", Role::Dto),
    ("configurations", Role::Configuration),
    ("configuration", Role::Configuration),
    ("config", Role::Configuration),
    ("settings", Role::Configuration),
    ("handlers", Role::Handler),
    ("middlewares", Role::Middleware),
    ("middleware", Role::Middleware),
    ("extensions", Role::Extension),
    ("migrations", Role::Migration),
    ("events", Role::Event),
    ("valueobjects", Role::ValueObject),
    ("commands", Role::Command),
    ("queries", Role::Query),
    ("validators", Role::Validator),
    ("validation", Role::Validator),
    ("exceptions", Role::Exception),
    ("errors", Role::Exception),
    ("utilities", Role::Utility),
    ("utils", Role::Utility),
    ("helpers", Role::Utility),
    ("interfaces", Role::Interface),
    ("abstractions", Role::Abstraction),
    ("builders", Role::Builder),
    ("contexts", Role::DbContext),
];

/// C# marker substrings, matched on masked text; earlier entries win
const CSHARP_CONTENT_RULES: &[(&str, Role)] = &[
    ("ControllerBase", Role::Controller),
    ("[ApiController]", Role::Controller),
    (": Controller", Role::Controller),
    (": DbContext", Role::DbContext),
    ("DbSet<", Role::DbContext),
    (": Migration", Role::Migration),
    ("[Migration(", Role::Migration),
    ("IEntityTypeConfiguration<", Role::Configuration),
    ("IRequestHandler<", Role::Handler),
    ("INotificationHandler<", Role::Handler),
    ("ICommandHandler<", Role::Handler),
    ("IQueryHandler<", Role::Handler),
    ("AbstractValidator<", Role::Validator),
    ("RequestDelegate", Role::Middleware),
    ("IMiddleware", Role::Middleware),
    ("ICommand", Role::Command),
    ("IQuery<", Role::Query),
    ("INotification", Role::Event),
    ("IDomainEvent", Role::Event),
    (": ValueObject", Role::ValueObject),
    (": Exception", Role::Exception),
    ("(this ", Role::Extension),
    ("interface ", Role::Interface),
    ("abstract class", Role::Abstraction),
];

/// Python marker substrings, matched on masked text; earlier entries win
const PYTHON_CONTENT_RULES: &[(&str, Role)] = &[
    ("APIRouter(", Role::Controller),
    ("Blueprint(", Role::Controller),
    ("@app.route", Role::Controller),
    ("(Exception)", Role::Exception),
    ("(BaseModel)", Role::Dto),
    ("declarative_base", Role::Entity),
    ("models.Model", Role::Entity),
    ("(ABC)", Role::Abstraction),
];

/// Which signal decided a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// File name ends with this suffix
    Suffix(&'static str),
    /// File name follows an interface/abstraction naming convention
    Prefix(&'static str),
    /// A directory segment matched
    Directory(String),
    /// A content marker was found
    Content(&'static str),
    /// Decided from the extracted classes and functions
    Structure,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Suffix(s) => write!(f, "file name suffix `{}`", s),
            Signal::Prefix(p) => write!(f, "file name prefix `{}`", p),
            Signal::Directory(d) => write!(f, "directory `{}`", d),
            Signal::Content(m) => write!(f, "content marker `{}`", m),
            Signal::Structure => f.write_str("file structure"),
        }
    }
}

/// A role together with the signal that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub role: Role,
    pub signal: Signal,
}

/// Classify a file into its architectural role
pub fn classify(path: &Path, content: &str, model: Option<&SourceModel>) -> Role {
    classify_explained(path, content, model).role
}

/// Classify a file and report which signal decided
pub fn classify_explained(path: &Path, content: &str, model: Option<&SourceModel>) -> Classification {
    if let Some(found) = name_role(path) {
        return found;
    }
    if let Some(found) = directory_role(path) {
        return found;
    }
    if let Some(found) = content_role(path, content) {
        return found;
    }

    let role = match model {
        Some(m) if m.classes.iter().any(|c| c.is_exception()) => Role::Exception,
        Some(m) if !m.classes.is_empty() => Role::Class,
        Some(m) if !m.functions.is_empty() => Role::Utility,
        _ => Role::Unknown,
    };
    Classification {
        role,
        signal: Signal::Structure,
    }
}

/// Role implied by the file name alone
pub(crate) fn name_role(path: &Path) -> Option<Classification> {
    let stem = path.file_stem()?.to_str()?;
    let normalized = normalize(stem);

    if let Some(&(suffix, role)) = SUFFIX_RULES.iter().find(|(s, _)| normalized.ends_with(s)) {
        return Some(Classification {
            role,
            signal: Signal::Suffix(suffix),
        });
    }

    let chars: Vec<char> = stem.chars().take(3).collect();
    if let [first, second, third] = chars[..] {
        if first == 'I' && second.is_uppercase() && third.is_lowercase() {
            return Some(Classification {
                role: Role::Interface,
                signal: Signal::Prefix("I"),
            });
        }
    }

    for prefix in ["Abstract", "Base"] {
        let rest = stem.strip_prefix(prefix);
        if rest.and_then(|r| r.chars().next()).is_some_and(char::is_uppercase) {
            return Some(Classification {
                role: Role::Abstraction,
                signal: Signal::Prefix(prefix),
            });
        }
    }

    None
}

/// Role implied by the deepest matching directory
pub(crate) fn directory_role(path: &Path) -> Option<Classification> {
    let parent = path.parent()?;
    parent
        .components()
        .rev()
        .filter_map(|c| c.as_os_str().to_str())
        .find_map(|segment| {
            let normalized = normalize(segment);
            DIRECTORY_RULES
                .iter()
                .find(|(d, _)| *d == normalized)
                .map(|&(_, role)| Classification {
                    role,
                    signal: Signal::Directory(segment.to_string()),
                })
        })
}

/// First marker of the file's language present outside comments and strings
fn content_role(path: &Path, content: &str) -> Option<Classification> {
    let rules = match SourceLanguage::from_path(path)? {
        SourceLanguage::CSharp => CSHARP_CONTENT_RULES,
        SourceLanguage::Python => PYTHON_CONTENT_RULES,
    };
    let code = mask_non_code(content);
    rules
        .iter()
        .find(|(marker, _)| code.contains(marker))
        .map(|&(marker, role)| Classification {
            role,
            signal: Signal::Content(marker),
        })
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}
