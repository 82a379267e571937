use std::fmt;
use std::path::PathBuf;

/// Failures raised while reconciling changes against local repositories
#[derive(Debug)]
pub enum AuditError {
    /// No repository at the mapped checkout path. Absorbed by the presence check.
    RepoNotFound { repo: String, path: PathBuf },
    /// The target branch is missing from a repository that exists
    BranchNotFound { repo: String, branch: String },
    /// The configured bulletin pattern does not compile
    InvalidTopicPattern { pattern: String, reason: String },
    /// Reading objects from a local repository failed
    Vcs { repo: String, message: String },
}

impl fmt::Display for AuditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditError::RepoNotFound { repo, path } => {
                write!(f, "Failed to find repository {} at {:?}", repo, path)
            }
            AuditError::BranchNotFound { repo, branch } => {
                write!(f, "Failed to find {} head in repository {}", branch, repo)
            }
            AuditError::InvalidTopicPattern { pattern, reason } => {
                write!(f, "Invalid topic pattern {:?}: {}", pattern, reason)
            }
            AuditError::Vcs { repo, message } => {
                write!(f, "Failed to read repository {}: {}", repo, message)
            }
        }
    }
}

impl std::error::Error for AuditError {}

/// User-friendly error wrapper
#[derive(Debug)]
pub struct UserError {
    message: String,
    details: Option<String>,
    suggestion: Option<String>,
}

impl UserError {
    /// Create a new user error
    pub fn new(message: impl Into<String>) -> Self {
        UserError {
            message: message.into(),
            details: None,
            suggestion: None,
        }
    }

    /// Add details about the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Add a suggestion for how to fix the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    /// Full text shown to the user: message, details and hint
    pub fn render(&self) -> String {
        let mut out = format!("\nError: {}\n", self.message);

        if let Some(ref details) = self.details {
            out.push_str(&format!("\n   {}\n", details));
        }

        if let Some(ref suggestion) = self.suggestion {
            out.push_str(&format!("\nHint: {}\n", suggestion));
        }
        out
    }

    /// Print the error to stderr
    pub fn display(&self) {
        eprint!("{}", self.render());
    }
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref details) = self.details {
            write!(f, ": {}", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for UserError {}

/// Convert fatal errors to user-friendly messages
pub fn user_friendly_error(error: &anyhow::Error) -> UserError {
    if let Some(audit) = error.downcast_ref::<AuditError>() {
        return match audit {
            AuditError::BranchNotFound { repo, branch } => {
                UserError::new(format!("Target branch missing in {}", repo))
                    .with_details(audit.to_string())
                    .with_suggestion(format!(
                        "Check out or fetch '{}' in the local copy of {}, or set audit.target_branch",
                        branch, repo
                    ))
            }
            AuditError::InvalidTopicPattern { .. } => UserError::new("Invalid topic pattern")
                .with_details(audit.to_string())
                .with_suggestion("Fix audit.topic_pattern in the configuration file"),
            _ => UserError::new(audit.to_string()),
        };
    }

    let error_str = format!("{:#}", error);

    if error_str.contains("Failed to read snapshot") {
        return UserError::new("Cached changes not found")
            .with_details(error_str)
            .with_suggestion("Run once without --no-download to fetch and cache the changes");
    }

    if error_str.contains("Failed to parse snapshot") {
        return UserError::new("Cached changes are corrupt")
            .with_details(error_str)
            .with_suggestion("Delete the cache file and run without --no-download");
    }

    if error_str.contains("Failed to read config") {
        return UserError::new("Configuration file not found").with_details(error_str);
    }

    if error_str.contains("Failed to parse config") {
        return UserError::new("Invalid configuration file")
            .with_details(error_str)
            .with_suggestion("Check the TOML syntax of the configuration file");
    }

    if error_str.contains("Gerrit request") || error_str.contains("Gerrit response") {
        return UserError::new("Review server query failed")
            .with_details(error_str)
            .with_suggestion("Check your network connection and the gerrit.url setting");
    }

    UserError::new("An unexpected error occurred").with_details(error_str)
}
