use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rolegate_core::{AppError, SubjectRef};
use rolegate_domain::{GuardDefinition, GuardName, GuardRegistry};
use tracing_subscriber::EnvFilter;

/// Storage adapter selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

/// Policy collaborator selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    Rbac,
    Permissive,
}

impl PolicyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rbac => "rbac",
            Self::Permissive => "permissive",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub guard_registry: GuardRegistry,
    pub policy_mode: PolicyMode,
    pub super_subjects: Vec<SubjectRef>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_owned())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        let database_url = match storage_backend {
            StorageBackend::Postgres => Some(required_non_empty_env("DATABASE_URL")?),
            StorageBackend::Memory => None,
        };
        if migrate_only && database_url.is_none() {
            return Err(AppError::Validation(
                "the migrate command requires STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let database_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value.trim().parse::<u32>().map_err(|error| {
                AppError::Validation(format!("invalid DATABASE_MAX_CONNECTIONS: {error}"))
            })?,
            Err(_) => 10,
        };

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let guard_registry = parse_guard_registry(
            env::var("AUTH_GUARDS")
                .unwrap_or_else(|_| "web=user".to_owned())
                .as_str(),
            env::var("AUTH_DEFAULT_GUARD")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .as_deref(),
        )?;

        let policy_mode = match env::var("POLICY_MODE")
            .unwrap_or_else(|_| "rbac".to_owned())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "rbac" => PolicyMode::Rbac,
            "permissive" => PolicyMode::Permissive,
            other => {
                return Err(AppError::Validation(format!(
                    "POLICY_MODE must be either 'rbac' or 'permissive', got '{other}'"
                )));
            }
        };

        let super_subjects =
            parse_subject_list(env::var("POLICY_SUPER_SUBJECTS").unwrap_or_default().as_str())?;

        Ok(Self {
            migrate_only,
            storage_backend,
            database_url,
            database_max_connections,
            frontend_url,
            api_host,
            api_port,
            guard_registry,
            policy_mode,
            super_subjects,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Parses `guard=type,type;guard=type` into a registry.
///
/// The default guard is the explicit one when given, otherwise the first listed guard.
pub fn parse_guard_registry(
    value: &str,
    default_guard: Option<&str>,
) -> Result<GuardRegistry, AppError> {
    let mut definitions = Vec::new();

    for entry in value.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (name, subject_types) = entry.split_once('=').ok_or_else(|| {
            AppError::Validation(format!(
                "AUTH_GUARDS entry '{entry}' must use the 'guard=type,type' form"
            ))
        })?;

        definitions.push(GuardDefinition {
            name: GuardName::new(name)?,
            subject_types: subject_types
                .split(',')
                .map(str::trim)
                .filter(|subject_type| !subject_type.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        });
    }

    let default_guard = match default_guard {
        Some(name) => GuardName::new(name)?,
        None => definitions
            .first()
            .map(|definition| definition.name.clone())
            .ok_or_else(|| {
                AppError::Validation("AUTH_GUARDS must configure at least one guard".to_owned())
            })?,
    };

    GuardRegistry::new(default_guard, definitions)
}

/// Parses a comma separated list of `type:id` subjects.
pub fn parse_subject_list(value: &str) -> Result<Vec<SubjectRef>, AppError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(SubjectRef::from_str)
        .collect()
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

#[cfg(test)]
mod tests;
