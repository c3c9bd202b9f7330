use std::sync::Arc;

use rolegate_application::{AuthorizationRepository, RbacRepositories};
use rolegate_core::AppError;
use rolegate_infrastructure::{InMemoryRbacRepository, PostgresRbacRepository};
use sqlx::PgPool;

use crate::api_config::StorageBackend;

pub(super) struct RepositorySet {
    pub(super) rbac_repositories: RbacRepositories,
    pub(super) authorization_repository: Arc<dyn AuthorizationRepository>,
}

pub(super) fn build_repository_set(
    storage_backend: StorageBackend,
    pool: Option<PgPool>,
) -> Result<RepositorySet, AppError> {
    match storage_backend {
        StorageBackend::Postgres => {
            let pool = pool.ok_or_else(|| {
                AppError::Internal("postgres backend selected without a connection pool".to_owned())
            })?;
            let repository = Arc::new(PostgresRbacRepository::new(pool));

            Ok(RepositorySet {
                rbac_repositories: RbacRepositories::from_backend(repository.clone()),
                authorization_repository: repository,
            })
        }
        StorageBackend::Memory => {
            let repository = Arc::new(InMemoryRbacRepository::new());

            Ok(RepositorySet {
                rbac_repositories: RbacRepositories::from_backend(repository.clone()),
                authorization_repository: repository,
            })
        }
    }
}
