//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_rbac_repository;
mod permissive_policy_check;
mod postgres_rbac_repository;

pub use in_memory_rbac_repository::InMemoryRbacRepository;
pub use permissive_policy_check::PermissivePolicyCheck;
pub use postgres_rbac_repository::PostgresRbacRepository;
