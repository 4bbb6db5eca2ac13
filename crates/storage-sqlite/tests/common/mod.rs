use std::sync::Arc;
use tempfile::TempDir;

use tokenbank_core::groups::{GroupRepositoryTrait, NewGroup, NewMember};
use tokenbank_storage_sqlite::db::{
    create_pool, init, run_migrations, spawn_writer, DbPool, WriteHandle,
};
use tokenbank_storage_sqlite::groups::GroupRepository;

/// A fresh on-disk database with migrations applied and a writer actor
/// running. The temp dir lives as long as the struct.
pub struct TestDb {
    pub _dir: TempDir,
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
}

pub fn setup() -> TestDb {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db_path = init(&dir.path().to_string_lossy()).expect("init database");
    let pool = create_pool(&db_path).expect("create pool");
    run_migrations(&pool).expect("run migrations");
    let writer = spawn_writer((*pool).clone());
    TestDb {
        _dir: dir,
        pool,
        writer,
    }
}

/// Binds a group with one admin member and returns the repository.
pub async fn bind_group(db: &TestDb, group_ref: &str, admin_ref: &str) -> GroupRepository {
    let repo = GroupRepository::new(db.pool.clone(), db.writer.clone());
    repo.create_with_admin(
        NewGroup {
            external_id: group_ref.to_string(),
            name: format!("group {}", group_ref),
        },
        NewMember {
            external_id: admin_ref.to_string(),
            display_name: format!("member {}", admin_ref),
        },
    )
    .await
    .expect("bind group");
    repo
}
