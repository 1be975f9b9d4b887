//! Position Hierarchy Engine Tests
//!
//! End-to-end checks of the hierarchy engine through the public API:
//!
//! - Creation and update validation (parent existence, partial updates, cycles)
//! - Cascading deletion (re-parenting, destruction of users and photos, rollback)
//! - Hierarchy materialization and children lookup
//!
//! Every test runs on its own libsql database in a temporary directory.

#[cfg(test)]
mod position_hierarchy_tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use orgchart_core::db::{DatabaseService, LibsqlStore, OrgStore};
    use orgchart_core::models::{
        Gender, NewPhoto, NewPosition, NewUser, PositionTreeNode, PositionUpdate,
    };
    use orgchart_core::services::{ErrorKind, PositionService};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    struct TestEnv {
        service: PositionService,
        store: Arc<dyn OrgStore>,
        db: Arc<DatabaseService>,
        _temp_dir: TempDir,
    }

    async fn setup() -> Result<TestEnv> {
        let temp_dir = TempDir::new()?;
        let db = Arc::new(DatabaseService::new(temp_dir.path().join("orgchart.db")).await?);
        let store: Arc<dyn OrgStore> = Arc::new(LibsqlStore::new(db.clone()));
        Ok(TestEnv {
            service: PositionService::new(store.clone()),
            store,
            db,
            _temp_dir: temp_dir,
        })
    }

    async fn create(env: &TestEnv, name: &str, parent: Option<&str>) -> Result<String> {
        let mut input = NewPosition::new(name, format!("{} description", name));
        input.parent_id = parent.map(str::to_string);
        Ok(env.service.create_position(input).await?.id)
    }

    fn child_ids(node: &PositionTreeNode) -> Vec<&str> {
        node.children.iter().map(|c| c.id.as_str()).collect()
    }

    fn employee(n: u32, position_id: &str, photo_id: Option<i64>) -> NewUser {
        NewUser {
            full_name: format!("Employee {}", n),
            email: format!("e{}@example.com", n),
            phone: format!("+2519222222{:02}", n),
            birth_date: NaiveDate::from_ymd_opt(1985, 11, 2).unwrap(),
            hire_date: NaiveDate::from_ymd_opt(2015, 4, 20).unwrap(),
            gender: Gender::Female,
            position_id: Some(position_id.to_string()),
            photo_id,
        }
    }

    #[tokio::test]
    async fn test_create_with_nonexistent_parent_fails_without_write() -> Result<()> {
        let env = setup().await?;

        let err = assert_err!(
            env.service
                .create_position(NewPosition::new("CTO", "Technology").with_parent("ghost"))
                .await
        );

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(env.store.find_all_positions().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_without_parent_yields_root() -> Result<()> {
        let env = setup().await?;

        let ceo = assert_ok!(
            env.service
                .create_position(NewPosition::new("CEO", "Chief Executive Officer"))
                .await
        );

        assert!(ceo.parent_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_name_changes_only_name() -> Result<()> {
        let env = setup().await?;
        let a = create(&env, "A", None).await?;
        let b = create(&env, "B", Some(&a)).await?;

        env.service
            .update_position(&b, PositionUpdate::new().with_name("X"))
            .await?;

        let stored = env.store.find_position(&b).await?.unwrap();
        assert_eq!(stored.name, "X");
        assert_eq!(stored.description, "B description");
        assert_eq!(stored.parent_id.as_deref(), Some(a.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_reparent_to_bogus_parent_is_rejected() -> Result<()> {
        let env = setup().await?;
        let a = create(&env, "A", None).await?;
        let b = create(&env, "B", Some(&a)).await?;

        let err = env
            .service
            .update_position(&b, PositionUpdate::new().with_parent(Some("bogus".into())))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let stored = env.store.find_position(&b).await?.unwrap();
        assert_eq!(stored.parent_id.as_deref(), Some(a.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_reparents_grandchild() -> Result<()> {
        let env = setup().await?;
        let a = create(&env, "A", None).await?;
        let b = create(&env, "B", Some(&a)).await?;
        let c = create(&env, "C", Some(&b)).await?;

        env.service.delete_position(&b).await?;

        assert!(env.store.find_position(&b).await?.is_none());
        let c = env.store.find_position(&c).await?.unwrap();
        assert_eq!(c.parent_id.as_deref(), Some(a.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_destroys_user_and_photo() -> Result<()> {
        let env = setup().await?;
        let p = create(&env, "P", None).await?;
        let photo = env
            .store
            .insert_photo(NewPhoto::new("Portrait", "Studio portrait", "portrait.png"))
            .await?;
        let user = env.store.insert_user(employee(1, &p, Some(photo.id))).await?;

        env.service.delete_position(&p).await?;

        assert!(env.store.find_position(&p).await?.is_none());
        assert!(env.store.find_user(&user.id).await?.is_none());
        assert!(env.store.find_photo(photo.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_hierarchy_nesting_matches_parents() -> Result<()> {
        let env = setup().await?;
        let a = create(&env, "A", None).await?;
        let b = create(&env, "B", Some(&a)).await?;
        let c = create(&env, "C", Some(&a)).await?;
        let d = create(&env, "D", Some(&b)).await?;

        let forest = env.service.get_position_hierarchy().await?;

        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!(root.id, a);
        assert_eq!(child_ids(root), vec![b.as_str(), c.as_str()]);
        let node_b = &root.children[0];
        assert_eq!(child_ids(node_b), vec![d.as_str()]);
        assert!(root.children[1].children.is_empty());
        assert_eq!(root.size(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_children_lookup_on_leaf_and_unknown() -> Result<()> {
        let env = setup().await?;
        let leaf = create(&env, "Leaf", None).await?;

        assert!(env.service.get_children(&leaf).await?.is_empty());
        assert!(env.service.get_children("does-not-exist").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_update_is_identity() -> Result<()> {
        let env = setup().await?;
        let a = create(&env, "A", None).await?;
        let before = env.store.find_position(&a).await?.unwrap();

        let returned = env.service.update_position(&a, PositionUpdate::new()).await?;

        assert_eq!(returned, before);
        assert_eq!(env.store.find_position(&a).await?.unwrap(), before);
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_root_makes_children_roots() -> Result<()> {
        let env = setup().await?;
        let a = create(&env, "A", None).await?;
        let b = create(&env, "B", Some(&a)).await?;

        env.service.delete_position(&a).await?;

        assert!(env.store.find_position(&b).await?.unwrap().is_root());
        Ok(())
    }

    #[tokio::test]
    async fn test_reparent_under_descendant_rejected() -> Result<()> {
        let env = setup().await?;
        let a = create(&env, "A", None).await?;
        let b = create(&env, "B", Some(&a)).await?;
        let c = create(&env, "C", Some(&b)).await?;
        let before = env.service.get_position_hierarchy().await?;

        for new_parent in [&c, &b, &a] {
            let err = env
                .service
                .update_position(&a, PositionUpdate::new().with_parent(Some(new_parent.clone())))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }

        assert_eq!(env.service.get_position_hierarchy().await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_cascade_rolls_back_when_photo_delete_fails() -> Result<()> {
        let env = setup().await?;
        let a = create(&env, "A", None).await?;
        let b = create(&env, "B", Some(&a)).await?;
        let c = create(&env, "C", Some(&b)).await?;
        let photo = env
            .store
            .insert_photo(NewPhoto::new("Portrait", "Studio portrait", "portrait.png"))
            .await?;
        let user = env.store.insert_user(employee(1, &b, Some(photo.id))).await?;

        let conn = env.db.connect_with_timeout().await?;
        conn.execute(
            "CREATE TRIGGER block_photo_delete BEFORE DELETE ON photos
             BEGIN SELECT RAISE(ABORT, 'blocked'); END",
            (),
        )
        .await?;
        drop(conn);

        let err = env.service.delete_position(&b).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        assert!(env.store.find_position(&b).await?.is_some());
        assert_eq!(
            env.store.find_position(&c).await?.unwrap().parent_id.as_deref(),
            Some(b.as_str())
        );
        assert!(env.store.find_user(&user.id).await?.is_some());
        assert!(env.store.find_photo(photo.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_hierarchy_storage_failure_is_internal() -> Result<()> {
        let env = setup().await?;
        create(&env, "A", None).await?;

        let conn = env.db.connect()?;
        conn.execute("DROP TABLE users", ()).await?;
        conn.execute("DROP TABLE positions", ()).await?;
        drop(conn);

        let err = env.service.get_position_hierarchy().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.to_string(), "Internal error: failed to build hierarchy");
        Ok(())
    }
}
