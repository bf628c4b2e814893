use std::path::Path;

use litediff::{AppConfig, DbConfig, DiffType, OutputConfig, SyncConfig};
use pretty_assertions::assert_eq;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

async fn create_db(path: &Path, statements: &[&str]) -> SqlitePool {
    let opts = SqliteConnectOptions::new().filename(path).create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    for stmt in statements {
        sqlx::raw_sql(stmt).execute(&pool).await.unwrap();
    }
    pool
}

fn config(dir: &Path) -> AppConfig {
    let db = |name: &str| DbConfig {
        path: dir.join(name).to_string_lossy().into_owned(),
        key: None,
        label: None,
    };
    AppConfig {
        source: db("dev.db"),
        target: db("prod.db"),
        tables: vec![],
        sync: SyncConfig::default(),
        output: OutputConfig {
            dir: dir.join("out").to_string_lossy().into_owned(),
            snapshot_dir: dir.join("snapshots").to_string_lossy().into_owned(),
        },
    }
}

const DEV: &[&str] = &[
    "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL, age INTEGER DEFAULT 0)",
    "CREATE UNIQUE INDEX idx_users_email ON users (email)",
    "CREATE TABLE posts (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT
    )",
    "CREATE INDEX idx_posts_user ON posts (user_id)",
    "CREATE TRIGGER trg_posts_title AFTER INSERT ON posts BEGIN UPDATE posts SET title = trim(new.title) WHERE id = new.id; END",
];

const PROD: &[&str] = &[
    "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL, legacy TEXT)",
    "CREATE TABLE old_audit (id INTEGER PRIMARY KEY, payload TEXT)",
    "INSERT INTO users (id, email, legacy) VALUES (1, 'a@example.com', 'x')",
];

#[tokio::test]
async fn applying_the_migration_converges_the_schemas() {
    let dir = tempfile::tempdir().unwrap();
    let _dev = create_db(&dir.path().join("dev.db"), DEV).await;
    let prod = create_db(&dir.path().join("prod.db"), PROD).await;
    let cfg = config(dir.path());

    let (cmp, sql) = litediff::run_schema(&cfg, None).await.unwrap();
    assert_eq!(cmp.source_label, "dev");
    assert_eq!(cmp.target_label, "prod");
    assert_eq!((cmp.summary.added, cmp.summary.removed, cmp.summary.modified), (1, 1, 1));

    let users = cmp.table_diffs.iter().find(|d| d.name == "users").unwrap();
    assert_eq!(users.diff_type, DiffType::Modified);

    assert_eq!(
        sql.statements,
        vec![
            "DROP TABLE IF EXISTS old_audit;".to_string(),
            "CREATE TABLE posts (\n  id INTEGER PRIMARY KEY,\n  user_id INTEGER NOT NULL,\n  title TEXT,\n  \
             FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE\n);"
                .to_string(),
            "CREATE INDEX idx_posts_user ON posts (user_id);".to_string(),
            "CREATE TRIGGER trg_posts_title AFTER INSERT ON posts BEGIN UPDATE posts SET title = trim(new.title) WHERE id = new.id; END;"
                .to_string(),
            "ALTER TABLE users ADD COLUMN age INTEGER DEFAULT 0;".to_string(),
            "ALTER TABLE users DROP COLUMN legacy;".to_string(),
            "CREATE UNIQUE INDEX idx_users_email ON users (email);".to_string(),
        ]
    );
    assert!(sql.warnings.iter().any(|w| w.starts_with("Table old_audit will be dropped")));
    assert!(sql.warnings.iter().any(|w| w.starts_with("Column legacy will be dropped from table users")));

    for stmt in &sql.statements {
        sqlx::raw_sql(stmt).execute(&prod).await.unwrap();
    }

    let (after, remaining) = litediff::run_schema(&cfg, None).await.unwrap();
    assert!(after.summary.is_identical(), "still differs: {:?}", after.table_diffs);
    assert!(remaining.is_empty());

    // existing rows survive ADD COLUMN with the default applied
    let age: i64 = sqlx::query_scalar("SELECT age FROM users WHERE id = 1")
        .fetch_one(&prod)
        .await
        .unwrap();
    assert_eq!(age, 0);
}

#[tokio::test]
async fn column_type_change_is_a_warning_not_a_statement() {
    let dir = tempfile::tempdir().unwrap();
    let _dev = create_db(&dir.path().join("dev.db"), &["CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)"]).await;
    let _prod = create_db(&dir.path().join("prod.db"), &["CREATE TABLE t (id INTEGER PRIMARY KEY, v INTEGER)"]).await;

    let (cmp, sql) = litediff::run_schema(&config(dir.path()), None).await.unwrap();
    assert_eq!(cmp.summary.modified, 1);
    assert!(sql.statements.is_empty());
    assert_eq!(sql.warnings.len(), 2);
    assert!(sql.warnings[0].contains("Column v on table t changed"));
    assert!(sql.warnings[0].contains("rebuild the table"));
    assert!(sql.warnings[1].starts_with("No SQL statements were generated"));
}

#[tokio::test]
async fn composite_keys_migrate_into_usable_tables() {
    let dir = tempfile::tempdir().unwrap();
    let _dev = create_db(
        &dir.path().join("dev.db"),
        &[
            "CREATE TABLE parent (a INTEGER NOT NULL, b INTEGER NOT NULL, PRIMARY KEY (b, a))",
            "CREATE TABLE child (id INTEGER PRIMARY KEY, pa INTEGER, pb INTEGER, \
             FOREIGN KEY (pa, pb) REFERENCES parent (a, b))",
        ],
    )
    .await;
    let prod = create_db(&dir.path().join("prod.db"), &[]).await;
    let cfg = config(dir.path());

    let (_, sql) = litediff::run_schema(&cfg, None).await.unwrap();
    assert_eq!(
        sql.statements,
        vec![
            "CREATE TABLE child (\n  id INTEGER PRIMARY KEY,\n  pa INTEGER,\n  pb INTEGER,\n  \
             FOREIGN KEY (pa, pb) REFERENCES parent (a, b)\n);"
                .to_string(),
            "CREATE TABLE parent (\n  a INTEGER NOT NULL,\n  b INTEGER NOT NULL,\n  PRIMARY KEY (b, a)\n);"
                .to_string(),
        ]
    );

    for stmt in &sql.statements {
        sqlx::raw_sql(stmt).execute(&prod).await.unwrap();
    }
    sqlx::raw_sql(
        "PRAGMA foreign_keys = ON; \
         INSERT INTO parent (a, b) VALUES (1, 2); \
         INSERT INTO child (id, pa, pb) VALUES (10, 1, 2);",
    )
    .execute(&prod)
    .await
    .unwrap();

    let (after, _) = litediff::run_schema(&cfg, None).await.unwrap();
    assert!(after.summary.is_identical(), "still differs: {:?}", after.table_diffs);
}
