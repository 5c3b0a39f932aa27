// ==========================================
// 讲道排班系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发生成时的偶发 busy 错误
// - 幂等建表 (init_schema)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 时间存储格式
pub const TIME_FORMAT: &str = "%H:%M";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表语句
///
/// 说明：
/// - schedule 表 UNIQUE(district_id, month, year) 兜底同期并发生成的竞态
/// - assignment 表 UNIQUE(schedule_id, church_id, date, time)
/// - service_time 表 CHECK 作用域二选一
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS district (
    district_id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS church (
    church_id TEXT PRIMARY KEY,
    district_id TEXT NOT NULL REFERENCES district(district_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS service_time (
    template_id TEXT PRIMARY KEY,
    church_id TEXT REFERENCES church(church_id) ON DELETE CASCADE,
    district_id TEXT REFERENCES district(district_id) ON DELETE CASCADE,
    weekday TEXT NOT NULL,
    time TEXT NOT NULL,
    service_name TEXT,
    requires_preacher INTEGER NOT NULL DEFAULT 1,
    active INTEGER NOT NULL DEFAULT 1,
    CHECK ((church_id IS NULL) <> (district_id IS NULL))
);

CREATE TABLE IF NOT EXISTS preacher (
    preacher_id TEXT PRIMARY KEY,
    district_id TEXT NOT NULL REFERENCES district(district_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    roles TEXT NOT NULL DEFAULT 'PREACHER',
    approval_status TEXT NOT NULL DEFAULT 'APPROVED',
    active INTEGER NOT NULL DEFAULT 1,
    evaluation_score REAL NOT NULL DEFAULT 0,
    frequency_score REAL NOT NULL DEFAULT 0,
    punctuality_score REAL NOT NULL DEFAULT 0,
    effective_score REAL NOT NULL DEFAULT 0,
    frequency_rate REAL NOT NULL DEFAULT 100,
    punctuality_rate REAL NOT NULL DEFAULT 100,
    total_assignments INTEGER NOT NULL DEFAULT 0,
    completed_assignments INTEGER NOT NULL DEFAULT 0,
    missed_assignments INTEGER NOT NULL DEFAULT 0,
    declined_assignments INTEGER NOT NULL DEFAULT 0,
    monthly_cap INTEGER
);

CREATE TABLE IF NOT EXISTS unavailability (
    period_id TEXT PRIMARY KEY,
    preacher_id TEXT NOT NULL REFERENCES preacher(preacher_id) ON DELETE CASCADE,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    reason TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    CHECK (end_date >= start_date)
);

CREATE TABLE IF NOT EXISTS topic (
    topic_id TEXT PRIMARY KEY,
    code INTEGER NOT NULL UNIQUE,
    organization_id TEXT NOT NULL,
    title TEXT NOT NULL,
    recurrence TEXT NOT NULL,
    exact_date TEXT,
    weekday TEXT,
    whole_week INTEGER NOT NULL DEFAULT 0,
    week_of_month INTEGER,
    valid_from TEXT,
    valid_until TEXT,
    active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS schedule (
    schedule_id TEXT PRIMARY KEY,
    district_id TEXT NOT NULL REFERENCES district(district_id) ON DELETE CASCADE,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'DRAFT',
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (district_id, month, year)
);

CREATE TABLE IF NOT EXISTS assignment (
    assignment_id TEXT PRIMARY KEY,
    schedule_id TEXT NOT NULL REFERENCES schedule(schedule_id) ON DELETE CASCADE,
    church_id TEXT NOT NULL REFERENCES church(church_id) ON DELETE CASCADE,
    preacher_id TEXT NOT NULL REFERENCES preacher(preacher_id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    service_name TEXT,
    status TEXT NOT NULL DEFAULT 'SCHEDULED',
    topic_id TEXT REFERENCES topic(topic_id) ON DELETE SET NULL,
    forced INTEGER NOT NULL DEFAULT 0,
    UNIQUE (schedule_id, church_id, date, time)
);

CREATE INDEX IF NOT EXISTS idx_assignment_preacher_date ON assignment(preacher_id, date);
CREATE INDEX IF NOT EXISTS idx_unavailability_preacher ON unavailability(preacher_id, start_date, end_date);
"#;

/// 幂等初始化数据库 schema
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}
