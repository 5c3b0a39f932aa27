// ==========================================
// 讲道排班系统 - 讲道人与不可用时段仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::{ApprovalStatus, Preacher, RoleSet, UnavailabilityPeriod};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{bool_to_db, date_to_db, parse_date};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const PREACHER_COLUMNS: &str = r#"
    SELECT preacher_id, district_id, name, roles, approval_status, active,
           evaluation_score, frequency_score, punctuality_score, effective_score,
           frequency_rate, punctuality_rate,
           total_assignments, completed_assignments, missed_assignments, declined_assignments,
           monthly_cap
    FROM preacher
"#;

// ==========================================
// PreacherRepository - 讲道人仓储
// ==========================================
pub struct PreacherRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PreacherRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create(&self, p: &Preacher) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO preacher (
                preacher_id, district_id, name, roles, approval_status, active,
                evaluation_score, frequency_score, punctuality_score, effective_score,
                frequency_rate, punctuality_rate,
                total_assignments, completed_assignments, missed_assignments, declined_assignments,
                monthly_cap
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                p.preacher_id,
                p.district_id,
                p.name,
                p.roles.to_db_str(),
                p.approval_status.to_db_str(),
                bool_to_db(p.active),
                p.evaluation_score,
                p.frequency_score,
                p.punctuality_score,
                p.effective_score,
                p.frequency_rate,
                p.punctuality_rate,
                p.total_assignments,
                p.completed_assignments,
                p.missed_assignments,
                p.declined_assignments,
                p.monthly_cap,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, preacher_id: &str) -> RepositoryResult<Option<Preacher>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE preacher_id = ?1", PREACHER_COLUMNS);
        let preacher = conn
            .query_row(&sql, params![preacher_id], map_preacher)
            .optional()?;
        Ok(preacher)
    }

    /// 查询区会内可参与排班的讲道人
    ///
    /// 过滤: 启用 + 已审批 + 具备讲道角色
    /// 顺序: 插入顺序 (rowid)，排序由评分引擎完成
    pub fn list_schedulable_by_district(&self, district_id: &str) -> RepositoryResult<Vec<Preacher>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE district_id = ?1 AND active = 1 AND approval_status = ?2 ORDER BY rowid ASC",
            PREACHER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let preachers = stmt
            .query_map(
                params![district_id, ApprovalStatus::Approved.to_db_str()],
                map_preacher,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(preachers.into_iter().filter(|p| p.is_schedulable()).collect())
    }

    /// 回写评分与统计字段
    pub fn update_scores(&self, p: &Preacher) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_scores(&conn, p)
    }
}

/// 写入讲道人评分与统计 (可在外部事务内调用)
pub(crate) fn write_scores(conn: &Connection, p: &Preacher) -> RepositoryResult<()> {
    let affected = conn.execute(
        r#"
        UPDATE preacher SET
            evaluation_score = ?2,
            frequency_score = ?3,
            punctuality_score = ?4,
            effective_score = ?5,
            frequency_rate = ?6,
            punctuality_rate = ?7,
            total_assignments = ?8,
            completed_assignments = ?9,
            missed_assignments = ?10,
            declined_assignments = ?11
        WHERE preacher_id = ?1
        "#,
        params![
            p.preacher_id,
            p.evaluation_score,
            p.frequency_score,
            p.punctuality_score,
            p.effective_score,
            p.frequency_rate,
            p.punctuality_rate,
            p.total_assignments,
            p.completed_assignments,
            p.missed_assignments,
            p.declined_assignments,
        ],
    )?;

    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "Preacher".to_string(),
            id: p.preacher_id.clone(),
        });
    }
    Ok(())
}

fn map_preacher(row: &Row<'_>) -> SqliteResult<Preacher> {
    Ok(Preacher {
        preacher_id: row.get(0)?,
        district_id: row.get(1)?,
        name: row.get(2)?,
        roles: RoleSet::from_db_str(&row.get::<_, String>(3)?),
        approval_status: ApprovalStatus::from_str(&row.get::<_, String>(4)?),
        active: row.get::<_, i32>(5)? != 0,
        evaluation_score: row.get(6)?,
        frequency_score: row.get(7)?,
        punctuality_score: row.get(8)?,
        effective_score: row.get(9)?,
        frequency_rate: row.get(10)?,
        punctuality_rate: row.get(11)?,
        total_assignments: row.get(12)?,
        completed_assignments: row.get(13)?,
        missed_assignments: row.get(14)?,
        declined_assignments: row.get(15)?,
        monthly_cap: row.get(16)?,
    })
}

// ==========================================
// UnavailabilityRepository - 不可用时段仓储
// ==========================================
pub struct UnavailabilityRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UnavailabilityRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create(&self, period: &UnavailabilityPeriod) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO unavailability (period_id, preacher_id, start_date, end_date, reason, active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                period.period_id,
                period.preacher_id,
                date_to_db(period.start_date),
                date_to_db(period.end_date),
                period.reason,
                bool_to_db(period.active),
            ],
        )?;
        Ok(())
    }

    /// 查询区会讲道人在 [from, to] 内有交集的启用时段
    pub fn list_active_overlapping_for_district(
        &self,
        district_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<UnavailabilityPeriod>> {
        self.query_periods(
            r#"
            SELECT u.period_id, u.preacher_id, u.start_date, u.end_date, u.reason, u.active
            FROM unavailability u
            JOIN preacher p ON p.preacher_id = u.preacher_id
            WHERE p.district_id = ?1 AND u.active = 1
              AND u.start_date <= ?3 AND u.end_date >= ?2
            ORDER BY u.rowid ASC
            "#,
            district_id,
            from,
            to,
        )
    }

    /// 查询单个讲道人在 [from, to] 内有交集的启用时段
    pub fn list_active_overlapping_for_preacher(
        &self,
        preacher_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<UnavailabilityPeriod>> {
        self.query_periods(
            r#"
            SELECT period_id, preacher_id, start_date, end_date, reason, active
            FROM unavailability
            WHERE preacher_id = ?1 AND active = 1
              AND start_date <= ?3 AND end_date >= ?2
            ORDER BY rowid ASC
            "#,
            preacher_id,
            from,
            to,
        )
    }

    fn query_periods(
        &self,
        sql: &str,
        key: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<UnavailabilityPeriod>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let periods = stmt
            .query_map(params![key, date_to_db(from), date_to_db(to)], |row| {
                Ok(UnavailabilityPeriod {
                    period_id: row.get(0)?,
                    preacher_id: row.get(1)?,
                    start_date: parse_date(2, "start_date", &row.get::<_, String>(2)?)?,
                    end_date: parse_date(3, "end_date", &row.get::<_, String>(3)?)?,
                    reason: row.get(4)?,
                    active: row.get::<_, i32>(5)? != 0,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(periods)
    }
}
