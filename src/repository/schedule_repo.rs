// ==========================================
// 讲道排班系统 - 排班与讲道安排仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 排班与其讲道安排必须在同一事务中落库
// ==========================================

use crate::domain::{Assignment, AssignmentStatus, Preacher, ScheduleDraft, ScheduleStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::preacher_repo::write_scores;
use crate::repository::row_codec::{
    bool_to_db, date_to_db, datetime_to_db, parse_date, parse_datetime, parse_time, time_to_db,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, Transaction};
use std::sync::{Arc, Mutex};

const SCHEDULE_COLUMNS: &str = r#"
    SELECT schedule_id, district_id, month, year, status, created_by, created_at, updated_at
    FROM schedule
"#;

const ASSIGNMENT_COLUMNS: &str = r#"
    SELECT a.assignment_id, a.schedule_id, a.church_id, a.preacher_id, a.date, a.time,
           a.service_name, a.status, a.topic_id, a.forced
    FROM assignment a
"#;

// ==========================================
// ScheduleRepository - 排班仓储
// ==========================================
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 判断区会在该月份是否已有排班
    pub fn exists_for_period(&self, district_id: &str, month: u32, year: i32) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists = conn
            .query_row(
                "SELECT 1 FROM schedule WHERE district_id = ?1 AND month = ?2 AND year = ?3 LIMIT 1",
                params![district_id, month, year],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    pub fn find_by_id(&self, schedule_id: &str) -> RepositoryResult<Option<ScheduleDraft>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE schedule_id = ?1", SCHEDULE_COLUMNS);
        let schedule = conn
            .query_row(&sql, params![schedule_id], map_schedule)
            .optional()?;
        Ok(schedule)
    }

    pub fn find_by_period(
        &self,
        district_id: &str,
        month: u32,
        year: i32,
    ) -> RepositoryResult<Option<ScheduleDraft>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE district_id = ?1 AND month = ?2 AND year = ?3", SCHEDULE_COLUMNS);
        let schedule = conn
            .query_row(&sql, params![district_id, month, year], map_schedule)
            .optional()?;
        Ok(schedule)
    }

    /// 在单个事务中写入排班及其全部讲道安排
    ///
    /// # 返回
    /// - Ok(count): 写入的讲道安排数量
    /// - Err(UniqueConstraintViolation): 同期排班已存在 (并发生成竞态)，整体回滚
    pub fn create_with_assignments(
        &self,
        schedule: &ScheduleDraft,
        assignments: &[Assignment],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        insert_schedule(&tx, schedule)?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO assignment (
                    assignment_id, schedule_id, church_id, preacher_id, date, time,
                    service_name, status, topic_id, forced
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )?;

            for a in assignments {
                stmt.execute(params![
                    a.assignment_id,
                    a.schedule_id,
                    a.church_id,
                    a.preacher_id,
                    date_to_db(a.date),
                    time_to_db(a.time),
                    a.service_name,
                    a.status.to_db_str(),
                    a.topic_id,
                    bool_to_db(a.forced),
                ])?;
            }
        }

        tx.commit()?;
        Ok(assignments.len())
    }

    /// 更新排班状态
    pub fn update_status(&self, schedule_id: &str, status: ScheduleStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = datetime_to_db(chrono::Local::now().naive_local());
        let affected = conn.execute(
            "UPDATE schedule SET status = ?2, updated_at = ?3 WHERE schedule_id = ?1",
            params![schedule_id, status.to_db_str(), now],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: schedule_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除排班 (讲道安排级联删除)
    pub fn delete(&self, schedule_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM schedule WHERE schedule_id = ?1", params![schedule_id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: schedule_id.to_string(),
            });
        }
        Ok(())
    }
}

fn insert_schedule(tx: &Transaction<'_>, s: &ScheduleDraft) -> RepositoryResult<()> {
    tx.execute(
        r#"
        INSERT INTO schedule (
            schedule_id, district_id, month, year, status, created_by, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            s.schedule_id,
            s.district_id,
            s.month,
            s.year,
            s.status.to_db_str(),
            s.created_by,
            datetime_to_db(s.created_at),
            datetime_to_db(s.updated_at),
        ],
    )?;
    Ok(())
}

fn map_schedule(row: &Row<'_>) -> SqliteResult<ScheduleDraft> {
    Ok(ScheduleDraft {
        schedule_id: row.get(0)?,
        district_id: row.get(1)?,
        month: row.get(2)?,
        year: row.get(3)?,
        status: ScheduleStatus::from_str(&row.get::<_, String>(4)?),
        created_by: row.get(5)?,
        created_at: parse_datetime(6, "created_at", &row.get::<_, String>(6)?)?,
        updated_at: parse_datetime(7, "updated_at", &row.get::<_, String>(7)?)?,
    })
}

// ==========================================
// AssignmentRepository - 讲道安排仓储
// ==========================================
pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn find_by_id(&self, assignment_id: &str) -> RepositoryResult<Option<Assignment>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE a.assignment_id = ?1", ASSIGNMENT_COLUMNS);
        let assignment = conn
            .query_row(&sql, params![assignment_id], map_assignment)
            .optional()?;
        Ok(assignment)
    }

    /// 查询排班下的全部讲道安排 (按日期、时间、教会)
    pub fn list_by_schedule(&self, schedule_id: &str) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE a.schedule_id = ?1 ORDER BY a.date ASC, a.time ASC, a.church_id ASC",
            ASSIGNMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let assignments = stmt
            .query_map(params![schedule_id], map_assignment)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(assignments)
    }

    /// 查询区会讲道人在 [from, to] 内占用中的讲道安排
    ///
    /// 占用状态: SCHEDULED / ACCEPTED / COMPLETED
    pub fn list_occupying_for_district(
        &self,
        district_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<Assignment>> {
        let sql = format!(
            r#"{}
            JOIN preacher p ON p.preacher_id = a.preacher_id
            WHERE p.district_id = ?1 AND a.date >= ?2 AND a.date <= ?3
            ORDER BY a.date ASC, a.time ASC, a.rowid ASC
            "#,
            ASSIGNMENT_COLUMNS
        );
        self.query_occupying(&sql, district_id, from, to)
    }

    /// 查询单个讲道人在 [from, to] 内占用中的讲道安排
    pub fn list_occupying_for_preacher(
        &self,
        preacher_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<Assignment>> {
        let sql = format!(
            "{} WHERE a.preacher_id = ?1 AND a.date >= ?2 AND a.date <= ?3 ORDER BY a.date ASC, a.time ASC",
            ASSIGNMENT_COLUMNS
        );
        self.query_occupying(&sql, preacher_id, from, to)
    }

    fn query_occupying(
        &self,
        sql: &str,
        key: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let assignments = stmt
            .query_map(params![key, date_to_db(from), date_to_db(to)], map_assignment)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(assignments.into_iter().filter(|a| a.status.occupies()).collect())
    }

    /// 更新讲道安排状态
    pub fn update_status(&self, assignment_id: &str, status: AssignmentStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        write_assignment_status(&conn, assignment_id, status)
    }

    /// 在单个事务中拒绝讲道安排并回写讲道人惩罚后的评分
    ///
    /// 任一写入失败时整体回滚
    pub fn decline_with_penalty(&self, assignment_id: &str, penalized: &Preacher) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        write_assignment_status(&tx, assignment_id, AssignmentStatus::Declined)?;
        write_scores(&tx, penalized)?;

        tx.commit()?;
        Ok(())
    }
}

fn write_assignment_status(
    conn: &Connection,
    assignment_id: &str,
    status: AssignmentStatus,
) -> RepositoryResult<()> {
    let affected = conn.execute(
        "UPDATE assignment SET status = ?2 WHERE assignment_id = ?1",
        params![assignment_id, status.to_db_str()],
    )?;
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "Assignment".to_string(),
            id: assignment_id.to_string(),
        });
    }
    Ok(())
}

fn map_assignment(row: &Row<'_>) -> SqliteResult<Assignment> {
    Ok(Assignment {
        assignment_id: row.get(0)?,
        schedule_id: row.get(1)?,
        church_id: row.get(2)?,
        preacher_id: row.get(3)?,
        date: parse_date(4, "date", &row.get::<_, String>(4)?)?,
        time: parse_time(5, "time", &row.get::<_, String>(5)?)?,
        service_name: row.get(6)?,
        status: AssignmentStatus::from_str(&row.get::<_, String>(7)?),
        topic_id: row.get(8)?,
        forced: row.get::<_, i32>(9)? != 0,
    })
}
