// ==========================================
// 讲道排班系统 - 讲道主题仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 循环规则拆列存储 (recurrence + 规则字段)
// ==========================================

use crate::domain::types::{weekday_from_db_str, weekday_to_db_str};
use crate::domain::{RecurrenceRule, Topic};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{bool_to_db, date_to_db, parse_date, parse_opt_date};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const RECURRENCE_EXACT_DATE: &str = "EXACT_DATE";
const RECURRENCE_WEEKLY: &str = "WEEKLY";
const RECURRENCE_MONTHLY: &str = "MONTHLY";

pub struct TopicRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TopicRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create(&self, topic: &Topic) -> RepositoryResult<()> {
        let (recurrence, exact_date, weekday, whole_week, week_of_month) = match &topic.rule {
            RecurrenceRule::ExactDate { date } => {
                (RECURRENCE_EXACT_DATE, Some(date_to_db(*date)), None, false, None)
            }
            RecurrenceRule::Weekly { weekday, whole_week } => (
                RECURRENCE_WEEKLY,
                None,
                Some(weekday_to_db_str(*weekday)),
                *whole_week,
                None,
            ),
            RecurrenceRule::Monthly {
                week_of_month,
                weekday,
            } => (
                RECURRENCE_MONTHLY,
                None,
                Some(weekday_to_db_str(*weekday)),
                false,
                Some(*week_of_month),
            ),
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO topic (
                topic_id, code, organization_id, title, recurrence,
                exact_date, weekday, whole_week, week_of_month,
                valid_from, valid_until, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                topic.topic_id,
                topic.code,
                topic.organization_id,
                topic.title,
                recurrence,
                exact_date,
                weekday,
                bool_to_db(whole_week),
                week_of_month,
                topic.valid_from.map(date_to_db),
                topic.valid_until.map(date_to_db),
                bool_to_db(topic.active),
            ],
        )?;
        Ok(())
    }

    /// 查询联合会下全部启用主题 (按 code 升序)
    pub fn list_active_by_organization(&self, organization_id: &str) -> RepositoryResult<Vec<Topic>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT topic_id, code, organization_id, title, recurrence,
                   exact_date, weekday, whole_week, week_of_month,
                   valid_from, valid_until, active
            FROM topic
            WHERE organization_id = ?1 AND active = 1
            ORDER BY code ASC
            "#,
        )?;
        let mut rows = stmt.query(params![organization_id])?;

        let mut topics = Vec::new();
        while let Some(row) = rows.next()? {
            match map_topic(row) {
                Ok(topic) => topics.push(topic),
                Err(RepositoryError::FieldValueError { field, message }) => {
                    tracing::warn!(field = %field, message = %message, "主题循环规则不完整，忽略");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(topics)
    }
}

fn map_topic(row: &Row<'_>) -> RepositoryResult<Topic> {
    let topic_id: String = row.get(0)?;
    let recurrence: String = row.get(4)?;
    let weekday = row
        .get::<_, Option<String>>(6)?
        .as_deref()
        .and_then(weekday_from_db_str);

    let missing = |field: &str| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("topic_id={} recurrence={}", topic_id, recurrence),
    };

    let rule = match recurrence.as_str() {
        RECURRENCE_EXACT_DATE => {
            let raw: Option<String> = row.get(5)?;
            let date = parse_opt_date(5, "exact_date", raw)?.ok_or_else(|| missing("exact_date"))?;
            RecurrenceRule::ExactDate { date }
        }
        RECURRENCE_WEEKLY => RecurrenceRule::Weekly {
            weekday: weekday.ok_or_else(|| missing("weekday"))?,
            whole_week: row.get::<_, i32>(7)? != 0,
        },
        RECURRENCE_MONTHLY => {
            let week_of_month: u32 = row
                .get::<_, Option<u32>>(8)?
                .ok_or_else(|| missing("week_of_month"))?;
            RecurrenceRule::monthly(week_of_month, weekday.ok_or_else(|| missing("weekday"))?)
                .map_err(|e| RepositoryError::FieldValueError {
                    field: "week_of_month".to_string(),
                    message: e.to_string(),
                })?
        }
        _ => return Err(missing("recurrence")),
    };

    Ok(Topic {
        topic_id: topic_id.clone(),
        code: row.get(1)?,
        organization_id: row.get(2)?,
        title: row.get(3)?,
        rule,
        valid_from: row
            .get::<_, Option<String>>(9)?
            .map(|s| parse_date(9, "valid_from", &s))
            .transpose()?,
        valid_until: row
            .get::<_, Option<String>>(10)?
            .map(|s| parse_date(10, "valid_until", &s))
            .transpose()?,
        active: row.get::<_, i32>(11)? != 0,
    })
}
