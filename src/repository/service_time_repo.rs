// ==========================================
// 讲道排班系统 - 礼拜时段模板仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 非礼拜日的模板在读取时丢弃并告警
// ==========================================

use crate::domain::{LiturgicalDay, ServiceTimeTemplate, TemplateScope};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{bool_to_db, parse_time, time_to_db};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT template_id, church_id, district_id, weekday, time,
           service_name, requires_preacher, active
    FROM service_time
"#;

pub struct ServiceTimeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ServiceTimeRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create(&self, template: &ServiceTimeTemplate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO service_time (
                template_id, church_id, district_id, weekday, time,
                service_name, requires_preacher, active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                template.template_id,
                template.scope.church_id(),
                template.scope.district_id(),
                template.day.to_db_str(),
                time_to_db(template.time),
                template.service_name,
                bool_to_db(template.requires_preacher),
                bool_to_db(template.active),
            ],
        )?;
        Ok(())
    }

    /// 查询教会自有的启用模板 (按插入顺序)
    pub fn list_active_by_church(&self, church_id: &str) -> RepositoryResult<Vec<ServiceTimeTemplate>> {
        let sql = format!("{} WHERE church_id = ?1 AND active = 1 ORDER BY rowid ASC", SELECT_COLUMNS);
        self.query_templates(&sql, church_id)
    }

    /// 查询区会级启用模板 (按插入顺序)
    pub fn list_active_by_district(&self, district_id: &str) -> RepositoryResult<Vec<ServiceTimeTemplate>> {
        let sql = format!("{} WHERE district_id = ?1 AND active = 1 ORDER BY rowid ASC", SELECT_COLUMNS);
        self.query_templates(&sql, district_id)
    }

    fn query_templates(&self, sql: &str, key: &str) -> RepositoryResult<Vec<ServiceTimeTemplate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params![key])?;

        let mut templates = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(template) = map_template(row)? {
                templates.push(template);
            }
        }
        Ok(templates)
    }
}

fn map_template(row: &Row<'_>) -> RepositoryResult<Option<ServiceTimeTemplate>> {
    let template_id: String = row.get(0)?;
    let weekday_raw: String = row.get(3)?;

    let day = match LiturgicalDay::from_str(&weekday_raw) {
        Some(day) => day,
        None => {
            tracing::warn!(
                template_id = %template_id,
                weekday = %weekday_raw,
                "非礼拜日模板，忽略"
            );
            return Ok(None);
        }
    };

    let scope = TemplateScope::from_columns(row.get(1)?, row.get(2)?)?;
    let time_raw: String = row.get(4)?;

    Ok(Some(ServiceTimeTemplate {
        template_id,
        scope,
        day,
        time: parse_time(4, "time", &time_raw)?,
        service_name: row.get(5)?,
        requires_preacher: row.get::<_, i32>(6)? != 0,
        active: row.get::<_, i32>(7)? != 0,
    }))
}
