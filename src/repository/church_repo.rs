// ==========================================
// 讲道排班系统 - 区会/教会数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::{Church, District};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::bool_to_db;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// DistrictRepository - 区会仓储
// ==========================================
pub struct DistrictRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DistrictRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create(&self, district: &District) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO district (district_id, organization_id, name) VALUES (?1, ?2, ?3)",
            params![district.district_id, district.organization_id, district.name],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, district_id: &str) -> RepositoryResult<Option<District>> {
        let conn = self.get_conn()?;
        let district = conn
            .query_row(
                "SELECT district_id, organization_id, name FROM district WHERE district_id = ?1",
                params![district_id],
                |row| {
                    Ok(District {
                        district_id: row.get(0)?,
                        organization_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(district)
    }
}

// ==========================================
// ChurchRepository - 教会仓储
// ==========================================
pub struct ChurchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ChurchRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn create(&self, church: &Church) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO church (church_id, district_id, name, active) VALUES (?1, ?2, ?3, ?4)",
            params![
                church.church_id,
                church.district_id,
                church.name,
                bool_to_db(church.active)
            ],
        )?;
        Ok(())
    }

    /// 查询区会下所有启用的教会
    ///
    /// 按插入顺序 (rowid) 返回，作为排班时的稳定教会顺序
    pub fn list_active_by_district(&self, district_id: &str) -> RepositoryResult<Vec<Church>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT church_id, district_id, name, active
            FROM church
            WHERE district_id = ?1 AND active = 1
            ORDER BY rowid ASC
            "#,
        )?;

        let churches = stmt
            .query_map(params![district_id], |row| {
                Ok(Church {
                    church_id: row.get(0)?,
                    district_id: row.get(1)?,
                    name: row.get(2)?,
                    active: row.get::<_, i32>(3)? != 0,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(churches)
    }
}
