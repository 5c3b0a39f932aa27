// ==========================================
// 讲道排班系统 - 行编解码辅助
// ==========================================
// 职责: 日期/时间/布尔字段与数据库文本的互转
// ==========================================

use crate::db::{DATE_FORMAT, TIME_FORMAT};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Type;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn conversion_error(idx: usize, field: &str, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("字段 {} 无法解析: {}", field, raw).into(),
    )
}

pub fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn time_to_db(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn datetime_to_db(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

pub fn parse_date(idx: usize, field: &str, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| conversion_error(idx, field, raw))
}

pub fn parse_opt_date(idx: usize, field: &str, raw: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    raw.map(|s| parse_date(idx, field, &s)).transpose()
}

/// 兼容 HH:MM 与 HH:MM:SS
pub fn parse_time(idx: usize, field: &str, raw: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| conversion_error(idx, field, raw))
}

pub fn parse_datetime(idx: usize, field: &str, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|_| conversion_error(idx, field, raw))
}

pub fn bool_to_db(value: bool) -> i32 {
    if value {
        1
    } else {
        0
    }
}
