// ==========================================
// 讲道排班系统 - 领域类型定义
// ==========================================
// 职责: 礼拜日、优先级、角色、状态等封闭枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 优先级档位 (Priority Tier)
// ==========================================
// 顺序: High < Medium < Low (排序时 High 在前)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityTier {
    High,   // 高 (安息日)
    Medium, // 中 (主日)
    Low,    // 低 (周三)
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityTier::High => write!(f, "HIGH"),
            PriorityTier::Medium => write!(f, "MEDIUM"),
            PriorityTier::Low => write!(f, "LOW"),
        }
    }
}

// ==========================================
// 礼拜日 (Liturgical Day)
// ==========================================
// 红线: 只有三个礼拜日产生讲道时段,其他星期几不产生时段
// 该规则固定,不可配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiturgicalDay {
    Saturday,  // 安息日
    Sunday,    // 主日
    Wednesday, // 周三
}

impl fmt::Display for LiturgicalDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl LiturgicalDay {
    /// 所有礼拜日 (按优先级顺序)
    pub const ALL: [LiturgicalDay; 3] = [
        LiturgicalDay::Saturday,
        LiturgicalDay::Sunday,
        LiturgicalDay::Wednesday,
    ];

    /// 礼拜日对应的优先级档位
    pub fn tier(&self) -> PriorityTier {
        match self {
            LiturgicalDay::Saturday => PriorityTier::High,
            LiturgicalDay::Sunday => PriorityTier::Medium,
            LiturgicalDay::Wednesday => PriorityTier::Low,
        }
    }

    /// 从 chrono 星期几映射 (非礼拜日返回 None)
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Sat => Some(LiturgicalDay::Saturday),
            Weekday::Sun => Some(LiturgicalDay::Sunday),
            Weekday::Wed => Some(LiturgicalDay::Wednesday),
            _ => None,
        }
    }

    /// 转换为 chrono 星期几
    pub fn weekday(&self) -> Weekday {
        match self {
            LiturgicalDay::Saturday => Weekday::Sat,
            LiturgicalDay::Sunday => Weekday::Sun,
            LiturgicalDay::Wednesday => Weekday::Wed,
        }
    }

    /// 从字符串解析礼拜日
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SATURDAY" => Some(LiturgicalDay::Saturday),
            "SUNDAY" => Some(LiturgicalDay::Sunday),
            "WEDNESDAY" => Some(LiturgicalDay::Wednesday),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            LiturgicalDay::Saturday => "SATURDAY",
            LiturgicalDay::Sunday => "SUNDAY",
            LiturgicalDay::Wednesday => "WEDNESDAY",
        }
    }
}

/// 星期几的数据库字符串 (主题的周循环可指定任意星期几)
pub fn weekday_to_db_str(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// 从数据库字符串解析星期几
pub fn weekday_from_db_str(s: &str) -> Option<Weekday> {
    match s.trim().to_uppercase().as_str() {
        "MONDAY" => Some(Weekday::Mon),
        "TUESDAY" => Some(Weekday::Tue),
        "WEDNESDAY" => Some(Weekday::Wed),
        "THURSDAY" => Some(Weekday::Thu),
        "FRIDAY" => Some(Weekday::Fri),
        "SATURDAY" => Some(Weekday::Sat),
        "SUNDAY" => Some(Weekday::Sun),
        _ => None,
    }
}

// ==========================================
// 用户角色 (Role)
// ==========================================
// 封闭集合,通过能力检查方法判断,不做数组包含查询
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    OrganizationMember, // 联合会成员
    DistrictPastor,     // 区会牧师
    DistrictLeader,     // 区会领袖
    Preacher,           // 讲道人
    Evaluator,          // 评估员
}

impl Role {
    const fn bit(self) -> u8 {
        match self {
            Role::OrganizationMember => 1 << 0,
            Role::DistrictPastor => 1 << 1,
            Role::DistrictLeader => 1 << 2,
            Role::Preacher => 1 << 3,
            Role::Evaluator => 1 << 4,
        }
    }

    /// 从字符串解析角色
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ORGANIZATION_MEMBER" => Some(Role::OrganizationMember),
            "DISTRICT_PASTOR" => Some(Role::DistrictPastor),
            "DISTRICT_LEADER" => Some(Role::DistrictLeader),
            "PREACHER" => Some(Role::Preacher),
            "EVALUATOR" => Some(Role::Evaluator),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::OrganizationMember => "ORGANIZATION_MEMBER",
            Role::DistrictPastor => "DISTRICT_PASTOR",
            Role::DistrictLeader => "DISTRICT_LEADER",
            Role::Preacher => "PREACHER",
            Role::Evaluator => "EVALUATOR",
        }
    }
}

/// 角色集合 (位集)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    const ALL_ROLES: [Role; 5] = [
        Role::OrganizationMember,
        Role::DistrictPastor,
        Role::DistrictLeader,
        Role::Preacher,
        Role::Evaluator,
    ];

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn of(roles: &[Role]) -> Self {
        roles.iter().fold(Self::empty(), |set, r| set.with(*r))
    }

    pub fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// 是否可以被排入讲道
    pub fn can_preach(&self) -> bool {
        self.contains(Role::Preacher)
    }

    /// 是否可以生成/审批排班
    pub fn can_manage_schedule(&self) -> bool {
        self.contains(Role::DistrictPastor)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Self::ALL_ROLES.into_iter().filter(|r| self.contains(*r))
    }

    /// 从逗号分隔字符串解析 (未知标签忽略)
    pub fn from_db_str(s: &str) -> Self {
        s.split(',')
            .filter_map(Role::from_str)
            .fold(Self::empty(), |set, r| set.with(r))
    }

    /// 转换为逗号分隔字符串
    pub fn to_db_str(&self) -> String {
        self.iter()
            .map(|r| r.to_db_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let roles = Vec::<Role>::deserialize(deserializer)?;
        Ok(RoleSet::of(&roles))
    }
}

// ==========================================
// 审批状态 (Approval Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,  // 待审批
    Approved, // 已审批
    Rejected, // 已拒绝
}

impl ApprovalStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "APPROVED" => ApprovalStatus::Approved,
            "REJECTED" => ApprovalStatus::Rejected,
            _ => ApprovalStatus::Pending,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }
}

// ==========================================
// 讲道安排状态 (Assignment Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Scheduled, // 已排
    Accepted,  // 已接受
    Declined,  // 已拒绝
    Completed, // 已完成
    Missed,    // 缺席
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AssignmentStatus {
    /// 是否占用讲道人 (计入月上限与同日冲突)
    pub fn occupies(&self) -> bool {
        matches!(
            self,
            AssignmentStatus::Scheduled | AssignmentStatus::Accepted | AssignmentStatus::Completed
        )
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ACCEPTED" => AssignmentStatus::Accepted,
            "DECLINED" => AssignmentStatus::Declined,
            "COMPLETED" => AssignmentStatus::Completed,
            "MISSED" => AssignmentStatus::Missed,
            _ => AssignmentStatus::Scheduled,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Scheduled => "SCHEDULED",
            AssignmentStatus::Accepted => "ACCEPTED",
            AssignmentStatus::Declined => "DECLINED",
            AssignmentStatus::Completed => "COMPLETED",
            AssignmentStatus::Missed => "MISSED",
        }
    }
}

// ==========================================
// 排班状态 (Schedule Status)
// ==========================================
// 状态流转: Draft → Approved → Finalized (单向)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Draft,     // 草稿
    Approved,  // 已审批
    Finalized, // 已定稿
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ScheduleStatus {
    /// 是否允许流转到目标状态
    pub fn can_transition_to(&self, target: ScheduleStatus) -> bool {
        matches!(
            (self, target),
            (ScheduleStatus::Draft, ScheduleStatus::Approved)
                | (ScheduleStatus::Approved, ScheduleStatus::Finalized)
        )
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "APPROVED" => ScheduleStatus::Approved,
            "FINALIZED" => ScheduleStatus::Finalized,
            _ => ScheduleStatus::Draft,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Draft => "DRAFT",
            ScheduleStatus::Approved => "APPROVED",
            ScheduleStatus::Finalized => "FINALIZED",
        }
    }
}
