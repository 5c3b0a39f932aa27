// ==========================================
// 讲道排班系统 - 引擎层
// ==========================================
// 职责: 实现排班规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 不可排原因必须可追溯
// ==========================================

pub mod assignor;
pub mod eligibility;
pub mod error;
pub mod forced_fill;
pub mod orchestrator;
pub mod report;
pub mod repositories;
pub mod run_state;
pub mod score;
pub mod slots;
pub mod substitute;
pub mod topic;

// 重导出核心引擎
pub use assignor::{AssignmentOutcome, Candidate, GreedyAssignor, PlannedAssignment};
pub use eligibility::{AvailabilityValidator, Ineligibility};
pub use error::{EngineError, EngineResult, PreconditionError};
pub use forced_fill::ForcedFiller;
pub use orchestrator::{GenerationResult, RunPhase, ScheduleGenerator};
pub use report::{ChurchCoverage, CriticalGap, GenerationReport, ReportBuilder};
pub use repositories::ScheduleRepositories;
pub use run_state::GenerationRun;
pub use score::ScoreEngine;
pub use slots::{Slot, SlotEnumerator};
pub use substitute::SubstituteSuggester;
pub use topic::TopicSuggester;
