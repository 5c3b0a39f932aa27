// ==========================================
// 讲道排班系统 - 命令行入口
// ==========================================
// 用法:
//   preaching-schedule init-db [db]
//   preaching-schedule generate <db> <district> <month> <year> <requested_by>
// 报告以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use preaching_schedule::app::{get_default_db_path, AppState};
use preaching_schedule::{logging, ApiError};

const USAGE: &str = "用法:
  preaching-schedule init-db [db]
  preaching-schedule generate <db> <district> <month> <year> <requested_by>";

#[tokio::main]
async fn main() {
    logging::init();

    tracing::info!(
        "{} v{} 启动",
        preaching_schedule::APP_NAME,
        preaching_schedule::VERSION
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args).await {
        // 前置条件错误使用单独的退出码
        let code = match e.downcast_ref::<ApiError>() {
            Some(api_err) if api_err.is_precondition() => 2,
            _ => 1,
        };
        eprintln!("错误: {:#}", e);
        std::process::exit(code);
    }
}

async fn run(args: &[String]) -> Result<()> {
    let Some(command) = args.first() else {
        bail!("缺少子命令\n{}", USAGE);
    };

    match command.as_str() {
        "init-db" => {
            let db_path = args.get(1).cloned().unwrap_or_else(get_default_db_path);
            AppState::new(db_path.clone()).map_err(anyhow::Error::msg)?;
            println!("数据库已初始化: {}", db_path);
            Ok(())
        }
        "generate" => {
            let [db_path, district_id, month, year, requested_by] = match &args[1..] {
                [a, b, c, d, e] => [a, b, c, d, e],
                _ => bail!("generate 参数数量错误\n{}", USAGE),
            };
            let month: u32 = month.parse().with_context(|| format!("月份无效: {}", month))?;
            let year: i32 = year.parse().with_context(|| format!("年份无效: {}", year))?;

            let state = AppState::new(db_path.clone()).map_err(anyhow::Error::msg)?;
            let result = state
                .schedule_api
                .generate(district_id, month, year, requested_by)
                .await?;

            println!("{}", serde_json::to_string_pretty(&result.report)?);
            Ok(())
        }
        "help" | "-h" | "--help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("未知子命令: {}\n{}", other, USAGE),
    }
}
