// ==========================================
// 倡议追踪系统 - 命令行导入入口
// ==========================================
// 用法:
//   initiative-import [db_path] <file.csv|file.xlsx>...
//
// 未给出 db_path 时使用 INITIATIVE_IMPORT_DB_PATH 或用户数据目录。
// 每个文件输出一条 JSON 结果；任一文件失败则退出码为 1。
// ==========================================

use anyhow::{bail, Context};
use initiative_import::api::ImportApi;
use initiative_import::db::{get_default_db_path, init_schema, open_sqlite_connection};
use initiative_import::importer::detect_format;
use initiative_import::logging;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = if args.len() > 1 && detect_format(&args[0]).is_err() {
        args.remove(0)
    } else {
        get_default_db_path()
    };

    if args.is_empty() {
        bail!("usage: initiative-import [db_path] <file.csv|file.xlsx>...");
    }

    tracing::info!("倡议追踪系统 - 批量导入 v{}", initiative_import::VERSION);
    tracing::info!("使用数据库: {}", db_path);

    {
        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        init_schema(&conn).context("数据库 schema 初始化失败")?;
    }

    let api = ImportApi::new(db_path);
    let results = api.batch_import(args.clone()).await;

    let mut failed = 0usize;
    let report: Vec<serde_json::Value> = args
        .iter()
        .zip(results)
        .map(|(file, result)| match result {
            Ok(response) => serde_json::to_value(&response)
                .unwrap_or_else(|e| json!({ "file_name": file, "error": e.to_string() })),
            Err(e) => {
                failed += 1;
                json!({ "file_name": file, "error": e.to_string() })
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&report)?);

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
