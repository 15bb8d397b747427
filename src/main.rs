// ==========================================
// 开票与订单管理系统 - 命令行入口
// ==========================================
// 职责: 解析命令行参数，装配 AppState，调用 API 层
// 约束: stdout 只输出命令结果（JSON / 文本），日志写 stderr
// ==========================================

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use invoice_genie::api::{DashboardFilter, DataApi, RestoreMode};
use invoice_genie::app::{get_default_db_path, AppState};
use invoice_genie::importer::{read_text_file, ColumnMapping};
use invoice_genie::logging;

#[derive(Parser)]
#[command(
    name = "invoice-genie",
    version,
    about = "本地优先的开票与订单管理 - 客户数据解析与数据管理"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// 数据库文件路径（默认: INVOICE_GENIE_DB_PATH 或用户数据目录）
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    /// 以 JSON 格式输出日志
    #[arg(long = "log-json", global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// 解析粘贴的客户数据（文件或 stdin），输出 JSON 记录
    Parse {
        /// 输入文件（.csv/.tsv/.txt/.xlsx/.xls），省略时读 stdin
        file: Option<PathBuf>,
        /// 同时输出各解析通道的尝试结果
        #[arg(long)]
        outcome: bool,
    },

    /// 输出首行原始列（带列号）
    Columns {
        file: Option<PathBuf>,
    },

    /// 按 字段=列号 映射重建文本；不给映射时输出映射建议
    Remap {
        file: Option<PathBuf>,
        /// 例: --map firstName=1 --map email=3 --map city=skip
        #[arg(long = "map", value_name = "FIELD=INDEX")]
        maps: Vec<String>,
        /// 重建后再解析并输出 JSON 记录
        #[arg(long)]
        parse: bool,
    },

    /// 导入商品 CSV
    ImportProducts {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// 导出客户 CSV
    ExportCustomers {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// 导出 JSON 备份
    Backup {
        /// 默认: invoice-genie-backup-YYYY-MM-DD.json
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// 从 JSON 备份恢复
    Restore {
        file: PathBuf,
        /// 先清空现有数据
        #[arg(long)]
        overwrite: bool,
    },

    /// 恢复出厂设置（清空订单、客户、商品、设置）
    Reset {
        /// 确认执行
        #[arg(long)]
        yes: bool,
    },

    /// 营收汇总
    Dashboard {
        #[arg(long)]
        year: Option<i32>,
        /// 1-12
        #[arg(long)]
        month: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let db_path = cli
        .db
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    tracing::debug!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;
    run(&state, cli.command).await
}

async fn run(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Parse { file, outcome } => {
            let text = read_input(file.as_deref())?;
            if outcome {
                let outcome = state.customer_api.parse_with_outcome(&text)?;
                print_json(&outcome)?;
            } else {
                let record = state.customer_api.parse_pasted(&text)?;
                if record.is_none() {
                    tracing::warn!("无法识别客户数据，请使用 remap 手动映射");
                }
                print_json(&record)?;
            }
        }

        Command::Columns { file } => {
            let text = read_input(file.as_deref())?;
            for (idx, cell) in state.customer_api.raw_columns(&text)?.iter().enumerate() {
                println!("{}\t{}", idx, cell);
            }
        }

        Command::Remap { file, maps, parse } => {
            let text = read_input(file.as_deref())?;
            if maps.is_empty() {
                print_json(&state.customer_api.suggest_mapping(&text)?)?;
                return Ok(());
            }
            let mapping = ColumnMapping::parse_specs(&maps)?;
            if parse {
                print_json(&state.customer_api.remap_and_parse(&text, &mapping)?)?;
            } else {
                print!("{}", state.customer_api.apply_mapping(&text, &mapping)?);
            }
        }

        Command::ImportProducts { files } => {
            for file in &files {
                let response = state
                    .product_api
                    .import_csv(file)
                    .await
                    .with_context(|| format!("导入失败: {}", file.display()))?;
                print_json(&response)?;
            }
        }

        Command::ExportCustomers { output } => {
            let csv = state.customer_api.export_customers_csv()?;
            write_output(output.as_deref(), &csv)?;
        }

        Command::Backup { output } => {
            let json = state.data_api.export_backup()?;
            let path = output
                .unwrap_or_else(|| PathBuf::from(DataApi::backup_file_name(Local::now().date_naive())));
            std::fs::write(&path, json)
                .with_context(|| format!("写入备份失败: {}", path.display()))?;
            println!("{}", path.display());
        }

        Command::Restore { file, overwrite } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("读取备份失败: {}", file.display()))?;
            let mode = if overwrite {
                RestoreMode::Overwrite
            } else {
                RestoreMode::Merge
            };
            print_json(&state.data_api.import_backup(&json, mode)?)?;
        }

        Command::Reset { yes } => {
            if !yes {
                bail!("恢复出厂设置会清空全部数据，请加 --yes 确认");
            }
            state.data_api.factory_reset()?;
        }

        Command::Dashboard { year, month } => {
            let summary = state
                .dashboard_api
                .get_summary(DashboardFilter { year, month })?;
            print_json(&summary)?;
        }
    }
    Ok(())
}

/// 读取输入：文件（Excel 转为制表符文本）或 stdin
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => Ok(read_text_file(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("读取 stdin 失败")?;
            Ok(text)
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("写入失败: {}", path.display())),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
