//! 命令行入口
//!
//! 用法：`food_analyzer <成分名称>...`
//! 处理完成后输出批次结果的 JSON

use anyhow::Result;
use food_analyzer::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    food_analyzer::utils::logging::init(config.verbose_logging);

    let ingredients: Vec<String> = std::env::args().skip(1).collect();
    if ingredients.is_empty() {
        eprintln!("用法: food_analyzer <成分名称>...");
        std::process::exit(1);
    }

    let app = App::new(config);

    let outcome = app.process_batch(&ingredients, None).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
