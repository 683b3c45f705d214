use std::path::Path;

use interats_desktop_lib::core::models::AnalysisResult;
use interats_desktop_lib::core::results_view::{render_results, Frame};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: render_harness <path-to-analysis.json>");
        std::process::exit(1);
    }

    let path = &args[1];
    if !Path::new(path).exists() {
        eprintln!("File not found: {path}");
        std::process::exit(2);
    }

    let body = tokio::fs::read_to_string(path).await?;
    let result = match AnalysisResult::from_json(&body) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
    };

    println!("{}", render_results(&result, Frame::settled(&result)));
    Ok(())
}
