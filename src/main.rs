#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = exam_evaluator::run().await {
        eprintln!("exam-evaluator fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
