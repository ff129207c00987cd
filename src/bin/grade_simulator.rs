#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match exam_evaluator::run_simulator(args).await {
        Ok(processed) => println!("grade-simulator: processed {processed} tasks"),
        Err(e) => {
            eprintln!("grade-simulator: {e:#}");
            std::process::exit(1);
        }
    }
}
