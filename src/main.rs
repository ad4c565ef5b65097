use KiSurf::Examples::co_oxidation_examples::co_oxidation_examples;
use simplelog::{ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode};

pub fn main() {
    //
    if let Err(e) = CombinedLogger::init(vec![TermLogger::new(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]) {
        eprintln!("logger not initialised: {}", e);
    }
    let task: usize = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0);
    if let Err(e) = co_oxidation_examples(task) {
        log::error!("example {} failed: {}", task, e);
        std::process::exit(1);
    }
}
