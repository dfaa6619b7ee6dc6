fn main() {
    dotenvy::from_filename(".env.local").ok();
    dotenvy::dotenv().ok();
    recurbuy::app::logging::init();
    if let Err(err) = recurbuy::app::cli::run() {
        eprintln!("error: {}", err.message);
        std::process::exit(1);
    }
}
