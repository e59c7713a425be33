#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = waypoint_demo::cli::run_from_env() {
        eprintln!("waypoint-demo: {error}");
        std::process::exit(1);
    }
}
