use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    hyperbatch::example_apps::run_dataset_report(std::env::args().skip(1))
}
