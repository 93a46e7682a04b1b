use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    dataprovider::example_apps::run_mixture_demo(std::env::args().skip(1))
}
