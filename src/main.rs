mod bootstrap;
mod cli;
mod config;
mod utils;
mod validators;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("DEVSETUP_LOG", "info"))
        .format_timestamp(None)
        .init();

    cli::run();
}
