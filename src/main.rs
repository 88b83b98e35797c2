use clap::Parser;
use dbft_app_config::Cli;

fn main() {
    let cli = Cli::parse();
    let code = dbft_bin::run_app(cli);
    std::process::exit(code.code());
}
