use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use flutter_installer::cli::InstallFlutterCli;
use flutter_installer::config::{log_level, ConfigLoader, InstallOptions};
use flutter_installer::installer::Installer;
use flutter_installer::logging::setup_logging;
use flutter_installer::{error_message, Colorize};
use std::path::PathBuf;
use std::process::exit;

#[tokio::main]
async fn main() {
    let args = match InstallFlutterCli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // help and version go to stdout and succeed; every usage error exits 1
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            exit(code);
        }
    };

    if let Err(err) = args.validated_version() {
        let _ = InstallFlutterCli::command()
            .error(ErrorKind::ValueValidation, format!("invalid value for '<VERSION>': {err}"))
            .print();
        exit(1);
    }

    match run(args).await {
        Ok(bin_dir) => println!("{}", bin_dir.display()),
        Err(err) => {
            error_message!("{err:#}");
            exit(1);
        }
    }
}

async fn run(args: InstallFlutterCli) -> Result<PathBuf> {
    let config = ConfigLoader::load(args.config_file.as_deref())?;

    if let Err(err) = setup_logging(&log_level(&args, &config)) {
        eprintln!("Failed to set up logging: {err:#}");
    }

    let options = InstallOptions::resolve(args, config)?;
    Installer::new(options)?.run().await
}
