use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use swell::classpath::ClassPath;
use swell::vm::Runner;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Binary name of the class whose main method is run, e.g. foo/Main
    #[arg(value_name = "CLASS")]
    main_class: String,

    /// Colon separated list of directories searched for class files
    #[arg(value_name = "CLASSPATH")]
    search_path: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("SWELL_LOG", "info")).init();

    let args = Args::parse();
    info!("running class {}", args.main_class);

    let classpath = ClassPath::new(&args.search_path);
    let mut runner = Runner::new(Box::new(classpath));
    match runner.run_main(&args.main_class) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
