use std::{env, path::PathBuf, process};

use log::{error, info};

use orbitai::{ExitCode, OrbitErr, config::Layout, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let layout = Layout::current();
    if let Err(e) = layout.create_dirs() {
        eprintln!("failed to create workspace directories: {e}");
        process::exit(ExitCode::Unknown.code());
    }

    if let Err(e) = logging::init(layout.process_log()) {
        eprintln!("failed to set up logging: {e}");
    }

    let args: Vec<String> = env::args().collect();
    let ret = match args.as_slice() {
        [_, props] => orbitai::run(&PathBuf::from(props), layout).await,
        _ => Err(OrbitErr::InvalidArgs(format!(
            "usage: {} <properties file>",
            args.first().map_or("orbitai", String::as_str)
        ))),
    };

    let code = match ret {
        Ok(()) => {
            info!("bye");
            ExitCode::Success
        }
        Err(e) => {
            let code = e.exit_code();
            error!("Error Code {}: {e}", code.code());
            eprintln!("Error Code {}: {e}", code.code());
            code
        }
    };

    log::logger().flush();
    process::exit(code.code());
}
