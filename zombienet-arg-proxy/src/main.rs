use tracing::error;
use zombienet_arg_proxy::{USAGE, args::collect_argv, logging, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();

    let result = match collect_argv(std::env::args_os().skip(1)) {
        Ok(argv) => run(&argv).await,
        Err(err) => Err(err),
    };
    let code = match result {
        Ok(code) => code,
        Err(err) if err.is_usage() => {
            eprintln!("error: {err}");
            eprintln!("{USAGE}");
            1
        }
        Err(err) => {
            error!("{err}");
            1
        }
    };

    // Exit right away: after a forwarded signal the child shuts down on its own.
    std::process::exit(code);
}
