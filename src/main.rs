mod app;
mod config;
mod context;
mod error;
mod local_logger;
mod mode;
mod payload;
mod prelude;
mod report;
mod request_client;
mod submitter;
mod trigger;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let res = crate::app::run().await;
    if let Err(err) = res {
        if log::log_enabled!(log::Level::Error) {
            log::error!("Error: {err:#}");
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(1);
    }
}
