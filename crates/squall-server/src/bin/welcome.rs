//! Welcome instance: port 5000

use squall_server::{init_tracing, run, Instance};

#[tokio::main]
async fn main() {
    init_tracing();

    let instance = Instance {
        port: 5000,
        message: "Welcome to my web server!",
    };

    if let Err(err) = run(instance).await {
        tracing::error!("server failed: {err}");
        std::process::exit(1);
    }
}
