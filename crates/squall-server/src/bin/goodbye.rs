//! Goodbye instance: port 80

use squall_server::{init_tracing, run, Instance};

#[tokio::main]
async fn main() {
    init_tracing();

    let instance = Instance {
        port: 80,
        message: "Good Bye my web server!!!",
    };

    if let Err(err) = run(instance).await {
        tracing::error!("server failed: {err}");
        std::process::exit(1);
    }
}
