mod cli;
mod log;

use cli::ux::present_error;

#[tokio::main]
async fn main() {
    match cli::run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            present_error(e);
            std::process::exit(1);
        }
    }
}
