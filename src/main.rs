use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match cv_match_client_lib::run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
