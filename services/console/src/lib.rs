mod cli;
mod demo;
mod infra;

use interview_ai::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
