use gcal_agenda::auth::{ConsoleCodeReader, HttpTokenExchange};
use gcal_agenda::calendar::GoogleCalendarEventSource;
use gcal_agenda::credentials::FileCredentialSource;
use std::io;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> gcal_agenda::Result<()> {
    let credentials = FileCredentialSource::default();
    let token_exchange = HttpTokenExchange::new()?;
    let mut code_reader = ConsoleCodeReader::stdin();
    let mut stdout = io::stdout().lock();

    gcal_agenda::run(
        &credentials,
        &mut code_reader,
        &token_exchange,
        |token| GoogleCalendarEventSource::new(&token),
        &mut stdout,
    )
    .await
}
