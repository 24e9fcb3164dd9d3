use flyercal::components::flyer::ICS_FILENAME;
use flyercal::error::{input_missing, other_error, Error};
use flyercal::{startup, FlyerPipeline, Session, Upload};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging()?;

    let mut args = std::env::args().skip(1);
    let image_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| input_missing("Usage: flyer_to_ics <image> [output.ics]"))?;
    let output_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(ICS_FILENAME));

    let config = startup::load_config()?;
    let pipeline = FlyerPipeline::from_config(&config)?;

    let mut session = Session::new();
    let extracted = session
        .upload(&pipeline, Some(Upload::from_path(&image_path)), None)
        .await;

    for notification in session.take_notifications() {
        eprintln!("[{:?}] {}", notification.level, notification.message);
    }
    if !extracted {
        return Err(other_error("No event information was extracted").into());
    }

    println!("{}", session.status_text());

    let bytes = session
        .download()
        .ok_or_else(|| other_error("The extracted text is not valid JSON, no calendar written"))?;
    tokio::fs::write(&output_path, bytes)
        .await
        .map_err(Error::from)?;

    info!("Calendar written to {}", output_path.display());
    Ok(())
}
