mod args;
mod hid;

use std::{
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Context as _, Result};
use chrono_tz::Tz;
use clap::Parser as _;
use co2mon::{
    co2mini::{ReadError, Reading, next_reading},
    influx::InfluxDb,
    lineprotocol::Record,
};
use tokio::{sync::Notify, time::sleep};
use tracing::{error, info, warn};

use crate::{args::Args, hid::HidFrameSource};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let cancel = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(Notify::new());
    {
        let cancel = Arc::clone(&cancel);
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::Relaxed);
                shutdown.notify_waiters();
            }
        });
    }

    let influxdb = InfluxDb::new(&args.influxdb_url, &args.database);
    if let Err(e) = influxdb.create_database().await {
        warn!("failed to create database, continuing anyway: {e:#}");
    }

    let mut source = HidFrameSource::open(hid::VENDOR_ID, hid::PRODUCT_ID)
        .context("failed to open the CO2 monitor, check that it is correctly plugged in")?;

    let delay = Duration::from_secs(args.delay_secs);
    let read_timeout = Duration::from_millis(args.read_timeout_millis);

    loop {
        let (returned, result) =
            acquire_reading(source, read_timeout, Arc::clone(&cancel), args.timezone).await?;
        source = returned;

        let reading = match result {
            Ok(reading) => reading,
            Err(ReadError::Cancelled) => {
                info!("shutdown requested, closing device");
                break;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e).context("lost the CO2 monitor"));
            }
        };

        info!(
            co2_ppm = reading.co2_ppm,
            temperature_celsius = reading.temperature_celsius,
            humidity_percent = reading.humidity_percent,
            "new reading"
        );

        let record = to_record(&reading, args.location.as_deref())?;
        if let Err(e) = influxdb.write_line(&record.encode()).await {
            error!("failed to write reading: {e:#}");
        }

        tokio::select! {
            _ = sleep(delay) => {}
            _ = shutdown.notified() => {
                info!("shutdown requested, closing device");
                break;
            }
        }

        // The notification is edge-triggered; catch a signal that arrived
        // while no task was waiting on it.
        if cancel.load(Ordering::Relaxed) {
            info!("shutdown requested, closing device");
            break;
        }
    }

    Ok(())
}

/// Runs the blocking assembly loop off the async runtime, handing the device
/// back alongside the result so the loop keeps exclusive ownership.
async fn acquire_reading(
    mut source: HidFrameSource,
    timeout: Duration,
    cancel: Arc<AtomicBool>,
    timezone: Tz,
) -> Result<(HidFrameSource, Result<Reading, ReadError>)> {
    tokio::task::spawn_blocking(move || {
        let result = next_reading(&mut source, timeout, &cancel, timezone);
        (source, result)
    })
    .await
    .context("sensor read task panicked")
}

fn to_record(reading: &Reading, location: Option<&str>) -> Result<Record> {
    let nanos = reading
        .measured_at
        .timestamp_nanos_opt()
        .context("measurement timestamp out of nanosecond range")?;

    let mut record = Record::new("mon").with_timestamp(nanos);

    if let Some(location) = location {
        record.add_tag("location", location);
    }

    record.add_field("CO2", i64::from(reading.co2_ppm));
    record.add_field("Temp", reading.temperature_celsius);
    // Absent humidity is simply omitted; 0.0 is a real value and is kept.
    if let Some(humidity) = reading.humidity_percent {
        record.add_field("Humid", humidity);
    }

    Ok(record)
}
