//! `sinkhole log` - append to, follow and inspect the shared log ring.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use colored::Colorize;
use sinkhole_config::Settings;
use sinkhole_fifo::{
    serve_tail, Access, FifoReader, FifoWriter, SharedWriter, TailRequest, TailResponse,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::Context;
use crate::cli::args::{LogArgs, LogCommands};

pub async fn execute(
    ctx: Context,
    args: LogArgs,
    recorder: Option<SharedWriter<FifoWriter>>,
) -> Result<ExitCode> {
    match args.command {
        LogCommands::Append { message, timestamp } => append(&ctx, &message.join(" "), timestamp),
        LogCommands::Tail {
            next_id,
            json,
            follow,
            interval_ms,
        } => tail(&ctx, next_id, json, follow.then(|| Duration::from_millis(interval_ms))).await,
        LogCommands::Info => info(&ctx),
        LogCommands::Record { .. } => {
            let writer = match recorder {
                Some(writer) => writer,
                None => open_recorder(&ctx.store.snapshot())?,
            };
            record(writer).await
        }
    }
}

/// Create a fresh ring as configured and take the writer role.
pub fn open_recorder(settings: &Settings) -> Result<SharedWriter<FifoWriter>> {
    let writer = FifoWriter::create(&settings.fifo.segment, settings.fifo.size)
        .with_context(|| format!("cannot create log ring at {}", settings.fifo.segment))?;
    Ok(SharedWriter::new(writer))
}

fn append(ctx: &Context, message: &str, timestamp: Option<i64>) -> Result<ExitCode> {
    let settings = ctx.store.snapshot();
    let mut writer = FifoWriter::open_or_create(&settings.fifo.segment, settings.fifo.size)
        .with_context(|| format!("cannot open log ring at {}", settings.fifo.segment))?;

    let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());
    writer.append(timestamp, message)?;
    println!("{}", writer.next_id() - 1);
    Ok(ExitCode::SUCCESS)
}

async fn tail(
    ctx: &Context,
    next_id: Option<u64>,
    json: bool,
    follow: Option<Duration>,
) -> Result<ExitCode> {
    let settings = ctx.store.snapshot();
    let reader = FifoReader::open(&settings.fifo.segment)
        .with_context(|| format!("cannot open log ring at {}", settings.fifo.segment))?;
    let pretty = settings.http.pretty_json;

    let response = serve_tail(&reader, TailRequest { next_id }, Access::Granted)?;
    print_response(&response, json, pretty)?;

    let Some(period) = follow else {
        return Ok(ExitCode::SUCCESS);
    };

    let mut follower = Follower::new(reader, response.next_id);
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let response = follower.poll()?;
                if !response.log.is_empty() {
                    print_response(&response, json, pretty)?;
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Reader plus the id of the next entry it has not printed yet.
struct Follower {
    reader: FifoReader,
    cursor: u64,
}

impl Follower {
    const fn new(reader: FifoReader, cursor: u64) -> Self {
        Self { reader, cursor }
    }

    /// Fetch everything appended since the last poll.
    ///
    /// A segment that was re-created is reopened from its path, and a cursor
    /// ahead of the ring restarts from the oldest entry.
    fn poll(&mut self) -> Result<TailResponse> {
        let mut request = TailRequest {
            next_id: Some(self.cursor),
        };
        if self.reader.is_stale() {
            warn!(path = %self.reader.path().display(), "log ring was re-created, reopening");
            let path = self.reader.path().to_path_buf();
            self.reader = FifoReader::open(&path)
                .with_context(|| format!("cannot reopen log ring at {}", path.display()))?;
            request.next_id = None;
        } else if self.reader.next_id() < self.cursor {
            warn!(
                cursor = self.cursor,
                next_id = self.reader.next_id(),
                "log ring was reset, starting over"
            );
            request.next_id = None;
        }

        let response = serve_tail(&self.reader, request, Access::Granted)?;
        self.cursor = response.next_id;
        Ok(response)
    }
}

fn print_response(response: &TailResponse, json: bool, pretty: bool) -> Result<()> {
    if json {
        println!("{}", response.to_json(pretty)?);
        return Ok(());
    }
    for entry in &response.log {
        println!("{} {}", format_time(entry.timestamp).dimmed(), entry.message);
    }
    Ok(())
}

fn format_time(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0).map_or_else(
        || timestamp.to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn info(ctx: &Context) -> Result<ExitCode> {
    let settings = ctx.store.snapshot();
    let reader = FifoReader::open(&settings.fifo.segment)
        .with_context(|| format!("cannot open log ring at {}", settings.fifo.segment))?;

    println!("{} {}", "segment:".bold(), reader.path().display());
    println!("{} {}", "capacity:".bold(), reader.capacity());
    println!("{} {}", "retained:".bold(), reader.len());
    println!("{} {}", "nextID:".bold(), reader.next_id());
    if let Some(newest) = reader.newest() {
        println!(
            "{} #{} {} {}",
            "newest:".bold(),
            newest.sequence_id,
            format_time(newest.timestamp),
            newest.message
        );
    }
    Ok(ExitCode::SUCCESS)
}

/// Append stdin lines until EOF or Ctrl-C.
pub async fn record(writer: SharedWriter<FifoWriter>) -> Result<ExitCode> {
    let segment = writer.lock().path().display().to_string();
    info!(segment = %segment, "recording stdin into log ring");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut count = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("cannot read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                writer.append_now(&line)?;
                count += 1;
            }
        }
    }

    writer.lock().flush()?;
    info!(lines = count, "recording stopped");
    Ok(ExitCode::SUCCESS)
}
