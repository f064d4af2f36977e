use std::{
    fs,
    io::{self, BufRead, Error as IoError, ErrorKind, Result as IoResult},
    num::NonZeroUsize,
    path::PathBuf,
    thread::spawn,
    time::{Duration, Instant},
};

use crossbeam_channel::unbounded;
use env_logger::Env;
use serde_json::Value;
use structopt::StructOpt;
use tokio::sync::mpsc;

use dishcovery::{
    gateway::ElasticGateway,
    ingest::{decode_line, default_mapping, ensure_index, BatchLoader},
};

/// Loads recipes as json lines from stdin into the search backend
#[derive(Debug, StructOpt)]
#[structopt(name = "load")]
pub struct LoadOptions {
    /// Base url of the search backend
    #[structopt(short, long, default_value = "http://localhost:9200")]
    backend_url: String,
    /// Name of the recipe index
    #[structopt(short, long, default_value = "recipes")]
    index: String,
    /// How many recipes to send per bulk request
    #[structopt(long, default_value = "500")]
    batch_size: NonZeroUsize,
    /// Number of decoder threads to start
    #[structopt(short, long, default_value = "4")]
    num_producers: NonZeroUsize,
    /// Index mapping to use instead of the bundled one
    #[structopt(short, long)]
    mapping: Option<PathBuf>,
    /// Backend request timeout in ms
    #[structopt(short, long, default_value = "30000")]
    timeout: u64,
}

fn other(err: impl ToString) -> IoError {
    IoError::new(ErrorKind::Other, err.to_string())
}

fn read_mapping(options: &LoadOptions) -> IoResult<Value> {
    match &options.mapping {
        Some(path) => Ok(serde_json::from_slice(&fs::read(path)?)?),
        None => default_mapping().map_err(other),
    }
}

async fn load(options: LoadOptions) -> IoResult<()> {
    log::info!("Started with {:?}", &options);

    let mapping = read_mapping(&options)?;

    let gateway = ElasticGateway::new(
        &options.backend_url,
        Duration::from_millis(options.timeout),
        1,
    )
    .map_err(other)?;

    if ensure_index(&gateway, &options.index, &mapping)
        .await
        .map_err(other)?
    {
        log::info!("Created index {} before loading", options.index);
    }

    // A SpMc channel to parallelize decoding
    let (line_sender, line_receiver) = unbounded::<(usize, String)>();
    // Decoded recipes make their way back to the loader here
    let (doc_sender, mut doc_receiver) = mpsc::unbounded_channel();

    let num_producers = options.num_producers.get();
    let mut workers = Vec::with_capacity(num_producers);
    for _ in 0..num_producers {
        let receiver = line_receiver.clone();
        let doc_sender = doc_sender.clone();

        workers.push(spawn(move || {
            let mut malformed = 0usize;
            for (line_no, line) in receiver {
                match decode_line(&line) {
                    Ok(Some(doc)) => {
                        if doc_sender.send((line_no, doc)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        malformed += 1;
                        log::warn!("Skipping line {}: {}", line_no, err);
                    }
                }
            }
            malformed
        }));
    }

    drop(doc_sender);

    let reader = spawn(move || -> IoResult<usize> {
        let mut num_lines = 0;
        for (line_no, line) in io::stdin().lock().lines().enumerate() {
            num_lines += 1;
            if line_sender.send((line_no + 1, line?)).is_err() {
                break;
            }
        }
        Ok(num_lines)
    });

    let cur = Instant::now();
    let mut loader = BatchLoader::new(&gateway, &options.index, options.batch_size.get());

    while let Some((line_no, doc)) = doc_receiver.recv().await {
        loader.push(line_no, doc).await.map_err(other)?;
    }

    let outcome = loader.finish().await.map_err(other)?;

    let num_lines = reader
        .join()
        .map_err(|_| other("stdin reader panicked"))??;

    let mut malformed = 0;
    for worker in workers.into_iter() {
        malformed += worker.join().map_err(|_| other("decoder panicked"))?;
    }

    log::info!(
        "Read {} lines in {} seconds: {} indexed, {} rejected, {} malformed",
        num_lines,
        cur.elapsed().as_secs(),
        outcome.succeeded,
        outcome.failed.len(),
        malformed
    );

    if !outcome.is_complete() {
        log::warn!(
            "Rejected lines: {:?}",
            outcome
                .failed
                .iter()
                .map(|item| item.position)
                .collect::<Vec<_>>()
        );
    }

    Ok(())
}

#[actix_rt::main]
async fn main() -> IoResult<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    load(LoadOptions::from_args()).await
}
