use std::{
    io::{Error as IoError, ErrorKind, Result as IoResult},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use structopt::StructOpt;

use dishcovery::{
    api,
    config::SearchConfig,
    gateway::{ElasticGateway, Gateway},
    service::SearchService,
};

#[derive(Debug, StructOpt)]
#[structopt(name = "dishcovery")]
pub struct ApiOptions {
    /// Base url of the search backend
    #[structopt(short, long, default_value = "http://localhost:9200")]
    backend_url: String,
    /// Name of the recipe index
    #[structopt(short, long, default_value = "recipes")]
    index: String,
    /// Address to listen on
    #[structopt(long, default_value = "127.0.0.1:8080")]
    bind: String,
    /// Search execution timeout in ms
    #[structopt(short, long, default_value = "2000")]
    timeout: u64,
    /// Maximum number of concurrent backend requests
    #[structopt(long, default_value = "32")]
    max_concurrency: usize,
    /// Path to a json file overriding the default search configuration
    #[structopt(short, long)]
    config: Option<PathBuf>,
}

fn invalid_input(err: impl ToString) -> IoError {
    IoError::new(ErrorKind::InvalidInput, err.to_string())
}

#[actix_rt::main]
async fn main() -> IoResult<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("actix_web=info,dishcovery=info"))
        .init();

    let options = ApiOptions::from_args();
    log::info!("Started with {:?}", &options);

    let config = match &options.config {
        Some(path) => SearchConfig::load(path).map_err(invalid_input)?,
        None => SearchConfig::default(),
    };

    let timeout = Duration::from_millis(options.timeout);
    let gateway: Arc<dyn Gateway> = Arc::new(
        ElasticGateway::new(&options.backend_url, timeout, options.max_concurrency)
            .map_err(invalid_input)?,
    );

    let service = web::Data::new(SearchService::new(
        gateway,
        Arc::new(config),
        options.index.as_str(),
        timeout,
    ));

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(service.clone())
            .configure(api::configure)
    })
    .bind(options.bind.as_str())?
    .run()
    .await
}
