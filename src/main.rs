use std::{process, sync::Arc};

use sfoglia::{
    application::{
        cache::MemoryDeckStore,
        deck::DeckService,
        error::{AppError, DeckError},
        fetch::HttpFetcher,
        render::ComrakSlideRenderer,
    },
    config,
    infra::{error::InfraError, http, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(settings, args).await,
    }
}

fn build_deck_service(settings: &config::Settings) -> Result<Arc<DeckService>, AppError> {
    let fetcher = HttpFetcher::new(&settings.fetch.user_agent)
        .map_err(|err| AppError::from(DeckError::from(err)))?;

    Ok(Arc::new(DeckService::new(
        Arc::new(fetcher),
        Arc::new(ComrakSlideRenderer::new()),
        Arc::new(MemoryDeckStore::new()),
        settings.embed.base_url.clone(),
    )))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let decks = build_deck_service(&settings)?;
    let router = http::build_router(http::HttpState { decks });

    let listener = tokio::net::TcpListener::bind(settings.server.listen_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "sfoglia::serve",
        addr = %settings.server.listen_addr,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_render(settings: config::Settings, args: config::RenderArgs) -> Result<(), AppError> {
    let decks = build_deck_service(&settings)?;

    match args.page {
        Some(index) => {
            let fragment = decks.page(&args.url, index).await?;
            println!("{fragment}");
        }
        None => {
            let count = decks.page_count(&args.url).await?;
            for index in 0..count {
                let fragment = decks.page(&args.url, index as i64).await?;
                println!("{fragment}");
            }
            info!(target = "sfoglia::render", pages = count, "Rendered deck");
        }
    }

    Ok(())
}
