use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use std::sync::Arc;
use tracing::{error, info, warn};

use trackmania_bot::{
    bot::TrackmaniaBot,
    cache::TokenCacheProvider,
    clock,
    config::Config,
    services::{
        self,
        auth::{NadeoTokenFetcher, OAuthTokenFetcher},
        trackmania::{totd_provider, TrackmaniaApi},
        HttpService, CORE_AUDIENCE, CORE_URL, EXCHANGE_URL, LIVE_AUDIENCE, LIVE_URL,
        OAUTH_AUDIENCE, OAUTH_URL,
    },
    storage::{DurableStore, FileStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trackmania_bot=debug".parse()?)
                .add_directive("serenity=info".parse()?),
        )
        .init();

    info!("🏁 Iniciando Trackmania Bot v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    // Inicializar almacenamiento
    let store: Arc<dyn DurableStore> = Arc::new(FileStore::new(config.data_dir.clone()).await?);
    let client = services::http_client(&config.user_agent)?;

    // Tokens por audiencia
    let core_tokens = Arc::new(TokenCacheProvider::new(
        CORE_AUDIENCE,
        store.clone(),
        NadeoTokenFetcher::new(
            client.clone(),
            &config.server_login,
            &config.server_password,
            CORE_AUDIENCE,
        ),
    ));
    let live_tokens = Arc::new(TokenCacheProvider::new(
        LIVE_AUDIENCE,
        store.clone(),
        NadeoTokenFetcher::new(
            client.clone(),
            &config.server_login,
            &config.server_password,
            LIVE_AUDIENCE,
        ),
    ));
    let oauth_tokens = Arc::new(TokenCacheProvider::new(
        OAUTH_AUDIENCE,
        store.clone(),
        OAuthTokenFetcher::new(
            client.clone(),
            &config.oauth_client_id,
            &config.oauth_client_secret,
        ),
    ));

    let api = Arc::new(
        TrackmaniaApi::new(
            Arc::new(HttpService::new("core", CORE_URL, client.clone(), Some(core_tokens))),
            Arc::new(HttpService::new("live", LIVE_URL, client.clone(), Some(live_tokens))),
            Arc::new(HttpService::new("oauth", OAUTH_URL, client.clone(), Some(oauth_tokens))),
        )
        .with_exchange(Arc::new(HttpService::new("exchange", EXCHANGE_URL, client, None))),
    );

    let clock = clock::system_clock();
    let totd = Arc::new(totd_provider(api.clone(), store, clock.clone()));

    // Precargar el TOTD; si falla se reintenta en la primera interacción
    match totd.get_data().await {
        Ok(track) => info!("✅ TOTD cargado: {} ({})", track.map_name, track.headline),
        Err(e) => warn!("⚠️ No se pudo precargar el TOTD: {:#}", e),
    }

    // Solo interacciones: no se leen mensajes ni estados de voz
    let intents = GatewayIntents::GUILDS;

    let handler = TrackmaniaBot::new(api, totd, clock, config.page_length);

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await?;

    // Manejar shutdown graceful
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("⚠️ Señal de shutdown recibida, cerrando...");
                std::process::exit(0);
            }
            Err(e) => error!("Error al registrar Ctrl+C: {:?}", e),
        }
    });

    // Iniciar bot
    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}
