//! # Bot Module
//!
//! Discord side of the Trackmania bot.
//!
//! [`TrackmaniaBot`] implements Serenity's [`EventHandler`]. Every button and
//! select menu it emits carries its full state in the `custom_id` (see
//! [`leaderboard::token`](crate::leaderboard::token)), so handling an
//! interaction is:
//!
//! 1. decode the control token
//! 2. fetch what it points at (leaderboard page, track info)
//! 3. re-render the message with freshly encoded controls
//!
//! Failures never crash the handler: the message is replaced by a generic
//! error embed with a "Back" button.

use chrono::{DateTime, Utc};
use serenity::{
    all::{Context, EventHandler, Interaction, Ready},
    async_trait,
};
use std::sync::Arc;
use tracing::{error, info};

pub mod handlers;

use crate::{
    cache::ExpiringCacheProvider,
    clock::{self, Clock},
    leaderboard::token::LeaderboardAnchor,
    services::trackmania::{past_totd_date, TrackOfTheDay, TrackmaniaApi},
};

/// Manejador de eventos de Discord
pub struct TrackmaniaBot {
    api: Arc<TrackmaniaApi>,
    totd: Arc<ExpiringCacheProvider<TrackOfTheDay>>,
    clock: Clock,
    page_length: i64,
}

impl TrackmaniaBot {
    pub fn new(
        api: Arc<TrackmaniaApi>,
        totd: Arc<ExpiringCacheProvider<TrackOfTheDay>>,
        clock: Clock,
        page_length: i64,
    ) -> Self {
        Self {
            api,
            totd,
            clock,
            page_length,
        }
    }

    pub fn api(&self) -> &TrackmaniaApi {
        &self.api
    }

    /// Longitud de la primera página al abrir un leaderboard
    pub fn page_length(&self) -> i64 {
        self.page_length
    }

    /// TOTD vigente, desde el caché
    pub async fn current_totd(&self) -> anyhow::Result<TrackOfTheDay> {
        Ok(self.totd.get_data().await?)
    }

    /// TOTD de una fecha pasada, sin pasar por el caché
    pub async fn past_totd(&self, year: i64, month: i64, day: i64) -> anyhow::Result<TrackOfTheDay> {
        let now = (self.clock)();
        let now = DateTime::<Utc>::from_timestamp(now, 0)
            .ok_or_else(|| anyhow::anyhow!("Clock out of range: {now}"))?;
        let today = clock::totd_date(now);
        let date = past_totd_date(year, month, day, today)?;

        info!("📅 TOTD pasado pedido para {}", date);
        self.api.track_of_the_day(date, today).await
    }

    /// Ficha del mapa de `anchor`, con el anchor que deben llevar sus botones.
    ///
    /// Un TOTD que aún no termina sale del caché; cualquier otro mapa se
    /// consulta directamente.
    pub async fn track_for(
        &self,
        anchor: &LeaderboardAnchor,
        label: &str,
    ) -> anyhow::Result<(TrackOfTheDay, LeaderboardAnchor)> {
        let now = (self.clock)();

        match anchor.end_timestamp {
            Some(end) if end as i64 > now => {
                let totd = self.current_totd().await?;
                let anchor = totd.anchor();
                Ok((totd, anchor))
            }
            end => {
                let track = self
                    .api
                    .track_details(
                        &anchor.map_uid,
                        anchor.group.uid(),
                        handlers::track_headline(anchor, label),
                        end.unwrap_or_default(),
                    )
                    .await?;
                Ok((track, anchor.clone()))
            }
        }
    }
}

#[async_trait]
impl EventHandler for TrackmaniaBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());
    }

    /// Errors are logged; they never take the bot down.
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command_interaction) => {
                if let Err(e) = handlers::handle_command(&ctx, command_interaction, self).await {
                    error!("Error manejando comando: {:?}", e);
                }
            }
            Interaction::Component(component_interaction) => {
                if let Err(e) = handlers::handle_component(&ctx, component_interaction, self).await
                {
                    error!("Error manejando componente: {:?}", e);
                }
            }
            _ => {}
        }
    }
}
