use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::EndpointFetcher;
use crate::cache::ExpiringCacheProvider;
use crate::clock::{self, Clock};
use crate::leaderboard::token::{GroupId, LeaderboardAnchor};
use crate::leaderboard::PageWindow;
use crate::storage::DurableStore;

pub const TOTD_STORAGE_KEY: &str = "totd.json";

const DAYS: [&str; 7] = ["Mon.", "Tue.", "Wed.", "Thur.", "Fri.", "Sat.", "Sun."];

/// Primer TOTD de Trackmania (2020)
pub const FIRST_TOTD_DATE: (i32, u32, u32) = (2020, 7, 1);

/// Etiquetas de trackmania.exchange por id (1..=51) con su color, si tiene
const MAP_TAGS: [(&str, Option<u32>); 51] = [
    ("Race", None),
    ("FullSpeed", None),
    ("Tech", None),
    ("RPG", None),
    ("LOL", None),
    ("Press Forward", None),
    ("SpeedTech", None),
    ("MultiLap", None),
    ("Offroad", Some(0x705100)),
    ("Trial", None),
    ("ZrT", Some(0x1a6300)),
    ("SpeedFun", None),
    ("Competitive", None),
    ("Ice", Some(0x05767d)),
    ("Dirt", Some(0x5e2d09)),
    ("Stunt", None),
    ("Reactor", Some(0xd04500)),
    ("Platform", None),
    ("Slow Motion", Some(0x004388)),
    ("Bumper", Some(0xaa0000)),
    ("Fragile", Some(0x993366)),
    ("Scenery", None),
    ("Kacky", None),
    ("Endurance", None),
    ("Mini", None),
    ("Remake", None),
    ("Mixed", None),
    ("Nascar", None),
    ("SpeedDrift", None),
    ("Minigame", Some(0x7e0e69)),
    ("Obstacle", None),
    ("Transitional", None),
    ("Grass", Some(0x06a805)),
    ("Backwards", Some(0x83aa00)),
    ("Freewheel", Some(0xf2384e)),
    ("Signature", Some(0xf1c438)),
    ("Royal", Some(0xff0010)),
    ("Water", Some(0x69dbff)),
    ("Plastic", Some(0xfffc00)),
    ("Arena", None),
    ("Freestyle", None),
    ("Educational", None),
    ("Sausage", None),
    ("Bobsleigh", None),
    ("Pathfinding", None),
    ("FlagRush", Some(0x7a0000)),
    ("Puzzle", Some(0x459873)),
    ("Freeblocking", Some(0xffffff)),
    ("Altered Nadeo", Some(0x3a3a3a)),
    ("SnowCar", Some(0xd3d3d3)),
    ("Wood", Some(0x814b00)),
];

/// Un día del listado mensual de TOTD
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotdDay {
    pub map_uid: String,
    pub season_uid: String,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    #[serde(default)]
    pub relative_start: i64,
    /// 0 = lunes
    #[serde(default)]
    pub day: usize,
    #[serde(default)]
    pub month_day: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MonthList {
    month_list: Vec<TotdMonth>,
}

#[derive(Debug, Deserialize)]
struct TotdMonth {
    days: Vec<TotdDay>,
}

/// Información de un mapa según el Core API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
    pub map_id: String,
    pub map_uid: String,
    pub filename: String,
    pub author: String,
    pub author_score: i64,
    pub gold_score: i64,
    pub silver_score: i64,
    pub bronze_score: i64,
    pub map_type: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl MapInfo {
    /// Nombre sin la extensión `.Map.Gbx`
    pub fn name(&self) -> &str {
        self.filename
            .strip_suffix(".Map.Gbx")
            .unwrap_or(&self.filename)
    }

    /// `TrackMania\TM_Race` → `TM_Race`
    pub fn short_map_type(&self) -> &str {
        self.map_type.rsplit('\\').next().unwrap_or(&self.map_type)
    }
}

/// Track of the day tal como se guarda en `totd.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackOfTheDay {
    pub headline: String,
    pub map_uid: String,
    pub map_id: String,
    pub map_name: String,
    pub author_uid: String,
    pub author_time: i64,
    pub gold_time: i64,
    pub silver_time: i64,
    pub bronze_time: i64,
    pub map_type: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub group_uid: String,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    /// Nombre visible del autor (trackmania.exchange o Nadeo)
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub exchange_url: Option<String>,
    #[serde(default)]
    pub style_color: Option<u32>,
}

impl TrackOfTheDay {
    fn from_map(headline: String, map: MapInfo, group_uid: String, start: u64, end: u64) -> Self {
        Self {
            headline,
            map_name: map.name().to_string(),
            map_type: map.short_map_type().to_string(),
            map_uid: map.map_uid,
            map_id: map.map_id,
            author_uid: map.author,
            author_time: map.author_score,
            gold_time: map.gold_score,
            silver_time: map.silver_score,
            bronze_time: map.bronze_score,
            thumbnail_url: map.thumbnail_url,
            group_uid,
            start_timestamp: start,
            end_timestamp: end,
            author_name: None,
            tags: Vec::new(),
            exchange_url: None,
            style_color: None,
        }
    }

    /// Completa la ficha con los datos de trackmania.exchange
    fn with_exchange(self, exchange: ExchangeMapInfo) -> Self {
        Self {
            map_name: exchange.name.clone(),
            author_name: Some(exchange.username.clone()),
            tags: exchange.tag_names(),
            exchange_url: Some(exchange.url()),
            style_color: exchange.style_color(),
            ..self
        }
    }

    /// Nombre del autor para mostrar; el account id si no se pudo resolver
    pub fn author_display(&self) -> &str {
        self.author_name.as_deref().unwrap_or(&self.author_uid)
    }

    /// Leaderboard de la temporada de este TOTD
    pub fn anchor(&self) -> LeaderboardAnchor {
        LeaderboardAnchor::new(
            GroupId::from_uid(&self.group_uid),
            &self.map_uid,
            Some(self.end_timestamp),
        )
    }

    /// El TOTD caduca cuando empieza el siguiente
    pub fn is_expired(&self, now: i64) -> bool {
        self.end_timestamp as i64 <= now
    }

    /// Etiqueta corta que viaja en el botón "Track Info"
    pub fn date_label(&self) -> &str {
        self.headline
            .split_once(" - ")
            .map(|(_, date)| date)
            .unwrap_or(&self.headline)
    }
}

/// Ficha de un mapa en trackmania.exchange
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeMapInfo {
    #[serde(rename = "TrackID")]
    pub track_id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Username")]
    pub username: String,
    /// Ids separados por comas
    #[serde(rename = "Tags", default)]
    pub tags: String,
    #[serde(rename = "StyleName", default)]
    pub style_name: Option<String>,
}

impl ExchangeMapInfo {
    pub fn url(&self) -> String {
        format!("https://trackmania.exchange/s/tr/{}", self.track_id)
    }

    /// Nombres de las etiquetas; ids desconocidos se ignoran
    pub fn tag_names(&self) -> Vec<String> {
        self.tags
            .split(',')
            .filter_map(|id| id.trim().parse::<usize>().ok())
            .filter_map(|id| id.checked_sub(1).and_then(|i| MAP_TAGS.get(i)))
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Color de la etiqueta de estilo, si tiene uno
    pub fn style_color(&self) -> Option<u32> {
        let style = self.style_name.as_deref()?;
        MAP_TAGS
            .iter()
            .find(|(name, _)| *name == style)
            .and_then(|(_, color)| *color)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRecord {
    pub account_id: String,
    pub position: i64,
    /// Tiempo en milisegundos
    pub score: i64,
}

#[derive(Debug, Deserialize)]
struct LeaderboardTops {
    tops: Vec<LeaderboardTop>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardTop {
    top: Vec<LeaderboardRecord>,
}

/// Fila ya lista para mostrar
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRecord {
    pub position: i64,
    pub time: String,
    pub account_id: String,
    pub name: String,
}

/// `mm:ss:mmm`; los minutos no se acotan a una hora
pub fn format_record_time(milliseconds: i64) -> String {
    let ms = milliseconds % 1000;
    let seconds = (milliseconds / 1000) % 60;
    let minutes = milliseconds / 1000 / 60;
    format!("{minutes:02}:{seconds:02}:{ms:03}")
}

/// Fecha pedida con `/totd past`.
///
/// Fechas anteriores al primer TOTD son un error; fechas futuras se limitan a
/// `today`.
pub fn past_totd_date(year: i64, month: i64, day: i64, today: NaiveDate) -> Result<NaiveDate> {
    let date = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((year, month), day)| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(|| anyhow!("{year}-{month}-{day} is not a valid date"))?;

    let (first_year, first_month, first_day) = FIRST_TOTD_DATE;
    let first = NaiveDate::from_ymd_opt(first_year, first_month, first_day)
        .ok_or_else(|| anyhow!("Invalid first TOTD date"))?;
    if date < first {
        bail!("Date given is before Trackmania came out, silly :)");
    }

    Ok(date.min(today))
}

/// Meses entre `date` y el mes de `today`, tal como los cuenta el listado mensual
fn months_back(today: NaiveDate, date: NaiveDate) -> i64 {
    (today.year() as i64 - date.year() as i64) * 12 + (today.month() as i64 - date.month() as i64)
}

/// Endpoints de Trackmania usados por el bot
pub struct TrackmaniaApi {
    core: Arc<dyn EndpointFetcher>,
    live: Arc<dyn EndpointFetcher>,
    oauth: Arc<dyn EndpointFetcher>,
    exchange: Option<Arc<dyn EndpointFetcher>>,
}

impl TrackmaniaApi {
    pub fn new(
        core: Arc<dyn EndpointFetcher>,
        live: Arc<dyn EndpointFetcher>,
        oauth: Arc<dyn EndpointFetcher>,
    ) -> Self {
        Self {
            core,
            live,
            oauth,
            exchange: None,
        }
    }

    /// Enriquecer las fichas con trackmania.exchange
    pub fn with_exchange(mut self, exchange: Arc<dyn EndpointFetcher>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Día de TOTD para `date`. Si ese día aún no ha empezado se usa el anterior.
    pub async fn totd_day(&self, date: NaiveDate, today: NaiveDate) -> Result<TotdDay> {
        let offset = months_back(today, date);
        if offset < 0 {
            bail!("{} is in the future", date);
        }

        let response = self
            .live
            .fetch_endpoint(
                "TrackOfTheMonth",
                &format!("/api/token/campaign/month?length=1&offset={offset}"),
            )
            .await?;
        let month = serde_json::from_value::<MonthList>(response)
            .context("Unexpected month listing")?
            .month_list
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Empty month listing for offset {offset}"))?;

        let index = date.day() as usize - 1;
        let chosen = match month.days.get(index) {
            Some(day) if day.relative_start > 0 => {
                debug!("El TOTD del día {} aún no empieza, usando el anterior", date.day());
                index.checked_sub(1).and_then(|i| month.days.get(i))
            }
            other => other,
        };

        chosen
            .cloned()
            .ok_or_else(|| anyhow!("No track of the day for {}", date))
    }

    pub async fn map_info(&self, map_uid: &str) -> Result<MapInfo> {
        let response = self
            .core
            .fetch_endpoint("GetMapsByUid", &format!("/maps/?mapUidList={map_uid}"))
            .await?;
        serde_json::from_value::<Vec<MapInfo>>(response)
            .context("Unexpected map info")?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Map {map_uid} not found"))
    }

    /// Mapa en trackmania.exchange. Que no esté publicado allí no es un error.
    pub async fn exchange_map_info(&self, map_uid: &str) -> Option<ExchangeMapInfo> {
        let exchange = self.exchange.as_ref()?;
        let info = exchange
            .fetch_endpoint("GetMapInfo", &format!("/api/maps/get_map_info/uid/{map_uid}"))
            .await
            .and_then(|response| {
                serde_json::from_value::<ExchangeMapInfo>(response)
                    .context("Unexpected trackmania.exchange map info")
            });

        match info {
            Ok(info) => Some(info),
            Err(e) => {
                info!("ℹ️ {} no disponible en trackmania.exchange: {:#}", map_uid, e);
                None
            }
        }
    }

    /// Ficha completa: Core API más trackmania.exchange o, sin él, el nombre
    /// del autor según Nadeo
    async fn map_card(
        &self,
        headline: String,
        map_uid: &str,
        group_uid: String,
        start: u64,
        end: u64,
    ) -> Result<TrackOfTheDay> {
        let (map, exchange) =
            tokio::join!(self.map_info(map_uid), self.exchange_map_info(map_uid));
        let track = TrackOfTheDay::from_map(headline, map?, group_uid, start, end);

        if let Some(exchange) = exchange {
            return Ok(track.with_exchange(exchange));
        }

        let author_name = match self.account_names(std::slice::from_ref(&track.author_uid)).await {
            Ok(mut names) => names.remove(&track.author_uid),
            Err(e) => {
                error!("❌ No se pudo obtener el nombre del autor {}: {:#}", track.author_uid, e);
                None
            }
        };
        Ok(TrackOfTheDay {
            author_name,
            ..track
        })
    }

    /// TOTD de `date` con la información del mapa
    pub async fn track_of_the_day(&self, date: NaiveDate, today: NaiveDate) -> Result<TrackOfTheDay> {
        let totd = self.totd_day(date, today).await?;

        // El día puede ser el anterior al pedido si este aún no empezó
        let day = NaiveDate::from_ymd_opt(date.year(), date.month(), totd.month_day).unwrap_or(date);
        let headline = format!(
            "Track of the Day - {} {}",
            DAYS.get(totd.day).copied().unwrap_or_default(),
            day.format("%B %-d, %Y")
        );

        let track = self
            .map_card(
                headline,
                &totd.map_uid,
                totd.season_uid,
                totd.start_timestamp,
                totd.end_timestamp,
            )
            .await?;
        info!("🏁 {}: {}", track.headline, track.map_name);

        Ok(track)
    }

    /// Ficha de cualquier mapa, fuera del caché del TOTD
    pub async fn track_details(
        &self,
        map_uid: &str,
        group_uid: &str,
        headline: String,
        end_timestamp: u64,
    ) -> Result<TrackOfTheDay> {
        self.map_card(headline, map_uid, group_uid.to_string(), 0, end_timestamp)
            .await
    }

    /// Récords mundiales de una ventana del leaderboard
    pub async fn leaderboard_page(
        &self,
        group_uid: &str,
        map_uid: &str,
        window: &PageWindow,
    ) -> Result<Vec<LeaderboardRecord>> {
        let path = format!(
            "/api/token/leaderboard/group/{}/map/{}/top?length={}&onlyWorld=true&offset={}",
            group_uid, map_uid, window.length, window.offset
        );
        let response = self.live.fetch_endpoint("GetMapLeaderboard", &path).await?;

        let tops: LeaderboardTops =
            serde_json::from_value(response).context("Unexpected leaderboard response")?;
        Ok(tops
            .tops
            .into_iter()
            .next()
            .map(|top| top.top)
            .unwrap_or_default())
    }

    /// Nombres visibles por account id
    pub async fn account_names(&self, account_ids: &[String]) -> Result<HashMap<String, String>> {
        if account_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = account_ids
            .iter()
            .map(|id| format!("accountId[]={id}"))
            .collect::<Vec<_>>()
            .join("&");
        let response = self
            .oauth
            .fetch_endpoint("GetAccountDisplayNames", &format!("/api/display-names?{query}"))
            .await?;

        serde_json::from_value(response).context("Unexpected display-name response")
    }

    /// Página del leaderboard con nombres y tiempos formateados
    pub async fn ranked_page(
        &self,
        group_uid: &str,
        map_uid: &str,
        window: &PageWindow,
    ) -> Result<Vec<RankedRecord>> {
        let records = self.leaderboard_page(group_uid, map_uid, window).await?;
        let ids: Vec<String> = records.iter().map(|r| r.account_id.clone()).collect();
        let mut names = self.account_names(&ids).await?;

        Ok(records
            .into_iter()
            .map(|record| RankedRecord {
                position: record.position,
                time: format_record_time(record.score),
                name: names
                    .remove(&record.account_id)
                    .unwrap_or_else(|| record.account_id.clone()),
                account_id: record.account_id,
            })
            .collect())
    }
}

/// Caché del TOTD vigente en `totd.json`
pub fn totd_provider(
    api: Arc<TrackmaniaApi>,
    store: Arc<dyn DurableStore>,
    clock: Clock,
) -> ExpiringCacheProvider<TrackOfTheDay> {
    let expiry_clock = clock.clone();

    ExpiringCacheProvider::json(
        TOTD_STORAGE_KEY,
        store,
        move |totd: &TrackOfTheDay| totd.is_expired(expiry_clock()),
        move || {
            let api = api.clone();
            let now = clock();
            async move {
                let now = DateTime::<Utc>::from_timestamp(now, 0)
                    .ok_or_else(|| anyhow!("Clock out of range: {now}"))?;
                let today = clock::totd_date(now);
                api.track_of_the_day(today, today).await
            }
        },
    )
}
