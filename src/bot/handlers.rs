use anyhow::{anyhow, Result};
use serenity::{
    builder::EditInteractionResponse,
    model::application::{
        CommandInteraction, ComponentInteraction, ComponentInteractionDataKind, ResolvedOption,
        ResolvedValue,
    },
    prelude::Context,
};
use tracing::{error, info};

use crate::{
    bot::TrackmaniaBot,
    leaderboard::{
        describe_window,
        token::{parse_page_value, ControlToken, LeaderboardAction, LeaderboardAnchor},
        PageWindow,
    },
    ui::{buttons, embeds},
};

const TOTD_HEADLINE_PREFIX: &str = "Track of the Day - ";
const MAP_SEARCH_HEADLINE: &str = "Map Search";

/// Título de la ficha de un mapa abierta desde "Track Info"
pub fn track_headline(anchor: &LeaderboardAnchor, label: &str) -> String {
    match anchor.end_timestamp {
        Some(_) => format!("{TOTD_HEADLINE_PREFIX}{label}"),
        None => MAP_SEARCH_HEADLINE.to_string(),
    }
}

/// Subcomando de `/totd`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotdRequest {
    Today,
    Past { year: i64, month: i64, day: i64 },
}

impl TotdRequest {
    /// `today` (o sin opciones) usa el caché; `past <year> <month> <day>` no
    pub fn from_options(options: &[ResolvedOption<'_>]) -> Result<Self> {
        let Some(ResolvedOption {
            name: "past",
            value: ResolvedValue::SubCommand(fields),
            ..
        }) = options.first()
        else {
            return Ok(TotdRequest::Today);
        };

        let field = |wanted: &str| {
            fields
                .iter()
                .find_map(|option| match &option.value {
                    ResolvedValue::Integer(value) if option.name == wanted => Some(*value),
                    _ => None,
                })
                .ok_or_else(|| anyhow!("Missing /totd past option: {wanted}"))
        };

        Ok(TotdRequest::Past {
            year: field("year")?,
            month: field("month")?,
            day: field("day")?,
        })
    }
}

/// Parte del título que viaja en el token de "Track Info"
pub fn track_label(headline: &str) -> &str {
    headline
        .strip_prefix(TOTD_HEADLINE_PREFIX)
        .unwrap_or(headline)
}

/// Maneja comandos slash
pub async fn handle_command(
    ctx: &Context,
    command: CommandInteraction,
    bot: &TrackmaniaBot,
) -> Result<()> {
    info!("📝 Comando /{} usado por {}", command.data.name, command.user.name);

    if command.data.name != "totd" {
        info!("Comando /{} ignorado", command.data.name);
        return Ok(());
    }

    command.defer(&ctx.http).await?;

    let reply = match totd_reply(bot, &command.data.options()).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("❌ Error obteniendo el TOTD: {:#}", e);
            error_reply(&e)
        }
    };
    command.edit_response(&ctx.http, reply).await?;

    Ok(())
}

async fn totd_reply(
    bot: &TrackmaniaBot,
    options: &[ResolvedOption<'_>],
) -> Result<EditInteractionResponse> {
    let totd = match TotdRequest::from_options(options)? {
        TotdRequest::Today => bot.current_totd().await?,
        TotdRequest::Past { year, month, day } => bot.past_totd(year, month, day).await?,
    };
    Ok(EditInteractionResponse::new()
        .embed(embeds::track_embed(&totd))
        .components(buttons::track_controls(&totd, &totd.anchor(), bot.page_length())?))
}

/// Maneja interacciones con componentes (botones, menús, etc.)
pub async fn handle_component(
    ctx: &Context,
    component: ComponentInteraction,
    bot: &TrackmaniaBot,
) -> Result<()> {
    info!(
        "🔘 Componente {} usado por {}",
        component.data.custom_id, component.user.name
    );

    let token = component.data.custom_id.parse::<ControlToken>();

    // Abrir un leaderboard o una ficha crea un mensaje efímero nuevo; el resto
    // edita el mensaje existente
    let opens_new_message = matches!(
        token,
        Ok(ControlToken::TrackInfo { .. })
            | Ok(ControlToken::Leaderboard {
                action: LeaderboardAction::Initialize { .. },
                ..
            })
    );
    if opens_new_message {
        component.defer_ephemeral(&ctx.http).await?;
    } else {
        component.defer(&ctx.http).await?;
    }

    let rendered = match token {
        Ok(token) => render_component(&component, bot, token).await,
        Err(e) => Err(e.into()),
    };

    match rendered {
        Ok(Some(reply)) => {
            component.edit_response(&ctx.http, reply).await?;
        }
        Ok(None) => component.delete_response(&ctx.http).await?,
        Err(e) => {
            error!("❌ Error manejando {}: {:#}", component.data.custom_id, e);
            component.edit_response(&ctx.http, error_reply(&e)).await?;
        }
    }

    Ok(())
}

/// `None` borra el mensaje (botón "Back" del error)
async fn render_component(
    component: &ComponentInteraction,
    bot: &TrackmaniaBot,
    token: ControlToken,
) -> Result<Option<EditInteractionResponse>> {
    let heading = message_heading(component);

    let reply = match token {
        ControlToken::Leaderboard { anchor, window, .. } => {
            leaderboard_reply(bot, &anchor, &window, &heading).await?
        }
        ControlToken::PageSelect { anchor } => {
            let value = match &component.data.kind {
                ComponentInteractionDataKind::StringSelect { values } => values.first(),
                _ => None,
            }
            .ok_or_else(|| anyhow!("Page select without a selected value"))?;
            let window = parse_page_value(value)?;
            leaderboard_reply(bot, &anchor, &window, &heading).await?
        }
        ControlToken::TrackInfo { anchor, label } => {
            let (track, anchor) = bot.track_for(&anchor, &label).await?;
            EditInteractionResponse::new()
                .embed(embeds::track_embed(&track))
                .components(buttons::track_controls(&track, &anchor, bot.page_length())?)
        }
        ControlToken::Back => return Ok(None),
    };

    Ok(Some(reply))
}

async fn leaderboard_reply(
    bot: &TrackmaniaBot,
    anchor: &LeaderboardAnchor,
    window: &PageWindow,
    heading: &str,
) -> Result<EditInteractionResponse> {
    let records = bot
        .api()
        .ranked_page(anchor.group.uid(), &anchor.map_uid, window)
        .await?;
    let controls = describe_window(window, anchor)?;

    let track_info_id = ControlToken::TrackInfo {
        anchor: anchor.clone(),
        label: track_label(heading).to_string(),
    }
    .encode()?;
    let page_label = controls
        .page_options
        .first()
        .map(|page| page.label.as_str())
        .unwrap_or_default();

    info!(
        "📋 Leaderboard {} posiciones {}-{}",
        anchor.map_uid,
        window.offset,
        window.offset + window.length
    );

    Ok(EditInteractionResponse::new()
        .embed(embeds::leaderboard_embed(heading, page_label, &records))
        .components(buttons::leaderboard_controls(&controls, &track_info_id)))
}

/// Autor del primer embed del mensaje: el título de la ficha o del leaderboard
fn message_heading(component: &ComponentInteraction) -> String {
    component
        .message
        .embeds
        .first()
        .and_then(|embed| embed.author.as_ref())
        .map(|author| author.name.clone())
        .unwrap_or_else(|| MAP_SEARCH_HEADLINE.to_string())
}

fn error_reply(error: &anyhow::Error) -> EditInteractionResponse {
    EditInteractionResponse::new()
        .embed(embeds::error_embed(&format!("{error:#}")))
        .components(buttons::error_controls())
}
