use serenity::{
    all::ButtonStyle,
    builder::{
        CreateActionRow, CreateButton, CreateSelectMenu, CreateSelectMenuKind,
        CreateSelectMenuOption,
    },
};

use crate::leaderboard::token::{
    ControlToken, LeaderboardAction, LeaderboardAnchor, TokenError, BACK_ROUTE,
};
use crate::leaderboard::{NavControl, PageWindow, WindowControls};
use crate::services::trackmania::TrackOfTheDay;

/// Controles del mensaje de leaderboard: navegación, menú de páginas y "Track Info"
pub fn leaderboard_controls(controls: &WindowControls, track_info_id: &str) -> Vec<CreateActionRow> {
    let nav = |label: &str, emoji: char, control: &NavControl| {
        CreateButton::new(&control.custom_id)
            .label(label)
            .emoji(emoji)
            .style(ButtonStyle::Secondary)
            .disabled(!control.enabled)
    };

    let buttons = CreateActionRow::Buttons(vec![
        nav("First", '⏪', &controls.first),
        nav("Back", '⬅', &controls.back),
        nav("Next", '➡', &controls.next),
        nav("Last", '⏩', &controls.last),
    ]);

    let options = controls
        .page_options
        .iter()
        .map(|page| CreateSelectMenuOption::new(&page.label, &page.value).description(&page.description))
        .collect();
    let page_select = CreateActionRow::SelectMenu(
        CreateSelectMenu::new(&controls.page_select_id, CreateSelectMenuKind::String { options })
            .placeholder("Select page"),
    );

    let track_info = CreateActionRow::Buttons(vec![CreateButton::new(track_info_id)
        .label("Track Info")
        .emoji('🏁')
        .style(ButtonStyle::Primary)]);

    vec![buttons, page_select, track_info]
}

/// Botones bajo la ficha de un mapa
pub fn track_controls(
    track: &TrackOfTheDay,
    anchor: &LeaderboardAnchor,
    page_length: i64,
) -> Result<Vec<CreateActionRow>, TokenError> {
    let open_leaderboard = ControlToken::Leaderboard {
        anchor: anchor.clone(),
        action: LeaderboardAction::Initialize {
            map_type: track.map_type.clone(),
            map_id: track.map_id.clone(),
        },
        window: PageWindow::new(0, page_length)?,
    }
    .encode()?;

    let mut buttons = vec![
        CreateButton::new(open_leaderboard)
            .label("Leaderboard")
            .emoji('📋')
            .style(ButtonStyle::Primary),
        CreateButton::new_link(format!(
            "https://trackmania.io/#/totd/leaderboard/{}/{}",
            track.group_uid, track.map_uid
        ))
        .label("Trackmania.io"),
    ];
    if let Some(url) = &track.exchange_url {
        buttons.push(
            CreateButton::new_link(url)
                .label("Trackmania.Exchange")
                .emoji('💻'),
        );
    }

    Ok(vec![CreateActionRow::Buttons(buttons)])
}

/// Único botón del mensaje de error
pub fn error_controls() -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![CreateButton::new(BACK_ROUTE)
        .label("Back")
        .style(ButtonStyle::Primary)])]
}
