use serenity::{
    all::{Colour, Timestamp},
    builder::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter},
};

use crate::services::trackmania::{format_record_time, RankedRecord, TrackOfTheDay};

/// Paleta de colores estandarizada para el bot
pub mod colors {
    use serenity::all::Colour;

    pub const ERROR_RED: Colour = Colour::from_rgb(255, 0, 0);
    pub const LEADERBOARD_WHITE: Colour = Colour::from_rgb(255, 255, 255);
    pub const TOTD_GREEN: Colour = Colour::from_rgb(67, 181, 129);
}

const STANDARD_FOOTER: &str = "Provided by Nadeo";
const NO_TAGS: &str = "not available";

/// Discord corta los valores de campo en 1024 caracteres
const FIELD_VALUE_LIMIT: usize = 1024;

const RECORDS_HEADER: &str = "```RANK | TIME      | PLAYER\n-----+-----------+-----------------";
const NO_RECORDS: &str = "\n\nNo records available at this time :(";

/// Bloque de código con una fila por récord
pub fn render_records(records: &[RankedRecord]) -> String {
    if records.is_empty() {
        return format!("{RECORDS_HEADER}{NO_RECORDS}```");
    }

    let mut value = RECORDS_HEADER.to_string();
    for record in records {
        let row = format!("\n{:>5}: {} - {}", record.position, record.time, record.name);
        if value.len() + row.len() + 3 > FIELD_VALUE_LIMIT {
            break;
        }
        value.push_str(&row);
    }
    value.push_str("```");
    value
}

/// Nombre del campo: `Page N : <primera posición> - <última posición>`
pub fn records_title(page_label: &str, records: &[RankedRecord]) -> String {
    match (records.first(), records.last()) {
        (Some(first), Some(last)) => {
            format!("{} : {} - {}", page_label, first.position, last.position)
        }
        _ => format!("{page_label} : -"),
    }
}

pub fn leaderboard_embed(heading: &str, page_label: &str, records: &[RankedRecord]) -> CreateEmbed {
    CreateEmbed::new()
        .author(CreateEmbedAuthor::new(heading))
        .title("Leaderboard")
        .color(colors::LEADERBOARD_WHITE)
        .field(records_title(page_label, records), render_records(records), false)
}

pub fn track_embed(totd: &TrackOfTheDay) -> CreateEmbed {
    let medal_times = [
        ("🏆", totd.author_time),
        ("🥇", totd.gold_time),
        ("🥈", totd.silver_time),
        ("🥉", totd.bronze_time),
    ]
    .iter()
    .map(|(medal, time)| format!("{} `{}`", medal, format_record_time(*time)))
    .collect::<Vec<_>>()
    .join("\n");

    let tags = if totd.tags.is_empty() {
        NO_TAGS.to_string()
    } else {
        totd.tags.join("\n")
    };

    let provider = match totd.exchange_url {
        Some(_) => format!("{STANDARD_FOOTER} and Trackmania.Exchange"),
        None => STANDARD_FOOTER.to_string(),
    };

    let mut embed = CreateEmbed::new()
        .author(
            CreateEmbedAuthor::new(&totd.headline)
                .url(format!("https://www.trackmania.com/tracks/{}", totd.map_uid)),
        )
        .title(&totd.map_name)
        .description(format!("Made by {}", totd.author_display()))
        .color(totd.style_color.map(Colour::new).unwrap_or(colors::TOTD_GREEN))
        .field("Author", totd.author_display(), true)
        .field("Medal Times", medal_times, true)
        .field("Map Tags", tags, true)
        .field("Ends", format!("<t:{}:R>", totd.end_timestamp), true)
        .footer(CreateEmbedFooter::new(format!(
            "Map UID: {}\n{}",
            totd.map_uid, provider
        )))
        .timestamp(Timestamp::now());

    if let Some(thumbnail) = &totd.thumbnail_url {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}

/// Embed genérico para cuando falla una interacción
pub fn error_embed(reason: &str) -> CreateEmbed {
    CreateEmbed::new()
        .title("Error: Unable to handle request")
        .color(colors::ERROR_RED)
        .field("Reason", reason, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(position: i64, name: &str) -> RankedRecord {
        RankedRecord {
            position,
            time: format_record_time(45_000 + position),
            account_id: format!("acc-{position}"),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_render_records() {
        let value = render_records(&[record(1, "Wirtual"), record(2, "Scrapie")]);
        assert_eq!(
            value,
            format!("{RECORDS_HEADER}\n    1: 00:45:001 - Wirtual\n    2: 00:45:002 - Scrapie```")
        );
        assert_eq!(
            records_title("Page 1", &[record(1, "a"), record(25, "b")]),
            "Page 1 : 1 - 25"
        );
    }

    #[test]
    fn test_render_empty_page() {
        assert!(render_records(&[]).contains("No records available"));
        assert_eq!(records_title("Page 41", &[]), "Page 41 : -");
    }

    fn track(exchange: bool) -> TrackOfTheDay {
        let mut track: TrackOfTheDay = serde_json::from_value(serde_json::json!({
            "headline": "Track of the Day - Thur. December 5, 2024",
            "mapUid": "Kx3ZRUYvbqMnMk2f8Ov3JEQNDD4",
            "mapId": "3ccc7a5c-5040-452d-acff-45aa9cddd732",
            "mapName": "Sunny Side",
            "authorUid": "d2372a08-a8a1-46cb-97fb-23a161d85ad0",
            "authorTime": 45_123, "goldTime": 48_000, "silverTime": 55_000, "bronzeTime": 68_000,
            "mapType": "TM_Race",
            "groupUid": "Personal_Best",
            "startTimestamp": 1_733_335_200u64,
            "endTimestamp": 1_733_421_600u64,
        }))
        .unwrap();
        if exchange {
            track.author_name = Some("Ealipse".to_string());
            track.tags = vec!["Tech".to_string(), "Ice".to_string()];
            track.exchange_url = Some("https://trackmania.exchange/s/tr/123".to_string());
            track.style_color = Some(0x05767d);
        }
        track
    }

    #[test]
    fn test_track_embed_without_exchange() {
        let json = serde_json::to_value(track_embed(&track(false))).unwrap();

        assert_eq!(json["description"], "Made by d2372a08-a8a1-46cb-97fb-23a161d85ad0");
        assert_eq!(json["color"], colors::TOTD_GREEN.0);
        assert_eq!(json["fields"][2]["name"], "Map Tags");
        assert_eq!(json["fields"][2]["value"], "not available");
        assert_eq!(
            json["footer"]["text"],
            "Map UID: Kx3ZRUYvbqMnMk2f8Ov3JEQNDD4\nProvided by Nadeo"
        );
    }

    #[test]
    fn test_track_embed_with_exchange() {
        let json = serde_json::to_value(track_embed(&track(true))).unwrap();

        assert_eq!(json["description"], "Made by Ealipse");
        assert_eq!(json["fields"][0]["value"], "Ealipse");
        assert_eq!(json["fields"][2]["value"], "Tech\nIce");
        assert_eq!(json["color"], 0x05767d);
        assert!(json["footer"]["text"]
            .as_str()
            .unwrap()
            .ends_with("Provided by Nadeo and Trackmania.Exchange"));
    }

    #[test]
    fn test_render_respects_field_limit() {
        let records: Vec<_> = (1..=100).map(|p| record(p, "a-rather-long-player-name")).collect();
        let value = render_records(&records);
        assert!(value.len() <= FIELD_VALUE_LIMIT);
        assert!(value.ends_with("```"));
    }
}
