//! Formato de los `custom_id` de botones y menús.
//!
//! Discord devuelve el `custom_id` tal cual al pulsar un control, y no hay
//! sesión en el servidor, así que todo el estado viaja aquí. Forma general:
//!
//! ```text
//! <ruta>+<timestamp>[+<acción>...];<grupo>;<mapUid>[;<len>;<offset>]
//! ```
//!
//! - `<timestamp>` es `totd+<fin empaquetado>` o el centinela `0`
//! - `<grupo>` es el UUID de temporada empaquetado o `Personal_Best`
//! - las acciones del leaderboard son `f` (primera), `l` (última), `p` (menú
//!   de páginas), `<mapType>+<mapId empaquetado>+i` (abrir) o ninguna
//!   (anterior/siguiente)
//!
//! Los segmentos se leen por posición: un timestamp empaquetado puede
//! coincidir con una letra de acción (`f` es 15 en base 64).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::{PageWindow, PagerError};
use crate::codec::packer::{
    pack_timestamp, pack_uuid_like, unpack_timestamp, unpack_uuid_like, NO_TIMESTAMP,
    PERSONAL_BEST,
};
use crate::codec::CodecError;

/// Límite de Discord para `custom_id`
pub const MAX_TOKEN_LEN: usize = 100;

const LEADERBOARD_ROUTE: &str = "lb";
const TRACK_ROUTE: &str = "track";
/// `custom_id` del botón "Back" del mensaje de error
pub const BACK_ROUTE: &str = "back";
const TOTD_MARKER: &str = "totd";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("malformed control token {token:?}: {reason}")]
    Malformed { token: String, reason: &'static str },

    #[error("unknown control route {0:?}")]
    UnknownRoute(String),

    #[error(transparent)]
    InvalidWindow(#[from] PagerError),

    #[error("control token is {len} characters, Discord allows {MAX_TOKEN_LEN}")]
    TooLong { len: usize },
}

/// Grupo de un leaderboard: una temporada (UUID) o el récord personal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupId {
    PersonalBest,
    Season(String),
}

impl GroupId {
    pub fn from_uid(uid: impl Into<String>) -> Self {
        let uid = uid.into();
        if uid == PERSONAL_BEST {
            GroupId::PersonalBest
        } else {
            GroupId::Season(uid)
        }
    }

    /// Identificador tal como lo espera la API
    pub fn uid(&self) -> &str {
        match self {
            GroupId::PersonalBest => PERSONAL_BEST,
            GroupId::Season(uid) => uid,
        }
    }

    pub fn pack(&self) -> Result<String, CodecError> {
        pack_uuid_like(self.uid())
    }

    pub fn unpack(packed: &str) -> Result<Self, CodecError> {
        Ok(Self::from_uid(unpack_uuid_like(packed)?))
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uid())
    }
}

/// Qué leaderboard: grupo, mapa y, para el TOTD, cuándo termina.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardAnchor {
    pub group: GroupId,
    pub map_uid: String,
    pub end_timestamp: Option<u64>,
}

impl LeaderboardAnchor {
    pub fn new(group: GroupId, map_uid: impl Into<String>, end_timestamp: Option<u64>) -> Self {
        Self {
            group,
            map_uid: map_uid.into(),
            end_timestamp,
        }
    }

    /// Campo de timestamp: `totd+<empaquetado>` o `0`
    pub fn encoded_timestamp(&self) -> String {
        match self.end_timestamp {
            Some(end) => format!("{TOTD_MARKER}+{}", pack_timestamp(Some(end))),
            None => NO_TIMESTAMP.to_string(),
        }
    }

    /// Sufijo `;<grupo>;<mapUid>` común a todos los tokens
    fn encoded_target(&self) -> Result<String, CodecError> {
        Ok(format!("{};{}", self.group.pack()?, self.map_uid))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderboardAction {
    /// Abre el leaderboard desde la ficha del mapa
    Initialize { map_type: String, map_id: String },
    First,
    /// Anterior o siguiente: la ventana destino ya va en el token
    Navigate,
    Last,
}

impl LeaderboardAction {
    fn suffix(&self) -> Result<String, CodecError> {
        Ok(match self {
            LeaderboardAction::Initialize { map_type, map_id } => {
                format!("+{}+{}+i", map_type, pack_uuid_like(map_id)?)
            }
            LeaderboardAction::First => "+f".to_string(),
            LeaderboardAction::Navigate => String::new(),
            LeaderboardAction::Last => "+l".to_string(),
        })
    }
}

/// Estado decodificado de un control interactivo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlToken {
    Leaderboard {
        anchor: LeaderboardAnchor,
        action: LeaderboardAction,
        window: PageWindow,
    },
    /// Menú de páginas; la ventana llega en el valor de la opción elegida
    PageSelect { anchor: LeaderboardAnchor },
    TrackInfo {
        anchor: LeaderboardAnchor,
        label: String,
    },
    /// Botón "Back" del mensaje de error
    Back,
}

impl ControlToken {
    pub fn encode(&self) -> Result<String, TokenError> {
        match self {
            ControlToken::Leaderboard {
                anchor,
                action,
                window,
            } => encode_leaderboard_control(anchor, action, window.length, window.offset),
            ControlToken::PageSelect { anchor } => checked(format!(
                "{LEADERBOARD_ROUTE}+{}+p;{}",
                anchor.encoded_timestamp(),
                anchor.encoded_target()?
            )),
            ControlToken::TrackInfo { anchor, label } => checked(format!(
                "{TRACK_ROUTE}+{};{};{}",
                anchor.encoded_timestamp(),
                anchor.encoded_target()?,
                label
            )),
            ControlToken::Back => Ok(BACK_ROUTE.to_string()),
        }
    }
}

/// Token de un botón del leaderboard sin validar la ventana destino.
///
/// "Back" en la primera página apunta a un offset negativo; el botón sale
/// deshabilitado pero su `custom_id` se emite igual.
pub fn encode_leaderboard_control(
    anchor: &LeaderboardAnchor,
    action: &LeaderboardAction,
    length: i64,
    offset: i64,
) -> Result<String, TokenError> {
    checked(format!(
        "{LEADERBOARD_ROUTE}+{}{};{};{};{}",
        anchor.encoded_timestamp(),
        action.suffix()?,
        anchor.encoded_target()?,
        length,
        offset
    ))
}

/// Valor de una opción del menú de páginas: `<len>;<offset>`
pub fn encode_page_value(length: i64, offset: i64) -> String {
    format!("{length};{offset}")
}

pub fn parse_page_value(value: &str) -> Result<PageWindow, TokenError> {
    let (length, offset) = value.split_once(';').ok_or_else(|| TokenError::Malformed {
        token: value.to_string(),
        reason: "page value must be <length>;<offset>",
    })?;
    parse_window(value, length, offset)
}

fn checked(token: String) -> Result<String, TokenError> {
    if token.len() > MAX_TOKEN_LEN {
        return Err(TokenError::TooLong { len: token.len() });
    }
    Ok(token)
}

fn parse_window(token: &str, length: &str, offset: &str) -> Result<PageWindow, TokenError> {
    let malformed = || TokenError::Malformed {
        token: token.to_string(),
        reason: "window fields must be integers",
    };
    let length: i64 = length.parse().map_err(|_| malformed())?;
    let offset: i64 = offset.parse().map_err(|_| malformed())?;
    Ok(PageWindow::new(offset, length)?)
}

impl FromStr for ControlToken {
    type Err = TokenError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let malformed = |reason| TokenError::Malformed {
            token: token.to_string(),
            reason,
        };

        let params: Vec<&str> = token.split(';').collect();
        let queries: Vec<&str> = params[0].split('+').collect();

        match queries[0] {
            BACK_ROUTE if token == BACK_ROUTE => return Ok(ControlToken::Back),
            LEADERBOARD_ROUTE | TRACK_ROUTE => {}
            other => return Err(TokenError::UnknownRoute(other.to_string())),
        }

        let (end_timestamp, rest) = match queries.get(1).copied() {
            Some(TOTD_MARKER) => {
                let packed = queries
                    .get(2)
                    .ok_or_else(|| malformed("totd marker without a timestamp"))?;
                // bajo `totd` siempre hay un timestamp real
                let end = unpack_timestamp(packed)?.unwrap_or_default();
                (Some(end), &queries[3..])
            }
            Some(NO_TIMESTAMP) => (None, &queries[2..]),
            _ => return Err(malformed("missing timestamp field")),
        };

        if params.len() < 3 {
            return Err(malformed("missing group or map"));
        }
        if params[2].is_empty() {
            return Err(malformed("empty map uid"));
        }
        let anchor = LeaderboardAnchor::new(GroupId::unpack(params[1])?, params[2], end_timestamp);

        if queries[0] == TRACK_ROUTE {
            if !rest.is_empty() || params.len() < 4 {
                return Err(malformed("track token must be track+<ts>;<group>;<map>;<label>"));
            }
            return Ok(ControlToken::TrackInfo {
                anchor,
                label: params[3..].join(";"),
            });
        }

        let action = match rest {
            ["p"] if params.len() == 3 => return Ok(ControlToken::PageSelect { anchor }),
            [] => LeaderboardAction::Navigate,
            ["f"] => LeaderboardAction::First,
            ["l"] => LeaderboardAction::Last,
            [map_type, map_id, "i"] => LeaderboardAction::Initialize {
                map_type: map_type.to_string(),
                map_id: unpack_uuid_like(map_id)?,
            },
            _ => return Err(malformed("unknown leaderboard action")),
        };

        if params.len() != 5 {
            return Err(malformed("leaderboard token must end in ;<length>;<offset>"));
        }
        let window = parse_window(token, params[3], params[4])?;

        Ok(ControlToken::Leaderboard {
            anchor,
            action,
            window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SEASON: &str = "cc1004c0-3bcd-41f9-a1fd-e09f80df7e54";
    const MAP_ID: &str = "3ccc7a5c-5040-452d-acff-45aa9cddd732";
    const MAP_UID: &str = "Kx3ZRUYvbqMnMk2f8Ov3JEQNDD4";
    const END: u64 = 1_733_421_600;

    fn totd_anchor() -> LeaderboardAnchor {
        LeaderboardAnchor::new(GroupId::from_uid(SEASON), MAP_UID, Some(END))
    }

    fn prefix() -> String {
        format!("totd+{}", pack_timestamp(Some(END)))
    }

    fn group() -> String {
        pack_uuid_like(SEASON).unwrap()
    }

    #[test]
    fn test_navigation_wire_format() {
        let anchor = totd_anchor();
        let (ts, g) = (prefix(), group());

        assert_eq!(
            encode_leaderboard_control(&anchor, &LeaderboardAction::First, 25, 0).unwrap(),
            format!("lb+{ts}+f;{g};{MAP_UID};25;0")
        );
        assert_eq!(
            encode_leaderboard_control(&anchor, &LeaderboardAction::Navigate, 25, -25).unwrap(),
            format!("lb+{ts};{g};{MAP_UID};25;-25")
        );
        assert_eq!(
            encode_leaderboard_control(&anchor, &LeaderboardAction::Last, 25, 975).unwrap(),
            format!("lb+{ts}+l;{g};{MAP_UID};25;975")
        );
    }

    #[test]
    fn test_other_controls_wire_format() {
        let anchor = totd_anchor();
        let (ts, g) = (prefix(), group());

        let init = ControlToken::Leaderboard {
            anchor: anchor.clone(),
            action: LeaderboardAction::Initialize {
                map_type: "TM_Race".to_string(),
                map_id: MAP_ID.to_string(),
            },
            window: PageWindow::new(0, 25).unwrap(),
        };
        let packed_map_id = pack_uuid_like(MAP_ID).unwrap();
        assert_eq!(
            init.encode().unwrap(),
            format!("lb+{ts}+TM_Race+{packed_map_id}+i;{g};{MAP_UID};25;0")
        );

        let select = ControlToken::PageSelect {
            anchor: anchor.clone(),
        };
        assert_eq!(select.encode().unwrap(), format!("lb+{ts}+p;{g};{MAP_UID}"));

        let track = ControlToken::TrackInfo {
            anchor,
            label: "December 5".to_string(),
        };
        assert_eq!(
            track.encode().unwrap(),
            format!("track+{ts};{g};{MAP_UID};December 5")
        );
        assert_eq!(ControlToken::Back.encode().unwrap(), "back");
    }

    #[test]
    fn test_personal_best_without_timestamp() {
        let anchor = LeaderboardAnchor::new(GroupId::PersonalBest, MAP_UID, None);
        let token = encode_leaderboard_control(&anchor, &LeaderboardAction::Navigate, 10, 20).unwrap();
        assert_eq!(token, format!("lb+0;Personal_Best;{MAP_UID};10;20"));

        let parsed: ControlToken = token.parse().unwrap();
        assert_eq!(
            parsed,
            ControlToken::Leaderboard {
                anchor,
                action: LeaderboardAction::Navigate,
                window: PageWindow::new(20, 10).unwrap(),
            }
        );
    }

    #[test]
    fn test_decode_recovers_full_request() {
        let anchor = totd_anchor();
        let tokens = [
            ControlToken::Leaderboard {
                anchor: anchor.clone(),
                action: LeaderboardAction::First,
                window: PageWindow::new(0, 25).unwrap(),
            },
            ControlToken::Leaderboard {
                anchor: anchor.clone(),
                action: LeaderboardAction::Last,
                window: PageWindow::new(975, 25).unwrap(),
            },
            ControlToken::Leaderboard {
                anchor: anchor.clone(),
                action: LeaderboardAction::Initialize {
                    map_type: "TM_Race".to_string(),
                    map_id: MAP_ID.to_string(),
                },
                window: PageWindow::new(0, 25).unwrap(),
            },
            ControlToken::PageSelect {
                anchor: anchor.clone(),
            },
            ControlToken::TrackInfo {
                anchor,
                label: "label;with;semicolons".to_string(),
            },
            ControlToken::Back,
        ];

        for token in tokens {
            let encoded = token.encode().unwrap();
            assert!(encoded.len() <= MAX_TOKEN_LEN, "{encoded}");
            assert_eq!(encoded.parse::<ControlToken>().unwrap(), token);
        }
    }

    #[test]
    fn test_timestamp_that_looks_like_an_action() {
        // 15 empaqueta a "f" y 21 a "l"
        for end in [15, 21] {
            let anchor = LeaderboardAnchor::new(GroupId::PersonalBest, MAP_UID, Some(end));
            let token =
                encode_leaderboard_control(&anchor, &LeaderboardAction::Navigate, 25, 50).unwrap();

            match token.parse::<ControlToken>().unwrap() {
                ControlToken::Leaderboard { anchor, action, .. } => {
                    assert_eq!(anchor.end_timestamp, Some(end));
                    assert_eq!(action, LeaderboardAction::Navigate);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_page_values() {
        assert_eq!(encode_page_value(25, 50), "25;50");
        assert_eq!(parse_page_value("25;50").unwrap(), PageWindow::new(50, 25).unwrap());
        assert!(matches!(
            parse_page_value("25"),
            Err(TokenError::Malformed { .. })
        ));
        assert!(matches!(
            parse_page_value("0;50"),
            Err(TokenError::InvalidWindow(_))
        ));
    }

    #[test]
    fn test_rejects_bad_tokens() {
        assert!(matches!(
            "acc+lb".parse::<ControlToken>(),
            Err(TokenError::UnknownRoute(route)) if route == "acc"
        ));
        assert!(matches!(
            "lb;x;y;25;0".parse::<ControlToken>(),
            Err(TokenError::Malformed { .. })
        ));
        assert!(matches!(
            format!("lb+0+z;Personal_Best;{MAP_UID};25;0").parse::<ControlToken>(),
            Err(TokenError::Malformed { .. })
        ));
        assert!(matches!(
            format!("lb+0;Personal_Best;{MAP_UID};25;-25").parse::<ControlToken>(),
            Err(TokenError::InvalidWindow(_))
        ));
        assert!(matches!(
            format!("lb+0;Personal_Best;{MAP_UID};25").parse::<ControlToken>(),
            Err(TokenError::Malformed { .. })
        ));
        assert!(matches!(
            format!("lb+totd+#;Personal_Best;{MAP_UID};25;0").parse::<ControlToken>(),
            Err(TokenError::Codec(CodecError::InvalidSymbol { symbol: '#', .. }))
        ));
    }

    #[test]
    fn test_too_long_is_rejected_at_encode() {
        let anchor = LeaderboardAnchor::new(GroupId::from_uid(SEASON), "m".repeat(80), Some(END));
        assert!(matches!(
            encode_leaderboard_control(&anchor, &LeaderboardAction::First, 25, 0),
            Err(TokenError::TooLong { .. })
        ));
    }
}
