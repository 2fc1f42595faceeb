//! # Leaderboard Pager
//!
//! Navigation over a bounded leaderboard window. The upstream API only serves
//! the top [`MAX_LEADERBOARD_POSITIONS`] records, so every window lives inside
//! `0..MAX_LEADERBOARD_POSITIONS`.
//!
//! [`describe_window`] turns the current window into the state of every
//! control (First, Back, Next, Last and the page menu), each carrying its own
//! encoded [`token`] so the next interaction needs no server-side session.

pub mod token;

use thiserror::Error;

use token::{
    encode_leaderboard_control, encode_page_value, ControlToken, LeaderboardAction,
    LeaderboardAnchor, TokenError,
};

/// Posiciones máximas que sirve la API de leaderboards
pub const MAX_LEADERBOARD_POSITIONS: i64 = 1000;

/// Límite de opciones en un select menu de Discord
pub const PAGE_OPTION_COUNT: i64 = 25;

/// Longitud de página de los botones "Leaderboard"
pub const DEFAULT_PAGE_LENGTH: i64 = 25;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PagerError {
    #[error("invalid leaderboard window (offset {offset}, length {length}, capacity {total_capacity}): {reason}")]
    InvalidWindow {
        offset: i64,
        length: i64,
        total_capacity: i64,
        reason: &'static str,
    },
}

/// Porción de un leaderboard.
///
/// `offset + length` puede pasar de `total_capacity`: una última página
/// incompleta se muestra igual. Lo que se limita son las transiciones.
///
/// El offset no puede pasar de `total_capacity + PAGE_OPTION_COUNT * length`,
/// el alcance del menú de páginas, así que las cuentas de [`describe_window`]
/// nunca desbordan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: i64,
    pub length: i64,
    pub total_capacity: i64,
}

impl PageWindow {
    pub fn new(offset: i64, length: i64) -> Result<Self, PagerError> {
        Self::with_capacity(offset, length, MAX_LEADERBOARD_POSITIONS)
    }

    pub fn with_capacity(offset: i64, length: i64, total_capacity: i64) -> Result<Self, PagerError> {
        let invalid = |reason| PagerError::InvalidWindow {
            offset,
            length,
            total_capacity,
            reason,
        };

        if offset < 0 {
            return Err(invalid("offset must not be negative"));
        }
        if length <= 0 {
            return Err(invalid("length must be positive"));
        }
        if total_capacity < length {
            return Err(invalid("capacity must hold at least one page"));
        }

        // El menú de páginas suma hasta PAGE_OPTION_COUNT páginas más al offset
        let reach = length.checked_mul(PAGE_OPTION_COUNT);
        let max_offset = reach.and_then(|reach| total_capacity.checked_add(reach));
        let headroom = reach.and_then(|reach| max_offset?.checked_add(reach));
        match (max_offset, headroom) {
            (Some(max_offset), Some(_)) if offset <= max_offset => {}
            (Some(_), Some(_)) => return Err(invalid("offset is past the page menu reach")),
            _ => return Err(invalid("window is too large")),
        }

        Ok(Self {
            offset,
            length,
            total_capacity,
        })
    }

    pub fn back_offset(&self) -> i64 {
        self.offset - self.length
    }

    pub fn next_offset(&self) -> i64 {
        self.offset + self.length
    }

    /// "Last" salta a `total_capacity - length` para que la última página esté llena
    pub fn last_offset(&self) -> i64 {
        self.total_capacity - self.length
    }

    pub fn first_enabled(&self) -> bool {
        self.offset != 0
    }

    pub fn back_enabled(&self) -> bool {
        self.back_offset() >= 0
    }

    pub fn next_enabled(&self) -> bool {
        self.next_offset() < self.total_capacity
    }

    pub fn last_enabled(&self) -> bool {
        self.offset < self.last_offset()
    }
}

/// Un botón de navegación ya resuelto
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavControl {
    pub enabled: bool,
    pub custom_id: String,
    pub target_offset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageOption {
    pub label: String,
    pub value: String,
    pub description: String,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowControls {
    pub first: NavControl,
    pub back: NavControl,
    pub next: NavControl,
    pub last: NavControl,
    pub page_select_id: String,
    pub page_options: Vec<PageOption>,
}

/// Estado de todos los controles de navegación para `window`.
///
/// Se ofrecen siempre [`PAGE_OPTION_COUNT`] páginas a partir de la actual,
/// aunque pasen del final de los datos: esas devuelven un leaderboard vacío.
pub fn describe_window(
    window: &PageWindow,
    anchor: &LeaderboardAnchor,
) -> Result<WindowControls, TokenError> {
    let nav = |action: LeaderboardAction, target_offset: i64, enabled: bool| {
        encode_leaderboard_control(anchor, &action, window.length, target_offset).map(|custom_id| {
            NavControl {
                enabled,
                custom_id,
                target_offset,
            }
        })
    };

    let first = nav(LeaderboardAction::First, 0, window.first_enabled())?;
    let back = nav(LeaderboardAction::Navigate, window.back_offset(), window.back_enabled())?;
    let next = nav(LeaderboardAction::Navigate, window.next_offset(), window.next_enabled())?;
    let last = nav(LeaderboardAction::Last, window.last_offset(), window.last_enabled())?;

    let page_select_id = ControlToken::PageSelect {
        anchor: anchor.clone(),
    }
    .encode()?;

    let page_options = (0..PAGE_OPTION_COUNT)
        .map(|i| page_option(window.offset + window.length * i, window.length))
        .collect();

    Ok(WindowControls {
        first,
        back,
        next,
        last,
        page_select_id,
        page_options,
    })
}

fn page_option(offset: i64, length: i64) -> PageOption {
    // offsets no alineados dan páginas fraccionarias ("Page 1.4")
    let page = offset as f64 / length as f64 + 1.0;
    PageOption {
        label: format!("Page {page}"),
        value: encode_page_value(length, offset),
        description: format!("Leaderboard positions {} - {}", offset, offset + length),
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::token::GroupId;
    use super::*;
    use pretty_assertions::assert_eq;

    fn anchor() -> LeaderboardAnchor {
        LeaderboardAnchor::new(GroupId::PersonalBest, "Kx3ZRUYvbqMnMk2f8Ov3JEQNDD4", None)
    }

    fn describe(offset: i64, length: i64) -> WindowControls {
        describe_window(&PageWindow::new(offset, length).unwrap(), &anchor()).unwrap()
    }

    #[test]
    fn test_first_page_disables_first_and_back() {
        let controls = describe(0, 25);

        assert!(!controls.first.enabled);
        assert!(!controls.back.enabled);
        assert!(controls.next.enabled);
        assert!(controls.last.enabled);
        assert_eq!(controls.back.target_offset, -25);
        assert_eq!(controls.next.target_offset, 25);
    }

    #[test]
    fn test_last_page_disables_next_and_last() {
        let controls = describe(975, 25);

        assert!(controls.first.enabled);
        assert!(controls.back.enabled);
        assert!(!controls.next.enabled);
        assert!(!controls.last.enabled);
        assert_eq!(controls.last.target_offset, 975);
    }

    #[test]
    fn test_last_targets_full_final_page() {
        let controls = describe(100, 30);
        assert_eq!(controls.last.target_offset, MAX_LEADERBOARD_POSITIONS - 30);
        assert_eq!(
            controls.last.custom_id,
            "lb+0+l;Personal_Best;Kx3ZRUYvbqMnMk2f8Ov3JEQNDD4;30;970"
        );
        assert_eq!(
            controls.first.custom_id,
            "lb+0+f;Personal_Best;Kx3ZRUYvbqMnMk2f8Ov3JEQNDD4;30;0"
        );
    }

    #[test]
    fn test_degenerate_last_page() {
        // 990 + 25 pasa de 1000 y aun así se renderiza
        let controls = describe(990, 25);
        assert!(!controls.next.enabled);
        assert!(!controls.last.enabled);
        assert!(controls.back.enabled);
    }

    #[test]
    fn test_page_options_are_fixed_enumeration() {
        let controls = describe(50, 25);

        assert_eq!(controls.page_options.len(), 25);
        assert_eq!(
            controls.page_options[0],
            PageOption {
                label: "Page 3".to_string(),
                value: "25;50".to_string(),
                description: "Leaderboard positions 50 - 75".to_string(),
                offset: 50,
            }
        );
        // más allá del final de los datos
        let tail = &controls.page_options[24];
        assert_eq!(tail.offset, 650);
        assert_eq!(tail.label, "Page 27");

        let far = describe(975, 25);
        assert_eq!(far.page_options[24].offset, 975 + 24 * 25);
        assert_eq!(
            far.page_select_id,
            "lb+0+p;Personal_Best;Kx3ZRUYvbqMnMk2f8Ov3JEQNDD4"
        );
    }

    #[test]
    fn test_unaligned_offset_gives_fractional_page() {
        let controls = describe(10, 25);
        assert_eq!(controls.page_options[0].label, "Page 1.4");
    }

    #[test]
    fn test_window_validation() {
        assert!(PageWindow::new(-1, 25).is_err());
        assert!(PageWindow::new(0, 0).is_err());
        assert!(PageWindow::with_capacity(0, 25, 10).is_err());
        assert!(PageWindow::new(1625, 25).is_ok());
        assert!(PageWindow::new(1626, 25).is_err());
    }

    #[test]
    fn test_huge_offsets_are_rejected_instead_of_overflowing() {
        let token = "lb+0;Personal_Best;map;25;9223372036854775800";
        assert!(matches!(
            token.parse::<ControlToken>(),
            Err(TokenError::InvalidWindow(PagerError::InvalidWindow { .. }))
        ));

        assert!(PageWindow::with_capacity(0, i64::MAX, i64::MAX).is_err());
        assert!(PageWindow::with_capacity(0, 25, i64::MAX - 10).is_err());

        // el último offset válido sigue describiéndose sin desbordar
        let window = PageWindow::new(MAX_LEADERBOARD_POSITIONS + PAGE_OPTION_COUNT * 25, 25).unwrap();
        let controls = describe_window(&window, &anchor()).unwrap();
        assert_eq!(controls.page_options[24].offset, 1625 + 24 * 25);
    }
}
