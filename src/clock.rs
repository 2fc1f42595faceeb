use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// El track of the day cambia a las 18:00 UTC
const TOTD_ROLLOVER_HOURS: i64 = 18;

/// Fuente de tiempo inyectable (segundos unix)
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Obtiene timestamp actual en segundos
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

pub fn system_clock() -> Clock {
    Arc::new(current_timestamp)
}

/// Reloj fijo para pruebas
pub fn fixed_clock(now: i64) -> Clock {
    Arc::new(move || now)
}

/// Día de TOTD vigente en `now`: antes de las 18:00 UTC sigue siendo el de ayer.
pub fn totd_date(now: DateTime<Utc>) -> NaiveDate {
    (now - Duration::hours(TOTD_ROLLOVER_HOURS)).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_totd_date_rolls_over_at_18_utc() {
        let before = Utc.with_ymd_and_hms(2024, 12, 5, 17, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 12, 5, 18, 0, 0).unwrap();

        assert_eq!(totd_date(before), NaiveDate::from_ymd_opt(2024, 12, 4).unwrap());
        assert_eq!(totd_date(after), NaiveDate::from_ymd_opt(2024, 12, 5).unwrap());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = fixed_clock(1_700_000_000);
        assert_eq!(clock(), 1_700_000_000);
        assert!(current_timestamp() > 1_700_000_000);
    }
}
