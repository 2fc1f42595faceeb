//! Empaquetado de identificadores de dominio en base 64.
//!
//! Dos formas:
//!
//! - UUIDs (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`): los 32 dígitos hex se
//!   pasan a base 64 sin ancho fijo. Al desempaquetar se rellena a 32 dígitos
//!   y se reinsertan los guiones en `[8, 12, 16, 20]`.
//! - Timestamps unix: base 10 a base 64 sin relleno.
//!
//! Dos literales reservados atraviesan el códec sin tocarse:
//! [`PERSONAL_BEST`] (no hay UUID de grupo) y [`NO_TIMESTAMP`] (no hay
//! timestamp). Un timestamp real de cero se empaqueta como la cadena vacía,
//! que nunca coincide con el centinela.

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use super::{convert_base, encode_digits, to_decimal, CodecError};

/// Grupo de leaderboard que no es una temporada: el récord personal.
pub const PERSONAL_BEST: &str = "Personal_Best";

/// Centinela de "sin timestamp".
pub const NO_TIMESTAMP: &str = "0";

const UUID_HEX_LEN: usize = 32;
const UUID_DASH_INDICES: [usize; 6] = [0, 8, 12, 16, 20, 32];

/// Empaqueta un UUID con guiones en base 64.
///
/// [`PERSONAL_BEST`] se devuelve tal cual.
///
/// # Errors
///
/// [`CodecError::MalformedIdentifier`] si los grupos no tienen anchos
/// `[8, 4, 4, 4, 12]`; [`CodecError::InvalidSymbol`] si algún dígito no es
/// hexadecimal en minúscula.
pub fn pack_uuid_like(dashed_hex: &str) -> Result<String, CodecError> {
    if dashed_hex == PERSONAL_BEST {
        return Ok(PERSONAL_BEST.to_string());
    }

    let groups: Vec<&str> = dashed_hex.split('-').collect();
    let widths_match = groups.len() == UUID_DASH_INDICES.len() - 1
        && groups
            .iter()
            .zip(UUID_DASH_INDICES.windows(2))
            .all(|(group, bounds)| group.len() == bounds[1] - bounds[0]);

    if !widths_match {
        return Err(CodecError::MalformedIdentifier {
            value: dashed_hex.to_string(),
            reason: "expected dash-separated groups of 8-4-4-4-12 hex digits",
        });
    }

    convert_base(&groups.concat(), 16, 64, 0)
}

/// Inversa de [`pack_uuid_like`].
pub fn unpack_uuid_like(packed: &str) -> Result<String, CodecError> {
    if packed == PERSONAL_BEST {
        return Ok(PERSONAL_BEST.to_string());
    }

    let hex = convert_base(packed, 64, 16, UUID_HEX_LEN)?;
    if hex.len() > UUID_HEX_LEN {
        return Err(CodecError::MalformedIdentifier {
            value: packed.to_string(),
            reason: "packed value exceeds 128 bits",
        });
    }

    let groups: Vec<&str> = UUID_DASH_INDICES
        .windows(2)
        .map(|bounds| &hex[bounds[0]..bounds[1]])
        .collect();

    Ok(groups.join("-"))
}

/// Empaqueta un timestamp unix; `None` produce [`NO_TIMESTAMP`].
pub fn pack_timestamp(epoch_seconds: Option<u64>) -> String {
    match epoch_seconds {
        Some(seconds) => encode_digits(&BigUint::from(seconds), 64),
        None => NO_TIMESTAMP.to_string(),
    }
}

/// Inversa de [`pack_timestamp`].
pub fn unpack_timestamp(token: &str) -> Result<Option<u64>, CodecError> {
    if token == NO_TIMESTAMP {
        return Ok(None);
    }

    let value = to_decimal(token, 64)?;
    value.to_u64().map(Some).ok_or_else(|| CodecError::Overflow {
        value: value.to_string(),
        target: "u64 timestamp",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const UUIDS: [&str; 5] = [
        "cc1004c0-3bcd-41f9-a1fd-e09f80df7e54",
        "3ccc7a5c-5040-452d-acff-45aa9cddd732",
        "00000000-0000-0000-0000-00000000002a",
        "ffffffff-ffff-ffff-ffff-ffffffffffff",
        "00000000-0000-0000-0000-000000000000",
    ];

    #[test]
    fn test_uuid_round_trip_keeps_layout() {
        for uuid in UUIDS {
            let packed = pack_uuid_like(uuid).unwrap();
            assert!(packed.len() <= 22, "{packed} too long");

            let unpacked = unpack_uuid_like(&packed).unwrap();
            assert_eq!(unpacked, uuid);

            let dashes: Vec<usize> = unpacked
                .char_indices()
                .filter(|(_, c)| *c == '-')
                .map(|(i, _)| i)
                .collect();
            assert_eq!(dashes, vec![8, 13, 18, 23]);
        }
    }

    #[test]
    fn test_uuid_with_leading_zeros() {
        assert_eq!(
            pack_uuid_like("00000000-0000-0000-0000-00000000002a").unwrap(),
            "G"
        );
        assert_eq!(
            unpack_uuid_like("G").unwrap(),
            "00000000-0000-0000-0000-00000000002a"
        );
    }

    #[test]
    fn test_personal_best_passes_through() {
        assert_eq!(pack_uuid_like(PERSONAL_BEST).unwrap(), PERSONAL_BEST);
        assert_eq!(unpack_uuid_like(PERSONAL_BEST).unwrap(), PERSONAL_BEST);
    }

    #[test]
    fn test_malformed_uuids_are_rejected() {
        for bad in [
            "cc1004c03bcd41f9a1fde09f80df7e54",
            "cc1004c0-3bcd-41f9-a1fd",
            "cc1004c0-3bcd-41f9-a1fd-e09f80df7e5",
            "cc1004c-03bcd-41f9-a1fd-e09f80df7e54",
        ] {
            assert!(
                matches!(pack_uuid_like(bad), Err(CodecError::MalformedIdentifier { .. })),
                "{bad} should be rejected"
            );
        }

        assert!(matches!(
            pack_uuid_like("zz1004c0-3bcd-41f9-a1fd-e09f80df7e54"),
            Err(CodecError::InvalidSymbol { symbol: 'z', position: 0, base: 16 })
        ));
    }

    #[test]
    fn test_unpack_rejects_values_wider_than_uuid() {
        // 23 símbolos en base 64 superan los 128 bits
        let too_wide = "1".repeat(23);
        assert!(matches!(
            unpack_uuid_like(&too_wide),
            Err(CodecError::MalformedIdentifier { .. })
        ));
    }

    #[test]
    fn test_timestamp_round_trip() {
        let end = 1_733_421_600u64;
        let packed = pack_timestamp(Some(end));
        assert_eq!(packed, convert_base(&end.to_string(), 10, 64, 0).unwrap());
        assert_eq!(unpack_timestamp(&packed).unwrap(), Some(end));
    }

    #[test]
    fn test_no_timestamp_sentinel_is_preserved() {
        assert_eq!(pack_timestamp(None), NO_TIMESTAMP);
        assert_eq!(unpack_timestamp(NO_TIMESTAMP).unwrap(), None);

        // cero real: distinto del centinela
        let zero = pack_timestamp(Some(0));
        assert_eq!(zero, "");
        assert_ne!(zero, NO_TIMESTAMP);
        assert_eq!(unpack_timestamp(&zero).unwrap(), Some(0));
    }

    #[test]
    fn test_timestamp_overflow() {
        assert!(matches!(
            unpack_timestamp(&"_".repeat(12)),
            Err(CodecError::Overflow { .. })
        ));
    }
}
