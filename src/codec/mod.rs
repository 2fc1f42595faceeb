//! # Codec Module
//!
//! Conversión de numerales entre bases arbitrarias (2 a 64).
//!
//! Discord limita el `custom_id` de botones y menús a 100 caracteres, así que
//! los identificadores largos (UUIDs de temporada, IDs de mapa, timestamps) se
//! reescriben en base 64 antes de meterlos en un componente. El alfabeto es
//! parte del formato de los tokens ya emitidos: cambiar su orden rompe todos
//! los botones publicados.
//!
//! ## Example
//!
//! ```rust
//! use trackmania_bot::codec;
//!
//! let packed = codec::convert_base("ff", 16, 64, 0)?;
//! assert_eq!(packed, "3_");
//! assert_eq!(codec::convert_base(&packed, 64, 16, 0)?, "ff");
//! # Ok::<(), trackmania_bot::codec::CodecError>(())
//! ```
//!
//! Toda la aritmética usa [`BigUint`]: un UUID de 32 dígitos hexadecimales no
//! cabe en un `u64`.

pub mod packer;

use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;

/// Alfabeto de 64 símbolos: dígitos, minúsculas, mayúsculas, `-` y `_`.
pub const ALPHABET: &[u8; 64] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";

pub const MIN_BASE: u32 = 2;
pub const MAX_BASE: u32 = 64;

const NO_VALUE: u8 = u8::MAX;

/// Tabla de decodificación símbolo -> valor
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        lut[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    lut
};

/// Errores del códec. Siempre se propagan: indican datos corruptos o un
/// error de programación, nunca un caso recuperable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid symbol {symbol:?} at position {position} for base {base}")]
    InvalidSymbol {
        symbol: char,
        position: usize,
        base: u32,
    },

    #[error("base {0} is outside the supported range {MIN_BASE}..={MAX_BASE}")]
    BaseOutOfRange(u32),

    #[error("malformed identifier {value:?}: {reason}")]
    MalformedIdentifier { value: String, reason: &'static str },

    #[error("value {value} does not fit in {target}")]
    Overflow { value: String, target: &'static str },
}

fn check_base(base: u32) -> Result<(), CodecError> {
    if (MIN_BASE..=MAX_BASE).contains(&base) {
        Ok(())
    } else {
        Err(CodecError::BaseOutOfRange(base))
    }
}

/// Interpreta `symbols` como un numeral en `base`, dígito más significativo
/// primero. La cadena vacía vale cero.
///
/// # Errors
///
/// - [`CodecError::BaseOutOfRange`] si `base` no está en `2..=64`
/// - [`CodecError::InvalidSymbol`] si un símbolo no pertenece al alfabeto o
///   su valor no es un dígito válido en `base`
pub fn to_decimal(symbols: &str, base: u32) -> Result<BigUint, CodecError> {
    check_base(base)?;

    let radix = BigUint::from(base);
    let mut value = BigUint::zero();

    for (position, symbol) in symbols.chars().enumerate() {
        let digit = if symbol.is_ascii() {
            LOOKUP[symbol as usize]
        } else {
            NO_VALUE
        };

        if digit == NO_VALUE || u32::from(digit) >= base {
            return Err(CodecError::InvalidSymbol {
                symbol,
                position,
                base,
            });
        }

        value = value * &radix + BigUint::from(digit);
    }

    Ok(value)
}

/// Escribe `value` en `base`, rellenando a la izquierda con `'0'` hasta
/// `target_len` caracteres.
///
/// Cero con `target_len == 0` produce la cadena vacía; quien necesite un
/// ancho mínimo debe pedirlo.
pub fn from_decimal(value: &BigUint, base: u32, target_len: usize) -> Result<String, CodecError> {
    check_base(base)?;
    Ok(pad(encode_digits(value, base), target_len))
}

/// Convierte `symbols` de `from_base` a `to_base`.
///
/// Ida y vuelta con el ancho original devuelve la cadena de partida:
///
/// ```rust
/// use trackmania_bot::codec::convert_base;
///
/// let there = convert_base("010101", 2, 10, 0)?;
/// assert_eq!(there, "21");
/// assert_eq!(convert_base(&there, 10, 2, 6)?, "010101");
/// # Ok::<(), trackmania_bot::codec::CodecError>(())
/// ```
pub fn convert_base(
    symbols: &str,
    from_base: u32,
    to_base: u32,
    target_len: usize,
) -> Result<String, CodecError> {
    check_base(to_base)?;
    let value = to_decimal(symbols, from_base)?;
    Ok(pad(encode_digits(&value, to_base), target_len))
}

/// `base` ya validada por el llamador.
pub(crate) fn encode_digits(value: &BigUint, base: u32) -> String {
    if value.is_zero() {
        return String::new();
    }

    value
        .to_radix_be(base)
        .into_iter()
        .map(|digit| ALPHABET[usize::from(digit)] as char)
        .collect()
}

fn pad(encoded: String, target_len: usize) -> String {
    if encoded.len() >= target_len {
        encoded
    } else {
        format!("{encoded:0>target_len$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(symbols: &str, start: u32, change: u32, pad_to: usize) -> String {
        let there = convert_base(symbols, start, change, 0).unwrap();
        convert_base(&there, change, start, pad_to).unwrap()
    }

    #[test]
    fn test_known_round_trips() {
        let cases = [
            ("64", 10, 64, 0),
            ("ff", 16, 10, 0),
            ("010101", 2, 10, 6),
            ("000Z0_0zz00z", 64, 10, 12),
            ("ffffffffffffffffffffffffffffffff", 16, 64, 32),
            ("d567dcf11477449b935707be76662dbd", 16, 64, 32),
        ];

        for (symbols, start, change, pad_to) in cases {
            assert_eq!(
                round_trip(symbols, start, change, pad_to),
                symbols,
                "base {start} -> {change} -> {start}"
            );
        }
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(convert_base("64", 10, 64, 0).unwrap(), "10");
        assert_eq!(convert_base("ff", 16, 10, 0).unwrap(), "255");
        assert_eq!(convert_base("63", 10, 64, 0).unwrap(), "_");
        assert_eq!(convert_base("62", 10, 64, 0).unwrap(), "-");
        assert_eq!(
            convert_base("ffffffffffffffffffffffffffffffff", 16, 64, 0).unwrap(),
            format!("3{}", "_".repeat(21))
        );
    }

    #[test]
    fn test_round_trip_law_across_bases() {
        for from in MIN_BASE..=MAX_BASE {
            // numeral con cero inicial y todos los dígitos dentro de la base
            let symbols: String = (0..12u32)
                .map(|i| ALPHABET[((i * 7) % from) as usize] as char)
                .collect();
            assert!(symbols.starts_with('0'));

            for to in MIN_BASE..=MAX_BASE {
                assert_eq!(round_trip(&symbols, from, to, symbols.len()), symbols);
            }
        }
    }

    #[test]
    fn test_zero_encodes_to_empty_unless_padded() {
        let zero = BigUint::zero();
        assert_eq!(from_decimal(&zero, 64, 0).unwrap(), "");
        assert_eq!(from_decimal(&zero, 64, 3).unwrap(), "000");
        assert_eq!(to_decimal("", 10).unwrap(), BigUint::zero());
        assert_eq!(to_decimal("0000", 2).unwrap(), BigUint::zero());
    }

    #[test]
    fn test_padding_never_truncates() {
        assert_eq!(convert_base("255", 10, 16, 1).unwrap(), "ff");
        assert_eq!(convert_base("255", 10, 16, 4).unwrap(), "00ff");
    }

    #[test]
    fn test_invalid_symbol_reports_position() {
        assert_eq!(
            to_decimal("12#4", 10),
            Err(CodecError::InvalidSymbol {
                symbol: '#',
                position: 2,
                base: 10
            })
        );
        assert_eq!(
            to_decimal("abé", 64),
            Err(CodecError::InvalidSymbol {
                symbol: 'é',
                position: 2,
                base: 64
            })
        );
    }

    #[test]
    fn test_digit_outside_base_is_rejected() {
        assert_eq!(
            to_decimal("102", 2),
            Err(CodecError::InvalidSymbol {
                symbol: '2',
                position: 2,
                base: 2
            })
        );
        // mayúsculas no son hexadecimales en este alfabeto
        assert!(matches!(
            to_decimal("FF", 16),
            Err(CodecError::InvalidSymbol { symbol: 'F', position: 0, .. })
        ));
    }

    #[test]
    fn test_base_out_of_range() {
        assert_eq!(to_decimal("1", 1), Err(CodecError::BaseOutOfRange(1)));
        assert_eq!(to_decimal("1", 65), Err(CodecError::BaseOutOfRange(65)));
        assert_eq!(
            from_decimal(&BigUint::from(5u32), 0, 0),
            Err(CodecError::BaseOutOfRange(0))
        );
        assert_eq!(
            convert_base("1", 10, 100, 0),
            Err(CodecError::BaseOutOfRange(100))
        );
    }
}
