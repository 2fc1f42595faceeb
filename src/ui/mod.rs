//! Componentes visuales de Discord: embeds y filas de botones.

pub mod buttons;
pub mod embeds;
