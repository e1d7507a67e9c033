use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage. Transitions are unconstrained: any stage may follow any other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    #[serde(rename = "Prospecto")]
    Prospecto,
    #[serde(rename = "Calificado")]
    Calificado,
    #[serde(rename = "Propuesta")]
    Propuesta,
    #[serde(rename = "Negociación")]
    Negociacion,
    #[serde(rename = "Cerrado Ganado")]
    CerradoGanado,
    #[serde(rename = "Cerrado Perdido")]
    CerradoPerdido,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown stage {0:?}")]
pub struct UnknownStage(pub String);

impl Stage {
    /// Board column order.
    pub const ALL: [Stage; 6] = [
        Stage::Prospecto,
        Stage::Calificado,
        Stage::Propuesta,
        Stage::Negociacion,
        Stage::CerradoGanado,
        Stage::CerradoPerdido,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Prospecto => "Prospecto",
            Stage::Calificado => "Calificado",
            Stage::Propuesta => "Propuesta",
            Stage::Negociacion => "Negociación",
            Stage::CerradoGanado => "Cerrado Ganado",
            Stage::CerradoPerdido => "Cerrado Perdido",
        }
    }

    pub fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|stage| *stage == self)
            .unwrap_or(Self::ALL.len())
    }

    pub fn is_won(self) -> bool {
        self == Stage::CerradoGanado
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Stage::CerradoGanado | Stage::CerradoPerdido)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = fold(s.trim());
        Stage::ALL
            .into_iter()
            .find(|stage| fold(stage.label()) == wanted)
            .ok_or_else(|| UnknownStage(s.to_string()))
    }
}

// Case and accent insensitive key so "negociacion" matches "Negociación".
fn fold(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' => 'u',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_serde() {
        let json = serde_json::to_string(&Stage::Negociacion).unwrap();
        assert_eq!(json, "\"Negociación\"");
        let back: Stage = serde_json::from_str("\"Cerrado Perdido\"").unwrap();
        assert_eq!(back, Stage::CerradoPerdido);
    }

    #[test]
    fn parsing_ignores_case_and_accents() {
        assert_eq!("negociacion".parse::<Stage>().unwrap(), Stage::Negociacion);
        assert_eq!(" CERRADO GANADO ".parse::<Stage>().unwrap(), Stage::CerradoGanado);
        assert!("Ganado".parse::<Stage>().is_err());
    }

    #[test]
    fn closed_stages_are_the_last_two() {
        let closed: Vec<_> = Stage::ALL.into_iter().filter(|s| s.is_closed()).collect();
        assert_eq!(closed, vec![Stage::CerradoGanado, Stage::CerradoPerdido]);
        assert_eq!(Stage::CerradoPerdido.position(), 5);
    }
}
