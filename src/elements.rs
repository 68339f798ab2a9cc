//! Periodic-table note definitions.
//!
//! Each chemical element is a key on the instrument. Its pitch is the atomic
//! number times a 40.5 Hz base, so hydrogen sounds at 40.5 Hz and oganesson
//! at 4779 Hz.

use crate::error::{InstrumentError, Result};
use std::collections::HashMap;

/// Frequency step between consecutive elements, in Hz.
pub const BASE_FREQUENCY: f64 = 40.5;

/// Element symbols ordered by atomic number.
pub const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", //
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca", //
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", //
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", //
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", //
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", //
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", //
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", //
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", //
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", //
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", //
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// A single playable note: an element symbol and its pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDefinition {
    /// Element symbol, e.g. "He".
    pub symbol: String,
    /// Pitch in Hz. Always positive.
    pub frequency: f64,
}

impl NoteDefinition {
    /// Creates a note definition, rejecting non-positive frequencies.
    pub fn new(symbol: impl Into<String>, frequency: f64) -> Result<Self> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(InstrumentError::InvalidFrequency { frequency });
        }
        Ok(Self {
            symbol: symbol.into(),
            frequency,
        })
    }
}

/// Immutable collection of note definitions keyed by symbol.
///
/// Keeps the insertion order for display; lookups go through a hash index.
#[derive(Debug, Clone)]
pub struct NoteTable {
    notes: Vec<NoteDefinition>,
    index: HashMap<String, usize>,
}

impl NoteTable {
    /// Builds a table, failing if any symbol appears twice.
    pub fn from_definitions<I>(definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = NoteDefinition>,
    {
        let mut notes = Vec::new();
        let mut index = HashMap::new();
        for note in definitions {
            if index.contains_key(&note.symbol) {
                return Err(InstrumentError::DuplicateSymbol(note.symbol));
            }
            index.insert(note.symbol.clone(), notes.len());
            notes.push(note);
        }
        Ok(Self { notes, index })
    }

    /// The full periodic table, hydrogen through oganesson.
    pub fn periodic() -> Self {
        let notes: Vec<NoteDefinition> = ELEMENT_SYMBOLS
            .iter()
            .enumerate()
            .map(|(i, symbol)| NoteDefinition {
                symbol: (*symbol).to_string(),
                frequency: BASE_FREQUENCY * (i + 1) as f64,
            })
            .collect();
        let index = notes
            .iter()
            .enumerate()
            .map(|(i, note)| (note.symbol.clone(), i))
            .collect();
        Self { notes, index }
    }

    /// Looks up a note by symbol.
    pub fn get(&self, symbol: &str) -> Option<&NoteDefinition> {
        self.index.get(symbol).map(|&i| &self.notes[i])
    }

    /// Returns the frequency for a symbol.
    pub fn frequency(&self, symbol: &str) -> Option<f64> {
        self.get(symbol).map(|note| note.frequency)
    }

    /// Iterates notes in display order.
    pub fn iter(&self) -> impl Iterator<Item = &NoteDefinition> {
        self.notes.iter()
    }

    /// Number of notes in the table.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Returns true if the table has no notes.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_table() {
        let table = NoteTable::periodic();
        assert_eq!(table.len(), 118);
        assert_eq!(table.frequency("H"), Some(40.5));
        assert_eq!(table.frequency("He"), Some(81.0));
        assert_eq!(table.frequency("Fe"), Some(1053.0));
        assert_eq!(table.frequency("Og"), Some(4779.0));
        assert_eq!(table.frequency("Xx"), None);
    }

    #[test]
    fn test_display_order() {
        let table = NoteTable::periodic();
        let first: Vec<&str> = table.iter().take(3).map(|n| n.symbol.as_str()).collect();
        assert_eq!(first, vec!["H", "He", "Li"]);
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let notes = vec![
            NoteDefinition::new("H", 40.5).unwrap(),
            NoteDefinition::new("H", 81.0).unwrap(),
        ];
        assert!(matches!(
            NoteTable::from_definitions(notes),
            Err(InstrumentError::DuplicateSymbol(s)) if s == "H"
        ));
    }

    #[test]
    fn test_definition_rejects_non_positive_frequency() {
        assert!(NoteDefinition::new("X", 0.0).is_err());
        assert!(NoteDefinition::new("X", -1.0).is_err());
        assert!(NoteDefinition::new("X", f64::NAN).is_err());
    }
}
