use crate::constants::ATOM_NAMES;
use crate::error::{FitError, Result};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

/// Chemical element, stored by its atomic number. Elements are ordered by their atomic
/// number, which is also the order of the type names of the bond-type index system.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Element(u8);

impl Element {
    pub fn from_number(number: u8) -> Result<Self> {
        if number == 0 || number as usize > ATOM_NAMES.len() {
            return Err(FitError::config(format!(
                "atomic number {} is not supported",
                number
            )));
        }
        Ok(Element(number))
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn symbol(&self) -> &'static str {
        ATOM_NAMES[self.0 as usize - 1]
    }
}

/// The symbol is matched case insensitive, e.g. "n", "N" both give nitrogen.
impl TryFrom<&str> for Element {
    type Error = FitError;

    fn try_from(symbol: &str) -> Result<Self> {
        let symbol: &str = symbol.trim();
        ATOM_NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(symbol))
            .map(|idx| Element(idx as u8 + 1))
            .ok_or_else(|| FitError::config(format!("unknown chemical element '{}'", symbol)))
    }
}

impl TryFrom<String> for Element {
    type Error = FitError;

    fn try_from(symbol: String) -> Result<Self> {
        Element::try_from(symbol.as_str())
    }
}

impl From<Element> for String {
    fn from(element: Element) -> Self {
        element.symbol().to_string()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_and_number_agree() {
        let nitrogen = Element::try_from("n").unwrap();
        assert_eq!(nitrogen.number(), 7);
        assert_eq!(nitrogen.symbol(), "N");
        assert_eq!(Element::from_number(5).unwrap().symbol(), "B");
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        assert!(Element::try_from("Xx").is_err());
        assert!(Element::from_number(0).is_err());
    }
}
