use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 15;

/// Exchange qualifier some providers append to Vietnamese tickers.
pub const VN_SUFFIX: &str = ".VN";

const INDEX_SYMBOLS: [&str; 5] = ["VNINDEX", "VN30", "HNXINDEX", "HNX30", "UPCOMINDEX"];

/// Ticker of a HOSE/HNX/UPCoM listing or one of the market indices.
///
/// Held uppercase. A trailing `.VN` is accepted and kept; [`Symbol::base`]
/// gives the bare exchange code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim().to_ascii_uppercase();
        let Some(first) = ticker.chars().next() else {
            return Err(ValidationError::EmptySymbol);
        };

        let len = ticker.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }
        if !first.is_ascii_alphabetic() {
            return Err(ValidationError::SymbolInvalidStart { ch: first });
        }
        if let Some((index, ch)) = ticker
            .chars()
            .enumerate()
            .find(|&(_, ch)| !is_ticker_char(ch))
        {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        Ok(Self(ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ticker without the `.VN` exchange qualifier.
    pub fn base(&self) -> &str {
        self.0.strip_suffix(VN_SUFFIX).unwrap_or(&self.0)
    }

    pub fn is_index(&self) -> bool {
        INDEX_SYMBOLS.contains(&self.base())
    }
}

fn is_ticker_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-')
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
