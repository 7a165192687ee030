//! Ticker symbols accepted by the gateway.
//!
//! Request records take currency codes as strings so codes the gateway adds
//! later still work; `Currency` is the typed shorthand for the common ones.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

macro_rules! currencies {
    ($($variant:ident => $code:literal),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum Currency {
            $($variant),+
        }

        impl Currency {
            pub const ALL: &'static [Currency] = &[$(Currency::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Currency::$variant => $code),+
                }
            }
        }
    };
}

currencies! {
    Usd => "usd",
    Eur => "eur",
    Btc => "btc",
    Eth => "eth",
    Xrp => "xrp",
    Xmr => "xmr",
    Xem => "xem",
    Ltc => "ltc",
    Ada => "ada",
    Bch => "bch",
    Bnb => "bnb",
    Doge => "doge",
    Dash => "dash",
    Dot => "dot",
    Etc => "etc",
    Eos => "eos",
    Neo => "neo",
    Sol => "sol",
    Trx => "trx",
    Usdt => "usdt",
    Usdc => "usdc",
    Xlm => "xlm",
    Xtz => "xtz",
    Zec => "zec",
    Algo => "algo",
    Atom => "atom",
    Bsv => "bsv",
    Dgb => "dgb",
    Waves => "waves",
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Currency {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.as_str().to_string()
    }
}

impl FromStr for Currency {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| ApiError::invalid(format!("unknown currency {s:?}")))
    }
}
