/// Known CoinGecko-style ids and their FMP pair symbols.
const CRYPTO_PAIRS: &[(&str, &str)] = &[
    ("bitcoin", "BTCUSD"),
    ("ethereum", "ETHUSD"),
    ("tether", "USDTUSD"),
    ("binancecoin", "BNBUSD"),
    ("solana", "SOLUSD"),
    ("usd-coin", "USDCUSD"),
    ("staked-ether", "STETH"),
    ("xrp", "XRPUSD"),
    ("dogecoin", "DOGEUSD"),
    ("tron", "TRXUSD"),
    ("cardano", "ADAUSD"),
    ("avalanche-2", "AVAXUSD"),
    ("chainlink", "LINKUSD"),
    ("bitcoin-cash", "BCHUSD"),
    ("polkadot", "DOTUSD"),
    ("polygon", "MATICUSD"),
    ("litecoin", "LTCUSD"),
    ("internet-computer", "ICPUSD"),
    ("ethereum-classic", "ETCUSD"),
    ("stellar", "XLMUSD"),
    ("crypto-com-chain", "CROUSD"),
    ("uniswap", "UNIUSD"),
    ("monero", "XMRUSD"),
    ("okb", "OKBUSD"),
    ("cosmos", "ATOMUSD"),
    ("filecoin", "FILUSD"),
    ("hedera-hashgraph", "HBARUSD"),
    ("vechain", "VETUSD"),
    ("theta-token", "THETAUSD"),
    ("algorand", "ALGOUSD"),
];

/// FMP pair for a crypto id. Unknown ids map to `{ID}USD`.
pub fn to_fmp_symbol(id: &str) -> String {
    let id = id.trim().to_lowercase();
    CRYPTO_PAIRS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, pair)| pair.to_string())
        .unwrap_or_else(|| format!("{}USD", id.to_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_ids() {
        assert_eq!(to_fmp_symbol("bitcoin"), "BTCUSD");
        assert_eq!(to_fmp_symbol("staked-ether"), "STETH");
        assert_eq!(to_fmp_symbol("avalanche-2"), "AVAXUSD");
        assert_eq!(to_fmp_symbol(" Ethereum "), "ETHUSD");
    }

    #[test]
    fn test_unknown_id_falls_back_to_usd_pair() {
        assert_eq!(to_fmp_symbol("pepe"), "PEPEUSD");
    }
}
