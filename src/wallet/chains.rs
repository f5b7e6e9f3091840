//! Known EVM networks.

/// Static metadata for a network the shell can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub name: &'static str,
    pub currency_symbol: &'static str,
    /// Explorer base URL, no trailing slash.
    pub explorer: &'static str,
}

pub const SUPPORTED_CHAINS: &[ChainInfo] = &[
    ChainInfo {
        chain_id: 1,
        name: "Ethereum Mainnet",
        currency_symbol: "ETH",
        explorer: "https://etherscan.io",
    },
    ChainInfo {
        chain_id: 5,
        name: "Goerli Testnet",
        currency_symbol: "ETH",
        explorer: "https://goerli.etherscan.io",
    },
    ChainInfo {
        chain_id: 10,
        name: "Optimism",
        currency_symbol: "ETH",
        explorer: "https://optimistic.etherscan.io",
    },
    ChainInfo {
        chain_id: 56,
        name: "BNB Smart Chain",
        currency_symbol: "BNB",
        explorer: "https://bscscan.com",
    },
    ChainInfo {
        chain_id: 137,
        name: "Polygon Mainnet",
        currency_symbol: "POL",
        explorer: "https://polygonscan.com",
    },
    ChainInfo {
        chain_id: 8453,
        name: "Base",
        currency_symbol: "ETH",
        explorer: "https://basescan.org",
    },
    ChainInfo {
        chain_id: 17000,
        name: "Holesky Testnet",
        currency_symbol: "ETH",
        explorer: "https://holesky.etherscan.io",
    },
    ChainInfo {
        chain_id: 42161,
        name: "Arbitrum One",
        currency_symbol: "ETH",
        explorer: "https://arbiscan.io",
    },
    ChainInfo {
        chain_id: 59144,
        name: "Linea",
        currency_symbol: "ETH",
        explorer: "https://lineascan.build",
    },
    ChainInfo {
        chain_id: 80001,
        name: "Polygon Mumbai",
        currency_symbol: "MATIC",
        explorer: "https://mumbai.polygonscan.com",
    },
    ChainInfo {
        chain_id: 80002,
        name: "Polygon Amoy",
        currency_symbol: "POL",
        explorer: "https://amoy.polygonscan.com",
    },
    ChainInfo {
        chain_id: 11155111,
        name: "Sepolia Testnet",
        currency_symbol: "ETH",
        explorer: "https://sepolia.etherscan.io",
    },
];

/// Parse a chain id in the form wallets report it: `0x` followed by
/// lowercase hex without leading zeros. Anything else is unknown.
pub fn parse_chain_id(chain_id: &str) -> Option<u64> {
    let digits = chain_id.strip_prefix("0x")?;
    let canonical = !digits.is_empty()
        && (digits == "0" || !digits.starts_with('0'))
        && digits.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !canonical {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

pub fn chain_info(chain_id: &str) -> Option<&'static ChainInfo> {
    let id = parse_chain_id(chain_id)?;
    SUPPORTED_CHAINS.iter().find(|chain| chain.chain_id == id)
}

/// Human name for a chain id, or `Chain <id>` when unknown.
pub fn chain_display_name(chain_id: &str) -> String {
    chain_info(chain_id).map_or_else(|| format!("Chain {chain_id}"), |c| c.name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(chain_display_name("0x1"), "Ethereum Mainnet");
        assert_eq!(chain_display_name("0x5"), "Goerli Testnet");
        assert_eq!(chain_display_name("0x89"), "Polygon Mainnet");
        assert_eq!(chain_display_name("0x13881"), "Polygon Mumbai");
        assert_eq!(chain_display_name("0xa"), "Optimism");
        assert_eq!(chain_display_name("0xa4b1"), "Arbitrum One");
    }

    #[test]
    fn test_unknown_chain() {
        assert_eq!(chain_display_name("0x7a69"), "Chain 0x7a69");
        assert_eq!(chain_display_name("bogus"), "Chain bogus");
        assert_eq!(chain_display_name("1"), "Chain 1");
        assert_eq!(chain_display_name("0x01"), "Chain 0x01");
        assert_eq!(chain_display_name("0xA4B1"), "Chain 0xA4B1");
    }

    #[test]
    fn test_parse_chain_id() {
        assert_eq!(parse_chain_id("0xa4b1"), Some(42161));
        assert_eq!(parse_chain_id("0x0"), Some(0));
        assert_eq!(parse_chain_id("0xA4B1"), None);
        assert_eq!(parse_chain_id("137"), None);
        assert_eq!(parse_chain_id("0x089"), None);
        assert_eq!(parse_chain_id("0x"), None);
    }
}
