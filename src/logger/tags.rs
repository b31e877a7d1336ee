/// Subsystem tags attached to every log line

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Cache,
    Rpc,
    Holders,
    Metadata,
    OffChain,
    Enrich,
    Report,
}

impl LogTag {
    /// Key used by `--debug-<key>` flags and `logging.debug_tags`
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Cache => "cache",
            LogTag::Rpc => "rpc",
            LogTag::Holders => "holders",
            LogTag::Metadata => "metadata",
            LogTag::OffChain => "offchain",
            LogTag::Enrich => "enrich",
            LogTag::Report => "report",
        }
        .to_string()
    }

    /// Uppercase label used in console and file output
    pub fn to_plain_string(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Cache => "CACHE",
            LogTag::Rpc => "RPC",
            LogTag::Holders => "HOLDERS",
            LogTag::Metadata => "METADATA",
            LogTag::OffChain => "OFFCHAIN",
            LogTag::Enrich => "ENRICH",
            LogTag::Report => "REPORT",
        }
    }
}
