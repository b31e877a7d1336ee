//! Token records and the token map
//!
//! A [`TokenRecord`] accumulates enrichment results for one mint. Each
//! enrichment field is an `Option`: `None` means "not fetched yet" and is the
//! only signal the enricher uses to decide what to fetch. For `arweave`, an
//! empty [`OffChainMetadata`] is a terminal value meaning "no metadata
//! available".
//!
//! JSON coercions (numeric vs string amounts, numeric trait values, padded
//! Metaplex strings, the legacy `jsonParsed` holder shape) are normalized while
//! deserializing, so a save/load round trip always yields the same typed data.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Owner recorded when the ledger cannot tell who holds a token
pub const UNKNOWN_ADDRESS: &str = "UNKNOWN_ADDRESS";

// =============================================================================
// HOLDER
// =============================================================================

/// Result of the holder lookup for one mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HolderRepr")]
pub struct HolderInfo {
    /// Wallet owning the largest token account, or [`UNKNOWN_ADDRESS`]
    pub owner: String,
    /// Raw token amount held, as a decimal string
    pub amount: String,
    /// The largest token account itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

impl HolderInfo {
    /// Degraded-but-present value used when the ledger returned nothing usable
    pub fn unknown(token_account: Option<String>) -> Self {
        Self {
            owner: UNKNOWN_ADDRESS.to_string(),
            amount: "0".to_string(),
            token_account,
            decimals: None,
        }
    }

    /// Build from a `jsonParsed` SPL token account (`{"info": {...}, "type": "account"}`)
    ///
    /// Missing pieces degrade to the sentinel owner / zero amount instead of failing.
    pub fn from_parsed_account(parsed: &Value, token_account: Option<String>) -> Self {
        let info = parsed.get("info");
        let owner = info
            .and_then(|i| i.get("owner"))
            .and_then(|o| o.as_str())
            .filter(|o| !o.is_empty())
            .unwrap_or(UNKNOWN_ADDRESS)
            .to_string();
        let token_amount = info.and_then(|i| i.get("tokenAmount"));
        let amount = token_amount
            .and_then(|t| t.get("amount"))
            .and_then(amount_to_string)
            .unwrap_or_else(|| "0".to_string());
        let decimals = token_amount
            .and_then(|t| t.get("decimals"))
            .and_then(|d| d.as_u64())
            .and_then(|d| u8::try_from(d).ok());

        Self {
            owner,
            amount,
            token_account,
            decimals,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.owner == UNKNOWN_ADDRESS
    }
}

/// Accepted on-disk shapes for a holder entry
#[derive(Deserialize)]
#[serde(untagged)]
enum HolderRepr {
    Current {
        owner: String,
        amount: Option<Value>,
        #[serde(default)]
        token_account: Option<String>,
        #[serde(default)]
        decimals: Option<u8>,
    },
    /// Cache files written before the versioned schema stored the raw parsed account
    Parsed(Value),
}

impl From<HolderRepr> for HolderInfo {
    fn from(repr: HolderRepr) -> Self {
        match repr {
            HolderRepr::Current {
                owner,
                amount,
                token_account,
                decimals,
            } => Self {
                owner: if owner.is_empty() {
                    UNKNOWN_ADDRESS.to_string()
                } else {
                    owner
                },
                amount: amount
                    .as_ref()
                    .and_then(amount_to_string)
                    .unwrap_or_else(|| "0".to_string()),
                token_account,
                decimals,
            },
            HolderRepr::Parsed(value) => HolderInfo::from_parsed_account(&value, None),
        }
    }
}

fn amount_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// ON-CHAIN METADATA
// =============================================================================

/// Decoded Metaplex metadata account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataAccount {
    #[serde(default = "default_metadata_key")]
    pub key: u8,
    #[serde(default)]
    pub update_authority: String,
    #[serde(default)]
    pub mint: String,
    pub data: MetadataData,
    #[serde(default)]
    pub primary_sale_happened: bool,
    #[serde(default)]
    pub is_mutable: bool,
}

fn default_metadata_key() -> u8 {
    4
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataData {
    #[serde(default, deserialize_with = "de_padded_string")]
    pub name: String,
    #[serde(default, deserialize_with = "de_padded_string")]
    pub symbol: String,
    /// Off-chain JSON location; `None` when the account carries no URI
    #[serde(default, deserialize_with = "de_optional_uri", skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub seller_fee_basis_points: u16,
    #[serde(default, deserialize_with = "de_creators", skip_serializing_if = "Option::is_none")]
    pub creators: Option<Vec<Creator>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub address: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub share: u8,
}

/// Strip the NUL padding Metaplex stores in fixed-width string fields
pub fn trim_padding(value: &str) -> String {
    value.trim_end_matches('\0').trim().to_string()
}

fn de_padded_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| trim_padding(&v)).unwrap_or_default())
}

fn de_optional_uri<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| trim_padding(&v)).filter(|v| !v.is_empty()))
}

fn de_creators<'de, D>(deserializer: D) -> Result<Option<Vec<Creator>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CreatorRepr {
        Full(Creator),
        Address(String),
    }

    let value = Option::<Vec<CreatorRepr>>::deserialize(deserializer)?;
    Ok(value.map(|creators| {
        creators
            .into_iter()
            .map(|c| match c {
                CreatorRepr::Full(creator) => creator,
                CreatorRepr::Address(address) => Creator {
                    address,
                    verified: false,
                    share: 0,
                },
            })
            .collect()
    }))
}

// =============================================================================
// OFF-CHAIN METADATA
// =============================================================================

/// Off-chain JSON document referenced by the metadata URI
///
/// The well-known fields are typed when they have the expected shape; any
/// other field, or a well-known one of another shape, is kept verbatim in
/// `extra`. `OffChainMetadata::default()` serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct OffChainMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Attribute>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OffChainMetadata {
    /// Terminal "no metadata available" value
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.image.is_none() && self.attributes.is_none() && self.extra.is_empty()
    }

    /// Attributes, only when there is at least one
    pub fn non_empty_attributes(&self) -> Option<&[Attribute]> {
        self.attributes.as_deref().filter(|a| !a.is_empty())
    }

    /// One `(trait_type, value)` per trait type in first-seen order; a
    /// repeated trait type keeps its last value
    pub fn distinct_traits(&self) -> Vec<(&str, &str)> {
        let mut traits: Vec<(&str, &str)> = Vec::new();
        for attribute in self.attributes.as_deref().unwrap_or_default() {
            let value = attribute.value_or_empty();
            match traits.iter_mut().find(|(t, _)| *t == attribute.trait_type) {
                Some(existing) => existing.1 = value,
                None => traits.push((attribute.trait_type.as_str(), value)),
            }
        }
        traits
    }
}

impl From<Map<String, Value>> for OffChainMetadata {
    fn from(mut extra: Map<String, Value>) -> Self {
        let name = take_string(&mut extra, "name");
        let image = take_string(&mut extra, "image");
        let attributes = match extra.remove("attributes") {
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .filter(|item| item.is_object())
                    .filter_map(|item| serde_json::from_value::<Attribute>(item).ok())
                    .collect(),
            ),
            Some(other) => {
                extra.insert("attributes".to_string(), other);
                None
            }
            None => None,
        };

        Self {
            name,
            image,
            attributes,
            extra,
        }
    }
}

/// Removes a string field; a value of any other shape stays in the map
fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

/// One trait of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub trait_type: String,
    /// Normalized to a string; `None` for a JSON null
    #[serde(default, deserialize_with = "de_trait_value")]
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(trait_type: &str, value: Option<&str>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: value.map(|v| v.to_string()),
        }
    }

    /// Value used for counting; null counts as the empty string
    pub fn value_or_empty(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

fn de_trait_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| scalar_to_string(&v)))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// TOKEN RECORD
// =============================================================================

/// Accumulated enrichment data for one token identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holders: Option<HolderInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<MetadataAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arweave: Option<OffChainMetadata>,
}

impl TokenRecord {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            holders: None,
            account: None,
            arweave: None,
        }
    }

    /// Holder address used by aggregation, falling back to the sentinel
    pub fn holder_address(&self) -> &str {
        self.holders
            .as_ref()
            .map(|h| h.owner.as_str())
            .filter(|o| !o.is_empty())
            .unwrap_or(UNKNOWN_ADDRESS)
    }

    /// Off-chain metadata URI from the decoded account, if any
    pub fn metadata_uri(&self) -> Option<&str> {
        self.account.as_ref().and_then(|a| a.data.uri.as_deref())
    }

    pub fn name(&self) -> Option<&str> {
        self.account
            .as_ref()
            .map(|a| a.data.name.as_str())
            .filter(|n| !n.is_empty())
    }
}

/// Enrichment field written by one fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenField {
    Holders,
    Account,
    OffChain,
}

impl TokenField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenField::Holders => "holders",
            TokenField::Account => "account",
            TokenField::OffChain => "arweave",
        }
    }

    pub fn is_present(&self, record: &TokenRecord) -> bool {
        match self {
            TokenField::Holders => record.holders.is_some(),
            TokenField::Account => record.account.is_some(),
            TokenField::OffChain => record.arweave.is_some(),
        }
    }

    /// Move this field from a fetched copy into the stored record
    ///
    /// Only this field is touched; an absent value in `fetched` leaves the
    /// stored field untouched.
    pub fn merge(&self, fetched: TokenRecord, into: &mut TokenRecord) {
        match self {
            TokenField::Holders => {
                if fetched.holders.is_some() {
                    into.holders = fetched.holders;
                }
            }
            TokenField::Account => {
                if fetched.account.is_some() {
                    into.account = fetched.account;
                }
            }
            TokenField::OffChain => {
                if fetched.arweave.is_some() {
                    into.arweave = fetched.arweave;
                }
            }
        }
    }
}

impl fmt::Display for TokenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TOKEN MAP
// =============================================================================

/// Token identifier -> record, keeping insertion order
///
/// Serializes as a JSON object whose key order is the insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenMap {
    order: Vec<String>,
    records: HashMap<String, TokenRecord>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.records.contains_key(token)
    }

    pub fn get(&self, token: &str) -> Option<&TokenRecord> {
        self.records.get(token)
    }

    pub fn get_mut(&mut self, token: &str) -> Option<&mut TokenRecord> {
        self.records.get_mut(token)
    }

    /// Insert or replace a record; replacing keeps the original position
    pub fn insert(&mut self, record: TokenRecord) -> Option<TokenRecord> {
        let key = record.token.clone();
        let previous = self.records.insert(key.clone(), record);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    /// Append empty records for identifiers not present yet; returns how many were added
    pub fn seed<I, S>(&mut self, tokens: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for token in tokens {
            let token = token.as_ref();
            if !self.contains(token) {
                self.insert(TokenRecord::new(token));
                added += 1;
            }
        }
        added
    }

    /// Keep only records matching the predicate; returns how many were removed
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&TokenRecord) -> bool,
    {
        let before = self.order.len();
        let records = &mut self.records;
        self.order.retain(|token| {
            let keep_it = records.get(token).map(|r| keep(r)).unwrap_or(false);
            if !keep_it {
                records.remove(token);
            }
            keep_it
        });
        before - self.order.len()
    }

    /// Token identifiers in insertion order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|t| t.as_str())
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &TokenRecord> {
        self.order.iter().filter_map(move |t| self.records.get(t))
    }

    /// Identifiers whose `field` is still absent, in insertion order
    pub fn missing(&self, field: TokenField) -> Vec<String> {
        self.iter()
            .filter(|r| !field.is_present(r))
            .map(|r| r.token.clone())
            .collect()
    }
}

impl Serialize for TokenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.order.len()))?;
        for record in self.iter() {
            map.serialize_entry(&record.token, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TokenMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TokenMapVisitor;

        impl<'de> Visitor<'de> for TokenMapVisitor {
            type Value = TokenMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of token identifiers to token records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TokenMap, A::Error> {
                let mut map = TokenMap::new();
                while let Some((key, mut record)) = access.next_entry::<String, TokenRecord>()? {
                    // The key is authoritative
                    record.token = key;
                    map.insert(record);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(TokenMapVisitor)
    }
}
