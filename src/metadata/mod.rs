//! Metaplex token metadata: account address derivation and decoding

use std::str::FromStr;

use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;

use crate::errors::{SnapshotError, SnapshotResult};
use crate::types::{trim_padding, Creator, MetadataAccount, MetadataData};

/// Metaplex Token Metadata program
pub const METAPLEX_PROGRAM_ID: &str = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s";

/// Seed prefix of metadata accounts
const METADATA_SEED: &[u8] = b"metadata";

/// Parse a base58 address, naming the offending value on failure
pub fn parse_pubkey(value: &str) -> SnapshotResult<Pubkey> {
    Pubkey::from_str(value.trim()).map_err(|e| SnapshotError::InvalidPubkey {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Metadata account address for a mint: PDA of `["metadata", program, mint]`
pub fn derive_metadata_pda(mint: &Pubkey) -> SnapshotResult<Pubkey> {
    let program = parse_pubkey(METAPLEX_PROGRAM_ID)?;

    let (pda, _bump) =
        Pubkey::find_program_address(&[METADATA_SEED, program.as_ref(), mint.as_ref()], &program);

    Ok(pda)
}

// Borsh layout of the metadata account prefix. Fields after `is_mutable`
// (edition nonce, token standard, collection, uses) are not read.
#[derive(BorshDeserialize)]
#[cfg_attr(test, derive(borsh::BorshSerialize))]
struct RawMetadata {
    key: u8,
    update_authority: [u8; 32],
    mint: [u8; 32],
    data: RawData,
    primary_sale_happened: bool,
    is_mutable: bool,
}

#[derive(BorshDeserialize)]
#[cfg_attr(test, derive(borsh::BorshSerialize))]
struct RawData {
    name: String,
    symbol: String,
    uri: String,
    seller_fee_basis_points: u16,
    creators: Option<Vec<RawCreator>>,
}

#[derive(BorshDeserialize)]
#[cfg_attr(test, derive(borsh::BorshSerialize))]
struct RawCreator {
    address: [u8; 32],
    verified: bool,
    share: u8,
}

/// Decode a metadata account's raw bytes
pub fn decode_metadata(data: &[u8]) -> SnapshotResult<MetadataAccount> {
    let raw = RawMetadata::deserialize(&mut &data[..])
        .map_err(|e| SnapshotError::Decode(format!("metadata account: {}", e)))?;

    let uri = trim_padding(&raw.data.uri);

    Ok(MetadataAccount {
        key: raw.key,
        update_authority: Pubkey::new_from_array(raw.update_authority).to_string(),
        mint: Pubkey::new_from_array(raw.mint).to_string(),
        data: MetadataData {
            name: trim_padding(&raw.data.name),
            symbol: trim_padding(&raw.data.symbol),
            uri: if uri.is_empty() { None } else { Some(uri) },
            seller_fee_basis_points: raw.data.seller_fee_basis_points,
            creators: raw.data.creators.map(|creators| {
                creators
                    .into_iter()
                    .map(|c| Creator {
                        address: Pubkey::new_from_array(c.address).to_string(),
                        verified: c.verified,
                        share: c.share,
                    })
                    .collect()
            }),
        },
        primary_sale_happened: raw.primary_sale_happened,
        is_mutable: raw.is_mutable,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn padded(value: &str, width: usize) -> String {
        let mut s = value.to_string();
        while s.len() < width {
            s.push('\0');
        }
        s
    }

    /// Bytes of a metadata account as stored on chain
    pub(crate) fn encode_metadata(mint: &Pubkey, name: &str, uri: &str) -> Vec<u8> {
        let raw = RawMetadata {
            key: 4,
            update_authority: [7u8; 32],
            mint: mint.to_bytes(),
            data: RawData {
                name: padded(name, 32),
                symbol: padded("MF", 10),
                uri: padded(uri, 200),
                seller_fee_basis_points: 500,
                creators: Some(vec![RawCreator {
                    address: [9u8; 32],
                    verified: true,
                    share: 100,
                }]),
            },
            primary_sale_happened: true,
            is_mutable: true,
        };
        let mut bytes = borsh::to_vec(&raw).unwrap();
        // Trailing fields this decoder ignores
        bytes.extend_from_slice(&[1, 255, 0, 0]);
        bytes
    }

    #[test]
    fn pda_is_deterministic() {
        let mint = parse_pubkey("So11111111111111111111111111111111111111112").unwrap();
        let first = derive_metadata_pda(&mint).unwrap();
        let second = derive_metadata_pda(&mint).unwrap();
        assert_eq!(first, second);
        assert_ne!(first, mint);
    }

    #[test]
    fn decodes_padded_account() {
        let mint = Pubkey::new_unique();
        let bytes = encode_metadata(&mint, "Mindfolk #42", "https://arweave.net/abc");

        let account = decode_metadata(&bytes).unwrap();
        assert_eq!(account.key, 4);
        assert_eq!(account.mint, mint.to_string());
        assert_eq!(account.data.name, "Mindfolk #42");
        assert_eq!(account.data.symbol, "MF");
        assert_eq!(account.data.uri.as_deref(), Some("https://arweave.net/abc"));
        assert_eq!(account.data.seller_fee_basis_points, 500);
        let creators = account.data.creators.unwrap();
        assert_eq!(creators.len(), 1);
        assert!(creators[0].verified);
        assert!(account.is_mutable);
    }

    #[test]
    fn empty_uri_is_none_and_truncated_data_fails() {
        let mint = Pubkey::new_unique();
        let bytes = encode_metadata(&mint, "No Uri", "");
        assert_eq!(decode_metadata(&bytes).unwrap().data.uri, None);

        assert!(matches!(decode_metadata(&bytes[..40]), Err(SnapshotError::Decode(_))));
    }

    #[test]
    fn invalid_pubkey_is_reported() {
        let err = parse_pubkey("not-a-key").unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidPubkey { .. }));
    }
}
