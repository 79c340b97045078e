use log::warn;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use super::primitives::{biguint_to_stripped_bytes, keccak256, Address, Bytes, H256};
use super::rlp::{self, RlpItem};
use super::signature::{recover_address, DigestSigner, Signature};
use crate::error::{ClientError, DecodingError, EncodingError};

/// Byte limit for every numeric field.
pub const MAX_NUMERIC_LENGTH: usize = 32;

const SIMPLE_UNSIGNED_FIELDS: usize = 6;
const SIMPLE_SIGNED_FIELDS: usize = 9;
const EXTENDED_UNSIGNED_FIELDS: usize = 10;
const EXTENDED_SIGNED_FIELDS: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// nonce, gasPrice, gasLimit, to, value, data
    Simple,
    /// nonce, gasPrice, gasLimit, blockLimit, to, value, data, chainId, groupId, extraData
    Extended,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnsignedTransaction {
    pub nonce: BigUint,
    pub gas_price: BigUint,
    pub gas_limit: BigUint,
    pub block_limit: Option<BigUint>,
    /// `None` creates a contract
    pub to: Option<Address>,
    pub value: BigUint,
    pub data: Bytes,
    pub chain_id: BigUint,
    pub group_id: Option<BigUint>,
    pub extra_data: Option<Bytes>,
}

impl UnsignedTransaction {
    /// Extended whenever any ledger-specific field is present.
    pub fn profile(&self) -> Profile {
        if self.block_limit.is_some() || self.group_id.is_some() || self.extra_data.is_some() {
            Profile::Extended
        } else {
            Profile::Simple
        }
    }

    /// Hash of the unsigned encoding; this is what gets signed.
    pub fn digest(&self) -> Result<H256, EncodingError> {
        Ok(keccak256(&encode(self, None)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub transaction: UnsignedTransaction,
    pub signature: Signature,
    /// Recovered sender; `None` when recovery failed during decode
    pub from: Option<Address>,
    /// Hash of the full signed encoding; `None` when recovery failed during decode
    pub hash: Option<H256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedTransaction {
    Unsigned(UnsignedTransaction),
    Signed(SignedTransaction),
}

impl DecodedTransaction {
    pub fn transaction(&self) -> &UnsignedTransaction {
        match self {
            DecodedTransaction::Unsigned(tx) => tx,
            DecodedTransaction::Signed(signed) => &signed.transaction,
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            DecodedTransaction::Unsigned(_) => None,
            DecodedTransaction::Signed(signed) => Some(&signed.signature),
        }
    }

    pub fn from(&self) -> Option<Address> {
        match self {
            DecodedTransaction::Unsigned(_) => None,
            DecodedTransaction::Signed(signed) => signed.from,
        }
    }

    pub fn hash(&self) -> Option<H256> {
        match self {
            DecodedTransaction::Unsigned(_) => None,
            DecodedTransaction::Signed(signed) => signed.hash,
        }
    }
}

fn numeric_item(field: &'static str, value: &BigUint) -> Result<RlpItem, EncodingError> {
    let bytes = biguint_to_stripped_bytes(value);
    if bytes.len() > MAX_NUMERIC_LENGTH {
        return Err(EncodingError::FieldTooLong {
            field,
            max: MAX_NUMERIC_LENGTH,
            got: bytes.len(),
        });
    }
    Ok(RlpItem::Bytes(bytes))
}

fn address_item(to: &Option<Address>) -> RlpItem {
    match to {
        Some(address) => RlpItem::bytes(address.as_bytes().to_vec()),
        None => RlpItem::bytes(Vec::new()),
    }
}

fn scalar_item(value: &[u8; 32]) -> RlpItem {
    RlpItem::Bytes(value.iter().copied().skip_while(|b| *b == 0).collect())
}

fn simple_fields(tx: &UnsignedTransaction) -> Result<Vec<RlpItem>, EncodingError> {
    Ok(vec![
        numeric_item("nonce", &tx.nonce)?,
        numeric_item("gasPrice", &tx.gas_price)?,
        numeric_item("gasLimit", &tx.gas_limit)?,
        address_item(&tx.to),
        numeric_item("value", &tx.value)?,
        RlpItem::bytes(tx.data.0.clone()),
    ])
}

fn extended_fields(tx: &UnsignedTransaction) -> Result<Vec<RlpItem>, EncodingError> {
    let zero = BigUint::zero();
    Ok(vec![
        numeric_item("nonce", &tx.nonce)?,
        numeric_item("gasPrice", &tx.gas_price)?,
        numeric_item("gasLimit", &tx.gas_limit)?,
        numeric_item("blockLimit", tx.block_limit.as_ref().unwrap_or(&zero))?,
        address_item(&tx.to),
        numeric_item("value", &tx.value)?,
        RlpItem::bytes(tx.data.0.clone()),
        numeric_item("chainId", &tx.chain_id)?,
        numeric_item("groupId", tx.group_id.as_ref().unwrap_or(&zero))?,
        RlpItem::bytes(tx.extra_data.as_ref().map(|d| d.0.clone()).unwrap_or_default()),
    ])
}

/// v for the given transaction: `27 + recoveryParam`, with the chain folded in for
/// chain-bound simple transactions.
fn expected_v(tx: &UnsignedTransaction, recovery_param: u8) -> Result<u64, EncodingError> {
    let mut v = 27 + recovery_param as u64;
    if tx.profile() == Profile::Simple && !tx.chain_id.is_zero() {
        let chain_id = tx
            .chain_id
            .to_u64()
            .filter(|c| *c <= (u64::MAX - 36) / 2)
            .ok_or_else(|| EncodingError::ChainIdOverflow(tx.chain_id.to_string()))?;
        v += chain_id * 2 + 8;
    }
    Ok(v)
}

/// Serialize a transaction, appending (v, r, s) when a signature is given.
pub fn encode(tx: &UnsignedTransaction, signature: Option<&Signature>) -> Result<Vec<u8>, EncodingError> {
    let profile = tx.profile();
    let mut fields = match profile {
        Profile::Simple => simple_fields(tx)?,
        Profile::Extended => extended_fields(tx)?,
    };

    match signature {
        None => {
            if profile == Profile::Simple && !tx.chain_id.is_zero() {
                fields.push(numeric_item("chainId", &tx.chain_id)?);
                fields.push(RlpItem::bytes(Vec::new()));
                fields.push(RlpItem::bytes(Vec::new()));
            }
        }
        Some(signature) => {
            let v = expected_v(tx, signature.recovery_param)?;
            // 0/1 only carry the recovery param; anything else must agree with the chain binding
            if let Some(supplied) = signature.v.filter(|v| *v >= 27) {
                if supplied != v {
                    return Err(EncodingError::ChainIdMismatch { v: supplied, expected: v });
                }
            }
            fields.push(numeric_item("v", &BigUint::from(v))?);
            fields.push(scalar_item(&signature.r));
            fields.push(scalar_item(&signature.s));
        }
    }

    Ok(rlp::encode_list(&fields))
}

/// Sign `tx` with `signer`, returning the raw signed bytes and the signed transaction.
pub fn sign_transaction(
    tx: &UnsignedTransaction,
    signer: &dyn DigestSigner,
) -> Result<(Bytes, SignedTransaction), ClientError> {
    let digest = tx.digest()?;
    let signature = signer.sign_digest(&digest)?;
    let raw = encode(tx, Some(&signature))?;
    let hash = keccak256(&raw);

    Ok((
        Bytes(raw),
        SignedTransaction {
            transaction: tx.clone(),
            signature,
            from: Some(signer.address()),
            hash: Some(hash),
        },
    ))
}

fn parse_numeric(field: &'static str, bytes: &[u8]) -> Result<BigUint, DecodingError> {
    if bytes.len() > MAX_NUMERIC_LENGTH {
        return Err(DecodingError::InvalidField {
            field,
            reason: format!("{} bytes exceeds {}", bytes.len(), MAX_NUMERIC_LENGTH),
        });
    }
    Ok(BigUint::from_bytes_be(bytes))
}

fn parse_address(bytes: &[u8]) -> Result<Option<Address>, DecodingError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    Address::from_slice(bytes)
        .map(Some)
        .map_err(|e| DecodingError::InvalidField {
            field: "to",
            reason: e.to_string(),
        })
}

fn parse_scalar(field: &'static str, bytes: &[u8]) -> Result<[u8; 32], DecodingError> {
    if bytes.len() > 32 {
        return Err(DecodingError::InvalidField {
            field,
            reason: format!("{} bytes exceeds 32", bytes.len()),
        });
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

fn parse_simple(fields: &[&[u8]]) -> Result<UnsignedTransaction, DecodingError> {
    Ok(UnsignedTransaction {
        nonce: parse_numeric("nonce", fields[0])?,
        gas_price: parse_numeric("gasPrice", fields[1])?,
        gas_limit: parse_numeric("gasLimit", fields[2])?,
        to: parse_address(fields[3])?,
        value: parse_numeric("value", fields[4])?,
        data: Bytes(fields[5].to_vec()),
        ..Default::default()
    })
}

fn parse_extended(fields: &[&[u8]]) -> Result<UnsignedTransaction, DecodingError> {
    Ok(UnsignedTransaction {
        nonce: parse_numeric("nonce", fields[0])?,
        gas_price: parse_numeric("gasPrice", fields[1])?,
        gas_limit: parse_numeric("gasLimit", fields[2])?,
        block_limit: Some(parse_numeric("blockLimit", fields[3])?),
        to: parse_address(fields[4])?,
        value: parse_numeric("value", fields[5])?,
        data: Bytes(fields[6].to_vec()),
        chain_id: parse_numeric("chainId", fields[7])?,
        group_id: Some(parse_numeric("groupId", fields[8])?),
        extra_data: Some(Bytes(fields[9].to_vec())),
    })
}

/// Parse wire bytes. Strict on structure; a signature that fails to recover leaves
/// `from` and `hash` unset instead of failing.
pub fn decode(raw: &[u8]) -> Result<DecodedTransaction, DecodingError> {
    let items = match rlp::decode(raw)? {
        RlpItem::List(items) => items,
        RlpItem::Bytes(_) => {
            return Err(DecodingError::InvalidField {
                field: "transaction",
                reason: "expected a list".to_string(),
            })
        }
    };

    if !matches!(
        items.len(),
        SIMPLE_UNSIGNED_FIELDS | SIMPLE_SIGNED_FIELDS | EXTENDED_UNSIGNED_FIELDS | EXTENDED_SIGNED_FIELDS
    ) {
        return Err(DecodingError::FieldCount { got: items.len() });
    }

    let fields = items
        .iter()
        .map(|item| {
            item.as_bytes().ok_or_else(|| DecodingError::InvalidField {
                field: "transaction",
                reason: "nested list in field position".to_string(),
            })
        })
        .collect::<Result<Vec<&[u8]>, _>>()?;

    match fields.len() {
        SIMPLE_UNSIGNED_FIELDS => Ok(DecodedTransaction::Unsigned(parse_simple(&fields)?)),
        SIMPLE_SIGNED_FIELDS => decode_simple_signed(raw, &items, &fields),
        EXTENDED_UNSIGNED_FIELDS => Ok(DecodedTransaction::Unsigned(parse_extended(&fields)?)),
        _ => decode_extended_signed(raw, &items, &fields),
    }
}

fn decode_simple_signed(
    raw: &[u8],
    items: &[RlpItem],
    fields: &[&[u8]],
) -> Result<DecodedTransaction, DecodingError> {
    let mut tx = parse_simple(&fields[..SIMPLE_UNSIGNED_FIELDS])?;
    let v_value = parse_numeric("v", fields[6])?;
    let r = parse_scalar("r", fields[7])?;
    let s = parse_scalar("s", fields[8])?;

    // Unsigned but chain-bound: the chain id sits in the v position
    if r == [0u8; 32] && s == [0u8; 32] {
        tx.chain_id = v_value;
        return Ok(DecodedTransaction::Unsigned(tx));
    }

    let v = v_value.to_u64().ok_or_else(|| DecodingError::InvalidField {
        field: "v",
        reason: "does not fit in 64 bits".to_string(),
    })?;

    let chain_id = if v >= 35 { (v - 35) / 2 } else { 0 };
    tx.chain_id = BigUint::from(chain_id);

    let mut recovery = v as i128 - 27;
    let mut unsigned_items = items[..SIMPLE_UNSIGNED_FIELDS].to_vec();
    if chain_id != 0 {
        recovery -= chain_id as i128 * 2 + 8;
        unsigned_items.push(RlpItem::Bytes(biguint_to_stripped_bytes(&tx.chain_id)));
        unsigned_items.push(RlpItem::bytes(Vec::new()));
        unsigned_items.push(RlpItem::bytes(Vec::new()));
    }

    Ok(DecodedTransaction::Signed(recover_signed(
        raw,
        tx,
        &unsigned_items,
        r,
        s,
        v,
        recovery,
    )))
}

fn decode_extended_signed(
    raw: &[u8],
    items: &[RlpItem],
    fields: &[&[u8]],
) -> Result<DecodedTransaction, DecodingError> {
    let tx = parse_extended(&fields[..EXTENDED_UNSIGNED_FIELDS])?;
    let v = parse_numeric("v", fields[10])?
        .to_u64()
        .ok_or_else(|| DecodingError::InvalidField {
            field: "v",
            reason: "does not fit in 64 bits".to_string(),
        })?;
    let r = parse_scalar("r", fields[11])?;
    let s = parse_scalar("s", fields[12])?;
    let recovery = v as i128 - 27;

    Ok(DecodedTransaction::Signed(recover_signed(
        raw,
        tx,
        &items[..EXTENDED_UNSIGNED_FIELDS],
        r,
        s,
        v,
        recovery,
    )))
}

fn recover_signed(
    raw: &[u8],
    tx: UnsignedTransaction,
    unsigned_items: &[RlpItem],
    r: [u8; 32],
    s: [u8; 32],
    v: u64,
    recovery: i128,
) -> SignedTransaction {
    let signature = Signature {
        r,
        s,
        recovery_param: recovery.rem_euclid(2) as u8,
        v: Some(v),
    };

    let mut signed = SignedTransaction {
        transaction: tx,
        signature,
        from: None,
        hash: None,
    };

    if !(0..=1).contains(&recovery) {
        warn!("Cannot recover sender: v={} yields recovery param {}", v, recovery);
        return signed;
    }

    let digest = keccak256(&rlp::encode_list(unsigned_items));
    match recover_address(&digest, &signed.signature) {
        Ok(from) => {
            signed.from = Some(from);
            signed.hash = Some(keccak256(raw));
        }
        Err(e) => {
            warn!("Cannot recover sender: {}", e);
        }
    }
    signed
}

/// Address of a contract created by `from` at `nonce`.
pub fn contract_address(from: &Address, nonce: &BigUint) -> Address {
    let encoded = rlp::encode_list(&[
        RlpItem::bytes(from.as_bytes().to_vec()),
        RlpItem::Bytes(biguint_to_stripped_bytes(nonce)),
    ]);
    let hash = keccak256(&encoded);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash.0[12..]);
    Address::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::primitives::decode_hex;
    use crate::codec::signature::LocalSigner;

    fn eip155_transaction() -> UnsignedTransaction {
        UnsignedTransaction {
            nonce: BigUint::from(9u32),
            gas_price: BigUint::from(20_000_000_000u64),
            gas_limit: BigUint::from(21_000u32),
            to: Some("0x3535353535353535353535353535353535353535".parse().unwrap()),
            value: BigUint::from(1_000_000_000_000_000_000u64),
            chain_id: BigUint::from(1u32),
            ..Default::default()
        }
    }

    fn extended_transaction() -> UnsignedTransaction {
        UnsignedTransaction {
            nonce: BigUint::from(0x1234_5678u64),
            gas_price: BigUint::from(30_000_000u64),
            gas_limit: BigUint::from(30_000_000u64),
            block_limit: Some(BigUint::from(501u32)),
            to: Some("0x8c17cf316c1063ab6c89df875e96c9f0f5b2f744".parse().unwrap()),
            value: BigUint::zero(),
            data: Bytes(vec![0x3e, 0xb3, 0x7b, 0x90]),
            chain_id: BigUint::from(1u32),
            group_id: Some(BigUint::from(1u32)),
            extra_data: Some(Bytes::new()),
        }
    }

    #[test]
    fn test_empty_simple_transaction_round_trip() {
        let tx = UnsignedTransaction::default();
        let raw = encode(&tx, None).unwrap();
        assert_eq!(raw, vec![0xc6, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80]);

        match decode(&raw).unwrap() {
            DecodedTransaction::Unsigned(decoded) => {
                assert_eq!(decoded, tx);
                assert!(decoded.to.is_none());
            }
            other => panic!("expected unsigned transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_eip155_signing_digest() {
        let tx = eip155_transaction();
        assert_eq!(
            tx.digest().unwrap().to_string(),
            "0xdaf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_eip155_signed_encoding() {
        let signer = LocalSigner::from_bytes(&[0x46; 32]).unwrap();
        let (raw, signed) = sign_transaction(&eip155_transaction(), &signer).unwrap();

        assert_eq!(
            raw.to_string(),
            "0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(signed.from, Some(signer.address()));
    }

    #[test]
    fn test_simple_signed_round_trip_recovers_sender() {
        let signer = LocalSigner::from_bytes(&[0x22; 32]).unwrap();
        let tx = eip155_transaction();
        let (raw, signed) = sign_transaction(&tx, &signer).unwrap();

        let decoded = decode(raw.as_slice()).unwrap();
        assert_eq!(decoded.transaction(), &tx);
        assert_eq!(decoded.from(), Some(signer.address()));
        assert_eq!(decoded.hash(), signed.hash);
        assert_eq!(decoded.signature().unwrap().v, Some(37 + signed.signature.recovery_param as u64));
    }

    #[test]
    fn test_extended_round_trip() {
        let tx = extended_transaction();
        let raw = encode(&tx, None).unwrap();
        match decode(&raw).unwrap() {
            DecodedTransaction::Unsigned(decoded) => assert_eq!(decoded, tx),
            other => panic!("expected unsigned transaction, got {:?}", other),
        }

        let signer = LocalSigner::from_bytes(&[0x33; 32]).unwrap();
        let (raw, signed) = sign_transaction(&tx, &signer).unwrap();
        let decoded = decode(raw.as_slice()).unwrap();
        assert_eq!(decoded.transaction(), &tx);
        assert_eq!(decoded.from(), Some(signer.address()));
        assert_eq!(decoded.hash(), signed.hash);
        // No chain folding in the extended profile
        assert_eq!(decoded.signature().unwrap().v, Some(27 + signed.signature.recovery_param as u64));
    }

    #[test]
    fn test_field_count_is_strict() {
        for count in [0usize, 5, 7, 8, 11, 12, 14] {
            let fields: Vec<RlpItem> = (0..count).map(|_| RlpItem::bytes(Vec::new())).collect();
            let raw = rlp::encode_list(&fields);
            assert_eq!(decode(&raw), Err(DecodingError::FieldCount { got: count }));
        }
    }

    #[test]
    fn test_rejects_non_list_and_bad_address() {
        assert!(decode(&[0x80]).is_err());

        let mut fields: Vec<RlpItem> = (0..6).map(|_| RlpItem::bytes(Vec::new())).collect();
        fields[3] = RlpItem::bytes(vec![1u8; 19]);
        let raw = rlp::encode_list(&fields);
        assert!(matches!(
            decode(&raw),
            Err(DecodingError::InvalidField { field: "to", .. })
        ));
    }

    #[test]
    fn test_oversized_field_is_rejected() {
        let tx = UnsignedTransaction {
            nonce: BigUint::from_bytes_be(&[0xff; 33]),
            ..Default::default()
        };
        assert_eq!(
            encode(&tx, None),
            Err(EncodingError::FieldTooLong {
                field: "nonce",
                max: 32,
                got: 33
            })
        );
    }

    #[test]
    fn test_supplied_v_must_match_chain_binding() {
        let tx = eip155_transaction();
        // chain id 1 requires v of 37 or 38
        let signature = Signature::from_v([1u8; 32], [2u8; 32], 27).unwrap();
        assert_eq!(
            encode(&tx, Some(&signature)),
            Err(EncodingError::ChainIdMismatch { v: 27, expected: 37 })
        );

        let signature = Signature::from_v([1u8; 32], [2u8; 32], 37).unwrap();
        assert!(encode(&tx, Some(&signature)).is_ok());
    }

    #[test]
    fn test_unrecoverable_signature_leaves_sender_unset() {
        let tx = UnsignedTransaction {
            nonce: BigUint::from(1u32),
            ..Default::default()
        };
        // r and s above the curve order cannot form a signature
        let signature = Signature::new([0xff; 32], [0xff; 32], 0).unwrap();
        let raw = encode(&tx, Some(&signature)).unwrap();

        match decode(&raw).unwrap() {
            DecodedTransaction::Signed(signed) => {
                assert_eq!(signed.transaction, tx);
                assert!(signed.from.is_none());
                assert!(signed.hash.is_none());
            }
            other => panic!("expected signed transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_chain_id_back_derivation_clamps_to_zero() {
        let signer = LocalSigner::from_bytes(&[0x44; 32]).unwrap();
        let tx = UnsignedTransaction {
            nonce: BigUint::from(3u32),
            ..Default::default()
        };
        let (raw, _) = sign_transaction(&tx, &signer).unwrap();

        let decoded = decode(raw.as_slice()).unwrap();
        assert!(decoded.transaction().chain_id.is_zero());
        assert_eq!(decoded.from(), Some(signer.address()));
    }

    #[test]
    fn test_v_35_yields_no_sender() {
        // (35 - 35) / 2 = 0, so the recovery param becomes 8 and recovery is skipped
        let mut fields: Vec<RlpItem> = (0..6).map(|_| RlpItem::bytes(Vec::new())).collect();
        fields.push(RlpItem::bytes(vec![35]));
        fields.push(RlpItem::bytes(vec![1u8; 32]));
        fields.push(RlpItem::bytes(vec![2u8; 32]));
        let raw = rlp::encode_list(&fields);

        match decode(&raw).unwrap() {
            DecodedTransaction::Signed(signed) => {
                assert!(signed.transaction.chain_id.is_zero());
                assert!(signed.from.is_none());
                assert!(signed.hash.is_none());
            }
            other => panic!("expected signed transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_unsigned_chain_bound_form() {
        let tx = eip155_transaction();
        let raw = encode(&tx, None).unwrap();
        match decode(&raw).unwrap() {
            DecodedTransaction::Unsigned(decoded) => assert_eq!(decoded, tx),
            other => panic!("expected unsigned transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_contract_address() {
        let from: Address = "0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0".parse().unwrap();
        assert_eq!(
            contract_address(&from, &BigUint::zero()),
            "0xcd234a471b72ba2f1ccf0a70fcaba648a5eecd8d".parse().unwrap()
        );
        assert_eq!(
            contract_address(&from, &BigUint::from(1u32)),
            "0x343c43a37d37dff08ae8c4a11544c718abb4fcf8".parse().unwrap()
        );
    }

    #[test]
    fn test_decode_known_raw_transaction() {
        let raw = decode_hex("0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83").unwrap();
        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.transaction(), &eip155_transaction());
        assert_eq!(
            decoded.from().unwrap().to_checksum(),
            "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F"
        );
    }
}
