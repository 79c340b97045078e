use std::fmt;

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroizing;

use super::primitives::{keccak256, Address, H256};
use crate::error::SignatureError;

/// Recoverable ECDSA signature over a 32-byte digest.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 0 or 1
    pub recovery_param: u8,
    /// The v value exactly as supplied or transmitted, when known.
    pub v: Option<u64>,
}

impl Signature {
    pub fn new(r: [u8; 32], s: [u8; 32], recovery_param: u8) -> Result<Self, SignatureError> {
        if recovery_param > 1 {
            return Err(SignatureError::InvalidSignature(format!(
                "recovery param must be 0 or 1, got {}",
                recovery_param
            )));
        }
        Ok(Self {
            r,
            s,
            recovery_param,
            v: None,
        })
    }

    /// Build from a legacy or chain-bound v (0/1, 27/28, or >= 35).
    pub fn from_v(r: [u8; 32], s: [u8; 32], v: u64) -> Result<Self, SignatureError> {
        let recovery_param = match v {
            0 | 1 => v as u8,
            27 | 28 => (v - 27) as u8,
            v if v >= 35 => ((v - 35) % 2) as u8,
            _ => {
                return Err(SignatureError::InvalidSignature(format!("invalid v: {}", v)));
            }
        };
        Ok(Self {
            r,
            s,
            recovery_param,
            v: Some(v),
        })
    }

    /// 65-byte r || s || (27 + recovery param) form.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = 27 + self.recovery_param;
        out
    }

    fn to_ecdsa(&self) -> Result<(EcdsaSignature, RecoveryId), SignatureError> {
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);
        let signature = EcdsaSignature::from_slice(&compact)
            .map_err(|e| SignatureError::InvalidSignature(e.to_string()))?;
        let recovery_id = RecoveryId::from_byte(self.recovery_param)
            .ok_or_else(|| SignatureError::InvalidSignature("bad recovery id".to_string()))?;
        Ok((signature, recovery_id))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("r", &hex::encode(self.r))
            .field("s", &hex::encode(self.s))
            .field("recovery_param", &self.recovery_param)
            .field("v", &self.v)
            .finish()
    }
}

/// Where an address is derived from.
#[derive(Debug, Clone, Copy)]
pub enum KeySource<'a> {
    /// SEC1 public key, compressed (33 bytes) or uncompressed (65 bytes)
    PublicKey(&'a [u8]),
    /// Signature together with the digest it was produced over
    Signature {
        digest: &'a H256,
        signature: &'a Signature,
    },
}

pub fn recover_public_key(digest: &H256, signature: &Signature) -> Result<VerifyingKey, SignatureError> {
    let (ecdsa, recovery_id) = signature.to_ecdsa()?;
    VerifyingKey::recover_from_prehash(digest.as_bytes(), &ecdsa, recovery_id)
        .map_err(|e| SignatureError::Recovery(e.to_string()))
}

/// Address of a public key: low 20 bytes of the hash of the uncompressed key without its prefix.
pub fn public_key_to_address(key: &VerifyingKey) -> Address {
    let uncompressed = key.to_encoded_point(false);
    let hash = keccak256(&uncompressed.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash.0[12..]);
    Address::new(out)
}

pub fn derive_address(source: KeySource<'_>) -> Result<Address, SignatureError> {
    let key = match source {
        KeySource::PublicKey(bytes) => VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?,
        KeySource::Signature { digest, signature } => recover_public_key(digest, signature)?,
    };
    Ok(public_key_to_address(&key))
}

pub fn recover_address(digest: &H256, signature: &Signature) -> Result<Address, SignatureError> {
    derive_address(KeySource::Signature { digest, signature })
}

/// The opaque signing capability: digest in, recoverable signature out.
pub trait DigestSigner: Send + Sync {
    fn address(&self) -> Address;

    fn sign_digest(&self, digest: &H256) -> Result<Signature, SignatureError>;
}

/// Private key bytes, wiped on drop and never printed.
pub struct SecretKey(Zeroizing<[u8; 32]>);

impl SecretKey {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 32 {
            return Err(SignatureError::InvalidPrivateKey);
        }
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(bytes);
        SigningKey::from_slice(&key[..]).map_err(|_| SignatureError::InvalidPrivateKey)?;
        Ok(Self(key))
    }

    fn signing_key(&self) -> Result<SigningKey, SignatureError> {
        SigningKey::from_slice(&self.0[..]).map_err(|_| SignatureError::InvalidPrivateKey)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// In-process signer backed by a secp256k1 private key.
#[derive(Debug)]
pub struct LocalSigner {
    key: SecretKey,
    address: Address,
}

impl LocalSigner {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let key = SecretKey::from_slice(bytes)?;
        let signing_key = key.signing_key()?;
        let address = public_key_to_address(signing_key.verifying_key());
        Ok(Self { key, address })
    }

    pub fn public_key(&self) -> Result<Vec<u8>, SignatureError> {
        let signing_key = self.key.signing_key()?;
        Ok(signing_key.verifying_key().to_encoded_point(false).as_bytes().to_vec())
    }
}

impl DigestSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_digest(&self, digest: &H256) -> Result<Signature, SignatureError> {
        let signing_key = self.key.signing_key()?;
        let (signature, recovery_id) = signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| SignatureError::Signing(e.to_string()))?;
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Signature::new(r, s, recovery_id.to_byte())
    }
}
