//! # Key encoding
//!
//! Named Ed25519 keys, encoded as
//! `<name>+<hex fingerprint>+<base64(algId ‖ key)>`, with signer keys
//! prefixed `PRIVATE+KEY+`. Spec.md §3, §4.5.1.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::errors::NoteError;

/// Algorithm identifier for Ed25519. The only one this crate supports —
/// hash-algorithm agility is an explicit non-goal.
pub const ALG_ED25519: u8 = 1;

fn fingerprint(name: &str, body: &[u8]) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0x0A]);
    hasher.update(body);
    let digest = hasher.finalize();
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

fn split_key_string(s: &str) -> Result<(&str, u32, Vec<u8>), NoteError> {
    let mut parts = s.splitn(3, '+');
    let name = parts
        .next()
        .filter(|n| !n.is_empty() && !n.contains('+'))
        .ok_or_else(|| NoteError::BadKey("missing key name".into()))?;
    let hex = parts
        .next()
        .ok_or_else(|| NoteError::BadKey("missing fingerprint".into()))?;
    let b64 = parts
        .next()
        .ok_or_else(|| NoteError::BadKey("missing key body".into()))?;
    if hex.len() != 8 {
        return Err(NoteError::BadKey("fingerprint must be 8 hex digits".into()));
    }
    let fp = u32::from_str_radix(hex, 16)
        .map_err(|_| NoteError::BadKey("fingerprint is not hex".into()))?;
    let body = B64
        .decode(b64)
        .map_err(|_| NoteError::BadKey("key body is not valid base64".into()))?;
    Ok((name, fp, body))
}

/// A public Ed25519 key, resolved by `(name, fingerprint)`.
#[derive(Debug, Clone)]
pub struct Verifier {
    name: String,
    fingerprint: u32,
    verifying_key: VerifyingKey,
}

impl Verifier {
    /// Parse a verifier key string. Spec.md §4.5.1.
    pub fn parse(s: &str) -> Result<Self, NoteError> {
        let (name, fp, body) = split_key_string(s)?;
        if body.is_empty() {
            return Err(NoteError::BadKey("empty key body".into()));
        }
        if body[0] != ALG_ED25519 {
            return Err(NoteError::BadKey(format!(
                "unsupported algorithm id {}",
                body[0]
            )));
        }
        if body.len() != 33 {
            return Err(NoteError::BadKey("wrong public key length".into()));
        }
        if fingerprint(name, &body) != fp {
            return Err(NoteError::BadKey("fingerprint does not match key body".into()));
        }
        let key_bytes: [u8; 32] = body[1..].try_into().expect("checked length above");
        let verifying_key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| NoteError::BadKey(format!("invalid Ed25519 public key: {e}")))?;
        Ok(Self {
            name: name.to_string(),
            fingerprint: fp,
            verifying_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    /// Verify `sig` over `msg`. Returns `false` on any malformed signature
    /// rather than erroring — callers treat this as "signature invalid".
    pub fn verify(&self, msg: &[u8], sig: &[u8]) -> bool {
        let Ok(sig_bytes): Result<[u8; 64], _> = sig.try_into() else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_bytes);
        self.verifying_key.verify(msg, &signature).is_ok()
    }

    /// Re-encode as `<name>+<hex fingerprint>+<base64 body>`.
    pub fn encode(&self) -> String {
        let mut body = vec![ALG_ED25519];
        body.extend_from_slice(self.verifying_key.as_bytes());
        format!("{}+{:08x}+{}", self.name, self.fingerprint, B64.encode(body))
    }
}

/// A private Ed25519 key capable of signing. Parsed from a
/// `PRIVATE+KEY+...` string; never serialized back out except via
/// [`Signer::encode`] when freshly generated.
pub struct Signer {
    name: String,
    fingerprint: u32,
    signing_key: SigningKey,
}

impl Signer {
    /// Parse a signer key string. Spec.md §4.5.1.
    pub fn parse(s: &str) -> Result<Self, NoteError> {
        let rest = s
            .strip_prefix("PRIVATE+KEY+")
            .ok_or_else(|| NoteError::BadKey("signer key missing PRIVATE+KEY+ prefix".into()))?;
        let (name, fp, body) = split_key_string(rest)?;
        if body.is_empty() {
            return Err(NoteError::BadKey("empty key body".into()));
        }
        if body[0] != ALG_ED25519 {
            return Err(NoteError::BadKey(format!(
                "unsupported algorithm id {}",
                body[0]
            )));
        }
        if body.len() != 33 {
            return Err(NoteError::BadKey("wrong private key length".into()));
        }
        let seed: Zeroizing<[u8; 32]> = Zeroizing::new(body[1..].try_into().expect("checked length above"));
        let signing_key = SigningKey::from_bytes(&seed);
        let public_body = {
            let mut b = vec![ALG_ED25519];
            b.extend_from_slice(signing_key.verifying_key().as_bytes());
            b
        };
        if fingerprint(name, &public_body) != fp {
            return Err(NoteError::BadKey(
                "fingerprint does not match derived public key".into(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            fingerprint: fp,
            signing_key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fingerprint(&self) -> u32 {
        self.fingerprint
    }

    pub fn sign(&self, msg: &[u8]) -> [u8; 64] {
        self.signing_key.sign(msg).to_bytes()
    }

    pub fn verifier(&self) -> Verifier {
        Verifier {
            name: self.name.clone(),
            fingerprint: self.fingerprint,
            verifying_key: self.signing_key.verifying_key(),
        }
    }
}

/// Generate a fresh Ed25519 keypair for `name`, returning
/// `(signer_string, verifier_string)`. Spec.md §4.5.1.
pub fn generate_key(name: &str) -> (String, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();

    let mut pub_body = vec![ALG_ED25519];
    pub_body.extend_from_slice(verifying_key.as_bytes());
    let fp = fingerprint(name, &pub_body);

    let verifier_string = format!("{}+{:08x}+{}", name, fp, B64.encode(&pub_body));

    let priv_body: Zeroizing<Vec<u8>> = Zeroizing::new({
        let mut b = vec![ALG_ED25519];
        b.extend_from_slice(signing_key.to_bytes().as_slice());
        b
    });
    let signer_string = format!(
        "PRIVATE+KEY+{}+{:08x}+{}",
        name,
        fp,
        B64.encode(priv_body.as_slice())
    );

    (signer_string, verifier_string)
}
