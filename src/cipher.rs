use aes::{Aes128, Aes192, Aes256};
use cfb_mode::cipher::{BlockCipher, BlockEncryptMut, KeyInit, KeyIvInit};
use cfb_mode::{BufDecryptor, BufEncryptor};
use thiserror::Error;

/// AES block size, which is also the length of the CFB initialization vector
pub const BLOCK_SIZE: usize = 16;

/// Every session starts from this vector. Reusing it across connections and
/// directions repeats the keystream, so the tunnel only obfuscates traffic and
/// does not protect it. It stays fixed to remain wire compatible with peers.
const ZERO_IV: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// CipherError is returned when a session cannot be keyed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("[ERR] invalid key length {0}: must be 16, 24 or 32 bytes")]
    InvalidKeyLength(usize),
}

/// Keystream is a stateful stream transform that rewrites a buffer in place.
/// Every call continues where the previous one left off.
pub trait Keystream: Send {
    fn apply(&mut self, buf: &mut [u8]);
}

impl<C> Keystream for BufEncryptor<C>
where
    C: BlockEncryptMut + BlockCipher + Send,
{
    fn apply(&mut self, buf: &mut [u8]) {
        self.encrypt(buf);
    }
}

impl<C> Keystream for BufDecryptor<C>
where
    C: BlockEncryptMut + BlockCipher + Send,
{
    fn apply(&mut self, buf: &mut [u8]) {
        self.decrypt(buf);
    }
}

/// CipherSession holds the encrypt and decrypt halves for one connection
pub struct CipherSession {
    encrypt: Box<dyn Keystream>,
    decrypt: Box<dyn Keystream>,
}

/// CipherSession implementation block
impl CipherSession {
    /// new keys AES-CFB in both directions, picking AES-128, AES-192 or
    /// AES-256 from the key length
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        match key.len() {
            16 => Self::with_block_cipher::<Aes128>(key),
            24 => Self::with_block_cipher::<Aes192>(key),
            32 => Self::with_block_cipher::<Aes256>(key),
            n => Err(CipherError::InvalidKeyLength(n)),
        }
    }

    fn with_block_cipher<C>(key: &[u8]) -> Result<Self, CipherError>
    where
        C: BlockEncryptMut + BlockCipher + KeyInit + Send + 'static,
    {
        let encrypt = BufEncryptor::<C>::new_from_slices(key, &ZERO_IV)
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?;
        let decrypt = BufDecryptor::<C>::new_from_slices(key, &ZERO_IV)
            .map_err(|_| CipherError::InvalidKeyLength(key.len()))?;

        Ok(Self {
            encrypt: Box::new(encrypt),
            decrypt: Box::new(decrypt),
        })
    }

    /// into_parts splits the session into (encrypt, decrypt) so each copy
    /// task can own exactly one half
    pub fn into_parts(self) -> (Box<dyn Keystream>, Box<dyn Keystream>) {
        (self.encrypt, self.decrypt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"examplekey123456";

    fn encrypt_all(key: &[u8], data: &[u8]) -> Vec<u8> {
        let (mut enc, _) = CipherSession::new(key).unwrap().into_parts();
        let mut buf = data.to_vec();
        enc.apply(&mut buf);
        buf
    }

    #[test]
    fn accepts_aes_key_sizes() {
        for len in [16, 24, 32] {
            assert!(CipherSession::new(&vec![7u8; len]).is_ok(), "len {len}");
        }
    }

    #[test]
    fn rejects_other_key_sizes() {
        for len in [0, 1, 15, 17, 23, 31, 33, 64] {
            let err = CipherSession::new(&vec![7u8; len]).err();
            assert_eq!(err, Some(CipherError::InvalidKeyLength(len)));
        }
    }

    #[test]
    fn zero_key_matches_aes_reference_block() {
        // CFB with a zero IV XORs the first block with AES_k(0)
        let out = encrypt_all(&[0u8; 16], &[0u8; 16]);
        let expected = [
            0x66, 0xe9, 0x4b, 0xd4, 0xef, 0x8a, 0x2c, 0x3b, 0x88, 0x4c, 0xfa, 0x59, 0xca, 0x34,
            0x2b, 0x2e,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn round_trip_ignores_chunking() {
        let plaintext: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();

        // Encrypt in uneven chunks
        let (mut enc, _) = CipherSession::new(KEY).unwrap().into_parts();
        let mut ciphertext = plaintext.clone();
        let mut start = 0;
        for size in [1, 3, 16, 17, 100, 5].iter().cycle() {
            if start >= ciphertext.len() {
                break;
            }
            let end = (start + size).min(ciphertext.len());
            enc.apply(&mut ciphertext[start..end]);
            start = end;
        }

        assert_ne!(ciphertext, plaintext);
        assert_eq!(ciphertext, encrypt_all(KEY, &plaintext));

        // Decrypt with a different chunking
        let (_, mut dec) = CipherSession::new(KEY).unwrap().into_parts();
        let mut recovered = ciphertext;
        for chunk in recovered.chunks_mut(7) {
            dec.apply(chunk);
        }
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn offset_decryptor_produces_garbage() {
        let plaintext = b"the quick brown fox jumps over the lazy dog".to_vec();
        let ciphertext = encrypt_all(KEY, &plaintext);

        let (_, mut dec) = CipherSession::new(KEY).unwrap().into_parts();
        let mut stray = [0u8; 5];
        dec.apply(&mut stray);

        let mut recovered = ciphertext;
        dec.apply(&mut recovered);
        assert_ne!(recovered, plaintext);
    }

    #[test]
    fn different_keys_disagree() {
        let plaintext = b"hello".to_vec();
        let a = encrypt_all(KEY, &plaintext);
        let b = encrypt_all(b"anotherkey123456", &plaintext);
        assert_ne!(a, b);
    }

    #[test]
    fn wider_keys_round_trip() {
        let key24 = [3u8; 24];
        let key32 = [9u8; 32];
        for key in [&key24[..], &key32[..]] {
            let mut buf = encrypt_all(key, b"payload");
            let (_, mut dec) = CipherSession::new(key).unwrap().into_parts();
            dec.apply(&mut buf);
            assert_eq!(buf, b"payload");
        }
    }
}
