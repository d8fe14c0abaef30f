// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Repeating-key XOR used by Tactical Intervention maps
//!
//! The whole file is XORed with a 32-byte key. Header slot 24 of an
//! encrypted file is all zeros in plain text, so the key can be read back
//! verbatim from offset 384.

/// Offset of the exposed key
pub const KEY_OFFSET: usize = 0x180;

/// Key length in bytes
pub const KEY_LEN: usize = 32;

/// Candidate key of an encrypted file
pub fn read_key(data: &[u8]) -> Option<[u8; KEY_LEN]> {
    data.get(KEY_OFFSET..KEY_OFFSET + KEY_LEN)?.try_into().ok()
}

/// XOR `data` with `key`, aligned to file position zero
pub fn xor_in_place(data: &mut [u8], key: &[u8; KEY_LEN]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % KEY_LEN];
    }
}

/// Decrypted copy of `data`
pub fn decrypt(data: &[u8], key: &[u8; KEY_LEN]) -> Vec<u8> {
    let mut out = data.to_vec();
    xor_in_place(&mut out, key);
    out
}

/// Whether decrypting the first bytes with `key` yields `magic`
pub fn decrypts_to(data: &[u8], key: &[u8; KEY_LEN], magic: &[u8; 4]) -> bool {
    data.len() >= 4 && (0..4).all(|i| data[i] ^ key[i] == magic[i])
}
