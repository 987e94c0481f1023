//! Decryption of password-protected legacy worlds.
//!
//! Protection XORs everything after the header with one keystream
//! byte derived from the password and the protection method. The
//! password itself is stored obfuscated in the header, so decryption
//! never needs user input; the password's 15 bytes also shift every
//! absolute offset in the file, which must be rewritten once they are
//! stripped.

use log::debug;

use crate::codec::{patch_u32, ByteReader};
use crate::error::WorldError;
use crate::legacy::{PROTECTED_HEADER_SIZE, WORLD_GLOBAL_OFFSET_OFFSET};
use mzx_core::limits::{BOARD_NAME_SIZE, MAX_PASSWORD_LENGTH};

/// Per-position obfuscation bytes applied to the stored password.
const MAGIC_CODE: [u8; MAX_PASSWORD_LENGTH] = [
    0xE6, 0x52, 0xEB, 0xF2, 0x6D, 0x4D, 0x4A, 0xB7, 0x87, 0xB2, 0x92, 0x88, 0xDE, 0x91, 0x24,
];

/// Protection method stored in a world header, when any.
///
/// Returns `None` for unprotected files and files too short to tell.
pub fn is_protected(data: &[u8]) -> Option<u8> {
    match data.get(BOARD_NAME_SIZE) {
        Some(&m @ 1..=3) => Some(m),
        _ => None,
    }
}

/// Recover the plaintext password from its stored form.
fn decode_password(stored: &[u8; MAX_PASSWORD_LENGTH], pro_method: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_PASSWORD_LENGTH);
    for (i, &byte) in stored.iter().enumerate() {
        let mut c = byte ^ MAGIC_CODE[i];
        c = c.wrapping_sub(0x12 + pro_method);
        c ^= 0x8D;
        if c == 0 {
            break;
        }
        out.push(c);
    }
    out
}

/// The single keystream byte for a password and protection method.
///
/// Reproduces the historical routine exactly, including its signed
/// byte arithmetic and 9-bit rotate folds.
fn keystream_byte(password: &[u8], pro_method: u8) -> u8 {
    let mut pw = [0u8; MAX_PASSWORD_LENGTH];
    let n = password.len().min(MAX_PASSWORD_LENGTH);
    pw[..n].copy_from_slice(&password[..n]);

    let mut work: i32 = 85;
    for (i, &byte) in pw.iter().enumerate() {
        work <<= 1;
        if work > 255 {
            work ^= 257;
        }
        let b = byte as i8 as i32;
        if i & 1 == 1 {
            work += b;
            if work > 255 {
                work ^= 257;
            }
        } else {
            work ^= b;
        }
    }
    work += pro_method as i32;
    if work > 255 {
        work ^= 257;
    }
    work <<= 1;
    if work > 255 {
        work ^= 257;
    }
    if work == 0 {
        work = 86;
    }
    (work & 0xFF) as u8
}

/// Decrypt a protected world into its unprotected form.
///
/// The result has a 29-byte plain header (protection 0, magic kept)
/// and every absolute offset reduced by the 15 stripped password
/// bytes. Runs before validation, so the walk over the board
/// directory is fully bounds checked.
pub fn decrypt_world(data: &[u8]) -> Result<Vec<u8>, WorldError> {
    let pro_method = is_protected(data)
        .ok_or_else(|| WorldError::invalid("decrypt called on an unprotected world"))?;
    if data.len() < PROTECTED_HEADER_SIZE {
        return Err(WorldError::truncated("protected world header"));
    }

    let mut stored = [0u8; MAX_PASSWORD_LENGTH];
    stored.copy_from_slice(&data[BOARD_NAME_SIZE + 1..BOARD_NAME_SIZE + 1 + MAX_PASSWORD_LENGTH]);
    let password = decode_password(&stored, pro_method);
    let key = keystream_byte(&password, pro_method);
    debug!("decrypting with method {pro_method}, keystream {key:#04x}");

    let mut out = Vec::with_capacity(data.len() - MAX_PASSWORD_LENGTH);
    out.extend_from_slice(&data[..BOARD_NAME_SIZE]);
    out.push(0);
    out.extend_from_slice(&data[PROTECTED_HEADER_SIZE - 3..PROTECTED_HEADER_SIZE]);
    out.extend(data[PROTECTED_HEADER_SIZE..].iter().map(|&b| b ^ key));

    // Stripping the password moved the whole body back 15 bytes, so
    // every absolute offset must shrink with it.
    let fixup = |v: u32| v.wrapping_sub(MAX_PASSWORD_LENGTH as u32);

    let raw_gl = {
        let mut r = ByteReader::new(&out);
        r.seek(WORLD_GLOBAL_OFFSET_OFFSET)?;
        r.u32()?
    };
    patch_u32(&mut out, WORLD_GLOBAL_OFFSET_OFFSET, fixup(raw_gl));

    // Skip to the size/offset table without judging anything: the
    // table offsets are still 15 too large here, so the validator's
    // bounds checks would misfire. Validation happens after.
    let (table_pos, count) = {
        let mut r = ByteReader::new(&out);
        r.seek(WORLD_GLOBAL_OFFSET_OFFSET + 4)?;
        let mut count = r.u8()? as usize;
        if count == 0 {
            let sfx_size = r.u16()? as usize;
            r.skip(sfx_size)?;
            count = r.u8()? as usize;
        }
        r.skip(count * BOARD_NAME_SIZE)?;
        (r.pos(), count)
    };
    for i in 0..count {
        let pos = table_pos + i * 8 + 4;
        let raw = u32::from_le_bytes([out[pos], out[pos + 1], out[pos + 2], out[pos + 3]]);
        patch_u32(&mut out, pos, fixup(raw));
    }

    Ok(out)
}

/// Inverse of [`decode_password`], for building test fixtures.
#[cfg(test)]
pub(crate) fn encode_password(plain: &[u8], pro_method: u8) -> [u8; MAX_PASSWORD_LENGTH] {
    let mut out = [0u8; MAX_PASSWORD_LENGTH];
    for (i, slot) in out.iter_mut().enumerate() {
        let mut c = plain.get(i).copied().unwrap_or(0) ^ 0x8D;
        c = c.wrapping_add(0x12 + pro_method);
        *slot = c ^ MAGIC_CODE[i];
    }
    out
}

/// Protect a plain world with `password`, for test fixtures only:
/// inserts the encoded password, XORs the body, and shifts every
/// absolute offset forward by the password field length.
#[cfg(test)]
pub(crate) fn encrypt_world(plain: &[u8], password: &[u8], pro_method: u8) -> Vec<u8> {
    let key = keystream_byte(password, pro_method);
    let shift = |v: u32| v.wrapping_add(MAX_PASSWORD_LENGTH as u32);

    // Shift offsets on a plaintext copy first.
    let mut body = plain.to_vec();
    let raw_gl = {
        let mut r = ByteReader::new(&body);
        r.seek(WORLD_GLOBAL_OFFSET_OFFSET).unwrap();
        r.u32().unwrap()
    };
    patch_u32(&mut body, WORLD_GLOBAL_OFFSET_OFFSET, shift(raw_gl));
    // The shifted offsets point past the (not yet inserted) password,
    // so walk the original for structure.
    let (table_pos, count) = {
        let mut orig = ByteReader::new(plain);
        orig.seek(WORLD_GLOBAL_OFFSET_OFFSET + 4).unwrap();
        let mut count = orig.u8().unwrap() as usize;
        if count == 0 {
            let sfx_size = orig.u16().unwrap() as usize;
            orig.skip(sfx_size).unwrap();
            count = orig.u8().unwrap() as usize;
        }
        orig.skip(count * BOARD_NAME_SIZE).unwrap();
        (orig.pos(), count)
    };
    for i in 0..count {
        let pos = table_pos + i * 8 + 4;
        let raw = u32::from_le_bytes([body[pos], body[pos + 1], body[pos + 2], body[pos + 3]]);
        patch_u32(&mut body, pos, shift(raw));
    }

    let mut out = Vec::with_capacity(plain.len() + MAX_PASSWORD_LENGTH);
    out.extend_from_slice(&plain[..BOARD_NAME_SIZE]);
    out.push(pro_method);
    out.extend_from_slice(&encode_password(password, pro_method));
    out.extend_from_slice(&plain[BOARD_NAME_SIZE + 1..crate::legacy::WORLD_HEADER_SIZE]);
    out.extend(
        body[crate::legacy::WORLD_HEADER_SIZE..]
            .iter()
            .map(|&b| b ^ key),
    );
    out
}
