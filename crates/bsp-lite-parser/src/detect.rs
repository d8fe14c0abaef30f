// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Format and version detection
//!
//! Inspects the magic tag, the version number and, where two formats share
//! both, a structural probe of the header. Nothing is decoded here.

use crate::cipher;
use crate::directory::{header_size, lump_id, LumpKind};
use crate::reader::RecordReader;
use bsp_lite_model::{ByteOrder, DecompileError, FormatVersion, Result};

use FormatVersion as V;

/// Result of format detection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detection {
    pub version: FormatVersion,
    pub byte_order: ByteOrder,
    /// XOR key for encrypted files
    pub key: Option<[u8; cipher::KEY_LEN]>,
}

/// Identify the format of a map file
///
/// # Returns
/// The detected version and byte order, or `UnknownFormat`
pub fn detect(data: &[u8]) -> Result<Detection> {
    if data.len() < 8 {
        return Err(DecompileError::unknown_format(format!(
            "file too short ({} bytes)",
            data.len()
        )));
    }

    if let Some(version) = detect_with(data, ByteOrder::LittleEndian)? {
        return Ok(Detection {
            version,
            byte_order: ByteOrder::LittleEndian,
            key: None,
        });
    }

    if let Some(key) = cipher::read_key(data).filter(|k| cipher::decrypts_to(data, k, b"VBSP")) {
        log::debug!("encrypted VBSP header, key at {:#x}", cipher::KEY_OFFSET);
        return Ok(Detection {
            version: V::TacticalIntervention,
            byte_order: ByteOrder::LittleEndian,
            key: Some(key),
        });
    }

    if let Some(version) = detect_with(data, ByteOrder::BigEndian)? {
        log::debug!("big-endian {}", version);
        return Ok(Detection {
            version,
            byte_order: ByteOrder::BigEndian,
            key: None,
        });
    }

    Err(DecompileError::unknown_format(format!(
        "magic {:02X?}",
        &data[..4]
    )))
}

fn detect_with(data: &[u8], order: ByteOrder) -> Result<Option<FormatVersion>> {
    let r = RecordReader::new(data, order);
    let mut magic = [data[0], data[1], data[2], data[3]];
    if order == ByteOrder::BigEndian {
        magic.reverse();
    }
    let raw = r.i32(0)?;
    let version = r.i32(4)?;

    let detected = match &magic {
        b"IBSP" => match version {
            38 => Some(V::Quake2),
            41 => Some(V::Daikatana),
            46 => Some(probe_lump1(&r, V::SoldierOfFortune, V::Quake3)),
            47 => Some(V::Wolfenstein),
            59 => Some(V::CallOfDuty),
            4 => Some(V::CallOfDuty2),
            22 => Some(V::CallOfDuty4),
            _ => None,
        },
        b"RBSP" => match version {
            1 => Some(probe_lump1(&r, V::Sin, V::Raven)),
            _ => None,
        },
        b"VBSP" => match version {
            17 => Some(V::Source17),
            18 => Some(V::Source18),
            19 => Some(V::Source19),
            20 if is_vindictus(&r) => Some(V::Vindictus),
            20 => Some(V::Source20),
            21 if is_left4dead2(&r) => Some(V::Left4Dead2),
            21 => Some(V::Source21),
            22 => Some(V::Source22),
            23 => Some(V::Source23),
            27 => Some(V::DarkMessiah),
            _ => None,
        },
        b"FAKK" => match version {
            12 => Some(V::Fakk),
            19 => Some(V::Stef2Demo),
            _ => None,
        },
        b"EF2!" if version == 20 => Some(V::Stef2),
        b"2015" if version == 19 => Some(V::Mohaa),
        b"IWAD" | b"PWAD" => Some(V::Doom),
        _ => match raw {
            29 => Some(V::Quake),
            30 => Some(V::HalfLife),
            42 => Some(V::Nightfire),
            _ => None,
        },
    };

    if detected.is_none() && &magic[..] != b"\0\0\0\0" {
        log::trace!("no match for magic {:02X?} version {} ({:?})", magic, version, order);
    }
    Ok(detected)
}

/// Choose `candidate` when lump 1 starts right after its header
///
/// Compilers of these formats write lump 1 first, so its offset equals the
/// header size.
fn probe_lump1(r: &RecordReader<'_>, candidate: FormatVersion, fallback: FormatVersion) -> FormatVersion {
    let lump1 = r.i32(16).ok().and_then(|o| usize::try_from(o).ok());
    match (lump1, header_size(candidate)) {
        (Some(offset), Some(size)) if offset == size => candidate,
        _ => fallback,
    }
}

/// Left 4 Dead 2 stores each lump's version first
///
/// A standard directory begins with the entity lump offset, which can never
/// be inside the header.
fn is_left4dead2(r: &RecordReader<'_>) -> bool {
    let header = header_size(V::Source21).unwrap_or(1036);
    r.i32(8).is_ok_and(|first| (first as i64) < header as i64 && first >= 0)
}

/// Vindictus widens game lump directory entries from 16 to 20 bytes
fn is_vindictus(r: &RecordReader<'_>) -> bool {
    let Some(id) = lump_id(LumpKind::GameLump, V::Source20) else {
        return false;
    };
    let slot = 8 + id as usize * 16;
    let (Ok(offset), Ok(length)) = (r.i32(slot), r.i32(slot + 4)) else {
        return false;
    };
    let (Ok(offset), Ok(length)) = (usize::try_from(offset), usize::try_from(length)) else {
        return false;
    };
    if length < 4 {
        return false;
    }
    let Ok(count) = r.i32(offset) else {
        return false;
    };
    if count <= 0 {
        return false;
    }
    game_lump_entries_valid(r, offset, count as usize, 20)
        && !game_lump_entries_valid(r, offset, count as usize, 16)
}

fn game_lump_entries_valid(r: &RecordReader<'_>, base: usize, count: usize, entry: usize) -> bool {
    let offset_field = entry - 8;
    (0..count).all(|i| {
        let at = base + 4 + i * entry;
        match (r.i32(at + offset_field), r.i32(at + offset_field + 4)) {
            (Ok(ofs), Ok(len)) if ofs >= 0 && len >= 0 => (ofs as usize)
                .checked_add(len as usize)
                .is_some_and(|end| end <= r.len()),
            _ => false,
        }
    })
}
