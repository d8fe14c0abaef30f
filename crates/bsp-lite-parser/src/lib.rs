// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BSP-Lite Parser - Version-detecting binary lump reader
//!
//! This crate maps the raw bytes of compiled BSP maps and WAD containers to
//! typed records across every supported format dialect.
//!
//! # Features
//!
//! - **Format detection** from magic tags, versions and header probes
//! - **Data-driven layouts** keyed by record kind and format version
//! - **Tolerant decoding** - a malformed lump is logged and emptied
//! - **Entity text lump** parsing using `nom` combinators
//! - **WAD maps** for Doom and Hexen
//!
//! # Example
//!
//! ```ignore
//! use bsp_lite_parser::BspReader;
//!
//! let file = BspReader::new().read(&bytes)?;
//! println!("{}: {} brushes", file.version, file.brushes.len());
//! ```

pub mod cipher;
pub mod codec;
pub mod detect;
pub mod directory;
pub mod entity_lump;
pub mod file;
pub mod game_lump;
pub mod layout;
pub mod reader;
pub mod records;
pub mod wad;

pub use codec::{decode, encode};
pub use detect::{detect, Detection};
pub use directory::{lump_id, LumpDirectory, LumpEntry, LumpKind};
pub use entity_lump::{parse_connection, parse_entities};
pub use file::{BspFile, BspReader};
pub use game_lump::{GameLump, StaticProp, StaticProps};
pub use layout::RecordKind;
pub use records::*;
pub use wad::{
    find_maps, is_map_marker, DoomMap, LineDef, MapNode, MapVertex, Sector, Seg, SideDef, SubSector,
    Thing, WadMap, MAP_LUMP_ORDER,
};

use bsp_lite_model::Result;

/// Quick read function for simple use cases
pub fn read(data: &[u8]) -> Result<BspFile> {
    BspReader::new().read(data)
}
