// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Map format versions and engine families
//!
//! Every supported file dialect is one [`FormatVersion`]. Record layouts,
//! lump indices and brush resolution strategies are keyed on it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte order of multi-byte fields in a map file
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

/// Engine lineage; versions in one family share their decompile pipeline
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum EngineFamily {
    /// Quake and GoldSrc: no brush lumps
    Quake,
    Nightfire,
    Quake2,
    Quake3,
    Raven,
    /// FAKK², Elite Force 2 and MOHAA (Ritual/ÜberTools lineage)
    Fakk,
    CallOfDuty,
    Source,
    Doom,
}

/// Supported map format versions
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum FormatVersion {
    // ========================================================================
    // Quake 1 lineage
    // ========================================================================
    Quake,
    HalfLife,
    Nightfire,

    // ========================================================================
    // Quake 2 lineage
    // ========================================================================
    Quake2,
    Daikatana,
    SoldierOfFortune,
    Sin,

    // ========================================================================
    // Quake 3 lineage
    // ========================================================================
    Quake3,
    Wolfenstein,
    Raven,
    Fakk,
    Stef2Demo,
    Stef2,
    Mohaa,
    CallOfDuty,
    CallOfDuty2,
    CallOfDuty4,

    // ========================================================================
    // Source
    // ========================================================================
    Source17,
    Source18,
    Source19,
    Source20,
    Source21,
    Source22,
    Source23,
    Left4Dead2,
    Vindictus,
    TacticalIntervention,
    DarkMessiah,

    // ========================================================================
    // Doom WADs
    // ========================================================================
    Doom,
    Hexen,
}

impl FormatVersion {
    pub fn family(self) -> EngineFamily {
        use FormatVersion::*;
        match self {
            Quake | HalfLife => EngineFamily::Quake,
            Nightfire => EngineFamily::Nightfire,
            Quake2 | Daikatana | SoldierOfFortune | Sin => EngineFamily::Quake2,
            Quake3 | Wolfenstein => EngineFamily::Quake3,
            Raven => EngineFamily::Raven,
            Fakk | Stef2Demo | Stef2 | Mohaa => EngineFamily::Fakk,
            CallOfDuty | CallOfDuty2 | CallOfDuty4 => EngineFamily::CallOfDuty,
            Source17 | Source18 | Source19 | Source20 | Source21 | Source22 | Source23
            | Left4Dead2 | Vindictus | TacticalIntervention | DarkMessiah => EngineFamily::Source,
            Doom | Hexen => EngineFamily::Doom,
        }
    }

    /// Whether the file carries brush and brush side lumps
    pub fn has_brushes(self) -> bool {
        !matches!(self.family(), EngineFamily::Quake | EngineFamily::Doom)
    }

    pub fn is_source(self) -> bool {
        self.family() == EngineFamily::Source
    }

    /// Source lump version number, for versions that have one
    pub fn source_version(self) -> Option<u32> {
        use FormatVersion::*;
        Some(match self {
            Source17 => 17,
            Source18 => 18,
            Source19 => 19,
            Source20 | Vindictus | TacticalIntervention => 20,
            Source21 | Left4Dead2 => 21,
            Source22 => 22,
            Source23 => 23,
            DarkMessiah => 27,
            _ => return None,
        })
    }

    /// Human readable name
    pub fn name(self) -> &'static str {
        use FormatVersion::*;
        match self {
            Quake => "Quake",
            HalfLife => "Half-Life",
            Nightfire => "James Bond 007: Nightfire",
            Quake2 => "Quake 2",
            Daikatana => "Daikatana",
            SoldierOfFortune => "Soldier of Fortune",
            Sin => "SiN",
            Quake3 => "Quake 3",
            Wolfenstein => "Return to Castle Wolfenstein",
            Raven => "Raven (SoF2/JK2)",
            Fakk => "Heavy Metal: FAKK2",
            Stef2Demo => "Star Trek: Elite Force 2 (demo)",
            Stef2 => "Star Trek: Elite Force 2",
            Mohaa => "Medal of Honor: Allied Assault",
            CallOfDuty => "Call of Duty",
            CallOfDuty2 => "Call of Duty 2",
            CallOfDuty4 => "Call of Duty 4",
            Source17 => "Source v17",
            Source18 => "Source v18",
            Source19 => "Source v19",
            Source20 => "Source v20",
            Source21 => "Source v21",
            Source22 => "Source v22",
            Source23 => "Source v23",
            Left4Dead2 => "Left 4 Dead 2",
            Vindictus => "Vindictus",
            TacticalIntervention => "Tactical Intervention",
            DarkMessiah => "Dark Messiah of Might and Magic",
            Doom => "Doom",
            Hexen => "Hexen",
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
