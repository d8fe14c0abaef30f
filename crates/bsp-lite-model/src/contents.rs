// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brush content flags
//!
//! Quake 2, Quake 3 and Source agree on the bit positions used here.
//! Nightfire packs its brush attributes differently and is remapped by
//! [`Contents::from_raw`].

use crate::EngineFamily;

// ============================================================
// Content flags (CONTENTS_*)
// ============================================================

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Contents: u32 {
        const SOLID        = 0x0000_0001;
        const WINDOW       = 0x0000_0002;
        const AUX          = 0x0000_0004;
        const LAVA         = 0x0000_0008;
        const SLIME        = 0x0000_0010;
        const WATER        = 0x0000_0020;
        const MIST         = 0x0000_0040;
        const AREAPORTAL   = 0x0000_8000;
        const PLAYERCLIP   = 0x0001_0000;
        const MONSTERCLIP  = 0x0002_0000;
        const ORIGIN       = 0x0100_0000;
        const DETAIL       = 0x0800_0000;
        const TRANSLUCENT  = 0x1000_0000;
        const LADDER       = 0x2000_0000;
    }
}

// Nightfire brush attribute bits
const NF_WATER: u32 = 0x0000_0100;
const NF_AREAPORTAL: u32 = 0x0000_0800;
const NF_DETAIL: u32 = 0x0000_0200;
const NF_SOLID: u32 = 0x0000_0001;

impl Contents {
    /// Interpret a raw content word from a file of the given family
    pub fn from_raw(raw: u32, family: EngineFamily) -> Contents {
        match family {
            EngineFamily::Nightfire => {
                let mut contents = Contents::empty();
                contents.set(Contents::SOLID, raw & NF_SOLID != 0);
                contents.set(Contents::WATER, raw & NF_WATER != 0);
                contents.set(Contents::DETAIL, raw & NF_DETAIL != 0);
                contents.set(Contents::AREAPORTAL, raw & NF_AREAPORTAL != 0);
                contents
            }
            _ => Contents::from_bits_truncate(raw),
        }
    }

    /// Any liquid volume
    pub fn is_liquid(self) -> bool {
        self.intersects(Contents::WATER | Contents::SLIME | Contents::LAVA)
    }

    pub fn is_detail(self) -> bool {
        self.contains(Contents::DETAIL)
    }

    pub fn is_areaportal(self) -> bool {
        self.contains(Contents::AREAPORTAL)
    }
}
