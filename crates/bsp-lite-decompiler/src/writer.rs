// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Writer dispatch

use bsp_lite_model::{Entities, MapWriter, Result};

/// Hand the decompiled map to every writer
///
/// Every writer but the last gets its own deep copy, so one writer's
/// rewrites never reach another. The last writer takes `entities` itself.
/// The first error stops the dispatch.
pub fn write_with_all(entities: Entities, writers: &mut [Box<dyn MapWriter>]) -> Result<()> {
    let Some((last, rest)) = writers.split_last_mut() else {
        return Ok(());
    };
    for writer in rest.iter_mut() {
        log::info!("Writing {} entities with {}", entities.len(), writer.name());
        writer.write(entities.clone())?;
    }
    log::info!("Writing {} entities with {}", entities.len(), last.name());
    last.write(entities)
}
