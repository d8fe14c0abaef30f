// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Independent jobs on a bounded thread pool
//!
//! Every job still runs sequentially with its own [`Decompiler`]; the pool
//! only spreads whole files over threads. Results keep input order.

use crate::{Decompiled, Decompiler};
use bsp_lite_model::{DecompilerSettings, Result};
use rayon::prelude::*;
use std::path::Path;

/// Decompiles many files with shared settings
#[derive(Clone, Debug)]
pub struct BatchDecompiler {
    settings: DecompilerSettings,
    /// Worker threads; 0 lets the pool pick
    threads: usize,
}

impl BatchDecompiler {
    pub fn new(settings: DecompilerSettings) -> Self {
        Self {
            settings,
            threads: 0,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Decompile every file, one result per path
    pub fn decompile_files<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Vec<Result<Decompiled>> {
        log::info!("Batch of {} files", paths.len());
        self.run(paths, |decompiler, path| decompiler.decompile_file(path))
    }

    /// Decompile every in-memory map, one result per input
    pub fn decompile_all<T: AsRef<[u8]> + Sync>(&self, inputs: &[T]) -> Vec<Result<Decompiled>> {
        self.run(inputs, |decompiler, data| decompiler.decompile(data.as_ref()))
    }

    fn run<T, F>(&self, inputs: &[T], job: F) -> Vec<Result<Decompiled>>
    where
        T: Sync,
        F: Fn(&Decompiler, &T) -> Result<Decompiled> + Sync,
    {
        let one = |input: &T| job(&Decompiler::new(self.settings.clone()), input);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build();

        match pool {
            Ok(pool) => pool.install(|| inputs.par_iter().map(one).collect()),
            Err(e) => {
                log::warn!("Failed to create thread pool: {}, using single-threaded", e);
                inputs.iter().map(one).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsp_lite_model::DecompileError;

    #[test]
    fn test_results_keep_input_order() {
        let batch = BatchDecompiler::new(DecompilerSettings::default()).with_threads(2);
        assert_eq!(batch.threads(), 2);
        let inputs: Vec<Vec<u8>> = vec![vec![0; 4], b"NOTABSPFILE.....".to_vec(), vec![0; 2]];
        let results = batch.decompile_all(&inputs);

        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(matches!(result, Err(DecompileError::UnknownFormat(_))));
        }
        let message = results[0].as_ref().unwrap_err().to_string();
        assert!(message.contains("4 bytes"), "{}", message);
    }

    #[test]
    fn test_missing_files() {
        let batch = BatchDecompiler::new(DecompilerSettings::default());
        let results = batch.decompile_files(&["/nonexistent/a.bsp", "/nonexistent/b.bsp"]);
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(DecompileError::Io(_)))));
    }
}
