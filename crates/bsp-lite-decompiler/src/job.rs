// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One decompile job over a decoded file
//!
//! Entities are visited in file order. Each brush-based entity claims its
//! brushes through the [`BrushResolver`], every brush is rebuilt by the
//! [`SideBuilder`] and then oriented, culled and re-cornered by the geometry
//! crate. Area portal brushes are held back and handed to `func_areaportal`
//! entities once every model has been visited.

use crate::progress::{MessageSink, Progress};
use crate::resolver::{BrushResolver, ResolveStrategy};
use crate::sides::{BrushRef, SideBuilder};
use bsp_lite_geometry::{calc_brush_vertices, correct_brush, cull_unused_planes, Correction};
use bsp_lite_model::{
    DecompileStats, DecompilerSettings, EngineFamily, Entities, Entity, MapBrush, Result,
    WORLDSPAWN,
};
use bsp_lite_parser::BspFile;

/// Classname of the entities area portal brushes belong to
pub const AREAPORTAL_CLASSNAME: &str = "func_areaportal";

/// Entities and statistics of a finished job
#[derive(Clone, Debug)]
pub struct JobOutput {
    pub entities: Entities,
    pub stats: DecompileStats,
}

/// Decompiles one [`BspFile`]
pub struct DecompileJob<'a> {
    file: &'a BspFile,
    settings: &'a DecompilerSettings,
    progress: Progress<'a>,
    sink: MessageSink<'a>,
    stats: DecompileStats,
}

impl<'a> DecompileJob<'a> {
    pub fn new(
        file: &'a BspFile,
        settings: &'a DecompilerSettings,
        progress: Option<&'a (dyn Fn(f64) + Send)>,
        messages: Option<&'a (dyn Fn(&str) + Send)>,
    ) -> Self {
        let total = file.entities.len() + file.brushes.len();
        Self {
            file,
            settings,
            progress: Progress::new(progress, total),
            sink: MessageSink::new(messages),
            stats: DecompileStats::new(),
        }
    }

    /// Run the job to completion
    pub fn run(mut self) -> Result<JobOutput> {
        let file = self.file;
        let mut entities = Entities::from(file.entities.clone());
        if !entities.get(0).is_some_and(Entity::is_world) {
            self.sink.warn(format_args!(
                "{}: first entity is not {}, inserting one",
                file.version, WORLDSPAWN
            ));
            entities.world_mut();
        }
        for lump in &file.skipped_lumps {
            self.sink.warn(format_args!("lump {} could not be decoded and was skipped", lump));
        }

        let mut resolver = BrushResolver::new(file);
        if resolver.strategy() == ResolveStrategy::Unsupported {
            self.sink.warn(format_args!(
                "{} stores no brushes, decompiling entities only",
                file.version
            ));
        } else {
            self.build_brushes(&mut entities, &mut resolver);
        }

        if let Some(props) = &file.static_props {
            log::info!("Appending {} static props", props.props.len());
            for entity in props.to_entities() {
                entities.push(entity);
            }
        }

        self.progress.finish();
        self.stats.entities = entities.len();
        self.stats.brushes = entities.brush_count();
        self.stats.sides = entities
            .iter()
            .flat_map(|e| &e.brushes)
            .map(MapBrush::num_sides)
            .sum();
        self.stats.skipped_lumps = file.skipped_lumps.len();
        self.stats.warnings = self.sink.count();
        log::info!(
            "{}: {} entities, {} brushes, {} sides, {} warnings",
            file.version,
            self.stats.entities,
            self.stats.brushes,
            self.stats.sides,
            self.stats.warnings
        );
        Ok(JobOutput {
            entities,
            stats: self.stats,
        })
    }

    fn build_brushes(&mut self, entities: &mut Entities, resolver: &mut BrushResolver<'_>) {
        let file = self.file;
        let settings = self.settings;
        let mut builder = SideBuilder::new(file, settings);
        let mut portals: Vec<MapBrush> = Vec::new();
        let mut world_brushes: Vec<MapBrush> = Vec::new();

        for e in 0..entities.len() {
            self.progress.advance(1);
            let Some(entity) = entities.get(e) else {
                continue;
            };
            if !entity.is_brush_based() {
                continue;
            }
            let model = if entity.is_world() {
                0
            } else {
                entity.model_index().unwrap_or(0)
            };
            let origin = if entity.is_world() {
                None
            } else {
                entity.origin().filter(|o| !o.is_zero(settings.precision))
            };

            let mut owned = Vec::new();
            for b in resolver.resolve(model, &mut self.sink) {
                self.progress.advance(1);
                let at = BrushRef { entity: e, brush: b };
                let Some(sides) = resolver.side_range(b) else {
                    self.sink.warn(format_args!(
                        "entity {} brush {}: side range out of bounds",
                        e, b
                    ));
                    continue;
                };
                let portal = builder.contents(b).is_areaportal();
                let Some(mut brush) = builder.build(at, sides, origin.as_ref(), &mut self.sink)
                else {
                    continue;
                };
                self.reconstruct(&mut brush, at);

                if portal && !settings.world_brushes_only {
                    portals.push(brush);
                } else {
                    owned.push(brush);
                }
            }

            if settings.world_brushes_only || e == 0 {
                world_brushes.append(&mut owned);
            } else if let Some(entity) = entities.get_mut(e) {
                entity.brushes.append(&mut owned);
            }
        }

        entities.world_mut().brushes.append(&mut world_brushes);
        self.attach_portals(entities, portals);
        log::debug!("{} brushes not referenced by any model", resolver.unclaimed());
    }

    /// Orient, cull and re-corner one brush
    ///
    /// Call of Duty brushes carry planes that never touch the solid, so they
    /// are culled before correction regardless of settings.
    fn reconstruct(&mut self, brush: &mut MapBrush, at: BrushRef) {
        let settings = self.settings;
        let precision = settings.precision;

        if self.file.version.family() == EngineFamily::CallOfDuty {
            match cull_unused_planes(brush, precision) {
                Ok(culled) => self.stats.culled_planes += culled,
                Err(e) => log::debug!(
                    "entity {} brush {}: planes not culled before correction: {}",
                    at.entity,
                    at.brush,
                    e
                ),
            }
        }

        match correct_brush(brush, precision, settings.skip_plane_flip) {
            Ok(Correction::Unchanged) => {}
            Ok(Correction::Simple { flipped }) => {
                log::debug!("entity {} brush {}: {} sides flipped", at.entity, at.brush, flipped);
                self.stats.simple_corrections += 1;
            }
            Ok(Correction::Advanced { flipped }) => {
                log::debug!(
                    "entity {} brush {}: rebuilt from planes, {} flipped",
                    at.entity,
                    at.brush,
                    flipped
                );
                self.stats.advanced_corrections += 1;
            }
            Err(e) => {
                self.stats.failed_corrections += 1;
                self.sink.warn(e.into_decompile_error(at.entity, at.brush));
            }
        }

        if settings.cull_unused_planes {
            match cull_unused_planes(brush, precision) {
                Ok(culled) => self.stats.culled_planes += culled,
                Err(e) => self.sink.warn(format_args!(
                    "entity {} brush {}: planes not culled: {}",
                    at.entity, at.brush, e
                )),
            }
        }

        if settings.calc_vertices {
            if let Err(e) = calc_brush_vertices(brush, precision) {
                self.stats.vertex_failures += 1;
                self.sink.warn(format_args!(
                    "entity {} brush {}: keeping compiled triangles: {}",
                    at.entity, at.brush, e
                ));
            }
        }
    }

    /// Hand area portal brushes to `func_areaportal` entities in file order
    fn attach_portals(&mut self, entities: &mut Entities, portals: Vec<MapBrush>) {
        if portals.is_empty() {
            return;
        }
        let targets: Vec<usize> = entities
            .find_by_classname(AREAPORTAL_CLASSNAME)
            .filter(|(_, e)| e.brushes.is_empty())
            .map(|(i, _)| i)
            .collect();

        let mut portals = portals.into_iter();
        for (target, brush) in targets.into_iter().zip(portals.by_ref()) {
            if let Some(entity) = entities.get_mut(target) {
                entity.brushes.push(brush);
            }
        }

        let leftover: Vec<MapBrush> = portals.collect();
        if !leftover.is_empty() {
            self.sink.warn(format_args!(
                "{} area portal brushes without a {} entity kept in the world",
                leftover.len(),
                AREAPORTAL_CLASSNAME
            ));
            entities.world_mut().brushes.extend(leftover);
        }
    }
}
