// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end decompilation of synthetic maps

mod common;

use approx::assert_relative_eq;
use bsp_lite_decompiler::{BatchDecompiler, Decompiler, THING_CLASSNAME};
use bsp_lite_model::{
    DecompileError, DecompilerSettings, FormatVersion, MapBrush, Vector3D, WORLDSPAWN,
};
use common::*;
use std::sync::{Arc, Mutex};

const CUBE_MIN: [f32; 3] = [0.0; 3];
const CUBE_MAX: [f32; 3] = [64.0; 3];

fn assert_outward(brush: &MapBrush, inside: Vector3D) {
    for side in brush.sides() {
        assert!(
            side.plane.distance(&inside) < 0.0,
            "side {:?} faces inward",
            side.plane
        );
    }
}

/// One worldspawn owning one solid cube through the node tree
fn quake2_cube() -> Vec<u8> {
    let mut texinfo = Bytes::new();
    texinfo
        .vec3([1.0, 0.0, 0.0])
        .f32(0.0)
        .vec3([0.0, -1.0, 0.0])
        .f32(0.0)
        .i32(0)
        .i32(-1)
        .name("e1u1/metal1", 32)
        .i32(-1);

    let mut brush = Bytes::new();
    brush.i32(0).i32(6).i32(1);

    let mut sides = Bytes::new();
    for plane in 0..6u16 {
        sides.u16(plane).i16(0);
    }

    let mut mark = Bytes::new();
    mark.u16(0);

    MapFile::new(b"IBSP", 38, Directory::OffsetLength { count: 19 })
        .lump(0, entity_lump(&[&[("classname", "worldspawn")]]))
        .lump(1, planes20(&box_planes(CUBE_MIN, CUBE_MAX)))
        .lump(4, one_node(28))
        .lump(5, texinfo.take())
        .lump(8, quake2_leaf(28, 1, 0, 1))
        .lump(10, mark.take())
        .lump(13, tree_model(CUBE_MIN, CUBE_MAX, 0))
        .lump(14, brush.take())
        .lump(15, sides.take())
        .build()
}

#[test]
fn test_quake2_single_cube() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let messages = Arc::new(Mutex::new(Vec::new()));
    let (progress, diagnostics) = (seen.clone(), messages.clone());

    let decompiled = Decompiler::new(DecompilerSettings::default())
        .with_progress_callback(move |f| progress.lock().unwrap().push(f))
        .with_message_callback(move |m| diagnostics.lock().unwrap().push(m.to_string()))
        .decompile(&quake2_cube())
        .unwrap();

    assert_eq!(decompiled.version, FormatVersion::Quake2);
    assert_eq!(decompiled.entities.len(), 1);
    assert_eq!(decompiled.stats.brushes, 1);
    assert_eq!(decompiled.stats.sides, 6);
    assert_eq!(decompiled.stats.warnings, 0, "{:?}", messages.lock().unwrap());
    assert!(messages.lock().unwrap().is_empty());

    let progress = seen.lock().unwrap();
    assert_eq!(progress.last(), Some(&1.0));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    let world = decompiled.entities.world().unwrap();
    let brush = &world.brushes[0];
    assert!(brush.sides().iter().all(|s| s.texture == "e1u1/metal1"));
    assert_outward(brush, Vector3D::new(32.0, 32.0, 32.0));
}

#[test]
fn test_quake3_model_brushes_and_shader_contents() {
    let mut textures = Bytes::new();
    textures.name("textures/base/wall", 64).i32(0).i32(1);
    textures.name("textures/base/trim", 64).i32(0).i32(0x0800_0001);

    let door_min = [128.0, 0.0, 0.0];
    let door_max = [192.0, 64.0, 64.0];
    let mut planes = box_planes(CUBE_MIN, CUBE_MAX);
    planes.extend(box_planes(door_min, door_max));

    let mut models = Bytes::new();
    models.vec3(CUBE_MIN).vec3(CUBE_MAX).i32(0).i32(0).i32(0).i32(1);
    models.vec3(door_min).vec3(door_max).i32(0).i32(0).i32(1).i32(1);

    let mut brushes = Bytes::new();
    brushes.i32(0).i32(6).i32(0);
    brushes.i32(6).i32(6).i32(1);

    let mut sides = Bytes::new();
    for plane in 0..12 {
        sides.i32(plane).i32(plane / 6);
    }

    // textures first so lump 1 does not sit where a Soldier of Fortune
    // header would end
    let data = MapFile::new(b"IBSP", 46, Directory::OffsetLength { count: 17 })
        .lump(1, textures.take())
        .lump(
            0,
            entity_lump(&[
                &[("classname", "worldspawn")],
                &[("classname", "func_door"), ("model", "*1")],
            ]),
        )
        .lump(2, planes16(&planes))
        .lump(7, models.take())
        .lump(8, brushes.take())
        .lump(9, sides.take())
        .build();

    let decompiled = Decompiler::new(DecompilerSettings::default())
        .decompile(&data)
        .unwrap();

    assert_eq!(decompiled.version, FormatVersion::Quake3);
    assert_eq!(decompiled.stats.brushes, 2);
    assert_eq!(decompiled.stats.warnings, 0);

    let world = decompiled.entities.world().unwrap();
    assert_eq!(world.brushes.len(), 1);
    assert!(!world.brushes[0].detail);

    let door = decompiled.entities.get(1).unwrap();
    assert_eq!(door.classname(), "func_door");
    assert_eq!(door.brushes.len(), 1);
    let brush = &door.brushes[0];
    assert!(brush.detail);
    assert!(brush.sides().iter().all(|s| s.texture == "textures/base/trim"));
    assert_outward(brush, Vector3D::new(160.0, 32.0, 32.0));
}

#[test]
fn test_source_texdata_names_and_bevels() {
    let mut texdata = Bytes::new();
    texdata.zeros(12).i32(0).zeros(16);

    let mut texinfo = Bytes::new();
    texinfo
        .vec3([0.25, 0.0, 0.0])
        .f32(0.0)
        .vec3([0.0, -0.25, 0.0])
        .f32(0.0)
        .zeros(32)
        .i32(0)
        .i32(0);

    let mut brush = Bytes::new();
    brush.i32(0).i32(7).i32(1);

    let mut sides = Bytes::new();
    for plane in 0..6u16 {
        sides.u16(plane).i16(0).i16(-1).i16(0);
    }
    // bevel planes are compiler output and never reach the editor brush
    sides.u16(0).i16(0).i16(-1).i16(1);

    let mut mark = Bytes::new();
    mark.u16(0);

    let mut string_table = Bytes::new();
    string_table.i32(0);

    let data = MapFile::new(b"VBSP", 20, Directory::Source)
        .lump(0, entity_lump(&[&[("classname", "worldspawn"), ("mapversion", "3")]]))
        .lump(1, planes20(&box_planes(CUBE_MIN, CUBE_MAX)))
        .lump(2, texdata.take())
        .lump(5, one_node(32))
        .lump(6, texinfo.take())
        .lump(10, quake2_leaf(32, 1, 0, 1))
        .lump(14, tree_model(CUBE_MIN, CUBE_MAX, 0))
        .lump(17, mark.take())
        .lump(18, brush.take())
        .lump(19, sides.take())
        .lump(43, b"brick/wall01\0".to_vec())
        .lump(44, string_table.take())
        .build();

    let decompiled = Decompiler::new(DecompilerSettings::default())
        .decompile(&data)
        .unwrap();

    assert_eq!(decompiled.version, FormatVersion::Source20);
    assert_eq!(decompiled.stats.sides, 6);
    assert_eq!(decompiled.stats.warnings, 0);

    let world = decompiled.entities.world().unwrap();
    assert_eq!(world.get("mapversion"), Some("3"));
    let brush = &world.brushes[0];
    assert_eq!(brush.num_sides(), 6);
    for side in brush.sides() {
        assert_eq!(side.texture, "brick/wall01");
        assert!(side.displacement.is_none());
        assert_relative_eq!(side.u_axis.scale, 4.0, epsilon = 1e-9);
    }
    assert_outward(brush, Vector3D::new(32.0, 32.0, 32.0));
}

#[test]
fn test_call_of_duty_axial_sides() {
    let mut textures = Bytes::new();
    textures.name("textures/stone", 64).i32(0).i32(1);

    let mut models = Bytes::new();
    models.vec3([0.0; 3]).vec3([64.0, 32.0, 16.0]).zeros(20).i32(0).i32(1);

    let mut brush = Bytes::new();
    brush.u16(6).u16(0);

    // min/max pairs per axis, stored as raw float bits
    let mut sides = Bytes::new();
    for d in [0.0f32, 64.0, 0.0, 32.0, 0.0, 16.0] {
        sides.u32(d.to_bits()).i32(0);
    }

    let data = MapFile::new(b"IBSP", 59, Directory::LengthOffset { count: 33 })
        .lump(0, textures.take())
        .lump(3, sides.take())
        .lump(4, brush.take())
        .lump(29, models.take())
        .lump(31, entity_lump(&[&[("classname", "worldspawn")]]))
        .build();

    let decompiled = Decompiler::new(DecompilerSettings::default())
        .decompile(&data)
        .unwrap();

    assert_eq!(decompiled.version, FormatVersion::CallOfDuty);
    assert_eq!(decompiled.stats.brushes, 1);
    assert_eq!(decompiled.stats.warnings, 0);

    let brush = &decompiled.entities.world().unwrap().brushes[0];
    assert_eq!(brush.num_sides(), 6);
    assert!(brush.sides().iter().all(|s| s.texture == "textures/stone"));
    assert!(brush
        .sides()
        .iter()
        .any(|s| s.plane.normal == Vector3D::new(0.0, 1.0, 0.0) && s.plane.dist == 32.0));
    assert_outward(brush, Vector3D::new(32.0, 16.0, 8.0));
}

#[test]
fn test_call_of_duty_unused_plane_is_culled_before_correction() {
    let mut textures = Bytes::new();
    textures.name("textures/stone", 64).i32(0).i32(1);

    let mut models = Bytes::new();
    models.vec3([0.0; 3]).vec3(CUBE_MAX).zeros(20).i32(0).i32(1);

    let mut brush = Bytes::new();
    brush.u16(7).u16(0);

    let mut sides = Bytes::new();
    for d in [0.0f32, 64.0, 0.0, 64.0, 0.0, 64.0] {
        sides.u32(d.to_bits()).i32(0);
    }
    // a seventh side on a plane well above the cube
    sides.u32(0).i32(0);

    let data = MapFile::new(b"IBSP", 59, Directory::LengthOffset { count: 33 })
        .lump(0, textures.take())
        .lump(2, planes16(&[([0.0, 0.0, 1.0], 200.0)]))
        .lump(3, sides.take())
        .lump(4, brush.take())
        .lump(29, models.take())
        .lump(31, entity_lump(&[&[("classname", "worldspawn")]]))
        .build();

    let settings = DecompilerSettings {
        cull_unused_planes: false,
        ..DecompilerSettings::default()
    };
    let decompiled = Decompiler::new(settings).decompile(&data).unwrap();

    assert_eq!(decompiled.stats.warnings, 0);
    assert_eq!(decompiled.stats.failed_corrections, 0);
    assert_eq!(decompiled.stats.culled_planes, 1);

    let brush = &decompiled.entities.world().unwrap().brushes[0];
    assert_eq!(brush.num_sides(), 6);
    assert!(brush.sides().iter().all(|s| s.plane.dist != 200.0));
    assert_outward(brush, Vector3D::new(32.0, 32.0, 32.0));
}

/// Quake 3 worldspawn claiming `num_brushes` from a one-brush lump
fn quake3_world(planes: &[([f32; 3], f32)], num_brushes: i32) -> Vec<u8> {
    let mut textures = Bytes::new();
    textures.name("textures/base/wall", 64).i32(0).i32(1);

    let mut models = Bytes::new();
    models.vec3(CUBE_MIN).vec3(CUBE_MAX).i32(0).i32(0).i32(0).i32(num_brushes);

    let mut brushes = Bytes::new();
    brushes.i32(0).i32(6).i32(0);

    let mut sides = Bytes::new();
    for plane in 0..6 {
        sides.i32(plane).i32(0);
    }

    MapFile::new(b"IBSP", 46, Directory::OffsetLength { count: 17 })
        .lump(1, textures.take())
        .lump(0, entity_lump(&[&[("classname", "worldspawn")]]))
        .lump(2, planes16(planes))
        .lump(7, models.take())
        .lump(8, brushes.take())
        .lump(9, sides.take())
        .build()
}

#[test]
fn test_oversized_model_range_is_truncated() {
    let data = quake3_world(&box_planes(CUBE_MIN, CUBE_MAX), i32::MAX);

    let warnings = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&warnings);
    let decompiled = Decompiler::new(DecompilerSettings::default())
        .with_message_callback(move |m: &str| seen.lock().unwrap().push(m.to_string()))
        .decompile(&data)
        .unwrap();

    assert_eq!(decompiled.stats.brushes, 1);
    assert_eq!(decompiled.stats.warnings, 1);
    assert!(warnings.lock().unwrap()[0].contains("truncated"));
}

#[test]
fn test_stored_coordinates_are_snapped() {
    let mut planes = box_planes(CUBE_MIN, CUBE_MAX);
    // +X at 63.99998 and -Y at 0.00002 as a compiler would leave them
    planes[0].1 = 63.99998;
    planes[3].1 = 0.00002;
    let data = quake3_world(&planes, 1);

    let decompiled = Decompiler::new(DecompilerSettings::default())
        .decompile(&data)
        .unwrap();
    assert_eq!(decompiled.stats.warnings, 0);

    let brush = &decompiled.entities.world().unwrap().brushes[0];
    assert!(brush
        .sides()
        .iter()
        .any(|s| s.plane.normal == Vector3D::new(1.0, 0.0, 0.0) && s.plane.dist == 64.0));
    assert!(brush.sides().iter().all(|s| s.plane.dist == s.plane.dist.round()));
    assert_outward(brush, Vector3D::new(32.0, 32.0, 32.0));
}

/// Nightfire leaf (48 bytes) with float bounds
fn nightfire_leaf(min: [f32; 3], max: [f32; 3], first_mark: i32, marks: i32) -> Vec<u8> {
    let mut b = Bytes::new();
    b.i32(1).zeros(4).vec3(min).vec3(max).i32(0).i32(0).i32(first_mark).i32(marks);
    b.take()
}

/// Nightfire model (56 bytes) over a leaf range
fn nightfire_model(min: [f32; 3], max: [f32; 3], first_leaf: i32, leaves: i32) -> Vec<u8> {
    let mut b = Bytes::new();
    b.vec3(min).vec3(max).i32(0).zeros(12).i32(first_leaf).i32(leaves).i32(0).i32(0);
    b.take()
}

#[test]
fn test_nightfire_brushes_through_leaves() {
    let door_min = [128.0, 0.0, 0.0];
    let door_max = [192.0, 64.0, 64.0];
    let mut planes = box_planes(CUBE_MIN, CUBE_MAX);
    planes.extend(box_planes(door_min, door_max));

    let mut leaves = nightfire_leaf(CUBE_MIN, CUBE_MAX, 0, 1);
    leaves.extend(nightfire_leaf(door_min, door_max, 1, 1));

    // the door stores no leaf range, so its leaves are found by bounds
    let mut models = nightfire_model(CUBE_MIN, CUBE_MAX, 0, 1);
    models.extend(nightfire_model(door_min, door_max, 0, 0));

    let mut marks = Bytes::new();
    marks.u32(0).u32(1);

    let mut brushes = Bytes::new();
    brushes.i32(1).i32(0).i32(6);
    brushes.i32(1).i32(6).i32(6);

    let mut sides = Bytes::new();
    for plane in 0..12 {
        sides.i32(-1).i32(plane);
    }

    let data = MapFile::new(b"\0\0\0\0", 42, Directory::VersionOnly { count: 18 })
        .lump(
            0,
            entity_lump(&[
                &[("classname", "worldspawn")],
                &[("classname", "func_door"), ("model", "*1")],
            ]),
        )
        .lump(1, planes20(&planes))
        .lump(11, leaves)
        .lump(13, marks.take())
        .lump(14, models)
        .lump(15, brushes.take())
        .lump(16, sides.take())
        .build();

    let decompiled = Decompiler::new(DecompilerSettings::default())
        .decompile(&data)
        .unwrap();

    assert_eq!(decompiled.version, FormatVersion::Nightfire);
    assert_eq!(decompiled.stats.brushes, 2);
    assert_eq!(decompiled.stats.warnings, 0);

    let world = decompiled.entities.world().unwrap();
    assert_eq!(world.brushes.len(), 1);
    assert_outward(&world.brushes[0], Vector3D::new(32.0, 32.0, 32.0));

    let door = decompiled.entities.get(1).unwrap();
    assert_eq!(door.brushes.len(), 1);
    assert_eq!(door.brushes[0].num_sides(), 6);
    assert_outward(&door.brushes[0], Vector3D::new(160.0, 32.0, 32.0));
}

fn doom_thing(x: i16, y: i16, angle: i16, kind: i16, flags: i16) -> Vec<u8> {
    let mut b = Bytes::new();
    b.i16(x).i16(y).i16(angle).i16(kind).i16(flags);
    b.take()
}

fn pwad_with_maps(names: &[&str]) -> Vec<u8> {
    let mut lumps: Vec<(&str, Vec<u8>)> = Vec::new();
    for (i, &name) in names.iter().enumerate() {
        let mut things = doom_thing(96, -64, 90, 1, 7);
        things.extend(doom_thing(128, 128, 0, 2001 + i as i16, 7));
        lumps.push((name, Vec::new()));
        lumps.push(("THINGS", things));
        for lump in [
            "LINEDEFS", "SIDEDEFS", "VERTEXES", "SEGS", "SSECTORS", "NODES", "SECTORS", "REJECT",
            "BLOCKMAP",
        ] {
            lumps.push((lump, Vec::new()));
        }
    }
    wad(&lumps)
}

#[test]
fn test_wad_things_become_entities() {
    let decompiled = Decompiler::new(DecompilerSettings::default())
        .decompile(&pwad_with_maps(&["E1M1"]))
        .unwrap();

    assert_eq!(decompiled.version, FormatVersion::Doom);
    assert_eq!(decompiled.map_name.as_deref(), Some("E1M1"));
    assert_eq!(decompiled.entities.len(), 3);
    assert_eq!(decompiled.entities.get(0).unwrap().classname(), WORLDSPAWN);

    let start = decompiled.entities.get(1).unwrap();
    assert_eq!(start.classname(), THING_CLASSNAME);
    assert_eq!(start.origin(), Some(Vector3D::new(96.0, -64.0, 0.0)));
    assert_eq!(start.get("doom_type"), Some("1"));
}

#[test]
fn test_wad_every_map() {
    let maps = Decompiler::new(DecompilerSettings::default())
        .decompile_maps(&pwad_with_maps(&["E1M1", "E1M2"]))
        .unwrap();
    let names: Vec<_> = maps.iter().filter_map(|m| m.map_name.as_deref()).collect();
    assert_eq!(names, ["E1M1", "E1M2"]);
    assert_eq!(maps[1].entities.get(2).unwrap().get("doom_type"), Some("2002"));
}

#[test]
fn test_wad_bad_lump_keeps_map() {
    let mut data = pwad_with_maps(&["E1M1", "E1M2"]);
    // THINGS of the first map: the lump after the marker
    let table = i32::from_le_bytes(data[8..12].try_into().unwrap()) as usize;
    let entry = table + 16;
    data[entry + 4..entry + 8].copy_from_slice(&11i32.to_le_bytes());

    let decompiled = Decompiler::new(DecompilerSettings::default())
        .decompile(&data)
        .unwrap();
    assert_eq!(decompiled.map_name.as_deref(), Some("E1M1"));
    assert_eq!(decompiled.entities.len(), 1);
    assert_eq!(decompiled.stats.skipped_lumps, 1);
    assert!(decompiled.stats.warnings >= 1);

    let maps = Decompiler::new(DecompilerSettings::default())
        .decompile_maps(&data)
        .unwrap();
    assert_eq!(maps.len(), 2);
    assert_eq!(maps[0].entities.len(), 1);
    assert_eq!(maps[1].entities.len(), 3);
    assert_eq!(maps[1].stats.skipped_lumps, 0);
}

#[test]
fn test_bad_lump_is_skipped_and_dumped() {
    let mut data = quake2_cube();
    // grow the plane lump by one byte so its length is no longer a whole
    // number of records
    let plane_slot = 8 + 8;
    let length = i32::from_le_bytes(data[plane_slot + 4..plane_slot + 8].try_into().unwrap());
    data[plane_slot + 4..plane_slot + 8].copy_from_slice(&(length + 1).to_le_bytes());

    let dump = std::env::temp_dir().join(format!("bsp-lite-dump-{}", std::process::id()));
    std::fs::create_dir_all(&dump).unwrap();
    let settings = DecompilerSettings::default().with_dump_dir(dump.clone());

    let decompiled = Decompiler::new(settings).decompile(&data).unwrap();
    assert_eq!(decompiled.stats.skipped_lumps, 1);
    assert!(decompiled.stats.warnings >= 1);
    assert!(dump.join("map_Planes.lmp").exists());

    std::fs::remove_dir_all(&dump).unwrap();
}

#[test]
fn test_file_size_limit() {
    let path = std::env::temp_dir().join(format!("bsp-lite-limit-{}.bsp", std::process::id()));
    std::fs::write(&path, quake2_cube()).unwrap();

    let small = DecompilerSettings {
        max_file_size: 64,
        ..DecompilerSettings::default()
    };
    let err = Decompiler::new(small).decompile_file(&path).unwrap_err();
    assert!(matches!(err, DecompileError::ResourceExhausted(_)));

    let decompiled = Decompiler::new(DecompilerSettings::default())
        .decompile_file(&path)
        .unwrap();
    assert_eq!(decompiled.stats.brushes, 1);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_batch_mixes_formats() {
    let inputs = vec![quake2_cube(), pwad_with_maps(&["MAP01"]), b"garbage!".to_vec()];
    let results = BatchDecompiler::new(DecompilerSettings::default())
        .with_threads(2)
        .decompile_all(&inputs);

    assert_eq!(results[0].as_ref().unwrap().version, FormatVersion::Quake2);
    assert_eq!(results[1].as_ref().unwrap().map_name.as_deref(), Some("MAP01"));
    assert!(matches!(results[2], Err(DecompileError::UnknownFormat(_))));
}
