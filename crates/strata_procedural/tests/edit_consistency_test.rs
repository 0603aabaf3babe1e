//! # Edit Consistency Tests
//!
//! Mining and placing against generated terrain, and regeneration on top
//! of the ledger.

use strata_procedural::{
    ChunkCoord, ChunkGenerator, ColumnKey, MaterialClass, Modification, ModificationLedger,
    VoxelKey, VoxelWorldState, WorldSeed, DEFAULT_RENDER_MARGIN,
};

fn setup(seed: &str) -> (ChunkGenerator, ModificationLedger, VoxelWorldState) {
    let generator = ChunkGenerator::new(WorldSeed::new(seed));
    let ledger = ModificationLedger::new();
    let world = VoxelWorldState::generate(&generator, ChunkCoord::new(0, 0), &ledger, DEFAULT_RENDER_MARGIN);
    (generator, ledger, world)
}

fn voxel_set(world: &VoxelWorldState) -> Vec<VoxelKey> {
    let mut voxels: Vec<_> = (0..world.cube_count())
        .filter_map(|i| world.voxel_at(i))
        .collect();
    voxels.sort_unstable();
    voxels
}

fn surface(world: &VoxelWorldState, x: i32, z: i32) -> VoxelKey {
    let y = world
        .top(ColumnKey::new(x, z))
        .expect("column inside the window");
    VoxelKey::new(x, y, z)
}

/// Test: mine, place into the opening, mine again gives the post-mine set.
#[test]
fn test_mine_place_mine_is_idempotent() {
    for seed in ["42", "cliffs", "9000"] {
        let (_, mut ledger, mut world) = setup(seed);

        for (x, z) in [(0, 0), (10, -7), (-25, 30)] {
            let top = surface(&world, x, z);

            ledger.mine(&mut world, top).expect("surface voxel exists");
            let after_mine = voxel_set(&world);

            // The opening left by the mined voxel is the exposed face's
            // placement target.
            ledger
                .place_block(&mut world, top, MaterialClass::Dirt)
                .expect("opening is free");
            assert!(world.contains(top));

            ledger.mine(&mut world, top).expect("re-placed voxel exists");
            assert_eq!(
                voxel_set(&world),
                after_mine,
                "Seed {seed:?}: mine/place/mine at {top:?} drifted"
            );
            assert_eq!(ledger.tag(top), Some(Modification::Remove));
        }
    }
}

/// Test: placing then mining the same block leaves no trace.
#[test]
fn test_place_then_mine_restores_terrain() {
    let (generator, mut ledger, mut world) = setup("42");
    let before = voxel_set(&world);

    let above = surface(&world, 5, 5).offset(0, 1, 0);
    ledger
        .place_block(&mut world, above, MaterialClass::Marble)
        .expect("air above surface");
    ledger.mine(&mut world, above).expect("placed voxel");

    assert_eq!(voxel_set(&world), before);
    assert_eq!(ledger.active_len(), 0);

    world.regenerate(&generator, &ledger);
    assert_eq!(voxel_set(&world), before);
}

/// Test: two regenerations with no edits in between are byte-identical.
#[test]
fn test_regeneration_is_stable() {
    let (generator, mut ledger, mut world) = setup("stable");

    world.regenerate(&generator, &ledger);
    let positions = world.positions().to_vec();
    let types = world.types().to_vec();

    world.regenerate(&generator, &ledger);
    assert_eq!(world.positions(), positions.as_slice());
    assert_eq!(world.types(), types.as_slice());

    // Same holds with edits in the ledger.
    let top = surface(&world, -3, 4);
    ledger.mine(&mut world, top).expect("surface voxel");
    // May land on an occupied cell on steep ground; either way is fine here.
    let _ = ledger.place_block(&mut world, top.offset(2, 1, 0), MaterialClass::Grass);

    world.regenerate(&generator, &ledger);
    let positions = world.positions().to_vec();
    world.regenerate(&generator, &ledger);
    assert_eq!(world.positions(), positions.as_slice());
}

/// Test: edits survive moving away and back.
#[test]
fn test_edits_survive_recentering() {
    let (generator, mut ledger, mut world) = setup("travel");

    let top = surface(&world, 20, 20);
    let placed = surface(&world, -20, 12).offset(0, 1, 0);
    ledger.mine(&mut world, top).expect("surface voxel");
    ledger
        .place_block(&mut world, placed, MaterialClass::Marble)
        .expect("air above surface");
    let edited = voxel_set(&world);

    // Far away: none of the edits are in the neighbourhood.
    world.recenter(&generator, ChunkCoord::new(10, 10), &ledger);
    assert!(!world.in_region(top.column()));

    world.recenter(&generator, ChunkCoord::new(0, 0), &ledger);
    assert_eq!(voxel_set(&world), edited);
    assert_eq!(world.material_at(placed), Some(MaterialClass::Marble));
}

/// Test: neighbouring super-chunks replay edits made near their border.
#[test]
fn test_edit_visible_from_neighbor_chunk() {
    let (generator, mut ledger, mut world) = setup("border");

    // Column 40 belongs to chunk (1, 0).
    let top = surface(&world, 40, 0);
    assert_eq!(top.chunk(), ChunkCoord::new(1, 0));
    ledger.mine(&mut world, top).expect("surface voxel");

    world.recenter(&generator, ChunkCoord::new(1, 0), &ledger);
    assert!(!world.contains(top), "Removal replayed from the owning chunk");
    assert_eq!(world.cube_count(), world.interior_column_total());
}
