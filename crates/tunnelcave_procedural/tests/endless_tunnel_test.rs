//! # Endless Tunnel Integration Test
//!
//! Proves the tunnel is the same tunnel no matter how it is walked.

use tunnelcave_procedural::{
    CavePath, ChunkStreamer, EndCapStyle, FieldType, OutputMode, StreamerConfig, TunnelError,
    TunnelParams, TunnelTerrainGenerator, WorldSeed,
};

const ALL_FIELDS: [FieldType; 3] =
    [FieldType::Straight, FieldType::DivergenceFree, FieldType::PipeNetwork];

fn generator(params: TunnelParams) -> TunnelTerrainGenerator {
    TunnelTerrainGenerator::new(params).expect("valid params")
}

/// Test: Growing by chunk, by arc length or by ring index yields identical rings.
#[test]
fn test_call_order_does_not_change_rings() {
    for field_type in ALL_FIELDS {
        let params = TunnelParams { field_type, ..TunnelParams::default() };

        let mut by_ring = generator(params.clone());
        by_ring.ensure_ring(120);

        let mut by_chunk = generator(params.clone());
        by_chunk.generate_chunk(3);
        by_chunk.generate_chunk(1);
        by_chunk.ensure_ring(120);

        let mut by_arc = generator(params);
        by_arc.ensure_arc_length(100.0).unwrap();
        by_arc.ensure_arc_length(361.0).unwrap();

        assert_eq!(&by_ring.rings()[..=120], &by_chunk.rings()[..=120], "{field_type}");
        assert_eq!(&by_ring.rings()[..=120], &by_arc.rings()[..=120], "{field_type}");
        assert_eq!(&by_ring.arc_lengths()[..=120], &by_arc.arc_lengths()[..=120]);
    }
}

/// Test: Two generators with the same seed build byte-identical chunks.
#[test]
fn test_same_seed_same_chunk() {
    let mut a = generator(TunnelParams::default());
    let mut b = generator(TunnelParams::default());
    b.ensure_ring(500);

    let chunk_a = a.generate_chunk(4);
    let chunk_b = b.generate_chunk(4);
    assert_eq!(chunk_a.rings(), chunk_b.rings());
    assert_eq!(chunk_a.mesh(), chunk_b.mesh());
    assert_eq!(chunk_a.sdf(), chunk_b.sdf());
    assert_eq!(chunk_a.summary(), chunk_b.summary());
}

/// Test: Different seeds diverge.
#[test]
fn test_different_seed_different_tunnel() {
    let mut a = generator(TunnelParams::default());
    let mut b = generator(TunnelParams {
        world_seed: WorldSeed::new(7),
        ..TunnelParams::default()
    });
    a.ensure_ring(40);
    b.ensure_ring(40);
    assert_ne!(a.rings()[40], b.rings()[40]);
}

/// Test: Neighbouring chunks share their boundary ring.
#[test]
fn test_chunks_are_seamless() {
    let mut g = generator(TunnelParams::default());
    let first = g.generate_chunk(0);
    let second = g.generate_chunk(1);
    assert_eq!(first.rings().last(), second.rings().first());
    assert_eq!(second.ring_start(), g.rings_per_chunk() - 1);
}

/// Test: No step turns harder than the configured limit, for every field.
#[test]
fn test_turn_rate_is_bounded() {
    for field_type in ALL_FIELDS {
        for params in [TunnelParams::test(), TunnelParams::default()] {
            let limit = params.max_turn_per_step_rad;
            let mut g = generator(TunnelParams { field_type, ..params });
            g.ensure_ring(400);
            for pair in g.rings().windows(2) {
                let turn = pair[0].forward().angle_between(pair[1].forward());
                assert!(turn <= limit + 1e-6, "{field_type}: turned {turn} > {limit}");
            }
        }
    }
}

/// Test: Pipe-network rings face the way the path actually travels.
#[test]
fn test_pipe_rings_face_along_travel() {
    for params in [TunnelParams::test(), TunnelParams::default()] {
        let limit = params.max_turn_per_step_rad;
        let mut g = generator(TunnelParams { field_type: FieldType::PipeNetwork, ..params });
        g.ensure_ring(400);
        for (i, pair) in g.rings().windows(2).enumerate() {
            let travel = pair[1].center() - pair[0].center();
            let angle = pair[1].forward().angle_between(travel);
            assert!(angle <= limit + 1e-6, "ring {}: {angle} rad off the chord", i + 1);
        }
    }
}

/// Test: A pipe network too tight for the turn limit is refused up front.
#[test]
fn test_pipe_tighter_than_turn_limit_is_rejected() {
    let mut params = TunnelParams { field_type: FieldType::PipeNetwork, ..TunnelParams::test() };
    params.pipe_network.junction_radius = 10.0;
    assert!(matches!(
        TunnelTerrainGenerator::new(params),
        Err(TunnelError::InvalidParameter { name: "ring_step", .. })
    ));
}

/// Test: Walls never cut below the floor, not even with heavy roughness.
#[test]
fn test_walls_respect_floor() {
    for field_type in ALL_FIELDS {
        let params = TunnelParams {
            field_type,
            rough_amp: 10.5,
            ..TunnelParams::default()
        };
        let mut g = generator(params);
        g.ensure_ring(300);
        for ring in g.rings() {
            assert!(ring.min_radius() > 0.0);
            assert!(ring.min_radius() >= ring.floor_radius() - 1e-12);
        }
    }
}

/// Test: Temporal smoothing damps ring-to-ring wall changes.
#[test]
fn test_smoothing_reduces_ring_to_ring_change() {
    fn mean_delta(smoothness: f64) -> f64 {
        let mut g = generator(TunnelParams {
            rough_smoothness: smoothness,
            ..TunnelParams::test()
        });
        g.ensure_ring(200);
        let deltas: Vec<f64> = g.rings()[1..]
            .windows(2)
            .flat_map(|pair| {
                pair[0]
                    .roughness_profile()
                    .iter()
                    .zip(pair[1].roughness_profile())
                    .map(|(a, b)| (a - b).abs())
                    .collect::<Vec<_>>()
            })
            .collect();
        deltas.iter().sum::<f64>() / deltas.len() as f64
    }

    let rough = mean_delta(0.0);
    let smooth = mean_delta(0.45);
    assert!(smooth < rough, "smoothed {smooth} vs raw {rough}");
}

/// Test: Chunk meshes follow the end cap topology.
#[test]
fn test_mesh_counts_per_cap_style() {
    // 11 rings of 16 sides per chunk.
    let cases = [
        (EndCapStyle::None, 176, 10 * 16 * 6),
        (EndCapStyle::Fan, 178, 10 * 16 * 6 + 2 * 16 * 3),
        (EndCapStyle::Sleeve, 208, 12 * 16 * 6),
    ];
    for (end_caps, vertices, indices) in cases {
        let mut g = generator(TunnelParams { end_caps, ..TunnelParams::test() });
        let chunk = g.generate_chunk(2);
        let mesh = chunk.mesh().expect("mesh mode");
        assert_eq!(mesh.vertex_count(), vertices, "{end_caps}");
        assert_eq!(mesh.index_count(), indices, "{end_caps}");
        assert!(mesh.indices().iter().all(|&i| (i as usize) < vertices));
    }
}

/// Test: Output mode selects the chunk representations.
#[test]
fn test_output_modes() {
    for (mode, mesh, sdf) in [
        (OutputMode::Mesh, true, false),
        (OutputMode::Sdf, false, true),
        (OutputMode::MeshAndSdf, true, true),
    ] {
        let mut g = generator(TunnelParams { mode, ..TunnelParams::test() });
        let chunk = g.generate_chunk(0);
        assert_eq!(chunk.mesh().is_some(), mesh, "{mode}");
        assert_eq!(chunk.sdf().is_some(), sdf, "{mode}");
    }
}

/// Test: The SDF is negative inside the tunnel and positive in the rock.
#[test]
fn test_sdf_sign_around_chunk() {
    let mut g = generator(TunnelParams::test());
    let chunk = g.generate_chunk(1);
    let ring = &chunk.rings()[chunk.rings().len() / 2];
    assert!(chunk.signed_distance(ring.center()) < 0.0);
    let far = ring.center() + ring.frame().right() * (chunk.max_radius() * 3.0);
    assert!(chunk.signed_distance(far) > 0.0);
}

/// Test: Walk 100 chunks through the streamer; the band stays bounded.
#[test]
fn test_streaming_walk() {
    let config = StreamerConfig::default();
    let band = (config.band_high - config.band_low + 1) as usize;
    let mut streamer = ChunkStreamer::new(generator(TunnelParams::test()), config).unwrap();

    for current in 0..100 {
        streamer.update(current);
        assert!(streamer.loaded_chunk_count() <= band);
        assert!(streamer.chunk(current as usize).is_some());
    }

    let stats = streamer.stats();
    assert_eq!(stats.generated_this_session, 100 + 3);
    assert_eq!(stats.unloaded_this_session, stats.generated_this_session - band as u64);
}

/// Test: Arc-length sampling agrees with the ring cache.
#[test]
fn test_cave_path_matches_rings() {
    let mut g = generator(TunnelParams::default());
    g.ensure_ring(50);
    let expected = g.rings()[20].center();
    let s = g.arc_lengths()[20];

    let mut path = CavePath::new(&mut g);
    assert_eq!(path.centerline(s).unwrap(), expected);
    assert!(matches!(path.sample(-1.0), Err(TunnelError::NegativeParameter(_))));
    // Far ahead grows the cache.
    path.centerline(2_000.0).unwrap();
    assert!(*g.arc_lengths().last().unwrap() >= 2_000.0);
}

/// Test: Pipe networks repeat their module plan.
#[test]
fn test_pipe_network_is_repeatable() {
    let params = TunnelParams { field_type: FieldType::PipeNetwork, ..TunnelParams::default() };
    let mut a = generator(params.clone());
    let mut b = generator(params);
    a.ensure_ring(250);
    b.ensure_arc_length(a.arc_lengths()[250]).unwrap();
    assert_eq!(&a.rings()[..=250], &b.rings()[..=250]);
    assert_eq!(a.field_type(), FieldType::PipeNetwork);
}

/// Test: A TOML file drives the whole pipeline.
#[test]
fn test_toml_config_end_to_end() {
    let text = r#"
        world_seed = 99
        chunk_length = 24.0
        ring_step = 2.0
        tube_sides = 10
        end_caps = "sleeve"
        mode = "mesh+sdf"
        field_type = "pipe_network"

        [pipe_network]
        module_count_hint = 6
        straight_length = 12.0
    "#;
    let params = TunnelParams::from_toml_str(text).unwrap();
    assert_eq!(params.rings_per_chunk(), 13);

    let mut g = generator(params);
    let chunk = g.generate_chunk(0);
    let mesh = chunk.mesh().unwrap();
    assert_eq!(mesh.vertex_count(), 13 * 10 + 2 * 10);
    assert_eq!(chunk.sdf().unwrap().ring_indexes(), 0..13);
}

/// Test: Bad TOML fails before any ring is generated.
#[test]
fn test_toml_rejects_invalid_values() {
    assert!(matches!(
        TunnelParams::from_toml_str("tube_sides = 2"),
        Err(TunnelError::TooFewSides(2))
    ));
    assert!(matches!(
        TunnelParams::from_toml_str(r#"field_type = "wormhole""#),
        Err(TunnelError::Config(_))
    ));
    assert!(TunnelParams::from_toml_str("rough_smoothness = 1.5").is_err());
}
