    use std::sync::Arc;

    use engine::sim::{
        PropertyValue, TileKind, TileKindId, TileProperties, TileWorld, COLLIDES_PROPERTY,
        RESTART_PROPERTY,
    };
    use engine::{ObjectCategory, ObjectPlacement};

    use super::*;

    const TILE: f32 = 18.0;
    const DT: f32 = 1.0 / 60.0;
    const SPAWN: Vec2 = Vec2::new(27.0, 45.0);
    const FLOOR_ROWS: &[&str] = &[
        "....................",
        "....................",
        "....................",
        "####################",
    ];
    const HAZARD_ROWS: &[&str] = &[
        "....................",
        "....................",
        "....................",
        "^^^^^^^^^^^^^^^^^^^^",
    ];

    fn level_from_rows(rows: &[&str], placements: Vec<ObjectPlacement>) -> LevelDef {
        let solid = TileProperties::new().with(COLLIDES_PROPERTY, PropertyValue::Bool(true));
        let hazard = solid
            .clone()
            .with(RESTART_PROPERTY, PropertyValue::Bool(true));
        let kinds = vec![
            TileKind::from_properties(solid),
            TileKind::from_properties(hazard),
        ];
        let cells = rows
            .iter()
            .flat_map(|row| row.chars())
            .map(|ch| match ch {
                '#' => Some(TileKindId(0)),
                '^' => Some(TileKindId(1)),
                _ => None,
            })
            .collect();
        let width = rows[0].len() as u32;
        let tile_world =
            TileWorld::new(width, rows.len() as u32, TILE, cells, kinds).expect("tile world");
        LevelDef {
            name: "scene-test".to_string(),
            tile_world: Arc::new(tile_world),
            placements,
            spawn: SPAWN,
            player_size: Vec2::new(12.0, 12.0),
        }
    }

    fn placement(category: ObjectCategory, cell_x: i32, cell_y: i32) -> ObjectPlacement {
        ObjectPlacement {
            category,
            bounds: Aabb::from_top_left(
                Vec2::new(cell_x as f32 * TILE, cell_y as f32 * TILE),
                Vec2::new(TILE, TILE),
            ),
        }
    }

    struct Harness {
        scene: PlatformerScene,
        world: SceneWorld,
    }

    impl Harness {
        fn new(rows: &[&str], placements: Vec<ObjectPlacement>) -> Self {
            let level = level_from_rows(rows, placements);
            let scene = PlatformerScene::new(level, PhysicsTuning::default(), 2.0)
                .expect("scene should build");
            let mut harness = Self {
                scene,
                world: SceneWorld::default(),
            };
            harness.scene.load(&mut harness.world);
            harness
        }

        fn step(&mut self, input: InputSnapshot) -> SceneCommand {
            self.scene.update(DT, &input, &mut self.world)
        }

        fn idle(&mut self, ticks: usize) {
            for _ in 0..ticks {
                assert_eq!(self.step(InputSnapshot::empty()), SceneCommand::None);
            }
        }

        fn hard_reset(&mut self) {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.scene.load(&mut self.world);
        }

        fn render(&mut self) {
            self.world = SceneWorld::default();
            self.scene.render(&mut self.world);
        }

        fn texts(&self) -> Vec<String> {
            self.world
                .texts()
                .iter()
                .map(|text| text.text.clone())
                .collect()
        }
    }

    fn finish_level() -> Vec<ObjectPlacement> {
        vec![placement(ObjectCategory::Finish, 18, 2)]
    }

    #[test]
    fn intro_text_shows_until_any_key() {
        let mut harness = Harness::new(FLOOR_ROWS, finish_level());
        harness.render();
        assert!(harness.texts().contains(&INTRO_TITLE_TEXT.to_string()));
        assert!(harness.texts().contains(&INTRO_PROMPT_TEXT.to_string()));

        harness.step(InputSnapshot::empty().with_any_key_pressed(true));
        assert_eq!(harness.scene.simulation().state().phase(), ScenePhase::Playing);

        harness.render();
        assert!(!harness.texts().contains(&INTRO_TITLE_TEXT.to_string()));
        assert!(harness.texts().contains(&"Coins 0".to_string()));
    }

    #[test]
    fn debug_toggle_does_not_dismiss_intro() {
        let mut harness = Harness::new(FLOOR_ROWS, finish_level());
        harness.step(InputSnapshot::empty().with_action_pressed(InputAction::ToggleDebug, true));

        assert_eq!(harness.scene.simulation().state().phase(), ScenePhase::Intro);
        assert!(harness.scene.debug_title(&harness.world).is_some());
        harness.render();
        assert!(!harness.world.debug_lines().is_empty());

        harness.step(InputSnapshot::empty().with_action_pressed(InputAction::ToggleDebug, true));
        assert!(harness.scene.debug_title(&harness.world).is_none());
    }

    #[test]
    fn held_jump_plays_one_sound_cue() {
        let mut harness = Harness::new(FLOOR_ROWS, finish_level());
        harness.idle(20);
        assert!(harness.scene.simulation().body().grounded());

        harness.step(InputSnapshot::empty().with_action_pressed(InputAction::Jump, true));
        for _ in 0..10 {
            harness.step(InputSnapshot::empty().with_action_down(InputAction::Jump, true));
        }
        assert_eq!(harness.scene.jump_cues, 1);
    }

    #[test]
    fn walking_on_ground_leaves_dust() {
        let mut harness = Harness::new(FLOOR_ROWS, finish_level());
        harness.idle(20);
        for _ in 0..5 {
            harness.step(InputSnapshot::empty().with_action_down(InputAction::MoveRight, true));
        }
        assert!(!harness.scene.dust.particles().is_empty());

        harness.render();
        assert!(harness
            .world
            .rects()
            .iter()
            .any(|rect| rect.color[3] < 255));

        harness.idle(20);
        assert!(harness.scene.dust.particles().is_empty());
    }

    #[test]
    fn hazard_repositions_without_losing_key() {
        let key_at_spawn = vec![
            placement(ObjectCategory::Key, 1, 2),
            placement(ObjectCategory::Finish, 18, 2),
        ];
        let mut harness = Harness::new(HAZARD_ROWS, key_at_spawn);

        let mut repositioned = false;
        for _ in 0..30 {
            assert_eq!(harness.step(InputSnapshot::empty()), SceneCommand::None);
            let sim = harness.scene.simulation();
            let touched = sim
                .snapshot()
                .events
                .iter()
                .any(|event| matches!(event, SimEvent::HazardTouched { .. }));
            if touched {
                assert_eq!(sim.body().position(), SPAWN);
                assert_eq!(sim.body().velocity(), Vec2::ZERO);
                assert!(sim.state().has_key());
                assert!(sim.state().restart_request().is_none());
                repositioned = true;
                break;
            }
        }
        assert!(repositioned, "landing on a restart tile should reposition");
    }

    #[test]
    fn win_freezes_then_any_key_hard_resets_to_intro() {
        let flag_at_spawn = vec![placement(ObjectCategory::Finish, 1, 2)];
        let mut harness = Harness::new(FLOOR_ROWS, flag_at_spawn);

        assert_eq!(harness.step(InputSnapshot::empty()), SceneCommand::None);
        assert!(harness.scene.simulation().state().won());
        let frozen = harness.scene.simulation().body().position();
        harness.idle(5);
        assert_eq!(harness.scene.simulation().body().position(), frozen);

        harness.render();
        assert!(harness.texts().contains(&WIN_TITLE_TEXT.to_string()));
        assert!(harness
            .world
            .rects()
            .iter()
            .any(|rect| rect.color == PLAYER_FINISHED_COLOR));

        let command = harness.step(InputSnapshot::empty().with_any_key_pressed(true));
        assert_eq!(command, SceneCommand::HardReset);

        harness.hard_reset();
        let sim = harness.scene.simulation();
        assert_eq!(sim.state().phase(), ScenePhase::Intro);
        assert!(!sim.state().won());
        assert_eq!(sim.tick_count(), 0);
        assert_eq!(sim.body().position(), SPAWN);
        assert_eq!(sim.objectives().remaining(PickupKind::Flag), 1);
    }

    #[test]
    fn restart_key_reloads_even_mid_level() {
        let coins = vec![
            placement(ObjectCategory::Coin, 1, 2),
            placement(ObjectCategory::Finish, 18, 2),
        ];
        let mut harness = Harness::new(FLOOR_ROWS, coins);
        harness.idle(3);
        assert_eq!(harness.scene.simulation().state().coins_collected(), 1);

        let command =
            harness.step(InputSnapshot::empty().with_action_pressed(InputAction::Restart, true));
        assert_eq!(command, SceneCommand::HardReset);
        harness.hard_reset();
        assert_eq!(harness.scene.simulation().state().coins_collected(), 0);
        assert_eq!(
            harness.scene.simulation().objectives().remaining(PickupKind::Coin),
            1
        );
    }

    #[test]
    fn camera_follows_player_inside_map_bounds() {
        let mut harness = Harness::new(FLOOR_ROWS, finish_level());
        harness.step(InputSnapshot::empty().with_window_size((360, 144)));

        // 360x144 at zoom 2 shows 180x72 of a 360x72 map.
        let camera = harness.world.camera();
        assert_eq!(camera.zoom, 2.0);
        assert_eq!(camera.position, Vec2::new(90.0, 36.0));
    }

    #[test]
    fn tiles_and_pickups_are_drawn() {
        let mut harness = Harness::new(
            FLOOR_ROWS,
            vec![
                placement(ObjectCategory::Coin, 5, 1),
                placement(ObjectCategory::Finish, 18, 2),
            ],
        );
        harness.render();
        let rects = harness.world.rects();
        let ice = rects
            .iter()
            .filter(|rect| rect.color == ICE_TILE_COLOR)
            .count();
        assert_eq!(ice, 20);
        assert!(rects.iter().any(|rect| rect.color == COIN_COLOR));
        assert!(rects.iter().any(|rect| rect.color == FLAG_COLOR));
    }

    #[test]
    fn invalid_level_fails_before_loading() {
        let level = level_from_rows(FLOOR_ROWS, Vec::new());
        assert!(matches!(
            PlatformerScene::new(level, PhysicsTuning::default(), 2.0),
            Err(LevelError::MissingFinish { .. })
        ));
    }
