//! Arcade physics for the egg: gravity, one-way platforms, bounce pads and
//! hazards. Everything is in stage pixels with y pointing down.

use bevy::prelude::*;

use crate::config::GameConfig;
use crate::game::level::ObstacleKind;
use crate::game::progression::ControllerState;
use crate::game::session::GameSession;
use crate::input::ControlState;

/// How far a resting body may sink into a surface and still count as on top
const CONTACT_TOLERANCE: f32 = 0.5;

/// Sweep distance of moving obstacles, px
const OBSTACLE_SWEEP: f32 = 80.0;
/// Sweep speed of moving obstacles, rad/s
const OBSTACLE_SWEEP_RATE: f32 = 1.5;

#[derive(Component)]
pub struct Player;

/// Axis-aligned moving box
#[derive(Component, Debug, Clone, Copy)]
pub struct ArcadeBody {
    /// Centre of the box
    pub position: Vec2,
    pub velocity: Vec2,
    pub half_size: Vec2,
    /// Landed on a surface during the last step
    pub grounded: bool,
}

impl ArcadeBody {
    pub fn new(position: Vec2, half_size: Vec2) -> Self {
        ArcadeBody {
            position,
            velocity: Vec2::ZERO,
            half_size,
            grounded: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::from_center_half_size(self.position, self.half_size)
    }

    /// Put the body back at `position`, at rest
    pub fn respawn(&mut self, position: Vec2) {
        self.position = position;
        self.velocity = Vec2::ZERO;
        self.grounded = false;
    }
}

/// Something the egg can stand on
#[derive(Component, Debug, Clone, Copy)]
pub struct Surface {
    pub rect: Rect,
    /// Launch factor when this is a bounce pad
    pub bounce: Option<f32>,
}

/// Touching one costs a life
#[derive(Component, Debug, Clone, Copy)]
pub struct Obstacle {
    pub anchor: Vec2,
    pub position: Vec2,
    pub half_size: Vec2,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn rect(&self) -> Rect {
        Rect::from_center_half_size(self.position, self.half_size)
    }
}

/// Position of an obstacle `elapsed` seconds into the level
pub fn obstacle_position(anchor: Vec2, kind: ObstacleKind, elapsed: f32) -> Vec2 {
    let offset = (elapsed * OBSTACLE_SWEEP_RATE).sin() * OBSTACLE_SWEEP;
    match kind {
        ObstacleKind::Static => anchor,
        ObstacleKind::MovingHorizontal => anchor + Vec2::new(offset, 0.0),
        ObstacleKind::MovingVertical => anchor + Vec2::new(0.0, offset),
    }
}

/// Strict overlap; touching edges do not count
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

/// Parameters of one integration step
#[derive(Debug, Clone, Copy)]
pub struct StepParams {
    pub dt: f32,
    pub gravity: f32,
    /// Horizontal velocity requested by the controls
    pub walk_velocity: f32,
    pub stage_width: f32,
    /// Vertical impulse of a bounce pad with power 1.0
    pub bounce_impulse: f32,
}

/// Integrate one step and resolve landings. Platforms are one-way: the body
/// only collides with a surface's top edge while moving down.
pub fn step_body(body: &mut ArcadeBody, surfaces: &[Surface], params: StepParams) {
    let prev_bottom = body.position.y + body.half_size.y;

    body.velocity.x = params.walk_velocity;
    body.velocity.y += params.gravity * params.dt;
    body.position += body.velocity * params.dt;

    // Side and ceiling walls; the floor is open so the egg can fall out
    body.position.x = body
        .position
        .x
        .clamp(body.half_size.x, params.stage_width - body.half_size.x);
    if body.position.y - body.half_size.y < 0.0 {
        body.position.y = body.half_size.y;
        body.velocity.y = body.velocity.y.max(0.0);
    }

    body.grounded = false;
    if body.velocity.y < 0.0 {
        return;
    }

    let bottom = body.position.y + body.half_size.y;
    let left = body.position.x - body.half_size.x;
    let right = body.position.x + body.half_size.x;

    // Highest top edge crossed during this step
    let landing = surfaces
        .iter()
        .filter(|s| right > s.rect.min.x && left < s.rect.max.x)
        .filter(|s| {
            let top = s.rect.min.y;
            prev_bottom <= top + CONTACT_TOLERANCE && bottom >= top - CONTACT_TOLERANCE
        })
        .min_by(|a, b| a.rect.min.y.total_cmp(&b.rect.min.y));

    if let Some(surface) = landing {
        body.position.y = surface.rect.min.y - body.half_size.y;
        body.velocity.y = match surface.bounce {
            Some(power) => params.bounce_impulse * power,
            None => 0.0,
        };
        body.grounded = true;
    }
}

/// Obstacles follow the level clock, so a restart puts them back in phase
pub fn move_obstacles(session: Res<GameSession>, mut obstacles: Query<&mut Obstacle>) {
    let elapsed = session.level_elapsed();
    for mut obstacle in &mut obstacles {
        obstacle.position = obstacle_position(obstacle.anchor, obstacle.kind, elapsed);
    }
}

/// Core physics system for the egg
pub fn simulate_player(
    time: Res<Time>,
    config: Res<GameConfig>,
    controls: Res<ControlState>,
    session: Res<GameSession>,
    mut players: Query<&mut ArcadeBody, With<Player>>,
    surfaces: Query<&Surface>,
) {
    if session.state() == ControllerState::GameOver {
        return;
    }
    let Ok(mut body) = players.single_mut() else {
        return;
    };

    let surfaces: Vec<Surface> = surfaces.iter().copied().collect();
    let params = StepParams {
        dt: time.delta_secs(),
        gravity: config.gravity,
        walk_velocity: controls.move_axis * config.move_speed,
        stage_width: config.stage_size.x,
        bounce_impulse: config.bounce_impulse,
    };
    step_body(&mut body, &surfaces, params);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::jump::JumpProfile;
    use crate::game::level::LevelId;
    use crate::game::level::tests::test_catalog;
    use crate::game::progress::ProgressBook;
    use crate::game::store::MemoryStore;

    const DT: f32 = 1.0 / 60.0;

    fn params(walk_velocity: f32) -> StepParams {
        StepParams {
            dt: DT,
            gravity: 800.0,
            walk_velocity,
            stage_width: 800.0,
            bounce_impulse: -300.0,
        }
    }

    fn ground() -> Surface {
        Surface {
            rect: Rect::from_center_size(Vec2::new(400.0, 568.0), Vec2::new(800.0, 32.0)),
            bounce: None,
        }
    }

    fn resting_egg() -> ArcadeBody {
        // Ground top is y = 552
        ArcadeBody::new(Vec2::new(100.0, 536.0), Vec2::splat(16.0))
    }

    #[test]
    fn test_falls_and_lands() {
        let mut body = ArcadeBody::new(Vec2::new(100.0, 400.0), Vec2::splat(16.0));
        let surfaces = [ground()];

        let mut landed_after = None;
        for tick in 0..120 {
            step_body(&mut body, &surfaces, params(0.0));
            if body.grounded {
                landed_after = Some(tick);
                break;
            }
        }

        assert!(landed_after.is_some());
        assert_eq!(body.position.y, 536.0);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn test_resting_body_stays_grounded() {
        let mut body = resting_egg();
        let surfaces = [ground()];

        for _ in 0..30 {
            step_body(&mut body, &surfaces, params(0.0));
            assert!(body.grounded);
        }
        assert_eq!(body.position.y, 536.0);
    }

    #[test]
    fn test_zero_dt_reports_contact() {
        let mut body = resting_egg();
        let mut still = params(0.0);
        still.dt = 0.0;

        step_body(&mut body, &[ground()], still);

        assert!(body.grounded);
    }

    #[test]
    fn test_rising_body_passes_through_platforms() {
        let platform = Surface {
            rect: Rect::from_center_size(Vec2::new(100.0, 450.0), Vec2::new(128.0, 16.0)),
            bounce: None,
        };
        let mut body = resting_egg();
        body.velocity.y = -400.0;

        let mut crossed = false;
        for _ in 0..30 {
            step_body(&mut body, &[ground(), platform], params(0.0));
            if body.position.y < 442.0 {
                crossed = true;
                break;
            }
        }

        assert!(crossed);
    }

    #[test]
    fn test_bounce_pad_launches() {
        let pad = Surface {
            rect: Rect::from_center_size(Vec2::new(100.0, 544.0), Vec2::new(64.0, 16.0)),
            bounce: Some(2.0),
        };
        let mut body = ArcadeBody::new(Vec2::new(100.0, 519.0), Vec2::splat(16.0));
        body.velocity.y = 200.0;

        step_body(&mut body, &[ground(), pad], params(0.0));

        assert!(body.grounded);
        assert_eq!(body.position.y, 520.0);
        assert_eq!(body.velocity.y, -600.0);
    }

    #[test]
    fn test_walls_clamp_horizontal_motion() {
        let mut body = resting_egg();
        body.position.x = 20.0;

        for _ in 0..10 {
            step_body(&mut body, &[ground()], params(-160.0));
        }

        assert_eq!(body.position.x, 16.0);
    }

    #[test]
    fn test_walking_off_an_edge() {
        let ledge = Surface {
            rect: Rect::from_center_size(Vec2::new(100.0, 300.0), Vec2::new(64.0, 16.0)),
            bounce: None,
        };
        let mut body = ArcadeBody::new(Vec2::new(100.0, 276.0), Vec2::splat(16.0));

        for _ in 0..60 {
            step_body(&mut body, &[ledge], params(160.0));
        }

        assert!(!body.grounded);
        assert!(body.position.y > 300.0);
    }

    #[test]
    fn test_obstacle_sweeps() {
        let anchor = Vec2::new(300.0, 530.0);

        assert_eq!(obstacle_position(anchor, ObstacleKind::Static, 5.0), anchor);

        let h = obstacle_position(anchor, ObstacleKind::MovingHorizontal, 1.0);
        assert_eq!(h.y, anchor.y);
        assert!((h.x - anchor.x).abs() <= OBSTACLE_SWEEP);

        let v = obstacle_position(anchor, ObstacleKind::MovingVertical, 1.0);
        assert_eq!(v.x, anchor.x);
        assert!(v.y != anchor.y);
    }

    #[test]
    fn test_obstacles_follow_the_level_clock() {
        let mut session = GameSession::new(
            test_catalog(),
            ProgressBook::new(Box::new(MemoryStore::new())),
            JumpProfile::default(),
        );
        session.start_level(&LevelId::new("1-1")).unwrap();

        let anchor = Vec2::new(300.0, 400.0);
        let mut app = App::new();
        app.insert_resource(session)
            .add_systems(FixedUpdate, move_obstacles);
        let obstacle = app
            .world_mut()
            .spawn(Obstacle {
                anchor,
                position: anchor,
                half_size: Vec2::splat(16.0),
                kind: ObstacleKind::MovingHorizontal,
            })
            .id();
        let position = |app: &App| app.world().get::<Obstacle>(obstacle).unwrap().position;

        app.world_mut().resource_mut::<GameSession>().advance_time(1.0);
        app.world_mut().run_schedule(FixedUpdate);
        assert_eq!(
            position(&app),
            obstacle_position(anchor, ObstacleKind::MovingHorizontal, 1.0)
        );

        app.world_mut().resource_mut::<GameSession>().restart().unwrap();
        app.world_mut().run_schedule(FixedUpdate);
        assert_eq!(position(&app), anchor);
    }

    #[test]
    fn test_overlaps_excludes_touching_edges() {
        let a = Rect::from_center_half_size(Vec2::ZERO, Vec2::splat(1.0));
        let touching = Rect::from_center_half_size(Vec2::new(2.0, 0.0), Vec2::splat(1.0));
        let inside = Rect::from_center_half_size(Vec2::new(1.5, 0.5), Vec2::splat(1.0));

        assert!(!overlaps(a, touching));
        assert!(overlaps(a, inside));
    }
}
