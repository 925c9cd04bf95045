use cucumber::given;

use crate::cucumber::{pix_world::PixSystem, PixWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut PixWorld) {
    let system = PixSystem::new().await;
    world.system = Some(system);
}
