//! Movement throughput on a walled arena full of karts.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kartsim_core::Fixed;
use kartsim_entity::MobjSpawn;
use kartsim_physics::{NoHooks, PhysicsConfig, PhysicsWorld};
use kartsim_world::{LevelBuilder, LineDef, Sector};

fn fx(v: i32) -> Fixed {
    Fixed::from_int(v)
}

fn arena(karts: i32) -> PhysicsWorld {
    let mut builder = LevelBuilder::new();
    let floor = builder.add_sector(Sector::new(fx(0), fx(256)));
    let corners = [(0, 0), (0, 2048), (2048, 2048), (2048, 0)]
        .map(|(x, y)| builder.add_vertex(fx(x), fx(y)));
    for i in 0..corners.len() {
        builder.add_line(LineDef::one_sided(corners[i], corners[(i + 1) % corners.len()], floor));
    }
    let level = builder.build().expect("arena is valid");

    let mut world = PhysicsWorld::new(level, PhysicsConfig::default());
    for i in 0..karts {
        let (x, y) = (64 + (i % 16) * 120, 64 + (i / 16) * 120);
        let spawn = MobjSpawn::kart(fx(x), fx(y)).with_momentum(fx(12), fx(7), Fixed::ZERO);
        world.spawn(spawn).expect("spawn inside arena");
    }
    world
}

fn bench_try_move(c: &mut Criterion) {
    let mut world = arena(64);
    let ids: Vec<_> = world.ids().collect();
    let mut flip = false;
    c.bench_function("try_move_64_karts", |b| {
        b.iter(|| {
            flip = !flip;
            let d = if flip { fx(20) } else { fx(-20) };
            for &id in &ids {
                let (x, y) = {
                    let mobj = world.mobj(id).expect("kart alive");
                    (mobj.x, mobj.y)
                };
                black_box(world.try_move(&mut NoHooks, id, x + d, y + d));
            }
        });
    });
}

fn bench_tick(c: &mut Criterion) {
    let mut world = arena(128);
    c.bench_function("tick_128_karts", |b| {
        b.iter(|| world.tick(&mut NoHooks));
    });
}

criterion_group!(benches, bench_try_move, bench_tick);
criterion_main!(benches);
