//! Toy simulation state plus the capability objects that expose it. The
//! world is shared between the sim loop and the registered objects the way a
//! real host shares its object graph with the control plane.

use std::sync::{Arc, Mutex, MutexGuard};

use tickbridge_host::{HostObject, MemberFault, MethodSig, Value, ValueKind};

pub struct World {
    pub speed: i64,
    pub paused: bool,
    pub cycle: u64,
}

impl World {
    pub fn shared() -> SharedWorld {
        SharedWorld(Arc::new(Mutex::new(World {
            speed: 1,
            paused: false,
            cycle: 0,
        })))
    }
}

#[derive(Clone)]
pub struct SharedWorld(Arc<Mutex<World>>);

impl SharedWorld {
    fn lock(&self) -> MutexGuard<'_, World> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// One sim step: the cycle counter moves by the current speed unless
    /// paused.
    pub fn advance(&self) {
        let mut world = self.lock();
        if !world.paused {
            world.cycle += world.speed.max(0) as u64;
        }
    }
}

/// Coarse speed/pause surface, named so the short-name lookup for
/// `SpeedControl` finds it.
pub struct SpeedControl {
    world: SharedWorld,
}

impl SpeedControl {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl HostObject for SpeedControl {
    fn type_name(&self) -> &str {
        "demo.sim.SpeedControl"
    }

    fn read_property(&self, name: &str) -> Option<Value> {
        let world = self.world.lock();
        match name {
            "speed" => Some(Value::Int(world.speed)),
            "is_paused" => Some(Value::Bool(world.paused)),
            _ => None,
        }
    }

    fn write_member(&mut self, name: &str, value: Value) -> Option<Result<(), MemberFault>> {
        match name {
            "speed" => Some(match value.as_i64() {
                Some(speed) => {
                    self.world.lock().speed = speed;
                    Ok(())
                }
                None => Err(MemberFault::new("speed must be an integer")),
            }),
            _ => None,
        }
    }

    fn method_sig(&self, name: &str) -> Option<MethodSig> {
        match name {
            "set_speed" => Some(MethodSig::new(vec![ValueKind::Int])),
            "pause" | "resume" => Some(MethodSig::new(vec![])),
            _ => None,
        }
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, MemberFault> {
        let mut world = self.world.lock();
        match name {
            "set_speed" => {
                if let Some(speed) = args.first().and_then(Value::as_i64) {
                    world.speed = speed;
                }
                Ok(Value::Int(world.speed))
            }
            "pause" => {
                world.paused = true;
                Ok(Value::Null)
            }
            "resume" => {
                world.paused = false;
                Ok(Value::Null)
            }
            other => Err(MemberFault::new(format!("`{other}` is not invocable"))),
        }
    }

    fn snapshot_members(&self) -> Vec<(String, Value)> {
        let world = self.world.lock();
        vec![
            ("speed".to_string(), Value::Int(world.speed)),
            ("is_paused".to_string(), Value::Bool(world.paused)),
        ]
    }
}

/// Read-mostly view of sim progress, with one cheat method for demos.
pub struct WorldClock {
    world: SharedWorld,
}

impl WorldClock {
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }
}

impl HostObject for WorldClock {
    fn type_name(&self) -> &str {
        "demo.sim.WorldClock"
    }

    fn read_property(&self, name: &str) -> Option<Value> {
        match name {
            "cycle" => Some(Value::Int(self.world.lock().cycle as i64)),
            _ => None,
        }
    }

    fn method_sig(&self, name: &str) -> Option<MethodSig> {
        match name {
            "skip_cycles" => Some(MethodSig::new(vec![ValueKind::Int])),
            _ => None,
        }
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value, MemberFault> {
        match name {
            "skip_cycles" => {
                let skip = args.first().and_then(Value::as_i64).unwrap_or(0);
                if skip < 0 {
                    return Err(MemberFault::new("cannot skip backwards"));
                }
                let mut world = self.world.lock();
                world.cycle += skip as u64;
                Ok(Value::Int(world.cycle as i64))
            }
            other => Err(MemberFault::new(format!("`{other}` is not invocable"))),
        }
    }

    fn snapshot_members(&self) -> Vec<(String, Value)> {
        vec![("cycle".to_string(), Value::Int(self.world.lock().cycle as i64))]
    }
}
