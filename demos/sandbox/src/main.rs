// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Somnus Sandbox
// Runs a simulated session through the throttling controller and reports
// how many agents were kept asleep.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use somnus_control::{ControllerOptions, SessionLifecycle, TickReport};
use somnus_core::agent::AgentRole;
use somnus_core::config::{RateSetting, SharedConfig};
use somnus_core::math::Vec3;
use somnus_core::session::Participant;
use somnus_core::sim::{SimAgent, SimSession};

/// Half-width of the square map, in metres.
const MAP_EXTENT: f32 = 1500.0;

/// Smallest random-walk step, in metres.
const MIN_STRIDE: f32 = 0.01;

/// Roles spawned by the sandbox, with relative weights.
const ROLE_WEIGHTS: [(AgentRole, u32); 7] = [
    (AgentRole::Scav, 50),
    (AgentRole::Pmc, 15),
    (AgentRole::Sniper, 8),
    (AgentRole::Raider, 8),
    (AgentRole::Rogue, 8),
    (AgentRole::Follower, 8),
    (AgentRole::Boss, 3),
];

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Rate {
    Low,
    Medium,
    High,
}

impl From<Rate> for RateSetting {
    fn from(rate: Rate) -> Self {
        match rate {
            Rate::Low => RateSetting::Low,
            Rate::Medium => RateSetting::Medium,
            Rate::High => RateSetting::High,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Location identifier of the simulated session
    #[arg(short, long, default_value = "bigmap")]
    location: String,

    /// Path to a JSON configuration document
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulated agents
    #[arg(short, long, default_value_t = 120)]
    bots: u32,

    /// Number of human participants
    #[arg(long, default_value_t = 2)]
    humans: usize,

    /// Simulated duration, in seconds
    #[arg(short, long, default_value_t = 60.0)]
    duration: f64,

    /// Simulation step, in seconds
    #[arg(long, default_value_t = 0.05)]
    dt: f64,

    /// Switch to this rate halfway through the run
    #[arg(long, value_enum)]
    switch_rate: Option<Rate>,

    /// Seed for placement, movement and scheduling jitter
    #[arg(short, long)]
    seed: Option<u64>,
}

fn load_config(path: Option<&PathBuf>) -> Result<SharedConfig> {
    let Some(path) = path else {
        return Ok(SharedConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let config = SharedConfig::from_json(&json)
        .with_context(|| format!("parsing config from {}", path.display()))?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn random_point(rng: &mut StdRng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-MAP_EXTENT..MAP_EXTENT),
        0.0,
        rng.gen_range(-MAP_EXTENT..MAP_EXTENT),
    )
}

/// Random-walk step for one tick of `dt` seconds. Never zero: sampling from
/// an empty range panics.
fn stride_for(dt: f64) -> f32 {
    ((dt * 10.0) as f32).max(MIN_STRIDE)
}

fn random_step(rng: &mut StdRng, stride: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-stride..stride),
        0.0,
        rng.gen_range(-stride..stride),
    )
}

fn random_role(rng: &mut StdRng) -> AgentRole {
    let total: u32 = ROLE_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut pick = rng.gen_range(0..total);
    for (role, weight) in ROLE_WEIGHTS {
        if pick < weight {
            return role;
        }
        pick -= weight;
    }
    AgentRole::Scav
}

fn accumulate(total: &mut TickReport, report: TickReport) {
    total.seeded += report.seeded;
    total.evaluated += report.evaluated;
    total.suspended += report.suspended;
    total.resumed += report.resumed;
    total.dropped_stale += report.dropped_stale;
    total.force_resumed += report.force_resumed;
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    anyhow::ensure!(cli.dt > 0.0, "--dt must be positive");
    let stride = stride_for(cli.dt);

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let config = Arc::new(load_config(cli.config.as_ref())?);
    let snapshot = config.snapshot();
    log::info!(
        "Rate {:?}, fallback range {:.0}m, {} region overrides",
        snapshot.rate,
        snapshot.fallback_range,
        snapshot.regions.len()
    );
    let session = Arc::new(SimSession::new(cli.location.clone()));

    let humans: Vec<_> = (0..cli.humans)
        .map(|_| session.add_human(random_point(&mut rng)))
        .collect();
    // Half the population exists before the session starts, the rest spawns in.
    let early = cli.bots / 2;
    for id in 0..early {
        session.insert_quietly(SimAgent::new(
            id,
            random_role(&mut rng),
            random_point(&mut rng),
        ));
    }

    let mut lifecycle = SessionLifecycle::new(ControllerOptions {
        seed: cli.seed.map(|s| s.wrapping_add(1)),
    });
    if !lifecycle.start_session(session.clone(), config.clone()) {
        anyhow::bail!("throttling could not start for '{}'", cli.location);
    }

    let mut total = TickReport::default();
    let mut next_id = early;
    let spawn_every = cli.duration / 2.0 / f64::from((cli.bots - early).max(1));
    let mut next_spawn = 0.0;
    let mut switched = false;
    let mut now = 0.0;

    while now < cli.duration {
        if next_id < cli.bots && now >= next_spawn {
            session.spawn(SimAgent::new(
                next_id,
                random_role(&mut rng),
                random_point(&mut rng),
            ));
            next_id += 1;
            next_spawn += spawn_every;
        }

        if let (Some(rate), false) = (cli.switch_rate, switched) {
            if now >= cli.duration / 2.0 {
                config.set_rate(rate.into());
                switched = true;
            }
        }

        for human in &humans {
            human.set_position(human.position() + random_step(&mut rng, stride));
        }
        for agent in session.agents() {
            if agent.state().active {
                agent.translate(random_step(&mut rng, stride));
            }
        }

        if let Some(report) = lifecycle.tick(now) {
            accumulate(&mut total, report);
        }
        now += cli.dt;
    }

    if let Some(controller) = lifecycle.controller() {
        log::info!(
            "Finished {:.1}s on {:?}: tracked={}, suspended={}, rate x{:.2}",
            cli.duration,
            controller.region(),
            controller.tracked_count(),
            controller.suspended_count(),
            controller.rate_multiplier()
        );
    }
    log::info!(
        "Totals: evaluated={}, suspended={}, resumed={}, dropped={}",
        total.evaluated,
        total.suspended,
        total.resumed,
        total.dropped_stale
    );
    lifecycle.end_session();
    Ok(())
}
