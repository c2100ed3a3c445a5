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

use approx::assert_relative_eq;
use somnus_control::{Controller, ControllerOptions, RefreshOutcome, TickReport};
use somnus_core::agent::{AgentHandle, AgentId, AgentRole, Readiness};
use somnus_core::config::{
    InclusionSettings, RateSetting, Region, RegionSettings, SharedConfig, ThrottleConfig,
};
use somnus_core::math::Vec3;
use somnus_core::sim::{SimAgent, SimSession};
use std::sync::Arc;

const STEP: f64 = 0.05;

fn controller(session: &Arc<SimSession>, config: &Arc<SharedConfig>) -> Controller {
    Controller::new(
        session.clone(),
        config.clone(),
        ControllerOptions { seed: Some(42) },
    )
    .expect("controller should start")
}

fn scav(id: u32) -> SimAgent {
    SimAgent::new(id, AgentRole::Scav, Vec3::ZERO)
}

fn config_without_bosses() -> Arc<SharedConfig> {
    Arc::new(SharedConfig::new(ThrottleConfig {
        inclusion: InclusionSettings {
            bosses: false,
            ..InclusionSettings::default()
        },
        ..ThrottleConfig::default()
    }))
}

fn disabled(range: f32) -> RegionSettings {
    RegionSettings {
        enabled: false,
        range,
    }
}

/// Ticks from `start` (inclusive) to `end` (exclusive) and sums the reports.
fn run(controller: &mut Controller, start: f64, end: f64) -> TickReport {
    let mut total = TickReport::default();
    let mut now = start;
    while now < end {
        let report = controller.tick(now);
        total.seeded += report.seeded;
        total.evaluated += report.evaluated;
        total.suspended += report.suspended;
        total.resumed += report.resumed;
        total.dropped_stale += report.dropped_stale;
        total.force_resumed += report.force_resumed;
        now += STEP;
    }
    total
}

#[test]
fn test_zero_participants_suspends_every_agent() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    config.set_region(
        Region::Woods,
        RegionSettings {
            enabled: true,
            range: 1000.0,
        },
    );
    let mut agents = Vec::new();
    for i in 0..10 {
        let position = Vec3::new(i as f32, 0.0, 0.0);
        agents.push(session.spawn(SimAgent::new(i, AgentRole::Scav, position)));
    }
    let mut controller = controller(&session, &config);

    // --- ACT ---
    let report = run(&mut controller, 0.0, 0.6);

    // --- ASSERT ---
    assert_eq!(report.suspended, 10);
    assert_eq!(controller.suspended_count(), 10);
    for agent in &agents {
        assert!(!agent.state().active);
    }
}

#[test]
fn test_live_participant_decides_over_dead_one() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("bigmap"));
    let config = Arc::new(SharedConfig::default());
    session.add_human(Vec3::new(50.0, 0.0, 50.0)); // 5000 away (squared)
    session.add_human(Vec3::new(10.0, 0.0, 0.0)).kill(); // 100 away (squared), dead
    let agent = session.spawn(scav(1));
    let id = AgentId(1);
    let mut controller = controller(&session, &config);

    controller.tick(0.0);
    let first_check = controller.next_check(id).expect("seeded on first tick");
    assert!((0.0..0.5).contains(&first_check));

    // --- ACT ---
    let report = controller.tick(first_check);

    // --- ASSERT ---
    assert_eq!(report.evaluated, 1);
    assert!(agent.state().active, "live participant within range");
    assert!(!controller.is_suspended(id));

    let interval = controller.next_check(id).unwrap() - first_check;
    assert!(
        interval > 0.5 - 1e-6 && interval < 0.6,
        "interval was {interval}"
    );
}

#[test]
fn test_rate_setting_scales_future_intervals() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("bigmap"));
    let config = Arc::new(SharedConfig::default());
    session.spawn(scav(1));
    let id = AgentId(1);
    let mut controller = controller(&session, &config);
    controller.tick(0.0);
    let scheduled = controller.next_check(id).unwrap();

    // --- ACT ---
    config.set_rate(RateSetting::Low);
    controller.pump_events();

    // --- ASSERT ---
    assert_relative_eq!(controller.rate_multiplier(), 1.5);
    assert_eq!(
        controller.next_check(id),
        Some(scheduled),
        "existing deadlines are not rewritten"
    );

    controller.tick(scheduled);
    let interval = controller.next_check(id).unwrap() - scheduled;
    // No participants: far tier, 3 s * 1.5.
    assert!(
        interval > 4.5 - 1e-6 && interval < 4.6,
        "interval was {interval}"
    );
}

#[test]
fn test_region_disabled_empties_suspended_set_and_keeps_it_empty() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("bigmap"));
    let config = Arc::new(SharedConfig::default());
    let agents: Vec<_> = (0..5).map(|i| session.spawn(scav(i))).collect();
    let mut controller = controller(&session, &config);
    run(&mut controller, 0.0, 0.6);
    assert_eq!(controller.suspended_count(), 5);

    // --- ACT ---
    config.set_region(Region::Customs, disabled(100.0));
    let report = controller.tick(0.6);

    // --- ASSERT ---
    assert_eq!(report.force_resumed, 5);
    assert_eq!(controller.suspended_count(), 0);
    for agent in &agents {
        let state = agent.state();
        assert!(state.active);
        assert_eq!(state.attack_blocked_for.map(|d| d.as_secs()), Some(1));
    }

    let later = run(&mut controller, 0.65, 10.0);
    assert_eq!(later.evaluated, 0);
    assert_eq!(later.suspended, 0);
    assert_eq!(controller.suspended_count(), 0);
}

#[test]
fn test_reenabled_region_restaggers_checks() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("bigmap"));
    let config = Arc::new(SharedConfig::default());
    for i in 0..20 {
        session.spawn(scav(i));
    }
    let mut controller = controller(&session, &config);
    controller.tick(0.0);
    config.set_region(Region::Customs, disabled(100.0));
    run(&mut controller, 0.05, 30.0);

    // --- ACT ---
    config.set_region(
        Region::Customs,
        RegionSettings {
            enabled: true,
            range: 100.0,
        },
    );
    let report = controller.tick(30.0);

    // --- ASSERT ---
    assert_eq!(report.evaluated, 0, "backlog is spread instead of run at once");
    for i in 0..20 {
        let at = controller.next_check(AgentId(i)).unwrap();
        assert!((30.0..30.5).contains(&at));
    }

    run(&mut controller, 30.05, 30.6);
    assert_eq!(controller.suspended_count(), 20);
}

#[test]
fn test_unknown_region_uses_fallback_range() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("some_modded_map"));
    let config = Arc::new(SharedConfig::default());
    config.set_fallback_range(300.0);
    session.add_human(Vec3::ZERO);
    let near = session.spawn(SimAgent::new(1, AgentRole::Scav, Vec3::X * 250.0));
    let far = session.spawn(SimAgent::new(2, AgentRole::Scav, Vec3::X * 350.0));
    let mut controller = controller(&session, &config);
    assert_eq!(controller.region(), None);

    // --- ACT ---
    run(&mut controller, 0.0, 0.6);

    // --- ASSERT ---
    assert!(near.state().active);
    assert!(!far.state().active);
}

#[test]
fn test_agent_resumes_when_participant_approaches() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("shoreline"));
    let config = Arc::new(SharedConfig::default());
    let human = session.add_human(Vec3::new(2000.0, 0.0, 0.0));
    let agent = session.spawn(SimAgent::new(1, AgentRole::Pmc, Vec3::ZERO));
    let mut controller = controller(&session, &config);
    run(&mut controller, 0.0, 0.6);
    assert!(!agent.state().active);
    assert!(controller.is_suspended(AgentId(1)));

    // --- ACT ---
    human.set_position(Vec3::new(20.0, 0.0, 0.0));
    let report = run(&mut controller, 0.6, 4.0);

    // --- ASSERT ---
    assert_eq!(report.resumed, 1);
    assert!(agent.state().active);
    assert!(!controller.is_suspended(AgentId(1)));
    assert_eq!(agent.state().deactivations, 1);
    assert_eq!(agent.state().activations, 1);
}

#[test]
fn test_participants_leaving_suspends_agents() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    session.add_human(Vec3::new(5.0, 0.0, 0.0));
    let agent = session.spawn(scav(1));
    let mut controller = controller(&session, &config);
    run(&mut controller, 0.0, 0.6);
    assert!(agent.state().active);

    // --- ACT ---
    session.clear_humans();
    controller.notify_humans_joined();
    run(&mut controller, 0.6, 1.2);

    // --- ASSERT ---
    assert_eq!(controller.participant_count(), 0);
    assert!(!agent.state().active);
    assert!(controller.is_suspended(AgentId(1)));
}

#[test]
fn test_initializing_agent_is_never_suspended() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    let agent = session.spawn(scav(1).with_readiness(Readiness::Initializing));
    let mut controller = controller(&session, &config);

    // --- ACT ---
    let report = run(&mut controller, 0.0, 5.0);

    // --- ASSERT ---
    assert!(report.evaluated > 10, "not-ready agents are rechecked often");
    assert_eq!(report.suspended, 0);
    assert!(agent.state().active);

    agent.set_readiness(Readiness::Active);
    run(&mut controller, 5.0, 5.5);
    assert!(!agent.state().active);
}

#[test]
fn test_dead_agent_is_not_deactivated() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    let agent = session.spawn(scav(1));
    agent.kill();
    let mut controller = controller(&session, &config);

    // --- ACT ---
    run(&mut controller, 0.0, 5.0);

    // --- ASSERT ---
    assert_eq!(agent.state().deactivations, 0);
    assert_eq!(controller.suspended_count(), 0);
    assert!(controller.is_tracked(AgentId(1)));
}

#[test]
fn test_inactive_agent_found_by_refresh_starts_active() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    let agent = session.spawn(scav(1));
    agent.set_active(false);

    // --- ACT ---
    let mut controller = controller(&session, &config);

    // --- ASSERT ---
    assert!(controller.is_tracked(AgentId(1)));
    assert!(!controller.is_suspended(AgentId(1)));
    assert!(agent.state().active);
    assert_eq!(agent.state().activations, 1);

    // Once suspended for real, disabling the region brings it back.
    run(&mut controller, 0.0, 0.6);
    assert!(controller.is_suspended(AgentId(1)));
    config.set_region(Region::Woods, disabled(100.0));
    controller.tick(0.6);
    assert!(agent.state().active);
    assert_eq!(controller.suspended_count(), 0);
}

#[test]
fn test_inactive_spawned_agent_starts_active() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    let mut controller = controller(&session, &config);
    let agent = scav(1);
    agent.set_active(false);

    // --- ACT ---
    let agent = session.spawn(agent);
    controller.pump_events();

    // --- ASSERT ---
    assert!(controller.is_tracked(AgentId(1)));
    assert!(!controller.is_suspended(AgentId(1)));
    assert!(agent.state().active);
}

#[test]
fn test_dead_inactive_agent_is_left_alone_when_tracked() {
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    let agent = session.spawn(scav(1));
    agent.kill();
    agent.set_active(false);

    let controller = controller(&session, &config);

    assert!(controller.is_tracked(AgentId(1)));
    assert!(!agent.state().active);
    assert_eq!(agent.state().activations, 0);
}

#[test]
fn test_removing_suspended_agent_is_final() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    session.spawn(scav(1));
    session.spawn(scav(2));
    let mut controller = controller(&session, &config);
    run(&mut controller, 0.0, 0.6);
    assert!(controller.is_suspended(AgentId(1)));

    // --- ACT ---
    session.despawn(AgentId(1));
    controller.pump_events();

    // --- ASSERT ---
    assert!(!controller.is_tracked(AgentId(1)));
    assert!(!controller.is_suspended(AgentId(1)));
    assert_eq!(controller.next_check(AgentId(1)), None);
    assert_eq!(controller.suspended_count(), 1);

    let outcome = controller.refresh();
    assert_eq!(outcome.added, 0);
    assert!(!controller.is_tracked(AgentId(1)));

    // Removing twice is harmless.
    controller.on_agent_removed(AgentId(1));
    assert_eq!(controller.tracked_count(), 1);
}

#[test]
fn test_removal_before_tick_skips_evaluation() {
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    session.spawn(scav(1));
    let mut controller = controller(&session, &config);
    controller.tick(0.0);

    session.despawn(AgentId(1));
    let report = run(&mut controller, 0.05, 2.0);

    assert_eq!(report.evaluated, 0);
    assert_eq!(controller.tracked_count(), 0);
}

#[test]
fn test_destroyed_agent_is_dropped_on_its_next_check() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    session.spawn(scav(1));
    session.spawn(scav(2));
    let mut controller = controller(&session, &config);
    controller.pump_events();
    assert_eq!(controller.tracked_count(), 2);

    // --- ACT ---
    // Gone from the engine without a removal notification.
    drop(session.remove_quietly(AgentId(1)));
    let report = run(&mut controller, 0.0, 0.6);

    // --- ASSERT ---
    assert_eq!(report.dropped_stale, 1);
    assert!(!controller.is_tracked(AgentId(1)));
    assert!(controller.is_suspended(AgentId(2)));
}

#[test]
fn test_spawned_agents_are_filtered() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("bigmap"));
    let config = Arc::new(SharedConfig::default());
    let mut controller = controller(&session, &config);

    // --- ACT ---
    session.spawn(scav(1).as_local_player());
    session.spawn(scav(2).as_person_driven());
    session.spawn(SimAgent::new(3, AgentRole::VehicleGunner, Vec3::ZERO));
    session.spawn(scav(4));
    session.spawn(SimAgent::new(5, AgentRole::Other, Vec3::ZERO));
    controller.pump_events();

    // --- ASSERT ---
    assert_eq!(controller.tracked_count(), 2);
    assert!(controller.is_tracked(AgentId(4)));
    assert!(controller.is_tracked(AgentId(5)));
}

#[test]
fn test_enabling_bosses_tracks_live_bosses_unsuspended() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("bigmap"));
    let config = config_without_bosses();
    session.add_human(Vec3::ZERO);
    let far = Vec3::new(900.0, 0.0, 0.0);
    for i in 0..3 {
        session.spawn(SimAgent::new(i, AgentRole::Boss, far));
    }
    session.spawn(scav(10));
    let mut controller = controller(&session, &config);
    controller.pump_events();
    assert_eq!(controller.tracked_count(), 1);

    // --- ACT ---
    config.set_role_included(AgentRole::Boss, true);
    controller.pump_events();

    // --- ASSERT ---
    assert_eq!(controller.tracked_count(), 4);
    for i in 0..3 {
        assert!(controller.is_tracked(AgentId(i)));
        assert!(!controller.is_suspended(AgentId(i)));
        assert!(session.agent(AgentId(i)).unwrap().state().active);
    }
}

#[test]
fn test_bulk_inclusion_change_refreshes_once() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("bigmap"));
    let config = Arc::new(SharedConfig::default());
    session.spawn(scav(1));
    session.spawn(SimAgent::new(2, AgentRole::Pmc, Vec3::ZERO));
    session.spawn(SimAgent::new(3, AgentRole::Boss, Vec3::ZERO));
    let mut controller = controller(&session, &config);
    run(&mut controller, 0.0, 0.6);
    assert_eq!(controller.suspended_count(), 3);

    // --- ACT ---
    config.set_inclusion(InclusionSettings {
        scavs: false,
        pmcs: false,
        ..InclusionSettings::default()
    });
    controller.pump_events();

    // --- ASSERT ---
    assert_eq!(controller.tracked_count(), 1);
    assert!(controller.is_tracked(AgentId(3)));
    assert_eq!(controller.suspended_count(), 1);
    for id in [1, 2] {
        assert!(session.agent(AgentId(id)).unwrap().state().active);
    }
    assert_eq!(controller.refresh(), RefreshOutcome::default());
}

#[test]
fn test_excluding_a_role_resumes_and_untracks_it() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("bigmap"));
    let config = Arc::new(SharedConfig::default());
    let bosses: Vec<_> = (0..3)
        .map(|i| session.spawn(SimAgent::new(i, AgentRole::Boss, Vec3::ZERO)))
        .collect();
    session.spawn(scav(10));
    let mut controller = controller(&session, &config);
    run(&mut controller, 0.0, 0.6);
    assert_eq!(controller.suspended_count(), 4);

    // --- ACT ---
    config.set_role_included(AgentRole::Boss, false);
    controller.pump_events();

    // --- ASSERT ---
    assert_eq!(controller.tracked_count(), 1);
    assert_eq!(controller.suspended_count(), 1);
    for boss in &bosses {
        assert!(boss.state().active);
    }

    let outcome = controller.refresh();
    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.removed, 0);
}

#[test]
fn test_suspension_clears_targets_held_by_untracked_agents() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("bigmap"));
    let config = config_without_bosses();
    let boss = session.spawn(SimAgent::new(1, AgentRole::Boss, Vec3::ZERO));
    session.spawn(scav(2));
    boss.set_target(Some(AgentId(2)));
    let mut controller = controller(&session, &config);

    // --- ACT ---
    run(&mut controller, 0.0, 0.6);

    // --- ASSERT ---
    assert!(controller.is_suspended(AgentId(2)));
    assert!(boss.state().active, "untracked agents are never suspended");
    assert_eq!(boss.state().target, None);
}

#[test]
fn test_resume_all_reports_each_transition() {
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    for i in 0..5 {
        session.spawn(scav(i));
    }
    let mut controller = controller(&session, &config);
    run(&mut controller, 0.0, 0.6);

    assert_eq!(controller.resume_all(), 5);
    assert_eq!(controller.suspended_count(), 0);
    assert_eq!(controller.resume_all(), 0);
}

#[test]
fn test_only_due_agents_are_evaluated() {
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    for i in 0..500 {
        session.spawn(scav(i));
    }
    let mut controller = controller(&session, &config);

    let first = run(&mut controller, 0.0, 0.6);
    assert_eq!(first.evaluated, 500);

    // Everyone is on the far tier now: nothing is due for ~3 s.
    let idle = run(&mut controller, 0.6, 3.0);
    assert_eq!(idle.evaluated, 0);
}

#[test]
fn test_suspended_set_matches_engine_state() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("interchange"));
    let config = Arc::new(SharedConfig::default());
    let humans: Vec<_> = (0..3).map(|_| session.add_human(Vec3::ZERO)).collect();
    let mut agents = Vec::new();
    for i in 0..60 {
        let position = Vec3::X * (i as f32 * 10.0);
        let agent = session.spawn(SimAgent::new(i, AgentRole::Scav, position));
        // A third start deactivated, as a previous controller may have left them.
        if i % 3 == 0 {
            agent.set_active(false);
        }
        agents.push(agent);
    }
    let mut controller = controller(&session, &config);
    let mut rng = StdRng::seed_from_u64(3);

    // --- ACT / ASSERT ---
    let mut now = 0.0;
    for _ in 0..2000 {
        for human in &humans {
            let x = rng.gen_range(0.0..600.0);
            let z = rng.gen_range(-50.0..50.0);
            human.set_position(Vec3::new(x, 0.0, z));
        }
        controller.tick(now);
        now += STEP;

        for (i, agent) in agents.iter().enumerate() {
            let suspended = controller.is_suspended(AgentId(i as u32));
            assert_eq!(suspended, !agent.state().active);
        }
    }
}

#[test]
fn test_teardown_unsubscribes_and_is_idempotent() {
    // --- ARRANGE ---
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    session.spawn(scav(1));
    let mut controller = controller(&session, &config);
    let spawner = session.sim_spawner().unwrap().clone();
    assert_eq!(spawner.subscriber_count(), 1);
    assert_eq!(config.subscriber_count(), 1);

    // --- ACT ---
    controller.teardown();
    controller.teardown();

    // --- ASSERT ---
    assert!(controller.is_torn_down());
    assert_eq!(spawner.subscriber_count(), 0);
    assert_eq!(config.subscriber_count(), 0);
    assert_eq!(controller.tracked_count(), 0);

    session.spawn(scav(2));
    controller.on_agent_created(session.agent(AgentId(2)).unwrap());
    assert_eq!(controller.tick(1.0), TickReport::default());
    assert_eq!(controller.tracked_count(), 0);
}

#[test]
fn test_drop_unsubscribes() {
    let session = Arc::new(SimSession::new("woods"));
    let config = Arc::new(SharedConfig::default());
    {
        let _controller = controller(&session, &config);
        assert_eq!(config.subscriber_count(), 1);
    }
    assert_eq!(config.subscriber_count(), 0);
    assert_eq!(session.sim_spawner().unwrap().subscriber_count(), 0);
}
