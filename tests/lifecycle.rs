use std::{
    convert::Infallible,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use cucumber_scopes::{
    current_world,
    error::{BoxError, Phase},
    hook::{HookDefinition, HookType},
    step,
    world::current_scenario,
    Adapter as _, Config, Dispose, Error, Lifecycle, PlanAdapter, ResolvedStep,
    ScenarioStatus, ScopeNode, ScopePlan, SharedWorld, Signal, StepDefinition,
    TestPlan, World, WorldFactory,
};
use futures::FutureExt as _;
use regex::Regex;

type Log = Arc<Mutex<Vec<String>>>;

struct Tracker {
    name: String,
    log: Log,
    leaks: bool,
}

#[async_trait]
impl Dispose for Tracker {
    async fn dispose(&mut self) -> Result<(), BoxError> {
        self.log.lock().unwrap().push(format!("dispose {}", self.name));
        if self.leaks {
            return Err("leak".into());
        }
        Ok(())
    }
}

struct Diary {
    name: String,
    log: Log,
    tracker: Tracker,
}

impl World for Diary {
    type Error = Infallible;

    async fn new() -> Result<Self, Infallible> {
        Ok(Self::named(String::new(), Log::default()))
    }

    fn container(&mut self) -> Option<&mut dyn Dispose> {
        Some(&mut self.tracker)
    }
}

impl Diary {
    fn named(name: String, log: Log) -> Self {
        let tracker = Tracker {
            leaks: name.starts_with("leaky"),
            name: name.clone(),
            log: Arc::clone(&log),
        };
        Self { name, log, tracker }
    }

    fn record(&self, entry: impl Into<String>) {
        self.log.lock().unwrap().push(entry.into());
    }
}

/// Builds a [`Lifecycle`] over the given `root`, whose worlds log their
/// creation and disposal into the given `log`.
fn lifecycle(log: &Log, root: ScopeNode<Diary>) -> Lifecycle<Diary> {
    let log = Arc::clone(log);
    let factory: WorldFactory<Diary> = Arc::new(
        move |scope: Option<Arc<ScopeNode<Diary>>>,
              parent: Option<SharedWorld<Diary>>| {
            let log = Arc::clone(&log);
            let name = scope.map(|s| s.name.clone()).unwrap_or_default();
            async move {
                let entry = match parent {
                    Some(p) => format!("create {name} in {}", p.lock().await.name),
                    None => format!("create {name}"),
                };
                log.lock().unwrap().push(entry);
                Ok::<_, BoxError>(Diary::named(name, log))
            }
            .boxed()
        },
    );
    let plan = ScopePlan::new(root).unwrap().with_world_factory(factory);
    Lifecycle::new(Arc::new(PlanAdapter::from(plan)), Config::default())
}

fn hook(ty: HookType, label: &'static str) -> HookDefinition<Diary> {
    HookDefinition::<Diary>::new(ty, move |ctx| {
        async move {
            let world = ctx.world.lock().await;
            world.record(format!("{label}@{}", world.name));
            Ok(())
        }
        .boxed()
    })
}

fn failing_hook(ty: HookType, msg: &'static str) -> HookDefinition<Diary> {
    HookDefinition::<Diary>::new(ty, move |ctx| {
        async move {
            let world = ctx.world.lock().await;
            world.record(format!("fail@{}", world.name));
            Err(BoxError::from(msg))
        }
        .boxed()
    })
}

fn recording_step(text: &str) -> ResolvedStep<Diary> {
    let def = Arc::new(StepDefinition::given(
        Regex::new(r"^do (\w+)$").unwrap(),
        |w: &SharedWorld<Diary>, ctx| {
            let text = ctx.matches[0].1.clone();
            async move {
                w.lock().await.record(text);
                Ok(())
            }
            .boxed()
        },
    ));
    ResolvedStep::resolve(def, "Given", text).unwrap()
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[tokio::test]
async fn scenario_hooks_run_ordered_around_steps() {
    let log = Log::default();
    let root = ScopeNode::root()
        .with_hook(hook(HookType::BeforeScenario, "root").with_order(1))
        .with_hook(hook(HookType::AfterScenario, "~root").with_order(1))
        .with_child(
            ScopeNode::feature("Diner")
                .with_hook(hook(HookType::BeforeScenario, "feature"))
                .with_hook(hook(HookType::AfterScenario, "~feature"))
                .with_child(
                    ScopeNode::scenario("order")
                        .with_hook(hook(HookType::BeforeScenario, "scenario"))
                        .with_hook(hook(HookType::AfterScenario, "~scenario"))
                        .with_step(recording_step("do eat")),
                ),
        );
    let lifecycle = lifecycle(&log, root);
    let plan = TestPlan::new(lifecycle.adapter().plan());
    let exec = plan.executions().remove(0);

    lifecycle.run_scenario(&exec).await.unwrap();
    lifecycle.teardown_all().await.unwrap();

    assert!(exec.status().is_passed());
    assert_eq!(
        entries(&log),
        [
            "create Diner",
            "create order in Diner",
            "root@order",
            "scenario@order",
            "feature@order",
            "do eat",
            "~feature@order",
            "~scenario@order",
            "~root@order",
            "dispose order",
            "dispose Diner",
        ],
    );
}

#[tokio::test]
async fn persistent_world_is_shared_and_torn_down_once() {
    let log = Log::default();
    let root = ScopeNode::root().with_child(
        ScopeNode::feature("Cafe")
            .with_hook(hook(HookType::BeforeFeature, "open"))
            .with_hook(hook(HookType::AfterFeature, "close"))
            .with_child(
                ScopeNode::scenario("a").with_step(recording_step("do a")),
            )
            .with_child(
                ScopeNode::scenario("b").with_step(recording_step("do b")),
            ),
    );
    let lifecycle = lifecycle(&log, root);
    let plan = TestPlan::new(lifecycle.adapter().plan());
    let feature = plan.features[0].scope.id;

    for exec in plan.executions() {
        lifecycle.run_scenario(&exec).await.unwrap();
    }
    assert_eq!(lifecycle.open_scopes().await, [feature]);

    lifecycle.teardown_state(feature).await.unwrap();
    lifecycle.teardown_state(feature).await.unwrap();

    assert!(lifecycle.open_scopes().await.is_empty());
    assert_eq!(
        entries(&log),
        [
            "create Cafe",
            "open@Cafe",
            "create a in Cafe",
            "do a",
            "dispose a",
            "create b in Cafe",
            "do b",
            "dispose b",
            "close@Cafe",
            "dispose Cafe",
        ],
    );
}

#[tokio::test]
async fn failing_before_hook_skips_steps_but_finishes_scenario() {
    let log = Log::default();
    let result = Arc::new(Mutex::new(None));
    let after = {
        let result = Arc::clone(&result);
        HookDefinition::<Diary>::new(HookType::AfterScenario, move |ctx| {
            *result.lock().unwrap() = ctx.meta.result.map(|r| r.to_string());
            async { Ok(()) }.boxed()
        })
    };
    let root = ScopeNode::root().with_child(
        ScopeNode::feature("Bar").with_child(
            ScopeNode::scenario("drink")
                .with_hook(failing_hook(HookType::BeforeScenario, "closed"))
                .with_hook(after)
                .with_step(recording_step("do drink")),
        ),
    );
    let lifecycle = lifecycle(&log, root);
    let plan = TestPlan::new(lifecycle.adapter().plan());
    let exec = plan.executions().remove(0);

    let err = lifecycle.run_scenario(&exec).await.unwrap_err();

    assert_eq!(err.to_string(), "closed");
    assert!(exec.status().is_failed());
    assert_eq!(result.lock().unwrap().as_deref(), Some("failed: closed"));
    assert_eq!(
        entries(&log),
        ["create Bar", "create drink in Bar", "fail@drink", "dispose drink"],
    );
}

#[tokio::test]
async fn failing_scope_hook_fails_every_nested_scenario_once() {
    let log = Log::default();
    let root = ScopeNode::root().with_child(
        ScopeNode::feature("Shop")
            .with_hook(failing_hook(HookType::BeforeFeature, "locked"))
            .with_child(
                ScopeNode::scenario("buy").with_step(recording_step("do buy")),
            )
            .with_child(
                ScopeNode::scenario("sell").with_step(recording_step("do sell")),
            ),
    );
    let lifecycle = lifecycle(&log, root);
    let plan = TestPlan::new(lifecycle.adapter().plan());

    for exec in plan.executions() {
        let err = lifecycle.run_scenario(&exec).await.unwrap_err();
        assert_eq!(err.to_string(), "locked");
        assert!(exec.status().is_failed());
    }
    lifecycle.teardown_all().await.unwrap();

    assert_eq!(entries(&log), ["create Shop", "fail@Shop", "dispose Shop"]);
}

#[tokio::test]
async fn step_hooks_see_the_step_and_its_status() {
    let log = Log::default();
    let step_hook = |ty: HookType| {
        HookDefinition::<Diary>::new(ty, |ctx| {
            async move {
                let step = ctx.meta.step.as_ref().unwrap();
                let entry = match step.status {
                    Some(status) => format!("after {} {status}", step.text),
                    None => format!("before {}", step.text),
                };
                ctx.world.lock().await.record(entry);
                Ok(())
            }
            .boxed()
        })
    };
    let later = Arc::new(StepDefinition::given(
        Regex::new("^do later$").unwrap(),
        |_: &SharedWorld<Diary>, _| {
            async { Err(step::pending("tomorrow")) }.boxed()
        },
    ));
    let root = ScopeNode::root().with_child(
        ScopeNode::feature("Office")
            .with_hook(step_hook(HookType::BeforeStep))
            .with_hook(step_hook(HookType::AfterStep))
            .with_child(
                ScopeNode::scenario("work")
                    .with_step(recording_step("do now"))
                    .with_step(
                        ResolvedStep::resolve(later, "When", "do later")
                            .unwrap(),
                    )
                    .with_step(recording_step("do never")),
            ),
    );
    let lifecycle = lifecycle(&log, root);
    let plan = TestPlan::new(lifecycle.adapter().plan());
    let exec = plan.executions().remove(0);

    lifecycle.run_scenario(&exec).await.unwrap();

    assert!(exec.status().is_pending());
    assert_eq!(
        entries(&log)[2..6],
        [
            "before do now",
            "do now",
            "after do now passed",
            "before do later",
        ],
    );
    assert_eq!(entries(&log)[6], "after do later pending");
    assert!(!entries(&log).contains(&"do never".to_owned()));
}

#[tokio::test]
async fn after_hook_and_disposal_errors_join_the_step_error() {
    let log = Log::default();
    let breaking = Arc::new(StepDefinition::then(
        Regex::new("^it bursts$").unwrap(),
        |_: &SharedWorld<Diary>, _| {
            async { Err(Signal::failed("step boom")) }.boxed()
        },
    ));
    let root = ScopeNode::root().with_child(
        ScopeNode::feature("Pipes").with_child(
            ScopeNode::scenario("leaky joint")
                .with_hook(failing_hook(HookType::AfterScenario, "after boom"))
                .with_step(
                    ResolvedStep::resolve(breaking, "Then", "it bursts").unwrap(),
                )
                .with_step(recording_step("do mop")),
        ),
    );
    let lifecycle = lifecycle(&log, root);
    let plan = TestPlan::new(lifecycle.adapter().plan());
    let exec = plan.executions().remove(0);

    let err = lifecycle.run_scenario(&exec).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Multiple errors occurred during scenario execution",
    );
    assert!(matches!(err, Error::Aggregate { phase: Phase::Scenario, .. }));
    assert_eq!(
        err.causes().iter().map(ToString::to_string).collect::<Vec<_>>(),
        ["step boom", "after boom", "leak"],
    );
    assert!(matches!(
        exec.status(),
        ScenarioStatus::Failed(e) if e.to_string() == "step boom",
    ));
    assert_eq!(
        entries(&log),
        [
            "create Pipes",
            "create leaky joint in Pipes",
            "fail@leaky joint",
            "dispose leaky joint",
        ],
    );
}

#[tokio::test]
async fn current_world_is_lockable_inside_a_scenario() {
    let log = Log::default();
    let reach = Arc::new(StepDefinition::given(
        Regex::new("^reach out$").unwrap(),
        |_: &SharedWorld<Diary>, _| {
            async move {
                let scenario = current_scenario()?;
                current_world::<Diary>()?
                    .lock()
                    .await
                    .record(format!("step in {}", scenario.qualified_name));
                Ok::<_, Signal>(())
            }
            .boxed()
        },
    ));
    let greet = HookDefinition::<Diary>::new(HookType::BeforeScenario, |_| {
        async {
            let world = current_world::<Diary>()?;
            let world = world.lock().await;
            world.record(format!("hook in {}", world.name));
            Ok::<_, BoxError>(())
        }
        .boxed()
    });
    let root = ScopeNode::root().with_child(
        ScopeNode::feature("Lab").with_child(
            ScopeNode::scenario("poke it")
                .with_hook(greet)
                .with_step(
                    ResolvedStep::resolve(reach, "Given", "reach out").unwrap(),
                ),
        ),
    );
    let lifecycle = lifecycle(&log, root);
    let plan = TestPlan::new(lifecycle.adapter().plan());
    let exec = plan.executions().remove(0);

    tokio::time::timeout(Duration::from_secs(5), lifecycle.run_scenario(&exec))
        .await
        .expect("scenario run hangs")
        .unwrap();

    assert!(exec.status().is_passed());
    assert_eq!(
        entries(&log)[2..4],
        ["hook in poke it", "step in Lab > poke it"],
    );
    assert!(matches!(current_world::<Diary>(), Err(Error::NoActiveScenario)));
    assert!(matches!(current_scenario(), Err(Error::NoActiveScenario)));
}
