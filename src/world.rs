// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`World`] trait, disposal of its resources, and the ambient current
//! [`World`] of a running scenario.

use std::{
    any::{type_name, Any},
    cell::RefCell,
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task,
};

use async_trait::async_trait;
use futures::{future::BoxFuture, lock::Mutex};
use pin_project::pin_project;

use crate::{
    error::{self, BoxError, Error, Failures, Phase},
    future::guard,
    hook::ScenarioInfo,
    scope::ScopeNode,
};

/// Represents a shared user-defined state of a scenario run.
///
/// A [`World`] of a scenario lives for a single run of it. A [`World`] of a
/// feature, a rule or a scenario outline is shared by every scenario nested
/// under it, and lives until the last of them completes.
pub trait World: Sized + Send + 'static {
    /// Error of creating a new [`World`] instance.
    type Error: Into<BoxError>;

    /// Creates a new [`World`] instance.
    fn new() -> impl Future<Output = Result<Self, Self::Error>> + Send;

    /// Returns the application under test, if it should be disposed once the
    /// [`World`] is done with.
    fn app(&mut self) -> Option<&mut dyn Dispose> {
        None
    }

    /// Returns the dependency container, if it should be disposed once the
    /// [`World`] is done with.
    ///
    /// Disposed after the [`World::app()`].
    fn container(&mut self) -> Option<&mut dyn Dispose> {
        None
    }
}

/// Resource of a [`World`] releasing something once the [`World`] is done
/// with.
#[async_trait]
pub trait Dispose: Send {
    /// Releases this resource.
    ///
    /// # Errors
    ///
    /// If this resource fails to release.
    async fn dispose(&mut self) -> Result<(), BoxError>;
}

/// [`World`] shared between the hooks and the scenarios of a scope.
///
/// Hook and step handlers receive it unlocked, and lock it for as long as
/// they access it.
pub type SharedWorld<W> = Arc<Mutex<W>>;

/// Custom constructor of [`World`]s.
///
/// Receives the scope to create a [`World`] for, and the [`World`] of its
/// nearest persistent enclosing scope, if any.
pub type WorldFactory<W> = Arc<
    dyn Fn(
            Option<Arc<ScopeNode<W>>>,
            Option<SharedWorld<W>>,
        ) -> BoxFuture<'static, Result<W, BoxError>>
        + Send
        + Sync,
>;

/// Creates a new [`World`] with the given `factory`, or with [`World::new()`]
/// if there is none.
///
/// # Errors
///
/// If the construction fails or panics.
pub async fn create_world<W: World>(
    factory: Option<&WorldFactory<W>>,
    scope: Option<Arc<ScopeNode<W>>>,
    parent: Option<SharedWorld<W>>,
) -> error::Result<W> {
    match factory {
        Some(factory) => guard(factory(scope, parent)).await,
        None => guard(W::new()).await,
    }
}

/// Disposes the [`World::app()`] and the [`World::container()`] of the given
/// `world`.
///
/// Both are attempted even if the first one fails.
///
/// # Errors
///
/// - The disposal error itself, if only one disposal fails.
/// - [`Error::Aggregate`] of [`Phase::Dispose`], if both do.
pub async fn dispose_world<W: World>(world: &mut W) -> error::Result<()> {
    let mut failures = Failures::new();
    if let Some(app) = world.app() {
        _ = failures.record(guard(app.dispose()).await);
    }
    if let Some(container) = world.container() {
        _ = failures.record(guard(container.dispose()).await);
    }
    failures.into_result(Phase::Dispose)
}

/// [`World`] and scenario of the task being polled.
#[derive(Clone)]
struct Ambient {
    scenario: ScenarioInfo,
    world: Arc<dyn Any + Send + Sync>,
}

thread_local! {
    static CURRENT: RefCell<Option<Ambient>> = const { RefCell::new(None) };
}

/// Restores the previous [`Ambient`] on drop.
struct Restore(Option<Ambient>);

impl Drop for Restore {
    fn drop(&mut self) {
        let prev = self.0.take();
        _ = CURRENT.try_with(|c| *c.borrow_mut() = prev);
    }
}

/// [`Future`] having the [`World`] of a scenario as the ambient current one
/// whenever it's polled.
#[pin_project]
pub struct WithCurrentWorld<F> {
    #[pin]
    inner: F,
    ambient: Ambient,
}

impl<F> fmt::Debug for WithCurrentWorld<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithCurrentWorld")
            .field("scenario", &self.ambient.scenario)
            .finish_non_exhaustive()
    }
}

impl<F: Future> Future for WithCurrentWorld<F> {
    type Output = F::Output;

    fn poll(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> task::Poll<Self::Output> {
        let this = self.project();
        let prev = CURRENT.with(|c| c.replace(Some(this.ambient.clone())));
        let _restore = Restore(prev);
        this.inner.poll(cx)
    }
}

/// Makes the given `world` of the given `scenario` the ambient current one
/// for the whole run of the `fut`.
pub fn with_current_world<W: World, F: Future>(
    world: &SharedWorld<W>,
    scenario: ScenarioInfo,
    fut: F,
) -> WithCurrentWorld<F> {
    let world = Arc::clone(world) as Arc<dyn Any + Send + Sync>;
    WithCurrentWorld { inner: fut, ambient: Ambient { scenario, world } }
}

/// Returns the [`World`] of the scenario running in the current task.
///
/// The engine never holds the returned [`World`] locked while a hook or a
/// step handler runs, so the handler may lock it, as long as it doesn't hold
/// another lock of it at the same time.
///
/// # Errors
///
/// - [`Error::NoActiveScenario`] if no scenario is running.
/// - [`Error::WorldMismatch`] if the running scenario's [`World`] is not a
///   `W`.
pub fn current_world<W: World>() -> error::Result<SharedWorld<W>> {
    let ambient = CURRENT
        .with(|c| c.borrow().clone())
        .ok_or(Error::NoActiveScenario)?;
    ambient
        .world
        .downcast::<Mutex<W>>()
        .map_err(|_| Error::WorldMismatch { expected: type_name::<W>() })
}

/// Returns the [`ScenarioInfo`] of the scenario running in the current task.
///
/// # Errors
///
/// [`Error::NoActiveScenario`] if no scenario is running.
pub fn current_scenario() -> error::Result<ScenarioInfo> {
    CURRENT
        .with(|c| c.borrow().as_ref().map(|a| a.scenario.clone()))
        .ok_or(Error::NoActiveScenario)
}

#[cfg(test)]
mod tests {
    use std::{
        convert::Infallible,
        io,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use futures::{executor::block_on, FutureExt as _};

    use super::*;
    use crate::scope::ExecutionId;

    struct Resource {
        disposed: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Dispose for Resource {
        async fn dispose(&mut self) -> Result<(), BoxError> {
            _ = self.disposed.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::Other, "stuck").into());
            }
            Ok(())
        }
    }

    struct Shop {
        app: Option<Resource>,
        container: Option<Resource>,
    }

    impl World for Shop {
        type Error = Infallible;

        async fn new() -> Result<Self, Infallible> {
            Ok(Self { app: None, container: None })
        }

        fn app(&mut self) -> Option<&mut dyn Dispose> {
            self.app.as_mut().map(|a| a as &mut dyn Dispose)
        }

        fn container(&mut self) -> Option<&mut dyn Dispose> {
            self.container.as_mut().map(|c| c as &mut dyn Dispose)
        }
    }

    fn shop(disposed: &Arc<AtomicUsize>, app_fails: bool, di_fails: bool) -> Shop {
        Shop {
            app: Some(Resource { disposed: Arc::clone(disposed), fail: app_fails }),
            container: Some(Resource {
                disposed: Arc::clone(disposed),
                fail: di_fails,
            }),
        }
    }

    fn info() -> ScenarioInfo {
        ScenarioInfo {
            id: ExecutionId::new(),
            name: "buy".into(),
            qualified_name: "Shop > buy".into(),
            tags: vec![],
        }
    }

    #[test]
    fn disposes_nothing_by_default() {
        let mut world = block_on(Shop::new()).unwrap();

        assert!(block_on(dispose_world(&mut world)).is_ok());
    }

    #[test]
    fn single_disposal_error_is_returned_as_is() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut world = shop(&disposed, true, false);

        let err = block_on(dispose_world(&mut world)).unwrap_err();

        assert_eq!(disposed.load(Ordering::SeqCst), 2);
        assert_eq!(err.to_string(), "stuck");
    }

    #[test]
    fn several_disposal_errors_are_aggregated() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let mut world = shop(&disposed, true, true);

        let err = block_on(dispose_world(&mut world)).unwrap_err();

        assert_eq!(disposed.load(Ordering::SeqCst), 2);
        assert!(matches!(
            err,
            Error::Aggregate { phase: Phase::Dispose, ref causes }
                if causes.len() == 2,
        ));
    }

    #[test]
    fn uses_factory_over_new() {
        let factory: WorldFactory<Shop> = Arc::new(
            |_: Option<Arc<ScopeNode<Shop>>>, parent: Option<SharedWorld<Shop>>| {
                async move {
                    assert!(parent.is_none());
                    Err::<Shop, BoxError>("no shop today".into())
                }
                .boxed()
            },
        );

        let Err(err) = block_on(create_world(Some(&factory), None, None)) else {
            panic!("factory error is not propagated");
        };
        assert_eq!(err.to_string(), "no shop today");

        assert!(block_on(create_world::<Shop>(None, None, None)).is_ok());
    }

    #[test]
    fn current_world_is_scoped_to_the_task() {
        assert!(matches!(
            current_world::<Shop>(),
            Err(Error::NoActiveScenario),
        ));

        let world = Arc::new(Mutex::new(block_on(Shop::new()).unwrap()));
        let fut = with_current_world(&world, info(), async {
            let current = current_world::<Shop>().unwrap();
            assert!(Arc::ptr_eq(&current, &world));
            assert!(current.lock().await.app.is_none());
            assert!(matches!(
                current_world::<String>(),
                Err(Error::WorldMismatch { .. }),
            ));
            assert_eq!(current_scenario().unwrap().name, "buy");
        });
        assert!(format!("{fut:?}").contains("Shop > buy"));
        block_on(fut);

        assert!(matches!(current_scenario(), Err(Error::NoActiveScenario)));
    }

    impl World for String {
        type Error = Infallible;

        async fn new() -> Result<Self, Infallible> {
            Ok(String::new())
        }
    }
}
