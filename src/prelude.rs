//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Core traits
pub use crate::disposable::{Cancelable, Disposable};
pub use crate::observable::{ConnectableObservableType, ObservableType};
pub use crate::observer::Observer;
pub use crate::scheduler::{Scheduler, SchedulerExt, TimedScheduler, TimedSchedulerExt};
pub use crate::subject::Subject;
// Observables
pub use crate::observable::{ConnectableObservable, Observable, RangeInteger};
pub use crate::ops::SubjectLifetimeScope;
// Observers
pub use crate::observer::{AnonymousObserver, AnyObserver, Binder};
// Disposables
pub use crate::disposable::{
  AnonymousDisposable, AnyDisposable, BinaryDisposable, CancelToken, CompositeDisposable,
  DisposeBag, DisposeGuard, DisposeKey, SerialDisposable, SingleAssignmentDisposable,
};
// Schedulers
pub use crate::scheduler::{
  CurrentThreadScheduler, ImmediateScheduler, MainLoop, MainScheduler, RecursiveScheduler,
  TestScheduler, Trampoline,
};
#[cfg(all(feature = "futures-scheduler", feature = "timer"))]
pub use crate::scheduler::{ConcurrentQueueScheduler, SerialQueueScheduler};
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
// Subjects
pub use crate::subject::{AsyncSubject, BehaviorSubject, PublishSubject, ReplaySubject};
// Events, errors & configuration
pub use crate::{config::QueueConfig, error::RxError, event::Event};
