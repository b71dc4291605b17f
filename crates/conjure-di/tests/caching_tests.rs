//! Dependency cache and module cache behavior
//!
//! These tests verify that:
//! 1. A factory runs once per injector until its dependency is removed
//! 2. `remove` forces rediscovery and exactly one re-invocation
//! 3. Injectors sharing a `ModuleCache` share factory results, also while
//!    their resolutions overlap
//! 4. The "new dependency" event fires once per first-time creation

mod common;

use common::{LIB, as_int, counting_factory, slow_factory, test_injector};
use conjure_di::{
	Arguments, Catalog, Dependency, Factory, Injector, LocationKey, ModuleCache, Origin, Resolved,
	Target,
};
use parking_lot::Mutex;
use rstest::rstest;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn counted_injector(counter: &Arc<AtomicUsize>) -> (Catalog, Injector) {
	let catalog = Catalog::new();
	catalog.add_module(LIB, "dummyCounter", counting_factory(counter).into());
	let injector = Injector::builder().catalog(catalog.clone()).build();
	injector.add_search_path(LIB);
	(catalog, injector)
}

#[rstest]
#[tokio::test]
async fn test_factory_invoked_once_across_injections() {
	// Arrange
	let counter = Arc::new(AtomicUsize::new(0));
	let (_catalog, injector) = counted_injector(&counter);

	// Act
	let first = injector.resolve("dummyCounter").await.unwrap();
	let second = injector.resolve("dummyCounter").await.unwrap();
	let third = injector
		.inject(Target::new(["dummyCounter"], |args: Arguments| {
			args.get("dummyCounter").cloned()
		}))
		.await
		.unwrap()
		.unwrap();

	// Assert
	assert_eq!(counter.load(Ordering::SeqCst), 1);
	assert!(first.ptr_eq(&second));
	assert!(first.ptr_eq(&third));
}

#[rstest]
#[tokio::test]
async fn test_remove_reinvokes_exactly_once() {
	// Arrange
	let counter = Arc::new(AtomicUsize::new(0));
	let (_catalog, injector) = counted_injector(&counter);
	let first = injector.resolve("dummyCounter").await.unwrap();

	// Act
	let removed = injector.remove("dummyCounter").unwrap();
	let second = injector.resolve("dummyCounter").await.unwrap();
	let third = injector.resolve("dummyCounter").await.unwrap();

	// Assert
	assert_eq!(removed.location_key(), &LocationKey::local(Path::new(LIB), "dummyCounter"));
	assert_eq!(counter.load(Ordering::SeqCst), 2);
	assert_eq!(as_int(&first), 1);
	assert_eq!(as_int(&second), 2);
	assert!(second.ptr_eq(&third));
}

#[rstest]
#[tokio::test]
async fn test_shared_module_cache_invokes_once_across_injectors() {
	// Arrange
	let counter = Arc::new(AtomicUsize::new(0));
	let catalog = Catalog::new();
	catalog.add_package("eyes", counting_factory(&counter).into());
	let cache = ModuleCache::new();
	let a = Injector::builder()
		.catalog(catalog.clone())
		.module_cache(cache.clone())
		.build();
	let b = Injector::builder()
		.catalog(catalog)
		.module_cache(cache.clone())
		.build();

	// Act
	let from_a = a.resolve("eyes").await.unwrap();
	let from_b = b.resolve("eyes").await.unwrap();

	// Assert
	assert_eq!(counter.load(Ordering::SeqCst), 1);
	assert!(from_a.ptr_eq(&from_b));
	assert!(a.module_cache().ptr_eq(b.module_cache()));
	assert!(cache.contains(&LocationKey::external("eyes")));
}

#[rstest]
#[tokio::test]
async fn test_overlapping_resolutions_on_a_shared_cache_invoke_once() {
	// Arrange
	let counter = Arc::new(AtomicUsize::new(0));
	let catalog = Catalog::new();
	catalog.add_package("slow", slow_factory(&counter, Duration::from_millis(20)).into());
	let cache = ModuleCache::new();
	let a = Injector::builder()
		.catalog(catalog.clone())
		.module_cache(cache.clone())
		.build();
	let b = Injector::builder()
		.catalog(catalog)
		.module_cache(cache.clone())
		.build();

	// Act
	let (from_a, from_b) = tokio::join!(a.resolve("slow"), b.resolve("slow"));

	// Assert
	let (from_a, from_b) = (from_a.unwrap(), from_b.unwrap());
	assert_eq!(counter.load(Ordering::SeqCst), 1);
	assert!(from_a.ptr_eq(&from_b));
	assert_eq!(as_int(&from_a), 1);
	assert_eq!(b.get_dependency("slow").unwrap().origin(), Origin::External);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_overlapping_resolutions_on_one_injector_invoke_once() {
	// Arrange
	let counter = Arc::new(AtomicUsize::new(0));
	let catalog = Catalog::new();
	catalog.add_module(LIB, "dummySlow", slow_factory(&counter, Duration::from_millis(20)).into());
	let injector = common::test_injector_with(catalog);
	injector.register("dummySlowRegistered", slow_factory(&counter, Duration::from_millis(20)));

	// Act
	let tasks: Vec<_> = ["dummySlow", "dummySlow", "dummySlowRegistered", "dummySlowRegistered"]
		.into_iter()
		.map(|name| {
			let injector = injector.clone();
			tokio::spawn(async move { injector.resolve(name).await })
		})
		.collect();
	let mut values = Vec::new();
	for task in tasks {
		values.push(task.await.unwrap().unwrap());
	}

	// Assert
	assert_eq!(counter.load(Ordering::SeqCst), 2);
	assert!(values[0].ptr_eq(&values[1]));
	assert!(values[2].ptr_eq(&values[3]));
	assert!(injector.open_resolutions().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_private_module_caches_invoke_per_injector() {
	let counter = Arc::new(AtomicUsize::new(0));
	let catalog = Catalog::new();
	catalog.add_package("eyes", counting_factory(&counter).into());
	let a = Injector::builder().catalog(catalog.clone()).build();
	let b = Injector::builder().catalog(catalog).build();

	a.resolve("eyes").await.unwrap();
	b.resolve("eyes").await.unwrap();

	assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn test_registered_factory_is_materialized_lazily() {
	// Arrange
	let counter = Arc::new(AtomicUsize::new(0));
	let injector = test_injector();
	injector.register("dummyRegistered", counting_factory(&counter));
	assert_eq!(counter.load(Ordering::SeqCst), 0);

	// Act
	let first = injector.resolve("dummyRegistered").await.unwrap();
	let second = injector.resolve("dummyRegistered").await.unwrap();
	injector.remove("dummyRegistered");
	let third = injector.resolve("dummyRegistered").await.unwrap();

	// Assert
	assert!(first.ptr_eq(&second));
	assert_eq!(as_int(&third), 2);
	assert_eq!(
		injector.get_dependency("dummyRegistered").unwrap().origin(),
		Origin::ExplicitlyAdded
	);
}

#[rstest]
#[tokio::test]
async fn test_registrations_ignore_the_auto_inject_flags() {
	let injector = test_injector();
	injector.set_auto_inject_local_factories(false);
	injector.set_auto_inject_external_factories(false);
	injector.register(
		"dummyRegistered",
		Factory::new(["dummy"], |args| {
			Ok(Resolved::value(common::int(&args, "dummy") * 10))
		}),
	);

	let value = injector.resolve("dummyRegistered").await.unwrap();

	assert_eq!(as_int(&value), 20);
}

#[rstest]
#[tokio::test]
async fn test_new_dependency_event_fires_once_per_creation() {
	// Arrange
	let injector = test_injector();
	let seen = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&seen);
	injector.on_new_dependency(Some("recorder"), move |dependency: &Dependency| {
		sink.lock()
			.push((dependency.name().to_string(), dependency.origin()));
	});

	// Act
	injector.resolve("dummy2").await.unwrap();
	injector.resolve("dummy2").await.unwrap();
	injector.resolve("dummyMissing_").await.unwrap();
	injector.add(Dependency::new("foo", Resolved::value(1i32)));

	// Assert
	assert_eq!(
		*seen.lock(),
		vec![
			("dummy".to_string(), Origin::Local),
			("dummy2".to_string(), Origin::Local),
			("foo".to_string(), Origin::ExplicitlyAdded),
		]
	);
}

#[rstest]
#[tokio::test]
async fn test_disconnected_handlers_are_not_called() {
	let injector = test_injector();
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&calls);
	injector.on_new_dependency(Some("counter"), move |_| {
		counter.fetch_add(1, Ordering::SeqCst);
	});

	assert!(injector.disconnect(Some("counter")));
	injector.resolve("dummy").await.unwrap();

	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn test_absent_optional_results_are_not_cached() {
	// Arrange
	let catalog = Catalog::new();
	let injector = Injector::builder().catalog(catalog.clone()).build();
	injector.add_search_path(LIB);
	let before = injector.resolve("dummyLate_").await.unwrap();

	// Act
	catalog.add_module(LIB, "dummyLate", Resolved::value(5i32));
	let after = injector.resolve("dummyLate_").await.unwrap();

	// Assert
	assert!(before.is_absent());
	assert_eq!(as_int(&after), 5);
}
