//! Shared fixtures: a catalog of test modules under `test/lib`, plus a few
//! packages.
#![allow(dead_code)]

use conjure_di::{Arguments, Catalog, DiError, Factory, Injector, Resolved};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const LIB: &str = "test/lib";

pub fn int(args: &Arguments, name: &str) -> i32 {
	*args
		.value::<i32>(name)
		.unwrap_or_else(|| panic!("argument '{name}' is not an i32"))
}

pub fn as_int(value: &Resolved) -> i32 {
	*value.downcast_ref::<i32>().expect("value is not an i32")
}

fn module(catalog: &Catalog, name: &str, resource: impl Into<Resolved>) {
	catalog.add_module(PathBuf::from(LIB), name, resource.into());
}

/// Catalog mirroring the test library modules.
pub fn test_catalog() -> Catalog {
	let catalog = Catalog::new();

	module(&catalog, "dummy", Resolved::value(2i32));
	module(
		&catalog,
		"dummy2",
		Factory::new(["dummy"], |args| Ok(Resolved::value(int(&args, "dummy") - 1))),
	);
	module(
		&catalog,
		"dummyCallbackSync",
		Factory::new(["callback"], |args| {
			let callback = args.callback().expect("callback");
			callback.ok(Resolved::value(3i32));
			Ok(Resolved::Absent)
		}),
	);
	module(
		&catalog,
		"dummyCallbackAsync",
		Factory::new(["callback"], |args| {
			let callback = args.callback().expect("callback");
			tokio::spawn(async move {
				tokio::task::yield_now().await;
				callback.ok(Resolved::value(4i32));
			});
			Ok(Resolved::Absent)
		}),
	);
	module(
		&catalog,
		"dummyCallbackSyncParams",
		Factory::new(["dummy", "callback"], |args| {
			let value = int(&args, "dummy") + 7;
			args.callback().expect("callback").ok(Resolved::value(value));
			Ok(Resolved::Absent)
		}),
	);
	module(
		&catalog,
		"dummyCallbackAsyncParams",
		Factory::new(["dummy", "dummy2", "callback"], |args| {
			let value = int(&args, "dummy") + int(&args, "dummy2") + 7;
			let callback = args.callback().expect("callback");
			tokio::spawn(async move {
				callback.ok(Resolved::value(value));
			});
			Ok(Resolved::Absent)
		}),
	);
	module(
		&catalog,
		"dummyHierarchy",
		Factory::new(["dummyCallbackSync", "dummyCallbackAsync"], |args| {
			Ok(Resolved::value(
				int(&args, "dummyCallbackSync") + int(&args, "dummyCallbackAsync"),
			))
		}),
	);
	module(
		&catalog,
		"dummyNoReturn",
		Factory::new(Vec::<String>::new(), |_| Ok(Resolved::Absent)),
	);
	module(
		&catalog,
		"dummyDoNotInject",
		Factory::new(Vec::<String>::new(), |_| Ok(Resolved::value(123i32))).do_not_inject(),
	);
	module(
		&catalog,
		"dummyAlwaysInject",
		Factory::new(Vec::<String>::new(), |_| Ok(Resolved::value(456i32))).always_inject(),
	);
	module(
		&catalog,
		"dummyFailing",
		Factory::new(["callback"], |args| {
			args.callback().expect("callback").err("disk on fire");
			Ok(Resolved::Absent)
		}),
	);
	module(
		&catalog,
		"dummyFailingBody",
		Factory::new(Vec::<String>::new(), |_| Err(DiError::custom("no luck"))),
	);

	module(
		&catalog,
		"dummyCircular",
		Factory::new(["dummyCircular"], |_| Ok(Resolved::Absent)),
	);
	module(
		&catalog,
		"dummyCircularX",
		Factory::new(["dummyCircularY"], |_| Ok(Resolved::Absent)),
	);
	module(
		&catalog,
		"dummyCircularY",
		Factory::new(["dummyCircularZ"], |_| Ok(Resolved::Absent)),
	);
	module(
		&catalog,
		"dummyCircularZ",
		Factory::new(["dummyCircularX"], |_| Ok(Resolved::Absent)),
	);
	module(
		&catalog,
		"dummyCircularAsync",
		Factory::new(["dummyCircularAsyncHop", "callback"], |args| {
			args.callback().expect("callback").ok(Resolved::Absent);
			Ok(Resolved::Absent)
		}),
	);
	module(
		&catalog,
		"dummyCircularAsyncHop",
		Factory::new(["dummyCircularAsync"], |_| Ok(Resolved::Absent)),
	);
	module(
		&catalog,
		"dummySelfReentry",
		Factory::new(["$injector", "callback"], |args| {
			let injector = args.injector().expect("injector").clone();
			let callback = args.callback().expect("callback");
			tokio::spawn(async move {
				let result = injector.resolve("dummySelfReentry").await;
				callback.complete(result);
			});
			Ok(Resolved::Absent)
		}),
	);

	module(
		&catalog,
		"dummyClass",
		Factory::new(["greeting"], |args| {
			let greeting = args.value::<String>("greeting").cloned().unwrap_or_default();
			Ok(Resolved::value(format!("{greeting}, world")))
		})
		.do_not_inject(),
	);

	catalog.add_package("eyes", Resolved::value("eyes"));
	catalog.add_package(
		"find-port",
		Factory::new(Vec::<String>::new(), |_| Ok(Resolved::value(8080u16))).into(),
	);

	catalog
}

/// Injector over [`test_catalog`] with `test/lib` on its search paths.
pub fn test_injector() -> Injector {
	test_injector_with(test_catalog())
}

pub fn test_injector_with(catalog: Catalog) -> Injector {
	let injector = Injector::builder().catalog(catalog).build();
	injector.add_search_path(LIB);
	injector
}

/// A parameterless factory counting its invocations.
pub fn counting_factory(counter: &Arc<AtomicUsize>) -> Factory {
	let counter = Arc::clone(counter);
	Factory::new(Vec::<String>::new(), move |_| {
		let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
		Ok(Resolved::value(count as i32))
	})
}

/// A callback-style factory that counts its invocations and completes after
/// `delay` on another task.
pub fn slow_factory(counter: &Arc<AtomicUsize>, delay: Duration) -> Factory {
	let counter = Arc::clone(counter);
	Factory::new(["callback"], move |args| {
		let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
		let callback = args.callback().expect("callback");
		tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			callback.ok(Resolved::value(count as i32));
		});
		Ok(Resolved::Absent)
	})
}
