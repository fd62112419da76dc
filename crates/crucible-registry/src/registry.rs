//! The core name-to-factory registry.
//!
//! A [`Registry`] is created once per component domain and lives for the
//! process. Layers share the same instance by reference: a lower layer
//! creates the registry and a higher layer extends it, either eagerly or
//! through a deferred loader that only runs when a name is first resolved.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{BoxError, RegistryError};
use crate::source::FactorySource;

/// Type alias for component factory functions.
///
/// A factory receives its keyword arguments as a TOML table and either
/// builds a component or fails with its own error type, which the registry
/// passes through untouched.
pub type Factory<C> = fn(&toml::Value) -> Result<C, BoxError>;

/// A deferred population function registered via [`Registry::late_add`].
///
/// Loaders receive a registration view of the registry they were added to
/// and are expected to add entries through it. They run at most once each,
/// in insertion order, the first time a lookup or enumeration needs them.
type Loader<C> = Box<dyn Fn(&mut Entries<'_, C>) -> Result<(), BoxError> + Send>;

struct State<C> {
	entries: HashMap<String, Factory<C>>,
	pending: VecDeque<Loader<C>>,
}

/// A name-keyed factory registry for one component domain.
///
/// All state sits behind a single mutex so that running pending loaders and
/// reading the resulting entries form one critical section: concurrent
/// lookups never observe a partially populated registry and no loader runs
/// twice. The lock is held only for the duration of loader execution plus
/// the map access, never across construction of the resolved component's
/// dependencies.
pub struct Registry<C> {
	domain: &'static str,
	state: Mutex<State<C>>,
}

impl<C> Registry<C> {
	/// Creates an empty registry for the given domain label.
	///
	/// The label is used only for diagnostics (error messages and log
	/// lines).
	pub fn new(domain: &'static str) -> Self {
		Self {
			domain,
			state: Mutex::new(State {
				entries: HashMap::new(),
				pending: VecDeque::new(),
			}),
		}
	}

	/// Returns the human-readable domain label.
	pub fn domain(&self) -> &'static str {
		self.domain
	}

	/// Registers a single factory under the given name and returns the
	/// factory unchanged, so registration composes with passing the factory
	/// on to other wiring code.
	///
	/// Registering the identical factory under the same name is an
	/// idempotent no-op; a different factory under an existing name fails
	/// with [`RegistryError::NameConflict`].
	pub fn add(&self, name: &str, factory: Factory<C>) -> Result<Factory<C>, RegistryError> {
		let mut state = self.lock();
		insert(self.domain, &mut state.entries, name, factory)
	}

	/// Registers a [`FactorySource`] under the name the source declares for
	/// itself.
	pub fn add_source<S>(&self) -> Result<Factory<C>, RegistryError>
	where
		S: FactorySource<Component = C>,
	{
		self.add(S::NAME, S::factory())
	}

	/// Eagerly registers every candidate in an explicitly supplied,
	/// ordered collection of `(name, factory)` pairs.
	///
	/// The producer of the collection decides what is a registrable
	/// candidate; abstract marker types are simply left off the list. Each
	/// entry follows the same conflict rule as [`Registry::add`].
	pub fn add_from_module<I>(&self, candidates: I) -> Result<(), RegistryError>
	where
		I: IntoIterator<Item = (&'static str, Factory<C>)>,
	{
		let mut state = self.lock();
		for (name, factory) in candidates {
			insert(self.domain, &mut state.entries, name, factory)?;
		}
		Ok(())
	}

	/// Appends a deferred loader without invoking it.
	///
	/// Multiple layers may call this on the same instance; loaders run in
	/// the order added, each at most once, the first time [`Registry::get`]
	/// or [`Registry::all_keys`] needs them.
	pub fn late_add<L>(&self, loader: L)
	where
		L: Fn(&mut Entries<'_, C>) -> Result<(), BoxError> + Send + 'static,
	{
		let mut state = self.lock();
		state.pending.push_back(Box::new(loader));
	}

	/// Resolves a name to its registered factory, first running any pending
	/// loaders.
	pub fn get(&self, name: &str) -> Result<Factory<C>, RegistryError> {
		let mut state = self.lock();
		self.force(&mut state)?;
		match state.entries.get(name) {
			Some(factory) => Ok(*factory),
			None => {
				let mut available: Vec<&str> =
					state.entries.keys().map(String::as_str).collect();
				available.sort_unstable();
				Err(RegistryError::NotFound {
					domain: self.domain.to_string(),
					name: name.to_string(),
					available: available.join(", "),
				})
			}
		}
	}

	/// Resolves a name and constructs a component from the given parameter
	/// table.
	///
	/// Equivalent to calling the factory returned by [`Registry::get`]
	/// directly: construction errors pass through unmodified.
	pub fn get_instance(&self, name: &str, params: &toml::Value) -> Result<C, RegistryError> {
		let factory = self.get(name)?;
		factory(params).map_err(RegistryError::Construction)
	}

	/// Returns the sorted list of all registered names, first running any
	/// pending loaders.
	pub fn all_keys(&self) -> Result<Vec<String>, RegistryError> {
		let mut state = self.lock();
		self.force(&mut state)?;
		let mut keys: Vec<String> = state.entries.keys().cloned().collect();
		keys.sort_unstable();
		Ok(keys)
	}

	/// Runs pending loaders in insertion order.
	///
	/// A loader is removed from the queue only after it returns success, so
	/// a failing loader stays pending and is retried by the next resolution.
	/// Idempotent re-registration keeps a retried loader from introducing
	/// duplicates for entries it already applied before failing.
	fn force(&self, state: &mut State<C>) -> Result<(), RegistryError> {
		while !state.pending.is_empty() {
			let State { entries, pending } = state;
			let loader = &pending[0];
			let mut scope = Entries {
				domain: self.domain,
				entries,
			};
			if let Err(err) = loader(&mut scope) {
				return Err(match err.downcast::<RegistryError>() {
					Ok(registry_err) => *registry_err,
					Err(other) => RegistryError::Loader {
						domain: self.domain.to_string(),
						source: other,
					},
				});
			}
			pending.pop_front();
		}
		Ok(())
	}

	fn lock(&self) -> MutexGuard<'_, State<C>> {
		// A panicking loader poisons the mutex but leaves the maps
		// structurally intact; recover the guard instead of propagating the
		// poison to every later lookup.
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

impl<C> std::fmt::Debug for Registry<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.lock();
		f.debug_struct("Registry")
			.field("domain", &self.domain)
			.field("entries", &state.entries.len())
			.field("pending", &state.pending.len())
			.finish()
	}
}

/// Registration view handed to deferred loaders.
///
/// Exposes the same registration surface as [`Registry`] while the
/// registry's lock is already held, so loaders can populate the instance
/// they were added to without re-entering it.
pub struct Entries<'a, C> {
	domain: &'static str,
	entries: &'a mut HashMap<String, Factory<C>>,
}

impl<C> Entries<'_, C> {
	/// Registers a single factory; same semantics as [`Registry::add`].
	pub fn add(&mut self, name: &str, factory: Factory<C>) -> Result<Factory<C>, RegistryError> {
		insert(self.domain, self.entries, name, factory)
	}

	/// Registers a [`FactorySource`]; same semantics as
	/// [`Registry::add_source`].
	pub fn add_source<S>(&mut self) -> Result<Factory<C>, RegistryError>
	where
		S: FactorySource<Component = C>,
	{
		self.add(S::NAME, S::factory())
	}

	/// Bulk-registers candidates; same semantics as
	/// [`Registry::add_from_module`].
	pub fn add_from_module<I>(&mut self, candidates: I) -> Result<(), RegistryError>
	where
		I: IntoIterator<Item = (&'static str, Factory<C>)>,
	{
		for (name, factory) in candidates {
			insert(self.domain, self.entries, name, factory)?;
		}
		Ok(())
	}
}

fn insert<C>(
	domain: &'static str,
	entries: &mut HashMap<String, Factory<C>>,
	name: &str,
	factory: Factory<C>,
) -> Result<Factory<C>, RegistryError> {
	match entries.get(name) {
		Some(existing) if std::ptr::fn_addr_eq(*existing, factory) => Ok(factory),
		Some(_) => Err(RegistryError::NameConflict {
			domain: domain.to_string(),
			name: name.to_string(),
		}),
		None => {
			tracing::debug!("Registering {} implementation: {}", domain, name);
			entries.insert(name.to_string(), factory);
			Ok(factory)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	#[derive(Debug, PartialEq)]
	struct Widget {
		gain: f64,
	}

	fn make_widget(params: &toml::Value) -> Result<Widget, BoxError> {
		let gain = params
			.get("gain")
			.and_then(toml::Value::as_float)
			.unwrap_or(1.0);
		Ok(Widget { gain })
	}

	fn make_other_widget(_params: &toml::Value) -> Result<Widget, BoxError> {
		Ok(Widget { gain: -1.0 })
	}

	#[derive(Debug, thiserror::Error)]
	#[error("widget exploded")]
	struct Exploded;

	fn broken_widget(_params: &toml::Value) -> Result<Widget, BoxError> {
		Err(Exploded.into())
	}

	fn empty_params() -> toml::Value {
		toml::Value::Table(toml::map::Map::new())
	}

	#[test]
	fn add_then_get_returns_same_factory() {
		let registry = Registry::<Widget>::new("widget");
		registry.add("widget", make_widget).unwrap();

		let factory = registry.get("widget").unwrap();
		assert!(std::ptr::fn_addr_eq(
			factory,
			make_widget as Factory<Widget>
		));
	}

	#[test]
	fn add_returns_factory_unchanged() {
		let registry = Registry::<Widget>::new("widget");
		let returned = registry.add("widget", make_widget).unwrap();
		assert!(std::ptr::fn_addr_eq(
			returned,
			make_widget as Factory<Widget>
		));
	}

	#[test]
	fn reregistering_same_factory_is_idempotent() {
		let registry = Registry::<Widget>::new("widget");
		registry.add("widget", make_widget).unwrap();
		registry.add("widget", make_widget).unwrap();
		assert_eq!(registry.all_keys().unwrap(), vec!["widget"]);
	}

	#[test]
	fn reregistering_different_factory_conflicts() {
		let registry = Registry::<Widget>::new("widget");
		registry.add("widget", make_widget).unwrap();

		let err = registry.add("widget", make_other_widget).unwrap_err();
		assert!(matches!(err, RegistryError::NameConflict { .. }));
		assert_eq!(
			err.to_string(),
			"widget 'widget' is already registered to a different factory"
		);
	}

	#[test]
	fn get_missing_name_reports_available() {
		let registry = Registry::<Widget>::new("widget");
		registry.add("a", make_widget).unwrap();
		registry.add("b", make_other_widget).unwrap();

		let err = registry.get("missing").unwrap_err();
		assert!(matches!(err, RegistryError::NotFound { .. }));
		assert_eq!(
			err.to_string(),
			"unknown widget implementation 'missing'. Available: [a, b]"
		);
	}

	#[test]
	fn get_on_empty_registry_is_not_found() {
		let registry = Registry::<Widget>::new("widget");
		let err = registry.get("missing").unwrap_err();
		assert!(matches!(err, RegistryError::NotFound { .. }));
	}

	#[test]
	fn get_instance_constructs_from_params() {
		let registry = Registry::<Widget>::new("widget");
		registry.add("widget", make_widget).unwrap();

		let params: toml::Value = toml::from_str("gain = 2.5").unwrap();
		let widget = registry.get_instance("widget", &params).unwrap();
		assert_eq!(widget, Widget { gain: 2.5 });
	}

	#[test]
	fn get_instance_passes_construction_errors_through() {
		let registry = Registry::<Widget>::new("widget");
		registry.add("broken", broken_widget).unwrap();

		let err = registry.get_instance("broken", &empty_params()).unwrap_err();
		match err {
			RegistryError::Construction(inner) => {
				assert_eq!(inner.to_string(), "widget exploded");
				assert!(inner.downcast_ref::<Exploded>().is_some());
			}
			other => panic!("expected construction error, got {other:?}"),
		}
	}

	#[test]
	fn add_from_module_registers_all_candidates() {
		let registry = Registry::<Widget>::new("widget");
		registry
			.add_from_module([
				("A", make_widget as Factory<Widget>),
				("B", make_other_widget as Factory<Widget>),
			])
			.unwrap();

		assert_eq!(registry.all_keys().unwrap(), vec!["A", "B"]);
		let widget = registry.get_instance("A", &empty_params()).unwrap();
		assert_eq!(widget, Widget { gain: 1.0 });
	}

	#[test]
	fn late_add_never_runs_at_registration_time() {
		let registry = Registry::<Widget>::new("widget");
		let calls = Arc::new(AtomicUsize::new(0));

		let seen = calls.clone();
		registry.late_add(move |entries| {
			seen.fetch_add(1, Ordering::SeqCst);
			entries.add("late", make_widget)?;
			Ok(())
		});
		assert_eq!(calls.load(Ordering::SeqCst), 0);

		registry.get("late").unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 1);

		// Already-run loaders never run again.
		registry.get("late").unwrap();
		registry.all_keys().unwrap();
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn loaders_run_in_insertion_order_exactly_once() {
		let registry = Registry::<Widget>::new("widget");
		let order = Arc::new(Mutex::new(Vec::new()));

		let first = order.clone();
		registry.late_add(move |entries| {
			first.lock().unwrap().push(1);
			entries.add("first", make_widget)?;
			Ok(())
		});
		let second = order.clone();
		registry.late_add(move |entries| {
			second.lock().unwrap().push(2);
			entries.add("second", make_other_widget)?;
			Ok(())
		});

		assert!(order.lock().unwrap().is_empty());
		registry.all_keys().unwrap();
		registry.get("first").unwrap();
		assert_eq!(*order.lock().unwrap(), vec![1, 2]);
	}

	#[test]
	fn loaders_compose_across_layers() {
		// Layer 1 owns the registry and defers its own candidates; layer 2
		// holds a reference to the same instance and defers different ones.
		let registry = Arc::new(Registry::<Widget>::new("callback"));

		registry.late_add(|entries| {
			entries.add("CoreCB", make_widget)?;
			Ok(())
		});

		let shared = registry.clone();
		shared.late_add(|entries| {
			entries.add("ExtraCB", make_other_widget)?;
			Ok(())
		});

		// Resolving a layer-2 name runs the layer-1 loader first.
		registry.get("ExtraCB").unwrap();
		assert_eq!(registry.all_keys().unwrap(), vec!["CoreCB", "ExtraCB"]);
	}

	#[test]
	fn failing_loader_stays_pending_and_retries_without_duplicates() {
		let registry = Registry::<Widget>::new("widget");
		let attempts = Arc::new(AtomicUsize::new(0));

		let seen = attempts.clone();
		registry.late_add(move |entries| {
			// Partially applies on every attempt, fails the first time.
			entries.add("partial", make_widget)?;
			if seen.fetch_add(1, Ordering::SeqCst) == 0 {
				return Err(Exploded.into());
			}
			entries.add("rest", make_other_widget)?;
			Ok(())
		});

		let err = registry.get("partial").unwrap_err();
		assert!(matches!(err, RegistryError::Loader { .. }));
		assert!(err
			.to_string()
			.starts_with("deferred loader for the widget registry failed"));

		// Retry succeeds; idempotent re-registration of "partial" means the
		// partial first application left no conflict behind.
		assert_eq!(registry.all_keys().unwrap(), vec!["partial", "rest"]);
		assert_eq!(attempts.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn loader_registry_errors_propagate_unwrapped() {
		let registry = Registry::<Widget>::new("widget");
		registry.add("taken", make_widget).unwrap();
		registry.late_add(|entries| {
			entries.add("taken", make_other_widget)?;
			Ok(())
		});

		let err = registry.all_keys().unwrap_err();
		assert!(matches!(err, RegistryError::NameConflict { .. }));
	}

	#[test]
	fn add_source_registers_under_declared_name() {
		struct Source;
		impl FactorySource for Source {
			const NAME: &'static str = "declared";
			type Component = Widget;
			fn factory() -> Factory<Widget> {
				make_widget
			}
		}

		let registry = Registry::<Widget>::new("widget");
		registry.add_source::<Source>().unwrap();
		assert_eq!(registry.all_keys().unwrap(), vec!["declared"]);
	}
}
