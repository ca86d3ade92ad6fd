//! The settings store.
//!
//! [`Settings`] owns the in-memory [`Store`], the defaults table and the
//! override table behind a single lock. Every public operation, and every
//! background backup rotation, runs while holding that lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backup::{BackupManager, BackupWorker};
use crate::codec;
use crate::config::SettingsConfig;
use crate::diagnostics::DiagnosticLog;
use crate::error::{Result, SettingsError};
use crate::files;
use crate::layout::Layout;
use crate::logging::{debug, error, info, trace, warn};
use crate::overrides::{EnvProperties, Overrides, PropertySource};
use crate::recovery::{self, LoadOutcome};
use crate::store::Store;
use crate::value::{Value, ValueKind};

/// Callback receiving the first load or save failure.
pub type ErrorHandler = Arc<dyn Fn(&SettingsError) + Send + Sync>;

/// A sibling persistence step run alongside the settings file, such as
/// key bindings. Loaded after the values and saved before them.
pub trait BindingStore: Send {
    fn load(&mut self) -> Result<()>;
    fn save(&mut self) -> Result<()>;
}

struct State {
    store: Store,
    defaults: HashMap<String, Value>,
    overrides: Overrides,
    loaded: bool,
    autosave: bool,
    has_errored: bool,
    error_handler: Option<ErrorHandler>,
    bindings: Option<Box<dyn BindingStore>>,
}

impl State {
    fn lookup(&self, key: &str) -> Option<&Value> {
        self.overrides.get(key).or_else(|| self.store.get(key))
    }

    /// Look up `key` as a value of `kind`. Overrides are strings and are
    /// parsed into the requested kind.
    fn typed(&self, key: &str, kind: ValueKind) -> Result<Option<Value>> {
        if let Some(raw) = self.overrides.get(key).and_then(Value::as_str) {
            return Value::parse(kind, raw)
                .map(Some)
                .map_err(|e| e.for_key(key));
        }

        match self.store.get(key) {
            None => Ok(None),
            Some(value) if value.kind() == kind => Ok(Some(value.clone())),
            Some(value) => Err(SettingsError::InvalidValueType {
                key: Some(key.to_string()),
                expected: kind.to_string(),
                found: value.kind().to_string(),
            }),
        }
    }
}

/// A persistent settings table.
///
/// # Example
///
/// ```ignore
/// use settings_store::prelude::*;
///
/// let settings = Settings::builder().data_dir("/tmp/my-game").build()?;
/// settings.load()?;
///
/// settings.put("volume", 0.8f32);
/// assert_eq!(settings.get_float_or("volume", 0.0), 0.8);
/// settings.save()?;
/// ```
pub struct Settings {
    state: Arc<Mutex<State>>,
    layout: Layout,
    log: DiagnosticLog,
    backups: BackupManager,
    properties: Box<dyn PropertySource>,
    override_property: String,
}

impl Settings {
    /// Create a store from `config`, reading overrides from the environment.
    pub fn new(config: SettingsConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn data_dir(&self) -> &Path {
        self.layout.data_dir()
    }

    pub(crate) fn diagnostics(&self) -> &DiagnosticLog {
        &self.log
    }

    /// Load values, falling back to backups when the settings file is
    /// unreadable, then rebuild the override table and load key bindings.
    ///
    /// The store counts as loaded afterwards even when nothing could be read.
    pub fn load(&self) -> Result<()> {
        let result = {
            let mut state = self.lock();
            let result = self.load_locked(&mut state);
            state.loaded = true;
            result
        };

        if let Err(e) = &result {
            self.log.write(format!("Error in load: {}", e));
        }
        self.report(result)
    }

    fn load_locked(&self, state: &mut State) -> Result<()> {
        let values = match recovery::load(&self.layout, &self.log) {
            LoadOutcome::FreshInstall => Ok(()),
            LoadOutcome::Primary(store) => {
                info!(entries = store.len(), "loaded settings");
                state.store.adopt(store);
                Ok(())
            }
            LoadOutcome::Recovered { store, from: _from } => {
                info!(entries = store.len(), from = %_from.display(), "loaded settings from backup");
                state.store.adopt(store);
                Ok(())
            }
            LoadOutcome::Exhausted { attempts } => {
                state.store.adopt(Store::new());
                Err(SettingsError::RecoveryExhausted { attempts })
            }
        };

        state.overrides = Overrides::from_source(self.properties.as_ref(), &self.override_property);
        if !state.overrides.is_empty() {
            debug!(count = state.overrides.len(), "loaded override values");
        }

        let bindings = match state.bindings.as_mut() {
            Some(bindings) => bindings.load(),
            None => Ok(()),
        };

        values.and(bindings)
    }

    /// Write all values to the settings file and queue a backup rotation.
    ///
    /// Does nothing if the store has never been loaded. The rotation runs on
    /// the backup worker after this returns; see [`Settings::flush_backups`].
    ///
    /// Saving an empty store writes a file with an entry count of zero, which
    /// the loader treats as corrupt. The next [`Settings::load`] then restores
    /// the newest backup that still holds values.
    pub fn save(&self) -> Result<()> {
        let result = {
            let mut state = self.lock();
            if !state.loaded {
                trace!("save before load ignored");
                return Ok(());
            }
            let result = self.save_locked(&mut state);
            state.store.mark_saved();
            result
        };

        if let Err(e) = &result {
            self.log.write(format!(
                "Error in save to {}: {}",
                self.layout.primary().display(),
                e
            ));
        }
        self.report(result)
    }

    fn save_locked(&self, state: &mut State) -> Result<()> {
        if let Some(bindings) = state.bindings.as_mut() {
            bindings.save()?;
        }

        let bytes = codec::encode(&state.store).map_err(SettingsError::Encode)?;
        let primary = self.layout.primary();

        // The new content only replaces the primary once fully written and
        // synced; a failed write removes its temporary file.
        files::write_atomic(&primary, &bytes)?;

        self.log.write(format!(
            "Saving {} values; {} bytes",
            state.store.len(),
            bytes.len()
        ));
        debug!(entries = state.store.len(), bytes = bytes.len(), "saved settings");

        self.backups.enqueue(Arc::clone(&self.state));
        Ok(())
    }

    /// Save only if there are unsaved changes and autosave is enabled.
    pub fn autosave(&self) -> Result<()> {
        let pending = {
            let state = self.lock();
            state.store.is_modified() && state.autosave
        };
        if pending { self.save() } else { Ok(()) }
    }

    pub fn set_autosave(&self, autosave: bool) {
        self.lock().autosave = autosave;
    }

    /// Block until all queued backup rotations have finished.
    pub fn flush_backups(&self) {
        self.backups.worker().flush();
    }

    /// Files in the backup history, newest first.
    pub fn backup_files(&self) -> Result<Vec<PathBuf>> {
        let _state = self.lock();
        files::files_newest_first(&self.layout.backup_dir())
    }

    /// Deliver a load/save failure to the error handler, or return it when no
    /// handler is registered. Only the first failure reaches the handler.
    fn report(&self, result: Result<()>) -> Result<()> {
        let Err(err) = result else {
            return Ok(());
        };

        let handler = {
            let mut state = self.lock();
            let Some(handler) = state.error_handler.clone() else {
                error!(error = %err, "settings operation failed");
                return Err(err);
            };
            let first = !state.has_errored;
            state.has_errored = true;
            first.then_some(handler)
        };

        match handler {
            Some(handler) => handler(&err),
            None => {
                debug!(error = %err, "suppressed repeated settings error");
            }
        }
        Ok(())
    }

    pub fn set_error_handler(&self, handler: impl Fn(&SettingsError) + Send + Sync + 'static) {
        self.lock().error_handler = Some(Arc::new(handler));
    }

    pub fn set_bindings(&self, bindings: impl BindingStore + 'static) {
        self.lock().bindings = Some(Box::new(bindings));
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().loaded
    }

    /// Whether there are changes not yet written by [`Settings::save`].
    pub fn is_modified(&self) -> bool {
        self.lock().store.is_modified()
    }

    /// The override value if present, otherwise the stored value.
    pub fn get(&self, key: &str) -> Option<Value> {
        let state = self.lock();
        if !state.loaded {
            trace!(key, "settings read before load");
        }
        state.lookup(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.get(key).unwrap_or_else(|| default.into())
    }

    /// Look up `key` as a value of `kind`, failing with
    /// [`SettingsError::InvalidValueType`] if it holds another kind.
    pub fn try_get(&self, key: &str, kind: ValueKind) -> Result<Option<Value>> {
        self.lock().typed(key, kind)
    }

    pub fn has(&self, key: &str) -> bool {
        let state = self.lock();
        state.store.contains_key(key) || state.overrides.contains_key(key)
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().store.insert(key, value);
    }

    pub fn put_all<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut state = self.lock();
        for (key, value) in entries {
            state.store.insert(key, value);
        }
    }

    pub fn remove(&self, key: &str) {
        self.lock().store.remove(key);
    }

    /// Remove every stored value. Defaults and overrides are kept.
    ///
    /// An empty store does not survive a restart: see [`Settings::save`].
    pub fn clear(&self) {
        self.lock().store.clear();
    }

    /// Stored keys, sorted. Overrides are not included.
    pub fn keys(&self) -> Vec<String> {
        let state = self.lock();
        let mut keys: Vec<String> = state.store.keys().map(str::to_string).collect();
        keys.sort();
        keys
    }

    /// Number of stored values. Overrides are not counted.
    pub fn key_size(&self) -> usize {
        self.lock().store.len()
    }

    /// Register a fallback used by typed getters called without a default.
    pub fn set_default(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().defaults.insert(key.into(), value.into());
    }

    pub fn defaults<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut state = self.lock();
        for (key, value) in entries {
            state.defaults.insert(key.into(), value.into());
        }
    }

    pub fn default_value(&self, key: &str) -> Option<Value> {
        self.lock().defaults.get(key).cloned()
    }

    fn read<T>(
        &self,
        key: &str,
        kind: ValueKind,
        default: Option<T>,
        extract: impl Fn(Value) -> Option<T>,
    ) -> Option<T> {
        let state = self.lock();
        let default = default.or_else(|| state.defaults.get(key).cloned().and_then(&extract));

        match state.typed(key, kind) {
            Ok(Some(value)) => extract(value).or(default),
            Ok(None) => default,
            Err(_e) => {
                warn!(error = %_e, "using default for mistyped setting");
                default
            }
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.read(key, ValueKind::Bool, None, |v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.read(key, ValueKind::Bool, Some(default), |v| v.as_bool())
            .unwrap_or(default)
    }

    pub fn get_int(&self, key: &str) -> i32 {
        self.read(key, ValueKind::Int, None, |v| v.as_int())
            .unwrap_or(0)
    }

    pub fn get_int_or(&self, key: &str, default: i32) -> i32 {
        self.read(key, ValueKind::Int, Some(default), |v| v.as_int())
            .unwrap_or(default)
    }

    pub fn get_long(&self, key: &str) -> i64 {
        self.read(key, ValueKind::Long, None, |v| v.as_long())
            .unwrap_or(0)
    }

    pub fn get_long_or(&self, key: &str, default: i64) -> i64 {
        self.read(key, ValueKind::Long, Some(default), |v| v.as_long())
            .unwrap_or(default)
    }

    pub fn get_float(&self, key: &str) -> f32 {
        self.read(key, ValueKind::Float, None, |v| v.as_float())
            .unwrap_or(0.0)
    }

    pub fn get_float_or(&self, key: &str, default: f32) -> f32 {
        self.read(key, ValueKind::Float, Some(default), |v| v.as_float())
            .unwrap_or(default)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.read(key, ValueKind::String, None, Value::into_string)
    }

    pub fn get_string_or(&self, key: &str, default: impl Into<String>) -> String {
        let default = default.into();
        self.read(key, ValueKind::String, Some(default.clone()), Value::into_string)
            .unwrap_or(default)
    }

    pub fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.read(key, ValueKind::Bytes, None, Value::into_bytes)
    }

    pub fn get_bytes_or(&self, key: &str, default: impl Into<Vec<u8>>) -> Vec<u8> {
        let default = default.into();
        self.read(key, ValueKind::Bytes, Some(default.clone()), Value::into_bytes)
            .unwrap_or(default)
    }

    /// Return the flag's current value (default `false`) and set it to `true`.
    pub fn get_bool_once(&self, key: &str) -> bool {
        let mut state = self.lock();
        let current = state
            .typed(key, ValueKind::Bool)
            .ok()
            .flatten()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        state.store.insert(key, true);
        current
    }

    /// Run `action` if the flag is still false, then set it to `true`.
    pub fn run_once(&self, key: &str, action: impl FnOnce()) {
        if !self.get_bool_or(key, false) {
            action();
            self.put(key, true);
        }
    }
}

/// Builder for [`Settings`].
#[derive(Default)]
pub struct SettingsBuilder {
    config: SettingsConfig,
    properties: Option<Box<dyn PropertySource>>,
    worker: Option<BackupWorker>,
    error_handler: Option<ErrorHandler>,
    bindings: Option<Box<dyn BindingStore>>,
}

impl SettingsBuilder {
    pub fn config(mut self, config: SettingsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config.app_name = name.into();
        self
    }

    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config = self.config.with_data_dir(dir);
        self
    }

    pub fn autosave(mut self, autosave: bool) -> Self {
        self.config.autosave = autosave;
        self
    }

    pub fn max_backups(mut self, max_backups: usize) -> Self {
        self.config.max_backups = max_backups;
        self
    }

    pub fn override_property(mut self, name: impl Into<String>) -> Self {
        self.config.override_property = name.into();
        self
    }

    /// Source of override values. Defaults to the process environment.
    pub fn properties(mut self, properties: impl PropertySource + 'static) -> Self {
        self.properties = Some(Box::new(properties));
        self
    }

    /// Share an existing backup worker instead of starting a new thread.
    pub fn worker(mut self, worker: BackupWorker) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn error_handler(mut self, handler: impl Fn(&SettingsError) + Send + Sync + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn bindings(mut self, bindings: impl BindingStore + 'static) -> Self {
        self.bindings = Some(Box::new(bindings));
        self
    }

    pub fn build(self) -> Result<Settings> {
        let layout = self.config.layout();
        let worker = match self.worker {
            Some(worker) => worker,
            None => BackupWorker::spawn()?,
        };

        let state = State {
            store: Store::new(),
            defaults: HashMap::new(),
            overrides: Overrides::default(),
            loaded: false,
            autosave: self.config.autosave,
            has_errored: false,
            error_handler: self.error_handler,
            bindings: self.bindings,
        };

        Ok(Settings {
            state: Arc::new(Mutex::new(state)),
            log: DiagnosticLog::new(layout.log_file()),
            backups: BackupManager::new(worker, &layout, self.config.max_backups),
            properties: self
                .properties
                .unwrap_or_else(|| Box::new(EnvProperties)),
            override_property: self.config.override_property,
            layout,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::overrides::MapProperties;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn settings_in(dir: &Path) -> Settings {
        Settings::builder()
            .data_dir(dir)
            .properties(MapProperties::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_put_get_and_modified_flag() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.load().unwrap();
        assert!(!settings.is_modified());

        settings.put("volume", 0.8f32);
        assert!(settings.is_modified());
        assert_eq!(settings.get_float_or("volume", 0.0), 0.8);
        assert_eq!(settings.get("volume"), Some(Value::Float(0.8)));

        settings.save().unwrap();
        assert!(!settings.is_modified());

        settings.remove("volume");
        assert!(settings.is_modified());
        assert!(!settings.has("volume"));
    }

    #[test]
    fn test_defaults_used_only_without_explicit_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.defaults([("fps", Value::Int(60)), ("name", Value::from("player"))]);

        assert_eq!(settings.get_int("fps"), 60);
        assert_eq!(settings.get_int_or("fps", 30), 30);
        assert_eq!(settings.get_string("name").as_deref(), Some("player"));
        assert_eq!(settings.get_string("missing"), None);
        assert_eq!(settings.get_long("missing"), 0);

        settings.put("fps", 144);
        assert_eq!(settings.get_int("fps"), 144);

        settings.clear();
        assert_eq!(settings.default_value("fps"), Some(Value::Int(60)));
    }

    #[test]
    fn test_mistyped_value_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.put("fps", "fast");

        assert_eq!(settings.get_int_or("fps", 30), 30);
        let err = settings.try_get("fps", ValueKind::Int).unwrap_err();
        assert!(err.is_invalid_value_type());
        assert!(err.to_string().contains("'fps'"));
    }

    #[test]
    fn test_get_bool_once() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());

        assert!(!settings.get_bool_once("tutorial"));
        assert!(settings.get_bool_once("tutorial"));
        assert!(settings.get_bool_once("tutorial"));
        assert_eq!(settings.get("tutorial"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_run_once() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        let runs = AtomicUsize::new(0);

        for _ in 0..3 {
            settings.run_once("intro", || {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_save_before_load_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.put("a", 1);
        settings.save().unwrap();
        assert!(!settings.layout().primary().exists());
        assert!(settings.is_modified());
    }

    #[test]
    fn test_autosave_respects_flag() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.load().unwrap();
        settings.put("a", 1);

        settings.set_autosave(false);
        settings.autosave().unwrap();
        assert!(!settings.layout().primary().exists());

        settings.set_autosave(true);
        settings.autosave().unwrap();
        assert!(settings.layout().primary().exists());
        assert!(!settings.is_modified());
        settings.flush_backups();
    }

    #[test]
    fn test_encode_failure_is_reported_and_leaves_no_primary() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.load().unwrap();
        settings.put("huge", "x".repeat(70_000));

        let err = settings.save().unwrap_err();
        assert!(matches!(err, SettingsError::Encode(_)));
        assert!(!settings.layout().primary().exists());

        let log = std::fs::read_to_string(settings.layout().log_file()).unwrap();
        assert!(log.contains("Error in save"));
    }

    #[test]
    fn test_write_failure_is_reported_and_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.load().unwrap();
        settings.put("volume", 0.8f32);

        // A non-empty directory where the settings file belongs cannot be
        // replaced, so the final rename fails after the bytes were written.
        let primary = settings.layout().primary();
        fs_err::create_dir(&primary).unwrap();
        fs_err::write(primary.join("occupied"), b"x").unwrap();

        let err = settings.save().unwrap_err();
        settings.flush_backups();

        assert!(err.is_io());
        assert!(err.to_string().contains("settings.bin"));
        assert!(!settings.is_modified());
        assert!(recovery::read_snapshot(&primary).is_err());
        assert!(settings.backup_files().unwrap().is_empty());

        let mut names: Vec<_> = fs_err::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["settings.bin", "settings.log"]);

        let log = std::fs::read_to_string(settings.layout().log_file()).unwrap();
        assert!(log.contains("Error in save"));
    }

    #[test]
    fn test_failed_save_keeps_previous_primary() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path());
        settings.load().unwrap();
        settings.put("volume", 0.8f32);
        settings.save().unwrap();
        settings.flush_backups();
        let saved = fs_err::read(settings.layout().primary()).unwrap();

        settings.put("huge", "x".repeat(70_000));
        assert!(settings.save().is_err());

        assert_eq!(fs_err::read(settings.layout().primary()).unwrap(), saved);
    }

    /// Properties that can change between loads.
    #[derive(Clone, Default)]
    struct SharedProperties(Arc<Mutex<HashMap<String, String>>>);

    impl SharedProperties {
        fn set(&self, name: &str, value: &str) {
            self.0.lock().unwrap().insert(name.to_string(), value.to_string());
        }

        fn unset(&self, name: &str) {
            self.0.lock().unwrap().remove(name);
        }
    }

    impl PropertySource for SharedProperties {
        fn property(&self, name: &str) -> Option<String> {
            self.0.lock().unwrap().get(name).cloned()
        }
    }

    #[test]
    fn test_reload_rebuilds_overrides_from_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let properties = SharedProperties::default();
        properties.set("SETTINGS_OVERRIDE", "fps,vsync");
        properties.set("fps", "144");
        properties.set("vsync", "false");
        let settings = Settings::builder()
            .data_dir(dir.path())
            .properties(properties.clone())
            .build()
            .unwrap();

        settings.load().unwrap();
        assert_eq!(settings.get_int("fps"), 144);
        assert!(!settings.get_bool_or("vsync", true));

        properties.set("SETTINGS_OVERRIDE", "vsync");
        properties.unset("fps");
        properties.set("vsync", "true");
        // Overrides are read once per load.
        assert_eq!(settings.get_int("fps"), 144);

        settings.load().unwrap();
        assert_eq!(settings.get("fps"), None);
        assert!(!settings.has("fps"));
        assert!(settings.get_bool("vsync"));

        properties.unset("SETTINGS_OVERRIDE");
        settings.load().unwrap();
        assert!(!settings.has("vsync"));
    }

    #[test]
    fn test_error_handler_latch() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let settings = Settings::builder()
            .data_dir(dir.path())
            .properties(MapProperties::new())
            .error_handler(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();
        settings.load().unwrap();
        settings.put("huge", "x".repeat(70_000));

        settings.save().unwrap();
        settings.save().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    struct CountingBindings {
        loads: Arc<AtomicUsize>,
        saves: Arc<AtomicUsize>,
    }

    impl BindingStore for CountingBindings {
        fn load(&mut self) -> Result<()> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn save(&mut self) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Err(SettingsError::Bindings("read-only".to_string()))
        }
    }

    #[test]
    fn test_bindings_run_alongside_values() {
        let dir = tempfile::tempdir().unwrap();
        let loads = Arc::new(AtomicUsize::new(0));
        let saves = Arc::new(AtomicUsize::new(0));
        let settings = settings_in(dir.path());
        settings.set_bindings(CountingBindings {
            loads: Arc::clone(&loads),
            saves: Arc::clone(&saves),
        });

        settings.load().unwrap();
        settings.put("a", 1);
        let err = settings.save().unwrap_err();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(saves.load(Ordering::SeqCst), 1);
        assert!(matches!(err, SettingsError::Bindings(_)));
        // values are not written when the bindings step fails
        assert!(!settings.layout().primary().exists());
    }
}
