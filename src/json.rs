//! Structured values stored as JSON inside the bytes value kind.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::logging::warn;
use crate::settings::Settings;

impl Settings {
    /// Serialize `value` to JSON and store it as bytes under `key`.
    pub fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.put(key, bytes);
        Ok(())
    }

    /// Read a JSON value stored with [`Settings::put_json`].
    ///
    /// Returns `default()` if the key is absent or the bytes do not
    /// deserialize into `T`. Failures are written to the diagnostic log.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str, default: impl FnOnce() -> T) -> T {
        let Some(bytes) = self.get_bytes(key) else {
            return default();
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read JSON setting");
                self.diagnostics().write(format!(
                    "Failed to read JSON key={} type={}: {}",
                    key,
                    std::any::type_name::<T>(),
                    e
                ));
                default()
            }
        }
    }
}
